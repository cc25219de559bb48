//! App: terminal init, main loop, key handling and event fan-out to toasts and effects.

use crate::GameConfig;
use crate::controller::Controller;
use crate::game::{GameEvent, GameState};
use crate::input::{Action, key_to_action};
use crate::notify::{Notification, ToastQueue};
use crate::piece::{Catalog, UniformSource};
use crate::theme::Theme;
use crate::ui::{self, LineFlash};
use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind};
use log::info;
use rand::SeedableRng;
use rand::rngs::StdRng;
use ratatui::DefaultTerminal;
use std::time::{Duration, Instant};

pub struct App {
    config: GameConfig,
    theme: Theme,
    controller: Controller,
    toasts: ToastQueue,
    flash: LineFlash,
}

impl App {
    pub fn new(config: GameConfig, theme: Theme) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let game = GameState::new(Catalog::standard(), Box::new(UniformSource::new(rng)));
        let mut controller = Controller::new(game);
        if config.autostart {
            controller.handle(Action::Start, Instant::now());
        }
        Self {
            config,
            theme,
            controller,
            toasts: ToastQueue::new(),
            flash: LineFlash::default(),
        }
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            execute,
            terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
        };

        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let mut terminal = DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;
        info!("session started (seed {:?})", self.config.seed);

        let result = self.run_loop(&mut terminal);

        // Restore
        let _ = terminal.show_cursor();
        execute!(std::io::stdout(), LeaveAlternateScreen)?;
        disable_raw_mode()?;

        result
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        let frame_duration = Duration::from_secs_f64(1.0 / self.config.frame_rate.max(1.0));
        loop {
            let now = Instant::now();
            terminal.draw(|f| {
                ui::draw(
                    f,
                    self.controller.game(),
                    &self.theme,
                    &self.toasts,
                    &mut self.flash,
                    now,
                )
            })?;

            // Sleep until the next frame or the next gravity step, whichever comes first.
            let timeout = self
                .controller
                .until_next_drop(now)
                .map_or(frame_duration, |d| d.min(frame_duration))
                .saturating_sub(now.elapsed());

            if event::poll(timeout)? {
                while event::poll(Duration::ZERO)? {
                    if let Event::Key(key) = event::read()? {
                        if key.kind != KeyEventKind::Press {
                            continue;
                        }
                        match key_to_action(key) {
                            Action::Quit => return Ok(()),
                            Action::None => {}
                            Action::Start => {
                                self.toasts.clear();
                                self.flash.reset();
                                self.controller.handle(Action::Start, Instant::now());
                            }
                            action => self.controller.handle(action, Instant::now()),
                        }
                    }
                }
            }

            let now = Instant::now();
            self.controller.tick(now);
            self.dispatch_events(now);
            self.toasts.expire(now);
        }
    }

    /// Fan engine events out to toasts and the line-clear flash.
    fn dispatch_events(&mut self, now: Instant) {
        let events: Vec<GameEvent> = self.controller.drain_events().collect();
        for event in &events {
            if let GameEvent::LinesCleared { rows, .. } = event {
                if self.config.animations {
                    self.flash.trigger(rows);
                }
            }
            if let Some(note) = Notification::for_event(event) {
                self.toasts.push(note, now);
            }
        }
    }
}
