//! Game loop controller: routes actions into the engine and keeps the drop timer in step.

use crate::game::{GameEvent, GameState};
use crate::input::Action;
use crate::timer::DropTimer;
use log::trace;
use std::time::{Duration, Instant};

/// Owns one session's state and its gravity timer. All mutation goes through `&mut self`,
/// so a tick and an input can never interleave.
#[derive(Debug)]
pub struct Controller {
    game: GameState,
    timer: DropTimer,
}

impl Controller {
    pub fn new(game: GameState) -> Self {
        Self {
            game,
            timer: DropTimer::new(),
        }
    }

    pub fn game(&self) -> &GameState {
        &self.game
    }

    #[cfg(test)]
    pub fn timer(&self) -> &DropTimer {
        &self.timer
    }

    #[cfg(test)]
    pub(crate) fn game_mut(&mut self) -> &mut GameState {
        &mut self.game
    }

    /// Apply one discrete input. The engine ignores anything its status does not allow.
    pub fn handle(&mut self, action: Action, now: Instant) {
        match action {
            Action::Start => {
                self.game.start();
                // A new game always gets a fresh timer, even at an unchanged period.
                self.timer.cancel();
            }
            Action::Pause => self.game.toggle_pause(),
            Action::MoveLeft => self.game.move_piece(-1),
            Action::MoveRight => self.game.move_piece(1),
            Action::Rotate => self.game.rotate(),
            Action::SoftDrop => self.game.soft_drop(),
            Action::HardDrop => self.game.hard_drop(),
            Action::Quit | Action::None => {}
        }
        self.sync_timer(now);
    }

    /// Advance the gravity timer; each fire is one soft drop.
    pub fn tick(&mut self, now: Instant) {
        if self.timer.poll(now) {
            self.game.soft_drop();
            self.sync_timer(now);
        }
    }

    /// How long the caller may block waiting for input before the next gravity step.
    pub fn until_next_drop(&self, now: Instant) -> Option<Duration> {
        self.timer.remaining(now)
    }

    pub fn drain_events(&mut self) -> impl Iterator<Item = GameEvent> + '_ {
        self.game.drain_events()
    }

    /// Armed only while running, always at the engine's current interval. A changed interval
    /// tears the old timer down and arms a new one from `now`.
    fn sync_timer(&mut self, now: Instant) {
        let wanted = self
            .game
            .is_running()
            .then(|| self.game.drop_interval());
        match (wanted, self.timer.period()) {
            (None, Some(_)) => {
                self.timer.cancel();
                trace!("drop timer cancelled ({:?})", self.game.status());
            }
            (Some(period), current) if current != Some(period) => {
                self.timer.cancel();
                self.timer.start(now, period);
                trace!("drop timer armed every {:?}", period);
            }
            _ => {}
        }
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        self.timer.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{BOARD_WIDTH, Cell};
    use crate::game::Status;
    use crate::game::tests::game_with;
    use crate::piece::{Catalog, Position, TetrominoKind};
    use ratatui::style::Color;

    const MS: Duration = Duration::from_millis(1);

    fn started(kind: TetrominoKind, now: Instant) -> Controller {
        let mut c = Controller::new(game_with(&[kind]));
        // game_with already started the engine; Start again so the controller arms its timer.
        c.handle(Action::Start, now);
        c
    }

    #[test]
    fn test_not_started_has_no_timer() {
        let game = crate::game::GameState::new(
            Catalog::standard(),
            Box::new(crate::game::tests::CycleSource::new(&[TetrominoKind::T])),
        );
        let mut c = Controller::new(game);
        let now = Instant::now();
        c.handle(Action::SoftDrop, now);
        c.handle(Action::Pause, now);
        assert!(!c.timer().is_armed());
        assert_eq!(c.game().status(), Status::NotStarted);
        assert_eq!(c.until_next_drop(now), None);
    }

    #[test]
    fn test_start_arms_timer_at_base_interval() {
        let t0 = Instant::now();
        let c = started(TetrominoKind::T, t0);
        assert_eq!(c.timer().period(), Some(1000 * MS));
        assert_eq!(c.until_next_drop(t0), Some(1000 * MS));
    }

    #[test]
    fn test_timer_fire_soft_drops() {
        let t0 = Instant::now();
        let mut c = started(TetrominoKind::T, t0);
        c.tick(t0 + 500 * MS);
        assert_eq!(c.game().current.position, Position::new(4, 0));
        c.tick(t0 + 1000 * MS);
        assert_eq!(c.game().current.position, Position::new(4, 1));
        c.tick(t0 + 2000 * MS);
        assert_eq!(c.game().current.position, Position::new(4, 2));
    }

    #[test]
    fn test_pause_cancels_and_resume_rearms() {
        let t0 = Instant::now();
        let mut c = started(TetrominoKind::T, t0);
        c.handle(Action::Pause, t0 + 300 * MS);
        assert!(!c.timer().is_armed());
        c.tick(t0 + 5000 * MS);
        assert_eq!(c.game().current.position.y, 0);

        // Input other than pause is ignored while paused.
        c.handle(Action::MoveLeft, t0 + 5000 * MS);
        assert_eq!(c.game().current.position.x, 4);

        c.handle(Action::Pause, t0 + 6000 * MS);
        assert_eq!(c.timer().next_due(), Some(t0 + 7000 * MS));
    }

    #[test]
    fn test_level_up_reschedules_timer() {
        let t0 = Instant::now();
        let mut c = started(TetrominoKind::I, t0);
        c.game.lines = 9;
        for x in 1..BOARD_WIDTH {
            c.game.board.set(x, 19, Cell::Filled(Color::Gray));
        }
        c.handle(Action::Rotate, t0);
        for _ in 0..6 {
            c.handle(Action::MoveLeft, t0);
        }
        c.handle(Action::HardDrop, t0);
        assert_eq!(c.timer().period(), Some(1000 * MS));

        // The gravity tick locks the piece, clears the row and reaches level 2.
        let fired_at = t0 + 1000 * MS;
        c.tick(fired_at);
        assert_eq!(c.game().level, 2);
        assert_eq!(c.timer().period(), Some(900 * MS));
        assert_eq!(c.timer().next_due(), Some(fired_at + 900 * MS));
        let events: Vec<_> = c.drain_events().collect();
        assert!(events.contains(&GameEvent::LevelUp { level: 2 }));
    }

    #[test]
    fn test_restart_resets_interval_and_timer() {
        let t0 = Instant::now();
        let mut c = started(TetrominoKind::T, t0);
        c.tick(t0 + 1000 * MS);
        c.handle(Action::Start, t0 + 1300 * MS);
        assert_eq!(c.timer().period(), Some(1000 * MS));
        assert_eq!(c.timer().next_due(), Some(t0 + 2300 * MS));
        assert_eq!(c.game().current.position, Position::new(4, 0));
    }

    #[test]
    fn test_game_over_cancels_timer() {
        let t0 = Instant::now();
        let mut c = started(TetrominoKind::O, t0);
        for y in 2..20 {
            for x in 0..BOARD_WIDTH - 1 {
                c.game.board.set(x, y, Cell::Filled(Color::Gray));
            }
        }
        // Lands on row 0-1, and the next O has nowhere to go.
        c.handle(Action::SoftDrop, t0);
        assert_eq!(c.game().status(), Status::GameOver);
        assert!(!c.timer().is_armed());

        // Pause is not available after game over; start is.
        c.handle(Action::Pause, t0);
        assert_eq!(c.game().status(), Status::GameOver);
        c.handle(Action::Start, t0);
        assert_eq!(c.game().status(), Status::Running);
        assert!(c.timer().is_armed());
    }
}
