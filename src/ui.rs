//! Layout and drawing: board, ghost, next preview, stats, controls, overlays and toasts.

use crate::board::{BOARD_HEIGHT, BOARD_WIDTH, Cell};
use crate::game::{GameState, Status};
use crate::notify::ToastQueue;
use crate::piece::Piece;
use crate::theme::Theme;
use ratatui::Frame;
use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Widget};
use std::collections::HashSet;
use std::time::Instant;
use tachyonfx::{
    CellFilter, Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx, ref_count,
};

/// Each board cell is two terminal columns wide so cells look square.
const CELL_WIDTH: u16 = 2;
const BOARD_OUTER_WIDTH: u16 = BOARD_WIDTH as u16 * CELL_WIDTH + 2;
const BOARD_OUTER_HEIGHT: u16 = BOARD_HEIGHT as u16 + 2;
const SIDEBAR_WIDTH: u16 = 26;
const TOAST_WIDTH: u16 = 30;
const TOAST_HEIGHT: u16 = 4;

/// Duration of the fade over cleared rows, in ms.
const LINE_CLEAR_FADE_MS: u32 = 300;

const FILLED: &str = "██";
const GHOST: &str = "[]";
const EMPTY: &str = " ·";

/// Fade effect over rows that were just cleared. Created lazily on the first frame after a clear.
#[derive(Default)]
pub struct LineFlash {
    rows: Vec<usize>,
    effect: Option<Effect>,
    last_processed: Option<Instant>,
}

impl LineFlash {
    /// `removed` is the board's clear report: slot indices in bottom-up scan order, each taken
    /// after the earlier removals shifted rows down. Map back to the rows that were full.
    pub fn trigger(&mut self, removed: &[usize]) {
        self.rows = removed
            .iter()
            .enumerate()
            .map(|(i, &row)| row.saturating_sub(i))
            .collect();
        self.effect = None;
        self.last_processed = None;
    }

    pub fn reset(&mut self) {
        self.rows.clear();
        self.effect = None;
        self.last_processed = None;
    }

    pub fn is_active(&self) -> bool {
        !self.rows.is_empty()
    }

    fn render(&mut self, frame: &mut Frame, board_rect: Rect, bg: Color, now: Instant) {
        if !self.is_active() {
            return;
        }
        let delta = self
            .last_processed
            .map_or(std::time::Duration::ZERO, |t| now.saturating_duration_since(t));
        let delta_ms = delta.as_millis().min(u128::from(u32::MAX)) as u32;
        self.last_processed = Some(now);

        if self.effect.is_none() {
            let positions: HashSet<(u16, u16)> = self
                .rows
                .iter()
                .flat_map(|&y| {
                    let ry = board_rect.y + y as u16;
                    (board_rect.x..board_rect.x + board_rect.width).map(move |rx| (rx, ry))
                })
                .collect();
            let filter = CellFilter::PositionFn(ref_count(move |pos: Position| {
                positions.contains(&(pos.x, pos.y))
            }));
            let effect = fx::fade_from(Color::White, bg, (LINE_CLEAR_FADE_MS, Interpolation::Linear))
                .with_filter(filter)
                .with_area(board_rect);
            self.effect = Some(effect);
        }

        if let Some(effect) = self.effect.as_mut() {
            frame.render_effect(effect, board_rect, TfxDuration::from_millis(delta_ms));
            if effect.done() {
                self.reset();
            }
        }
    }
}

/// Draw the whole screen for the current state.
pub fn draw(
    frame: &mut Frame,
    state: &GameState,
    theme: &Theme,
    toasts: &ToastQueue,
    flash: &mut LineFlash,
    now: Instant,
) {
    let area = frame.area();
    let total_w = BOARD_OUTER_WIDTH + SIDEBAR_WIDTH;
    if area.width < total_w || area.height < BOARD_OUTER_HEIGHT {
        draw_too_small(frame, theme, area, total_w);
        return;
    }

    let horiz = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(total_w),
            Constraint::Fill(1),
        ])
        .split(area);
    let vert = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(BOARD_OUTER_HEIGHT),
            Constraint::Fill(1),
        ])
        .split(horiz[1]);
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(BOARD_OUTER_WIDTH),
            Constraint::Length(SIDEBAR_WIDTH),
        ])
        .split(vert[1]);

    let board_rect = draw_board(frame.buffer_mut(), state, theme, columns[0]);
    flash.render(frame, board_rect, theme.empty_cell, now);
    draw_sidebar(frame.buffer_mut(), state, theme, columns[1]);

    match state.status() {
        Status::NotStarted => draw_start_overlay(frame.buffer_mut(), theme, board_rect),
        Status::Paused => draw_pause_overlay(frame.buffer_mut(), theme, board_rect),
        Status::GameOver => draw_game_over(frame.buffer_mut(), state, theme, board_rect),
        Status::Running => {}
    }

    draw_toasts(frame.buffer_mut(), theme, toasts, area, now);
}

fn card(theme: &Theme, title: &str) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
        .style(Style::default().bg(theme.bg))
        .title(Span::styled(
            format!(" {title} "),
            Style::default().fg(theme.title).add_modifier(Modifier::BOLD),
        ))
}

/// Board, settled cells, ghost and current piece. Returns the inner board rect.
fn draw_board(buf: &mut Buffer, state: &GameState, theme: &Theme, area: Rect) -> Rect {
    let block = card(theme, "Blocktris");
    let inner = block.inner(area);
    block.render(area, buf);

    let game_over = state.status() == Status::GameOver;
    let dim = if game_over {
        Modifier::DIM
    } else {
        Modifier::empty()
    };

    for (y, row) in state.board.rows().enumerate() {
        for (x, cell) in row.iter().enumerate() {
            let (symbol, style) = match cell {
                Cell::Filled(color) => (FILLED, Style::default().fg(*color).bg(theme.empty_cell)),
                Cell::Empty => (EMPTY, Style::default().fg(theme.grid).bg(theme.empty_cell)),
            };
            put_cell(buf, inner, x as i32, y as i32, symbol, style.add_modifier(dim));
        }
    }

    if !game_over && state.status() != Status::NotStarted {
        let piece = &state.current;
        let ghost_y = state.ghost_y();
        if ghost_y > piece.position.y {
            let ghost = piece.at(crate::piece::Position::new(piece.position.x, ghost_y));
            let style = Style::default().fg(piece.color).bg(theme.empty_cell);
            for (x, y) in ghost.cells() {
                put_cell(buf, inner, x, y, GHOST, style);
            }
        }
        let style = Style::default().fg(piece.color).bg(theme.empty_cell);
        for (x, y) in piece.cells() {
            put_cell(buf, inner, x, y, FILLED, style);
        }
    }

    Rect {
        x: inner.x,
        y: inner.y,
        width: (BOARD_WIDTH as u16 * CELL_WIDTH).min(inner.width),
        height: (BOARD_HEIGHT as u16).min(inner.height),
    }
}

/// Write one board cell; cells above the board or outside `inner` are skipped.
fn put_cell(buf: &mut Buffer, inner: Rect, x: i32, y: i32, symbol: &str, style: Style) {
    if x < 0 || y < 0 {
        return;
    }
    let rx = inner.x + x as u16 * CELL_WIDTH;
    let ry = inner.y + y as u16;
    if rx + CELL_WIDTH <= inner.x + inner.width && ry < inner.y + inner.height {
        buf.set_string(rx, ry, symbol, style);
    }
}

fn draw_sidebar(buf: &mut Buffer, state: &GameState, theme: &Theme, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6), // Next (border + up to 4 shape rows)
            Constraint::Length(7), // Score, level, lines, prompt
            Constraint::Min(9),    // Controls
        ])
        .split(area);

    let next_block = card(theme, "Next Piece");
    let next_inner = next_block.inner(chunks[0]);
    next_block.render(chunks[0], buf);
    draw_next_preview(buf, &state.next, next_inner);

    let label = Style::default().fg(theme.title).add_modifier(Modifier::BOLD);
    let value = Style::default().fg(theme.main_fg);
    let prompt = match state.status() {
        Status::NotStarted => Span::styled(
            " Enter  Start Game ",
            Style::default().fg(theme.main_fg).bg(theme.accent),
        ),
        _ => Span::styled(
            " R  Restart ",
            Style::default().fg(theme.main_fg).bg(theme.alert),
        ),
    };
    let stats = vec![
        Line::from(vec![
            Span::styled("Score  ", label),
            Span::styled(state.score.to_string(), value),
        ]),
        Line::from(vec![
            Span::styled("Level  ", label),
            Span::styled(state.level.to_string(), value),
        ]),
        Line::from(vec![
            Span::styled("Lines  ", label),
            Span::styled(state.lines.to_string(), value),
        ]),
        Line::from(""),
        Line::from(prompt),
    ];
    Paragraph::new(stats)
        .block(card(theme, "Stats"))
        .render(chunks[1], buf);

    let key = Style::default().fg(theme.main_fg).bg(theme.div_line);
    let text = Style::default().fg(theme.inactive_fg);
    let controls: Vec<Line> = [
        ("Move Left", "←"),
        ("Move Right", "→"),
        ("Move Down", "↓"),
        ("Rotate", "↑"),
        ("Hard Drop", "Space"),
        ("Pause", "P"),
        ("Quit", "Q"),
    ]
    .iter()
    .map(|(what, k)| {
        Line::from(vec![
            Span::styled(format!("{what:<12}"), text),
            Span::styled(format!(" {k} "), key),
        ])
    })
    .collect();
    Paragraph::new(controls)
        .block(card(theme, "Controls"))
        .render(chunks[2], buf);
}

/// Next piece, trimmed to its occupied rows and centred.
fn draw_next_preview(buf: &mut Buffer, piece: &Piece, area: Rect) {
    let shape = &piece.shape;
    let rows: Vec<usize> = (0..shape.rows())
        .filter(|&y| (0..shape.cols()).any(|x| shape.is_filled(x, y)))
        .collect();
    let w = shape.cols() as u16 * CELL_WIDTH;
    let h = rows.len() as u16;
    let off_x = area.width.saturating_sub(w) / 2;
    let off_y = area.height.saturating_sub(h) / 2;
    let style = Style::default().fg(piece.color);
    for (row_i, &y) in rows.iter().enumerate() {
        for x in 0..shape.cols() {
            if !shape.is_filled(x, y) {
                continue;
            }
            let rx = area.x + off_x + x as u16 * CELL_WIDTH;
            let ry = area.y + off_y + row_i as u16;
            if rx + CELL_WIDTH <= area.x + area.width && ry < area.y + area.height {
                buf.set_string(rx, ry, FILLED, style);
            }
        }
    }
}

fn centered(area: Rect, w: u16, h: u16) -> Rect {
    Rect {
        x: area.x + area.width.saturating_sub(w) / 2,
        y: area.y + area.height.saturating_sub(h) / 2,
        width: w.min(area.width),
        height: h.min(area.height),
    }
}

fn draw_popup(buf: &mut Buffer, theme: &Theme, area: Rect, lines: Vec<Line<'static>>) {
    let popup = centered(area, area.width, lines.len() as u16 + 2);
    Clear.render(popup, buf);
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
                .style(Style::default().bg(theme.bg)),
        )
        .render(popup, buf);
}

fn draw_start_overlay(buf: &mut Buffer, theme: &Theme, board: Rect) {
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Ready? ",
            Style::default().fg(theme.title).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            " Start Game ",
            Style::default().fg(theme.main_fg).bg(theme.accent),
        )),
        Line::from(Span::styled("Enter", Style::default().fg(theme.inactive_fg))),
    ];
    draw_popup(buf, theme, board, lines);
}

fn draw_pause_overlay(buf: &mut Buffer, theme: &Theme, board: Rect) {
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Paused ",
            Style::default().fg(Color::Black).bg(Color::Yellow),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "P Resume  Q Quit",
            Style::default().fg(theme.main_fg),
        )),
    ];
    draw_popup(buf, theme, board, lines);
}

fn draw_game_over(buf: &mut Buffer, state: &GameState, theme: &Theme, board: Rect) {
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " You Lose! ",
            Style::default()
                .fg(Color::White)
                .bg(theme.alert)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            format!("Score: {}", state.score),
            Style::default().fg(theme.main_fg),
        )),
        Line::from(""),
        Line::from(Span::styled(
            " Play Again ",
            Style::default().fg(theme.main_fg).bg(theme.accent),
        )),
        Line::from(Span::styled(
            "Enter / R",
            Style::default().fg(theme.inactive_fg),
        )),
    ];
    draw_popup(buf, theme, board, lines);
}

/// Live toasts stacked down the top-right corner, newest at the bottom.
fn draw_toasts(buf: &mut Buffer, theme: &Theme, toasts: &ToastQueue, area: Rect, now: Instant) {
    if toasts.is_empty() || area.width < TOAST_WIDTH {
        return;
    }
    // Newest toasts win when the screen is too short for all of them.
    let fit = (area.height / TOAST_HEIGHT) as usize;
    let skip = toasts.len().saturating_sub(fit);
    let x = area.x + area.width - TOAST_WIDTH;
    for (i, toast) in toasts.iter().skip(skip).enumerate() {
        let y = area.y + i as u16 * TOAST_HEIGHT;
        let rect = Rect {
            x,
            y,
            width: TOAST_WIDTH,
            height: TOAST_HEIGHT,
        };
        let border = if toast.remaining_ratio(now) > 0.3 {
            theme.title
        } else {
            theme.inactive_fg
        };
        Clear.render(rect, buf);
        Paragraph::new(vec![
            Line::from(Span::styled(
                toast.notification.title.clone(),
                Style::default().fg(theme.title).add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                toast.notification.message.clone(),
                Style::default().fg(theme.main_fg),
            )),
        ])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(border).bg(theme.bg))
                .style(Style::default().bg(theme.bg)),
        )
        .render(rect, buf);
    }
}

fn draw_too_small(frame: &mut Frame, theme: &Theme, area: Rect, need_w: u16) {
    let msg = format!(
        "Terminal too small: need {}x{}, have {}x{}",
        need_w, BOARD_OUTER_HEIGHT, area.width, area.height
    );
    Paragraph::new(Line::from(Span::styled(msg, Style::default().fg(theme.alert))))
        .alignment(Alignment::Center)
        .render(area, frame.buffer_mut());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::tests::game_with;
    use crate::notify::Notification;
    use crate::piece::TetrominoKind;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;
    use std::time::Duration;

    fn render(state: &GameState, toasts: &ToastQueue) -> Buffer {
        let mut terminal = Terminal::new(TestBackend::new(80, 30)).unwrap();
        let theme = Theme::default();
        let mut flash = LineFlash::default();
        let now = Instant::now();
        terminal
            .draw(|f| draw(f, state, &theme, toasts, &mut flash, now))
            .unwrap();
        terminal.backend().buffer().clone()
    }

    fn screen_text(buf: &Buffer) -> String {
        let area = buf.area;
        let mut s = String::new();
        for y in area.y..area.y + area.height {
            for x in area.x..area.x + area.width {
                s.push_str(buf[(x, y)].symbol());
            }
            s.push('\n');
        }
        s
    }

    #[test]
    fn test_running_board_shows_piece_ghost_and_stats() {
        let state = game_with(&[TetrominoKind::O]);
        let text = screen_text(&render(&state, &ToastQueue::new()));
        assert!(text.contains("Next Piece"));
        assert!(text.contains("Score"));
        assert!(text.contains("Hard Drop"));
        assert!(text.contains(FILLED));
        assert!(text.contains(GHOST));
    }

    #[test]
    fn test_game_over_overlay() {
        let mut state = game_with(&[TetrominoKind::O]);
        for y in 2..BOARD_HEIGHT {
            for x in 0..BOARD_WIDTH - 1 {
                state.board.set(x, y, Cell::Filled(Color::Gray));
            }
        }
        state.soft_drop();
        assert_eq!(state.status(), Status::GameOver);
        let text = screen_text(&render(&state, &ToastQueue::new()));
        assert!(text.contains("You Lose!"));
        assert!(text.contains("Play Again"));
    }

    #[test]
    fn test_toasts_are_drawn() {
        let state = game_with(&[TetrominoKind::T]);
        let mut toasts = ToastQueue::new();
        toasts.push(
            Notification {
                title: "Tetris!".into(),
                message: "+2400 points".into(),
                duration: Duration::from_millis(1500),
            },
            Instant::now(),
        );
        let text = screen_text(&render(&state, &toasts));
        assert!(text.contains("Tetris!"));
        assert!(text.contains("+2400 points"));
    }

    #[test]
    fn test_flash_maps_removed_slots_to_full_rows() {
        let mut flash = LineFlash::default();
        flash.trigger(&[19, 19, 19, 19]);
        assert_eq!(flash.rows, vec![19, 18, 17, 16]);
        flash.trigger(&[19, 18]);
        assert_eq!(flash.rows, vec![19, 17]);
        assert!(flash.is_active());
        flash.reset();
        assert!(!flash.is_active());
    }

    #[test]
    fn test_small_terminal_message() {
        let mut terminal = Terminal::new(TestBackend::new(80, 10)).unwrap();
        let state = game_with(&[TetrominoKind::T]);
        let mut flash = LineFlash::default();
        terminal
            .draw(|f| {
                draw(
                    f,
                    &state,
                    &Theme::default(),
                    &ToastQueue::new(),
                    &mut flash,
                    Instant::now(),
                );
            })
            .unwrap();
        let text = screen_text(terminal.backend().buffer());
        assert!(text.contains("Terminal"));
    }
}
