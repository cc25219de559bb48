//! Game state: board, current/next piece, movement, placement, line clears and scoring.

use crate::board::{Board, Cell};
use crate::piece::{Catalog, Piece, PieceSource, Position};
use crate::scoring;
use log::{debug, info};
use std::time::Duration;

/// Lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    NotStarted,
    Running,
    Paused,
    GameOver,
}

/// Something the presentation layer may want to announce. Never read back by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    LinesCleared {
        count: usize,
        points: u32,
        /// Board rows where a full row was removed, bottom-up scan order.
        rows: Vec<usize>,
    },
    LevelUp {
        level: u32,
    },
    GameOver {
        score: u32,
    },
}

/// Game state: board, current piece, next piece, score, level, etc.
#[derive(Debug)]
pub struct GameState {
    catalog: Catalog,
    source: Box<dyn PieceSource>,
    pub board: Board,
    pub current: Piece,
    pub next: Piece,
    pub score: u32,
    pub level: u32,
    pub lines: u32,
    drop_interval: Duration,
    status: Status,
    events: Vec<GameEvent>,
}

impl GameState {
    pub fn new(catalog: Catalog, mut source: Box<dyn PieceSource>) -> Self {
        let current = catalog.spawn(source.next_kind());
        let next = catalog.spawn(source.next_kind());
        Self {
            catalog,
            source,
            board: Board::new(),
            current,
            next,
            score: 0,
            level: 1,
            lines: 0,
            drop_interval: scoring::drop_interval(1),
            status: Status::NotStarted,
            events: Vec::new(),
        }
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn is_running(&self) -> bool {
        self.status == Status::Running
    }

    pub fn drop_interval(&self) -> Duration {
        self.drop_interval
    }

    /// Fresh board, fresh pieces, counters zeroed. Valid from any status.
    pub fn start(&mut self) {
        self.board = Board::new();
        self.current = self.draw_piece();
        self.next = self.draw_piece();
        self.score = 0;
        self.level = 1;
        self.lines = 0;
        self.drop_interval = scoring::drop_interval(1);
        self.status = Status::Running;
        self.events.clear();
        info!("new game: current {:?}, next {:?}", self.current.kind, self.next.kind);
    }

    /// Flip between running and paused. Ignored before the first start and after game over.
    pub fn toggle_pause(&mut self) {
        self.status = match self.status {
            Status::Running => Status::Paused,
            Status::Paused => Status::Running,
            other => other,
        };
    }

    /// Pure check against the settled board.
    pub fn collides(&self, piece: &Piece, at: Position) -> bool {
        self.board.collides(&piece.shape, at)
    }

    /// Shift the current piece one column; `direction` is -1 (left) or +1 (right).
    pub fn move_piece(&mut self, direction: i32) {
        if !self.is_running() {
            return;
        }
        let target = self.current.position.offset(direction.signum(), 0);
        if !self.collides(&self.current, target) {
            self.current = self.current.at(target);
        }
    }

    /// Clockwise rotation in place. No wall kicks: a blocked rotation is dropped.
    pub fn rotate(&mut self) {
        if !self.is_running() {
            return;
        }
        let candidate = self.current.with_shape(self.current.shape.rotated());
        if !self.collides(&candidate, candidate.position) {
            self.current = candidate;
        }
    }

    /// One row down, or lock the piece if the row below is blocked.
    pub fn soft_drop(&mut self) {
        if !self.is_running() {
            return;
        }
        let target = self.current.position.offset(0, 1);
        if self.collides(&self.current, target) {
            self.place_piece();
        } else {
            self.current = self.current.at(target);
        }
    }

    /// Jump to the lowest reachable row. The piece stays live; the next soft drop locks it.
    pub fn hard_drop(&mut self) {
        if !self.is_running() {
            return;
        }
        let y = self.landing_row(&self.current);
        if y != self.current.position.y {
            self.current = self.current.at(Position::new(self.current.position.x, y));
        }
    }

    /// Row where the ghost outline of the current piece is drawn.
    pub fn ghost_y(&self) -> i32 {
        self.landing_row(&self.current)
    }

    fn landing_row(&self, piece: &Piece) -> i32 {
        let mut at = piece.position;
        while !self.collides(piece, at.offset(0, 1)) {
            at = at.offset(0, 1);
        }
        at.y
    }

    /// Pending announcements since the last drain.
    pub fn drain_events(&mut self) -> impl Iterator<Item = GameEvent> + '_ {
        self.events.drain(..)
    }

    fn draw_piece(&mut self) -> Piece {
        let kind = self.source.next_kind();
        self.catalog.spawn(kind)
    }

    fn end_game(&mut self) {
        self.status = Status::GameOver;
        info!("game over: score {}, lines {}, level {}", self.score, self.lines, self.level);
        self.events.push(GameEvent::GameOver { score: self.score });
    }

    /// Settle the current piece, clear rows, update progression and bring in the next piece.
    fn place_piece(&mut self) {
        let piece = self.current.clone();
        if piece.cells().any(|(_, y)| y < 0) {
            self.end_game();
            return;
        }
        for (x, y) in piece.cells() {
            self.board.set(x as usize, y as usize, Cell::Filled(piece.color));
        }
        debug!("placed {:?} at {:?}", piece.kind, piece.position);

        let rows = self.board.clear_full_rows();
        let count = rows.len();
        if count > 0 {
            let points = scoring::line_clear_points(count, self.level);
            self.score += points;

            debug!("cleared {count} line(s) for {points} points");
            self.events.push(GameEvent::LinesCleared {
                count,
                points,
                rows,
            });

            let previous = self.lines;
            self.lines += count as u32;
            if self.lines / scoring::LINES_PER_LEVEL > previous / scoring::LINES_PER_LEVEL {
                self.level = scoring::level_for_lines(self.lines);
                self.drop_interval = scoring::drop_interval(self.level);
                info!("level {} (drop every {:?})", self.level, self.drop_interval);
                self.events.push(GameEvent::LevelUp { level: self.level });
            }
        }

        let incoming = self.draw_piece();
        self.current = std::mem::replace(&mut self.next, incoming);
        if self.collides(&self.current, self.current.position) {
            self.end_game();
        }
    }
}
