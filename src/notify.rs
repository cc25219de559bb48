//! Toasts: short-lived announcements for clears, level-ups and game over.

use crate::game::GameEvent;
use crate::scoring::clear_name;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Most toasts visible at once; the oldest is dropped to make room.
pub const TOAST_LIMIT: usize = 5;

const LINE_CLEAR_TOAST_MS: u64 = 1500;
const LEVEL_UP_TOAST_MS: u64 = 2000;
const GAME_OVER_TOAST_MS: u64 = 5000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub message: String,
    pub duration: Duration,
}

impl Notification {
    /// The announcement for an engine event.
    pub fn for_event(event: &GameEvent) -> Option<Self> {
        let (title, message, ms) = match event {
            GameEvent::LinesCleared { count, points, .. } => (
                clear_name(*count)?.to_string(),
                format!("+{points} points"),
                LINE_CLEAR_TOAST_MS,
            ),
            GameEvent::LevelUp { level } => (
                "Level Up!".to_string(),
                format!("You've reached level {level}!"),
                LEVEL_UP_TOAST_MS,
            ),
            GameEvent::GameOver { score } => (
                "You Lose!".to_string(),
                format!("Your score: {score}"),
                GAME_OVER_TOAST_MS,
            ),
        };
        Some(Self {
            title,
            message,
            duration: Duration::from_millis(ms),
        })
    }
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub notification: Notification,
    pub shown_at: Instant,
}

impl Toast {
    fn expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.shown_at) >= self.notification.duration
    }

    /// Fraction of the lifetime left, 1.0 when fresh.
    pub fn remaining_ratio(&self, now: Instant) -> f64 {
        let total = self.notification.duration.as_secs_f64();
        if total <= 0.0 {
            return 0.0;
        }
        let age = now.saturating_duration_since(self.shown_at).as_secs_f64();
        (1.0 - age / total).clamp(0.0, 1.0)
    }
}

/// Bounded FIFO of live toasts, oldest first.
#[derive(Debug, Clone, Default)]
pub struct ToastQueue {
    toasts: VecDeque<Toast>,
}

impl ToastQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, notification: Notification, now: Instant) {
        if self.toasts.len() == TOAST_LIMIT {
            self.toasts.pop_front();
        }
        self.toasts.push_back(Toast {
            notification,
            shown_at: now,
        });
    }

    /// Drop every toast whose duration has run out.
    pub fn expire(&mut self, now: Instant) {
        self.toasts.retain(|t| !t.expired(now));
    }

    pub fn clear(&mut self) {
        self.toasts.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &Toast> {
        self.toasts.iter()
    }

    pub fn len(&self) -> usize {
        self.toasts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }
}
