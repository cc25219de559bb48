//! Score, level and gravity progression.

use std::time::Duration;

/// Points for clearing 0..=4 lines at level 1.
pub const LINE_POINTS: [u32; 5] = [0, 40, 100, 300, 1200];
pub const LINES_PER_LEVEL: u32 = 10;
pub const BASE_DROP_MS: u64 = 1000;
pub const DROP_STEP_MS: u64 = 100;
pub const MIN_DROP_MS: u64 = 100;

/// Award for one placement. A four-line clear counts double.
pub fn line_clear_points(lines: usize, level: u32) -> u32 {
    let base = LINE_POINTS.get(lines).copied().unwrap_or(0) * level;
    if lines == 4 { base * 2 } else { base }
}

/// Level reached after `total_lines` cleared lines.
pub fn level_for_lines(total_lines: u32) -> u32 {
    total_lines / LINES_PER_LEVEL + 1
}

/// Gravity period at `level`: 1000 ms at level 1, 100 ms less per level, never below 100 ms.
pub fn drop_interval(level: u32) -> Duration {
    let step = u64::from(level.saturating_sub(1)) * DROP_STEP_MS;
    Duration::from_millis(BASE_DROP_MS.saturating_sub(step).max(MIN_DROP_MS))
}

/// Toast title for a clear of `lines` rows.
pub fn clear_name(lines: usize) -> Option<&'static str> {
    match lines {
        1 => Some("Single!"),
        2 => Some("Double!"),
        3 => Some("Triple!"),
        4 => Some("Tetris!"),
        _ => None,
    }
}
