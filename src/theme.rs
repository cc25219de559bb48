//! Theme loading: btop-style `theme[key]="value"` and hex → ratatui Color.

use ratatui::style::Color;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// UI chrome colours. Piece colours come from the catalog, not the theme.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Card / sidebar background.
    pub bg: Color,
    /// Empty board cell.
    pub empty_cell: Color,
    /// Grid dots drawn on empty cells.
    pub grid: Color,
    /// Card borders.
    pub div_line: Color,
    /// Text (score, level).
    pub main_fg: Color,
    /// Highlight / titles.
    pub title: Color,
    /// Secondary text (controls legend, disabled hints).
    pub inactive_fg: Color,
    /// Start / play-again prompt.
    pub accent: Color,
    /// Restart prompt and game-over banner.
    pub alert: Color,
}

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

impl Default for Theme {
    fn default() -> Self {
        Self::slate_default()
    }
}

impl Theme {
    /// Hardcoded dark slate defaults (gray-800 cards, purple accent).
    pub fn slate_default() -> Self {
        Self {
            bg: parse_hex("#1F2937").unwrap(),
            empty_cell: parse_hex("#1E1E1E").unwrap(),
            grid: parse_hex("#3C3C3C").unwrap(),
            div_line: parse_hex("#374151").unwrap(),
            main_fg: parse_hex("#F9FAFB").unwrap(),
            title: parse_hex("#E5E7EB").unwrap(),
            inactive_fg: parse_hex("#9CA3AF").unwrap(),
            accent: parse_hex("#9333EA").unwrap(),
            alert: parse_hex("#DC2626").unwrap(),
        }
    }

    /// Load theme from a btop-style file: `theme[key]="value"` or `theme[key]='value'`.
    /// Falls back to the defaults if path is None or the file is missing; keys that are
    /// absent or unparseable keep their default colour.
    pub fn load(path: Option<&Path>) -> Result<Self, ThemeError> {
        let path = match path {
            Some(p) if p.exists() => p,
            _ => return Ok(Self::default()),
        };
        let s = std::fs::read_to_string(path)?;
        let map = parse_theme_file(&s);
        Ok(Self::from_map(&map))
    }

    fn from_map(map: &HashMap<String, String>) -> Self {
        let get = |key: &str| map.get(key).and_then(|v| parse_hex(v).ok());
        let base = Self::slate_default();
        Self {
            bg: get("main_bg").unwrap_or(base.bg),
            empty_cell: get("meter_bg").unwrap_or(base.empty_cell),
            grid: get("graph_text").unwrap_or(base.grid),
            div_line: get("div_line").unwrap_or(base.div_line),
            main_fg: get("main_fg").unwrap_or(base.main_fg),
            title: get("title").unwrap_or(base.title),
            inactive_fg: get("inactive_fg").unwrap_or(base.inactive_fg),
            accent: get("hi_fg").or_else(|| get("net_box")).unwrap_or(base.accent),
            alert: get("cpu_end")
                .or_else(|| get("temp_end"))
                .unwrap_or(base.alert),
        }
    }
}

/// Parse btop-style theme file into key -> value map.
fn parse_theme_file(s: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for line in s.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some(stripped) = line.strip_prefix("theme[") else {
            continue;
        };
        let Some(end) = stripped.find(']') else {
            continue;
        };
        let key = stripped[..end].trim();
        let rest = stripped[end + 1..].trim();
        if let Some(value) = rest.strip_prefix('=') {
            let value = value.trim().trim_matches('"').trim_matches('\'').trim();
            if !value.is_empty() {
                map.insert(key.to_string(), value.to_string());
            }
        }
    }
    map
}

/// Parse hex colour "#RRGGBB" or "#RGB" into ratatui Color.
pub fn parse_hex(s: &str) -> Result<Color, ThemeError> {
    let s = s.trim().trim_start_matches('#');
    let channel = |range: std::ops::Range<usize>| {
        s.get(range)
            .and_then(|h| u8::from_str_radix(h, 16).ok())
            .ok_or_else(|| ThemeError::InvalidHex(s.to_string()))
    };
    let (r, g, b) = match s.len() {
        6 => (channel(0..2)?, channel(2..4)?, channel(4..6)?),
        3 => (channel(0..1)? * 17, channel(1..2)? * 17, channel(2..3)? * 17),
        _ => return Err(ThemeError::InvalidHex(s.to_string())),
    };
    Ok(Color::Rgb(r, g, b))
}
