use serde::{Deserialize, Serialize};

use crate::error::BoardError;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

impl Range {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Non-finite input falls back to `fallback` before clamping.
    pub fn clamp(&self, value: f64, fallback: f64) -> f64 {
        let value = if value.is_finite() { value } else { fallback };
        value.max(self.min).min(self.max)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct NoteDefaults {
    pub width: f64,
    pub height: f64,
    pub text: String,
    pub color: String,
    pub font_size: f64,
}

impl Default for NoteDefaults {
    fn default() -> Self {
        Self {
            width: 200.0,
            height: 150.0,
            text: "New note...".to_string(),
            color: "#ffd700".to_string(),
            font_size: 14.0,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct BoardConfig {
    pub background: String,
    pub show_grid: bool,
    pub grid_size: f64,
    pub zoom: Range,
    pub wheel_zoom_in: f64,
    pub wheel_zoom_out: f64,
    pub button_zoom_step: f64,
    pub fit_padding: f64,
    pub fit_max_zoom: f64,
    pub note: NoteDefaults,
    pub media_x: f64,
    pub media_y: f64,
    pub media_width: f64,
    pub media_height: f64,
    pub brush_size: Range,
    pub opacity: Range,
    pub font_size: Range,
    pub min_note_size: f64,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            background: "#ffffff".to_string(),
            show_grid: true,
            grid_size: 20.0,
            zoom: Range::new(0.1, 5.0),
            wheel_zoom_in: 1.1,
            wheel_zoom_out: 0.9,
            button_zoom_step: 1.2,
            fit_padding: 50.0,
            fit_max_zoom: 2.0,
            note: NoteDefaults::default(),
            media_x: 100.0,
            media_y: 100.0,
            media_width: 300.0,
            media_height: 200.0,
            brush_size: Range::new(1.0, 100.0),
            opacity: Range::new(0.1, 1.0),
            font_size: Range::new(8.0, 72.0),
            min_note_size: 20.0,
        }
    }
}

impl BoardConfig {
    pub fn validate(&self) -> Result<(), BoardError> {
        let ranges = [
            ("zoom", self.zoom),
            ("brush_size", self.brush_size),
            ("opacity", self.opacity),
            ("font_size", self.font_size),
        ];
        for (name, range) in ranges {
            if !(range.min.is_finite() && range.max.is_finite()) || range.min > range.max {
                return Err(BoardError::InvalidConfig(format!(
                    "{name} range {}..{} is inverted or not finite",
                    range.min, range.max
                )));
            }
        }
        if self.zoom.min <= 0.0 {
            return Err(BoardError::InvalidConfig(
                "zoom minimum must be positive".to_string(),
            ));
        }
        if self.grid_size <= 0.0 {
            return Err(BoardError::InvalidConfig(
                "grid_size must be positive".to_string(),
            ));
        }
        if self.wheel_zoom_in <= 1.0 || self.wheel_zoom_out <= 0.0 || self.wheel_zoom_out >= 1.0 {
            return Err(BoardError::InvalidConfig(
                "wheel zoom factors must zoom in and out".to_string(),
            ));
        }
        Ok(())
    }
}
