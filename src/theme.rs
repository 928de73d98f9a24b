use serde::{Deserialize, Serialize};

use crate::text_metrics::FontWeight;

/// Process-wide, read-only text and colour style. Built once before any panel
/// is processed and passed by reference from then on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub font_family: String,
    /// Tick label size in points.
    pub font_size: f32,
    pub axis_label_size: f32,
    pub title_size: f32,
    /// Panel label glyph size in points.
    pub label_font_size: f32,
    pub label_weight: FontWeight,
    pub legend_font_size: f32,
    pub text_color: String,
    pub line_color: String,
    pub frame_color: String,
    pub background: String,
}

impl Theme {
    pub fn classic() -> Self {
        Self {
            font_family: "DejaVu Sans, Bitstream Vera Sans, Arial, sans-serif".to_string(),
            font_size: 10.0,
            axis_label_size: 10.0,
            title_size: 12.0,
            label_font_size: 18.0,
            label_weight: FontWeight::Bold,
            legend_font_size: 14.0,
            text_color: "#000000".to_string(),
            line_color: "#1F77B4".to_string(),
            frame_color: "#000000".to_string(),
            background: "#FFFFFF".to_string(),
        }
    }

    pub fn modern() -> Self {
        Self {
            font_family: "Inter, Segoe UI, system-ui, sans-serif".to_string(),
            font_size: 9.0,
            axis_label_size: 10.0,
            title_size: 11.0,
            label_font_size: 16.0,
            label_weight: FontWeight::Bold,
            legend_font_size: 12.0,
            text_color: "#1C2430".to_string(),
            line_color: "#4E79A7".to_string(),
            frame_color: "#7A8AA6".to_string(),
            background: "#FFFFFF".to_string(),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::classic()
    }
}
