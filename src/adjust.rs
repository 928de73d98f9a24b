//! Per-panel label gutter.
//!
//! Inside a panel's slot, left to right: padding, the label glyph box, a gap,
//! the y-axis label, a gap, the tick labels, a gap, then the plotting area.
//! Top to bottom: padding, the label glyph box, padding, the title, then the
//! plotting area. The right and bottom edges of the slot never move.

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::LayoutConfig;
use crate::error::{Result, Warning};
use crate::figure::Axes;
use crate::footprint::Footprint;
use crate::geometry::{HAlign, LabelAnchor, Rect, VAlign};
use crate::oracle::{POINTS_PER_INCH, TextOracle};
use crate::text_metrics::FontWeight;
use crate::theme::Theme;

/// Extents of the panel's own texts that the gutter must clear, in figure fractions.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Obstacles {
    pub ylabel_width: f32,
    pub max_ytick_width: f32,
    pub title_height: f32,
}

/// Font-derived padding, the same physical length on both axes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Padding {
    pub x: f32,
    pub y: f32,
}

impl Padding {
    pub fn new(font_size: f32, padding_factor: f32, (width_in, height_in): (f32, f32)) -> Self {
        let inches = font_size / POINTS_PER_INCH * padding_factor;
        Self {
            x: inches / width_in,
            y: inches / height_in,
        }
    }

    pub fn gap(&self) -> f32 {
        self.x / 2.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Insets {
    pub left: f32,
    pub top: f32,
}

impl Insets {
    pub fn new(padding: Padding, footprint: Footprint, obstacles: Obstacles) -> Self {
        let gap = padding.gap();
        Self {
            left: padding.x
                + footprint.width
                + gap
                + obstacles.ylabel_width
                + gap
                + obstacles.max_ytick_width
                + gap,
            top: padding.y + footprint.height + padding.y + obstacles.title_height,
        }
    }

    /// Slot with its left and top edges pulled in.
    pub fn apply(&self, slot: Rect) -> Rect {
        Rect::new(slot.x0 + self.left, slot.y0, slot.x1, slot.y1 - self.top)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// The content rectangle moves to `rect`.
    Inset { rect: Rect },
    /// The inset rectangle would be empty; the slot stays in force.
    Skipped { width: f32, height: f32 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PanelAdjustment {
    pub token: char,
    pub slot: Rect,
    pub padding: Padding,
    pub insets: Insets,
    pub outcome: Outcome,
    /// Computed from the slot, so it holds whether or not the inset applied.
    pub anchor: LabelAnchor,
}

impl PanelAdjustment {
    /// Rectangle the panel should end up with.
    pub fn rect(&self) -> Rect {
        match self.outcome {
            Outcome::Inset { rect } => rect,
            Outcome::Skipped { .. } => self.slot,
        }
    }

    pub fn warning(&self) -> Option<Warning> {
        match self.outcome {
            Outcome::Inset { .. } => None,
            Outcome::Skipped { width, height } => Some(Warning::PanelTooSmall {
                token: self.token,
                width,
                height,
            }),
        }
    }
}

/// Measures what the gutter has to clear for `axes`. Empty texts measure zero.
pub fn measure_obstacles(oracle: &dyn TextOracle, axes: &Axes, theme: &Theme) -> Result<Obstacles> {
    let ylabel_width = oracle
        .measure_vertical(&axes.ylabel, theme.axis_label_size, FontWeight::Normal)?
        .width();
    let mut max_ytick_width = 0.0f32;
    for label in axes.ytick_labels() {
        let extent = oracle.measure(label, theme.font_size, FontWeight::Normal)?;
        max_ytick_width = max_ytick_width.max(extent.width());
    }
    let title_height = oracle
        .measure(&axes.title, theme.title_size, FontWeight::Normal)?
        .height();
    Ok(Obstacles {
        ylabel_width,
        max_ytick_width,
        title_height,
    })
}

/// Computes the adjustment for one panel. Pure: nothing here touches the figure.
pub fn adjust_panel(
    token: char,
    slot: Rect,
    obstacles: Obstacles,
    footprint: Footprint,
    theme: &Theme,
    layout: &LayoutConfig,
    size_inches: (f32, f32),
) -> PanelAdjustment {
    let padding = Padding::new(theme.label_font_size, layout.padding_factor, size_inches);
    let insets = Insets::new(padding, footprint, obstacles);
    let rect = insets.apply(slot);

    // Written so a NaN extent also takes the skip path.
    let outcome = if !(rect.width() > 0.0 && rect.height() > 0.0) {
        warn!(
            token = %token,
            width = rect.width(),
            height = rect.height(),
            "panel too small for the requested font/layout, keeping its slot"
        );
        Outcome::Skipped {
            width: rect.width(),
            height: rect.height(),
        }
    } else {
        debug!(token = %token, left = insets.left, top = insets.top, "panel inset");
        Outcome::Inset { rect }
    };

    let anchor = LabelAnchor {
        x: slot.x0 + padding.x,
        y: slot.y1 - padding.y - footprint.height,
        ha: HAlign::Left,
        va: VAlign::Bottom,
    };

    PanelAdjustment {
        token,
        slot,
        padding,
        insets,
        outcome,
        anchor,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::figure::{Figure, Tick};
    use crate::oracle::FixedOracle;
    use crate::text_metrics::DeterministicMeasurer;
    use proptest::prelude::*;
    use std::sync::Arc;

    const SIZE: (f32, f32) = (8.0, 4.0);

    fn footprint() -> Footprint {
        Footprint {
            width: 0.02,
            height: 0.05,
        }
    }

    fn obstacles() -> Obstacles {
        Obstacles {
            ylabel_width: 0.01,
            max_ytick_width: 0.03,
            title_height: 0.04,
        }
    }

    fn layout(padding_factor: f32) -> LayoutConfig {
        LayoutConfig {
            padding_factor,
            ..LayoutConfig::default()
        }
    }

    #[test]
    fn padding_is_a_constant_physical_length() {
        // 18pt * 0.5 = 9pt = 0.125in.
        let p = Padding::new(18.0, 0.5, SIZE);
        assert!((p.x - 0.125 / 8.0).abs() < 1e-6);
        assert!((p.y - 0.125 / 4.0).abs() < 1e-6);
        assert!((p.gap() - p.x / 2.0).abs() < 1e-9);
    }

    #[test]
    fn insets_stack_label_ylabel_and_ticks() {
        let theme = Theme::classic();
        let slot = Rect::new(0.1, 0.1, 0.5, 0.9);
        let adj = adjust_panel('A', slot, obstacles(), footprint(), &theme, &layout(0.5), SIZE);
        let p = adj.padding;
        let expected_left = p.x + 0.02 + p.gap() + 0.01 + p.gap() + 0.03 + p.gap();
        let expected_top = p.y + 0.05 + p.y + 0.04;
        assert!((adj.insets.left - expected_left).abs() < 1e-6);
        assert!((adj.insets.top - expected_top).abs() < 1e-6);

        let rect = adj.rect();
        assert!((rect.x0 - (0.1 + expected_left)).abs() < 1e-6);
        assert!((rect.y1 - (0.9 - expected_top)).abs() < 1e-6);
        assert_eq!(rect.x1, slot.x1);
        assert_eq!(rect.y0, slot.y0);
        assert!(adj.warning().is_none());
    }

    #[test]
    fn anchor_sits_inside_the_top_left_padding() {
        let theme = Theme::classic();
        let slot = Rect::new(0.1, 0.1, 0.5, 0.9);
        let adj = adjust_panel('A', slot, obstacles(), footprint(), &theme, &layout(0.5), SIZE);
        let glyph = adj.anchor.place(footprint().width, footprint().height);
        assert!((glyph.x0 - (slot.x0 + adj.padding.x)).abs() < 1e-6);
        assert!((glyph.y1 - (slot.y1 - adj.padding.y)).abs() < 1e-6);
        // The glyph never reaches into the plotting area.
        assert!(glyph.x1 < adj.rect().x0);
        assert!(glyph.y0 > adj.rect().y1);
    }

    #[test]
    fn narrow_slot_is_skipped_with_a_warning_and_a_stable_anchor() {
        let theme = Theme::classic();
        let p = Padding::new(theme.label_font_size, 0.5, SIZE);
        // Narrower than padding + footprint width.
        let slot = Rect::new(0.1, 0.1, 0.1 + p.x + footprint().width * 0.5, 0.9);
        let adj = adjust_panel('C', slot, obstacles(), footprint(), &theme, &layout(0.5), SIZE);
        assert!(matches!(adj.outcome, Outcome::Skipped { .. }));
        assert_eq!(adj.rect(), slot);
        assert!(matches!(
            adj.warning(),
            Some(Warning::PanelTooSmall { token: 'C', .. })
        ));
        assert!((adj.anchor.x - (slot.x0 + p.x)).abs() < 1e-6);
    }

    #[test]
    fn short_slot_is_skipped_too() {
        let theme = Theme::classic();
        let slot = Rect::new(0.1, 0.5, 0.9, 0.52);
        let adj = adjust_panel('D', slot, obstacles(), footprint(), &theme, &layout(0.5), SIZE);
        match adj.outcome {
            Outcome::Skipped { width, height } => {
                assert!(width > 0.0);
                assert!(height <= 0.0);
            }
            other => panic!("expected skip, got {other:?}"),
        }
    }

    #[test]
    fn obstacles_come_from_the_panel_texts() {
        let mut config = Config::default();
        config.render.width = 8.0;
        config.render.height = 4.0;
        let mut fig = Figure::new(&config, Arc::new(DeterministicMeasurer::default()));
        {
            let axes = fig.add_axes('A', Rect::new(0.1, 0.1, 0.9, 0.9));
            axes.ylabel = "volts".to_string();
            axes.title = "run 1".to_string();
            axes.yticks = ["0", "250", "", "1000"]
                .iter()
                .enumerate()
                .map(|(i, label)| Tick {
                    value: i as f64,
                    label: label.to_string(),
                })
                .collect();
        }
        fig.draw();
        let theme = &config.theme;
        let axes = fig.axes('A').unwrap();
        let obstacles = measure_obstacles(&fig, axes, theme).unwrap();

        let oracle = FixedOracle::new(8.0, 4.0);
        let widest = oracle.measure("1000", theme.font_size, FontWeight::Normal).unwrap();
        let title = oracle.measure("run 1", theme.title_size, FontWeight::Normal).unwrap();
        let ylabel = oracle
            .measure_vertical("volts", theme.axis_label_size, FontWeight::Normal)
            .unwrap();
        assert!((obstacles.max_ytick_width - widest.width()).abs() < 1e-6);
        assert!((obstacles.title_height - title.height()).abs() < 1e-6);
        assert!((obstacles.ylabel_width - ylabel.width()).abs() < 1e-6);
    }

    #[test]
    fn empty_texts_are_not_obstacles() {
        let config = Config::default();
        let mut fig = Figure::new(&config, Arc::new(DeterministicMeasurer::default()));
        fig.add_axes('A', Rect::new(0.1, 0.1, 0.9, 0.9));
        fig.draw();
        let obstacles = measure_obstacles(&fig, fig.axes('A').unwrap(), &config.theme).unwrap();
        assert_eq!(obstacles, Obstacles::default());
    }

    #[test]
    fn obstacles_need_a_rendered_figure() {
        let config = Config::default();
        let mut fig = Figure::new(&config, Arc::new(DeterministicMeasurer::default()));
        fig.add_axes('A', Rect::new(0.1, 0.1, 0.9, 0.9)).ylabel = "y".to_string();
        assert!(measure_obstacles(&fig, fig.axes('A').unwrap(), &config.theme).is_err());
    }

    #[test]
    fn nan_padding_never_moves_the_panel() {
        let theme = Theme::classic();
        let slot = Rect::new(0.1, 0.1, 0.9, 0.9);
        let adj = adjust_panel('A', slot, obstacles(), footprint(), &theme, &layout(f32::NAN), SIZE);
        assert!(matches!(adj.outcome, Outcome::Skipped { .. }));
        assert_eq!(adj.rect(), slot);
        assert!(matches!(adj.warning(), Some(Warning::PanelTooSmall { token: 'A', .. })));
    }

    proptest! {
        #[test]
        fn inset_grows_strictly_with_padding_factor(
            a in 0.01f32..4.0,
            delta in 0.01f32..4.0,
        ) {
            let theme = Theme::classic();
            let slot = Rect::new(0.1, 0.1, 0.9, 0.9);
            let low = adjust_panel('A', slot, obstacles(), footprint(), &theme, &layout(a), SIZE);
            let high = adjust_panel('A', slot, obstacles(), footprint(), &theme, &layout(a + delta), SIZE);
            prop_assert!(high.insets.left > low.insets.left);
            prop_assert!(high.insets.top > low.insets.top);
        }

        #[test]
        fn huge_padding_always_skips_without_panicking(
            x0 in 0.0f32..0.5,
            y0 in 0.0f32..0.5,
            w in 0.01f32..0.5,
            h in 0.01f32..0.5,
            factor in 200.0f32..10_000.0,
        ) {
            let theme = Theme::classic();
            let slot = Rect::new(x0, y0, x0 + w, y0 + h);
            let adj = adjust_panel('A', slot, obstacles(), footprint(), &theme, &layout(factor), SIZE);
            prop_assert!(matches!(adj.outcome, Outcome::Skipped { .. }), "outcome was {:?}", adj.outcome);
            prop_assert_eq!(adj.rect(), slot);
        }
    }
}
