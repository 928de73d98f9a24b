use serde::Serialize;
use tracing::debug;

use crate::error::Result;
use crate::oracle::TextOracle;
use crate::theme::Theme;

/// Uniform box reserved for every panel label, in figure fractions.
///
/// Width and height are maxima taken independently, so they may come from
/// different labels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Footprint {
    pub width: f32,
    pub height: f32,
}

/// Measures each label at the label font and keeps the running maxima.
pub fn label_footprint<'a, I>(oracle: &dyn TextOracle, labels: I, theme: &Theme) -> Result<Footprint>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut footprint = Footprint::default();
    let mut count = 0usize;
    for label in labels {
        let extent = oracle.measure(label, theme.label_font_size, theme.label_weight)?;
        footprint.width = footprint.width.max(extent.width());
        footprint.height = footprint.height.max(extent.height());
        count += 1;
    }
    debug!(
        labels = count,
        width = footprint.width,
        height = footprint.height,
        "label footprint"
    );
    Ok(footprint)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::FixedOracle;
    use crate::text_metrics::FontWeight;
    use proptest::prelude::*;

    #[test]
    fn width_and_height_maxima_are_independent() {
        // "W" is the widest label, "g" the tallest.
        let oracle = FixedOracle::new(4.0, 2.0)
            .pin("W", 36.0, 10.0)
            .pin("g", 12.0, 24.0)
            .pin("a", 10.0, 10.0);
        let fp = label_footprint(&oracle, ["W", "g", "a"], &Theme::classic()).unwrap();
        assert!((fp.width - 36.0 / 72.0 / 4.0).abs() < 1e-6);
        assert!((fp.height - 24.0 / 72.0 / 2.0).abs() < 1e-6);
    }

    #[test]
    fn no_labels_reserve_nothing() {
        let oracle = FixedOracle::new(6.4, 4.8);
        let fp = label_footprint(&oracle, std::iter::empty(), &Theme::classic()).unwrap();
        assert_eq!(fp, Footprint::default());
    }

    #[test]
    fn uses_the_theme_label_font() {
        let oracle = FixedOracle::new(6.4, 4.8);
        let mut theme = Theme::classic();
        theme.label_weight = FontWeight::Normal;
        let normal = label_footprint(&oracle, ["A"], &theme).unwrap();
        theme.label_weight = FontWeight::Bold;
        let bold = label_footprint(&oracle, ["A"], &theme).unwrap();
        theme.label_font_size *= 2.0;
        let big = label_footprint(&oracle, ["A"], &theme).unwrap();
        assert!(bold.width > normal.width);
        assert!(big.width > bold.width && big.height > bold.height);
    }

    proptest! {
        #[test]
        fn footprint_bounds_every_label_and_matches_the_widest(
            labels in prop::collection::vec("[A-Za-z0-9()]{1,4}", 1..12)
        ) {
            let oracle = FixedOracle::new(6.4, 4.8);
            let theme = Theme::classic();
            let fp = label_footprint(&oracle, labels.iter().map(String::as_str), &theme).unwrap();
            let mut widest = 0.0f32;
            for label in &labels {
                let b = oracle.measure(label, theme.label_font_size, theme.label_weight).unwrap();
                prop_assert!(fp.width >= b.width());
                prop_assert!(fp.height >= b.height());
                widest = widest.max(b.width());
            }
            prop_assert_eq!(fp.width, widest);
        }
    }
}
