//! The text-measurement seam between the layout core and a rendering surface.
//!
//! The footprint calculator and the geometry adjuster only ever see text
//! through [`TextOracle`], so they run unchanged against a real [`Figure`]
//! (which refuses to answer until it has been rendered) or against
//! [`FixedOracle`] in tests.
//!
//! [`Figure`]: crate::figure::Figure

use std::collections::HashMap;

use crate::error::Result;
use crate::geometry::BBox;
use crate::text_metrics::{DeterministicMeasurer, TextExtent, TextMeasurer};

pub use crate::text_metrics::FontWeight;

/// Points per inch.
pub const POINTS_PER_INCH: f32 = 72.0;

pub trait TextOracle {
    /// Physical figure size in inches, `(width, height)`.
    fn size_inches(&self) -> (f32, f32);

    /// Box of `text` rendered horizontally at the figure origin, in figure
    /// fractions. Empty text measures as a zero box.
    fn measure(&self, text: &str, font_size: f32, weight: FontWeight) -> Result<BBox>;

    /// Box of `text` rotated by 90 degrees, as used for y-axis labels.
    fn measure_vertical(&self, text: &str, font_size: f32, weight: FontWeight) -> Result<BBox> {
        let horizontal = self.measure(text, font_size, weight)?;
        let (width_in, height_in) = self.size_inches();
        // Swap the physical extents, then re-normalise each against the other axis.
        let width = horizontal.height() * height_in / width_in;
        let height = horizontal.width() * width_in / height_in;
        Ok(BBox::from_origin(width, height))
    }
}

/// Converts an extent in points into a figure-fraction box at the origin.
pub fn extent_to_fraction(extent: TextExtent, size_inches: (f32, f32)) -> BBox {
    let (width_in, height_in) = size_inches;
    BBox::from_origin(
        extent.width / POINTS_PER_INCH / width_in,
        extent.height / POINTS_PER_INCH / height_in,
    )
}

/// Deterministic oracle with no canvas behind it. Individual strings can be
/// pinned to exact point extents to build specific scenarios.
#[derive(Debug, Clone)]
pub struct FixedOracle {
    size_inches: (f32, f32),
    measurer: DeterministicMeasurer,
    pinned: HashMap<String, TextExtent>,
}

impl FixedOracle {
    pub fn new(width_in: f32, height_in: f32) -> Self {
        Self {
            size_inches: (width_in, height_in),
            measurer: DeterministicMeasurer::default(),
            pinned: HashMap::new(),
        }
    }

    pub fn with_measurer(mut self, measurer: DeterministicMeasurer) -> Self {
        self.measurer = measurer;
        self
    }

    /// Pins `text` to an exact extent in points, regardless of size or weight.
    pub fn pin(mut self, text: &str, width_pt: f32, height_pt: f32) -> Self {
        self.pinned.insert(
            text.to_string(),
            TextExtent {
                width: width_pt,
                height: height_pt,
            },
        );
        self
    }
}

impl TextOracle for FixedOracle {
    fn size_inches(&self) -> (f32, f32) {
        self.size_inches
    }

    fn measure(&self, text: &str, font_size: f32, weight: FontWeight) -> Result<BBox> {
        let extent = match self.pinned.get(text) {
            Some(extent) => *extent,
            None => self.measurer.measure(text, font_size, weight),
        };
        Ok(extent_to_fraction(extent, self.size_inches))
    }
}
