use serde::Serialize;

/// Axis-aligned rectangle in figure-fraction coordinates. The origin is the
/// bottom-left corner of the figure and `y` grows upwards.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Rect {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

/// Extent of a rendered piece of text, in figure fractions.
pub type BBox = Rect;

impl Rect {
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn from_origin(width: f32, height: f32) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    pub fn center(&self) -> (f32, f32) {
        ((self.x0 + self.x1) / 2.0, (self.y0 + self.y1) / 2.0)
    }

    pub fn translate(&self, dx: f32, dy: f32) -> Self {
        Self::new(self.x0 + dx, self.y0 + dy, self.x1 + dx, self.y1 + dy)
    }

    pub fn union(&self, other: &Rect) -> Self {
        Self::new(
            self.x0.min(other.x0),
            self.y0.min(other.y0),
            self.x1.max(other.x1),
            self.y1.max(other.y1),
        )
    }

    /// Strict overlap; rectangles that only share an edge do not intersect.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x0 < other.x1 && other.x0 < self.x1 && self.y0 < other.y1 && other.y0 < self.y1
    }

    pub fn contains(&self, other: &Rect) -> bool {
        other.x0 >= self.x0 && other.x1 <= self.x1 && other.y0 >= self.y0 && other.y1 <= self.y1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HAlign {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VAlign {
    Bottom,
    Center,
    Top,
}

impl HAlign {
    /// Offset of the box's left edge from the anchor, for a box `width` wide.
    pub fn left_of(self, x: f32, width: f32) -> f32 {
        match self {
            Self::Left => x,
            Self::Center => x - width / 2.0,
            Self::Right => x - width,
        }
    }
}

impl VAlign {
    pub fn bottom_of(self, y: f32, height: f32) -> f32 {
        match self {
            Self::Bottom => y,
            Self::Center => y - height / 2.0,
            Self::Top => y - height,
        }
    }
}

/// Where a panel label glyph is placed, together with how the glyph box is
/// aligned to that point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LabelAnchor {
    pub x: f32,
    pub y: f32,
    pub ha: HAlign,
    pub va: VAlign,
}

impl LabelAnchor {
    /// Box a glyph of the given extent occupies when placed at this anchor.
    pub fn place(&self, width: f32, height: f32) -> Rect {
        let x0 = self.ha.left_of(self.x, width);
        let y0 = self.va.bottom_of(self.y, height);
        Rect::new(x0, y0, x0 + width, y0 + height)
    }
}
