//! The drawing surface shared by content drawing, probing and labeling.
//!
//! Every mutation bumps a revision counter. Text measurements are only valid
//! against a rendered revision, so [`Figure`] refuses to answer
//! [`TextOracle::measure`] until [`Figure::draw`] has run on the current state.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::geometry::{BBox, HAlign, Rect, VAlign};
use crate::oracle::{POINTS_PER_INCH, TextOracle, extent_to_fraction};
use crate::text_metrics::{FontWeight, TextMeasurer};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tick {
    pub value: f64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Line2D {
    pub points: Vec<(f64, f64)>,
    pub color: Option<String>,
}

/// One panel's plotting area and its decorations.
#[derive(Debug, Clone)]
pub struct Axes {
    token: char,
    slot: Rect,
    position: Rect,
    adjusted: bool,
    pub axis_visible: bool,
    pub lines: Vec<Line2D>,
    pub xlim: (f64, f64),
    pub ylim: (f64, f64),
    pub xticks: Vec<Tick>,
    pub yticks: Vec<Tick>,
    pub xlabel: String,
    pub ylabel: String,
    pub title: String,
}

impl Axes {
    fn new(token: char, slot: Rect) -> Self {
        Self {
            token,
            slot,
            position: slot,
            adjusted: false,
            axis_visible: true,
            lines: Vec::new(),
            xlim: (0.0, 1.0),
            ylim: (0.0, 1.0),
            xticks: Vec::new(),
            yticks: Vec::new(),
            xlabel: String::new(),
            ylabel: String::new(),
            title: String::new(),
        }
    }

    pub fn token(&self) -> char {
        self.token
    }

    /// Rectangle solved from the mosaic.
    pub fn slot(&self) -> Rect {
        self.slot
    }

    /// Current content rectangle.
    pub fn position(&self) -> Rect {
        self.position
    }

    pub fn is_adjusted(&self) -> bool {
        self.adjusted
    }

    /// Moves the content rectangle from the slot to `rect`. This happens at
    /// most once; later calls are ignored and return `false`.
    pub fn set_position(&mut self, rect: Rect) -> bool {
        if self.adjusted {
            return false;
        }
        self.position = rect;
        self.adjusted = true;
        true
    }

    pub fn ytick_labels(&self) -> impl Iterator<Item = &str> {
        self.yticks
            .iter()
            .map(|tick| tick.label.as_str())
            .filter(|label| !label.is_empty())
    }

    fn map_x(&self, value: f64) -> f32 {
        let (lo, hi) = self.xlim;
        let t = if hi > lo { (value - lo) / (hi - lo) } else { 0.5 };
        self.position.x0 + t as f32 * self.position.width()
    }

    fn map_y(&self, value: f64) -> f32 {
        let (lo, hi) = self.ylim;
        let t = if hi > lo { (value - lo) / (hi - lo) } else { 0.5 };
        self.position.y0 + t as f32 * self.position.height()
    }

    /// Maps a data point into figure fractions.
    pub fn to_figure(&self, (x, y): (f64, f64)) -> (f32, f32) {
        (self.map_x(x), self.map_y(y))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "token", rename_all = "snake_case")]
pub enum TextRole {
    PanelLabel(char),
    Legend(char),
}

impl TextRole {
    pub fn token(self) -> char {
        match self {
            Self::PanelLabel(token) | Self::Legend(token) => token,
        }
    }
}

/// Free text placed in figure fractions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FigureText {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub font_size: f32,
    pub weight: FontWeight,
    pub ha: HAlign,
    pub va: VAlign,
    pub role: TextRole,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtistKind {
    XTickLabel,
    YTickLabel,
    XLabel,
    YLabel,
    Title,
    Text(TextRole),
}

/// A text artist positioned by the render pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedText {
    pub kind: ArtistKind,
    pub token: Option<char>,
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub font_size: f32,
    pub weight: FontWeight,
    pub ha: HAlign,
    pub va: VAlign,
    /// Counter-clockwise rotation in degrees.
    pub rotation: f32,
    pub bbox: BBox,
}

#[derive(Debug, Clone)]
pub struct RenderState {
    revision: u64,
    pub texts: Vec<PlacedText>,
}

impl RenderState {
    pub fn texts_for(&self, token: char) -> impl Iterator<Item = &PlacedText> {
        self.texts.iter().filter(move |t| t.token == Some(token))
    }

    pub fn find(&self, kind: ArtistKind, token: Option<char>) -> Option<&PlacedText> {
        self.texts.iter().find(|t| t.kind == kind && t.token == token)
    }
}

pub struct Figure {
    config: Config,
    measurer: Arc<dyn TextMeasurer>,
    axes: BTreeMap<char, Axes>,
    texts: Vec<FigureText>,
    revision: u64,
    rendered: Option<RenderState>,
}

impl std::fmt::Debug for Figure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Figure")
            .field("size_inches", &self.config.render.size_inches())
            .field("axes", &self.axes.len())
            .field("texts", &self.texts.len())
            .field("revision", &self.revision)
            .field("stale", &self.is_stale())
            .finish()
    }
}

impl Figure {
    pub fn new(config: &Config, measurer: Arc<dyn TextMeasurer>) -> Self {
        Self {
            config: config.clone(),
            measurer,
            axes: BTreeMap::new(),
            texts: Vec::new(),
            revision: 0,
            rendered: None,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn add_axes(&mut self, token: char, slot: Rect) -> &mut Axes {
        self.touch();
        let axes = Axes::new(token, slot);
        match self.axes.entry(token) {
            Entry::Occupied(mut entry) => {
                entry.insert(axes);
                entry.into_mut()
            }
            Entry::Vacant(entry) => entry.insert(axes),
        }
    }

    pub fn axes(&self, token: char) -> Option<&Axes> {
        self.axes.get(&token)
    }

    /// Mutable access to a panel. Any mutable access invalidates the last render.
    pub fn axes_mut(&mut self, token: char) -> Result<&mut Axes> {
        if !self.axes.contains_key(&token) {
            return Err(Error::UnknownPanel { token });
        }
        self.touch();
        self.axes
            .get_mut(&token)
            .ok_or(Error::UnknownPanel { token })
    }

    pub fn all_axes(&self) -> impl Iterator<Item = &Axes> {
        self.axes.values()
    }

    pub fn add_text(&mut self, text: FigureText) -> usize {
        self.touch();
        self.texts.push(text);
        self.texts.len() - 1
    }

    pub fn texts(&self) -> &[FigureText] {
        &self.texts
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn is_stale(&self) -> bool {
        self.rendered
            .as_ref()
            .is_none_or(|state| state.revision != self.revision)
    }

    /// Last render pass, provided it still matches the figure.
    pub fn rendered(&self) -> Result<&RenderState> {
        match &self.rendered {
            Some(state) if state.revision == self.revision => Ok(state),
            _ => Err(Error::StaleRender),
        }
    }

    /// Renders only when something changed since the last pass.
    pub fn ensure_rendered(&mut self) {
        if self.is_stale() {
            self.draw();
        }
    }

    /// The render pass: positions and measures every text artist.
    pub fn draw(&mut self) {
        let mut texts = Vec::new();
        for axes in self.axes.values() {
            if axes.axis_visible {
                self.place_axes_texts(axes, &mut texts);
            }
        }
        for text in &self.texts {
            if text.text.is_empty() {
                continue;
            }
            let extent = self.text_box(&text.text, text.font_size, text.weight);
            texts.push(placed(
                ArtistKind::Text(text.role),
                Some(text.role.token()),
                &text.text,
                (text.x, text.y),
                (text.font_size, text.weight),
                (text.ha, text.va),
                0.0,
                extent,
            ));
        }
        debug!(revision = self.revision, artists = texts.len(), "figure rendered");
        self.rendered = Some(RenderState {
            revision: self.revision,
            texts,
        });
    }

    fn touch(&mut self) {
        self.revision += 1;
    }

    fn points_to_fraction(&self, points: f32) -> (f32, f32) {
        let (width_in, height_in) = self.config.render.size_inches();
        (
            points / POINTS_PER_INCH / width_in,
            points / POINTS_PER_INCH / height_in,
        )
    }

    fn text_box(&self, text: &str, font_size: f32, weight: FontWeight) -> BBox {
        extent_to_fraction(
            self.measurer.measure(text, font_size, weight),
            self.config.render.size_inches(),
        )
    }

    fn place_axes_texts(&self, axes: &Axes, out: &mut Vec<PlacedText>) {
        let theme = &self.config.theme;
        let layout = &self.config.layout;
        let pos = axes.position;
        let token = Some(axes.token);
        let (tick_pad_x, tick_pad_y) = self.points_to_fraction(layout.tick_pad);
        let (label_pad_x, label_pad_y) = self.points_to_fraction(layout.label_pad);
        let (_, title_pad_y) = self.points_to_fraction(layout.title_pad);
        let tick_font = (theme.font_size, FontWeight::Normal);

        let mut max_ytick_width = 0.0f32;
        for tick in axes.yticks.iter().filter(|t| !t.label.is_empty()) {
            let extent = self.text_box(&tick.label, theme.font_size, FontWeight::Normal);
            max_ytick_width = max_ytick_width.max(extent.width());
            out.push(placed(
                ArtistKind::YTickLabel,
                token,
                &tick.label,
                (pos.x0 - tick_pad_x, axes.map_y(tick.value)),
                tick_font,
                (HAlign::Right, VAlign::Center),
                0.0,
                extent,
            ));
        }

        let mut max_xtick_height = 0.0f32;
        for tick in axes.xticks.iter().filter(|t| !t.label.is_empty()) {
            let extent = self.text_box(&tick.label, theme.font_size, FontWeight::Normal);
            max_xtick_height = max_xtick_height.max(extent.height());
            out.push(placed(
                ArtistKind::XTickLabel,
                token,
                &tick.label,
                (axes.map_x(tick.value), pos.y0 - tick_pad_y),
                tick_font,
                (HAlign::Center, VAlign::Top),
                0.0,
                extent,
            ));
        }

        if !axes.ylabel.is_empty() {
            let horizontal = self.text_box(&axes.ylabel, theme.axis_label_size, FontWeight::Normal);
            let (width_in, height_in) = self.config.render.size_inches();
            let extent = BBox::from_origin(
                horizontal.height() * height_in / width_in,
                horizontal.width() * width_in / height_in,
            );
            out.push(placed(
                ArtistKind::YLabel,
                token,
                &axes.ylabel,
                (
                    pos.x0 - tick_pad_x - max_ytick_width - label_pad_x,
                    pos.center().1,
                ),
                (theme.axis_label_size, FontWeight::Normal),
                (HAlign::Right, VAlign::Center),
                90.0,
                extent,
            ));
        }

        if !axes.xlabel.is_empty() {
            let extent = self.text_box(&axes.xlabel, theme.axis_label_size, FontWeight::Normal);
            out.push(placed(
                ArtistKind::XLabel,
                token,
                &axes.xlabel,
                (
                    pos.center().0,
                    pos.y0 - tick_pad_y - max_xtick_height - label_pad_y,
                ),
                (theme.axis_label_size, FontWeight::Normal),
                (HAlign::Center, VAlign::Top),
                0.0,
                extent,
            ));
        }

        if !axes.title.is_empty() {
            let extent = self.text_box(&axes.title, theme.title_size, FontWeight::Normal);
            out.push(placed(
                ArtistKind::Title,
                token,
                &axes.title,
                (pos.center().0, pos.y1 + title_pad_y),
                (theme.title_size, FontWeight::Normal),
                (HAlign::Center, VAlign::Bottom),
                0.0,
                extent,
            ));
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn placed(
    kind: ArtistKind,
    token: Option<char>,
    text: &str,
    (x, y): (f32, f32),
    (font_size, weight): (f32, FontWeight),
    (ha, va): (HAlign, VAlign),
    rotation: f32,
    extent: BBox,
) -> PlacedText {
    let x0 = ha.left_of(x, extent.width());
    let y0 = va.bottom_of(y, extent.height());
    PlacedText {
        kind,
        token,
        text: text.to_string(),
        x,
        y,
        font_size,
        weight,
        ha,
        va,
        rotation,
        bbox: Rect::new(x0, y0, x0 + extent.width(), y0 + extent.height()),
    }
}

impl TextOracle for Figure {
    fn size_inches(&self) -> (f32, f32) {
        self.config.render.size_inches()
    }

    fn measure(&self, text: &str, font_size: f32, weight: FontWeight) -> Result<BBox> {
        if self.is_stale() {
            return Err(Error::StaleRender);
        }
        Ok(self.text_box(text, font_size, weight))
    }
}
