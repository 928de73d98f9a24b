use crate::error::{Error, Result};
use crate::text_metrics::FontWeight;
use crate::theme::Theme;
use serde::{Deserialize, Serialize};
use serde_yaml::Value as YamlValue;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Multiplier on the label font size giving the physical padding around
    /// each panel label.
    pub padding_factor: f32,
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
    /// Horizontal gap between grid columns, as a fraction of the mean column width.
    pub wspace: f32,
    /// Vertical gap between grid rows, as a fraction of the mean row height.
    pub hspace: f32,
    /// Distance in points between the axes frame and its tick labels.
    pub tick_pad: f32,
    /// Distance in points between the tick labels and the axis label.
    pub label_pad: f32,
    /// Distance in points between the axes frame and its title.
    pub title_pad: f32,
    pub tick_length: f32,
    pub ytick_count: usize,
    pub xtick_count: usize,
    pub legend_text: String,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            padding_factor: 0.5,
            left: 0.125,
            right: 0.9,
            top: 0.88,
            bottom: 0.11,
            wspace: 0.2,
            hspace: 0.2,
            tick_pad: 3.5,
            label_pad: 4.0,
            title_pad: 6.0,
            tick_length: 3.5,
            ytick_count: 6,
            xtick_count: 6,
            legend_text: "LEGEND".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Figure width in inches.
    pub width: f32,
    /// Figure height in inches.
    pub height: f32,
    pub dpi: f32,
    pub background: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 6.4,
            height: 4.8,
            dpi: 100.0,
            background: "#FFFFFF".to_string(),
        }
    }
}

impl RenderConfig {
    pub fn size_inches(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    pub fn size_pixels(&self) -> (f32, f32) {
        (self.width * self.dpi, self.height * self.dpi)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub theme: Theme,
    pub layout: LayoutConfig,
    pub render: RenderConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ThemeVariables {
    font_family: Option<String>,
    font_size: Option<f32>,
    axis_label_size: Option<f32>,
    title_size: Option<f32>,
    label_font_size: Option<f32>,
    label_weight: Option<FontWeight>,
    legend_font_size: Option<f32>,
    text_color: Option<String>,
    line_color: Option<String>,
    frame_color: Option<String>,
    background: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct LayoutVariables {
    padding_factor: Option<f32>,
    left: Option<f32>,
    right: Option<f32>,
    top: Option<f32>,
    bottom: Option<f32>,
    wspace: Option<f32>,
    hspace: Option<f32>,
    tick_pad: Option<f32>,
    label_pad: Option<f32>,
    title_pad: Option<f32>,
    ytick_count: Option<usize>,
    xtick_count: Option<usize>,
    legend_text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct FigureVariables {
    width: Option<f32>,
    height: Option<f32>,
    dpi: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<String>,
    theme_variables: ThemeVariables,
    layout: LayoutVariables,
    figure: FigureVariables,
}

impl Config {
    /// Rejects values the layout cannot work with. NaN fails every check.
    pub fn validate(&self) -> anyhow::Result<()> {
        let theme = &self.theme;
        for (name, size) in [
            ("fontSize", theme.font_size),
            ("axisLabelSize", theme.axis_label_size),
            ("titleSize", theme.title_size),
            ("labelFontSize", theme.label_font_size),
            ("legendFontSize", theme.legend_font_size),
        ] {
            if !(size.is_finite() && size > 0.0) {
                return Err(anyhow::anyhow!("{name} must be a positive number of points, got {size}"));
            }
        }

        let layout = &self.layout;
        for (name, value) in [
            ("paddingFactor", layout.padding_factor),
            ("wspace", layout.wspace),
            ("hspace", layout.hspace),
            ("tickPad", layout.tick_pad),
            ("labelPad", layout.label_pad),
            ("titlePad", layout.title_pad),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(anyhow::anyhow!("{name} must be finite and not negative, got {value}"));
            }
        }
        if !(layout.left < layout.right && layout.bottom < layout.top) {
            return Err(anyhow::anyhow!(
                "layout margins leave no room for panels (left={}, right={}, bottom={}, top={})",
                layout.left,
                layout.right,
                layout.bottom,
                layout.top
            ));
        }

        let render = &self.render;
        if !(render.width.is_finite() && render.width > 0.0)
            || !(render.height.is_finite() && render.height > 0.0)
            || !(render.dpi.is_finite() && render.dpi > 0.0)
        {
            return Err(anyhow::anyhow!("figure size and dpi must be positive"));
        }
        Ok(())
    }
}

/// Loads a style sheet. JSON5 is accepted so style files can carry comments.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}

pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let parsed: ConfigFile = json5::from_str(contents)?;
    let mut config = Config::default();

    if let Some(name) = parsed.theme.as_deref() {
        config.theme = match name {
            "modern" => Theme::modern(),
            "classic" | "default" => Theme::classic(),
            other => return Err(anyhow::anyhow!("unknown theme '{other}'")),
        };
    }

    let vars = parsed.theme_variables;
    if let Some(v) = vars.font_family {
        config.theme.font_family = v;
    }
    if let Some(v) = vars.font_size {
        config.theme.font_size = v;
    }
    if let Some(v) = vars.axis_label_size {
        config.theme.axis_label_size = v;
    }
    if let Some(v) = vars.title_size {
        config.theme.title_size = v;
    }
    if let Some(v) = vars.label_font_size {
        config.theme.label_font_size = v;
    }
    if let Some(v) = vars.label_weight {
        config.theme.label_weight = v;
    }
    if let Some(v) = vars.legend_font_size {
        config.theme.legend_font_size = v;
    }
    if let Some(v) = vars.text_color {
        config.theme.text_color = v;
    }
    if let Some(v) = vars.line_color {
        config.theme.line_color = v;
    }
    if let Some(v) = vars.frame_color {
        config.theme.frame_color = v;
    }
    if let Some(v) = vars.background {
        config.theme.background = v;
    }

    let layout = parsed.layout;
    if let Some(v) = layout.padding_factor {
        config.layout.padding_factor = v;
    }
    if let Some(v) = layout.left {
        config.layout.left = v;
    }
    if let Some(v) = layout.right {
        config.layout.right = v;
    }
    if let Some(v) = layout.top {
        config.layout.top = v;
    }
    if let Some(v) = layout.bottom {
        config.layout.bottom = v;
    }
    if let Some(v) = layout.wspace {
        config.layout.wspace = v;
    }
    if let Some(v) = layout.hspace {
        config.layout.hspace = v;
    }
    if let Some(v) = layout.tick_pad {
        config.layout.tick_pad = v;
    }
    if let Some(v) = layout.label_pad {
        config.layout.label_pad = v;
    }
    if let Some(v) = layout.title_pad {
        config.layout.title_pad = v;
    }
    if let Some(v) = layout.ytick_count {
        config.layout.ytick_count = v;
    }
    if let Some(v) = layout.xtick_count {
        config.layout.xtick_count = v;
    }
    if let Some(v) = layout.legend_text {
        config.layout.legend_text = v;
    }

    if let Some(v) = parsed.figure.width {
        config.render.width = v;
    }
    if let Some(v) = parsed.figure.height {
        config.render.height = v;
    }
    if let Some(v) = parsed.figure.dpi {
        config.render.dpi = v;
    }
    config.render.background = config.theme.background.clone();

    config.validate()?;
    Ok(config)
}

/// Parsed plot specification: which sheet feeds which mosaic panel, and the
/// mosaic itself.
#[derive(Debug, Clone, Default)]
pub struct PlotSpec {
    /// Sheet name to single-character panel token.
    pub sheet2panel: BTreeMap<String, String>,
    /// Mosaic rows, e.g. `["IIJJ", "KKKK", "0000"]`.
    pub layout_rows: Vec<String>,
    /// Display text overrides; a panel's label defaults to its token.
    pub labels: BTreeMap<char, String>,
    /// Use the sheet name as the panel title.
    pub titles: bool,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LayoutValue {
    Block(String),
    Rows(Vec<YamlValue>),
}

#[derive(Debug, Deserialize)]
struct RawPlotSpec {
    sheet2panel: Option<YamlValue>,
    layout: Option<LayoutValue>,
    #[serde(default)]
    labels: BTreeMap<String, String>,
    #[serde(default)]
    titles: bool,
}

impl PlotSpec {
    pub fn from_yaml_str(contents: &str) -> Result<Self> {
        let raw: Option<RawPlotSpec> = serde_yaml::from_str(contents)?;
        let raw = raw.ok_or_else(|| invalid("document is empty"))?;

        let mapping = match raw.sheet2panel {
            Some(YamlValue::Mapping(mapping)) => mapping,
            Some(_) => return Err(invalid("sheet2panel must be a mapping")),
            None => return Err(invalid("missing required key: sheet2panel")),
        };
        let mut sheet2panel = BTreeMap::new();
        for (key, value) in &mapping {
            let sheet = scalar_to_string(key).ok_or_else(|| invalid("sheet names must be scalars"))?;
            let token = scalar_to_string(value)
                .ok_or_else(|| invalid(&format!("panel id for sheet '{sheet}' must be a scalar")))?;
            sheet2panel.insert(sheet, token);
        }

        let layout_rows = match raw.layout {
            Some(layout) => normalize_layout(layout)?,
            None => return Err(invalid("missing required key: layout")),
        };

        let mut labels = BTreeMap::new();
        for (key, text) in raw.labels {
            let mut chars = key.chars();
            match (chars.next(), chars.next()) {
                (Some(token), None) => {
                    labels.insert(token, text);
                }
                _ => return Err(invalid(&format!("label key '{key}' must be a single character"))),
            }
        }

        Ok(Self {
            sheet2panel,
            layout_rows,
            labels,
            titles: raw.titles,
        })
    }
}

pub fn load_plot_spec(path: &Path) -> Result<PlotSpec> {
    let contents = std::fs::read_to_string(path).map_err(|err| Error::io(path, err))?;
    PlotSpec::from_yaml_str(&contents)
}

fn normalize_layout(layout: LayoutValue) -> Result<Vec<String>> {
    let rows: Vec<String> = match layout {
        LayoutValue::Block(block) => block.lines().map(|row| row.trim().to_string()).collect(),
        LayoutValue::Rows(rows) => rows
            .iter()
            .map(|row| {
                scalar_to_string(row)
                    .map(|s| s.trim().to_string())
                    .ok_or_else(|| invalid("layout rows must be strings"))
            })
            .collect::<Result<_>>()?,
    };
    Ok(rows.into_iter().filter(|row| !row.is_empty()).collect())
}

fn scalar_to_string(value: &YamlValue) -> Option<String> {
    match value {
        YamlValue::String(s) => Some(s.clone()),
        YamlValue::Number(n) => Some(n.to_string()),
        YamlValue::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn invalid(message: &str) -> Error {
    Error::InvalidSpec {
        message: message.to_string(),
    }
}
