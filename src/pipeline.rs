//! Figure assembly: grid, label resolution, content, one render pass, the
//! shared footprint, per-panel adjustment, then the legend policy.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::adjust::{PanelAdjustment, adjust_panel, measure_obstacles};
use crate::config::{Config, PlotSpec};
use crate::content::plot_default_xy;
use crate::error::{Error, Result, Warning};
use crate::figure::{Axes, Figure, FigureText, TextRole};
use crate::footprint::{Footprint, label_footprint};
use crate::geometry::{HAlign, LabelAnchor, Rect, VAlign};
use crate::labels::{LabelSet, PanelRole, resolve_labels};
use crate::mosaic::Mosaic;
use crate::oracle::TextOracle;
use crate::text_metrics::TextMeasurer;
use crate::workbook::Workbook;

/// Configuration checks that must pass before anything is drawn.
#[derive(Debug, Clone)]
pub struct Plan {
    pub mosaic: Mosaic,
    pub labels: LabelSet,
    pub warnings: Vec<Warning>,
}

pub fn plan_figure(spec: &PlotSpec) -> Result<Plan> {
    let mosaic = Mosaic::parse(&spec.layout_rows)?;
    let resolution = resolve_labels(&mosaic, &spec.sheet2panel, &spec.labels)?;
    Ok(Plan {
        mosaic,
        labels: resolution.labels,
        warnings: resolution.warnings,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PanelLabel {
    pub text: String,
    pub anchor: LabelAnchor,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PanelLayout {
    pub token: char,
    pub role: PanelRole,
    pub slot: Rect,
    pub rect: Rect,
    pub adjusted: bool,
    pub label: Option<PanelLabel>,
}

/// Result of labeling a figure's panels.
#[derive(Debug, Clone)]
pub struct Labeling {
    pub footprint: Footprint,
    pub panels: BTreeMap<char, PanelLayout>,
    pub warnings: Vec<Warning>,
}

#[derive(Debug)]
pub struct FigureLayout {
    pub figure: Figure,
    pub footprint: Footprint,
    pub panels: BTreeMap<char, PanelLayout>,
    /// Every recoverable condition of the run, resolver warnings first.
    pub warnings: Vec<Warning>,
}

/// Creates a figure with one axes per mosaic panel at its slot.
pub fn new_figure(mosaic: &Mosaic, config: &Config, measurer: Arc<dyn TextMeasurer>) -> Figure {
    let mut figure = Figure::new(config, measurer);
    for (token, slot) in mosaic.slots(&config.layout) {
        figure.add_axes(token, slot);
    }
    figure
}

/// Reserves label gutters and places labels on a figure whose content is
/// already drawn. Renders first if the figure changed since its last pass,
/// and leaves it freshly rendered. A figure is labeled at most once.
pub fn label_panels(figure: &mut Figure, labels: &LabelSet) -> Result<Labeling> {
    if figure.all_axes().any(Axes::is_adjusted) || !figure.texts().is_empty() {
        return Err(Error::AlreadyLabeled);
    }
    figure.ensure_rendered();
    let config = figure.config().clone();
    let theme = &config.theme;

    let footprint = label_footprint(&*figure, labels.labeled().map(|(_, label)| label), theme)?;

    // Measure and solve every panel against the same rendered state before
    // mutating anything.
    let size_inches = figure.size_inches();
    let mut adjustments: BTreeMap<char, PanelAdjustment> = BTreeMap::new();
    for (token, _) in labels.labeled() {
        let Some(axes) = figure.axes(token) else {
            continue;
        };
        let obstacles = measure_obstacles(&*figure, axes, theme)?;
        let adjustment = adjust_panel(
            token,
            axes.slot(),
            obstacles,
            footprint,
            theme,
            &config.layout,
            size_inches,
        );
        adjustments.insert(token, adjustment);
    }

    let mut panels = BTreeMap::new();
    let mut warnings = Vec::new();
    for (token, role) in labels.iter() {
        let Some(slot) = figure.axes(token).map(|axes| axes.slot()) else {
            continue;
        };
        let mut layout = PanelLayout {
            token,
            role: role.clone(),
            slot,
            rect: slot,
            adjusted: false,
            label: None,
        };
        match role {
            PanelRole::Labeled { label, .. } => {
                if let Some(adjustment) = adjustments.get(&token) {
                    if let Some(warning) = adjustment.warning() {
                        warnings.push(warning);
                    } else {
                        layout.adjusted = figure.axes_mut(token)?.set_position(adjustment.rect());
                    }
                    layout.rect = figure.axes(token).map(Axes::position).unwrap_or(slot);
                    figure.add_text(FigureText {
                        text: label.clone(),
                        x: adjustment.anchor.x,
                        y: adjustment.anchor.y,
                        font_size: theme.label_font_size,
                        weight: theme.label_weight,
                        ha: adjustment.anchor.ha,
                        va: adjustment.anchor.va,
                        role: TextRole::PanelLabel(token),
                    });
                    layout.label = Some(PanelLabel {
                        text: label.clone(),
                        anchor: adjustment.anchor,
                    });
                }
            }
            PanelRole::Legend => {
                figure.axes_mut(token)?.axis_visible = false;
                let (x, y) = slot.center();
                figure.add_text(FigureText {
                    text: config.layout.legend_text.clone(),
                    x,
                    y,
                    font_size: theme.legend_font_size,
                    weight: theme.label_weight,
                    ha: HAlign::Center,
                    va: VAlign::Center,
                    role: TextRole::Legend(token),
                });
            }
            PanelRole::Placeholder => {}
        }
        panels.insert(token, layout);
    }

    figure.draw();
    Ok(Labeling {
        footprint,
        panels,
        warnings,
    })
}

/// Builds the complete figure for `spec`, drawing each mapped sheet from
/// `workbook` with the default x/y plot.
pub fn build_figure(
    spec: &PlotSpec,
    workbook: &Workbook,
    config: &Config,
    measurer: Arc<dyn TextMeasurer>,
) -> Result<FigureLayout> {
    let plan = plan_figure(spec)?;
    workbook.check_sheets(spec.sheet2panel.keys())?;
    info!(
        panels = plan.labels.len(),
        rows = plan.mosaic.n_rows(),
        cols = plan.mosaic.n_cols(),
        "building figure"
    );

    let mut figure = new_figure(&plan.mosaic, config, measurer);
    for (token, role) in plan.labels.iter() {
        let PanelRole::Labeled { sheets, .. } = role else {
            continue;
        };
        for sheet_name in sheets {
            let Some(sheet) = workbook.sheet(sheet_name) else {
                continue;
            };
            plot_default_xy(
                figure.axes_mut(token)?,
                sheet_name,
                sheet,
                &config.layout,
                spec.titles,
            )?;
        }
    }

    let labeling = label_panels(&mut figure, &plan.labels)?;
    let mut warnings = plan.warnings;
    warnings.extend(labeling.warnings);
    if !warnings.is_empty() {
        warn!(count = warnings.len(), "figure built with warnings");
    }
    Ok(FigureLayout {
        figure,
        footprint: labeling.footprint,
        panels: labeling.panels,
        warnings,
    })
}
