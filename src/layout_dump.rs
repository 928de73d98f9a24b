use crate::footprint::Footprint;
use crate::geometry::{HAlign, Rect, VAlign};
use crate::labels::PanelRole;
use crate::pipeline::FigureLayout;
use serde::Serialize;
use std::io::{BufWriter, Write};

#[derive(Debug, Serialize)]
pub struct LayoutDump {
    pub width: f32,
    pub height: f32,
    pub dpi: f32,
    pub footprint: Footprint,
    pub panels: Vec<PanelDump>,
    pub warnings: Vec<WarningDump>,
}

#[derive(Debug, Serialize)]
pub struct PanelDump {
    pub token: char,
    pub kind: String,
    pub sheets: Vec<String>,
    pub slot: [f32; 4],
    pub rect: [f32; 4],
    pub adjusted: bool,
    pub label: Option<LabelDump>,
}

#[derive(Debug, Serialize)]
pub struct LabelDump {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub ha: HAlign,
    pub va: VAlign,
}

#[derive(Debug, Serialize)]
pub struct WarningDump {
    pub token: char,
    pub message: String,
}

fn corners(rect: &Rect) -> [f32; 4] {
    [rect.x0, rect.y0, rect.x1, rect.y1]
}

impl LayoutDump {
    pub fn from_layout(layout: &FigureLayout) -> Self {
        let render = &layout.figure.config().render;
        let panels = layout
            .panels
            .values()
            .map(|panel| {
                let (kind, sheets) = match &panel.role {
                    PanelRole::Labeled { sheets, .. } => ("labeled", sheets.clone()),
                    PanelRole::Placeholder => ("placeholder", Vec::new()),
                    PanelRole::Legend => ("legend", Vec::new()),
                };
                PanelDump {
                    token: panel.token,
                    kind: kind.to_string(),
                    sheets,
                    slot: corners(&panel.slot),
                    rect: corners(&panel.rect),
                    adjusted: panel.adjusted,
                    label: panel.label.as_ref().map(|label| LabelDump {
                        text: label.text.clone(),
                        x: label.anchor.x,
                        y: label.anchor.y,
                        ha: label.anchor.ha,
                        va: label.anchor.va,
                    }),
                }
            })
            .collect();

        let warnings = layout
            .warnings
            .iter()
            .map(|warning| WarningDump {
                token: warning.token(),
                message: warning.to_string(),
            })
            .collect();

        LayoutDump {
            width: render.width,
            height: render.height,
            dpi: render.dpi,
            footprint: layout.footprint,
            panels,
            warnings,
        }
    }
}

/// Serializes `dump` as pretty JSON into `writer`.
pub fn write_layout_dump<W: Write>(writer: W, dump: &LayoutDump) -> anyhow::Result<()> {
    let mut writer = BufWriter::new(writer);
    serde_json::to_writer_pretty(&mut writer, dump)?;
    writer.flush()?;
    Ok(())
}
