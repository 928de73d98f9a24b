//! Default panel content: an x/y line plot per sheet.

use crate::config::LayoutConfig;
use crate::error::{Error, Result};
use crate::figure::{Axes, Line2D, Tick};
use crate::workbook::Sheet;

/// Fraction of the data range added on each side of the view limits.
const DATA_MARGIN: f64 = 0.05;

/// Draws `sheet` (columns `x` and `y`) into `axes`. Called once per sheet; a
/// panel fed by several sheets gets one line each and shared limits.
pub fn plot_default_xy(
    axes: &mut Axes,
    sheet_name: &str,
    sheet: &Sheet,
    layout: &LayoutConfig,
    show_title: bool,
) -> Result<()> {
    let (Some(xs), Some(ys)) = (sheet.column("x"), sheet.column("y")) else {
        return Err(Error::MissingColumns {
            sheet: sheet_name.to_string(),
            found: sheet.column_names(),
        });
    };
    let points: Vec<(f64, f64)> = xs
        .iter()
        .zip(ys)
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .map(|(x, y)| (*x, *y))
        .collect();
    axes.lines.push(Line2D {
        points,
        color: None,
    });

    let (xlim, ylim) = data_limits(&axes.lines);
    axes.xlim = xlim;
    axes.ylim = ylim;
    axes.xticks = ticks(xlim, layout.xtick_count);
    axes.yticks = ticks(ylim, layout.ytick_count);
    axes.xlabel = "x".to_string();
    axes.ylabel = "y".to_string();
    if show_title {
        if axes.title.is_empty() {
            axes.title = sheet_name.to_string();
        } else {
            axes.title = format!("{}, {}", axes.title, sheet_name);
        }
    }
    Ok(())
}

fn data_limits(lines: &[Line2D]) -> ((f64, f64), (f64, f64)) {
    let mut x = (f64::INFINITY, f64::NEG_INFINITY);
    let mut y = (f64::INFINITY, f64::NEG_INFINITY);
    for &(px, py) in lines.iter().flat_map(|line| &line.points) {
        x = (x.0.min(px), x.1.max(px));
        y = (y.0.min(py), y.1.max(py));
    }
    (with_margin(x), with_margin(y))
}

fn with_margin((lo, hi): (f64, f64)) -> (f64, f64) {
    if !lo.is_finite() || !hi.is_finite() {
        return (0.0, 1.0);
    }
    if hi - lo <= f64::EPSILON * hi.abs().max(1.0) {
        return (lo - 0.5, hi + 0.5);
    }
    let pad = (hi - lo) * DATA_MARGIN;
    (lo - pad, hi + pad)
}

/// Tick values at a 1/2/2.5/5 x 10^k step with roughly `target` ticks inside `lim`.
pub fn nice_ticks((lo, hi): (f64, f64), target: usize) -> (Vec<f64>, f64) {
    if hi <= lo || target == 0 {
        return (Vec::new(), 0.0);
    }
    let raw = (hi - lo) / target.max(1) as f64;
    let magnitude = 10f64.powf(raw.log10().floor());
    let step = [1.0, 2.0, 2.5, 5.0, 10.0]
        .iter()
        .map(|m| m * magnitude)
        .find(|step| *step >= raw)
        .unwrap_or(10.0 * magnitude);
    let first = (lo / step).ceil() as i64;
    let last = (hi / step).floor() as i64;
    let values = (first..=last).map(|i| i as f64 * step).collect();
    (values, step)
}

/// Formats a tick with just enough decimals for its step.
pub fn format_tick(value: f64, step: f64) -> String {
    let mut decimals = if step > 0.0 {
        (-step.log10().floor()).max(0.0) as usize
    } else {
        0
    };
    let scaled = step * 10f64.powi(decimals as i32);
    if (scaled - scaled.round()).abs() > 1e-9 {
        decimals += 1;
    }
    let text = format!("{value:.decimals$}");
    // Avoid "-0" / "-0.0" for values that round to zero.
    if text.starts_with('-') && text[1..].chars().all(|c| c == '0' || c == '.') {
        text[1..].to_string()
    } else {
        text
    }
}

fn ticks(lim: (f64, f64), target: usize) -> Vec<Tick> {
    let (values, step) = nice_ticks(lim, target);
    values
        .into_iter()
        .map(|value| Tick {
            value,
            label: format_tick(value, step),
        })
        .collect()
}
