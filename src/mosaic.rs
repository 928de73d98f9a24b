//! Mosaic grids: rows of single-character tokens where every distinct token
//! marks one rectangular panel.

use std::collections::BTreeMap;
use std::ops::Range;

use serde::Serialize;

use crate::config::LayoutConfig;
use crate::error::{Error, Result};
use crate::geometry::Rect;

/// Token reserved for the legend area. It never carries a panel label.
pub const LEGEND_TOKEN: char = '0';

/// Grid cells covered by one panel; both ranges are half-open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PanelRegion {
    pub rows: Range<usize>,
    pub cols: Range<usize>,
}

impl PanelRegion {
    pub fn contains(&self, row: usize, col: usize) -> bool {
        self.rows.contains(&row) && self.cols.contains(&col)
    }
}

#[derive(Debug, Clone)]
pub struct Mosaic {
    n_rows: usize,
    n_cols: usize,
    regions: BTreeMap<char, PanelRegion>,
}

impl Mosaic {
    /// Parses rows of tokens. Whitespace inside a row is ignored; every row
    /// must then have the same number of cells.
    pub fn parse<S: AsRef<str>>(rows: &[S]) -> Result<Self> {
        let grid: Vec<Vec<char>> = rows
            .iter()
            .map(|row| row.as_ref().chars().filter(|c| !c.is_whitespace()).collect())
            .filter(|cells: &Vec<char>| !cells.is_empty())
            .collect();
        let Some(first) = grid.first() else {
            return Err(Error::EmptyGrid);
        };
        let n_cols = first.len();
        for (row, cells) in grid.iter().enumerate() {
            if cells.len() != n_cols {
                return Err(Error::MalformedGrid {
                    row,
                    expected: n_cols,
                    found: cells.len(),
                });
            }
        }

        // Bounding box and cell count per token; the token is rectangular
        // exactly when it fills its bounding box.
        let mut bounds: BTreeMap<char, (PanelRegion, usize)> = BTreeMap::new();
        for (r, cells) in grid.iter().enumerate() {
            for (c, &token) in cells.iter().enumerate() {
                let entry = bounds.entry(token).or_insert_with(|| {
                    (
                        PanelRegion {
                            rows: r..r + 1,
                            cols: c..c + 1,
                        },
                        0,
                    )
                });
                let region = &mut entry.0;
                region.rows = region.rows.start.min(r)..region.rows.end.max(r + 1);
                region.cols = region.cols.start.min(c)..region.cols.end.max(c + 1);
                entry.1 += 1;
            }
        }

        let mut regions = BTreeMap::new();
        for (token, (region, count)) in bounds {
            if region.rows.len() * region.cols.len() != count {
                return Err(Error::NonRectangularPanel { token });
            }
            regions.insert(token, region);
        }

        Ok(Self {
            n_rows: grid.len(),
            n_cols,
            regions,
        })
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    /// Tokens in lexical order. This is the processing order for panels.
    pub fn tokens(&self) -> impl Iterator<Item = char> + '_ {
        self.regions.keys().copied()
    }

    pub fn region(&self, token: char) -> Option<&PanelRegion> {
        self.regions.get(&token)
    }

    pub fn regions(&self) -> &BTreeMap<char, PanelRegion> {
        &self.regions
    }

    pub fn contains(&self, token: char) -> bool {
        self.regions.contains_key(&token)
    }

    /// Re-renders the grid from the solved regions.
    pub fn to_rows(&self) -> Vec<String> {
        let mut grid = vec![vec![' '; self.n_cols]; self.n_rows];
        for (&token, region) in &self.regions {
            for row in region.rows.clone() {
                for col in region.cols.clone() {
                    grid[row][col] = token;
                }
            }
        }
        grid.into_iter().map(|cells| cells.into_iter().collect()).collect()
    }

    /// Solves every panel's slot rectangle in figure fractions, following
    /// grid-spec rules: the area between the margins is split into equal
    /// cells separated by `wspace`/`hspace` times the mean cell size.
    pub fn slots(&self, config: &LayoutConfig) -> BTreeMap<char, Rect> {
        let cols = self.n_cols as f32;
        let rows = self.n_rows as f32;
        let cell_w = (config.right - config.left) / (cols + config.wspace * (cols - 1.0));
        let cell_h = (config.top - config.bottom) / (rows + config.hspace * (rows - 1.0));
        let step_x = cell_w * (1.0 + config.wspace);
        let step_y = cell_h * (1.0 + config.hspace);

        self.regions
            .iter()
            .map(|(&token, region)| {
                let x0 = config.left + region.cols.start as f32 * step_x;
                let x1 = config.left + (region.cols.end - 1) as f32 * step_x + cell_w;
                let y1 = config.top - region.rows.start as f32 * step_y;
                let y0 = config.top - (region.rows.end - 1) as f32 * step_y - cell_h;
                (token, Rect::new(x0, y0, x1, y1))
            })
            .collect()
    }
}
