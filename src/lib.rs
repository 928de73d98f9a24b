pub mod adjust;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod content;
pub mod error;
pub mod figure;
pub mod footprint;
pub mod geometry;
pub mod labels;
pub mod layout_dump;
pub mod mosaic;
pub mod oracle;
pub mod pipeline;
pub mod render;
pub mod text_metrics;
pub mod theme;
pub mod workbook;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{Config, PlotSpec};
pub use error::{Error, Result, Warning};
pub use figure::Figure;
pub use mosaic::Mosaic;
pub use oracle::TextOracle;
pub use pipeline::{FigureLayout, build_figure, label_panels};
pub use workbook::Workbook;
