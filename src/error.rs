use std::path::PathBuf;

/// Fatal conditions. Any of these aborts the run before output is written.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("layout is empty: at least one non-blank row is required")]
    EmptyGrid,
    #[error("layout row {row} has {found} cells, expected {expected}")]
    MalformedGrid {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("panel '{token}' does not form a single rectangle in the layout")]
    NonRectangularPanel { token: char },
    #[error("sheet2panel contains panel ids not present in layout: {}", format_tokens(.tokens))]
    UnplacedPanel { tokens: Vec<char> },
    #[error("sheet '{sheet}' maps to '{value}', panel ids must be a single character")]
    InvalidToken { sheet: String, value: String },
    #[error("sheet2panel contains sheets not found in the workbook: {}", .sheets.join(", "))]
    MissingSheets { sheets: Vec<String> },
    #[error("sheet '{sheet}' is missing required columns x, y (found: {})", .found.join(", "))]
    MissingColumns { sheet: String, found: Vec<String> },
    #[error("invalid plot spec: {message}")]
    InvalidSpec { message: String },
    #[error("no panel '{token}' in this figure")]
    UnknownPanel { token: char },
    #[error("text measured before the figure was rendered")]
    StaleRender,
    #[error("figure panels are already labeled")]
    AlreadyLabeled,
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{}: {source}", .path.display())]
    Spreadsheet {
        path: PathBuf,
        #[source]
        source: calamine::Error,
    },
    #[error("{}: unsupported workbook format (expected .xlsx, .xlsm, .xlsb, .xls, .ods or .json)", .path.display())]
    UnsupportedWorkbook { path: PathBuf },
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Recoverable conditions. They are logged and collected, never fatal.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Warning {
    #[error("panel '{token}' is not mapped from any sheet and will be an empty placeholder")]
    UnlabeledPanel { token: char },
    #[error("panel '{token}' is too small for the requested font/layout ({width:.4} x {height:.4})")]
    PanelTooSmall { token: char, width: f32, height: f32 },
}

impl Warning {
    pub fn token(&self) -> char {
        match self {
            Self::UnlabeledPanel { token } | Self::PanelTooSmall { token, .. } => *token,
        }
    }
}

fn format_tokens(tokens: &[char]) -> String {
    tokens
        .iter()
        .map(|t| t.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
