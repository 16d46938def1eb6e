use std::{fmt, io, path::PathBuf};

use dibdump::DibErr;
use machine_learning::MlErr;

use crate::Stage;

/// The orchestrator's result type.
pub type Result<T> = std::result::Result<T, OrchestratorError>;

/// All errors that can occur in the orchestrator.
#[derive(Debug)]
pub enum OrchestratorError {
    /// Invalid configuration, caught before training.
    InvalidConfig(String),
    /// A malformed line in a network or cases file.
    Parse {
        path: Option<PathBuf>,
        line: usize,
        msg: String,
    },
    /// Failed to read or write one of the pipeline's files.
    Io { path: PathBuf, source: io::Error },
    /// The perceptron or its trainer failed.
    Ml(MlErr),
    /// Failed to read, write or convert a bitmap.
    Bitmap(DibErr),
    /// A malformed pipeline config or weights snapshot.
    Json(serde_json::Error),
    /// A pipeline stage failed, the following stages were not run.
    Stage {
        stage: Stage,
        source: Box<OrchestratorError>,
    },
}

impl OrchestratorError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io { path, source }
    }

    pub(crate) fn parse(line: usize, msg: impl Into<String>) -> Self {
        Self::Parse {
            path: None,
            line,
            msg: msg.into(),
        }
    }

    /// Attaches the file a parse error comes from.
    pub(crate) fn in_file(self, file: impl Into<PathBuf>) -> Self {
        match self {
            Self::Parse {
                path: None,
                line,
                msg,
            } => Self::Parse {
                path: Some(file.into()),
                line,
                msg,
            },
            e => e,
        }
    }
}

impl fmt::Display for OrchestratorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConfig(msg) => write!(f, "invalid config: {msg}"),
            Self::Parse {
                path: Some(path),
                line,
                msg,
            } => write!(f, "{}:{line}: {msg}", path.display()),
            Self::Parse {
                path: None,
                line,
                msg,
            } => write!(f, "line {line}: {msg}"),
            Self::Io { path, source } => write!(f, "{}: {source}", path.display()),
            Self::Ml(e) => write!(f, "training error: {e}"),
            Self::Bitmap(e) => write!(f, "bitmap error: {e}"),
            Self::Json(e) => write!(f, "json error: {e}"),
            Self::Stage { stage, source } => write!(f, "{stage} stage failed: {source}"),
        }
    }
}

impl std::error::Error for OrchestratorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Ml(e) => Some(e),
            Self::Bitmap(e) => Some(e),
            Self::Json(e) => Some(e),
            Self::Stage { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

impl From<MlErr> for OrchestratorError {
    fn from(e: MlErr) -> Self {
        Self::Ml(e)
    }
}

impl From<DibErr> for OrchestratorError {
    fn from(e: DibErr) -> Self {
        Self::Bitmap(e)
    }
}

impl From<serde_json::Error> for OrchestratorError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}
