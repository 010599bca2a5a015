//! Error types for content loading and progression persistence.

use std::fmt;

/// Failures surfaced by the file-backed collaborators.
///
/// None of these are fatal: callers log them and continue with fallback state.
#[derive(Debug, Clone, PartialEq)]
pub enum NavError {
    Read { path: String, message: String },
    Write { path: String, message: String },
    Parse { source: String, message: String },
    UnknownMap { map_id: String },
}

impl NavError {
    pub fn read(path: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Read {
            path: path.into(),
            message: message.to_string(),
        }
    }

    pub fn write(path: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Write {
            path: path.into(),
            message: message.to_string(),
        }
    }

    pub fn parse(source: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Parse {
            source: source.into(),
            message: message.to_string(),
        }
    }

    pub fn unknown_map(map_id: impl Into<String>) -> Self {
        Self::UnknownMap {
            map_id: map_id.into(),
        }
    }
}

impl fmt::Display for NavError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read { path, message } => write!(f, "Read error ({}): {}", path, message),
            Self::Write { path, message } => write!(f, "Write error ({}): {}", path, message),
            Self::Parse { source, message } => {
                write!(f, "RON parse error ({}): {}", source, message)
            }
            Self::UnknownMap { map_id } => write!(f, "Unknown map: {}", map_id),
        }
    }
}

impl std::error::Error for NavError {}
