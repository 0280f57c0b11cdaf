// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the floor-plan core

use std::fmt;
use thiserror::Error;

/// Invalid geometric primitive input
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    #[error("Non-finite coordinate ({x}, {y})")]
    NonFinite { x: f64, y: f64 },

    #[error("Polygon needs at least 3 distinct points, got {distinct}")]
    TooFewPoints { distinct: usize },

    #[error("Polygon space GUID must not be empty")]
    EmptyGuid,

    #[error("Floor elevation must be finite, got {0}")]
    NonFiniteElevation(f64),
}

/// Kind tag carried by [`ExtractionError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// No usable building storey, even after elevation clustering
    NoFloors,
    /// Floors found but none yielded a room polygon
    NoGeometry,
    /// Allocation failure during extraction
    Memory,
    /// Anything else
    Extraction,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NoFloors => "no_floors",
            ErrorKind::NoGeometry => "no_geometry",
            ErrorKind::Memory => "memory_error",
            ErrorKind::Extraction => "extraction_error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The single error surfaced by floor-geometry extraction
#[derive(Error, Debug, Clone)]
#[error("{kind}: {message}")]
pub struct ExtractionError {
    pub kind: ErrorKind,
    pub message: String,
    /// Spaces the failure concerns, when known
    pub space_ids: Vec<String>,
}

impl ExtractionError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            space_ids: Vec::new(),
        }
    }

    pub fn with_spaces(mut self, space_ids: Vec<String>) -> Self {
        self.space_ids = space_ids;
        self
    }

    pub fn no_floors(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NoFloors, message)
    }

    pub fn no_geometry(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NoGeometry, message)
    }

    pub fn memory(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Memory, message)
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Extraction, message)
    }
}

impl From<std::collections::TryReserveError> for ExtractionError {
    fn from(err: std::collections::TryReserveError) -> Self {
        ExtractionError::memory(err.to_string())
    }
}

impl From<floorplan_model::ParseError> for ExtractionError {
    fn from(err: floorplan_model::ParseError) -> Self {
        ExtractionError::other(err.to_string())
    }
}

/// Configuration loading and validation errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid config value {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}
