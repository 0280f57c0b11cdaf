// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for IFC model access

use crate::EntityId;
use thiserror::Error;

/// Result type alias for model operations
pub type Result<T> = std::result::Result<T, ParseError>;

/// Errors raised by a model provider
#[derive(Error, Debug)]
pub enum ParseError {
    /// Invalid IFC file format
    #[error("Invalid IFC format: {0}")]
    InvalidFormat(String),

    /// Entity not found
    #[error("Entity {0} not found")]
    EntityNotFound(EntityId),

    /// Missing required attribute
    #[error("Missing attribute {attribute} on entity {entity}")]
    MissingAttribute {
        entity: EntityId,
        attribute: &'static str,
    },

    /// Placement chain deeper than the configured guard, usually a cycle
    #[error("Placement chain starting at {start} exceeds {max_depth} levels")]
    PlacementDepth { start: EntityId, max_depth: usize },

    /// Geometry processing error
    #[error("Geometry error for entity {entity}: {message}")]
    Geometry { entity: EntityId, message: String },

    /// Shape settings the provider cannot honour
    #[error("Unsupported shape request for {entity}: {message}")]
    UnsupportedShape { entity: EntityId, message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ParseError {
    /// Create a new format error
    pub fn format(msg: impl Into<String>) -> Self {
        ParseError::InvalidFormat(msg.into())
    }

    /// Create a missing-attribute error
    pub fn missing(entity: EntityId, attribute: &'static str) -> Self {
        ParseError::MissingAttribute { entity, attribute }
    }

    /// Create a new geometry error
    pub fn geometry(entity: EntityId, msg: impl Into<String>) -> Self {
        ParseError::Geometry {
            entity,
            message: msg.into(),
        }
    }

    /// Create an unsupported-shape error
    pub fn unsupported(entity: EntityId, msg: impl Into<String>) -> Self {
        ParseError::UnsupportedShape {
            entity,
            message: msg.into(),
        }
    }
}
