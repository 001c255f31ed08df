// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for model loading

use crate::EntityId;
use thiserror::Error;

/// Result type alias for model loading operations
pub type Result<T> = std::result::Result<T, ParseError>;

/// Errors that can occur while loading a model
///
/// Only model loading can fail. Once a model exists, every query on it is
/// infallible and reports missing data as `None` or an empty collection.
#[derive(Error, Debug)]
pub enum ParseError {
    /// Not an ISO-10303-21 exchange file, or a structurally broken one
    #[error("Invalid IFC format: {0}")]
    InvalidFormat(String),

    /// Failed to parse header section
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// Failed to parse entity
    #[error("Failed to parse entity {0}: {1}")]
    EntityParse(EntityId, String),

    /// The data section contained no entity instances
    #[error("Model contains no entities")]
    Empty,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ParseError {
    /// Create a new format error
    pub fn format(msg: impl Into<String>) -> Self {
        ParseError::InvalidFormat(msg.into())
    }

    /// Create a new entity parse error
    pub fn entity_parse(id: EntityId, msg: impl Into<String>) -> Self {
        ParseError::EntityParse(id, msg.into())
    }
}
