// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! IFCore STEP - IFC (ISO-10303-21) reader
//!
//! Implements the `ifcore-model` traits over STEP exchange files.
//!
//! # Features
//!
//! - **Fast scanning** using `memchr` to index entity instances
//! - **Tokenization** using `nom` combinators
//! - **Lazy entity decoding** with an `RwLock`-guarded `Arc` cache
//! - **Relationship indexes** for property sets, types, materials and containment
//!
//! # Example
//!
//! ```ignore
//! use ifcore_model::IfcType;
//!
//! let model = ifcore_step::open("house.ifc")?;
//! let walls = model.elements(&IfcType::IfcWall);
//! println!("Found {} walls", walls.len());
//! ```

mod entity;
mod header;
mod model;
mod properties;
mod relations;
mod scanner;
mod shapes;
mod spatial;
mod store;
mod tokenizer;
mod units;

pub use entity::{AttributeValue, DecodedEntity};
pub use model::StepModel;
pub use tokenizer::parse_entity;

use ifcore_model::{IfcModel, IfcParser, Result};
use std::path::Path;
use std::sync::Arc;

/// STEP/IFC parser implementing the `IfcParser` trait
#[derive(Clone, Copy, Debug, Default)]
pub struct StepParser;

impl StepParser {
    pub fn new() -> Self {
        Self
    }
}

impl IfcParser for StepParser {
    fn parse(&self, content: &str) -> Result<Arc<dyn IfcModel>> {
        StepModel::parse(content).map(|m| Arc::new(m) as Arc<dyn IfcModel>)
    }
}

/// Quick parse function for simple use cases
pub fn parse(content: &str) -> Result<Arc<dyn IfcModel>> {
    StepParser::new().parse(content)
}

/// Read and parse a file
pub fn open(path: impl AsRef<Path>) -> Result<Arc<dyn IfcModel>> {
    let path = path.as_ref();
    log::debug!("reading {}", path.display());
    let bytes = std::fs::read(path)?;
    // Non-ASCII bytes only occur inside string literals
    let content = String::from_utf8_lossy(&bytes);
    parse(&content)
}
