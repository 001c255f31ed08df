// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Core traits for model access

use crate::{
    Element, IfcType, ModelMetadata, PropertyReader, Result, ShapeReader, SpatialQuery,
    UnitDeclaration,
};
use std::sync::Arc;

/// Parsing interface - entry point for loading model content
///
/// # Example
///
/// ```ignore
/// use ifcore_model::{IfcParser, IfcModel};
///
/// let parser: Box<dyn IfcParser> = get_parser();
/// let model = parser.parse(ifc_content)?;
/// println!("Schema: {}", model.metadata().schema_version);
/// ```
pub trait IfcParser: Send + Sync {
    /// Parse content and return a shared, read-only model
    fn parse(&self, content: &str) -> Result<Arc<dyn IfcModel>>;
}

/// Read-only model handle
///
/// Every method takes `&self` and there is no way to change the model through
/// it, so one `Arc<dyn IfcModel>` can be handed to any number of concurrently
/// running rules.
pub trait IfcModel: Send + Sync {
    /// File metadata (schema version, originating system, etc.)
    fn metadata(&self) -> &ModelMetadata;

    /// Length unit declared by the project, if any
    fn length_unit(&self) -> Option<&UnitDeclaration>;

    /// All elements of a type, in file order
    fn elements(&self, ifc_type: &IfcType) -> Vec<Element>;

    /// Total number of entity instances
    fn element_count(&self) -> usize;

    /// Property and quantity access
    fn properties(&self) -> &dyn PropertyReader;

    /// Shape-derived dimensions
    fn shapes(&self) -> &dyn ShapeReader;

    /// Storeys and containment
    fn spatial(&self) -> &dyn SpatialQuery;

    /// Elements of several types, deduplicated by ID
    fn elements_of(&self, types: &[IfcType]) -> Vec<Element> {
        let mut seen = std::collections::HashSet::new();
        types
            .iter()
            .flat_map(|t| self.elements(t))
            .filter(|e| seen.insert(e.id))
            .collect()
    }
}
