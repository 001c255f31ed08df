// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! IFCore Model - read-only access to building models
//!
//! This crate defines the surface that compliance rules are allowed to see of a
//! building model. Parser backends implement [`IfcModel`] and its sub-traits;
//! rules only ever receive a shared `&dyn IfcModel` and can't mutate it.
//!
//! # Architecture
//!
//! - [`IfcParser`] - Entry point for turning file content into a model
//! - [`IfcModel`] - Element queries, metadata and the declared length unit
//! - [`PropertyReader`] - Property sets, quantity sets and material layers
//! - [`ShapeReader`] - Extrusion profiles and overall dimensions
//! - [`SpatialQuery`] - Storeys and element containment
//!
//! [`InMemoryModel`] implements all of them over plain collections, which is
//! what rule tests are written against.
//!
//! # Example
//!
//! ```ignore
//! use ifcore_model::{IfcModel, IfcType};
//!
//! for wall in model.elements(&IfcType::IfcWall) {
//!     for qset in model.properties().quantity_sets(wall.id) {
//!         println!("{}: {} quantities", qset.name, qset.quantities.len());
//!     }
//! }
//! ```

pub mod error;
pub mod memory;
pub mod properties;
pub mod shapes;
pub mod spatial;
pub mod traits;
pub mod types;

pub use error::*;
pub use memory::*;
pub use properties::*;
pub use shapes::*;
pub use spatial::*;
pub use traits::*;
pub use types::*;
