// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Shape-derived dimensions
//!
//! Compliance rules never need meshes, only the few numbers an extrusion or
//! an element's overall-size attributes carry.

use crate::EntityId;

/// Kind of swept profile
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProfileKind {
    Rectangle,
    Circle,
    IShape,
    Other(String),
}

/// Cross-section profile of an extrusion, in model units
#[derive(Clone, Debug, PartialEq)]
pub struct Profile {
    pub kind: ProfileKind,
    /// XDim, diameter, or overall width depending on the kind
    pub x_dim: Option<f64>,
    /// YDim, diameter, or overall depth depending on the kind
    pub y_dim: Option<f64>,
}

impl Profile {
    /// Rectangular profile
    pub fn rectangle(x_dim: f64, y_dim: f64) -> Self {
        Self {
            kind: ProfileKind::Rectangle,
            x_dim: Some(x_dim),
            y_dim: Some(y_dim),
        }
    }
}

/// Extruded area solid found in an element's body representation
#[derive(Clone, Debug, PartialEq)]
pub struct Extrusion {
    /// Swept profile, if it is one we can read dimensions from
    pub profile: Option<Profile>,
    /// Extrusion depth in model units
    pub depth: Option<f64>,
}

/// Overall size attributes carried by doors and windows
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct OverallDimensions {
    pub width: Option<f64>,
    pub height: Option<f64>,
}

/// Access to shape-derived dimensions
pub trait ShapeReader: Send + Sync {
    /// Extrusions of the element's representation, in file order
    fn extrusions(&self, id: EntityId) -> Vec<Extrusion>;

    /// OverallWidth / OverallHeight attributes
    fn overall_dimensions(&self, id: EntityId) -> OverallDimensions;
}
