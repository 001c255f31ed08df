// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Storeys and element containment

use crate::EntityId;

/// A building storey
#[derive(Clone, Debug, PartialEq)]
pub struct Storey {
    /// Entity ID
    pub id: EntityId,
    /// Display name
    pub name: String,
    /// Elevation in model units
    pub elevation: Option<f64>,
}

/// Spatial structure queries
pub trait SpatialQuery: Send + Sync {
    /// All storeys in file order
    fn storeys(&self) -> Vec<Storey>;

    /// Storey an element is contained in, if any
    fn container_of(&self, id: EntityId) -> Option<Storey>;

    /// Storey with the lowest elevation (storeys without one count as 0.0)
    fn lowest_storey(&self) -> Option<Storey> {
        self.storeys().into_iter().min_by(|a, b| {
            a.elevation
                .unwrap_or(0.0)
                .total_cmp(&b.elevation.unwrap_or(0.0))
        })
    }
}
