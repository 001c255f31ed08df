// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! ShapeReader implementation
//!
//! Only the parametric parts of a representation are read: extrusion depth
//! and the swept profile's dimensions. No geometry is evaluated.

use crate::entity::DecodedEntity;
use crate::store::EntityStore;
use ifcore_model::{
    EntityId, Extrusion, IfcType, OverallDimensions, Profile, ProfileKind, ShapeReader,
};
use std::sync::Arc;

/// Mapped items and boolean operands nest; real files stay well below this.
const MAX_ITEM_DEPTH: usize = 8;

/// Shape reader over an entity store
pub struct StepShapes {
    store: Arc<EntityStore>,
}

impl StepShapes {
    pub fn new(store: Arc<EntityStore>) -> Self {
        Self { store }
    }

    /// Collect extrusions from one representation item
    fn collect_item(&self, item: &DecodedEntity, depth: usize, out: &mut Vec<Extrusion>) {
        if depth > MAX_ITEM_DEPTH {
            log::debug!("representation item {} nested too deeply", item.id);
            return;
        }

        match item.ifc_type {
            // IfcExtrudedAreaSolid: SweptArea at 0, Depth at 3
            IfcType::IfcExtrudedAreaSolid => out.push(Extrusion {
                profile: item
                    .get_ref(0)
                    .and_then(|id| self.store.get(id))
                    .map(|p| read_profile(&p)),
                depth: item.get_float(3),
            }),
            // IfcBooleanResult: FirstOperand at 1
            IfcType::IfcBooleanResult | IfcType::IfcBooleanClippingResult => {
                if let Some(first) = item.get_ref(1).and_then(|id| self.store.get(id)) {
                    self.collect_item(&first, depth + 1, out);
                }
            }
            // IfcMappedItem: MappingSource at 0 -> IfcRepresentationMap MappedRepresentation at 1
            IfcType::IfcMappedItem => {
                let mapped = item
                    .get_ref(0)
                    .and_then(|id| self.store.get(id))
                    .and_then(|map| map.get_ref(1))
                    .and_then(|id| self.store.get(id));
                if let Some(representation) = mapped {
                    self.collect_representation(&representation, depth + 1, out);
                }
            }
            _ => {}
        }
    }

    /// IfcShapeRepresentation: Items at 3
    fn collect_representation(
        &self,
        representation: &DecodedEntity,
        depth: usize,
        out: &mut Vec<Extrusion>,
    ) {
        if let Some(items) = representation.get(3) {
            for item in self.store.resolve_refs(items) {
                self.collect_item(&item, depth, out);
            }
        }
    }
}

/// Read the dimensions of a profile definition
///
/// Rectangles carry XDim/YDim at 3/4, I-shapes OverallWidth/OverallDepth at
/// 3/4, circles a Radius at 3 that is reported as the diameter on both axes.
fn read_profile(profile: &DecodedEntity) -> Profile {
    match profile.ifc_type {
        IfcType::IfcRectangleProfileDef | IfcType::IfcRectangleHollowProfileDef => Profile {
            kind: ProfileKind::Rectangle,
            x_dim: profile.get_float(3),
            y_dim: profile.get_float(4),
        },
        IfcType::IfcIShapeProfileDef => Profile {
            kind: ProfileKind::IShape,
            x_dim: profile.get_float(3),
            y_dim: profile.get_float(4),
        },
        IfcType::IfcCircleProfileDef | IfcType::IfcCircleHollowProfileDef => {
            let diameter = profile.get_float(3).map(|r| r * 2.0);
            Profile {
                kind: ProfileKind::Circle,
                x_dim: diameter,
                y_dim: diameter,
            }
        }
        ref other => Profile {
            kind: ProfileKind::Other(other.name().to_string()),
            x_dim: None,
            y_dim: None,
        },
    }
}

impl ShapeReader for StepShapes {
    fn extrusions(&self, id: EntityId) -> Vec<Extrusion> {
        let mut out = Vec::new();

        // IfcProduct: Representation at 6 -> IfcProductDefinitionShape Representations at 2
        let Some(shape) = self
            .store
            .get(id)
            .and_then(|element| element.get_ref(6))
            .and_then(|shape| self.store.get(shape))
        else {
            return out;
        };

        if let Some(representations) = shape.get(2) {
            for representation in self.store.resolve_refs(representations) {
                self.collect_representation(&representation, 0, &mut out);
            }
        }
        out
    }

    fn overall_dimensions(&self, id: EntityId) -> OverallDimensions {
        match self.store.get(id) {
            // IfcDoor / IfcWindow: OverallHeight at 8, OverallWidth at 9
            Some(e) if matches!(e.ifc_type, IfcType::IfcDoor | IfcType::IfcWindow) => {
                OverallDimensions {
                    width: e.get_float(9),
                    height: e.get_float(8),
                }
            }
            _ => OverallDimensions::default(),
        }
    }
}
