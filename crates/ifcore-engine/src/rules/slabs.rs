// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Slab thickness
//!
//! Floor slabs must fall within `slab_thickness_min_mm`..`slab_thickness_max_mm`,
//! roof slabs (named "roof") within the `roof_slab_thickness_*` range.
//! Finish layers, wood joist floors and live roofs carry no structural
//! requirement and are skipped.

use super::{check_length, storey_name};
use crate::config::RuleConfig;
use crate::dimension::{DimensionResolver, GeometryAxis, NamePattern, QuantitySpec};
use crate::error::RuleError;
use crate::evaluate::Requirement;
use crate::registry::Rule;
use crate::report::ElementResult;
use ifcore_model::{Element, IfcModel, IfcType};

const NON_STRUCTURAL: &[&str] = &["finish", "wood joist", "live roof"];

pub fn rules() -> Vec<Rule> {
    vec![Rule::new("Slab Thickness", check_slab_thickness)]
}

fn thickness_spec() -> QuantitySpec {
    QuantitySpec::length("thickness")
        .from_quantity_sets(
            &["Qto_SlabBaseQuantities", "BaseQuantities"],
            &["Depth", "Width", "Thickness"],
        )
        .from_geometry(GeometryAxis::ExtrusionDepth)
        .from_property_sets(
            &["Pset_SlabCommon", "Dimensions", "Construction"],
            &["Depth", "Thickness", "Width"],
        )
        .from_name(NamePattern::Smaller)
        .from_material_layers()
        .plausible_mm(1.0, 3000.0)
}

fn lower_name(slab: &Element) -> String {
    slab.name.as_deref().unwrap_or_default().to_lowercase()
}

pub(crate) fn is_non_structural(slab: &Element) -> bool {
    let name = lower_name(slab);
    NON_STRUCTURAL.iter().any(|kw| name.contains(kw))
}

pub fn check_slab_thickness(
    model: &dyn IfcModel,
    config: &RuleConfig,
) -> Result<Vec<ElementResult>, RuleError> {
    let floor = Requirement::Between(
        config.threshold("slab_thickness_min_mm")?,
        config.threshold("slab_thickness_max_mm")?,
    );
    let roof = Requirement::Between(
        config.threshold("roof_slab_thickness_min_mm")?,
        config.threshold("roof_slab_thickness_max_mm")?,
    );
    let resolver = DimensionResolver::new(model);
    let spec = thickness_spec();
    let mut results = Vec::new();

    for slab in model.elements(&IfcType::IfcSlab) {
        config.check_deadline()?;
        if is_non_structural(&slab) {
            log::trace!("skipping non-structural slab {}", slab.id);
            continue;
        }

        let (requirement, kind) = if lower_name(&slab).contains("roof") {
            (roof, "roof slab")
        } else {
            (floor, "floor slab")
        };
        let storey = storey_name(model, &slab);
        let name = slab.display_name();

        let row = check_length(&resolver, &slab, &spec, requirement);
        let required = format!("{} ({kind})", requirement.describe("mm"));
        results.push(
            row.with_required(required)
                .with_name(format!("{storey} / {name}"))
                .with_long_name(format!("{name} ({storey})")),
        );
    }

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::ElementStatus;
    use ifcore_model::{Extrusion, InMemoryModel, QuantitySet, UnitDeclaration};

    fn slab(id: u32, name: &str, depth_m: f64) -> (Element, QuantitySet) {
        (
            Element::new(id, IfcType::IfcSlab).with_name(name),
            QuantitySet::new("Qto_SlabBaseQuantities").with_length("Depth", depth_m),
        )
    }

    fn model_with(slabs: &[(&str, f64)]) -> InMemoryModel {
        slabs
            .iter()
            .enumerate()
            .fold(InMemoryModel::new(), |model, (i, (name, depth))| {
                let (element, qset) = slab(i as u32 + 1, name, *depth);
                model
                    .with_element(element)
                    .with_quantity_set(i as u32 + 1, qset)
            })
    }

    #[test]
    fn test_range_is_inclusive() {
        let model = model_with(&[
            ("Floor 150", 0.15),
            ("Floor 200", 0.2),
            ("Floor 210", 0.21),
            ("Floor 100", 0.1),
        ]);
        let rows = check_slab_thickness(&model, &RuleConfig::default()).unwrap();
        let statuses: Vec<_> = rows.iter().map(|r| r.check_status).collect();
        assert_eq!(
            statuses,
            [
                ElementStatus::Pass,
                ElementStatus::Pass,
                ElementStatus::Fail,
                ElementStatus::Pass,
            ]
        );
        assert_eq!(
            rows[2].comment.as_deref(),
            Some("value is 10 mm above the maximum of 200 mm")
        );
        assert_eq!(rows[0].required_value.as_deref(), Some("100-200 mm (floor slab)"));
        assert_eq!(rows[0].element_name, "Unknown Storey / Floor 150");
    }

    #[test]
    fn test_roof_and_non_structural_slabs() {
        let model = model_with(&[
            ("Roof - Concrete", 0.25),
            ("Floor Finish", 0.02),
            ("Wood Joist Floor", 0.3),
            ("Live Roof", 0.4),
        ]);
        let rows = check_slab_thickness(&model, &RuleConfig::default()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].check_status, ElementStatus::Pass);
        assert_eq!(rows[0].required_value.as_deref(), Some("200-350 mm (roof slab)"));
    }

    #[test]
    fn test_extrusion_depth_in_millimetres() {
        let model = InMemoryModel::new()
            .with_length_unit(UnitDeclaration::metre(Some("MILLI")))
            .with_element(Element::new(1, IfcType::IfcSlab).with_name("Floor"))
            .with_extrusion(1, Extrusion { profile: None, depth: Some(80.0) });

        let rows = check_slab_thickness(&model, &RuleConfig::default()).unwrap();
        assert_eq!(rows[0].check_status, ElementStatus::Fail);
        assert_eq!(rows[0].actual_value.as_deref(), Some("80 mm"));
        assert_eq!(
            rows[0].comment.as_deref(),
            Some("value is 20 mm below the minimum of 100 mm")
        );
    }

    #[test]
    fn test_thresholds_come_from_config() {
        let model = model_with(&[("Floor", 0.22)]);
        let config = RuleConfig::default().with_threshold("slab_thickness_max_mm", 250.0);
        let rows = check_slab_thickness(&model, &config).unwrap();
        assert_eq!(rows[0].check_status, ElementStatus::Pass);
    }
}
