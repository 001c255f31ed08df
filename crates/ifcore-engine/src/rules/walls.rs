// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Wall checks
//!
//! - Wall Thickness: DB SE-F, at least `wall_thickness_mm`
//! - Wall U-value: CTE DB HE, external walls at most `wall_max_u_value`
//! - External Walls Must Have U-value

use super::{check_length, resolution_log, storey_name};
use crate::config::RuleConfig;
use crate::dimension::{DimensionResolver, GeometryAxis, NamePattern, QuantitySpec};
use crate::error::RuleError;
use crate::evaluate::{with_unit, Evaluation, Requirement};
use crate::registry::Rule;
use crate::report::{ElementResult, ElementStatus};
use ifcore_model::{Element, IfcModel, IfcType};

const U_UNIT: &str = "W/(m2.K)";
const U_KEYS: &[&str] = &["ThermalTransmittance", "UValue", "U-value"];

pub fn rules() -> Vec<Rule> {
    vec![
        Rule::new("Wall Thickness", check_wall_thickness),
        Rule::new("Wall U-value", check_wall_uvalue),
        Rule::new("External Walls Must Have U-value", check_external_uvalue_present),
    ]
}

fn walls(model: &dyn IfcModel) -> Vec<Element> {
    model.elements_of(&[IfcType::IfcWall, IfcType::IfcWallStandardCase])
}

fn thickness_spec() -> QuantitySpec {
    QuantitySpec::length("thickness")
        .from_quantity_sets(
            &["Qto_WallBaseQuantities", "BaseQuantities", "Dimensions"],
            &["Width", "Thickness"],
        )
        .from_geometry(GeometryAxis::ProfileMin)
        .from_property_sets(
            &["Pset_WallCommon", "Construction", "Dimensions"],
            &["Width", "Thickness"],
        )
        .from_name(NamePattern::Smaller)
        .from_material_layers()
        .plausible_mm(1.0, 5000.0)
}

fn uvalue_spec() -> QuantitySpec {
    QuantitySpec::ratio("U-value").from_property_sets(&["Pset_WallCommon"], U_KEYS)
}

/// "Level 1 / Basic Wall" and its long form
fn labelled(row: ElementResult, storey: &str, element: &Element, check: &str) -> ElementResult {
    let name = element.display_name();
    row.with_name(format!("{storey} / {name}"))
        .with_long_name(format!("{name} ({storey}) - {check}"))
}

/// IsExternal from Pset_WallCommon, then from any set
fn is_external(resolver: &DimensionResolver<'_>, wall: &Element) -> Option<bool> {
    resolver
        .property(wall, &["Pset_WallCommon"], &["IsExternal"])
        .and_then(|p| p.value.as_bool())
}

/// DB SE-F / EHE: load-bearing wall thickness
pub fn check_wall_thickness(
    model: &dyn IfcModel,
    config: &RuleConfig,
) -> Result<Vec<ElementResult>, RuleError> {
    let min_mm = config.threshold("wall_thickness_mm")?;
    let resolver = DimensionResolver::new(model);
    let spec = thickness_spec();

    walls(model)
        .iter()
        .map(|wall| -> Result<ElementResult, RuleError> {
            config.check_deadline()?;
            let storey = storey_name(model, wall);
            let row = check_length(&resolver, wall, &spec, Requirement::AtLeast(min_mm));
            Ok(labelled(row, &storey, wall, "DB SE-F Wall Thickness"))
        })
        .collect()
}

/// CTE DB HE: thermal transmittance of external walls
pub fn check_wall_uvalue(
    model: &dyn IfcModel,
    config: &RuleConfig,
) -> Result<Vec<ElementResult>, RuleError> {
    let max_u = config.threshold("wall_max_u_value")?;
    let requirement = Requirement::AtMost(max_u);
    let resolver = DimensionResolver::new(model);
    let spec = uvalue_spec();

    walls(model)
        .iter()
        .map(|wall| -> Result<ElementResult, RuleError> {
            config.check_deadline()?;
            let storey = storey_name(model, wall);
            let resolution = resolver.resolve(wall, &spec);
            let u_value = resolution.value;

            let evaluation = match (is_external(&resolver, wall), u_value) {
                (Some(false), u) => Evaluation {
                    status: ElementStatus::Pass,
                    actual: u.map(|u| with_unit(u, U_UNIT)),
                    required: Some(requirement.describe(U_UNIT)),
                    rationale: Some("Not an external wall; U-value limit does not apply".into()),
                },
                (None, None) => requirement.blocked(
                    U_UNIT,
                    "IsExternal is not set and no U-value was found in the wall property sets",
                ),
                (None, Some(u)) => Evaluation {
                    status: ElementStatus::Warning,
                    actual: Some(with_unit(u, U_UNIT)),
                    required: Some(requirement.describe(U_UNIT)),
                    rationale: Some(
                        "U-value found but IsExternal is not set; verify whether the limit applies"
                            .into(),
                    ),
                },
                (Some(true), None) => requirement.blocked(
                    U_UNIT,
                    format!("U-value not found; tried {}", resolution.attempted_text()),
                ),
                (Some(true), Some(u)) => requirement.evaluate(u, U_UNIT),
            };

            let row = ElementResult::for_element(wall, evaluation)
                .with_log(resolution_log(&resolver, &resolution));
            Ok(labelled(row, &storey, wall, "CTE DB HE U-value"))
        })
        .collect()
}

/// External walls must declare a thermal transmittance
pub fn check_external_uvalue_present(
    model: &dyn IfcModel,
    config: &RuleConfig,
) -> Result<Vec<ElementResult>, RuleError> {
    let resolver = DimensionResolver::new(model);
    let spec = uvalue_spec();
    let mut results = Vec::new();

    for wall in walls(model) {
        config.check_deadline()?;
        let external = is_external(&resolver, &wall);
        if external == Some(false) {
            continue;
        }

        let storey = storey_name(model, &wall);
        let resolution = resolver.resolve(&wall, &spec);
        let evaluation = match (external, resolution.value) {
            (None, _) => Evaluation::blocked("IsExternal is not set; cannot tell whether a U-value is required")
                .with_required("U-value present"),
            (_, Some(u)) => Evaluation {
                status: ElementStatus::Pass,
                actual: Some(with_unit(u, U_UNIT)),
                required: Some("U-value present".into()),
                rationale: Some("External wall declares a U-value".into()),
            },
            (_, None) => Evaluation {
                status: ElementStatus::Fail,
                actual: None,
                required: Some("U-value present".into()),
                rationale: Some(format!(
                    "External wall has none of {} in its property sets",
                    U_KEYS.join(", ")
                )),
            },
        };

        let row = ElementResult::for_element(&wall, evaluation)
            .with_log(resolution_log(&resolver, &resolution));
        results.push(labelled(row, &storey, &wall, "External Wall U-value"));
    }

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ifcore_model::{
        InMemoryModel, MaterialLayer, MaterialLayerSet, PropertySet, QuantitySet, Storey,
        UnitDeclaration,
    };

    fn wall(id: u32, name: &str) -> Element {
        Element::new(id, IfcType::IfcWall)
            .with_global_id(format!("wall-{id}"))
            .with_name(name)
    }

    fn common(external: Option<bool>, u: Option<f64>) -> PropertySet {
        let mut pset = PropertySet::new("Pset_WallCommon");
        if let Some(external) = external {
            pset = pset.with("IsExternal", external);
        }
        if let Some(u) = u {
            pset = pset.with("ThermalTransmittance", u);
        }
        pset
    }

    #[test]
    fn test_thickness_from_quantity_set() {
        let model = InMemoryModel::new()
            .with_storey(Storey {
                id: 100.into(),
                name: "Ground Floor".into(),
                elevation: Some(0.0),
            })
            .with_element(wall(1, "Basic Wall"))
            .with_containment(1, 100)
            .with_quantity_set(1, QuantitySet::new("Qto_WallBaseQuantities").with_length("Width", 0.09));

        let rows = check_wall_thickness(&model, &RuleConfig::default()).unwrap();
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.check_status, ElementStatus::Fail);
        assert_eq!(row.element_id.as_deref(), Some("wall-1"));
        assert_eq!(row.element_name, "Ground Floor / Basic Wall");
        assert_eq!(
            row.element_name_long.as_deref(),
            Some("Basic Wall (Ground Floor) - DB SE-F Wall Thickness")
        );
        assert_eq!(row.actual_value.as_deref(), Some("90 mm"));
        assert_eq!(
            row.comment.as_deref(),
            Some("value is 10 mm below the minimum of 100 mm")
        );
    }

    #[test]
    fn test_thickness_from_layers_in_millimetres() {
        let model = InMemoryModel::new()
            .with_length_unit(UnitDeclaration::metre(Some("MILLI")))
            .with_element(wall(1, "Exterior"))
            .with_material_layers(
                1,
                MaterialLayerSet {
                    name: Some("Cavity".into()),
                    layers: vec![
                        MaterialLayer { material: Some("Brick".into()), thickness: 115.0 },
                        MaterialLayer { material: None, thickness: 50.0 },
                        MaterialLayer { material: Some("Block".into()), thickness: 100.0 },
                    ],
                    from_type: true,
                },
            );

        let rows = check_wall_thickness(&model, &RuleConfig::default()).unwrap();
        assert_eq!(rows[0].check_status, ElementStatus::Pass);
        assert_eq!(rows[0].actual_value.as_deref(), Some("265 mm"));
        assert!(rows[0].log.as_deref().unwrap().contains("source=material layers"));
    }

    #[test]
    fn test_thickness_without_data_is_blocked() {
        let model = InMemoryModel::new().with_element(wall(1, "Exterior"));
        let rows = check_wall_thickness(&model, &RuleConfig::default()).unwrap();

        assert_eq!(rows[0].check_status, ElementStatus::Blocked);
        assert_eq!(rows[0].actual_value, None);
        assert_eq!(
            rows[0].comment.as_deref(),
            Some("Thickness not found; tried quantity set, geometry, property set, name and material layers")
        );
    }

    #[test]
    fn test_uvalue_outcomes() {
        let model = InMemoryModel::new()
            .with_element(wall(1, "Internal"))
            .with_property_set(1, common(Some(false), None))
            .with_element(wall(2, "Unknown"))
            .with_element(wall(3, "Unknown with U"))
            .with_property_set(3, common(None, Some(0.5)))
            .with_element(wall(4, "External no U"))
            .with_property_set(4, common(Some(true), None))
            .with_element(wall(5, "External poor"))
            .with_property_set(5, common(Some(true), Some(0.95)))
            .with_element(wall(6, "External good"))
            .with_type_property_set(6, common(Some(true), Some(0.8)));

        let rows = check_wall_uvalue(&model, &RuleConfig::default()).unwrap();
        let statuses: Vec<_> = rows.iter().map(|r| r.check_status).collect();
        assert_eq!(
            statuses,
            [
                ElementStatus::Pass,
                ElementStatus::Blocked,
                ElementStatus::Warning,
                ElementStatus::Blocked,
                ElementStatus::Fail,
                ElementStatus::Pass,
            ]
        );
        assert_eq!(rows[3].actual_value, None);
        assert_eq!(rows[3].required_value.as_deref(), Some("<= 0.8 W/(m2.K)"));
        assert_eq!(
            rows[3].comment.as_deref(),
            Some("U-value not found; tried property set")
        );
        assert_eq!(
            rows[4].comment.as_deref(),
            Some("value is 0.15 W/(m2.K) above the maximum of 0.8 W/(m2.K)")
        );
        assert_eq!(rows[5].actual_value.as_deref(), Some("0.8 W/(m2.K)"));
    }

    #[test]
    fn test_uvalue_is_not_length_scaled() {
        let model = InMemoryModel::new()
            .with_length_unit(UnitDeclaration::metre(Some("MILLI")))
            .with_element(wall(1, "External"))
            .with_property_set(1, common(Some(true), Some(0.35)));

        let rows = check_wall_uvalue(&model, &RuleConfig::default()).unwrap();
        assert_eq!(rows[0].check_status, ElementStatus::Pass);
        assert_eq!(rows[0].actual_value.as_deref(), Some("0.35 W/(m2.K)"));
    }

    #[test]
    fn test_uvalue_presence_skips_internal_walls() {
        let model = InMemoryModel::new()
            .with_element(wall(1, "Internal"))
            .with_property_set(1, common(Some(false), None))
            .with_element(wall(2, "External"))
            .with_property_set(2, common(Some(true), None))
            .with_element(wall(3, "Unknown"));

        let rows = check_external_uvalue_present(&model, &RuleConfig::default()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].check_status, ElementStatus::Fail);
        assert_eq!(rows[1].check_status, ElementStatus::Blocked);
        assert!(rows.iter().all(|r| r.validate().is_ok()));
    }
}
