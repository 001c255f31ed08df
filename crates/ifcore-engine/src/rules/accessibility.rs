// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Accessibility: clear door width and window height

use super::check_length;
use crate::config::RuleConfig;
use crate::dimension::{DimensionResolver, GeometryAxis, NamePattern, QuantitySpec};
use crate::error::RuleError;
use crate::evaluate::Requirement;
use crate::registry::Rule;
use crate::report::ElementResult;
use ifcore_model::{IfcModel, IfcType};

pub fn rules() -> Vec<Rule> {
    vec![
        Rule::new("Door Width", check_door_width),
        Rule::new("Window Height", check_window_height),
    ]
}

fn check_openings(
    model: &dyn IfcModel,
    config: &RuleConfig,
    ifc_type: IfcType,
    spec: &QuantitySpec,
    requirement: Requirement,
) -> Result<Vec<ElementResult>, RuleError> {
    let resolver = DimensionResolver::new(model);
    model
        .elements(&ifc_type)
        .iter()
        .map(|element| -> Result<ElementResult, RuleError> {
            config.check_deadline()?;
            let name = element.display_name();
            Ok(check_length(&resolver, element, spec, requirement)
                .with_long_name(format!("{name} ({ifc_type})")))
        })
        .collect()
}

pub fn check_door_width(
    model: &dyn IfcModel,
    config: &RuleConfig,
) -> Result<Vec<ElementResult>, RuleError> {
    let spec = QuantitySpec::length("width")
        .from_quantity_sets(&["Qto_DoorBaseQuantities", "BaseQuantities"], &["Width"])
        .from_geometry(GeometryAxis::OverallWidth)
        .from_property_sets(
            &["Pset_DoorCommon", "Dimensions"],
            &["Width", "OverallWidth", "ClearWidth"],
        )
        .from_name(NamePattern::First)
        .plausible_mm(300.0, 5000.0);
    let requirement = Requirement::AtLeast(config.threshold("door_width_mm")?);

    check_openings(model, config, IfcType::IfcDoor, &spec, requirement)
}

pub fn check_window_height(
    model: &dyn IfcModel,
    config: &RuleConfig,
) -> Result<Vec<ElementResult>, RuleError> {
    let spec = QuantitySpec::length("height")
        .from_quantity_sets(&["Qto_WindowBaseQuantities", "BaseQuantities"], &["Height"])
        .from_geometry(GeometryAxis::OverallHeight)
        .from_property_sets(
            &["Pset_WindowCommon", "Dimensions"],
            &["Height", "OverallHeight"],
        )
        .from_name(NamePattern::Larger)
        .plausible_mm(200.0, 5000.0);
    let requirement = Requirement::AtLeast(config.threshold("window_height_mm")?);

    check_openings(model, config, IfcType::IfcWindow, &spec, requirement)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::ElementStatus;
    use ifcore_model::{Element, InMemoryModel, OverallDimensions, PropertySet, UnitDeclaration};

    fn door(id: u32, name: &str) -> Element {
        Element::new(id, IfcType::IfcDoor)
            .with_global_id(format!("door-{id}"))
            .with_name(name)
    }

    #[test]
    fn test_door_width_scenarios() {
        let model = InMemoryModel::new()
            .with_length_unit(UnitDeclaration::metre(Some("MILLI")))
            .with_element(door(1, "Narrow"))
            .with_overall_dimensions(1, OverallDimensions { width: Some(750.0), height: Some(2100.0) })
            .with_element(door(2, "Wide"))
            .with_overall_dimensions(2, OverallDimensions { width: Some(850.0), height: Some(2100.0) })
            .with_element(door(3, "Exact"))
            .with_overall_dimensions(3, OverallDimensions { width: Some(800.0), height: Some(2100.0) });

        let rows = check_door_width(&model, &RuleConfig::default()).unwrap();
        assert_eq!(rows[0].check_status, ElementStatus::Fail);
        assert_eq!(
            rows[0].comment.as_deref(),
            Some("value is 50 mm below the minimum of 800 mm")
        );
        assert_eq!(rows[1].check_status, ElementStatus::Pass);
        assert_eq!(rows[2].check_status, ElementStatus::Pass);
        assert_eq!(rows[0].element_name_long.as_deref(), Some("Narrow (IfcDoor)"));
    }

    #[test]
    fn test_door_width_from_name() {
        let model = InMemoryModel::new().with_element(door(1, "Single-Flush 915 x 2134mm"));
        let rows = check_door_width(&model, &RuleConfig::default()).unwrap();

        assert_eq!(rows[0].check_status, ElementStatus::Pass);
        assert_eq!(rows[0].actual_value.as_deref(), Some("915 mm"));
        assert!(rows[0].log.as_deref().unwrap().contains("source=name"));
    }

    #[test]
    fn test_window_height_from_type_property() {
        let model = InMemoryModel::new()
            .with_element(Element::new(7, IfcType::IfcWindow).with_name("Fixed"))
            .with_type_property_set(7, PropertySet::new("Pset_WindowCommon").with("Height", 1.1));

        let rows = check_window_height(&model, &RuleConfig::default()).unwrap();
        assert_eq!(rows[0].check_status, ElementStatus::Fail);
        assert_eq!(rows[0].actual_value.as_deref(), Some("1100 mm"));
        assert_eq!(rows[0].element_id.as_deref(), Some("#7"));
    }
}
