// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Built-in rule providers
//!
//! Each submodule is one provider and exposes `rules()`, the ordered list
//! of its checks. Rules only read the model; every threshold comes from the
//! [`RuleConfig`](crate::config::RuleConfig) they are handed.

pub mod accessibility;
pub mod beams;
pub mod columns;
pub mod foundation;
pub mod inventory;
pub mod slabs;
pub mod walls;

use crate::dimension::{DimensionResolver, QuantitySpec, Resolution};
use crate::evaluate::Requirement;
use crate::registry::Provider;
use crate::report::ElementResult;
use ifcore_model::{Element, IfcModel};

/// Providers in registration order
pub fn standard_providers() -> Vec<Provider> {
    vec![
        Provider::new("walls", walls::rules()),
        Provider::new("slabs", slabs::rules()),
        Provider::new("accessibility", accessibility::rules()),
        Provider::new("beams", beams::rules()),
        Provider::new("columns", columns::rules()),
        Provider::new("foundation", foundation::rules()),
        Provider::new("model", inventory::rules()),
    ]
}

/// Name of the storey containing `element`
pub(crate) fn storey_name(model: &dyn IfcModel, element: &Element) -> String {
    model
        .spatial()
        .container_of(element.id)
        .map(|storey| storey.name)
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| "Unknown Storey".to_string())
}

/// Trace stored in the `log` column
pub(crate) fn resolution_log(resolver: &DimensionResolver<'_>, resolution: &Resolution) -> String {
    format!(
        "scale_to_m={} source={}; {}",
        resolver.scale().factor(),
        resolution.source_label(),
        resolution.trace_text()
    )
}

/// Resolve a length and hold it against a requirement in millimetres
pub(crate) fn check_length(
    resolver: &DimensionResolver<'_>,
    element: &Element,
    spec: &QuantitySpec,
    requirement: Requirement,
) -> ElementResult {
    let resolution = resolver.resolve(element, spec);
    let evaluation = match resolution.millimetres() {
        Some(mm) => requirement.evaluate(mm, "mm"),
        None => requirement.blocked(
            "mm",
            format!(
                "{} not found; tried {}",
                capitalized(spec.name()),
                resolution.attempted_text()
            ),
        ),
    };
    ElementResult::for_element(element, evaluation).with_log(resolution_log(resolver, &resolution))
}

pub(crate) fn capitalized(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dimension::NamePattern;
    use crate::report::ElementStatus;
    use ifcore_model::{IfcType, InMemoryModel, Storey};

    #[test]
    fn test_storey_fallback() {
        let model = InMemoryModel::new()
            .with_storey(Storey {
                id: 2.into(),
                name: "Level 1".into(),
                elevation: Some(0.0),
            })
            .with_containment(1, 2);

        let placed = Element::new(1, IfcType::IfcWall);
        let loose = Element::new(3, IfcType::IfcWall);
        assert_eq!(storey_name(&model, &placed), "Level 1");
        assert_eq!(storey_name(&model, &loose), "Unknown Storey");
    }

    #[test]
    fn test_check_length_blocked_names_strategies() {
        let model = InMemoryModel::new();
        let resolver = DimensionResolver::new(&model);
        let spec = QuantitySpec::length("width").from_name(NamePattern::First);
        let door = Element::new(5, IfcType::IfcDoor).with_name("Entrance");

        let row = check_length(&resolver, &door, &spec, Requirement::AtLeast(800.0));
        assert_eq!(row.check_status, ElementStatus::Blocked);
        assert_eq!(row.actual_value, None);
        assert_eq!(row.required_value.as_deref(), Some(">= 800 mm"));
        assert_eq!(row.comment.as_deref(), Some("Width not found; tried name"));
        assert!(row.log.unwrap().starts_with("scale_to_m=1 source=none"));
    }

    #[test]
    fn test_provider_ids_are_unique() {
        let providers = standard_providers();
        let mut ids: Vec<_> = providers.iter().map(|p| p.id()).collect();
        ids.dedup();
        assert_eq!(ids.len(), providers.len());
        assert!(providers.iter().all(|p| !p.rules().is_empty()));
    }
}
