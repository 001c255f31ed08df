// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Beam cross-section checks

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
        Rule::new("Beam Depth", check_beam_depth),
        Rule::new("Beam Width", check_beam_width),
    ]
}

fn depth_spec() -> QuantitySpec {
    QuantitySpec::length("depth")
        .from_quantity_sets(&["Qto_BeamBaseQuantities", "BaseQuantities"], &["Depth", "Height"])
        .from_geometry(GeometryAxis::ProfileY)
        .from_property_sets(&["Pset_BeamCommon", "Dimensions"], &["Depth", "Height", "h"])
        .from_name(NamePattern::Larger)
        .plausible_mm(50.0, 3000.0)
}

fn width_spec() -> QuantitySpec {
    QuantitySpec::length("width")
        .from_quantity_sets(&["Qto_BeamBaseQuantities", "BaseQuantities"], &["Width"])
        .from_geometry(GeometryAxis::ProfileX)
        .from_property_sets(&["Pset_BeamCommon", "Dimensions"], &["Width", "b"])
        .from_name(NamePattern::Smaller)
        .plausible_mm(50.0, 3000.0)
}

fn check_beams(
    model: &dyn IfcModel,
    config: &RuleConfig,
    spec: &QuantitySpec,
    requirement: Requirement,
) -> Result<Vec<ElementResult>, RuleError> {
    let resolver = DimensionResolver::new(model);
    model
        .elements(&IfcType::IfcBeam)
        .iter()
        .map(|beam| -> Result<ElementResult, RuleError> {
            config.check_deadline()?;
            let name = beam.display_name();
            Ok(check_length(&resolver, beam, spec, requirement)
                .with_long_name(format!("{name} (IfcBeam)")))
        })
        .collect()
}

pub fn check_beam_depth(
    model: &dyn IfcModel,
    config: &RuleConfig,
) -> Result<Vec<ElementResult>, RuleError> {
    let requirement = Requirement::AtLeast(config.threshold("beam_depth_mm")?);
    check_beams(model, config, &depth_spec(), requirement)
}

pub fn check_beam_width(
    model: &dyn IfcModel,
    config: &RuleConfig,
) -> Result<Vec<ElementResult>, RuleError> {
    let requirement = Requirement::AtLeast(config.threshold("beam_width_mm")?);
    check_beams(model, config, &width_spec(), requirement)
}
