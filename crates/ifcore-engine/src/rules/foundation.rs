// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Foundation checks
//!
//! - Foundation Slab Thickness (Art. 69): footings and ground-level base or
//!   on-grade slabs, 150 mm concrete plus 150 mm drainage layer
//! - Footing Bearing Area: plan area against the storey load it carries
//! - Bearing Beam Section (DB SE-AE): beams on the lowest storey
//! - Floor Capacity (Art. 128): how many storeys the footings can take
//!
//! Floor loads and bearing capacities are kN/m2 and are never length-scaled.

use super::{check_length, resolution_log, storey_name};
use crate::config::RuleConfig;
use crate::dimension::{DimensionResolver, GeometryAxis, NamePattern, QuantitySpec, Resolution};
use crate::error::RuleError;
use crate::evaluate::{format_number, with_unit, Evaluation, Requirement};
use crate::registry::Rule;
use crate::report::{ElementResult, ElementStatus};
use ifcore_model::{Element, IfcModel, IfcType, Storey};

const BEARING_KEYS: &[&str] = &[
    "BearingCapacity",
    "AllowableBearingCapacity",
    "WorkingStress",
    "FatiguesDeTraball",
    "SoilBearingCapacity",
];
const FLOOR_LOAD_KEYS: &[&str] = &["DesignLoad", "FloorLoad", "LoadBearingCapacity"];
const LOAD_UNIT: &str = "kN/m2";
/// Slabs up to this far above the lowest storey count as ground level (m)
const GROUND_TOLERANCE_M: f64 = 1.0;

pub fn rules() -> Vec<Rule> {
    vec![
        Rule::new("Foundation Slab Thickness", check_foundation_slab_thickness),
        Rule::new("Footing Bearing Area", check_footing_bearing_area),
        Rule::new("Bearing Beam Section", check_bearing_beam_section),
        Rule::new("Floor Capacity", check_floor_capacity),
    ]
}

/// Row standing in for elements that are not there
fn missing_row(element_type: &str, name: &str, comment: impl Into<String>) -> ElementResult {
    ElementResult::new(element_type, name, ElementStatus::Blocked).with_comment(comment)
}

fn is_at_ground(
    model: &dyn IfcModel,
    resolver: &DimensionResolver<'_>,
    element: &Element,
    lowest: Option<&Storey>,
) -> bool {
    let Some(lowest) = lowest else {
        return true;
    };
    let Some(container) = model.spatial().container_of(element.id) else {
        return true;
    };
    if container.id == lowest.id {
        return true;
    }

    let scale = resolver.scale();
    let base = scale.normalize(lowest.elevation.unwrap_or(0.0));
    let level = scale.normalize(container.elevation.unwrap_or(0.0));
    level <= base + GROUND_TOLERANCE_M
}

/// Footings, base slabs and ground-level slabs on grade
fn foundation_candidates(model: &dyn IfcModel, resolver: &DimensionResolver<'_>) -> Vec<Element> {
    let lowest = model.spatial().lowest_storey();
    let mut candidates = model.elements(&IfcType::IfcFooting);

    candidates.extend(model.elements(&IfcType::IfcSlab).into_iter().filter(|slab| {
        let predefined = slab.predefined_type.as_deref().unwrap_or_default();
        let name = slab.name.as_deref().unwrap_or_default().to_lowercase();
        let is_base = predefined.eq_ignore_ascii_case("BASESLAB");
        let on_grade = predefined.eq_ignore_ascii_case("FLOOR") && name.contains("on grade");
        (is_base || on_grade) && is_at_ground(model, resolver, slab, lowest.as_ref())
    }));

    candidates
}

/// Art. 69: foundation slabs must be at least `foundation_min_mm` thick
pub fn check_foundation_slab_thickness(
    model: &dyn IfcModel,
    config: &RuleConfig,
) -> Result<Vec<ElementResult>, RuleError> {
    let requirement = Requirement::AtLeast(config.threshold("foundation_min_mm")?);
    let resolver = DimensionResolver::new(model);
    let candidates = foundation_candidates(model, &resolver);

    if candidates.is_empty() {
        return Ok(vec![missing_row(
            "IfcFooting / IfcSlab",
            "No foundation elements found",
            "Model contains no IfcFooting or on-grade slab elements to check",
        )
        .with_long_name("Art. 69 - no IfcFooting or base/on-grade IfcSlab in model")
        .with_required(requirement.describe("mm"))]);
    }

    let spec = QuantitySpec::length("thickness")
        .from_quantity_sets(&[], &["Depth", "Thickness", "Height"])
        .from_geometry(GeometryAxis::ExtrusionDepth)
        .from_property_sets(
            &["Pset_FootingCommon", "Pset_SlabCommon", "Dimensions"],
            &["Thickness", "Depth"],
        )
        .from_name(NamePattern::Smaller)
        .from_material_layers()
        .plausible_mm(50.0, 5000.0);

    candidates
        .iter()
        .map(|element| -> Result<ElementResult, RuleError> {
            config.check_deadline()?;
            let name = element.display_name();
            let mut row = check_length(&resolver, element, &spec, requirement)
                .with_long_name(format!("{name} - Art. 69 Foundation Slab Thickness"));
            if row.check_status == ElementStatus::Fail {
                if let Some(comment) = row.comment.as_mut() {
                    comment.push_str(" (requires 150 mm concrete + 150 mm drainage layer)");
                }
            }
            Ok(row)
        })
        .collect()
}

/// A load-like property, or the configured default
struct Load {
    value: f64,
    defaulted: bool,
    resolution: Resolution,
}

fn load(
    resolver: &DimensionResolver<'_>,
    element: Option<&Element>,
    name: &str,
    keys: &[&str],
    default: f64,
) -> Load {
    let spec = QuantitySpec::ratio(name).from_property_sets(&[], keys);
    let resolution = match element {
        Some(element) => resolver.resolve(element, &spec),
        None => Resolution {
            value: None,
            unit_hint: None,
            source: None,
            attempted: Vec::new(),
            trace: vec![format!("no element to read {name} from")],
        },
    };
    Load {
        value: resolution.value.unwrap_or(default),
        defaulted: resolution.value.is_none(),
        resolution,
    }
}

/// Floor load of the first space, or `floor_load_kn_m2`
fn floor_load(
    model: &dyn IfcModel,
    resolver: &DimensionResolver<'_>,
    config: &RuleConfig,
) -> Result<Load, RuleError> {
    let default = config.threshold("floor_load_kn_m2")?;
    let spaces = model.elements(&IfcType::IfcSpace);
    Ok(load(resolver, spaces.first(), "floor load", FLOOR_LOAD_KEYS, default))
}

fn bearing_capacity(
    resolver: &DimensionResolver<'_>,
    footing: &Element,
    config: &RuleConfig,
) -> Result<Load, RuleError> {
    let default = config.threshold("bearing_capacity_kn_m2")?;
    Ok(load(resolver, Some(footing), "bearing capacity", BEARING_KEYS, default))
}

fn storey_count(model: &dyn IfcModel) -> usize {
    model.spatial().storeys().len().max(1)
}

/// Provided plan area against storeys x floor load x area / bearing capacity
pub fn check_footing_bearing_area(
    model: &dyn IfcModel,
    config: &RuleConfig,
) -> Result<Vec<ElementResult>, RuleError> {
    let footings = model.elements(&IfcType::IfcFooting);
    if footings.is_empty() {
        return Ok(vec![missing_row(
            "IfcFooting",
            "No footings found",
            "Model contains no IfcFooting elements",
        )
        .with_long_name("Load check - no IfcFooting elements in model")]);
    }

    let resolver = DimensionResolver::new(model);
    let storeys = storey_count(model);
    let q = floor_load(model, &resolver, config)?;
    let length_spec = QuantitySpec::length("length")
        .from_quantity_sets(&[], &["Length", "FootingLength"])
        .from_geometry(GeometryAxis::ProfileX);
    let width_spec = QuantitySpec::length("width")
        .from_quantity_sets(&[], &["Width", "FootingWidth"])
        .from_geometry(GeometryAxis::ProfileY)
        .from_name(NamePattern::Larger);

    let mut results = Vec::with_capacity(footings.len());
    for footing in &footings {
        config.check_deadline()?;
        let name = footing.display_name();
        let sigma = bearing_capacity(&resolver, footing, config)?;
        let l = resolver.resolve(footing, &length_spec);
        let w = resolver.resolve(footing, &width_spec);
        let log = format!(
            "length: {} | width: {} | bearing: {} | floor load: {}",
            resolution_log(&resolver, &l),
            w.trace_text(),
            sigma.resolution.trace_text(),
            q.resolution.trace_text()
        );

        let (Some(length), Some(width)) = (l.value, w.value) else {
            results.push(
                ElementResult::for_element(
                    footing,
                    Evaluation::blocked("Footing L/W not found in geometry or quantity sets"),
                )
                .with_long_name(format!("{name} - Foundation Dimensions / Load Check"))
                .with_log(log),
            );
            continue;
        };

        let provided = length * width;
        let required = storeys as f64 * q.value * provided / sigma.value;
        let mut evaluation = Requirement::AtLeast(required).evaluate(provided, "m2");
        evaluation.actual = Some(format!(
            "{:.2} m2 ({:.2} x {:.2} m)",
            provided, length, width
        ));
        evaluation.required = Some(format!(">= {:.2} m2", required));
        if let Some(rationale) = evaluation.rationale.as_mut() {
            rationale.push_str(&format!(
                " ({storeys} storeys x {} / {})",
                with_unit(q.value, LOAD_UNIT),
                with_unit(sigma.value, LOAD_UNIT)
            ));
            if sigma.defaulted {
                rationale.push_str(" [default bearing capacity]");
            }
        }

        results.push(
            ElementResult::for_element(footing, evaluation)
                .with_long_name(format!("{name} - Foundation Dimensions / Load Check"))
                .with_log(log),
        );
    }

    Ok(results)
}

/// DB SE-AE: beams on the lowest storey need both sides >= `bearing_beam_min_mm`
pub fn check_bearing_beam_section(
    model: &dyn IfcModel,
    config: &RuleConfig,
) -> Result<Vec<ElementResult>, RuleError> {
    let min_mm = config.threshold("bearing_beam_min_mm")?;
    let requirement = Requirement::AtLeast(min_mm);
    let required = format!(
        ">= {} x {}",
        format_number(min_mm),
        with_unit(min_mm, "mm")
    );
    let spatial = model.spatial();

    let Some(lowest) = spatial.lowest_storey() else {
        return Ok(vec![missing_row(
            "IfcBeam / IfcMember",
            "Bearing beams not found",
            "Model has no IfcBuildingStorey, so the foundation level is unknown",
        )
        .with_required(required)]);
    };

    let on_lowest = |ifc_type: IfcType| -> Vec<Element> {
        model
            .elements(&ifc_type)
            .into_iter()
            .filter(|e| spatial.container_of(e.id).is_some_and(|s| s.id == lowest.id))
            .collect()
    };
    let mut beams = on_lowest(IfcType::IfcBeam);
    if beams.is_empty() {
        beams = on_lowest(IfcType::IfcMember);
    }

    if beams.is_empty() {
        let total = model.elements_of(&[IfcType::IfcBeam, IfcType::IfcMember]).len();
        let reason = if total > 0 {
            format!(
                "{total} IfcBeam/IfcMember elements in the model but none contained in the lowest storey '{}'",
                lowest.name
            )
        } else {
            format!(
                "No IfcBeam or IfcMember elements; bearing beams belong in storey '{}'",
                lowest.name
            )
        };
        return Ok(vec![missing_row("IfcBeam / IfcMember", "Bearing beams not found", reason)
            .with_required(required)]);
    }

    let resolver = DimensionResolver::new(model);
    let width_spec = QuantitySpec::length("width")
        .from_geometry(GeometryAxis::ProfileX)
        .from_property_sets(&[], &["Width", "CrossSectionWidth", "b"])
        .plausible_mm(50.0, 3000.0);
    let depth_spec = QuantitySpec::length("depth")
        .from_geometry(GeometryAxis::ProfileY)
        .from_property_sets(&[], &["Depth", "Height", "CrossSectionHeight", "h"])
        .plausible_mm(50.0, 3000.0);

    beams
        .iter()
        .map(|beam| -> Result<ElementResult, RuleError> {
            config.check_deadline()?;
            let w = resolver.resolve(beam, &width_spec);
            let d = resolver.resolve(beam, &depth_spec);

            let evaluation = match (w.millimetres(), d.millimetres()) {
                (Some(width), Some(depth)) => {
                    let (side, value) = if width <= depth {
                        ("width", width)
                    } else {
                        ("depth", depth)
                    };
                    let eval = requirement.evaluate(value, "mm");
                    let rationale = eval.rationale.clone().unwrap_or_default();
                    eval.with_actual(format!("{} x {}", format_number(width), with_unit(depth, "mm")))
                        .with_rationale(format!("{side}: {rationale}"))
                }
                (width, depth) => {
                    let missing: Vec<&str> = [("width", width), ("depth", depth)]
                        .iter()
                        .filter(|(_, v)| v.is_none())
                        .map(|(side, _)| *side)
                        .collect();
                    Evaluation::blocked(format!(
                        "Cross-section {} not found in profile geometry or property sets",
                        missing.join(" and ")
                    ))
                }
            }
            .with_required(required.clone());

            let name = beam.display_name();
            let storey = storey_name(model, beam);
            Ok(ElementResult::for_element(beam, evaluation)
                .with_long_name(format!("{name} @ {storey} - DB SE-AE Bearing Beam"))
                .with_log(format!(
                    "width: {} | depth: {}",
                    resolution_log(&resolver, &w),
                    d.trace_text()
                )))
        })
        .collect()
}

/// Art. 128: storeys the footings can carry versus storeys present
pub fn check_floor_capacity(
    model: &dyn IfcModel,
    config: &RuleConfig,
) -> Result<Vec<ElementResult>, RuleError> {
    let footings = model.elements(&IfcType::IfcFooting);
    if footings.is_empty() {
        return Ok(vec![missing_row(
            "IfcFooting",
            "No footings found",
            "Cannot compute floor capacity without IfcFooting elements",
        )
        .with_long_name("Art. 128 - no IfcFooting elements in model")]);
    }

    let resolver = DimensionResolver::new(model);
    let existing = storey_count(model) as i64;
    let q = floor_load(model, &resolver, config)?;

    footings
        .iter()
        .map(|footing| -> Result<ElementResult, RuleError> {
            config.check_deadline()?;
            let sigma = bearing_capacity(&resolver, footing, config)?;
            let capacity = (sigma.value / q.value).floor() as i64;
            let addable = capacity - existing;

            let (status, comment) = match addable {
                n if n > 0 => (
                    ElementStatus::Pass,
                    format!("{n} storeys can be added; current {existing}, capacity {capacity}"),
                ),
                0 => (
                    ElementStatus::Warning,
                    format!("Foundation is at capacity; current {existing} = capacity {capacity}"),
                ),
                n => (
                    ElementStatus::Fail,
                    format!(
                        "{existing} storeys exceed the capacity of {capacity} by {}; underpinning required",
                        -n
                    ),
                ),
            };

            let name = footing.display_name();
            Ok(ElementResult::for_element(
                footing,
                Evaluation {
                    status,
                    actual: Some(format!("{existing} storeys")),
                    required: Some(format!("<= {capacity} storeys")),
                    rationale: Some(comment),
                },
            )
            .with_long_name(format!("{name} - Art. 128 Floor Capacity"))
            .with_log(format!(
                "bearing={} q={} n={}{}",
                with_unit(sigma.value, LOAD_UNIT),
                with_unit(q.value, LOAD_UNIT),
                existing,
                if sigma.defaulted || q.defaulted { " [defaults used]" } else { "" }
            )))
        })
        .collect()
}
