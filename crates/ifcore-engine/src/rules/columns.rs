// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Column minimum dimension

use super::resolution_log;
use crate::config::RuleConfig;
use crate::dimension::{DimensionResolver, GeometryAxis, NamePattern, QuantitySpec};
use crate::error::RuleError;
use crate::evaluate::{format_number, with_unit, Evaluation, Requirement};
use crate::registry::Rule;
use crate::report::{ElementResult, ElementStatus};
use ifcore_model::{IfcModel, IfcType};

pub fn rules() -> Vec<Rule> {
    vec![Rule::new("Column Minimum Dimension", check_column_min_dimension)]
}

/// The smaller side of the cross-section must reach `column_min_dim_mm`
///
/// When only one side resolves it is checked on its own.
pub fn check_column_min_dimension(
    model: &dyn IfcModel,
    config: &RuleConfig,
) -> Result<Vec<ElementResult>, RuleError> {
    let requirement = Requirement::AtLeast(config.threshold("column_min_dim_mm")?);
    let resolver = DimensionResolver::new(model);
    let width = QuantitySpec::length("width")
        .from_quantity_sets(&["Qto_ColumnBaseQuantities", "BaseQuantities"], &["Width"])
        .from_geometry(GeometryAxis::ProfileX)
        .from_property_sets(&["Pset_ColumnCommon", "Dimensions"], &["Width", "b"])
        .from_name(NamePattern::Smaller)
        .plausible_mm(50.0, 3000.0);
    let depth = QuantitySpec::length("depth")
        .from_quantity_sets(&["Qto_ColumnBaseQuantities", "BaseQuantities"], &["Depth"])
        .from_geometry(GeometryAxis::ProfileY)
        .from_property_sets(&["Pset_ColumnCommon", "Dimensions"], &["Depth", "h"])
        .from_name(NamePattern::Larger)
        .plausible_mm(50.0, 3000.0);

    model
        .elements(&IfcType::IfcColumn)
        .iter()
        .map(|column| -> Result<ElementResult, RuleError> {
            config.check_deadline()?;
            let w = resolver.resolve(column, &width);
            let d = resolver.resolve(column, &depth);

            let evaluation = match (w.millimetres(), d.millimetres()) {
                (None, None) => requirement.blocked(
                    "mm",
                    format!("Cross-section not found; tried {}", w.attempted_text()),
                ),
                (Some(a), Some(b)) => {
                    let eval = requirement.evaluate(a.min(b), "mm");
                    eval.with_actual(format!("{} x {}", format_number(a), with_unit(b, "mm")))
                }
                (Some(side), None) => one_side(requirement, side, "width", "depth"),
                (None, Some(side)) => one_side(requirement, side, "depth", "width"),
            };

            let name = column.display_name();
            Ok(ElementResult::for_element(column, evaluation)
                .with_long_name(format!("{name} (IfcColumn)"))
                .with_log(format!(
                    "width: {} | depth: {}",
                    resolution_log(&resolver, &w),
                    d.trace_text()
                )))
        })
        .collect()
}

/// Only one side resolved
///
/// A failing side fails the column. A passing side cannot vouch for the
/// unknown one, which may be smaller, so the row is a warning.
fn one_side(requirement: Requirement, value: f64, known: &str, missing: &str) -> Evaluation {
    let eval = requirement.evaluate(value, "mm");
    let rationale = eval.rationale.clone().unwrap_or_default();
    if eval.status == ElementStatus::Pass {
        Evaluation {
            status: ElementStatus::Warning,
            ..eval
        }
        .with_rationale(format!(
            "{known}: {rationale}; {missing} not found, the smaller side is unverified"
        ))
    } else {
        eval.with_rationale(format!("{known}: {rationale}; {missing} not found"))
    }
}
