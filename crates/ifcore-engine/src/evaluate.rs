// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Threshold evaluation
//!
//! Turns a resolved number into a verdict with a rationale that names the
//! exact shortfall or excess. Boundaries are inclusive: a value equal to a
//! minimum or maximum passes.

use crate::report::ElementStatus;

/// Slack for floating point noise at the boundary (in the evaluated unit)
const BOUNDARY_TOLERANCE: f64 = 1e-6;

/// Render a number with at most three decimals and no trailing zeros
pub fn format_number(value: f64) -> String {
    let text = format!("{value:.3}");
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text == "-0" {
        "0".to_string()
    } else {
        text.to_string()
    }
}

/// Render a non-zero difference with as many decimals as it takes not to
/// read as zero
fn format_difference(value: f64) -> String {
    (3..=9)
        .map(|places| {
            let text = format!("{value:.places$}");
            text.trim_end_matches('0').trim_end_matches('.').to_string()
        })
        .find(|text| text != "0")
        .unwrap_or_else(|| format!("{value:e}"))
}

/// Number followed by its unit ("750 mm")
pub fn with_unit(value: f64, unit: &str) -> String {
    if unit.is_empty() {
        format_number(value)
    } else {
        format!("{} {}", format_number(value), unit)
    }
}

/// A verdict for one element
#[derive(Clone, Debug, PartialEq)]
pub struct Evaluation {
    pub status: ElementStatus,
    pub actual: Option<String>,
    pub required: Option<String>,
    pub rationale: Option<String>,
}

impl Evaluation {
    /// The value could not be found
    pub fn blocked(rationale: impl Into<String>) -> Self {
        Self {
            status: ElementStatus::Blocked,
            actual: None,
            required: None,
            rationale: Some(rationale.into()),
        }
    }

    pub fn with_required(mut self, required: impl Into<String>) -> Self {
        self.required = Some(required.into());
        self
    }

    pub fn with_actual(mut self, actual: impl Into<String>) -> Self {
        self.actual = Some(actual.into());
        self
    }

    pub fn with_rationale(mut self, rationale: impl Into<String>) -> Self {
        self.rationale = Some(rationale.into());
        self
    }
}

/// A numeric requirement
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Requirement {
    AtLeast(f64),
    AtMost(f64),
    /// Inclusive range
    Between(f64, f64),
}

impl Requirement {
    /// Requirement as shown in reports (">= 800 mm")
    pub fn describe(&self, unit: &str) -> String {
        match *self {
            Requirement::AtLeast(min) => format!(">= {}", with_unit(min, unit)),
            Requirement::AtMost(max) => format!("<= {}", with_unit(max, unit)),
            Requirement::Between(min, max) => {
                format!("{}-{}", format_number(min), with_unit(max, unit))
            }
        }
    }

    /// Pass or fail `actual`
    pub fn evaluate(&self, actual: f64, unit: &str) -> Evaluation {
        self.judge(actual, unit, None)
    }

    /// Blocked result carrying this requirement
    pub fn blocked(&self, unit: &str, rationale: impl Into<String>) -> Evaluation {
        Evaluation::blocked(rationale).with_required(self.describe(unit))
    }

    /// Passing values closer than `band` to a limit become warnings
    pub fn with_warning_band(self, band: f64) -> BandedRequirement {
        BandedRequirement {
            requirement: self,
            band: band.abs(),
        }
    }

    fn judge(&self, actual: f64, unit: &str, band: Option<f64>) -> Evaluation {
        let (status, rationale) = match *self {
            Requirement::AtLeast(min) => below(actual, min, unit)
                .map(|r| (ElementStatus::Fail, r))
                .unwrap_or_else(|| near_min(actual, min, unit, band)),
            Requirement::AtMost(max) => above(actual, max, unit)
                .map(|r| (ElementStatus::Fail, r))
                .unwrap_or_else(|| near_max(actual, max, unit, band)),
            Requirement::Between(min, max) => {
                match below(actual, min, unit).or_else(|| above(actual, max, unit)) {
                    Some(r) => (ElementStatus::Fail, r),
                    None => {
                        let low = near_min(actual, min, unit, band);
                        let high = near_max(actual, max, unit, band);
                        if low.0 == ElementStatus::Warning {
                            low
                        } else if high.0 == ElementStatus::Warning {
                            high
                        } else {
                            (
                                ElementStatus::Pass,
                                format!("value is within {}", self.describe(unit)),
                            )
                        }
                    }
                }
            }
        };

        Evaluation {
            status,
            actual: Some(with_unit(actual, unit)),
            required: Some(self.describe(unit)),
            rationale: Some(rationale),
        }
    }
}

fn difference(value: f64, unit: &str) -> String {
    if unit.is_empty() {
        format_difference(value)
    } else {
        format!("{} {}", format_difference(value), unit)
    }
}

fn below(actual: f64, min: f64, unit: &str) -> Option<String> {
    (actual + BOUNDARY_TOLERANCE < min).then(|| {
        format!(
            "value is {} below the minimum of {}",
            difference(min - actual, unit),
            with_unit(min, unit)
        )
    })
}

fn above(actual: f64, max: f64, unit: &str) -> Option<String> {
    (actual - BOUNDARY_TOLERANCE > max).then(|| {
        format!(
            "value is {} above the maximum of {}",
            difference(actual - max, unit),
            with_unit(max, unit)
        )
    })
}

fn near_min(actual: f64, min: f64, unit: &str, band: Option<f64>) -> (ElementStatus, String) {
    match band {
        Some(band) if actual < min + band => (
            ElementStatus::Warning,
            format!(
                "value is within {} of the minimum of {}",
                with_unit(band, unit),
                with_unit(min, unit)
            ),
        ),
        _ => (
            ElementStatus::Pass,
            format!("meets the minimum of {}", with_unit(min, unit)),
        ),
    }
}

fn near_max(actual: f64, max: f64, unit: &str, band: Option<f64>) -> (ElementStatus, String) {
    match band {
        Some(band) if actual > max - band => (
            ElementStatus::Warning,
            format!(
                "value is within {} of the maximum of {}",
                with_unit(band, unit),
                with_unit(max, unit)
            ),
        ),
        _ => (
            ElementStatus::Pass,
            format!("within the maximum of {}", with_unit(max, unit)),
        ),
    }
}

/// Requirement with a tolerance band that turns borderline passes into
/// warnings
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BandedRequirement {
    requirement: Requirement,
    band: f64,
}

impl BandedRequirement {
    pub fn requirement(&self) -> Requirement {
        self.requirement
    }

    pub fn evaluate(&self, actual: f64, unit: &str) -> Evaluation {
        self.requirement.judge(actual, unit, Some(self.band))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimum_shortfall() {
        let eval = Requirement::AtLeast(800.0).evaluate(750.0, "mm");
        assert_eq!(eval.status, ElementStatus::Fail);
        assert_eq!(eval.actual.as_deref(), Some("750 mm"));
        assert_eq!(eval.required.as_deref(), Some(">= 800 mm"));
        assert_eq!(
            eval.rationale.as_deref(),
            Some("value is 50 mm below the minimum of 800 mm")
        );

        assert_eq!(Requirement::AtLeast(800.0).evaluate(850.0, "mm").status, ElementStatus::Pass);
    }

    #[test]
    fn test_small_shortfall_is_never_zero() {
        let eval = Requirement::AtLeast(800.0).evaluate(799.9996, "mm");
        assert_eq!(eval.status, ElementStatus::Fail);
        assert_eq!(
            eval.rationale.as_deref(),
            Some("value is 0.0004 mm below the minimum of 800 mm")
        );

        let eval = Requirement::AtMost(0.8).evaluate(0.800002, "W/(m2.K)");
        assert_eq!(eval.status, ElementStatus::Fail);
        assert_eq!(
            eval.rationale.as_deref(),
            Some("value is 0.000002 W/(m2.K) above the maximum of 0.8 W/(m2.K)")
        );
    }

    #[test]
    fn test_boundaries_are_inclusive() {
        assert_eq!(Requirement::AtLeast(800.0).evaluate(800.0, "mm").status, ElementStatus::Pass);
        assert_eq!(Requirement::AtMost(0.8).evaluate(0.8, "W/(m2.K)").status, ElementStatus::Pass);

        let range = Requirement::Between(100.0, 200.0);
        assert_eq!(range.evaluate(100.0, "mm").status, ElementStatus::Pass);
        assert_eq!(range.evaluate(150.0, "mm").status, ElementStatus::Pass);
        assert_eq!(range.evaluate(200.0, "mm").status, ElementStatus::Pass);
        // 0.2 m read back as millimetres
        assert_eq!(range.evaluate(0.2 * 1000.0, "mm").status, ElementStatus::Pass);
    }

    #[test]
    fn test_range_excess() {
        let eval = Requirement::Between(100.0, 200.0).evaluate(210.0, "mm");
        assert_eq!(eval.status, ElementStatus::Fail);
        assert_eq!(eval.required.as_deref(), Some("100-200 mm"));
        assert_eq!(
            eval.rationale.as_deref(),
            Some("value is 10 mm above the maximum of 200 mm")
        );

        let thin = Requirement::Between(100.0, 200.0).evaluate(80.0, "mm");
        assert_eq!(
            thin.rationale.as_deref(),
            Some("value is 20 mm below the minimum of 100 mm")
        );
    }

    #[test]
    fn test_maximum_excess() {
        let eval = Requirement::AtMost(0.8).evaluate(0.95, "W/(m2.K)");
        assert_eq!(eval.status, ElementStatus::Fail);
        assert_eq!(
            eval.rationale.as_deref(),
            Some("value is 0.15 W/(m2.K) above the maximum of 0.8 W/(m2.K)")
        );
    }

    #[test]
    fn test_warning_band() {
        let banded = Requirement::AtLeast(800.0).with_warning_band(20.0);
        assert_eq!(banded.evaluate(810.0, "mm").status, ElementStatus::Warning);
        assert_eq!(banded.evaluate(820.0, "mm").status, ElementStatus::Pass);
        assert_eq!(banded.evaluate(790.0, "mm").status, ElementStatus::Fail);

        let range = Requirement::Between(100.0, 200.0).with_warning_band(5.0);
        assert_eq!(range.evaluate(198.0, "mm").status, ElementStatus::Warning);
        assert_eq!(range.evaluate(102.0, "mm").status, ElementStatus::Warning);
        assert_eq!(range.evaluate(150.0, "mm").status, ElementStatus::Pass);
    }

    #[test]
    fn test_blocked_keeps_requirement() {
        let eval = Requirement::AtLeast(100.0).blocked("mm", "thickness not found");
        assert_eq!(eval.status, ElementStatus::Blocked);
        assert_eq!(eval.actual, None);
        assert_eq!(eval.required.as_deref(), Some(">= 100 mm"));
    }

    #[test]
    fn test_number_formatting() {
        assert_eq!(format_number(200.0), "200");
        assert_eq!(format_number(0.35), "0.35");
        assert_eq!(format_number(12.3456), "12.346");
        assert_eq!(format_number(-0.0001), "0");
        assert_eq!(with_unit(3.0, ""), "3");
    }
}
