// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Length unit normalization
//!
//! Turns the model's declared length unit into a factor to metres. Only
//! lengths go through it: U-values, loads and bearing pressures are declared
//! unit-independent by the rules that read them and are never scaled.

use ifcore_model::{IfcModel, UnitDeclaration};

/// Common length unit factors (to metres)
pub mod scales {
    pub const METRE: f64 = 1.0;
    pub const MILLIMETRE: f64 = 0.001;
    pub const CENTIMETRE: f64 = 0.01;
    pub const KILOMETRE: f64 = 1000.0;
    pub const INCH: f64 = 0.0254;
    pub const FOOT: f64 = 0.3048;
    pub const YARD: f64 = 0.9144;
    pub const MILE: f64 = 1609.344;
}

/// Factor that converts model lengths to metres
///
/// Never fails: a model without a usable length unit is assumed to be in
/// metres.
pub fn scale_factor(model: &dyn IfcModel) -> f64 {
    let Some(unit) = model.length_unit() else {
        log::debug!("no length unit declared, assuming metres");
        return scales::METRE;
    };

    match declaration_factor(unit) {
        Some(factor) if factor.is_finite() && factor > 0.0 => factor,
        _ => {
            log::debug!("unusable length unit {unit:?}, assuming metres");
            scales::METRE
        }
    }
}

/// Factor of a single unit declaration, `None` if it is not a length unit
pub fn declaration_factor(unit: &UnitDeclaration) -> Option<f64> {
    match unit {
        UnitDeclaration::Si { prefix, name } => {
            if name != "METRE" {
                return None;
            }
            Some(prefix.as_deref().map_or(1.0, prefix_scale))
        }
        UnitDeclaration::ConversionBased { factor, base, .. } => {
            let base_scale = base
                .as_deref()
                .and_then(declaration_factor)
                .unwrap_or(scales::METRE);
            Some(factor * base_scale)
        }
    }
}

fn prefix_scale(prefix: &str) -> f64 {
    match prefix {
        "EXA" => 1e18,
        "PETA" => 1e15,
        "TERA" => 1e12,
        "GIGA" => 1e9,
        "MEGA" => 1e6,
        "KILO" => 1e3,
        "HECTO" => 1e2,
        "DECA" => 1e1,
        "DECI" => 1e-1,
        "CENTI" => 1e-2,
        "MILLI" => 1e-3,
        "MICRO" => 1e-6,
        "NANO" => 1e-9,
        "PICO" => 1e-12,
        "FEMTO" => 1e-15,
        "ATTO" => 1e-18,
        _ => 1.0,
    }
}

/// Conversion between model length units and metres
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UnitScale {
    factor: f64,
}

impl UnitScale {
    /// Scale with an explicit factor; non-positive factors fall back to metres
    pub fn new(factor: f64) -> Self {
        if factor.is_finite() && factor > 0.0 {
            Self { factor }
        } else {
            Self {
                factor: scales::METRE,
            }
        }
    }

    /// Scale declared by a model
    pub fn of(model: &dyn IfcModel) -> Self {
        Self::new(scale_factor(model))
    }

    pub fn factor(&self) -> f64 {
        self.factor
    }

    /// Model units to metres
    pub fn normalize(&self, raw: f64) -> f64 {
        raw * self.factor
    }

    /// Metres back to model units
    pub fn denormalize(&self, value: f64) -> f64 {
        value / self.factor
    }
}

impl Default for UnitScale {
    fn default() -> Self {
        Self::new(scales::METRE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ifcore_model::InMemoryModel;

    #[test]
    fn test_si_prefixes() {
        let mm = InMemoryModel::new().with_length_unit(UnitDeclaration::metre(Some("MILLI")));
        assert_relative_eq!(scale_factor(&mm), scales::MILLIMETRE);

        let cm = InMemoryModel::new().with_length_unit(UnitDeclaration::metre(Some("CENTI")));
        assert_relative_eq!(scale_factor(&cm), scales::CENTIMETRE);

        let m = InMemoryModel::new().with_length_unit(UnitDeclaration::metre(None));
        assert_relative_eq!(scale_factor(&m), 1.0);
    }

    #[test]
    fn test_missing_unit_defaults_to_metres() {
        assert_relative_eq!(scale_factor(&InMemoryModel::new()), 1.0);
    }

    #[test]
    fn test_non_length_unit_defaults_to_metres() {
        let model = InMemoryModel::new().with_length_unit(UnitDeclaration::Si {
            prefix: None,
            name: "SQUARE_METRE".into(),
        });
        assert_relative_eq!(scale_factor(&model), 1.0);
    }

    #[test]
    fn test_conversion_based_units() {
        let foot = UnitDeclaration::ConversionBased {
            name: "FOOT".into(),
            factor: 0.3048,
            base: Some(Box::new(UnitDeclaration::metre(None))),
        };
        assert_relative_eq!(declaration_factor(&foot).unwrap(), scales::FOOT);

        // Inch expressed in millimetres
        let inch = UnitDeclaration::ConversionBased {
            name: "INCH".into(),
            factor: 25.4,
            base: Some(Box::new(UnitDeclaration::metre(Some("MILLI")))),
        };
        assert_relative_eq!(
            declaration_factor(&inch).unwrap(),
            scales::INCH,
            max_relative = 1e-12
        );

        let broken = InMemoryModel::new().with_length_unit(UnitDeclaration::ConversionBased {
            name: "BROKEN".into(),
            factor: 0.0,
            base: None,
        });
        assert_relative_eq!(scale_factor(&broken), 1.0);
    }

    #[test]
    fn test_round_trip() {
        for factor in [scales::MILLIMETRE, scales::FOOT, scales::MILE, 1.0] {
            let scale = UnitScale::new(factor);
            for raw in [0.0, 1.0, 240.0, 12345.678] {
                assert_relative_eq!(
                    scale.denormalize(scale.normalize(raw)),
                    raw,
                    max_relative = 1e-12
                );
            }
        }
    }

    #[test]
    fn test_invalid_factor_falls_back() {
        assert_relative_eq!(UnitScale::new(-2.0).factor(), 1.0);
        assert_relative_eq!(UnitScale::new(f64::NAN).factor(), 1.0);
    }
}
