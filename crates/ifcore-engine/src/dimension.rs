// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Dimension resolution
//!
//! Authoring tools store the same physical dimension in different places: a
//! wall's thickness may be a base quantity, the width of its extrusion
//! profile, a vendor property, part of its name, or only the sum of its
//! material layers. [`DimensionResolver`] walks one shared, ordered list of
//! strategies and stops at the first hit:
//!
//! 1. Quantity sets
//! 2. Geometry
//! 3. Property sets (instance, then type)
//! 4. Name heuristics
//! 5. Material layers
//!
//! Each strategy up to the winning one leaves one line in the trace, so a
//! failed resolution explains everything it looked at. Absence of data is
//! an ordinary outcome, never an error.

use crate::units::UnitScale;
use ifcore_model::{Element, IfcModel, Property, PropertySet};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

/// "900 x 300", "300X600", "200×400"
static PAIR_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d+(?:[.,]\d+)?)\s*[xX×]\s*(\d+(?:[.,]\d+)?)").expect("valid pair pattern")
});

/// "150mm", "200 MM"
static MM_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\d+(?:[.,]\d+)?)\s*mm").expect("valid mm pattern"));

/// Extraction strategy, in priority order
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Strategy {
    QuantitySet,
    Geometry,
    PropertySet,
    NameHeuristic,
    MaterialLayers,
}

impl Strategy {
    /// All strategies, highest priority first
    pub const ORDER: [Strategy; 5] = [
        Strategy::QuantitySet,
        Strategy::Geometry,
        Strategy::PropertySet,
        Strategy::NameHeuristic,
        Strategy::MaterialLayers,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Strategy::QuantitySet => "quantity set",
            Strategy::Geometry => "geometry",
            Strategy::PropertySet => "property set",
            Strategy::NameHeuristic => "name",
            Strategy::MaterialLayers => "material layers",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Which shape-derived number to read
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GeometryAxis {
    ExtrusionDepth,
    ProfileX,
    ProfileY,
    /// Smaller of the profile's two dimensions
    ProfileMin,
    /// Larger of the profile's two dimensions
    ProfileMax,
    OverallWidth,
    OverallHeight,
}

impl GeometryAxis {
    fn label(&self) -> &'static str {
        match self {
            GeometryAxis::ExtrusionDepth => "extrusion depth",
            GeometryAxis::ProfileX => "profile x dimension",
            GeometryAxis::ProfileY => "profile y dimension",
            GeometryAxis::ProfileMin => "profile min dimension",
            GeometryAxis::ProfileMax => "profile max dimension",
            GeometryAxis::OverallWidth => "overall width",
            GeometryAxis::OverallHeight => "overall height",
        }
    }
}

/// Which number of a "A x B" name to take
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NamePattern {
    Smaller,
    Larger,
    First,
}

/// What to look for and where
///
/// Strategies left unconfigured are reported as not applicable.
#[derive(Clone, Debug, PartialEq)]
pub struct QuantitySpec {
    name: String,
    quantity_sets: Vec<String>,
    quantity_keys: Vec<String>,
    geometry: Option<GeometryAxis>,
    property_sets: Vec<String>,
    property_keys: Vec<String>,
    name_pattern: Option<NamePattern>,
    material_layers: bool,
    unit_independent: bool,
    plausible_mm: Option<(f64, f64)>,
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl QuantitySpec {
    /// A length, scaled to metres
    pub fn length(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            quantity_sets: Vec::new(),
            quantity_keys: Vec::new(),
            geometry: None,
            property_sets: Vec::new(),
            property_keys: Vec::new(),
            name_pattern: None,
            material_layers: false,
            unit_independent: false,
            plausible_mm: None,
        }
    }

    /// A unit-independent value (U-value, load, pressure), never scaled
    pub fn ratio(name: impl Into<String>) -> Self {
        Self {
            unit_independent: true,
            ..Self::length(name)
        }
    }

    /// Look in these quantity sets for these keys (empty `sets` means any set)
    pub fn from_quantity_sets(mut self, sets: &[&str], keys: &[&str]) -> Self {
        self.quantity_sets = owned(sets);
        self.quantity_keys = owned(keys);
        self
    }

    pub fn from_geometry(mut self, axis: GeometryAxis) -> Self {
        self.geometry = Some(axis);
        self
    }

    /// Look in these property sets first, then in any set carrying a key
    pub fn from_property_sets(mut self, sets: &[&str], keys: &[&str]) -> Self {
        self.property_sets = owned(sets);
        self.property_keys = owned(keys);
        self
    }

    pub fn from_name(mut self, pattern: NamePattern) -> Self {
        self.name_pattern = Some(pattern);
        self
    }

    pub fn from_material_layers(mut self) -> Self {
        self.material_layers = true;
        self
    }

    /// Plausible range in millimetres for property values
    ///
    /// A property value that falls outside the range after scaling but
    /// inside it when read as millimetres is taken as millimetres.
    pub fn plausible_mm(mut self, min: f64, max: f64) -> Self {
        self.plausible_mm = Some((min, max));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_unit_independent(&self) -> bool {
        self.unit_independent
    }
}

/// Outcome of a resolution
#[derive(Clone, Debug, PartialEq)]
pub struct Resolution {
    /// Metres for lengths, the stored number for unit-independent values
    pub value: Option<f64>,
    /// "m" for lengths, the declared property unit (if any) otherwise
    pub unit_hint: Option<String>,
    /// Strategy that produced the value
    pub source: Option<Strategy>,
    /// Strategies that were applicable and tried, in order
    pub attempted: Vec<Strategy>,
    /// One line per strategy considered
    pub trace: Vec<String>,
}

impl Resolution {
    pub fn is_resolved(&self) -> bool {
        self.value.is_some()
    }

    /// Resolved length in millimetres
    pub fn millimetres(&self) -> Option<f64> {
        self.value.map(|v| v * 1000.0)
    }

    pub fn source_label(&self) -> &'static str {
        self.source.map_or("none", |s| s.label())
    }

    pub fn trace_text(&self) -> String {
        self.trace.join("; ")
    }

    /// "quantity set, geometry and name"
    pub fn attempted_text(&self) -> String {
        let labels: Vec<&str> = self.attempted.iter().map(|s| s.label()).collect();
        match labels.split_last() {
            None => "no strategy".to_string(),
            Some((last, [])) => last.to_string(),
            Some((last, rest)) => format!("{} and {}", rest.join(", "), last),
        }
    }
}

struct Hit {
    raw: f64,
    /// Already in metres (name heuristics, mm reinterpretation, unit labels)
    canonical: bool,
    unit: Option<String>,
    detail: String,
}

enum Attempt {
    NotApplicable,
    Missing(String),
    Found(Hit),
}

fn positive(value: f64) -> Option<f64> {
    (value.is_finite() && value > 0.0).then_some(value)
}

fn parse_number(text: &str) -> Option<f64> {
    text.replace(',', ".").parse::<f64>().ok().and_then(positive)
}

/// Scale of a unit label written next to a property value
fn label_scale(label: &str) -> Option<f64> {
    match label.trim().to_ascii_lowercase().as_str() {
        "mm" => Some(0.001),
        "cm" => Some(0.01),
        "m" => Some(1.0),
        _ => None,
    }
}

/// Resolves dimensions of elements in one model
pub struct DimensionResolver<'m> {
    model: &'m dyn IfcModel,
    scale: UnitScale,
}

impl<'m> DimensionResolver<'m> {
    /// Resolver using the model's declared length unit
    pub fn new(model: &'m dyn IfcModel) -> Self {
        Self::with_scale(model, UnitScale::of(model))
    }

    pub fn with_scale(model: &'m dyn IfcModel, scale: UnitScale) -> Self {
        Self { model, scale }
    }

    pub fn scale(&self) -> UnitScale {
        self.scale
    }

    /// Find `spec` for `element`, trying strategies in priority order
    pub fn resolve(&self, element: &Element, spec: &QuantitySpec) -> Resolution {
        let mut trace = Vec::with_capacity(Strategy::ORDER.len());
        let mut attempted = Vec::new();

        for strategy in Strategy::ORDER {
            let attempt = match strategy {
                Strategy::QuantitySet => self.try_quantity_sets(element, spec),
                Strategy::Geometry => self.try_geometry(element, spec),
                Strategy::PropertySet => self.try_property_sets(element, spec),
                Strategy::NameHeuristic => self.try_name(element, spec),
                Strategy::MaterialLayers => self.try_material_layers(element, spec),
            };

            match attempt {
                Attempt::NotApplicable => trace.push(format!("{strategy}: not applicable")),
                Attempt::Missing(what) => {
                    attempted.push(strategy);
                    trace.push(format!("{strategy}: {what}"));
                }
                Attempt::Found(hit) => {
                    attempted.push(strategy);
                    trace.push(format!("{strategy}: {}", hit.detail));
                    return self.finish(spec, strategy, hit, attempted, trace);
                }
            }
        }

        log::trace!("{} of {} unresolved", spec.name, element.id);
        Resolution {
            value: None,
            unit_hint: None,
            source: None,
            attempted,
            trace,
        }
    }

    /// First property carrying one of `keys`, with the same precedence as
    /// the property-set strategy
    pub fn property(&self, element: &Element, sets: &[&str], keys: &[&str]) -> Option<Property> {
        let props = self.model.properties();
        let instance = props.property_sets(element.id);
        let types = props.type_property_sets(element.id);
        find_property(&instance, &types, sets, keys).map(|(_, prop, _)| prop.clone())
    }

    fn finish(
        &self,
        spec: &QuantitySpec,
        strategy: Strategy,
        hit: Hit,
        attempted: Vec<Strategy>,
        trace: Vec<String>,
    ) -> Resolution {
        let (value, unit_hint) = if spec.unit_independent {
            (hit.raw, hit.unit)
        } else if hit.canonical {
            (hit.raw, Some("m".to_string()))
        } else {
            (self.scale.normalize(hit.raw), Some("m".to_string()))
        };

        Resolution {
            value: Some(value),
            unit_hint,
            source: Some(strategy),
            attempted,
            trace,
        }
    }

    fn try_quantity_sets(&self, element: &Element, spec: &QuantitySpec) -> Attempt {
        if spec.quantity_keys.is_empty() {
            return Attempt::NotApplicable;
        }

        let qsets = self.model.properties().quantity_sets(element.id);
        let ordered: Vec<_> = if spec.quantity_sets.is_empty() {
            qsets.iter().collect()
        } else {
            spec.quantity_sets
                .iter()
                .filter_map(|name| qsets.iter().find(|q| &q.name == name))
                .collect()
        };

        for qset in ordered {
            for key in &spec.quantity_keys {
                if let Some(value) = qset.get(key).and_then(|q| positive(q.value)) {
                    return Attempt::Found(Hit {
                        raw: value,
                        canonical: false,
                        unit: None,
                        detail: format!("{}.{} = {}", qset.name, key, value),
                    });
                }
            }
        }

        Attempt::Missing(format!(
            "no {} in {}",
            spec.quantity_keys.join("/"),
            if spec.quantity_sets.is_empty() {
                "any quantity set".to_string()
            } else {
                spec.quantity_sets.join(", ")
            }
        ))
    }

    fn try_geometry(&self, element: &Element, spec: &QuantitySpec) -> Attempt {
        let Some(axis) = spec.geometry else {
            return Attempt::NotApplicable;
        };
        let shapes = self.model.shapes();

        let value = match axis {
            GeometryAxis::OverallWidth => shapes.overall_dimensions(element.id).width,
            GeometryAxis::OverallHeight => shapes.overall_dimensions(element.id).height,
            _ => shapes.extrusions(element.id).iter().find_map(|extrusion| {
                let profile = extrusion.profile.as_ref();
                let x = profile.and_then(|p| p.x_dim).and_then(positive);
                let y = profile.and_then(|p| p.y_dim).and_then(positive);
                let value = match axis {
                    GeometryAxis::ExtrusionDepth => extrusion.depth,
                    GeometryAxis::ProfileX => x,
                    GeometryAxis::ProfileY => y,
                    GeometryAxis::ProfileMin => match (x, y) {
                        (Some(x), Some(y)) => Some(x.min(y)),
                        (x, y) => x.or(y),
                    },
                    GeometryAxis::ProfileMax => match (x, y) {
                        (Some(x), Some(y)) => Some(x.max(y)),
                        (x, y) => x.or(y),
                    },
                    GeometryAxis::OverallWidth | GeometryAxis::OverallHeight => None,
                };
                value.and_then(positive)
            }),
        };

        match value.and_then(positive) {
            Some(raw) => Attempt::Found(Hit {
                raw,
                canonical: false,
                unit: None,
                detail: format!("{} = {}", axis.label(), raw),
            }),
            None => Attempt::Missing(format!("no {}", axis.label())),
        }
    }

    fn try_property_sets(&self, element: &Element, spec: &QuantitySpec) -> Attempt {
        if spec.property_keys.is_empty() {
            return Attempt::NotApplicable;
        }

        let props = self.model.properties();
        let instance = props.property_sets(element.id);
        let types = props.type_property_sets(element.id);
        let sets: Vec<&str> = spec.property_sets.iter().map(String::as_str).collect();
        let keys: Vec<&str> = spec.property_keys.iter().map(String::as_str).collect();

        let found = find_numeric(&instance, &types, &sets, &keys)
            .and_then(|(pset, prop, from_type)| Some((pset, prop, from_type, prop.value.as_f64()?)));
        let Some((pset, prop, from_type, raw)) = found else {
            return Attempt::Missing(format!("no numeric {}", spec.property_keys.join("/")));
        };

        let origin = if from_type { " (type)" } else { "" };
        let mut detail = format!("{}.{} = {}{}", pset.name, prop.name, raw, origin);

        if spec.unit_independent {
            return Attempt::Found(Hit {
                raw,
                canonical: false,
                unit: prop.unit.clone(),
                detail,
            });
        }

        let labelled = prop.unit.as_deref().and_then(|l| Some((l, label_scale(l)?)));
        if let Some((label, factor)) = labelled {
            detail.push_str(&format!(" [{label}]"));
            return Attempt::Found(Hit {
                raw: raw * factor,
                canonical: true,
                unit: None,
                detail,
            });
        }

        if let Some((min, max)) = spec.plausible_mm {
            let scaled_mm = self.scale.normalize(raw) * 1000.0;
            let plausible = (min..=max).contains(&scaled_mm);
            if !plausible && (min..=max).contains(&raw) {
                detail.push_str(", read as mm");
                return Attempt::Found(Hit {
                    raw: raw / 1000.0,
                    canonical: true,
                    unit: None,
                    detail,
                });
            }
        }

        Attempt::Found(Hit {
            raw,
            canonical: false,
            unit: None,
            detail,
        })
    }

    fn try_name(&self, element: &Element, spec: &QuantitySpec) -> Attempt {
        let Some(pattern) = spec.name_pattern else {
            return Attempt::NotApplicable;
        };
        if spec.unit_independent {
            return Attempt::NotApplicable;
        }
        let Some(name) = element.name.as_deref().filter(|n| !n.trim().is_empty()) else {
            return Attempt::Missing("element has no name".to_string());
        };

        match millimetres_in_name(name, pattern) {
            Some(mm) => Attempt::Found(Hit {
                raw: mm / 1000.0,
                canonical: true,
                unit: None,
                detail: format!("'{name}' read as {mm} mm"),
            }),
            None => Attempt::Missing(format!("no dimension in '{name}'")),
        }
    }

    fn try_material_layers(&self, element: &Element, spec: &QuantitySpec) -> Attempt {
        if !spec.material_layers {
            return Attempt::NotApplicable;
        }

        let Some(set) = self.model.properties().material_layers(element.id) else {
            return Attempt::Missing("none assigned".to_string());
        };
        match set.total_thickness() {
            Some(total) => Attempt::Found(Hit {
                raw: total,
                canonical: false,
                unit: None,
                detail: format!(
                    "{} layers total {}{}",
                    set.layers.len(),
                    total,
                    if set.from_type { " (type)" } else { "" }
                ),
            }),
            None => Attempt::Missing(format!("{} layers without thickness", set.layers.len())),
        }
    }
}

/// Millimetre value embedded in an element name
pub fn millimetres_in_name(name: &str, pattern: NamePattern) -> Option<f64> {
    if let Some(caps) = PAIR_PATTERN.captures(name) {
        let a = caps.get(1).and_then(|m| parse_number(m.as_str()));
        let b = caps.get(2).and_then(|m| parse_number(m.as_str()));
        if let (Some(a), Some(b)) = (a, b) {
            return Some(match pattern {
                NamePattern::Smaller => a.min(b),
                NamePattern::Larger => a.max(b),
                NamePattern::First => a,
            });
        }
    }

    MM_PATTERN
        .captures(name)
        .and_then(|caps| caps.get(1))
        .and_then(|m| parse_number(m.as_str()))
}

type Found<'a> = (&'a PropertySet, &'a Property, bool);

/// Named sets on the instance, named sets on the type, then any instance
/// set, then any type set
fn search<'a>(
    instance: &'a [PropertySet],
    types: &'a [PropertySet],
    sets: &[&str],
    keys: &[&str],
    accept: impl Fn(&Property) -> bool,
) -> Option<Found<'a>> {
    let named = |psets: &'a [PropertySet], from_type: bool| {
        sets.iter().find_map(|wanted| {
            let pset = psets.iter().find(|p| p.name == *wanted)?;
            keys.iter()
                .find_map(|key| pset.get(key).filter(|p| accept(p)))
                .map(|prop| (pset, prop, from_type))
        })
    };
    let any = |psets: &'a [PropertySet], from_type: bool| {
        psets.iter().find_map(|pset| {
            keys.iter()
                .find_map(|key| pset.get(key).filter(|p| accept(p)))
                .map(|prop| (pset, prop, from_type))
        })
    };

    named(instance, false)
        .or_else(|| named(types, true))
        .or_else(|| any(instance, false))
        .or_else(|| any(types, true))
}

fn find_numeric<'a>(
    instance: &'a [PropertySet],
    types: &'a [PropertySet],
    sets: &[&str],
    keys: &[&str],
) -> Option<Found<'a>> {
    search(instance, types, sets, keys, |p| {
        p.value.as_f64().and_then(positive).is_some()
    })
}

fn find_property<'a>(
    instance: &'a [PropertySet],
    types: &'a [PropertySet],
    sets: &[&str],
    keys: &[&str],
) -> Option<Found<'a>> {
    search(instance, types, sets, keys, |p| !p.value.is_empty())
}
