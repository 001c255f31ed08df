// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! IFCore Engine - compliance checking over building models
//!
//! Runs a registry of independent rules over a read-only [`IfcModel`] and
//! rolls their per-element verdicts up into per-check and per-project
//! summaries.
//!
//! # Architecture
//!
//! - [`units`] - Length unit of a model as a factor to metres
//! - [`dimension`] - Ordered fallback search for a physical dimension
//! - [`evaluate`] - Thresholds, verdicts and rationales
//! - [`registry`] - Providers and the rules they contribute
//! - [`orchestrator`] - Parallel, isolated rule execution
//! - [`report`] - Element, check and project results
//! - [`rules`] - Built-in rule providers
//!
//! # Example
//!
//! ```ignore
//! use ifcore_engine::{Orchestrator, OrchestratorOptions, ProjectInfo, Registry};
//!
//! let model = ifcore_step::open("house.ifc")?;
//! let orchestrator = Orchestrator::new(Registry::standard(), OrchestratorOptions::default())?;
//! let project = orchestrator.run(model, ProjectInfo::default());
//! println!("{}", project.to_json(true)?);
//! ```
//!
//! [`IfcModel`]: ifcore_model::IfcModel

pub mod config;
pub mod dimension;
pub mod error;
pub mod evaluate;
pub mod orchestrator;
pub mod registry;
pub mod report;
pub mod rules;
pub mod units;

pub use config::{EngineConfig, RuleConfig, DEFAULT_THRESHOLDS};
pub use dimension::{DimensionResolver, GeometryAxis, NamePattern, QuantitySpec, Resolution, Strategy};
pub use error::{
    ConfigError, ContractViolation, EngineError, RegistryError, Result, RuleError, RuleFailure,
};
pub use evaluate::{Evaluation, Requirement};
pub use orchestrator::{Orchestrator, OrchestratorOptions};
pub use registry::{Provider, Registry, RegistryBuilder, Rule, RuleFn, RuleOutput};
pub use report::{
    CheckResult, CheckStatus, ElementResult, ElementStatus, Project, ProjectInfo,
    ProviderSummary, RawElementRecord,
};
pub use units::UnitScale;
