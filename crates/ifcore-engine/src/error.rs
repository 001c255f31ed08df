// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the compliance engine
//!
//! Missing model data is not an error anywhere in this crate: it becomes a
//! `blocked` element result. The types here cover defects in rule code,
//! malformed rule output, bad configuration and registry mistakes.

use std::time::Duration;
use thiserror::Error;

/// Failure raised by a rule function itself
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuleError {
    /// The rule asked for a threshold nobody defined
    #[error("unknown threshold `{0}`")]
    UnknownThreshold(String),

    /// The rule noticed its time budget had run out
    #[error("rule deadline exceeded")]
    DeadlineExceeded,

    /// Any other internal failure of the rule
    #[error("{0}")]
    Failed(String),
}

impl RuleError {
    /// Create a generic rule failure
    pub fn failed(msg: impl Into<String>) -> Self {
        RuleError::Failed(msg.into())
    }
}

/// A record returned by a rule that does not satisfy the output contract
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContractViolation {
    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("status `{0}` is not one of pass, fail, warning, blocked, log")]
    UnknownStatus(String),

    /// `fail` and `blocked` rows must explain themselves
    #[error("`{0}` result without a rationale")]
    MissingRationale(String),
}

/// Why a rule produced no usable result
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuleFailure {
    #[error("{0}")]
    Defect(#[from] RuleError),

    #[error("rule panicked: {0}")]
    Panicked(String),

    #[error("rule exceeded its {}s time budget", .0.as_secs_f64())]
    TimedOut(Duration),

    #[error("record {index}: {violation}")]
    Contract {
        index: usize,
        violation: ContractViolation,
    },

    #[error("could not start rule thread: {0}")]
    Spawn(String),
}

/// Registry construction errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("provider `{0}` is registered twice")]
    DuplicateProvider(String),

    #[error("provider `{provider}` declares rule `{rule}` twice")]
    DuplicateRule { provider: String, rule: String },

    #[error("unknown provider `{0}`")]
    UnknownProvider(String),
}

/// Configuration loading and validation errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("unknown threshold `{0}`")]
    UnknownThreshold(String),

    #[error("invalid value for `{key}`: {reason}")]
    InvalidValue { key: String, reason: String },
}

impl ConfigError {
    pub fn invalid(key: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

/// Errors surfaced by the engine's public entry points
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Result type alias for engine entry points
pub type Result<T> = std::result::Result<T, EngineError>;
