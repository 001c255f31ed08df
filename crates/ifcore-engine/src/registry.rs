// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Rule registry
//!
//! An immutable table of providers, each contributing an ordered list of
//! rules. Providers are added by explicit registration; the orchestrator
//! only ever iterates the table.

use crate::config::RuleConfig;
use crate::error::{RegistryError, RuleError};
use crate::report::{ElementResult, RawElementRecord};
use ifcore_model::IfcModel;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Rows as a rule hands them back
///
/// Built-in rules produce typed rows. Rules that wrap an external provider
/// may return loosely typed records instead; those are validated one by one
/// before they reach a report.
#[derive(Clone, Debug, PartialEq)]
pub enum RuleOutput {
    Elements(Vec<ElementResult>),
    Records(Vec<RawElementRecord>),
}

impl RuleOutput {
    pub fn len(&self) -> usize {
        match self {
            RuleOutput::Elements(rows) => rows.len(),
            RuleOutput::Records(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Signature every rule implements
pub type RuleFn =
    Arc<dyn Fn(&dyn IfcModel, &RuleConfig) -> Result<RuleOutput, RuleError> + Send + Sync>;

/// A named rule function
#[derive(Clone)]
pub struct Rule {
    name: String,
    func: RuleFn,
}

impl Rule {
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&dyn IfcModel, &RuleConfig) -> Result<Vec<ElementResult>, RuleError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(move |model: &dyn IfcModel, config: &RuleConfig| {
                func(model, config).map(RuleOutput::Elements)
            }),
        }
    }

    /// Rule that returns raw records, converted and checked by the orchestrator
    pub fn from_records<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&dyn IfcModel, &RuleConfig) -> Result<Vec<RawElementRecord>, RuleError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(move |model: &dyn IfcModel, config: &RuleConfig| {
                func(model, config).map(RuleOutput::Records)
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn invoke(&self, model: &dyn IfcModel, config: &RuleConfig) -> Result<RuleOutput, RuleError> {
        (self.func)(model, config)
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule").field("name", &self.name).finish()
    }
}

/// A contributor of rules, identified by a stable name
#[derive(Clone, Debug)]
pub struct Provider {
    id: String,
    rules: Vec<Rule>,
}

impl Provider {
    pub fn new(id: impl Into<String>, rules: Vec<Rule>) -> Self {
        Self {
            id: id.into(),
            rules,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }
}

/// Builder for a [`Registry`]
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    providers: Vec<Provider>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider; order of calls is the order of results
    pub fn provider(mut self, id: impl Into<String>, rules: Vec<Rule>) -> Self {
        self.providers.push(Provider::new(id, rules));
        self
    }

    pub fn build(self) -> Result<Registry, RegistryError> {
        let mut ids = HashSet::new();
        for provider in &self.providers {
            if !ids.insert(provider.id.as_str()) {
                return Err(RegistryError::DuplicateProvider(provider.id.clone()));
            }
            let mut names = HashSet::new();
            for rule in &provider.rules {
                if !names.insert(rule.name.as_str()) {
                    return Err(RegistryError::DuplicateRule {
                        provider: provider.id.clone(),
                        rule: rule.name.clone(),
                    });
                }
            }
        }
        Ok(Registry {
            providers: self.providers,
        })
    }
}

/// Immutable provider table
#[derive(Clone, Debug)]
pub struct Registry {
    providers: Vec<Provider>,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Registry with the built-in rule providers
    pub fn standard() -> Self {
        Self {
            providers: crate::rules::standard_providers(),
        }
    }

    /// Keep only the named providers, preserving registration order
    pub fn only(&self, ids: &[impl AsRef<str>]) -> Result<Registry, RegistryError> {
        for id in ids {
            let id = id.as_ref();
            if !self.providers.iter().any(|p| p.id == id) {
                return Err(RegistryError::UnknownProvider(id.to_string()));
            }
        }
        Ok(Registry {
            providers: self
                .providers
                .iter()
                .filter(|p| ids.iter().any(|id| id.as_ref() == p.id))
                .cloned()
                .collect(),
        })
    }

    pub fn providers(&self) -> &[Provider] {
        &self.providers
    }

    /// All rules with their provider, in registration order
    pub fn rules(&self) -> impl Iterator<Item = (&Provider, &Rule)> {
        self.providers
            .iter()
            .flat_map(|provider| provider.rules.iter().map(move |rule| (provider, rule)))
    }

    /// Number of rules
    pub fn len(&self) -> usize {
        self.providers.iter().map(|p| p.rules.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
