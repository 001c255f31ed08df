// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::args::{CheckArgs, Command};
use crate::exit_codes;
use anyhow::{Context, Result};
use ifcore_engine::{EngineConfig, Orchestrator, OrchestratorOptions, ProjectInfo, Registry};
use ifcore_model::IfcModel;
use std::fmt::Write as _;

pub fn dispatch(cmd: Command) -> Result<i32> {
    match cmd {
        Command::Check(args) => check(&args),
        Command::Rules => {
            print!("{}", rules_listing(&Registry::standard()));
            Ok(exit_codes::SUCCESS)
        }
    }
}

/// File configuration with command-line overrides applied
fn engine_config(args: &CheckArgs) -> Result<EngineConfig> {
    let mut config = match &args.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("failed to load configuration {}", path.display()))?,
        None => EngineConfig::default(),
    };

    if let Some(region) = &args.region {
        config.region = region.clone();
    }
    if let Some(workers) = args.workers {
        config.workers = workers;
    }
    if let Some(secs) = args.rule_timeout {
        config.rule_timeout_secs = secs;
    }
    if let Some(providers) = &args.providers {
        config.providers = Some(providers.clone());
    }

    config.validate().context("invalid configuration")?;
    Ok(config)
}

pub fn check(args: &CheckArgs) -> Result<i32> {
    let config = engine_config(args)?;
    let registry = match &config.providers {
        Some(ids) => Registry::standard().only(ids)?,
        None => Registry::standard(),
    };

    let model = ifcore_step::open(&args.file)
        .with_context(|| format!("failed to read model {}", args.file.display()))?;
    log::info!(
        "{}: {} entities, schema {}",
        args.file.display(),
        model.element_count(),
        model.metadata().schema_version
    );

    let orchestrator = Orchestrator::new(registry, OrchestratorOptions::from_config(&config))?;
    let info = ProjectInfo {
        name: args.name.clone(),
        file_url: Some(args.file.display().to_string()),
        region: Some(config.region.clone()),
        building_type: args.building_type.clone(),
        ..ProjectInfo::default()
    };
    let project = orchestrator.run(model, info);

    let json = project.to_json(!args.compact)?;
    match &args.output {
        Some(path) => std::fs::write(path, json)
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => println!("{json}"),
    }

    log::info!(
        "{} checks: {} pass, {} fail, {} error",
        project.total_checks(),
        project.passed_checks(),
        project.failed_checks(),
        project.degraded_checks()
    );

    if args.fail_on_violation && project.failed_checks() > 0 {
        Ok(exit_codes::VIOLATION)
    } else {
        Ok(exit_codes::SUCCESS)
    }
}

fn rules_listing(registry: &Registry) -> String {
    let mut out = String::new();
    for provider in registry.providers() {
        let _ = writeln!(out, "{}", provider.id());
        for rule in provider.rules() {
            let _ = writeln!(out, "  {}", rule.name());
        }
    }
    out
}
