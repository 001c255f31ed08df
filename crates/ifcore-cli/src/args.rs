// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "ifcore",
    version,
    about = "Building code compliance checks for IFC models"
)]
pub struct Cli {
    /// Log at debug level (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the registered checks against a model and print the project JSON
    Check(CheckArgs),
    /// List providers and their checks in registration order
    Rules,
}

#[derive(Args, Debug, Clone)]
pub struct CheckArgs {
    /// IFC (STEP) file to check
    pub file: PathBuf,

    /// YAML engine configuration
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Region code, overrides the configuration
    #[arg(long)]
    pub region: Option<String>,

    /// Worker threads
    #[arg(long)]
    pub workers: Option<usize>,

    /// Per-rule timeout in seconds
    #[arg(long = "rule-timeout", value_name = "SECS")]
    pub rule_timeout: Option<u64>,

    /// Run only these providers
    #[arg(long, value_delimiter = ',')]
    pub providers: Option<Vec<String>>,

    /// Write the JSON here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Single-line JSON
    #[arg(long)]
    pub compact: bool,

    /// Exit with 1 when any check fails
    #[arg(long)]
    pub fail_on_violation: bool,

    /// Project name, defaults to the file name in the model header
    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub building_type: Option<String>,
}
