use clap::{Parser, Subcommand};
use std::path::PathBuf;

use rtm_core::TemplateFormat;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Bulk import requirements into the RTM service")]
pub struct Cli {
    /// Path to the config file (defaults to $RTM_CONFIG_PATH or ~/.rtm-import.yaml)
    #[clap(long, global = true)]
    pub config: Option<PathBuf>,

    /// Increase log output (-v info, -vv debug)
    #[clap(long, short = 'v', global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the effective configuration
    Show,

    /// Write a default config file if none exists
    Init,

    /// Set the API base URL
    SetUrl {
        /// Base URL, e.g. https://rtm.example.com/api
        url: String,
    },

    /// Set the API bearer token
    SetToken { token: String },
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Import a CSV or Excel file
    Import {
        /// File to import (.csv, .txt, .xlsx, .xlsm, .xls, .xlsb, .ods)
        file: PathBuf,

        /// Allow required fields to stay unmapped; imported rows are flagged for review
        #[clap(long)]
        partial: bool,

        /// Override the inferred mapping, as HEADER=FIELD (FIELD may be "none")
        #[clap(long = "map", short = 'm', value_name = "HEADER=FIELD")]
        mappings: Vec<String>,

        /// Edit the column mapping interactively before review
        #[clap(long, short = 'i')]
        interactive: bool,

        /// Validate and show the payloads without submitting
        #[clap(long)]
        dry_run: bool,

        /// Write a JSON validation report to this path
        #[clap(long)]
        report: Option<PathBuf>,

        /// Skip loading reference data (no referential checks)
        #[clap(long)]
        offline: bool,

        /// Submit without asking for confirmation
        #[clap(long, short = 'y')]
        yes: bool,
    },

    /// Show the column mapping inferred from a file's headers
    Infer {
        file: PathBuf,
    },

    /// Validate a file without submitting it
    Validate {
        file: PathBuf,

        #[clap(long)]
        partial: bool,

        #[clap(long = "map", short = 'm', value_name = "HEADER=FIELD")]
        mappings: Vec<String>,

        #[clap(long)]
        offline: bool,

        /// Write a JSON validation report to this path
        #[clap(long)]
        report: Option<PathBuf>,
    },

    /// Generate an import template
    Template {
        /// csv or xlsx (defaults to the configured format)
        #[clap(long, short = 'f')]
        format: Option<TemplateFormat>,

        /// Output path (defaults to rtm-import-template.<ext>)
        #[clap(long, short = 'o')]
        output: Option<PathBuf>,

        /// Leave out the sample row
        #[clap(long)]
        no_sample: bool,

        /// Do not fetch reference data for the sample row and Reference sheet
        #[clap(long)]
        offline: bool,
    },

    /// List the importable fields
    Fields,

    /// Manage configuration
    #[clap(subcommand)]
    Config(ConfigCommand),
}
