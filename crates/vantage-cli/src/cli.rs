//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "vantage",
    version,
    about = "Vantage - turn tabular uploads into an analytics-ready dashboard",
    long_about = "Run the Vantage analytics pipeline over local files.\n\n\
                  Files are parsed, cleaned, classified into a business domain,\n\
                  linked across tables, and summarised into KPI and dashboard\n\
                  specifications."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the full pipeline over one or more data files.
    Run(RunArgs),

    /// List the business domains in the signature library.
    Domains,

    /// List the KPI library for one domain.
    Kpis(KpisArgs),
}

#[derive(Parser)]
pub struct RunArgs {
    /// Data files to analyse together as one project.
    #[arg(value_name = "FILE", required = true)]
    pub files: Vec<PathBuf>,

    /// Project name (default: the first file's stem).
    #[arg(long = "name", value_name = "NAME")]
    pub name: Option<String>,

    /// Output directory for generated artefacts (default: ./vantage-out).
    #[arg(long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Engine configuration file (TOML).
    #[arg(long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Confirm this domain instead of the detected one.
    #[arg(long = "domain", value_name = "DOMAIN")]
    pub domain: Option<String>,
}

#[derive(Parser)]
pub struct KpisArgs {
    /// Domain tag, e.g. retail or saas.
    #[arg(value_name = "DOMAIN")]
    pub domain: String,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
