use anyhow::Result;
use clap::Parser;

use vantage_cli::cli::{Cli, Command, LogFormatArg};
use vantage_cli::commands;
use vantage_cli::logging::{LogConfig, LogFormat, init_logging};

fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.color.write_global();

    let format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    let config = LogConfig::default()
        .with_level_filter(cli.verbosity.tracing_level_filter())
        .with_format(format)
        .with_ansi(cli.log_file.is_none())
        .with_log_file(cli.log_file.clone());
    init_logging(&config)?;

    match &cli.command {
        Command::Run(args) => commands::run(args),
        Command::Domains => commands::domains(),
        Command::Kpis(args) => commands::kpis(args),
    }
}
