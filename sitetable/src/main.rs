use std::{path::PathBuf, process::ExitCode};

use clap::{error::ErrorKind, CommandFactory, Parser};
use color_eyre::eyre::{Result, WrapErr};
use sitetable::{
    config::{Config, DuplicatePolicy},
    ser::WriteTable,
};
use tracing_subscriber::EnvFilter;

/// Extract site positions from map SVG.
#[derive(Parser)]
#[command(name = "sitetable", version)]
struct Cli {
    /// Map drawing holding the site markers
    drawing: PathBuf,

    /// Source file to (re)generate
    output: PathBuf,

    /// Layer and table layout overrides (TOML format)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Id of the group holding the site markers
    #[arg(long)]
    layer: Option<String>,

    /// Fail when two markers share a site id
    #[arg(long)]
    deny_duplicates: bool,
}

impl Cli {
    fn load_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        };
        if let Some(layer) = &self.layer {
            config.layer.id = layer.clone();
        }
        if self.deny_duplicates {
            config.duplicates = DuplicatePolicy::Reject;
        }
        Ok(config)
    }
}

fn main() -> Result<ExitCode> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("sitetable=info")),
        )
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            err.exit()
        }
        Err(err) => {
            eprint!("{}", err.render());
            println!(
                "Extract site positions from map SVG.\n{}",
                Cli::command().render_usage()
            );
            return Ok(ExitCode::from(1));
        }
    };

    let config = cli.load_config()?;
    let sink = WriteTable::create(&cli.output, config.table.clone());
    sitetable::generate(&cli.drawing, &config, sink).wrap_err_with(|| {
        format!(
            "failed to generate `{}` from `{}`",
            cli.output.display(),
            cli.drawing.display()
        )
    })?;

    Ok(ExitCode::SUCCESS)
}
