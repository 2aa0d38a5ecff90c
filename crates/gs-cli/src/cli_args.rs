use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "gridscript")]
#[command(about = "GridScript tabular scenario checker and console player")]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Mode,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Mode {
    Check(CheckArgs),
    Play(PlayArgs),
}

#[derive(Debug, Args)]
pub(crate) struct CheckArgs {
    #[arg(long = "scenario-dir")]
    pub(crate) scenario_dir: String,
}

#[derive(Debug, Args)]
pub(crate) struct PlayArgs {
    #[arg(long = "scenario-dir")]
    pub(crate) scenario_dir: String,
    #[arg(long = "label")]
    pub(crate) label: Option<String>,
    #[arg(long = "assets-dir")]
    pub(crate) assets_dir: Option<String>,
    /// Advance every line and pick the first option of every choice.
    #[arg(long = "auto")]
    pub(crate) auto: bool,
}
