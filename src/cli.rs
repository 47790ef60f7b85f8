use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::commands::report::colors::{KitColor, parse_kit_color};

#[derive(Parser, Debug)]
#[command(
    name = "kitpick",
    version,
    about = "Rebuild kit picking tables from scanned documents and render a colored report"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract, merge and render the picking table as a colored PDF.
    Render(RenderArgs),
    /// Extract and merge the picking table, printing it to stdout.
    Extract(ExtractArgs),
}

#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    /// Picking document to read, or `-` for stdin.
    pub input: PathBuf,

    /// Treat the input as plain text that was already extracted from the document.
    #[arg(long, default_value_t = false)]
    pub from_text: bool,
}

#[derive(Args, Debug, Clone)]
pub struct RenderArgs {
    #[command(flatten)]
    pub source: InputArgs,

    /// Kit color as NAME=COLOR (e.g. `KIT-04=#ffcc00`). Repeatable.
    #[arg(long = "kit", value_name = "NAME=COLOR", value_parser = parse_kit_color)]
    pub kits: Vec<KitColor>,

    /// Destination of the rendered report. Defaults to the user's downloads folder.
    #[arg(long)]
    pub output: Option<PathBuf>,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,

    #[arg(long)]
    pub title: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct ExtractArgs {
    #[command(flatten)]
    pub source: InputArgs,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}
