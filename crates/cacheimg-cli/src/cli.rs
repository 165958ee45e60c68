use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "cacheimg",
    about = "Cache images as inline base64 data-URIs in a local store",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Store file (persistent backend)
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,

    /// Key namespace prefix
    #[arg(long, global = true)]
    pub prefix: Option<String>,

    /// TOML configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Fetch an image and cache it
    Fetch(FetchArgs),
    /// Print the cached data-URI for an image, refilling if needed
    Output(OutputArgs),
    /// Remove one cached image, or all of them
    Drop(DropArgs),
    /// List cached keys and their states
    List(ListArgs),
}

#[derive(Args)]
pub struct FetchArgs {
    pub url: String,
    /// Re-fetch even when already cached
    #[arg(long)]
    pub force: bool,
    /// Re-encode through a decoded bitmap
    #[arg(long)]
    pub canvas: bool,
}

#[derive(Args)]
pub struct OutputArgs {
    pub url: String,
}

#[derive(Args)]
pub struct DropArgs {
    pub url: Option<String>,
}

#[derive(Args)]
pub struct ListArgs {}
