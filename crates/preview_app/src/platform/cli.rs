use std::path::PathBuf;

use clap::Parser;

use super::logging::LogDestination;

/// Fetch, decode and render previews for encrypted file records.
#[derive(Debug, Parser)]
#[command(name = "image-preview", version)]
pub struct Cli {
    /// RON configuration file. Defaults apply when omitted or missing.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// JSON file holding one record or an array of records. Repeatable.
    #[arg(long = "record", value_name = "FILE")]
    pub records: Vec<PathBuf>,

    /// Display name of a single record given on the command line.
    #[arg(long, requires = "encrypted_id")]
    pub name: Option<String>,

    /// Encrypted identifier of a single record given on the command line.
    #[arg(long)]
    pub encrypted_id: Option<String>,

    /// Encrypted web content link of a single record given on the command line.
    #[arg(long)]
    pub content_link: Option<String>,

    /// Write the rendered HTML here instead of stdout.
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Where log output goes.
    #[arg(long, value_enum, default_value_t = LogDestination::Terminal)]
    pub log: LogDestination,
}
