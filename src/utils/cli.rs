use std::path::PathBuf;

use clap::{Parser, Subcommand};
use log::LevelFilter;

#[derive(Parser, Debug)]
#[command(name = "jobbot")]
#[command(about = "Scrape job postings, structure them with AI and keep them in a spreadsheet", long_about = None)]
pub struct Args {
    /// Path to the configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config.toml", global = true)]
    pub config: PathBuf,

    /// Sets the logger's verbosity level
    #[arg(short, long, value_name = "VERBOSITY", default_value_t = LevelFilter::Info, global = true)]
    pub verbosity: LevelFilter,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Scrape one or more job posting URLs and append them to the spreadsheet
    Scrape {
        /// Job posting URLs (Indeed, LinkedIn, ...)
        #[arg(value_name = "URL", required = true)]
        urls: Vec<String>,

        /// Spreadsheet to append to, overriding the configured path
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Skip the AI fallback tiers
        #[arg(long)]
        no_ai: bool,

        /// Model to use instead of the configured one
        #[arg(short, long, value_name = "MODEL")]
        model: Option<String>,
    },

    /// Stream an AI summary of a job description
    Summarize {
        /// Path to file containing job description
        #[arg(long, value_name = "FILE", conflicts_with = "text")]
        file: Option<PathBuf>,

        /// Job description text
        #[arg(long, value_name = "TEXT")]
        text: Option<String>,

        /// Model to use instead of the configured one
        #[arg(short, long, value_name = "MODEL")]
        model: Option<String>,
    },

    /// Start the HTTP API
    Serve {
        /// Port to listen on, overriding the configured one
        #[arg(short, long, value_name = "PORT")]
        port: Option<u16>,
    },
}
