mod chat;
mod models;
mod scraper;
mod server;
mod store;
mod utils;

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use colored::Colorize;
use eyre::{Result, eyre};
use futures::StreamExt;
use log::{info, warn};

use crate::chat::agent::JobAgent;
use crate::models::job::{JobRecord, is_missing};
use crate::scraper::job::JobScraper;
use crate::store::spreadsheet::Spreadsheet;
use crate::utils::cli::{Args, Command};
use crate::utils::config::{Config, config};
use crate::utils::log::Logger;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();
    Logger::init(args.verbosity);

    info!(
        "starting jobbot {}",
        format!("v{}", env!("CARGO_PKG_VERSION")).magenta()
    );

    let config: Config = config(args.config)?;

    match args.command {
        Command::Scrape {
            urls,
            output,
            no_ai,
            model,
        } => scrape(&config, &urls, output, no_ai, model.as_deref()).await,
        Command::Summarize { file, text, model } => {
            summarize(&config, file.as_deref(), text, model.as_deref()).await
        }
        Command::Serve { port } => {
            let config = match port {
                Some(port) => Arc::new({
                    let mut cfg = (*config).clone();
                    cfg.server.port = port;
                    cfg
                }),
                None => config,
            };
            server::listen(config).await
        }
    }
}

async fn scrape(
    config: &Config,
    urls: &[String],
    output: Option<PathBuf>,
    no_ai: bool,
    model: Option<&str>,
) -> Result<()> {
    let agent = Arc::new(JobAgent::new(&config.llm));
    let mut scraper = JobScraper::new(config, agent)?;
    if no_ai {
        scraper = scraper.without_ai();
    }

    let mut jobs = Vec::new();
    for (idx, url) in urls.iter().enumerate() {
        println!(
            "\n{} {}",
            format!("[{}/{}]", idx + 1, urls.len()).cyan(),
            url.bold()
        );

        let path = Path::new(url);
        let result = if path.is_file() {
            scraper.scrape_file(path, model).await
        } else {
            scraper.scrape(url, model).await
        };

        match result {
            Ok(job) => {
                print_job(&job);
                jobs.push(job);
            }
            Err(e) => {
                warn!("failed to scrape {}: {:#}", url, e);
                println!("{}", format!("✗ {:#}", e).red());
            }
        }
    }

    if jobs.is_empty() {
        return Err(eyre!("no job postings could be scraped"));
    }

    let path = output.unwrap_or_else(|| config.spreadsheet.path.clone());
    let spreadsheet = Arc::new(Spreadsheet::new(path));
    let count = jobs.len();
    let total = {
        let spreadsheet = spreadsheet.clone();
        tokio::task::spawn_blocking(move || spreadsheet.append(&jobs)).await??
    };

    println!(
        "\n{}",
        format!(
            "✓ saved {} job(s) to {} ({} rows)",
            count,
            spreadsheet.path().display(),
            total
        )
        .green()
    );
    Ok(())
}

fn print_job(job: &JobRecord) {
    let field = |label: &str, value: &str| {
        let value = if is_missing(value) {
            value.dimmed()
        } else {
            value.normal()
        };
        println!("  {:<10} {}", label.cyan(), value);
    };

    field("title", &job.title);
    field("company", &job.company);
    field("location", &job.location);
    field("salary", &job.salary);

    for (label, items) in [
        ("requires", &job.requirements),
        ("duties", &job.responsibilities),
    ] {
        println!("  {:<10} {}", label.cyan(), format!("{} item(s)", items.len()).normal());
        for item in items.iter().take(3) {
            println!("             • {}", item);
        }
    }

    if !job.keywords.is_empty() {
        println!("  {:<10} {}", "keywords".cyan(), job.keywords.join(", ").yellow());
    }
}

async fn summarize(
    config: &Config,
    file: Option<&Path>,
    text: Option<String>,
    model: Option<&str>,
) -> Result<()> {
    let description = match (file, text) {
        (Some(path), _) => {
            info!("reading job description from file: {}", path.display());
            tokio::fs::read_to_string(path).await?
        }
        (None, Some(text)) => text,
        (None, None) => return Err(eyre!("provide a job description with --file or --text")),
    };

    let agent = JobAgent::new(&config.llm);
    let mut chunks = agent.stream_summary(&description, model).await?;

    let mut stdout = std::io::stdout();
    while let Some(chunk) = chunks.next().await {
        write!(stdout, "{}", chunk?)?;
        stdout.flush()?;
    }
    writeln!(stdout)?;

    Ok(())
}
