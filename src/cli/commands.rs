//! CLI commands implementation.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use super::helpers::{parse_site, parse_url_list, render_csv, render_table, summary_line};
use crate::batch::{run_batch, BatchAccumulator};
use crate::config::{load_settings, Settings};
use crate::models::SiteId;
use crate::scrapers::{resolve_user_agent, BrowserFetcher, HttpClient, Router};

#[derive(Parser)]
#[command(name = "bookfill")]
#[command(about = "Fill in book metadata from Korean online bookstore product pages")]
#[command(version)]
pub struct Cli {
    /// Product page URLs (YES24, ALADIN, KYOBO, YPBOOKS)
    urls: Vec<String>,

    /// File with one URL per line (blank lines and # comments are skipped)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Skip a store for this run (repeatable)
    #[arg(long = "disable", value_name = "SITE", value_parser = parse_site)]
    disable: Vec<SiteId>,

    /// Print results as JSON instead of a table
    #[arg(long)]
    json: bool,

    /// Print results as CSV (UTF-8 with BOM, opens cleanly in Excel)
    #[arg(long, conflicts_with = "json")]
    csv: bool,

    /// Write results to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Config file (TOML, YAML or JSON)
    #[arg(short, long, env = "BOOKFILL_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

/// Build the router with the static client and headless browser sharing one identity.
fn build_router(settings: &Settings) -> anyhow::Result<Router> {
    let user_agent = resolve_user_agent(settings.user_agent.as_deref());
    let http = HttpClient::with_user_agent(
        Duration::from_secs(settings.request_timeout),
        Some(&user_agent),
        Some(&settings.accept_language),
    )?;
    let browser = BrowserFetcher::new(settings.browser.clone())
        .with_identity(&user_agent, &settings.accept_language);

    Ok(Router::new(Arc::new(http), Arc::new(browser)).with_strategies(settings.strategies.clone()))
}

async fn collect_urls(args: &[String], input: Option<&Path>) -> anyhow::Result<Vec<String>> {
    let mut urls: Vec<String> = args
        .iter()
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .collect();

    if let Some(path) = input {
        let contents = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read URL list {}", path.display()))?;
        urls.extend(parse_url_list(&contents));
    }

    Ok(urls)
}

async fn write_output(path: Option<&Path>, contents: &str) -> anyhow::Result<()> {
    match path {
        Some(path) => {
            tokio::fs::write(path, contents)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("{} Wrote {}", style("→").dim(), path.display());
        }
        None => print!("{}", contents),
    }
    Ok(())
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (mut settings, config) = load_settings(cli.config.as_deref()).await?;
    if let Some(ref path) = config.source_path {
        tracing::info!("Using config {}", path.display());
    }
    for site in &cli.disable {
        settings.disable(*site);
    }

    let urls = collect_urls(&cli.urls, cli.input.as_deref()).await?;
    if urls.is_empty() {
        eprintln!("{} No URLs given", style("!").yellow());
        return Ok(());
    }

    let router = build_router(&settings)?;

    let pb = ProgressBar::new(urls.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );

    let mut acc = BatchAccumulator::new();
    run_batch(&router, &urls, &settings.enabled, &mut acc, |_, _, record| {
        pb.set_message(format!("{} {}", record.site, record.status.as_str()));
        pb.inc(1);
    })
    .await;
    pb.finish_and_clear();

    let rendered = if cli.json {
        let mut json = serde_json::to_string_pretty(acc.rows())?;
        json.push('\n');
        json
    } else if cli.csv {
        render_csv(acc.rows())?
    } else {
        render_table(acc.rows())
    };
    write_output(cli.output.as_deref(), &rendered).await?;

    eprintln!("{}", summary_line(acc.rows()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_cli_parses_flags() {
        let cli = Cli::try_parse_from([
            "bookfill",
            "https://www.yes24.com/Product/Goods/1",
            "--disable",
            "kyobo",
            "--disable",
            "YPBOOKS",
            "--json",
            "-o",
            "out.json",
        ])
        .unwrap();

        assert_eq!(cli.urls.len(), 1);
        assert_eq!(cli.disable, vec![SiteId::Kyobo, SiteId::Ypbooks]);
        assert!(cli.json);
        assert_eq!(cli.output, Some(PathBuf::from("out.json")));
    }

    #[test]
    fn test_cli_csv_and_json_are_exclusive() {
        let cli = Cli::try_parse_from(["bookfill", "--csv", "-o", "books.csv"]).unwrap();
        assert!(cli.csv);
        assert!(!cli.json);
        assert!(Cli::try_parse_from(["bookfill", "--csv", "--json"]).is_err());
    }

    #[test]
    fn test_cli_rejects_unknown_store() {
        assert!(Cli::try_parse_from(["bookfill", "--disable", "amazon"]).is_err());
    }

    #[tokio::test]
    async fn test_collect_urls_appends_input_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# list\nhttps://www.aladin.co.kr/shop/wproduct.aspx?ItemId=2\n").unwrap();

        let urls = collect_urls(
            &["https://www.yes24.com/Product/Goods/1".to_string(), " ".to_string()],
            Some(file.path()),
        )
        .await
        .unwrap();

        assert_eq!(
            urls,
            vec![
                "https://www.yes24.com/Product/Goods/1",
                "https://www.aladin.co.kr/shop/wproduct.aspx?ItemId=2"
            ]
        );
    }

    #[tokio::test]
    async fn test_collect_urls_missing_file() {
        let err = collect_urls(&[], Some(Path::new("/nonexistent/urls.txt")))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("/nonexistent/urls.txt"));
    }
}
