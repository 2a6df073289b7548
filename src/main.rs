// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments (and SPIDER_* env vars) using clap
// 2. Set up logging with tracing-subscriber
// 3. Crawl the site with deadlink_spider::run
// 4. Print the timelapse and every dead link
// 5. Exit with proper code (0 = no dead links, 1 = dead links, 2 = error)
// =============================================================================

mod cli;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

use cli::Cli;
use deadlink_spider::{LinkReport, TracingEvents};

#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            // If an unexpected error occurred, print it and exit with code 2
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

// Returns:
//   Ok(0) = no dead links
//   Ok(1) = dead links found
//   Err   = the crawl could not run (bad URL, bad config, ...)
async fn run() -> Result<i32> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = cli.to_config();

    // In JSON mode stdout carries only the JSON document
    if !cli.json {
        println!("Crawler::URL[{}]", config.seed_url);
        println!("Crawler::Crawl External Links[{}]", config.allow_external);
        println!("Crawler::Workers[{}]", config.max_workers);
    }

    let start = Utc::now();
    let timer = Instant::now();

    let dead_links = deadlink_spider::run(&config, Arc::new(TracingEvents))
        .await
        .with_context(|| format!("crawl of {} failed", config.seed_url))?;

    let end = Utc::now();

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&dead_links)?);
    } else {
        println!("--------------------Timelapse-------------------------------");
        println!("Start Time: {}", start);
        println!("End Time: {}", end);
        println!("Duration: {:?}", timer.elapsed());

        if dead_links.is_empty() {
            println!("------------------------------------------------------------");
            println!("✅ No dead links found");
        } else {
            println!("--------------------DEAD LINKS------------------------------");
            print_table(&dead_links);
        }
    }

    if dead_links.is_empty() {
        Ok(0)
    } else {
        Ok(1) // Exit code 1 = dead links found
    }
}

// Logs go to stderr so they never mix with the report on stdout
fn init_logging(verbose: bool) {
    let default = if verbose { "deadlink_spider=debug,info" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

// Prints dead links as a human-readable table in the terminal
fn print_table(dead_links: &[LinkReport]) {
    println!("{:<60} {:<8} {:<40}", "URL", "STATUS", "ERROR");
    println!("{}", "=".repeat(108));

    for report in dead_links {
        let error = report
            .error
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default();

        // Truncate URL if too long for display
        let url_display = if report.link.chars().count() > 57 {
            let head: String = report.link.chars().take(57).collect();
            format!("{}...", head)
        } else {
            report.link.clone()
        };

        println!("{:<60} {:<8} {:<40}", url_display, report.status, error);
    }

    println!();

    let unreachable = dead_links.iter().filter(|r| r.is_transport_failure()).count();

    println!("📊 Summary:");
    println!("   ❌ Dead: {}", dead_links.len());
    println!("   🌐 Unreachable: {}", unreachable);
}
