use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod cache;
mod dashboard;
mod jitter;
mod loader;
mod map;
mod models;
mod page;
mod prepare;
mod server;
mod severity;
mod towns;

use dashboard::{Dashboard, DashboardSettings};

#[derive(Parser)]
#[command(name = "meetkaart")]
#[command(about = "Interactive map of geocoded measurement records per calendar year", long_about = None)]
struct Cli {
    /// Spreadsheet (.xlsx, .xls, .ods) or .csv export with the measurements
    #[arg(
        long,
        global = true,
        env = "MEETKAART_INPUT",
        default_value = "Dummy_bestand_volledig_random_2014_2024.xlsx"
    )]
    input: PathBuf,
    /// Seed for coordinate jitter and marker sampling
    #[arg(long, global = true, env = "MEETKAART_SEED", default_value_t = prepare::DEFAULT_SEED)]
    seed: u64,
    /// Maximum number of markers drawn per year
    #[arg(long, global = true, env = "MEETKAART_SAMPLE_CAP", default_value_t = map::DEFAULT_SAMPLE_CAP)]
    sample_cap: usize,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the interactive dashboard
    Serve {
        #[arg(long, env = "MEETKAART_BIND", default_value = "127.0.0.1")]
        bind: String,
        #[arg(long, env = "MEETKAART_PORT", default_value_t = 8501)]
        port: u16,
    },
    /// Write the dashboard page for one year to a static HTML file
    Render {
        /// Defaults to the most recent year in the data
        #[arg(long)]
        year: Option<i32>,
        #[arg(long, default_value = "meetkaart.html")]
        out: PathBuf,
    },
    /// List the calendar years present in the data
    Years,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let settings = DashboardSettings {
        seed: cli.seed,
        sample_cap: cli.sample_cap,
    };
    let mut dashboard = Dashboard::open(cli.input.clone(), settings)?;

    match cli.command {
        Commands::Serve { bind, port } => {
            server::serve(dashboard, &bind, port).await?;
        }
        Commands::Render { year, out } => {
            let view = dashboard.view(year)?;
            let html = page::build_page(&view, page::PageMode::Static)
                .context("failed to build dashboard page")?;
            std::fs::write(&out, html)
                .with_context(|| format!("failed to write {}", out.display()))?;
            match view.year {
                Some(year) => println!(
                    "Map for {year} with {} of {} points written to {}.",
                    view.map.markers.len(),
                    page::format_count(view.count),
                    out.display()
                ),
                None => println!("No dated records; empty map written to {}.", out.display()),
            }
        }
        Commands::Years => {
            let summaries = dashboard.summaries()?;
            if summaries.is_empty() {
                println!("No dated records in {}.", cli.input.display());
                return Ok(());
            }

            println!("Years in {}:", cli.input.display());
            for summary in summaries {
                println!(
                    "- {}: {} records, {} on the map",
                    summary.year,
                    page::format_count(summary.record_count),
                    page::format_count(summary.placeable_count)
                );
            }
        }
    }

    Ok(())
}
