use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use hdoc::{export_project, get_path, read_json, save_json, set_path, Project, ProjectLayout};
use std::path::PathBuf;
use std::process;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "hdoc")]
#[command(about = "HTML-based document builder with page-based architecture")]
#[command(version = "0.1.0")]
struct Args {
    /// Project directory
    #[arg(short = 'C', long = "project", default_value = ".", global = true)]
    project: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build dist/document.html from the numbered pages
    Build,
    /// Show or change values in .doc-config.json
    Config {
        /// Dotted key, e.g. global.page.size
        key: Option<String>,

        /// New value, parsed as JSON when possible
        value: Option<String>,
    },
    /// Export the built document
    Export {
        /// Output file path
        #[arg(default_value = "document.pdf")]
        output: PathBuf,

        /// Export format
        #[arg(short = 'f', long = "format", value_enum, default_value = "pdf")]
        format: ExportFormat,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ExportFormat {
    Pdf,
}

async fn build(layout: ProjectLayout) -> Result<()> {
    let report = Project::new(layout).build().await?;

    if !report.issues.is_empty() {
        warn!(
            "{} include warning(s) while building {}",
            report.issues.len(),
            report.output.display()
        );
    }
    info!("Output: {}", report.output.display().to_string().blue());
    Ok(())
}

async fn config(layout: ProjectLayout, key: Option<String>, value: Option<String>) -> Result<()> {
    let path = layout.config_path();
    if !tokio::fs::try_exists(&path).await? {
        return Err(anyhow!(
            "No .doc-config.json found at {}. Are you in an hdoc project directory?",
            path.display()
        ));
    }
    let mut raw = read_json(&path).await?;

    match (key, value) {
        (None, _) => {
            info!("Current configuration:");
            println!("{}", serde_json::to_string_pretty(&raw)?);
        }
        (Some(key), None) => match get_path(&raw, &key) {
            Some(val) => println!("{}: {}", key, serde_json::to_string(val)?),
            None => warn!("Key '{}' not found", key),
        },
        (Some(key), Some(value)) => {
            set_path(&mut raw, &key, &value)?;
            save_json(&path, &raw).await?;
            info!("Set {} = {}", key.green(), value);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let filter = EnvFilter::from_default_env()
        .add_directive("chromiumoxide::conn=off".parse().unwrap())
        .add_directive("chromiumoxide::handler=off".parse().unwrap())
        .add_directive("hdoc=info".parse().unwrap());

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    let args = Args::parse();
    let layout = ProjectLayout::at(args.project);

    let result = match args.command {
        Commands::Build => build(layout).await,
        Commands::Config { key, value } => config(layout, key, value).await,
        Commands::Export { output, format } => match format {
            ExportFormat::Pdf => export_project(&layout, &output).await,
        },
    };

    if let Err(e) = result {
        error!("{}", format!("Error: {}", e).red());
        process::exit(1);
    }
}
