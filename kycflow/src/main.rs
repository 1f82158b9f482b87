use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use formkit::{FormSchema, RegionInfo};
use kycflow::{ctx::AppContext, fill::FillHandler, settings::Settings};
use log::LevelFilter;

/// Fill in configuration-driven KYC forms from the terminal.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Settings file (default: .kycflow.toml in the current directory).
    #[arg(long, global = true)]
    settings: Option<PathBuf>,
    /// Directory holding the manifest and region documents.
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the regions in the manifest.
    Regions,
    /// Print the JSON Schema of a configuration document.
    Schema {
        #[arg(value_enum, default_value_t = DocumentKind::Form)]
        document: DocumentKind,
    },
    /// Fill in and submit the form of a region.
    Fill {
        /// Region code, e.g. NL.
        region: String,
        /// Set a field before submitting (FIELD=VALUE, repeatable).
        #[arg(short, long = "set", value_name = "FIELD=VALUE")]
        set: Vec<String>,
        /// Prompt for each editable field.
        #[arg(short, long)]
        interactive: bool,
    },
}

/// Configuration document kinds.
#[derive(ValueEnum, Clone, Copy, Debug)]
enum DocumentKind {
    /// A per-region form document.
    Form,
    /// The region manifest.
    Manifest,
    /// The `.kycflow.toml` settings file.
    Settings,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::builder()
        .filter_level(LevelFilter::Warn)
        .parse_default_env()
        .init();

    let Cli {
        settings,
        config_dir,
        command,
    } = Cli::parse();

    match command {
        Commands::Schema { document } => {
            let schema = match document {
                DocumentKind::Form => schemars::schema_for!(FormSchema),
                DocumentKind::Manifest => schemars::schema_for!(Vec<RegionInfo>),
                DocumentKind::Settings => schemars::schema_for!(Settings),
            };
            println!("{}", serde_json::to_string_pretty(&schema)?);
        }
        Commands::Regions => {
            let ctx = context(settings, config_dir)?;
            if ctx.catalog.regions().is_empty() {
                println!(
                    "{}",
                    format!(
                        "No regions found in {} (settings: {})",
                        ctx.paths.config_dir.display(),
                        ctx.paths.settings.display()
                    )
                    .yellow()
                );
            }
            for region in ctx.catalog.regions() {
                let prefill = if ctx.settings.prefill.contains_key(&region.code) {
                    " (profile prefill)".dimmed().to_string()
                } else {
                    String::new()
                };
                println!("{:<4} {}{prefill}", region.code.bold(), region.name);
            }
        }
        Commands::Fill {
            region,
            set,
            interactive,
        } => {
            let ctx = context(settings, config_dir)?;
            let submitted = FillHandler::handle_fill(&ctx, &region, &set, interactive).await?;
            if !submitted {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

fn context(settings: Option<PathBuf>, config_dir: Option<PathBuf>) -> anyhow::Result<AppContext> {
    let workspace = std::env::current_dir().context("Failed to get the current directory")?;
    AppContext::new(workspace, settings, config_dir)
}
