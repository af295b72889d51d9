//! `outreach` CLI entry point.
//!
//! Deterministic subcommands (`parse`, `outline`, `summarize`) need no
//! credentials. `generate` loads config and credentials, builds the model
//! router and runs the full pipeline. Results are JSON on stdout; logs go to
//! stderr.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use outreach::assets::summarizer::summarize_document;
use outreach::assets::{Asset, InstrumentOverride};
use outreach::config::{config_dir, load_or_default};
use outreach::credentials::load_default_credentials;
use outreach::pipeline::{GenerationInput, GenerationRequest, OutreachPipeline};
use outreach::providers::router::ModelRouter;
use outreach::sequence::availability::AvailabilityInput;
use outreach::sequence::outline::build_content_outline;
use outreach::sequence::parser::{detect_instrument, parse_sequence};

/// Outreach: build six-part sales outreach sequences.
#[derive(Parser)]
#[command(name = "outreach", version, about)]
struct Cli {
    /// Config file (default: ~/.outreach/config.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

/// Available CLI subcommands.
#[derive(Subcommand)]
enum Command {
    /// Parse a pasted sequence into its six sections.
    Parse {
        /// File containing the pasted sequence.
        file: PathBuf,
    },
    /// Build the content outline from a research brief.
    Outline {
        /// File containing the research brief.
        brief: PathBuf,
    },
    /// Summarize extracted document text.
    Summarize {
        /// File containing the document text.
        file: PathBuf,
    },
    /// Generate a full sequence with the configured models.
    Generate {
        /// File containing lead intel (tab-delimited lead rows work best).
        #[arg(long, conflicts_with = "pasted")]
        lead: Option<PathBuf>,
        /// File containing a research brief; research runs when omitted.
        #[arg(long, requires = "lead")]
        brief: Option<PathBuf>,
        /// File containing a pasted sequence to normalize instead.
        #[arg(long)]
        pasted: Option<PathBuf>,
        /// Availability text inserted into emails 1-3.
        #[arg(long)]
        availability: Option<String>,
        /// Platform override: CosMx, GeoMx, CellScape or auto.
        #[arg(long, default_value = "auto")]
        instrument: InstrumentOverride,
        /// JSON file with the knowledge-base asset list.
        #[arg(long)]
        assets: Option<PathBuf>,
        /// Sequence name; derived from the input when omitted.
        #[arg(long)]
        name: Option<String>,
        /// Also write JSON logs to this directory.
        #[arg(long)]
        log_dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Parse { file } => {
            outreach::logging::init_cli();
            handle_parse(&file)
        }
        Command::Outline { brief } => {
            outreach::logging::init_cli();
            handle_outline(&brief)
        }
        Command::Summarize { file } => {
            outreach::logging::init_cli();
            handle_summarize(&file)
        }
        Command::Generate {
            lead,
            brief,
            pasted,
            availability,
            instrument,
            assets,
            name,
            log_dir,
        } => {
            let _logging_guard = match log_dir {
                Some(dir) => Some(outreach::logging::init_production(&dir)?),
                None => {
                    outreach::logging::init_cli();
                    None
                }
            };
            let input = match (lead, pasted) {
                (Some(lead), _) => GenerationInput::Lead {
                    lead_intel: read_text(&lead)?,
                    research_brief: brief.as_deref().map(read_text).transpose()?,
                },
                (None, Some(pasted)) => GenerationInput::Pasted(read_text(&pasted)?),
                (None, None) => anyhow::bail!("generate needs --lead or --pasted"),
            };
            let request = GenerationRequest {
                input,
                availability: availability.map(AvailabilityInput::Block),
                instrument,
                assets: assets.as_deref().map(read_assets).transpose()?.unwrap_or_default(),
                name,
            };
            handle_generate(cli.config, request).await
        }
    }
}

fn read_text(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn read_assets(path: &Path) -> anyhow::Result<Vec<Asset>> {
    let raw = read_text(path)?;
    serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse asset list {}", path.display()))
}

fn print_json(value: &impl serde::Serialize) -> anyhow::Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("failed to render JSON")?;
    println!("{rendered}");
    Ok(())
}

/// Parse a pasted sequence and report the detected instrument.
fn handle_parse(file: &Path) -> anyhow::Result<()> {
    let raw = read_text(file)?;
    let sections = parse_sequence(&raw).completed();
    print_json(&serde_json::json!({
        "instrument": detect_instrument(&sections.all_text()),
        "sections": sections,
    }))
}

fn handle_outline(brief: &Path) -> anyhow::Result<()> {
    let text = read_text(brief)?;
    let outline = build_content_outline("", &text)
        .with_context(|| format!("cannot build outline from {}", brief.display()))?;
    print_json(&outline)
}

fn handle_summarize(file: &Path) -> anyhow::Result<()> {
    let text = read_text(file)?;
    print_json(&summarize_document(&text))
}

/// Load config and credentials, then run one generation.
async fn handle_generate(
    config_path: Option<PathBuf>,
    request: GenerationRequest,
) -> anyhow::Result<()> {
    let config_path = match config_path {
        Some(path) => path,
        None => config_dir()?.join("config.toml"),
    };
    let config = load_or_default(&config_path)?;
    let credentials = load_default_credentials().context("failed to load credentials")?;

    let router = ModelRouter::from_config(&config.models, &credentials)
        .context("failed to create model router")?;
    let pipeline = OutreachPipeline::new(&router, &config).context("failed to build pipeline")?;

    info!(config = %config_path.display(), "starting generation");
    let generated = pipeline.run(request).await?;
    print_json(&generated.into_record())
}
