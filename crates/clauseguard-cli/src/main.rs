mod display;

use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};

use clauseguard_audit::{JsonlSink, load_verified};
use clauseguard_core::{AnalysisConfig, Domain};
use clauseguard_pipeline::Pipeline;

#[derive(Parser)]
#[command(name = "clauseguard", version, about = "Contract clause risk analysis")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum DomainArg {
    Generic,
    Labor,
    Realestate,
    ItSaas,
}

impl From<DomainArg> for Domain {
    fn from(arg: DomainArg) -> Self {
        match arg {
            DomainArg::Generic => Domain::Generic,
            DomainArg::Labor => Domain::Labor,
            DomainArg::Realestate => Domain::RealEstate,
            DomainArg::ItSaas => Domain::ItSaas,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Analyze a normalized contract text file.
    Analyze {
        file: PathBuf,
        /// Contract domain selecting pattern and axiom packs; overrides the
        /// config file.
        #[arg(long, value_enum)]
        domain: Option<DomainArg>,
        /// Analysis configuration JSON; the command-line domain wins.
        #[arg(long)]
        config: Option<PathBuf>,
        /// Append audit records to this JSONL file.
        #[arg(long)]
        audit_log: Option<PathBuf>,
        /// Emit the report as JSON instead of cards.
        #[arg(long)]
        json: bool,
    },
    /// Verify the integrity of an audit chain file.
    VerifyAudit { file: PathBuf },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    tracing::info!("clauseguard v{}", env!("CARGO_PKG_VERSION"));
    let cli = Cli::parse();

    match cli.command {
        Command::Analyze {
            file,
            domain,
            config,
            audit_log,
            json,
        } => {
            let mut cfg = match config {
                Some(path) => {
                    let raw = fs::read_to_string(&path)
                        .with_context(|| format!("reading config {}", path.display()))?;
                    serde_json::from_str::<AnalysisConfig>(&raw)
                        .with_context(|| format!("parsing config {}", path.display()))?
                }
                None => AnalysisConfig::default(),
            };
            if let Some(domain) = domain {
                cfg.domain = domain.into();
            }

            let pipeline = match audit_log {
                Some(path) => {
                    let sink = JsonlSink::open(&path).context("opening audit log")?;
                    Pipeline::with_audit_sink(cfg, sink)
                }
                None => Pipeline::new(cfg),
            };

            let text = fs::read_to_string(&file)
                .with_context(|| format!("reading contract {}", file.display()))?;
            let report = pipeline.analyze(&text).await?;

            if json {
                let out = serde_json::json!({
                    "verdicts": report.verdicts,
                    "records": report.records,
                });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                print!("{}", display::render_report(&report.verdicts));
            }
        }
        Command::VerifyAudit { file } => {
            let records = load_verified(&file)
                .with_context(|| format!("verifying audit chain {}", file.display()))?;
            println!("chain OK: {} records", records.len());
        }
    }
    Ok(())
}
