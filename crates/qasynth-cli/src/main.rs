//! qasynth CLI - Command-line interface
//!
//! Usage:
//!   qasynth generate --input <file> --topic <t>... [--count N] (--annotator-cmd <cmd> | --conllu <file>)
//!   qasynth aliases --topic <t>... (--annotator-cmd <cmd> | --conllu <file>)
//!   qasynth config

mod input;
mod process;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{debug, info};

use qasynth_core::conllu::parse_document;
use qasynth_core::{Annotator, CachedAnnotator, LoggingConfig, PipelineConfig, StaticAnnotator};
use qasynth_extractor::{build_topic_aliases, QaPipeline};

use crate::process::ProcessAnnotator;

#[derive(Parser)]
#[command(name = "qasynth")]
#[command(about = "Rule-based question/answer synthesis from annotated sentences")]
#[command(version)]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate QA pairs from sentences
    Generate {
        /// Sentences: one per line, or a JSON array of strings
        #[arg(short, long)]
        input: PathBuf,

        /// Topic phrase (repeatable)
        #[arg(short, long = "topic")]
        topics: Vec<String>,

        /// Number of QA pairs to return
        #[arg(short, long)]
        count: Option<usize>,

        #[command(flatten)]
        annotator: AnnotatorArgs,
    },
    /// Print the topic alias set
    Aliases {
        /// Topic phrase (repeatable)
        #[arg(short, long = "topic")]
        topics: Vec<String>,

        #[command(flatten)]
        annotator: AnnotatorArgs,
    },
    /// Print the effective configuration as TOML
    Config,
}

#[derive(Args)]
struct AnnotatorArgs {
    /// External annotator command speaking JSON lines
    #[arg(long)]
    annotator_cmd: Option<String>,

    /// Pre-annotated CoNLL-U file; unknown text falls through to --annotator-cmd
    #[arg(long)]
    conllu: Option<PathBuf>,
}

impl AnnotatorArgs {
    fn build(&self, config: &PipelineConfig) -> Result<CachedAnnotator<Box<dyn Annotator>>> {
        let process = match &self.annotator_cmd {
            Some(command) => Some(Arc::new(ProcessAnnotator::spawn(command)?)),
            None => None,
        };

        let annotator: Box<dyn Annotator> = match (&self.conllu, process) {
            (Some(path), process) => {
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read {}", path.display()))?;
                let sentences = parse_document(&content)
                    .with_context(|| format!("failed to parse {}", path.display()))?;
                info!(sentences = sentences.len(), path = %path.display(), "Loaded CoNLL-U annotations");

                let annotator = StaticAnnotator::from_sentences(sentences);
                match process {
                    Some(process) => Box::new(annotator.with_fallback(process)),
                    None => Box::new(annotator),
                }
            }
            (None, Some(process)) => Box::new(process),
            (None, None) => bail!("no annotator configured: pass --annotator-cmd or --conllu"),
        };

        Ok(CachedAnnotator::new(annotator, config.annotation.cache_capacity))
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<PipelineConfig> {
    let config = match path {
        Some(path) => PipelineConfig::from_file(path)?.with_env_override()?,
        None => PipelineConfig::from_env()?,
    };
    Ok(config)
}

fn init_logging(config: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_file(config.include_location)
        .with_line_number(config.include_location);

    if config.json_format {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;
    init_logging(&config.logging);

    match cli.command {
        Commands::Generate {
            input,
            topics,
            count,
            annotator,
        } => {
            let sentences = input::read_sentences(&input)?;
            let annotator = annotator.build(&config)?;
            let cache = annotator.stats();

            let pipeline = QaPipeline::new(annotator, config);
            let output = pipeline.run(&sentences, &topics, count)?;

            debug!(
                hits = cache.hits(),
                misses = cache.misses(),
                hit_rate = cache.hit_rate(),
                "Annotation cache"
            );
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Commands::Aliases { topics, annotator } => {
            let annotator = annotator.build(&config)?;
            let aliases = build_topic_aliases(&topics, &annotator)?;
            println!("{}", serde_json::to_string_pretty(&aliases)?);
        }
        Commands::Config => {
            print!("{}", toml::to_string_pretty(&config)?);
        }
    }

    Ok(())
}
