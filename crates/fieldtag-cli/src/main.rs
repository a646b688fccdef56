//! Fieldtag CLI - template tagging from the command line.
//!
//! Three subcommands mirror the engine's surfaces: `tag` runs the full
//! pipeline over one document, `extract` dumps runs or merged tokens as
//! JSON for inspection, and `discover-constants` runs the offline
//! frequency analysis over a corpus to produce a constant exclusion
//! list.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fieldtag_core::Vocabulary;
use fieldtag_engine::{
    discover_constants, extract_runs, read_document_xml, DiscoveryConfig, TaggingEngine,
};
use log::info;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "fieldtag", version, about = "Turn Word documents into reusable templates")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Vocabulary JSON file (labels, constants, currencies). Uses the
    /// built-in domain vocabulary when omitted.
    #[arg(long, global = true)]
    vocab: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Tag one document: replace detected variables with {{placeholders}}.
    Tag {
        /// Input .docx file, or a raw document.xml file.
        input: PathBuf,
        /// Where to write the tagged markup (stdout when omitted).
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Where to write the field records as JSON.
        #[arg(long)]
        fields: Option<PathBuf>,
    },
    /// Dump extracted runs (or merged tokens) as JSON.
    Extract {
        /// Input .docx file, or a raw document.xml file.
        input: PathBuf,
        /// Dump merged tokens instead of raw runs.
        #[arg(long)]
        tokens: bool,
    },
    /// Offline constant discovery over a document corpus.
    DiscoverConstants {
        /// Input documents (.docx or .xml), at least two.
        #[arg(required = true, num_args = 2..)]
        inputs: Vec<PathBuf>,
        /// Fraction of documents that makes a value constant.
        #[arg(long, default_value_t = 0.30)]
        min_fraction: f64,
        /// Absolute document count that makes a value constant.
        #[arg(long, default_value_t = 3)]
        min_docs: usize,
    },
}

/// Load body markup from a `.docx` container or a raw XML file.
fn load_markup(path: &Path) -> Result<String> {
    let markup = if path.extension().is_some_and(|e| e.eq_ignore_ascii_case("docx")) {
        read_document_xml(path)?
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?
    };
    Ok(markup)
}

fn load_vocabulary(path: Option<&Path>) -> Result<Vocabulary> {
    match path {
        Some(p) => {
            Vocabulary::from_json_file(p).with_context(|| format!("loading vocabulary {}", p.display()))
        }
        None => Ok(Vocabulary::builtin()),
    }
}

fn write_or_print(path: Option<&Path>, content: &str) -> Result<()> {
    match path {
        Some(p) => std::fs::write(p, content).with_context(|| format!("writing {}", p.display()))?,
        None => println!("{content}"),
    }
    Ok(())
}

fn cmd_tag(
    engine: &TaggingEngine,
    input: &Path,
    output: Option<&Path>,
    fields_out: Option<&Path>,
) -> Result<()> {
    let markup = load_markup(input)?;
    let outcome = engine.tag_document(&markup)?;

    info!(
        "{}: {} fields tagged, {} skipped",
        input.display(),
        outcome.fields.len(),
        outcome.skipped.len()
    );
    for skip in &outcome.skipped {
        eprintln!("skipped {}: {} ({})", skip.tag, skip.search_text, skip.reason);
    }

    write_or_print(output, &outcome.markup)?;
    if let Some(path) = fields_out {
        let fields: Vec<_> = outcome.fields.iter().map(|(f, _)| f).collect();
        let json = serde_json::to_string_pretty(&fields)?;
        std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    }
    Ok(())
}

fn cmd_extract(engine: &TaggingEngine, input: &Path, tokens: bool) -> Result<()> {
    let markup = load_markup(input)?;
    let json = if tokens {
        let merged = engine.tokenize(&markup)?;
        let view: Vec<serde_json::Value> = merged
            .iter()
            .map(|t| {
                serde_json::json!({
                    "text": t.merged_text,
                    "runs": t.member_runs.len(),
                    "paragraph": t.paragraph_index(),
                    "is_label": t.is_label,
                    "preceding_label": t.preceding_label,
                })
            })
            .collect();
        serde_json::to_string_pretty(&view)?
    } else {
        serde_json::to_string_pretty(&extract_runs(&markup)?)?
    };
    println!("{json}");
    Ok(())
}

fn cmd_discover(
    engine: &TaggingEngine,
    inputs: &[PathBuf],
    min_fraction: f64,
    min_docs: usize,
) -> Result<()> {
    let mut corpus = Vec::with_capacity(inputs.len());
    for path in inputs {
        let markup = load_markup(path)?;
        corpus.push(
            engine
                .tokenize(&markup)
                .with_context(|| format!("tokenizing {}", path.display()))?,
        );
    }
    let constants = discover_constants(
        &corpus,
        DiscoveryConfig {
            min_doc_fraction: min_fraction,
            min_docs,
        },
    );
    println!("{}", serde_json::to_string_pretty(&constants)?);
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .target(env_logger::Target::Stderr)
        .init();
    let cli = Cli::parse();
    let vocab = load_vocabulary(cli.vocab.as_deref())?;
    let engine = TaggingEngine::new(vocab);

    match &cli.command {
        Command::Tag { input, output, fields } => {
            cmd_tag(&engine, input, output.as_deref(), fields.as_deref())
        }
        Command::Extract { input, tokens } => cmd_extract(&engine, input, *tokens),
        Command::DiscoverConstants { inputs, min_fraction, min_docs } => {
            cmd_discover(&engine, inputs, *min_fraction, *min_docs)
        }
    }
}
