//! flowmedic - diagnose workflow-orchestration failures from the terminal.
//!
//! ## Commands
//!
//! - `analyze`: Run the full pipeline on an error message or event file
//! - `search`: Look up knowledge base entries matching a query
//! - `categories`: List corpus categories with entry counts
//! - `check-corpus`: Validate a corpus file compiles and embeds cleanly

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::Level;

use flowmedic_core::{
    render, ErrorEvent, HttpReasoning, Pipeline, PipelineConfig, ReasoningService,
    UnconfiguredReasoning,
};
use flowmedic_kb::{builtin, Corpus, HashedTfIdfEmbedder, RegexKnowledgeBase, SemanticIndex};

#[derive(Parser)]
#[command(name = "flowmedic")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Diagnosis engine for workflow-orchestration failures", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// Reasoning service endpoint; omit to run in knowledge-base-only mode
    #[arg(long, global = true, env = "FLOWMEDIC_ENDPOINT")]
    endpoint: Option<String>,

    /// Model name sent to the reasoning service
    #[arg(long, global = true, env = "FLOWMEDIC_MODEL", default_value = "gemini-1.5-flash")]
    model: String,

    /// API key for the reasoning service
    #[arg(long, global = true, env = "FLOWMEDIC_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Pipeline configuration file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Regex rule corpus file (JSON); defaults to the built-in rules
    #[arg(long, global = true)]
    rules: Option<PathBuf>,

    /// Semantic corpus file (JSON); defaults to the built-in corpus
    #[arg(long, global = true)]
    semantic: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze an error and print a diagnostic report
    Analyze {
        /// Error message text; omit when using --file
        message: Option<String>,

        /// JSON file holding a full error event
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Workflow name
        #[arg(short, long)]
        workflow: Option<String>,

        /// Failing activity or task name
        #[arg(short, long)]
        activity: Option<String>,

        /// Platform error code
        #[arg(long)]
        error_code: Option<String>,

        /// Run identifier
        #[arg(long)]
        run_id: Option<String>,

        /// Write the full report as JSON to this path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the report as JSON instead of text
        #[arg(long)]
        as_json: bool,
    },

    /// Search the knowledge base without running synthesis
    Search {
        /// Query text
        query: String,
    },

    /// List knowledge base categories with entry counts
    Categories,

    /// Validate that a corpus file parses, compiles, and embeds
    CheckCorpus {
        /// Corpus file (JSON)
        path: PathBuf,

        /// Treat entries as regex rules and compile their patterns
        #[arg(long)]
        as_rules: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    flowmedic_core::init_tracing(cli.json, level);

    let config = match &cli.config {
        Some(path) => PipelineConfig::load_toml(path)?,
        None => PipelineConfig::default(),
    };

    let service: Arc<dyn ReasoningService> = match &cli.endpoint {
        Some(endpoint) => {
            let mut http = HttpReasoning::new(endpoint.clone(), cli.model.clone());
            if let Some(key) = &cli.api_key {
                http = http.with_api_key(key.clone());
            }
            Arc::new(http)
        }
        None => Arc::new(UnconfiguredReasoning),
    };

    let rules = load_corpus_or(&cli.rules, builtin::rule_corpus)?;
    let semantic = load_corpus_or(&cli.semantic, builtin::semantic_corpus)?;
    let pipeline = Pipeline::with_corpora(service, config, &rules, &semantic)
        .context("failed to build the analysis pipeline")?;

    match cli.command {
        Commands::Analyze {
            message,
            file,
            workflow,
            activity,
            error_code,
            run_id,
            output,
            as_json,
        } => {
            let event = build_event(message, file, workflow, activity, error_code, run_id)?;
            cmd_analyze(&pipeline, &event, output, as_json).await
        }
        Commands::Search { query } => cmd_search(&pipeline, &query),
        Commands::Categories => cmd_categories(&rules, &semantic),
        Commands::CheckCorpus { path, as_rules } => cmd_check_corpus(&path, as_rules),
    }
}

fn load_corpus_or(path: &Option<PathBuf>, fallback: fn() -> Corpus) -> Result<Corpus> {
    match path {
        Some(p) => {
            Corpus::load_json(p).with_context(|| format!("load corpus {}", p.display()))
        }
        None => Ok(fallback()),
    }
}

fn build_event(
    message: Option<String>,
    file: Option<PathBuf>,
    workflow: Option<String>,
    activity: Option<String>,
    error_code: Option<String>,
    run_id: Option<String>,
) -> Result<ErrorEvent> {
    let mut event = match (message, file) {
        (_, Some(path)) => {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("read event file {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("parse event file {}", path.display()))?
        }
        (Some(text), None) => ErrorEvent::new(text),
        (None, None) => anyhow::bail!("provide an error message or --file"),
    };

    if let Some(workflow) = workflow {
        event = event.with_workflow(workflow);
    }
    if let Some(activity) = activity {
        event = event.with_activity(activity);
    }
    if let Some(code) = error_code {
        event = event.with_error_code(code);
    }
    if let Some(run_id) = run_id {
        event = event.with_run_id(run_id);
    }
    Ok(event)
}

async fn cmd_analyze(
    pipeline: &Pipeline,
    event: &ErrorEvent,
    output: Option<PathBuf>,
    as_json: bool,
) -> Result<()> {
    let report = pipeline.analyze(event).await;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render::render_text(&report));
    }

    if let Some(path) = output {
        render::write_report_json(&path, &report)?;
        eprintln!("report written to {}", path.display());
    }

    // Degraded reports are still useful, but the exit code tells scripts
    // the diagnosis did not pass verification.
    if !report.is_verified() {
        std::process::exit(2);
    }
    Ok(())
}

fn cmd_search(pipeline: &Pipeline, query: &str) -> Result<()> {
    let hits = pipeline.search_knowledge(query);
    if hits.is_empty() {
        println!("no knowledge base entries match");
        return Ok(());
    }
    for hit in &hits {
        println!(
            "{:<28} {:>5.2}  [{}] {} ({})",
            hit.entry_id(),
            hit.score,
            if hit.is_regex() { "regex" } else { "semantic" },
            hit.entry.title,
            hit.entry.category,
        );
    }
    Ok(())
}

fn cmd_categories(rules: &Corpus, semantic: &Corpus) -> Result<()> {
    let mut merged = rules.categories();
    for (category, count) in semantic.categories() {
        *merged.entry(category).or_insert(0) += count;
    }
    for (category, count) in &merged {
        println!("{category:<20} {count}");
    }
    println!("total entries: {}", rules.len() + semantic.len());
    Ok(())
}

fn cmd_check_corpus(path: &PathBuf, as_rules: bool) -> Result<()> {
    let corpus =
        Corpus::load_json(path).with_context(|| format!("load corpus {}", path.display()))?;
    if as_rules {
        let kb = RegexKnowledgeBase::from_corpus(&corpus)
            .with_context(|| format!("compile rule patterns in {}", path.display()))?;
        println!(
            "{}",
            json!({"entries": corpus.len(), "compiled_rules": kb.len(), "ok": true})
        );
    } else {
        let index = SemanticIndex::build(&corpus, Arc::new(HashedTfIdfEmbedder::default()))
            .with_context(|| format!("embed corpus {}", path.display()))?;
        println!(
            "{}",
            json!({"entries": corpus.len(), "indexed": index.len(), "ok": true})
        );
    }
    Ok(())
}
