//! weblate-assist - LLM-assisted translation workflow for Weblate
//!
//! Entry point: loads configuration, wires the Weblate, OpenRouter and
//! embedding clients together and runs the requested command.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{info, Level};
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use weblate_assist::batch::{BatchEngine, LoadOutcome};
use weblate_assist::cli::{Args, Commands};
use weblate_assist::config::{Config, Selection};
use weblate_assist::embedding::EmbeddingProviderFactory;
use weblate_assist::index::{ContextIndex, IndexProgress, IndexSettings};
use weblate_assist::llm::{ChatClient, OpenRouterInsightSynthesizer, OpenRouterSuggester};
use weblate_assist::session::{self, Reply};
use weblate_assist::store::VectorStoreFactory;
use weblate_assist::weblate::TranslationStoreFactory;

const DEFAULT_CONFIG_FILE: &str = "weblate-assist.toml";

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Setup logging to both console and file
    setup_logging(args.verbose)?;

    if let Commands::InitConfig { output } = &args.command {
        Config::default().save_to_file(output)?;
        println!("Wrote default configuration to {}", output.display());
        return Ok(());
    }

    let config = load_config(&args)?;
    let selection = config.selection();

    match args.command {
        Commands::Session => run_session(&config, &selection).await?,
        Commands::Catalogue => {
            let mut index = open_index(&config).await?;
            let stats = index.refresh_catalogue(&selection).await?;
            println!("\nCatalogue {}/{} ({})", selection.project, selection.component, selection.language);
            println!("{:<16} {:>8}", "Strings", stats.total);
            println!("{:<16} {:>8}", "Translated", stats.translated);
            println!("{:<16} {:>8}", "To translate", stats.to_translate);
            println!("{:<16} {:>7.2}%", "Progress", stats.percent_translated);
        }
        Commands::Index { force, dry_run } => {
            let mut index = open_index(&config).await?;
            index.refresh_catalogue(&selection).await?;

            let estimate = index.estimate();
            println!(
                "{} strings, {} characters, ~{:.4}M tokens, estimated cost ${}",
                index.catalogue().len(),
                estimate.characters,
                estimate.million_tokens,
                estimate.format_cost()
            );
            if dry_run {
                return Ok(());
            }

            let pb = ProgressBar::new(100);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}% {msg}")?
                    .progress_chars("#>-"),
            );
            let mut on_progress = |progress: IndexProgress| {
                pb.set_position(progress.percent().round() as u64);
                pb.set_message(format!("{}/{}", progress.completed, progress.total));
            };

            match index.build_index(force, &mut on_progress).await {
                Ok(count) => {
                    pb.finish_with_message("done");
                    println!("Indexed {} strings into {}", count, config.storage.vector_store_path.display());
                }
                Err(e) => {
                    pb.abandon_with_message("failed");
                    return Err(e.into());
                }
            }
        }
        Commands::Search { query, top_k } => {
            let index = open_index(&config).await?;
            let hits = index.search(&query, top_k).await?;
            if hits.is_empty() {
                println!("No results. Build the index with `weblate-assist index` first.");
            }
            for hit in hits {
                println!("{:.4}  {}", hit.similarity, hit.record.key);
                println!("        {}", hit.record.source);
                if !hit.record.translation.is_empty() {
                    println!("        {}", hit.record.translation);
                }
            }
        }
        Commands::InitConfig { .. } => {}
    }

    Ok(())
}

/// `--config`, then `weblate-assist.toml` in the working directory, then defaults.
fn load_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(config_path) => Config::from_file(config_path)?,
        None => {
            if Path::new(DEFAULT_CONFIG_FILE).exists() {
                info!("Found {} in current directory, loading...", DEFAULT_CONFIG_FILE);
                Config::from_file(DEFAULT_CONFIG_FILE)?
            } else {
                Config::default()
            }
        }
    };

    config.apply_env_overrides();
    if let Some(project) = &args.project {
        config.weblate.project = project.clone();
    }
    if let Some(component) = &args.component {
        config.weblate.component = component.clone();
    }
    if let Some(language) = &args.language {
        config.weblate.language = language.clone();
    }
    Ok(config)
}

async fn open_index(config: &Config) -> Result<ContextIndex> {
    let store = TranslationStoreFactory::create_store(config.weblate.clone())?;
    let embedder = EmbeddingProviderFactory::create_provider(&config.embedding)?;
    let vectors = VectorStoreFactory::create_store(
        config.storage.vector_store_path.clone(),
        &config.embedding.model,
    );
    let settings = IndexSettings::from_config(&config.embedding, &config.weblate.source_language);
    Ok(ContextIndex::open(store, embedder, vectors, settings).await?)
}

async fn run_session(config: &Config, selection: &Selection) -> Result<()> {
    let store = TranslationStoreFactory::create_store(config.weblate.clone())?;
    let chat = Arc::new(ChatClient::new(&config.llm)?);
    let suggester = Arc::new(OpenRouterSuggester::new(Arc::clone(&chat), &config.llm, &config.weblate));
    let synthesizer = Arc::new(OpenRouterInsightSynthesizer::new(chat));

    let insights_path = &config.storage.insights_path;
    let insights = session::load_insights(insights_path).await?;

    let mut engine = BatchEngine::new(store, suggester, synthesizer, config.llm.model.clone(), config.batch.page_size)?
        .with_insights(insights);

    match engine.load_units(selection).await {
        Ok(LoadOutcome::Loaded(count)) => {
            println!("Loaded {} untranslated units", count);
            if config.batch.auto_suggest {
                let report = engine.suggest_page().await;
                info!("Auto-suggested {} fields ({} failed)", report.suggested, report.failed);
            }
        }
        Ok(LoadOutcome::Skipped) => {
            println!("Set weblate.project, weblate.component and weblate.language to load units.");
        }
        Err(e) => println!("Failed to load units: {}", e),
    }
    println!("{}\n", session::render_page(&engine));
    println!("Type 'help' for commands.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let command = match session::parse(&line) {
            Ok(command) => command,
            Err(e) => {
                println!("{}", e);
                continue;
            }
        };

        let page_before = engine.page_index();
        let insights_before = engine.insight_log().len();
        let reply = session::dispatch(&mut engine, selection, command).await;

        if engine.insight_log().len() != insights_before {
            session::save_insights(insights_path, engine.insight_log()).await;
        }
        if config.batch.auto_suggest && engine.page_index() != page_before {
            engine.suggest_page().await;
        }

        match reply {
            Reply::Print(text) => println!("{}", text),
            Reply::Quit => break,
        }
    }

    Ok(())
}

fn setup_logging(verbose: bool) -> Result<()> {
    // Create log directory
    let log_dir: PathBuf = std::env::current_dir()?.join(".weblate-assist").join("log");
    std::fs::create_dir_all(&log_dir)?;

    // Daily rotated log file
    let file_appender = rolling::daily(&log_dir, "weblate-assist.log");
    let (non_blocking_file, guard) = non_blocking(file_appender);
    // Keep the guard alive for the duration of the program
    std::mem::forget(guard);

    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_file(true)
        .with_line_number(true);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false); // No ANSI colors in file

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!(
        "Logging initialized - console: {}, file: {}",
        log_level,
        log_dir.join("weblate-assist.log").display()
    );

    Ok(())
}
