//! JourneyDash - patient-journey analytics queue
//!
//! A CLI over the persisted analysis queue: add and track analyses,
//! simulate their progress, chat with the analytics assistant, and print
//! patient-journey rules.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Invalid arguments, unknown analysis, or runtime error

use anyhow::{anyhow, bail, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use journeydash::assistant::{AnalysisContext, Assistant, AssistantConfig};
use journeydash::cli::{Args, Command, SidebarState};
use journeydash::clock::{Clock, SystemClock};
use journeydash::config::{Config, CONFIG_FILE_NAME};
use journeydash::display;
use journeydash::knowledge::{KnowledgeBase, QueryType};
use journeydash::models::{Analysis, Timestamp};
use journeydash::state::{AnalysisStore, FileStorage, MemoryStorage, StateStorage, StoreEvent};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Config is loaded first so its verbosity applies to logging
    let mut config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    init_logging(config.log_level(args.quiet));

    info!("JourneyDash v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    debug!("Config: {:?}", config);

    if let Err(e) = run(args, config).await {
        error!("Command failed: {}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .journeydash.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Set GEMINI_API_KEY (or [assistant] api_key) to enable live chat answers.");
    Ok(())
}

/// Initialize logging at the given level.
fn init_logging(level: tracing::Level) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Load configuration from file or use defaults.
///
/// Runs before logging is set up, so problems go straight to stderr.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => Ok(config),
        Ok(None) => Ok(Config::default()),
        Err(e) => {
            eprintln!("⚠️  Failed to load {}: {:#}. Using defaults.", CONFIG_FILE_NAME, e);
            Ok(Config::default())
        }
    }
}

fn open_store(config: &Config, clock: Arc<dyn Clock>) -> Arc<AnalysisStore> {
    let storage: Arc<dyn StateStorage> = if config.storage.ephemeral {
        debug!("Using in-memory state storage");
        Arc::new(MemoryStorage::new())
    } else {
        debug!("Using state directory {}", config.storage.dir.display());
        Arc::new(FileStorage::new(config.storage.dir.clone()))
    };

    Arc::new(AnalysisStore::open_with_key(storage, &config.storage.key, clock))
}

/// Dispatch one subcommand.
async fn run(args: Args, config: Config) -> Result<()> {
    let Some(command) = args.command.clone() else {
        bail!("A subcommand is required (try --help)");
    };

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let store = open_store(&config, Arc::clone(&clock));

    match command {
        Command::List => print_list(&store, clock.now()),
        Command::Add {
            indication,
            analysis_type,
            indication_name,
            analysis_name,
        } => {
            let indication_name = indication_name.unwrap_or_else(|| indication.clone());
            let analysis_name = analysis_name.unwrap_or_else(|| analysis_type.clone());
            let id = store.add_analysis(&indication, &indication_name, &analysis_type, &analysis_name);
            println!("✅ Queued {} - {}", indication_name, analysis_name);
            println!("   id: {}", id);
        }
        Command::Status {
            id,
            status,
            progress,
        } => {
            require_analysis(&store, &id)?;
            store.update_analysis_status(&id, status.as_str(), progress);
            if let Some(analysis) = store.analysis_by_id(&id) {
                println!("{}", display::analysis_line(&analysis, clock.now(), false));
            }
        }
        Command::Select { id } => match id {
            Some(id) => {
                let analysis = require_analysis(&store, &id)?;
                store.set_current_session(Some(&id));
                println!("▶ Current analysis: {}", analysis.title);
            }
            None => {
                store.set_current_session(None);
                println!("Current analysis cleared.");
            }
        },
        Command::Show { id } => {
            let analysis = match id {
                Some(id) => require_analysis(&store, &id)?,
                None => store
                    .current_analysis()
                    .ok_or_else(|| anyhow!("No current analysis. Pass an id or run `select` first."))?,
            };
            print!("{}", display::analysis_details(&analysis, clock.now()));
        }
        Command::Remove { id } => {
            require_analysis(&store, &id)?;
            store.remove_analysis(&id);
            println!("🗑  Removed {}", id);
        }
        Command::Clear => {
            let count = store.analyses().len();
            store.clear_analyses();
            println!("🗑  Removed {} analyses.", count);
        }
        Command::Sidebar { state } => {
            if let Some(state) = state {
                store.set_sidebar_collapsed(state == SidebarState::Collapse);
            }
            let label = if store.is_sidebar_collapsed() {
                "collapsed"
            } else {
                "expanded"
            };
            println!("Sidebar: {}", label);
        }
        Command::Simulate { id, duration_ms } => {
            let id = match id {
                Some(id) => id,
                None => store
                    .current_session()
                    .ok_or_else(|| anyhow!("No current analysis. Pass an id or run `select` first."))?,
            };
            let analysis = require_analysis(&store, &id)?;
            run_simulation(&store, &analysis.id, &analysis.title, Duration::from_millis(duration_ms), args.quiet)
                .await;
        }
        Command::Chat { message } => {
            let message = message.join(" ");
            let ctx = store
                .current_analysis()
                .map(|analysis| AnalysisContext::from_analysis(&analysis))
                .unwrap_or_default();

            let assistant_config = AssistantConfig::from(&config.assistant);
            let assistant = Assistant::new(&assistant_config, KnowledgeBase::builtin())?;
            if !assistant.is_online() {
                info!("No Gemini API key set, answering offline");
            }

            let response = assistant.generate_response(&ctx, &message).await;
            println!("{}", response);
        }
        Command::Knowledge {
            indication,
            query_type,
            query,
        } => print_knowledge(&indication, query_type.as_deref(), query.as_deref())?,
    }

    Ok(())
}

fn require_analysis(store: &AnalysisStore, id: &str) -> Result<Analysis> {
    store
        .analysis_by_id(id)
        .ok_or_else(|| anyhow!("No analysis with id {}", id))
}

fn print_list(store: &AnalysisStore, now: Timestamp) {
    let analyses = store.analyses();
    if analyses.is_empty() {
        println!("No analyses queued.");
        return;
    }

    let current = store.current_session();
    println!("📋 {} analyses:\n", analyses.len());
    for analysis in &analyses {
        let is_current = current.as_deref() == Some(analysis.id.as_str());
        println!("{}", display::analysis_line(analysis, now, is_current));
    }
}

/// Drive a simulated run, rendering store updates as a progress bar.
async fn run_simulation(store: &Arc<AnalysisStore>, id: &str, title: &str, duration: Duration, quiet: bool) {
    let bar = if quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(100)
    };
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos:>3}% {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );
    bar.set_message(title.to_string());

    let watched = id.to_string();
    let listener_bar = bar.clone();
    let subscription = store.subscribe(move |event| {
        if let StoreEvent::AnalysisUpdated(analysis) = event {
            if analysis.id == watched {
                listener_bar.set_position(u64::from(analysis.progress.unwrap_or(0)));
            }
        }
        Ok(())
    });

    let handle = store.simulate_analysis_progress(id, duration);

    tokio::select! {
        _ = handle.finished() => {
            bar.finish_with_message(format!("{} completed", title));
        }
        _ = tokio::signal::ctrl_c() => {
            bar.abandon_with_message(format!("{} interrupted", title));
        }
    }

    subscription.unsubscribe();
}

fn print_knowledge(indication: &str, query_type: Option<&str>, query: Option<&str>) -> Result<()> {
    let knowledge = KnowledgeBase::builtin();

    if knowledge.lookup(indication).is_none() {
        let known: Vec<&str> = knowledge.indications().iter().map(|k| k.display_name).collect();
        bail!(
            "No patient-journey rules for {} (known: {})",
            indication,
            known.join(", ")
        );
    }

    if let Some(query) = query {
        print!("{}", knowledge.llm_context(indication, query));
        return Ok(());
    }

    let query_type = QueryType::from(query_type.unwrap_or("all"));
    match knowledge.relevant_knowledge(indication, query_type) {
        Some(section) => println!("{}", section),
        None => println!("No {:?} rules recorded for {}.", query_type, indication),
    }

    Ok(())
}
