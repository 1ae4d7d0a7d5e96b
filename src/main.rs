//! Binary entry point: loads `Config`, wires `AppState`, and serves the
//! `/ws` protocol surface (spec §6). Mirrors the teacher's
//! `load_env` → `init_tracing` → build collaborators → `axum::serve`
//! shape in `main.rs`.

use anyhow::{Context, Result};
use cartpilot_backend::api::{build_router, AppState};
use cartpilot_backend::orchestrator::state_machine::StateMachine;
use cartpilot_backend::orchestrator::recovery;
use cartpilot_backend::persistence::RunStateStore;
use cartpilot_backend::preferences::PreferenceStore;
use cartpilot_backend::selectors::SelectorRegistry;
use cartpilot_backend::testutil::FakePage;
use cartpilot_backend::Config;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "cartpilot", about = "Human-supervised shopping copilot backend")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the WebSocket/HTTP server (default when no subcommand given).
    Serve,
    /// Validate selector definitions under a directory without serving.
    Selectors {
        #[command(subcommand)]
        action: SelectorsAction,
    },
}

#[derive(Subcommand)]
enum SelectorsAction {
    Validate {
        #[arg(default_value = "selectors")]
        dir: PathBuf,
    },
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cartpilot_backend=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve().await,
        Commands::Selectors {
            action: SelectorsAction::Validate { dir },
        } => {
            SelectorRegistry::load_from_dir(&dir)
                .with_context(|| format!("failed to load selectors from {dir:?}"))?;
            info!(dir = %dir.display(), "selector registry validated");
            Ok(())
        }
    }
}

async fn serve() -> Result<()> {
    let config = Config::from_env();

    if config.element_visibility_timeout.is_zero()
        || config.navigation_timeout.is_zero()
        || config.modal_timeout.is_zero()
    {
        anyhow::bail!("configured timeouts must be non-zero");
    }

    let registry = match SelectorRegistry::load_from_dir(std::path::Path::new(&config.selectors_dir)) {
        Ok(reg) => reg,
        Err(e) => {
            warn!(%e, dir = %config.selectors_dir, "no selector registry loaded, starting empty");
            SelectorRegistry::new()
        }
    };

    let preferences = PreferenceStore::open(&config.preferences_db_path)
        .context("failed to open preference store")?;
    let run_state_store =
        RunStateStore::open(&config.run_state_db_path).context("failed to open run-state store")?;

    let state_machine = match run_state_store.load_latest()? {
        Some(mut persisted) => {
            if recovery::mark_if_needed(&mut persisted) {
                warn!(run_id = %persisted.run_id, "recovered run requires environment handshake before resuming");
            }
            StateMachine::from_state(persisted)
        }
        None => StateMachine::new(Uuid::new_v4().to_string()),
    };

    // No CDP/WebDriver crate is grounded anywhere in the teacher or the
    // retrieval pack (browser automation is explicitly out of scope,
    // spec §1) — `FakePage` stands in so the binary is runnable; a real
    // deployment swaps this for an actual tab driver.
    warn!("running with FakePage: no real browser tab is attached");
    let page: Arc<dyn cartpilot_backend::Page> = Arc::new(FakePage::new());

    let state = AppState::new(page, registry, config.clone(), preferences, run_state_store, state_machine);

    let app = build_router(state);
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr).await?;
    info!(%addr, "cartpilot-backend listening");

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
