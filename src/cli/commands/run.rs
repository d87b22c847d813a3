//! `run` command: plays a game on the terminal.

use std::sync::Arc;

use tokio::io::BufReader;
use tokio_util::sync::CancellationToken;

use crate::cli::args::RunArgs;
use crate::clock::{Clock, SystemClock};
use crate::config::{ConfigLoader, GameConfig};
use crate::error::HideSeekError;
use crate::frontend::console::{format_secs, run_console};
use crate::frontend::{ConsoleFrontend, Frontend};
use crate::game::GameState;
use crate::observability::events::EventEmitter;
use crate::server::GameServer;

/// Start a game.
///
/// The game runs until the player types `quit`, stdin closes or the
/// process is signalled. Final standings are printed on exit.
///
/// # Errors
///
/// Returns a usage error when no players are given, or a config/I/O error
/// if the configuration, events file or metrics endpoint cannot be set up.
pub async fn run(args: &RunArgs, cancel: CancellationToken) -> Result<(), HideSeekError> {
    if let Some(port) = args.metrics_port {
        crate::observability::init_metrics(Some(port))?;
        tracing::info!(port, "Prometheus metrics endpoint started");
    }

    let loader = ConfigLoader::with_defaults();
    let mut config = match &args.config {
        Some(path) => {
            tracing::info!(config = %path.display(), "loading configuration");
            loader.read(path)?
        }
        None => GameConfig::default(),
    };
    apply_args(&mut config, args);
    if config.players.is_empty() {
        return Err(HideSeekError::Usage(
            "no players: pass --player NAME or set players in --config".to_string(),
        ));
    }

    let origin = args
        .config
        .as_ref()
        .map_or_else(|| "<command line>".to_string(), |p| p.display().to_string());
    let loaded = loader.finalize(config, &origin)?;
    for warning in &loaded.warnings {
        tracing::warn!(
            location = warning.location.as_deref().unwrap_or("<unknown>"),
            "{}",
            warning.message
        );
    }

    let events = Arc::new(match &args.events_file {
        Some(path) => EventEmitter::from_file(path)?,
        None => EventEmitter::noop(),
    });

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let (frontend, selections) = ConsoleFrontend::stdout(Arc::clone(&clock));
    let frontend = Arc::new(frontend);
    let game = GameState::new(
        loaded.config,
        Arc::clone(&frontend) as Arc<dyn Frontend>,
        clock,
    )?
    .with_events(Arc::clone(&events));
    let catalog = game.catalog();

    frontend.say(&format!(
        "Players: {}. The first round starts in {}.",
        game.config().players.join(", "),
        format_secs(game.config().start_delay)
    ));

    let (server, handle) = GameServer::new(game, events, cancel.clone());
    let server_task = tokio::spawn(server.run());
    let console_task = tokio::spawn(run_console(
        BufReader::new(tokio::io::stdin()),
        Arc::clone(&frontend),
        selections,
        handle,
        catalog,
        cancel.clone(),
    ));

    let standings = server_task.await.map_err(std::io::Error::other)?;
    cancel.cancel();
    console_task.abort();

    if standings.is_empty() {
        frontend.say("No rounds were finished.");
    } else {
        frontend.say("Final standings:");
        for (i, (player, secs)) in standings.iter().enumerate() {
            frontend.say(&format!("{}. {player}: {}", i + 1, format_secs(*secs)));
        }
    }
    Ok(())
}

/// Layers command-line flags over the file configuration.
fn apply_args(config: &mut GameConfig, args: &RunArgs) {
    if !args.players.is_empty() {
        config.players.clone_from(&args.players);
    }
    if let Some(secs) = args.start_in {
        config.start_delay = secs;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
}
