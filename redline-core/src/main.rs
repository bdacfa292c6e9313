//! Redline demo
//!
//! Runs one race attempt against a file-backed profile in the working
//! directory and logs the result. `RUST_LOG` controls verbosity.

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use redline::{
    format_time, Catalog, FileStorage, GameStore, RaceConfig, RaceRequest, RaceSession,
    SessionConfig, VERSION,
    core::time::format_play_time,
    game::events::RaceEventData,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Redline Core v{}", VERSION);

    let dir = std::env::current_dir().context("Failed to resolve working directory")?;
    let store = GameStore::open(FileStorage::new(dir)).into_shared();
    let catalog = Catalog::builtin();

    let (request, vehicle_name) = {
        let guard = store.read().await;
        let state = guard.state();
        info!(
            "Player {} - level {}, {} cash, {} races ({}% won), played {}",
            state.player.name,
            state.player.level,
            state.player.cash,
            state.stats.total_races,
            state.win_rate(),
            format_play_time(state.stats.total_play_time)
        );

        let vehicle = state
            .player
            .current_car
            .as_deref()
            .and_then(|id| catalog.find_vehicle(id))
            .or_else(|| catalog.unlocked_vehicles(&state.player).into_iter().next())
            .context("Player owns no vehicle")?;

        let mode = catalog
            .available_race_modes(state.player.level)
            .into_iter()
            .find(|m| redline::catalog::meets_requirements(m, state.player.level, vehicle).is_ok())
            .context("No race mode open to the current vehicle")?;
        let track = mode.tracks.first().context("Race mode has no tracks")?;

        (RaceRequest::new(mode.id, track.id, vehicle.id), vehicle.name)
    };

    info!(
        "=== {} / {} in the {} ===",
        request.race_mode_id, request.track_id, vehicle_name
    );

    // Compress the track so the demo takes seconds, not minutes
    let race_config = RaceConfig { time_scale: 40.0, ..Default::default() };
    let mut session = RaceSession::spawn(
        catalog,
        request,
        store.clone(),
        race_config,
        SessionConfig::default(),
    )
    .await?;

    let mut events = session.subscribe();
    let log_events = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event.data {
                RaceEventData::CountdownTick { remaining } => info!("{}...", remaining),
                RaceEventData::Started => info!("GO!"),
                RaceEventData::LapCompleted { lap, duration_ms, best_ms } => info!(
                    "Lap {} - {} (best {})",
                    lap,
                    format_time(duration_ms),
                    format_time(best_ms)
                ),
                RaceEventData::Finished(_) => break,
                _ => {}
            }
        }
    });

    session.begin().await?;
    let outcome = session.outcome().await?;
    let _ = log_events.await;
    session.shutdown().await;

    info!("=== Results ===");
    for standing in &outcome.standings {
        info!("#{}: {} - {}", standing.position, standing.name, standing.finish_time);
    }
    info!(
        "Final time {}, best lap {}, top speed {} km/h",
        outcome.final_time,
        outcome.best_lap_time.map(|t| t.to_string()).unwrap_or_else(|| "-".to_string()),
        outcome.top_speed
    );
    info!("Earned {} cash and {} XP", outcome.cash_earned, outcome.xp_earned);

    let guard = store.read().await;
    let state = guard.state();
    info!(
        "Profile: level {} ({:.0}% to next), {} cash, {} races ({}% won)",
        state.player.level,
        state.xp_progress(),
        state.player.cash,
        state.stats.total_races,
        state.win_rate()
    );

    Ok(())
}
