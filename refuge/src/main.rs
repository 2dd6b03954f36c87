//! # Refuge
//!
//! Runs the spawn selection host against a generated demo world and simulates
//! a steady stream of respawn requests.

mod config;
mod world;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use refuge_core::selection::ExhaustionReason;
use refuge_core::{SpawnHost, SpawnSelector};
use tokio::time::interval;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use crate::config::{CONFIG_PATH, RefugeConfig};
use crate::world::DemoWorld;

#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

/// Simulated requests between reports of newly recorded allow-map keys.
const KEY_REPORT_INTERVAL: u64 = 40;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_names(true)
        .finish();
    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Could not install tracing subscriber: {err}");
    }
    // Library crates log through the `log` facade.
    if let Err(err) = tracing_log::LogTracer::init() {
        eprintln!("Could not bridge log records: {err}");
    }
}

#[tokio::main]
async fn main() {
    init_tracing();

    let config = match RefugeConfig::load_or_create(Path::new(CONFIG_PATH)) {
        Ok(config) => config,
        Err(err) => {
            log::error!("{err}");
            return;
        }
    };

    let seed = config.seed();
    log::info!("Generating {:?} world with seed {seed}", config.world.generator);
    let mut rng = StdRng::seed_from_u64(seed);
    let world = DemoWorld::generate(&config.world, &mut rng);

    let selector_rng = StdRng::seed_from_u64(seed.rotate_left(17));
    let mut selector = match SpawnSelector::with_rng(world, config.spawn.clone(), selector_rng) {
        Ok(selector) => selector,
        Err(err) => {
            log::error!("Invalid spawn settings: {err}");
            return;
        }
    };
    selector.set_exhaustion_hook(|exhaustion| match exhaustion.reason {
        ExhaustionReason::CacheEmpty => {
            log::warn!("Respawn denied: no cached candidates");
        }
        ExhaustionReason::AttemptsExhausted => log::warn!(
            "Respawn denied: {} candidates failed, {} left",
            exhaustion.attempts,
            exhaustion.remaining
        ),
    });

    let cancel_token = CancellationToken::new();
    let tick_interval = Duration::from_secs_f64(1.0 / config.tick_rate.max(1.0));
    let host = Arc::new(SpawnHost::new(selector, tick_interval, cancel_token.clone()));
    let host_task = tokio::spawn(host.clone().run());

    if config.request_interval_ms > 0 {
        tokio::spawn(simulate_requests(
            host.clone(),
            Duration::from_millis(config.request_interval_ms),
            rng,
        ));
    }

    match tokio::signal::ctrl_c().await {
        Ok(()) => log::info!("Shutting down"),
        Err(err) => log::error!("Could not listen for shutdown signal: {err}"),
    }
    cancel_token.cancel();
    if let Err(err) = host_task.await {
        log::error!("Spawn host failed: {err}");
    }

    let stats = host.with_selector(|selector| *selector.stats());
    log::info!("Final spawn stats: {stats:?}");

    let mut snapshot = config.clone();
    snapshot.spawn = host.with_selector(|selector| selector.config_snapshot());
    if snapshot != config {
        match snapshot.save(Path::new(CONFIG_PATH)) {
            Ok(()) => log::info!("Saved recorded allow-map keys to {CONFIG_PATH}"),
            Err(err) => log::error!("{err}"),
        }
    }
}

async fn simulate_requests(host: Arc<SpawnHost<DemoWorld>>, period: Duration, mut rng: StdRng) {
    let mut ticker = interval(period);
    let mut requests: u64 = 0;

    loop {
        tokio::select! {
            () = host.cancel_token.cancelled() => break,
            _ = ticker.tick() => {}
        }

        host.with_selector(|selector| selector.world_mut().wander(&mut rng));
        if let Some(position) = host.request_position() {
            log::debug!("Respawning at {position}");
        }

        requests += 1;
        if requests % KEY_REPORT_INTERVAL == 0 {
            for recorded in host.with_selector(SpawnSelector::take_recorded_keys) {
                log::info!(
                    "New {} category `{}` is allowed until configured otherwise",
                    recorded.axis,
                    recorded.key
                );
            }
        }
    }
}
