// ==============================================================================
// main.rs — HEADLESS DRIVING DEMO
// ------------------------------------------------------------------------------
// Spawns one vehicle on flat ground and drives a scripted lap:
//   accelerate -> boost -> drift left -> brake -> reverse -> coast
// A JSON world snapshot is logged once per simulated second.
//
// Env:
//   VEHICLE_CONFIG  path to a JSON VehicleConfig (defaults if unset)
//   SIM_TICK_HZ     fixed step rate (default 60)
//   SIM_SECONDS     scripted run length (default 10)
//   RUST_LOG / LOG_FORMAT=json
// ==============================================================================

use std::env;

use arcade_drive::{DriverInput, PhysicsWorld, VehicleConfig};
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{error, info, warn};

const VEHICLE_ID: &str = "player";

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!(%key, %raw, "unparsable value, using default");
            default
        }),
        Err(_) => default,
    }
}

/// Scripted driver: what to hold at time `t`.
fn scripted_input(t: f32) -> DriverInput {
    match t {
        t if t < 3.0 => DriverInput::new(1.0, 0.0),
        t if t < 5.0 => DriverInput::new(1.0, -0.6).with_drift(true),
        t if t < 6.0 => DriverInput::new(1.0, 0.0),
        t if t < 7.5 => DriverInput::new(-1.0, 0.0),
        t if t < 8.5 => DriverInput::new(-1.0, 0.3),
        _ => DriverInput::default(),
    }
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = match env::var("VEHICLE_CONFIG") {
        Ok(path) => match VehicleConfig::load(&path) {
            Ok(cfg) => cfg,
            Err(err) => {
                error!(%path, %err, "failed to load vehicle config");
                return;
            }
        },
        Err(_) => VehicleConfig::default(),
    };

    let hz = env_or::<u32>("SIM_TICK_HZ", 60).max(1);
    let seconds: f32 = env_or("SIM_SECONDS", 10.0);
    let dt = 1.0 / hz as f32;

    let mut world = PhysicsWorld::new();
    // A shallow ramp a little way down the track
    world.add_static_cuboid([4.0, 0.5, 6.0], [0.0, -0.3, -120.0], [0.12, 0.0, 0.0]);

    if let Err(err) = world.spawn_vehicle(VEHICLE_ID, config, [0.0, 0.8, 0.0]) {
        error!(%err, "failed to spawn vehicle");
        return;
    }

    info!(hz, seconds, "starting arcade-drive demo");

    let mut ticker = interval(Duration::from_secs_f32(dt));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let total_ticks = (seconds * hz as f32).ceil() as u64;
    let mut boosted = false;

    while world.tick() < total_ticks {
        ticker.tick().await;
        let t = world.tick() as f32 * dt;

        if let Err(err) = world.set_input(VEHICLE_ID, scripted_input(t)) {
            error!(%err, "input rejected");
            break;
        }
        if !boosted && t >= 1.5 {
            boosted = true;
            match world.activate_boost(VEHICLE_ID, 2.0) {
                Ok(outcome) => info!(?outcome, "boost requested"),
                Err(err) => warn!(%err, "boost request failed"),
            }
        }

        world.step(dt);

        if world.tick() % hz as u64 == 0 {
            match world.snapshot().to_json() {
                Ok(json) => info!(tick = world.tick(), snapshot = %json, "world"),
                Err(err) => warn!(%err, "snapshot serialization failed"),
            }
        }
    }

    match world.vehicle_snapshot(VEHICLE_ID) {
        Ok(snap) => info!(
            speed = snap.speed,
            forward_speed = snap.forward_speed,
            asleep = snap.asleep,
            "demo finished"
        ),
        Err(err) => error!(%err, "vehicle vanished"),
    }
}
