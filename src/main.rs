use atmospherics::{
    AtmosphericsPlugin, DEFAULT_GRID_SIZE, GasGrid, initialize_gas_grid, tick_gas_grid,
};
use bevy::log::{Level, LogPlugin};
use bevy::prelude::*;
use crate::config::{AppConfig, AtmosConfig};
use tiles::{TileKind, Tilemap, TilesPlugin};

mod config;
#[cfg(feature = "client")]
mod input;

fn parse_log_level(s: &str) -> Level {
    match s.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" | "warning" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

/// Open floor of the configured size. Empty or overflowing sizes fall back to the default grid.
fn open_floor(atmos: &AtmosConfig) -> Tilemap {
    let (width, height) = (atmos.width, atmos.height);
    match width.checked_mul(height) {
        Some(cells) if cells > 0 => Tilemap::new(width, height, TileKind::Floor),
        _ => {
            warn!(
                "Invalid grid size {width}x{height}, using {DEFAULT_GRID_SIZE}x{DEFAULT_GRID_SIZE}"
            );
            Tilemap::new(DEFAULT_GRID_SIZE, DEFAULT_GRID_SIZE, TileKind::Floor)
        }
    }
}

/// Loads the configured level, or an open floor of the configured size.
fn load_tilemap(app_config: &AppConfig) -> Tilemap {
    let atmos = &app_config.atmospherics;
    let fallback = || open_floor(atmos);

    match atmos.level.as_deref() {
        Some(path) => Tilemap::load(path).unwrap_or_else(|error| {
            warn!("Failed to load level '{path}', using an open floor: {error}");
            fallback()
        }),
        None => fallback(),
    }
}

fn setup_world(mut commands: Commands, app_config: Res<AppConfig>) {
    let atmos = &app_config.atmospherics;
    let tilemap = load_tilemap(&app_config);
    let grid = initialize_gas_grid(&tilemap, atmos.initial_amount, atmos.policy());
    commands.insert_resource(tilemap);
    commands.insert_resource(grid);
}

#[cfg(feature = "client")]
fn spawn_camera(mut commands: Commands) {
    commands.spawn(Camera2d);
}

/// Logs the grid total every `report_every` ticks and exits after `max_ticks`.
fn report_progress(
    app_config: Res<AppConfig>,
    gas_grid: Option<Res<GasGrid>>,
    mut exit: MessageWriter<AppExit>,
) {
    let Some(gas_grid) = gas_grid else {
        return;
    };
    let atmos = &app_config.atmospherics;
    let ticks = gas_grid.ticks();

    if atmos.report_every > 0 && ticks % atmos.report_every == 0 {
        info!(
            "Tick {ticks}: {:.3} total gas, {} exchanges",
            gas_grid.total_amount(),
            gas_grid.last_flows().len()
        );
    }

    if atmos.max_ticks.is_some_and(|max| ticks >= max) {
        info!("Reached {ticks} ticks, exiting");
        exit.write(AppExit::Success);
    }
}

#[cfg(feature = "client")]
fn add_frontend(app: &mut App, app_config: &AppConfig, log_level: Level) {
    app.add_plugins(
        DefaultPlugins
            .set(WindowPlugin {
                primary_window: Some(Window {
                    title: app_config.window.title.clone(),
                    ..default()
                }),
                ..default()
            })
            .set(LogPlugin {
                level: log_level,
                ..default()
            }),
    )
    .add_plugins(atmospherics::GasOverlayPlugin)
    .add_plugins(input::PaintPlugin)
    .add_systems(Startup, spawn_camera);
}

#[cfg(not(feature = "client"))]
fn add_frontend(app: &mut App, _app_config: &AppConfig, log_level: Level) {
    app.add_plugins(MinimalPlugins).add_plugins(LogPlugin {
        level: log_level,
        ..default()
    });
}

fn main() {
    let app_config = crate::config::load_config();
    let log_level = parse_log_level(&app_config.debug.log_level);

    let mut app = App::new();
    app.insert_resource(app_config.clone());

    add_frontend(&mut app, &app_config, log_level);

    app.add_plugins(TilesPlugin)
        .add_plugins(AtmosphericsPlugin {
            tick_seconds: app_config.atmospherics.tick_seconds,
        })
        .add_systems(Startup, setup_world)
        .add_systems(FixedUpdate, report_progress.after(tick_gas_grid));

    app.run();
}
