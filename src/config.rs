use atmospherics::{
    AdvectionBound, DEFAULT_GRID_SIZE, DEFAULT_TICK_SECONDS, INITIAL_AMOUNT, MomentumExchange,
    PairResolution, SolverPolicy, ZeroGradient,
};
use bevy::log::warn;
use bevy::prelude::Resource;
use serde::Deserialize;

use ::config::builder::DefaultState;
use ::config::{Config, ConfigBuilder, ConfigError, Environment, File, FileFormat};

const CONFIG_BASENAME: &str = "config";

#[derive(Debug, Clone, Deserialize, Resource)]
pub struct AppConfig {
    pub window: WindowConfig,
    pub debug: DebugConfig,
    pub atmospherics: AtmosConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig {
                title: "Gas Propagation".to_string(),
            },
            debug: DebugConfig {
                log_level: "info".to_string(),
            },
            atmospherics: AtmosConfig {
                width: DEFAULT_GRID_SIZE,
                height: DEFAULT_GRID_SIZE,
                initial_amount: INITIAL_AMOUNT,
                tick_seconds: DEFAULT_TICK_SECONDS,
                burst_amount: 1000.0,
                level: None,
                max_ticks: None,
                report_every: 50,
                zero_gradient: ZeroGradient::default(),
                pair_resolution: PairResolution::default(),
                momentum_exchange: MomentumExchange::default(),
                advection_bound: AdvectionBound::default(),
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WindowConfig {
    pub title: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DebugConfig {
    pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AtmosConfig {
    /// Grid size when no level file is given.
    pub width: u32,
    pub height: u32,
    pub initial_amount: f64,
    pub tick_seconds: f64,
    /// Gas added by one left click.
    pub burst_amount: f64,
    /// Path to a RON level file.
    pub level: Option<String>,
    /// Headless runs stop after this many ticks.
    pub max_ticks: Option<u64>,
    /// Headless runs log the total amount every this many ticks.
    pub report_every: u64,
    pub zero_gradient: ZeroGradient,
    pub pair_resolution: PairResolution,
    pub momentum_exchange: MomentumExchange,
    pub advection_bound: AdvectionBound,
}

impl AtmosConfig {
    pub fn policy(&self) -> SolverPolicy {
        SolverPolicy {
            zero_gradient: self.zero_gradient,
            pair_resolution: self.pair_resolution,
            momentum_exchange: self.momentum_exchange,
            advection_bound: self.advection_bound,
        }
    }
}

pub fn load_config() -> AppConfig {
    match load_config_inner() {
        Ok(config) => config,
        Err(error) => {
            warn!("Failed to load config, using defaults: {error}");
            AppConfig::default()
        }
    }
}

fn with_defaults(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let defaults = AppConfig::default();
    let atmos = defaults.atmospherics;

    builder
        .set_default("window.title", defaults.window.title)?
        .set_default("debug.log_level", defaults.debug.log_level)?
        .set_default("atmospherics.width", atmos.width)?
        .set_default("atmospherics.height", atmos.height)?
        .set_default("atmospherics.initial_amount", atmos.initial_amount)?
        .set_default("atmospherics.tick_seconds", atmos.tick_seconds)?
        .set_default("atmospherics.burst_amount", atmos.burst_amount)?
        .set_default("atmospherics.report_every", atmos.report_every)?
        .set_default("atmospherics.zero_gradient", "abort_scan")?
        .set_default("atmospherics.pair_resolution", "visit_marker")?
        .set_default("atmospherics.momentum_exchange", "shared")?
        .set_default("atmospherics.advection_bound", "additive")
}

fn load_config_inner() -> Result<AppConfig, ConfigError> {
    let builder = with_defaults(Config::builder())?
        .add_source(File::new(CONFIG_BASENAME, FileFormat::Toml).required(false))
        .add_source(File::new(CONFIG_BASENAME, FileFormat::Ron).required(false))
        .add_source(Environment::with_prefix("GASPROPAGATION").separator("__"));

    builder.build()?.try_deserialize()
}
