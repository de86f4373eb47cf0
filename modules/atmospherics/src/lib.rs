use bevy::prelude::*;
use tiles::Tilemap;

pub mod debug_overlay;
pub mod display;
pub mod flow;
mod gas_cell;
mod gas_grid;
pub mod policy;
mod vector;

pub use debug_overlay::{GasOverlay, GasOverlayPlugin};
pub use display::GasDisplay;
pub use gas_cell::{GasCell, INITIAL_AMOUNT};
pub use gas_grid::{AmountObserver, DEFAULT_GRID_SIZE, GasGrid, ResolvedFlow};
pub use policy::{AdvectionBound, MomentumExchange, PairResolution, SolverPolicy, ZeroGradient};
pub use vector::{Vector2, Vector2Ext};

/// Default pacing of the simulation, in seconds per tick.
pub const DEFAULT_TICK_SECONDS: f64 = 0.1;

/// Written for every cell whose committed amount changed during a tick, and by anything
/// that edits the grid from outside the tick (painting, level loading).
#[derive(Message, Debug, Clone, Copy, PartialEq)]
pub struct GasCellChanged {
    pub position: IVec2,
    pub amount: f64,
}

/// Creates the gas grid for a tilemap with the given starting amount and solver policy.
pub fn initialize_gas_grid(tilemap: &Tilemap, amount: f64, policy: SolverPolicy) -> GasGrid {
    let grid = GasGrid::from_tilemap(tilemap, amount).with_policy(policy);
    info!(
        "Gas grid {}x{} ready, {:.1} total, policy {:?}",
        grid.width(),
        grid.height(),
        grid.total_amount(),
        policy
    );
    grid
}

/// Advances the gas grid by one tick per fixed step.
pub fn tick_gas_grid(
    gas_grid: Option<ResMut<GasGrid>>,
    mut changes: MessageWriter<GasCellChanged>,
) {
    let Some(mut gas_grid) = gas_grid else {
        return;
    };

    gas_grid.tick_observed(&mut |position: IVec2, amount: f64| {
        changes.write(GasCellChanged { position, amount });
    });
    debug!(
        "Gas tick {}: {} exchanges, {:.3} total",
        gas_grid.ticks(),
        gas_grid.last_flows().len(),
        gas_grid.total_amount()
    );
}

/// Runs the gas simulation in `FixedUpdate`, one tick per fixed timestep.
pub struct AtmosphericsPlugin {
    pub tick_seconds: f64,
}

impl Default for AtmosphericsPlugin {
    fn default() -> Self {
        Self {
            tick_seconds: DEFAULT_TICK_SECONDS,
        }
    }
}

impl Plugin for AtmosphericsPlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<GasGrid>();
        app.add_message::<GasCellChanged>();
        app.insert_resource(Time::<Fixed>::from_seconds(self.tick_seconds));
        app.add_systems(FixedUpdate, tick_gas_grid);
    }
}
