use bevy::math::DVec2;
use bevy::prelude::*;
use tiles::{TileKind, Tilemap};

use crate::flow::{self, FlowSide};
use crate::gas_cell::{GasCell, INITIAL_AMOUNT};
use crate::policy::{PairResolution, SolverPolicy, ZeroGradient};

/// Side length of the default grid.
pub const DEFAULT_GRID_SIZE: u32 = 39;

/// Moore neighborhood, x offset outer, y offset inner. The scan order is observable:
/// it decides which zero-gradient neighbor stops a scan first.
const NEIGHBOR_OFFSETS: [IVec2; 8] = [
    IVec2::new(-1, -1),
    IVec2::new(-1, 0),
    IVec2::new(-1, 1),
    IVec2::new(0, -1),
    IVec2::new(0, 1),
    IVec2::new(1, -1),
    IVec2::new(1, 0),
    IVec2::new(1, 1),
];

/// One pair exchange resolved during the last tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedFlow {
    /// The cell that computed the exchange.
    pub source: IVec2,
    pub neighbor: IVec2,
    /// Signed amount moved from `source` to `neighbor`.
    pub flow: f64,
}

/// Receives committed amount changes, for example to refresh a visual.
pub trait AmountObserver {
    fn amount_changed(&mut self, pos: IVec2, amount: f64);
}

impl<F: FnMut(IVec2, f64)> AmountObserver for F {
    fn amount_changed(&mut self, pos: IVec2, amount: f64) {
        self(pos, amount)
    }
}

/// Fixed-size grid of gas cells, sole owner of every cell.
///
/// Cells are stored row-major and addressed by coordinate; neighbors are looked up, never
/// held. Each [`GasGrid::tick`] runs a compute phase that only writes staging values and a
/// commit phase that publishes them.
#[derive(Debug, Clone, Resource, Reflect)]
#[reflect(Debug, Resource)]
pub struct GasGrid {
    width: u32,
    height: u32,
    cells: Vec<GasCell>,
    policy: SolverPolicy,
    ticks: u64,
    // Reused across ticks to avoid per-tick allocations
    #[reflect(ignore)]
    flows: Vec<ResolvedFlow>,
}

impl Default for GasGrid {
    fn default() -> Self {
        Self::new(DEFAULT_GRID_SIZE, DEFAULT_GRID_SIZE)
    }
}

impl GasGrid {
    /// Creates a grid of open cells, each holding [`INITIAL_AMOUNT`].
    pub fn new(width: u32, height: u32) -> Self {
        Self::filled(width, height, INITIAL_AMOUNT)
    }

    /// Creates a grid of open cells, each holding `amount`.
    pub fn filled(width: u32, height: u32, amount: f64) -> Self {
        let size = width as usize * height as usize;
        Self {
            width,
            height,
            cells: vec![GasCell::with_amount(amount.max(0.0)); size],
            policy: SolverPolicy::default(),
            ticks: 0,
            flows: Vec::new(),
        }
    }

    /// Builds a grid from a row-major list of amounts. Negative amounts are clamped to 0.
    pub fn from_amounts(width: u32, height: u32, amounts: &[f64]) -> Result<Self, String> {
        let expected = width
            .checked_mul(height)
            .and_then(|n| usize::try_from(n).ok())
            .ok_or_else(|| format!("GasGrid dimensions {width}×{height} overflow"))?;
        if amounts.len() != expected {
            return Err(format!(
                "amounts length mismatch: expected {expected}, got {}",
                amounts.len()
            ));
        }
        Ok(Self {
            width,
            height,
            cells: amounts
                .iter()
                .map(|&amount| GasCell::with_amount(amount.max(0.0)))
                .collect(),
            policy: SolverPolicy::default(),
            ticks: 0,
            flows: Vec::new(),
        })
    }

    /// Builds a grid matching the tilemap's size, flags included.
    pub fn from_tilemap(tilemap: &Tilemap, amount: f64) -> Self {
        let mut grid = Self::filled(tilemap.width(), tilemap.height(), amount);
        grid.sync_tiles(tilemap);
        grid
    }

    pub fn with_policy(mut self, policy: SolverPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> SolverPolicy {
        self.policy
    }

    pub fn set_policy(&mut self, policy: SolverPolicy) {
        self.policy = policy;
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of ticks run so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Converts a 2D position to a 1D index in the cell arena.
    /// Returns None if the position is out of bounds.
    fn coord_to_index(&self, pos: IVec2) -> Option<usize> {
        if pos.x >= 0 && pos.x < self.width as i32 && pos.y >= 0 && pos.y < self.height as i32 {
            Some((pos.y * self.width as i32 + pos.x) as usize)
        } else {
            None
        }
    }

    fn index_to_coord(&self, idx: usize) -> IVec2 {
        let width = self.width as usize;
        IVec2::new((idx % width) as i32, (idx / width) as i32)
    }

    pub fn cell(&self, pos: IVec2) -> Option<&GasCell> {
        self.coord_to_index(pos).map(|idx| &self.cells[idx])
    }

    /// Index of the cell at `pos + offset`, if both are on the grid.
    fn neighbor_index(&self, pos: IVec2, offset: IVec2) -> Option<usize> {
        self.coord_to_index(pos)?;
        self.coord_to_index(pos + offset)
    }

    /// The cell at `pos + offset`, if both are on the grid.
    pub fn neighbor(&self, pos: IVec2, offset: IVec2) -> Option<&GasCell> {
        self.neighbor_index(pos, offset).map(|idx| &self.cells[idx])
    }

    /// Iterates every cell with its position, row by row.
    pub fn iter(&self) -> impl Iterator<Item = (IVec2, &GasCell)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .map(move |(idx, cell)| (self.index_to_coord(idx), cell))
    }

    pub fn amount_at(&self, pos: IVec2) -> Option<f64> {
        self.cell(pos).map(GasCell::amount)
    }

    pub fn velocity_at(&self, pos: IVec2) -> Option<DVec2> {
        self.cell(pos).map(GasCell::velocity)
    }

    /// Sum of every committed amount.
    pub fn total_amount(&self) -> f64 {
        self.cells.iter().map(GasCell::amount).sum()
    }

    /// Exchanges resolved during the most recent tick, in resolution order.
    pub fn last_flows(&self) -> &[ResolvedFlow] {
        &self.flows
    }

    /// Sets the amount at `pos`. Negative amounts are clamped to 0.
    /// Returns false if the position is out of bounds.
    pub fn set_amount(&mut self, pos: IVec2, amount: f64) -> bool {
        if let Some(idx) = self.coord_to_index(pos) {
            self.cells[idx].set_amount(amount);
            true
        } else {
            false
        }
    }

    /// Adds gas at `pos`; the result is clamped to 0.
    pub fn add_amount(&mut self, pos: IVec2, amount: f64) -> bool {
        match self.amount_at(pos) {
            Some(current) => self.set_amount(pos, current + amount),
            None => false,
        }
    }

    pub fn set_velocity(&mut self, pos: IVec2, velocity: DVec2) -> bool {
        if let Some(idx) = self.coord_to_index(pos) {
            self.cells[idx].velocity = velocity;
            true
        } else {
            false
        }
    }

    /// Marks a cell as an impermeable wall. The amount drops to zero at the next commit.
    pub fn set_blocking(&mut self, pos: IVec2, blocking: bool) -> bool {
        if let Some(idx) = self.coord_to_index(pos) {
            self.cells[idx].blocking = blocking;
            true
        } else {
            false
        }
    }

    /// Marks a cell as a sink, drained to zero at every commit.
    pub fn set_sink(&mut self, pos: IVec2, sink: bool) -> bool {
        if let Some(idx) = self.coord_to_index(pos) {
            self.cells[idx].sink = sink;
            true
        } else {
            false
        }
    }

    /// Copies cell flags from the tilemap: walls block, space drains.
    /// Positions outside the tilemap are treated as walls.
    pub fn sync_tiles(&mut self, tilemap: &Tilemap) {
        for idx in 0..self.cells.len() {
            let pos = self.index_to_coord(idx);
            let kind = tilemap.get(pos).unwrap_or(TileKind::Wall);
            let cell = &mut self.cells[idx];
            cell.blocking = !kind.is_permeable();
            cell.sink = kind == TileKind::Space;
        }
    }

    /// Advances every cell by one tick.
    pub fn tick(&mut self) {
        self.tick_observed(&mut |_: IVec2, _: f64| {});
    }

    /// Advances every cell by one tick, reporting each committed amount change to `observer`.
    pub fn tick_observed<O: AmountObserver>(&mut self, observer: &mut O) {
        self.flows.clear();

        for idx in 0..self.cells.len() {
            self.calculate_next_amount(idx);
        }

        for idx in 0..self.cells.len() {
            if self.cells[idx].commit() {
                observer.amount_changed(self.index_to_coord(idx), self.cells[idx].amount);
            }
        }

        self.ticks += 1;
    }

    /// Compute phase for one cell: exchanges with every eligible neighbor, written into the
    /// staging values of both sides.
    fn calculate_next_amount(&mut self, idx: usize) {
        if self.cells[idx].blocking {
            return;
        }

        let pos = self.index_to_coord(idx);
        let source = FlowSide {
            amount: self.cells[idx].amount,
            velocity: self.cells[idx].velocity,
        };

        for offset in NEIGHBOR_OFFSETS {
            let Some(n_idx) = self.neighbor_index(pos, offset) else {
                continue;
            };
            let neighbor_pos = pos + offset;

            let neighbor_cell = &self.cells[n_idx];
            if neighbor_cell.blocking {
                continue;
            }
            let already_resolved = match self.policy.pair_resolution {
                PairResolution::VisitMarker => neighbor_cell.processed,
                PairResolution::Canonical => n_idx < idx,
            };
            if already_resolved {
                continue;
            }

            let neighbor = FlowSide {
                amount: neighbor_cell.amount,
                velocity: neighbor_cell.velocity,
            };
            if source.amount - neighbor.amount == 0.0 {
                match self.policy.zero_gradient {
                    ZeroGradient::AbortScan => return,
                    ZeroGradient::SkipNeighbor => continue,
                }
            }

            let flow = flow::pair_flow(source, neighbor, offset, self.policy.advection_bound);
            let (source_impulse, neighbor_impulse) =
                flow::impulses(flow, offset, self.policy.momentum_exchange);

            let cell = &mut self.cells[idx];
            cell.next_amount -= flow;
            cell.next_velocity += source_impulse;
            cell.processed = true;

            let neighbor_cell = &mut self.cells[n_idx];
            neighbor_cell.next_amount += flow;
            neighbor_cell.next_velocity += neighbor_impulse;

            self.flows.push(ResolvedFlow {
                source: pos,
                neighbor: neighbor_pos,
                flow,
            });
        }
    }
}
