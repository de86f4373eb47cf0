use bevy::prelude::*;
use serde::Deserialize;

/// What a cell does when a neighbor holds exactly the same amount of gas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Reflect, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZeroGradient {
    /// Stop scanning the remaining neighbors of this cell for the current tick.
    #[default]
    AbortScan,
    /// Ignore that neighbor and keep scanning.
    SkipNeighbor,
}

/// Which side of an unordered neighbor pair computes the exchange.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Reflect, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairResolution {
    /// The first cell visited in the compute phase resolves the pair and marks itself
    /// processed; the other side skips processed neighbors.
    #[default]
    VisitMarker,
    /// The cell with the lower grid index always resolves the pair.
    Canonical,
}

/// How the velocity impulse of a flow is shared between the two cells.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Reflect, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MomentumExchange {
    /// Both cells receive the same impulse, pointing along the flow.
    #[default]
    Shared,
    /// The neighbor gets the impulse along the flow and the scanning cell the opposite, so the
    /// pair's momentum sums to zero.
    Opposing,
}

/// Whether the advection terms may push a flow past the stability window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Reflect, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdvectionBound {
    /// Advection is added to the clamped diffusive flow and applied as is. A strong incoming
    /// draft can then drain a neighbor below zero.
    #[default]
    Additive,
    /// The total flow goes through the stability clamp again, so no exchange moves more than
    /// one eighth of either side and amounts stay non-negative.
    Reclamped,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Reflect, Deserialize)]
pub struct SolverPolicy {
    #[serde(default)]
    pub zero_gradient: ZeroGradient,
    #[serde(default)]
    pub pair_resolution: PairResolution,
    #[serde(default)]
    pub momentum_exchange: MomentumExchange,
    #[serde(default)]
    pub advection_bound: AdvectionBound,
}

impl SolverPolicy {
    /// Per-neighbor skip, canonical pairs, opposing impulses and reclamped advection.
    pub fn conservative() -> Self {
        Self {
            zero_gradient: ZeroGradient::SkipNeighbor,
            pair_resolution: PairResolution::Canonical,
            momentum_exchange: MomentumExchange::Opposing,
            advection_bound: AdvectionBound::Reclamped,
        }
    }

    /// Legacy scan and momentum rules with the total flow kept inside the stability window.
    pub fn bounded() -> Self {
        Self {
            advection_bound: AdvectionBound::Reclamped,
            ..Self::default()
        }
    }
}
