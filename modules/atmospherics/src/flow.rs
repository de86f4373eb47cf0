//! Pairwise exchange between a cell and one of its neighbors.
//!
//! A flow is signed from the scanning cell (the source) to the neighbor: positive values move
//! gas into the neighbor, negative values pull gas out of it.

use std::f64::consts::FRAC_PI_4;

use bevy::math::{DVec2, IVec2};

use crate::policy::{AdvectionBound, MomentumExchange};
use crate::vector::Vector2Ext;

/// Fraction of the amount difference that moves in one tick.
pub const FLOW_RATE: f64 = 0.1;
/// A single exchange may not move more than `amount / STABILITY_DIVISOR` out of either cell.
pub const STABILITY_DIVISOR: f64 = 8.0;
/// Share of a cell's speed that turns into extra flow along its velocity.
pub const VELOCITY_CARRY: f64 = 0.95;
/// Impulse magnitude per unit of flow.
pub const IMPULSE_DAMPING: f64 = 0.2;
/// Half-width of the cone, around a cell's velocity, in which it pushes gas.
pub const ADVECTION_WINDOW: f64 = FRAC_PI_4;

/// Committed state of one side of an exchange.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlowSide {
    pub amount: f64,
    pub velocity: DVec2,
}

/// Limits a flow to `[-(neighbor / 8), source / 8]`.
pub fn stability_clamp(flow: f64, source_amount: f64, neighbor_amount: f64) -> f64 {
    let upper = source_amount / STABILITY_DIVISOR;
    let lower = -(neighbor_amount / STABILITY_DIVISOR);
    if flow > upper {
        upper
    } else if flow < lower {
        lower
    } else {
        flow
    }
}

/// Extra flow a velocity pushes along `direction`, capped at `cap`.
///
/// Zero unless the velocity points strictly within [`ADVECTION_WINDOW`] of `direction`.
pub fn advection(velocity: DVec2, direction: DVec2, cap: f64) -> f64 {
    if velocity.magnitude() <= 0.0 {
        return 0.0;
    }
    let angle = direction.unsigned_angle(velocity);
    if angle >= ADVECTION_WINDOW {
        return 0.0;
    }
    let proportion = (ADVECTION_WINDOW - angle) / ADVECTION_WINDOW;
    (proportion + velocity.magnitude() * VELOCITY_CARRY).min(cap)
}

/// Computes the flow from `source` to `neighbor`, where `offset` points from the source to
/// the neighbor.
///
/// The diffusive part is clamped first. The source's own velocity then adds flow toward the
/// neighbor and the neighbor's velocity pulls flow back; both advection terms are capped at
/// one eighth of the source amount. With [`AdvectionBound::Reclamped`] the total goes through
/// the stability clamp again so no exchange drains more than one eighth of either side.
pub fn pair_flow(
    source: FlowSide,
    neighbor: FlowSide,
    offset: IVec2,
    bound: AdvectionBound,
) -> f64 {
    let difference = source.amount - neighbor.amount;
    let mut flow = stability_clamp(FLOW_RATE * difference, source.amount, neighbor.amount);

    let direction = offset.as_dvec2();
    let cap = source.amount / STABILITY_DIVISOR;
    flow += advection(source.velocity, direction, cap);
    flow -= advection(neighbor.velocity, -direction, cap);

    match bound {
        AdvectionBound::Additive => flow,
        AdvectionBound::Reclamped => stability_clamp(flow, source.amount, neighbor.amount),
    }
}

/// Impulses `(source, neighbor)` generated by a flow along `offset`.
///
/// The impulse points along the gas movement: toward the neighbor for positive flows and back
/// toward the source for negative ones.
pub fn impulses(flow: f64, offset: IVec2, exchange: MomentumExchange) -> (DVec2, DVec2) {
    if flow == 0.0 {
        return (DVec2::ZERO, DVec2::ZERO);
    }
    let direction = if flow > 0.0 {
        offset.as_dvec2()
    } else {
        -offset.as_dvec2()
    };
    let impulse = direction.with_magnitude(flow.abs() * IMPULSE_DAMPING);
    match exchange {
        MomentumExchange::Shared => (impulse, impulse),
        MomentumExchange::Opposing => (-impulse, impulse),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at_rest(amount: f64) -> FlowSide {
        FlowSide {
            amount,
            velocity: DVec2::ZERO,
        }
    }

    #[test]
    fn test_stability_clamp_bounds() {
        assert_eq!(stability_clamp(10.0, 100.0, 0.0), 10.0);
        assert_eq!(stability_clamp(20.0, 100.0, 0.0), 12.5);
        assert_eq!(stability_clamp(-20.0, 0.0, 80.0), -10.0);
        assert_eq!(stability_clamp(-5.0, 0.0, 80.0), -5.0);
        assert_eq!(stability_clamp(-1.0, 100.0, 0.0), 0.0);
    }

    #[test]
    fn test_diffusion_without_velocity() {
        let flow = pair_flow(at_rest(100.0), at_rest(0.0), IVec2::new(1, 0), AdvectionBound::Additive);
        assert_eq!(flow, 10.0);

        let flow = pair_flow(at_rest(0.0), at_rest(100.0), IVec2::new(0, 1), AdvectionBound::Additive);
        assert_eq!(flow, -10.0);
    }

    #[test]
    fn test_advection_requires_alignment() {
        let east = DVec2::new(1.0, 0.0);
        // Aligned: full proportion plus carried speed.
        assert!((advection(DVec2::new(0.5, 0.0), east, 100.0) - 1.475).abs() < 1e-12);
        // Outside the window: nothing.
        assert_eq!(advection(DVec2::new(1.0, 2.0), east, 100.0), 0.0);
        // Opposite: nothing.
        assert_eq!(advection(DVec2::new(-1.0, 0.0), east, 100.0), 0.0);
        // At rest: nothing.
        assert_eq!(advection(DVec2::ZERO, east, 100.0), 0.0);
        // Capped.
        assert_eq!(advection(DVec2::new(3.0, 0.0), east, 0.5), 0.5);
    }

    #[test]
    fn test_advection_proportion_falls_off_with_angle() {
        let east = DVec2::new(1.0, 0.0);
        let tiny = 1e-9;
        // Half the window away: proportion 0.5.
        let half = DVec2::from_angle(ADVECTION_WINDOW / 2.0) * tiny;
        let extra = advection(half, east, 100.0);
        assert!((extra - 0.5).abs() < 1e-6, "got {extra}");
    }

    #[test]
    fn test_source_velocity_pushes_more_gas() {
        let source = FlowSide {
            amount: 100.0,
            velocity: DVec2::new(1.0, 0.0),
        };
        let flow = pair_flow(source, at_rest(90.0), IVec2::new(1, 0), AdvectionBound::Additive);
        // 1.0 diffusive + (1.0 + 0.95) advective.
        assert!((flow - 2.95).abs() < 1e-12);
    }

    #[test]
    fn test_neighbor_velocity_pulls_gas_back() {
        let neighbor = FlowSide {
            amount: 90.0,
            velocity: DVec2::new(-1.0, 0.0),
        };
        let flow = pair_flow(at_rest(100.0), neighbor, IVec2::new(1, 0), AdvectionBound::Additive);
        assert!((flow - (1.0 - 1.95)).abs() < 1e-12);
    }

    #[test]
    fn test_additive_advection_is_applied_as_is() {
        let source = FlowSide {
            amount: 16.0,
            velocity: DVec2::new(50.0, 0.0),
        };
        // 1.6 diffusive, plus advection capped at 16 / 8.
        let flow = pair_flow(source, at_rest(0.0), IVec2::new(1, 0), AdvectionBound::Additive);
        assert!((flow - 3.6).abs() < 1e-12, "got {flow}");

        // The neighbor's draft pulls back more than an eighth of its own amount.
        let neighbor = FlowSide {
            amount: 2.0,
            velocity: DVec2::new(-50.0, 0.0),
        };
        let flow = pair_flow(at_rest(8.0), neighbor, IVec2::new(1, 0), AdvectionBound::Additive);
        assert!((flow - (-0.4)).abs() < 1e-12, "got {flow}");
    }

    #[test]
    fn test_reclamped_flow_stays_inside_stability_window() {
        let source = FlowSide {
            amount: 16.0,
            velocity: DVec2::new(50.0, 0.0),
        };
        let flow = pair_flow(source, at_rest(0.0), IVec2::new(1, 0), AdvectionBound::Reclamped);
        assert_eq!(flow, 2.0);

        let neighbor = FlowSide {
            amount: 2.0,
            velocity: DVec2::new(-50.0, 0.0),
        };
        let flow = pair_flow(at_rest(8.0), neighbor, IVec2::new(1, 0), AdvectionBound::Reclamped);
        assert_eq!(flow, -0.25);
    }

    #[test]
    fn test_shared_impulse() {
        let (source, neighbor) = impulses(10.0, IVec2::new(0, 1), MomentumExchange::Shared);
        assert_eq!(source, neighbor);
        assert!((source - DVec2::new(0.0, 2.0)).length() < 1e-12);

        let (source, neighbor) = impulses(-5.0, IVec2::new(1, 1), MomentumExchange::Shared);
        assert_eq!(source, neighbor);
        assert!((source.length() - 1.0).abs() < 1e-12);
        assert!(source.x < 0.0 && source.y < 0.0);
    }

    #[test]
    fn test_opposing_impulse() {
        let (source, neighbor) = impulses(10.0, IVec2::new(1, 0), MomentumExchange::Opposing);
        assert!((neighbor - DVec2::new(2.0, 0.0)).length() < 1e-12);
        assert_eq!(source, -neighbor);
    }

    #[test]
    fn test_zero_flow_has_no_impulse() {
        assert_eq!(
            impulses(0.0, IVec2::new(1, 0), MomentumExchange::Shared),
            (DVec2::ZERO, DVec2::ZERO)
        );
    }
}
