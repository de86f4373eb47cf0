use bevy::math::DVec2;
use bevy::prelude::*;

/// Amount every cell holds when a grid is created.
pub const INITIAL_AMOUNT: f64 = 10.0;

/// Per-tile gas state.
///
/// `amount` and `velocity` are the committed values every cell reads during the compute
/// phase. The compute phase only ever writes the `next_*` staging values; [`GasCell::commit`]
/// publishes them.
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
#[reflect(Debug, PartialEq)]
pub struct GasCell {
    pub(crate) amount: f64,
    pub(crate) next_amount: f64,
    pub(crate) velocity: DVec2,
    pub(crate) next_velocity: DVec2,
    pub(crate) blocking: bool,
    pub(crate) sink: bool,
    pub(crate) processed: bool,
}

impl Default for GasCell {
    fn default() -> Self {
        Self::with_amount(INITIAL_AMOUNT)
    }
}

impl GasCell {
    /// Creates an open cell holding `amount`, at rest.
    pub fn with_amount(amount: f64) -> Self {
        Self {
            amount,
            next_amount: amount,
            velocity: DVec2::ZERO,
            next_velocity: DVec2::ZERO,
            blocking: false,
            sink: false,
            processed: false,
        }
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }

    pub fn next_amount(&self) -> f64 {
        self.next_amount
    }

    pub fn velocity(&self) -> DVec2 {
        self.velocity
    }

    pub fn next_velocity(&self) -> DVec2 {
        self.next_velocity
    }

    pub fn is_blocking(&self) -> bool {
        self.blocking
    }

    pub fn is_sink(&self) -> bool {
        self.sink
    }

    pub fn is_processed(&self) -> bool {
        self.processed
    }

    /// Overwrites both the committed and staged amount so the next commit keeps it.
    pub(crate) fn set_amount(&mut self, amount: f64) {
        let amount = amount.max(0.0);
        self.amount = amount;
        self.next_amount = amount;
    }

    /// Publishes the staged values.
    ///
    /// Blocking and sink cells are forced to zero. The staged velocity becomes the committed
    /// one and is reset. Returns `true` when the committed amount changed.
    pub fn commit(&mut self) -> bool {
        if self.blocking || self.sink {
            self.next_amount = 0.0;
        }

        self.velocity = self.next_velocity;
        self.next_velocity = DVec2::ZERO;

        let changed = self.amount != self.next_amount;
        if changed {
            self.amount = self.next_amount;
        }

        self.processed = false;
        changed
    }
}
