use crate::gas_cell::GasCell;

/// Diameter of a full cell disk, also the spacing between cell centres.
pub const CELL_DIAMETER: f64 = 15.0;
/// Largest disk radius.
pub const MAX_RADIUS: f64 = CELL_DIAMETER / 2.0;

const MIN_COLOR_AMOUNT: f32 = 1.0;
const MAX_COLOR_AMOUNT: f32 = 10000.0;
const SINK_GRAY: f32 = 211.0 / 255.0;

/// Visual state of one cell: a disk with an RGB color in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GasDisplay {
    pub red: f32,
    pub green: f32,
    pub blue: f32,
    pub radius: f64,
}

impl GasDisplay {
    /// Maps a committed amount to its disk.
    ///
    /// Color is computed on the amount clamped to `[1, 10000]`: red grows linearly up to 1000,
    /// blue falls with `10 / sqrt(amount)`. The radius uses the raw amount.
    pub fn from_amount(amount: f64) -> Self {
        let gas = (amount as f32).clamp(MIN_COLOR_AMOUNT, MAX_COLOR_AMOUNT);
        let blue = (10.0 / gas.sqrt()).clamp(0.0, 1.0);
        let red = (gas / 1000.0).clamp(0.0, 1.0);
        Self {
            red,
            green: 0.0,
            blue,
            radius: (CELL_DIAMETER * amount / 200.0).clamp(0.0, MAX_RADIUS),
        }
    }

    /// Full-size black disk.
    pub fn wall() -> Self {
        Self {
            red: 0.0,
            green: 0.0,
            blue: 0.0,
            radius: MAX_RADIUS,
        }
    }

    /// Full-size light gray disk.
    pub fn sink() -> Self {
        Self {
            red: SINK_GRAY,
            green: SINK_GRAY,
            blue: SINK_GRAY,
            radius: MAX_RADIUS,
        }
    }

    /// Appearance of a cell: flags win over the gas mapping.
    pub fn for_cell(cell: &GasCell) -> Self {
        if cell.is_blocking() {
            Self::wall()
        } else if cell.is_sink() {
            Self::sink()
        } else {
            Self::from_amount(cell.amount())
        }
    }

    /// Color channels as bytes, each rounded from `channel * 255`.
    pub fn rgb8(&self) -> [u8; 3] {
        let byte = |channel: f32| (channel * 255.0).round() as u8;
        [byte(self.red), byte(self.green), byte(self.blue)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_high_amount_mapping() {
        let display = GasDisplay::from_amount(1000.0);
        assert_eq!(display.red, 1.0);
        assert_eq!(display.green, 0.0);
        assert!((display.blue - 0.316).abs() < 1e-3, "blue = {}", display.blue);
        assert_eq!(display.radius, 7.5);
    }

    #[test]
    fn test_default_amount_mapping() {
        let display = GasDisplay::from_amount(10.0);
        assert!((display.red - 0.01).abs() < 1e-6);
        assert_eq!(display.blue, 1.0);
        assert_eq!(display.radius, 0.75);
        assert_eq!(display.rgb8(), [3, 0, 255]);
    }

    #[test]
    fn test_color_amount_is_clamped() {
        let empty = GasDisplay::from_amount(0.0);
        assert_eq!(empty.blue, 1.0);
        assert!((empty.red - 0.001).abs() < 1e-6);
        assert_eq!(empty.radius, 0.0);

        let huge = GasDisplay::from_amount(1e9);
        assert_eq!(huge.red, 1.0);
        assert!((huge.blue - 0.1).abs() < 1e-6);
        assert_eq!(huge.radius, MAX_RADIUS);
    }

    #[test]
    fn test_flagged_cells() {
        let mut cell = GasCell::default();
        assert_eq!(GasDisplay::for_cell(&cell), GasDisplay::from_amount(10.0));

        cell.sink = true;
        assert_eq!(GasDisplay::for_cell(&cell).rgb8(), [211, 211, 211]);

        cell.blocking = true;
        let wall = GasDisplay::for_cell(&cell);
        assert_eq!(wall.rgb8(), [0, 0, 0]);
        assert_eq!(wall.radius, MAX_RADIUS);
    }
}
