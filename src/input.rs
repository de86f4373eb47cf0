use atmospherics::debug_overlay::{update_gas_disks, world_to_cell};
use atmospherics::{GasCellChanged, GasGrid};
use bevy::prelude::*;
use bevy::window::PrimaryWindow;

use crate::config::AppConfig;

/// Edit applied to the cell under the cursor.
#[derive(Debug, Clone, Copy, PartialEq)]
enum PaintAction {
    AddGas(f64),
    ToggleWall,
    ToggleSink,
}

fn paint_action(buttons: &ButtonInput<MouseButton>, burst_amount: f64) -> Option<PaintAction> {
    if buttons.just_pressed(MouseButton::Left) {
        Some(PaintAction::AddGas(burst_amount))
    } else if buttons.just_pressed(MouseButton::Right) {
        Some(PaintAction::ToggleWall)
    } else if buttons.just_pressed(MouseButton::Middle) {
        Some(PaintAction::ToggleSink)
    } else {
        None
    }
}

/// Applies the edit. Returns false if `pos` is off the grid.
fn apply_paint(grid: &mut GasGrid, pos: IVec2, action: PaintAction) -> bool {
    let Some(cell) = grid.cell(pos) else {
        return false;
    };
    let (blocking, sink) = (cell.is_blocking(), cell.is_sink());

    match action {
        PaintAction::AddGas(amount) => grid.add_amount(pos, amount),
        PaintAction::ToggleWall => grid.set_blocking(pos, !blocking),
        PaintAction::ToggleSink => grid.set_sink(pos, !sink),
    }
}

/// System that edits the cell under the cursor on mouse clicks.
fn paint_gas(
    buttons: Res<ButtonInput<MouseButton>>,
    windows: Query<&Window, With<PrimaryWindow>>,
    cameras: Query<(&Camera, &GlobalTransform)>,
    app_config: Res<AppConfig>,
    gas_grid: Option<ResMut<GasGrid>>,
    mut changes: MessageWriter<GasCellChanged>,
) {
    let Some(action) = paint_action(&buttons, app_config.atmospherics.burst_amount) else {
        return;
    };
    let Some(mut gas_grid) = gas_grid else {
        return;
    };
    let Ok(window) = windows.single() else {
        return;
    };
    let Some(cursor) = window.cursor_position() else {
        return;
    };
    let Ok((camera, camera_transform)) = cameras.single() else {
        return;
    };
    let Ok(world) = camera.viewport_to_world_2d(camera_transform, cursor) else {
        return;
    };

    let pos = world_to_cell(&gas_grid, world);
    if !apply_paint(&mut gas_grid, pos, action) {
        return;
    }

    let amount = gas_grid.amount_at(pos).unwrap_or_default();
    debug!("Painted {action:?} at {pos}, amount now {amount:.1}");
    changes.write(GasCellChanged {
        position: pos,
        amount,
    });
}

pub struct PaintPlugin;

impl Plugin for PaintPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, paint_gas.before(update_gas_disks));
    }
}
