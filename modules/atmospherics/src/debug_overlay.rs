use std::collections::HashSet;

use bevy::prelude::*;

use crate::display::{CELL_DIAMETER, GasDisplay};
use crate::{GasCellChanged, GasGrid};

/// Resource that controls the gas overlay.
/// When true, one disk per cell is drawn. When false, the disks are removed.
#[derive(Resource)]
pub struct GasOverlay(pub bool);

impl Default for GasOverlay {
    fn default() -> Self {
        Self(true)
    }
}

/// Marker component for overlay disk entities, one per grid cell.
#[derive(Component)]
pub struct GasDisk {
    pub position: IVec2,
    /// Material handle stored for cleanup when the disk is despawned.
    material: Handle<ColorMaterial>,
}

/// Shared unit-radius disk mesh; each disk is scaled to its radius.
#[derive(Resource)]
struct DiskMesh(Handle<Mesh>);

impl FromWorld for DiskMesh {
    fn from_world(world: &mut World) -> Self {
        let mut meshes = world.resource_mut::<Assets<Mesh>>();
        Self(meshes.add(Circle::new(1.0)))
    }
}

/// World-space centre of a cell. Row 0 is drawn at the top and the grid is centred on the origin.
pub fn cell_to_world(grid: &GasGrid, pos: IVec2) -> Vec2 {
    let spacing = CELL_DIAMETER as f32;
    let half_width = (grid.width() as f32 - 1.0) * spacing / 2.0;
    let half_height = (grid.height() as f32 - 1.0) * spacing / 2.0;
    Vec2::new(
        pos.x as f32 * spacing - half_width,
        half_height - pos.y as f32 * spacing,
    )
}

/// Inverse of [`cell_to_world`]; returns the nearest cell, which may be off the grid.
pub fn world_to_cell(grid: &GasGrid, world: Vec2) -> IVec2 {
    let spacing = CELL_DIAMETER as f32;
    let half_width = (grid.width() as f32 - 1.0) * spacing / 2.0;
    let half_height = (grid.height() as f32 - 1.0) * spacing / 2.0;
    IVec2::new(
        ((world.x + half_width) / spacing).round() as i32,
        ((half_height - world.y) / spacing).round() as i32,
    )
}

fn disk_color(display: &GasDisplay) -> Color {
    Color::srgb(display.red, display.green, display.blue)
}

fn disk_scale(display: &GasDisplay) -> Vec3 {
    Vec3::new(display.radius as f32, display.radius as f32, 1.0)
}

/// System that toggles the overlay on F3 keypress.
pub fn toggle_overlay(keyboard: Res<ButtonInput<KeyCode>>, mut overlay: ResMut<GasOverlay>) {
    if keyboard.just_pressed(KeyCode::F3) {
        overlay.0 = !overlay.0;
        info!("Gas overlay: {}", if overlay.0 { "ON" } else { "OFF" });
    }
}

/// System that spawns one disk per cell when the overlay is enabled and no disks exist.
pub fn spawn_gas_disks(
    mut commands: Commands,
    overlay: Res<GasOverlay>,
    gas_grid: Option<Res<GasGrid>>,
    existing_disks: Query<(), With<GasDisk>>,
    disk_mesh: Res<DiskMesh>,
    mut materials: ResMut<Assets<ColorMaterial>>,
) {
    if !overlay.0 || !existing_disks.is_empty() {
        return;
    }
    let Some(gas_grid) = gas_grid else {
        return;
    };

    let mut spawned_count = 0;
    for (pos, cell) in gas_grid.iter() {
        let display = GasDisplay::for_cell(cell);
        let material = materials.add(ColorMaterial::from(disk_color(&display)));
        let translation = cell_to_world(&gas_grid, pos).extend(0.0);

        commands.spawn((
            Mesh2d(disk_mesh.0.clone()),
            MeshMaterial2d(material.clone()),
            Transform::from_translation(translation).with_scale(disk_scale(&display)),
            GasDisk { position: pos, material },
        ));
        spawned_count += 1;
    }

    info!("Spawned {} gas disks", spawned_count);
}

/// System that despawns every disk when the overlay is disabled or the grid is removed.
pub fn despawn_gas_disks(
    mut commands: Commands,
    overlay: Res<GasOverlay>,
    gas_grid: Option<Res<GasGrid>>,
    existing_disks: Query<(Entity, &GasDisk)>,
    mut materials: ResMut<Assets<ColorMaterial>>,
) {
    if overlay.0 && gas_grid.is_some() {
        return;
    }

    let mut disk_count = 0;
    for (entity, disk) in existing_disks.iter() {
        materials.remove(&disk.material);
        commands.entity(entity).despawn();
        disk_count += 1;
    }

    if disk_count > 0 {
        info!("Despawned {} gas disks", disk_count);
    }
}

/// System that refreshes the disks named by this frame's [`GasCellChanged`] messages.
pub fn update_gas_disks(
    gas_grid: Option<Res<GasGrid>>,
    mut changes: MessageReader<GasCellChanged>,
    mut disks: Query<(&GasDisk, &mut Transform)>,
    mut materials: ResMut<Assets<ColorMaterial>>,
) {
    let Some(gas_grid) = gas_grid else {
        changes.clear();
        return;
    };

    let changed: HashSet<IVec2> = changes.read().map(|change| change.position).collect();
    if changed.is_empty() {
        return;
    }

    for (disk, mut transform) in disks.iter_mut() {
        if !changed.contains(&disk.position) {
            continue;
        }
        let Some(cell) = gas_grid.cell(disk.position) else {
            continue;
        };
        let display = GasDisplay::for_cell(cell);
        transform.scale = disk_scale(&display);
        if let Some(material) = materials.get_mut(&disk.material) {
            material.color = disk_color(&display);
        }
    }
}

pub struct GasOverlayPlugin;

impl Plugin for GasOverlayPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<GasOverlay>();
        app.init_resource::<DiskMesh>();
        app.add_systems(
            Update,
            (
                toggle_overlay,
                despawn_gas_disks,
                spawn_gas_disks,
                update_gas_disks,
            )
                .chain(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::MAX_RADIUS;

    #[test]
    fn test_overlay_default_on() {
        assert!(GasOverlay::default().0, "Overlay should be on by default");
    }

    #[test]
    fn test_cell_world_roundtrip() {
        let grid = GasGrid::default();
        for pos in [IVec2::new(0, 0), IVec2::new(19, 19), IVec2::new(38, 0), IVec2::new(7, 31)] {
            assert_eq!(world_to_cell(&grid, cell_to_world(&grid, pos)), pos);
        }
        // The centre cell sits on the origin, row 0 at the top.
        assert_eq!(cell_to_world(&grid, IVec2::new(19, 19)), Vec2::ZERO);
        assert!(cell_to_world(&grid, IVec2::new(19, 0)).y > 0.0);
    }

    #[test]
    fn test_world_to_cell_snaps_to_nearest() {
        let grid = GasGrid::new(3, 3);
        let centre = cell_to_world(&grid, IVec2::new(1, 1));
        let nudge = Vec2::splat(CELL_DIAMETER as f32 * 0.4);
        assert_eq!(world_to_cell(&grid, centre + nudge), IVec2::new(1, 1));
        assert_eq!(world_to_cell(&grid, Vec2::new(1000.0, 0.0)).x, 68);
    }

    #[test]
    fn test_disk_scale_matches_radius() {
        assert_eq!(disk_scale(&GasDisplay::wall()), Vec3::new(7.5, 7.5, 1.0));
        assert_eq!(MAX_RADIUS, 7.5);
    }
}
