use bevy::prelude::*;
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
#[reflect(Debug, PartialEq)]
pub enum TileKind {
    Floor,
    Wall,
    /// Open to vacuum: drains whatever gas reaches it.
    Space,
}

impl TileKind {
    /// Whether gas can occupy the tile. Only walls keep it out.
    pub fn is_permeable(&self) -> bool {
        match self {
            TileKind::Floor | TileKind::Space => true,
            TileKind::Wall => false,
        }
    }

    fn from_glyph(glyph: char) -> Option<Self> {
        match glyph {
            '.' => Some(TileKind::Floor),
            '#' => Some(TileKind::Wall),
            '~' => Some(TileKind::Space),
            _ => None,
        }
    }
}

/// On-disk level description: one string per row, top row first.
/// `.` floor, `#` wall, `~` space.
#[derive(Debug, Clone, Deserialize)]
pub struct LevelFile {
    pub rows: Vec<String>,
}

#[derive(Debug, Clone, Resource, Reflect)]
#[reflect(Debug, Resource)]
pub struct Tilemap {
    width: u32,
    height: u32,
    tiles: Vec<TileKind>,
}

impl Tilemap {
    pub fn new(width: u32, height: u32, fill: TileKind) -> Self {
        let size = width as usize * height as usize;
        Self {
            width,
            height,
            tiles: vec![fill; size],
        }
    }

    /// Parses an ASCII layout. Every row must have the same, non-zero length.
    pub fn from_ascii<S: AsRef<str>>(rows: &[S]) -> Result<Self, String> {
        let height = rows.len();
        let Some(first) = rows.first() else {
            return Err("level has no rows".to_string());
        };
        let width = first.as_ref().chars().count();
        if width == 0 {
            return Err("level rows are empty".to_string());
        }

        let mut tiles = Vec::with_capacity(width * height);
        for (y, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            let row_width = row.chars().count();
            if row_width != width {
                return Err(format!(
                    "row {y} width mismatch: expected {width}, got {row_width}"
                ));
            }
            for (x, glyph) in row.chars().enumerate() {
                let kind = TileKind::from_glyph(glyph)
                    .ok_or_else(|| format!("unknown tile '{glyph}' at ({x}, {y})"))?;
                tiles.push(kind);
            }
        }

        let width = u32::try_from(width).map_err(|_| format!("level width {width} overflow"))?;
        let height =
            u32::try_from(height).map_err(|_| format!("level height {height} overflow"))?;
        Ok(Self {
            width,
            height,
            tiles,
        })
    }

    /// Parses a RON [`LevelFile`].
    pub fn from_ron(source: &str) -> Result<Self, String> {
        let level: LevelFile =
            ron::from_str(source).map_err(|e| format!("invalid level file: {e}"))?;
        Self::from_ascii(&level.rows)
    }

    /// Reads and parses a RON level from disk.
    pub fn load(path: &str) -> Result<Self, String> {
        let source =
            std::fs::read_to_string(path).map_err(|e| format!("cannot read {path}: {e}"))?;
        Self::from_ron(&source)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    fn coord_to_index(&self, pos: IVec2) -> Option<usize> {
        if pos.x >= 0 && pos.x < self.width as i32 && pos.y >= 0 && pos.y < self.height as i32 {
            Some((pos.y * self.width as i32 + pos.x) as usize)
        } else {
            None
        }
    }

    pub fn get(&self, pos: IVec2) -> Option<TileKind> {
        self.coord_to_index(pos).map(|idx| self.tiles[idx])
    }

    pub fn set(&mut self, pos: IVec2, kind: TileKind) -> bool {
        if let Some(idx) = self.coord_to_index(pos) {
            self.tiles[idx] = kind;
            true
        } else {
            false
        }
    }

    /// Returns an iterator over all tiles with their positions and kinds, row by row.
    pub fn iter(&self) -> impl Iterator<Item = (IVec2, TileKind)> + '_ {
        let width = self.width as usize;
        self.tiles.iter().enumerate().map(move |(idx, kind)| {
            let pos = IVec2::new((idx % width) as i32, (idx / width) as i32);
            (pos, *kind)
        })
    }
}

pub struct TilesPlugin;

impl Plugin for TilesPlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<TileKind>();
        app.register_type::<Tilemap>();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tile_kind_permeability() {
        assert!(TileKind::Floor.is_permeable());
        assert!(TileKind::Space.is_permeable());
        assert!(!TileKind::Wall.is_permeable());
    }

    #[test]
    fn test_tilemap_get_set() {
        let mut tilemap = Tilemap::new(5, 5, TileKind::Floor);

        assert_eq!(tilemap.get(IVec2::new(4, 4)), Some(TileKind::Floor));
        assert!(tilemap.set(IVec2::new(2, 2), TileKind::Wall));
        assert_eq!(tilemap.get(IVec2::new(2, 2)), Some(TileKind::Wall));

        assert_eq!(tilemap.get(IVec2::new(-1, 0)), None);
        assert_eq!(tilemap.get(IVec2::new(0, 5)), None);
        assert!(!tilemap.set(IVec2::new(10, 10), TileKind::Wall));
    }

    #[test]
    fn test_iter_is_row_major() {
        let mut tilemap = Tilemap::new(3, 2, TileKind::Floor);
        tilemap.set(IVec2::new(2, 0), TileKind::Wall);

        let tiles: Vec<_> = tilemap.iter().collect();
        assert_eq!(tiles.len(), 6);
        assert_eq!(tiles[1].0, IVec2::new(1, 0));
        assert_eq!(tiles[2], (IVec2::new(2, 0), TileKind::Wall));
        assert_eq!(tiles[3].0, IVec2::new(0, 1));
    }

    #[test]
    fn test_from_ascii() {
        let tilemap = Tilemap::from_ascii(&["..#", "~.#"]).expect("layout should parse");
        assert_eq!(tilemap.width(), 3);
        assert_eq!(tilemap.height(), 2);
        assert_eq!(tilemap.get(IVec2::new(2, 0)), Some(TileKind::Wall));
        assert_eq!(tilemap.get(IVec2::new(0, 1)), Some(TileKind::Space));
        assert_eq!(tilemap.get(IVec2::new(1, 1)), Some(TileKind::Floor));
    }

    #[test]
    fn test_from_ascii_rejects_ragged_rows() {
        let result = Tilemap::from_ascii(&["...", ".."]);
        assert!(result.unwrap_err().contains("mismatch"));
    }

    #[test]
    fn test_from_ascii_rejects_unknown_glyph() {
        let result = Tilemap::from_ascii(&[".x."]);
        assert!(result.unwrap_err().contains("unknown tile"));
    }

    #[test]
    fn test_from_ascii_rejects_empty() {
        let rows: [&str; 0] = [];
        assert!(Tilemap::from_ascii(&rows).is_err());
        assert!(Tilemap::from_ascii(&[""]).is_err());
    }

    #[test]
    fn test_from_ron() {
        let tilemap = Tilemap::from_ron(r##"(rows: ["#.#", "~~~"])"##).expect("level should parse");
        assert_eq!(tilemap.width(), 3);
        assert_eq!(tilemap.get(IVec2::new(0, 0)), Some(TileKind::Wall));
        assert_eq!(tilemap.get(IVec2::new(1, 1)), Some(TileKind::Space));

        assert!(Tilemap::from_ron("not ron").unwrap_err().contains("invalid level"));
    }
}
