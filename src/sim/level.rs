/// Level store: the ten playfields plus the title screen.
///
/// ## Sources (priority order):
///   1. `levels_dir` with `level0.dat` … `level9.dat` and `leveltitle.dat`
///   2. Built-in embedded levels
///
/// ## Binary level format (1280 bytes):
///   ```text
///   path     256 bytes   signed (dx, dy) pairs, see domain::path
///   tiles   1000 bytes   row-major, 100 columns × 10 rows
///   padding   24 bytes   unused
///   ```
/// The title file is 70 tile bytes (10 columns × 7 rows).
///
/// ## Text legend (`Level::from_rows`):
///   '#' = Rock        '=' = Girder       'B' = Blue wall   '%' = Dirt
///   '-' = Pipe (h)    '|' = Pipe (v)     'D' = Door        'T' = Trophy
///   'J' = Jetpack     'G' = Gun          'f' = Fire        'w' = Water
///   'v' = Weeds       't' = Tree trunk   '*' = Stars       'd' = Blue diamond
///   'o' = Purple ball 'r' = Red diamond  'c' = Crown       'i' = Ring
///   '!' = Wand        ' ' = Empty

use std::path::{Path, PathBuf};

use crate::domain::path::{PATH_END, PATH_LEN};
use crate::domain::physics::{cell_index, GRID_H, GRID_W};
use crate::domain::rules::{start_cell, LEVEL_COUNT};
use crate::domain::tile::{self, TileCode};
use crate::error::LevelError;

pub const TILES_LEN: usize = (GRID_W * GRID_H) as usize;
pub const PADDING_LEN: usize = 24;
pub const LEVEL_BYTES: usize = PATH_LEN + TILES_LEN + PADDING_LEN;
pub const TITLE_W: usize = 10;
pub const TITLE_H: usize = 7;
pub const TITLE_LEN: usize = TITLE_W * TITLE_H;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Level {
    pub path: [i8; PATH_LEN],
    pub tiles: [TileCode; TILES_LEN],
    pub padding: [u8; PADDING_LEN],
}

impl Level {
    pub fn empty() -> Self {
        Level {
            path: [0; PATH_LEN],
            tiles: [0; TILES_LEN],
            padding: [0; PADDING_LEN],
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, LevelError> {
        check_size("level data", bytes, LEVEL_BYTES)?;
        let mut level = Level::empty();
        let (path, rest) = bytes.split_at(PATH_LEN);
        let (tiles, padding) = rest.split_at(TILES_LEN);
        for (dst, &src) in level.path.iter_mut().zip(path) {
            *dst = src as i8;
        }
        level.tiles.copy_from_slice(tiles);
        level.padding.copy_from_slice(padding);
        Ok(level)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(LEVEL_BYTES);
        out.extend(self.path.iter().map(|&v| v as u8));
        out.extend_from_slice(&self.tiles);
        out.extend_from_slice(&self.padding);
        out
    }

    /// Build from text art. Short rows and missing rows are empty;
    /// characters past column 99 are ignored.
    pub fn from_rows(rows: &[&str]) -> Self {
        let mut level = Level::empty();
        for (y, row) in rows.iter().take(GRID_H as usize).enumerate() {
            for (x, ch) in row.chars().take(GRID_W as usize).enumerate() {
                level.tiles[y * GRID_W as usize + x] = legend(ch);
            }
        }
        level
    }

    /// Replace the path with `legs` followed by an end marker.
    pub fn with_path(mut self, legs: &[(i8, i8)]) -> Self {
        self.path = [0; PATH_LEN];
        let mut i = 0;
        for &(dx, dy) in legs.iter().take(PATH_LEN / 2 - 1) {
            self.path[i] = dx;
            self.path[i + 1] = dy;
            i += 2;
        }
        self.path[i] = PATH_END;
        self.path[i + 1] = PATH_END;
        self
    }

    /// Tile at a grid cell, `None` outside the grid.
    pub fn tile(&self, x: i32, y: i32) -> Option<TileCode> {
        cell_index(x, y).map(|i| self.tiles[i])
    }

    /// Overwrite a cell. Off-grid writes are ignored.
    pub fn set_tile(&mut self, x: i32, y: i32, code: TileCode) {
        if let Some(i) = cell_index(x, y) {
            self.tiles[i] = code;
        }
    }
}

fn legend(ch: char) -> TileCode {
    let entity = match ch {
        '#' => tile::ROCK,
        '=' => tile::GIRDER,
        'B' => tile::BLUE_WALL,
        '%' => tile::DIRT,
        '-' => tile::PIPE_HORIZONTAL,
        '|' => tile::PIPE_VERTICAL,
        'D' => tile::DOOR,
        'T' => tile::TROPHY,
        'J' => tile::JETPACK,
        'G' => tile::GUN,
        'f' => tile::FIRE,
        'w' => tile::WATER,
        'v' => tile::WEEDS,
        't' => tile::TREE_TRUNK,
        '*' => tile::STARS,
        'd' => tile::BLUE_DIAMOND,
        'o' => tile::PURPLE_BALL,
        'r' => tile::RED_DIAMOND,
        'c' => tile::CROWN,
        'i' => tile::RING,
        '!' => tile::WAND,
        _ => tile::EMPTY,
    };
    entity.base
}

fn check_size(what: &str, bytes: &[u8], expected: usize) -> Result<(), LevelError> {
    if bytes.len() == expected {
        Ok(())
    } else {
        Err(LevelError::BadSize {
            what: what.to_string(),
            expected,
            actual: bytes.len(),
        })
    }
}

fn read_file(path: PathBuf) -> Result<Vec<u8>, LevelError> {
    match std::fs::read(&path) {
        Ok(bytes) => Ok(bytes),
        Err(source) => Err(LevelError::Io { path, source }),
    }
}

// ══════════════════════════════════════════════════════════════
// Store
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Debug)]
pub struct LevelStore {
    levels: Vec<Level>,
    pub title: [TileCode; TITLE_LEN],
}

impl LevelStore {
    pub fn from_parts(levels: Vec<Level>, title: [TileCode; TITLE_LEN]) -> Result<Self, LevelError> {
        if levels.len() != LEVEL_COUNT {
            return Err(LevelError::LevelCount {
                expected: LEVEL_COUNT,
                actual: levels.len(),
            });
        }
        Ok(LevelStore { levels, title })
    }

    pub fn load_dir(dir: &Path) -> Result<Self, LevelError> {
        let mut levels = Vec::with_capacity(LEVEL_COUNT);
        for n in 0..LEVEL_COUNT {
            let name = format!("level{n}.dat");
            let bytes = read_file(dir.join(&name))?;
            check_size(&name, &bytes, LEVEL_BYTES)?;
            levels.push(Level::from_bytes(&bytes)?);
        }
        let bytes = read_file(dir.join("leveltitle.dat"))?;
        check_size("leveltitle.dat", &bytes, TITLE_LEN)?;
        let mut title = [0; TITLE_LEN];
        title.copy_from_slice(&bytes);
        log::info!("loaded {} levels from {}", LEVEL_COUNT, dir.display());
        Self::from_parts(levels, title)
    }

    /// Built-in playable set used when no level files are found.
    pub fn embedded() -> Self {
        LevelStore {
            levels: (0..LEVEL_COUNT).map(embedded_level).collect(),
            title: embedded_title(),
        }
    }

    /// Level by index; indices past the end clamp to the last level.
    pub fn level(&self, n: usize) -> &Level {
        &self.levels[n.min(self.levels.len() - 1)]
    }

    pub fn level_mut(&mut self, n: usize) -> &mut Level {
        let last = self.levels.len() - 1;
        &mut self.levels[n.min(last)]
    }

    pub fn title_tile(&self, x: usize, y: usize) -> TileCode {
        if x < TITLE_W && y < TITLE_H {
            self.title[y * TITLE_W + x]
        } else {
            0
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Embedded fallback levels
// ══════════════════════════════════════════════════════════════

/// Shared patrol: a box 32px wide and one tile tall.
const EMBEDDED_PATROL: [(i8, i8); 4] = [(32, 0), (0, 16), (-32, 0), (0, -16)];

fn embedded_level(n: usize) -> Level {
    let w = GRID_W as usize;
    let h = GRID_H as usize;
    let mut grid = vec![vec![' '; w]; h];

    for x in 0..w {
        grid[0][x] = '#';
        grid[h - 1][x] = '#';
    }
    for row in grid.iter_mut() {
        row[0] = '#';
        row[w - 1] = '#';
    }

    let (sx, sy) = start_cell(n);
    let (sx, sy) = (sx as usize, sy as usize);
    if sy + 1 < h - 1 {
        for x in 1..=sx + 4 {
            grid[sy + 1][x] = '=';
        }
    }

    // fire pit the player has to jump
    if n >= 1 {
        grid[h - 1][20 + n] = 'f';
        grid[h - 1][21 + n] = 'f';
    }
    if n >= 5 {
        for x in 62..65 {
            grid[h - 1][x] = 'w';
        }
    }

    // one-tile step
    grid[8][40] = '%';

    // trophy ledge, exactly one jump high
    for x in 50..=58 {
        grid[7][x] = '=';
    }
    grid[6][54] = 'T';

    for y in 4..=8 {
        grid[y][72] = 't';
    }
    for x in 73..=78 {
        grid[4][x] = '=';
    }
    grid[3][76] = 'c';

    let gems = ['d', 'o', 'r', 'i'];
    for (i, x) in (8..92).step_by(7).enumerate() {
        if grid[8][x] == ' ' {
            grid[8][x] = gems[(i + n) % gems.len()];
        }
    }
    if n >= 2 {
        grid[8][13] = 'G';
    }
    if n >= 4 {
        grid[8][34] = 'J';
    }
    grid[8][96] = 'D';

    let rows: Vec<String> = grid.into_iter().map(|r| r.into_iter().collect()).collect();
    let refs: Vec<&str> = rows.iter().map(String::as_str).collect();
    Level::from_rows(&refs).with_path(&EMBEDDED_PATROL)
}

fn embedded_title() -> [TileCode; TITLE_LEN] {
    let mut title = [0; TITLE_LEN];
    for x in 0..TITLE_W {
        title[x] = tile::GIRDER.base;
        title[(TITLE_H - 1) * TITLE_W + x] = tile::GIRDER.base;
    }
    for x in 3..7 {
        title[2 * TITLE_W + x] = tile::TITLE.base;
    }
    title[4 * TITLE_W + 2] = tile::FIRE.base;
    title[4 * TITLE_W + 7] = tile::FIRE.base;
    title
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::tile::classify;

    fn write_store(dir: &Path, store: &LevelStore) {
        for n in 0..LEVEL_COUNT {
            std::fs::write(dir.join(format!("level{n}.dat")), store.level(n).to_bytes()).unwrap();
        }
        std::fs::write(dir.join("leveltitle.dat"), store.title).unwrap();
    }

    #[test]
    fn from_rows_legend() {
        let level = Level::from_rows(&["#D T", " fw*"]);
        assert_eq!(level.tile(0, 0), Some(1));
        assert_eq!(level.tile(1, 0), Some(2));
        assert_eq!(level.tile(2, 0), Some(0));
        assert_eq!(level.tile(3, 0), Some(10));
        assert!(classify(level.tile(1, 1).unwrap()).is_hazard);
        assert!(classify(level.tile(3, 1).unwrap()).climbable);
        // beyond the art: empty
        assert_eq!(level.tile(50, 5), Some(0));
        assert_eq!(level.tile(100, 0), None);
        assert_eq!(level.tile(0, -1), None);
    }

    #[test]
    fn path_bytes_are_signed() {
        let mut bytes = vec![0u8; LEVEL_BYTES];
        bytes[0] = 0xEA;
        bytes[1] = 0x03;
        bytes[PATH_LEN] = 17;
        let level = Level::from_bytes(&bytes).unwrap();
        assert_eq!(level.path[0], -22);
        assert_eq!(level.path[1], 3);
        assert_eq!(level.tile(0, 0), Some(17));
    }

    #[test]
    fn wrong_size_rejected() {
        let err = Level::from_bytes(&[0u8; 1279]).unwrap_err();
        assert!(matches!(err, LevelError::BadSize { expected: 1280, actual: 1279, .. }));
    }

    #[test]
    fn store_requires_ten_levels() {
        let err = LevelStore::from_parts(vec![Level::empty(); 3], [0; TITLE_LEN]).unwrap_err();
        assert!(matches!(err, LevelError::LevelCount { expected: 10, actual: 3 }));
    }

    #[test]
    fn with_path_appends_end_marker() {
        let level = Level::empty().with_path(&[(4, 0), (0, -2)]);
        assert_eq!(&level.path[..6], &[4, 0, 0, -2, PATH_END, PATH_END]);
    }

    #[test]
    fn load_dir_reads_all_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = LevelStore::embedded();
        write_store(dir.path(), &store);
        let loaded = LevelStore::load_dir(dir.path()).unwrap();
        for n in 0..LEVEL_COUNT {
            assert_eq!(loaded.level(n), store.level(n));
        }
        assert_eq!(loaded.title, store.title);
    }

    #[test]
    fn load_dir_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = LevelStore::embedded();
        write_store(dir.path(), &store);
        std::fs::remove_file(dir.path().join("level7.dat")).unwrap();
        match LevelStore::load_dir(dir.path()) {
            Err(LevelError::Io { path, .. }) => assert!(path.ends_with("level7.dat")),
            other => panic!("expected io error, got {other:?}"),
        }
    }

    #[test]
    fn load_dir_names_short_title() {
        let dir = tempfile::tempdir().unwrap();
        write_store(dir.path(), &LevelStore::embedded());
        std::fs::write(dir.path().join("leveltitle.dat"), [0u8; 12]).unwrap();
        match LevelStore::load_dir(dir.path()) {
            Err(LevelError::BadSize { what, actual: 12, .. }) => assert_eq!(what, "leveltitle.dat"),
            other => panic!("expected size error, got {other:?}"),
        }
    }

    #[test]
    fn embedded_levels_are_playable() {
        let store = LevelStore::embedded();
        for n in 0..LEVEL_COUNT {
            let level = store.level(n);
            let (sx, sy) = start_cell(n);
            assert_eq!(level.tile(sx, sy), Some(0), "level {n} start cell blocked");
            assert!(classify(level.tile(sx, sy + 1).unwrap()).has_collision);
            assert!(level.tiles.iter().any(|&c| classify(c).is(&tile::DOOR)));
            assert!(level.tiles.iter().any(|&c| classify(c).is(&tile::TROPHY)));
        }
    }

    #[test]
    fn set_tile_ignores_off_grid() {
        let mut level = Level::empty();
        level.set_tile(3, 4, 47);
        level.set_tile(-1, 4, 47);
        level.set_tile(3, 10, 47);
        assert_eq!(level.tile(3, 4), Some(47));
        assert_eq!(level.tiles.iter().filter(|&&c| c == 47).count(), 1);
    }
}
