/// Actors: Dave, monsters, projectiles.
/// Positions are pixel-space; grid cells are derived by truncating division.

use crate::domain::physics::{on_grid, TILE_SIZE};
use crate::domain::tile::Entity;

/// Horizontal heading. The discriminant doubles as the pixel sign.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Direction {
    Left = -1,
    #[default]
    Neutral = 0,
    Right = 1,
}

impl Direction {
    pub fn sign(self) -> i32 {
        self as i32
    }

    /// Neutral resolves to Right (the default firing direction).
    pub fn or_right(self) -> Direction {
        match self {
            Direction::Neutral => Direction::Right,
            d => d,
        }
    }
}

/// Raw per-tick intents. Latched from input, cleared after every step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Intents {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
    pub fire: bool,
    pub jetpack: bool,
    pub start: bool,
}

#[derive(Clone, Debug)]
pub struct Dave {
    pub px: i32,
    pub py: i32,
    pub x: i32,
    pub y: i32,
    pub last_dir: Direction,
    pub intents: Intents,
    // validated one-shot moves for this tick
    pub right: bool,
    pub left: bool,
    pub up: bool,
    pub down: bool,
    pub fire: bool,
    pub jump: bool,
    /// Flying with the jetpack.
    pub jetpack: bool,
    pub climb: bool,
    pub on_ground: bool,
    pub can_climb: bool,
    pub jump_timer: u32,
    pub dead_timer: u32,
    pub jetpack_fuel: u32,
    pub jetpack_delay: u32,
    pub trophy: bool,
    pub gun: bool,
    /// Clearance of the eight probes, in `physics::PROBES` order.
    pub probes: [bool; 8],
}

impl Dave {
    pub fn new(x: i32, y: i32) -> Self {
        let mut dave = Dave {
            px: 0,
            py: 0,
            x: 0,
            y: 0,
            last_dir: Direction::Neutral,
            intents: Intents::default(),
            right: false,
            left: false,
            up: false,
            down: false,
            fire: false,
            jump: false,
            jetpack: false,
            climb: false,
            on_ground: true,
            can_climb: false,
            jump_timer: 0,
            dead_timer: 0,
            jetpack_fuel: 0,
            jetpack_delay: 0,
            trophy: false,
            gun: false,
            probes: [true; 8],
        };
        dave.place(x, y);
        dave
    }

    /// Put Dave on a grid cell, pixel position at the cell's corner.
    pub fn place(&mut self, x: i32, y: i32) {
        self.x = x;
        self.y = y;
        self.px = x * TILE_SIZE;
        self.py = y * TILE_SIZE;
    }

    pub fn is_dying(&self) -> bool {
        self.dead_timer > 0
    }

    pub fn probe(&self, i: usize) -> bool {
        self.probes[i]
    }
}

/// A monster following its level's shared path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActiveMonster {
    pub kind: Entity,
    pub path_index: usize,
    pub dead_timer: u32,
    pub px: i32,
    pub py: i32,
    pub x: i32,
    pub y: i32,
    /// Remaining displacement of the current path leg.
    pub next_px: i32,
    pub next_py: i32,
}

impl ActiveMonster {
    pub fn is_dying(&self) -> bool {
        self.dead_timer > 0
    }

    pub fn sync_grid(&mut self) {
        self.x = on_grid(self.px);
        self.y = on_grid(self.py);
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum Monster {
    #[default]
    Inactive,
    Active(ActiveMonster),
}

impl Monster {
    pub fn spawn(kind: Entity, x: i32, y: i32) -> Self {
        let ts = TILE_SIZE;
        Monster::Active(ActiveMonster {
            kind,
            path_index: 0,
            dead_timer: 0,
            px: x * ts,
            py: y * ts,
            x,
            y,
            next_px: 0,
            next_py: 0,
        })
    }

    pub fn active(&self) -> Option<&ActiveMonster> {
        match self {
            Monster::Active(m) => Some(m),
            Monster::Inactive => None,
        }
    }

    pub fn active_mut(&mut self) -> Option<&mut ActiveMonster> {
        match self {
            Monster::Active(m) => Some(m),
            Monster::Inactive => None,
        }
    }
}

/// A bullet in flight. Absence is modelled with `Option<Projectile>`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Projectile {
    pub px: i32,
    pub py: i32,
    pub dir: Direction,
}

impl Projectile {
    /// Spawn beside a shooter at pixel (px, py): 18px ahead when facing
    /// right, 8px behind the left edge otherwise, 8px down.
    pub fn fired_from(px: i32, py: i32, dir: Direction) -> Self {
        let dir = dir.or_right();
        let x = if dir == Direction::Right { px + 18 } else { px - 8 };
        Projectile { px: x, py: py + 8, dir }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::tile::MONSTER_SPIDER;

    #[test]
    fn direction_signs() {
        assert_eq!(Direction::Left.sign(), -1);
        assert_eq!(Direction::Neutral.sign(), 0);
        assert_eq!(Direction::Right.sign(), 1);
        assert_eq!(Direction::Neutral.or_right(), Direction::Right);
        assert_eq!(Direction::Left.or_right(), Direction::Left);
    }

    #[test]
    fn dave_placed_on_cell_corner() {
        let d = Dave::new(2, 8);
        assert_eq!((d.px, d.py), (32, 128));
        assert!(!d.is_dying());
    }

    #[test]
    fn spawned_monster_has_fresh_path() {
        let m = Monster::spawn(MONSTER_SPIDER, 44, 4);
        let a = m.active().unwrap();
        assert_eq!((a.px, a.py), (704, 64));
        assert_eq!((a.next_px, a.next_py, a.path_index), (0, 0, 0));
        assert!(Monster::Inactive.active().is_none());
    }

    #[test]
    fn bullet_spawn_offsets() {
        let r = Projectile::fired_from(100, 50, Direction::Neutral);
        assert_eq!((r.px, r.py, r.dir), (118, 58, Direction::Right));
        let l = Projectile::fired_from(100, 50, Direction::Left);
        assert_eq!((l.px, l.py), (92, 58));
    }
}
