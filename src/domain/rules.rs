/// Game rules: fixed level tables, scoring, and the input truth table.
///
/// Pure functions. They decide what is legal this tick; `sim::step`
/// carries it out.
///
/// ## Input Validation Truth Table
///
/// Probe numbers refer to `physics::PROBES`. Nothing is validated while
/// Dave's death countdown runs.
///
/// ┌──────────────┬───────────────────────────────────────────────┐
/// │ Move          │ Requires                                       │
/// ├──────────────┼───────────────────────────────────────────────┤
/// │ right         │ intent, probes 2 and 3 clear                   │
/// │ left          │ intent, probes 6 and 7 clear                   │
/// │ jump          │ up intent, on ground, not already jumping,     │
/// │               │ not flying, cannot climb, probes 0 and 1 clear │
/// │ climb up      │ up intent, climbable tile at body centre       │
/// │ fire          │ intent, gun held, own bullet not in flight     │
/// │ jetpack on/off│ intent, fuel > 0, toggle delay expired         │
/// │ down          │ intent, flying or climbing, probes 4 and 5     │
/// │ fly up        │ up intent, flying, probes 0 and 1 clear        │
/// └──────────────┴───────────────────────────────────────────────┘
///
/// The jetpack toggle is evaluated before down/fly-up, so a toggle takes
/// effect for those checks in the same tick.

use super::entity::Dave;
use super::physics::{
    FOOT_LEFT, FOOT_RIGHT, HEAD_LEFT, HEAD_RIGHT, LEFT_LOWER, LEFT_UPPER, RIGHT_LOWER,
    RIGHT_UPPER,
};
use super::tile::{
    Entity, MONSTER_DOUBLE_MUSHROOM, MONSTER_GREEN_BAR, MONSTER_GREEN_CIRCLE,
    MONSTER_GREY_SAUCER, MONSTER_PURPLE_THING, MONSTER_RED_SUN, MONSTER_SILVER_SPINNER,
    MONSTER_SPIDER,
};

pub const LEVEL_COUNT: usize = 10;
pub const START_LIVES: u32 = 3;
pub const MONSTER_SLOTS: usize = 5;

/// Death countdown for Dave and monsters.
pub const DEATH_TICKS: u32 = 30;
pub const JUMP_TICKS: u32 = 30;
pub const JETPACK_FUEL: u32 = 0xff;
pub const JETPACK_TOGGLE_DELAY: u32 = 10;

pub const DAVE_SPEED: i32 = 2;
pub const FALL_SPEED: i32 = 2;
pub const BULLET_SPEED: i32 = 4;

pub const DOOR_BONUS: u32 = 2000;
pub const LIFE_EVERY: u32 = 20_000;

pub const VIEW_W: i32 = 20;
pub const MAX_VIEW_X: i32 = 80;
/// Columns scrolled when Dave nears a viewport edge.
pub const SCROLL_STEP: i32 = 15;
pub const SCROLL_RIGHT_EDGE: i32 = 18;
pub const SCROLL_LEFT_EDGE: i32 = 2;

// ══════════════════════════════════════════════════════════════
// Level tables
// ══════════════════════════════════════════════════════════════

const START_CELLS: [(i32, i32); LEVEL_COUNT] = [
    (2, 8),
    (1, 8),
    (2, 5),
    (1, 5),
    (2, 8),
    (2, 8),
    (1, 2),
    (2, 8),
    (6, 1),
    (2, 8),
];

/// Dave's spawn cell for a level.
pub fn start_cell(level: usize) -> (i32, i32) {
    START_CELLS.get(level).copied().unwrap_or((2, 8))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MonsterSpawn {
    pub kind: Entity,
    pub x: i32,
    pub y: i32,
}

const fn spawn(kind: Entity, x: i32, y: i32) -> MonsterSpawn {
    MonsterSpawn { kind, x, y }
}

const SPAWNS_2: [MonsterSpawn; 2] = [spawn(MONSTER_SPIDER, 44, 4), spawn(MONSTER_SPIDER, 59, 4)];
const SPAWNS_3: [MonsterSpawn; 1] = [spawn(MONSTER_PURPLE_THING, 32, 2)];
const SPAWNS_4: [MonsterSpawn; 3] = [
    spawn(MONSTER_RED_SUN, 15, 3),
    spawn(MONSTER_RED_SUN, 33, 3),
    spawn(MONSTER_RED_SUN, 49, 3),
];
const SPAWNS_5: [MonsterSpawn; 4] = [
    spawn(MONSTER_GREEN_BAR, 10, 8),
    spawn(MONSTER_GREEN_BAR, 28, 8),
    spawn(MONSTER_GREEN_BAR, 45, 5),
    spawn(MONSTER_GREEN_BAR, 40, 8),
];
const SPAWNS_6: [MonsterSpawn; 4] = [
    spawn(MONSTER_GREY_SAUCER, 5, 2),
    spawn(MONSTER_GREY_SAUCER, 16, 1),
    spawn(MONSTER_GREY_SAUCER, 46, 2),
    spawn(MONSTER_GREY_SAUCER, 56, 3),
];
const SPAWNS_7: [MonsterSpawn; 3] = [
    spawn(MONSTER_DOUBLE_MUSHROOM, 10, 8),
    spawn(MONSTER_DOUBLE_MUSHROOM, 72, 2),
    spawn(MONSTER_DOUBLE_MUSHROOM, 84, 1),
];
const SPAWNS_8: [MonsterSpawn; 4] = [
    spawn(MONSTER_GREEN_CIRCLE, 35, 8),
    spawn(MONSTER_GREEN_CIRCLE, 41, 8),
    spawn(MONSTER_GREEN_CIRCLE, 49, 2),
    spawn(MONSTER_GREEN_CIRCLE, 65, 8),
];
const SPAWNS_9: [MonsterSpawn; 4] = [
    spawn(MONSTER_SILVER_SPINNER, 45, 8),
    spawn(MONSTER_SILVER_SPINNER, 51, 2),
    spawn(MONSTER_SILVER_SPINNER, 65, 3),
    spawn(MONSTER_SILVER_SPINNER, 82, 2),
];

/// Monsters placed when a level starts. Levels 0 and 1 have none.
pub fn monster_spawns(level: usize) -> &'static [MonsterSpawn] {
    match level {
        2 => &SPAWNS_2,
        3 => &SPAWNS_3,
        4 => &SPAWNS_4,
        5 => &SPAWNS_5,
        6 => &SPAWNS_6,
        7 => &SPAWNS_7,
        8 => &SPAWNS_8,
        9 => &SPAWNS_9,
        _ => &[],
    }
}

// ══════════════════════════════════════════════════════════════
// Scoring
// ══════════════════════════════════════════════════════════════

/// Extra lives earned by adding `points` to `score`: one per
/// `LIFE_EVERY` boundary crossed.
pub fn lives_earned(score: u32, points: u32) -> u32 {
    score.saturating_add(points) / LIFE_EVERY - score / LIFE_EVERY
}

/// Upward pixels for the current jump timer value.
pub fn jump_rise(timer: u32) -> i32 {
    match timer {
        17.. => 2,
        12..=15 => 1,
        _ => 0,
    }
}

// ══════════════════════════════════════════════════════════════
// Input validation
// ══════════════════════════════════════════════════════════════

/// Moves granted for this tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Moves {
    pub right: bool,
    pub left: bool,
    pub jump: bool,
    pub up: bool,
    pub climb: bool,
    pub fire: bool,
    pub toggle_jetpack: bool,
    pub down: bool,
}

pub fn validate(dave: &Dave, bullet_in_flight: bool) -> Moves {
    let mut m = Moves::default();
    if dave.is_dying() {
        return m;
    }
    let want = dave.intents;
    let p = |i| dave.probe(i);
    let head_clear = p(HEAD_LEFT) && p(HEAD_RIGHT);

    m.right = want.right && p(RIGHT_UPPER) && p(RIGHT_LOWER);
    m.left = want.left && p(LEFT_LOWER) && p(LEFT_UPPER);
    m.jump = want.up
        && dave.on_ground
        && !dave.jump
        && !dave.jetpack
        && !dave.can_climb
        && head_clear;
    if want.up && dave.can_climb {
        m.up = true;
        m.climb = true;
    }
    m.fire = want.fire && dave.gun && !bullet_in_flight;
    m.toggle_jetpack = want.jetpack && dave.jetpack_fuel > 0 && dave.jetpack_delay == 0;

    let flying = dave.jetpack != m.toggle_jetpack;
    m.down = want.down && (flying || dave.climb) && p(FOOT_RIGHT) && p(FOOT_LEFT);
    if want.up && flying && head_clear {
        m.up = true;
    }
    m
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::Intents;

    fn grounded() -> Dave {
        let mut d = Dave::new(2, 8);
        d.on_ground = true;
        d
    }

    #[test]
    fn nothing_validated_while_dying() {
        let mut d = grounded();
        d.dead_timer = 5;
        d.intents = Intents { left: true, right: true, up: true, ..Intents::default() };
        assert_eq!(validate(&d, false), Moves::default());
    }

    #[test]
    fn lateral_blocked_by_side_probes() {
        let mut d = grounded();
        d.intents.right = true;
        d.probes[RIGHT_LOWER] = false;
        assert!(!validate(&d, false).right);
        d.probes[RIGHT_LOWER] = true;
        assert!(validate(&d, false).right);
    }

    #[test]
    fn jump_needs_clear_head_and_ground() {
        let mut d = grounded();
        d.intents.up = true;
        assert!(validate(&d, false).jump);
        d.probes[HEAD_RIGHT] = false;
        assert!(!validate(&d, false).jump);
        d.probes[HEAD_RIGHT] = true;
        d.on_ground = false;
        assert!(!validate(&d, false).jump);
    }

    #[test]
    fn climbable_turns_up_into_climb() {
        let mut d = grounded();
        d.intents.up = true;
        d.can_climb = true;
        let m = validate(&d, false);
        assert!(!m.jump);
        assert!(m.up && m.climb);
    }

    #[test]
    fn fire_requires_gun_and_free_slot() {
        let mut d = grounded();
        d.intents.fire = true;
        assert!(!validate(&d, false).fire);
        d.gun = true;
        assert!(validate(&d, false).fire);
        assert!(!validate(&d, true).fire);
    }

    #[test]
    fn jetpack_toggle_applies_to_same_tick_flight() {
        let mut d = grounded();
        d.jetpack_fuel = 100;
        d.intents.jetpack = true;
        d.intents.up = true;
        let m = validate(&d, false);
        assert!(m.toggle_jetpack);
        assert!(m.up);
        d.jetpack_delay = 3;
        let m = validate(&d, false);
        assert!(!m.toggle_jetpack);
    }

    #[test]
    fn jump_schedule_rises_two_tiles() {
        let total: i32 = (1..=JUMP_TICKS).map(jump_rise).sum();
        assert_eq!(total, 32);
        assert_eq!(jump_rise(16), 0);
        assert_eq!(jump_rise(12), 1);
    }

    #[test]
    fn life_bonus_per_boundary() {
        assert_eq!(lives_earned(0, 20_000), 1);
        assert_eq!(lives_earned(1, 19_999), 1);
        assert_eq!(lives_earned(0, 5_000), 0);
        assert_eq!(lives_earned(19_900, 100), 1);
        assert_eq!(lives_earned(19_800, 100), 0);
        assert_eq!(lives_earned(19_000, 41_000), 3);
        assert_eq!(lives_earned(20_000, 300), 0);
    }

    #[test]
    fn spawn_tables() {
        assert!(monster_spawns(0).is_empty());
        assert!(monster_spawns(1).is_empty());
        assert_eq!(monster_spawns(2).len(), 2);
        assert!(monster_spawns(9).iter().all(|s| s.kind.base == 117));
        assert!((0..LEVEL_COUNT).all(|l| monster_spawns(l).len() <= MONSTER_SLOTS));
        assert_eq!(start_cell(8), (6, 1));
    }
}
