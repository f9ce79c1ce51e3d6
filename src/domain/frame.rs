/// Frame resolution: which sprite code to draw for a tile or actor.
///
/// Sprites share the tile code namespace (`tile::TILE_COUNT` entries).
/// Presentation must reject anything outside it instead of clamping.

use super::entity::Direction;
use super::tile::{Entity, TileCode, TILE_COUNT};
use crate::error::SimError;

// ── Sprite codes without a tile descriptor ──

pub const DAVE_WALK_RIGHT: TileCode = 53;
pub const DAVE_STAND: TileCode = 56;
pub const DAVE_WALK_LEFT: TileCode = 57;
pub const DAVE_JUMP_RIGHT: TileCode = 67;
pub const DAVE_JUMP_LEFT: TileCode = 68;
pub const DAVE_CLIMB: TileCode = 71;
pub const DAVE_JETPACK_RIGHT: TileCode = 77;
pub const DAVE_JETPACK_LEFT: TileCode = 80;
pub const MONSTER_BULLET_RIGHT: TileCode = 121;
pub const MONSTER_BULLET_LEFT: TileCode = 124;
pub const DAVE_BULLET_RIGHT: TileCode = 127;
pub const DAVE_BULLET_LEFT: TileCode = 128;
pub const UI_ICON_JETPACK: TileCode = 133;
pub const UI_ICON_GUN: TileCode = 134;
pub const UI_LIVES: TileCode = 135;
pub const UI_LEVEL: TileCode = 136;
pub const UI_SCORE: TileCode = 137;
pub const UI_TROPHY_MESSAGE: TileCode = 138;
pub const UI_JETPACK_BAR: TileCode = 141;
pub const UI_ICON_LIFE: TileCode = 143;
pub const UI_DIGIT_0: TileCode = 148;

/// Frame for a descriptor at a given tick.
///
/// Non-animated descriptors always show their base. Animated ones cycle
/// through `frames` codes, holding each for `speed.ticks()` ticks;
/// `salt` desynchronises otherwise identical tiles (callers pass the
/// column).
pub fn frame(entity: &Entity, tick: u64, salt: u64) -> TileCode {
    if !entity.animated || entity.frames == 0 {
        return entity.base;
    }
    let offset = salt.wrapping_add(tick / entity.speed.ticks()) % entity.frames as u64;
    entity.base + offset as TileCode
}

/// What Dave is doing, as far as his sprite is concerned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DavePose {
    pub facing: Direction,
    pub flying: bool,
    pub climbing: bool,
    pub airborne: bool,
}

/// Dave's sprite. `walk_tick` advances once per lateral step.
pub fn dave_frame(pose: DavePose, walk_tick: u64, tick: u64) -> TileCode {
    let walk = ((walk_tick / 2) % 3) as TileCode;
    let left = pose.facing == Direction::Left;
    if pose.flying {
        let base = if left { DAVE_JETPACK_LEFT } else { DAVE_JETPACK_RIGHT };
        base + (tick % 3) as TileCode
    } else if pose.climbing {
        DAVE_CLIMB + walk
    } else if pose.airborne {
        if left { DAVE_JUMP_LEFT } else { DAVE_JUMP_RIGHT }
    } else {
        match pose.facing {
            Direction::Right => DAVE_WALK_RIGHT + walk,
            Direction::Left => DAVE_WALK_LEFT + walk,
            Direction::Neutral => DAVE_STAND,
        }
    }
}

pub fn digit(d: u32) -> TileCode {
    UI_DIGIT_0 + (d % 10) as TileCode
}

/// Five score digits, most significant first.
pub fn score_digits(score: u32) -> [TileCode; 5] {
    [
        digit(score / 10_000),
        digit(score / 1_000),
        digit(score / 100),
        digit(score / 10),
        digit(score),
    ]
}

/// Accept a resolved sprite code, or fail with where it was found.
pub fn checked(code: TileCode, x: i32, y: i32, tick: u64) -> Result<TileCode, SimError> {
    if (code as usize) < TILE_COUNT {
        Ok(code)
    } else {
        Err(SimError::SpriteOutOfRange { code, x, y, tick })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::tile::{classify, FIRE, MONSTER_SPIDER, ROCK, TROPHY};
    use proptest::prelude::*;

    #[test]
    fn static_tiles_never_animate() {
        for tick in [0, 7, 1000] {
            assert_eq!(frame(&ROCK, tick, 3), 1);
        }
    }

    #[test]
    fn fast_cycle_holds_five_ticks() {
        assert_eq!(frame(&FIRE, 0, 0), 6);
        assert_eq!(frame(&FIRE, 4, 0), 6);
        assert_eq!(frame(&FIRE, 5, 0), 7);
        assert_eq!(frame(&FIRE, 19, 0), 9);
        assert_eq!(frame(&FIRE, 20, 0), 6);
        // salt shifts the phase
        assert_eq!(frame(&FIRE, 0, 1), 7);
    }

    #[test]
    fn slow_cycle_and_five_frame_trophy() {
        assert_eq!(frame(&MONSTER_SPIDER, 3, 0), 90);
        assert_eq!(frame(&MONSTER_SPIDER, 12, 0), 89);
        assert_eq!(frame(&TROPHY, 20, 0), 14);
        assert_eq!(frame(&TROPHY, 25, 0), 10);
    }

    #[test]
    fn frames_stay_in_declared_run() {
        for code in 0..TILE_COUNT as TileCode {
            let e = classify(code);
            for tick in 0..40 {
                assert!(e.contains(frame(&e, tick, code as u64)));
            }
        }
    }

    #[test]
    fn dave_poses() {
        let stand = DavePose { facing: Direction::Neutral, flying: false, climbing: false, airborne: false };
        assert_eq!(dave_frame(stand, 0, 0), DAVE_STAND);
        let walk_left = DavePose { facing: Direction::Left, ..stand };
        assert_eq!(dave_frame(walk_left, 2, 0), DAVE_WALK_LEFT + 1);
        let fly = DavePose { flying: true, ..walk_left };
        assert_eq!(dave_frame(fly, 0, 4), DAVE_JETPACK_LEFT + 1);
        let jump = DavePose { airborne: true, facing: Direction::Right, ..stand };
        assert_eq!(dave_frame(jump, 0, 0), DAVE_JUMP_RIGHT);
    }

    #[test]
    fn score_digits_read_left_to_right() {
        let d = score_digits(12_350);
        let plain: Vec<u8> = d.iter().map(|c| c - UI_DIGIT_0).collect();
        assert_eq!(plain, vec![1, 2, 3, 5, 0]);
    }

    proptest! {
        #[test]
        fn frame_is_periodic(tick in 0u64..1_000_000, salt in 0u64..100, code in 0u8..158) {
            let e = classify(code);
            let period = e.speed.ticks() * e.frames as u64;
            prop_assert_eq!(frame(&e, tick, salt), frame(&e, tick + period, salt));
        }

        #[test]
        fn salts_within_a_cycle_are_distinct(tick in 0u64..10_000, a in 0u64..4, b in 0u64..4) {
            prop_assume!(a != b);
            prop_assert_ne!(frame(&FIRE, tick, a), frame(&FIRE, tick, b));
        }
    }

    #[test]
    fn out_of_range_sprite_is_error() {
        assert!(checked(157, 0, 0, 0).is_ok());
        let err = checked(158, 4, 2, 9).unwrap_err();
        assert!(matches!(err, SimError::SpriteOutOfRange { code: 158, x: 4, y: 2, tick: 9 }));
    }
}
