/// Tile classification table.
///
/// Every tile code in `0..TILE_COUNT` maps to exactly one `Entity`
/// descriptor. A descriptor is declared once for a contiguous run of codes
/// (its animation frames). The first declared run containing a code wins;
/// codes outside every run classify as an inert descriptor of their own.
///
/// The code → descriptor index is built at compile time, so `classify`
/// is one array read and never fails.

pub type TileCode = u8;

/// Size of the shared tile/sprite namespace.
pub const TILE_COUNT: usize = 158;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AnimationSpeed {
    Fast,
    Slow,
}

impl AnimationSpeed {
    /// Ticks each animation frame stays on screen.
    pub const fn ticks(self) -> u64 {
        match self {
            AnimationSpeed::Fast => 5,
            AnimationSpeed::Slow => 3,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Entity {
    pub name: &'static str,
    pub base: TileCode,
    pub frames: u8,
    pub animated: bool,
    pub speed: AnimationSpeed,
    pub climbable: bool,
    pub has_collision: bool,
    pub is_pickup: bool,
    pub is_hazard: bool,
    pub score: Option<u32>,
}

impl Entity {
    /// Descriptor with no special properties for a single code.
    pub const fn inert(base: TileCode) -> Self {
        Entity {
            name: "inert",
            base,
            frames: 1,
            animated: false,
            speed: AnimationSpeed::Fast,
            climbable: false,
            has_collision: false,
            is_pickup: false,
            is_hazard: false,
            score: None,
        }
    }

    const fn named(name: &'static str, base: TileCode) -> Self {
        let mut e = Entity::inert(base);
        e.name = name;
        e
    }

    /// Solid terrain: blocks movement, nothing else.
    const fn wall(name: &'static str, base: TileCode) -> Self {
        let mut e = Entity::named(name, base);
        e.has_collision = true;
        e
    }

    /// Monster archetype: four slow frames, worth 300, never picked up.
    const fn monster(name: &'static str, base: TileCode) -> Self {
        let mut e = Entity::named(name, base).animated(4);
        e.speed = AnimationSpeed::Slow;
        e.score = Some(300);
        e.is_pickup = false;
        e
    }

    const fn animated(mut self, frames: u8) -> Self {
        self.frames = frames;
        self.animated = true;
        self
    }

    const fn climbable(mut self) -> Self {
        self.climbable = true;
        self
    }

    const fn hazard(mut self) -> Self {
        self.is_hazard = true;
        self
    }

    /// Attach a score value; scored tiles are pickups unless forced off.
    const fn scored(mut self, value: u32) -> Self {
        self.score = Some(value);
        self.is_pickup = true;
        self
    }

    const fn pickup(mut self) -> Self {
        self.is_pickup = true;
        self
    }

    /// Identity check by declared base code.
    pub fn is(&self, other: &Entity) -> bool {
        self.base == other.base
    }

    pub fn contains(&self, code: TileCode) -> bool {
        code >= self.base && (code - self.base) < self.frames
    }
}

// ── Declared descriptors ──

pub const EMPTY: Entity = Entity::named("empty", 0);
pub const ROCK: Entity = Entity::wall("rock", 1);
pub const DOOR: Entity = Entity::named("door", 2);
pub const GIRDER: Entity = Entity::wall("girder", 3);
pub const JETPACK: Entity = Entity::named("jetpack", 4).pickup();
pub const BLUE_WALL: Entity = Entity::wall("blue-wall", 5);
pub const FIRE: Entity = Entity::named("fire", 6).animated(4).hazard();
pub const TROPHY: Entity = Entity::named("trophy", 10).animated(5).scored(1000);
pub const PIPE_HORIZONTAL: Entity = Entity::wall("pipe-horizontal", 15);
pub const PIPE_VERTICAL: Entity = Entity::wall("pipe-vertical", 16);
pub const RED_BRICK: Entity = Entity::wall("red-brick", 17);
pub const DIRT: Entity = Entity::wall("dirt", 18);
pub const BLUE_TILE: Entity = Entity::wall("blue-tile", 19);
pub const GUN: Entity = Entity::named("gun", 20).pickup();
pub const SLOPE_LEFT: Entity = Entity::wall("slope-left", 21);
pub const SLOPE_RIGHT: Entity = Entity::wall("slope-right", 22);
pub const PILLAR_TOP: Entity = Entity::wall("pillar-top", 23);
pub const PILLAR_BASE: Entity = Entity::wall("pillar-base", 24);
pub const WATER: Entity = Entity::named("water", 25).animated(4).hazard();
pub const PURPLE_BAR: Entity = Entity::wall("purple-bar", 29);
pub const PINK_BRICK: Entity = Entity::wall("pink-brick", 30);
pub const TREE_TRUNK: Entity = Entity::named("tree-trunk", 33).climbable();
pub const TREE_BRANCH_RIGHT: Entity = Entity::named("tree-branch-right", 34).climbable();
pub const TREE_BRANCH_LEFT: Entity = Entity::named("tree-branch-left", 35).climbable();
pub const WEEDS: Entity = Entity::named("weeds", 36).animated(4).hazard();
pub const STARS: Entity = Entity::named("stars", 41).climbable();
pub const BLUE_DIAMOND: Entity = Entity::named("blue-diamond", 47).scored(100);
pub const PURPLE_BALL: Entity = Entity::named("purple-ball", 48).scored(50);
pub const RED_DIAMOND: Entity = Entity::named("red-diamond", 49).scored(150);
pub const CROWN: Entity = Entity::named("crown", 50).scored(300);
pub const RING: Entity = Entity::named("ring", 51).scored(200);
pub const WAND: Entity = Entity::named("wand", 52).scored(500);
pub const MONSTER_SPIDER: Entity = Entity::monster("spider", 89);
pub const MONSTER_PURPLE_THING: Entity = Entity::monster("purple-thing", 93);
pub const MONSTER_RED_SUN: Entity = Entity::monster("red-sun", 97);
pub const MONSTER_GREEN_BAR: Entity = Entity::monster("green-bar", 101);
pub const MONSTER_GREY_SAUCER: Entity = Entity::monster("grey-saucer", 105);
pub const MONSTER_DOUBLE_MUSHROOM: Entity = Entity::monster("double-mushroom", 109);
pub const MONSTER_GREEN_CIRCLE: Entity = Entity::monster("green-circle", 113);
pub const MONSTER_SILVER_SPINNER: Entity = Entity::monster("silver-spinner", 117);
pub const EXPLOSION: Entity = Entity::named("explosion", 129).animated(4);
pub const TITLE: Entity = Entity::named("title", 144).animated(4);

const ENTITIES: &[Entity] = &[
    EMPTY,
    ROCK,
    DOOR,
    GIRDER,
    JETPACK,
    BLUE_WALL,
    FIRE,
    TROPHY,
    PIPE_HORIZONTAL,
    PIPE_VERTICAL,
    RED_BRICK,
    DIRT,
    BLUE_TILE,
    GUN,
    SLOPE_LEFT,
    SLOPE_RIGHT,
    PILLAR_TOP,
    PILLAR_BASE,
    WATER,
    PURPLE_BAR,
    PINK_BRICK,
    TREE_TRUNK,
    TREE_BRANCH_RIGHT,
    TREE_BRANCH_LEFT,
    WEEDS,
    STARS,
    BLUE_DIAMOND,
    PURPLE_BALL,
    RED_DIAMOND,
    CROWN,
    RING,
    WAND,
    MONSTER_SPIDER,
    MONSTER_PURPLE_THING,
    MONSTER_RED_SUN,
    MONSTER_GREEN_BAR,
    MONSTER_GREY_SAUCER,
    MONSTER_DOUBLE_MUSHROOM,
    MONSTER_GREEN_CIRCLE,
    MONSTER_SILVER_SPINNER,
    EXPLOSION,
    TITLE,
];

const NO_ENTITY: u8 = u8::MAX;

/// `INDEX[code]` = position in `ENTITIES`, or `NO_ENTITY`.
/// Walks the table backwards so earlier declarations overwrite later ones.
const INDEX: [u8; TILE_COUNT] = build_index();

const fn build_index() -> [u8; TILE_COUNT] {
    let mut index = [NO_ENTITY; TILE_COUNT];
    let mut i = ENTITIES.len();
    while i > 0 {
        i -= 1;
        let start = ENTITIES[i].base as usize;
        let end = start + ENTITIES[i].frames as usize;
        let mut code = start;
        while code < end && code < TILE_COUNT {
            index[code] = i as u8;
            code += 1;
        }
    }
    index
}

/// Behavioral descriptor for a tile code. Total: unknown codes come back
/// inert, carrying their own code as base so they still draw as themselves.
pub fn classify(code: TileCode) -> Entity {
    match INDEX.get(code as usize) {
        Some(&i) if i != NO_ENTITY => ENTITIES[i as usize],
        _ => Entity::inert(code),
    }
}

/// All declared descriptors, in declaration order.
pub fn declared() -> &'static [Entity] {
    ENTITIES
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn walls_only_collide() {
        for e in [ROCK, GIRDER, BLUE_WALL, RED_BRICK, DIRT, PINK_BRICK] {
            let c = classify(e.base);
            assert!(c.has_collision, "{} should collide", c.name);
            assert!(!c.climbable && !c.is_hazard && !c.is_pickup && !c.animated);
            assert_eq!(c.score, None);
        }
    }

    #[test]
    fn monsters_scored_but_not_pickups() {
        for code in (89u8..121).step_by(4) {
            let m = classify(code);
            assert_eq!(m.score, Some(300));
            assert!(!m.is_pickup);
            assert!(m.animated);
            assert_eq!(m.speed, AnimationSpeed::Slow);
            assert_eq!(m.frames, 4);
        }
    }

    #[test]
    fn pickups_follow_score_unless_forced() {
        assert!(classify(47).is_pickup);
        assert_eq!(classify(52).score, Some(500));
        // jetpack and gun carry no score but are still picked up
        assert!(classify(4).is_pickup && classify(4).score.is_none());
        assert!(classify(20).is_pickup && classify(20).score.is_none());
        // door is neither
        assert!(!classify(2).is_pickup);
    }

    #[test]
    fn animation_frames_share_descriptor() {
        assert!(classify(8).is(&FIRE));
        assert!(classify(14).is(&TROPHY));
        assert!(classify(28).is(&WATER));
        assert!(classify(120).is(&MONSTER_SILVER_SPINNER));
        assert!(classify(132).is(&EXPLOSION));
    }

    #[test]
    fn undeclared_codes_are_inert_with_own_base() {
        let deco = classify(42);
        assert_eq!(deco.base, 42);
        assert!(!deco.has_collision && !deco.is_pickup && !deco.is_hazard && !deco.climbable);
        assert_eq!(classify(200).base, 200);
    }

    #[test]
    fn declared_runs_do_not_overlap() {
        let all = declared();
        for (i, a) in all.iter().enumerate() {
            for b in &all[i + 1..] {
                let overlap = (a.base..a.base + a.frames).any(|c| b.contains(c));
                assert!(!overlap, "{} overlaps {}", a.name, b.name);
            }
        }
    }

    proptest! {
        #[test]
        fn classify_is_total_and_deterministic(code in any::<u8>()) {
            let a = classify(code);
            let b = classify(code);
            prop_assert_eq!(a, b);
            prop_assert!(a.contains(code));
        }

        #[test]
        fn declared_range_never_falls_back(idx in 0usize..ENTITIES.len(), off in 0u8..5) {
            let e = ENTITIES[idx];
            prop_assume!(off < e.frames);
            let got = classify(e.base + off);
            prop_assert!(got.is(&e));
            prop_assert_eq!(got.name, e.name);
        }
    }
}
