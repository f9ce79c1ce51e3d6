/// The step function: advances the game by one tick.
///
/// Processing order (Gameplay mode):
///   1. Collision probes (latch door / pickup / hazard)
///   2. Pickup resolution
///   3. Dave's bullet, then the enemy bullet
///   4. Input validation (intents → moves)
///   5. Dave movement
///   6. Monster movement, then monster firing
///   7. Viewport scroll
///   8. Gravity
///
/// Then, in every mode: level bookkeeping (timers, door, deaths, monster
/// contact) and the intent reset.
///
/// Probing is not side-effect free: `is_clear` with `is_dave` set latches
/// door and pickup contact and starts the hazard death countdown.

use crate::domain::entity::{Direction, Intents, Monster, Projectile};
use crate::domain::path;
use crate::domain::physics::{
    is_visible, on_grid, settle, CLIMB_POINT, FOOT_LEFT, FOOT_RIGHT, GRAVITY_POINT, GRID_H,
    HEAD_LEFT, HEAD_RIGHT, PROBES, TILE_SIZE,
};
use crate::domain::rules::{
    self, BULLET_SPEED, DAVE_SPEED, DEATH_TICKS, DOOR_BONUS, FALL_SPEED, JETPACK_FUEL,
    JETPACK_TOGGLE_DELAY, JUMP_TICKS, LEVEL_COUNT, MAX_VIEW_X, MONSTER_SLOTS, SCROLL_LEFT_EDGE,
    SCROLL_RIGHT_EDGE, SCROLL_STEP, VIEW_W,
};
use crate::domain::tile::{classify, DOOR, EMPTY, GUN, JETPACK, TROPHY};
use super::driver::Action;
use super::event::GameEvent;
use super::world::{GameState, Mode, RunOutcome};

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

/// Latch this tick's intents from whatever the input source reports held.
pub fn latch_input(state: &mut GameState, held: impl Fn(Action) -> bool) {
    state.dave.intents = Intents {
        left: held(Action::Left),
        right: held(Action::Right),
        up: held(Action::Up),
        down: held(Action::Down),
        fire: held(Action::Fire),
        jetpack: held(Action::Jetpack),
        start: held(Action::Start),
    };
}

pub fn step(state: &mut GameState) -> Vec<GameEvent> {
    let mut events = Vec::new();
    if state.is_over() {
        return events;
    }
    let was_dying = state.dave.is_dying();

    if state.mode == Mode::Title {
        let i = state.dave.intents;
        if i.start || i.fire || i.jetpack {
            state.mode = Mode::Gameplay;
            start_level(state, &mut events);
            // leaving the title consumes this tick's input
            state.dave.intents = Intents::default();
        }
    }

    if state.mode == Mode::Gameplay {
        check_collision(state);
        resolve_pickup(state, &mut events);
        update_dave_bullet(state, &mut events);
        update_enemy_bullet(state);
        verify_input(state, &mut events);
        move_dave(state, &mut events);
        move_monsters(state);
        fire_monsters(state, &mut events);
        scroll_screen(state);
        apply_gravity(state);
    }

    update_level(state, &mut events);

    if !was_dying && state.dave.is_dying() {
        log::debug!("dave hit at ({}, {})", state.dave.x, state.dave.y);
        events.push(GameEvent::DaveKilled);
    }
    state.dave.intents = Intents::default();
    events
}

// ══════════════════════════════════════════════════════════════
// Level setup
// ══════════════════════════════════════════════════════════════

/// Enter `current_level` from scratch: spawn cell, monsters, per-level
/// inventory, viewport, bullets.
pub fn start_level(state: &mut GameState, events: &mut Vec<GameEvent>) {
    restart_level(state);

    state.monsters = Default::default();
    for (slot, s) in rules::monster_spawns(state.current_level)
        .iter()
        .take(MONSTER_SLOTS)
        .enumerate()
    {
        state.monsters[slot] = Monster::spawn(s.kind, s.x, s.y);
    }

    let d = &mut state.dave;
    d.fire = false;
    d.jetpack = false;
    d.dead_timer = 0;
    d.trophy = false;
    d.gun = false;
    d.jetpack_fuel = 0;
    state.check_door = false;
    state.check_pickup = None;
    state.view_x = 0;
    state.scroll_x = 0;
    state.dave_bullet = None;
    state.enemy_bullet = None;

    log::info!("level {} started", state.current_level + 1);
    events.push(GameEvent::LevelStarted { level: state.current_level });
}

/// Put Dave back on the level's start cell. Inventory and tiles are kept.
pub fn restart_level(state: &mut GameState) {
    let (x, y) = rules::start_cell(state.current_level);
    let d = &mut state.dave;
    d.place(x, y);
    d.jump = false;
    d.jump_timer = 0;
    d.climb = false;
    d.jetpack = false;
}

// ══════════════════════════════════════════════════════════════
// Collision probes
// ══════════════════════════════════════════════════════════════

/// Is pixel (px, py) traversable? Off-grid is always clear.
/// With `is_dave`, touching a door, pickup or hazard is latched.
pub fn is_clear(state: &mut GameState, px: i32, py: i32, is_dave: bool) -> bool {
    let (x, y) = (on_grid(px), on_grid(py));
    let Some(code) = state.level().tile(x, y) else {
        return true;
    };
    let e = classify(code);
    if e.has_collision {
        return false;
    }
    if is_dave {
        if e.is(&DOOR) {
            state.check_door = true;
        } else if e.is_pickup {
            state.check_pickup = Some((x, y));
        } else if e.is_hazard && !state.dave.is_dying() {
            state.dave.dead_timer = DEATH_TICKS;
        }
    }
    true
}

fn check_collision(state: &mut GameState) {
    let (px, py) = (state.dave.px, state.dave.py);
    let mut probes = [true; 8];
    for (clear, (ox, oy)) in probes.iter_mut().zip(PROBES) {
        *clear = is_clear(state, px + ox, py + oy, true);
    }
    let climbable = state
        .entity_at(px + CLIMB_POINT.0, py + CLIMB_POINT.1)
        .climbable;

    let d = &mut state.dave;
    d.probes = probes;
    d.on_ground = (!probes[FOOT_RIGHT] && !probes[FOOT_LEFT]) || d.climb;
    d.can_climb = climbable;
    if !climbable {
        d.climb = false;
    }
}

// ══════════════════════════════════════════════════════════════
// Pickups and scoring
// ══════════════════════════════════════════════════════════════

fn award(state: &mut GameState, points: u32, events: &mut Vec<GameEvent>) {
    let earned = state.add_score(points);
    if earned > 0 {
        log::info!("extra life at {} points ({} lives)", state.score, state.lives);
        events.push(GameEvent::ExtraLife { lives: state.lives });
    }
}

fn resolve_pickup(state: &mut GameState, events: &mut Vec<GameEvent>) {
    let Some((x, y)) = state.check_pickup.take() else {
        return;
    };
    let Some(code) = state.level().tile(x, y) else {
        return;
    };
    let e = classify(code);
    if let Some(points) = e.score {
        award(state, points, events);
    }
    if e.is(&JETPACK) {
        state.dave.jetpack_fuel = JETPACK_FUEL;
    } else if e.is(&TROPHY) {
        state.dave.trophy = true;
    } else if e.is(&GUN) {
        state.dave.gun = true;
    }
    state.level_mut().set_tile(x, y, EMPTY.base);

    log::debug!("picked up {} at ({x}, {y})", e.name);
    events.push(GameEvent::ItemPicked { x, y, code });
}

// ══════════════════════════════════════════════════════════════
// Projectiles
// ══════════════════════════════════════════════════════════════

fn update_dave_bullet(state: &mut GameState, events: &mut Vec<GameEvent>) {
    let Some(mut b) = state.dave_bullet else {
        return;
    };
    if !is_clear(state, b.px, b.py, false) {
        state.dave_bullet = None;
        return;
    }
    // hit test uses the cell before this tick's move
    let (gx, gy) = (on_grid(b.px), on_grid(b.py));
    if !(1..=VIEW_W).contains(&(gx - state.view_x)) {
        state.dave_bullet = None;
        return;
    }
    b.px += b.dir.sign() * BULLET_SPEED;

    let hit = state.monsters.iter_mut().enumerate().find_map(|(slot, m)| {
        let a = m.active_mut()?;
        let inside = (gy == a.y || gy == a.y + 1) && (gx == a.x || gx == a.x + 1);
        if a.is_dying() || !inside {
            return None;
        }
        a.dead_timer = DEATH_TICKS;
        Some((slot, a.kind.score.unwrap_or(0)))
    });

    match hit {
        Some((slot, points)) => {
            state.dave_bullet = None;
            award(state, points, events);
            log::debug!("monster {slot} shot");
            events.push(GameEvent::MonsterKilled { slot });
        }
        None => state.dave_bullet = Some(b),
    }
}

fn update_enemy_bullet(state: &mut GameState) {
    let Some(mut b) = state.enemy_bullet else {
        return;
    };
    if !is_clear(state, b.px, b.py, false) || !is_visible(b.px, state.view_x) {
        state.enemy_bullet = None;
        return;
    }
    b.px += b.dir.sign() * BULLET_SPEED;
    if on_grid(b.px) == state.dave.x && on_grid(b.py) == state.dave.y {
        state.enemy_bullet = None;
        state.dave.dead_timer = DEATH_TICKS;
        return;
    }
    state.enemy_bullet = Some(b);
}

// ══════════════════════════════════════════════════════════════
// Dave
// ══════════════════════════════════════════════════════════════

fn verify_input(state: &mut GameState, events: &mut Vec<GameEvent>) {
    let m = rules::validate(&state.dave, state.dave_bullet.is_some());
    let d = &mut state.dave;
    d.right |= m.right;
    d.left |= m.left;
    d.jump |= m.jump;
    d.up |= m.up;
    d.climb |= m.climb;
    d.fire |= m.fire;
    d.down |= m.down;
    if m.toggle_jetpack {
        d.jetpack = !d.jetpack;
        d.jetpack_delay = JETPACK_TOGGLE_DELAY;
        log::debug!("jetpack {}", if d.jetpack { "on" } else { "off" });
        events.push(GameEvent::JetpackToggled { on: d.jetpack });
    }
}

fn move_dave(state: &mut GameState, events: &mut Vec<GameEvent>) {
    let d = &mut state.dave;
    d.x = on_grid(d.px);
    d.y = on_grid(d.py);
    // fell out the bottom: re-enter from above the top row
    if d.y >= GRID_H {
        d.y = 0;
        d.py = -TILE_SIZE;
    }

    if d.right {
        d.px += DAVE_SPEED;
        d.last_dir = Direction::Right;
        state.dave_tick = state.dave_tick.wrapping_add(1);
        d.right = false;
    }
    if d.left {
        d.px -= DAVE_SPEED;
        d.last_dir = Direction::Left;
        state.dave_tick = state.dave_tick.wrapping_add(1);
        d.left = false;
    }
    if d.down {
        d.py += DAVE_SPEED;
        d.down = false;
    }
    if d.up {
        d.py -= DAVE_SPEED;
        d.up = false;
    }

    if d.jump {
        if d.jump_timer == 0 {
            d.jump_timer = JUMP_TICKS;
            d.last_dir = Direction::Neutral;
        }
        if d.probe(HEAD_LEFT) && d.probe(HEAD_RIGHT) {
            d.py -= rules::jump_rise(d.jump_timer);
        }
        d.jump_timer -= 1;
        if d.jump_timer == 0 {
            d.jump = false;
        }
    }

    if d.fire {
        d.fire = false;
        state.dave_bullet = Some(Projectile::fired_from(d.px, d.py, d.last_dir));
        events.push(GameEvent::ShotFired);
    }
}

fn apply_gravity(state: &mut GameState) {
    let d = &state.dave;
    if d.jump || d.on_ground || d.jetpack || d.climb {
        return;
    }
    let (px, py) = (d.px + GRAVITY_POINT.0, d.py + GRAVITY_POINT.1);
    if is_clear(state, px, py, true) {
        state.dave.py += FALL_SPEED;
    } else {
        state.dave.py = settle(state.dave.py);
    }
}

// ══════════════════════════════════════════════════════════════
// Monsters
// ══════════════════════════════════════════════════════════════

fn move_monsters(state: &mut GameState) {
    let route = &state.store.level(state.current_level).path;
    for m in state.monsters.iter_mut().filter_map(Monster::active_mut) {
        if !m.is_dying() {
            path::advance(m, route);
        }
    }
}

/// The enemy bullet slot is shared: when it is free, the last visible
/// living monster fires toward Dave's side.
fn fire_monsters(state: &mut GameState, events: &mut Vec<GameEvent>) {
    if state.enemy_bullet.is_some() {
        return;
    }
    let view_x = state.view_x;
    let shooter = state
        .monsters
        .iter()
        .enumerate()
        .filter_map(|(slot, m)| m.active().map(|a| (slot, a.px, a.py, a.is_dying())))
        .filter(|&(_, px, _, dying)| !dying && is_visible(px, view_x))
        .last();

    if let Some((slot, px, py, _)) = shooter {
        let dir = if state.dave.px < px { Direction::Left } else { Direction::Right };
        state.enemy_bullet = Some(Projectile::fired_from(px, py, dir));
        events.push(GameEvent::EnemyShotFired { slot });
    }
}

// ══════════════════════════════════════════════════════════════
// Viewport
// ══════════════════════════════════════════════════════════════

fn scroll_screen(state: &mut GameState) {
    let rel = state.dave.x - state.view_x;
    if rel >= SCROLL_RIGHT_EDGE {
        state.scroll_x = SCROLL_STEP;
    }
    if rel < SCROLL_LEFT_EDGE {
        state.scroll_x = -SCROLL_STEP;
    }

    if state.scroll_x > 0 {
        if state.view_x == MAX_VIEW_X {
            state.scroll_x = 0;
        } else {
            state.view_x += 1;
            state.scroll_x -= 1;
        }
    }
    if state.scroll_x < 0 {
        if state.view_x == 0 {
            state.scroll_x = 0;
        } else {
            state.view_x -= 1;
            state.scroll_x += 1;
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Bookkeeping
// ══════════════════════════════════════════════════════════════

fn update_level(state: &mut GameState, events: &mut Vec<GameEvent>) {
    state.tick = state.tick.wrapping_add(1);

    let d = &mut state.dave;
    d.jetpack_delay = d.jetpack_delay.saturating_sub(1);
    if d.jetpack {
        d.jetpack_fuel = d.jetpack_fuel.saturating_sub(1);
        if d.jetpack_fuel == 0 {
            d.jetpack = false;
            events.push(GameEvent::JetpackToggled { on: false });
        }
    }

    if state.check_door {
        if state.dave.trophy {
            award(state, DOOR_BONUS, events);
            events.push(GameEvent::LevelCleared { level: state.current_level });
            if state.current_level + 1 < LEVEL_COUNT {
                state.current_level += 1;
                start_level(state, events);
            } else {
                finish(state, RunOutcome::Won { score: state.score }, events);
            }
        } else {
            state.check_door = false;
        }
    }

    if !state.is_over() && state.dave.is_dying() {
        state.dave.dead_timer -= 1;
        if !state.dave.is_dying() {
            if state.lives > 0 {
                state.lives -= 1;
                restart_level(state);
                log::info!("life lost, {} left", state.lives);
                events.push(GameEvent::LifeLost { lives_left: state.lives });
            } else {
                finish(state, RunOutcome::GameOver { score: state.score }, events);
            }
        }
    }

    let (dave_x, dave_y) = (state.dave.x, state.dave.y);
    let mut contact = false;
    for (slot, m) in state.monsters.iter_mut().enumerate() {
        let Some(a) = m.active_mut() else { continue };
        if a.is_dying() {
            a.dead_timer -= 1;
            if a.dead_timer == 0 {
                *m = Monster::Inactive;
            }
        } else if a.x == dave_x && a.y == dave_y {
            a.dead_timer = DEATH_TICKS;
            contact = true;
            events.push(GameEvent::MonsterKilled { slot });
        }
    }
    if contact {
        state.dave.dead_timer = DEATH_TICKS;
    }
}

fn finish(state: &mut GameState, outcome: RunOutcome, events: &mut Vec<GameEvent>) {
    state.quit = true;
    state.outcome = Some(outcome);
    match outcome {
        RunOutcome::Won { score } => {
            log::info!("run won with {score} points");
            events.push(GameEvent::GameWon { score });
        }
        RunOutcome::GameOver { score } => {
            log::info!("game over with {score} points");
            events.push(GameEvent::GameOver { score });
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Tests
// ══════════════════════════════════════════════════════════════
