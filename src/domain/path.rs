/// Monster patrol paths.
///
/// Each level carries one 256-byte buffer of signed (dx, dy) pairs shared by
/// all of its monsters; every monster keeps its own cursor into it. A pair
/// of end markers wraps the cursor back to the start.

use crate::domain::entity::ActiveMonster;

pub const PATH_LEN: usize = 256;

/// End-of-path marker.
pub const PATH_END: i8 = -6;
/// The same marker as stored in shipped level files (byte 0xEA).
pub const PATH_END_RAW: i8 = 0xEAu8 as i8;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PathTarget {
    Step(i8, i8),
    Wrap,
}

fn is_end(v: i8) -> bool {
    v == PATH_END || v == PATH_END_RAW
}

/// Decode the pair at `cursor`. Running off the buffer counts as a wrap.
pub fn read_target(path: &[i8; PATH_LEN], cursor: usize) -> PathTarget {
    match (path.get(cursor), path.get(cursor + 1)) {
        (Some(&dx), Some(&dy)) if is_end(dx) && is_end(dy) => PathTarget::Wrap,
        (Some(&dx), Some(&dy)) => PathTarget::Step(dx, dy),
        _ => PathTarget::Wrap,
    }
}

/// Consume the next leg. Returns (dx, dy, new cursor).
///
/// On wrap the first pair is re-read and the cursor is left at 0, so the
/// first leg of a cyclic patrol runs twice per lap.
pub fn next_leg(path: &[i8; PATH_LEN], cursor: usize) -> (i32, i32, usize) {
    match read_target(path, cursor) {
        PathTarget::Step(dx, dy) => (dx as i32, dy as i32, cursor + 2),
        PathTarget::Wrap => match read_target(path, 0) {
            PathTarget::Step(dx, dy) => (dx as i32, dy as i32, 0),
            PathTarget::Wrap => (0, 0, 0),
        },
    }
}

/// Take one pixel off a pending delta. Returns the movement to apply.
pub fn step_toward(pending: &mut i32) -> i32 {
    let s = pending.signum();
    *pending -= s;
    s
}

/// Advance a monster one tick along `path`, pulling a new leg when idle.
pub fn advance(m: &mut ActiveMonster, path: &[i8; PATH_LEN]) {
    if m.next_px == 0 && m.next_py == 0 {
        let (dx, dy, cursor) = next_leg(path, m.path_index);
        m.next_px = dx;
        m.next_py = dy;
        m.path_index = cursor;
    }
    m.px += step_toward(&mut m.next_px);
    m.py += step_toward(&mut m.next_py);
    m.sync_grid();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::Monster;
    use crate::domain::tile::MONSTER_SPIDER;

    fn path_of(pairs: &[(i8, i8)]) -> [i8; PATH_LEN] {
        let mut p = [0i8; PATH_LEN];
        for (i, &(dx, dy)) in pairs.iter().enumerate() {
            p[i * 2] = dx;
            p[i * 2 + 1] = dy;
        }
        p
    }

    #[test]
    fn sentinel_resets_cursor_to_zero() {
        let p = path_of(&[(3, 0), (PATH_END, PATH_END), (0, 4)]);
        assert_eq!(next_leg(&p, 0), (3, 0, 2));
        // cursor stays at 0 after the wrap, not 2
        assert_eq!(next_leg(&p, 2), (3, 0, 0));
    }

    #[test]
    fn raw_file_marker_also_wraps() {
        let p = path_of(&[(5, 1), (PATH_END_RAW, PATH_END_RAW)]);
        assert_eq!(read_target(&p, 2), PathTarget::Wrap);
    }

    #[test]
    fn half_sentinel_is_a_step() {
        let p = path_of(&[(PATH_END, 2)]);
        assert_eq!(read_target(&p, 0), PathTarget::Step(-6, 2));
    }

    #[test]
    fn cursor_past_buffer_wraps() {
        let p = path_of(&[(1, 1)]);
        assert_eq!(read_target(&p, 255), PathTarget::Wrap);
        assert_eq!(next_leg(&p, 256), (1, 1, 0));
    }

    #[test]
    fn monster_moves_diagonally_one_pixel_per_axis() {
        let p = path_of(&[(2, -3), (PATH_END, PATH_END)]);
        let mut m = Monster::spawn(MONSTER_SPIDER, 4, 4);
        let m = m.active_mut().unwrap();
        advance(m, &p);
        assert_eq!((m.px, m.py), (65, 63));
        assert_eq!((m.x, m.y), (4, 3));
        assert_eq!((m.next_px, m.next_py), (1, -2));
        advance(m, &p);
        advance(m, &p);
        assert_eq!((m.px, m.py), (66, 61));
        assert_eq!((m.next_px, m.next_py), (0, 0));
        // next tick wraps and replays the first leg
        advance(m, &p);
        assert_eq!(m.path_index, 0);
        assert_eq!((m.px, m.py), (67, 60));
    }
}
