/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Compose the next frame into `front` (array of Cell)
///   2. Compare each cell with `back` (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// Every tile is two terminal columns wide. Sprite codes are resolved
/// through the frame resolver and range-checked before they are drawn;
/// an out-of-table code aborts the frame with `SimError::SpriteOutOfRange`.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::entity::{Direction, Monster, Projectile};
use crate::domain::frame::{self, DavePose};
use crate::domain::physics::{on_grid, GRID_H};
use crate::domain::rules::{JETPACK_FUEL, VIEW_W};
use crate::domain::tile::{classify, TileCode, EXPLOSION};
use crate::error::SimError;
use crate::sim::driver::Presenter;
use crate::sim::event::GameEvent;
use crate::sim::level::{TITLE_H, TITLE_W};
use crate::sim::world::{GameState, Mode, RunOutcome};

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit dark background for every cell, so the gaps between
    /// terminal rows match the cell colour.
    const BASE_BG: Color = Color::Rgb { r: 12, g: 12, b: 24 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Sentinel used to invalidate the back buffer.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        let bg = match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        };
        Cell { ch, fg, bg }
    }
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![Cell::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            self.set(x + i, y, Cell::new(ch, fg, bg));
        }
    }

    #[cfg(test)]
    fn row_text(&self, y: usize) -> String {
        (0..self.width).map(|x| self.get(x, y).ch).collect()
    }
}

// ── Glyphs ──

/// Two-column picture of one tile or sprite.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Glyph {
    text: [char; 2],
    fg: Color,
}

const fn g(a: char, b: char, fg: Color) -> Glyph {
    Glyph { text: [a, b], fg }
}

const HAZARD: Color = Color::Rgb { r: 255, g: 90, b: 30 };
const GOLD: Color = Color::Rgb { r: 250, g: 210, b: 40 };
const BARK: Color = Color::Rgb { r: 150, g: 100, b: 50 };

/// Picture for a resolved sprite code. Animated descriptors pick a
/// variant from the frame offset within their run.
fn glyph(code: TileCode) -> Glyph {
    let entity = classify(code);
    let phase = (code - entity.base) as usize;
    match entity.base {
        0 => g(' ', ' ', Color::White),
        1 => g('▓', '▓', Color::Grey),
        2 => g('[', ']', Color::DarkYellow),
        3 => g('=', '=', Color::DarkYellow),
        4 => g('J', 'P', Color::Cyan),
        5 | 19 => g('█', '█', Color::Blue),
        6 => [g('^', '^', HAZARD), g('^', '\'', HAZARD), g('\'', '\'', HAZARD), g('\'', '^', HAZARD)][phase % 4],
        10 => [g('\\', '/', GOLD), g('\\', '*', GOLD), g('*', '*', GOLD), g('*', '/', GOLD), g('\\', '/', GOLD)][phase % 5],
        15 => g('═', '═', Color::Grey),
        16 => g('║', ' ', Color::Grey),
        17 => g('▓', '▓', Color::DarkRed),
        18 => g('▒', '▒', BARK),
        20 => g('¬', '=', Color::Grey),
        21 => g('◢', '█', Color::Grey),
        22 => g('█', '◣', Color::Grey),
        23 | 24 => g('▐', '▌', Color::Grey),
        25 => [g('~', '~', Color::Blue), g('≈', '~', Color::Blue), g('~', '≈', Color::Blue), g('≈', '≈', Color::Blue)][phase % 4],
        29 => g('▬', '▬', Color::Magenta),
        30 => g('▓', '▓', Color::Magenta),
        33 => g('▐', '▌', BARK),
        34 => g('▐', '─', Color::DarkGreen),
        35 => g('─', '▌', Color::DarkGreen),
        36 => [g(',', ',', Color::Green), g(';', ',', Color::Green), g(',', ';', Color::Green), g(';', ';', Color::Green)][phase % 4],
        41 => g('·', '*', Color::White),
        47 => g('<', '>', Color::Cyan),
        48 => g('(', ')', Color::Magenta),
        49 => g('<', '>', Color::Red),
        50 => g('W', 'W', GOLD),
        51 => g('o', '°', GOLD),
        52 => g('/', '*', Color::Magenta),
        89 | 93 | 97 | 101 | 105 | 109 | 113 | 117 => {
            let fg = MONSTER_COLORS[((entity.base - 89) / 4) as usize];
            if phase % 2 == 0 { g('}', '{', fg) } else { g('{', '}', fg) }
        }
        129 => [g('*', '*', GOLD), g('#', '#', HAZARD), g('%', '%', HAZARD), g(':', ':', Color::DarkGrey)][phase % 4],
        144 => [g('D', 'D', HAZARD), g('D', 'd', HAZARD), g('d', 'd', GOLD), g('d', 'D', GOLD)][phase % 4],
        53..=55 => g('@', '>', Color::White),
        56 => g('@', '@', Color::White),
        57..=59 => g('<', '@', Color::White),
        67 => g('@', '/', Color::White),
        68 => g('\\', '@', Color::White),
        71..=73 => [g('@', '|', Color::White), g('|', '@', Color::White)][phase % 2],
        77..=79 => g('@', '»', Color::Cyan),
        80..=82 => g('«', '@', Color::Cyan),
        121..=123 => g('=', '>', HAZARD),
        124..=126 => g('<', '=', HAZARD),
        127 => g('-', '>', Color::White),
        128 => g('<', '-', Color::White),
        _ => g('·', ' ', Color::DarkGrey),
    }
}

const MONSTER_COLORS: [Color; 8] = [
    Color::Grey,
    Color::Magenta,
    Color::Red,
    Color::Green,
    Color::Grey,
    Color::DarkRed,
    Color::Green,
    Color::White,
];

// ── Layout ──

const CELL_W: usize = 2;
const VIEW_COLS: usize = VIEW_W as usize * CELL_W;
const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;
const STATUS_ROW: usize = MAP_ROW + GRID_H as usize + 1;
const BANNER_ROW: usize = STATUS_ROW + 2;
const HELP_ROW: usize = BANNER_ROW + 2;

const HUD_BG: Color = Color::Rgb { r: 20, g: 20, b: 60 };
const BANNER_TICKS: u32 = 45;
const HELP: &str = " ←→:Move  ↑:Jump/Climb  Z:Fire  X:Jetpack  Esc:Quit";

// ── Renderer ──

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_mode: Option<Mode>,
    enhanced_keys: bool,
    /// Transient message and the ticks it has left.
    banner: Option<(String, u32)>,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_mode: None,
            enhanced_keys: false,
            banner: None,
        }
    }

    /// Enter raw mode on the alternate screen. Returns whether the
    /// terminal reports key releases.
    pub fn init(&mut self) -> io::Result<bool> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        if terminal::supports_keyboard_enhancement().unwrap_or(false) {
            execute!(
                self.writer,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
            self.enhanced_keys = true;
        }
        log::debug!("keyboard release events: {}", self.enhanced_keys);

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.resize(tw as usize, th as usize);
        Ok(self.enhanced_keys)
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        if self.enhanced_keys {
            execute!(self.writer, PopKeyboardEnhancementFlags)?;
        }
        execute!(self.writer, ResetColor, cursor::Show, terminal::LeaveAlternateScreen)?;
        terminal::disable_raw_mode()
    }

    fn resize(&mut self, w: usize, h: usize) {
        self.term_w = w;
        self.term_h = h;
        self.front.resize(w, h);
        self.back.resize(w, h);
        // Force full repaint: back ≠ front for every cell.
        self.back.cells.fill(Cell::INVALID);
    }

    pub fn render(&mut self, state: &GameState, events: &[GameEvent]) -> Result<(), SimError> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.resize(tw as usize, th as usize);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        if self.last_mode != Some(state.mode) {
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
            self.last_mode = Some(state.mode);
        }

        self.note_events(events);
        self.compose(state)?;
        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    /// Pick up banner text from this tick's events, and age the old one.
    fn note_events(&mut self, events: &[GameEvent]) {
        if let Some((_, left)) = &mut self.banner {
            *left = left.saturating_sub(1);
        }
        if matches!(self.banner, Some((_, 0))) {
            self.banner = None;
        }
        for event in events {
            let text = match event {
                GameEvent::LevelStarted { level } => format!("LEVEL {}", level + 1),
                GameEvent::ExtraLife { .. } => "EXTRA LIFE!".to_string(),
                GameEvent::DaveKilled => "OUCH!".to_string(),
                GameEvent::LevelCleared { .. } => "GOOD WORK! ONLY ONE MORE TO GO".to_string(),
                GameEvent::GameWon { .. } => "CONGRATULATIONS! YOU MADE IT!".to_string(),
                GameEvent::GameOver { .. } => "GAME OVER".to_string(),
                _ => continue,
            };
            self.banner = Some((text, BANNER_TICKS));
        }
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut cursor_at: Option<(usize, usize)> = None;

        queue!(self.writer, SetForegroundColor(last_fg), SetBackgroundColor(last_bg))?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    continue;
                }
                if cursor_at != Some((x, y)) {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }
                queue!(self.writer, Print(cell.ch))?;
                cursor_at = Some((x + 1, y));
            }
        }

        self.writer.flush()
    }

    // ── Compose: build front buffer content ──

    fn compose(&mut self, state: &GameState) -> Result<(), SimError> {
        self.front.clear();
        match state.mode {
            Mode::Title => self.compose_title(state)?,
            Mode::Gameplay => self.compose_game(state)?,
        }
        if let Some((text, _)) = &self.banner {
            let text = format!(" {text} ");
            let col = VIEW_COLS.saturating_sub(text.chars().count()) / 2;
            self.front.put_str(col, BANNER_ROW, &text, Color::Black, GOLD);
        }
        self.front.put_str(0, HELP_ROW, HELP, Color::DarkGrey, Color::Reset);
        Ok(())
    }

    /// Draw one resolved sprite at a map cell. `x`/`y` locate the sprite
    /// in the level for the error report.
    fn draw_sprite(
        &mut self,
        code: TileCode,
        col: usize,
        row: usize,
        at: (i32, i32),
        tick: u64,
    ) -> Result<(), SimError> {
        let code = frame::checked(code, at.0, at.1, tick)?;
        let glyph = glyph(code);
        for (i, ch) in glyph.text.into_iter().enumerate() {
            self.front.set(col * CELL_W + i, row, Cell::new(ch, glyph.fg, Color::Reset));
        }
        Ok(())
    }

    fn compose_title(&mut self, state: &GameState) -> Result<(), SimError> {
        let left = (VIEW_W as usize - TITLE_W) / 2;
        for ty in 0..TITLE_H {
            for tx in 0..TITLE_W {
                let code = state.store.title_tile(tx, ty);
                let sprite = frame::frame(&classify(code), state.tick, tx as u64);
                self.draw_sprite(sprite, left + tx, MAP_ROW + ty, (tx as i32, ty as i32), state.tick)?;
            }
        }
        let prompt = "PRESS ENTER TO START";
        let col = (VIEW_COLS - prompt.len()) / 2;
        self.front.put_str(col, MAP_ROW + TITLE_H + 1, prompt, GOLD, Color::Reset);
        Ok(())
    }

    fn compose_game(&mut self, state: &GameState) -> Result<(), SimError> {
        self.compose_hud(state)?;

        // ── Map ──
        let level = state.level();
        for row in 0..GRID_H {
            for col in 0..VIEW_W {
                let x = state.view_x + col;
                let code = level.tile(x, row).unwrap_or(0);
                let sprite = frame::frame(&classify(code), state.tick, x as u64);
                self.draw_sprite(sprite, col as usize, MAP_ROW + row as usize, (x, row), state.tick)?;
            }
        }

        // ── Actors ──
        for (slot, monster) in state.monsters.iter().enumerate() {
            let Monster::Active(m) = monster else { continue };
            let code = if m.is_dying() {
                frame::frame(&EXPLOSION, state.tick, slot as u64)
            } else {
                frame::frame(&m.kind, state.tick, 0)
            };
            self.draw_actor(state, code, m.x, m.y)?;
        }

        let d = &state.dave;
        let code = if d.is_dying() {
            frame::frame(&EXPLOSION, state.tick, 0)
        } else {
            let pose = DavePose {
                facing: d.last_dir,
                flying: d.jetpack,
                climbing: d.climb,
                airborne: d.jump || !d.on_ground,
            };
            frame::dave_frame(pose, state.dave_tick, state.tick)
        };
        self.draw_actor(state, code, d.x, d.y)?;

        if let Some(b) = state.dave_bullet {
            let code = bullet_sprite(&b, frame::DAVE_BULLET_LEFT, frame::DAVE_BULLET_RIGHT);
            self.draw_actor(state, code, on_grid(b.px), on_grid(b.py))?;
        }
        if let Some(b) = state.enemy_bullet {
            let code = bullet_sprite(&b, frame::MONSTER_BULLET_LEFT, frame::MONSTER_BULLET_RIGHT);
            self.draw_actor(state, code, on_grid(b.px), on_grid(b.py))?;
        }

        self.compose_status(state);
        if let Some(outcome) = state.outcome {
            let text = match outcome {
                RunOutcome::Won { score } => format!(" YOU WIN!  FINAL SCORE {score} "),
                RunOutcome::GameOver { score } => format!(" GAME OVER  FINAL SCORE {score} "),
            };
            let col = VIEW_COLS.saturating_sub(text.len()) / 2;
            self.front.put_str(col, MAP_ROW + GRID_H as usize / 2, &text, Color::White, Color::DarkRed);
        }
        Ok(())
    }

    /// Draw an actor at grid cell (x, y) if it is inside the viewport.
    fn draw_actor(&mut self, state: &GameState, code: TileCode, x: i32, y: i32) -> Result<(), SimError> {
        let col = x - state.view_x;
        if !(0..VIEW_W).contains(&col) || !(0..GRID_H).contains(&y) {
            return Ok(());
        }
        self.draw_sprite(code, col as usize, MAP_ROW + y as usize, (x, y), state.tick)
    }

    fn compose_hud(&mut self, state: &GameState) -> Result<(), SimError> {
        let mut score = String::with_capacity(5);
        for code in frame::score_digits(state.score) {
            let code = frame::checked(code, 0, 0, state.tick)?;
            score.push(char::from(b'0' + (code - frame::UI_DIGIT_0)));
        }
        let lives: String = "☺ ".repeat(state.lives.min(10) as usize);
        let hud = format!(
            " SCORE {score}   LEVEL {:>2}   DAVES {lives}",
            state.current_level + 1
        );
        for x in 0..VIEW_COLS.max(hud.chars().count()) {
            self.front.set(x, HUD_ROW, Cell::new(' ', Color::White, HUD_BG));
        }
        self.front.put_str(0, HUD_ROW, &hud, Color::White, HUD_BG);
        Ok(())
    }

    fn compose_status(&mut self, state: &GameState) {
        let d = &state.dave;
        let mut col = 1;
        if d.jetpack_fuel > 0 {
            const BAR: usize = 16;
            let filled = (d.jetpack_fuel as usize * BAR).div_ceil(JETPACK_FUEL as usize);
            let bar = format!("JETPACK [{}{}]", "█".repeat(filled), " ".repeat(BAR - filled));
            let fg = if d.jetpack { Color::Cyan } else { Color::DarkCyan };
            self.front.put_str(col, STATUS_ROW, &bar, fg, Color::Reset);
            col += bar.chars().count() + 2;
        }
        if d.gun {
            self.front.put_str(col, STATUS_ROW, "GUN", Color::White, Color::Reset);
        }
        if d.trophy {
            self.front.put_str(1, STATUS_ROW + 1, "GO THRU THE DOOR!", GOLD, Color::Reset);
        }
    }
}

fn bullet_sprite(b: &Projectile, left: TileCode, right: TileCode) -> TileCode {
    if b.dir == Direction::Left { left } else { right }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Presenter for Renderer {
    fn present(&mut self, state: &GameState, events: &[GameEvent]) -> Result<(), SimError> {
        self.render(state, events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::rules::LEVEL_COUNT;
    use crate::domain::tile::TILE_COUNT;
    use crate::sim::level::{Level, LevelStore, TITLE_LEN};

    fn state(rows: &[&str]) -> GameState {
        let store =
            LevelStore::from_parts(vec![Level::from_rows(rows); LEVEL_COUNT], [0; TITLE_LEN]).unwrap();
        let mut s = GameState::new(store);
        s.mode = Mode::Gameplay;
        s.dave.place(3, 8);
        s.dave.on_ground = true;
        s
    }

    fn composed(s: &GameState) -> Renderer {
        let mut r = Renderer::new();
        r.front.resize(60, HELP_ROW + 1);
        r.compose(s).unwrap();
        r
    }

    #[test]
    fn every_table_code_has_a_glyph() {
        for code in 0..TILE_COUNT as TileCode {
            let gl = glyph(code);
            assert!(gl.text.iter().all(|c| !c.is_control()), "code {code}");
        }
    }

    #[test]
    fn map_and_dave_drawn_two_columns_per_tile() {
        let mut rows = [""; 10];
        rows[9] = "####################";
        let s = state(&rows);
        let r = composed(&s);
        let floor = r.front.row_text(MAP_ROW + 9);
        assert!(floor.starts_with(&"▓".repeat(40)));
        let dave_row = r.front.row_text(MAP_ROW + 8);
        assert_eq!(&dave_row.chars().skip(6).take(2).collect::<String>(), "@@");
    }

    #[test]
    fn hud_shows_padded_score_and_level() {
        let mut s = state(&[]);
        s.score = 1250;
        s.current_level = 4;
        let r = composed(&s);
        let hud = r.front.row_text(HUD_ROW);
        assert!(hud.contains("SCORE 01250"));
        assert!(hud.contains("LEVEL  5"));
    }

    #[test]
    fn corrupt_tile_aborts_frame() {
        let mut s = state(&[]);
        s.level_mut().set_tile(5, 2, 200);
        let mut r = Renderer::new();
        r.front.resize(60, HELP_ROW + 1);
        match r.compose(&s) {
            Err(SimError::SpriteOutOfRange { code, x, y, .. }) => {
                assert_eq!((code, x, y), (200, 5, 2));
            }
            other => panic!("expected sprite error, got {other:?}"),
        }
    }

    #[test]
    fn off_screen_actors_are_skipped() {
        let mut s = state(&[]);
        s.dave.place(40, 8);
        let r = composed(&s);
        assert!(!r.front.row_text(MAP_ROW + 8).contains('@'));
    }

    #[test]
    fn banner_expires() {
        let mut r = Renderer::new();
        r.note_events(&[GameEvent::ExtraLife { lives: 4 }]);
        assert!(r.banner.is_some());
        for _ in 0..BANNER_TICKS {
            r.note_events(&[]);
        }
        assert!(r.banner.is_none());
    }

    #[test]
    fn trophy_message_and_gun() {
        let mut s = state(&[]);
        s.dave.trophy = true;
        s.dave.gun = true;
        let r = composed(&s);
        assert!(r.front.row_text(STATUS_ROW).contains("GUN"));
        assert!(r.front.row_text(STATUS_ROW + 1).contains("GO THRU THE DOOR!"));
    }
}
