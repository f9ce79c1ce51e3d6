/// Events emitted during a simulation step.
/// The presentation layer consumes these for sound and status messages.

use crate::domain::tile::TileCode;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameEvent {
    LevelStarted { level: usize },
    ItemPicked { x: i32, y: i32, code: TileCode },
    ExtraLife { lives: u32 },
    ShotFired,
    EnemyShotFired { slot: usize },
    MonsterKilled { slot: usize },
    DaveKilled,
    LifeLost { lives_left: u32 },
    JetpackToggled { on: bool },
    LevelCleared { level: usize },
    GameWon { score: u32 },
    GameOver { score: u32 },
}
