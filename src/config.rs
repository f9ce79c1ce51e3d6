/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to defaults if the file is missing, incomplete or broken.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::domain::rules::START_LIVES;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub levels_dir: PathBuf,
    pub log_level: String,
    pub start_lives: u32,
    pub tick_rate_ms: u64,
    pub gamepad: GamepadConfig,
    pub sound_enabled: bool,
}

/// Gamepad button names per action (A B X Y L1 R1 L2 R2 Start Select).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GamepadConfig {
    pub fire: Vec<String>,
    pub jetpack: Vec<String>,
    pub start: Vec<String>,
    pub quit: Vec<String>,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    general: TomlGeneral,
    #[serde(default)]
    speed: TomlSpeed,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    sound: TomlSound,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_levels_dir")]
    levels_dir: String,
    #[serde(default = "default_log_level")]
    log_level: String,
    #[serde(default = "default_start_lives")]
    start_lives: u32,
}

#[derive(Deserialize, Debug)]
struct TomlSpeed {
    #[serde(default = "default_tick_rate")]
    tick_rate_ms: u64,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_fire")]
    fire: Vec<String>,
    #[serde(default = "default_jetpack")]
    jetpack: Vec<String>,
    #[serde(default = "default_start")]
    start: Vec<String>,
    #[serde(default = "default_quit")]
    quit: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct TomlSound {
    #[serde(default = "default_sound_enabled")]
    enabled: bool,
}

// ── Defaults ──

fn default_levels_dir() -> String { "levels".into() }
fn default_log_level() -> String { "warn".into() }
fn default_start_lives() -> u32 { START_LIVES }
fn default_tick_rate() -> u64 { 33 }
fn default_sound_enabled() -> bool { true }

fn default_fire() -> Vec<String> { vec!["A".into(), "X".into()] }
fn default_jetpack() -> Vec<String> { vec!["B".into(), "Y".into()] }
fn default_start() -> Vec<String> { vec!["Start".into()] }
fn default_quit() -> Vec<String> { vec!["Select".into()] }

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            levels_dir: default_levels_dir(),
            log_level: default_log_level(),
            start_lives: default_start_lives(),
        }
    }
}

impl Default for TomlSpeed {
    fn default() -> Self {
        TomlSpeed { tick_rate_ms: default_tick_rate() }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            fire: default_fire(),
            jetpack: default_jetpack(),
            start: default_start(),
            quit: default_quit(),
        }
    }
}

impl Default for TomlSound {
    fn default() -> Self {
        TomlSound { enabled: default_sound_enabled() }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    pub fn load() -> Self {
        Self::load_from(&candidate_dirs())
    }

    /// Load from the first `config.toml` found in `search_dirs`.
    pub fn load_from(search_dirs: &[PathBuf]) -> Self {
        let toml_cfg = load_toml(search_dirs);
        Self::resolve(toml_cfg, search_dirs)
    }

    /// Parse config text directly; relative paths resolve against CWD.
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        let toml_cfg = toml::from_str::<TomlConfig>(text)?;
        Ok(Self::resolve(toml_cfg, &[]))
    }

    fn resolve(toml_cfg: TomlConfig, search_dirs: &[PathBuf]) -> Self {
        let levels_dir = resolve_levels_dir(&toml_cfg.general.levels_dir, search_dirs);
        GameConfig {
            levels_dir,
            log_level: toml_cfg.general.log_level,
            start_lives: toml_cfg.general.start_lives,
            tick_rate_ms: toml_cfg.speed.tick_rate_ms,
            gamepad: GamepadConfig {
                fire: toml_cfg.gamepad.fire,
                jetpack: toml_cfg.gamepad.jetpack,
                start: toml_cfg.gamepad.start,
                quit: toml_cfg.gamepad.quit,
            },
            sound_enabled: toml_cfg.sound.enabled,
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::resolve(TomlConfig::default(), &[])
    }
}

/// Absolute paths are taken as-is; relative ones are looked up in the
/// search dirs, falling back to CWD-relative.
fn resolve_levels_dir(dir: &str, search_dirs: &[PathBuf]) -> PathBuf {
    if Path::new(dir).is_absolute() {
        return PathBuf::from(dir);
    }
    search_dirs
        .iter()
        .map(|d| d.join(dir))
        .find(|p| p.is_dir())
        .unwrap_or_else(|| PathBuf::from(dir))
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    // 1. Directory of the running executable, symlinks resolved
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    // 2. Current working directory
    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }
    dirs
}

/// Search for config.toml in candidate directories.
/// Runs before the logger exists, so problems go straight to stderr.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                    Ok(cfg) => return cfg,
                    Err(e) => {
                        eprintln!("Warning: config.toml parse error: {e}");
                        eprintln!("Using default settings.");
                        return TomlConfig::default();
                    }
                },
                Err(e) => {
                    eprintln!("Warning: could not read {}: {e}", path.display());
                }
            }
        }
    }
    TomlConfig::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let cfg = GameConfig::from_toml_str("").unwrap();
        assert_eq!(cfg.tick_rate_ms, 33);
        assert_eq!(cfg.start_lives, 3);
        assert_eq!(cfg.log_level, "warn");
        assert_eq!(cfg.levels_dir, PathBuf::from("levels"));
        assert_eq!(cfg.gamepad.fire, vec!["A", "X"]);
        assert!(cfg.sound_enabled);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = GameConfig::from_toml_str(
            r#"
            [speed]
            tick_rate_ms = 50

            [gamepad]
            jetpack = ["L1"]

            [sound]
            enabled = false
            "#,
        )
        .unwrap();
        assert_eq!(cfg.tick_rate_ms, 50);
        assert_eq!(cfg.gamepad.jetpack, vec!["L1"]);
        assert_eq!(cfg.gamepad.start, vec!["Start"]);
        assert!(!cfg.sound_enabled);
        assert_eq!(cfg.start_lives, 3);
    }

    #[test]
    fn bad_toml_is_an_error() {
        assert!(GameConfig::from_toml_str("[speed]\ntick_rate_ms = \"fast\"").is_err());
    }

    #[test]
    fn search_dir_file_and_levels_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("data")).unwrap();
        std::fs::write(
            dir.path().join("config.toml"),
            "[general]\nlevels_dir = \"data\"\nstart_lives = 5\n",
        )
        .unwrap();
        let cfg = GameConfig::load_from(&[dir.path().to_path_buf()]);
        assert_eq!(cfg.start_lives, 5);
        assert_eq!(cfg.levels_dir, dir.path().join("data"));
    }

    #[test]
    fn broken_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("config.toml"), "[general\nnope").unwrap();
        let cfg = GameConfig::load_from(&[dir.path().to_path_buf()]);
        assert_eq!(cfg.start_lives, 3);
        assert_eq!(cfg.tick_rate_ms, 33);
    }
}
