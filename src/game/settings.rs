use chess::Color;
use std::str::FromStr;

use crate::config::Config;
use crate::error::ConfigError;
use crate::game::clock::TimePreset;

pub const DEFAULT_DEPTH: u8 = 12;
pub const MAX_DEPTH: u8 = 20;

/// Clamp a requested search depth; zero falls back to the default
pub fn clamp_depth(depth: u8) -> u8 {
    if depth == 0 {
        DEFAULT_DEPTH
    } else {
        depth.min(MAX_DEPTH)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn depth(self) -> u8 {
        match self {
            Difficulty::Easy => 8,
            Difficulty::Medium => 12,
            Difficulty::Hard => 16,
        }
    }

    /// Stockfish `Skill Level` option
    pub fn skill_level(self) -> u8 {
        match self {
            Difficulty::Easy => 5,
            Difficulty::Medium => 10,
            Difficulty::Hard => 18,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl FromStr for Difficulty {
    type Err = ConfigError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        match text.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            _ => Err(ConfigError::InvalidDifficulty(text.to_string())),
        }
    }
}

/// Per-session options, read whenever an operation needs them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub play_vs_ai: bool,
    pub ai_color: Color,
    pub depth: u8,
    pub difficulty: Difficulty,
    pub preset: TimePreset,
    pub flipped: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            play_vs_ai: false,
            ai_color: Color::Black,
            depth: DEFAULT_DEPTH,
            difficulty: Difficulty::Medium,
            preset: TimePreset::default(),
            flipped: false,
        }
    }
}

impl Settings {
    pub fn from_config(config: &Config) -> Self {
        Settings {
            play_vs_ai: config.play_vs_ai,
            ai_color: config.ai_color,
            depth: clamp_depth(config.depth.unwrap_or(config.difficulty.depth())),
            difficulty: config.difficulty,
            preset: config.time_preset,
            flipped: config.flipped,
        }
    }

    /// The side the engine plays, if it plays at all
    pub fn automated_side(&self) -> Option<Color> {
        self.play_vs_ai.then_some(self.ai_color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_depth() {
        assert_eq!(clamp_depth(0), 12);
        assert_eq!(clamp_depth(25), 20);
        assert_eq!(clamp_depth(7), 7);
    }

    #[test]
    fn test_difficulty_presets() {
        let hard: Difficulty = "Hard".parse().unwrap();
        assert_eq!((hard.depth(), hard.skill_level()), (16, 18));
        assert!("impossible".parse::<Difficulty>().is_err());
    }

    #[test]
    fn test_automated_side() {
        let mut settings = Settings::default();
        assert_eq!(settings.automated_side(), None);
        settings.play_vs_ai = true;
        assert_eq!(settings.automated_side(), Some(Color::Black));
    }
}
