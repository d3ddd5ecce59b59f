use chess::Color;
use clap::Parser;

use crate::game::clock::TimePreset;
use crate::game::settings::Difficulty;
use crate::game::utils::parse_color;

/// Chessboard session server: click-to-move play, replay, clocks and a UCI engine opponent
#[derive(Parser, Debug, Clone)]
#[command(name = "chess_board_app")]
#[command(about = "Interactive chessboard server with UCI engine play")]
#[command(version = "0.1.0")]
pub struct Config {
    /// Address to bind
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    #[arg(short, long, default_value_t = 8080)]
    pub port: u16,

    /// UCI engine executable
    #[arg(short, long, value_name = "PATH", default_value = "stockfish")]
    pub engine: String,

    /// Directory served under /static
    #[arg(long, value_name = "DIR", default_value = "./static")]
    pub static_dir: String,

    /// Let the engine play one side in new sessions
    #[arg(long)]
    pub play_vs_ai: bool,

    /// Side the engine plays
    #[arg(long, value_name = "COLOR", default_value = "black", value_parser = parse_color_arg)]
    pub ai_color: Color,

    /// Search depth (1-20); defaults to the difficulty's depth
    #[arg(short, long)]
    pub depth: Option<u8>,

    /// easy, medium or hard
    #[arg(long, default_value = "medium", value_parser = parse_difficulty_arg)]
    pub difficulty: Difficulty,

    /// Time control as <seconds>|<increment>
    #[arg(long, value_name = "PRESET", default_value = "300|0", value_parser = parse_preset_arg)]
    pub time_preset: TimePreset,

    /// Show the board from black's side
    #[arg(long)]
    pub flipped: bool,
}

fn parse_color_arg(text: &str) -> Result<Color, String> {
    parse_color(text).map_err(|e| e.to_string())
}

fn parse_difficulty_arg(text: &str) -> Result<Difficulty, String> {
    text.parse().map_err(|e: crate::error::ConfigError| e.to_string())
}

fn parse_preset_arg(text: &str) -> Result<TimePreset, String> {
    text.parse().map_err(|e: crate::error::ConfigError| e.to_string())
}

impl Default for Config {
    fn default() -> Self {
        Config {
            host: "127.0.0.1".to_string(),
            port: 8080,
            engine: "stockfish".to_string(),
            static_dir: "./static".to_string(),
            play_vs_ai: false,
            ai_color: Color::Black,
            depth: None,
            difficulty: Difficulty::Medium,
            time_preset: TimePreset::default(),
            flipped: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_arguments() {
        let config = Config::try_parse_from([
            "chess_board_app",
            "--play-vs-ai",
            "--ai-color",
            "white",
            "--difficulty",
            "hard",
            "--time-preset",
            "180|2",
        ])
        .unwrap();
        assert!(config.play_vs_ai);
        assert_eq!(config.ai_color, Color::White);
        assert_eq!(config.difficulty, Difficulty::Hard);
        assert_eq!(config.time_preset, TimePreset { total_seconds: 180, increment_seconds: 2 });
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn test_rejects_bad_preset() {
        assert!(Config::try_parse_from(["chess_board_app", "--time-preset", "fast"]).is_err());
    }
}
