//! Game clock: two countdown timers and a per-move increment, in whole seconds.
//!
//! The clock only keeps time. Driving `tick` once a second is the session's
//! job, and it must hold at most one interval timer at a time.

use chess::Color;
use log::info;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;
use crate::game::utils::color_name;

/// A time control such as `300|0` (five minutes, no increment)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimePreset {
    pub total_seconds: u32,
    pub increment_seconds: u32,
}

impl Default for TimePreset {
    fn default() -> Self {
        TimePreset { total_seconds: 300, increment_seconds: 0 }
    }
}

impl FromStr for TimePreset {
    type Err = ConfigError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidPreset(text.to_string());
        let (total, increment) = text.split_once('|').ok_or_else(invalid)?;
        let total_seconds: u32 = total.trim().parse().map_err(|_| invalid())?;
        let increment_seconds: u32 = increment.trim().parse().map_err(|_| invalid())?;
        if total_seconds == 0 {
            return Err(invalid());
        }
        Ok(TimePreset { total_seconds, increment_seconds })
    }
}

impl fmt::Display for TimePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.total_seconds, self.increment_seconds)
    }
}

/// Reported once, when a side's time reaches zero
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeForfeit {
    pub side: &'static str,
}

/// `mm:ss`
pub fn format_clock(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

#[derive(Debug, Clone)]
pub struct ClockController {
    white_seconds: u32,
    black_seconds: u32,
    increment_seconds: u32,
    running: bool,
    flagged: Option<Color>,
}

impl ClockController {
    pub fn new(preset: TimePreset) -> Self {
        let mut clock = ClockController {
            white_seconds: 0,
            black_seconds: 0,
            increment_seconds: 0,
            running: false,
            flagged: None,
        };
        clock.apply_preset(preset);
        clock
    }

    pub fn apply_preset(&mut self, preset: TimePreset) {
        self.white_seconds = preset.total_seconds;
        self.black_seconds = preset.total_seconds;
        self.increment_seconds = preset.increment_seconds;
        self.flagged = None;
        self.running = true;
        info!("Clock set to {}", preset);
    }

    pub fn remaining(&self, color: Color) -> u32 {
        match color {
            Color::White => self.white_seconds,
            Color::Black => self.black_seconds,
        }
    }

    pub fn increment(&self) -> u32 {
        self.increment_seconds
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// The side that ran out of time, if any
    pub fn flagged(&self) -> Option<Color> {
        self.flagged
    }

    /// One second passes for the side to move. Nothing happens while stopped,
    /// while the game is over or while the board shows an earlier position.
    pub fn tick(&mut self, side_to_move: Color, terminal: bool, live: bool) -> Option<TimeForfeit> {
        if !self.running || terminal || !live {
            return None;
        }

        let remaining = match side_to_move {
            Color::White => &mut self.white_seconds,
            Color::Black => &mut self.black_seconds,
        };
        *remaining = remaining.saturating_sub(1);

        let out_of_time = if self.white_seconds == 0 {
            Some(Color::White)
        } else if self.black_seconds == 0 {
            Some(Color::Black)
        } else {
            None
        };

        out_of_time.map(|side| {
            self.running = false;
            self.flagged = Some(side);
            info!("{} ran out of time", color_name(side));
            TimeForfeit { side: color_name(side) }
        })
    }

    pub fn apply_increment(&mut self, side_that_moved: Color) {
        if self.increment_seconds == 0 {
            return;
        }
        match side_that_moved {
            Color::White => self.white_seconds += self.increment_seconds,
            Color::Black => self.black_seconds += self.increment_seconds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_preset() {
        let preset: TimePreset = "180|2".parse().unwrap();
        assert_eq!(preset, TimePreset { total_seconds: 180, increment_seconds: 2 });
        assert_eq!(preset.to_string(), "180|2");
        assert!("180".parse::<TimePreset>().is_err());
        assert!("0|5".parse::<TimePreset>().is_err());
        assert!("abc|1".parse::<TimePreset>().is_err());
    }

    #[test]
    fn test_ticks_only_side_to_move() {
        let mut clock = ClockController::new(TimePreset::default());
        for _ in 0..5 {
            assert_eq!(clock.tick(Color::White, false, true), None);
        }
        assert_eq!(clock.remaining(Color::White), 295);
        assert_eq!(clock.remaining(Color::Black), 300);
    }

    #[test]
    fn test_review_and_terminal_pause_the_clock() {
        let mut clock = ClockController::new(TimePreset::default());
        clock.tick(Color::Black, false, false);
        clock.tick(Color::Black, true, true);
        assert_eq!(clock.remaining(Color::Black), 300);
        assert!(clock.is_running());
    }

    #[test]
    fn test_forfeit_reported_once() {
        let mut clock = ClockController::new(TimePreset { total_seconds: 2, increment_seconds: 0 });
        assert_eq!(clock.tick(Color::Black, false, true), None);
        assert_eq!(clock.tick(Color::Black, false, true), Some(TimeForfeit { side: "black" }));
        assert_eq!(clock.tick(Color::Black, false, true), None);
        assert_eq!(clock.tick(Color::White, false, true), None);
        assert_eq!(clock.remaining(Color::White), 2);
        assert_eq!(clock.flagged(), Some(Color::Black));
        assert!(!clock.is_running());

        clock.apply_preset(TimePreset::default());
        assert_eq!(clock.flagged(), None);
        assert!(clock.is_running());
    }

    #[test]
    fn test_increment() {
        let mut clock = ClockController::new(TimePreset { total_seconds: 60, increment_seconds: 3 });
        clock.apply_increment(Color::White);
        assert_eq!(clock.remaining(Color::White), 63);
        assert_eq!(clock.remaining(Color::Black), 60);
    }

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(300), "05:00");
        assert_eq!(format_clock(61), "01:01");
        assert_eq!(format_clock(0), "00:00");
    }
}
