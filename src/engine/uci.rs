//! The slice of UCI this server speaks: commands out, `info`/`bestmove` in.

use chess::{ChessMove, Color, Square};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::game::utils::parse_promotion_piece;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UciCommand {
    Uci,
    IsReady,
    NewGame,
    SetOption { name: String, value: String },
    Position { fen: String },
    GoDepth(u8),
    Stop,
    Quit,
}

impl fmt::Display for UciCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UciCommand::Uci => write!(f, "uci"),
            UciCommand::IsReady => write!(f, "isready"),
            UciCommand::NewGame => write!(f, "ucinewgame"),
            UciCommand::SetOption { name, value } => write!(f, "setoption name {} value {}", name, value),
            UciCommand::Position { fen } => write!(f, "position fen {}", fen),
            UciCommand::GoDepth(depth) => write!(f, "go depth {}", depth),
            UciCommand::Stop => write!(f, "stop"),
            UciCommand::Quit => write!(f, "quit"),
        }
    }
}

/// Score from the point of view of the side to move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Score {
    Centipawns(i32),
    Mate(i32),
}

/// Progress reported while searching. Advisory only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchInfo {
    pub depth: Option<u32>,
    pub score: Option<Score>,
    pub pv: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineLine {
    Info(SearchInfo),
    /// `None` when the engine reports no legal move
    BestMove(Option<ChessMove>),
    Other(String),
}

/// Parse a coordinate move such as `e2e4` or `e7e8q`
pub fn parse_uci_move(text: &str) -> Option<ChessMove> {
    if text.len() < 4 || text.len() > 5 || !text.is_ascii() {
        return None;
    }
    let source = Square::from_str(&text[0..2]).ok()?;
    let dest = Square::from_str(&text[2..4]).ok()?;
    let promotion = match text.get(4..5) {
        Some(piece) => Some(parse_promotion_piece(piece).ok()?),
        None => None,
    };
    Some(ChessMove::new(source, dest, promotion))
}

fn parse_info(line: &str) -> SearchInfo {
    let mut info = SearchInfo::default();
    let mut tokens = line.split_whitespace().skip(1);
    while let Some(token) = tokens.next() {
        match token {
            "depth" => info.depth = tokens.next().and_then(|t| t.parse().ok()),
            "score" => {
                let kind = tokens.next();
                let value = tokens.next().and_then(|t| t.parse().ok());
                info.score = match (kind, value) {
                    (Some("cp"), Some(cp)) => Some(Score::Centipawns(cp)),
                    (Some("mate"), Some(mate)) => Some(Score::Mate(mate)),
                    _ => info.score,
                };
            }
            "pv" => {
                let pv: Vec<&str> = tokens.by_ref().collect();
                if !pv.is_empty() {
                    info.pv = Some(pv.join(" "));
                }
            }
            _ => {}
        }
    }
    info
}

pub fn parse_line(line: &str) -> EngineLine {
    let line = line.trim();
    match line.split_whitespace().next() {
        Some("info") => EngineLine::Info(parse_info(line)),
        Some("bestmove") => {
            let best = line.split_whitespace().nth(1).and_then(parse_uci_move);
            EngineLine::BestMove(best)
        }
        _ => EngineLine::Other(line.to_string()),
    }
}

/// Evaluation as shown next to the board, from white's point of view
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub text: String,
    /// Height of the white part of the evaluation bar, 0-100
    pub bar_percent: f32,
    pub pv: Option<String>,
    pub depth: Option<u32>,
}

impl Evaluation {
    const CAP_CENTIPAWNS: i32 = 800;

    /// `side_to_move` is the side to move in the searched position
    pub fn from_info(info: &SearchInfo, side_to_move: Color) -> Option<Self> {
        let (text, bar_percent) = match info.score? {
            Score::Mate(moves) => {
                // mate 0 means the side to move is already mated
                let mover_wins = moves > 0;
                let white_wins = mover_wins == (side_to_move == Color::White);
                let text = if white_wins {
                    format!("Mate in {}", moves.abs())
                } else {
                    format!("Mated in {}", moves.abs())
                };
                (text, if white_wins { 95.0 } else { 5.0 })
            }
            Score::Centipawns(cp) => {
                let white_cp = if side_to_move == Color::Black { -cp } else { cp };
                let capped = white_cp.clamp(-Self::CAP_CENTIPAWNS, Self::CAP_CENTIPAWNS);
                let percent = (capped + Self::CAP_CENTIPAWNS) as f32 / (2 * Self::CAP_CENTIPAWNS) as f32 * 100.0;
                (format!("{:.2}", white_cp as f32 / 100.0), percent)
            }
        };
        Some(Evaluation {
            text,
            bar_percent,
            pv: info.pv.clone(),
            depth: info.depth,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess::Piece;

    #[test]
    fn test_command_text() {
        assert_eq!(UciCommand::GoDepth(12).to_string(), "go depth 12");
        assert_eq!(
            UciCommand::SetOption { name: "Skill Level".into(), value: "5".into() }.to_string(),
            "setoption name Skill Level value 5"
        );
        assert_eq!(UciCommand::Position { fen: "8/8 w".into() }.to_string(), "position fen 8/8 w");
    }

    #[test]
    fn test_parse_info_line() {
        let line = "info depth 14 seldepth 20 multipv 1 score cp -35 nodes 1000 pv e7e5 g1f3 b8c6";
        assert_eq!(
            parse_line(line),
            EngineLine::Info(SearchInfo {
                depth: Some(14),
                score: Some(Score::Centipawns(-35)),
                pv: Some("e7e5 g1f3 b8c6".to_string()),
            })
        );
        match parse_line("info depth 30 score mate -2 pv h7h6") {
            EngineLine::Info(info) => assert_eq!(info.score, Some(Score::Mate(-2))),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_bestmove() {
        assert_eq!(
            parse_line("bestmove e2e4 ponder e7e5"),
            EngineLine::BestMove(Some(ChessMove::new(Square::E2, Square::E4, None)))
        );
        assert_eq!(
            parse_line("bestmove a7a8q"),
            EngineLine::BestMove(Some(ChessMove::new(Square::A7, Square::A8, Some(Piece::Queen))))
        );
        assert_eq!(parse_line("bestmove (none)"), EngineLine::BestMove(None));
        assert_eq!(parse_line("bestmove 0000"), EngineLine::BestMove(None));
        assert_eq!(parse_line("readyok"), EngineLine::Other("readyok".to_string()));
    }

    #[test]
    fn test_evaluation_is_white_relative() {
        let info = SearchInfo { depth: Some(10), score: Some(Score::Centipawns(50)), pv: None };
        let eval = Evaluation::from_info(&info, Color::Black).unwrap();
        assert_eq!(eval.text, "-0.50");
        assert!(eval.bar_percent < 50.0);

        let info = SearchInfo { depth: None, score: Some(Score::Centipawns(2000)), pv: None };
        assert_eq!(Evaluation::from_info(&info, Color::White).unwrap().bar_percent, 100.0);

        let info = SearchInfo { depth: None, score: Some(Score::Mate(3)), pv: None };
        let eval = Evaluation::from_info(&info, Color::White).unwrap();
        assert_eq!(eval.text, "Mate in 3");
        assert_eq!(eval.bar_percent, 95.0);

        let info = SearchInfo { depth: None, score: Some(Score::Mate(2)), pv: None };
        assert_eq!(Evaluation::from_info(&info, Color::Black).unwrap().text, "Mated in 2");

        assert_eq!(Evaluation::from_info(&SearchInfo::default(), Color::White), None);
    }

    #[test]
    fn test_mate_zero_is_a_loss_for_the_side_to_move() {
        let info = SearchInfo { depth: Some(1), score: Some(Score::Mate(0)), pv: None };

        let black_mated = Evaluation::from_info(&info, Color::Black).unwrap();
        assert_eq!(black_mated.text, "Mate in 0");
        assert_eq!(black_mated.bar_percent, 95.0);

        let white_mated = Evaluation::from_info(&info, Color::White).unwrap();
        assert_eq!(white_mated.text, "Mated in 0");
        assert_eq!(white_mated.bar_percent, 5.0);

        let info = SearchInfo { depth: None, score: Some(Score::Mate(-1)), pv: None };
        assert_eq!(Evaluation::from_info(&info, Color::Black).unwrap().text, "Mate in 1");
    }
}
