//! PGN export and import for `GameRecord`, with regex-based header and comment stripping.

use regex::Regex;
use std::sync::LazyLock;

use crate::error::RecordError;
use crate::game::notation::from_san;
use crate::game::rules::{GameRecord, MoveRequest};

const LINE_WIDTH: usize = 80;
const RESULT_TOKENS: [&str; 4] = ["1-0", "0-1", "1/2-1/2", "*"];
const EN_PASSANT_MARK: &str = "e.p.";

/// Extract a header value, e.g. `FEN` from `[FEN "..."]`
fn extract_header(pgn: &str, header_name: &str) -> Option<String> {
    let pattern = format!(r#"\[{}\s+"([^"]*)"\]"#, regex::escape(header_name));
    let re = Regex::new(&pattern).ok()?;
    let value = re.captures(pgn)?.get(1)?.as_str().to_string();
    if value.is_empty() { None } else { Some(value) }
}

struct MovetextPatterns {
    header: Regex,
    comment: Regex,
    variation: Regex,
    nag: Regex,
    number: Regex,
}

static MOVETEXT: LazyLock<Option<MovetextPatterns>> = LazyLock::new(|| {
    Some(MovetextPatterns {
        header: Regex::new(r"\[[^\]]*\]").ok()?,
        comment: Regex::new(r"\{[^}]*\}|;[^\n]*").ok()?,
        variation: Regex::new(r"\([^()]*\)").ok()?,
        nag: Regex::new(r"\$\d+").ok()?,
        number: Regex::new(r"^\d+\.+").ok()?,
    })
});

/// Movetext tokens with headers, comments, variations, NAGs and move numbers removed
fn extract_tokens(pgn: &str) -> Option<Vec<String>> {
    let patterns = MOVETEXT.as_ref()?;

    let no_headers = patterns.header.replace_all(pgn, " ");
    let mut text = patterns.comment.replace_all(&no_headers, " ").into_owned();
    // Variations nest, strip innermost first
    while patterns.variation.is_match(&text) {
        text = patterns.variation.replace_all(&text, " ").into_owned();
    }
    let text = patterns.nag.replace_all(&text, " ");

    let tokens = text
        .split_whitespace()
        .map(|token| patterns.number.replace(token, "").into_owned())
        // "exd6 e.p." spells one move
        .filter(|token| !token.is_empty() && token != EN_PASSANT_MARK && !RESULT_TOKENS.contains(&token.as_str()))
        .collect();
    Some(tokens)
}

impl GameRecord {
    /// Parse a complete PGN game into a fresh record
    pub fn from_pgn(pgn: &str) -> Result<GameRecord, RecordError> {
        if pgn.trim().is_empty() {
            return Err(RecordError::Empty);
        }

        let mut record = match extract_header(pgn, "FEN") {
            Some(fen) => GameRecord::from_fen(&fen)?,
            None => GameRecord::new(),
        };

        let tokens = extract_tokens(pgn).ok_or(RecordError::Empty)?;
        for (ply, token) in tokens.into_iter().enumerate() {
            let unknown = || RecordError::UnknownMove { ply: ply + 1, token: token.clone() };
            let chess_move = from_san(&record.board(), &token).ok_or_else(unknown)?;
            record
                .apply_move(MoveRequest {
                    from: chess_move.get_source(),
                    to: chess_move.get_dest(),
                    promotion: chess_move.get_promotion(),
                })
                .map_err(|_| unknown())?;
        }

        Ok(record)
    }

    /// Replace this record with one parsed from PGN, leaving it untouched on failure
    pub fn import_pgn(&mut self, pgn: &str) -> Result<(), RecordError> {
        *self = GameRecord::from_pgn(pgn)?;
        Ok(())
    }

    pub fn export_pgn(&self) -> String {
        let result = self.status().result_token(self.turn());
        let mut pgn = String::new();
        for (name, value) in [
            ("Event", "Casual Game"),
            ("Site", "?"),
            ("Date", "????.??.??"),
            ("Round", "-"),
            ("White", "?"),
            ("Black", "?"),
            ("Result", result),
        ] {
            pgn.push_str(&format!("[{} \"{}\"]\n", name, value));
        }
        if let Some(fen) = self.start_fen() {
            pgn.push_str("[SetUp \"1\"]\n");
            pgn.push_str(&format!("[FEN \"{}\"]\n", fen));
        }
        pgn.push('\n');

        let start = self.start_position();
        let black_started = start.side_to_move() == chess::Color::Black;
        let first_move_number = self
            .start_fen()
            .and_then(|fen| fen.split_whitespace().nth(5))
            .and_then(|n| n.parse::<usize>().ok())
            .unwrap_or(1);

        let mut tokens: Vec<String> = Vec::new();
        for (index, san) in self.history().iter().enumerate() {
            let ply = index + usize::from(black_started);
            let number = first_move_number + ply / 2;
            if ply % 2 == 0 {
                tokens.push(format!("{}.", number));
            } else if index == 0 {
                tokens.push(format!("{}...", number));
            }
            tokens.push(san.clone());
        }
        tokens.push(result.to_string());

        let mut line_len = 0;
        for token in tokens {
            if line_len > 0 && line_len + 1 + token.len() > LINE_WIDTH {
                pgn.push('\n');
                line_len = 0;
            } else if line_len > 0 {
                pgn.push(' ');
                line_len += 1;
            }
            line_len += token.len();
            pgn.push_str(&token);
        }
        pgn.push('\n');
        pgn
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RUY_LOPEZ: &str = r#"[Event "Test"]
[White "Player1"]
[Black "Player2"]
[Result "*"]

1. e4 e5 2. Nf3 Nc6 {the usual} 3. Bb5 a6 (3... Nf6 4. O-O) 4. Ba4 Nf6 5. O-O $1 Be7 *"#;

    #[test]
    fn test_import_strips_comments_and_variations() {
        let record = GameRecord::from_pgn(RUY_LOPEZ).unwrap();
        assert_eq!(record.len(), 10);
        assert_eq!(record.history()[8], "O-O");
        assert_eq!(record.history()[9], "Be7");
    }

    #[test]
    fn test_import_rejects_garbage() {
        assert_eq!(GameRecord::from_pgn("   ").unwrap_err(), RecordError::Empty);
        assert_eq!(
            GameRecord::from_pgn("1. e4 e4").unwrap_err(),
            RecordError::UnknownMove { ply: 2, token: "e4".to_string() }
        );
        assert!(GameRecord::from_pgn("hello world").is_err());
    }

    #[test]
    fn test_import_accepts_redundant_disambiguation() {
        assert_eq!(GameRecord::from_pgn("1. Ngf3").unwrap().history(), ["Nf3"]);
        assert_eq!(GameRecord::from_pgn("1. e4 e5 2. Qdh5").unwrap().history(), ["e4", "e5", "Qh5"]);
    }

    #[test]
    fn test_import_accepts_en_passant_mark() {
        let record = GameRecord::from_pgn("1. d4 e5 2. dxe5 d5 3. exd6 e.p. *").unwrap();
        assert_eq!(record.history(), ["d4", "e5", "dxe5", "d5", "exd6"]);
        assert_eq!(record.piece_at(chess::Square::D5), None);
    }

    #[test]
    fn test_import_rejects_malformed_fen_header() {
        let pgn = "[SetUp \"1\"]\n[FEN \"8/8/8/8/8/8/8/8/8/4K2k w - - 0 1\"]\n\n*";
        assert_eq!(
            GameRecord::from_pgn(pgn).unwrap_err(),
            RecordError::InvalidFen("8/8/8/8/8/8/8/8/8/4K2k w - - 0 1".to_string())
        );
    }

    #[test]
    fn test_failed_import_leaves_record_intact() {
        let mut record = GameRecord::from_pgn("1. d4 d5").unwrap();
        assert!(record.import_pgn("1. d4 Ke2").is_err());
        assert_eq!(record.history(), ["d4", "d5"]);
    }

    #[test]
    fn test_export_reimports() {
        let record = GameRecord::from_pgn(RUY_LOPEZ).unwrap();
        let pgn = record.export_pgn();
        assert!(pgn.contains("[Result \"*\"]"));
        assert!(pgn.contains("1. e4 e5 2. Nf3 Nc6 3. Bb5 a6"));
        let again = GameRecord::from_pgn(&pgn).unwrap();
        assert_eq!(again.history(), record.history());
    }

    #[test]
    fn test_export_from_black_to_move_fen() {
        let fen = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1";
        let mut record = GameRecord::from_fen(fen).unwrap();
        record
            .apply_move(MoveRequest {
                from: chess::Square::E7,
                to: chess::Square::E5,
                promotion: None,
            })
            .unwrap();
        let pgn = record.export_pgn();
        assert!(pgn.contains("[FEN \""));
        assert!(pgn.contains("1... e5 *"));
        assert_eq!(GameRecord::from_pgn(&pgn).unwrap().history(), ["e5"]);
    }
}
