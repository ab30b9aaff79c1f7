use cozy_chess::{Board as CozyBoard, Color, File, Move, Piece, Rank, Square};
use thiserror::Error;

pub const STARTPOS_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PositionError {
    #[error("Invalid FEN: {0}")]
    InvalidFen(String),
    #[error("Invalid move: {0}")]
    InvalidMove(String),
    #[error("Illegal move")]
    IllegalMove(String),
}

/// Why a game has ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Checkmate { winner: Color },
    Stalemate,
    InsufficientMaterial,
    SeventyFiveMoves,
}

impl Outcome {
    /// Standard result notation.
    pub fn result(&self) -> &'static str {
        match self {
            Outcome::Checkmate { winner: Color::White } => "1-0",
            Outcome::Checkmate { winner: Color::Black } => "0-1",
            _ => "1/2-1/2",
        }
    }
}

/// Halfmove clocks at or above this end the game (75-move rule).
pub const SEVENTY_FIVE_MOVE_PLIES: u32 = 150;

// cozy-chess refuses FEN clocks above this and stops counting there.
const COZY_CLOCK_CAP: u32 = 100;

/// A single position plus the en passant target and halfmove clock as written in FEN.
///
/// The target square of the last double push is kept alongside the board so
/// FEN output records it whether or not an en passant capture is available.
/// The clock is tracked here because the board saturates it at 100.
#[derive(Clone, Debug)]
pub struct Position {
    board: CozyBoard,
    ep_target: Option<Square>,
    halfmove: u32,
}

impl Position {
    pub fn startpos() -> Self {
        Self { board: CozyBoard::default(), ep_target: None, halfmove: 0 }
    }

    pub fn from_fen(fen: &str) -> Result<Self, PositionError> {
        let mut fields: Vec<&str> = fen.split_whitespace().collect();
        if fields.len() < 4 || fields.len() > 6 {
            return Err(PositionError::InvalidFen(format!("expected 6 space-separated fields, got {}", fields.len())));
        }
        if fields.len() == 4 { fields.push("0"); }
        if fields.len() == 5 { fields.push("1"); }
        let halfmove: u32 = fields[4].parse()
            .map_err(|_| PositionError::InvalidFen(format!("bad halfmove clock '{}'", fields[4])))?;
        let clamped = halfmove.min(COZY_CLOCK_CAP).to_string();
        fields[4] = &clamped;
        let ep_field = fields[3];
        fields[3] = "-";
        let board = parse_cozy(&fields.join(" "))?;
        if ep_field == "-" {
            return Ok(Self { board, ep_target: None, halfmove });
        }
        let target: Square = ep_field.parse()
            .map_err(|_| PositionError::InvalidFen(format!("bad en passant square '{ep_field}'")))?;
        check_ep_target(&board, target)?;
        if !ep_capturable(&board, target) {
            return Ok(Self { board, ep_target: Some(target), halfmove });
        }
        fields[3] = ep_field;
        let board = parse_cozy(&fields.join(" "))?;
        Ok(Self { board, ep_target: Some(target), halfmove })
    }

    pub fn board(&self) -> &CozyBoard { &self.board }

    /// The board's own FEN with our en passant target and halfmove clock.
    pub fn fen(&self) -> String {
        let fen_str = self.board.to_string();
        let mut fields: Vec<String> = fen_str.split_whitespace().map(str::to_string).collect();
        if fields.len() == 6 {
            fields[3] = self.ep_target.map_or_else(|| "-".to_string(), |sq| sq.to_string());
            fields[4] = self.halfmove.to_string();
        }
        fields.join(" ")
    }

    /// Legal moves in standard UCI notation (castling as `e1g1`).
    pub fn legal_moves(&self) -> Vec<String> {
        let mut out = Vec::with_capacity(64);
        self.board.generate_moves(|moves| {
            for m in moves { out.push(self.uci(m)); }
            false
        });
        out
    }

    pub fn play_uci(&mut self, mv_uci: &str) -> Result<(), PositionError> {
        if !is_uci_syntax(mv_uci) {
            return Err(PositionError::InvalidMove(format!("'{mv_uci}' is not a UCI move")));
        }
        let mut found = None;
        self.board.generate_moves(|moves| {
            for m in moves {
                if self.uci(m) == mv_uci { found = Some(m); break; }
            }
            found.is_some()
        });
        let m = found.ok_or_else(|| PositionError::IllegalMove(mv_uci.to_string()))?;
        let pawn_move = self.board.piece_on(m.from) == Some(Piece::Pawn);
        // castling lands on the mover's own rook, which is not a capture
        let capture = self.board.color_on(m.to) == Some(!self.side_to_move());
        self.halfmove = if pawn_move || capture { 0 } else { self.halfmove.saturating_add(1) };
        let double_push = pawn_move && (m.from.rank() as i8 - m.to.rank() as i8).abs() == 2;
        self.ep_target = if double_push {
            Some(Square::new(m.from.file(), Rank::index((m.from.rank() as usize + m.to.rank() as usize) / 2)))
        } else {
            None
        };
        self.board.play(m);
        Ok(())
    }

    pub fn side_to_move(&self) -> Color { self.board.side_to_move() }

    pub fn turn(&self) -> &'static str { color_name(self.side_to_move()) }

    /// The FEN castling field, `-` when neither side may castle.
    pub fn castling_rights(&self) -> String {
        let mut s = String::with_capacity(4);
        let white = self.board.castle_rights(Color::White);
        let black = self.board.castle_rights(Color::Black);
        if white.short.is_some() { s.push('K'); }
        if white.long.is_some() { s.push('Q'); }
        if black.short.is_some() { s.push('k'); }
        if black.long.is_some() { s.push('q'); }
        if s.is_empty() { s.push('-'); }
        s
    }

    pub fn en_passant(&self) -> Option<String> { self.ep_target.map(|sq| sq.to_string()) }

    pub fn halfmove_clock(&self) -> u32 { self.halfmove }

    pub fn fullmove_number(&self) -> u16 { self.board.fullmove_number() }

    pub fn is_check(&self) -> bool { !self.board.checkers().is_empty() }

    pub fn is_checkmate(&self) -> bool { self.is_check() && !self.has_legal_move() }

    pub fn is_stalemate(&self) -> bool { !self.is_check() && !self.has_legal_move() }

    pub fn is_insufficient_material(&self) -> bool {
        let b = &self.board;
        let heavy = b.pieces(Piece::Pawn) | b.pieces(Piece::Rook) | b.pieces(Piece::Queen);
        if !heavy.is_empty() { return false; }
        let knights = b.pieces(Piece::Knight);
        let bishops = b.pieces(Piece::Bishop);
        if knights.len() + bishops.len() <= 1 { return true; }
        if !knights.is_empty() { return false; }
        let mut light = false;
        let mut dark = false;
        for sq in bishops {
            if (sq.file() as usize + sq.rank() as usize) % 2 == 0 { dark = true; } else { light = true; }
        }
        !(light && dark)
    }

    pub fn outcome(&self) -> Option<Outcome> {
        if !self.has_legal_move() {
            return Some(if self.is_check() {
                Outcome::Checkmate { winner: !self.side_to_move() }
            } else {
                Outcome::Stalemate
            });
        }
        if self.is_insufficient_material() { return Some(Outcome::InsufficientMaterial); }
        if self.halfmove >= SEVENTY_FIVE_MOVE_PLIES { return Some(Outcome::SeventyFiveMoves); }
        None
    }

    pub fn is_game_over(&self) -> bool { self.outcome().is_some() }

    pub fn result(&self) -> Option<&'static str> { self.outcome().map(|o| o.result()) }

    fn has_legal_move(&self) -> bool {
        self.board.generate_moves(|moves| !moves.is_empty())
    }

    // cozy-chess encodes castling as the king capturing its own rook.
    fn uci(&self, m: Move) -> String {
        let own_rook = self.board.piece_on(m.from) == Some(Piece::King)
            && self.board.color_on(m.to) == Some(self.side_to_move());
        if !own_rook { return m.to_string(); }
        let file = if m.to.file() as usize > m.from.file() as usize { File::G } else { File::C };
        format!("{}{}", m.from, Square::new(file, m.from.rank()))
    }
}

impl Default for Position {
    fn default() -> Self { Self::startpos() }
}

pub fn color_name(color: Color) -> &'static str {
    if color == Color::White { "white" } else { "black" }
}

fn parse_cozy(fen: &str) -> Result<CozyBoard, PositionError> {
    CozyBoard::from_fen(fen, false).map_err(|e| PositionError::InvalidFen(format!("{e:?}")))
}

fn is_uci_syntax(s: &str) -> bool {
    let b = s.as_bytes();
    let square = |f: u8, r: u8| (b'a'..=b'h').contains(&f) && (b'1'..=b'8').contains(&r);
    match b.len() {
        4 => square(b[0], b[1]) && square(b[2], b[3]),
        5 => square(b[0], b[1]) && square(b[2], b[3]) && matches!(b[4], b'q' | b'r' | b'b' | b'n'),
        _ => false,
    }
}

// The target must sit behind a pawn that just double-pushed: empty target and
// origin squares, the enemy pawn one rank further on.
fn check_ep_target(board: &CozyBoard, target: Square) -> Result<(), PositionError> {
    let (target_rank, pawn_rank, origin_rank) = match board.side_to_move() {
        Color::White => (Rank::Sixth, Rank::Fifth, Rank::Seventh),
        Color::Black => (Rank::Third, Rank::Fourth, Rank::Second),
    };
    let file = target.file();
    let pawn_sq = Square::new(file, pawn_rank);
    let ok = target.rank() == target_rank
        && board.piece_on(target).is_none()
        && board.piece_on(Square::new(file, origin_rank)).is_none()
        && board.piece_on(pawn_sq) == Some(Piece::Pawn)
        && board.color_on(pawn_sq) == Some(!board.side_to_move());
    if ok { Ok(()) } else { Err(PositionError::InvalidFen(format!("impossible en passant square '{target}'"))) }
}

fn ep_capturable(board: &CozyBoard, target: Square) -> bool {
    let stm = board.side_to_move();
    let pawn_rank = if stm == Color::White { Rank::Fifth } else { Rank::Fourth };
    let file = target.file() as usize;
    [file.checked_sub(1), Some(file + 1)]
        .into_iter()
        .flatten()
        .filter(|&f| f < 8)
        .map(|f| Square::new(File::index(f), pawn_rank))
        .any(|sq| board.piece_on(sq) == Some(Piece::Pawn) && board.color_on(sq) == Some(stm))
}
