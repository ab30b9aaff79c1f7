use cozy_chess::{Board, Color, Piece};

const PAWN: i32 = 100;
const KNIGHT: i32 = 320;
const BISHOP: i32 = 330;
const ROOK: i32 = 500;
const QUEEN: i32 = 900;

fn count_piece(board: &Board, color: Color, piece: Piece) -> i32 {
    (board.colors(color) & board.pieces(piece)).len() as i32
}

// Positive means White has more material.
pub fn material_white_cp(board: &Board) -> i32 {
    [(Piece::Pawn, PAWN), (Piece::Knight, KNIGHT), (Piece::Bishop, BISHOP), (Piece::Rook, ROOK), (Piece::Queen, QUEEN)]
        .iter()
        .map(|&(p, v)| (count_piece(board, Color::White, p) - count_piece(board, Color::Black, p)) * v)
        .sum()
}

/// Material from the side-to-move perspective, as UCI reports scores.
pub fn material_cp(board: &Board) -> i32 {
    let base = material_white_cp(board);
    if board.side_to_move() == Color::White { base } else { -base }
}
