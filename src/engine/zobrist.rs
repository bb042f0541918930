//! Zobrist Hashing
//!
//! 预计算的随机数表，棋盘哈希 = 所有棋子哈希值的 XOR。
//! `v ^ v = 0` 使单个棋子的增量切换成为可能。

use crate::board::Board;
use crate::types::{Color, Position, NUM_PIECE_KINDS, NUM_SQUARES};
use rand::prelude::*;

/// Zobrist 随机数表
///
/// 每个 (颜色 x 棋子类型, 格子) 一个独立的 64 位随机数，
/// 外加一个"轮到黑方"的随机数。固定种子保证可复现。
pub struct ZobristTable {
    // [color][kind][square]
    pieces: [[[u64; NUM_SQUARES]; NUM_PIECE_KINDS]; 2],
    side_to_move: u64,
}

impl ZobristTable {
    fn new() -> Self {
        let mut rng = StdRng::seed_from_u64(0x5A0B_1257);
        let mut pieces = [[[0u64; NUM_SQUARES]; NUM_PIECE_KINDS]; 2];

        for color in pieces.iter_mut() {
            for kind in color.iter_mut() {
                for sq in kind.iter_mut() {
                    *sq = rng.gen();
                }
            }
        }

        ZobristTable {
            pieces,
            side_to_move: rng.gen(),
        }
    }

    /// 某棋子在某格的哈希分量
    #[inline]
    pub fn piece_hash(&self, pos: Position, piece: crate::types::Piece) -> u64 {
        self.pieces[piece.color.index()][piece.kind.index()][pos.to_index()]
    }

    /// 轮到黑方的哈希分量
    #[inline]
    pub fn side_hash(&self) -> u64 {
        self.side_to_move
    }
}

lazy_static::lazy_static! {
    /// 全局 Zobrist 表（只读数据）
    pub static ref ZOBRIST: ZobristTable = ZobristTable::new();
}

/// 计算棋盘的 Zobrist 哈希
///
/// 纯函数：仅由棋子占位和走子方决定。
pub fn hash_board(board: &Board) -> u64 {
    let mut hash = 0u64;

    for (pos, piece) in board.pieces(None) {
        hash ^= ZOBRIST.piece_hash(pos, piece);
    }

    if board.current_turn() == Color::Black {
        hash ^= ZOBRIST.side_hash();
    }

    hash
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Move;

    #[test]
    fn test_hash_deterministic() {
        let a = Board::new();
        let b = Board::new();
        assert_eq!(hash_board(&a), hash_board(&b));
    }

    #[test]
    fn test_hash_depends_on_side_to_move() {
        let red = Board::from_fen("4k4/9/9/9/9/9/9/9/9/4K4 w").unwrap();
        let black = Board::from_fen("4k4/9/9/9/9/9/9/9/9/4K4 b").unwrap();
        assert_ne!(hash_board(&red), hash_board(&black));
        assert_eq!(
            hash_board(&red) ^ ZOBRIST.side_hash(),
            hash_board(&black)
        );
    }

    #[test]
    fn test_hash_restored_after_undo() {
        let mut board = Board::new();
        let before = hash_board(&board);
        let mv = Move::from_coord_str("b2e2").unwrap();
        let captured = board.make_move(mv);
        assert_ne!(hash_board(&board), before);
        board.undo_move(mv, captured);
        assert_eq!(hash_board(&board), before);
    }

    #[test]
    fn test_hash_differs_after_move() {
        let mut board = Board::new();
        let before = hash_board(&board);
        board.make_move(Move::from_coord_str("a0a1").unwrap());
        assert_ne!(hash_board(&board), before);
    }
}
