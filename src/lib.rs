//! Xiangqi Search Engine
//!
//! 中国象棋搜索引擎 - 迭代加深 Alpha-Beta 搜索 + NNUE 混合评估，
//! 支持 FEN 输入输出

pub mod board;
pub mod engine;
pub mod fen;
pub mod test_positions;
pub mod types;

pub use board::Board;
pub use engine::{
    Difficulty, Engine, Evaluator, SearchLimits, SearchOutcome, SearchStats, INFINITY, MATE_SCORE,
    MATE_THRESHOLD,
};
pub use fen::{parse_fen, FenState, INITIAL_FEN};
pub use types::{Color, GameResult, Move, Piece, PieceKind, Position};
