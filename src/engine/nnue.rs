//! NNUE 风格评估器
//!
//! 网络结构: 输入 1260 (2 视角 x 7 兵种 x 90 格) -> 累加器 256
//! -> 拼接 512 -> 隐藏层 32 -> 输出 1，激活函数为 clipped ReLU。
//! 最终分数按 0.3 网络 + 0.7 经典评估 (子力 + 位置表) 混合，
//! 未训练的随机网络也能给出可用的评估。

use std::fs::File;
use std::io::Read;
use std::path::Path;

use rand::prelude::*;

use crate::board::Board;
use crate::types::{Color, PieceKind, BOARD_COLS, BOARD_ROWS, NUM_PIECE_KINDS, NUM_SQUARES};

pub const INPUT_SIZE: usize = 2 * NUM_PIECE_KINDS * NUM_SQUARES; // 1260
pub const ACCUMULATOR_SIZE: usize = 256;
pub const HIDDEN_SIZE: usize = 32;

/// 权重文件中的 f32 总数（小端序，按层顺序排列）
const WEIGHT_FILE_FLOATS: usize = INPUT_SIZE * ACCUMULATOR_SIZE
    + ACCUMULATOR_SIZE
    + 2 * ACCUMULATOR_SIZE * HIDDEN_SIZE
    + HIDDEN_SIZE
    + HIDDEN_SIZE
    + 1;

/// 网络权重
///
/// 输入层权重按特征行存储：行 i 是特征 i 对累加器的贡献。
struct NnueWeights {
    input_weights: Vec<f32>,  // INPUT_SIZE x ACCUMULATOR_SIZE
    input_biases: Vec<f32>,   // ACCUMULATOR_SIZE
    hidden_weights: Vec<f32>, // (2 * ACCUMULATOR_SIZE) x HIDDEN_SIZE
    hidden_biases: Vec<f32>,  // HIDDEN_SIZE
    output_weights: Vec<f32>, // HIDDEN_SIZE
    output_bias: f32,
}

#[inline]
fn clipped_relu(x: f32) -> f32 {
    x.clamp(0.0, 1.0)
}

/// 特征编码: 视角 (0=己方, 1=对方) x 兵种 x 格子
#[inline]
fn feature_index(perspective: usize, kind: usize, square: usize) -> usize {
    perspective * (NUM_PIECE_KINDS * NUM_SQUARES) + kind * NUM_SQUARES + square
}

/// 黑方视角的镜像：只翻转行（象棋棋盘左右不对称性可忽略，上下必须翻转）
#[inline]
fn mirror_square(square: usize) -> usize {
    let row = square / BOARD_COLS;
    let col = square % BOARD_COLS;
    (BOARD_ROWS - 1 - row) * BOARD_COLS + col
}

impl NnueWeights {
    /// 确定性随机初始化
    ///
    /// 均匀分布缩放到 0.1/sqrt(n)，输入层按兵种价值再放大，
    /// 给未训练网络一个粗略的子力感。固定种子保证可复现。
    fn random() -> Self {
        let mut rng = StdRng::seed_from_u64(42);

        let mut input_weights = vec![0.0f32; INPUT_SIZE * ACCUMULATOR_SIZE];
        let input_scale = 0.1 / (INPUT_SIZE as f32).sqrt();
        for w in input_weights.iter_mut() {
            *w = rng.gen_range(-1.0..1.0f32) * input_scale;
        }
        for kind in PieceKind::ALL {
            let value = kind.value() as f32 / 1000.0;
            for perspective in 0..2 {
                for sq in 0..NUM_SQUARES {
                    let row = feature_index(perspective, kind.index(), sq) * ACCUMULATOR_SIZE;
                    for w in input_weights[row..row + ACCUMULATOR_SIZE].iter_mut() {
                        *w *= 1.0 + value;
                    }
                }
            }
        }

        let mut hidden_weights = vec![0.0f32; 2 * ACCUMULATOR_SIZE * HIDDEN_SIZE];
        let hidden_scale = 0.1 / (2.0 * ACCUMULATOR_SIZE as f32).sqrt();
        for w in hidden_weights.iter_mut() {
            *w = rng.gen_range(-1.0..1.0f32) * hidden_scale;
        }

        let mut output_weights = vec![0.0f32; HIDDEN_SIZE];
        let output_scale = 0.1 / (HIDDEN_SIZE as f32).sqrt();
        for w in output_weights.iter_mut() {
            *w = rng.gen_range(-1.0..1.0f32) * output_scale;
        }

        NnueWeights {
            input_weights,
            input_biases: vec![0.0; ACCUMULATOR_SIZE],
            hidden_weights,
            hidden_biases: vec![0.0; HIDDEN_SIZE],
            output_weights,
            output_bias: 0.0,
        }
    }

    /// 从小端序 f32 权重文件加载
    fn load(path: &Path) -> Result<Self, String> {
        let mut file = File::open(path).map_err(|e| format!("无法打开权重文件: {}", e))?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)
            .map_err(|e| format!("读取权重文件失败: {}", e))?;

        if bytes.len() != WEIGHT_FILE_FLOATS * 4 {
            return Err(format!(
                "权重文件大小不符: 期望 {} 字节, 实际 {}",
                WEIGHT_FILE_FLOATS * 4,
                bytes.len()
            ));
        }

        let mut floats = bytes
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]));
        let mut take = |n: usize| -> Vec<f32> { floats.by_ref().take(n).collect() };

        let input_weights = take(INPUT_SIZE * ACCUMULATOR_SIZE);
        let input_biases = take(ACCUMULATOR_SIZE);
        let hidden_weights = take(2 * ACCUMULATOR_SIZE * HIDDEN_SIZE);
        let hidden_biases = take(HIDDEN_SIZE);
        let output_weights = take(HIDDEN_SIZE);
        let output_bias = take(1)[0];

        Ok(NnueWeights {
            input_weights,
            input_biases,
            hidden_weights,
            hidden_biases,
            output_weights,
            output_bias,
        })
    }
}

/// 位置评估器
pub struct Evaluator {
    weights: NnueWeights,
}

impl Evaluator {
    /// 使用内置的确定性随机权重
    pub fn new() -> Self {
        Evaluator {
            weights: NnueWeights::random(),
        }
    }

    /// 尝试从文件加载权重，失败则回退到随机初始化
    pub fn from_weights_file(path: &Path) -> Self {
        match NnueWeights::load(path) {
            Ok(weights) => {
                log::info!("已加载 NNUE 权重: {}", path.display());
                Evaluator { weights }
            }
            Err(e) => {
                log::warn!("{}，使用内置权重", e);
                Self::new()
            }
        }
    }

    /// 某一视角下的累加器：所有在场棋子特征行之和
    fn accumulate(&self, board: &Board, perspective: Color) -> [f32; ACCUMULATOR_SIZE] {
        let mut acc = [0.0f32; ACCUMULATOR_SIZE];
        acc.copy_from_slice(&self.weights.input_biases);

        for (pos, piece) in board.pieces(None) {
            let sq = match perspective {
                Color::Red => pos.to_index(),
                Color::Black => mirror_square(pos.to_index()),
            };
            let side = if piece.color == perspective { 0 } else { 1 };
            let row = feature_index(side, piece.kind.index(), sq) * ACCUMULATOR_SIZE;
            for (a, w) in acc
                .iter_mut()
                .zip(&self.weights.input_weights[row..row + ACCUMULATOR_SIZE])
            {
                *a += w;
            }
        }

        acc
    }

    /// 网络前向传播，返回未缩放的原始输出
    fn forward(&self, board: &Board, perspective: Color) -> f32 {
        let acc_own = self.accumulate(board, perspective);
        let acc_opp = self.accumulate(board, perspective.opposite());

        let mut hidden = [0.0f32; HIDDEN_SIZE];
        hidden.copy_from_slice(&self.weights.hidden_biases);
        for (i, &a) in acc_own.iter().chain(acc_opp.iter()).enumerate() {
            let a = clipped_relu(a);
            if a == 0.0 {
                continue;
            }
            let row = i * HIDDEN_SIZE;
            for (h, w) in hidden
                .iter_mut()
                .zip(&self.weights.hidden_weights[row..row + HIDDEN_SIZE])
            {
                *h += a * w;
            }
        }

        let mut output = self.weights.output_bias;
        for (h, w) in hidden.iter().zip(&self.weights.output_weights) {
            output += clipped_relu(*h) * w;
        }

        output
    }

    /// 评估局面，返回厘兵分数（正数对 perspective 有利）
    ///
    /// 混合网络输出与经典评估，未训练网络不至于离谱。
    pub fn evaluate(&self, board: &Board, perspective: Color) -> i32 {
        let nnue_scaled = self.forward(board, perspective) * 100.0;
        let classical = Self::classical(board, perspective) as f32;
        (0.3 * nnue_scaled + 0.7 * classical).round() as i32
    }

    /// 经典评估：子力价值 + 位置表 + 过河兵奖励
    pub fn classical(board: &Board, perspective: Color) -> i32 {
        let mut score = 0;

        for (pos, piece) in board.pieces(None) {
            let mut material = piece.kind.value();

            // 位置表按红方视角书写，黑方翻转行
            let pst_row = match piece.color {
                Color::Red => pos.row as usize,
                Color::Black => BOARD_ROWS - 1 - pos.row as usize,
            };
            let pst_value = pst_table(piece.kind)[pst_row][pos.col as usize];

            if piece.kind == PieceKind::Pawn && pos.has_crossed_river(piece.color) {
                material += 100;
            }

            let piece_value = material + pst_value;
            if piece.color == perspective {
                score += piece_value;
            } else {
                score -= piece_value;
            }
        }

        score
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

#[inline]
fn pst_table(kind: PieceKind) -> &'static [[i32; BOARD_COLS]; BOARD_ROWS] {
    match kind {
        PieceKind::King => &KING_PST,
        PieceKind::Advisor => &ADVISOR_PST,
        PieceKind::Elephant => &ELEPHANT_PST,
        PieceKind::Horse => &HORSE_PST,
        PieceKind::Rook => &ROOK_PST,
        PieceKind::Cannon => &CANNON_PST,
        PieceKind::Pawn => &PAWN_PST,
    }
}

// 位置表均从红方视角书写，行 0 是红方底线。

#[rustfmt::skip]
static KING_PST: [[i32; BOARD_COLS]; BOARD_ROWS] = [
    [0, 0, 0, 8, 8, 8, 0, 0, 0],
    [0, 0, 0, 6, 8, 6, 0, 0, 0],
    [0, 0, 0, 4, 6, 4, 0, 0, 0],
    [0, 0, 0, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, 0, 0, 0, 0],
];

#[rustfmt::skip]
static PAWN_PST: [[i32; BOARD_COLS]; BOARD_ROWS] = [
    [0, 0, 0, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, 0, 0, 0, 0],
    [0, 0, -2, 0, 4, 0, -2, 0, 0],
    [2, 0, 8, 0, 8, 0, 8, 0, 2],
    [6, 12, 18, 18, 20, 18, 18, 12, 6],
    [10, 20, 30, 34, 40, 34, 30, 20, 10],
    [14, 26, 42, 60, 80, 60, 42, 26, 14],
    [18, 36, 56, 80, 120, 80, 56, 36, 18],
    [0, 3, 6, 9, 12, 9, 6, 3, 0],
];

#[rustfmt::skip]
static ROOK_PST: [[i32; BOARD_COLS]; BOARD_ROWS] = [
    [-2, 10, 6, 14, 12, 14, 6, 10, -2],
    [8, 4, 8, 16, 8, 16, 8, 4, 8],
    [4, 8, 6, 14, 12, 14, 6, 8, 4],
    [6, 10, 8, 14, 14, 14, 8, 10, 6],
    [12, 16, 14, 20, 20, 20, 14, 16, 12],
    [12, 14, 12, 18, 18, 18, 12, 14, 12],
    [12, 18, 16, 22, 22, 22, 16, 18, 12],
    [12, 12, 12, 18, 18, 18, 12, 12, 12],
    [16, 20, 18, 24, 26, 24, 18, 20, 16],
    [14, 14, 12, 18, 16, 18, 12, 14, 14],
];

#[rustfmt::skip]
static HORSE_PST: [[i32; BOARD_COLS]; BOARD_ROWS] = [
    [0, -3, 5, 4, 2, 4, 5, -3, 0],
    [-3, 2, 4, 6, 10, 6, 4, 2, -3],
    [4, 6, 10, 15, 16, 15, 10, 6, 4],
    [2, 10, 13, 14, 15, 14, 13, 10, 2],
    [2, 12, 11, 15, 16, 15, 11, 12, 2],
    [0, 5, 13, 12, 12, 12, 13, 5, 0],
    [-3, 2, 5, 5, 5, 5, 5, 2, -3],
    [0, -5, 2, 4, 2, 4, 2, -5, 0],
    [-8, 2, 4, -5, -4, -5, 4, 2, -8],
    [0, -4, 0, 0, 0, 0, 0, -4, 0],
];

#[rustfmt::skip]
static CANNON_PST: [[i32; BOARD_COLS]; BOARD_ROWS] = [
    [0, 0, 1, 0, -1, 0, 1, 0, 0],
    [0, 1, 0, 0, 0, 0, 0, 1, 0],
    [1, 0, 4, 3, 4, 3, 4, 0, 1],
    [3, 2, 3, 4, 3, 4, 3, 2, 3],
    [3, 2, 5, 4, 6, 4, 5, 2, 3],
    [3, 4, 6, 7, 6, 7, 6, 4, 3],
    [2, 3, 4, 4, 3, 4, 4, 3, 2],
    [0, 0, 0, 1, 1, 1, 0, 0, 0],
    [-1, 1, 1, 1, 0, 1, 1, 1, -1],
    [0, 0, 0, 2, 4, 2, 0, 0, 0],
];

#[rustfmt::skip]
static ADVISOR_PST: [[i32; BOARD_COLS]; BOARD_ROWS] = [
    [0, 0, 0, 0, 2, 0, 0, 0, 0],
    [0, 0, 0, 1, 0, 1, 0, 0, 0],
    [0, 0, 0, 0, 1, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, 0, 0, 0, 0],
];

#[rustfmt::skip]
static ELEPHANT_PST: [[i32; BOARD_COLS]; BOARD_ROWS] = [
    [0, 0, 1, 0, 0, 0, 1, 0, 0],
    [0, 0, 0, 0, 0, 0, 0, 0, 0],
    [-2, 0, 0, 0, 3, 0, 0, 0, -2],
    [0, 0, 0, 0, 0, 0, 0, 0, 0],
    [0, 0, 3, 0, 0, 0, 3, 0, 0],
    [0, 0, 0, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, 0, 0, 0, 0],
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fen;

    #[test]
    fn test_classical_initial_position_balanced() {
        let board = Board::new();
        assert_eq!(Evaluator::classical(&board, Color::Red), 0);
        assert_eq!(Evaluator::classical(&board, Color::Black), 0);
    }

    #[test]
    fn test_classical_antisymmetric() {
        let fens = [
            fen::INITIAL_FEN,
            "4k4/9/9/4r4/4P4/9/9/9/9/3K5 w",
            "R3k4/4a4/9/9/9/9/9/9/9/4KR3 b",
        ];
        for f in fens {
            let board = Board::from_fen(f).unwrap();
            assert_eq!(
                Evaluator::classical(&board, Color::Red),
                -Evaluator::classical(&board, Color::Black),
                "antisymmetry violated for {}",
                f
            );
        }
    }

    #[test]
    fn test_classical_prefers_material() {
        // 红多一车
        let board = Board::from_fen("4k4/9/9/9/9/9/9/9/9/3KR4 w").unwrap();
        assert!(Evaluator::classical(&board, Color::Red) > 800);
    }

    #[test]
    fn test_pawn_river_bonus() {
        let before = Board::from_fen("4k4/9/9/9/9/2P6/9/9/9/3K5 w").unwrap();
        let after = Board::from_fen("4k4/9/9/9/2P6/9/9/9/9/3K5 w").unwrap();
        assert!(
            Evaluator::classical(&after, Color::Red)
                > Evaluator::classical(&before, Color::Red) + 99
        );
    }

    #[test]
    fn test_evaluate_deterministic() {
        let board = Board::new();
        let a = Evaluator::new();
        let b = Evaluator::new();
        assert_eq!(a.evaluate(&board, Color::Red), b.evaluate(&board, Color::Red));
    }

    #[test]
    fn test_mirror_square_flips_row_only() {
        assert_eq!(mirror_square(0), 81); // (0,0) -> (9,0)
        assert_eq!(mirror_square(4), 85); // (0,4) -> (9,4)
        assert_eq!(mirror_square(45), 36); // (5,0) -> (4,0)
    }

    #[test]
    fn test_missing_weights_file_falls_back() {
        let eval = Evaluator::from_weights_file(Path::new("/nonexistent/weights.bin"));
        let board = Board::new();
        let reference = Evaluator::new();
        assert_eq!(
            eval.evaluate(&board, Color::Red),
            reference.evaluate(&board, Color::Red)
        );
    }
}
