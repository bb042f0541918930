//! 测试局面库
//!
//! 提供命名的 FEN 测试局面，方便测试和调试
//!
//! 命名规范:
//! - START: 初始局面
//! - CHECK_n: 将军测试
//! - MATE_n: 杀棋与被杀测试
//! - PAWN_n: 兵规则测试
//! - END_n: 残局
//!
//! 格式: `<棋盘10行> <走子方 w|b>`，第一行是第 9 行（黑方底线）。

// =============================================================================
// 开局 (START)
// =============================================================================

/// 标准初始局面
pub const START: &str = "rnbakabnr/9/1c5c1/p1p1p1p1p/9/9/P1P1P1P1P/1C5C1/9/RNBAKABNR w";

// =============================================================================
// 将军 (CHECK)
// =============================================================================

/// 红车 e8 照将，黑被将军，红方无事
pub const CHECK_ROOK: &str = "4k4/4R4/9/9/9/9/9/9/9/4K4 b";

// =============================================================================
// 杀棋 (MATE)
// =============================================================================

/// 黑方已被将死：车 a9 照将，士被白脸将钉住无法垫将，
/// d9/f9 分别被车 a9 与车 f0 控制
pub const MATED_BLACK: &str = "R3k4/4a4/9/9/9/9/9/9/9/4KR3 b";

/// 红方一步杀：车 a8 进 a9 即成上面的杀型
pub const MATE_IN_ONE_RED: &str = "4k4/R3a4/9/9/9/9/9/9/9/4KR3 w";

/// 黑方困毙：未被将军但无合法走法，按和棋处理
pub const STALEMATE_BLACK: &str = "4k4/3P1P3/9/9/9/9/9/9/9/3K5 b";

// =============================================================================
// 兵规则 (PAWN)
// =============================================================================

/// 红兵 a3 未过河，只能直进
pub const PAWN_BEFORE_RIVER: &str = "4k4/9/9/9/9/9/P8/9/9/3K5 w";

/// 红兵 e5 已过河，可进可平
pub const PAWN_AFTER_RIVER: &str = "4k4/9/9/9/4P4/9/9/9/9/3K5 w";

// =============================================================================
// 残局 (END)
// =============================================================================

/// 稀疏安静残局：双方各一兵远隔两翼，数步之内不存在任何吃子
pub const QUIET_SPARSE: &str = "5k3/9/9/8p/9/9/P8/9/9/3K5 w";

/// 黑车无根，红车一步可得
pub const HANGING_ROOK_RED: &str = "r3k4/9/9/9/9/9/9/9/9/R2K5 w";

/// 车兵对士象残局（基准测试用的中等复杂度局面）
pub const END_ROOK_PAWN: &str = "3k5/9/4b4/9/9/9/4P4/9/4K4/2R6 w";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;

    #[test]
    fn test_all_positions_parse() {
        let all = [
            START,
            CHECK_ROOK,
            MATED_BLACK,
            MATE_IN_ONE_RED,
            STALEMATE_BLACK,
            PAWN_BEFORE_RIVER,
            PAWN_AFTER_RIVER,
            QUIET_SPARSE,
            HANGING_ROOK_RED,
            END_ROOK_PAWN,
        ];
        for fen in all {
            Board::from_fen(fen).unwrap_or_else(|e| panic!("{} 无法解析: {}", fen, e));
        }
    }
}
