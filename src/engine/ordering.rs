//! Move Ordering
//!
//! Alpha-Beta 的剪枝效率几乎完全取决于走法顺序。
//! 排序优先级：置换表走法 > 吃子 (MVV-LVA) > 杀手走法 > 历史启发。

use crate::board::Board;
use crate::types::{Move, NUM_PIECE_KINDS, NUM_SQUARES};

/// 搜索树的最大深度（杀手表按 ply 索引）
pub const MAX_PLY: usize = 64;

const TT_MOVE_SCORE: i32 = 1_000_000;
const CAPTURE_BASE: i32 = 100_000;
const KILLER_SCORE: i32 = 90_000;
const HISTORY_CLAMP: i32 = 8_000;

/// 走法排序器
///
/// 杀手表：每个 ply 保留最近两个造成截断的安静走法。
/// 历史表：按 (颜色, 棋子类型, 目标格) 累积截断奖励，随搜索加深自然老化。
pub struct MoveOrderer {
    killers: [[Option<Move>; 2]; MAX_PLY],
    history: [[[i32; NUM_SQUARES]; NUM_PIECE_KINDS]; 2],
}

impl MoveOrderer {
    pub fn new() -> Self {
        MoveOrderer {
            killers: [[None; 2]; MAX_PLY],
            history: [[[0; NUM_SQUARES]; NUM_PIECE_KINDS]; 2],
        }
    }

    /// 重置两张表（新一局搜索）
    pub fn clear(&mut self) {
        self.killers = [[None; 2]; MAX_PLY];
        self.history = [[[0; NUM_SQUARES]; NUM_PIECE_KINDS]; 2];
    }

    /// MVV-LVA：优先吃价值高的子，用价值低的子去吃
    #[inline]
    pub fn mvv_lva(board: &Board, mv: Move) -> i32 {
        let victim = match board.get_piece(mv.to) {
            Some(p) => p.kind.value(),
            None => return 0,
        };
        let attacker = match board.get_piece(mv.from) {
            Some(p) => p.kind.value(),
            None => 0,
        };
        10 * victim - attacker
    }

    #[inline]
    pub fn is_killer(&self, ply: usize, mv: Move) -> bool {
        ply < MAX_PLY && self.killers[ply].contains(&Some(mv))
    }

    /// 记录造成 beta 截断的安静走法
    pub fn update_killers(&mut self, ply: usize, mv: Move) {
        if ply >= MAX_PLY || self.killers[ply][0] == Some(mv) {
            return;
        }
        self.killers[ply][1] = self.killers[ply][0];
        self.killers[ply][0] = Some(mv);
    }

    /// 历史奖惩。截断走法 +depth^2，同节点已尝试过的安静走法 -depth^2。
    pub fn update_history(&mut self, board: &Board, mv: Move, depth: i32, bonus: bool) {
        let piece = match board.get_piece(mv.from) {
            Some(p) => p,
            None => return,
        };
        let delta = if bonus { depth * depth } else { -(depth * depth) };
        let slot =
            &mut self.history[piece.color.index()][piece.kind.index()][mv.to.to_index()];
        *slot = (*slot + delta).clamp(-HISTORY_CLAMP, HISTORY_CLAMP);
    }

    #[inline]
    fn history_score(&self, board: &Board, mv: Move) -> i32 {
        match board.get_piece(mv.from) {
            Some(p) => self.history[p.color.index()][p.kind.index()][mv.to.to_index()],
            None => 0,
        }
    }

    /// 给单个走法打分
    fn score_move(&self, board: &Board, mv: Move, ply: usize, tt_move: Option<Move>) -> i32 {
        if tt_move == Some(mv) {
            return TT_MOVE_SCORE;
        }
        if board.get_piece(mv.to).is_some() {
            return CAPTURE_BASE + Self::mvv_lva(board, mv);
        }
        if self.is_killer(ply, mv) {
            return KILLER_SCORE;
        }
        self.history_score(board, mv)
    }

    /// 原地按分数降序排序
    pub fn order_moves(
        &self,
        board: &Board,
        moves: &mut [Move],
        ply: usize,
        tt_move: Option<Move>,
    ) {
        let mut scored: Vec<(i32, Move)> = moves
            .iter()
            .map(|&mv| (self.score_move(board, mv, ply, tt_move), mv))
            .collect();
        scored.sort_by_key(|&(score, _)| std::cmp::Reverse(score));
        for (slot, (_, mv)) in moves.iter_mut().zip(scored) {
            *slot = mv;
        }
    }

    /// 静态搜索用：按 MVV-LVA 对吃子走法降序排序
    pub fn order_captures(board: &Board, moves: &mut [Move]) {
        moves.sort_by_key(|&mv| std::cmp::Reverse(Self::mvv_lva(board, mv)));
    }
}

impl Default for MoveOrderer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mvv_lva_prefers_valuable_victims() {
        // 红兵可吃黑车或黑卒
        let board =
            Board::from_fen("4k4/9/9/3rPp3/9/9/9/9/9/4K4 w").expect("valid fen");
        let take_rook = Move::from_coord_str("e6d6").unwrap();
        let take_pawn = Move::from_coord_str("e6f6").unwrap();
        assert!(
            MoveOrderer::mvv_lva(&board, take_rook) > MoveOrderer::mvv_lva(&board, take_pawn)
        );
    }

    #[test]
    fn test_tt_move_ordered_first() {
        let board = Board::new();
        let mut moves = board.legal_moves(board.current_turn());
        let tt_move = moves[moves.len() - 1];
        let orderer = MoveOrderer::new();
        orderer.order_moves(&board, &mut moves, 0, Some(tt_move));
        assert_eq!(moves[0], tt_move);
    }

    #[test]
    fn test_killer_shift_keeps_two_distinct() {
        let mut orderer = MoveOrderer::new();
        let a = Move::from_coord_str("a0a1").unwrap();
        let b = Move::from_coord_str("b0b1").unwrap();
        orderer.update_killers(3, a);
        orderer.update_killers(3, b);
        assert!(orderer.is_killer(3, a));
        assert!(orderer.is_killer(3, b));
        // 重复记录不挤掉另一个槽
        orderer.update_killers(3, b);
        assert!(orderer.is_killer(3, a));
    }

    #[test]
    fn test_history_clamped() {
        let mut orderer = MoveOrderer::new();
        let board = Board::new();
        let mv = Move::from_coord_str("a0a1").unwrap();
        for _ in 0..100 {
            orderer.update_history(&board, mv, 20, true);
        }
        assert_eq!(orderer.history_score(&board, mv), HISTORY_CLAMP);
        for _ in 0..200 {
            orderer.update_history(&board, mv, 20, false);
        }
        assert_eq!(orderer.history_score(&board, mv), -HISTORY_CLAMP);
    }

    #[test]
    fn test_captures_ordered_before_quiets() {
        let board =
            Board::from_fen("4k4/9/9/4r4/4P4/9/9/9/9/3K5 w").expect("valid fen");
        // 红兵 e5 可直进吃 e6 车，也有安静走法
        let mut moves = board.legal_moves(board.current_turn());
        let orderer = MoveOrderer::new();
        orderer.order_moves(&board, &mut moves, 0, None);
        let first_is_capture = board.get_piece(moves[0].to).is_some();
        assert!(first_is_capture);
    }
}
