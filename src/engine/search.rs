//! 迭代加深 Alpha-Beta (PVS) 搜索
//!
//! 搜索采用 negamax 约定：返回分数相对于当前走子方，调用方取负。
//! 剪枝手段：杀棋距离裁剪、置换表截断、空着裁剪、LMR、期望窗口。
//! 超时是优雅截断：中断的子树不写入置换表，驱动层只采用
//! 完整完成的迭代结果。

use std::sync::atomic::Ordering as AtomicOrdering;
use std::time::Instant;

use crate::board::Board;
use crate::types::Move;

use super::ordering::MAX_PLY;
use super::tt::Bound;
use super::zobrist;
use super::{Engine, MoveOrderer, SearchLimits, SearchOutcome, SearchStats};
use super::{INFINITY, MATE_SCORE, MATE_THRESHOLD};

/// 每隔多少节点主动检查时间/停止标志
const TIME_CHECK_INTERVAL: u64 = 2048;
/// 期望窗口半宽
const ASPIRATION_WINDOW: i32 = 50;
/// 静态搜索 delta 裁剪余量
const DELTA_MARGIN: i32 = 200;

lazy_static::lazy_static! {
    /// LMR 缩减表，按 (深度, 走法序号) 索引
    static ref LMR_TABLE: [[i32; MAX_PLY]; MAX_PLY] = {
        let mut table = [[0i32; MAX_PLY]; MAX_PLY];
        for (d, row) in table.iter_mut().enumerate().skip(1) {
            for (m, slot) in row.iter_mut().enumerate().skip(1) {
                *slot = (0.75 + (d as f64).ln() * (m as f64).ln() / 2.25) as i32;
            }
        }
        table
    };
}

#[inline]
fn lmr_reduction(depth: i32, move_index: usize) -> i32 {
    let d = (depth.max(0) as usize).min(MAX_PLY - 1);
    let m = move_index.min(MAX_PLY - 1);
    LMR_TABLE[d][m]
}

impl Engine {
    /// 迭代加深搜索驱动
    ///
    /// 从深度 1 逐层加深到 `max_depth`，每层用上一层分数两侧
    /// 各 50 的期望窗口先搜，失败则同层全窗口重搜。
    /// 发布的走法永远来自完整完成的一层，深度 1 不受时间限制约束，
    /// 保证至少有一个合法走法可以返回。
    pub fn search(&mut self, board: &mut Board, limits: &SearchLimits) -> SearchOutcome {
        let start = Instant::now();
        self.stopped = false;
        self.deadline = limits.time_limit.map(|t| start + t);
        self.stop_flag = limits.stop.clone();
        self.stats = SearchStats::default();
        self.tt.new_search();

        let mut best_move = None;
        let mut best_score = -INFINITY;
        let mut completed_depth = 0u32;

        let max_depth = limits.max_depth.max(1) as i32;
        for depth in 1..=max_depth {
            if depth > 1 && self.should_stop() {
                break;
            }

            let (alpha, beta) = if depth <= 1 {
                (-INFINITY, INFINITY)
            } else {
                (best_score - ASPIRATION_WINDOW, best_score + ASPIRATION_WINDOW)
            };

            let (mut score, mut mv) = self.search_root(board, depth, alpha, beta);

            if !self.stopped && (score <= alpha || score >= beta) {
                log::debug!(
                    "深度 {} 分数 {} 超出期望窗口 [{}, {}]，全窗口重搜",
                    depth, score, alpha, beta
                );
                let (full_score, full_move) = self.search_root(board, depth, -INFINITY, INFINITY);
                score = full_score;
                mv = full_move;
            }

            if self.stopped {
                break;
            }

            best_score = score;
            best_move = mv;
            completed_depth = depth as u32;
            log::debug!(
                "深度 {} 完成: 分数 {}, 最佳 {:?}, 节点 {}",
                depth, score, mv, self.stats.nodes
            );

            // 无合法走法，加深没有意义
            if mv.is_none() {
                break;
            }
        }

        self.stats.elapsed = start.elapsed();
        log::info!(
            "搜索完成: 深度 {}, 分数 {}, 节点 {} (+{} 静态), 用时 {:?}",
            completed_depth, best_score, self.stats.nodes, self.stats.qnodes, self.stats.elapsed
        );

        SearchOutcome {
            best_move,
            score: best_score,
            depth: completed_depth,
            stats: self.stats,
        }
    }

    /// 根节点搜索
    ///
    /// 与内部节点的区别：置换表只用于排序提示不做截断，
    /// 并显式跟踪最佳走法而不只是分数。
    fn search_root(
        &mut self,
        board: &mut Board,
        depth: i32,
        mut alpha: i32,
        beta: i32,
    ) -> (i32, Option<Move>) {
        let side = board.current_turn();
        let mut moves = board.legal_moves(side);
        if moves.is_empty() {
            return (-MATE_SCORE, None);
        }

        let hash_key = zobrist::hash_board(board);
        let tt_move = self.tt.probe(hash_key).and_then(|e| e.best_move);
        self.orderer.order_moves(board, &mut moves, 0, tt_move);

        let alpha_orig = alpha;
        let mut best_move = moves[0];
        let mut best_score = -INFINITY;

        for (i, &mv) in moves.iter().enumerate() {
            if self.stopped {
                break;
            }

            let is_quiet = board.get_piece(mv.to).is_none();
            let is_killer = self.orderer.is_killer(0, mv);
            let captured = board.make_move(mv);
            let score = if i == 0 {
                -self.alpha_beta(board, depth - 1, -beta, -alpha, 1, true)
            } else {
                self.pvs_later_move(board, depth, alpha, beta, 1, i, is_quiet, is_killer)
            };
            board.undo_move(mv, captured);

            if self.stopped {
                break;
            }

            if score > best_score {
                best_score = score;
                best_move = mv;
            }
            if score > alpha {
                alpha = score;
            }
            if alpha >= beta {
                break;
            }
        }

        if !self.stopped {
            let bound = if best_score >= beta {
                Bound::Lower
            } else if best_score <= alpha_orig {
                Bound::Upper
            } else {
                Bound::Exact
            };
            self.tt.store(hash_key, depth, best_score, bound, Some(best_move));
        }

        (best_score, Some(best_move))
    }

    /// 内部节点的递归 Alpha-Beta
    pub(crate) fn alpha_beta(
        &mut self,
        board: &mut Board,
        depth: i32,
        mut alpha: i32,
        mut beta: i32,
        ply: i32,
        null_allowed: bool,
    ) -> i32 {
        self.stats.nodes += 1;
        if self.stats.nodes % TIME_CHECK_INTERVAL == 0 {
            self.should_stop();
        }
        if self.stopped {
            return 0;
        }

        // 杀棋距离裁剪：更近的杀棋已经找到时收窄窗口
        alpha = alpha.max(-MATE_SCORE + ply);
        beta = beta.min(MATE_SCORE - ply);
        if alpha >= beta {
            return alpha;
        }

        let alpha_orig = alpha;

        let hash_key = zobrist::hash_board(board);
        let mut tt_move = None;
        if let Some(entry) = self.tt.probe(hash_key) {
            self.stats.tt_hits += 1;
            tt_move = entry.best_move;

            if entry.depth >= depth {
                // 杀棋分数是相对根的，按当前 ply 调整
                let mut score = entry.score;
                if score > MATE_THRESHOLD {
                    score -= ply;
                } else if score < -MATE_THRESHOLD {
                    score += ply;
                }

                match entry.bound {
                    Bound::Exact => {
                        self.stats.tt_cutoffs += 1;
                        return score;
                    }
                    Bound::Upper if score <= alpha => {
                        self.stats.tt_cutoffs += 1;
                        return alpha;
                    }
                    Bound::Lower if score >= beta => {
                        self.stats.tt_cutoffs += 1;
                        return beta;
                    }
                    _ => {}
                }
            }
        }

        let side = board.current_turn();

        // 残缺局面（缺将帅）按已分胜负处理，不让它进入评估
        if board.find_king(side).is_none() {
            return -MATE_SCORE + ply;
        }
        if board.find_king(side.opposite()).is_none() {
            return MATE_SCORE - ply;
        }

        let in_check = board.is_in_check(side);
        let mut moves = board.legal_moves(side);
        if moves.is_empty() {
            // 将死或困毙
            return if in_check { -MATE_SCORE + ply } else { 0 };
        }

        if depth <= 0 {
            return self.quiescence(board, alpha, beta);
        }

        // 空着裁剪：让对方连走一步仍够不到 beta 时直接截断
        if null_allowed && depth >= 3 && !in_check {
            let reduction = 3 + depth / 4;
            board.set_turn(side.opposite());
            let score =
                -self.alpha_beta(board, depth - 1 - reduction, -beta, -beta + 1, ply + 1, false);
            board.set_turn(side);
            if self.stopped {
                return 0;
            }
            if score >= beta {
                self.stats.null_cutoffs += 1;
                return beta;
            }
        }

        self.orderer
            .order_moves(board, &mut moves, ply as usize, tt_move);

        let mut best_move = moves[0];
        let mut best_score = -INFINITY;
        let mut tried_quiets: Vec<Move> = Vec::new();

        for (i, &mv) in moves.iter().enumerate() {
            let is_quiet = board.get_piece(mv.to).is_none();
            let is_killer = self.orderer.is_killer(ply as usize, mv);
            let captured = board.make_move(mv);
            let score = if i == 0 {
                -self.alpha_beta(board, depth - 1, -beta, -alpha, ply + 1, true)
            } else {
                self.pvs_later_move(board, depth, alpha, beta, ply + 1, i, is_quiet, is_killer)
            };
            board.undo_move(mv, captured);

            if self.stopped {
                return 0;
            }

            if score > best_score {
                best_score = score;
                best_move = mv;
            }
            if score > alpha {
                alpha = score;
            }
            if alpha >= beta {
                // 安静走法造成截断：记为杀手并奖励历史，
                // 之前试过的安静走法得到负调整
                if is_quiet {
                    self.orderer.update_killers(ply as usize, mv);
                    self.orderer.update_history(board, mv, depth, true);
                    for &quiet in &tried_quiets {
                        self.orderer.update_history(board, quiet, depth, false);
                    }
                }
                break;
            }
            if is_quiet {
                tried_quiets.push(mv);
            }
        }

        let bound = if best_score >= beta {
            Bound::Lower
        } else if best_score <= alpha_orig {
            Bound::Upper
        } else {
            Bound::Exact
        };
        self.tt.store(hash_key, depth, best_score, bound, Some(best_move));

        best_score
    }

    /// PVS 对后续走法的搜索：先带 LMR 的零窗口，失败则逐级重搜
    ///
    /// 调用时走法已经执行在棋盘上。
    #[allow(clippy::too_many_arguments)]
    fn pvs_later_move(
        &mut self,
        board: &mut Board,
        depth: i32,
        alpha: i32,
        beta: i32,
        child_ply: i32,
        move_index: usize,
        is_quiet: bool,
        is_killer: bool,
    ) -> i32 {
        let mut reduction = 0;
        if is_quiet && !is_killer && move_index >= 4 && depth >= 3 {
            reduction = lmr_reduction(depth, move_index);
            if reduction > 0 {
                self.stats.lmr_reductions += 1;
            }
        }

        let mut score = -self.alpha_beta(
            board,
            depth - 1 - reduction,
            -alpha - 1,
            -alpha,
            child_ply,
            true,
        );

        // 缩减深度下超出 alpha：先以全深度零窗口确认
        if score > alpha && reduction > 0 {
            score = -self.alpha_beta(board, depth - 1, -alpha - 1, -alpha, child_ply, true);
        }
        // 确认超出 alpha 且未破 beta：全窗口重搜取精确值
        if score > alpha && score < beta {
            score = -self.alpha_beta(board, depth - 1, -beta, -alpha, child_ply, true);
        }

        score
    }

    /// 静态搜索：只扩展吃子走法，消除水平线效应
    fn quiescence(&mut self, board: &mut Board, mut alpha: i32, beta: i32) -> i32 {
        self.stats.qnodes += 1;

        let side = board.current_turn();
        let stand_pat = self.evaluator.evaluate(board, side);

        if stand_pat >= beta {
            return beta;
        }
        if stand_pat > alpha {
            alpha = stand_pat;
        }

        let mut moves = board.capture_moves(side);
        MoveOrderer::order_captures(board, &mut moves);

        for mv in moves {
            // delta 裁剪：吃到也追不上 alpha 的交换不展开
            if let Some(victim) = board.get_piece(mv.to) {
                if stand_pat + victim.kind.value() + DELTA_MARGIN < alpha {
                    continue;
                }
            }

            let captured = board.make_move(mv);
            let score = -self.quiescence(board, -beta, -alpha);
            board.undo_move(mv, captured);

            if score >= beta {
                return beta;
            }
            if score > alpha {
                alpha = score;
            }
        }

        alpha
    }

    /// 检查时间限制与取消标志，触发则置位 stopped
    fn should_stop(&mut self) -> bool {
        if self.stopped {
            return true;
        }
        if let Some(flag) = &self.stop_flag {
            if flag.load(AtomicOrdering::Relaxed) {
                self.stopped = true;
                return true;
            }
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                self.stopped = true;
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Evaluator;
    use crate::test_positions;
    use crate::types::Color;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;
    use std::time::Duration;

    fn engine() -> Engine {
        Engine::new(1)
    }

    #[test]
    fn test_depth_one_returns_legal_move() {
        let mut board = Board::new();
        let mut eng = engine();
        let outcome = eng.search(&mut board, &SearchLimits::depth(1));
        let mv = outcome.best_move.expect("initial position has moves");
        assert!(board.legal_moves(Color::Red).contains(&mv));
        assert_eq!(outcome.depth, 1);
    }

    #[test]
    fn test_mated_position_returns_no_move() {
        let mut board = Board::from_fen(test_positions::MATED_BLACK).unwrap();
        let mut eng = engine();
        let outcome = eng.search(&mut board, &SearchLimits::depth(3));
        assert!(outcome.best_move.is_none());
        assert_eq!(outcome.score, -MATE_SCORE);
    }

    #[test]
    fn test_stalemate_returns_no_move() {
        let mut board = Board::from_fen(test_positions::STALEMATE_BLACK).unwrap();
        let mut eng = engine();
        let outcome = eng.search(&mut board, &SearchLimits::depth(2));
        assert!(outcome.best_move.is_none());
    }

    #[test]
    fn test_mate_score_at_ply_zero() {
        let mut board = Board::from_fen(test_positions::MATED_BLACK).unwrap();
        let mut eng = engine();
        let score = eng.alpha_beta(&mut board, 1, -INFINITY, INFINITY, 0, false);
        assert_eq!(score, -MATE_SCORE);
    }

    #[test]
    fn test_finds_mate_in_one() {
        let mut board = Board::from_fen(test_positions::MATE_IN_ONE_RED).unwrap();
        let mut eng = engine();
        let outcome = eng.search(&mut board, &SearchLimits::depth(3));
        let mv = outcome.best_move.expect("must find a move");
        assert!(outcome.score >= MATE_SCORE - 2, "score {}", outcome.score);

        // 走完后对方确实被将死
        let captured = board.make_move(mv);
        assert!(board.legal_moves(Color::Black).is_empty());
        assert!(board.is_in_check(Color::Black));
        board.undo_move(mv, captured);
    }

    #[test]
    fn test_quiescence_without_captures_is_stand_pat() {
        let mut board = Board::from_fen(test_positions::QUIET_SPARSE).unwrap();
        let mut eng = engine();
        let stand_pat = eng.evaluator.evaluate(&board, board.current_turn());
        let score = eng.quiescence(&mut board, -INFINITY, INFINITY);
        assert_eq!(score, stand_pat);
    }

    #[test]
    fn test_alpha_beta_matches_minimax() {
        // 剪枝只能省工作量，不能改变分数
        fn minimax(board: &mut Board, depth: i32, eval: &Evaluator) -> i32 {
            let side = board.current_turn();
            let moves = board.legal_moves(side);
            if moves.is_empty() {
                return if board.is_in_check(side) { -MATE_SCORE } else { 0 };
            }
            if depth <= 0 {
                return eval.evaluate(board, side);
            }
            let mut best = -INFINITY;
            for mv in moves {
                let captured = board.make_move(mv);
                let score = -minimax(board, depth - 1, eval);
                board.undo_move(mv, captured);
                best = best.max(score);
            }
            best
        }

        let mut board = Board::from_fen(test_positions::QUIET_SPARSE).unwrap();
        let mut eng = engine();
        let expected = minimax(&mut board, 2, &eng.evaluator);
        let outcome = eng.search(&mut board, &SearchLimits::depth(2));
        assert_eq!(outcome.score, expected);
    }

    #[test]
    fn test_tiny_time_budget_still_returns_depth_one_move() {
        let mut board = Board::new();
        let mut eng = engine();
        let limits = SearchLimits::depth(4).with_time(Duration::ZERO);
        let outcome = eng.search(&mut board, &limits);
        assert!(outcome.best_move.is_some());
        assert_eq!(outcome.depth, 1);
    }

    #[test]
    fn test_preset_stop_flag_limits_to_depth_one() {
        let mut board = Board::new();
        let mut eng = engine();
        let stop = Arc::new(AtomicBool::new(true));
        let limits = SearchLimits::depth(4).with_stop(stop);
        let outcome = eng.search(&mut board, &limits);
        assert!(outcome.best_move.is_some());
        assert_eq!(outcome.depth, 1);
    }

    #[test]
    fn test_deeper_search_not_weaker_on_material_grab() {
        // 黑车白送，任何深度都应该吃
        let mut board = Board::from_fen(test_positions::HANGING_ROOK_RED).unwrap();
        let mut eng = engine();
        let outcome = eng.search(&mut board, &SearchLimits::depth(3));
        let mv = outcome.best_move.expect("must find a move");
        assert_eq!(
            board.get_piece(mv.to).map(|p| p.kind),
            Some(crate::types::PieceKind::Rook)
        );
    }
}
