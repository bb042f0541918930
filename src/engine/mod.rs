//! 搜索引擎
//!
//! 负责从当前局面中找出最佳走法。核心是带置换表的迭代加深
//! Alpha-Beta (PVS) 搜索，配合空着裁剪、LMR、静态搜索等剪枝手段，
//! 评估由 NNUE 与经典评估混合完成。
//!
//! 引擎是显式的上下文对象：置换表、排序器、评估器、统计都属于
//! 单个 `Engine` 实例，可并存多个互不干扰的实例。

pub mod nnue;
pub mod ordering;
pub mod search;
pub mod tt;
pub mod zobrist;

pub use nnue::Evaluator;
pub use ordering::MoveOrderer;
pub use tt::{Bound, TranspositionTable};

use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::board::Board;
use crate::types::Move;

pub const INFINITY: i32 = 999_999;
pub const MATE_SCORE: i32 = 100_000;
pub const MATE_THRESHOLD: i32 = MATE_SCORE - 1000;

/// 搜索统计（诊断用，不影响结果）
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchStats {
    pub nodes: u64,
    pub qnodes: u64,
    pub tt_hits: u64,
    pub tt_cutoffs: u64,
    pub null_cutoffs: u64,
    pub lmr_reductions: u64,
    pub elapsed: Duration,
}

/// 搜索限制
///
/// `stop` 是协作式取消标志：外部置位后搜索在下一个检查点退出。
#[derive(Clone, Default)]
pub struct SearchLimits {
    pub max_depth: u32,
    pub time_limit: Option<Duration>,
    pub stop: Option<Arc<AtomicBool>>,
}

impl SearchLimits {
    pub fn depth(max_depth: u32) -> Self {
        SearchLimits {
            max_depth,
            time_limit: None,
            stop: None,
        }
    }

    pub fn with_time(mut self, time_limit: Duration) -> Self {
        self.time_limit = Some(time_limit);
        self
    }

    pub fn with_stop(mut self, stop: Arc<AtomicBool>) -> Self {
        self.stop = Some(stop);
        self
    }
}

/// 搜索结果
///
/// `best_move` 为 None 表示当前方无合法走法（被将死或困毙）。
/// `depth` 是最后一个完整完成的迭代深度，超时中断的迭代不计入。
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub best_move: Option<Move>,
    pub score: i32,
    pub depth: u32,
    pub stats: SearchStats,
}

/// 难度预设：搜索深度 + 时间限制
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Difficulty {
    pub depth: u32,
    pub time_limit: Duration,
}

impl Difficulty {
    /// 按名称解析难度，未知名称返回 Err
    pub fn from_name(name: &str) -> Result<Difficulty, String> {
        let (depth, millis) = match name {
            "novice" => (2, 500),
            "beginner" => (3, 1000),
            "intermediate" => (4, 2000),
            "advanced" => (5, 4000),
            "master" => (6, 8000),
            _ => return Err(format!("未知难度: {}", name)),
        };
        Ok(Difficulty {
            depth,
            time_limit: Duration::from_millis(millis),
        })
    }
}

/// 搜索引擎实例
pub struct Engine {
    pub(crate) tt: TranspositionTable,
    pub(crate) orderer: MoveOrderer,
    pub(crate) evaluator: Evaluator,
    pub(crate) stats: SearchStats,
    // 单次搜索的控制状态
    pub(crate) stopped: bool,
    pub(crate) deadline: Option<Instant>,
    pub(crate) stop_flag: Option<Arc<AtomicBool>>,
}

impl Engine {
    /// 创建引擎，置换表按 MB 预算分配
    pub fn new(tt_size_mb: usize) -> Engine {
        log::info!("初始化搜索引擎: 置换表 {} MB", tt_size_mb);
        Engine {
            tt: TranspositionTable::new(tt_size_mb),
            orderer: MoveOrderer::new(),
            evaluator: Evaluator::new(),
            stats: SearchStats::default(),
            stopped: false,
            deadline: None,
            stop_flag: None,
        }
    }

    /// 使用外部评估器（例如从权重文件加载的 NNUE）
    pub fn with_evaluator(tt_size_mb: usize, evaluator: Evaluator) -> Engine {
        let mut engine = Engine::new(tt_size_mb);
        engine.evaluator = evaluator;
        engine
    }

    /// 上一次搜索的统计
    pub fn stats(&self) -> &SearchStats {
        &self.stats
    }

    /// 清空置换表与排序启发（对局之间调用）
    pub fn clear(&mut self) {
        self.tt.clear();
        self.orderer.clear();
    }

    /// 按难度预设搜索最佳走法
    pub fn find_best_move(
        &mut self,
        board: &mut Board,
        difficulty: &str,
    ) -> Result<Option<Move>, String> {
        let config = Difficulty::from_name(difficulty)?;
        let limits = SearchLimits::depth(config.depth).with_time(config.time_limit);
        Ok(self.search(board, &limits).best_move)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Engine::new(64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_difficulty_names() {
        assert_eq!(
            Difficulty::from_name("novice").unwrap(),
            Difficulty {
                depth: 2,
                time_limit: Duration::from_millis(500)
            }
        );
        assert_eq!(Difficulty::from_name("master").unwrap().depth, 6);
        assert!(Difficulty::from_name("grandmaster").is_err());
    }

    #[test]
    fn test_find_best_move_rejects_unknown_difficulty() {
        let mut engine = Engine::new(1);
        let mut board = Board::new();
        assert!(engine.find_best_move(&mut board, "impossible").is_err());
    }
}
