//! Transposition Table
//!
//! 固定大小的平坦数组，以 Zobrist key 取模寻址。
//! 条目带代数 (generation)，新一轮搜索开始时旧条目自动降级为可替换。

use crate::types::Move;

/// 条目的界类型
///
/// Exact: 精确分数；Lower: 发生 beta 截断，真实分数 >= score；
/// Upper: 所有走法都未超过 alpha，真实分数 <= score。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Exact,
    Lower,
    Upper,
}

/// 置换表条目
#[derive(Debug, Clone, Copy)]
pub struct TtEntry {
    pub key: u64,
    pub depth: i32,
    pub score: i32,
    pub bound: Bound,
    pub best_move: Option<Move>,
    pub generation: u8,
}

/// 置换表
///
/// 容量 = 内存预算 / 条目大小。索引冲突时按替换策略决定去留：
/// 空槽、上代条目、或深度不低于现有条目时覆盖。
pub struct TranspositionTable {
    entries: Vec<Option<TtEntry>>,
    generation: u8,
}

impl TranspositionTable {
    /// 按内存预算 (MB) 创建
    pub fn new(size_mb: usize) -> Self {
        let entry_size = std::mem::size_of::<Option<TtEntry>>();
        let capacity = (size_mb * 1024 * 1024 / entry_size).max(1);
        TranspositionTable {
            entries: vec![None; capacity],
            generation: 0,
        }
    }

    #[inline]
    fn index(&self, key: u64) -> usize {
        (key % self.entries.len() as u64) as usize
    }

    /// 开始新一轮搜索：推进代数，旧条目变得可替换
    pub fn new_search(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    /// 清空全部条目
    pub fn clear(&mut self) {
        for entry in self.entries.iter_mut() {
            *entry = None;
        }
        self.generation = 0;
    }

    /// 查询。仅当完整 key 匹配时返回（取模寻址会碰撞）。
    pub fn probe(&self, key: u64) -> Option<&TtEntry> {
        let idx = self.index(key);
        match &self.entries[idx] {
            Some(entry) if entry.key == key => Some(entry),
            _ => None,
        }
    }

    /// 存储。同代且更深的现有条目优先保留，其余情况覆盖。
    pub fn store(
        &mut self,
        key: u64,
        depth: i32,
        score: i32,
        bound: Bound,
        best_move: Option<Move>,
    ) {
        let idx = self.index(key);
        let replace = match &self.entries[idx] {
            None => true,
            Some(existing) => existing.generation != self.generation || existing.depth <= depth,
        };
        if replace {
            self.entries[idx] = Some(TtEntry {
                key,
                depth,
                score,
                bound,
                best_move,
                generation: self.generation,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_and_probe() {
        let mut tt = TranspositionTable::new(1);
        let mv = Move::from_coord_str("a0a1").unwrap();
        tt.store(0x1234, 5, 42, Bound::Exact, Some(mv));

        let entry = tt.probe(0x1234).expect("entry should be present");
        assert_eq!(entry.depth, 5);
        assert_eq!(entry.score, 42);
        assert_eq!(entry.bound, Bound::Exact);
        assert_eq!(entry.best_move, Some(mv));
    }

    #[test]
    fn test_probe_rejects_key_collision() {
        let mut tt = TranspositionTable::new(1);
        let capacity = tt.entries.len() as u64;
        tt.store(7, 3, 10, Bound::Exact, None);
        // 同槽不同 key
        assert!(tt.probe(7 + capacity).is_none());
        assert!(tt.probe(7).is_some());
    }

    #[test]
    fn test_shallow_entry_does_not_replace_deeper_same_generation() {
        let mut tt = TranspositionTable::new(1);
        tt.store(99, 8, 100, Bound::Exact, None);
        tt.store(99, 3, -50, Bound::Upper, None);
        let entry = tt.probe(99).unwrap();
        assert_eq!(entry.depth, 8);
        assert_eq!(entry.score, 100);
    }

    #[test]
    fn test_old_generation_always_replaced() {
        let mut tt = TranspositionTable::new(1);
        tt.store(99, 8, 100, Bound::Exact, None);
        tt.new_search();
        tt.store(99, 1, -50, Bound::Upper, None);
        let entry = tt.probe(99).unwrap();
        assert_eq!(entry.depth, 1);
        assert_eq!(entry.score, -50);
    }

    #[test]
    fn test_clear_empties_table() {
        let mut tt = TranspositionTable::new(1);
        tt.store(1, 1, 1, Bound::Exact, None);
        tt.clear();
        assert!(tt.probe(1).is_none());
    }
}
