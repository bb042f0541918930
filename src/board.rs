//! 中国象棋棋盘
//!
//! 使用 90 格数组存储棋子，make/unmake 方式走子（不克隆棋盘）。

use crate::fen::{parse_fen, squares_to_fen, INITIAL_FEN};
use crate::types::{Color, GameResult, Move, Piece, PieceKind, Position, BOARD_COLS};

/// 棋盘状态
#[derive(Clone)]
pub struct Board {
    /// 90 个格子的棋子数组 (10 行 x 9 列)
    squares: [Option<Piece>; 90],
    current_turn: Color,
    /// 缓存红方帅的位置
    red_king_pos: Option<Position>,
    /// 缓存黑方将的位置
    black_king_pos: Option<Position>,
}

impl Board {
    /// 初始局面
    pub fn new() -> Board {
        Board::from_fen(INITIAL_FEN).expect("INITIAL_FEN must parse")
    }

    /// 从 FEN 字符串创建棋盘
    pub fn from_fen(fen: &str) -> Result<Board, String> {
        let state = parse_fen(fen)?;
        let mut squares = [None; 90];
        let mut red_king_pos = None;
        let mut black_king_pos = None;

        for (pos, piece) in state.pieces {
            if piece.kind == PieceKind::King {
                match piece.color {
                    Color::Red => red_king_pos = Some(pos),
                    Color::Black => black_king_pos = Some(pos),
                }
            }
            squares[pos.to_index()] = Some(piece);
        }

        Ok(Board {
            squares,
            current_turn: state.turn,
            red_king_pos,
            black_king_pos,
        })
    }

    /// 序列化为 FEN 字符串
    pub fn to_fen(&self) -> String {
        squares_to_fen(&self.squares, self.current_turn)
    }

    /// 当前走子方
    #[inline]
    pub fn current_turn(&self) -> Color {
        self.current_turn
    }

    /// 设置走子方（用于 Null Move Pruning 的"让着"）
    #[inline]
    pub fn set_turn(&mut self, color: Color) {
        self.current_turn = color;
    }

    /// 获取某位置的棋子
    #[inline]
    pub fn get_piece(&self, pos: Position) -> Option<Piece> {
        if !pos.is_valid() {
            return None;
        }
        self.squares[pos.to_index()]
    }

    #[inline]
    fn has_piece(&self, pos: Position) -> bool {
        pos.is_valid() && self.squares[pos.to_index()].is_some()
    }

    /// 棋子格子数组（供 Zobrist 哈希和评估遍历）
    #[inline]
    pub fn squares(&self) -> &[Option<Piece>; 90] {
        &self.squares
    }

    /// 遍历所有棋子（可按颜色过滤）
    pub fn pieces(&self, color: Option<Color>) -> impl Iterator<Item = (Position, Piece)> + '_ {
        self.squares
            .iter()
            .enumerate()
            .filter_map(|(idx, p)| p.map(|piece| (Position::from_index(idx), piece)))
            .filter(move |(_, p)| color.map_or(true, |c| p.color == c))
    }

    /// 找到将/帅的位置（使用缓存）
    #[inline]
    pub fn find_king(&self, color: Color) -> Option<Position> {
        match color {
            Color::Red => self.red_king_pos,
            Color::Black => self.black_king_pos,
        }
    }

    /// 执行走法，返回被吃的棋子（undo_move 的精确逆操作需要它）
    pub fn make_move(&mut self, mv: Move) -> Option<Piece> {
        let from_idx = mv.from.to_index();
        let to_idx = mv.to.to_index();

        let piece = self.squares[from_idx].take()?;
        let captured = self.squares[to_idx].take();

        if piece.kind == PieceKind::King {
            match piece.color {
                Color::Red => self.red_king_pos = Some(mv.to),
                Color::Black => self.black_king_pos = Some(mv.to),
            }
        }
        if let Some(cap) = captured {
            if cap.kind == PieceKind::King {
                match cap.color {
                    Color::Red => self.red_king_pos = None,
                    Color::Black => self.black_king_pos = None,
                }
            }
        }

        self.squares[to_idx] = Some(piece);
        self.current_turn = self.current_turn.opposite();

        captured
    }

    /// 撤销走法
    pub fn undo_move(&mut self, mv: Move, captured: Option<Piece>) {
        let from_idx = mv.from.to_index();
        let to_idx = mv.to.to_index();

        let piece = self.squares[to_idx].take().expect("undo_move: no piece at to");

        if piece.kind == PieceKind::King {
            match piece.color {
                Color::Red => self.red_king_pos = Some(mv.from),
                Color::Black => self.black_king_pos = Some(mv.from),
            }
        }
        self.squares[from_idx] = Some(piece);

        if let Some(cap) = captured {
            if cap.kind == PieceKind::King {
                match cap.color {
                    Color::Red => self.red_king_pos = Some(mv.to),
                    Color::Black => self.black_king_pos = Some(mv.to),
                }
            }
            self.squares[to_idx] = Some(cap);
        }

        self.current_turn = self.current_turn.opposite();
    }

    #[inline]
    fn can_move_to(&self, color: Color, pos: Position) -> bool {
        if !pos.is_valid() {
            return false;
        }
        match self.get_piece(pos) {
            None => true,
            Some(target) => target.color != color,
        }
    }

    /// 获取某棋子的所有伪合法目标位置（不考虑将军）
    pub fn potential_moves(&self, pos: Position, piece: Piece) -> Vec<Position> {
        match piece.kind {
            PieceKind::King => self.king_moves(pos, piece.color),
            PieceKind::Advisor => self.advisor_moves(pos, piece.color),
            PieceKind::Elephant => self.elephant_moves(pos, piece.color),
            PieceKind::Horse => self.horse_moves(pos, piece.color),
            PieceKind::Rook => self.rook_moves(pos, piece.color),
            PieceKind::Cannon => self.cannon_moves(pos, piece.color),
            PieceKind::Pawn => self.pawn_moves(pos, piece.color),
        }
    }

    fn king_moves(&self, pos: Position, color: Color) -> Vec<Position> {
        let mut moves = Vec::with_capacity(4);
        let directions: [(i8, i8); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

        for (dr, dc) in directions {
            let new_pos = pos.offset(dr, dc);
            if new_pos.is_in_palace(color) && self.can_move_to(color, new_pos) {
                moves.push(new_pos);
            }
        }

        moves
    }

    fn advisor_moves(&self, pos: Position, color: Color) -> Vec<Position> {
        let mut moves = Vec::with_capacity(4);
        let directions: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];

        for (dr, dc) in directions {
            let new_pos = pos.offset(dr, dc);
            if new_pos.is_in_palace(color) && self.can_move_to(color, new_pos) {
                moves.push(new_pos);
            }
        }

        moves
    }

    fn elephant_moves(&self, pos: Position, color: Color) -> Vec<Position> {
        let mut moves = Vec::with_capacity(4);
        // 田字格与象眼
        let directions: [((i8, i8), (i8, i8)); 4] = [
            ((2, 2), (1, 1)),
            ((2, -2), (1, -1)),
            ((-2, 2), (-1, 1)),
            ((-2, -2), (-1, -1)),
        ];

        for ((dr, dc), (er, ec)) in directions {
            let new_pos = pos.offset(dr, dc);
            let eye_pos = pos.offset(er, ec);

            // 象不能过河
            if !new_pos.is_valid() || !new_pos.is_on_own_side(color) {
                continue;
            }
            // 塞象眼
            if self.has_piece(eye_pos) {
                continue;
            }
            if self.can_move_to(color, new_pos) {
                moves.push(new_pos);
            }
        }

        moves
    }

    fn horse_moves(&self, pos: Position, color: Color) -> Vec<Position> {
        let mut moves = Vec::with_capacity(8);
        // 日字格与马腿
        let directions: [((i8, i8), (i8, i8)); 8] = [
            ((2, 1), (1, 0)),
            ((2, -1), (1, 0)),
            ((-2, 1), (-1, 0)),
            ((-2, -1), (-1, 0)),
            ((1, 2), (0, 1)),
            ((1, -2), (0, -1)),
            ((-1, 2), (0, 1)),
            ((-1, -2), (0, -1)),
        ];

        for ((dr, dc), (lr, lc)) in directions {
            let new_pos = pos.offset(dr, dc);
            let leg_pos = pos.offset(lr, lc);

            // 蹩马腿
            if self.has_piece(leg_pos) {
                continue;
            }
            if new_pos.is_valid() && self.can_move_to(color, new_pos) {
                moves.push(new_pos);
            }
        }

        moves
    }

    fn rook_moves(&self, pos: Position, color: Color) -> Vec<Position> {
        let mut moves = Vec::with_capacity(17);
        let directions: [(i8, i8); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

        for (dr, dc) in directions {
            let mut new_pos = pos.offset(dr, dc);
            while new_pos.is_valid() {
                match self.get_piece(new_pos) {
                    None => moves.push(new_pos),
                    Some(target) => {
                        if target.color != color {
                            moves.push(new_pos);
                        }
                        break;
                    }
                }
                new_pos = new_pos.offset(dr, dc);
            }
        }

        moves
    }

    fn cannon_moves(&self, pos: Position, color: Color) -> Vec<Position> {
        let mut moves = Vec::with_capacity(17);
        let directions: [(i8, i8); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

        for (dr, dc) in directions {
            let mut new_pos = pos.offset(dr, dc);
            let mut found_screen = false;

            while new_pos.is_valid() {
                match self.get_piece(new_pos) {
                    None => {
                        if !found_screen {
                            moves.push(new_pos);
                        }
                    }
                    Some(target) => {
                        if !found_screen {
                            // 炮架
                            found_screen = true;
                        } else {
                            if target.color != color {
                                moves.push(new_pos);
                            }
                            break;
                        }
                    }
                }
                new_pos = new_pos.offset(dr, dc);
            }
        }

        moves
    }

    fn pawn_moves(&self, pos: Position, color: Color) -> Vec<Position> {
        let mut moves = Vec::with_capacity(3);
        let forward = if color == Color::Red { 1 } else { -1 };

        let forward_pos = pos.offset(forward, 0);
        if forward_pos.is_valid() && self.can_move_to(color, forward_pos) {
            moves.push(forward_pos);
        }

        // 过河后可以左右走
        if pos.has_crossed_river(color) {
            for dc in [-1, 1] {
                let side_pos = pos.offset(0, dc);
                if side_pos.is_valid() && self.can_move_to(color, side_pos) {
                    moves.push(side_pos);
                }
            }
        }

        moves
    }

    /// 检查某方是否被将军
    ///
    /// 没有将/帅的残缺局面按"未被将军"处理，评估端会给出极端分数。
    pub fn is_in_check(&self, color: Color) -> bool {
        match self.find_king(color) {
            Some(king_pos) => self.is_position_attacked(king_pos, color.opposite()),
            None => false,
        }
    }

    /// 检测某位置是否被某方攻击（不生成完整走法列表）
    ///
    /// 将/帅的直线射程包含在内，使飞将（将帅对脸）在合法性过滤中
    /// 自动按被攻击处理。
    pub fn is_position_attacked(&self, target_pos: Position, attacker_color: Color) -> bool {
        // 车/炮/将的直线攻击
        for (dr, dc) in [(1, 0), (-1, 0), (0, 1), (0, -1)] {
            let mut pos = target_pos.offset(dr, dc);
            let mut found_screen = false;
            while pos.is_valid() {
                if let Some(piece) = self.get_piece(pos) {
                    if piece.color == attacker_color {
                        match piece.kind {
                            PieceKind::Rook | PieceKind::King if !found_screen => return true,
                            PieceKind::Cannon if found_screen => return true,
                            _ => {}
                        }
                    }
                    if found_screen {
                        break;
                    }
                    found_screen = true;
                }
                pos = pos.offset(dr, dc);
            }
        }

        // 马的攻击（注意马腿在马的位置与目标之间）
        let horse_attacks: [((i8, i8), (i8, i8)); 8] = [
            ((2, 1), (1, 0)),
            ((2, -1), (1, 0)),
            ((-2, 1), (-1, 0)),
            ((-2, -1), (-1, 0)),
            ((1, 2), (0, 1)),
            ((1, -2), (0, -1)),
            ((-1, 2), (0, 1)),
            ((-1, -2), (0, -1)),
        ];
        for ((dr, dc), (lr, lc)) in horse_attacks {
            let horse_pos = target_pos.offset(dr, dc);
            let leg_pos = horse_pos.offset(-lr, -lc);
            if let Some(piece) = self.get_piece(horse_pos) {
                if piece.color == attacker_color
                    && piece.kind == PieceKind::Horse
                    && !self.has_piece(leg_pos)
                {
                    return true;
                }
            }
        }

        // 兵的攻击
        let forward = if attacker_color == Color::Red { 1 } else { -1 };
        for (dr, dc) in [(-forward, 0), (0, -1), (0, 1)] {
            let pawn_pos = target_pos.offset(dr, dc);
            if let Some(piece) = self.get_piece(pawn_pos) {
                if piece.color == attacker_color && piece.kind == PieceKind::Pawn {
                    if dr == -forward {
                        return true;
                    }
                    // 横向攻击只有过河后才行
                    if dc != 0 && pawn_pos.has_crossed_river(attacker_color) {
                        return true;
                    }
                }
            }
        }

        false
    }

    /// 获取某位置棋子的所有合法走法（排除送将与飞将）
    pub fn legal_moves_from(&self, from: Position) -> Vec<Move> {
        let piece = match self.get_piece(from) {
            Some(p) => p,
            None => return Vec::new(),
        };
        let mut board = self.clone();
        board.legal_moves_of_piece(from, piece)
    }

    fn legal_moves_of_piece(&mut self, from: Position, piece: Piece) -> Vec<Move> {
        let mut moves = Vec::new();
        for to in self.potential_moves(from, piece) {
            let mv = Move::new(from, to);
            let captured = self.make_move(mv);
            let in_check = self.is_in_check(piece.color);
            self.undo_move(mv, captured);
            if !in_check {
                moves.push(mv);
            }
        }
        moves
    }

    /// 获取某方所有合法走法
    pub fn legal_moves(&self, color: Color) -> Vec<Move> {
        let mut board = self.clone();
        let mut moves = Vec::with_capacity(50);

        let my_pieces: Vec<(Position, Piece)> = board.pieces(Some(color)).collect();
        for (from, piece) in my_pieces {
            moves.extend(board.legal_moves_of_piece(from, piece));
        }

        moves
    }

    /// 获取某方所有吃子走法（静态搜索用）
    pub fn capture_moves(&self, color: Color) -> Vec<Move> {
        self.legal_moves(color)
            .into_iter()
            .filter(|mv| self.get_piece(mv.to).is_some())
            .collect()
    }

    /// 判断游戏结果
    ///
    /// 被将死则对方获胜；无子可动但未被将军按和棋处理。
    pub fn game_result(&self) -> GameResult {
        if self.red_king_pos.is_none() {
            return GameResult::BlackWin;
        }
        if self.black_king_pos.is_none() {
            return GameResult::RedWin;
        }

        if self.legal_moves(self.current_turn).is_empty() {
            if self.is_in_check(self.current_turn) {
                match self.current_turn {
                    Color::Red => GameResult::BlackWin,
                    Color::Black => GameResult::RedWin,
                }
            } else {
                GameResult::Draw
            }
        } else {
            GameResult::Ongoing
        }
    }
}

impl Default for Board {
    fn default() -> Self {
        Board::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_positions;

    #[test]
    fn test_initial_board() {
        let board = Board::new();
        assert_eq!(board.pieces(Some(Color::Red)).count(), 16);
        assert_eq!(board.pieces(Some(Color::Black)).count(), 16);
        assert_eq!(board.current_turn(), Color::Red);
        assert_eq!(board.find_king(Color::Red), Some(Position::new(0, 4)));
        assert_eq!(board.find_king(Color::Black), Some(Position::new(9, 4)));
    }

    #[test]
    fn test_legal_moves_initial() {
        let board = Board::new();
        // 初始局面红方有 44 个合法走法（兵 5x1 + 炮 2x12 + 马 2x2 + 车 2x2 + 相 2 + 仕 2 + 帅 1）
        assert_eq!(board.legal_moves(Color::Red).len(), 44);
    }

    #[test]
    fn test_make_undo_roundtrip() {
        let mut board = Board::new();
        let fen_before = board.to_fen();
        let moves = board.legal_moves(Color::Red);

        for mv in moves {
            let captured = board.make_move(mv);
            board.undo_move(mv, captured);
            assert_eq!(board.to_fen(), fen_before, "undo failed for {}", mv);
            assert_eq!(board.find_king(Color::Red), Some(Position::new(0, 4)));
        }
    }

    #[test]
    fn test_check_detection() {
        let board = Board::from_fen(test_positions::CHECK_ROOK).unwrap();
        assert!(board.is_in_check(Color::Black));
        assert!(!board.is_in_check(Color::Red));
    }

    #[test]
    fn test_flying_general_is_illegal() {
        // 将帅同列中间无子，双方的垂直让位走法均被过滤
        let board = Board::from_fen("4k4/9/9/9/9/9/9/9/9/4K4 w").unwrap();
        let moves = board.legal_moves(Color::Red);
        // 帅不能离开本列暴露对脸，只能横走
        assert!(moves.iter().all(|m| m.to.row == 0));
        assert_eq!(moves.len(), 2);
    }

    #[test]
    fn test_cannon_needs_screen() {
        // 炮无炮架时不能吃子，有炮架时可以
        let board = Board::from_fen("4k4/9/9/1p7/9/9/9/9/1C7/3K5 w").unwrap();
        let cannon_moves = board.legal_moves_from(Position::new(1, 1));
        let captures: Vec<_> = cannon_moves
            .iter()
            .filter(|m| board.get_piece(m.to).is_some())
            .collect();
        assert!(captures.is_empty());

        // 加上炮架后隔子吃卒
        let board = Board::from_fen("4k4/9/9/1p7/9/1N7/9/9/1C7/3K5 w").unwrap();
        let cannon_moves = board.legal_moves_from(Position::new(1, 1));
        assert!(cannon_moves.iter().any(|m| m.to == Position::new(6, 1)));
    }

    #[test]
    fn test_horse_leg_block() {
        // 马被蹩腿后走法减少
        let board = Board::from_fen("3k5/9/9/9/9/9/9/9/3P5/3NK4 w").unwrap();
        let horse_moves = board.legal_moves_from(Position::new(0, 3));
        // (1,3) 有兵堵腿，(2,2)/(2,4) 不可达
        assert!(!horse_moves.iter().any(|m| m.to == Position::new(2, 2)));
        assert!(!horse_moves.iter().any(|m| m.to == Position::new(2, 4)));
    }

    #[test]
    fn test_pawn_river_widening() {
        // 未过河的兵只能前进
        let board = Board::from_fen(test_positions::PAWN_BEFORE_RIVER).unwrap();
        let moves = board.legal_moves_from(Position::new(3, 0));
        assert_eq!(moves.len(), 1);
        assert_eq!(moves[0].to, Position::new(4, 0));

        // 过河后可以左右走
        let board = Board::from_fen(test_positions::PAWN_AFTER_RIVER).unwrap();
        let moves = board.legal_moves_from(Position::new(5, 4));
        assert_eq!(moves.len(), 3);
    }

    #[test]
    fn test_game_result_mate() {
        let board = Board::from_fen(test_positions::MATED_BLACK).unwrap();
        assert_eq!(board.game_result(), GameResult::RedWin);
    }

    #[test]
    fn test_game_result_stalemate_is_draw() {
        let board = Board::from_fen(test_positions::STALEMATE_BLACK).unwrap();
        assert!(!board.is_in_check(Color::Black));
        assert!(board.legal_moves(Color::Black).is_empty());
        assert_eq!(board.game_result(), GameResult::Draw);
    }
}
