//! 中国象棋核心类型定义
//!
//! 定义棋子、位置、走法等所有基础数据类型

use std::fmt;

/// 棋子颜色/阵营
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    Red,
    Black,
}

impl Color {
    /// 获取对方阵营
    #[inline]
    pub fn opposite(&self) -> Color {
        match self {
            Color::Red => Color::Black,
            Color::Black => Color::Red,
        }
    }

    /// 数组索引（红 0，黑 1）
    #[inline]
    pub fn index(&self) -> usize {
        match self {
            Color::Red => 0,
            Color::Black => 1,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::Red => write!(f, "Red"),
            Color::Black => write!(f, "Black"),
        }
    }
}

/// 棋子类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PieceKind {
    /// 将/帅
    King,
    /// 士/仕
    Advisor,
    /// 象/相
    Elephant,
    /// 马
    Horse,
    /// 车
    Rook,
    /// 炮
    Cannon,
    /// 卒/兵
    Pawn,
}

/// 棋子类型总数（NNUE 特征和 history 表的维度）
pub const NUM_PIECE_KINDS: usize = 7;

impl PieceKind {
    /// 全部棋子类型，按 `index()` 顺序排列
    pub const ALL: [PieceKind; NUM_PIECE_KINDS] = [
        PieceKind::King,
        PieceKind::Advisor,
        PieceKind::Elephant,
        PieceKind::Horse,
        PieceKind::Rook,
        PieceKind::Cannon,
        PieceKind::Pawn,
    ];

    /// 从 FEN 字符解析（大小写均可）
    pub fn from_fen_char(c: char) -> Option<PieceKind> {
        match c.to_ascii_lowercase() {
            'k' => Some(PieceKind::King),
            'a' => Some(PieceKind::Advisor),
            'b' => Some(PieceKind::Elephant),
            'n' => Some(PieceKind::Horse),
            'r' => Some(PieceKind::Rook),
            'c' => Some(PieceKind::Cannon),
            'p' => Some(PieceKind::Pawn),
            _ => None,
        }
    }

    /// 转换为 FEN 字符（小写）
    pub fn to_fen_char(&self) -> char {
        match self {
            PieceKind::King => 'k',
            PieceKind::Advisor => 'a',
            PieceKind::Elephant => 'b',
            PieceKind::Horse => 'n',
            PieceKind::Rook => 'r',
            PieceKind::Cannon => 'c',
            PieceKind::Pawn => 'p',
        }
    }

    /// 材质价值（centipawn，兵过河另加 100）
    #[inline]
    pub fn value(&self) -> i32 {
        match self {
            PieceKind::King => 10000,
            PieceKind::Rook => 900,
            PieceKind::Cannon => 450,
            PieceKind::Horse => 400,
            PieceKind::Elephant => 200,
            PieceKind::Advisor => 200,
            PieceKind::Pawn => 100,
        }
    }

    /// 数组索引（0-6），用于 NNUE 特征和 history 表
    #[inline]
    pub fn index(&self) -> usize {
        match self {
            PieceKind::King => 0,
            PieceKind::Advisor => 1,
            PieceKind::Elephant => 2,
            PieceKind::Horse => 3,
            PieceKind::Rook => 4,
            PieceKind::Cannon => 5,
            PieceKind::Pawn => 6,
        }
    }
}

impl fmt::Display for PieceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PieceKind::King => "King",
            PieceKind::Advisor => "Advisor",
            PieceKind::Elephant => "Elephant",
            PieceKind::Horse => "Horse",
            PieceKind::Rook => "Rook",
            PieceKind::Cannon => "Cannon",
            PieceKind::Pawn => "Pawn",
        };
        write!(f, "{}", name)
    }
}

/// 棋子：类型 + 颜色的紧凑组合
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Piece {
    pub kind: PieceKind,
    pub color: Color,
}

impl Piece {
    #[inline]
    pub fn new(kind: PieceKind, color: Color) -> Self {
        Piece { kind, color }
    }

    /// 从 FEN 字符解析（大写红方，小写黑方）
    pub fn from_fen_char(c: char) -> Option<Piece> {
        let kind = PieceKind::from_fen_char(c)?;
        let color = if c.is_ascii_uppercase() {
            Color::Red
        } else {
            Color::Black
        };
        Some(Piece { kind, color })
    }

    /// 转换为 FEN 字符
    pub fn to_fen_char(&self) -> char {
        let c = self.kind.to_fen_char();
        match self.color {
            Color::Red => c.to_ascii_uppercase(),
            Color::Black => c,
        }
    }

    #[inline]
    pub fn value(&self) -> i32 {
        self.kind.value()
    }
}

/// 棋盘行列数
pub const BOARD_ROWS: usize = 10;
pub const BOARD_COLS: usize = 9;
pub const NUM_SQUARES: usize = BOARD_ROWS * BOARD_COLS;

/// 河界：row <= 4 为红方半场，row >= 5 为黑方半场
pub const RIVER_ROW: i8 = 4;

/// 棋盘位置 (row, col)
///
/// row: 0-9（0 是红方底线，9 是黑方底线）
/// col: 0-8（从左到右）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub row: i8,
    pub col: i8,
}

impl Position {
    #[inline]
    pub fn new(row: i8, col: i8) -> Self {
        Position { row, col }
    }

    /// 检查位置是否在棋盘范围内
    #[inline]
    pub fn is_valid(&self) -> bool {
        (0..=9).contains(&self.row) && (0..=8).contains(&self.col)
    }

    /// 线性索引 (0-89)
    #[inline]
    pub fn to_index(&self) -> usize {
        self.row as usize * BOARD_COLS + self.col as usize
    }

    /// 从线性索引恢复
    #[inline]
    pub fn from_index(idx: usize) -> Position {
        Position {
            row: (idx / BOARD_COLS) as i8,
            col: (idx % BOARD_COLS) as i8,
        }
    }

    /// 检查位置是否在九宫格内
    pub fn is_in_palace(&self, color: Color) -> bool {
        if !(3..=5).contains(&self.col) {
            return false;
        }
        match color {
            Color::Red => (0..=2).contains(&self.row),
            Color::Black => (7..=9).contains(&self.row),
        }
    }

    /// 检查位置是否在己方半场（象不能过河）
    pub fn is_on_own_side(&self, color: Color) -> bool {
        match color {
            Color::Red => self.row <= RIVER_ROW,
            Color::Black => self.row > RIVER_ROW,
        }
    }

    /// 检查是否已过河（兵过河后可横走）
    #[inline]
    pub fn has_crossed_river(&self, color: Color) -> bool {
        match color {
            Color::Red => self.row > RIVER_ROW,
            Color::Black => self.row <= RIVER_ROW,
        }
    }

    /// 位置加偏移量
    #[inline]
    pub fn offset(&self, row_delta: i8, col_delta: i8) -> Position {
        Position {
            row: self.row + row_delta,
            col: self.col + col_delta,
        }
    }

    /// 从坐标字符串解析（如 "a0"）
    pub fn from_coord_str(s: &str) -> Option<Position> {
        let mut chars = s.chars();
        let col_char = chars.next()?;
        let row_char = chars.next()?;
        if chars.next().is_some() {
            return None;
        }
        let col = match col_char {
            'a'..='i' => (col_char as i8) - ('a' as i8),
            _ => return None,
        };
        let row = match row_char {
            '0'..='9' => (row_char as i8) - ('0' as i8),
            _ => return None,
        };
        Some(Position { row, col })
    }

    /// 转换为坐标字符串（如 "a0"）
    pub fn to_coord_str(&self) -> String {
        let col_char = (b'a' + self.col as u8) as char;
        format!("{}{}", col_char, self.row)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_coord_str())
    }
}

/// 走法：起点 + 终点
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    pub from: Position,
    pub to: Position,
}

impl Move {
    #[inline]
    pub fn new(from: Position, to: Position) -> Self {
        Move { from, to }
    }

    /// 从坐标字符串解析（`a0a1` 格式）
    pub fn from_coord_str(s: &str) -> Option<Move> {
        let s = s.trim();
        if s.len() != 4 {
            return None;
        }
        let from = Position::from_coord_str(&s[0..2])?;
        let to = Position::from_coord_str(&s[2..4])?;
        Some(Move { from, to })
    }

    /// 转换为坐标字符串
    pub fn to_coord_str(&self) -> String {
        format!("{}{}", self.from.to_coord_str(), self.to.to_coord_str())
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_coord_str())
    }
}

/// 游戏结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameResult {
    Ongoing,
    RedWin,
    BlackWin,
    /// 无子可动但未被将军（困毙按和棋处理）
    Draw,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_from_coord_str() {
        assert_eq!(Position::from_coord_str("a0"), Some(Position::new(0, 0)));
        assert_eq!(Position::from_coord_str("e4"), Some(Position::new(4, 4)));
        assert_eq!(Position::from_coord_str("i9"), Some(Position::new(9, 8)));
        assert_eq!(Position::from_coord_str("j0"), None);
    }

    #[test]
    fn test_position_to_coord_str() {
        assert_eq!(Position::new(0, 0).to_coord_str(), "a0");
        assert_eq!(Position::new(4, 4).to_coord_str(), "e4");
        assert_eq!(Position::new(9, 8).to_coord_str(), "i9");
    }

    #[test]
    fn test_position_index_roundtrip() {
        for row in 0..10 {
            for col in 0..9 {
                let pos = Position::new(row, col);
                assert_eq!(Position::from_index(pos.to_index()), pos);
            }
        }
    }

    #[test]
    fn test_move_from_coord_str() {
        let m = Move::from_coord_str("a0a1").unwrap();
        assert_eq!(m.from, Position::new(0, 0));
        assert_eq!(m.to, Position::new(1, 0));
        assert_eq!(m.to_coord_str(), "a0a1");
        assert!(Move::from_coord_str("a0a").is_none());
    }

    #[test]
    fn test_piece_fen_char() {
        let p = Piece::from_fen_char('R').unwrap();
        assert_eq!(p.kind, PieceKind::Rook);
        assert_eq!(p.color, Color::Red);
        assert_eq!(p.to_fen_char(), 'R');

        let p = Piece::from_fen_char('n').unwrap();
        assert_eq!(p.kind, PieceKind::Horse);
        assert_eq!(p.color, Color::Black);
        assert_eq!(p.to_fen_char(), 'n');
    }

    #[test]
    fn test_palace_and_river() {
        assert!(Position::new(0, 4).is_in_palace(Color::Red));
        assert!(!Position::new(3, 4).is_in_palace(Color::Red));
        assert!(Position::new(9, 4).is_in_palace(Color::Black));
        assert!(Position::new(5, 0).has_crossed_river(Color::Red));
        assert!(!Position::new(4, 0).has_crossed_river(Color::Red));
        assert!(Position::new(4, 0).has_crossed_river(Color::Black));
    }
}
