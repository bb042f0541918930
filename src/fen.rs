//! FEN 解析和生成
//!
//! 格式: `<棋盘> <回合>`
//!
//! 棋盘从黑方底线 (row 9) 到红方底线 (row 0)，行之间用 `/` 分隔。
//! 棋子符号：大写红方 K R N B A C P，小写黑方 k r n b a c p，
//! 数字表示连续空格。回合字段 `w` 为红方，`b` 为黑方。

use crate::types::{Color, Piece, Position, BOARD_COLS, BOARD_ROWS};

/// 初始局面
pub const INITIAL_FEN: &str = "rnbakabnr/9/1c5c1/p1p1p1p1p/9/9/P1P1P1P1P/1C5C1/9/RNBAKABNR w";

/// FEN 解析后的状态
#[derive(Debug, Clone)]
pub struct FenState {
    pub pieces: Vec<(Position, Piece)>,
    pub turn: Color,
}

/// 解析 FEN 字符串
pub fn parse_fen(fen: &str) -> Result<FenState, String> {
    let parts: Vec<&str> = fen.split_whitespace().collect();
    if parts.is_empty() {
        return Err("Invalid FEN: empty string".to_string());
    }

    let rows: Vec<&str> = parts[0].split('/').collect();
    if rows.len() != BOARD_ROWS {
        return Err(format!(
            "Invalid FEN: expected {} rows, got {}",
            BOARD_ROWS,
            rows.len()
        ));
    }

    let mut pieces = Vec::with_capacity(32);

    // FEN 第一行对应 row 9（黑方底线）
    for (i, row_str) in rows.iter().enumerate() {
        let row_idx = (BOARD_ROWS - 1 - i) as i8;
        let mut col_idx: i8 = 0;

        for c in row_str.chars() {
            if let Some(n) = c.to_digit(10) {
                col_idx += n as i8;
            } else if let Some(piece) = Piece::from_fen_char(c) {
                if col_idx >= BOARD_COLS as i8 {
                    return Err(format!("Invalid FEN: too many pieces in row {}", row_idx));
                }
                pieces.push((Position::new(row_idx, col_idx), piece));
                col_idx += 1;
            } else {
                return Err(format!("Invalid FEN: unknown character '{}'", c));
            }
        }

        if col_idx != BOARD_COLS as i8 {
            return Err(format!(
                "Invalid FEN: row {} has {} columns, expected {}",
                row_idx, col_idx, BOARD_COLS
            ));
        }
    }

    let turn = match parts.get(1) {
        Some(&"w") | None => Color::Red,
        Some(&"b") => Color::Black,
        Some(other) => return Err(format!("Invalid FEN: unknown turn field '{}'", other)),
    };

    Ok(FenState { pieces, turn })
}

/// 将棋盘格子数组序列化为 FEN 字符串
pub fn squares_to_fen(squares: &[Option<Piece>; 90], turn: Color) -> String {
    let mut rows = Vec::with_capacity(BOARD_ROWS);

    for row_idx in (0..BOARD_ROWS).rev() {
        let mut row_str = String::new();
        let mut empty_count = 0;

        for col_idx in 0..BOARD_COLS {
            match squares[row_idx * BOARD_COLS + col_idx] {
                None => empty_count += 1,
                Some(piece) => {
                    if empty_count > 0 {
                        row_str.push_str(&empty_count.to_string());
                        empty_count = 0;
                    }
                    row_str.push(piece.to_fen_char());
                }
            }
        }

        if empty_count > 0 {
            row_str.push_str(&empty_count.to_string());
        }
        rows.push(row_str);
    }

    let turn_char = match turn {
        Color::Red => 'w',
        Color::Black => 'b',
    };
    format!("{} {}", rows.join("/"), turn_char)
}
