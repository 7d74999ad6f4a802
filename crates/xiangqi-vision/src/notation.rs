//! FEN-style board field: ten `/`-separated rows, digits for runs of empty
//! cells, one letter per piece (uppercase red, lowercase black) and `?` for
//! an occupied cell whose label is unknown.

use crate::board::{BoardMatrix, CellLabel, PieceLabel, BOARD_COLS, BOARD_ROWS};

pub const ROW_SEPARATOR: char = '/';
pub const UNRESOLVED_CHAR: char = '?';
/// Side to move and counters appended when a full record is requested.
pub const DEFAULT_SUFFIX: &str = " w - - 0 1";

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum NotationError {
    #[error("expected {} rows, found {found}", BOARD_ROWS)]
    RowCount { found: usize },
    #[error("row {row} spans {width} cells, expected {}", BOARD_COLS)]
    RowWidth { row: usize, width: usize },
    #[error("row {row}: unexpected character `{ch}`")]
    UnknownChar { row: usize, ch: char },
}

fn cell_char(label: CellLabel) -> Option<char> {
    match label {
        CellLabel::Empty => None,
        CellLabel::Piece(p) => Some(p.letter()),
        CellLabel::Unresolved => Some(UNRESOLVED_CHAR),
    }
}

/// Encode the board field only.
pub fn encode(matrix: &BoardMatrix) -> String {
    let mut out = String::with_capacity(BOARD_ROWS * (BOARD_COLS + 1));
    for (r, row) in matrix.rows().iter().enumerate() {
        if r > 0 {
            out.push(ROW_SEPARATOR);
        }
        let mut empty = 0u32;
        for &label in row {
            match cell_char(label) {
                None => empty += 1,
                Some(c) => {
                    if empty > 0 {
                        out.push_str(&empty.to_string());
                        empty = 0;
                    }
                    out.push(c);
                }
            }
        }
        if empty > 0 {
            out.push_str(&empty.to_string());
        }
    }
    out
}

/// Encode the board field, optionally followed by [`DEFAULT_SUFFIX`].
pub fn encode_with_suffix(matrix: &BoardMatrix, include_suffix: bool) -> String {
    let mut out = encode(matrix);
    if include_suffix {
        out.push_str(DEFAULT_SUFFIX);
    }
    out
}

/// Parse a board field back into a matrix. Anything after the first
/// whitespace (side to move, counters) is ignored.
pub fn decode(notation: &str) -> Result<BoardMatrix, NotationError> {
    let field = notation.split_whitespace().next().unwrap_or("");
    let rows: Vec<&str> = field.split(ROW_SEPARATOR).collect();
    if rows.len() != BOARD_ROWS {
        return Err(NotationError::RowCount { found: rows.len() });
    }

    let mut matrix = BoardMatrix::empty();
    for (r, text) in rows.iter().enumerate() {
        let mut col = 0usize;
        for ch in text.chars() {
            let label = match ch {
                '1'..='9' => {
                    col += ch as usize - '0' as usize;
                    continue;
                }
                UNRESOLVED_CHAR => CellLabel::Unresolved,
                _ => PieceLabel::from_letter(ch)
                    .map(CellLabel::Piece)
                    .ok_or(NotationError::UnknownChar { row: r, ch })?,
            };
            if !matrix.set(r, col, label) {
                return Err(NotationError::RowWidth {
                    row: r,
                    width: col + 1,
                });
            }
            col += 1;
        }
        if col != BOARD_COLS {
            return Err(NotationError::RowWidth { row: r, width: col });
        }
    }
    Ok(matrix)
}

impl BoardMatrix {
    /// Parse a notation string produced by [`encode`].
    pub fn from_notation(notation: &str) -> Result<Self, NotationError> {
        decode(notation)
    }

    pub fn to_notation(&self) -> String {
        encode(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{PieceKind, Side};

    const OPENING: &str = "rnbakabnr/9/1c5c1/p1p1p1p1p/9/9/P1P1P1P1P/1C5C1/9/RNBAKABNR";

    #[test]
    fn empty_board_is_all_nines() {
        assert_eq!(encode(&BoardMatrix::empty()), "9/9/9/9/9/9/9/9/9/9");
    }

    #[test]
    fn king_in_the_middle_of_the_first_row() {
        let mut m = BoardMatrix::empty();
        m.set(0, 4, CellLabel::Piece(PieceLabel::new(Side::Red, PieceKind::King)));
        let text = encode(&m);
        assert_eq!(text.split('/').next(), Some("4K4"));
    }

    #[test]
    fn unresolved_cells_are_not_empty() {
        let mut m = BoardMatrix::empty();
        m.set(9, 0, CellLabel::Unresolved);
        m.set(9, 8, CellLabel::Piece(PieceLabel::new(Side::Black, PieceKind::Pawn)));
        assert_eq!(encode(&m), "9/9/9/9/9/9/9/9/9/?7p");
    }

    #[test]
    fn suffix_is_optional() {
        let m = BoardMatrix::empty();
        assert_eq!(encode_with_suffix(&m, false), "9/9/9/9/9/9/9/9/9/9");
        assert_eq!(encode_with_suffix(&m, true), "9/9/9/9/9/9/9/9/9/9 w - - 0 1");
    }

    #[test]
    fn opening_position_decodes_and_reencodes() {
        let m = BoardMatrix::from_notation(&format!("{OPENING}{DEFAULT_SUFFIX}")).unwrap();
        assert_eq!(
            m.get(0, 4),
            Some(CellLabel::Piece(PieceLabel::new(Side::Black, PieceKind::King)))
        );
        assert_eq!(
            m.get(7, 1),
            Some(CellLabel::Piece(PieceLabel::new(Side::Red, PieceKind::Cannon)))
        );
        assert_eq!(m.occupied().count(), 32);
        assert_eq!(m.to_notation(), OPENING);
    }

    #[test]
    fn malformed_fields_are_reported() {
        assert_eq!(
            decode("9/9/9"),
            Err(NotationError::RowCount { found: 3 })
        );
        assert_eq!(
            decode("9/9/9/9/9/9/9/9/9/8"),
            Err(NotationError::RowWidth { row: 9, width: 8 })
        );
        assert_eq!(
            decode("9/9/9/9/9/9/9/9/9/9K"),
            Err(NotationError::RowWidth { row: 9, width: 10 })
        );
        assert_eq!(
            decode("9/9/9/9/x8/9/9/9/9/9"),
            Err(NotationError::UnknownChar { row: 4, ch: 'x' })
        );
    }
}
