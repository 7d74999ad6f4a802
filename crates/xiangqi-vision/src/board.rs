//! Board vocabulary: sides, piece kinds, labels and the 10×9 label matrix.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of cell rows (ranks) on a Xiangqi board.
pub const BOARD_ROWS: usize = 10;
/// Number of cell columns (files) on a Xiangqi board.
pub const BOARD_COLS: usize = 9;

/// One of the two factions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Red,
    Black,
}

impl Side {
    pub fn name(self) -> &'static str {
        match self {
            Side::Red => "red",
            Side::Black => "black",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of colour classification for an occupied cell.
///
/// `Unresolved` means the cell was judged occupied but neither colour mask
/// reached the ratio threshold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PieceColor {
    Red,
    Black,
    Unresolved,
}

impl PieceColor {
    pub fn side(self) -> Option<Side> {
        match self {
            PieceColor::Red => Some(Side::Red),
            PieceColor::Black => Some(Side::Black),
            PieceColor::Unresolved => None,
        }
    }
}

impl From<Side> for PieceColor {
    fn from(side: Side) -> Self {
        match side {
            Side::Red => PieceColor::Red,
            Side::Black => PieceColor::Black,
        }
    }
}

impl fmt::Display for PieceColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.side() {
            Some(side) => side.fmt(f),
            None => f.write_str("unresolved"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PieceKind {
    King,
    Guard,
    Bishop,
    Knight,
    Rook,
    Cannon,
    Pawn,
}

impl PieceKind {
    pub const ALL: [PieceKind; 7] = [
        PieceKind::King,
        PieceKind::Guard,
        PieceKind::Bishop,
        PieceKind::Knight,
        PieceKind::Rook,
        PieceKind::Cannon,
        PieceKind::Pawn,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PieceKind::King => "king",
            PieceKind::Guard => "guard",
            PieceKind::Bishop => "bishop",
            PieceKind::Knight => "knight",
            PieceKind::Rook => "rook",
            PieceKind::Cannon => "cannon",
            PieceKind::Pawn => "pawn",
        }
    }

    /// Lowercase notation letter.
    pub fn letter(self) -> char {
        match self {
            PieceKind::King => 'k',
            PieceKind::Guard => 'a',
            PieceKind::Bishop => 'b',
            PieceKind::Knight => 'n',
            PieceKind::Rook => 'r',
            PieceKind::Cannon => 'c',
            PieceKind::Pawn => 'p',
        }
    }

    pub fn from_letter(c: char) -> Option<Self> {
        let lower = c.to_ascii_lowercase();
        Self::ALL.into_iter().find(|k| k.letter() == lower)
    }

    fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }
}

/// A concrete piece: side plus kind, written `{side}_{kind}` (e.g. `red_king`).
///
/// Ordering is by side, then kind; the template library iterates in this order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct PieceLabel {
    pub side: Side,
    pub kind: PieceKind,
}

impl PieceLabel {
    pub const fn new(side: Side, kind: PieceKind) -> Self {
        Self { side, kind }
    }

    /// All 14 labels in library order.
    pub fn all() -> impl Iterator<Item = PieceLabel> {
        [Side::Red, Side::Black]
            .into_iter()
            .flat_map(|side| PieceKind::ALL.into_iter().map(move |kind| Self::new(side, kind)))
    }

    /// Notation letter: uppercase for red, lowercase for black.
    pub fn letter(self) -> char {
        let c = self.kind.letter();
        match self.side {
            Side::Red => c.to_ascii_uppercase(),
            Side::Black => c,
        }
    }

    pub fn from_letter(c: char) -> Option<Self> {
        let kind = PieceKind::from_letter(c)?;
        let side = if c.is_ascii_uppercase() {
            Side::Red
        } else {
            Side::Black
        };
        Some(Self::new(side, kind))
    }
}

impl fmt::Display for PieceLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.side, self.kind.name())
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid piece label `{0}` (expected `{{red|black}}_{{kind}}`)")]
pub struct ParseLabelError(pub String);

impl FromStr for PieceLabel {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseLabelError(s.to_string());
        let (side, kind) = s.split_once('_').ok_or_else(err)?;
        let side = match side {
            "red" => Side::Red,
            "black" => Side::Black,
            _ => return Err(err()),
        };
        let kind = PieceKind::from_name(kind).ok_or_else(err)?;
        Ok(Self::new(side, kind))
    }
}

impl From<PieceLabel> for String {
    fn from(label: PieceLabel) -> Self {
        label.to_string()
    }
}

impl TryFrom<String> for PieceLabel {
    type Error = ParseLabelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Final per-cell label handed to the notation encoder.
///
/// `Unresolved` is an occupied cell whose side or identity could not be
/// determined; it is never conflated with `Empty`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellLabel {
    #[default]
    Empty,
    Piece(PieceLabel),
    Unresolved,
}

impl CellLabel {
    pub fn is_empty(&self) -> bool {
        matches!(self, CellLabel::Empty)
    }

    pub fn piece(&self) -> Option<PieceLabel> {
        match self {
            CellLabel::Piece(p) => Some(*p),
            _ => None,
        }
    }
}

/// Row-major 10×9 matrix of cell labels; row 0 is the top of the image.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardMatrix {
    rows: [[CellLabel; BOARD_COLS]; BOARD_ROWS],
}

impl BoardMatrix {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from exactly 90 labels in row-major order.
    pub fn from_row_major(labels: &[CellLabel]) -> Option<Self> {
        if labels.len() != BOARD_ROWS * BOARD_COLS {
            return None;
        }
        let mut m = Self::empty();
        for (i, label) in labels.iter().enumerate() {
            m.rows[i / BOARD_COLS][i % BOARD_COLS] = *label;
        }
        Some(m)
    }

    /// Label at `(row, col)`; `None` outside the board.
    pub fn get(&self, row: usize, col: usize) -> Option<CellLabel> {
        self.rows.get(row)?.get(col).copied()
    }

    /// Overwrite one cell. Returns `false` when `(row, col)` is off the board.
    pub fn set(&mut self, row: usize, col: usize, label: CellLabel) -> bool {
        match self.rows.get_mut(row).and_then(|r| r.get_mut(col)) {
            Some(slot) => {
                *slot = label;
                true
            }
            None => false,
        }
    }

    pub fn rows(&self) -> &[[CellLabel; BOARD_COLS]; BOARD_ROWS] {
        &self.rows
    }

    /// Iterate `(row, col, label)` over non-empty cells in row-major order.
    pub fn occupied(&self) -> impl Iterator<Item = (usize, usize, CellLabel)> + '_ {
        self.rows.iter().enumerate().flat_map(|(r, row)| {
            row.iter()
                .enumerate()
                .filter(|(_, l)| !l.is_empty())
                .map(move |(c, l)| (r, c, *l))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_text_round_trips_for_all_pieces() {
        let labels: Vec<_> = PieceLabel::all().collect();
        assert_eq!(labels.len(), 14);
        for label in labels {
            let text = label.to_string();
            assert_eq!(text.parse::<PieceLabel>().unwrap(), label);
            assert_eq!(PieceLabel::from_letter(label.letter()), Some(label));
        }
        assert_eq!("red_king".parse::<PieceLabel>().unwrap().letter(), 'K');
        assert_eq!("black_guard".parse::<PieceLabel>().unwrap().letter(), 'a');
    }

    #[test]
    fn malformed_labels_are_rejected() {
        for bad in ["", "red", "green_king", "red_queen", "redking", "Red_king"] {
            assert!(bad.parse::<PieceLabel>().is_err(), "{bad}");
        }
    }

    #[test]
    fn labels_order_by_side_then_kind() {
        let red_pawn = PieceLabel::new(Side::Red, PieceKind::Pawn);
        let black_king = PieceLabel::new(Side::Black, PieceKind::King);
        assert!(red_pawn < black_king);
        assert_eq!(PieceLabel::all().next(), Some(PieceLabel::new(Side::Red, PieceKind::King)));
    }

    #[test]
    fn matrix_rejects_off_board_access() {
        let mut m = BoardMatrix::empty();
        assert!(m.set(9, 8, CellLabel::Unresolved));
        assert!(!m.set(10, 0, CellLabel::Unresolved));
        assert!(!m.set(0, 9, CellLabel::Unresolved));
        assert_eq!(m.get(9, 8), Some(CellLabel::Unresolved));
        assert_eq!(m.get(0, 9), None);
        assert_eq!(m.occupied().count(), 1);
    }

    #[test]
    fn label_serializes_as_text() {
        let json = serde_json::to_string(&PieceLabel::new(Side::Black, PieceKind::Cannon)).unwrap();
        assert_eq!(json, "\"black_cannon\"");
    }
}
