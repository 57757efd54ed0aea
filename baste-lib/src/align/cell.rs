use serde::{Deserialize, Serialize};

use super::aligners::constants::{MAX_CELL_SCORE, MAX_GAP_RUN};

/// Back-reference direction recorded in each matrix cell.
///
/// `Left` consumes a probe symbol with no target counterpart (an insertion in
/// the probe); `Down` consumes a target symbol with no probe counterpart. A
/// `Terminal` cell has no predecessor: it either starts a local alignment or
/// is the zero-reset state.
#[derive(
    Default, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize,
)]
pub enum Direction {
    #[default]
    Terminal,
    Diag,
    Left,
    Down,
}

/// One cell of the alignment matrix.
///
/// An explicit struct rather than a packed word; the score clamp at
/// [`MAX_CELL_SCORE`] and the gap-run saturation at [`MAX_GAP_RUN`] preserve
/// the numeric semantics of the packed representation.
#[derive(
    Default, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize,
)]
pub struct Cell {
    pub score: i32,
    pub back: Direction,
    pub is_match: bool,
    pub gap_open: bool,
    pub gap_len: u8,
}

impl Cell {
    /// A diagonal (match/substitution) cell. `terminal` marks the free-ride
    /// boundary case where the diagonal predecessor does not exist.
    pub fn diagonal(score: i32, is_match: bool, terminal: bool) -> Self {
        Self {
            score: score.min(MAX_CELL_SCORE),
            back: if terminal {
                Direction::Terminal
            } else {
                Direction::Diag
            },
            is_match,
            gap_open: false,
            gap_len: 0,
        }
    }

    /// A gap cell continuing in `back` with the given run length.
    pub fn gapped(score: i32, back: Direction, gap_len: u8) -> Self {
        Self {
            score: score.min(MAX_CELL_SCORE),
            back,
            is_match: false,
            gap_open: true,
            gap_len: gap_len.min(MAX_GAP_RUN),
        }
    }

    /// The zero/terminal reset state: negative-scoring paths are not carried
    /// forward in a local alignment.
    pub fn reset() -> Self {
        Self::default()
    }
}
