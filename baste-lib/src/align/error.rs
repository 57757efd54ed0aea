use std::collections::TryReserveError;

use thiserror::Error;

/// Errors surfaced by the alignment engine.
///
/// Validation failures (`Scoring`, `Sequence*`) are rejected at the call that
/// introduced them without mutating prior state. Capacity and allocation
/// failures abort only the in-progress [`align`](crate::align::LocalAligner::align)
/// call; the engine remains reusable afterwards.
#[derive(Error, Debug)]
pub enum AlignError {
    #[error("invalid scoring parameter {name}: {value} is outside [{min}, {max}]")]
    Scoring {
        name: &'static str,
        value: i32,
        min: i32,
        max: i32,
    },

    #[error("no sequence registered")]
    SequenceMissing,

    #[error("sequence length {len} is outside [{min}, {max}]")]
    SequenceLength { len: usize, min: usize, max: usize },

    #[error("sequence starts with symbol code {code:#04x}, above the ambiguity code")]
    SequenceSymbol { code: u8 },

    #[error("alignment matrix of {cells} cells exceeds the supported maximum of {max}")]
    MatrixTooLarge { cells: u64, max: u64 },

    #[error("failed to reserve memory for {what}")]
    Allocation {
        what: &'static str,
        #[source]
        source: TryReserveError,
    },

    #[error("no alignment has been computed")]
    NoAlignment,

    #[error("score dumps are only available for unbanded alignments")]
    BandedDump,

    #[error("failed to write score dump")]
    Io(#[from] std::io::Error),
}
