/// Ceiling applied to every cell score before it is stored. The value mirrors
/// the headroom of a 24-bit packed score field; only the relative ordering of
/// clamped scores is part of the behavioural contract.
pub const MAX_CELL_SCORE: i32 = 0x00FF_FFFF;

/// Longest gap run length tracked per cell. Runs saturate here; delayed and
/// progressive extension thresholds live in the same range.
pub const MAX_GAP_RUN: u8 = 63;

/// Bounds on registered probe/target lengths.
pub const MIN_SEQ_LEN: usize = 5;
pub const MAX_SEQ_LEN: usize = 100_000_000;

/// Maximum number of matrix cells an alignment may require. Dense alignments
/// check `probe_len * targ_len` against this; banded alignments check the
/// `probe_len * targ_len / 10` working estimate. Alignments over budget are
/// refused outright before any allocation.
pub const MAX_MATRIX_CELLS: u64 = 300_000_000;

/// Bounds on the scoring parameters accepted by
/// [`Scoring::from_scores`](crate::align::scoring::Scoring::from_scores).
pub const MAX_MATCH_SCORE: i32 = 100;
pub const MIN_PENALTY: i32 = -100;

/// Floor applied to the `max_start_nonoverlap` banding parameter.
pub const MIN_START_NONOVERLAP: u32 = 5;

/// Clamp range for the `max_path_len_diff` banding parameter.
pub const MIN_PATH_LEN_DIFF: f64 = 0.05;
pub const MAX_PATH_LEN_DIFF: f64 = 1.0;
