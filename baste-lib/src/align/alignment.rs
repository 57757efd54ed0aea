use std::fmt;

use derive_getters::Getters;
use serde::Serialize;

/// The highest-scoring cell found by the last alignment pass.
///
/// Positions are 1-based; they name the cell at which the local alignment
/// ends, not its start.
#[derive(Default, Copy, Clone, Eq, PartialEq, Debug, Serialize)]
pub struct Peak {
    /// Smith-Waterman peak score
    pub score: i32,

    /// 1-based probe position of the peak cell
    pub probe_idx: u32,

    /// 1-based target position of the peak cell
    pub targ_idx: u32,
}

/// Traceback-derived alignment statistics, computed lazily on the first
/// request and cached until the sequences, scoring, or alignment change.
#[derive(Default, Copy, Clone, Eq, PartialEq, Debug, Serialize, Getters)]
pub struct AlignmentStats {
    /// Bases aligned through diagonal (match or substitution) steps
    aligned_bases: u32,

    /// Diagonal steps whose probe and target symbols agree exactly
    exact_matches: u32,

    /// Probe symbols with no target counterpart
    probe_inserts: u32,

    /// Target symbols with no probe counterpart
    targ_inserts: u32,

    /// 1-based inclusive probe position where the alignment starts
    probe_start: u32,

    /// 1-based inclusive target position where the alignment starts
    targ_start: u32,
}

impl AlignmentStats {
    pub(crate) fn new(
        aligned_bases: u32,
        exact_matches: u32,
        probe_inserts: u32,
        targ_inserts: u32,
        probe_start: u32,
        targ_start: u32,
    ) -> Self {
        Self {
            aligned_bases,
            exact_matches,
            probe_inserts,
            targ_inserts,
            probe_start,
            targ_start,
        }
    }

    /// Length of the gapped alignment: every diagonal step plus every insert
    /// on either side. Both reported alignment strings have this length.
    pub fn total_len(&self) -> u32 {
        self.aligned_bases + self.probe_inserts + self.targ_inserts
    }
}

impl fmt::Display for AlignmentStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "probe-start: {} targ-start: {} aligned: {} exact: {} probe-ins: {} targ-ins: {}",
            self.probe_start,
            self.targ_start,
            self.aligned_bases,
            self.exact_matches,
            self.probe_inserts,
            self.targ_inserts
        )
    }
}

/// Maximal ungapped runs at the two ends of the alignment path.
///
/// The 5' anchor is the qualifying diagonal run nearest the alignment start;
/// the 3' anchor is the one nearest the peak. For an alignment that is one
/// unbroken diagonal run the two coincide and span the whole alignment.
/// All positions are 1-based inclusive.
#[derive(Default, Copy, Clone, Eq, PartialEq, Debug, Serialize, Getters)]
pub struct Anchors {
    probe_start5: u32,
    targ_start5: u32,
    probe_end3: u32,
    targ_end3: u32,
}

impl Anchors {
    pub(crate) fn new(
        probe_start5: u32,
        targ_start5: u32,
        probe_end3: u32,
        targ_end3: u32,
    ) -> Self {
        Self {
            probe_start5,
            targ_start5,
            probe_end3,
            targ_end3,
        }
    }
}

impl fmt::Display for Anchors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "5': ({}, {}) 3': ({}, {})",
            self.probe_start5, self.targ_start5, self.probe_end3, self.targ_end3
        )
    }
}
