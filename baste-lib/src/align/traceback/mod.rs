//! Walks the back-references recorded in the alignment matrix, from the peak
//! cell to the terminal cell that started the local alignment.
//!
//! The walk is written once against [`CellGrid`], so dense and banded
//! alignments trace back identically.

use crate::util::dna::{decode_base, GAP_MARKER};

use super::{
    alignment::{AlignmentStats, Anchors, Peak},
    cell::Direction,
    matrix::CellGrid,
};

/// Accumulates the traceback statistics for the alignment ending at `peak`.
///
/// Every diagonal step contributes an aligned base, as does the terminal
/// cell; left steps are probe inserts, down steps target inserts. Start
/// offsets are decremented per consumed base, then converted to 1-based
/// inclusive positions.
pub(crate) fn summarize(grid: &dyn CellGrid, peak: Peak) -> AlignmentStats {
    let mut aligned = 0u32;
    let mut exact = 0u32;
    let mut probe_inserts = 0u32;
    let mut targ_inserts = 0u32;
    let (mut p, mut t) = (peak.probe_idx, peak.targ_idx);
    let (mut probe_off, mut targ_off) = (peak.probe_idx, peak.targ_idx);
    loop {
        let cell = grid.get(p, t).unwrap_or_default();
        match cell.back {
            Direction::Terminal => {
                aligned += 1;
                if cell.is_match {
                    exact += 1;
                }
                probe_off -= 1;
                targ_off -= 1;
                break;
            }
            Direction::Diag => {
                aligned += 1;
                if cell.is_match {
                    exact += 1;
                }
                probe_off -= 1;
                targ_off -= 1;
                p -= 1;
                t -= 1;
            }
            Direction::Left => {
                probe_inserts += 1;
                probe_off -= 1;
                p -= 1;
            }
            Direction::Down => {
                targ_inserts += 1;
                targ_off -= 1;
                t -= 1;
            }
        }
    }
    AlignmentStats::new(
        aligned,
        exact,
        probe_inserts,
        targ_inserts,
        probe_off + 1,
        targ_off + 1,
    )
}

/// Finds the maximal ungapped anchors at the two ends of the path.
///
/// Walking peak-to-start, a run of consecutive diagonal steps that reaches
/// `min_anchor_len` keeps pulling the 5' anchor towards the alignment start;
/// the first such run (nearest the peak) fixes the 3' anchor at the run's
/// starting pair. Any gap step resets the run.
pub(crate) fn find_anchors(grid: &dyn CellGrid, peak: Peak, min_anchor_len: u32) -> Option<Anchors> {
    let mut run = 0u32;
    let mut anchor5: Option<(u32, u32)> = None;
    let mut anchor3: Option<(u32, u32)> = None;
    let (mut p, mut t) = (peak.probe_idx, peak.targ_idx);
    loop {
        let cell = grid.get(p, t).unwrap_or_default();
        let diagonal = matches!(cell.back, Direction::Terminal | Direction::Diag);
        if diagonal {
            run += 1;
            if run >= min_anchor_len {
                anchor5 = Some((p, t));
                if anchor3.is_none() {
                    anchor3 = Some((p + run - 1, t + run - 1));
                }
            }
        } else {
            run = 0;
        }
        match cell.back {
            Direction::Terminal => break,
            Direction::Diag => {
                p -= 1;
                t -= 1;
            }
            Direction::Left => p -= 1,
            Direction::Down => t -= 1,
        }
    }
    match (anchor5, anchor3) {
        (Some((p5, t5)), Some((p3, t3))) => Some(Anchors::new(p5, t5, p3, t3)),
        _ => None,
    }
}

/// Rebuilds the gapped probe/target renderings of the alignment, in
/// start-to-end order. Both outputs have length
/// `aligned_bases + probe_inserts + targ_inserts`.
pub(crate) fn gapped_pair(
    grid: &dyn CellGrid,
    peak: Peak,
    stats: &AlignmentStats,
    probe: &[u8],
    targ: &[u8],
) -> (Vec<u8>, Vec<u8>) {
    // Collect the steps peak-to-start; the terminal cell is the first
    // aligned pair of the path.
    let mut steps: Vec<Direction> = Vec::with_capacity(stats.total_len() as usize);
    let (mut p, mut t) = (peak.probe_idx, peak.targ_idx);
    loop {
        let cell = grid.get(p, t).unwrap_or_default();
        match cell.back {
            Direction::Terminal => {
                steps.push(Direction::Diag);
                break;
            }
            Direction::Diag => {
                steps.push(Direction::Diag);
                p -= 1;
                t -= 1;
            }
            Direction::Left => {
                steps.push(Direction::Left);
                p -= 1;
            }
            Direction::Down => {
                steps.push(Direction::Down);
                t -= 1;
            }
        }
    }

    let mut probe_out = Vec::with_capacity(steps.len());
    let mut targ_out = Vec::with_capacity(steps.len());
    let mut p = *stats.probe_start() as usize;
    let mut t = *stats.targ_start() as usize;
    for step in steps.iter().rev() {
        match step {
            Direction::Diag => {
                probe_out.push(decode_base(probe[p - 1]));
                targ_out.push(decode_base(targ[t - 1]));
                p += 1;
                t += 1;
            }
            Direction::Left => {
                probe_out.push(decode_base(probe[p - 1]));
                targ_out.push(GAP_MARKER);
                p += 1;
            }
            Direction::Down => {
                probe_out.push(GAP_MARKER);
                targ_out.push(decode_base(targ[t - 1]));
                t += 1;
            }
            Direction::Terminal => unreachable!("terminal steps are rewritten as diagonals"),
        }
    }
    (probe_out, targ_out)
}
