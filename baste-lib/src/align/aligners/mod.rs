pub(crate) mod constants;

use bio::alignment::pairwise::{MatchFunc, MatchParams};
use derive_builder::Builder;

use crate::util::dna::{base_code, BASE_N};

use super::{
    alignment::{AlignmentStats, Anchors, Peak},
    cell::{Cell, Direction},
    error::AlignError,
    matrix::{banded::BandedMatrix, dense::DenseMatrix, CellGrid},
    scoring::Scoring,
    traceback,
};
use constants::{
    MAX_GAP_RUN, MAX_MATRIX_CELLS, MAX_PATH_LEN_DIFF, MAX_SEQ_LEN, MIN_PATH_LEN_DIFF, MIN_SEQ_LEN,
    MIN_START_NONOVERLAP,
};

/// Which addressing scheme the last alignment pass used.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub(crate) enum Mode {
    Dense,
    Banded,
}

/// Options controlling a single alignment pass.
///
/// `max_start_nonoverlap` (floored at 5) and `max_path_len_diff` (clamped to
/// `[0.05, 1.0]`) shape the banded search corridor and are ignored for
/// unbanded alignments.
#[derive(Copy, Clone, Debug, Builder)]
pub struct AlignOptions {
    /// Restrict the search to a corridor around the diagonal.
    #[builder(default = "false")]
    pub banded: bool,

    /// Minimum half-width of the banded corridor, in target positions.
    #[builder(default = "50")]
    pub max_start_nonoverlap: u32,

    /// Tolerated probe/target path length divergence; larger values narrow
    /// the corridor.
    #[builder(default = "1.0")]
    pub max_path_len_diff: f64,
}

impl Default for AlignOptions {
    fn default() -> Self {
        AlignOptionsBuilder::default()
            .build()
            .expect("all options have defaults")
    }
}

/// A Smith-Waterman local aligner over one probe/target pair.
///
/// One instance owns one alignment at a time: registering a new sequence or
/// scoring configuration, or running [`align`](Self::align) again, replaces
/// the previous result. Matrix buffers are grown across calls and never
/// shrunk, so reusing an instance amortises allocation; [`reset`](Self::reset)
/// releases everything. Instances are not shareable across threads without
/// external synchronisation — spawn one aligner per worker instead.
pub struct LocalAligner<F: MatchFunc> {
    pub(crate) scoring: Scoring<F>,
    pub(crate) probe: Vec<u8>,
    pub(crate) targ: Vec<u8>,
    pub(crate) dense: DenseMatrix,
    pub(crate) banded: BandedMatrix,
    pub(crate) mode: Option<Mode>,
    peak: Option<Peak>,
    stats: Option<AlignmentStats>,
}

impl Default for LocalAligner<MatchParams> {
    fn default() -> Self {
        LocalAligner::new(Scoring {
            gap_open: -6,
            gap_extend: -2,
            delay_gap_extend: 1,
            prog_penalise_gap_extend: 0,
            match_fn: MatchParams::new(1, -4),
        })
    }
}

impl<F: MatchFunc> LocalAligner<F> {
    pub fn new(scoring: Scoring<F>) -> Self {
        Self {
            scoring,
            probe: Vec::new(),
            targ: Vec::new(),
            dense: DenseMatrix::default(),
            banded: BandedMatrix::default(),
            mode: None,
            peak: None,
            stats: None,
        }
    }

    /// Installs a new scoring configuration, discarding any computed
    /// alignment but retaining the registered sequences.
    pub fn set_scoring(&mut self, scoring: Scoring<F>) {
        self.scoring = scoring;
        self.invalidate();
    }

    pub fn scoring(&self) -> &Scoring<F> {
        &self.scoring
    }

    /// Registers the probe sequence (base codes, mask flags allowed),
    /// replacing any previous probe and discarding any computed alignment.
    pub fn set_probe(&mut self, symbols: &[u8]) -> Result<(), AlignError> {
        Self::validate_and_copy(&mut self.probe, symbols)?;
        self.invalidate();
        Ok(())
    }

    /// Registers the target sequence; see [`set_probe`](Self::set_probe).
    pub fn set_targ(&mut self, symbols: &[u8]) -> Result<(), AlignError> {
        Self::validate_and_copy(&mut self.targ, symbols)?;
        self.invalidate();
        Ok(())
    }

    pub fn probe(&self) -> &[u8] {
        &self.probe
    }

    pub fn targ(&self) -> &[u8] {
        &self.targ
    }

    /// Releases every buffer and clears both sequences and all results.
    pub fn reset(&mut self) {
        self.probe = Vec::new();
        self.targ = Vec::new();
        self.dense = DenseMatrix::default();
        self.banded = BandedMatrix::default();
        self.invalidate();
    }

    /// Runs the alignment pass and returns the peak score (0 when no
    /// positive-scoring cell exists).
    ///
    /// Refuses alignments whose cell count (the `probe_len * targ_len / 10`
    /// working estimate in banded mode) exceeds
    /// [`MAX_MATRIX_CELLS`](constants::MAX_MATRIX_CELLS) before allocating
    /// anything. Allocation failure aborts only this call; the engine stays
    /// reusable.
    pub fn align(&mut self, opts: &AlignOptions) -> Result<i32, AlignError> {
        if self.probe.is_empty() || self.targ.is_empty() {
            return Err(AlignError::SequenceMissing);
        }
        let probe_len = self.probe.len() as u32;
        let targ_len = self.targ.len() as u32;
        let total = u64::from(probe_len) * u64::from(targ_len);
        let cells = if opts.banded { total / 10 } else { total };
        if cells > MAX_MATRIX_CELLS {
            return Err(AlignError::MatrixTooLarge {
                cells,
                max: MAX_MATRIX_CELLS,
            });
        }
        self.invalidate();
        if opts.banded {
            self.align_banded(probe_len, targ_len, opts)?;
            self.mode = Some(Mode::Banded);
        } else {
            self.align_dense(probe_len, targ_len)?;
            self.mode = Some(Mode::Dense);
        }
        Ok(self.peak.map_or(0, |peak| peak.score))
    }

    /// The highest-scoring cell of the last alignment, if any cell scored
    /// above zero.
    pub fn peak(&self) -> Option<Peak> {
        self.peak
    }

    /// Number of aligned (diagonal) bases on the optimal path, walking the
    /// traceback on first call and caching the result. Returns 0 when no
    /// alignment with a positive peak exists.
    pub fn num_aligned_bases(&mut self) -> u32 {
        self.ensure_stats().map_or(0, |stats| *stats.aligned_bases())
    }

    /// All traceback-derived statistics in one call.
    pub fn stats(&mut self) -> Result<AlignmentStats, AlignError> {
        self.ensure_stats().ok_or(AlignError::NoAlignment)
    }

    /// The maximal ungapped anchors at the two alignment ends, or `None` when
    /// fewer than `min_anchor_len` bases aligned or no diagonal run reaches
    /// the threshold.
    pub fn anchors(&mut self, min_anchor_len: u32) -> Option<Anchors> {
        let stats = self.ensure_stats()?;
        if *stats.aligned_bases() < min_anchor_len {
            return None;
        }
        let peak = self.peak?;
        traceback::find_anchors(self.grid()?, peak, min_anchor_len)
    }

    /// The gapped probe rendering of the alignment, start-to-end, with
    /// [`GAP_MARKER`](crate::util::dna::GAP_MARKER) at target-insert columns.
    pub fn probe_alignment(&mut self) -> Result<Vec<u8>, AlignError> {
        Ok(self.gapped_pair()?.0)
    }

    /// The gapped target rendering; same length as the probe rendering.
    pub fn target_alignment(&mut self) -> Result<Vec<u8>, AlignError> {
        Ok(self.gapped_pair()?.1)
    }

    fn gapped_pair(&mut self) -> Result<(Vec<u8>, Vec<u8>), AlignError> {
        let stats = self.ensure_stats().ok_or(AlignError::NoAlignment)?;
        let peak = self.peak.ok_or(AlignError::NoAlignment)?;
        let grid = self.grid().ok_or(AlignError::NoAlignment)?;
        Ok(traceback::gapped_pair(
            grid,
            peak,
            &stats,
            &self.probe,
            &self.targ,
        ))
    }

    fn invalidate(&mut self) {
        self.mode = None;
        self.peak = None;
        self.stats = None;
    }

    fn grid(&self) -> Option<&dyn CellGrid> {
        match self.mode? {
            Mode::Dense => Some(&self.dense),
            Mode::Banded => Some(&self.banded),
        }
    }

    fn ensure_stats(&mut self) -> Option<AlignmentStats> {
        if self.stats.is_none() {
            let peak = self.peak?;
            let stats = traceback::summarize(self.grid()?, peak);
            self.stats = Some(stats);
        }
        self.stats
    }

    fn validate_and_copy(dst: &mut Vec<u8>, symbols: &[u8]) -> Result<(), AlignError> {
        if symbols.is_empty() {
            return Err(AlignError::SequenceMissing);
        }
        if symbols.len() < MIN_SEQ_LEN || symbols.len() > MAX_SEQ_LEN {
            return Err(AlignError::SequenceLength {
                len: symbols.len(),
                min: MIN_SEQ_LEN,
                max: MAX_SEQ_LEN,
            });
        }
        if base_code(symbols[0]) > BASE_N {
            return Err(AlignError::SequenceSymbol { code: symbols[0] });
        }
        dst.clear();
        dst.extend_from_slice(symbols);
        Ok(())
    }

    fn align_dense(&mut self, probe_len: u32, targ_len: u32) -> Result<(), AlignError> {
        self.dense.init(probe_len, targ_len)?;
        let mut peak: Option<Peak> = None;
        for p in 1..=probe_len {
            let probe_sym = self.probe[(p - 1) as usize];
            for t in 1..=targ_len {
                let targ_sym = self.targ[(t - 1) as usize];
                let cell = score_cell(&self.scoring, &self.dense, p, t, probe_sym, targ_sym);
                self.dense.set(p, t, cell);
                track_peak(&mut peak, cell.score, p, t);
            }
        }
        self.peak = peak;
        Ok(())
    }

    fn align_banded(
        &mut self,
        probe_len: u32,
        targ_len: u32,
        opts: &AlignOptions,
    ) -> Result<(), AlignError> {
        let estimated = u64::from(probe_len) * u64::from(targ_len) / 10;
        self.banded.init(probe_len, estimated)?;
        let halfwidth_floor = opts.max_start_nonoverlap.max(MIN_START_NONOVERLAP);
        let path_len_diff = opts
            .max_path_len_diff
            .clamp(MIN_PATH_LEN_DIFF, MAX_PATH_LEN_DIFF);
        let mut peak: Option<Peak> = None;
        for p in 1..=probe_len {
            let (first_t, last_t) =
                band_window(p, probe_len, targ_len, halfwidth_floor, path_len_diff);
            self.banded.begin_row(p, first_t, last_t - first_t + 1)?;
            let probe_sym = self.probe[(p - 1) as usize];
            for t in first_t..=last_t {
                let targ_sym = self.targ[(t - 1) as usize];
                let cell = score_cell(&self.scoring, &self.banded, p, t, probe_sym, targ_sym);
                if !self.banded.push(p, t, cell)? {
                    // a refused slot is indistinguishable from a band edge to
                    // every later predecessor lookup
                    continue;
                }
                track_peak(&mut peak, cell.score, p, t);
            }
        }
        self.peak = peak;
        Ok(())
    }
}

/// The banded search corridor for probe position `p`: centred on the
/// proportional diagonal, half-width grown with `p` and floored at
/// `halfwidth_floor`, clipped to the target.
fn band_window(
    p: u32,
    probe_len: u32,
    targ_len: u32,
    halfwidth_floor: u32,
    path_len_diff: f64,
) -> (u32, u32) {
    let center = (u64::from(targ_len) * u64::from(p) / u64::from(probe_len)) as i64;
    let halfwidth = ((f64::from(targ_len) * f64::from(p)) / (f64::from(probe_len) * path_len_diff))
        as i64;
    let halfwidth = halfwidth.max(i64::from(halfwidth_floor));
    let first = (center - halfwidth).max(1);
    let last = (center + halfwidth).min(i64::from(targ_len));
    (first as u32, last as u32)
}

#[inline]
fn track_peak(peak: &mut Option<Peak>, score: i32, p: u32, t: u32) {
    if score > peak.map_or(0, |pk| pk.score) {
        *peak = Some(Peak {
            score,
            probe_idx: p,
            targ_idx: t,
        });
    }
}

/// Scores one cell from its three predecessors.
///
/// The recurrence is identical for dense and banded addressing: an absent
/// diagonal predecessor makes the cell a free-ride terminal, an absent
/// left/down predecessor contributes a flat zero. Ties prefer the diagonal,
/// then the down transition; a non-positive winner resets the cell.
fn score_cell<F: MatchFunc>(
    scoring: &Scoring<F>,
    grid: &dyn CellGrid,
    p: u32,
    t: u32,
    probe_sym: u8,
    targ_sym: u8,
) -> Cell {
    let probe_base = base_code(probe_sym);
    let targ_base = base_code(targ_sym);
    let is_match = probe_base == targ_base;
    let addend = scoring.match_fn.score(probe_base, targ_base);

    let (diag, diag_terminal) = match grid.get(p - 1, t - 1) {
        Some(prev) => (prev.score + addend, false),
        None => (if is_match { addend } else { 0 }, true),
    };
    let (left, left_run) = gap_candidate(scoring, grid.get(p - 1, t));
    let (down, down_run) = gap_candidate(scoring, grid.get(p, t - 1));

    if diag >= down && diag >= left {
        if diag <= 0 {
            Cell::reset()
        } else {
            Cell::diagonal(diag, is_match, diag_terminal)
        }
    } else if down >= left {
        if down <= 0 {
            Cell::reset()
        } else {
            Cell::gapped(down, Direction::Down, down_run)
        }
    } else if left <= 0 {
        Cell::reset()
    } else {
        Cell::gapped(left, Direction::Left, left_run)
    }
}

/// The score and run length of extending (or opening) a gap from `pred`.
fn gap_candidate<F: MatchFunc>(scoring: &Scoring<F>, pred: Option<Cell>) -> (i32, u8) {
    match pred {
        None => (0, 0),
        Some(prev) if prev.gap_open => {
            let run = prev.gap_len.saturating_add(1).min(MAX_GAP_RUN);
            (prev.score + scoring.gap_extend_at(run), run)
        }
        Some(prev) => (prev.score + scoring.gap_open_penalty(), 1),
    }
}

#[cfg(test)]
pub mod tests {
    use bio::alignment::pairwise::MatchParams;
    use rstest::rstest;

    use crate::{
        align::{
            aligners::constants::{MAX_MATRIX_CELLS, MIN_SEQ_LEN},
            error::AlignError,
            scoring::Scoring,
        },
        util::dna::{encode, BASE_A, GAP_MARKER},
    };

    use super::{AlignOptions, AlignOptionsBuilder, LocalAligner};

    fn scoring(
        match_score: i32,
        mismatch: i32,
        gap_open: i32,
        gap_extend: i32,
        delay: u8,
        prog: u8,
    ) -> Scoring<MatchParams> {
        Scoring::from_scores(match_score, mismatch, gap_open, gap_extend, delay, prog).unwrap()
    }

    fn aligner(scores: Scoring<MatchParams>, probe: &[u8], targ: &[u8]) -> LocalAligner<MatchParams> {
        let mut aligner = LocalAligner::new(scores);
        aligner.set_probe(&encode(probe)).unwrap();
        aligner.set_targ(&encode(targ)).unwrap();
        aligner
    }

    fn banded_opts(max_start_nonoverlap: u32, max_path_len_diff: f64) -> AlignOptions {
        AlignOptionsBuilder::default()
            .banded(true)
            .max_start_nonoverlap(max_start_nonoverlap)
            .max_path_len_diff(max_path_len_diff)
            .build()
            .unwrap()
    }

    #[test]
    fn test_identical_sequences_align_end_to_end() {
        let mut aligner = aligner(scoring(1, -1, -2, -1, 1, 0), b"ACGTACGT", b"ACGTACGT");
        let score = aligner.align(&AlignOptions::default()).unwrap();
        assert_eq!(score, 8);
        let peak = aligner.peak().unwrap();
        assert_eq!((peak.probe_idx, peak.targ_idx), (8, 8));
        let stats = aligner.stats().unwrap();
        assert_eq!(*stats.aligned_bases(), 8);
        assert_eq!(*stats.exact_matches(), 8);
        assert_eq!(*stats.probe_inserts(), 0);
        assert_eq!(*stats.targ_inserts(), 0);
        assert_eq!(*stats.probe_start(), 1);
        assert_eq!(*stats.targ_start(), 1);
    }

    #[rstest]
    #[case(b"ACGTACGT", 1)]
    #[case(b"ACGTACGT", 3)]
    #[case(b"TTTTTCCCCAAAA", 2)]
    fn test_self_alignment_scores_full_length(#[case] seq: &[u8], #[case] match_score: i32) {
        let mut aligner = aligner(scoring(match_score, -1, -2, -1, 1, 0), seq, seq);
        let score = aligner.align(&AlignOptions::default()).unwrap();
        assert_eq!(score, seq.len() as i32 * match_score);
        assert_eq!(aligner.num_aligned_bases(), seq.len() as u32);
        let stats = aligner.stats().unwrap();
        assert_eq!(*stats.exact_matches(), seq.len() as u32);
        assert_eq!(*stats.probe_inserts(), 0);
        assert_eq!(*stats.targ_inserts(), 0);
    }

    #[test]
    fn test_single_probe_insertion() {
        // one T inserted after position 4; the delay threshold of 2 waives
        // the extension penalty for a length-1 gap
        let mut aligner = aligner(scoring(1, -1, -2, -1, 2, 0), b"ACGTTACGT", b"ACGTACGT");
        let score = aligner.align(&AlignOptions::default()).unwrap();
        assert_eq!(score, 6);
        let stats = aligner.stats().unwrap();
        assert_eq!(*stats.aligned_bases(), 8);
        assert_eq!(*stats.exact_matches(), 8);
        assert_eq!(*stats.probe_inserts(), 1);
        assert_eq!(*stats.targ_inserts(), 0);
        assert_eq!(*stats.probe_start(), 1);
        assert_eq!(*stats.targ_start(), 1);
    }

    #[test]
    fn test_immediate_extension_prefers_diagonal_restart() {
        // with the extension charged from the opening base, a length-1 gap
        // costs 3 and the tie-break picks a shorter diagonal path restarted
        // from a zero cell instead
        let mut aligner = aligner(scoring(1, -1, -2, -1, 1, 0), b"ACGTTACGT", b"ACGTACGT");
        let score = aligner.align(&AlignOptions::default()).unwrap();
        assert_eq!(score, 5);
        let stats = aligner.stats().unwrap();
        assert_eq!(*stats.aligned_bases(), 6);
        assert_eq!(*stats.exact_matches(), 5);
        assert_eq!(*stats.probe_inserts(), 0);
        assert_eq!(*stats.targ_inserts(), 0);
        assert_eq!(*stats.probe_start(), 4);
        assert_eq!(*stats.targ_start(), 3);
    }

    #[rstest]
    #[case(2, 13)] // open -2, one extension at the threshold
    #[case(3, 12)]
    #[case(4, 11)]
    fn test_gap_cost_grows_with_gap_length(#[case] gap_len: usize, #[case] expected: i32) {
        let probe: Vec<u8> = [b"ACACACAC".as_slice(), &vec![b'T'; gap_len], b"GAGAGAGA"].concat();
        let mut aligner = aligner(scoring(1, -3, -2, -1, 2, 0), &probe, b"ACACACACGAGAGAGA");
        let score = aligner.align(&AlignOptions::default()).unwrap();
        assert_eq!(score, expected);
        let stats = aligner.stats().unwrap();
        assert_eq!(*stats.aligned_bases(), 16);
        assert_eq!(*stats.probe_inserts(), gap_len as u32);
    }

    #[test]
    fn test_progressive_penalty_doubles_long_extensions() {
        // runs 2 (single), 3 and 4 (doubled): open -2, extensions -1 -2 -2
        let probe: Vec<u8> = [b"ACACACAC".as_slice(), &[b'T'; 4], b"GAGAGAGA"].concat();
        let mut aligner = aligner(scoring(1, -3, -2, -1, 2, 3), &probe, b"ACACACACGAGAGAGA");
        let score = aligner.align(&AlignOptions::default()).unwrap();
        assert_eq!(score, 16 - 2 - 1 - 2 - 2);
    }

    #[test]
    fn test_target_insertion_counts_on_target_side() {
        let mut aligner = aligner(scoring(1, -1, -2, -1, 2, 0), b"ACGTACGT", b"ACGTTACGT");
        let score = aligner.align(&AlignOptions::default()).unwrap();
        assert_eq!(score, 6);
        let stats = aligner.stats().unwrap();
        assert_eq!(*stats.probe_inserts(), 0);
        assert_eq!(*stats.targ_inserts(), 1);
    }

    #[test]
    fn test_align_is_idempotent() {
        let mut aligner = aligner(scoring(1, -1, -2, -1, 2, 0), b"ACGTTACGT", b"ACGTACGT");
        let first_score = aligner.align(&AlignOptions::default()).unwrap();
        let first_stats = aligner.stats().unwrap();
        let second_score = aligner.align(&AlignOptions::default()).unwrap();
        let second_stats = aligner.stats().unwrap();
        assert_eq!(first_score, second_score);
        assert_eq!(first_stats, second_stats);
    }

    #[test]
    fn test_local_alignment_clips_nonmatching_flanks() {
        let mut aligner = aligner(
            scoring(1, -2, -3, -1, 1, 0),
            b"TTTTTACGTACGTTTTTT",
            b"CCCCCACGTACGTCCCCC",
        );
        let score = aligner.align(&AlignOptions::default()).unwrap();
        assert_eq!(score, 8);
        let stats = aligner.stats().unwrap();
        // the path ends on a zero cell just before the matching block, so the
        // terminal contributes one non-matching aligned pair
        assert_eq!(*stats.probe_start(), 5);
        assert_eq!(*stats.targ_start(), 5);
        assert_eq!(*stats.aligned_bases(), 9);
        assert_eq!(*stats.exact_matches(), 8);
    }

    #[test]
    fn test_no_positive_cell_reports_empty_alignment() {
        let mut aligner = aligner(scoring(1, -1, -2, -1, 1, 0), b"AAAAA", b"CCCCC");
        let score = aligner.align(&AlignOptions::default()).unwrap();
        assert_eq!(score, 0);
        assert_eq!(aligner.peak(), None);
        assert_eq!(aligner.num_aligned_bases(), 0);
        assert!(matches!(aligner.stats(), Err(AlignError::NoAlignment)));
    }

    #[test]
    fn test_masking_never_affects_scores() {
        let mut plain = aligner(scoring(1, -1, -2, -1, 1, 0), b"ACGTACGT", b"ACGTACGT");
        let mut masked = aligner(scoring(1, -1, -2, -1, 1, 0), b"acgtACGT", b"ACGTacgt");
        let plain_score = plain.align(&AlignOptions::default()).unwrap();
        let masked_score = masked.align(&AlignOptions::default()).unwrap();
        assert_eq!(plain_score, masked_score);
        assert_eq!(plain.stats().unwrap(), masked.stats().unwrap());
        // the rendering preserves the mask as lowercase
        assert_eq!(masked.probe_alignment().unwrap(), b"acgtACGT".to_vec());
    }

    #[test]
    fn test_gapped_renderings_round_trip() {
        let mut aligner = aligner(scoring(1, -1, -2, -1, 2, 0), b"ACGTTACGT", b"ACGTACGT");
        aligner.align(&AlignOptions::default()).unwrap();
        let stats = aligner.stats().unwrap();
        let probe_aln = aligner.probe_alignment().unwrap();
        let targ_aln = aligner.target_alignment().unwrap();
        assert_eq!(probe_aln.len(), stats.total_len() as usize);
        assert_eq!(targ_aln.len(), stats.total_len() as usize);
        assert_eq!(probe_aln, b"ACGTTACGT".to_vec());
        // the tie-break settles the interchangeable T gap one column early
        assert_eq!(targ_aln, b"ACG-TACGT".to_vec());

        // stripping the gap markers recovers the aligned subsequences
        let probe_span =
            (*stats.probe_start() - 1) as usize..(*stats.probe_start() - 1 + stats.aligned_bases() + stats.probe_inserts()) as usize;
        let stripped: Vec<u8> = probe_aln
            .iter()
            .copied()
            .filter(|&ch| ch != GAP_MARKER)
            .collect();
        assert_eq!(stripped, b"ACGTTACGT"[probe_span].to_vec());
    }

    #[test]
    fn test_anchors_span_unbroken_alignment() {
        let mut aligner = aligner(scoring(1, -1, -2, -1, 1, 0), b"ACGTACGT", b"ACGTACGT");
        aligner.align(&AlignOptions::default()).unwrap();
        let anchors = aligner.anchors(4).unwrap();
        assert_eq!(*anchors.probe_start5(), 1);
        assert_eq!(*anchors.targ_start5(), 1);
        assert_eq!(*anchors.probe_end3(), 8);
        assert_eq!(*anchors.targ_end3(), 8);
    }

    #[test]
    fn test_anchors_on_either_side_of_a_gap() {
        let probe: Vec<u8> = [b"ACACACAC".as_slice(), &[b'T'; 4], b"GAGAGAGA"].concat();
        let mut aligner = aligner(scoring(1, -3, -2, -1, 2, 0), &probe, b"ACACACACGAGAGAGA");
        aligner.align(&AlignOptions::default()).unwrap();
        let anchors = aligner.anchors(5).unwrap();
        // the run nearest the alignment start
        assert_eq!(*anchors.probe_start5(), 1);
        assert_eq!(*anchors.targ_start5(), 1);
        // the run nearest the peak
        assert_eq!(*anchors.probe_end3(), 20);
        assert_eq!(*anchors.targ_end3(), 16);
    }

    #[test]
    fn test_anchors_absent_below_threshold() {
        let mut aligner = aligner(scoring(1, -1, -2, -1, 1, 0), b"ACGTACGT", b"ACGTACGT");
        aligner.align(&AlignOptions::default()).unwrap();
        assert!(aligner.anchors(9).is_none());
    }

    #[test]
    fn test_failed_scoring_leaves_previous_configuration_working() {
        let mut aligner = aligner(scoring(1, -1, -2, -1, 1, 0), b"ACGTACGT", b"ACGTACGT");
        let before = aligner.align(&AlignOptions::default()).unwrap();
        // a zero match score is rejected before anything can change
        assert!(Scoring::from_scores(0, -1, -2, -1, 1, 0).is_err());
        let after = aligner.align(&AlignOptions::default()).unwrap();
        assert_eq!(before, after);
    }

    #[rstest]
    #[case(&[])]
    #[case(b"ACGT")] // below the minimum length
    fn test_sequence_length_validation(#[case] seq: &[u8]) {
        let mut aligner = LocalAligner::default();
        assert!(aligner.set_probe(&encode(seq)).is_err());
        assert!(aligner.set_targ(&encode(seq)).is_err());
    }

    #[test]
    fn test_first_symbol_above_ambiguity_code_rejected() {
        let mut aligner = LocalAligner::default();
        let mut symbols = vec![BASE_A; MIN_SEQ_LEN];
        symbols[0] = 0x05;
        assert!(matches!(
            aligner.set_probe(&symbols),
            Err(AlignError::SequenceSymbol { code: 0x05 })
        ));
    }

    #[test]
    fn test_align_without_sequences_fails() {
        let mut aligner = LocalAligner::default();
        assert!(matches!(
            aligner.align(&AlignOptions::default()),
            Err(AlignError::SequenceMissing)
        ));
        aligner.set_probe(&encode(b"ACGTACGT")).unwrap();
        assert!(matches!(
            aligner.align(&AlignOptions::default()),
            Err(AlignError::SequenceMissing)
        ));
    }

    #[test]
    fn test_oversized_matrix_refused_before_allocation() {
        let seq = vec![BASE_A; 20_000];
        let mut aligner = LocalAligner::default();
        aligner.set_probe(&seq).unwrap();
        aligner.set_targ(&seq).unwrap();
        match aligner.align(&AlignOptions::default()) {
            Err(AlignError::MatrixTooLarge { cells, max }) => {
                assert_eq!(cells, 400_000_000);
                assert_eq!(max, MAX_MATRIX_CELLS);
            }
            other => panic!("expected a capacity error, got {other:?}"),
        }
    }

    #[test]
    fn test_banded_matches_unbanded_inside_the_corridor() {
        let probe = b"ACGTTACGTGGCATTACG";
        let targ = b"ACGTACGTGGCATTACGT";
        let mut full = aligner(scoring(1, -1, -2, -1, 2, 0), probe, targ);
        let mut banded = aligner(scoring(1, -1, -2, -1, 2, 0), probe, targ);
        let full_score = full.align(&AlignOptions::default()).unwrap();
        let banded_score = banded.align(&banded_opts(50, 1.0)).unwrap();
        assert_eq!(full_score, banded_score);
        assert_eq!(full.stats().unwrap(), banded.stats().unwrap());
        assert_eq!(
            full.probe_alignment().unwrap(),
            banded.probe_alignment().unwrap()
        );
    }

    #[test]
    fn test_banded_self_alignment_follows_the_diagonal() {
        let seq = b"ACGTACGTACGTACGTACGTACGTACGTACGTACGTACGT";
        let mut aligner = aligner(scoring(1, -1, -2, -1, 1, 0), seq, seq);
        let score = aligner.align(&banded_opts(5, 1.0)).unwrap();
        assert_eq!(score, seq.len() as i32);
        assert_eq!(aligner.num_aligned_bases(), seq.len() as u32);
    }

    #[test]
    fn test_narrow_band_may_miss_an_off_corridor_optimum() {
        // the matching block sits at the far end of the target, well outside
        // a minimal corridor for the early probe positions
        let probe = b"ACGTACGTAC";
        let targ: Vec<u8> = [&[b'T'; 60][..], b"ACGTACGTAC"].concat();
        let mut full = aligner(scoring(1, -1, -2, -1, 1, 0), probe, &targ);
        let mut banded = aligner(scoring(1, -1, -2, -1, 1, 0), probe, &targ);
        let full_score = full.align(&AlignOptions::default()).unwrap();
        let banded_score = banded.align(&banded_opts(5, 1.0)).unwrap();
        assert_eq!(full_score, 10);
        assert!(banded_score <= full_score);
    }

    #[test]
    fn test_new_sequence_invalidates_previous_result() {
        let mut aligner = aligner(scoring(1, -1, -2, -1, 1, 0), b"ACGTACGT", b"ACGTACGT");
        aligner.align(&AlignOptions::default()).unwrap();
        assert_eq!(aligner.num_aligned_bases(), 8);
        aligner.set_probe(&encode(b"TTTTTTTT")).unwrap();
        assert_eq!(aligner.num_aligned_bases(), 0);
        assert!(matches!(aligner.stats(), Err(AlignError::NoAlignment)));
    }

    #[test]
    fn test_reset_clears_sequences() {
        let mut aligner = aligner(scoring(1, -1, -2, -1, 1, 0), b"ACGTACGT", b"ACGTACGT");
        aligner.align(&AlignOptions::default()).unwrap();
        aligner.reset();
        assert!(aligner.probe().is_empty());
        assert!(aligner.targ().is_empty());
        assert!(matches!(
            aligner.align(&AlignOptions::default()),
            Err(AlignError::SequenceMissing)
        ));
    }
}
