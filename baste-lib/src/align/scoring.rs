use bio::alignment::pairwise::{MatchFunc, MatchParams};
use serde::Serialize;

use super::{
    aligners::constants::{MAX_GAP_RUN, MAX_MATCH_SCORE, MIN_PENALTY},
    error::AlignError,
};

/// Details of scoring are encapsulated in this structure.
///
/// An [affine gap score model](https://en.wikipedia.org/wiki/Gap_penalty#Affine)
/// is used, with two extra knobs on the extension component:
///
/// - `delay_gap_extend`: gap run length below which the extension penalty is
///   waived. At the minimum value of 1 the extension penalty is charged from
///   the opening base onwards.
/// - `prog_penalise_gap_extend`: gap run length at which the extension
///   penalty doubles; 0 disables progression. A non-zero value below
///   `delay_gap_extend` is silently raised to it.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize)]
pub struct Scoring<F: MatchFunc> {
    pub gap_open: i32,
    pub gap_extend: i32,
    pub delay_gap_extend: u8,
    pub prog_penalise_gap_extend: u8,
    pub match_fn: F,
}

impl Scoring<MatchParams> {
    /// Builds a validated scoring configuration from concrete match/mismatch
    /// scores and gap penalties.
    ///
    /// Rejects, without constructing anything:
    /// - `match_score` outside `(0, 100]`
    /// - `mismatch_score`, `gap_open`, or `gap_extend` outside `[-100, 0]`
    /// - `delay_gap_extend` outside `[1, 63]`
    /// - `prog_penalise_gap_extend` outside `[0, 63]`
    pub fn from_scores(
        match_score: i32,
        mismatch_score: i32,
        gap_open: i32,
        gap_extend: i32,
        delay_gap_extend: u8,
        prog_penalise_gap_extend: u8,
    ) -> Result<Self, AlignError> {
        if match_score <= 0 || match_score > MAX_MATCH_SCORE {
            return Err(AlignError::Scoring {
                name: "match_score",
                value: match_score,
                min: 1,
                max: MAX_MATCH_SCORE,
            });
        }
        for (name, value) in [
            ("mismatch_score", mismatch_score),
            ("gap_open", gap_open),
            ("gap_extend", gap_extend),
        ] {
            if !(MIN_PENALTY..=0).contains(&value) {
                return Err(AlignError::Scoring {
                    name,
                    value,
                    min: MIN_PENALTY,
                    max: 0,
                });
            }
        }
        if delay_gap_extend == 0 || delay_gap_extend > MAX_GAP_RUN {
            return Err(AlignError::Scoring {
                name: "delay_gap_extend",
                value: i32::from(delay_gap_extend),
                min: 1,
                max: i32::from(MAX_GAP_RUN),
            });
        }
        if prog_penalise_gap_extend > MAX_GAP_RUN {
            return Err(AlignError::Scoring {
                name: "prog_penalise_gap_extend",
                value: i32::from(prog_penalise_gap_extend),
                min: 0,
                max: i32::from(MAX_GAP_RUN),
            });
        }
        let prog_penalise_gap_extend = if prog_penalise_gap_extend == 0 {
            0
        } else {
            prog_penalise_gap_extend.max(delay_gap_extend)
        };

        Ok(Scoring {
            gap_open,
            gap_extend,
            delay_gap_extend,
            prog_penalise_gap_extend,
            match_fn: MatchParams::new(match_score, mismatch_score),
        })
    }
}

impl<F: MatchFunc> Scoring<F> {
    /// The extension component charged for a gap at the given run length:
    /// waived below the delay threshold, doubled at or beyond the progression
    /// threshold when progression is enabled.
    #[inline]
    pub fn gap_extend_at(&self, run_len: u8) -> i32 {
        if run_len < self.delay_gap_extend {
            0
        } else if self.prog_penalise_gap_extend != 0 && run_len >= self.prog_penalise_gap_extend {
            self.gap_extend * 2
        } else {
            self.gap_extend
        }
    }

    /// The penalty for opening a fresh gap (run length 1). Includes the
    /// immediate extension component when the delay threshold is 1.
    #[inline]
    pub fn gap_open_penalty(&self) -> i32 {
        self.gap_open + self.gap_extend_at(1)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::Scoring;

    #[rstest]
    #[case(0, -1, -2, -1, 1, 0)] // match_score must be positive
    #[case(101, -1, -2, -1, 1, 0)] // match_score above ceiling
    #[case(1, 1, -2, -1, 1, 0)] // mismatch_score must not be positive
    #[case(1, -101, -2, -1, 1, 0)] // mismatch_score below floor
    #[case(1, -1, 1, -1, 1, 0)] // gap_open must not be positive
    #[case(1, -1, -2, -101, 1, 0)] // gap_extend below floor
    #[case(1, -1, -2, -1, 0, 0)] // delay threshold must be at least 1
    #[case(1, -1, -2, -1, 64, 0)] // delay threshold above run clamp
    #[case(1, -1, -2, -1, 1, 64)] // progression threshold above run clamp
    fn test_from_scores_rejects(
        #[case] match_score: i32,
        #[case] mismatch_score: i32,
        #[case] gap_open: i32,
        #[case] gap_extend: i32,
        #[case] delay: u8,
        #[case] prog: u8,
    ) {
        let result = Scoring::from_scores(
            match_score,
            mismatch_score,
            gap_open,
            gap_extend,
            delay,
            prog,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_progression_raised_to_delay() {
        let scoring = Scoring::from_scores(1, -1, -2, -1, 10, 3).unwrap();
        assert_eq!(scoring.prog_penalise_gap_extend, 10);
        // zero keeps progression disabled
        let scoring = Scoring::from_scores(1, -1, -2, -1, 10, 0).unwrap();
        assert_eq!(scoring.prog_penalise_gap_extend, 0);
    }

    #[rstest]
    #[case(3, 0, 1, 0)] // below the delay threshold the extension is waived
    #[case(3, 0, 3, -1)] // charged at the threshold
    #[case(3, 5, 4, -1)] // single rate between delay and progression
    #[case(3, 5, 5, -2)] // doubled at the progression threshold
    #[case(3, 5, 63, -2)]
    fn test_gap_extend_at(
        #[case] delay: u8,
        #[case] prog: u8,
        #[case] run_len: u8,
        #[case] expected: i32,
    ) {
        let scoring = Scoring::from_scores(1, -1, -2, -1, delay, prog).unwrap();
        assert_eq!(scoring.gap_extend_at(run_len), expected);
    }

    #[test]
    fn test_open_includes_immediate_extension_at_delay_one() {
        let scoring = Scoring::from_scores(1, -1, -2, -1, 1, 0).unwrap();
        assert_eq!(scoring.gap_open_penalty(), -3);
        let scoring = Scoring::from_scores(1, -1, -2, -1, 2, 0).unwrap();
        assert_eq!(scoring.gap_open_penalty(), -2);
        // progression at 1 doubles the immediate component
        let scoring = Scoring::from_scores(1, -1, -2, -1, 1, 1).unwrap();
        assert_eq!(scoring.gap_open_penalty(), -4);
    }
}
