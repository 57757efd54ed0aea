use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use bio::alignment::pairwise::MatchFunc;
use itertools::Itertools;

use crate::util::dna::decode_base;

use super::{
    aligners::{LocalAligner, Mode},
    cell::Direction,
    error::AlignError,
    matrix::CellGrid,
};

impl<F: MatchFunc> LocalAligner<F> {
    /// Renders the full score matrix as CSV: target symbols as header column
    /// pairs, one row per probe symbol, and a back-direction symbol plus the
    /// cell score per matrix cell. Terminal cells render an empty direction
    /// column.
    ///
    /// Only unbanded alignments can be dumped; banded alignments fail with
    /// [`AlignError::BandedDump`] rather than writing a partial matrix.
    pub fn dump_scores<P: AsRef<Path>>(
        &self,
        path: P,
        down_sym: char,
        left_sym: char,
        diag_sym: char,
    ) -> Result<(), AlignError> {
        match self.mode {
            None => return Err(AlignError::NoAlignment),
            Some(Mode::Banded) => return Err(AlignError::BandedDump),
            Some(Mode::Dense) => (),
        }
        let mut writer = BufWriter::new(File::create(path)?);
        let header = self
            .targ
            .iter()
            .map(|&sym| format!("{},", decode_base(sym) as char))
            .join(",");
        writeln!(writer, ",{header}")?;
        for (row, &probe_sym) in self.probe.iter().enumerate() {
            let cells = (1..=self.targ.len() as u32)
                .map(|t| {
                    let cell = self.dense.get(row as u32 + 1, t).unwrap_or_default();
                    let dir = match cell.back {
                        Direction::Diag => diag_sym,
                        Direction::Left => left_sym,
                        Direction::Down => down_sym,
                        Direction::Terminal => ' ',
                    };
                    format!("{dir},{}", cell.score)
                })
                .join(",");
            writeln!(writer, "{},{cells}", decode_base(probe_sym) as char)?;
        }
        writer.flush()?;
        Ok(())
    }
}
