use crate::align::{cell::Cell, error::AlignError};

use super::CellGrid;

/// Row-major cell storage over the full probe x target matrix.
///
/// The backing buffer is grown on demand and never shrunk, so repeated
/// alignments on one engine instance amortise allocation.
#[derive(Default, Clone, Debug)]
pub(crate) struct DenseMatrix {
    probe_len: u32,
    targ_len: u32,
    cells: Vec<Cell>,
}

impl DenseMatrix {
    /// Clears the matrix and sizes it for a probe x target alignment, with
    /// every cell in the zero/terminal state.
    pub(crate) fn init(&mut self, probe_len: u32, targ_len: u32) -> Result<(), AlignError> {
        self.probe_len = probe_len;
        self.targ_len = targ_len;
        let len = probe_len as usize * targ_len as usize;
        self.cells.clear();
        if len > self.cells.capacity() {
            let additional = len - self.cells.capacity();
            self.cells
                .try_reserve(additional)
                .map_err(|source| AlignError::Allocation {
                    what: "matrix cells",
                    source,
                })?;
        }
        self.cells.resize(len, Cell::reset());
        Ok(())
    }

    #[inline]
    pub(crate) fn set(&mut self, p: u32, t: u32, cell: Cell) {
        debug_assert!(p >= 1 && p <= self.probe_len);
        debug_assert!(t >= 1 && t <= self.targ_len);
        let idx = (p - 1) as usize * self.targ_len as usize + (t - 1) as usize;
        self.cells[idx] = cell;
    }
}

impl CellGrid for DenseMatrix {
    #[inline]
    fn get(&self, p: u32, t: u32) -> Option<Cell> {
        if p == 0 || t == 0 || p > self.probe_len || t > self.targ_len {
            return None;
        }
        let idx = (p - 1) as usize * self.targ_len as usize + (t - 1) as usize;
        Some(self.cells[idx])
    }
}
