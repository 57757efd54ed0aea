use crate::align::{cell::Cell, error::AlignError};

use super::CellGrid;

/// Per-probe-position descriptor of the contiguous target window whose cells
/// were allocated, and where they start in the linear buffer.
#[derive(Default, Copy, Clone, Debug)]
struct BandRow {
    first_t: u32,
    len: u32,
    offset: usize,
}

/// Band-addressed cell storage: one contiguous run of target positions per
/// probe position, laid out back to back in a single buffer.
///
/// Rows must be opened in increasing probe order and cells pushed at strictly
/// consecutive target indexes; a non-contiguous push is rejected (the caller
/// treats the cell as never allocated). The buffer grows by extrapolating the
/// cells used so far over the remaining probe positions — a tuning default
/// only, correctness never depends on it.
#[derive(Default, Clone, Debug)]
pub(crate) struct BandedMatrix {
    probe_len: u32,
    rows: Vec<BandRow>,
    cells: Vec<Cell>,
}

impl BandedMatrix {
    /// Clears the band index and pre-sizes the cell buffer to the given
    /// working estimate. Buffers are grown on demand and never shrunk.
    pub(crate) fn init(&mut self, probe_len: u32, estimated_cells: u64) -> Result<(), AlignError> {
        self.probe_len = probe_len;
        self.rows.clear();
        self.cells.clear();
        try_reserve_to(&mut self.rows, probe_len as usize, "band descriptors")?;
        self.rows.resize(probe_len as usize, BandRow::default());
        try_reserve_to(&mut self.cells, estimated_cells as usize, "band cells")?;
        Ok(())
    }

    /// Opens the band row for probe position `p` at target position
    /// `first_t`, reserving room for `window_len` cells.
    pub(crate) fn begin_row(
        &mut self,
        p: u32,
        first_t: u32,
        window_len: u32,
    ) -> Result<(), AlignError> {
        debug_assert!(p >= 1 && p <= self.probe_len);
        let needed = self.cells.len() + window_len as usize;
        if needed > self.cells.capacity() {
            // Extrapolate current usage over the remaining probe positions.
            let grow = (self.cells.len() as u64 * 2 * u64::from(self.probe_len) / u64::from(p))
                .max(window_len as u64) as usize;
            let target = self.cells.len() + grow;
            try_reserve_to(&mut self.cells, target, "band cells")?;
        }
        self.rows[(p - 1) as usize] = BandRow {
            first_t,
            len: 0,
            offset: self.cells.len(),
        };
        Ok(())
    }

    /// Appends the cell for (p, t) to the current band row. Returns
    /// `Ok(false)` — cell not allocated — when `t` is not the next contiguous
    /// target index for the row.
    pub(crate) fn push(&mut self, p: u32, t: u32, cell: Cell) -> Result<bool, AlignError> {
        let row = self.rows[(p - 1) as usize];
        if t != row.first_t + row.len {
            return Ok(false);
        }
        if self.cells.len() == self.cells.capacity() {
            let target = self.cells.len() + 1;
            try_reserve_to(&mut self.cells, target, "band cells")?;
        }
        self.cells.push(cell);
        self.rows[(p - 1) as usize].len += 1;
        Ok(true)
    }

    /// Number of cells allocated so far across all rows.
    pub(crate) fn cells_used(&self) -> usize {
        self.cells.len()
    }
}

impl CellGrid for BandedMatrix {
    #[inline]
    fn get(&self, p: u32, t: u32) -> Option<Cell> {
        if p == 0 || t == 0 || p > self.probe_len {
            return None;
        }
        let row = self.rows[(p - 1) as usize];
        if t < row.first_t || t >= row.first_t + row.len {
            return None;
        }
        Some(self.cells[row.offset + (t - row.first_t) as usize])
    }
}

fn try_reserve_to<T>(vec: &mut Vec<T>, len: usize, what: &'static str) -> Result<(), AlignError> {
    if len > vec.capacity() {
        let additional = len - vec.len();
        vec.try_reserve(additional)
            .map_err(|source| AlignError::Allocation { what, source })?;
    }
    Ok(())
}
