//! Sparse block matrix with stable block numbers.
//!
//! Every stored block gets a small integer number that stays fixed while the
//! block lives, so solvers can cache per-block data in flat arrays indexed by
//! number. Numbers freed by removal are recycled before new ones are minted.
//!
//! # Numbering invariant
//!
//! With `max_number` the count of numbers ever handed out since the last
//! bulk clear:
//!
//! - every number below `max_number` is either owned by exactly one live
//!   block or sits exactly once on the free list,
//! - nothing at or above `max_number` is live or free,
//! - a live block knows its number and position, and its position maps
//!   back to that number.
//!
//! [`SparseNumberedBlockMatrix::check_consistency`] verifies all of this.

use std::collections::{BTreeMap, HashSet};

use nalgebra::{DMatrix, DVector};
use nalgebra_sparse::{CooMatrix, CsrMatrix};
use sim_types::SimError;
use tracing::{debug, trace};

/// Minimum number-map capacity.
const MIN_CAPACITY: usize = 16;

/// Dense block stored in a [`SparseNumberedBlockMatrix`].
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixBlock {
    matrix: DMatrix<f64>,
    number: Option<usize>,
    position: Option<(usize, usize)>,
}

impl MatrixBlock {
    /// Wrap a dense matrix as an unnumbered, unplaced block.
    #[must_use]
    pub fn new(matrix: DMatrix<f64>) -> Self {
        Self {
            matrix,
            number: None,
            position: None,
        }
    }

    /// Zero block of the given size.
    #[must_use]
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self::new(DMatrix::zeros(rows, cols))
    }

    /// Request a specific number when the block is added.
    #[must_use]
    pub fn with_number(mut self, number: usize) -> Self {
        self.number = Some(number);
        self
    }

    /// Block number, `None` while not stored in a matrix.
    #[must_use]
    pub fn number(&self) -> Option<usize> {
        self.number
    }

    /// Block row and column, `None` while not stored in a matrix.
    #[must_use]
    pub fn position(&self) -> Option<(usize, usize)> {
        self.position
    }

    /// Block entries.
    #[must_use]
    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.matrix
    }

    /// Mutable block entries.
    pub fn matrix_mut(&mut self) -> &mut DMatrix<f64> {
        &mut self.matrix
    }

    /// Unwrap into the dense matrix.
    #[must_use]
    pub fn into_matrix(self) -> DMatrix<f64> {
        self.matrix
    }
}

/// Block-sparse matrix whose blocks carry stable numbers.
///
/// # Example
///
/// ```
/// use sim_coupling::{MatrixBlock, SparseNumberedBlockMatrix};
///
/// let mut m = SparseNumberedBlockMatrix::new(vec![6, 6], vec![6, 6]);
/// let a = m.add_block(0, 0, MatrixBlock::zeros(6, 6)).unwrap();
/// let b = m.add_block(1, 1, MatrixBlock::zeros(6, 6)).unwrap();
/// assert_eq!((a, b), (0, 1));
///
/// m.remove_block(a);
/// // freed numbers are reused first
/// assert_eq!(m.add_block(0, 1, MatrixBlock::zeros(6, 6)).unwrap(), 0);
/// assert!(m.check_consistency().is_ok());
/// ```
#[derive(Debug, Clone, Default)]
pub struct SparseNumberedBlockMatrix {
    row_sizes: Vec<usize>,
    col_sizes: Vec<usize>,
    /// Per block row: block column -> block number.
    rows: Vec<BTreeMap<usize, usize>>,
    number_map: Vec<Option<MatrixBlock>>,
    free_numbers: Vec<usize>,
    max_number: usize,
    capacity: usize,
}

impl SparseNumberedBlockMatrix {
    /// Create an empty matrix with the given block row and column sizes.
    #[must_use]
    pub fn new(row_sizes: Vec<usize>, col_sizes: Vec<usize>) -> Self {
        let capacity = MIN_CAPACITY.max(row_sizes.len().max(col_sizes.len()));
        Self::with_capacity(row_sizes, col_sizes, capacity)
    }

    /// Create a square block structure with equal row and column sizes.
    #[must_use]
    pub fn square(sizes: Vec<usize>) -> Self {
        Self::new(sizes.clone(), sizes)
    }

    /// Create an empty matrix with an explicit initial number-map capacity.
    #[must_use]
    pub fn with_capacity(row_sizes: Vec<usize>, col_sizes: Vec<usize>, capacity: usize) -> Self {
        let rows = vec![BTreeMap::new(); row_sizes.len()];
        Self {
            row_sizes,
            col_sizes,
            rows,
            number_map: vec![None; capacity],
            free_numbers: Vec::new(),
            max_number: 0,
            capacity,
        }
    }

    /// Number of block rows.
    #[must_use]
    pub fn num_block_rows(&self) -> usize {
        self.row_sizes.len()
    }

    /// Number of block columns.
    #[must_use]
    pub fn num_block_cols(&self) -> usize {
        self.col_sizes.len()
    }

    /// Scalar row count.
    #[must_use]
    pub fn nrows(&self) -> usize {
        self.row_sizes.iter().sum()
    }

    /// Scalar column count.
    #[must_use]
    pub fn ncols(&self) -> usize {
        self.col_sizes.iter().sum()
    }

    /// Size of block row `row`.
    #[must_use]
    pub fn row_size(&self, row: usize) -> Option<usize> {
        self.row_sizes.get(row).copied()
    }

    /// Size of block column `col`.
    #[must_use]
    pub fn col_size(&self, col: usize) -> Option<usize> {
        self.col_sizes.get(col).copied()
    }

    /// Append a block row and return its index.
    pub fn add_block_row(&mut self, size: usize) -> usize {
        self.row_sizes.push(size);
        self.rows.push(BTreeMap::new());
        self.row_sizes.len() - 1
    }

    /// Append a block column and return its index.
    pub fn add_block_col(&mut self, size: usize) -> usize {
        self.col_sizes.push(size);
        self.col_sizes.len() - 1
    }

    /// Number of live blocks.
    #[must_use]
    pub fn num_blocks(&self) -> usize {
        self.rows.iter().map(BTreeMap::len).sum()
    }

    /// One past the highest number handed out since the last clear.
    #[must_use]
    pub fn max_number(&self) -> usize {
        self.max_number
    }

    /// Count of numbers waiting for reuse.
    #[must_use]
    pub fn num_free_numbers(&self) -> usize {
        self.free_numbers.len()
    }

    /// Store `block` at `(row, col)` and return its number.
    ///
    /// A number requested with [`MatrixBlock::with_number`] is honored.
    /// Otherwise a block replacing an existing one inherits its number, and
    /// a block in an empty slot takes a free number or a fresh one.
    pub fn add_block(
        &mut self,
        row: usize,
        col: usize,
        mut block: MatrixBlock,
    ) -> sim_types::Result<usize> {
        let (Some(&rows), Some(&cols)) = (self.row_sizes.get(row), self.col_sizes.get(col)) else {
            return Err(SimError::InvalidBlockIndex {
                row,
                col,
                rows: self.num_block_rows(),
                cols: self.num_block_cols(),
            });
        };
        if block.matrix.shape() != (rows, cols) {
            return Err(SimError::BlockSizeMismatch {
                row,
                col,
                expected_rows: rows,
                expected_cols: cols,
                actual_rows: block.matrix.nrows(),
                actual_cols: block.matrix.ncols(),
            });
        }

        let previous = self.rows[row].get(&col).copied();
        let number = match block.number {
            Some(requested) => {
                if let Some(owner) = self.block_by_number(requested) {
                    if owner.position != Some((row, col)) {
                        let (row, col) = owner.position.unwrap_or((usize::MAX, usize::MAX));
                        return Err(SimError::BlockNumberInUse {
                            number: requested,
                            row,
                            col,
                        });
                    }
                }
                if let Some(old) = previous.filter(|&old| old != requested) {
                    self.release_number(old);
                    self.claim_number(requested);
                } else if previous.is_none() {
                    self.claim_number(requested);
                }
                requested
            }
            None => match previous {
                Some(old) => old,
                None => self.alloc_number(),
            },
        };

        block.number = Some(number);
        block.position = Some((row, col));
        self.number_map[number] = Some(block);
        self.rows[row].insert(col, number);
        trace!(number, row, col, "block stored");
        Ok(number)
    }

    /// Remove the block with the given number.
    ///
    /// The returned block has no number or position; the number goes on the
    /// free list.
    pub fn remove_block(&mut self, number: usize) -> Option<MatrixBlock> {
        let mut block = self.number_map.get_mut(number)?.take()?;
        if let Some((row, col)) = block.position {
            if let Some(entries) = self.rows.get_mut(row) {
                entries.remove(&col);
            }
        }
        self.free_numbers.push(number);
        trace!(number, "block number freed");
        block.number = None;
        block.position = None;
        Some(block)
    }

    /// Remove the block at `(row, col)`.
    pub fn remove_block_at(&mut self, row: usize, col: usize) -> Option<MatrixBlock> {
        let number = self.rows.get(row)?.get(&col).copied()?;
        self.remove_block(number)
    }

    /// Block with the given number.
    #[must_use]
    pub fn block_by_number(&self, number: usize) -> Option<&MatrixBlock> {
        self.number_map.get(number).and_then(Option::as_ref)
    }

    /// Mutable block with the given number.
    pub fn block_by_number_mut(&mut self, number: usize) -> Option<&mut MatrixBlock> {
        self.number_map.get_mut(number).and_then(Option::as_mut)
    }

    /// Block at `(row, col)`.
    #[must_use]
    pub fn block(&self, row: usize, col: usize) -> Option<&MatrixBlock> {
        let number = self.rows.get(row)?.get(&col).copied()?;
        self.block_by_number(number)
    }

    /// Mutable block at `(row, col)`.
    pub fn block_mut(&mut self, row: usize, col: usize) -> Option<&mut MatrixBlock> {
        let number = self.rows.get(row)?.get(&col).copied()?;
        self.block_by_number_mut(number)
    }

    /// Blocks in block row `row`, ordered by column.
    pub fn row_blocks(&self, row: usize) -> impl Iterator<Item = (usize, &MatrixBlock)> + '_ {
        self.rows
            .get(row)
            .into_iter()
            .flat_map(BTreeMap::iter)
            .filter_map(|(&col, &number)| self.block_by_number(number).map(|b| (col, b)))
    }

    /// Drop every block and reset numbering.
    pub fn remove_all_blocks(&mut self) {
        let removed = self.num_blocks();
        for entries in &mut self.rows {
            entries.clear();
        }
        self.clear_numbering();
        debug!(removed, "cleared all blocks");
    }

    /// Drop every block row (and thus every block).
    pub fn remove_all_rows(&mut self) {
        self.remove_all_blocks();
        self.rows.clear();
        self.row_sizes.clear();
    }

    /// Drop every block column (and thus every block).
    pub fn remove_all_cols(&mut self) {
        self.remove_all_blocks();
        self.col_sizes.clear();
    }

    /// Verify the numbering invariant.
    pub fn check_consistency(&self) -> sim_types::Result<()> {
        let mut stored = 0;
        for (row, entries) in self.rows.iter().enumerate() {
            for (&col, &number) in entries {
                match self.block_by_number(number) {
                    Some(block)
                        if block.number == Some(number) && block.position == Some((row, col)) => {}
                    Some(block) => {
                        return Err(SimError::inconsistent(format!(
                            "block at ({row}, {col}) maps to number {number}, which holds number {:?} at {:?}",
                            block.number, block.position
                        )));
                    }
                    None => {
                        return Err(SimError::inconsistent(format!(
                            "block at ({row}, {col}) maps to empty number {number}"
                        )));
                    }
                }
                stored += 1;
            }
        }

        let mut free = HashSet::with_capacity(self.free_numbers.len());
        for &number in &self.free_numbers {
            if !free.insert(number) {
                return Err(SimError::inconsistent(format!(
                    "number {number} is on the free list twice"
                )));
            }
            if number >= self.max_number {
                return Err(SimError::inconsistent(format!(
                    "free number {number} is not below max number {}",
                    self.max_number
                )));
            }
        }

        let mut live = 0;
        let mut unused = 0;
        for (number, slot) in self.number_map.iter().enumerate() {
            let is_free = free.contains(&number);
            match slot {
                Some(block) => {
                    if is_free {
                        return Err(SimError::inconsistent(format!(
                            "number {number} is free but holds a block"
                        )));
                    }
                    if block.number != Some(number) {
                        return Err(SimError::inconsistent(format!(
                            "map entry {number} holds a block numbered {:?}",
                            block.number
                        )));
                    }
                    let mapped = block
                        .position
                        .and_then(|(row, col)| self.rows.get(row)?.get(&col).copied());
                    if mapped != Some(number) {
                        return Err(SimError::inconsistent(format!(
                            "block number {number} is not reachable from its position {:?}",
                            block.position
                        )));
                    }
                    live += 1;
                }
                None if number < self.max_number => {
                    if !is_free {
                        return Err(SimError::inconsistent(format!(
                            "number {number} is not on the free list"
                        )));
                    }
                    unused += 1;
                }
                None => {}
            }
        }

        if live != stored {
            return Err(SimError::inconsistent(format!(
                "number map has {live} blocks but the matrix stores {stored}"
            )));
        }
        if live + unused != self.max_number {
            return Err(SimError::inconsistent(format!(
                "max number is {}, expected {}",
                self.max_number,
                live + unused
            )));
        }
        Ok(())
    }

    /// Compute `M * v`.
    ///
    /// `v` must have [`ncols`](Self::ncols) entries.
    pub fn mul_vec(&self, v: &DVector<f64>) -> sim_types::Result<DVector<f64>> {
        if v.len() != self.ncols() {
            return Err(SimError::VectorLength {
                expected: self.ncols(),
                actual: v.len(),
            });
        }
        let row_offsets = offsets(&self.row_sizes);
        let col_offsets = offsets(&self.col_sizes);
        let mut result = DVector::zeros(self.nrows());

        for (row, entries) in self.rows.iter().enumerate() {
            let r0 = row_offsets[row];
            for (&col, &number) in entries {
                let Some(block) = self.block_by_number(number) else {
                    continue;
                };
                let c0 = col_offsets[col];
                let segment = v.rows(c0, block.matrix.ncols());
                let mut out = result.rows_mut(r0, block.matrix.nrows());
                out += &block.matrix * segment;
            }
        }
        Ok(result)
    }

    /// Convert to a dense matrix (for testing or small systems).
    #[must_use]
    pub fn to_dense(&self) -> DMatrix<f64> {
        let row_offsets = offsets(&self.row_sizes);
        let col_offsets = offsets(&self.col_sizes);
        let mut dense = DMatrix::zeros(self.nrows(), self.ncols());

        for (row, entries) in self.rows.iter().enumerate() {
            for (&col, &number) in entries {
                if let Some(block) = self.block_by_number(number) {
                    let (nr, nc) = block.matrix.shape();
                    dense
                        .view_mut((row_offsets[row], col_offsets[col]), (nr, nc))
                        .copy_from(&block.matrix);
                }
            }
        }
        dense
    }

    /// Convert to CSR, dropping explicit zeros.
    #[must_use]
    pub fn to_csr(&self) -> CsrMatrix<f64> {
        let row_offsets = offsets(&self.row_sizes);
        let col_offsets = offsets(&self.col_sizes);
        let mut coo = CooMatrix::new(self.nrows(), self.ncols());

        for (row, entries) in self.rows.iter().enumerate() {
            for (&col, &number) in entries {
                let Some(block) = self.block_by_number(number) else {
                    continue;
                };
                let (nr, nc) = block.matrix.shape();
                for i in 0..nr {
                    for j in 0..nc {
                        let val = block.matrix[(i, j)];
                        if val != 0.0 {
                            coo.push(row_offsets[row] + i, col_offsets[col] + j, val);
                        }
                    }
                }
            }
        }
        CsrMatrix::from(&coo)
    }

    fn alloc_number(&mut self) -> usize {
        let number = self.free_numbers.pop().unwrap_or(self.max_number);
        if number >= self.max_number {
            self.max_number = number + 1;
        }
        self.ensure_slot(number);
        trace!(number, "block number allocated");
        number
    }

    /// Take ownership of a specific number for a new block.
    fn claim_number(&mut self, number: usize) {
        if number >= self.max_number {
            self.free_numbers.extend(self.max_number..number);
            self.max_number = number + 1;
        } else {
            self.free_numbers.retain(|&n| n != number);
        }
        self.ensure_slot(number);
    }

    fn release_number(&mut self, number: usize) {
        if let Some(slot) = self.number_map.get_mut(number) {
            *slot = None;
        }
        self.free_numbers.push(number);
    }

    fn ensure_slot(&mut self, number: usize) {
        if number >= self.number_map.len() {
            let len = (2 * number).max(number + 1);
            self.number_map.resize(len, None);
        }
    }

    fn clear_numbering(&mut self) {
        self.number_map.clear();
        self.number_map.resize(self.capacity, None);
        self.free_numbers.clear();
        self.max_number = 0;
    }
}

fn offsets(sizes: &[usize]) -> Vec<usize> {
    sizes
        .iter()
        .scan(0, |acc, &s| {
            let start = *acc;
            *acc += s;
            Some(start)
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn block(value: f64) -> MatrixBlock {
        MatrixBlock::new(DMatrix::from_element(2, 2, value))
    }

    fn matrix() -> SparseNumberedBlockMatrix {
        SparseNumberedBlockMatrix::square(vec![2, 2, 2])
    }

    #[test]
    fn test_sequential_numbers() {
        let mut m = matrix();
        assert_eq!(m.add_block(0, 0, block(1.0)).unwrap(), 0);
        assert_eq!(m.add_block(1, 1, block(1.0)).unwrap(), 1);
        assert_eq!(m.add_block(2, 2, block(1.0)).unwrap(), 2);
        assert_eq!(m.max_number(), 3);
        assert!(m.check_consistency().is_ok());
    }

    #[test]
    fn test_freed_number_reused() {
        let mut m = matrix();
        for i in 0..3 {
            m.add_block(i, i, block(1.0)).unwrap();
        }
        let removed = m.remove_block(1).unwrap();
        assert_eq!(removed.number(), None);
        assert_eq!(removed.position(), None);
        assert_eq!(m.num_free_numbers(), 1);
        assert!(m.check_consistency().is_ok());

        assert_eq!(m.add_block(0, 2, block(2.0)).unwrap(), 1);
        assert_eq!(m.max_number(), 3);
        assert_eq!(m.num_free_numbers(), 0);
        assert!(m.check_consistency().is_ok());
    }

    #[test]
    fn test_replacement_keeps_number() {
        let mut m = matrix();
        m.add_block(0, 0, block(1.0)).unwrap();
        let n = m.add_block(0, 1, block(1.0)).unwrap();
        assert_eq!(m.add_block(0, 1, block(5.0)).unwrap(), n);
        assert_relative_eq!(m.block(0, 1).unwrap().matrix()[(0, 0)], 5.0);
        assert_eq!(m.num_blocks(), 2);
        assert!(m.check_consistency().is_ok());
    }

    #[test]
    fn test_explicit_number_beyond_max() {
        let mut m = matrix();
        assert_eq!(m.add_block(1, 0, block(1.0).with_number(4)).unwrap(), 4);
        assert_eq!(m.max_number(), 5);
        assert_eq!(m.num_free_numbers(), 4);
        assert!(m.check_consistency().is_ok());
        // the gap is filled before new numbers are minted
        let n = m.add_block(0, 0, block(1.0)).unwrap();
        assert!(n < 4);
        assert!(m.check_consistency().is_ok());
    }

    #[test]
    fn test_explicit_number_in_use() {
        let mut m = matrix();
        m.add_block(0, 0, block(1.0)).unwrap();
        let err = m.add_block(1, 1, block(1.0).with_number(0)).unwrap_err();
        assert_eq!(
            err,
            SimError::BlockNumberInUse {
                number: 0,
                row: 0,
                col: 0
            }
        );
        assert!(m.check_consistency().is_ok());
    }

    #[test]
    fn test_explicit_number_replacing_occupant() {
        let mut m = matrix();
        m.add_block(0, 0, block(1.0)).unwrap();
        m.add_block(1, 1, block(1.0)).unwrap();
        m.remove_block(1);
        // slot (0, 0) switches from number 0 to the free number 1
        assert_eq!(m.add_block(0, 0, block(2.0).with_number(1)).unwrap(), 1);
        assert!(m.block_by_number(0).is_none());
        assert_eq!(m.num_free_numbers(), 1);
        assert!(m.check_consistency().is_ok());
    }

    #[test]
    fn test_bad_index_and_size() {
        let mut m = matrix();
        assert!(matches!(
            m.add_block(3, 0, block(1.0)),
            Err(SimError::InvalidBlockIndex { .. })
        ));
        assert!(matches!(
            m.add_block(0, 0, MatrixBlock::zeros(3, 2)),
            Err(SimError::BlockSizeMismatch { .. })
        ));
        assert_eq!(m.max_number(), 0);
    }

    #[test]
    fn test_remove_all_resets_numbering() {
        let mut m = matrix();
        for i in 0..3 {
            m.add_block(i, 0, block(1.0)).unwrap();
        }
        m.remove_block_at(1, 0).unwrap();
        m.remove_all_blocks();
        assert_eq!(m.num_blocks(), 0);
        assert_eq!(m.max_number(), 0);
        assert_eq!(m.num_free_numbers(), 0);
        assert_eq!(m.add_block(2, 2, block(1.0)).unwrap(), 0);
        assert!(m.check_consistency().is_ok());

        m.remove_all_rows();
        assert_eq!(m.num_block_rows(), 0);
        assert!(m.check_consistency().is_ok());
    }

    #[test]
    fn test_map_grows_past_capacity() {
        let mut m = SparseNumberedBlockMatrix::with_capacity(vec![1; 40], vec![1], 2);
        for i in 0..40 {
            assert_eq!(m.add_block(i, 0, MatrixBlock::zeros(1, 1)).unwrap(), i);
        }
        assert!(m.check_consistency().is_ok());
    }

    #[test]
    fn test_clone_is_independent() {
        let mut m = matrix();
        m.add_block(0, 0, block(1.0)).unwrap();
        let copy = m.clone();
        m.remove_block(0);
        assert!(copy.block_by_number(0).is_some());
        assert!(copy.check_consistency().is_ok());
        assert!(m.check_consistency().is_ok());
    }

    #[test]
    fn test_check_consistency_detects_corruption() {
        let mut m = matrix();
        m.add_block(0, 0, block(1.0)).unwrap();
        m.add_block(1, 1, block(1.0)).unwrap();
        m.free_numbers.push(0);
        assert!(m.check_consistency().unwrap_err().is_inconsistency());

        let mut m = matrix();
        m.add_block(0, 0, block(1.0)).unwrap();
        m.max_number = 2;
        assert!(m.check_consistency().is_err());
    }

    #[test]
    fn test_products_agree_with_dense() {
        let mut m = SparseNumberedBlockMatrix::new(vec![2, 1], vec![1, 2]);
        m.add_block(0, 1, MatrixBlock::new(DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 3.0, 4.0])))
            .unwrap();
        m.add_block(1, 0, MatrixBlock::new(DMatrix::from_element(1, 1, -1.0)))
            .unwrap();
        let v = DVector::from_vec(vec![1.0, 0.5, -1.0]);

        let dense = m.to_dense();
        assert_eq!(dense.shape(), (3, 3));
        assert_relative_eq!(m.mul_vec(&v).unwrap(), &dense * &v, epsilon = 1e-12);

        let csr = m.to_csr();
        assert_eq!(csr.nnz(), 5);
        assert_relative_eq!(DMatrix::from(&csr), dense, epsilon = 1e-12);
    }

    #[test]
    fn test_mul_vec_rejects_wrong_length() {
        let mut m = SparseNumberedBlockMatrix::new(vec![2, 1], vec![1, 2]);
        m.add_block(1, 0, MatrixBlock::new(DMatrix::from_element(1, 1, 2.0)))
            .unwrap();
        assert_eq!(
            m.mul_vec(&DVector::zeros(2)).unwrap_err(),
            SimError::VectorLength { expected: 3, actual: 2 }
        );
        assert_eq!(m.mul_vec(&DVector::zeros(3)).unwrap().len(), 3);
    }

    #[test]
    fn test_row_blocks_in_column_order() {
        let mut m = matrix();
        m.add_block(1, 2, block(1.0)).unwrap();
        m.add_block(1, 0, block(2.0)).unwrap();
        let cols: Vec<usize> = m.row_blocks(1).map(|(c, _)| c).collect();
        assert_eq!(cols, vec![0, 2]);
        assert_eq!(m.row_blocks(7).count(), 0);
    }
}
