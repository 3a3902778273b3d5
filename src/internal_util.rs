use std::cmp::min;

use itertools::Itertools;

use crate::solve::Dimensions;
use crate::Cell;

/// The on-board 8-neighbourhood of `cell`, self excluded, in row-major order.
///
/// `cell` itself is assumed to be on the board.
pub(crate) fn adjacent(cell: Cell, dimensions: Dimensions) -> impl Iterator<Item = Cell> {
    let rows = cell.row.saturating_sub(1)..=min(cell.row + 1, dimensions.height - 1);
    let cols = cell.col.saturating_sub(1)..=min(cell.col + 1, dimensions.width - 1);
    rows.cartesian_product(cols)
        .map(Cell::from)
        .filter(move |&other| other != cell)
}

/// Every cell of the board, in row-major order.
pub(crate) fn all_cells(dimensions: Dimensions) -> impl Iterator<Item = Cell> {
    (0..dimensions.height)
        .cartesian_product(0..dimensions.width)
        .map(Cell::from)
}
