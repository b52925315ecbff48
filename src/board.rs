use crate::piece::{Cell, Piece};

/// Fixed-size grid of locked cells, indexed `[row][column]` with row 0 at the top.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Board {
    columns: usize,
    rows: usize,
    grid: Vec<Vec<Cell>>,
}

impl Board {
    pub fn new(columns: usize, rows: usize) -> Self {
        Self {
            columns,
            rows,
            grid: vec![vec![0; columns]; rows],
        }
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn grid(&self) -> &[Vec<Cell>] {
        &self.grid
    }

    pub fn get(&self, x: usize, y: usize) -> Cell {
        self.grid[y][x]
    }

    pub fn set(&mut self, x: usize, y: usize, value: Cell) {
        self.grid[y][x] = value;
    }

    /// A piece fits when every active cell is on the board and empty.
    /// Stops at the first offending cell.
    pub fn fits(&self, piece: &Piece) -> bool {
        piece.for_each_active_cell(|px, py| {
            let x = piece.x() + px as i32;
            let y = piece.y() + py as i32;
            (0..self.columns as i32).contains(&x)
                && (0..self.rows as i32).contains(&y)
                && self.grid[y as usize][x as usize] == 0
        })
    }

    /// Copies the piece's rank into every cell it covers. Cells that fall
    /// outside the board are skipped.
    pub fn lock(&mut self, piece: &Piece) {
        let rank = piece.rank();
        for (x, y) in piece.cells() {
            if (0..self.columns as i32).contains(&x) && (0..self.rows as i32).contains(&y) {
                self.grid[y as usize][x as usize] = rank;
            }
        }
    }

    pub fn is_row_filled(&self, y: usize) -> bool {
        self.filled_count_in_row(y) == self.columns
    }

    /// Indices of every filled row, top to bottom.
    pub fn filled_rows(&self) -> Vec<usize> {
        (0..self.rows).filter(|y| self.is_row_filled(*y)).collect()
    }

    /// Removes row `y`, shifts every row above it down by one and inserts an
    /// empty row at the top.
    pub fn remove_row(&mut self, y: usize) {
        self.grid.remove(y);
        self.grid.insert(0, vec![0; self.columns]);
    }

    /// Clears every filled row and returns the cleared indices, top to
    /// bottom. Removing rows in that order keeps the remaining indices valid
    /// since each removal only moves rows above it.
    pub fn clear_filled_rows(&mut self) -> Vec<usize> {
        let filled = self.filled_rows();
        for y in &filled {
            self.remove_row(*y);
        }
        filled
    }

    pub fn filled_count_in_row(&self, y: usize) -> usize {
        self.grid[y].iter().filter(|cell| **cell != 0).count()
    }

    pub fn total_filled_cells(&self) -> usize {
        self.grid.iter().flatten().filter(|cell| **cell != 0).count()
    }

    pub fn is_empty(&self) -> bool {
        self.total_filled_cells() == 0
    }
}
