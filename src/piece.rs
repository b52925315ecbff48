use crate::error::PieceError;

/// 0 is empty, anything else is the rank of the piece that filled the cell.
pub type Cell = u32;

// ============================================================================
// Pixels
// ============================================================================

/// Square matrix of cells, stored row-major.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Pixels {
    size: usize,
    cells: Vec<Cell>,
}

impl Pixels {
    pub fn from_rows(rows: Vec<Vec<Cell>>) -> Result<Self, PieceError> {
        let size = rows.len();
        if size == 0 {
            return Err(PieceError::Empty);
        }
        if let Some((row, cells)) = rows.iter().enumerate().find(|(_, r)| r.len() != size) {
            return Err(PieceError::NotSquare {
                row,
                len: cells.len(),
                size,
            });
        }
        Ok(Self {
            size,
            cells: rows.into_iter().flatten().collect(),
        })
    }

    pub(crate) fn zeroed(size: usize) -> Self {
        Self {
            size,
            cells: vec![0; size * size],
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn get(&self, x: usize, y: usize) -> Cell {
        self.cells[y * self.size + x]
    }

    pub(crate) fn set(&mut self, x: usize, y: usize, value: Cell) {
        self.cells[y * self.size + x] = value;
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.cells.chunks(self.size)
    }

    pub fn active_count(&self) -> usize {
        self.cells.iter().filter(|c| **c != 0).count()
    }

    /// `new[y][x] = old[size - 1 - x][y]`
    pub fn rotated_cw(&self) -> Self {
        let n = self.size;
        let mut rotated = Self::zeroed(n);
        for y in 0..n {
            for x in 0..n {
                rotated.set(x, y, self.get(y, n - 1 - x));
            }
        }
        rotated
    }

    /// True when every non-zero cell is reachable from every other through
    /// edge-adjacent non-zero cells. An all-zero matrix is not connected.
    pub fn is_connected(&self) -> bool {
        let n = self.size;
        let Some(start) = self.cells.iter().position(|c| *c != 0) else {
            return false;
        };

        let mut seen = vec![false; self.cells.len()];
        let mut stack = vec![start];
        seen[start] = true;
        let mut reached = 0;

        while let Some(index) = stack.pop() {
            reached += 1;
            let (x, y) = (index % n, index / n);
            let neighbors = [
                (x > 0).then(|| index - 1),
                (x + 1 < n).then(|| index + 1),
                (y > 0).then(|| index - n),
                (y + 1 < n).then(|| index + n),
            ];
            for next in neighbors.into_iter().flatten() {
                if !seen[next] && self.cells[next] != 0 {
                    seen[next] = true;
                    stack.push(next);
                }
            }
        }

        reached == self.active_count()
    }
}

// ============================================================================
// Piece
// ============================================================================

/// A polyomino positioned on the board. `(x, y)` is the board coordinate of
/// the matrix's top-left corner. Transforms return new pieces.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Piece {
    x: i32,
    y: i32,
    pixels: Pixels,
    rank: u32,
}

impl Piece {
    /// Checks that exactly `rank` cells are set, all to `rank`, and that
    /// they form one edge-connected shape.
    pub fn new(x: i32, y: i32, pixels: Pixels, rank: u32) -> Result<Self, PieceError> {
        if let Some(value) = pixels.cells.iter().copied().find(|c| *c != 0 && *c != rank) {
            return Err(PieceError::WrongCellValue { rank, value });
        }
        let count = pixels.active_count();
        if rank == 0 || count != rank as usize {
            return Err(PieceError::WrongCellCount { rank, count });
        }
        if !pixels.is_connected() {
            return Err(PieceError::Disconnected);
        }
        Ok(Self { x, y, pixels, rank })
    }

    pub fn x(&self) -> i32 {
        self.x
    }

    pub fn y(&self) -> i32 {
        self.y
    }

    pub fn rank(&self) -> u32 {
        self.rank
    }

    pub fn size(&self) -> usize {
        self.pixels.size()
    }

    pub fn pixels(&self) -> &Pixels {
        &self.pixels
    }

    pub fn translated(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            pixels: self.pixels.clone(),
            rank: self.rank,
        }
    }

    pub fn rotated_cw(&self) -> Self {
        Self {
            x: self.x,
            y: self.y,
            pixels: self.pixels.rotated_cw(),
            rank: self.rank,
        }
    }

    /// Visits the local offset of every active cell in row-major order until
    /// the visitor returns `false`. Returns whether every cell was visited.
    pub fn for_each_active_cell<F>(&self, mut visit: F) -> bool
    where
        F: FnMut(usize, usize) -> bool,
    {
        for (y, row) in self.pixels.rows().enumerate() {
            for (x, cell) in row.iter().enumerate() {
                if *cell != 0 && !visit(x, y) {
                    return false;
                }
            }
        }
        true
    }

    /// Board coordinates of the active cells.
    pub fn cells(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        self.pixels.rows().enumerate().flat_map(move |(y, row)| {
            row.iter()
                .enumerate()
                .filter(|(_, cell)| **cell != 0)
                .map(move |(x, _)| (self.x + x as i32, self.y + y as i32))
        })
    }
}
