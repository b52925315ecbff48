//! Polyomino geometry for pieces of any rank.
//!
//! Ranks 1 through 4 draw from a small catalog of hand-picked shapes. Larger
//! ranks are grown on a `(2 * rank - 1)` square workspace, centered so that a
//! straight line of `rank` cells in any direction ends exactly on its edge,
//! and then trimmed down to the smallest square that holds the shape.
//!
//! Two growth strategies are mixed evenly. Frontier growth picks random cells
//! off the boundary of the shape and produces compact, clumped pieces. Walk
//! growth takes a self-avoiding random walk and produces long, meandering
//! pieces; on their own those make the board nearly unplayable, so every
//! piece flips a coin between the two.

use log::{trace, warn};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::{GeneratorError, PieceError};
use crate::piece::{Cell, Pixels};

pub const DEFAULT_MAX_WALK_ATTEMPTS: usize = 10_000;

// ============================================================================
// Catalog
// ============================================================================

const MONOMINOES: &[&[&str]] = &[&["#"]];

const DOMINOES: &[&[&str]] = &[&["#.", "#."]];

const TROMINOES: &[&[&str]] = &[&[".#.", ".#.", ".#."], &["##", "#."]];

const TETROMINOES: &[&[&str]] = &[
    &[".#..", ".#..", ".#..", ".#.."],
    &[".##", ".#.", ".#."],
    &["##.", ".#.", ".#."],
    &[".#.", "###", "..."],
    &["...", ".##", "##."],
    &["...", "##.", ".##"],
    &["##", "##"],
];

fn catalog(rank: u32) -> Option<&'static [&'static [&'static str]]> {
    match rank {
        1 => Some(MONOMINOES),
        2 => Some(DOMINOES),
        3 => Some(TROMINOES),
        4 => Some(TETROMINOES),
        _ => None,
    }
}

fn paint(shape: &[&str], rank: u32) -> Result<Pixels, PieceError> {
    let rows = shape
        .iter()
        .map(|row| row.chars().map(|c| if c == '#' { rank } else { 0 }).collect())
        .collect();
    Pixels::from_rows(rows)
}

// ============================================================================
// Piece Provider Trait
// ============================================================================

/// Source of piece geometry for the game engine.
pub trait PieceProvider {
    fn next_pixels(&mut self, rank: u32) -> Result<Pixels, GeneratorError>;
}

/// Replays a fixed list of matrices in order, wrapping around at the end.
pub struct SequencePieceProvider {
    pieces: Vec<Pixels>,
    index: usize,
}

impl SequencePieceProvider {
    pub fn new(pieces: Vec<Pixels>) -> Self {
        Self { pieces, index: 0 }
    }
}

impl PieceProvider for SequencePieceProvider {
    fn next_pixels(&mut self, _rank: u32) -> Result<Pixels, GeneratorError> {
        if self.pieces.is_empty() {
            return Err(GeneratorError::EmptySequence);
        }
        let pixels = self.pieces[self.index % self.pieces.len()].clone();
        self.index += 1;
        Ok(pixels)
    }
}

// ============================================================================
// Generator
// ============================================================================

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Growth {
    Frontier,
    Walk,
}

pub struct PolyominoGenerator<R> {
    rng: R,
    max_walk_attempts: usize,
}

impl<R: Rng> PolyominoGenerator<R> {
    pub fn new(rng: R) -> Self {
        Self {
            rng,
            max_walk_attempts: DEFAULT_MAX_WALK_ATTEMPTS,
        }
    }

    /// Caps how many walks are tried before walk growth gives up and grows
    /// the piece from the frontier instead. Zero always uses the frontier.
    pub fn with_max_walk_attempts(mut self, attempts: usize) -> Self {
        self.max_walk_attempts = attempts;
        self
    }

    pub fn generate(&mut self, rank: u32) -> Result<Pixels, GeneratorError> {
        if rank == 0 {
            return Err(GeneratorError::ZeroRank);
        }

        if let Some(shapes) = catalog(rank) {
            let shape = shapes[self.rng.gen_range(0..shapes.len())];
            return Ok(paint(shape, rank)?);
        }

        let growth = if self.rng.gen_bool(0.5) {
            Growth::Frontier
        } else {
            Growth::Walk
        };
        self.generate_with(rank, growth)
    }

    /// Grows a piece with the given strategy, skipping the catalog.
    pub fn generate_with(&mut self, rank: u32, growth: Growth) -> Result<Pixels, GeneratorError> {
        if rank == 0 {
            return Err(GeneratorError::ZeroRank);
        }

        let draft = match growth {
            Growth::Frontier => self.grow_frontier(rank),
            Growth::Walk => match self.grow_walk(rank) {
                Some(draft) => draft,
                None => {
                    warn!(
                        "walk growth for rank {} stuck {} times, growing from frontier",
                        rank, self.max_walk_attempts
                    );
                    self.grow_frontier(rank)
                }
            },
        };

        Ok(trim(&draft).ok_or(PieceError::Empty)?)
    }

    fn grow_frontier(&mut self, rank: u32) -> Pixels {
        let size = workspace_size(rank);
        let center = rank as usize - 1;
        let mut draft = Pixels::zeroed(size);
        let mut frontier = vec![(center, center)];

        // A connected shape smaller than `rank` always has an empty neighbor
        // inside the workspace, so the frontier never runs dry here.
        for _ in 0..rank {
            if frontier.is_empty() {
                break;
            }
            let (x, y) = frontier.swap_remove(self.rng.gen_range(0..frontier.len()));
            draft.set(x, y, rank);

            for next in neighbors(x, y, size) {
                if draft.get(next.0, next.1) == 0 && !frontier.contains(&next) {
                    frontier.push(next);
                }
            }
        }

        draft
    }

    fn grow_walk(&mut self, rank: u32) -> Option<Pixels> {
        for attempt in 1..=self.max_walk_attempts {
            if let Some(draft) = self.try_walk(rank) {
                trace!("walk growth for rank {} succeeded on attempt {}", rank, attempt);
                return Some(draft);
            }
        }
        None
    }

    // One self-avoiding walk from the center. Dead ends throw the whole walk away.
    fn try_walk(&mut self, rank: u32) -> Option<Pixels> {
        let size = workspace_size(rank);
        let (mut x, mut y) = (rank as usize - 1, rank as usize - 1);
        let mut draft = Pixels::zeroed(size);
        draft.set(x, y, rank);

        for _ in 1..rank {
            let open: Vec<(usize, usize)> = neighbors(x, y, size)
                .filter(|(nx, ny)| draft.get(*nx, *ny) == 0)
                .collect();
            let &(nx, ny) = open.choose(&mut self.rng)?;
            draft.set(nx, ny, rank);
            (x, y) = (nx, ny);
        }

        Some(draft)
    }
}

impl<R: Rng> PieceProvider for PolyominoGenerator<R> {
    fn next_pixels(&mut self, rank: u32) -> Result<Pixels, GeneratorError> {
        self.generate(rank)
    }
}

fn workspace_size(rank: u32) -> usize {
    rank as usize * 2 - 1
}

// left, up, right, down
fn neighbors(x: usize, y: usize, size: usize) -> impl Iterator<Item = (usize, usize)> {
    [
        (x > 0).then(|| (x - 1, y)),
        (y > 0).then(|| (x, y - 1)),
        (x + 1 < size).then(|| (x + 1, y)),
        (y + 1 < size).then(|| (x, y + 1)),
    ]
    .into_iter()
    .flatten()
}

// ============================================================================
// Trim
// ============================================================================

/// Crops the active cells of `draft` to their bounding box and centers that
/// box inside the smallest square that holds it, leaning top/left when the
/// leftover is odd. Returns `None` when `draft` has no active cells.
pub fn trim(draft: &Pixels) -> Option<Pixels> {
    let active: Vec<(usize, usize, Cell)> = draft
        .rows()
        .enumerate()
        .flat_map(|(y, row)| {
            row.iter()
                .enumerate()
                .filter(|(_, cell)| **cell != 0)
                .map(move |(x, cell)| (x, y, *cell))
        })
        .collect();

    let min_x = active.iter().map(|c| c.0).min()?;
    let max_x = active.iter().map(|c| c.0).max()?;
    let min_y = active.iter().map(|c| c.1).min()?;
    let max_y = active.iter().map(|c| c.1).max()?;

    let width = max_x - min_x + 1;
    let height = max_y - min_y + 1;
    let size = width.max(height);
    let offset_x = (size - width) / 2;
    let offset_y = (size - height) / 2;

    let mut pixels = Pixels::zeroed(size);
    for (x, y, cell) in active {
        pixels.set(x - min_x + offset_x, y - min_y + offset_y, cell);
    }
    Some(pixels)
}
