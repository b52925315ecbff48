use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("board must have at least one column")]
    NoColumns,
    #[error("board must have at least one row")]
    NoRows,
    #[error("starting rank must be at least 1")]
    ZeroRank,
    #[error("tick interval must be at least 1 ms")]
    ZeroTickInterval,
    #[error("board is {columns}x{rows} but the config expects {expected_columns}x{expected_rows}")]
    BoardSizeMismatch {
        columns: usize,
        rows: usize,
        expected_columns: usize,
        expected_rows: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PieceError {
    #[error("pixel matrix is empty")]
    Empty,
    #[error("pixel matrix is not square: row {row} has {len} cells, expected {size}")]
    NotSquare { row: usize, len: usize, size: usize },
    #[error("piece of rank {rank} has {count} active cells")]
    WrongCellCount { rank: u32, count: usize },
    #[error("cell value {value} does not match rank {rank}")]
    WrongCellValue { rank: u32, value: u32 },
    #[error("active cells are not 4-connected")]
    Disconnected,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeneratorError {
    #[error("cannot generate a polyomino of rank 0")]
    ZeroRank,
    #[error("piece sequence is empty")]
    EmptySequence,
    #[error("generated shape is invalid: {0}")]
    InvalidShape(#[from] PieceError),
}
