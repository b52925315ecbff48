pub mod board;
pub mod config;
pub mod error;
pub mod game;
pub mod generator;
pub mod piece;

pub use board::Board;
pub use config::GameConfig;
pub use error::{ConfigError, GeneratorError, PieceError};
pub use game::{Game, GameEvent, GameState};
pub use generator::{Growth, PieceProvider, PolyominoGenerator, SequencePieceProvider};
pub use piece::{Cell, Piece, Pixels};
