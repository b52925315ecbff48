use crate::error::ConfigError;

pub const DEFAULT_COLUMNS: usize = 12;
pub const DEFAULT_ROWS: usize = 24;
pub const DEFAULT_STARTING_RANK: u32 = 4;
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 1000;

/// Board dimensions and difficulty settings, fixed for the lifetime of a game.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct GameConfig {
    columns: usize,
    rows: usize,
    starting_rank: u32,
    tick_interval_ms: u64,
}

impl GameConfig {
    pub fn new(columns: usize, rows: usize, starting_rank: u32) -> Result<Self, ConfigError> {
        if columns == 0 {
            return Err(ConfigError::NoColumns);
        }
        if rows == 0 {
            return Err(ConfigError::NoRows);
        }
        if starting_rank == 0 {
            return Err(ConfigError::ZeroRank);
        }
        Ok(Self {
            columns,
            rows,
            starting_rank,
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
        })
    }

    pub fn with_tick_interval_ms(mut self, tick_interval_ms: u64) -> Result<Self, ConfigError> {
        if tick_interval_ms == 0 {
            return Err(ConfigError::ZeroTickInterval);
        }
        self.tick_interval_ms = tick_interval_ms;
        Ok(self)
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn starting_rank(&self) -> u32 {
        self.starting_rank
    }

    pub fn tick_interval_ms(&self) -> u64 {
        self.tick_interval_ms
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            columns: DEFAULT_COLUMNS,
            rows: DEFAULT_ROWS,
            starting_rank: DEFAULT_STARTING_RANK,
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
        }
    }
}
