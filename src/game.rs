use log::{debug, error, info};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::board::Board;
use crate::config::GameConfig;
use crate::error::ConfigError;
use crate::generator::{PieceProvider, PolyominoGenerator};
use crate::piece::{Cell, Piece};

// ============================================================================
// Types
// ============================================================================

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum GameState {
    Menu,
    Tutorial,
    Running,
    Paused,
    GameOver,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum GameEvent {
    GameStarted,
    TutorialStarted,
    PieceSpawned,
    PieceMoved { dx: i32, dy: i32 },
    PieceRotated,
    PieceLocked,
    /// Cleared row indices, top to bottom. Each removal shifts every row
    /// above it down by one.
    RowsCleared { rows: Vec<usize> },
    ScoreChanged(u32),
    RankChanged(u32),
    Paused,
    Resumed,
    GameOver,
    ReturnedToMenu,
}

// Rebased on start and resume: the first timestamp seen afterwards becomes
// the baseline instead of triggering a burst of catch-up ticks.
#[derive(Clone, Copy, Debug)]
struct TickClock {
    interval_ms: u64,
    last_step_ms: Option<u64>,
}

impl TickClock {
    fn new(interval_ms: u64) -> Self {
        Self {
            interval_ms,
            last_step_ms: None,
        }
    }

    fn rebase(&mut self) {
        self.last_step_ms = None;
    }

    fn is_due(&mut self, now_ms: u64) -> bool {
        match self.last_step_ms {
            None => {
                self.last_step_ms = Some(now_ms);
                false
            }
            Some(last) if now_ms.saturating_sub(last) >= self.interval_ms => {
                self.last_step_ms = Some(now_ms);
                true
            }
            Some(_) => false,
        }
    }
}

// ============================================================================
// Game
// ============================================================================

pub struct Game {
    config: GameConfig,
    board: Board,
    active_piece: Option<Piece>,
    next_piece: Option<Piece>,
    rank: u32,
    score: u32,
    state: GameState,
    clock: TickClock,
    piece_provider: Box<dyn PieceProvider>,
    events: Vec<GameEvent>,
}

impl Game {
    pub fn new(config: GameConfig) -> Self {
        Self::with_provider(config, Box::new(PolyominoGenerator::new(rand::thread_rng())))
    }

    pub fn with_seed(config: GameConfig, seed: u64) -> Self {
        Self::with_provider(
            config,
            Box::new(PolyominoGenerator::new(StdRng::seed_from_u64(seed))),
        )
    }

    pub fn with_provider(config: GameConfig, provider: Box<dyn PieceProvider>) -> Self {
        Self {
            config,
            board: Board::new(config.columns(), config.rows()),
            active_piece: None,
            next_piece: None,
            rank: config.starting_rank(),
            score: 0,
            state: GameState::Menu,
            clock: TickClock::new(config.tick_interval_ms()),
            piece_provider: provider,
            events: Vec::new(),
        }
    }

    /// Starts a running game on a prepared board with the given active piece.
    /// The board must have the dimensions named by `config`.
    pub fn with_board(
        config: GameConfig,
        board: Board,
        active_piece: Piece,
        provider: Box<dyn PieceProvider>,
    ) -> Result<Self, ConfigError> {
        if board.columns() != config.columns() || board.rows() != config.rows() {
            return Err(ConfigError::BoardSizeMismatch {
                columns: board.columns(),
                rows: board.rows(),
                expected_columns: config.columns(),
                expected_rows: config.rows(),
            });
        }

        let mut game = Self::with_provider(config, provider);
        game.rank = active_piece.rank();
        game.board = board;
        game.active_piece = Some(active_piece);
        game.state = GameState::Running;
        Ok(game)
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn active_piece(&self) -> Option<&Piece> {
        self.active_piece.as_ref()
    }

    pub fn next_piece(&self) -> Option<&Piece> {
        self.next_piece.as_ref()
    }

    pub fn rank(&self) -> u32 {
        self.rank
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn is_game_over(&self) -> bool {
        self.state == GameState::GameOver
    }

    /// How far the active piece can fall before it rests on something.
    pub fn drop_distance(&self) -> Option<i32> {
        let piece = self.active_piece.as_ref()?;
        let mut distance = 0;
        while self.board.fits(&piece.translated(0, distance + 1)) {
            distance += 1;
        }
        Some(distance)
    }

    /// Takes and clears all pending events
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    // ------------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------------

    pub fn begin_tutorial(&mut self) -> bool {
        if self.state != GameState::Menu {
            return false;
        }
        self.state = GameState::Tutorial;
        self.events.push(GameEvent::TutorialStarted);
        true
    }

    pub fn finish_tutorial(&mut self) -> bool {
        if self.state != GameState::Tutorial {
            return false;
        }
        self.start()
    }

    /// Resets everything and spawns the first piece. Only valid from the
    /// menu or the tutorial.
    pub fn start(&mut self) -> bool {
        if !matches!(self.state, GameState::Menu | GameState::Tutorial) {
            return false;
        }

        self.reset();
        self.state = GameState::Running;
        self.clock.rebase();
        info!(
            "game started on {}x{} board at rank {}",
            self.config.columns(),
            self.config.rows(),
            self.rank
        );
        self.events.push(GameEvent::GameStarted);
        self.spawn_piece();
        true
    }

    pub fn pause(&mut self) -> bool {
        if self.state != GameState::Running {
            return false;
        }
        self.state = GameState::Paused;
        info!("game paused");
        self.events.push(GameEvent::Paused);
        true
    }

    pub fn resume(&mut self) -> bool {
        if self.state != GameState::Paused {
            return false;
        }
        self.state = GameState::Running;
        self.clock.rebase();
        info!("game resumed");
        self.events.push(GameEvent::Resumed);
        true
    }

    pub fn toggle_pause(&mut self) -> bool {
        match self.state {
            GameState::Running => self.pause(),
            GameState::Paused => self.resume(),
            _ => false,
        }
    }

    pub fn return_to_menu(&mut self) -> bool {
        if self.state != GameState::GameOver {
            return false;
        }
        self.reset();
        self.state = GameState::Menu;
        self.events.push(GameEvent::ReturnedToMenu);
        true
    }

    fn reset(&mut self) {
        self.board = Board::new(self.config.columns(), self.config.rows());
        self.active_piece = None;
        self.next_piece = None;
        self.rank = self.config.starting_rank();
        self.score = 0;
    }

    // ------------------------------------------------------------------------
    // Ticking
    // ------------------------------------------------------------------------

    /// Advances the simulation once a full tick interval has passed since the
    /// previous step. Returns whether a tick ran.
    pub fn step(&mut self, now_ms: u64) -> bool {
        if self.state != GameState::Running || !self.clock.is_due(now_ms) {
            return false;
        }
        self.tick();
        true
    }

    /// Spawn if there is no active piece, otherwise fall one row, otherwise lock.
    pub fn tick(&mut self) {
        if self.state != GameState::Running {
            return;
        }

        let Some(piece) = self.active_piece.as_ref() else {
            self.spawn_piece();
            return;
        };

        let moved = piece.translated(0, 1);
        if self.board.fits(&moved) {
            self.active_piece = Some(moved);
            self.events.push(GameEvent::PieceMoved { dx: 0, dy: 1 });
            return;
        }

        self.lock_piece();
    }

    fn spawn_piece(&mut self) {
        let piece = match self.next_piece.take() {
            Some(piece) => Some(piece),
            None => self.create_piece(),
        };
        self.next_piece = self.create_piece();

        let Some(piece) = piece else {
            self.game_over();
            return;
        };

        let fits = self.board.fits(&piece);
        debug!(
            "spawned rank {} piece of size {} at ({}, {})",
            piece.rank(),
            piece.size(),
            piece.x(),
            piece.y()
        );
        self.active_piece = Some(piece);
        self.events.push(GameEvent::PieceSpawned);

        if !fits {
            self.game_over();
        }
    }

    // Positions new pieces at the top, horizontally centered.
    fn create_piece(&mut self) -> Option<Piece> {
        let pixels = match self.piece_provider.next_pixels(self.rank) {
            Ok(pixels) => pixels,
            Err(err) => {
                error!("piece provider failed at rank {}: {}", self.rank, err);
                return None;
            }
        };

        let x = (self.config.columns() as i32 - pixels.size() as i32).div_euclid(2);
        match Piece::new(x, 0, pixels, self.rank) {
            Ok(piece) => Some(piece),
            Err(err) => {
                error!("piece provider returned an invalid rank {} shape: {}", self.rank, err);
                None
            }
        }
    }

    fn lock_piece(&mut self) {
        let Some(piece) = self.active_piece.take() else {
            return;
        };
        self.board.lock(&piece);
        self.events.push(GameEvent::PieceLocked);
        debug!("locked rank {} piece at ({}, {})", piece.rank(), piece.x(), piece.y());

        let cleared = self.board.clear_filled_rows();
        if cleared.is_empty() {
            return;
        }

        self.score += cleared.len() as u32;
        debug!("cleared rows {:?}", cleared);
        self.events.push(GameEvent::RowsCleared { rows: cleared });
        self.events.push(GameEvent::ScoreChanged(self.score));
        self.increase_rank();
    }

    // The cached next piece has the old rank, so it is regenerated on spawn.
    fn increase_rank(&mut self) {
        self.rank += 1;
        self.next_piece = None;
        debug!("rank increased to {}", self.rank);
        self.events.push(GameEvent::RankChanged(self.rank));
    }

    fn game_over(&mut self) {
        self.state = GameState::GameOver;
        info!("game over with score {} at rank {}", self.score, self.rank);
        self.events.push(GameEvent::GameOver);
    }

    // ------------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------------

    fn can_control_piece(&self) -> bool {
        self.state == GameState::Running && self.active_piece.is_some()
    }

    // Commits `candidate` only when it fits on the board.
    fn try_update_piece(&mut self, candidate: Piece) -> bool {
        if !self.board.fits(&candidate) {
            return false;
        }
        self.active_piece = Some(candidate);
        true
    }

    pub fn move_piece(&mut self, dx: i32, dy: i32) -> bool {
        if !self.can_control_piece() {
            return false;
        }
        let Some(moved) = self.active_piece.as_ref().map(|p| p.translated(dx, dy)) else {
            return false;
        };
        let committed = self.try_update_piece(moved);
        if committed {
            self.events.push(GameEvent::PieceMoved { dx, dy });
        }
        committed
    }

    pub fn move_left(&mut self) -> bool {
        self.move_piece(-1, 0)
    }

    pub fn move_right(&mut self) -> bool {
        self.move_piece(1, 0)
    }

    pub fn soft_drop(&mut self) -> bool {
        self.move_piece(0, 1)
    }

    /// Moves the piece straight down as far as it fits, in one move. The
    /// piece locks on the following tick.
    pub fn hard_drop(&mut self) -> bool {
        if !self.can_control_piece() {
            return false;
        }
        match self.drop_distance() {
            Some(distance) if distance > 0 => self.move_piece(0, distance),
            _ => false,
        }
    }

    /// Clockwise rotation in place. No wall kicks: a blocked rotation fails.
    pub fn rotate(&mut self) -> bool {
        if !self.can_control_piece() {
            return false;
        }
        let Some(rotated) = self.active_piece.as_ref().map(Piece::rotated_cw) else {
            return false;
        };
        let committed = self.try_update_piece(rotated);
        if committed {
            self.events.push(GameEvent::PieceRotated);
        }
        committed
    }

    /// Board with the active piece painted in, for renderers that redraw
    /// from scratch.
    pub fn render_grid(&self) -> Vec<Vec<Cell>> {
        let mut grid = self.board.grid().to_vec();
        if let Some(piece) = &self.active_piece {
            for (x, y) in piece.cells() {
                if (0..self.board.columns() as i32).contains(&x)
                    && (0..self.board.rows() as i32).contains(&y)
                {
                    grid[y as usize][x as usize] = piece.rank();
                }
            }
        }
        grid
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new(GameConfig::default())
    }
}

// ============================================================================
// Test Helpers
// ============================================================================

pub mod test_helpers {
    use crate::board::Board;
    use crate::piece::{Cell, Piece, Pixels};

    pub fn empty_board(columns: usize, rows: usize) -> Board {
        Board::new(columns, rows)
    }

    pub fn fill_row(board: &mut Board, y: usize, value: Cell) {
        for x in 0..board.columns() {
            board.set(x, y, value);
        }
    }

    pub fn fill_row_with_gap(board: &mut Board, y: usize, gap_x: usize, value: Cell) {
        for x in 0..board.columns() {
            if x != gap_x {
                board.set(x, y, value);
            }
        }
    }

    /// Builds pixels from rows like `"#."`, painting `#` with `rank`.
    pub fn pixels(rank: Cell, rows: &[&str]) -> Pixels {
        let rows = rows
            .iter()
            .map(|row| row.chars().map(|c| if c == '#' { rank } else { 0 }).collect())
            .collect();
        Pixels::from_rows(rows).expect("test shape must be square")
    }

    pub fn piece_at(x: i32, y: i32, rank: Cell, rows: &[&str]) -> Piece {
        Piece::new(x, y, pixels(rank, rows), rank).expect("test shape must be a valid piece")
    }
}
