use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame, Terminal,
};
use std::{
    fs::File,
    io::stdout,
    path::PathBuf,
    time::{Duration, Instant},
};

use ntris::config::{DEFAULT_COLUMNS, DEFAULT_ROWS, DEFAULT_STARTING_RANK, DEFAULT_TICK_INTERVAL_MS};
use ntris::{Cell, Game, GameConfig, GameState, Pixels};

// ============================================================================
// Command Line
// ============================================================================

// Anything larger cannot be laid out in a terminal anyway.
const MAX_BOARD_SIDE: i64 = 500;

/// Falling-block puzzle where every cleared line makes the pieces bigger.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Board width in cells
    #[arg(long, default_value_t = DEFAULT_COLUMNS as u16, value_parser = clap::value_parser!(u16).range(1..=MAX_BOARD_SIDE))]
    width: u16,

    /// Board height in cells
    #[arg(long, default_value_t = DEFAULT_ROWS as u16, value_parser = clap::value_parser!(u16).range(1..=MAX_BOARD_SIDE))]
    height: u16,

    /// Number of cells in the first pieces
    #[arg(long, default_value_t = DEFAULT_STARTING_RANK)]
    rank: u32,

    /// Milliseconds between gravity steps
    #[arg(long, default_value_t = DEFAULT_TICK_INTERVAL_MS)]
    tick_ms: u64,

    /// Write logs to this file (filtered by RUST_LOG, default `info`)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

// ============================================================================
// Visual Constants
// ============================================================================

const CELL_WIDTH: u16 = 2;
const BLOCK_CHAR: &str = "██";
const EMPTY_CHAR: &str = "  ";
const FRAME_MS: u64 = 16;

const TUTORIAL: [(&str, u64); 5] = [
    ("Move with ←/→ or A/D", 2000),
    ("Rotate with ↑ or W, nudge down with ↓ or S", 3000),
    ("Space drops the piece straight down", 4000),
    ("Every clear makes the next pieces one cell bigger", 5000),
    ("Good luck!", 3000),
];

const TITLES: [&str; 19] = [
    "Monotris",
    "Ditris",
    "Tritris",
    "Tetris",
    "Pentris",
    "Hextris",
    "Heptris",
    "Octris",
    "Enneatris",
    "Dectris",
    "Undectris",
    "Dodectris",
    "Tridectris",
    "Tetradectris",
    "Pentadectris",
    "Hexadectris",
    "Heptadectris",
    "Octadectris",
    "Enneadectris",
];

fn title(rank: u32) -> String {
    match rank.checked_sub(1).and_then(|i| TITLES.get(i as usize)) {
        Some(title) => title.to_string(),
        None => format!("{}-tris", rank),
    }
}

// ============================================================================
// Color Mapping
// ============================================================================

fn rank_color(rank: Cell) -> Color {
    match rank {
        1 => Color::Rgb(0xD9, 0xD6, 0xCF),
        2 => Color::Rgb(0xFF, 0xCB, 0xA4),
        3 => Color::Rgb(0xFF, 0x99, 0x80),
        4 => Color::Rgb(0xD9, 0x21, 0x21),
        5 => Color::Rgb(0xFF, 0x68, 0x1F),
        6 => Color::Rgb(0xFF, 0xD1, 0x2A),
        7 => Color::Rgb(0x5E, 0x8C, 0x31),
        8 => Color::Rgb(0x22, 0x43, 0xB6),
        9 => Color::Rgb(0x70, 0x70, 0xCC),
        10 => Color::Rgb(0x73, 0x33, 0x80),
        _ => Color::Rgb(0xC3, 0x99, 0x53),
    }
}

// ============================================================================
// Tutorial
// ============================================================================

struct Tutorial {
    started: Instant,
    has_played: bool,
}

impl Tutorial {
    fn new() -> Self {
        Self {
            started: Instant::now(),
            has_played: false,
        }
    }

    fn play(&mut self) {
        self.started = Instant::now();
    }

    // Messages revealed so far, or None once every message has been held.
    fn visible(&self) -> Option<usize> {
        let elapsed = self.started.elapsed().as_millis() as u64;
        let mut shown_until = 0;
        for (i, (_, hold_ms)) in TUTORIAL.iter().enumerate() {
            if elapsed < shown_until {
                return Some(i);
            }
            shown_until += hold_ms;
        }
        (elapsed < shown_until).then_some(TUTORIAL.len())
    }
}

// ============================================================================
// Rendering
// ============================================================================

fn render(frame: &mut Frame, game: &Game, tutorial: &Tutorial) {
    let area = frame.size();

    match game.state() {
        GameState::Menu => render_menu(frame, game, area),
        GameState::Tutorial => render_tutorial(frame, tutorial, area),
        GameState::Running => render_game(frame, game, area),
        GameState::Paused => render_paused(frame, game, area),
        GameState::GameOver => render_game_over(frame, game, area),
    }
}

fn render_game(frame: &mut Frame, game: &Game, area: Rect) {
    let columns = u16::try_from(game.config().columns()).unwrap_or(u16::MAX);
    let rows = u16::try_from(game.config().rows()).unwrap_or(u16::MAX);
    let grid_display_width = columns.saturating_mul(CELL_WIDTH).saturating_add(2);
    let grid_display_height = rows.saturating_add(2);
    let side_width = 18;
    let total_width = grid_display_width.saturating_add(side_width + 2);
    let total_height = grid_display_height.saturating_add(3);

    let main_area = centered_rect(total_width, total_height, area);

    let vertical = Layout::vertical([
        Constraint::Length(grid_display_height),
        Constraint::Fill(1),
    ])
    .split(main_area);

    let game_row = vertical[0];

    // Layout: [Grid][Next + Info]
    let horizontal = Layout::horizontal([
        Constraint::Length(grid_display_width),
        Constraint::Length(side_width),
    ])
    .split(game_row);

    let side = Layout::vertical([Constraint::Fill(1), Constraint::Length(9)]).split(horizontal[1]);

    render_grid(frame, game, horizontal[0]);
    render_preview(frame, game, side[0]);
    render_info(frame, game, side[1]);

    let controls_area = Rect {
        x: area.x,
        y: game_row.y + game_row.height,
        width: area.width,
        height: 2,
    };

    if controls_area.y + 1 < area.height {
        let controls = Paragraph::new(vec![Line::from(
            "←→/AD: Move | ↑/W: Rotate | ↓/S: Down | Space: Drop | P: Pause | Q/ESC: Quit",
        )])
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(controls, controls_area);
    }
}

fn render_grid(frame: &mut Frame, game: &Game, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} ", title(game.rank())))
        .title_alignment(Alignment::Center);

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let lines: Vec<Line> = game
        .render_grid()
        .iter()
        .map(|row| Line::from(row.iter().map(|cell| cell_span(*cell)).collect::<Vec<_>>()))
        .collect();

    frame.render_widget(Paragraph::new(lines), inner);
}

fn cell_span(cell: Cell) -> Span<'static> {
    if cell == 0 {
        Span::raw(EMPTY_CHAR)
    } else {
        Span::styled(BLOCK_CHAR, Style::default().fg(rank_color(cell)))
    }
}

fn pixel_lines(pixels: &Pixels) -> Vec<Line<'static>> {
    pixels
        .rows()
        .map(|row| {
            let mut spans = vec![Span::raw(" ")];
            spans.extend(row.iter().map(|cell| cell_span(*cell)));
            Line::from(spans)
        })
        .collect()
}

fn render_preview(frame: &mut Frame, game: &Game, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Next ")
        .title_alignment(Alignment::Center);

    let inner = block.inner(area);
    frame.render_widget(block, area);

    // The next piece is dropped whenever the rank goes up.
    let lines = match game.next_piece() {
        Some(piece) => pixel_lines(piece.pixels()),
        None => vec![Line::from(" ?")],
    };

    frame.render_widget(Paragraph::new(lines), inner);
}

fn render_info(frame: &mut Frame, game: &Game, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Info ")
        .title_alignment(Alignment::Center);

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled("Score", Style::default().fg(Color::Yellow))),
        Line::from(format!("{}", game.score())),
        Line::from(""),
        Line::from(Span::styled("Rank", Style::default().fg(Color::Green))),
        Line::from(format!("{}", game.rank())),
    ];

    let paragraph = Paragraph::new(lines).alignment(Alignment::Center);
    frame.render_widget(paragraph, inner);
}

fn render_popup(frame: &mut Frame, area: Rect, title: &str, text: Vec<Line>, width: u16, height: u16) {
    let paragraph = Paragraph::new(text).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!(" {} ", title))
            .title_alignment(Alignment::Center)
            .style(Style::default().bg(Color::Black)),
    );

    frame.render_widget(paragraph, centered_rect(width, height, area));
}

fn render_menu(frame: &mut Frame, game: &Game, area: Rect) {
    let text = vec![
        Line::from(""),
        Line::from(Span::styled("N+1TRIS", Style::default().fg(Color::Yellow))),
        Line::from(""),
        Line::from(format!("Starting as {}", title(game.config().starting_rank()))),
        Line::from(""),
        Line::from(Span::styled(
            "Press Space to start",
            Style::default().fg(Color::DarkGray),
        )),
        Line::from(Span::styled(
            "Press ESC to quit",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    render_popup(frame, area, "Menu", text, 32, 10);
}

fn render_tutorial(frame: &mut Frame, tutorial: &Tutorial, area: Rect) {
    let shown = tutorial.visible().unwrap_or(TUTORIAL.len());
    let mut text = vec![Line::from("")];
    for (message, _) in TUTORIAL.iter().take(shown) {
        text.push(Line::from(*message));
    }
    text.push(Line::from(""));
    text.push(Line::from(Span::styled(
        "Press Enter to skip",
        Style::default().fg(Color::DarkGray),
    )));

    render_popup(frame, area, "How to play", text, 56, TUTORIAL.len() as u16 + 5);
}

fn render_game_over(frame: &mut Frame, game: &Game, area: Rect) {
    render_game(frame, game, area);

    let text = vec![
        Line::from(""),
        Line::from(Span::styled("GAME OVER", Style::default().fg(Color::Red))),
        Line::from(""),
        Line::from(format!("Score: {}", game.score())),
        Line::from(format!("Reached: {}", title(game.rank()))),
        Line::from(""),
        Line::from(Span::styled(
            "Press Space for menu",
            Style::default().fg(Color::DarkGray),
        )),
        Line::from(Span::styled(
            "Press ESC to quit",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    render_popup(frame, area, "Game Over", text, 28, 12);
}

fn render_paused(frame: &mut Frame, game: &Game, area: Rect) {
    render_game(frame, game, area);

    let text = vec![
        Line::from(""),
        Line::from(Span::styled("PAUSED", Style::default().fg(Color::Yellow))),
        Line::from(""),
        Line::from(Span::styled(
            "Press P to continue",
            Style::default().fg(Color::DarkGray),
        )),
        Line::from(Span::styled(
            "Press ESC to quit",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    render_popup(frame, area, "Paused", text, 24, 10);
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let horizontal = Layout::horizontal([
        Constraint::Fill(1),
        Constraint::Length(width.min(area.width)),
        Constraint::Fill(1),
    ])
    .split(area);

    let vertical = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(height.min(area.height)),
        Constraint::Fill(1),
    ])
    .split(horizontal[1]);

    vertical[1]
}

// ============================================================================
// Input
// ============================================================================

/// Returns false when the player asked to quit.
fn handle_key(code: KeyCode, game: &mut Game, tutorial: &mut Tutorial) -> bool {
    match code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => return false,
        KeyCode::Char('p') | KeyCode::Char('P') => {
            game.toggle_pause();
        }
        _ => match game.state() {
            GameState::Running => match code {
                KeyCode::Left | KeyCode::Char('a') | KeyCode::Char('A') => {
                    game.move_left();
                }
                KeyCode::Right | KeyCode::Char('d') | KeyCode::Char('D') => {
                    game.move_right();
                }
                KeyCode::Down | KeyCode::Char('s') | KeyCode::Char('S') => {
                    game.soft_drop();
                }
                KeyCode::Up | KeyCode::Char('w') | KeyCode::Char('W') => {
                    game.rotate();
                }
                KeyCode::Char(' ') => {
                    game.hard_drop();
                }
                _ => {}
            },
            GameState::Menu if code == KeyCode::Char(' ') => {
                if tutorial.has_played {
                    game.start();
                } else {
                    tutorial.play();
                    game.begin_tutorial();
                }
            }
            GameState::Tutorial if code == KeyCode::Enter => {
                tutorial.has_played = true;
                game.finish_tutorial();
            }
            GameState::GameOver if code == KeyCode::Char(' ') => {
                game.return_to_menu();
            }
            _ => {}
        },
    }
    true
}

// ============================================================================
// Main Loop
// ============================================================================

fn init_logging(path: Option<&PathBuf>) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let file = File::create(path)
        .with_context(|| format!("failed to create log file {}", path.display()))?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

fn run(terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>, mut game: Game) -> Result<()> {
    let epoch = Instant::now();
    let mut tutorial = Tutorial::new();

    loop {
        terminal.draw(|frame| render(frame, &game, &tutorial))?;

        if event::poll(Duration::from_millis(FRAME_MS))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && !handle_key(key.code, &mut game, &mut tutorial) {
                    break;
                }
            }
        }

        if game.state() == GameState::Tutorial && tutorial.visible().is_none() {
            tutorial.has_played = true;
            game.finish_tutorial();
        }

        game.step(epoch.elapsed().as_millis() as u64);
        // Everything is redrawn each frame, so the notifications are only drained.
        game.take_events();
    }

    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_file.as_ref())?;

    let config = GameConfig::new(usize::from(args.width), usize::from(args.height), args.rank)
        .and_then(|config| config.with_tick_interval_ms(args.tick_ms))
        .context("invalid game configuration")?;
    let game = Game::new(config);

    enable_raw_mode().context("failed to enable raw mode")?;
    stdout().execute(EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout());
    let mut terminal = Terminal::new(backend)?;

    let result = run(&mut terminal, game);

    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn board_side_is_capped() {
        assert!(Args::try_parse_from(["ntris", "--width", "500", "--height", "500"]).is_ok());
        assert!(Args::try_parse_from(["ntris", "--width", "501"]).is_err());
        assert!(Args::try_parse_from(["ntris", "--height", "70000"]).is_err());
        assert!(Args::try_parse_from(["ntris", "--width", "0"]).is_err());
    }

    #[test]
    fn defaults_fit_the_config() {
        let args = Args::try_parse_from(["ntris"]).unwrap();
        assert_eq!(usize::from(args.width), DEFAULT_COLUMNS);
        assert_eq!(usize::from(args.height), DEFAULT_ROWS);
    }
}
