//! The shared game aggregate and every rule that mutates it.
//!
//! Nothing here does I/O or touches a lock. Each mutating call returns an
//! [`Outcome`] describing side effects (preview, score, game over) that the
//! calling task publishes once it has released the state lock.

use crate::{
    board::{
        Board,
        Cell,
    },
    config::{
        BOARD_HEIGHT,
        BOARD_WIDTH,
        PIECE_SIZE,
    },
    mode::{
        Frame,
        ScreenMode,
    },
    piece::{
        PieceKind,
        PieceProducer,
        RandomProducer,
        Shape,
    },
};

/// Spawn anchor: top-left of the 4×4 box, centred on the board.
pub const SPAWN_X: i32 = BOARD_WIDTH as i32 / 2 - PIECE_SIZE as i32 / 2;
pub const SPAWN_Y: i32 = 0;

/// Points for clearing `lines` rows in a single settle event.
pub const fn points_for(lines: u8) -> u32 {
    match lines {
        1 => 40,
        2 => 100,
        3 => 300,
        4 => 1200,
        _ => 0,
    }
}

/// The falling piece: kind, its own occupancy buffer and the anchor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ActivePiece {
    pub kind: PieceKind,
    pub shape: Shape,
    pub x: i32,
    pub y: i32,
}

impl ActivePiece {
    pub const fn spawn(kind: PieceKind) -> Self {
        Self {
            kind,
            shape: kind.shape(),
            x: SPAWN_X,
            y: SPAWN_Y,
        }
    }

    /// Board coordinates of the occupied cells.
    pub fn cells(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        self.shape
            .cells()
            .map(|(r, c)| (self.x + c as i32, self.y + r as i32))
    }
}

/// Side effects of one locked operation.
#[must_use]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Outcome {
    /// New lookahead kind to show on the preview matrix.
    pub preview: Option<PieceKind>,
    /// Rows removed by a settle event.
    pub lines: u8,
    /// Cumulative score, present only when points were awarded.
    pub scored: Option<u32>,
    /// Set when the session just ended, carrying the final score.
    pub final_score: Option<u32>,
}

impl Outcome {
    /// Folds a later outcome into this one. Later values win.
    pub fn merge(self, later: Outcome) -> Self {
        Self {
            preview: later.preview.or(self.preview),
            lines: self.lines.saturating_add(later.lines),
            scored: later.scored.or(self.scored),
            final_score: later.final_score.or(self.final_score),
        }
    }

    pub fn is_game_over(&self) -> bool {
        self.final_score.is_some()
    }

    pub fn is_quiet(&self) -> bool {
        *self == Self::default()
    }
}

/// What the render task has to draw, copied out under the lock.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scene {
    Hold,
    StartPage,
    PausePage,
    GameOverPage { score: u32 },
    Board {
        grid: [[Cell; BOARD_WIDTH]; BOARD_HEIGHT],
        chrome: bool,
    },
}

/// Board, falling piece, lookahead, mode and score of one session.
pub struct GameState<P = RandomProducer> {
    board: Board,
    active: Option<ActivePiece>,
    next: Option<PieceKind>,
    mode: ScreenMode,
    score: u32,
    producer: P,
}

impl GameState<RandomProducer> {
    pub const fn new() -> Self {
        Self::with_producer(RandomProducer::new(0))
    }
}

impl Default for GameState<RandomProducer> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: PieceProducer> GameState<P> {
    pub const fn with_producer(producer: P) -> Self {
        Self {
            board: Board::new(),
            active: None,
            next: None,
            mode: ScreenMode::NotStarted { drawn: false },
            score: 0,
            producer,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn active(&self) -> Option<&ActivePiece> {
        self.active.as_ref()
    }

    pub fn next_kind(&self) -> Option<PieceKind> {
        self.next
    }

    pub fn mode(&self) -> ScreenMode {
        self.mode
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn is_over(&self) -> bool {
        self.mode.is_over()
    }

    pub fn is_paused(&self) -> bool {
        self.mode.is_paused()
    }

    pub fn is_playing(&self) -> bool {
        self.mode.is_playing()
    }

    /// Reinitialises the aggregate in place and spawns the first piece.
    /// Only leaves `NotStarted`; later presses are ignored.
    pub fn start_session(&mut self, seed: u32) -> Outcome {
        if !self.mode.start() {
            return Outcome::default();
        }
        self.board.clear();
        self.active = None;
        self.next = None;
        self.score = 0;
        self.producer.reseed(seed);
        debug!("session started");
        self.spawn_piece()
    }

    /// Puts the lookahead (or a fresh kind) at the spawn anchor and draws a
    /// new lookahead. A blocked spawn ends the session.
    pub fn spawn_piece(&mut self) -> Outcome {
        let kind = match self.next.take() {
            Some(kind) => kind,
            None => self.producer.generate(),
        };
        let next = self.producer.generate();
        self.next = Some(next);

        let piece = ActivePiece::spawn(kind);
        let mut outcome = Outcome {
            preview: Some(next),
            ..Outcome::default()
        };

        if self.board.can_place(&piece.shape, piece.x, piece.y) {
            self.active = Some(piece);
        } else {
            self.active = None;
            self.mode.finish();
            outcome.final_score = Some(self.score);
        }
        outcome
    }

    /// Legality of the active occupancy matrix at `(x, y)`. False when no
    /// piece is active.
    pub fn can_place(&self, x: i32, y: i32) -> bool {
        self.active
            .is_some_and(|p| self.board.can_place(&p.shape, x, y))
    }

    /// Translates the active piece by `(dx, dy)`.
    ///
    /// A blocked target falls back to the same column one row lower. A
    /// downward request with both targets blocked settles the piece: place,
    /// clear lines, spawn.
    pub fn move_piece(&mut self, dx: i32, dy: i32) -> Outcome {
        if !self.mode.is_playing() {
            return Outcome::default();
        }
        let Some(piece) = self.active.as_mut() else {
            return Outcome::default();
        };

        let (nx, ny) = (piece.x + dx, piece.y + dy);
        let exact = self.board.can_place(&piece.shape, nx, ny);
        let lower = !exact && dy + 1 > 0 && self.board.can_place(&piece.shape, nx, ny + 1);

        if exact {
            (piece.x, piece.y) = (nx, ny);
        } else if lower {
            (piece.x, piece.y) = (nx, ny + 1);
        } else if dy > 0 {
            return self.settle();
        }
        Outcome::default()
    }

    /// Rotates the active occupancy matrix in place; reverts when the
    /// rotated matrix does not fit at the unchanged anchor.
    pub fn rotate_piece(&mut self, clockwise: bool) -> bool {
        if !self.mode.is_playing() {
            return false;
        }
        let Some(piece) = self.active.as_mut() else {
            return false;
        };

        let previous = piece.shape;
        piece.shape = if clockwise {
            previous.rotated_cw()
        } else {
            previous.rotated_ccw()
        };

        if self.board.can_place(&piece.shape, piece.x, piece.y) {
            true
        } else {
            piece.shape = previous;
            false
        }
    }

    /// Copies the active piece onto the board, tagged with its kind.
    pub fn place_on_board(&mut self) {
        if let Some(piece) = self.active.take() {
            self.board.stamp(&piece.shape, piece.x, piece.y, piece.kind);
        }
    }

    /// Removes full rows and awards points for this settle event.
    pub fn clear_lines(&mut self) -> Outcome {
        let lines = self.board.clear_full_rows();
        let points = points_for(lines);
        let mut outcome = Outcome {
            lines,
            ..Outcome::default()
        };
        if points > 0 {
            self.score = self.score.saturating_add(points);
            outcome.scored = Some(self.score);
        }
        outcome
    }

    fn settle(&mut self) -> Outcome {
        self.place_on_board();
        let cleared = self.clear_lines();
        if cleared.lines > 0 {
            trace!("cleared {} lines", cleared.lines);
        }
        cleared.merge(self.spawn_piece())
    }

    pub fn toggle_pause(&mut self) -> bool {
        self.mode.toggle_pause()
    }

    /// Board copy with the active piece composited in.
    pub fn display_grid(&self) -> [[Cell; BOARD_WIDTH]; BOARD_HEIGHT] {
        let mut grid = *self.board.rows();
        if let Some(piece) = &self.active {
            for (x, y) in piece.cells() {
                if let (Ok(x), Ok(y)) = (usize::try_from(x), usize::try_from(y))
                    && let Some(cell) = grid.get_mut(y).and_then(|row| row.get_mut(x))
                {
                    *cell = Some(piece.kind);
                }
            }
        }
        grid
    }

    /// Advances the screen mode by one render tick and copies out what has
    /// to be drawn.
    pub fn take_scene(&mut self) -> Scene {
        match self.mode.next_frame() {
            Frame::Hold => Scene::Hold,
            Frame::StartPage => Scene::StartPage,
            Frame::PausePage => Scene::PausePage,
            Frame::GameOverPage => Scene::GameOverPage { score: self.score },
            Frame::Board { chrome } => Scene::Board {
                grid: self.display_grid(),
                chrome,
            },
        }
    }

    /// Asks for the current page again after an abandoned frame.
    pub fn invalidate_scene(&mut self) {
        self.mode.invalidate();
    }

    /// Direct board access for setting up positions.
    pub fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }

    /// Replaces the falling piece, bypassing the spawn rules.
    pub fn set_active(&mut self, piece: Option<ActivePiece>) {
        self.active = piece;
    }
}
