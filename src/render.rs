//! Render pipeline: scenes onto any RGB565 draw target, and the next-piece
//! preview onto a 4×4 indicator matrix.

use core::fmt::Write as _;

use embedded_graphics::{
    mono_font::{
        MonoTextStyle,
        iso_8859_1::{
            FONT_6X10,
            FONT_10X20,
        },
    },
    pixelcolor::Rgb565,
    prelude::*,
    primitives::{
        PrimitiveStyle,
        Rectangle,
    },
    text::{
        Alignment,
        Text,
    },
};

use crate::{
    board::Cell,
    config::{
        BOARD_HEIGHT,
        BOARD_LEFT,
        BOARD_PX_H,
        BOARD_PX_W,
        BOARD_WIDTH,
        CELL,
        PIECE_SIZE,
        SCREEN_H,
        SCREEN_W,
    },
    game::Scene,
    piece::PieceKind,
};

const BLACK: Rgb565 = Rgb565::BLACK;
const BORDER_COLOR: Rgb565 = Rgb565::new(8, 16, 8);
const PAUSE_BG: Rgb565 = Rgb565::new(2, 4, 6);
const BORDER_W: i32 = 2;
const TICK_LEN: i32 = 4;
/// Rows between two tick marks on the side borders.
const TICK_EVERY: usize = 4;

fn fill<D>(target: &mut D, x: i32, y: i32, w: i32, h: i32, color: Rgb565) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    Rectangle::new(Point::new(x, y), Size::new(w as u32, h as u32))
        .into_styled(PrimitiveStyle::with_fill(color))
        .draw(target)
}

fn label<D>(target: &mut D, text: &str, y: i32, style: MonoTextStyle<'_, Rgb565>) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    Text::with_alignment(text, Point::new(SCREEN_W / 2, y), style, Alignment::Center)
        .draw(target)
        .map(|_| ())
}

pub fn cell_color(cell: Cell) -> Rgb565 {
    cell.map_or(BLACK, PieceKind::color)
}

/// Top-left pixel of board cell `(col, row)`. Row 0 is drawn lowest.
pub const fn cell_origin(col: usize, row: usize) -> Point {
    Point::new(
        BOARD_LEFT + col as i32 * CELL,
        (BOARD_HEIGHT as i32 - 1 - row as i32) * CELL,
    )
}

pub fn draw_cell<D>(target: &mut D, col: usize, row: usize, cell: Cell) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    let origin = cell_origin(col, row);
    fill(target, origin.x, origin.y, CELL - 1, CELL - 1, cell_color(cell))
}

/// One fill per cell, every tick.
pub fn draw_board<D>(target: &mut D, grid: &[[Cell; BOARD_WIDTH]; BOARD_HEIGHT]) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    for (row, cells) in grid.iter().enumerate() {
        for (col, &cell) in cells.iter().enumerate() {
            draw_cell(target, col, row, cell)?;
        }
    }
    Ok(())
}

/// Blanks the panel and draws the side borders with a tick mark every
/// [`TICK_EVERY`] rows.
pub fn draw_chrome<D>(target: &mut D) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    fill(target, 0, 0, SCREEN_W, SCREEN_H, BLACK)?;

    let left = BOARD_LEFT - BORDER_W;
    let right = BOARD_LEFT + BOARD_PX_W;
    fill(target, left, 0, BORDER_W, BOARD_PX_H, BORDER_COLOR)?;
    fill(target, right, 0, BORDER_W, BOARD_PX_H, BORDER_COLOR)?;

    for row in (0..=BOARD_HEIGHT).step_by(TICK_EVERY) {
        let y = (BOARD_PX_H - row as i32 * CELL).min(BOARD_PX_H - 1);
        fill(target, left - TICK_LEN, y, TICK_LEN, 1, BORDER_COLOR)?;
        fill(target, right + BORDER_W, y, TICK_LEN, 1, BORDER_COLOR)?;
    }
    Ok(())
}

pub fn draw_start_page<D>(target: &mut D) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    fill(target, 0, 0, SCREEN_W, SCREEN_H, BLACK)?;
    label(target, "TETRABADGE", SCREEN_H / 2 - 20, MonoTextStyle::new(&FONT_10X20, Rgb565::CYAN))?;

    // row of the seven kinds under the title
    let x0 = SCREEN_W / 2 - 7 * CELL;
    for (i, kind) in PieceKind::ALL.into_iter().enumerate() {
        fill(target, x0 + i as i32 * 2 * CELL, SCREEN_H / 2, CELL, CELL, kind.color())?;
    }

    label(target, "PRESS START", SCREEN_H / 2 + 30, MonoTextStyle::new(&FONT_6X10, Rgb565::WHITE))
}

pub fn draw_pause_page<D>(target: &mut D) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    fill(target, 0, 0, SCREEN_W, SCREEN_H, PAUSE_BG)?;
    label(target, "PAUSED", SCREEN_H / 2, MonoTextStyle::new(&FONT_10X20, Rgb565::YELLOW))
}

pub fn draw_game_over_page<D>(target: &mut D, score: u32) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    fill(target, 0, 0, SCREEN_W, SCREEN_H, Rgb565::RED)?;

    let big = MonoTextStyle::new(&FONT_10X20, Rgb565::WHITE);
    let small = MonoTextStyle::new(&FONT_6X10, Rgb565::WHITE);
    label(target, "GAME OVER", SCREEN_H / 2 - 24, big)?;
    label(target, "SCORE", SCREEN_H / 2 + 4, small)?;

    let mut digits = heapless::String::<10>::new();
    // u32::MAX has ten digits
    let _ = write!(digits, "{score}");
    label(target, &digits, SCREEN_H / 2 + 26, big)
}

/// Draws one scene. `Scene::Hold` draws nothing.
pub fn draw_scene<D>(target: &mut D, scene: &Scene) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    match scene {
        Scene::Hold => Ok(()),
        Scene::StartPage => draw_start_page(target),
        Scene::PausePage => draw_pause_page(target),
        Scene::GameOverPage { score } => draw_game_over_page(target, *score),
        Scene::Board { grid, chrome } => {
            if *chrome {
                draw_chrome(target)?;
            }
            draw_board(target, grid)
        }
    }
}

// ── Preview matrix ──────────────────────────────────────────────────────────

/// 4×4 on/off indicator matrix showing the next piece.
#[allow(async_fn_in_trait)]
pub trait PreviewMatrix {
    /// Colour for the lit cells of the next flush. Monochrome matrices
    /// ignore it.
    fn set_color(&mut self, _color: Rgb565) {}

    fn set_cell(&mut self, row: usize, col: usize, on: bool);

    /// Pushes the staged cells to the hardware.
    async fn flush(&mut self);
}

/// Stages the canonical shape of `kind` cell by cell, then flushes once.
pub async fn show_preview<M: PreviewMatrix>(matrix: &mut M, kind: PieceKind) {
    let shape = kind.shape();
    matrix.set_color(kind.color());
    for row in 0..PIECE_SIZE {
        for col in 0..PIECE_SIZE {
            matrix.set_cell(row, col, shape.is_set(row, col));
        }
    }
    matrix.flush().await;
}
