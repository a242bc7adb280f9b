//! Compile-time tuning for the engine: geometry, task cadence and input
//! thresholds.

use embassy_time::Duration;

// ── Board geometry ──────────────────────────────────────────────────────────
pub const BOARD_WIDTH: usize = 10;
pub const BOARD_HEIGHT: usize = 20;
/// Edge length of a piece's occupancy matrix.
pub const PIECE_SIZE: usize = 4;

// ── Screen geometry (landscape ST7789) ──────────────────────────────────────
pub const SCREEN_W: i32 = 320;
pub const SCREEN_H: i32 = 170;

pub const CELL: i32 = SCREEN_H / BOARD_HEIGHT as i32; // 8 px
pub const BOARD_PX_W: i32 = BOARD_WIDTH as i32 * CELL;
pub const BOARD_PX_H: i32 = BOARD_HEIGHT as i32 * CELL;
pub const BOARD_LEFT: i32 = (SCREEN_W - BOARD_PX_W) / 2; // centered

// ── Task cadence ────────────────────────────────────────────────────────────
/// Gravity period with the stick centred.
pub const DROP_PERIOD: Duration = Duration::from_millis(250);
/// Gravity period while the stick is pulled down.
pub const FAST_DROP_PERIOD: Duration = Duration::from_millis(50);
/// Period of the analog stick sampler.
pub const STICK_PERIOD: Duration = Duration::from_millis(50);
/// Pause between two stick samples applied by the stick consumer.
pub const STICK_DELAY: Duration = Duration::from_millis(50);
/// Period of the render task.
pub const DISPLAY_PERIOD: Duration = Duration::from_millis(100);
/// Settling time between a button edge and sampling the panel.
pub const DEBOUNCE: Duration = Duration::from_millis(15);
/// Coarse sleep for loops whose game is over.
pub const GAME_OVER_BACKOFF: Duration = Duration::from_millis(1000);

// ── Analog stick ────────────────────────────────────────────────────────────
pub const AXIS_CENTER: u16 = 2048;
pub const AXIS_MAX: u16 = 4095;
pub const DEADZONE: u16 = 512;

// ── Queues ──────────────────────────────────────────────────────────────────
pub const STICK_QUEUE_DEPTH: usize = 4;
pub const BUTTON_QUEUE_DEPTH: usize = 4;
pub const PREVIEW_QUEUE_DEPTH: usize = 2;
