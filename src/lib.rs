//! # tetrabadge
//!
//! A falling-block game engine for the Disobey 2026 badge.
//!
//! The engine is a set of cooperating embassy tasks around one locked game
//! aggregate:
//! - **Model**: board, pieces, collision, line clears and scoring ([`game`])
//! - **Screen modes**: start, playing, paused, game over ([`mode`])
//! - **Input**: stick and button samplers feeding two queues ([`input`])
//! - **Render**: periodic board drawing plus full-screen pages ([`render`])
//! - **Glue**: the shared [`Engine`] context and the task bodies ([`tasks`])
//!
//! Everything above is hardware independent and runs on the host. The
//! `badge` feature adds the ESP32-S3 binding in [`badge`].
//!
//! ## Quick start
//!
//! ```rust,ignore
//! static ENGINE: tetrabadge::Engine = tetrabadge::Engine::new();
//!
//! let peripherals = tetrabadge::badge::init();
//! let resources = tetrabadge::split_resources!(peripherals);
//! let controls: tetrabadge::badge::Controls = resources.buttons.into();
//! ```

#![cfg_attr(not(test), no_std)]

#[macro_use]
mod fmt;

pub mod board;
pub mod config;
pub mod engine;
pub mod game;
pub mod input;
pub mod mode;
pub mod piece;
pub mod render;
pub mod tasks;

#[cfg(feature = "badge")]
pub mod badge;

pub use board::{
    Board,
    Cell,
};
pub use engine::Engine;
pub use game::{
    ActivePiece,
    GameState,
    Outcome,
    Scene,
};
pub use mode::ScreenMode;
pub use piece::{
    PieceKind,
    PieceProducer,
    Shape,
};
pub use render::PreviewMatrix;

/// StaticCell helper: allocates a value into a `static` exactly once.
#[cfg(feature = "badge")]
#[macro_export]
macro_rules! mk_static {
    ($t:ty, $val:expr) => {{
        static STATIC_CELL: static_cell::StaticCell<$t> = static_cell::StaticCell::new();
        #[deny(unused_attributes)]
        let x = STATIC_CELL.uninit().write($val);
        x
    }};
}
