//! Task bodies. Each `run_*` function loops forever and is wrapped by an
//! `#[embassy_executor::task]` in the firmware; the single-step functions
//! next to them are what the loops repeat.
//!
//! No step holds the state lock across a sleep or a queue wait.

use embassy_futures::select::select;
use embassy_time::{
    Duration,
    Instant,
    Ticker,
    Timer,
};
use embedded_graphics::{
    pixelcolor::Rgb565,
    prelude::DrawTarget,
};

use crate::{
    config::{
        DEBOUNCE,
        DISPLAY_PERIOD,
        DROP_PERIOD,
        FAST_DROP_PERIOD,
        GAME_OVER_BACKOFF,
        STICK_DELAY,
        STICK_PERIOD,
    },
    engine::Engine,
    input::{
        self,
        AxisSampler,
        ButtonPanel,
    },
    piece::PieceProducer,
    render::{
        self,
        PreviewMatrix,
    },
};

/// Seed for a new session, taken from the tick counter at the press.
fn session_seed() -> u32 {
    Instant::now().as_ticks() as u32
}

// ── Stick ───────────────────────────────────────────────────────────────────

/// Periodic producer: one sample into the stick queue every
/// [`STICK_PERIOD`].
pub async fn run_stick_sampler<P, S: AxisSampler>(engine: &Engine<P>, sampler: &mut S) -> ! {
    let mut ticker = Ticker::every(STICK_PERIOD);
    loop {
        engine.push_stick(sampler.sample());
        ticker.next().await;
    }
}

/// Applies one stick sample and returns how long the consumer rests before
/// reading the next one. Outside play the sample is dropped.
pub async fn stick_step<P: PieceProducer>(engine: &Engine<P>, sample: u32) -> Duration {
    let (outcome, rest) = {
        let mut game = engine.lock().await;
        if game.is_playing() {
            let (outcome, fast_drop) = input::apply_stick(&mut *game, sample);
            engine.set_fast_drop(fast_drop);
            (outcome, STICK_DELAY)
        } else if game.is_over() {
            (Default::default(), GAME_OVER_BACKOFF)
        } else {
            engine.set_fast_drop(false);
            (Default::default(), Duration::from_ticks(0))
        }
    };
    engine.publish(outcome);
    rest
}

pub async fn run_stick<P: PieceProducer>(engine: &Engine<P>) -> ! {
    loop {
        let sample = engine.next_stick().await;
        let rest = stick_step(engine, sample).await;
        if rest.as_ticks() > 0 {
            Timer::after(rest).await;
        }
    }
}

// ── Buttons ─────────────────────────────────────────────────────────────────

/// One pass of the edge path: wait for the gate, wait for an edge, close
/// the gate, debounce, sample and queue the mask.
pub async fn button_edge_step<P, B: ButtonPanel>(engine: &Engine<P>, panel: &mut B) {
    engine.wait_armed().await;
    panel.wait_for_edge().await;
    engine.disarm_buttons();
    Timer::after(DEBOUNCE).await;

    let mask = panel.sample();
    if mask == 0 {
        // release edge, nothing for the consumer
        engine.arm_buttons();
    } else {
        engine.push_buttons(mask);
    }
}

pub async fn run_button_edges<P, B: ButtonPanel>(engine: &Engine<P>, panel: &mut B) -> ! {
    loop {
        button_edge_step(engine, panel).await;
    }
}

/// Applies one mask, then re-arms the edge gate.
pub async fn buttons_step<P: PieceProducer>(engine: &Engine<P>, mask: u8) {
    let outcome = {
        let mut game = engine.lock().await;
        input::apply_buttons(&mut *game, mask, session_seed())
    };
    engine.publish(outcome);
    engine.arm_buttons();
}

pub async fn run_buttons<P: PieceProducer>(engine: &Engine<P>) -> ! {
    loop {
        let mask = engine.next_buttons().await;
        buttons_step(engine, mask).await;
    }
}

// ── Gravity ─────────────────────────────────────────────────────────────────

/// One gravity tick. Returns the sleep before the next tick: the drop period
/// (shorter while fast drop is held), or a coarse back-off once the game is
/// over.
pub async fn gravity_step<P: PieceProducer>(engine: &Engine<P>) -> Duration {
    let (outcome, period) = {
        let mut game = engine.lock().await;
        if game.is_over() {
            return GAME_OVER_BACKOFF;
        }
        if !game.is_playing() {
            return DROP_PERIOD;
        }
        let period = if engine.fast_drop() {
            FAST_DROP_PERIOD
        } else {
            DROP_PERIOD
        };
        (game.move_piece(0, 1), period)
    };
    engine.publish(outcome);
    period
}

pub async fn run_gravity<P: PieceProducer>(engine: &Engine<P>) -> ! {
    loop {
        let period = gravity_step(engine).await;
        Timer::after(period).await;
    }
}

// ── Render ──────────────────────────────────────────────────────────────────

/// Copies the scene out under the lock and draws it after releasing.
/// A failed draw abandons the frame and asks for the page again.
pub async fn render_step<P: PieceProducer, D>(engine: &Engine<P>, display: &mut D)
where
    D: DrawTarget<Color = Rgb565>,
{
    let scene = engine.lock().await.take_scene();
    if render::draw_scene(display, &scene).is_err() {
        error!("display write failed, frame abandoned");
        engine.lock().await.invalidate_scene();
    }
}

/// Draws every [`DISPLAY_PERIOD`], or at once when a redraw is forced.
pub async fn run_display<P: PieceProducer, D>(engine: &Engine<P>, display: &mut D) -> !
where
    D: DrawTarget<Color = Rgb565>,
{
    let mut ticker = Ticker::every(DISPLAY_PERIOD);
    loop {
        render_step(engine, display).await;
        select(ticker.next(), engine.wait_redraw()).await;
    }
}

// ── Preview ─────────────────────────────────────────────────────────────────

pub async fn run_preview<P, M: PreviewMatrix>(engine: &Engine<P>, matrix: &mut M) -> ! {
    loop {
        let kind = engine.next_preview().await;
        render::show_preview(matrix, kind).await;
    }
}
