//! The single owned context shared by every task: the locked game state,
//! the queues between producers and consumers, and the wake-up signals.

use core::sync::atomic::{
    AtomicBool,
    Ordering,
};

use embassy_sync::{
    blocking_mutex::raw::CriticalSectionRawMutex,
    channel::Channel,
    mutex::{
        Mutex,
        MutexGuard,
    },
    signal::Signal,
};

use crate::{
    config::{
        BUTTON_QUEUE_DEPTH,
        PREVIEW_QUEUE_DEPTH,
        STICK_QUEUE_DEPTH,
    },
    game::{
        GameState,
        Outcome,
    },
    piece::{
        PieceKind,
        RandomProducer,
    },
};

type RawMutex = CriticalSectionRawMutex;

pub struct Engine<P = RandomProducer> {
    state: Mutex<RawMutex, GameState<P>>,
    fast_drop: AtomicBool,
    redraw: Signal<RawMutex, ()>,
    buttons_armed: AtomicBool,
    rearm: Signal<RawMutex, ()>,
    sticks: Channel<RawMutex, u32, STICK_QUEUE_DEPTH>,
    buttons: Channel<RawMutex, u8, BUTTON_QUEUE_DEPTH>,
    previews: Channel<RawMutex, PieceKind, PREVIEW_QUEUE_DEPTH>,
}

impl Engine<RandomProducer> {
    pub const fn new() -> Self {
        Self::with_state(GameState::new())
    }
}

impl Default for Engine<RandomProducer> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> Engine<P> {
    pub const fn with_state(state: GameState<P>) -> Self {
        Self {
            state: Mutex::new(state),
            fast_drop: AtomicBool::new(false),
            redraw: Signal::new(),
            buttons_armed: AtomicBool::new(true),
            rearm: Signal::new(),
            sticks: Channel::new(),
            buttons: Channel::new(),
            previews: Channel::new(),
        }
    }

    /// Takes the state lock. Callers drop the guard before sleeping.
    pub async fn lock(&self) -> MutexGuard<'_, RawMutex, GameState<P>> {
        self.state.lock().await
    }

    /// Publishes the side effects of a locked operation. Called after the
    /// guard is gone, never while holding it.
    pub fn publish(&self, outcome: Outcome) {
        if let Some(kind) = outcome.preview
            && self.previews.try_send(kind).is_err()
        {
            warn!("preview queue full, dropped {}", kind);
        }
        if let Some(score) = outcome.scored {
            info!("Current score: {}", score);
        }
        if let Some(score) = outcome.final_score {
            info!("Final score: {}", score);
            self.fast_drop.store(false, Ordering::Relaxed);
            self.request_redraw();
        }
    }

    // ── fast drop ───────────────────────────────────────────────────────

    pub fn fast_drop(&self) -> bool {
        self.fast_drop.load(Ordering::Relaxed)
    }

    pub fn set_fast_drop(&self, on: bool) {
        self.fast_drop.store(on, Ordering::Relaxed);
    }

    // ── forced render ───────────────────────────────────────────────────

    pub fn request_redraw(&self) {
        self.redraw.signal(());
    }

    pub async fn wait_redraw(&self) {
        self.redraw.wait().await;
    }

    // ── stick queue ─────────────────────────────────────────────────────

    /// Non-blocking producer side; a full queue drops the sample.
    pub fn push_stick(&self, sample: u32) -> bool {
        let sent = self.sticks.try_send(sample).is_ok();
        if !sent {
            trace!("stick queue full");
        }
        sent
    }

    pub async fn next_stick(&self) -> u32 {
        self.sticks.receive().await
    }

    // ── button queue and its interrupt gate ─────────────────────────────

    /// Non-blocking producer side. A dropped mask re-arms the gate itself,
    /// since no consumer will.
    pub fn push_buttons(&self, mask: u8) -> bool {
        if self.buttons.try_send(mask).is_ok() {
            true
        } else {
            warn!("button queue full, dropped mask {=u8:#x}", mask);
            self.arm_buttons();
            false
        }
    }

    pub async fn next_buttons(&self) -> u8 {
        self.buttons.receive().await
    }

    pub fn buttons_armed(&self) -> bool {
        self.buttons_armed.load(Ordering::Acquire)
    }

    /// Closes the gate; returns whether it was open.
    pub fn disarm_buttons(&self) -> bool {
        self.buttons_armed.swap(false, Ordering::AcqRel)
    }

    pub fn arm_buttons(&self) {
        self.buttons_armed.store(true, Ordering::Release);
        self.rearm.signal(());
    }

    /// Resolves once the gate is open.
    pub async fn wait_armed(&self) {
        while !self.buttons_armed() {
            self.rearm.wait().await;
        }
    }

    // ── preview queue ───────────────────────────────────────────────────

    pub async fn next_preview(&self) -> PieceKind {
        self.previews.receive().await
    }

    pub fn try_next_preview(&self) -> Option<PieceKind> {
        self.previews.try_receive().ok()
    }
}

#[cfg(test)]
mod tests {
    use embassy_futures::block_on;

    use super::*;
    use crate::piece::ConstantProducer;

    fn engine() -> Engine<ConstantProducer> {
        Engine::with_state(GameState::with_producer(ConstantProducer::new(PieceKind::S)))
    }

    #[test]
    fn publish_routes_the_preview() {
        let engine = engine();
        engine.publish(Outcome {
            preview: Some(PieceKind::J),
            ..Outcome::default()
        });
        assert_eq!(engine.try_next_preview(), Some(PieceKind::J));
        assert_eq!(engine.try_next_preview(), None);
    }

    #[test]
    fn preview_overflow_drops_instead_of_blocking() {
        let engine = engine();
        for _ in 0..PREVIEW_QUEUE_DEPTH + 2 {
            engine.publish(Outcome {
                preview: Some(PieceKind::I),
                ..Outcome::default()
            });
        }
        let mut drained = 0;
        while engine.try_next_preview().is_some() {
            drained += 1;
        }
        assert_eq!(drained, PREVIEW_QUEUE_DEPTH);
    }

    #[test]
    fn game_over_clears_fast_drop_and_forces_a_redraw() {
        let engine = engine();
        engine.set_fast_drop(true);
        engine.publish(Outcome {
            final_score: Some(340),
            ..Outcome::default()
        });
        assert!(!engine.fast_drop());
        block_on(engine.wait_redraw());
    }

    #[test]
    fn button_gate_starts_armed() {
        let engine = engine();
        assert!(engine.buttons_armed());
        block_on(engine.wait_armed());
        assert!(engine.disarm_buttons());
        assert!(!engine.disarm_buttons());
        engine.arm_buttons();
        block_on(engine.wait_armed());
    }

    #[test]
    fn full_button_queue_rearms_the_gate() {
        let engine = engine();
        for mask in 0..BUTTON_QUEUE_DEPTH as u8 {
            assert!(engine.push_buttons(mask));
        }
        engine.disarm_buttons();
        assert!(!engine.push_buttons(0xFF));
        assert!(engine.buttons_armed());
    }

    #[test]
    fn stick_queue_is_bounded() {
        let engine = engine();
        for i in 0..STICK_QUEUE_DEPTH as u32 {
            assert!(engine.push_stick(i));
        }
        assert!(!engine.push_stick(99));
        assert_eq!(block_on(engine.next_stick()), 0);
    }
}
