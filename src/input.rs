//! Input pipeline: raw sample formats, normalisation, the translation of
//! samples into model commands, and the sampler seams the tasks drive.

use embassy_futures::select::select_array;
use embedded_hal::digital::InputPin;
use embedded_hal_async::digital::Wait;

use crate::{
    config::{
        AXIS_CENTER,
        AXIS_MAX,
        DEADZONE,
    },
    game::{
        GameState,
        Outcome,
    },
    piece::PieceProducer,
};

// ── Stick samples ───────────────────────────────────────────────────────────

/// Packs one two-axis sample: vertical axis in the high half-word,
/// horizontal in the low half-word.
pub const fn pack(x: u16, y: u16) -> u32 {
    ((y as u32) << 16) | x as u32
}

/// Splits a packed sample into `(x, y)`.
pub const fn unpack(sample: u32) -> (u16, u16) {
    ((sample & 0xFFFF) as u16, (sample >> 16) as u16)
}

/// Signed deflection in `[-1, 1)`; zero anywhere inside
/// `[AXIS_CENTER - DEADZONE, AXIS_CENTER + DEADZONE]`.
pub fn normalize(axis: u16) -> f32 {
    let lower = AXIS_CENTER - DEADZONE;
    let upper = AXIS_CENTER + DEADZONE;
    if (lower..=upper).contains(&axis) {
        0.0
    } else {
        (f32::from(axis) - f32::from(AXIS_CENTER)) / f32::from(AXIS_CENTER)
    }
}

/// What one stick sample asks of the model.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StickCommand {
    /// Horizontal step: `-1`, `0` or `1` columns.
    pub shift: i32,
    pub fast_drop: bool,
}

impl StickCommand {
    /// Positive horizontal deflection steps left (the stick is mounted
    /// mirrored); negative vertical deflection asks for fast drop.
    pub fn from_sample(sample: u32) -> Self {
        let (x, y) = unpack(sample);
        let (nx, ny) = (normalize(x), normalize(y));
        let shift = if nx > 0.0 {
            -1
        } else if nx < 0.0 {
            1
        } else {
            0
        };
        Self {
            shift,
            fast_drop: ny < 0.0,
        }
    }
}

/// Applies one stick sample under the caller's lock: at most one horizontal
/// move. Returns the outcome and the new fast-drop state.
pub fn apply_stick<P: PieceProducer>(game: &mut GameState<P>, sample: u32) -> (Outcome, bool) {
    let command = StickCommand::from_sample(sample);
    let outcome = if command.shift == 0 {
        Outcome::default()
    } else {
        game.move_piece(command.shift, 0)
    };
    (outcome, command.fast_drop)
}

// ── Button masks ────────────────────────────────────────────────────────────

pub const ROTATE_CCW: u8 = 1 << 0;
pub const ROTATE_CW: u8 = 1 << 1;
pub const PAUSE: u8 = 1 << 2;
pub const START: u8 = 1 << 3;

/// Applies one debounced button mask under the caller's lock. `seed` reseeds
/// the piece generator when the mask starts a session.
pub fn apply_buttons<P: PieceProducer>(game: &mut GameState<P>, mask: u8, seed: u32) -> Outcome {
    let mut outcome = Outcome::default();

    if mask & START != 0 && !game.mode().is_started() {
        outcome = outcome.merge(game.start_session(seed));
    }

    if mask & ROTATE_CCW != 0 {
        game.rotate_piece(false);
    } else if mask & ROTATE_CW != 0 {
        game.rotate_piece(true);
    }

    if mask & PAUSE != 0 && game.toggle_pause() {
        debug!("paused: {}", game.is_paused());
    }

    outcome
}

// ── Sampler seams ───────────────────────────────────────────────────────────

/// Synchronous two-axis sampler.
pub trait AxisSampler {
    /// One packed sample, see [`pack`].
    fn sample(&mut self) -> u32;
}

/// Digital button panel with an edge-triggered wake-up.
#[allow(async_fn_in_trait)]
pub trait ButtonPanel {
    /// Current mask, pressed buttons set.
    fn sample(&mut self) -> u8;

    /// Resolves on the next edge of any panel pin.
    async fn wait_for_edge(&mut self);
}

/// One panel input and the mask bit it drives.
pub struct PanelPin<P> {
    pin: P,
    bit: u8,
    active_low: bool,
}

impl<P: InputPin> PanelPin<P> {
    pub const fn active_low(pin: P, bit: u8) -> Self {
        Self {
            pin,
            bit,
            active_low: true,
        }
    }

    pub const fn active_high(pin: P, bit: u8) -> Self {
        Self {
            pin,
            bit,
            active_low: false,
        }
    }

    fn is_pressed(&mut self) -> bool {
        let level = if self.active_low {
            self.pin.is_low()
        } else {
            self.pin.is_high()
        };
        // a pin that cannot be read counts as released
        level.unwrap_or(false)
    }
}

/// Button panel over `N` GPIO inputs.
pub struct GpioPanel<P, const N: usize> {
    pins: [PanelPin<P>; N],
}

impl<P, const N: usize> GpioPanel<P, N> {
    pub const fn new(pins: [PanelPin<P>; N]) -> Self {
        Self { pins }
    }
}

impl<P: InputPin + Wait, const N: usize> ButtonPanel for GpioPanel<P, N> {
    fn sample(&mut self) -> u8 {
        self.pins
            .iter_mut()
            .filter_map(|p| p.is_pressed().then_some(p.bit))
            .fold(0, |mask, bit| mask | bit)
    }

    async fn wait_for_edge(&mut self) {
        let waits = self.pins.each_mut().map(|p| p.pin.wait_for_any_edge());
        let (result, index) = select_array(waits).await;
        if result.is_err() {
            warn!("edge wait failed on panel pin {}", index);
        }
    }
}

/// A two-axis sample synthesised from a D-pad: a pressed direction reads as
/// the rail value, released as centre.
pub struct DpadStick<P> {
    pub up: P,
    pub down: P,
    pub left: P,
    pub right: P,
}

fn pressed<P: InputPin>(pin: &mut P) -> bool {
    pin.is_low().unwrap_or(false)
}

impl<P: InputPin> AxisSampler for DpadStick<P> {
    fn sample(&mut self) -> u32 {
        let x = match (pressed(&mut self.left), pressed(&mut self.right)) {
            (true, false) => AXIS_MAX,
            (false, true) => 0,
            _ => AXIS_CENTER,
        };
        let y = match (pressed(&mut self.up), pressed(&mut self.down)) {
            (true, false) => AXIS_MAX,
            (false, true) => 0,
            _ => AXIS_CENTER,
        };
        pack(x, y)
    }
}

#[cfg(test)]
mod tests {
    use core::{
        cell::Cell,
        convert::Infallible,
    };

    use embassy_futures::block_on;

    use super::*;
    use crate::piece::{
        ConstantProducer,
        PieceKind,
    };

    /// Pin whose level is shared with the test body.
    struct FakePin<'a>(&'a Cell<bool>);

    impl embedded_hal::digital::ErrorType for FakePin<'_> {
        type Error = Infallible;
    }

    impl InputPin for FakePin<'_> {
        fn is_high(&mut self) -> Result<bool, Infallible> {
            Ok(self.0.get())
        }

        fn is_low(&mut self) -> Result<bool, Infallible> {
            Ok(!self.0.get())
        }
    }

    impl Wait for FakePin<'_> {
        async fn wait_for_high(&mut self) -> Result<(), Infallible> {
            Ok(())
        }

        async fn wait_for_low(&mut self) -> Result<(), Infallible> {
            Ok(())
        }

        async fn wait_for_rising_edge(&mut self) -> Result<(), Infallible> {
            Ok(())
        }

        async fn wait_for_falling_edge(&mut self) -> Result<(), Infallible> {
            Ok(())
        }

        async fn wait_for_any_edge(&mut self) -> Result<(), Infallible> {
            Ok(())
        }
    }

    fn playing() -> GameState<ConstantProducer> {
        let mut game = GameState::with_producer(ConstantProducer::new(PieceKind::T));
        let _ = game.start_session(0);
        game
    }

    #[test]
    fn pack_puts_vertical_axis_high() {
        assert_eq!(pack(0x0123, 0x0ABC), 0x0ABC_0123);
        assert_eq!(unpack(0x0ABC_0123), (0x0123, 0x0ABC));
    }

    #[test]
    fn deadzone_boundaries() {
        for centred in [1536, 1800, 2048, 2300, 2560] {
            assert_eq!(normalize(centred), 0.0, "{centred}");
        }
        assert!(normalize(1535) < 0.0);
        assert!(normalize(2561) > 0.0);
        assert_eq!(normalize(0), -1.0);
        assert!(normalize(4095) < 1.0);
    }

    #[test]
    fn stick_directions() {
        let centre = pack(AXIS_CENTER, AXIS_CENTER);
        assert_eq!(StickCommand::from_sample(centre), StickCommand::default());

        let left = StickCommand::from_sample(pack(AXIS_MAX, AXIS_CENTER));
        assert_eq!(left.shift, -1);
        let right = StickCommand::from_sample(pack(0, AXIS_CENTER));
        assert_eq!(right.shift, 1);

        assert!(StickCommand::from_sample(pack(AXIS_CENTER, 0)).fast_drop);
        assert!(!StickCommand::from_sample(pack(AXIS_CENTER, AXIS_MAX)).fast_drop);
    }

    #[test]
    fn apply_stick_moves_at_most_one_column() {
        let mut game = playing();
        let x0 = game.active().unwrap().x;
        let (_, fast) = apply_stick(&mut game, pack(AXIS_MAX, 0));
        assert!(fast);
        assert_eq!(game.active().unwrap().x, x0 - 1);
    }

    #[test]
    fn start_button_starts_once() {
        let mut game = GameState::with_producer(ConstantProducer::new(PieceKind::O));
        let outcome = apply_buttons(&mut game, START, 3);
        assert!(game.is_playing());
        assert_eq!(outcome.preview, Some(PieceKind::O));

        assert!(apply_buttons(&mut game, START, 4).is_quiet());
    }

    #[test]
    fn counter_clockwise_wins_over_clockwise() {
        let mut game = playing();
        let mut expected = game.active().unwrap().shape.rotated_ccw();
        let _ = apply_buttons(&mut game, ROTATE_CCW | ROTATE_CW, 0);
        assert_eq!(game.active().unwrap().shape, expected);

        expected = expected.rotated_cw();
        let _ = apply_buttons(&mut game, ROTATE_CW, 0);
        assert_eq!(game.active().unwrap().shape, expected);
    }

    #[test]
    fn pause_button_toggles() {
        let mut game = playing();
        let _ = apply_buttons(&mut game, PAUSE, 0);
        assert!(game.is_paused());
        let _ = apply_buttons(&mut game, PAUSE, 0);
        assert!(game.is_playing());
    }

    #[test]
    fn gpio_panel_honours_pin_polarity() {
        let ccw = Cell::new(true);
        let cw = Cell::new(true);
        let pause = Cell::new(false);
        let start = Cell::new(true);
        let mut panel = GpioPanel::new([
            PanelPin::active_low(FakePin(&ccw), ROTATE_CCW),
            PanelPin::active_low(FakePin(&cw), ROTATE_CW),
            PanelPin::active_high(FakePin(&pause), PAUSE),
            PanelPin::active_low(FakePin(&start), START),
        ]);
        assert_eq!(panel.sample(), 0);

        cw.set(false);
        pause.set(true);
        assert_eq!(panel.sample(), ROTATE_CW | PAUSE);

        block_on(panel.wait_for_edge());
    }

    #[test]
    fn dpad_synthesises_rail_values() {
        let (up, down, left, right) = (
            Cell::new(true),
            Cell::new(true),
            Cell::new(true),
            Cell::new(true),
        );
        let mut dpad = DpadStick {
            up: FakePin(&up),
            down: FakePin(&down),
            left: FakePin(&left),
            right: FakePin(&right),
        };
        assert_eq!(dpad.sample(), pack(AXIS_CENTER, AXIS_CENTER));

        left.set(false);
        down.set(false);
        assert_eq!(dpad.sample(), pack(AXIS_MAX, 0));

        right.set(false);
        assert_eq!(unpack(dpad.sample()).0, AXIS_CENTER);
    }
}
