//! Next-piece preview on the two WS2812 bars, driven through RMT.
//!
//! The badge has two bars of five LEDs. Hardware indexing runs counter
//! clockwise from the bottom right: 0 is bottom right, 4 top right, 5 top
//! left, 9 bottom left. The 4×4 preview matrix is folded onto them: the
//! left bar shows columns 0–1, the right bar columns 2–3, and row 0 sits on
//! the top LED. The bottom LED of each bar stays dark.

use embassy_time::{
    Duration,
    Timer,
};
use embedded_graphics::{
    pixelcolor::Rgb565,
    prelude::RgbColor,
};
use esp_hal::{
    Blocking,
    gpio::Level,
    rmt::{
        PulseCode,
        Tx,
    },
};
use palette::Srgb;

use crate::{
    config::PIECE_SIZE,
    render::PreviewMatrix,
};

/// Number of WS2812 LEDs on the badge.
pub const LED_COUNT: usize = 10;

/// Number of LEDs per bar (left or right).
pub const BAR_COUNT: usize = 5;

/// 24 bits per LED plus the end marker.
const PULSE_COUNT: usize = LED_COUNT * 24 + 1;

const OFF: Srgb<u8> = Srgb::new(0, 0, 0);

pub struct PreviewBars<'a> {
    channel: Option<esp_hal::rmt::Channel<'a, Blocking, Tx>>,
    cells: [[bool; PIECE_SIZE]; PIECE_SIZE],
    color: Srgb<u8>,
}

impl<'a> PreviewBars<'a> {
    pub const fn new(channel: esp_hal::rmt::Channel<'a, Blocking, Tx>) -> Self {
        Self {
            channel: Some(channel),
            cells: [[false; PIECE_SIZE]; PIECE_SIZE],
            color: Srgb::new(16, 16, 16),
        }
    }

    /// Hardware frame for the staged matrix.
    fn frame(&self) -> [Srgb<u8>; LED_COUNT] {
        let mut frame = [OFF; LED_COUNT];
        for (row, cells) in self.cells.iter().enumerate() {
            if cells[..2].iter().any(|&on| on) {
                // left bar: index 5 = top
                frame[BAR_COUNT + row] = self.color;
            }
            if cells[2..].iter().any(|&on| on) {
                // right bar: index 4 = top
                frame[BAR_COUNT - 1 - row] = self.color;
            }
        }
        frame
    }

    /// WS2812 bit timing at 40 MHz RMT clock.
    const fn bit_to_pulse(bit: bool) -> PulseCode {
        if bit {
            // '1': 0.8 µs high (32 ticks), 0.45 µs low (18 ticks)
            PulseCode::new(Level::High, 32, Level::Low, 18)
        } else {
            // '0': 0.4 µs high (16 ticks), 0.85 µs low (34 ticks)
            PulseCode::new(Level::High, 16, Level::Low, 34)
        }
    }

    fn encode(frame: &[Srgb<u8>; LED_COUNT]) -> [PulseCode; PULSE_COUNT] {
        let mut pulses = [PulseCode::end_marker(); PULSE_COUNT];
        for (led, color) in pulses.chunks_exact_mut(24).zip(frame) {
            // WS2812 expects GRB byte order
            for (slot, byte) in led.chunks_exact_mut(8).zip([color.green, color.red, color.blue]) {
                for (i, pulse) in slot.iter_mut().enumerate() {
                    *pulse = Self::bit_to_pulse((byte >> (7 - i)) & 1 != 0);
                }
            }
        }
        pulses
    }
}

impl PreviewMatrix for PreviewBars<'_> {
    fn set_color(&mut self, color: Rgb565) {
        // 5/6/5-bit channels, kept dim
        self.color = Srgb::new(color.r() << 1, color.g(), color.b() << 1);
    }

    fn set_cell(&mut self, row: usize, col: usize, on: bool) {
        if let Some(cell) = self.cells.get_mut(row).and_then(|r| r.get_mut(col)) {
            *cell = on;
        }
    }

    async fn flush(&mut self) {
        let Some(channel) = self.channel.take() else {
            error!("RMT channel lost during previous transmission");
            return;
        };

        let pulses = Self::encode(&self.frame());

        let transaction = match channel.transmit(&pulses) {
            Ok(t) => t,
            Err(e) => {
                error!("RMT transmit failed: {}", e);
                return;
            }
        };

        self.channel = Some(match transaction.wait() {
            Ok(ch) => ch,
            Err((err, ch)) => {
                error!("RMT transaction failed: {}", err);
                ch
            }
        });

        // WS2812 reset time
        Timer::after(Duration::from_micros(50)).await;
    }
}
