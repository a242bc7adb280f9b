//! Task plumbing driven step by step on the host.

use embassy_futures::block_on;
use embedded_graphics::{
    pixelcolor::Rgb565,
    prelude::*,
};
use tetrabadge::{
    Engine,
    GameState,
    PieceKind,
    PreviewMatrix,
    config::{
        AXIS_CENTER,
        AXIS_MAX,
        BOARD_HEIGHT,
        GAME_OVER_BACKOFF,
        SCREEN_H,
        SCREEN_W,
    },
    input::{
        ButtonPanel,
        PAUSE,
        ROTATE_CW,
        START,
        pack,
    },
    piece::ConstantProducer,
    render,
    tasks,
};

type TestEngine = Engine<ConstantProducer>;

fn engine(kind: PieceKind) -> TestEngine {
    Engine::with_state(GameState::with_producer(ConstantProducer::new(kind)))
}

/// Counts draw calls and remembers the colour at the top-left pixel.
struct Panel {
    writes: usize,
    origin: Option<Rgb565>,
    fail: bool,
}

impl Panel {
    fn new() -> Self {
        Self {
            writes: 0,
            origin: None,
            fail: false,
        }
    }
}

impl OriginDimensions for Panel {
    fn size(&self) -> Size {
        Size::new(SCREEN_W as u32, SCREEN_H as u32)
    }
}

impl DrawTarget for Panel {
    type Color = Rgb565;
    type Error = ();

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), ()>
    where
        I: IntoIterator<Item = Pixel<Rgb565>>,
    {
        if self.fail {
            return Err(());
        }
        self.writes += 1;
        for Pixel(p, color) in pixels {
            if p == Point::zero() {
                self.origin = Some(color);
            }
        }
        Ok(())
    }
}

/// Scripted button panel: each edge yields the next mask.
struct Script {
    masks: Vec<u8>,
    edges: usize,
}

impl ButtonPanel for Script {
    fn sample(&mut self) -> u8 {
        self.masks.remove(0)
    }

    async fn wait_for_edge(&mut self) {
        self.edges += 1;
    }
}

#[derive(Default)]
struct Leds {
    lit: usize,
    flushes: usize,
}

impl PreviewMatrix for Leds {
    fn set_cell(&mut self, _row: usize, _col: usize, on: bool) {
        self.lit += usize::from(on);
    }

    async fn flush(&mut self) {
        self.flushes += 1;
    }
}

fn drain_previews(engine: &TestEngine) -> Vec<PieceKind> {
    core::iter::from_fn(|| engine.try_next_preview()).collect()
}

#[test]
fn start_page_then_board_with_chrome() {
    let engine = engine(PieceKind::T);
    let mut panel = Panel::new();

    block_on(tasks::render_step(&engine, &mut panel));
    assert_eq!(panel.origin, Some(Rgb565::BLACK));
    let start_writes = panel.writes;
    assert!(start_writes > 0);

    // start page is not redrawn on later ticks
    block_on(tasks::render_step(&engine, &mut panel));
    assert_eq!(panel.writes, start_writes);

    block_on(tasks::buttons_step(&engine, START));
    block_on(tasks::render_step(&engine, &mut panel));
    let board_writes = panel.writes - start_writes;

    block_on(tasks::render_step(&engine, &mut panel));
    let plain_writes = panel.writes - start_writes - board_writes;
    assert_eq!(plain_writes, 200);
    assert!(board_writes > plain_writes);
}

#[test]
fn abandoned_frame_is_redrawn_next_tick() {
    let engine = engine(PieceKind::T);
    let mut panel = Panel::new();
    panel.fail = true;
    block_on(tasks::render_step(&engine, &mut panel));
    assert_eq!(panel.writes, 0);

    panel.fail = false;
    block_on(tasks::render_step(&engine, &mut panel));
    assert_eq!(panel.origin, Some(Rgb565::BLACK));
}

#[test]
fn game_over_forces_red_page_and_backs_off() {
    let engine = engine(PieceKind::O);
    block_on(tasks::buttons_step(&engine, START));

    for _ in 0..10_000 {
        if block_on(tasks::gravity_step(&engine)) == GAME_OVER_BACKOFF {
            break;
        }
    }
    assert!(block_on(engine.lock()).is_over());

    // the forced redraw is pending
    block_on(engine.wait_redraw());

    let mut panel = Panel::new();
    block_on(tasks::render_step(&engine, &mut panel));
    assert_eq!(panel.origin, Some(Rgb565::RED));

    assert_eq!(
        block_on(tasks::stick_step(&engine, pack(AXIS_MAX, 0))),
        GAME_OVER_BACKOFF
    );
}

#[test]
fn preview_follows_every_spawn() {
    let engine = engine(PieceKind::J);
    block_on(tasks::buttons_step(&engine, START));
    assert_eq!(drain_previews(&engine), [PieceKind::J]);

    for _ in 0..BOARD_HEIGHT {
        block_on(tasks::gravity_step(&engine));
    }
    assert_eq!(drain_previews(&engine), [PieceKind::J]);

    let mut leds = Leds::default();
    block_on(render::show_preview(&mut leds, PieceKind::J));
    assert_eq!((leds.lit, leds.flushes), (4, 1));
}

#[test]
fn edge_path_closes_the_gate_until_the_consumer_rearms() {
    let engine = engine(PieceKind::I);
    let mut script = Script {
        masks: vec![START, 0, ROTATE_CW | PAUSE],
        edges: 0,
    };

    block_on(tasks::button_edge_step(&engine, &mut script));
    assert!(!engine.buttons_armed());
    let mask = block_on(engine.next_buttons());
    assert_eq!(mask, START);
    block_on(tasks::buttons_step(&engine, mask));
    assert!(engine.buttons_armed());
    assert!(block_on(engine.lock()).is_playing());

    // a release edge samples zero and re-arms without queueing
    block_on(tasks::button_edge_step(&engine, &mut script));
    assert!(engine.buttons_armed());

    block_on(tasks::button_edge_step(&engine, &mut script));
    let mask = block_on(engine.next_buttons());
    block_on(tasks::buttons_step(&engine, mask));
    let game = block_on(engine.lock());
    assert!(game.is_paused());
    assert_eq!(script.edges, 3);
}

#[test]
fn stick_moves_one_column_per_sample() {
    let engine = engine(PieceKind::O);
    block_on(tasks::buttons_step(&engine, START));
    let x0 = block_on(engine.lock()).active().unwrap().x;

    for sample in [pack(0, AXIS_CENTER), pack(0, AXIS_CENTER)] {
        engine.push_stick(sample);
    }
    for _ in 0..2 {
        let sample = block_on(engine.next_stick());
        block_on(tasks::stick_step(&engine, sample));
    }
    assert_eq!(block_on(engine.lock()).active().unwrap().x, x0 + 2);
    assert!(!engine.fast_drop());
}

