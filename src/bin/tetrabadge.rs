//! Firmware entry point.
//!
//! Input producers, input consumers and gravity run on a high-priority
//! interrupt executor so a busy render never delays them. Render and the LED
//! preview run on the thread-mode executor. The main task is the idle
//! filler.
//!
//! Controls:
//! - D-pad left/right: move piece
//! - D-pad down: fast drop
//! - B: rotate counter-clockwise
//! - A: rotate clockwise
//! - Select: pause
//! - Start: start

#![no_std]
#![no_main]

use defmt::info;
use embassy_executor::Spawner;
use embassy_time::{
    Duration,
    Timer,
};
use esp_backtrace as _;
use esp_hal::{
    interrupt::{
        Priority,
        software::SoftwareInterruptControl,
    },
    timer::timg::TimerGroup,
};
use esp_println as _;
use esp_rtos::embassy::InterruptExecutor;
use tetrabadge::{
    Engine,
    badge::{
        self,
        Controls,
        Display,
        PreviewBars,
    },
    input::{
        DpadStick,
        GpioPanel,
    },
    mk_static,
    split_resources,
    tasks,
};

esp_bootloader_esp_idf::esp_app_desc!();

static ENGINE: Engine = Engine::new();

type Pin = esp_hal::gpio::Input<'static>;

// ── High priority: input and gravity ────────────────────────────────────────

#[embassy_executor::task]
async fn stick_sampler_task(stick: &'static mut DpadStick<Pin>) {
    tasks::run_stick_sampler(&ENGINE, stick).await
}

#[embassy_executor::task]
async fn stick_task() {
    tasks::run_stick(&ENGINE).await
}

#[embassy_executor::task]
async fn button_edge_task(panel: &'static mut GpioPanel<Pin, 4>) {
    tasks::run_button_edges(&ENGINE, panel).await
}

#[embassy_executor::task]
async fn button_task() {
    tasks::run_buttons(&ENGINE).await
}

#[embassy_executor::task]
async fn gravity_task() {
    tasks::run_gravity(&ENGINE).await
}

// ── Thread mode: render and preview ─────────────────────────────────────────

#[embassy_executor::task]
async fn display_task(display: &'static mut Display<'static>) {
    tasks::run_display(&ENGINE, display).await
}

#[embassy_executor::task]
async fn preview_task(bars: &'static mut PreviewBars<'static>) {
    tasks::run_preview(&ENGINE, bars).await
}

// ── Entry point ─────────────────────────────────────────────────────────────

#[esp_rtos::main]
async fn main(spawner: Spawner) -> ! {
    let peripherals = badge::init();
    let resources = split_resources!(peripherals);

    esp_alloc::heap_allocator!(size: 64 * 1024);

    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    let _backlight = badge::backlight_on(resources.backlight);
    let display = mk_static!(Display<'static>, resources.display.into());
    let bars = mk_static!(PreviewBars<'static>, resources.leds.into());
    let Controls { stick, panel } = resources.buttons.into();
    let stick = mk_static!(DpadStick<Pin>, stick);
    let panel = mk_static!(GpioPanel<Pin, 4>, panel);

    let sw_ints = SoftwareInterruptControl::new(peripherals.SW_INTERRUPT);
    let executor = mk_static!(
        InterruptExecutor<2>,
        InterruptExecutor::new(sw_ints.software_interrupt2)
    );
    let high = executor.start(Priority::Priority3);

    high.must_spawn(stick_sampler_task(stick));
    high.must_spawn(stick_task());
    high.must_spawn(button_edge_task(panel));
    high.must_spawn(button_task());
    high.must_spawn(gravity_task());

    spawner.must_spawn(display_task(display));
    spawner.must_spawn(preview_task(bars));

    info!("tetrabadge running");

    loop {
        Timer::after(Duration::from_secs(600)).await;
    }
}
