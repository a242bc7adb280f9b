//! The badge's game controls.
//!
//! The D-pad stands in for the analog stick and is polled by the stick
//! sampler. B, A, Select and Start form the edge-triggered button panel.

use esp_hal::gpio::{
    Input,
    InputConfig,
    Pull,
};

use super::ButtonResources;
use crate::input::{
    DpadStick,
    GpioPanel,
    PAUSE,
    PanelPin,
    ROTATE_CCW,
    ROTATE_CW,
    START,
};

pub struct Controls {
    pub stick: DpadStick<Input<'static>>,
    pub panel: GpioPanel<Input<'static>, 4>,
}

impl From<ButtonResources<'static>> for Controls {
    fn from(res: ButtonResources<'static>) -> Self {
        let pull_up = InputConfig::default().with_pull(Pull::Up);
        Self {
            stick: DpadStick {
                up: Input::new(res.up, pull_up),
                down: Input::new(res.down, pull_up),
                left: Input::new(res.left, pull_up),
                right: Input::new(res.right, pull_up),
            },
            panel: GpioPanel::new([
                PanelPin::active_low(Input::new(res.b, pull_up), ROTATE_CCW),
                PanelPin::active_low(Input::new(res.a, pull_up), ROTATE_CW),
                // Select is wired with a pull-down, pressed reads high
                PanelPin::active_high(
                    Input::new(res.select, InputConfig::default().with_pull(Pull::Down)),
                    PAUSE,
                ),
                PanelPin::active_low(Input::new(res.start, pull_up), START),
            ]),
        }
    }
}
