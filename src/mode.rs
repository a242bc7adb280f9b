//! Screen-mode state machine.
//!
//! ```text
//! NotStarted ──start──▶ Playing ◀──pause──▶ Paused
//!                          │
//!                     failed spawn
//!                          ▼
//!                       GameOver
//! ```
//!
//! Every non-playing mode carries a one-shot `drawn` bit so its full-screen
//! page is drawn once on entry. `Playing` carries `full_redraw`, set on entry,
//! so the first board frame also repaints the chrome the page overwrote.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ScreenMode {
    NotStarted { drawn: bool },
    Playing { full_redraw: bool },
    Paused { drawn: bool },
    GameOver { drawn: bool },
}

/// What the render task has to put on the panel this tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Frame {
    StartPage,
    PausePage,
    GameOverPage,
    Board { chrome: bool },
    /// The panel already shows the right page.
    Hold,
}

impl Default for ScreenMode {
    fn default() -> Self {
        Self::NotStarted { drawn: false }
    }
}

impl ScreenMode {
    pub const fn is_playing(self) -> bool {
        matches!(self, Self::Playing { .. })
    }

    pub const fn is_paused(self) -> bool {
        matches!(self, Self::Paused { .. })
    }

    pub const fn is_over(self) -> bool {
        matches!(self, Self::GameOver { .. })
    }

    pub const fn is_started(self) -> bool {
        !matches!(self, Self::NotStarted { .. })
    }

    /// `NotStarted → Playing`. Returns whether the transition happened.
    pub fn start(&mut self) -> bool {
        match self {
            Self::NotStarted { .. } => {
                *self = Self::Playing { full_redraw: true };
                true
            }
            _ => false,
        }
    }

    /// `Playing ⇄ Paused`; ignored in the other modes.
    pub fn toggle_pause(&mut self) -> bool {
        match *self {
            Self::Playing { .. } => *self = Self::Paused { drawn: false },
            Self::Paused { .. } => *self = Self::Playing { full_redraw: true },
            _ => return false,
        }
        true
    }

    /// `Playing → GameOver`. Terminal; a second call keeps the drawn bit.
    pub fn finish(&mut self) {
        if !self.is_over() {
            *self = Self::GameOver { drawn: false };
        }
    }

    /// Yields the frame to draw and consumes the one-shot bit that asked
    /// for it.
    pub fn next_frame(&mut self) -> Frame {
        match self {
            Self::NotStarted { drawn } => page(drawn, Frame::StartPage),
            Self::Paused { drawn } => page(drawn, Frame::PausePage),
            Self::GameOver { drawn } => page(drawn, Frame::GameOverPage),
            Self::Playing { full_redraw } => Frame::Board {
                chrome: core::mem::take(full_redraw),
            },
        }
    }

    /// Clears the one-shot bit again so the current page is redrawn on the
    /// next frame. Used when a draw was abandoned halfway.
    pub fn invalidate(&mut self) {
        match self {
            Self::NotStarted { drawn } | Self::Paused { drawn } | Self::GameOver { drawn } => {
                *drawn = false;
            }
            Self::Playing { full_redraw } => *full_redraw = true,
        }
    }
}

fn page(drawn: &mut bool, frame: Frame) -> Frame {
    if core::mem::replace(drawn, true) {
        Frame::Hold
    } else {
        frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_page_is_drawn_once() {
        let mut mode = ScreenMode::default();
        assert_eq!(mode.next_frame(), Frame::StartPage);
        assert_eq!(mode.next_frame(), Frame::Hold);
        assert_eq!(mode.next_frame(), Frame::Hold);
    }

    #[test]
    fn start_only_leaves_not_started() {
        let mut mode = ScreenMode::default();
        assert!(mode.start());
        assert!(mode.is_playing());
        assert!(!mode.start());

        mode.finish();
        assert!(!mode.start());
        assert!(mode.is_over());
    }

    #[test]
    fn entering_playing_redraws_chrome_once() {
        let mut mode = ScreenMode::default();
        mode.start();
        assert_eq!(mode.next_frame(), Frame::Board { chrome: true });
        assert_eq!(mode.next_frame(), Frame::Board { chrome: false });
    }

    #[test]
    fn pause_round_trip() {
        let mut mode = ScreenMode::Playing { full_redraw: false };
        assert!(mode.toggle_pause());
        assert!(mode.is_paused());
        assert_eq!(mode.next_frame(), Frame::PausePage);
        assert_eq!(mode.next_frame(), Frame::Hold);

        assert!(mode.toggle_pause());
        assert_eq!(mode.next_frame(), Frame::Board { chrome: true });
        assert_eq!(mode.next_frame(), Frame::Board { chrome: false });
    }

    #[test]
    fn pause_is_ignored_outside_play() {
        let mut mode = ScreenMode::default();
        assert!(!mode.toggle_pause());
        assert_eq!(mode, ScreenMode::default());

        let mut over = ScreenMode::GameOver { drawn: true };
        assert!(!over.toggle_pause());
        assert!(over.is_over());
    }

    #[test]
    fn game_over_is_terminal_and_drawn_once() {
        let mut mode = ScreenMode::Playing { full_redraw: false };
        mode.finish();
        assert_eq!(mode.next_frame(), Frame::GameOverPage);
        mode.finish();
        assert_eq!(mode.next_frame(), Frame::Hold);
    }

    #[test]
    fn invalidate_rearms_the_current_page() {
        let mut mode = ScreenMode::Paused { drawn: true };
        mode.invalidate();
        assert_eq!(mode.next_frame(), Frame::PausePage);

        let mut playing = ScreenMode::Playing { full_redraw: false };
        playing.invalidate();
        assert_eq!(playing.next_frame(), Frame::Board { chrome: true });
    }
}
