use crate::engine::ClockPhase;

mod autoplay;
mod router;
#[cfg(all(target_os = "windows", feature = "wininput"))]
mod windows;

pub use autoplay::AutoPlay;
pub use router::InputRouter;
#[cfg(all(target_os = "windows", feature = "wininput"))]
pub use windows::KeyboardSource;

/// A key transition, identified by the character printed on the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEvent {
    Down(char),
    Up(char),
}

/// Something that produces key events for the frame loop.
pub trait KeySource: Send + Sync {
    /// Drain every key transition since the previous poll.
    ///
    /// `phase` and `now` describe the session after this frame's update.
    fn poll(&self, phase: ClockPhase, now: f64) -> anyhow::Result<Vec<KeyEvent>>;

    /// Forget any pending state before a new turn starts.
    fn reset(&self) -> anyhow::Result<()> {
        Ok(())
    }
}
