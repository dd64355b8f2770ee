use anyhow::bail;
use log::debug;
use std::sync::Mutex;
use ::windows::Win32::UI::Input::KeyboardAndMouse::GetAsyncKeyState;

use crate::engine::ClockPhase;
use crate::input::{KeyEvent, KeySource};

/// Polls the physical keyboard once per frame and reports lane key transitions.
#[derive(Debug)]
pub struct KeyboardSource {
    keys: Vec<char>,
    held: Mutex<Vec<bool>>,
}

impl KeyboardSource {
    pub fn new(lane_keys: &[char]) -> Self {
        Self {
            keys: lane_keys.to_vec(),
            held: Mutex::new(vec![false; lane_keys.len()]),
        }
    }

    /// Letter and digit keys share their virtual-key code with the uppercase ASCII value.
    fn is_down(key: char) -> bool {
        let vk = key.to_ascii_uppercase() as i32;
        // High bit is set while the key is held.
        let state = unsafe { GetAsyncKeyState(vk) };
        (state as u16) & 0x8000 != 0
    }
}

impl KeySource for KeyboardSource {
    fn poll(&self, _phase: ClockPhase, _now: f64) -> anyhow::Result<Vec<KeyEvent>> {
        let Ok(mut held) = self.held.lock() else {
            bail!("Failed to lock keyboard state..!")
        };

        let mut events = Vec::new();
        for (lane, &key) in self.keys.iter().enumerate() {
            let down = Self::is_down(key);
            if down == held[lane] {
                continue;
            }

            held[lane] = down;
            debug!("Key '{}' {}", key, if down { "down" } else { "up" });
            events.push(if down { KeyEvent::Down(key) } else { KeyEvent::Up(key) });
        }

        Ok(events)
    }

    fn reset(&self) -> anyhow::Result<()> {
        let Ok(mut held) = self.held.lock() else {
            bail!("Failed to lock keyboard state..!")
        };
        held.iter_mut().for_each(|h| *h = false);

        Ok(())
    }
}
