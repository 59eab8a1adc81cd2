use std::collections::HashSet;

use super::types::{InputEvent, Key, MouseButton, WheelDelta};

/// Per-frame input deltas.
///
/// `InputState` holds what is currently down; `InputFrame` holds what changed
/// since the last frame. The runtime clears it after each `on_frame`.
#[derive(Debug, Default)]
pub struct InputFrame {
    /// Raw events in arrival order.
    pub events: Vec<InputEvent>,

    /// Keys pressed this frame (repeats excluded).
    pub keys_pressed: HashSet<Key>,

    /// Keys released this frame.
    pub keys_released: HashSet<Key>,

    /// Mouse buttons pressed this frame.
    pub buttons_pressed: HashSet<MouseButton>,

    /// Mouse buttons released this frame.
    pub buttons_released: HashSet<MouseButton>,

    /// Accumulated pointer motion in physical pixels.
    pub pointer_delta: (f32, f32),

    /// Accumulated wheel motion in lines.
    pub wheel: WheelDelta,
}

impl InputFrame {
    pub fn clear(&mut self) {
        self.events.clear();
        self.keys_pressed.clear();
        self.keys_released.clear();
        self.buttons_pressed.clear();
        self.buttons_released.clear();
        self.pointer_delta = (0.0, 0.0);
        self.wheel = WheelDelta::default();
    }

    pub fn push_event(&mut self, ev: InputEvent) {
        self.events.push(ev);
    }

    pub fn key_pressed(&self, key: Key) -> bool {
        self.keys_pressed.contains(&key)
    }
}
