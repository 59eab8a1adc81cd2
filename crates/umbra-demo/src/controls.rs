//! Keyboard debug controller.
//!
//! Reads this frame's key presses and answers with `DebugPatch`es; nothing is
//! mutated here.
//!
//! | key     | action                       |
//! |---------|------------------------------|
//! | 1..9    | select camera                |
//! | P       | toggle pixelize              |
//! | `[` `]` | pixel fraction down / up     |
//! | B       | toggle blur                  |
//! | - =     | blur radius down / up        |
//! | L       | toggle shadows               |
//! | V       | toggle vsync                 |
//! | F1      | log a debug snapshot         |

use umbra_engine::config::RenderSettings;
use umbra_engine::input::{InputFrame, Key};
use umbra_engine::scene::DebugPatch;

const FRACTION_STEP: f32 = 0.005;
const MAX_FRACTION: f32 = 0.25;

const CAMERA_KEYS: [Key; 9] = [
    Key::Digit1,
    Key::Digit2,
    Key::Digit3,
    Key::Digit4,
    Key::Digit5,
    Key::Digit6,
    Key::Digit7,
    Key::Digit8,
    Key::Digit9,
];

#[derive(Debug, Default)]
pub struct DebugKeys {
    /// Set when F1 was pressed; the caller logs the snapshot.
    pub snapshot_requested: bool,
}

impl DebugKeys {
    pub fn poll(&mut self, frame: &InputFrame, settings: &RenderSettings) -> Vec<DebugPatch> {
        let mut patches = Vec::new();
        let post = &settings.post;

        if let Some(i) = CAMERA_KEYS
            .iter()
            .filter(|k| frame.key_pressed(**k))
            .find_map(|k| k.digit_index())
        {
            patches.push(DebugPatch::SelectCamera(i));
        }

        let pressed = |key| frame.key_pressed(key);

        if pressed(Key::P) {
            patches.push(DebugPatch::SetPixelize(!post.pixelize));
        }
        if pressed(Key::BracketLeft) {
            let f = (post.pixel_fraction - FRACTION_STEP).max(FRACTION_STEP);
            patches.push(DebugPatch::SetPixelFraction(f));
        }
        if pressed(Key::BracketRight) {
            let f = (post.pixel_fraction + FRACTION_STEP).min(MAX_FRACTION);
            patches.push(DebugPatch::SetPixelFraction(f));
        }
        if pressed(Key::B) {
            patches.push(DebugPatch::SetBlur(!post.blur));
        }
        if pressed(Key::Minus) {
            patches.push(DebugPatch::SetBlurRadius(post.blur_radius - 1));
        }
        if pressed(Key::Equal) {
            patches.push(DebugPatch::SetBlurRadius(post.blur_radius + 1));
        }
        if pressed(Key::L) {
            patches.push(DebugPatch::SetShadows(!settings.shadows.enabled));
        }
        if pressed(Key::V) {
            patches.push(DebugPatch::SetVsync(!settings.vsync));
        }
        if pressed(Key::F1) {
            self.snapshot_requested = true;
        }

        patches
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(keys: &[Key]) -> InputFrame {
        let mut frame = InputFrame::default();
        frame.keys_pressed.extend(keys.iter().copied());
        frame
    }

    #[test]
    fn toggles_flip_current_settings() {
        let settings = RenderSettings::default();
        let patches = DebugKeys::default().poll(&press(&[Key::P, Key::B, Key::V]), &settings);
        assert_eq!(
            patches,
            vec![
                DebugPatch::SetPixelize(true),
                DebugPatch::SetBlur(true),
                DebugPatch::SetVsync(false),
            ]
        );
    }

    #[test]
    fn digits_select_cameras_from_zero() {
        let patches =
            DebugKeys::default().poll(&press(&[Key::Digit2]), &RenderSettings::default());
        assert_eq!(patches, vec![DebugPatch::SelectCamera(1)]);
    }

    #[test]
    fn f1_requests_a_snapshot_without_patches() {
        let mut keys = DebugKeys::default();
        let patches = keys.poll(&press(&[Key::F1]), &RenderSettings::default());
        assert!(patches.is_empty());
        assert!(keys.snapshot_requested);
    }
}
