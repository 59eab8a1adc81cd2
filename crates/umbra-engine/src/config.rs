//! Render configuration.
//!
//! Plain structs with `Default`, mutated between frames by `DebugPatch`es.

use glam::Vec3;

use crate::scene::DebugPatch;

/// Largest accepted blur radius in texels.
pub const MAX_BLUR_RADIUS: i32 = 20;

/// Top-level per-frame render settings.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSettings {
    /// Back buffer and scene target clear color (linear RGB).
    pub clear_color: Vec3,
    pub shadows: ShadowSettings,
    pub post: PostSettings,
    /// Present with vsync (`AutoVsync`) or without (`AutoNoVsync`).
    pub vsync: bool,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            clear_color: Vec3::new(0.4, 0.6, 0.75),
            shadows: ShadowSettings::default(),
            post: PostSettings::default(),
            vsync: true,
        }
    }
}

impl RenderSettings {
    /// Applies the render-setting subset of `DebugPatch`.
    ///
    /// Returns `false` for patches that target the scene instead.
    pub fn apply_patch(&mut self, patch: &DebugPatch) -> bool {
        match *patch {
            DebugPatch::SetPixelize(on) => self.post.pixelize = on,
            DebugPatch::SetPixelFraction(f) => self.post.pixel_fraction = f.clamp(0.0, 1.0),
            DebugPatch::SetBlur(on) => self.post.blur = on,
            DebugPatch::SetBlurRadius(r) => self.post.blur_radius = clamp_blur_radius(r),
            DebugPatch::SetVsync(on) => self.vsync = on,
            DebugPatch::SetShadows(on) => self.shadows.enabled = on,
            DebugPatch::SetClearColor(c) => self.clear_color = c,
            _ => return false,
        }
        log::debug!("render settings patched: {patch:?}");
        true
    }
}

/// Where the shadow-casting light sits.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum ShadowCaster {
    /// Fixed light-space eye looking at `target`.
    Fixed { position: Vec3, target: Vec3 },
    /// Follow the first directional light, backed off from the origin by `distance`.
    FirstDirectional { distance: f32 },
}

pub const DEFAULT_CASTER_POSITION: Vec3 = Vec3::new(0.0, 20.0, -20.0);

impl Default for ShadowCaster {
    fn default() -> Self {
        ShadowCaster::Fixed {
            position: DEFAULT_CASTER_POSITION,
            target: Vec3::ZERO,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShadowSettings {
    /// When false the shadow pass only clears the map (everything lit).
    pub enabled: bool,
    /// Square shadow map size in texels.
    pub resolution: u32,
    pub caster: ShadowCaster,
    /// Width and height of the orthographic light frustum.
    pub extent: f32,
    pub near: f32,
    pub far: f32,
    /// Constant depth bias, in depth-format units.
    pub depth_bias: i32,
    pub slope_bias: f32,
}

impl Default for ShadowSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            resolution: 2048,
            caster: ShadowCaster::default(),
            extent: 40.0,
            near: 0.1,
            far: 100.0,
            depth_bias: 1000,
            slope_bias: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PostSettings {
    pub pixelize: bool,
    /// Pixel block size as a fraction of the target dimension.
    pub pixel_fraction: f32,
    pub blur: bool,
    /// Box blur radius in texels, `1..=MAX_BLUR_RADIUS`.
    pub blur_radius: i32,
}

impl Default for PostSettings {
    fn default() -> Self {
        Self {
            pixelize: false,
            pixel_fraction: 0.01,
            blur: false,
            blur_radius: 3,
        }
    }
}

impl PostSettings {
    /// Block size in pixels for a target of `width` x `height`.
    pub fn pixel_block(&self, width: u32, height: u32) -> [f32; 2] {
        let axis = |dim: u32| (self.pixel_fraction * dim as f32).floor().max(1.0);
        [axis(width), axis(height)]
    }
}

pub fn clamp_blur_radius(r: i32) -> i32 {
    r.clamp(1, MAX_BLUR_RADIUS)
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── post ──────────────────────────────────────────────────────────────

    #[test]
    fn pixel_block_floors_per_axis() {
        let post = PostSettings { pixel_fraction: 0.01, ..Default::default() };
        assert_eq!(post.pixel_block(1280, 720), [12.0, 7.0]);
    }

    #[test]
    fn pixel_block_never_below_one() {
        let post = PostSettings { pixel_fraction: 0.0, ..Default::default() };
        assert_eq!(post.pixel_block(64, 64), [1.0, 1.0]);
    }

    #[test]
    fn blur_radius_clamps() {
        assert_eq!(clamp_blur_radius(0), 1);
        assert_eq!(clamp_blur_radius(7), 7);
        assert_eq!(clamp_blur_radius(99), MAX_BLUR_RADIUS);
    }

    // ── patches ───────────────────────────────────────────────────────────

    #[test]
    fn settings_patches_apply() {
        let mut s = RenderSettings::default();
        assert!(s.apply_patch(&DebugPatch::SetBlur(true)));
        assert!(s.apply_patch(&DebugPatch::SetBlurRadius(50)));
        assert!(s.apply_patch(&DebugPatch::SetVsync(false)));
        assert!(s.post.blur);
        assert_eq!(s.post.blur_radius, MAX_BLUR_RADIUS);
        assert!(!s.vsync);
    }

    #[test]
    fn scene_patches_are_not_consumed() {
        let mut s = RenderSettings::default();
        assert!(!s.apply_patch(&DebugPatch::SelectCamera(1)));
        assert_eq!(s, RenderSettings::default());
    }
}
