//! Shadow map: depth-only render from the light, sampled by the lit pass.

use glam::{Mat4, Vec3};

use crate::config::{ShadowCaster, ShadowSettings, DEFAULT_CASTER_POSITION};
use crate::scene::{Light, LightKind};

use super::RenderError;

pub(crate) const SHADOW_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Light-space view and orthographic projection.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LightSpace {
    pub view: Mat4,
    pub projection: Mat4,
}

impl LightSpace {
    pub fn from_settings(settings: &ShadowSettings, lights: &[Light]) -> Self {
        let view = match settings.caster {
            ShadowCaster::Fixed { position, target } => {
                look_to(position, target - position)
            }
            ShadowCaster::FirstDirectional { distance } => match first_directional(lights) {
                Some((_, light)) => {
                    let dir = light.direction();
                    look_to(-dir * distance, dir)
                }
                None => {
                    log::debug!("no directional light to cast shadows, using the fixed caster");
                    look_to(DEFAULT_CASTER_POSITION, -DEFAULT_CASTER_POSITION)
                }
            },
        };

        let h = settings.extent * 0.5;
        let projection = Mat4::orthographic_lh(-h, h, -h, h, settings.near, settings.far);

        Self { view, projection }
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }
}

/// Index of the light whose contribution is shadowed, or -1.
pub fn shadow_light_index(lights: &[Light]) -> i32 {
    first_directional(lights).map(|(i, _)| i as i32).unwrap_or(-1)
}

fn first_directional(lights: &[Light]) -> Option<(usize, &Light)> {
    lights
        .iter()
        .enumerate()
        .find(|(_, l)| l.kind() == Some(LightKind::Directional))
}

fn look_to(eye: Vec3, dir: Vec3) -> Mat4 {
    let dir = dir.normalize_or(Vec3::NEG_Y);
    // Straight up/down needs another up vector.
    let up = if dir.abs_diff_eq(Vec3::Y, 1e-4) || dir.abs_diff_eq(Vec3::NEG_Y, 1e-4) {
        Vec3::Z
    } else {
        Vec3::Y
    };
    Mat4::look_to_lh(eye, dir, up)
}

/// Per-frame lifecycle of the shadow map.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ShadowState {
    Uninitialized,
    /// Resources exist; nothing rendered for the current frame yet.
    Configured,
    Rendered { frame: u64 },
}

impl ShadowState {
    pub fn mark_rendered(&mut self, frame: u64) {
        *self = ShadowState::Rendered { frame };
    }

    /// Sampling is allowed only after the map was rendered in `frame`.
    pub fn require_rendered(&self, frame: u64) -> Result<(), RenderError> {
        match *self {
            ShadowState::Rendered { frame: f } if f == frame => Ok(()),
            _ => Err(RenderError::ShadowMapNotRendered { frame }),
        }
    }
}

/// Depth texture, views and comparison sampler.
pub struct ShadowMap {
    resolution: u32,
    depth_view: wgpu::TextureView,
    sample_view: wgpu::TextureView,
    sampler: wgpu::Sampler,
    state: ShadowState,
}

impl ShadowMap {
    pub fn new(device: &wgpu::Device, resolution: u32) -> Result<Self, RenderError> {
        if resolution == 0 {
            return Err(RenderError::ZeroSizedTarget);
        }

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("umbra shadow map"),
            size: wgpu::Extent3d {
                width: resolution,
                height: resolution,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: SHADOW_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });

        let depth_view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("umbra shadow depth view"),
            ..Default::default()
        });
        let sample_view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("umbra shadow sample view"),
            aspect: wgpu::TextureAspect::DepthOnly,
            ..Default::default()
        });

        let sampler = create_comparison_sampler(device);

        log::info!("shadow map configured at {resolution}x{resolution}");

        Ok(Self {
            resolution,
            depth_view,
            sample_view,
            sampler,
            state: ShadowState::Configured,
        })
    }

    /// Rebuilds when the requested resolution changed.
    pub fn ensure(slot: &mut Option<ShadowMap>, device: &wgpu::Device, resolution: u32) -> Result<(), RenderError> {
        if slot.as_ref().map(|s| s.resolution) != Some(resolution) {
            *slot = Some(ShadowMap::new(device, resolution)?);
        }
        Ok(())
    }

    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    pub fn depth_view(&self) -> &wgpu::TextureView {
        &self.depth_view
    }

    pub fn sample_view(&self) -> &wgpu::TextureView {
        &self.sample_view
    }

    pub fn sampler(&self) -> &wgpu::Sampler {
        &self.sampler
    }

    pub fn state(&self) -> ShadowState {
        self.state
    }

    pub fn mark_rendered(&mut self, frame: u64) {
        self.state.mark_rendered(frame);
    }
}

/// `Less` comparison, clamped. Out-of-range lookups are resolved in the shader.
pub(crate) fn create_comparison_sampler(device: &wgpu::Device) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("umbra shadow sampler"),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        compare: Some(wgpu::CompareFunction::Less),
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── light space ───────────────────────────────────────────────────────

    #[test]
    fn fixed_caster_sees_origin_at_center() {
        let settings = ShadowSettings::default();
        let ls = LightSpace::from_settings(&settings, &[]);
        let p = ls.view_projection().project_point3(Vec3::ZERO);
        assert!(p.x.abs() < 1e-4 && p.y.abs() < 1e-4, "{p:?}");
        assert!(p.z > 0.0 && p.z < 1.0);
    }

    #[test]
    fn first_directional_follows_light() {
        let settings = ShadowSettings {
            caster: ShadowCaster::FirstDirectional { distance: 30.0 },
            ..Default::default()
        };
        let lights = [
            Light::point(Vec3::ONE, 5.0, Vec3::ONE, 1.0),
            Light::directional(Vec3::new(1.0, -1.0, 0.0), Vec3::ONE, 1.0),
        ];
        let ls = LightSpace::from_settings(&settings, &lights);

        // A point further along the light direction is deeper.
        let dir = lights[1].direction();
        let near = ls.view_projection().project_point3(Vec3::ZERO);
        let far = ls.view_projection().project_point3(dir * 5.0);
        assert!(far.z > near.z);
        assert_eq!(shadow_light_index(&lights), 1);
    }

    #[test]
    fn straight_down_light_is_well_formed() {
        let settings = ShadowSettings {
            caster: ShadowCaster::FirstDirectional { distance: 10.0 },
            ..Default::default()
        };
        let lights = [Light::directional(Vec3::NEG_Y, Vec3::ONE, 1.0)];
        let ls = LightSpace::from_settings(&settings, &lights);
        assert!(ls.view.is_finite());
    }

    #[test]
    fn no_directional_light_means_no_shadowed_light() {
        assert_eq!(shadow_light_index(&[Light::point(Vec3::ZERO, 1.0, Vec3::ONE, 1.0)]), -1);
    }

    // ── state ─────────────────────────────────────────────────────────────

    #[test]
    fn sampling_requires_render_in_same_frame() {
        let mut s = ShadowState::Configured;
        assert_eq!(s.require_rendered(3), Err(RenderError::ShadowMapNotRendered { frame: 3 }));
        s.mark_rendered(3);
        assert!(s.require_rendered(3).is_ok());
        assert!(s.require_rendered(4).is_err());
        assert!(ShadowState::Uninitialized.require_rendered(0).is_err());
    }
}
