use bytemuck::{Pod, Zeroable};
use glam::Vec3;

/// Maximum number of lights uploaded per draw.
pub const MAX_LIGHTS: usize = 8;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[repr(u32)]
pub enum LightKind {
    Directional = 0,
    Point = 1,
    Spot = 2,
}

impl LightKind {
    pub fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(LightKind::Directional),
            1 => Some(LightKind::Point),
            2 => Some(LightKind::Spot),
            _ => None,
        }
    }
}

/// GPU light record, uploaded as `array<Light, MAX_LIGHTS>`.
///
/// Field order follows WGSL uniform layout: every `vec3` is followed by a
/// scalar so the record packs to 64 bytes. Only the fields relevant to `kind`
/// are read by the shader.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Light {
    pub direction: [f32; 3],
    pub kind: u32,
    pub position: [f32; 3],
    pub range: f32,
    pub color: [f32; 3],
    pub intensity: f32,
    pub spot_falloff: f32,
    pub _pad: [f32; 3],
}

impl Light {
    pub fn directional(direction: Vec3, color: Vec3, intensity: f32) -> Self {
        Self {
            direction: direction.normalize_or_zero().to_array(),
            kind: LightKind::Directional as u32,
            color: color.to_array(),
            intensity,
            ..Self::zeroed()
        }
    }

    pub fn point(position: Vec3, range: f32, color: Vec3, intensity: f32) -> Self {
        Self {
            position: position.to_array(),
            kind: LightKind::Point as u32,
            range,
            color: color.to_array(),
            intensity,
            ..Self::zeroed()
        }
    }

    pub fn spot(position: Vec3, direction: Vec3, range: f32, falloff: f32, color: Vec3, intensity: f32) -> Self {
        Self {
            direction: direction.normalize_or_zero().to_array(),
            kind: LightKind::Spot as u32,
            position: position.to_array(),
            range,
            color: color.to_array(),
            intensity,
            spot_falloff: falloff,
            _pad: [0.0; 3],
        }
    }

    pub fn kind(&self) -> Option<LightKind> {
        LightKind::from_raw(self.kind)
    }

    pub fn direction(&self) -> Vec3 {
        Vec3::from_array(self.direction)
    }
}

/// Packs `lights` into a fixed-size upload array.
///
/// Returns the array and the number of valid entries; extra lights are dropped.
pub fn pack_lights(lights: &[Light]) -> ([Light; MAX_LIGHTS], usize) {
    let count = lights.len().min(MAX_LIGHTS);
    if lights.len() > MAX_LIGHTS {
        log::warn!("{} lights in scene, only the first {MAX_LIGHTS} are uploaded", lights.len());
    }
    let mut out = [Light::zeroed(); MAX_LIGHTS];
    out[..count].copy_from_slice(&lights[..count]);
    (out, count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_is_64_bytes_with_16_byte_stride() {
        assert_eq!(std::mem::size_of::<Light>(), 64);
        assert_eq!(std::mem::size_of::<Light>() % 16, 0);
        assert_eq!(std::mem::size_of::<[Light; MAX_LIGHTS]>(), 64 * MAX_LIGHTS);
    }

    #[test]
    fn field_offsets_match_wgsl_struct() {
        assert_eq!(std::mem::offset_of!(Light, direction), 0);
        assert_eq!(std::mem::offset_of!(Light, kind), 12);
        assert_eq!(std::mem::offset_of!(Light, position), 16);
        assert_eq!(std::mem::offset_of!(Light, range), 28);
        assert_eq!(std::mem::offset_of!(Light, color), 32);
        assert_eq!(std::mem::offset_of!(Light, intensity), 44);
        assert_eq!(std::mem::offset_of!(Light, spot_falloff), 48);
    }

    #[test]
    fn directional_normalizes() {
        let l = Light::directional(Vec3::new(0.0, -2.0, 0.0), Vec3::ONE, 1.0);
        assert_eq!(l.direction, [0.0, -1.0, 0.0]);
        assert_eq!(l.kind(), Some(LightKind::Directional));
    }

    #[test]
    fn pack_clamps_count() {
        let lights = vec![Light::point(Vec3::ZERO, 5.0, Vec3::ONE, 1.0); MAX_LIGHTS + 3];
        let (packed, count) = pack_lights(&lights);
        assert_eq!(count, MAX_LIGHTS);
        assert_eq!(packed[MAX_LIGHTS - 1], lights[0]);

        let (packed, count) = pack_lights(&lights[..2]);
        assert_eq!(count, 2);
        assert_eq!(packed[2], Light::zeroed());
    }
}
