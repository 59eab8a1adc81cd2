//! Scene model.
//!
//! `Scene` is the single owner of everything the renderer draws. It is passed
//! explicitly to the renderer each frame and mutated only between frames.

mod assets;
mod camera;
mod debug;
mod entity;
mod light;
mod material;
mod sky;
mod transform;

pub use assets::{Assets, CubeId, MeshId, SamplerId, TextureId};
pub use camera::Camera;
pub use debug::{
    CameraInfo, DebugPatch, DebugSnapshot, EntityInfo, FrameStats, MaterialInfo, MeshInfo,
};
pub use entity::Entity;
pub use light::{pack_lights, Light, LightKind, MAX_LIGHTS};
pub use material::{Material, MaterialId, PreparedMaterial};
pub use sky::{CubeSource, SkyDesc};
pub use transform::Transform;

use glam::Vec3;

use crate::config::RenderSettings;
use crate::input::{InputFrame, InputState};

#[derive(Debug, Default)]
pub struct Scene {
    pub assets: Assets,
    pub entities: Vec<Entity>,
    pub lights: Vec<Light>,
    pub ambient: Vec3,
    pub sky: Option<SkyDesc>,

    materials: Vec<Material>,
    cameras: Vec<Camera>,
    active_camera: usize,
}

pub(crate) struct DrawParts<'a> {
    pub camera: Option<&'a Camera>,
    pub entities: &'a mut [Entity],
    pub materials: &'a [Material],
    pub lights: &'a [Light],
    pub ambient: Vec3,
    pub sky: Option<&'a SkyDesc>,
    pub assets: &'a Assets,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    // ── materials ─────────────────────────────────────────────────────────

    pub fn add_material(&mut self, material: Material) -> MaterialId {
        self.materials.push(material);
        MaterialId((self.materials.len() - 1) as u32)
    }

    pub fn material(&self, id: MaterialId) -> Option<&Material> {
        self.materials.get(id.index())
    }

    pub fn material_mut(&mut self, id: MaterialId) -> Option<&mut Material> {
        self.materials.get_mut(id.index())
    }

    pub fn materials(&self) -> impl Iterator<Item = (MaterialId, &Material)> {
        self.materials
            .iter()
            .enumerate()
            .map(|(i, m)| (MaterialId(i as u32), m))
    }

    // ── entities ──────────────────────────────────────────────────────────

    pub fn add_entity(&mut self, entity: Entity) -> usize {
        self.entities.push(entity);
        self.entities.len() - 1
    }

    // ── cameras ───────────────────────────────────────────────────────────

    pub fn add_camera(&mut self, camera: Camera) -> usize {
        self.cameras.push(camera);
        self.cameras.len() - 1
    }

    pub fn cameras(&self) -> &[Camera] {
        &self.cameras
    }

    pub fn active_camera_index(&self) -> usize {
        self.active_camera
    }

    pub fn active_camera(&self) -> Option<&Camera> {
        self.cameras.get(self.active_camera)
    }

    pub fn active_camera_mut(&mut self) -> Option<&mut Camera> {
        self.cameras.get_mut(self.active_camera)
    }

    /// Makes camera `index` active; out-of-range indices are ignored.
    pub fn select_camera(&mut self, index: usize) -> bool {
        if index >= self.cameras.len() {
            log::debug!("camera {index} does not exist ({} cameras)", self.cameras.len());
            return false;
        }
        self.active_camera = index;
        true
    }

    /// Refreshes every camera's projection for a new aspect ratio.
    pub fn resize(&mut self, aspect: f32) {
        for cam in &mut self.cameras {
            cam.update_projection_matrix(aspect);
        }
    }

    // ── per-frame ─────────────────────────────────────────────────────────

    /// Disjoint borrows for building a frame: entity transforms are mutable
    /// (lazy matrices), everything else is read-only.
    pub(crate) fn draw_parts(&mut self) -> DrawParts<'_> {
        DrawParts {
            camera: self.cameras.get(self.active_camera),
            entities: &mut self.entities,
            materials: &self.materials,
            lights: &self.lights,
            ambient: self.ambient,
            sky: self.sky.as_ref(),
            assets: &self.assets,
        }
    }

    /// Moves the active camera from input.
    pub fn update(&mut self, dt: f32, input: &InputState, frame: &InputFrame) {
        if let Some(cam) = self.active_camera_mut() {
            cam.update(dt, input, frame);
        }
    }

    /// Applies debug patches in order. Render-setting patches go to `settings`.
    pub fn apply_patches<I>(&mut self, patches: I, settings: &mut RenderSettings)
    where
        I: IntoIterator<Item = DebugPatch>,
    {
        for patch in patches {
            if settings.apply_patch(&patch) {
                continue;
            }
            if !self.apply_patch(&patch) {
                log::debug!("patch ignored, target missing: {patch:?}");
            }
        }
    }

    fn apply_patch(&mut self, patch: &DebugPatch) -> bool {
        match *patch {
            DebugPatch::SelectCamera(i) => return self.select_camera(i),

            DebugPatch::SetEntityPosition { entity, position } => {
                let Some(e) = self.entities.get_mut(entity) else { return false };
                e.transform.set_position(position);
            }
            DebugPatch::SetEntityRotation { entity, rotation } => {
                let Some(e) = self.entities.get_mut(entity) else { return false };
                e.transform.set_rotation(rotation);
            }
            DebugPatch::SetEntityScale { entity, scale } => {
                let Some(e) = self.entities.get_mut(entity) else { return false };
                e.transform.set_scale(scale);
            }

            DebugPatch::SetMaterialTint { material, tint } => {
                let Some(m) = self.material_mut(material) else { return false };
                m.color_tint = tint;
            }
            DebugPatch::SetMaterialUv { material, scale, offset } => {
                let Some(m) = self.material_mut(material) else { return false };
                m.uv_scale = scale;
                m.uv_offset = offset;
            }

            DebugPatch::SetLightColor { light, color } => {
                let Some(l) = self.lights.get_mut(light) else { return false };
                l.color = color.to_array();
            }
            DebugPatch::SetLightIntensity { light, intensity } => {
                let Some(l) = self.lights.get_mut(light) else { return false };
                l.intensity = intensity.max(0.0);
            }
            DebugPatch::SetLightDirection { light, direction } => {
                let Some(l) = self.lights.get_mut(light) else { return false };
                l.direction = direction.normalize_or_zero().to_array();
            }
            DebugPatch::SetLightPosition { light, position } => {
                let Some(l) = self.lights.get_mut(light) else { return false };
                l.position = position.to_array();
            }
            DebugPatch::SetLightRange { light, range } => {
                let Some(l) = self.lights.get_mut(light) else { return false };
                l.range = range.max(0.0);
            }
            DebugPatch::SetSpotFalloff { light, falloff } => {
                let Some(l) = self.lights.get_mut(light) else { return false };
                l.spot_falloff = falloff.max(0.0);
            }

            DebugPatch::SetAmbient(c) => self.ambient = c,

            // Render-setting patches are consumed by `RenderSettings::apply_patch`.
            _ => return false,
        }
        log::debug!("scene patched: {patch:?}");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::primitives;
    use crate::render::shader::ShaderLibrary;
    use crate::time::FrameClock;
    use glam::Vec4;

    fn scene() -> Scene {
        let lib = ShaderLibrary::new();
        let mut s = Scene::new();
        let mesh = s.assets.add_mesh(primitives::cube(1.0));
        let mat = s.add_material(Material::new("m", lib.lit_vs.clone(), lib.lit_ps.clone()));
        s.add_entity(Entity::new("e", mesh, mat));
        s.add_camera(Camera::new("a", Vec3::ZERO, 1.0));
        s.add_camera(Camera::new("b", Vec3::new(0.0, 5.0, 0.0), 1.0));
        s.lights.push(Light::directional(Vec3::NEG_Y, Vec3::ONE, 1.0));
        s
    }

    // ── cameras ───────────────────────────────────────────────────────────

    #[test]
    fn select_camera_rejects_out_of_range() {
        let mut s = scene();
        assert!(s.select_camera(1));
        assert_eq!(s.active_camera().map(|c| c.name.as_str()), Some("b"));
        assert!(!s.select_camera(5));
        assert_eq!(s.active_camera_index(), 1);
    }

    #[test]
    fn resize_updates_every_camera() {
        let mut s = scene();
        s.resize(2.0);
        assert!(s.cameras().iter().all(|c| c.aspect() == 2.0));
    }

    // ── patches ───────────────────────────────────────────────────────────

    #[test]
    fn patches_apply_in_order() {
        let mut s = scene();
        let mut settings = RenderSettings::default();
        let mat = MaterialId(0);
        s.apply_patches(
            vec![
                DebugPatch::SetLightIntensity { light: 0, intensity: 0.0 },
                DebugPatch::SetLightIntensity { light: 0, intensity: 2.5 },
                DebugPatch::SetMaterialTint { material: mat, tint: Vec4::new(1.0, 0.0, 0.0, 1.0) },
                DebugPatch::SetEntityPosition { entity: 0, position: Vec3::X },
                DebugPatch::SelectCamera(1),
                DebugPatch::SetPixelize(true),
            ],
            &mut settings,
        );

        assert_eq!(s.lights[0].intensity, 2.5);
        assert_eq!(s.material(mat).map(|m| m.color_tint), Some(Vec4::new(1.0, 0.0, 0.0, 1.0)));
        assert_eq!(s.entities[0].transform.position(), Vec3::X);
        assert_eq!(s.active_camera_index(), 1);
        assert!(settings.post.pixelize);
    }

    #[test]
    fn spot_falloff_is_editable() {
        let mut s = scene();
        s.lights.push(Light::spot(Vec3::Y, Vec3::NEG_Y, 10.0, 8.0, Vec3::ONE, 1.0));
        let mut settings = RenderSettings::default();
        s.apply_patches(
            vec![
                DebugPatch::SetSpotFalloff { light: 1, falloff: 32.0 },
                DebugPatch::SetSpotFalloff { light: 1, falloff: -4.0 },
            ],
            &mut settings,
        );
        assert_eq!(s.lights[1].spot_falloff, 0.0);

        s.apply_patches(vec![DebugPatch::SetSpotFalloff { light: 1, falloff: 32.0 }], &mut settings);
        assert_eq!(s.lights[1].spot_falloff, 32.0);
    }

    #[test]
    fn patches_with_missing_targets_are_ignored() {
        let mut s = scene();
        let mut settings = RenderSettings::default();
        s.apply_patches(
            vec![
                DebugPatch::SetLightColor { light: 9, color: Vec3::ONE },
                DebugPatch::SetEntityScale { entity: 4, scale: Vec3::ONE },
            ],
            &mut settings,
        );
        assert_eq!(s.lights.len(), 1);
        assert_eq!(settings, RenderSettings::default());
    }

    // ── snapshot ──────────────────────────────────────────────────────────

    #[test]
    fn snapshot_reflects_scene_and_settings() {
        let mut s = scene();
        let mut settings = RenderSettings::default();
        s.apply_patches(vec![DebugPatch::SetBlur(true), DebugPatch::SetAmbient(Vec3::splat(0.1))], &mut settings);

        let time = FrameClock::new().tick();
        let snap = DebugSnapshot::capture(&s, &settings, &time);
        assert_eq!(snap.frame.frame_index, 0);
        assert!(snap.frame.fps > 0.0);
        assert_eq!(snap.cameras.len(), 2);
        assert_eq!(snap.entities[0].name, "e");
        assert_eq!(snap.materials[0].id, MaterialId(0));
        assert_eq!(snap.lights.len(), 1);
        assert_eq!(snap.ambient, Vec3::splat(0.1));
        assert!(snap.post.blur);
    }

    #[test]
    fn snapshot_counts_mesh_geometry() {
        let s = scene();
        let cube = primitives::cube(1.0);
        let time = FrameClock::new().tick();
        let snap = DebugSnapshot::capture(&s, &RenderSettings::default(), &time);

        assert_eq!(snap.meshes.len(), 1);
        let info = &snap.meshes[0];
        assert_eq!(info.vertices, cube.vertices.len());
        assert_eq!(info.indices, cube.indices.len());
        assert_eq!(info.triangles, 12);
    }
}
