//! Debug tooling: explicit mutation commands and read-only snapshots.
//!
//! Tools read a `DebugSnapshot` each frame and answer with `DebugPatch`es,
//! which are applied at the start of the next update.

use glam::{Vec2, Vec3, Vec4};

use crate::config::{PostSettings, RenderSettings};
use crate::time::FrameTime;

use super::{Light, MaterialId, MeshId, Scene};

/// One state change requested by debug tooling.
#[derive(Debug, Clone, PartialEq)]
pub enum DebugPatch {
    SelectCamera(usize),

    SetEntityPosition { entity: usize, position: Vec3 },
    SetEntityRotation { entity: usize, rotation: Vec3 },
    SetEntityScale { entity: usize, scale: Vec3 },

    SetMaterialTint { material: MaterialId, tint: Vec4 },
    SetMaterialUv { material: MaterialId, scale: Vec2, offset: Vec2 },

    SetLightColor { light: usize, color: Vec3 },
    SetLightIntensity { light: usize, intensity: f32 },
    SetLightDirection { light: usize, direction: Vec3 },
    SetLightPosition { light: usize, position: Vec3 },
    SetLightRange { light: usize, range: f32 },
    SetSpotFalloff { light: usize, falloff: f32 },

    SetAmbient(Vec3),
    SetClearColor(Vec3),

    SetPixelize(bool),
    SetPixelFraction(f32),
    SetBlur(bool),
    SetBlurRadius(i32),
    SetVsync(bool),
    SetShadows(bool),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CameraInfo {
    pub name: String,
    pub position: Vec3,
    pub rotation: Vec3,
    pub fov: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EntityInfo {
    pub name: String,
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MaterialInfo {
    pub id: MaterialId,
    pub name: String,
    pub color_tint: Vec4,
    pub uv_scale: Vec2,
    pub uv_offset: Vec2,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MeshInfo {
    pub id: MeshId,
    pub label: String,
    pub vertices: usize,
    pub indices: usize,
    pub triangles: usize,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FrameStats {
    pub frame_index: u64,
    /// Seconds.
    pub dt: f32,
    /// Instantaneous, from `dt`.
    pub fps: f32,
    /// Seconds since the clock started.
    pub elapsed: f32,
}

impl From<&FrameTime> for FrameStats {
    fn from(t: &FrameTime) -> Self {
        Self {
            frame_index: t.frame_index,
            dt: t.dt,
            fps: if t.dt > 0.0 { 1.0 / t.dt } else { 0.0 },
            elapsed: t.total,
        }
    }
}

/// Everything a debug inspector displays, captured once per frame.
#[derive(Debug, Clone, PartialEq)]
pub struct DebugSnapshot {
    pub frame: FrameStats,
    pub meshes: Vec<MeshInfo>,
    pub cameras: Vec<CameraInfo>,
    pub active_camera: usize,
    pub entities: Vec<EntityInfo>,
    pub materials: Vec<MaterialInfo>,
    pub lights: Vec<Light>,
    pub ambient: Vec3,
    pub post: PostSettings,
    pub shadows: bool,
    pub vsync: bool,
}

impl DebugSnapshot {
    pub fn capture(scene: &Scene, settings: &RenderSettings, time: &FrameTime) -> Self {
        Self {
            frame: FrameStats::from(time),
            meshes: scene
                .assets
                .meshes()
                .map(|(id, m)| MeshInfo {
                    id,
                    label: m.label.clone(),
                    vertices: m.vertices.len(),
                    indices: m.indices.len(),
                    triangles: m.indices.len() / 3,
                })
                .collect(),
            cameras: scene
                .cameras()
                .iter()
                .map(|c| CameraInfo {
                    name: c.name.clone(),
                    position: c.position(),
                    rotation: c.transform.rotation(),
                    fov: c.fov,
                })
                .collect(),
            active_camera: scene.active_camera_index(),
            entities: scene
                .entities
                .iter()
                .map(|e| EntityInfo {
                    name: e.name.clone(),
                    position: e.transform.position(),
                    rotation: e.transform.rotation(),
                    scale: e.transform.scale(),
                })
                .collect(),
            materials: scene
                .materials()
                .map(|(id, m)| MaterialInfo {
                    id,
                    name: m.name.clone(),
                    color_tint: m.color_tint,
                    uv_scale: m.uv_scale,
                    uv_offset: m.uv_offset,
                })
                .collect(),
            lights: scene.lights.clone(),
            ambient: scene.ambient,
            post: settings.post.clone(),
            shadows: settings.shadows.enabled,
            vsync: settings.vsync,
        }
    }
}
