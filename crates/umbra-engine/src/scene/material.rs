use std::collections::HashMap;
use std::sync::Arc;

use glam::{Vec2, Vec4};

use crate::render::shader::{CommittedParams, ShaderBindings, ShaderProgram};
use crate::render::{SamplerRef, TextureRef};

use super::{Camera, Transform};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct MaterialId(pub(crate) u32);

impl MaterialId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Shader pair plus per-surface parameters.
///
/// Texture and sampler names must match the pixel program's slots; unknown
/// names are skipped when the material is prepared.
#[derive(Debug, Clone)]
pub struct Material {
    pub name: String,
    pub color_tint: Vec4,
    pub uv_scale: Vec2,
    pub uv_offset: Vec2,
    pub vertex_shader: Arc<ShaderProgram>,
    pub pixel_shader: Arc<ShaderProgram>,
    pub textures: HashMap<String, TextureRef>,
    pub samplers: HashMap<String, SamplerRef>,
}

/// Both stages' parameters for one draw, committed.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedMaterial {
    pub vs: CommittedParams,
    pub ps: CommittedParams,
}

impl Material {
    pub fn new(
        name: impl Into<String>,
        vertex_shader: Arc<ShaderProgram>,
        pixel_shader: Arc<ShaderProgram>,
    ) -> Self {
        Self {
            name: name.into(),
            color_tint: Vec4::ONE,
            uv_scale: Vec2::ONE,
            uv_offset: Vec2::ZERO,
            vertex_shader,
            pixel_shader,
            textures: HashMap::new(),
            samplers: HashMap::new(),
        }
    }

    pub fn with_tint(mut self, tint: Vec4) -> Self {
        self.color_tint = tint;
        self
    }

    pub fn with_uv(mut self, scale: Vec2, offset: Vec2) -> Self {
        self.uv_scale = scale;
        self.uv_offset = offset;
        self
    }

    pub fn with_texture(mut self, name: &str, texture: TextureRef) -> Self {
        self.textures.insert(name.to_string(), texture);
        self
    }

    pub fn with_sampler(mut self, name: &str, sampler: SamplerRef) -> Self {
        self.samplers.insert(name.to_string(), sampler);
        self
    }

    /// Fresh binding sinks for this material's shader pair.
    pub fn bindings(&self) -> (ShaderBindings, ShaderBindings) {
        (
            ShaderBindings::new(&self.vertex_shader),
            ShaderBindings::new(&self.pixel_shader),
        )
    }

    /// Pushes per-object and per-surface values, commits each stage once, then
    /// binds the texture and sampler tables by name.
    ///
    /// Anything already staged in `vs` / `ps` (lights, shadow data) is part
    /// of the commit.
    pub fn prepare(
        &self,
        transform: &mut Transform,
        camera: &Camera,
        vs: &mut ShaderBindings,
        ps: &mut ShaderBindings,
    ) -> PreparedMaterial {
        vs.set_matrix4x4("world", transform.world_matrix());
        vs.set_matrix4x4("world_inverse_transpose", transform.world_inverse_transpose_matrix());
        vs.set_matrix4x4("view", camera.view());
        vs.set_matrix4x4("projection", camera.projection());

        ps.set_float4("color_tint", self.color_tint);
        ps.set_float2("uv_scale", self.uv_scale);
        ps.set_float2("uv_offset", self.uv_offset);
        ps.set_float3("camera_position", camera.position());

        for (name, texture) in &self.textures {
            ps.set_shader_resource_view(name, *texture);
        }
        for (name, sampler) in &self.samplers {
            ps.set_sampler_state(name, *sampler);
        }

        PreparedMaterial {
            vs: vs.copy_all_buffer_data(),
            ps: ps.copy_all_buffer_data(),
        }
    }
}
