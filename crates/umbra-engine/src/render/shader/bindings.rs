use std::sync::Arc;

use glam::{Mat4, Vec2, Vec3, Vec4};

use crate::render::{SamplerRef, TextureRef};

use super::{ParamType, ProgramId, ShaderProgram};

/// Per-draw parameter sink for one shader program.
///
/// Values are staged by name into a CPU copy of the uniform block and
/// committed with `copy_all_buffer_data`. Names the program does not declare
/// are ignored; setters report whether the name was recognized.
#[derive(Debug, Clone)]
pub struct ShaderBindings {
    program: Arc<ShaderProgram>,
    data: Vec<u8>,
    textures: Vec<(u32, TextureRef)>,
    samplers: Vec<(u32, SamplerRef)>,
}

/// Snapshot of a `ShaderBindings` taken at commit time.
#[derive(Debug, Clone, PartialEq)]
pub struct CommittedParams {
    pub program: ProgramId,
    pub data: Vec<u8>,
    pub textures: Vec<(u32, TextureRef)>,
    pub samplers: Vec<(u32, SamplerRef)>,
}

impl CommittedParams {
    pub fn texture(&self, binding: u32) -> Option<TextureRef> {
        self.textures.iter().find(|(b, _)| *b == binding).map(|(_, t)| *t)
    }

    pub fn sampler(&self, binding: u32) -> Option<SamplerRef> {
        self.samplers.iter().find(|(b, _)| *b == binding).map(|(_, s)| *s)
    }
}

impl ShaderBindings {
    pub fn new(program: &Arc<ShaderProgram>) -> Self {
        Self {
            program: Arc::clone(program),
            data: vec![0; program.params().size() as usize],
            textures: Vec::new(),
            samplers: Vec::new(),
        }
    }

    pub fn program(&self) -> &Arc<ShaderProgram> {
        &self.program
    }

    pub fn set_float(&mut self, name: &str, v: f32) -> bool {
        self.write(name, ParamType::F32, bytemuck::bytes_of(&v))
    }

    pub fn set_float2(&mut self, name: &str, v: Vec2) -> bool {
        self.write(name, ParamType::Vec2, bytemuck::bytes_of(&v.to_array()))
    }

    pub fn set_float3(&mut self, name: &str, v: Vec3) -> bool {
        self.write(name, ParamType::Vec3, bytemuck::bytes_of(&v.to_array()))
    }

    pub fn set_float4(&mut self, name: &str, v: Vec4) -> bool {
        self.write(name, ParamType::Vec4, bytemuck::bytes_of(&v.to_array()))
    }

    pub fn set_int(&mut self, name: &str, v: i32) -> bool {
        self.write(name, ParamType::I32, bytemuck::bytes_of(&v))
    }

    /// Column-major, as WGSL `mat4x4<f32>` expects.
    pub fn set_matrix4x4(&mut self, name: &str, m: Mat4) -> bool {
        self.write(name, ParamType::Mat4, bytemuck::bytes_of(&m.to_cols_array()))
    }

    /// Writes a slice of Pod records into a struct-array field.
    ///
    /// Records beyond the array length are dropped; the rest of the array keeps
    /// its previous contents.
    pub fn set_data<T: bytemuck::Pod>(&mut self, name: &str, items: &[T]) -> bool {
        let Some(field) = self.program.params().field(name) else {
            log::trace!("{}: no uniform `{name}`, skipped", self.program.label());
            return false;
        };
        let ParamType::StructArray { stride, len } = field.ty else {
            log::warn!("{}: `{name}` is not a struct array", self.program.label());
            return false;
        };
        let item_size = std::mem::size_of::<T>();
        if item_size > stride as usize {
            log::warn!(
                "{}: `{name}` record is {item_size} bytes, stride is {stride}",
                self.program.label()
            );
            return false;
        }

        let count = items.len().min(len as usize);
        if items.len() > count {
            log::warn!("{}: `{name}` holds {len} records, {} given", self.program.label(), items.len());
        }

        for (i, item) in items[..count].iter().enumerate() {
            let start = field.offset as usize + i * stride as usize;
            self.data[start..start + item_size].copy_from_slice(bytemuck::bytes_of(item));
        }
        true
    }

    pub fn set_shader_resource_view(&mut self, name: &str, texture: TextureRef) -> bool {
        let Some(slot) = self.program.resource(name).filter(|s| s.kind.is_texture()) else {
            log::trace!("{}: no texture slot `{name}`, skipped", self.program.label());
            return false;
        };
        let binding = slot.binding;
        upsert(&mut self.textures, binding, texture);
        true
    }

    pub fn set_sampler_state(&mut self, name: &str, sampler: SamplerRef) -> bool {
        let Some(slot) = self.program.resource(name).filter(|s| s.kind.is_sampler()) else {
            log::trace!("{}: no sampler slot `{name}`, skipped", self.program.label());
            return false;
        };
        let binding = slot.binding;
        upsert(&mut self.samplers, binding, sampler);
        true
    }

    /// Commits everything staged so far.
    pub fn copy_all_buffer_data(&self) -> CommittedParams {
        CommittedParams {
            program: self.program.id(),
            data: self.data.clone(),
            textures: self.textures.clone(),
            samplers: self.samplers.clone(),
        }
    }

    fn write(&mut self, name: &str, ty: ParamType, bytes: &[u8]) -> bool {
        let Some(field) = self.program.params().field(name) else {
            log::trace!("{}: no uniform `{name}`, skipped", self.program.label());
            return false;
        };
        if field.ty != ty {
            log::warn!(
                "{}: `{name}` is {:?}, got {:?}",
                self.program.label(),
                field.ty,
                ty
            );
            return false;
        }
        let start = field.offset as usize;
        self.data[start..start + bytes.len()].copy_from_slice(bytes);
        true
    }
}

fn upsert<T>(slots: &mut Vec<(u32, T)>, binding: u32, value: T) {
    match slots.iter_mut().find(|(b, _)| *b == binding) {
        Some(slot) => slot.1 = value,
        None => slots.push((binding, value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::shader::{ParamLayout, ResourceKind, ShaderStage};
    use crate::scene::{Light, TextureId};

    fn program() -> Arc<ShaderProgram> {
        let params = ParamLayout::builder()
            .vec4("tint")
            .vec3("eye")
            .i32("count")
            .mat4("world")
            .array::<Light>("lights", 2)
            .build();
        Arc::new(
            ShaderProgram::new("test", ShaderStage::Pixel, "", "fs_main", params)
                .with_resource("albedo", 1, ResourceKind::Texture2d)
                .with_resource("linear", 2, ResourceKind::FilteringSampler),
        )
    }

    fn read_f32(data: &[u8], offset: usize) -> f32 {
        bytemuck::pod_read_unaligned(&data[offset..offset + 4])
    }

    // ── values ────────────────────────────────────────────────────────────

    #[test]
    fn setters_write_at_field_offsets() {
        let p = program();
        let mut b = ShaderBindings::new(&p);
        assert!(b.set_float4("tint", Vec4::new(1.0, 2.0, 3.0, 4.0)));
        assert!(b.set_float3("eye", Vec3::new(5.0, 6.0, 7.0)));
        assert!(b.set_int("count", 3));

        let c = b.copy_all_buffer_data();
        assert_eq!(c.data.len(), p.params().size() as usize);
        assert_eq!(read_f32(&c.data, 12), 4.0);
        assert_eq!(read_f32(&c.data, 24), 7.0);
        assert_eq!(bytemuck::pod_read_unaligned::<i32>(&c.data[28..32]), 3);
    }

    #[test]
    fn unknown_names_are_noops() {
        let p = program();
        let mut b = ShaderBindings::new(&p);
        let before = b.copy_all_buffer_data();
        assert!(!b.set_float("missing", 1.0));
        assert!(!b.set_shader_resource_view("missing", TextureRef::ShadowMap));
        assert!(!b.set_sampler_state("albedo", SamplerRef::LinearClamp));
        assert_eq!(b.copy_all_buffer_data(), before);
    }

    #[test]
    fn type_mismatch_is_rejected() {
        let p = program();
        let mut b = ShaderBindings::new(&p);
        assert!(!b.set_float("tint", 1.0));
        assert!(!b.set_data("tint", &[Light::directional(Vec3::Y, Vec3::ONE, 1.0)]));
    }

    #[test]
    fn matrix_is_column_major() {
        let p = program();
        let mut b = ShaderBindings::new(&p);
        let m = Mat4::from_translation(Vec3::new(7.0, 8.0, 9.0));
        assert!(b.set_matrix4x4("world", m));
        let c = b.copy_all_buffer_data();
        // Translation lives in the fourth column.
        assert_eq!(read_f32(&c.data, 32 + 48), 7.0);
    }

    #[test]
    fn set_data_truncates_to_array_length() {
        let p = program();
        let mut b = ShaderBindings::new(&p);
        let lights = [Light::point(Vec3::ZERO, 2.0, Vec3::ONE, 0.5); 3];
        assert!(b.set_data("lights", &lights));
        let c = b.copy_all_buffer_data();
        let base = p.params().field("lights").map(|f| f.offset as usize).unwrap_or(0);
        let second: Light = bytemuck::pod_read_unaligned(&c.data[base + 64..base + 128]);
        assert_eq!(second, lights[1]);
        assert_eq!(c.data.len(), base + 128);
    }

    // ── resources ─────────────────────────────────────────────────────────

    #[test]
    fn resources_bind_by_name_and_overwrite() {
        let p = program();
        let mut b = ShaderBindings::new(&p);
        assert!(b.set_shader_resource_view("albedo", TextureRef::Asset(TextureId::from_index(0))));
        assert!(b.set_shader_resource_view("albedo", TextureRef::Asset(TextureId::from_index(4))));
        assert!(b.set_sampler_state("linear", SamplerRef::LinearClamp));

        let c = b.copy_all_buffer_data();
        assert_eq!(c.textures.len(), 1);
        assert_eq!(c.texture(1), Some(TextureRef::Asset(TextureId::from_index(4))));
        assert_eq!(c.sampler(2), Some(SamplerRef::LinearClamp));
    }

    #[test]
    fn commit_is_a_snapshot() {
        let p = program();
        let mut b = ShaderBindings::new(&p);
        b.set_int("count", 1);
        let first = b.copy_all_buffer_data();
        b.set_int("count", 2);
        assert_ne!(first, b.copy_all_buffer_data());
    }
}
