use std::sync::Arc;

use crate::scene::{Light, MAX_LIGHTS};

use super::{ParamLayout, ResourceKind, ShaderProgram, ShaderStage};

/// Built-in shader programs.
///
/// Programs are shared by `Arc`; materials hold clones of the lit pair.
#[derive(Debug, Clone)]
pub struct ShaderLibrary {
    pub lit_vs: Arc<ShaderProgram>,
    pub lit_ps: Arc<ShaderProgram>,
    pub shadow_vs: Arc<ShaderProgram>,
    pub sky_vs: Arc<ShaderProgram>,
    pub sky_ps: Arc<ShaderProgram>,
    pub fullscreen_vs: Arc<ShaderProgram>,
    pub pixelize_ps: Arc<ShaderProgram>,
    pub blur_ps: Arc<ShaderProgram>,
    pub copy_ps: Arc<ShaderProgram>,
}

impl Default for ShaderLibrary {
    fn default() -> Self {
        Self::new()
    }
}

impl ShaderLibrary {
    pub fn new() -> Self {
        use ResourceKind::*;
        use ShaderStage::*;

        let lit_vs = ShaderProgram::new(
            "lit vs",
            Vertex,
            include_str!("../shaders/lit_vs.wgsl"),
            "vs_main",
            ParamLayout::builder()
                .mat4("world")
                .mat4("world_inverse_transpose")
                .mat4("view")
                .mat4("projection")
                .mat4("light_view")
                .mat4("light_projection")
                .build(),
        );

        let lit_ps = ShaderProgram::new(
            "lit ps",
            Pixel,
            include_str!("../shaders/lit_ps.wgsl"),
            "fs_main",
            ParamLayout::builder()
                .vec4("color_tint")
                .vec2("uv_scale")
                .vec2("uv_offset")
                .vec3("camera_position")
                .i32("light_count")
                .vec3("ambient")
                .i32("shadow_light_index")
                .array::<Light>("lights", MAX_LIGHTS as u32)
                .build(),
        )
        .with_resource("surface_texture", 1, Texture2d)
        .with_resource("basic_sampler", 2, FilteringSampler)
        .with_resource("shadow_map", 3, DepthTexture)
        .with_resource("shadow_sampler", 4, ComparisonSampler);

        let shadow_vs = ShaderProgram::new(
            "shadow vs",
            Vertex,
            include_str!("../shaders/shadow_vs.wgsl"),
            "vs_main",
            ParamLayout::builder()
                .mat4("world")
                .mat4("view")
                .mat4("projection")
                .build(),
        );

        let sky_vs = ShaderProgram::new(
            "sky vs",
            Vertex,
            include_str!("../shaders/sky_vs.wgsl"),
            "vs_main",
            ParamLayout::builder().mat4("view").mat4("projection").build(),
        );

        let sky_ps = ShaderProgram::new(
            "sky ps",
            Pixel,
            include_str!("../shaders/sky_ps.wgsl"),
            "fs_main",
            ParamLayout::empty(),
        )
        .with_resource("cube_map", 1, TextureCube)
        .with_resource("basic_sampler", 2, FilteringSampler);

        let fullscreen_vs = ShaderProgram::new(
            "fullscreen vs",
            Vertex,
            include_str!("../shaders/fullscreen_vs.wgsl"),
            "vs_main",
            ParamLayout::empty(),
        );

        let pixelize_ps = ShaderProgram::new(
            "pixelize ps",
            Pixel,
            include_str!("../shaders/pixelize_ps.wgsl"),
            "fs_main",
            ParamLayout::builder().vec2("pixel_size").vec2("screen_size").build(),
        )
        .with_resource("source", 1, Texture2d)
        .with_resource("basic_sampler", 2, FilteringSampler);

        let blur_ps = ShaderProgram::new(
            "blur ps",
            Pixel,
            include_str!("../shaders/blur_ps.wgsl"),
            "fs_main",
            ParamLayout::builder().i32("blur_radius").vec2("pixel_step").build(),
        )
        .with_resource("source", 1, Texture2d)
        .with_resource("basic_sampler", 2, FilteringSampler);

        let copy_ps = ShaderProgram::new(
            "copy ps",
            Pixel,
            include_str!("../shaders/copy_ps.wgsl"),
            "fs_main",
            ParamLayout::empty(),
        )
        .with_resource("source", 1, Texture2d);

        Self {
            lit_vs: Arc::new(lit_vs),
            lit_ps: Arc::new(lit_ps),
            shadow_vs: Arc::new(shadow_vs),
            sky_vs: Arc::new(sky_vs),
            sky_ps: Arc::new(sky_ps),
            fullscreen_vs: Arc::new(fullscreen_vs),
            pixelize_ps: Arc::new(pixelize_ps),
            blur_ps: Arc::new(blur_ps),
            copy_ps: Arc::new(copy_ps),
        }
    }

    pub fn all(&self) -> [&Arc<ShaderProgram>; 9] {
        [
            &self.lit_vs,
            &self.lit_ps,
            &self.shadow_vs,
            &self.sky_vs,
            &self.sky_ps,
            &self.fullscreen_vs,
            &self.pixelize_ps,
            &self.blur_ps,
            &self.copy_ps,
        ]
    }
}
