//! CPU-side frame composition.
//!
//! `FramePlan::build` walks the scene once and records every pass, draw and
//! committed parameter block the frame needs, in submission order. The
//! renderer only turns the plan into GPU commands, so ordering and hazard
//! rules can be checked (and tested) without a device.

use std::sync::Arc;

use glam::{Vec2, Vec3};

use crate::config::RenderSettings;
use crate::scene::{pack_lights, Camera, MeshId, Scene, SkyDesc};

use super::pipeline::RenderState;
use super::post::{PostChain, PostEffect, PostSlot};
use super::shader::{CommittedParams, ShaderBindings, ShaderLibrary, ShaderProgram};
use super::shadow::{shadow_light_index, LightSpace};
use super::{RenderError, SamplerRef, TextureRef};

/// Slot the scene pass renders into.
pub const SCENE_TARGET: PostSlot = PostSlot::A;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Geometry {
    Mesh(MeshId),
    /// Three vertices generated in the vertex shader; no buffers bound.
    FullscreenTriangle,
}

/// One stage's program and the parameter block committed for it.
#[derive(Debug, Clone)]
pub struct StageParams {
    pub program: Arc<ShaderProgram>,
    pub params: CommittedParams,
}

impl StageParams {
    fn commit(bindings: &ShaderBindings) -> Self {
        Self {
            program: bindings.program().clone(),
            params: bindings.copy_all_buffer_data(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DrawPacket {
    pub label: String,
    pub geometry: Geometry,
    pub state: RenderState,
    pub vs: StageParams,
    /// `None` for depth-only draws.
    pub ps: Option<StageParams>,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ColorTarget {
    BackBuffer,
    Post(PostSlot),
}

#[derive(Debug, Clone)]
pub struct ShadowPass {
    pub resolution: u32,
    pub clear_depth: f32,
    pub light_space: LightSpace,
    /// Empty when shadows are disabled or the scene has no entities.
    pub draws: Vec<DrawPacket>,
}

#[derive(Debug, Clone)]
pub struct ScenePass {
    pub target: PostSlot,
    pub clear_color: Vec3,
    pub clear_depth: f32,
    pub draws: Vec<DrawPacket>,
}

#[derive(Debug, Clone)]
pub struct FullscreenPass {
    pub effect: PostEffect,
    pub source: PostSlot,
    pub target: ColorTarget,
    pub draw: DrawPacket,
}

#[derive(Debug, Clone)]
pub enum FrameStep {
    ClearBackBuffer { color: Vec3 },
    Shadow(ShadowPass),
    Scene(ScenePass),
    Post(FullscreenPass),
    Composite(FullscreenPass),
    /// Per-frame bind groups and uniform buffers are dropped here.
    ReleaseShaderResources,
    Overlay,
    Present { vsync: bool },
}

impl FrameStep {
    fn rank(&self) -> u8 {
        match self {
            FrameStep::ClearBackBuffer { .. } => 0,
            FrameStep::Shadow(_) => 1,
            FrameStep::Scene(_) => 2,
            FrameStep::Post(_) => 3,
            FrameStep::Composite(_) => 4,
            FrameStep::ReleaseShaderResources => 5,
            FrameStep::Overlay => 6,
            FrameStep::Present { .. } => 7,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            FrameStep::ClearBackBuffer { .. } => "clear",
            FrameStep::Shadow(_) => "shadow",
            FrameStep::Scene(_) => "scene",
            FrameStep::Post(_) => "post",
            FrameStep::Composite(_) => "composite",
            FrameStep::ReleaseShaderResources => "release",
            FrameStep::Overlay => "overlay",
            FrameStep::Present { .. } => "present",
        }
    }
}

#[derive(Debug, Clone)]
pub struct FramePlan {
    pub frame_index: u64,
    pub size: (u32, u32),
    pub steps: Vec<FrameStep>,
}

impl FramePlan {
    pub fn build(
        scene: &mut Scene,
        settings: &RenderSettings,
        library: &ShaderLibrary,
        size: (u32, u32),
        frame_index: u64,
        overlay: bool,
    ) -> Result<Self, RenderError> {
        if size.0 == 0 || size.1 == 0 {
            return Err(RenderError::ZeroSizedTarget);
        }

        let parts = scene.draw_parts();
        for entity in parts.entities.iter() {
            if parts.assets.mesh(entity.mesh).is_none() {
                return Err(RenderError::UnknownMesh(entity.mesh.index()));
            }
            if parts.materials.get(entity.material.index()).is_none() {
                return Err(RenderError::UnknownMaterial(entity.material.index()));
            }
        }

        let light_space = LightSpace::from_settings(&settings.shadows, parts.lights);
        let mut steps = vec![FrameStep::ClearBackBuffer {
            color: settings.clear_color,
        }];

        // ── shadow ────────────────────────────────────────────────────────

        let mut shadow_draws = Vec::new();
        if settings.shadows.enabled {
            let state =
                RenderState::shadow_depth(settings.shadows.depth_bias, settings.shadows.slope_bias);
            for entity in parts.entities.iter_mut() {
                let mut vs = ShaderBindings::new(&library.shadow_vs);
                vs.set_matrix4x4("world", entity.transform.world_matrix());
                vs.set_matrix4x4("view", light_space.view);
                vs.set_matrix4x4("projection", light_space.projection);

                shadow_draws.push(DrawPacket {
                    label: format!("{} (shadow)", entity.name),
                    geometry: Geometry::Mesh(entity.mesh),
                    state,
                    vs: StageParams::commit(&vs),
                    ps: None,
                });
            }
        }
        steps.push(FrameStep::Shadow(ShadowPass {
            resolution: settings.shadows.resolution,
            clear_depth: 1.0,
            light_space,
            draws: shadow_draws,
        }));

        // ── scene ─────────────────────────────────────────────────────────

        let mut draws = Vec::new();
        match parts.camera {
            Some(camera) => {
                let (lights, light_count) = pack_lights(parts.lights);
                let shadowed = shadow_light_index(parts.lights);

                for entity in parts.entities.iter_mut() {
                    let Some(material) = parts.materials.get(entity.material.index()) else {
                        continue;
                    };
                    let (mut vs, mut ps) = material.bindings();

                    vs.set_matrix4x4("light_view", light_space.view);
                    vs.set_matrix4x4("light_projection", light_space.projection);
                    ps.set_shader_resource_view("shadow_map", TextureRef::ShadowMap);
                    ps.set_sampler_state("shadow_sampler", SamplerRef::ShadowComparison);
                    ps.set_float3("ambient", parts.ambient);
                    ps.set_data("lights", &lights[..]);
                    ps.set_int("light_count", light_count as i32);
                    ps.set_int("shadow_light_index", shadowed);

                    let prepared = material.prepare(&mut entity.transform, camera, &mut vs, &mut ps);

                    draws.push(DrawPacket {
                        label: entity.name.clone(),
                        geometry: Geometry::Mesh(entity.mesh),
                        state: RenderState::Opaque,
                        vs: StageParams {
                            program: vs.program().clone(),
                            params: prepared.vs,
                        },
                        ps: Some(StageParams {
                            program: ps.program().clone(),
                            params: prepared.ps,
                        }),
                    });
                }

                if let Some(sky) = parts.sky {
                    draws.push(sky_draw(sky, camera));
                }
            }
            None => log::debug!("no active camera; scene pass only clears"),
        }

        steps.push(FrameStep::Scene(ScenePass {
            target: SCENE_TARGET,
            clear_color: settings.clear_color,
            clear_depth: 1.0,
            draws,
        }));

        // ── post ──────────────────────────────────────────────────────────

        let chain = PostChain::plan(&settings.post, SCENE_TARGET, size);
        for pass in &chain.passes {
            steps.push(FrameStep::Post(FullscreenPass {
                effect: pass.effect,
                source: pass.source,
                target: ColorTarget::Post(pass.target),
                draw: fullscreen_draw(library, pass.effect, pass.source, size),
            }));
        }
        steps.push(FrameStep::Composite(FullscreenPass {
            effect: chain.composite,
            source: chain.composite_source,
            target: ColorTarget::BackBuffer,
            draw: fullscreen_draw(library, chain.composite, chain.composite_source, size),
        }));

        steps.push(FrameStep::ReleaseShaderResources);
        if overlay {
            steps.push(FrameStep::Overlay);
        }
        steps.push(FrameStep::Present {
            vsync: settings.vsync,
        });

        Ok(Self {
            frame_index,
            size,
            steps,
        })
    }

    /// Checks step order, step multiplicity and ping-pong hazards.
    pub fn validate(&self) -> Result<(), RenderError> {
        let mut last_rank = 0u8;
        let mut counts = [0usize; 8];
        let mut current: Option<PostSlot> = None;

        for step in &self.steps {
            let rank = step.rank();
            if rank < last_rank {
                return Err(RenderError::PlanOrder(format!(
                    "`{}` step after a later stage",
                    step.name()
                )));
            }
            last_rank = rank;
            counts[rank as usize] += 1;

            match step {
                FrameStep::Scene(pass) => current = Some(pass.target),
                FrameStep::Post(pass) | FrameStep::Composite(pass) => {
                    if Some(pass.source) != current {
                        return Err(RenderError::PlanOrder(format!(
                            "`{}` reads {:?}, which holds no result yet",
                            step.name(),
                            pass.source
                        )));
                    }
                    match pass.target {
                        ColorTarget::Post(slot) if slot == pass.source => {
                            return Err(RenderError::PlanOrder(format!(
                                "post pass reads and writes {slot:?}"
                            )));
                        }
                        ColorTarget::Post(slot) => current = Some(slot),
                        ColorTarget::BackBuffer if matches!(step, FrameStep::Post(_)) => {
                            return Err(RenderError::PlanOrder(
                                "post pass writes the back buffer".into(),
                            ));
                        }
                        ColorTarget::BackBuffer => {}
                    }
                }
                _ => {}
            }
        }

        const ONCE: [(usize, &str); 6] = [
            (0, "clear"),
            (1, "shadow"),
            (2, "scene"),
            (4, "composite"),
            (5, "release"),
            (7, "present"),
        ];
        for (rank, name) in ONCE {
            if counts[rank] != 1 {
                return Err(RenderError::PlanOrder(format!(
                    "expected one `{name}` step, found {}",
                    counts[rank]
                )));
            }
        }
        if counts[6] > 1 {
            return Err(RenderError::PlanOrder("more than one overlay step".into()));
        }

        Ok(())
    }

    pub fn draw_count(&self) -> usize {
        self.steps
            .iter()
            .map(|s| match s {
                FrameStep::Shadow(p) => p.draws.len(),
                FrameStep::Scene(p) => p.draws.len(),
                FrameStep::Post(_) | FrameStep::Composite(_) => 1,
                _ => 0,
            })
            .sum()
    }
}

fn sky_draw(sky: &SkyDesc, camera: &Camera) -> DrawPacket {
    let mut vs = ShaderBindings::new(&sky.vertex_shader);
    vs.set_matrix4x4("view", camera.view());
    vs.set_matrix4x4("projection", camera.projection());

    let mut ps = ShaderBindings::new(&sky.pixel_shader);
    ps.set_shader_resource_view("cube_map", TextureRef::SkyCube);
    ps.set_sampler_state("basic_sampler", SamplerRef::Asset(sky.sampler));

    DrawPacket {
        label: "sky".into(),
        geometry: Geometry::Mesh(sky.mesh),
        state: RenderState::Sky,
        vs: StageParams::commit(&vs),
        ps: Some(StageParams::commit(&ps)),
    }
}

fn fullscreen_draw(
    library: &ShaderLibrary,
    effect: PostEffect,
    source: PostSlot,
    size: (u32, u32),
) -> DrawPacket {
    let (label, program) = match effect {
        PostEffect::Pixelize { .. } => ("pixelize", &library.pixelize_ps),
        PostEffect::Blur { .. } => ("blur", &library.blur_ps),
        PostEffect::Copy => ("copy", &library.copy_ps),
    };

    let mut ps = ShaderBindings::new(program);
    ps.set_shader_resource_view("source", TextureRef::PostTarget(source));
    ps.set_sampler_state("basic_sampler", SamplerRef::LinearClamp);

    let screen = Vec2::new(size.0 as f32, size.1 as f32);
    match effect {
        PostEffect::Pixelize { block } => {
            ps.set_float2("pixel_size", Vec2::from(block));
            ps.set_float2("screen_size", screen);
        }
        PostEffect::Blur { radius } => {
            ps.set_int("blur_radius", radius);
            ps.set_float2("pixel_step", screen.recip());
        }
        PostEffect::Copy => {}
    }

    let vs = ShaderBindings::new(&library.fullscreen_vs);

    DrawPacket {
        label: label.into(),
        geometry: Geometry::FullscreenTriangle,
        state: RenderState::Fullscreen,
        vs: StageParams::commit(&vs),
        ps: Some(StageParams::commit(&ps)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::primitives;
    use crate::render::{SamplerDesc, TextureData};
    use crate::scene::{CubeSource, Entity, Light, Material, MaterialId, Transform};

    /// Two lit cubes and a directional light, no camera.
    fn populated(lib: &ShaderLibrary) -> Scene {
        let mut scene = Scene::new();
        let cube = scene.assets.add_mesh(primitives::cube(1.0));
        let tex = scene
            .assets
            .add_texture(TextureData::solid("white", [255, 255, 255, 255]));
        let sampler = scene.assets.add_sampler(SamplerDesc::default());

        let mat = scene.add_material(
            Material::new("crate", lib.lit_vs.clone(), lib.lit_ps.clone())
                .with_texture("surface_texture", TextureRef::Asset(tex))
                .with_sampler("basic_sampler", SamplerRef::Asset(sampler)),
        );
        scene.add_entity(
            Entity::new("a", cube, mat).with_transform(Transform::from_position(Vec3::X)),
        );
        scene.add_entity(Entity::new("b", cube, mat));
        scene
            .lights
            .push(Light::directional(Vec3::new(0.0, -1.0, 1.0), Vec3::ONE, 1.0));
        scene
    }

    fn lit_scene(lib: &ShaderLibrary) -> Scene {
        let mut scene = populated(lib);
        scene.add_camera(Camera::new("main", Vec3::new(0.0, 2.0, -8.0), 16.0 / 9.0));
        scene
    }

    fn build(scene: &mut Scene, settings: &RenderSettings, lib: &ShaderLibrary) -> FramePlan {
        let plan = FramePlan::build(scene, settings, lib, (640, 360), 7, false).expect("plan");
        plan.validate().expect("valid plan");
        plan
    }

    fn shadow(plan: &FramePlan) -> &ShadowPass {
        plan.steps
            .iter()
            .find_map(|s| match s {
                FrameStep::Shadow(p) => Some(p),
                _ => None,
            })
            .expect("shadow step")
    }

    fn scene_pass(plan: &FramePlan) -> &ScenePass {
        plan.steps
            .iter()
            .find_map(|s| match s {
                FrameStep::Scene(p) => Some(p),
                _ => None,
            })
            .expect("scene step")
    }

    fn fullscreen(plan: &FramePlan) -> Vec<&FullscreenPass> {
        plan.steps
            .iter()
            .filter_map(|s| match s {
                FrameStep::Post(p) | FrameStep::Composite(p) => Some(p),
                _ => None,
            })
            .collect()
    }

    // ── ordering ──────────────────────────────────────────────────────────

    #[test]
    fn steps_follow_frame_order() {
        let lib = ShaderLibrary::new();
        let mut scene = lit_scene(&lib);
        let plan = FramePlan::build(&mut scene, &RenderSettings::default(), &lib, (640, 360), 1, true)
            .expect("plan");
        plan.validate().expect("valid");

        let names: Vec<_> = plan.steps.iter().map(FrameStep::name).collect();
        assert_eq!(
            names,
            ["clear", "shadow", "scene", "composite", "release", "overlay", "present"]
        );
    }

    #[test]
    fn validate_rejects_reordered_plan() {
        let lib = ShaderLibrary::new();
        let mut scene = lit_scene(&lib);
        let mut plan = build(&mut scene, &RenderSettings::default(), &lib);
        plan.steps.swap(1, 2);
        assert!(matches!(plan.validate(), Err(RenderError::PlanOrder(_))));
    }

    #[test]
    fn validate_rejects_missing_present() {
        let lib = ShaderLibrary::new();
        let mut scene = lit_scene(&lib);
        let mut plan = build(&mut scene, &RenderSettings::default(), &lib);
        plan.steps.pop();
        assert!(plan.validate().is_err());
    }

    #[test]
    fn zero_size_is_rejected() {
        let lib = ShaderLibrary::new();
        let mut scene = lit_scene(&lib);
        let r = FramePlan::build(&mut scene, &RenderSettings::default(), &lib, (0, 10), 0, false);
        assert!(matches!(r, Err(RenderError::ZeroSizedTarget)));
    }

    #[test]
    fn unknown_material_is_reported() {
        let lib = ShaderLibrary::new();
        let mut scene = lit_scene(&lib);
        let cube = scene.entities[0].mesh;
        scene
            .entities
            .push(Entity::new("ghost", cube, MaterialId(9)));
        let r = FramePlan::build(&mut scene, &RenderSettings::default(), &lib, (8, 8), 0, false);
        assert_eq!(r.err(), Some(RenderError::UnknownMaterial(9)));
    }

    // ── shadow ────────────────────────────────────────────────────────────

    #[test]
    fn shadow_pass_draws_every_entity_depth_only() {
        let lib = ShaderLibrary::new();
        let mut scene = lit_scene(&lib);
        let plan = build(&mut scene, &RenderSettings::default(), &lib);
        let pass = shadow(&plan);
        assert_eq!(pass.draws.len(), 2);
        assert!(pass.draws.iter().all(|d| d.ps.is_none()));
        assert!(matches!(pass.draws[0].state, RenderState::ShadowDepth { constant: 1000, .. }));
    }

    #[test]
    fn shadow_pass_without_entities_only_clears() {
        let lib = ShaderLibrary::new();
        let mut scene = lit_scene(&lib);
        scene.entities.clear();
        let plan = build(&mut scene, &RenderSettings::default(), &lib);
        let pass = shadow(&plan);
        assert!(pass.draws.is_empty());
        assert_eq!(pass.clear_depth, 1.0);
    }

    #[test]
    fn disabled_shadows_still_clear_the_map() {
        let lib = ShaderLibrary::new();
        let mut scene = lit_scene(&lib);
        let mut settings = RenderSettings::default();
        settings.shadows.enabled = false;
        let plan = build(&mut scene, &settings, &lib);
        assert!(shadow(&plan).draws.is_empty());
        assert_eq!(scene_pass(&plan).draws.len(), 2);
    }

    // ── scene ─────────────────────────────────────────────────────────────

    #[test]
    fn scene_draws_bind_shadow_resources() {
        let lib = ShaderLibrary::new();
        let mut scene = lit_scene(&lib);
        let plan = build(&mut scene, &RenderSettings::default(), &lib);
        let draw = &scene_pass(&plan).draws[0];
        let ps = &draw.ps.as_ref().expect("lit draw has a pixel stage").params;
        assert_eq!(ps.texture(3), Some(TextureRef::ShadowMap));
        assert_eq!(ps.sampler(4), Some(SamplerRef::ShadowComparison));
        assert_eq!(draw.state, RenderState::Opaque);
    }

    #[test]
    fn light_intensity_changes_only_pixel_data() {
        let lib = ShaderLibrary::new();
        let settings = RenderSettings::default();

        let mut dark = lit_scene(&lib);
        dark.lights[0].intensity = 0.0;
        let mut lit = lit_scene(&lib);
        lit.lights[0].intensity = 1.0;

        let a = build(&mut dark, &settings, &lib);
        let b = build(&mut lit, &settings, &lib);

        for (da, db) in shadow(&a).draws.iter().zip(&shadow(&b).draws) {
            assert_eq!(da.vs.params.data, db.vs.params.data);
        }
        let (sa, sb) = (scene_pass(&a), scene_pass(&b));
        for (da, db) in sa.draws.iter().zip(&sb.draws) {
            assert_eq!(da.vs.params.data, db.vs.params.data);
            let pa = &da.ps.as_ref().expect("ps").params.data;
            let pb = &db.ps.as_ref().expect("ps").params.data;
            assert_ne!(pa, pb);
        }
    }

    #[test]
    fn no_camera_clears_without_drawing() {
        let lib = ShaderLibrary::new();
        let mut scene = populated(&lib);
        let plan = build(&mut scene, &RenderSettings::default(), &lib);
        assert!(scene_pass(&plan).draws.is_empty());
        assert_eq!(shadow(&plan).draws.len(), 2);
    }

    #[test]
    fn sky_is_drawn_last() {
        let lib = ShaderLibrary::new();
        let mut scene = lit_scene(&lib);
        let cube = scene.assets.add_mesh(primitives::cube(1.0));
        let face = scene.assets.add_texture(TextureData::solid("face", [0, 0, 255, 255]));
        let sampler = scene.assets.add_sampler(SamplerDesc::clamp());
        scene.sky = Some(SkyDesc {
            source: CubeSource::Faces([face; 6]),
            mesh: cube,
            sampler,
            vertex_shader: lib.sky_vs.clone(),
            pixel_shader: lib.sky_ps.clone(),
        });

        let plan = build(&mut scene, &RenderSettings::default(), &lib);
        let draws = &scene_pass(&plan).draws;
        let last = draws.last().expect("draws");
        assert_eq!(last.label, "sky");
        assert_eq!(last.state, RenderState::Sky);
        assert_eq!(
            last.ps.as_ref().expect("sky ps").params.texture(1),
            Some(TextureRef::SkyCube)
        );
    }

    // ── post ──────────────────────────────────────────────────────────────

    #[test]
    fn disabled_post_is_a_single_copy_to_back_buffer() {
        let lib = ShaderLibrary::new();
        let mut scene = lit_scene(&lib);
        let plan = build(&mut scene, &RenderSettings::default(), &lib);
        let passes = fullscreen(&plan);
        assert_eq!(passes.len(), 1);
        assert_eq!(passes[0].effect, PostEffect::Copy);
        assert_eq!(passes[0].source, SCENE_TARGET);
        assert_eq!(passes[0].target, ColorTarget::BackBuffer);
    }

    #[test]
    fn ping_pong_never_samples_its_target() {
        let lib = ShaderLibrary::new();
        let mut scene = lit_scene(&lib);
        let mut settings = RenderSettings::default();
        settings.post.pixelize = true;
        settings.post.blur = true;
        let plan = build(&mut scene, &settings, &lib);

        let passes = fullscreen(&plan);
        assert_eq!(passes.len(), 3);
        for p in &passes {
            assert_ne!(p.target, ColorTarget::Post(p.source));
            assert_eq!(
                p.draw.ps.as_ref().expect("post ps").params.texture(1),
                Some(TextureRef::PostTarget(p.source))
            );
        }
        assert_eq!(passes[2].effect, PostEffect::Pixelize { block: [1.0, 1.0] });
    }

    #[test]
    fn degenerate_toggles_still_composite_and_present() {
        let lib = ShaderLibrary::new();
        let mut scene = Scene::new();
        let mut settings = RenderSettings::default();
        settings.shadows.enabled = false;
        settings.post.blur = true;
        settings.post.blur_radius = 0;
        let plan = build(&mut scene, &settings, &lib);

        assert!(matches!(plan.steps.last(), Some(FrameStep::Present { vsync: true })));
        let passes = fullscreen(&plan);
        assert_eq!(passes[0].effect, PostEffect::Blur { radius: 1 });
        assert_eq!(passes.last().map(|p| p.target), Some(ColorTarget::BackBuffer));
    }
}
