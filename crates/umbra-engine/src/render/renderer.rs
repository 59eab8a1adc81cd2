//! Executes a `FramePlan` against wgpu.
//!
//! Each pass runs in three phases so mutable cache updates never overlap the
//! immutable borrows a render pass holds:
//! 1. uploads: meshes, textures, samplers, sky, shadow map, pipelines
//! 2. bindings: committed parameters are written into persistent per-stage
//!    slots; bind groups are rebuilt only when their views change
//! 3. encode: begin the pass, set pipelines and groups, draw

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::RenderSettings;
use crate::scene::{Assets, MeshId, SamplerId, Scene, TextureId};

use super::pipeline::PipelineKey;
use super::plan::{ColorTarget, DrawPacket, FramePlan, FrameStep, Geometry, StageParams};
use super::post::{resize_action, ResizeAction};
use super::shader::{ProgramId, ResourceKind, ShaderLibrary, ShaderProgram};
use super::shadow::{create_comparison_sampler, ShadowMap, SHADOW_FORMAT};
use super::sky::Sky;
use super::slots::{slot_update, SlotCursor, SlotUpdate, StageSignature, StageSlot};
use super::{
    GpuTexture, Mesh, PostTargets, RenderCtx, RenderError, SamplerDesc, SamplerRef, TextureData,
    TextureRef, Vertex,
};

/// Hook for drawing on top of the composited frame (debug UI).
///
/// Runs after post-processing and before present; the back buffer already
/// holds the final image and must be loaded, not cleared.
pub trait Overlay {
    fn draw(
        &mut self,
        ctx: &RenderCtx<'_>,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
    );
}

/// Bound when a program declares a slot nobody filled.
struct Fallbacks {
    white_2d: GpuTexture,
    white_cube: GpuTexture,
    /// Cleared to 1.0: every lookup reads as lit.
    depth: wgpu::TextureView,
    linear_clamp: wgpu::Sampler,
    comparison: wgpu::Sampler,
}

struct PreparedDraw {
    key: PipelineKey,
    geometry: Geometry,
    /// Indices into `Renderer::slots`, one per stage.
    slots: Vec<usize>,
}

pub struct Renderer {
    library: ShaderLibrary,

    meshes: HashMap<MeshId, Mesh>,
    textures: HashMap<TextureId, GpuTexture>,
    samplers: HashMap<SamplerId, wgpu::Sampler>,
    modules: HashMap<ProgramId, wgpu::ShaderModule>,
    layouts: HashMap<ProgramId, wgpu::BindGroupLayout>,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,

    fallback: Fallbacks,
    shadow: Option<ShadowMap>,
    targets: Option<PostTargets>,
    target_format: Option<wgpu::TextureFormat>,
    sky: Option<Sky>,

    slots: Vec<StageSlot>,
    cursor: SlotCursor,
    /// Bumped when a renderer-owned view is recreated; stale bind groups see a
    /// different generation and are rebuilt.
    generation: u64,
}

impl Renderer {
    pub fn new(ctx: &RenderCtx<'_>, library: ShaderLibrary) -> Result<Self, RenderError> {
        let fallback = create_fallbacks(ctx)?;

        let mut renderer = Self {
            library,
            meshes: HashMap::new(),
            textures: HashMap::new(),
            samplers: HashMap::new(),
            modules: HashMap::new(),
            layouts: HashMap::new(),
            pipelines: HashMap::new(),
            fallback,
            shadow: None,
            targets: None,
            target_format: None,
            sky: None,
            slots: Vec::new(),
            cursor: SlotCursor::default(),
            generation: 0,
        };

        // Compile every built-in program up front instead of on first draw.
        let programs: Vec<_> = renderer.library.all().into_iter().cloned().collect();
        for program in &programs {
            renderer.ensure_program(ctx, program);
        }

        log::info!(
            "renderer created ({:?}, {}x{}, {} programs)",
            ctx.surface_format,
            ctx.size.0,
            ctx.size.1,
            programs.len()
        );

        Ok(renderer)
    }

    /// Size of the ping-pong targets, if built.
    pub fn target_size(&self) -> Option<(u32, u32)> {
        self.targets.as_ref().map(PostTargets::size)
    }

    /// Rebuilds size-dependent targets when `size` (or the surface format)
    /// changed. Zero sizes keep the old targets.
    pub fn resize(&mut self, ctx: &RenderCtx<'_>, size: (u32, u32)) {
        let current = if self.target_format == Some(ctx.surface_format) {
            self.target_size()
        } else {
            None
        };

        match resize_action(current, size) {
            ResizeAction::Keep => {}
            ResizeAction::Defer => log::debug!("resize to {}x{} deferred", size.0, size.1),
            ResizeAction::Rebuild => {
                // Drop first so both targets and depth are never half-replaced.
                self.targets = None;
                match PostTargets::new(ctx.device, ctx.surface_format, size) {
                    Ok(t) => {
                        self.targets = Some(t);
                        self.target_format = Some(ctx.surface_format);
                        self.generation += 1;
                    }
                    Err(e) => log::warn!("post targets not rebuilt: {e}"),
                }
            }
        }
    }

    /// Builds, validates and encodes one frame.
    #[allow(clippy::too_many_arguments)]
    pub fn render_frame(
        &mut self,
        ctx: &RenderCtx<'_>,
        encoder: &mut wgpu::CommandEncoder,
        back_buffer: &wgpu::TextureView,
        scene: &mut Scene,
        settings: &RenderSettings,
        frame_index: u64,
        overlay: Option<&mut dyn Overlay>,
    ) -> Result<(), RenderError> {
        let plan = FramePlan::build(
            scene,
            settings,
            &self.library,
            ctx.size,
            frame_index,
            overlay.is_some(),
        )?;
        plan.validate()?;
        self.execute(ctx, encoder, back_buffer, &plan, scene, overlay)
    }

    /// Encodes a validated plan.
    pub fn execute(
        &mut self,
        ctx: &RenderCtx<'_>,
        encoder: &mut wgpu::CommandEncoder,
        back_buffer: &wgpu::TextureView,
        plan: &FramePlan,
        scene: &Scene,
        mut overlay: Option<&mut dyn Overlay>,
    ) -> Result<(), RenderError> {
        check_targets(self.target_size(), plan.size)?;

        self.upload(ctx, plan, scene)?;

        let frame = plan.frame_index;
        self.cursor.reset();
        log::trace!("frame {frame}: {} draws", plan.draw_count());
        for step in &plan.steps {
            match step {
                FrameStep::ClearBackBuffer { color } => {
                    let _pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                        label: Some("umbra clear back buffer"),
                        color_attachments: &[Some(color_attachment(
                            back_buffer,
                            wgpu::LoadOp::Clear(to_color(*color)),
                        ))],
                        depth_stencil_attachment: None,
                        timestamp_writes: None,
                        occlusion_query_set: None,
                        multiview_mask: None,
                    });
                }

                FrameStep::Shadow(pass) => {
                    let draws = self.prepare_draws(ctx, &pass.draws, None, frame)?;
                    let Some(shadow) = self.shadow.as_ref() else {
                        return Err(RenderError::ShadowMapNotRendered { frame });
                    };
                    {
                        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                            label: Some("umbra shadow pass"),
                            color_attachments: &[],
                            depth_stencil_attachment: Some(depth_attachment(
                                shadow.depth_view(),
                                pass.clear_depth,
                            )),
                            timestamp_writes: None,
                            occlusion_query_set: None,
                            multiview_mask: None,
                        });
                        self.draw_all(&mut rpass, &draws);
                    }
                    if let Some(shadow) = self.shadow.as_mut() {
                        shadow.mark_rendered(frame);
                    }
                }

                FrameStep::Scene(pass) => {
                    let color = Some(ctx.surface_format);
                    let draws = self.prepare_draws(ctx, &pass.draws, color, frame)?;
                    let Some(targets) = self.targets.as_ref() else {
                        return Err(RenderError::ZeroSizedTarget);
                    };
                    {
                        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                            label: Some("umbra scene pass"),
                            color_attachments: &[Some(color_attachment(
                                targets.view(pass.target),
                                wgpu::LoadOp::Clear(to_color(pass.clear_color)),
                            ))],
                            depth_stencil_attachment: Some(depth_attachment(
                                targets.depth_view(),
                                pass.clear_depth,
                            )),
                            timestamp_writes: None,
                            occlusion_query_set: None,
                            multiview_mask: None,
                        });
                        self.draw_all(&mut rpass, &draws);
                    }
                }

                FrameStep::Post(pass) | FrameStep::Composite(pass) => {
                    let color = Some(ctx.surface_format);
                    let draws =
                        self.prepare_draws(ctx, std::slice::from_ref(&pass.draw), color, frame)?;
                    let view = match pass.target {
                        ColorTarget::BackBuffer => back_buffer,
                        ColorTarget::Post(slot) => match self.targets.as_ref() {
                            Some(t) => t.view(slot),
                            None => return Err(RenderError::ZeroSizedTarget),
                        },
                    };
                    {
                        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                            label: Some(pass.draw.label.as_str()),
                            color_attachments: &[Some(color_attachment(
                                view,
                                wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                            ))],
                            depth_stencil_attachment: None,
                            timestamp_writes: None,
                            occlusion_query_set: None,
                            multiview_mask: None,
                        });
                        self.draw_all(&mut rpass, &draws);
                    }
                }

                // Slots stay allocated; the cursor hands them out again from
                // the first one next frame.
                FrameStep::ReleaseShaderResources => {
                    log::trace!(
                        "frame {frame}: {} of {} binding slots used",
                        self.cursor.in_use(),
                        self.slots.len()
                    );
                    self.cursor.reset();
                }

                FrameStep::Overlay => {
                    if let Some(o) = overlay.as_mut() {
                        o.draw(ctx, encoder, back_buffer);
                    }
                }

                // Submission and present belong to the caller that owns the
                // surface texture; the present mode was set before acquire.
                FrameStep::Present { .. } => {}
            }
        }

        Ok(())
    }

    // ── phase 1: uploads ──────────────────────────────────────────────────

    fn upload(
        &mut self,
        ctx: &RenderCtx<'_>,
        plan: &FramePlan,
        scene: &Scene,
    ) -> Result<(), RenderError> {
        for step in &plan.steps {
            if let FrameStep::Shadow(pass) = step {
                let before = self.shadow.as_ref().map(ShadowMap::resolution);
                ShadowMap::ensure(&mut self.shadow, ctx.device, pass.resolution)?;
                if self.shadow.as_ref().map(ShadowMap::resolution) != before {
                    self.generation += 1;
                }
            }
        }

        match &scene.sky {
            Some(desc) => {
                if !self.sky.as_ref().is_some_and(|s| s.matches(desc)) {
                    self.sky = Some(Sky::new(ctx.device, ctx.queue, desc, &scene.assets)?);
                    self.generation += 1;
                }
            }
            None => self.sky = None,
        }

        for (packet, color) in packets(plan, ctx.surface_format) {
            if let Geometry::Mesh(id) = packet.geometry {
                self.ensure_mesh(ctx, &scene.assets, id)?;
            }
            for stage in std::iter::once(&packet.vs).chain(packet.ps.as_ref()) {
                self.ensure_stage_resources(ctx, &scene.assets, stage)?;
                self.ensure_program(ctx, &stage.program);
            }
            self.ensure_pipeline(ctx, packet, color);
        }

        Ok(())
    }

    fn ensure_mesh(
        &mut self,
        ctx: &RenderCtx<'_>,
        assets: &Assets,
        id: MeshId,
    ) -> Result<(), RenderError> {
        if self.meshes.contains_key(&id) {
            return Ok(());
        }
        let data = assets.mesh(id).ok_or(RenderError::UnknownMesh(id.index()))?;
        let mesh = Mesh::new(ctx.device, data)?;
        log::debug!("uploaded mesh `{}` ({} indices)", data.label, mesh.index_count());
        self.meshes.insert(id, mesh);
        Ok(())
    }

    fn ensure_stage_resources(
        &mut self,
        ctx: &RenderCtx<'_>,
        assets: &Assets,
        stage: &StageParams,
    ) -> Result<(), RenderError> {
        for (_, texture) in &stage.params.textures {
            let TextureRef::Asset(id) = *texture else { continue };
            if self.textures.contains_key(&id) {
                continue;
            }
            let data = assets
                .texture(id)
                .ok_or(RenderError::UnknownTexture(id.index()))?;
            self.textures
                .insert(id, GpuTexture::from_data(ctx.device, ctx.queue, data));
            log::debug!("uploaded texture `{}` {}x{}", data.label, data.width, data.height);
        }

        for (_, sampler) in &stage.params.samplers {
            let SamplerRef::Asset(id) = *sampler else { continue };
            if self.samplers.contains_key(&id) {
                continue;
            }
            let desc = assets
                .sampler(id)
                .ok_or(RenderError::UnknownSampler(id.index()))?;
            self.samplers
                .insert(id, desc.create(ctx.device, &format!("umbra sampler {}", id.index())));
        }

        Ok(())
    }

    fn ensure_program(&mut self, ctx: &RenderCtx<'_>, program: &Arc<ShaderProgram>) {
        let id = program.id();
        self.modules.entry(id).or_insert_with(|| {
            log::debug!("compiling shader `{}`", program.label());
            ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(program.label()),
                source: wgpu::ShaderSource::Wgsl(program.source().into()),
            })
        });
        self.layouts.entry(id).or_insert_with(|| {
            ctx.device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some(program.label()),
                    entries: &program.layout_entries(),
                })
        });
    }

    fn ensure_pipeline(
        &mut self,
        ctx: &RenderCtx<'_>,
        packet: &DrawPacket,
        color: Option<wgpu::TextureFormat>,
    ) {
        let key = pipeline_key(packet, color);
        if self.pipelines.contains_key(&key) {
            return;
        }

        let vs = &packet.vs.program;
        let Some(vs_module) = self.modules.get(&vs.id()) else { return };
        let Some(vs_layout) = self.layouts.get(&vs.id()) else { return };

        let mut group_layouts = vec![vs_layout];
        let mut fragment_module = None;
        if let Some(ps) = &packet.ps {
            let Some(module) = self.modules.get(&ps.program.id()) else { return };
            let Some(layout) = self.layouts.get(&ps.program.id()) else { return };
            group_layouts.push(layout);
            fragment_module = Some((module, ps.program.entry_point()));
        }

        let pipeline_layout = ctx
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(&packet.label),
                bind_group_layouts: &group_layouts,
                immediate_size: 0,
            });

        let mesh_buffers = [Vertex::layout()];
        let buffers: &[wgpu::VertexBufferLayout<'_>] = if key.state.uses_mesh() {
            &mesh_buffers
        } else {
            &[]
        };

        let color_targets = [key.color.map(|format| wgpu::ColorTargetState {
            format,
            blend: None,
            write_mask: wgpu::ColorWrites::ALL,
        })];

        let pipeline = ctx
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(&packet.label),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: vs_module,
                    entry_point: Some(vs.entry_point()),
                    compilation_options: Default::default(),
                    buffers,
                },
                fragment: fragment_module.map(|(module, entry)| wgpu::FragmentState {
                    module,
                    entry_point: Some(entry),
                    compilation_options: Default::default(),
                    targets: &color_targets,
                }),
                primitive: key.state.primitive(),
                depth_stencil: key.state.depth_stencil(),
                multisample: wgpu::MultisampleState::default(),
                multiview_mask: None,
                cache: None,
            });

        log::debug!("pipeline created for `{}` ({:?})", packet.label, key.state);
        self.pipelines.insert(key, pipeline);
    }

    // ── phase 2: bindings ─────────────────────────────────────────────────

    fn prepare_draws(
        &mut self,
        ctx: &RenderCtx<'_>,
        packets: &[DrawPacket],
        color: Option<wgpu::TextureFormat>,
        frame: u64,
    ) -> Result<Vec<PreparedDraw>, RenderError> {
        let mut out = Vec::with_capacity(packets.len());
        for packet in packets {
            let mut slots = Vec::with_capacity(2);
            slots.push(self.bind_stage(ctx, &packet.vs, frame)?);
            if let Some(ps) = &packet.ps {
                slots.push(self.bind_stage(ctx, ps, frame)?);
            }
            out.push(PreparedDraw {
                key: pipeline_key(packet, color),
                geometry: packet.geometry,
                slots,
            });
        }
        Ok(out)
    }

    /// Writes one stage's committed parameters into the next slot and returns
    /// its index.
    fn bind_stage(
        &mut self,
        ctx: &RenderCtx<'_>,
        stage: &StageParams,
        frame: u64,
    ) -> Result<usize, RenderError> {
        // Resolve every reference first; a missing or unrendered resource
        // fails the frame even when the cached group would still be valid.
        for &(_, r) in &stage.params.textures {
            self.texture_view(r, frame)?;
        }
        for &(_, r) in &stage.params.samplers {
            self.sampler(r)?;
        }

        let index = self.cursor.take();
        let signature = StageSignature {
            program: stage.program.id(),
            textures: stage.params.textures.clone(),
            samplers: stage.params.samplers.clone(),
            generation: self.generation,
        };

        match slot_update(self.slots.get(index).map(|s| &s.signature), &signature) {
            SlotUpdate::Write => {}
            SlotUpdate::Rebind => {
                let uniform = self.slots.get(index).and_then(|s| s.uniform.as_ref());
                let group = self.create_group(ctx, stage, uniform, frame)?;
                if let Some(slot) = self.slots.get_mut(index) {
                    slot.group = group;
                    slot.signature = signature;
                }
            }
            SlotUpdate::Rebuild => {
                let program = &stage.program;
                let uniform = (!program.params().is_empty()).then(|| {
                    ctx.device.create_buffer(&wgpu::BufferDescriptor {
                        label: Some(program.label()),
                        size: program.params().size() as u64,
                        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                        mapped_at_creation: false,
                    })
                });
                let group = self.create_group(ctx, stage, uniform.as_ref(), frame)?;
                let slot = StageSlot {
                    signature,
                    uniform,
                    group,
                };
                if index < self.slots.len() {
                    self.slots[index] = slot;
                } else {
                    self.slots.push(slot);
                    log::debug!("binding slots grown to {}", self.slots.len());
                }
            }
        }

        if let Some(buffer) = self.slots.get(index).and_then(|s| s.uniform.as_ref()) {
            ctx.queue.write_buffer(buffer, 0, &stage.params.data);
        }

        Ok(index)
    }

    fn create_group(
        &self,
        ctx: &RenderCtx<'_>,
        stage: &StageParams,
        uniform: Option<&wgpu::Buffer>,
        frame: u64,
    ) -> Result<wgpu::BindGroup, RenderError> {
        let program = &stage.program;
        let Some(layout) = self.layouts.get(&program.id()) else {
            return Err(RenderError::PlanOrder(format!(
                "program `{}` used before upload",
                program.label()
            )));
        };

        let mut entries = Vec::with_capacity(program.resources().len() + 1);
        if let Some(buffer) = uniform {
            entries.push(wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            });
        }

        for slot in program.resources() {
            let resource = if slot.kind.is_texture() {
                let view = match stage.params.texture(slot.binding) {
                    Some(r) => self.texture_view(r, frame)?,
                    None => self.fallback_view(slot.kind),
                };
                wgpu::BindingResource::TextureView(view)
            } else {
                let sampler = match stage.params.sampler(slot.binding) {
                    Some(r) => self.sampler(r)?,
                    None => self.fallback_sampler(slot.kind),
                };
                wgpu::BindingResource::Sampler(sampler)
            };
            entries.push(wgpu::BindGroupEntry {
                binding: slot.binding,
                resource,
            });
        }

        Ok(ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(program.label()),
            layout,
            entries: &entries,
        }))
    }

    fn texture_view(&self, r: TextureRef, frame: u64) -> Result<&wgpu::TextureView, RenderError> {
        match r {
            TextureRef::Asset(id) => self
                .textures
                .get(&id)
                .map(|t| &t.view)
                .ok_or(RenderError::UnknownTexture(id.index())),
            TextureRef::ShadowMap => {
                let shadow = self
                    .shadow
                    .as_ref()
                    .ok_or(RenderError::ShadowMapNotRendered { frame })?;
                shadow.state().require_rendered(frame)?;
                Ok(shadow.sample_view())
            }
            TextureRef::SkyCube => Ok(self
                .sky
                .as_ref()
                .map(Sky::view)
                .unwrap_or(&self.fallback.white_cube.view)),
            TextureRef::PostTarget(slot) => self
                .targets
                .as_ref()
                .map(|t| t.view(slot))
                .ok_or(RenderError::ZeroSizedTarget),
        }
    }

    fn sampler(&self, r: SamplerRef) -> Result<&wgpu::Sampler, RenderError> {
        match r {
            SamplerRef::Asset(id) => self
                .samplers
                .get(&id)
                .ok_or(RenderError::UnknownSampler(id.index())),
            SamplerRef::ShadowComparison => Ok(self
                .shadow
                .as_ref()
                .map(ShadowMap::sampler)
                .unwrap_or(&self.fallback.comparison)),
            SamplerRef::LinearClamp => Ok(&self.fallback.linear_clamp),
        }
    }

    fn fallback_view(&self, kind: ResourceKind) -> &wgpu::TextureView {
        match kind {
            ResourceKind::TextureCube => &self.fallback.white_cube.view,
            ResourceKind::DepthTexture => &self.fallback.depth,
            _ => &self.fallback.white_2d.view,
        }
    }

    fn fallback_sampler(&self, kind: ResourceKind) -> &wgpu::Sampler {
        match kind {
            ResourceKind::ComparisonSampler => &self.fallback.comparison,
            _ => &self.fallback.linear_clamp,
        }
    }

    // ── phase 3: encode ───────────────────────────────────────────────────

    fn draw_all(&self, rpass: &mut wgpu::RenderPass<'_>, draws: &[PreparedDraw]) {
        for draw in draws {
            let Some(pipeline) = self.pipelines.get(&draw.key) else { continue };
            rpass.set_pipeline(pipeline);
            for (group, &slot) in draw.slots.iter().enumerate() {
                if let Some(slot) = self.slots.get(slot) {
                    rpass.set_bind_group(group as u32, &slot.group, &[]);
                }
            }
            match draw.geometry {
                Geometry::Mesh(id) => {
                    if let Some(mesh) = self.meshes.get(&id) {
                        mesh.draw(rpass);
                    }
                }
                Geometry::FullscreenTriangle => rpass.draw(0..3, 0..1),
            }
        }
    }
}

/// Refuses to encode a plan sized for targets that no longer exist.
fn check_targets(targets: Option<(u32, u32)>, frame: (u32, u32)) -> Result<(), RenderError> {
    if targets == Some(frame) {
        return Ok(());
    }
    Err(RenderError::StaleTargets {
        frame,
        targets: targets.unwrap_or((0, 0)),
    })
}

/// Every draw in the plan with the color format its pass renders to.
fn packets(
    plan: &FramePlan,
    surface_format: wgpu::TextureFormat,
) -> Vec<(&DrawPacket, Option<wgpu::TextureFormat>)> {
    let mut out = Vec::new();
    for step in &plan.steps {
        match step {
            FrameStep::Shadow(p) => out.extend(p.draws.iter().map(|d| (d, None))),
            FrameStep::Scene(p) => out.extend(p.draws.iter().map(|d| (d, Some(surface_format)))),
            FrameStep::Post(p) | FrameStep::Composite(p) => {
                out.push((&p.draw, Some(surface_format)))
            }
            _ => {}
        }
    }
    out
}

fn pipeline_key(packet: &DrawPacket, color: Option<wgpu::TextureFormat>) -> PipelineKey {
    PipelineKey {
        vs: packet.vs.program.id(),
        ps: packet.ps.as_ref().map(|ps| ps.program.id()),
        state: packet.state,
        color,
    }
}

fn to_color(c: glam::Vec3) -> wgpu::Color {
    wgpu::Color {
        r: c.x as f64,
        g: c.y as f64,
        b: c.z as f64,
        a: 1.0,
    }
}

fn color_attachment(
    view: &wgpu::TextureView,
    load: wgpu::LoadOp<wgpu::Color>,
) -> wgpu::RenderPassColorAttachment<'_> {
    wgpu::RenderPassColorAttachment {
        view,
        depth_slice: None,
        resolve_target: None,
        ops: wgpu::Operations {
            load,
            store: wgpu::StoreOp::Store,
        },
    }
}

fn depth_attachment(view: &wgpu::TextureView, clear: f32) -> wgpu::RenderPassDepthStencilAttachment<'_> {
    wgpu::RenderPassDepthStencilAttachment {
        view,
        depth_ops: Some(wgpu::Operations {
            load: wgpu::LoadOp::Clear(clear),
            store: wgpu::StoreOp::Store,
        }),
        stencil_ops: None,
    }
}

fn create_fallbacks(ctx: &RenderCtx<'_>) -> Result<Fallbacks, RenderError> {
    let white = TextureData::solid("umbra white", [255, 255, 255, 255]);
    let white_2d = GpuTexture::from_data(ctx.device, ctx.queue, &white);
    let white_cube = GpuTexture::cube_from_faces(ctx.device, ctx.queue, "umbra white cube", [&white; 6])?;

    let depth_texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
        label: Some("umbra fallback depth"),
        size: wgpu::Extent3d {
            width: 1,
            height: 1,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: SHADOW_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        view_formats: &[],
    });
    let depth = depth_texture.create_view(&wgpu::TextureViewDescriptor::default());

    let mut encoder = ctx
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("umbra fallback clear"),
        });
    {
        let _pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("umbra fallback depth clear"),
            color_attachments: &[],
            depth_stencil_attachment: Some(depth_attachment(&depth, 1.0)),
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });
    }
    ctx.queue.submit(std::iter::once(encoder.finish()));

    Ok(Fallbacks {
        white_2d,
        white_cube,
        depth,
        linear_clamp: SamplerDesc::clamp().create(ctx.device, "umbra linear clamp"),
        comparison: create_comparison_sampler(ctx.device),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::primitives;
    use crate::scene::{Camera, Entity, Material};
    use glam::Vec3;

    fn plan(settings: &RenderSettings) -> FramePlan {
        let lib = ShaderLibrary::new();
        let mut scene = Scene::new();
        let cube = scene.assets.add_mesh(primitives::cube(1.0));
        let mat = scene.add_material(Material::new("m", lib.lit_vs.clone(), lib.lit_ps.clone()));
        scene.add_entity(Entity::new("cube", cube, mat));
        scene.add_camera(Camera::new("c", Vec3::new(0.0, 0.0, -5.0), 1.0));
        FramePlan::build(&mut scene, settings, &lib, (64, 64), 0, false).expect("plan")
    }

    #[test]
    fn packets_carry_the_pass_color_format() {
        let format = wgpu::TextureFormat::Bgra8UnormSrgb;
        let p = plan(&RenderSettings::default());
        let list = packets(&p, format);

        // Two shadow/scene draws plus the copy.
        assert_eq!(list.len(), 3);
        assert_eq!(list[0].1, None);
        assert!(list[1..].iter().all(|(_, c)| *c == Some(format)));
    }

    #[test]
    fn shadow_and_scene_draws_use_distinct_pipelines() {
        let p = plan(&RenderSettings::default());
        let list = packets(&p, wgpu::TextureFormat::Rgba8Unorm);
        let keys: Vec<_> = list.iter().map(|(d, c)| pipeline_key(d, *c)).collect();
        assert_ne!(keys[0], keys[1]);
        assert!(keys[0].ps.is_none());
    }

    #[test]
    fn post_draws_share_the_fullscreen_vertex_stage() {
        let mut settings = RenderSettings::default();
        settings.post.pixelize = true;
        settings.post.blur = true;
        let p = plan(&settings);
        let list = packets(&p, wgpu::TextureFormat::Rgba8Unorm);
        let fullscreen: Vec<_> = list
            .iter()
            .filter(|(d, _)| d.geometry == Geometry::FullscreenTriangle)
            .collect();
        assert_eq!(fullscreen.len(), 3);
        let vs = fullscreen[0].0.vs.program.id();
        assert!(fullscreen.iter().all(|(d, _)| d.vs.program.id() == vs));
    }

    #[test]
    fn plan_size_must_match_the_targets() {
        assert_eq!(check_targets(Some((64, 64)), (64, 64)), Ok(()));
        assert_eq!(
            check_targets(Some((64, 64)), (128, 72)),
            Err(RenderError::StaleTargets {
                frame: (128, 72),
                targets: (64, 64),
            })
        );
    }

    #[test]
    fn missing_targets_are_stale() {
        assert_eq!(
            check_targets(None, (64, 64)),
            Err(RenderError::StaleTargets {
                frame: (64, 64),
                targets: (0, 0),
            })
        );
    }

    #[test]
    fn clear_color_converts_channels() {
        let c = to_color(Vec3::new(0.25, 0.5, 1.0));
        assert_eq!((c.r, c.g, c.b, c.a), (0.25, 0.5, 1.0, 1.0));
    }
}
