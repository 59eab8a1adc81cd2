//! umbra sample: shadowed scene, skybox, switchable cameras and a
//! pixelize/blur post chain, driven from the keyboard.

mod controls;
mod scene_setup;

use anyhow::Result;
use winit::dpi::PhysicalSize;

use umbra_engine::config::RenderSettings;
use umbra_engine::core::{App, AppControl, FrameCtx};
use umbra_engine::device::{Gpu, GpuInit};
use umbra_engine::input::Key;
use umbra_engine::logging::{init_logging, LoggingConfig};
use umbra_engine::render::shader::ShaderLibrary;
use umbra_engine::render::{RenderCtx, Renderer};
use umbra_engine::scene::{DebugSnapshot, Scene};
use umbra_engine::window::{Runtime, RuntimeConfig};

use controls::DebugKeys;

struct Demo {
    library: ShaderLibrary,
    scene: Scene,
    settings: RenderSettings,
    renderer: Option<Renderer>,
    keys: DebugKeys,
    titled_camera: Option<usize>,
    failed: bool,
}

impl Demo {
    fn new() -> Result<Self> {
        let library = ShaderLibrary::new();
        let config = RuntimeConfig::default();
        let aspect = (config.initial_size.width / config.initial_size.height) as f32;
        let scene = scene_setup::build(&library, aspect)?;

        Ok(Self {
            library,
            scene,
            settings: RenderSettings::default(),
            renderer: None,
            keys: DebugKeys::default(),
            titled_camera: None,
            failed: false,
        })
    }
}

impl App for Demo {
    fn on_resize(&mut self, gpu: &Gpu<'_>, size: PhysicalSize<u32>) {
        if size.width == 0 || size.height == 0 {
            return;
        }
        self.scene.resize(gpu.aspect_ratio());

        let ctx = RenderCtx::new(
            gpu.device(),
            gpu.queue(),
            gpu.surface_format(),
            (size.width, size.height),
        );

        if self.renderer.is_none() {
            match Renderer::new(&ctx, self.library.clone()) {
                Ok(r) => self.renderer = Some(r),
                Err(e) => {
                    log::error!("renderer creation failed: {e}");
                    self.failed = true;
                    return;
                }
            }
        }
        if let Some(renderer) = self.renderer.as_mut() {
            renderer.resize(&ctx, (size.width, size.height));
        }
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        if self.failed || ctx.input_frame.key_pressed(Key::Escape) {
            return AppControl::Exit;
        }

        // Debug patches land at one point per frame, before the update.
        let patches = self.keys.poll(ctx.input_frame, &self.settings);
        self.scene.apply_patches(patches, &mut self.settings);

        if std::mem::take(&mut self.keys.snapshot_requested) {
            log::info!("{:#?}", DebugSnapshot::capture(&self.scene, &self.settings, &ctx.time));
        }

        self.scene.update(ctx.time.dt, ctx.input, ctx.input_frame);

        let active = self.scene.active_camera_index();
        if self.titled_camera != Some(active) {
            if let Some(cam) = self.scene.active_camera() {
                ctx.runtime.set_title(format!("umbra - {}", cam.name));
            }
            self.titled_camera = Some(active);
        }

        let Some(renderer) = self.renderer.as_mut() else {
            return AppControl::Continue;
        };
        ctx.render_scene(renderer, &mut self.scene, &self.settings, None)
    }
}

fn main() -> Result<()> {
    let logging = if std::env::args().skip(1).any(|a| a == "--verbose" || a == "-v") {
        LoggingConfig::verbose()
    } else {
        LoggingConfig::default()
    };
    init_logging(logging);

    let demo = Demo::new()?;
    Runtime::run(RuntimeConfig::default(), GpuInit::default(), demo)
}
