use winit::window::Window;

use crate::config::RenderSettings;
use crate::device::Gpu;
use crate::input::{InputFrame, InputState};
use crate::render::{Overlay, RenderCtx, Renderer};
use crate::scene::Scene;
use crate::time::FrameTime;
use crate::window::RuntimeCtx;

use super::app::AppControl;

/// Per-frame context passed to `core::App::on_frame`.
///
/// Lifetimes:
/// - `'a` is the duration of the callback invocation
/// - `'w` is the window-borrow lifetime carried by `Gpu<'w>`
pub struct FrameCtx<'a, 'w> {
    pub window: &'a Window,
    pub gpu: &'a mut Gpu<'w>,
    pub input: &'a InputState,
    pub input_frame: &'a InputFrame,
    pub time: FrameTime,
    pub runtime: &'a mut RuntimeCtx,
}

impl<'a, 'w> FrameCtx<'a, 'w> {
    /// Acquires the back buffer, encodes one frame of `scene` and presents it.
    ///
    /// Minimized windows skip the frame. Surface errors are mapped through
    /// `Gpu::handle_surface_error`; only fatal ones stop the app.
    pub fn render_scene(
        &mut self,
        renderer: &mut Renderer,
        scene: &mut Scene,
        settings: &RenderSettings,
        overlay: Option<&mut dyn Overlay>,
    ) -> AppControl {
        let size = self.gpu.size();
        if size.width == 0 || size.height == 0 {
            return AppControl::Continue;
        }

        // Present mode must change before a surface texture is held.
        self.gpu.set_vsync(settings.vsync);

        let mut frame = match self.gpu.begin_frame() {
            Ok(f) => f,
            Err(err) => {
                return if self.gpu.handle_surface_error(err).keeps_running() {
                    AppControl::Continue
                } else {
                    AppControl::Exit
                };
            }
        };

        let rctx = RenderCtx::new(
            self.gpu.device(),
            self.gpu.queue(),
            self.gpu.surface_format(),
            frame.size(),
        );

        // Idempotent; rebuilds only if the back buffer disagrees with the targets.
        renderer.resize(&rctx, frame.size());

        let frame_index = self.time.frame_index;
        let result = renderer.render_frame(
            &rctx,
            &mut frame.encoder,
            &frame.view,
            scene,
            settings,
            frame_index,
            overlay,
        );

        if let Err(e) = result {
            log::error!("frame {frame_index} dropped: {e}");
            return AppControl::Continue;
        }

        self.window.pre_present_notify();
        self.gpu.present(frame);

        AppControl::Continue
    }
}
