use winit::dpi::PhysicalSize;
use winit::event::WindowEvent;

use crate::device::Gpu;

use super::ctx::FrameCtx;

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Application contract implemented by higher layers.
pub trait App {
    /// Called for every window event, before the runtime handles it.
    fn on_window_event(&mut self, event: &WindowEvent) -> AppControl {
        let _ = event;
        AppControl::Continue
    }

    /// Called after the surface was reconfigured for a new drawable size.
    ///
    /// Size-dependent resources (render targets, projections) are rebuilt here.
    fn on_resize(&mut self, gpu: &Gpu<'_>, size: PhysicalSize<u32>) {
        let _ = (gpu, size);
    }

    /// Called once per rendered frame.
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl;
}
