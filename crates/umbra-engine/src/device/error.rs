/// What the frame loop does after `get_current_texture` fails.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceErrorAction {
    /// Lost or outdated swapchain, reconfigured in place; the next frame
    /// acquires again.
    Reconfigured,
    /// Timeout or driver hiccup; this frame is dropped.
    SkipFrame,
    /// Out of memory; the app exits.
    Fatal,
}

impl SurfaceErrorAction {
    pub fn classify(err: &wgpu::SurfaceError) -> Self {
        match err {
            wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => Self::Reconfigured,
            wgpu::SurfaceError::OutOfMemory => Self::Fatal,
            wgpu::SurfaceError::Timeout | wgpu::SurfaceError::Other => Self::SkipFrame,
        }
    }

    /// `false` only for errors the renderer cannot recover from.
    pub fn keeps_running(self) -> bool {
        self != Self::Fatal
    }
}
