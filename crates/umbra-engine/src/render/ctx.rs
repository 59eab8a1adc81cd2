/// Renderer-facing context (device/queue + surface format + back buffer size).
///
/// Built fresh each frame from `device::Gpu`; holds only borrows.
pub struct RenderCtx<'a> {
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
    pub surface_format: wgpu::TextureFormat,
    /// Physical pixels.
    pub size: (u32, u32),
}

impl<'a> RenderCtx<'a> {
    #[inline]
    pub fn new(
        device: &'a wgpu::Device,
        queue: &'a wgpu::Queue,
        surface_format: wgpu::TextureFormat,
        size: (u32, u32),
    ) -> Self {
        Self {
            device,
            queue,
            surface_format,
            size,
        }
    }
}
