/// A single acquired back buffer plus the encoder recording into it.
///
/// Short-lived: holding the surface texture blocks acquisition of the next
/// frame. Finish it with `Gpu::present`.
pub struct GpuFrame {
    pub surface_texture: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
    pub encoder: wgpu::CommandEncoder,
}

impl GpuFrame {
    /// Back buffer size in physical pixels.
    pub fn size(&self) -> (u32, u32) {
        let t = &self.surface_texture.texture;
        (t.width(), t.height())
    }
}
