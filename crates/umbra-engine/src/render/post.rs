//! Ping-pong post-processing targets and chain planning.

use crate::config::{clamp_blur_radius, PostSettings};

use super::RenderError;

/// One of the two offscreen color targets.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum PostSlot {
    A,
    B,
}

impl PostSlot {
    pub fn other(self) -> Self {
        match self {
            PostSlot::A => PostSlot::B,
            PostSlot::B => PostSlot::A,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum PostEffect {
    /// Snap sampling to blocks of `block` pixels.
    Pixelize { block: [f32; 2] },
    /// Box blur of `radius` texels.
    Blur { radius: i32 },
    Copy,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PostPass {
    pub effect: PostEffect,
    pub source: PostSlot,
    pub target: PostSlot,
}

/// Offscreen passes of one frame plus the final composite to the back buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct PostChain {
    pub passes: Vec<PostPass>,
    pub composite: PostEffect,
    /// Target read by the composite.
    pub composite_source: PostSlot,
}

impl PostChain {
    /// Plans the chain for a scene rendered into `scene_target`.
    ///
    /// Every pass writes the slot it does not read, so no pass samples its own
    /// render target. Disabled effects leave the current slot untouched.
    pub fn plan(settings: &PostSettings, scene_target: PostSlot, size: (u32, u32)) -> Self {
        let mut current = scene_target;
        let mut passes = Vec::new();

        if settings.pixelize {
            let block = settings.pixel_block(size.0, size.1);
            passes.push(PostPass {
                effect: PostEffect::Pixelize { block },
                source: current,
                target: current.other(),
            });
            current = current.other();
        }

        if settings.blur {
            passes.push(PostPass {
                effect: PostEffect::Blur {
                    radius: clamp_blur_radius(settings.blur_radius),
                },
                source: current,
                target: current.other(),
            });
            current = current.other();
        }

        let composite = if settings.pixelize {
            PostEffect::Pixelize { block: [1.0, 1.0] }
        } else {
            PostEffect::Copy
        };

        Self {
            passes,
            composite,
            composite_source: current,
        }
    }
}

/// What a resize request means for size-dependent targets.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ResizeAction {
    Keep,
    Rebuild,
    /// Minimized; keep the old targets until a real size arrives.
    Defer,
}

pub fn resize_action(current: Option<(u32, u32)>, requested: (u32, u32)) -> ResizeAction {
    if requested.0 == 0 || requested.1 == 0 {
        return ResizeAction::Defer;
    }
    match current {
        Some(size) if size == requested => ResizeAction::Keep,
        _ => ResizeAction::Rebuild,
    }
}

pub(crate) const MAIN_DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// The two ping-pong color targets and the main depth buffer.
///
/// Always rebuilt together; never partially resized.
pub struct PostTargets {
    size: (u32, u32),
    a: wgpu::TextureView,
    b: wgpu::TextureView,
    depth: wgpu::TextureView,
}

impl PostTargets {
    pub fn new(device: &wgpu::Device, format: wgpu::TextureFormat, size: (u32, u32)) -> Result<Self, RenderError> {
        if size.0 == 0 || size.1 == 0 {
            return Err(RenderError::ZeroSizedTarget);
        }

        let extent = wgpu::Extent3d {
            width: size.0,
            height: size.1,
            depth_or_array_layers: 1,
        };

        let make = |label: &str, format: wgpu::TextureFormat, usage: wgpu::TextureUsages| {
            device
                .create_texture(&wgpu::TextureDescriptor {
                    label: Some(label),
                    size: extent,
                    mip_level_count: 1,
                    sample_count: 1,
                    dimension: wgpu::TextureDimension::D2,
                    format,
                    usage,
                    view_formats: &[],
                })
                .create_view(&wgpu::TextureViewDescriptor::default())
        };

        let color_usage = wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING;

        log::info!("post targets rebuilt at {}x{}", size.0, size.1);

        Ok(Self {
            size,
            a: make("umbra post target a", format, color_usage),
            b: make("umbra post target b", format, color_usage),
            depth: make(
                "umbra main depth",
                MAIN_DEPTH_FORMAT,
                wgpu::TextureUsages::RENDER_ATTACHMENT,
            ),
        })
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    pub fn view(&self, slot: PostSlot) -> &wgpu::TextureView {
        match slot {
            PostSlot::A => &self.a,
            PostSlot::B => &self.b,
        }
    }

    pub fn depth_view(&self) -> &wgpu::TextureView {
        &self.depth
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(pixelize: bool, blur: bool) -> PostSettings {
        PostSettings {
            pixelize,
            blur,
            ..Default::default()
        }
    }

    // ── chain ─────────────────────────────────────────────────────────────

    #[test]
    fn disabled_chain_is_a_single_copy() {
        let c = PostChain::plan(&settings(false, false), PostSlot::A, (800, 600));
        assert!(c.passes.is_empty());
        assert_eq!(c.composite, PostEffect::Copy);
        assert_eq!(c.composite_source, PostSlot::A);
    }

    #[test]
    fn both_effects_ping_pong() {
        let c = PostChain::plan(&settings(true, true), PostSlot::A, (800, 600));
        assert_eq!(c.passes.len(), 2);
        assert_eq!((c.passes[0].source, c.passes[0].target), (PostSlot::A, PostSlot::B));
        assert_eq!((c.passes[1].source, c.passes[1].target), (PostSlot::B, PostSlot::A));
        assert_eq!(c.composite_source, PostSlot::A);
        assert_eq!(c.composite, PostEffect::Pixelize { block: [1.0, 1.0] });
    }

    #[test]
    fn blur_alone_never_writes_its_source() {
        let c = PostChain::plan(&settings(false, true), PostSlot::A, (800, 600));
        assert_eq!(c.passes.len(), 1);
        assert_ne!(c.passes[0].source, c.passes[0].target);
        assert_eq!(c.composite_source, PostSlot::B);
        assert_eq!(c.composite, PostEffect::Copy);
    }

    #[test]
    fn pixelize_block_follows_fraction() {
        let s = PostSettings {
            pixelize: true,
            pixel_fraction: 0.05,
            ..Default::default()
        };
        let c = PostChain::plan(&s, PostSlot::A, (200, 100));
        assert_eq!(c.passes[0].effect, PostEffect::Pixelize { block: [10.0, 5.0] });
    }

    #[test]
    fn blur_radius_is_clamped() {
        let s = PostSettings {
            blur: true,
            blur_radius: 40,
            ..Default::default()
        };
        let c = PostChain::plan(&s, PostSlot::A, (10, 10));
        assert_eq!(c.passes[0].effect, PostEffect::Blur { radius: 20 });
    }

    // ── resize ────────────────────────────────────────────────────────────

    #[test]
    fn resize_is_idempotent() {
        assert_eq!(resize_action(None, (640, 480)), ResizeAction::Rebuild);
        assert_eq!(resize_action(Some((640, 480)), (640, 480)), ResizeAction::Keep);
        assert_eq!(resize_action(Some((640, 480)), (641, 480)), ResizeAction::Rebuild);
        assert_eq!(resize_action(Some((640, 480)), (0, 480)), ResizeAction::Defer);
    }
}
