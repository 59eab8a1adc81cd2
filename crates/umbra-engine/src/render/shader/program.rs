use std::borrow::Cow;
use std::sync::atomic::{AtomicU64, Ordering};

use super::ParamLayout;

static NEXT_PROGRAM_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct ProgramId(u64);

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ShaderStage {
    Vertex,
    Pixel,
}

impl ShaderStage {
    /// Bind group index owned by this stage.
    pub fn group(self) -> u32 {
        match self {
            ShaderStage::Vertex => 0,
            ShaderStage::Pixel => 1,
        }
    }

    pub fn visibility(self) -> wgpu::ShaderStages {
        match self {
            ShaderStage::Vertex => wgpu::ShaderStages::VERTEX,
            ShaderStage::Pixel => wgpu::ShaderStages::FRAGMENT,
        }
    }
}

/// Kind of a named, non-uniform shader resource.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ResourceKind {
    Texture2d,
    TextureCube,
    DepthTexture,
    FilteringSampler,
    ComparisonSampler,
}

impl ResourceKind {
    pub fn is_texture(self) -> bool {
        matches!(
            self,
            ResourceKind::Texture2d | ResourceKind::TextureCube | ResourceKind::DepthTexture
        )
    }

    pub fn is_sampler(self) -> bool {
        !self.is_texture()
    }

    pub(crate) fn binding_type(self) -> wgpu::BindingType {
        match self {
            ResourceKind::Texture2d => wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            ResourceKind::TextureCube => wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::Cube,
                multisampled: false,
            },
            ResourceKind::DepthTexture => wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Depth,
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            ResourceKind::FilteringSampler => {
                wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering)
            }
            ResourceKind::ComparisonSampler => {
                wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Comparison)
            }
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ResourceSlot {
    pub name: String,
    pub binding: u32,
    pub kind: ResourceKind,
}

/// One compiled-on-demand shader stage and its parameter contract.
///
/// The uniform block (if any) lives at binding 0 of the stage's group;
/// named resources take the bindings declared with `with_resource`.
#[derive(Debug)]
pub struct ShaderProgram {
    id: ProgramId,
    label: String,
    stage: ShaderStage,
    source: Cow<'static, str>,
    entry_point: String,
    params: ParamLayout,
    resources: Vec<ResourceSlot>,
}

impl ShaderProgram {
    pub fn new(
        label: impl Into<String>,
        stage: ShaderStage,
        source: impl Into<Cow<'static, str>>,
        entry_point: impl Into<String>,
        params: ParamLayout,
    ) -> Self {
        Self {
            id: ProgramId(NEXT_PROGRAM_ID.fetch_add(1, Ordering::Relaxed)),
            label: label.into(),
            stage,
            source: source.into(),
            entry_point: entry_point.into(),
            params,
            resources: Vec::new(),
        }
    }

    pub fn with_resource(mut self, name: &str, binding: u32, kind: ResourceKind) -> Self {
        debug_assert!(binding > 0, "binding 0 is reserved for the uniform block");
        debug_assert!(self.resources.iter().all(|r| r.binding != binding && r.name != name));
        self.resources.push(ResourceSlot {
            name: name.to_string(),
            binding,
            kind,
        });
        self
    }

    pub fn id(&self) -> ProgramId {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn entry_point(&self) -> &str {
        &self.entry_point
    }

    pub fn params(&self) -> &ParamLayout {
        &self.params
    }

    pub fn resources(&self) -> &[ResourceSlot] {
        &self.resources
    }

    pub fn resource(&self, name: &str) -> Option<&ResourceSlot> {
        self.resources.iter().find(|r| r.name == name)
    }

    /// Bind group layout entries for this stage's group.
    pub(crate) fn layout_entries(&self) -> Vec<wgpu::BindGroupLayoutEntry> {
        let visibility = self.stage.visibility();
        let mut entries = Vec::with_capacity(self.resources.len() + 1);

        if !self.params.is_empty() {
            entries.push(wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(self.params.size() as u64),
                },
                count: None,
            });
        }

        for slot in &self.resources {
            entries.push(wgpu::BindGroupLayoutEntry {
                binding: slot.binding,
                visibility,
                ty: slot.kind.binding_type(),
                count: None,
            });
        }

        entries
    }
}
