use crate::render::{CubeData, MeshData, SamplerDesc, TextureData};

macro_rules! arena_id {
    ($name:ident) => {
        #[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
        pub struct $name(u32);

        impl $name {
            pub fn from_index(index: usize) -> Self {
                Self(index as u32)
            }

            pub fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}

arena_id!(MeshId);
arena_id!(TextureId);
arena_id!(SamplerId);
arena_id!(CubeId);

/// Append-only CPU asset arenas.
///
/// Entries are immutable once added; the renderer uploads each id once and
/// shares the GPU copy between every user.
#[derive(Debug, Default)]
pub struct Assets {
    meshes: Vec<MeshData>,
    textures: Vec<TextureData>,
    samplers: Vec<SamplerDesc>,
    cubes: Vec<CubeData>,
}

impl Assets {
    pub fn add_mesh(&mut self, mesh: MeshData) -> MeshId {
        self.meshes.push(mesh);
        MeshId::from_index(self.meshes.len() - 1)
    }

    pub fn add_texture(&mut self, texture: TextureData) -> TextureId {
        self.textures.push(texture);
        TextureId::from_index(self.textures.len() - 1)
    }

    pub fn add_sampler(&mut self, sampler: SamplerDesc) -> SamplerId {
        self.samplers.push(sampler);
        SamplerId::from_index(self.samplers.len() - 1)
    }

    pub fn add_cube(&mut self, cube: CubeData) -> CubeId {
        self.cubes.push(cube);
        CubeId::from_index(self.cubes.len() - 1)
    }

    pub fn mesh(&self, id: MeshId) -> Option<&MeshData> {
        self.meshes.get(id.index())
    }

    pub fn texture(&self, id: TextureId) -> Option<&TextureData> {
        self.textures.get(id.index())
    }

    pub fn sampler(&self, id: SamplerId) -> Option<&SamplerDesc> {
        self.samplers.get(id.index())
    }

    pub fn cube(&self, id: CubeId) -> Option<&CubeData> {
        self.cubes.get(id.index())
    }

    pub fn meshes(&self) -> impl Iterator<Item = (MeshId, &MeshData)> {
        self.meshes
            .iter()
            .enumerate()
            .map(|(i, m)| (MeshId::from_index(i), m))
    }
}
