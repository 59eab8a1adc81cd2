use super::{MaterialId, MeshId, Transform};

/// Drawable object: own transform, shared mesh and material.
#[derive(Debug, Clone)]
pub struct Entity {
    pub name: String,
    pub transform: Transform,
    pub mesh: MeshId,
    pub material: MaterialId,
}

impl Entity {
    pub fn new(name: impl Into<String>, mesh: MeshId, material: MaterialId) -> Self {
        Self {
            name: name.into(),
            transform: Transform::new(),
            mesh,
            material,
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }
}
