//! Uniform block layout following WGSL `uniform` address-space rules.

/// Type of a named uniform field.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ParamType {
    F32,
    I32,
    Vec2,
    Vec3,
    Vec4,
    Mat4,
    /// `array<S, len>` of a host-side Pod struct; stride is a multiple of 16.
    StructArray { stride: u32, len: u32 },
}

impl ParamType {
    pub fn align(self) -> u32 {
        match self {
            ParamType::F32 | ParamType::I32 => 4,
            ParamType::Vec2 => 8,
            ParamType::Vec3 | ParamType::Vec4 | ParamType::Mat4 => 16,
            ParamType::StructArray { .. } => 16,
        }
    }

    pub fn size(self) -> u32 {
        match self {
            ParamType::F32 | ParamType::I32 => 4,
            ParamType::Vec2 => 8,
            ParamType::Vec3 => 12,
            ParamType::Vec4 => 16,
            ParamType::Mat4 => 64,
            ParamType::StructArray { stride, len } => stride * len,
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ParamField {
    pub name: String,
    pub ty: ParamType,
    pub offset: u32,
}

/// Named fields of one uniform block with their byte offsets.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct ParamLayout {
    fields: Vec<ParamField>,
    size: u32,
}

impl ParamLayout {
    pub fn builder() -> ParamLayoutBuilder {
        ParamLayoutBuilder::default()
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn field(&self, name: &str) -> Option<&ParamField> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn fields(&self) -> &[ParamField] {
        &self.fields
    }

    /// Block size in bytes, a multiple of 16.
    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct ParamLayoutBuilder {
    fields: Vec<ParamField>,
    cursor: u32,
}

impl ParamLayoutBuilder {
    pub fn f32(self, name: &str) -> Self {
        self.push(name, ParamType::F32)
    }

    pub fn i32(self, name: &str) -> Self {
        self.push(name, ParamType::I32)
    }

    pub fn vec2(self, name: &str) -> Self {
        self.push(name, ParamType::Vec2)
    }

    pub fn vec3(self, name: &str) -> Self {
        self.push(name, ParamType::Vec3)
    }

    pub fn vec4(self, name: &str) -> Self {
        self.push(name, ParamType::Vec4)
    }

    pub fn mat4(self, name: &str) -> Self {
        self.push(name, ParamType::Mat4)
    }

    /// `array<T, len>` where `T` mirrors a WGSL struct.
    pub fn array<T: bytemuck::Pod>(self, name: &str, len: u32) -> Self {
        let stride = round_up(std::mem::size_of::<T>() as u32, 16);
        self.push(name, ParamType::StructArray { stride, len })
    }

    pub fn build(self) -> ParamLayout {
        ParamLayout {
            fields: self.fields,
            size: round_up(self.cursor, 16),
        }
    }

    fn push(mut self, name: &str, ty: ParamType) -> Self {
        debug_assert!(
            self.fields.iter().all(|f| f.name != name),
            "duplicate uniform field `{name}`"
        );
        let offset = round_up(self.cursor, ty.align());
        self.cursor = offset + ty.size();
        self.fields.push(ParamField {
            name: name.to_string(),
            ty,
            offset,
        });
        self
    }
}

fn round_up(value: u32, align: u32) -> u32 {
    value.div_ceil(align) * align
}
