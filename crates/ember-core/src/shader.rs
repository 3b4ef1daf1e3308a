//! Shader bytecode, reflection metadata, and the [`ShaderReflector`] seam.
//!
//! Reflection itself (parsing SPIR-V) is an external service. The registry
//! only consumes the resulting [`ShaderReflection`]: the vertex input layout
//! and the descriptor bindings with their byte strides and array counts.

use crate::error::ReflectError;

/// Compiled bytecode for the two stages of a graphics shader.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ShaderCode {
    /// Vertex stage words.
    pub vertex: Vec<u32>,
    /// Fragment stage words.
    pub fragment: Vec<u32>,
}

/// The resource type a descriptor binding expects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BindingKind {
    /// A uniform buffer (UBO).
    UniformBuffer,
    /// A storage buffer (SSBO).
    StorageBuffer,
    /// A combined image + sampler.
    CombinedImageSampler,
}

impl BindingKind {
    /// Whether this binding is backed by a buffer object.
    pub fn is_buffer(self) -> bool {
        matches!(self, Self::UniformBuffer | Self::StorageBuffer)
    }
}

/// One descriptor binding declared by a shader.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DescriptorBinding {
    /// Descriptor set number.
    pub set: u32,
    /// Binding number within the set.
    pub binding: u32,
    /// What the binding expects.
    pub kind: BindingKind,
    /// Byte size of one element (buffers only; 0 for samplers).
    pub stride: u32,
    /// Array length (1 for non-array bindings).
    pub count: u32,
}

impl DescriptorBinding {
    /// Total bytes a buffer binding occupies (`stride * count`).
    pub fn byte_size(&self) -> u64 {
        u64::from(self.stride) * u64::from(self.count)
    }
}

/// Scalar/vector format of a vertex attribute.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VertexFormat {
    /// One 32-bit float.
    Float32,
    /// Two 32-bit floats.
    Float32x2,
    /// Three 32-bit floats.
    Float32x3,
    /// Four 32-bit floats.
    Float32x4,
    /// One 32-bit unsigned integer.
    Uint32,
}

impl VertexFormat {
    /// Size of the attribute in bytes.
    pub fn size(self) -> u32 {
        match self {
            Self::Float32 | Self::Uint32 => 4,
            Self::Float32x2 => 8,
            Self::Float32x3 => 12,
            Self::Float32x4 => 16,
        }
    }
}

/// One vertex input attribute.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct VertexAttribute {
    /// Shader input location.
    pub location: u32,
    /// Attribute format.
    pub format: VertexFormat,
    /// Byte offset within one vertex.
    pub offset: u32,
}

/// Interleaved vertex input layout.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VertexLayout {
    /// Bytes between consecutive vertices.
    pub stride: u32,
    /// Attributes in location order.
    pub attributes: Vec<VertexAttribute>,
}

/// Reflected interface of a shader.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ShaderReflection {
    /// Vertex input layout.
    pub vertex: VertexLayout,
    /// Every descriptor binding across both stages, deduplicated.
    pub bindings: Vec<DescriptorBinding>,
}

impl ShaderReflection {
    /// Look up a binding by `(set, binding)`.
    pub fn binding(&self, set: u32, binding: u32) -> Option<&DescriptorBinding> {
        self.bindings
            .iter()
            .find(|b| b.set == set && b.binding == binding)
    }
}

/// External reflection service.
///
/// Given compiled bytecode, returns the vertex layout and descriptor
/// bindings the shader declares.
pub trait ShaderReflector {
    /// Reflect `code` into its interface description.
    fn reflect(&self, code: &ShaderCode) -> Result<ShaderReflection, ReflectError>;
}

/// A compiled shader together with its reflected interface.
///
/// This is the input to `Registry::allocate_pipeline`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Shader {
    /// Name for diagnostics.
    pub name: String,
    /// Compiled bytecode.
    pub code: ShaderCode,
    /// Reflected interface.
    pub reflection: ShaderReflection,
}

impl Shader {
    /// Reflect `code` through `reflector` and bundle the result.
    pub fn reflect(
        name: impl Into<String>,
        code: ShaderCode,
        reflector: &dyn ShaderReflector,
    ) -> Result<Self, ReflectError> {
        let reflection = reflector.reflect(&code)?;
        Ok(Self {
            name: name.into(),
            code,
            reflection,
        })
    }

    /// Bundle bytecode with an already-known reflection.
    pub fn from_parts(name: impl Into<String>, code: ShaderCode, reflection: ShaderReflection) -> Self {
        Self {
            name: name.into(),
            code,
            reflection,
        }
    }
}
