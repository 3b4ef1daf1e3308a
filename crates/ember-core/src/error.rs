//! Error types for the Ember resource registry.
//!
//! Organised by layer: the device capability ([`DeviceError`]), the
//! reflection service ([`ReflectError`]), and the registry itself
//! ([`RegistryError`]), which wraps the other two.

use std::error::Error;
use std::fmt;

use crate::handle::HandleKind;
use crate::id::PipelineId;

/// Errors reported by a [`GpuDevice`](crate::device::GpuDevice).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeviceError {
    /// The descriptor pool has no room for another set. Recoverable.
    PoolExhausted,
    /// Device memory could not satisfy the request.
    OutOfMemory {
        /// Bytes requested.
        requested: u64,
    },
    /// The driver rejected the creation call.
    CreationFailed {
        /// Driver-supplied description.
        reason: String,
    },
    /// A handle that this device did not mint, or already destroyed.
    InvalidHandle {
        /// Category of the handle.
        kind: HandleKind,
        /// Raw handle value.
        raw: u64,
    },
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PoolExhausted => write!(f, "descriptor pool exhausted"),
            Self::OutOfMemory { requested } => {
                write!(f, "out of device memory: requested {requested} bytes")
            }
            Self::CreationFailed { reason } => write!(f, "creation failed: {reason}"),
            Self::InvalidHandle { kind, raw } => write!(f, "invalid {kind} handle {raw}"),
        }
    }
}

impl Error for DeviceError {}

/// Errors from the shader reflection service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReflectError {
    /// The bytecode could not be parsed.
    InvalidBytecode {
        /// Parser-supplied description.
        reason: String,
    },
}

impl fmt::Display for ReflectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidBytecode { reason } => write!(f, "invalid shader bytecode: {reason}"),
        }
    }
}

impl Error for ReflectError {}

/// Errors from registry allocation calls.
///
/// `SignatureMismatch` and `MissingFixedBinding` mean the assets are
/// incompatible with each other or with the render pass. They are not
/// retryable; the frame loop is expected to treat them as fatal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RegistryError {
    /// A material supplied a different number of textures than the
    /// pipeline's shader declares sampler bindings.
    SignatureMismatch {
        /// The pipeline the material was allocated against.
        pipeline: PipelineId,
        /// Sampler bindings the shader declares.
        expected: usize,
        /// Textures supplied.
        supplied: usize,
    },
    /// The shader does not declare a binding the render pass requires.
    MissingFixedBinding {
        /// Descriptor set number.
        set: u32,
        /// Binding number.
        binding: u32,
    },
    /// A texture's pixel buffer does not match its dimensions and format.
    TextureSizeMismatch {
        /// `width * height * bytes_per_pixel`.
        expected: u64,
        /// Length of the supplied pixel buffer.
        supplied: u64,
    },
    /// The device failed to create a resource.
    Device(DeviceError),
    /// Shader reflection failed.
    Reflect(ReflectError),
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SignatureMismatch {
                pipeline,
                expected,
                supplied,
            } => write!(
                f,
                "material/shader signature mismatch on pipeline {pipeline}: \
                 shader declares {expected} samplers, {supplied} textures supplied"
            ),
            Self::MissingFixedBinding { set, binding } => write!(
                f,
                "incompatible shader: required fixed binding (set {set}, binding {binding}) missing"
            ),
            Self::TextureSizeMismatch { expected, supplied } => write!(
                f,
                "texture pixel buffer is {supplied} bytes, dimensions require {expected}"
            ),
            Self::Device(e) => write!(f, "device: {e}"),
            Self::Reflect(e) => write!(f, "reflection: {e}"),
        }
    }
}

impl Error for RegistryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Device(e) => Some(e),
            Self::Reflect(e) => Some(e),
            _ => None,
        }
    }
}

impl From<DeviceError> for RegistryError {
    fn from(e: DeviceError) -> Self {
        Self::Device(e)
    }
}

impl From<ReflectError> for RegistryError {
    fn from(e: ReflectError) -> Self {
        Self::Reflect(e)
    }
}
