//! Registry configuration, validation, and error types.
//!
//! [`RegistryConfig`] is the constructor input for a
//! [`Registry`](crate::Registry). It is validated once in
//! [`Registry::new`](crate::Registry::new) and immutable afterwards.

use std::error::Error;
use std::fmt;

use ember_core::{DescriptorLayoutHandle, RenderPassHandle};

// ── FixedPassLayout ────────────────────────────────────────────────

/// A binding owned by the render pass rather than by any pipeline.
///
/// Fixed bindings (camera, lights, shadow maps, ...) live in globally
/// shared descriptor sets. Shaders declare them, but the registry strips
/// them before building per-pipeline layouts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FixedBinding {
    /// Descriptor set number.
    pub set: u32,
    /// Binding number within the set.
    pub binding: u32,
    /// Whether every shader used with this pass must declare the binding.
    pub required: bool,
}

/// The renderer-supplied render pass and its globally shared descriptor sets.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FixedPassLayout {
    /// Render pass every pipeline is built against.
    pub render_pass: RenderPassHandle,
    /// Layouts of the fixed sets, in set-number order. They precede each
    /// pipeline's own layouts in the pipeline layout list.
    pub set_layouts: Vec<DescriptorLayoutHandle>,
    /// Bindings excluded from per-pipeline layouts.
    pub bindings: Vec<FixedBinding>,
}

impl FixedPassLayout {
    /// A pass with no fixed descriptor sets.
    pub fn new(render_pass: RenderPassHandle) -> Self {
        Self {
            render_pass,
            set_layouts: Vec::new(),
            bindings: Vec::new(),
        }
    }

    /// Append a fixed set with its layout and bindings.
    pub fn with_set(
        mut self,
        layout: DescriptorLayoutHandle,
        bindings: impl IntoIterator<Item = FixedBinding>,
    ) -> Self {
        self.set_layouts.push(layout);
        self.bindings.extend(bindings);
        self
    }

    /// Whether `(set, binding)` belongs to the pass.
    pub fn is_fixed(&self, set: u32, binding: u32) -> bool {
        self.bindings
            .iter()
            .any(|b| b.set == set && b.binding == binding)
    }

    /// The bindings every compatible shader must declare.
    pub fn required(&self) -> impl Iterator<Item = &FixedBinding> {
        self.bindings.iter().filter(|b| b.required)
    }
}

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected during [`RegistryConfig::validate()`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// Deletion rings need at least one slot.
    RingTooShallow {
        /// The configured depth.
        configured: usize,
    },
    /// At least one swapchain image is required.
    NoSwapchainImages,
    /// Descriptor pools must hold at least one set.
    ZeroPoolCapacity,
    /// The same fixed binding was listed twice.
    DuplicateFixedBinding {
        /// Descriptor set number.
        set: u32,
        /// Binding number.
        binding: u32,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RingTooShallow { configured } => {
                write!(f, "frames_in_flight {configured} is below minimum of 1")
            }
            Self::NoSwapchainImages => write!(f, "swapchain_images must be at least 1"),
            Self::ZeroPoolCapacity => write!(f, "descriptor_pool_capacity must be at least 1"),
            Self::DuplicateFixedBinding { set, binding } => {
                write!(f, "fixed binding (set {set}, binding {binding}) listed twice")
            }
        }
    }
}

impl Error for ConfigError {}

// ── RegistryConfig ─────────────────────────────────────────────────

/// Configuration for a [`Registry`](crate::Registry).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Depth of every deletion ring: how many `advance_frame()` calls an
    /// item survives after being condemned.
    ///
    /// Must equal the number of frames the presentation layer may keep in
    /// flight. Too few slots frees objects the device is still reading; too
    /// many only delays reclamation. One value drives all five rings.
    pub frames_in_flight: usize,

    /// Number of per-instance buffer sets (and instance descriptor sets)
    /// allocated for every renderable.
    pub swapchain_images: usize,

    /// Sets per underlying descriptor pool. When a pool fills, another of
    /// the same size is created.
    pub descriptor_pool_capacity: u32,

    /// The render pass and its fixed descriptor sets.
    pub pass: FixedPassLayout,
}

impl RegistryConfig {
    /// Default in-flight depth (triple buffering).
    pub const DEFAULT_FRAMES_IN_FLIGHT: usize = 3;

    /// Default swapchain image count.
    pub const DEFAULT_SWAPCHAIN_IMAGES: usize = 3;

    /// Default sets per descriptor pool.
    pub const DEFAULT_POOL_CAPACITY: u32 = 64;

    /// Create a config for `pass` with default values for everything else.
    pub fn new(pass: FixedPassLayout) -> Self {
        Self {
            frames_in_flight: Self::DEFAULT_FRAMES_IN_FLIGHT,
            swapchain_images: Self::DEFAULT_SWAPCHAIN_IMAGES,
            descriptor_pool_capacity: Self::DEFAULT_POOL_CAPACITY,
            pass,
        }
    }

    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.frames_in_flight == 0 {
            return Err(ConfigError::RingTooShallow {
                configured: self.frames_in_flight,
            });
        }
        if self.swapchain_images == 0 {
            return Err(ConfigError::NoSwapchainImages);
        }
        if self.descriptor_pool_capacity == 0 {
            return Err(ConfigError::ZeroPoolCapacity);
        }
        let bindings = &self.pass.bindings;
        for (i, a) in bindings.iter().enumerate() {
            if bindings[i + 1..]
                .iter()
                .any(|b| b.set == a.set && b.binding == a.binding)
            {
                return Err(ConfigError::DuplicateFixedBinding {
                    set: a.set,
                    binding: a.binding,
                });
            }
        }
        Ok(())
    }
}
