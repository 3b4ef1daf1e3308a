//! Splitting a shader's reflected bindings into pass, material and
//! instance scopes.

use smallvec::SmallVec;

use ember_core::{DescriptorBinding, RegistryError, ShaderReflection};

use crate::config::FixedPassLayout;

/// The per-pipeline bindings left after removing the render pass's fixed
/// bindings.
///
/// Combined image samplers are material-scoped: one set per material,
/// written once with the material's textures. Uniform and storage buffers
/// are instance-scoped: every renderable gets its own buffers and set for
/// each swapchain image.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ShaderBindings {
    /// Sampler bindings, in binding order.
    pub material: SmallVec<[DescriptorBinding; 4]>,
    /// Buffer bindings, in binding order.
    pub instance: SmallVec<[DescriptorBinding; 4]>,
}

impl ShaderBindings {
    /// Partition `reflection` against `pass`.
    ///
    /// Fails with [`RegistryError::MissingFixedBinding`] if the shader does
    /// not declare a binding the pass marks as required.
    pub fn partition(
        reflection: &ShaderReflection,
        pass: &FixedPassLayout,
    ) -> Result<Self, RegistryError> {
        if let Some(missing) = pass
            .required()
            .find(|fixed| reflection.binding(fixed.set, fixed.binding).is_none())
        {
            return Err(RegistryError::MissingFixedBinding {
                set: missing.set,
                binding: missing.binding,
            });
        }

        let mut out = Self::default();
        for b in &reflection.bindings {
            if pass.is_fixed(b.set, b.binding) {
                continue;
            }
            if b.kind.is_buffer() {
                out.instance.push(*b);
            } else {
                out.material.push(*b);
            }
        }
        out.material.sort_unstable_by_key(|b| (b.set, b.binding));
        out.instance.sort_unstable_by_key(|b| (b.set, b.binding));
        Ok(out)
    }

    /// Number of textures a material of this pipeline must supply.
    pub fn sampler_count(&self) -> usize {
        self.material.len()
    }

    /// Number of instance buffers each renderable needs per swapchain image.
    pub fn instance_buffer_count(&self) -> usize {
        self.instance.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FixedBinding;
    use ember_core::{BindingKind, DescriptorLayoutHandle, RenderPassHandle};

    fn binding(set: u32, binding: u32, kind: BindingKind) -> DescriptorBinding {
        DescriptorBinding {
            set,
            binding,
            kind,
            stride: if kind.is_buffer() { 64 } else { 0 },
            count: 1,
        }
    }

    fn camera_pass(required: bool) -> FixedPassLayout {
        FixedPassLayout::new(RenderPassHandle(1)).with_set(
            DescriptorLayoutHandle(9),
            [FixedBinding {
                set: 0,
                binding: 0,
                required,
            }],
        )
    }

    #[test]
    fn fixed_bindings_are_stripped_and_rest_split_by_kind() {
        let reflection = ShaderReflection {
            bindings: vec![
                binding(0, 0, BindingKind::UniformBuffer),
                binding(2, 0, BindingKind::StorageBuffer),
                binding(1, 1, BindingKind::CombinedImageSampler),
                binding(1, 0, BindingKind::CombinedImageSampler),
            ],
            ..ShaderReflection::default()
        };
        let split = ShaderBindings::partition(&reflection, &camera_pass(true)).unwrap();
        assert_eq!(split.sampler_count(), 2);
        assert_eq!(split.material[0].binding, 0);
        assert_eq!(split.material[1].binding, 1);
        assert_eq!(split.instance_buffer_count(), 1);
        assert_eq!(split.instance[0].kind, BindingKind::StorageBuffer);
    }

    #[test]
    fn missing_required_binding_is_incompatible() {
        let reflection = ShaderReflection {
            bindings: vec![binding(1, 0, BindingKind::CombinedImageSampler)],
            ..ShaderReflection::default()
        };
        let err = ShaderBindings::partition(&reflection, &camera_pass(true)).unwrap_err();
        assert_eq!(err, RegistryError::MissingFixedBinding { set: 0, binding: 0 });
    }

    #[test]
    fn optional_fixed_binding_may_be_absent() {
        let reflection = ShaderReflection::default();
        let split = ShaderBindings::partition(&reflection, &camera_pass(false)).unwrap();
        assert_eq!(split, ShaderBindings::default());
    }
}
