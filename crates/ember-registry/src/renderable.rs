//! Per-instance draw records.

use std::sync::{RwLock, Weak};

use smallvec::SmallVec;

use ember_core::{BufferHandle, DescriptorSetHandle, InstanceTransform};

use crate::deletion::CondemnedRenderable;
use crate::descriptor::DescriptorAllocation;

/// One drawable instance of a (material, mesh) pair.
///
/// Owns its instance buffers exclusively: `buffers_per_image` buffers for
/// each swapchain image, laid out image-major, and one instance descriptor
/// set per image when the shader declares instance bindings.
#[derive(Debug)]
pub struct Renderable {
    pub(crate) buffers: SmallVec<[BufferHandle; 6]>,
    pub(crate) buffers_per_image: usize,
    pub(crate) descriptors: SmallVec<[DescriptorAllocation; 3]>,
    pub(crate) transform: Option<Weak<RwLock<InstanceTransform>>>,
}

impl Renderable {
    /// Instance buffers for swapchain image `image`, in binding order.
    ///
    /// # Panics
    ///
    /// Panics if `image` is not below the configured swapchain image count.
    pub fn buffers(&self, image: usize) -> &[BufferHandle] {
        let start = image * self.buffers_per_image;
        &self.buffers[start..start + self.buffers_per_image]
    }

    /// Instance descriptor set for swapchain image `image`, if the shader
    /// declares instance bindings.
    pub fn descriptor(&self, image: usize) -> Option<DescriptorSetHandle> {
        self.descriptors.get(image).map(|a| a.set)
    }

    /// Whether a transform is bound and its owner is still alive.
    pub fn has_live_transform(&self) -> bool {
        self.transform
            .as_ref()
            .is_some_and(|weak| weak.strong_count() > 0)
    }

    pub(crate) fn condemn(self) -> CondemnedRenderable {
        CondemnedRenderable {
            buffers: self.buffers,
            descriptors: self.descriptors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn renderable(images: usize, per_image: usize) -> Renderable {
        Renderable {
            buffers: (0..(images * per_image) as u64).map(BufferHandle).collect(),
            buffers_per_image: per_image,
            descriptors: SmallVec::new(),
            transform: None,
        }
    }

    #[test]
    fn buffers_are_sliced_per_image() {
        let r = renderable(3, 2);
        assert_eq!(r.buffers(0), &[BufferHandle(0), BufferHandle(1)]);
        assert_eq!(r.buffers(2), &[BufferHandle(4), BufferHandle(5)]);
        assert_eq!(r.descriptor(0), None);
    }

    #[test]
    fn dropped_transform_is_not_live() {
        let mut r = renderable(1, 1);
        assert!(!r.has_live_transform());
        let owner = Arc::new(RwLock::new(InstanceTransform::IDENTITY));
        r.transform = Some(Arc::downgrade(&owner));
        assert!(r.has_live_transform());
        drop(owner);
        assert!(!r.has_live_transform());
    }
}
