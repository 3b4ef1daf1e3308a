//! Per-instance transform shared between the scene and the registry.
//!
//! The scene owns every [`SharedTransform`]. Renderables hold only a `Weak`
//! to it and read it when instance buffers are refreshed.

use std::sync::{Arc, RwLock};

use bytemuck::{Pod, Zeroable};

/// Column-major model matrix written into a renderable's instance buffer.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct InstanceTransform {
    /// Matrix columns.
    pub columns: [[f32; 4]; 4],
}

impl InstanceTransform {
    /// The identity transform.
    pub const IDENTITY: Self = Self {
        columns: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    /// A pure translation.
    pub fn from_translation(x: f32, y: f32, z: f32) -> Self {
        let mut t = Self::IDENTITY;
        t.columns[3] = [x, y, z, 1.0];
        t
    }

    /// The matrix as raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

impl Default for InstanceTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Scene-owned transform cell.
pub type SharedTransform = Arc<RwLock<InstanceTransform>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_are_sixty_four_long() {
        let t = InstanceTransform::from_translation(1.0, 2.0, 3.0);
        assert_eq!(t.as_bytes().len(), 64);
        assert_eq!(t.columns[3], [1.0, 2.0, 3.0, 1.0]);
    }
}
