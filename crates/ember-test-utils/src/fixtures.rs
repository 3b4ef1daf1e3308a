//! Reusable asset fixtures.
//!
//! Shaders come with a hand-written reflection so no SPIR-V parser is
//! needed. Sampler bindings are placed in set 1 and instance buffers in
//! set 2; [`shader_with_camera`] adds the conventional pass-owned camera
//! uniform at set 0, binding 0.

use ember_core::{
    BindingKind, DescriptorBinding, MeshData, Shader, ShaderCode, ShaderReflection, TextureData,
    TextureFormat, VertexAttribute, VertexFormat, VertexLayout,
};

/// Set number fixture shaders use for the camera binding.
pub const CAMERA_SET: u32 = 0;
/// Set number fixture shaders use for sampler bindings.
pub const MATERIAL_SET: u32 = 1;
/// Set number fixture shaders use for instance buffers.
pub const INSTANCE_SET: u32 = 2;
/// Stride of every fixture instance buffer: one 4x4 float matrix.
pub const INSTANCE_STRIDE: u32 = 64;

/// Position + normal, 24 bytes per vertex.
pub fn vertex_layout() -> VertexLayout {
    VertexLayout {
        stride: 24,
        attributes: vec![
            VertexAttribute {
                location: 0,
                format: VertexFormat::Float32x3,
                offset: 0,
            },
            VertexAttribute {
                location: 1,
                format: VertexFormat::Float32x3,
                offset: 12,
            },
        ],
    }
}

/// Placeholder bytecode that differs per `(samplers, buffers)` pair.
pub fn code(samplers: u32, buffers: u32) -> ShaderCode {
    ShaderCode {
        vertex: vec![0x0723_0203, 0x0001_0000, samplers, buffers],
        fragment: vec![0x0723_0203, 0x0001_0000, buffers, samplers],
    }
}

/// Reflection declaring `samplers` combined image samplers and `buffers`
/// uniform buffers.
pub fn reflection(samplers: u32, buffers: u32) -> ShaderReflection {
    let mut bindings: Vec<DescriptorBinding> = (0..samplers)
        .map(|binding| DescriptorBinding {
            set: MATERIAL_SET,
            binding,
            kind: BindingKind::CombinedImageSampler,
            stride: 0,
            count: 1,
        })
        .collect();
    bindings.extend((0..buffers).map(|binding| DescriptorBinding {
        set: INSTANCE_SET,
        binding,
        kind: BindingKind::UniformBuffer,
        stride: INSTANCE_STRIDE,
        count: 1,
    }));
    ShaderReflection {
        vertex: vertex_layout(),
        bindings,
    }
}

/// A shader with `samplers` sampler bindings and `buffers` instance buffers.
pub fn shader(name: &str, samplers: u32, buffers: u32) -> Shader {
    Shader::from_parts(name, code(samplers, buffers), reflection(samplers, buffers))
}

/// Like [`shader`], plus a camera uniform at `(CAMERA_SET, 0)`.
pub fn shader_with_camera(name: &str, samplers: u32, buffers: u32) -> Shader {
    let mut reflection = reflection(samplers, buffers);
    reflection.bindings.insert(
        0,
        DescriptorBinding {
            set: CAMERA_SET,
            binding: 0,
            kind: BindingKind::UniformBuffer,
            stride: 128,
            count: 1,
        },
    );
    Shader::from_parts(name, code(samplers, buffers), reflection)
}

fn mesh(positions: &[[f32; 3]], indices: Vec<u32>) -> MeshData {
    let mut vertices = Vec::with_capacity(positions.len() * 24);
    for p in positions {
        for c in p.iter().chain(&[0.0, 0.0, 1.0]) {
            vertices.extend_from_slice(&c.to_le_bytes());
        }
    }
    MeshData {
        vertices,
        vertex_stride: 24,
        indices,
    }
}

/// One triangle: 3 vertices, 3 indices.
pub fn triangle() -> MeshData {
    mesh(
        &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
        vec![0, 1, 2],
    )
}

/// A unit quad: 4 vertices, 6 indices.
pub fn quad() -> MeshData {
    mesh(
        &[
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
        ],
        vec![0, 1, 2, 0, 2, 3],
    )
}

/// A black and white RGBA checkerboard.
pub fn checker(width: u32, height: u32) -> TextureData {
    let mut pixels = Vec::with_capacity((width * height * 4) as usize);
    for y in 0..height {
        for x in 0..width {
            let v = if (x + y) % 2 == 0 { 255 } else { 0 };
            pixels.extend_from_slice(&[v, v, v, 255]);
        }
    }
    TextureData {
        width,
        height,
        format: TextureFormat::Rgba8Unorm,
        pixels,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixture_sizes() {
        assert_eq!(triangle().vertex_count(), 3);
        assert_eq!(quad().index_count(), 6);
        assert_eq!(checker(4, 2).pixels.len() as u64, checker(4, 2).byte_len());
        let s = shader_with_camera("lit", 2, 1);
        assert_eq!(s.reflection.bindings.len(), 4);
        assert_eq!(s.reflection.bindings[0].set, CAMERA_SET);
    }
}
