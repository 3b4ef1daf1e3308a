//! Content hashing for asset deduplication.
//!
//! Uses FNV-1a for fast, deterministic hashing of asset bytes. These
//! hashes are not cryptographically secure; a collision makes two assets
//! share one GPU resource.

use std::fmt;

use ember_core::{MeshData, Shader, TextureData, TextureFormat};

/// FNV-1a offset basis for 64-bit.
const FNV_OFFSET: u64 = 0xcbf29ce484222325;
/// FNV-1a prime for 64-bit.
const FNV_PRIME: u64 = 0x00000100000001B3;

/// A 64-bit content hash identifying an asset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentHash(pub u64);

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Incremental FNV-1a state.
#[derive(Clone, Copy, Debug)]
pub struct Fnv1a(u64);

impl Default for Fnv1a {
    fn default() -> Self {
        Self::new()
    }
}

impl Fnv1a {
    /// Fresh state at the offset basis.
    pub fn new() -> Self {
        Self(FNV_OFFSET)
    }

    /// Feed raw bytes.
    #[inline]
    pub fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 = (self.0 ^ b as u64).wrapping_mul(FNV_PRIME);
        }
    }

    /// Feed a u32 as 4 LE bytes.
    #[inline]
    pub fn write_u32(&mut self, v: u32) {
        self.write(&v.to_le_bytes());
    }

    /// Feed a u64 as 8 LE bytes.
    #[inline]
    pub fn write_u64(&mut self, v: u64) {
        self.write(&v.to_le_bytes());
    }

    /// Feed a length prefix followed by the words, so adjacent slices
    /// cannot alias.
    fn write_words(&mut self, words: &[u32]) {
        self.write_u64(words.len() as u64);
        for &w in words {
            self.write_u32(w);
        }
    }

    /// The hash of everything fed so far.
    pub fn finish(&self) -> ContentHash {
        ContentHash(self.0)
    }
}

/// Hash of a shader's bytecode. The name does not participate.
pub fn hash_shader(shader: &Shader) -> ContentHash {
    let mut h = Fnv1a::new();
    h.write_words(&shader.code.vertex);
    h.write_words(&shader.code.fragment);
    h.finish()
}

/// Hash of a mesh's vertex layout stride, vertex bytes and indices.
pub fn hash_mesh(mesh: &MeshData) -> ContentHash {
    let mut h = Fnv1a::new();
    h.write_u32(mesh.vertex_stride);
    h.write_u64(mesh.vertices.len() as u64);
    h.write(&mesh.vertices);
    h.write_words(&mesh.indices);
    h.finish()
}

/// Hash of a texture's dimensions, format and pixels.
pub fn hash_texture(texture: &TextureData) -> ContentHash {
    let mut h = Fnv1a::new();
    h.write_u32(texture.width);
    h.write_u32(texture.height);
    h.write_u32(match texture.format {
        TextureFormat::Rgba8Unorm => 0,
        TextureFormat::Rgba8Srgb => 1,
        TextureFormat::R8Unorm => 2,
    });
    h.write(&texture.pixels);
    h.finish()
}

/// Hash of a material: its pipeline's key followed by its textures' keys,
/// in binding order.
pub fn hash_material(pipeline: ContentHash, textures: &[ContentHash]) -> ContentHash {
    let mut h = Fnv1a::new();
    h.write_u64(pipeline.0);
    h.write_u64(textures.len() as u64);
    for t in textures {
        h.write_u64(t.0);
    }
    h.finish()
}
