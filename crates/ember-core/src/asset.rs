//! Decoded asset payloads handed to the registry for upload.
//!
//! Decoding files into these types is the asset importer's job; the registry
//! only copies the bytes to the device.

/// Pixel format of a texture.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    /// 8-bit RGBA, linear.
    Rgba8Unorm,
    /// 8-bit RGBA, sRGB-encoded.
    Rgba8Srgb,
    /// 8-bit single channel.
    R8Unorm,
}

impl TextureFormat {
    /// Bytes per pixel.
    pub fn bytes_per_pixel(self) -> u32 {
        match self {
            Self::Rgba8Unorm | Self::Rgba8Srgb => 4,
            Self::R8Unorm => 1,
        }
    }
}

/// Interleaved vertex data plus 32-bit indices.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MeshData {
    /// Raw interleaved vertex bytes.
    pub vertices: Vec<u8>,
    /// Bytes per vertex.
    pub vertex_stride: u32,
    /// Triangle-list indices.
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Number of vertices.
    pub fn vertex_count(&self) -> u32 {
        if self.vertex_stride == 0 {
            return 0;
        }
        (self.vertices.len() / self.vertex_stride as usize) as u32
    }

    /// Number of indices.
    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }

    /// Index data as raw bytes, ready for upload.
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.indices.as_slice())
    }
}

/// A decoded 2D image at full resolution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextureData {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel format of `pixels`.
    pub format: TextureFormat,
    /// Tightly packed rows of pixels.
    pub pixels: Vec<u8>,
}

impl TextureData {
    /// Length of a full mip chain down to 1x1.
    ///
    /// `floor(log2(max(width, height))) + 1`, and 1 for a degenerate image.
    pub fn mip_levels(&self) -> u32 {
        let largest = self.width.max(self.height);
        if largest == 0 {
            return 1;
        }
        u32::BITS - largest.leading_zeros()
    }

    /// Expected byte length of the base level.
    pub fn byte_len(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height) * u64::from(self.format.bytes_per_pixel())
    }
}
