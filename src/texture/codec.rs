//! Compression vocabulary and the codec seam.
//!
//! Decoding source images, generating mipmaps and running block compressors
//! are external concerns. The exporter talks to them through [`TextureCodec`],
//! passed explicitly into the export call.

use std::path::{Path, PathBuf};

use super::{ColorSpace, TextureImage};
use crate::scene::TextureMode;
use crate::util::Result;

/// Abstract compression family requested by export options. The concrete
/// codec is chosen per image by the analysis pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(u32)]
pub enum CompressionFamily {
    Uncompressed = 0,
    #[default]
    Bc = 1,
    Astc = 2,
}

/// Concrete compression codec chosen for one image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextureCompression {
    Uncompressed,
    Bc1,
    Bc3,
    Bc4,
    Bc5,
    Bc6h,
    Bc7,
    Astc4x4,
    Astc5x5,
    Astc6x6,
    Astc8x8,
}

/// Storage format handed to the block compressor, with sRGB flagging baked in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompressedFormat {
    Rgba8Unorm,
    Rgba8Srgb,
    Bc1RgbUnorm,
    Bc1RgbSrgb,
    Bc1RgbaUnorm,
    Bc1RgbaSrgb,
    Bc3Unorm,
    Bc3Srgb,
    Bc4Unorm,
    Bc5Unorm,
    Bc6hUfloat,
    Bc7Unorm,
    Bc7Srgb,
    Astc4x4Unorm,
    Astc4x4Srgb,
    Astc5x5Unorm,
    Astc5x5Srgb,
    Astc6x6Unorm,
    Astc6x6Srgb,
    Astc8x8Unorm,
    Astc8x8Srgb,
}

/// Map a codec and texture mode to the storage format. sRGB and sRGBA modes
/// select the sRGB variant; BC1 keeps alpha only for the alpha-carrying modes.
pub fn compressed_format(compression: TextureCompression, mode: TextureMode) -> CompressedFormat {
    let srgb = mode.is_srgb();

    match compression {
        TextureCompression::Uncompressed => {
            if srgb {
                CompressedFormat::Rgba8Srgb
            } else {
                CompressedFormat::Rgba8Unorm
            }
        }

        TextureCompression::Bc1 => {
            if mode == TextureMode::Srgba || mode == TextureMode::Rgba {
                if srgb {
                    CompressedFormat::Bc1RgbaSrgb
                } else {
                    CompressedFormat::Bc1RgbaUnorm
                }
            } else if srgb {
                CompressedFormat::Bc1RgbSrgb
            } else {
                CompressedFormat::Bc1RgbUnorm
            }
        }

        TextureCompression::Bc3 => {
            if srgb {
                CompressedFormat::Bc3Srgb
            } else {
                CompressedFormat::Bc3Unorm
            }
        }

        TextureCompression::Bc4 => CompressedFormat::Bc4Unorm,
        TextureCompression::Bc5 => CompressedFormat::Bc5Unorm,
        TextureCompression::Bc6h => CompressedFormat::Bc6hUfloat,

        TextureCompression::Bc7 => {
            if srgb {
                CompressedFormat::Bc7Srgb
            } else {
                CompressedFormat::Bc7Unorm
            }
        }

        TextureCompression::Astc4x4 => {
            if srgb {
                CompressedFormat::Astc4x4Srgb
            } else {
                CompressedFormat::Astc4x4Unorm
            }
        }
        TextureCompression::Astc5x5 => {
            if srgb {
                CompressedFormat::Astc5x5Srgb
            } else {
                CompressedFormat::Astc5x5Unorm
            }
        }
        TextureCompression::Astc6x6 => {
            if srgb {
                CompressedFormat::Astc6x6Srgb
            } else {
                CompressedFormat::Astc6x6Unorm
            }
        }
        TextureCompression::Astc8x8 => {
            if srgb {
                CompressedFormat::Astc8x8Srgb
            } else {
                CompressedFormat::Astc8x8Unorm
            }
        }
    }
}

/// Arguments handed to the external block compressor.
#[derive(Clone, Debug)]
pub struct CompressorArgs {
    pub output: PathBuf,
    pub format: CompressedFormat,
    pub quality: u32,
}

/// External image codec: source decoding, mipmap generation and encode
/// back-ends live behind this trait.
pub trait TextureCodec: Send + Sync {
    /// Decode the source file into RGBA8 in the given color space.
    fn load(&self, path: &Path, color_space: ColorSpace) -> Result<TextureImage>;

    /// Write an uncompressed RGBA container file.
    fn save_rgba(&self, path: &Path, image: &TextureImage) -> Result<()>;

    /// Block-compress and write a container file.
    fn compress(&self, args: &CompressorArgs, image: &TextureImage) -> Result<()>;

    /// Produce a full mip chain from a single-level texture. Filtering must
    /// respect the color space.
    fn generate_mipmaps(&self, image: &TextureImage, color_space: ColorSpace) -> Result<TextureImage>;
}
