//! In-memory texture container.
//!
//! Analysis always works on 8-bit-per-channel RGBA data; codecs decode into
//! this shape and encode out of it. Mip levels are stored separately, each
//! level holding `layers * faces` tightly packed images.

pub mod codec;

pub use codec::*;

use crate::scene::{ChannelSource, Swizzle};
use crate::util::{Error, Result};

/// Color space a texture is interpreted in on load.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorSpace {
    Srgb,
    Linear,
}

/// An RGBA8 texture with optional layers, faces and mip levels.
#[derive(Clone, Debug)]
pub struct TextureImage {
    width: u32,
    height: u32,
    layers: u32,
    faces: u32,
    /// Per-level pixel storage, level 0 first.
    levels: Vec<Vec<u8>>,
}

impl TextureImage {
    /// Create a single-level 2D texture from raw RGBA8 pixels.
    pub fn from_rgba8(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(Error::other(format!(
                "RGBA8 pixel buffer size {} does not match {}x{}",
                pixels.len(),
                width,
                height
            )));
        }
        Ok(Self {
            width,
            height,
            layers: 1,
            faces: 1,
            levels: vec![pixels],
        })
    }

    /// Create a texture from per-level storage.
    ///
    /// Level `l` must hold `layers * faces * max(width >> l, 1) *
    /// max(height >> l, 1) * 4` bytes.
    pub fn from_levels(
        width: u32,
        height: u32,
        layers: u32,
        faces: u32,
        levels: Vec<Vec<u8>>,
    ) -> Result<Self> {
        if levels.is_empty() {
            return Err(Error::other("texture must have at least one level"));
        }
        for (l, data) in levels.iter().enumerate() {
            let w = (width >> l).max(1) as usize;
            let h = (height >> l).max(1) as usize;
            let expected = w * h * 4 * layers as usize * faces as usize;
            if data.len() != expected {
                return Err(Error::other(format!(
                    "level {} holds {} bytes, expected {}",
                    l,
                    data.len(),
                    expected
                )));
            }
        }
        Ok(Self {
            width,
            height,
            layers,
            faces,
            levels,
        })
    }

    /// Fill a 2D texture with one solid RGBA value. Test helper and fallback.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let mut pixels = Vec::with_capacity(width as usize * height as usize * 4);
        for _ in 0..width * height {
            pixels.extend_from_slice(&rgba);
        }
        Self {
            width,
            height,
            layers: 1,
            faces: 1,
            levels: vec![pixels],
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn layers(&self) -> u32 {
        self.layers
    }

    #[inline]
    pub fn faces(&self) -> u32 {
        self.faces
    }

    /// Number of mip levels.
    #[inline]
    pub fn levels(&self) -> u32 {
        self.levels.len() as u32
    }

    /// Pixels of one mip level (all layers and faces).
    #[inline]
    pub fn level_pixels(&self, level: u32) -> &[u8] {
        &self.levels[level as usize]
    }

    /// Pixels of the base level (all layers and faces).
    #[inline]
    pub fn base_pixels(&self) -> &[u8] {
        &self.levels[0]
    }

    /// Pixels of layer 0, face 0 of the base level.
    pub fn base_slice(&self) -> &[u8] {
        let slice = self.width as usize * self.height as usize * 4;
        &self.levels[0][..slice]
    }

    /// Permute channels in place across every level, layer and face.
    ///
    /// Only channel selectors are valid here; the constants one/zero cannot
    /// be materialized into pixel data and are a hard error.
    pub fn swizzle(&mut self, swizzle: Swizzle) -> Result<()> {
        if swizzle.is_identity() {
            return Ok(());
        }

        let select = |c: ChannelSource| -> Result<usize> {
            match c {
                ChannelSource::R => Ok(0),
                ChannelSource::G => Ok(1),
                ChannelSource::B => Ok(2),
                ChannelSource::A => Ok(3),
                ChannelSource::One | ChannelSource::Zero => Err(Error::invalid_swizzle(
                    "swizzle constant outside RGBA range",
                )),
            }
        };

        let r = select(swizzle.r)?;
        let g = select(swizzle.g)?;
        let b = select(swizzle.b)?;
        let a = select(swizzle.a)?;

        for level in &mut self.levels {
            for px in level.chunks_exact_mut(4) {
                let src = [px[0], px[1], px[2], px[3]];
                px[0] = src[r];
                px[1] = src[g];
                px[2] = src[b];
                px[3] = src[a];
            }
        }
        Ok(())
    }
}
