//! Input material model.

use crate::util::{Vec3, Vec4};

/// Source of one output channel in a component swizzle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum ChannelSource {
    R = 0,
    G = 1,
    B = 2,
    A = 3,
    One = 4,
    Zero = 5,
}

impl ChannelSource {
    /// Integer code written to `extras.swizzle`.
    #[inline]
    pub fn gltf_code(self) -> u32 {
        self as u32
    }
}

/// Four-channel component swizzle: how destination RGBA is filled from
/// source RGBA (or the constants one/zero).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Swizzle {
    pub r: ChannelSource,
    pub g: ChannelSource,
    pub b: ChannelSource,
    pub a: ChannelSource,
}

impl Swizzle {
    /// Identity mapping.
    pub const IDENTITY: Self = Self {
        r: ChannelSource::R,
        g: ChannelSource::G,
        b: ChannelSource::B,
        a: ChannelSource::A,
    };

    /// Create a swizzle from four channel sources.
    #[inline]
    pub const fn new(r: ChannelSource, g: ChannelSource, b: ChannelSource, a: ChannelSource) -> Self {
        Self { r, g, b, a }
    }

    /// Broadcast a single source channel to all four outputs.
    #[inline]
    pub const fn splat(c: ChannelSource) -> Self {
        Self { r: c, g: c, b: c, a: c }
    }

    #[inline]
    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// The four integer codes written to `extras.swizzle`.
    #[inline]
    pub fn gltf_codes(&self) -> [u32; 4] {
        [
            self.r.gltf_code(),
            self.g.gltf_code(),
            self.b.gltf_code(),
            self.a.gltf_code(),
        ]
    }
}

impl Default for Swizzle {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Material channel roles. The role decides color space, compression codec
/// and channel packing for the referenced texture.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum MaterialRole {
    BaseColor = 0,
    Normal = 1,
    MetallicRoughness = 2,
    Occlusion = 3,
    Emissive = 4,
}

/// Color-space / channel interpretation of a texture on load and encode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum TextureMode {
    Srgb = 0,
    Srgba = 1,
    Rgb = 2,
    Rgba = 3,
    Hdr = 4,
}

impl TextureMode {
    /// True for the sRGB-encoded modes.
    #[inline]
    pub fn is_srgb(self) -> bool {
        matches!(self, TextureMode::Srgb | TextureMode::Srgba)
    }
}

/// Stock sampler presets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum SamplerPreset {
    TrilinearWrap = 0,
    TrilinearClamp = 1,
    LinearWrap = 2,
    LinearClamp = 3,
    NearestClamp = 4,
    NearestWrap = 5,
}

/// Render pipeline the material is drawn with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(u32)]
pub enum DrawPipeline {
    #[default]
    Opaque = 0,
    AlphaTest = 1,
    AlphaBlend = 2,
}

/// A texture reference on a material: source path plus the swizzle to apply
/// on load.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MaterialTexture {
    pub path: String,
    pub swizzle: Swizzle,
}

impl MaterialTexture {
    /// Reference a path with identity swizzle.
    pub fn from_path(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            swizzle: Swizzle::IDENTITY,
        }
    }
}

/// An input material.
#[derive(Clone, Debug)]
pub struct MaterialInfo {
    pub base_color: Option<MaterialTexture>,
    pub normal: Option<MaterialTexture>,
    pub metallic_roughness: Option<MaterialTexture>,
    pub occlusion: Option<MaterialTexture>,
    pub emissive: Option<MaterialTexture>,

    pub sampler: SamplerPreset,

    pub uniform_base_color: Vec4,
    pub uniform_emissive_color: Vec3,
    pub uniform_metallic: f32,
    pub uniform_roughness: f32,
    pub normal_scale: f32,
    /// Hashed into the material fingerprint; not part of the glTF output.
    pub lod_bias: f32,

    pub pipeline: DrawPipeline,
    pub two_sided: bool,
}

impl Default for MaterialInfo {
    fn default() -> Self {
        Self {
            base_color: None,
            normal: None,
            metallic_roughness: None,
            occlusion: None,
            emissive: None,
            sampler: SamplerPreset::TrilinearWrap,
            uniform_base_color: Vec4::ONE,
            uniform_emissive_color: Vec3::ZERO,
            uniform_metallic: 1.0,
            uniform_roughness: 1.0,
            normal_scale: 1.0,
            lod_bias: 0.0,
            pipeline: DrawPipeline::Opaque,
            two_sided: false,
        }
    }
}
