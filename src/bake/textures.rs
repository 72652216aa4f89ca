//! Texture graph baking: samplers, images and texture pairs.
//!
//! Emitted bottom-up: a texture interns its image and sampler first, then
//! itself by the resulting index pair. Image records double as pending work
//! items for the analysis and encode phases.

use super::analysis::AnalysisResult;
use super::gl;
use super::remap::InternTable;
use crate::scene::{MaterialRole, MaterialTexture, SamplerPreset, Swizzle, TextureMode};
use crate::texture::CompressionFamily;
use crate::util::Hasher;

/// GL sampler state for one preset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EmittedSampler {
    pub mag_filter: u32,
    pub min_filter: u32,
    pub wrap_s: u32,
    pub wrap_t: u32,
}

/// An (image, sampler) pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EmittedTexture {
    pub image: u32,
    pub sampler: u32,
}

/// An image record: identity of the source, the synthetic output target, and
/// the pending compression job. `analysis` is populated by the analyzer pass.
pub struct EmittedImage {
    pub source_path: String,
    /// Output filename relative to the container, `<fingerprint>.ktx`.
    pub target_relpath: String,
    pub target_mime: &'static str,

    pub family: CompressionFamily,
    pub quality: u32,
    pub mode: TextureMode,
    pub role: MaterialRole,
    /// Swizzle requested by the material, applied at load.
    pub swizzle: Swizzle,

    pub analysis: Option<AnalysisResult>,
}

/// Sampler, image and texture caches for one export.
#[derive(Default)]
pub struct TextureCache {
    samplers: InternTable<EmittedSampler>,
    images: InternTable<EmittedImage>,
    textures: InternTable<EmittedTexture>,
}

impl TextureCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a sampler preset and return its index.
    pub fn emit_sampler(&mut self, preset: SamplerPreset) -> u32 {
        let mut h = Hasher::new();
        h.u32(preset as u32);

        self.samplers.intern(h.get(), || {
            let (mag_filter, min_filter) = match preset {
                SamplerPreset::TrilinearWrap | SamplerPreset::TrilinearClamp => {
                    (gl::LINEAR, gl::LINEAR_MIPMAP_LINEAR)
                }
                SamplerPreset::LinearWrap | SamplerPreset::LinearClamp => {
                    (gl::LINEAR, gl::LINEAR_MIPMAP_NEAREST)
                }
                SamplerPreset::NearestWrap | SamplerPreset::NearestClamp => {
                    (gl::NEAREST, gl::NEAREST_MIPMAP_NEAREST)
                }
            };
            let wrap = match preset {
                SamplerPreset::TrilinearWrap
                | SamplerPreset::LinearWrap
                | SamplerPreset::NearestWrap => gl::REPEAT,
                SamplerPreset::TrilinearClamp
                | SamplerPreset::LinearClamp
                | SamplerPreset::NearestClamp => gl::CLAMP_TO_EDGE,
            };
            EmittedSampler {
                mag_filter,
                min_filter,
                wrap_s: wrap,
                wrap_t: wrap,
            }
        })
    }

    /// Intern an image request and return its index. The fingerprint covers
    /// `(path, role, family, quality, mode)` and names the output file.
    pub fn emit_image(
        &mut self,
        texture: &MaterialTexture,
        role: MaterialRole,
        family: CompressionFamily,
        quality: u32,
        mode: TextureMode,
    ) -> u32 {
        let mut h = Hasher::new();
        h.string(&texture.path);
        h.u32(role as u32);
        h.u32(family as u32);
        h.u32(quality);
        h.u32(mode as u32);
        let fingerprint = h.get();

        self.images.intern(fingerprint, || EmittedImage {
            source_path: texture.path.clone(),
            target_relpath: format!("{}.ktx", fingerprint),
            target_mime: "image/ktx",
            family,
            quality,
            mode,
            role,
            swizzle: texture.swizzle,
            analysis: None,
        })
    }

    /// Intern a texture: the union of its image and sampler indices.
    pub fn emit_texture(
        &mut self,
        texture: &MaterialTexture,
        sampler: SamplerPreset,
        role: MaterialRole,
        family: CompressionFamily,
        quality: u32,
        mode: TextureMode,
    ) -> u32 {
        let image = self.emit_image(texture, role, family, quality, mode);
        let sampler = self.emit_sampler(sampler);

        let mut h = Hasher::new();
        h.u32(image);
        h.u32(sampler);
        self.textures
            .intern(h.get(), || EmittedTexture { image, sampler })
    }

    #[inline]
    pub fn samplers(&self) -> &[EmittedSampler] {
        self.samplers.values()
    }

    #[inline]
    pub fn images(&self) -> &[EmittedImage] {
        self.images.values()
    }

    #[inline]
    pub fn images_mut(&mut self) -> &mut [EmittedImage] {
        self.images.values_mut()
    }

    #[inline]
    pub fn textures(&self) -> &[EmittedTexture] {
        self.textures.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tex(path: &str) -> MaterialTexture {
        MaterialTexture::from_path(path)
    }

    #[test]
    fn test_sampler_table() {
        let mut cache = TextureCache::new();

        let t = cache.emit_sampler(SamplerPreset::TrilinearWrap);
        assert_eq!(
            cache.samplers()[t as usize],
            EmittedSampler {
                mag_filter: gl::LINEAR,
                min_filter: gl::LINEAR_MIPMAP_LINEAR,
                wrap_s: gl::REPEAT,
                wrap_t: gl::REPEAT,
            }
        );

        let l = cache.emit_sampler(SamplerPreset::LinearClamp);
        assert_eq!(
            cache.samplers()[l as usize],
            EmittedSampler {
                mag_filter: gl::LINEAR,
                min_filter: gl::LINEAR_MIPMAP_NEAREST,
                wrap_s: gl::CLAMP_TO_EDGE,
                wrap_t: gl::CLAMP_TO_EDGE,
            }
        );

        let n = cache.emit_sampler(SamplerPreset::NearestClamp);
        assert_eq!(cache.samplers()[n as usize].mag_filter, gl::NEAREST);
        assert_eq!(cache.samplers()[n as usize].min_filter, gl::NEAREST_MIPMAP_NEAREST);

        // Re-emitting a preset does not grow the cache.
        cache.emit_sampler(SamplerPreset::TrilinearWrap);
        assert_eq!(cache.samplers().len(), 3);
    }

    #[test]
    fn test_image_dedup_key() {
        let mut cache = TextureCache::new();

        let a = cache.emit_image(
            &tex("a.png"),
            MaterialRole::BaseColor,
            CompressionFamily::Bc,
            3,
            TextureMode::Srgb,
        );
        let same = cache.emit_image(
            &tex("a.png"),
            MaterialRole::BaseColor,
            CompressionFamily::Bc,
            3,
            TextureMode::Srgb,
        );
        let other_role = cache.emit_image(
            &tex("a.png"),
            MaterialRole::Emissive,
            CompressionFamily::Bc,
            3,
            TextureMode::Srgb,
        );
        let other_mode = cache.emit_image(
            &tex("a.png"),
            MaterialRole::BaseColor,
            CompressionFamily::Bc,
            3,
            TextureMode::Srgba,
        );

        assert_eq!(a, same);
        assert_ne!(a, other_role);
        assert_ne!(a, other_mode);
        assert_eq!(cache.images().len(), 3);
    }

    #[test]
    fn test_image_target_name() {
        let mut cache = TextureCache::new();
        let i = cache.emit_image(
            &tex("albedo.png"),
            MaterialRole::BaseColor,
            CompressionFamily::Bc,
            5,
            TextureMode::Srgb,
        );
        let image = &cache.images()[i as usize];
        assert!(image.target_relpath.ends_with(".ktx"));
        assert_eq!(image.target_mime, "image/ktx");
    }

    #[test]
    fn test_texture_pairs_dedup() {
        let mut cache = TextureCache::new();

        let a = cache.emit_texture(
            &tex("a.png"),
            SamplerPreset::TrilinearWrap,
            MaterialRole::BaseColor,
            CompressionFamily::Bc,
            3,
            TextureMode::Srgb,
        );
        let b = cache.emit_texture(
            &tex("a.png"),
            SamplerPreset::TrilinearWrap,
            MaterialRole::BaseColor,
            CompressionFamily::Bc,
            3,
            TextureMode::Srgb,
        );
        let c = cache.emit_texture(
            &tex("a.png"),
            SamplerPreset::NearestClamp,
            MaterialRole::BaseColor,
            CompressionFamily::Bc,
            3,
            TextureMode::Srgb,
        );

        assert_eq!(a, b);
        assert_ne!(a, c);
        // Same image shared by both textures.
        assert_eq!(cache.images().len(), 1);
        assert_eq!(cache.textures().len(), 2);
    }
}
