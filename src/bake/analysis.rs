//! Image analysis and compression planning.
//!
//! Each pending image runs three phases on the worker pool: load + initial
//! swizzle, compression planning (codec choice from family, role, mode and
//! pixel content), and derived swizzles. The encode phase runs later,
//! per image: mtime check, mipmap generation, then save or block-compress.
//!
//! Two swizzles come out of planning: the *image* swizzle is applied to the
//! pixels before encoding, the *output* swizzle is written to the document so
//! consumers can reconstruct the original channel layout.

use std::fs;
use std::path::Path;

use super::textures::EmittedImage;
use crate::scene::{MaterialRole, Swizzle, TextureMode};
use crate::texture::{
    compressed_format, ColorSpace, CompressionFamily, CompressorArgs, TextureCodec,
    TextureCompression, TextureImage,
};
use crate::util::Result;

/// Outcome of the analysis phases for one image. Owned exclusively by its
/// worker task until the analysis join.
pub struct AnalysisResult {
    pub image: TextureImage,
    pub compression: TextureCompression,
    pub mode: TextureMode,
    pub role: MaterialRole,
    /// Output swizzle for consumers; may contain the constants one/zero.
    pub swizzle: Swizzle,
}

/// Channel constancy classes of a metallic-roughness image. The informative
/// channel of the non-Default classes can live in a single-channel codec.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MetallicRoughnessMode {
    RoughnessMetal,
    RoughnessDielectric,
    MetallicSmooth,
    MetallicRough,
    Default,
}

/// Scan every base-level pixel once and classify the G (metallic) and
/// B (roughness) channels. Arrays and cubes are always `Default`.
pub fn metallic_roughness_mode(image: &TextureImage) -> MetallicRoughnessMode {
    if image.layers() > 1 || image.faces() > 1 {
        return MetallicRoughnessMode::Default;
    }

    let mut metallic_zero_only = true;
    let mut metallic_one_only = true;
    let mut roughness_zero_only = true;
    let mut roughness_one_only = true;

    for px in image.base_slice().chunks_exact(4) {
        if px[2] != 0xff {
            roughness_one_only = false;
        }
        if px[2] != 0 {
            roughness_zero_only = false;
        }
        if px[1] != 0xff {
            metallic_one_only = false;
        }
        if px[1] != 0 {
            metallic_zero_only = false;
        }
    }

    if !metallic_zero_only && !metallic_one_only && (roughness_one_only || roughness_zero_only) {
        if roughness_one_only {
            MetallicRoughnessMode::MetallicRough
        } else {
            MetallicRoughnessMode::MetallicSmooth
        }
    } else if !roughness_zero_only && !roughness_one_only && (metallic_one_only || metallic_zero_only)
    {
        if metallic_one_only {
            MetallicRoughnessMode::RoughnessMetal
        } else {
            MetallicRoughnessMode::RoughnessDielectric
        }
    } else {
        MetallicRoughnessMode::Default
    }
}

impl AnalysisResult {
    /// Phase B + C: pick the codec for `family` and derive both swizzles.
    pub fn deduce_compression(&mut self, family: CompressionFamily) -> Result<()> {
        use crate::scene::ChannelSource::{A, B, G, One, R, Zero};

        match family {
            CompressionFamily::Uncompressed => {
                self.compression = TextureCompression::Uncompressed;
            }

            CompressionFamily::Astc => {
                // ASTC dual-endpoint modes pack one- and two-channel data
                // efficiently, so everything stays 6x6.
                self.compression = TextureCompression::Astc6x6;
                match self.role {
                    MaterialRole::BaseColor | MaterialRole::Emissive => {}

                    MaterialRole::Occlusion => {
                        self.image.swizzle(Swizzle::splat(R))?;
                    }

                    MaterialRole::Normal => {
                        self.image.swizzle(Swizzle::new(R, R, R, G))?;
                        self.swizzle = Swizzle::new(R, A, One, One);
                    }

                    MaterialRole::MetallicRoughness => {
                        match metallic_roughness_mode(&self.image) {
                            MetallicRoughnessMode::Default => {
                                self.image.swizzle(Swizzle::new(G, G, G, B))?;
                                self.swizzle = Swizzle::new(Zero, R, A, Zero);
                            }
                            mr @ (MetallicRoughnessMode::MetallicRough
                            | MetallicRoughnessMode::MetallicSmooth) => {
                                self.image.swizzle(Swizzle::splat(B))?;
                                let g = if mr == MetallicRoughnessMode::MetallicRough {
                                    One
                                } else {
                                    Zero
                                };
                                self.swizzle = Swizzle::new(Zero, g, R, Zero);
                            }
                            mr @ (MetallicRoughnessMode::RoughnessMetal
                            | MetallicRoughnessMode::RoughnessDielectric) => {
                                self.image.swizzle(Swizzle::splat(G))?;
                                let b = if mr == MetallicRoughnessMode::RoughnessMetal {
                                    One
                                } else {
                                    Zero
                                };
                                self.swizzle = Swizzle::new(Zero, R, b, Zero);
                            }
                        }
                    }
                }
            }

            CompressionFamily::Bc => {
                match self.role {
                    MaterialRole::BaseColor | MaterialRole::Emissive => {
                        self.compression = TextureCompression::Bc7;
                    }

                    MaterialRole::Occlusion => {
                        self.compression = TextureCompression::Bc4;
                    }

                    MaterialRole::Normal => {
                        self.compression = TextureCompression::Bc5;
                    }

                    MaterialRole::MetallicRoughness => {
                        match metallic_roughness_mode(&self.image) {
                            MetallicRoughnessMode::Default => {
                                self.compression = TextureCompression::Bc5;
                                self.image.swizzle(Swizzle::new(G, B, B, A))?;
                                self.swizzle = Swizzle::new(Zero, R, G, Zero);
                            }
                            mr @ (MetallicRoughnessMode::RoughnessMetal
                            | MetallicRoughnessMode::RoughnessDielectric) => {
                                self.compression = TextureCompression::Bc4;
                                self.image.swizzle(Swizzle::splat(G))?;
                                let b = if mr == MetallicRoughnessMode::RoughnessMetal {
                                    One
                                } else {
                                    Zero
                                };
                                self.swizzle = Swizzle::new(Zero, R, b, Zero);
                            }
                            mr @ (MetallicRoughnessMode::MetallicRough
                            | MetallicRoughnessMode::MetallicSmooth) => {
                                self.compression = TextureCompression::Bc4;
                                self.image.swizzle(Swizzle::splat(B))?;
                                let g = if mr == MetallicRoughnessMode::MetallicRough {
                                    One
                                } else {
                                    Zero
                                };
                                self.swizzle = Swizzle::new(Zero, g, R, Zero);
                            }
                        }
                    }
                }

                // HDR content always goes to the float block codec, whatever
                // the role said.
                if self.mode == TextureMode::Hdr {
                    self.compression = TextureCompression::Bc6h;
                }
            }
        }

        Ok(())
    }
}

/// Phase A + B + C for one pending image.
///
/// Loads in the color space implied by the mode, applies the material
/// swizzle, then plans compression. Errors from the load are the caller's to
/// triage (load failures are non-fatal, swizzle validation is fatal).
pub fn analyze_image(codec: &dyn TextureCodec, job: &EmittedImage) -> Result<AnalysisResult> {
    let color_space = if job.mode.is_srgb() {
        ColorSpace::Srgb
    } else {
        ColorSpace::Linear
    };

    let mut image = codec.load(Path::new(&job.source_path), color_space)?;
    image.swizzle(job.swizzle)?;

    let mut result = AnalysisResult {
        image,
        compression: TextureCompression::Uncompressed,
        mode: job.mode,
        role: job.role,
        swizzle: Swizzle::IDENTITY,
    };
    result.deduce_compression(job.family)?;
    Ok(result)
}

/// Phase D for one image: skip when the target is newer than the source,
/// otherwise generate mipmaps if needed and hand the pixels to the codec.
/// Failures are logged; the export carries on without the file.
pub fn encode_image(codec: &dyn TextureCodec, target_path: &Path, job: &mut EmittedImage) {
    let Some(result) = job.analysis.as_mut() else {
        return;
    };

    if target_up_to_date(Path::new(&job.source_path), target_path) {
        log::info!(
            "Texture {} -> {} is already compressed, skipping.",
            job.source_path,
            target_path.display()
        );
        return;
    }

    if result.image.levels() == 1 {
        let color_space = if result.mode.is_srgb() {
            ColorSpace::Srgb
        } else {
            ColorSpace::Linear
        };
        match codec.generate_mipmaps(&result.image, color_space) {
            Ok(mipped) => result.image = mipped,
            Err(e) => {
                log::error!("Failed to generate mipmaps for {}: {}", job.source_path, e);
                return;
            }
        }
    }

    if result.compression == TextureCompression::Uncompressed {
        if let Err(e) = codec.save_rgba(target_path, &result.image) {
            log::error!("Failed to save uncompressed file {}: {}", target_path.display(), e);
        }
    } else {
        let args = CompressorArgs {
            output: target_path.to_path_buf(),
            format: compressed_format(result.compression, result.mode),
            quality: job.quality,
        };
        if let Err(e) = codec.compress(&args, &result.image) {
            log::error!("Failed to compress {}: {}", target_path.display(), e);
        }
    }
}

fn target_up_to_date(source: &Path, target: &Path) -> bool {
    let (Ok(src), Ok(dst)) = (fs::metadata(source), fs::metadata(target)) else {
        return false;
    };
    match (src.modified(), dst.modified()) {
        (Ok(src), Ok(dst)) => dst >= src,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::ChannelSource;

    fn result(image: TextureImage, role: MaterialRole, mode: TextureMode) -> AnalysisResult {
        AnalysisResult {
            image,
            compression: TextureCompression::Uncompressed,
            mode,
            role,
            swizzle: Swizzle::IDENTITY,
        }
    }

    /// 2x2 RGBA with per-pixel (g, b) values.
    fn mr_image(gb: [(u8, u8); 4]) -> TextureImage {
        let mut pixels = Vec::new();
        for (g, b) in gb {
            pixels.extend_from_slice(&[0, g, b, 0]);
        }
        TextureImage::from_rgba8(2, 2, pixels).unwrap()
    }

    #[test]
    fn test_mr_mode_classes() {
        // G varies, B constant 255.
        let img = mr_image([(0, 255), (128, 255), (255, 255), (7, 255)]);
        assert_eq!(metallic_roughness_mode(&img), MetallicRoughnessMode::MetallicRough);

        // G varies, B constant 0.
        let img = mr_image([(0, 0), (128, 0), (255, 0), (7, 0)]);
        assert_eq!(metallic_roughness_mode(&img), MetallicRoughnessMode::MetallicSmooth);

        // B varies, G constant 255.
        let img = mr_image([(255, 0), (255, 128), (255, 255), (255, 7)]);
        assert_eq!(metallic_roughness_mode(&img), MetallicRoughnessMode::RoughnessMetal);

        // B varies, G constant 0.
        let img = mr_image([(0, 0), (0, 128), (0, 255), (0, 7)]);
        assert_eq!(
            metallic_roughness_mode(&img),
            MetallicRoughnessMode::RoughnessDielectric
        );

        // Both vary.
        let img = mr_image([(0, 0), (128, 128), (255, 255), (7, 7)]);
        assert_eq!(metallic_roughness_mode(&img), MetallicRoughnessMode::Default);

        // Both constant: no informative channel to isolate.
        let img = mr_image([(255, 255); 4]);
        assert_eq!(metallic_roughness_mode(&img), MetallicRoughnessMode::Default);
    }

    #[test]
    fn test_mr_mode_cube_is_default() {
        // Six faces with G varying and B constant would be MetallicRough as
        // a 2D image, but faces force Default.
        let face: Vec<u8> = [(0u8, 255u8), (128, 255), (255, 255), (7, 255)]
            .iter()
            .flat_map(|&(g, b)| [0, g, b, 0])
            .collect();
        let level: Vec<u8> = face.iter().copied().cycle().take(face.len() * 6).collect();
        let img = TextureImage::from_levels(2, 2, 1, 6, vec![level]).unwrap();
        assert_eq!(metallic_roughness_mode(&img), MetallicRoughnessMode::Default);
    }

    #[test]
    fn test_bc_metallic_rough_plan() -> Result<()> {
        // Spec scenario: G varying, B all 255, BC family.
        let img = mr_image([(0, 255), (128, 255), (255, 255), (7, 255)]);
        let mut r = result(img, MaterialRole::MetallicRoughness, TextureMode::Rgb);
        r.deduce_compression(CompressionFamily::Bc)?;

        assert_eq!(r.compression, TextureCompression::Bc4);
        // Image pixels are now the roughness channel broadcast: all 255.
        assert!(r.image.base_pixels().iter().all(|&b| b == 255));
        // Output swizzle {R: ZERO, G: ONE, B: R, A: ZERO} -> codes [5,4,0,5].
        assert_eq!(r.swizzle.gltf_codes(), [5, 4, 0, 5]);
        Ok(())
    }

    #[test]
    fn test_bc_roughness_dielectric_plan() -> Result<()> {
        let img = mr_image([(0, 0), (0, 128), (0, 255), (0, 7)]);
        let mut r = result(img, MaterialRole::MetallicRoughness, TextureMode::Rgb);
        r.deduce_compression(CompressionFamily::Bc)?;

        assert_eq!(r.compression, TextureCompression::Bc4);
        assert_eq!(
            r.swizzle,
            Swizzle::new(
                ChannelSource::Zero,
                ChannelSource::R,
                ChannelSource::Zero,
                ChannelSource::Zero
            )
        );
        Ok(())
    }

    #[test]
    fn test_bc_mr_default_plan_roundtrip() -> Result<()> {
        let img = mr_image([(10, 20), (30, 40), (50, 60), (70, 80)]);
        let source: Vec<u8> = img.base_pixels().to_vec();
        let mut r = result(img, MaterialRole::MetallicRoughness, TextureMode::Rgb);
        r.deduce_compression(CompressionFamily::Bc)?;

        assert_eq!(r.compression, TextureCompression::Bc5);

        // Reconstruct through the output swizzle: each consumer channel pulls
        // from the encoded pixels (or the constants). G and B of the source
        // must survive; R and A are zeroed by plan.
        let codes = r.swizzle.gltf_codes();
        for (encoded, original) in r.image.base_pixels().chunks_exact(4).zip(source.chunks_exact(4))
        {
            let reconstruct = |code: u32| -> u8 {
                match code {
                    0..=3 => encoded[code as usize],
                    4 => 255,
                    _ => 0,
                }
            };
            assert_eq!(reconstruct(codes[0]), 0);
            assert_eq!(reconstruct(codes[1]), original[1]);
            assert_eq!(reconstruct(codes[2]), original[2]);
            assert_eq!(reconstruct(codes[3]), 0);
        }
        Ok(())
    }

    #[test]
    fn test_astc_normal_plan() -> Result<()> {
        let img = TextureImage::from_rgba8(1, 1, vec![100, 200, 0, 0]).unwrap();
        let mut r = result(img, MaterialRole::Normal, TextureMode::Rgb);
        r.deduce_compression(CompressionFamily::Astc)?;

        assert_eq!(r.compression, TextureCompression::Astc6x6);
        // X broadcast to RGB, Y in alpha.
        assert_eq!(r.image.base_pixels(), &[100, 100, 100, 200]);
        assert_eq!(
            r.swizzle,
            Swizzle::new(
                ChannelSource::R,
                ChannelSource::A,
                ChannelSource::One,
                ChannelSource::One
            )
        );
        Ok(())
    }

    #[test]
    fn test_bc_normal_stays_identity() -> Result<()> {
        let img = TextureImage::from_rgba8(1, 1, vec![1, 2, 3, 4]).unwrap();
        let mut r = result(img, MaterialRole::Normal, TextureMode::Rgb);
        r.deduce_compression(CompressionFamily::Bc)?;

        assert_eq!(r.compression, TextureCompression::Bc5);
        assert!(r.swizzle.is_identity());
        assert_eq!(r.image.base_pixels(), &[1, 2, 3, 4]);
        Ok(())
    }

    #[test]
    fn test_hdr_override_beats_role() -> Result<()> {
        let img = TextureImage::solid(4, 4, [0, 0, 0, 0]);
        let mut r = result(img, MaterialRole::Emissive, TextureMode::Hdr);
        r.deduce_compression(CompressionFamily::Bc)?;

        assert_eq!(r.compression, TextureCompression::Bc6h);
        assert!(r.swizzle.is_identity());
        Ok(())
    }

    #[test]
    fn test_uncompressed_family_ignores_role() -> Result<()> {
        let img = TextureImage::solid(2, 2, [1, 2, 3, 4]);
        let mut r = result(img, MaterialRole::MetallicRoughness, TextureMode::Rgb);
        r.deduce_compression(CompressionFamily::Uncompressed)?;

        assert_eq!(r.compression, TextureCompression::Uncompressed);
        assert!(r.swizzle.is_identity());
        assert_eq!(r.image.base_pixels(), &[1, 2, 3, 4]);
        Ok(())
    }

    #[test]
    fn test_astc_occlusion_broadcast() -> Result<()> {
        let img = TextureImage::from_rgba8(1, 1, vec![42, 0, 0, 0]).unwrap();
        let mut r = result(img, MaterialRole::Occlusion, TextureMode::Rgb);
        r.deduce_compression(CompressionFamily::Astc)?;

        assert_eq!(r.compression, TextureCompression::Astc6x6);
        assert_eq!(r.image.base_pixels(), &[42, 42, 42, 42]);
        assert!(r.swizzle.is_identity());
        Ok(())
    }
}
