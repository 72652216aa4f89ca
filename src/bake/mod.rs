//! The bake pipeline.
//!
//! Content-addressed caches that flatten a heterogeneous scene into the
//! dense, index-referenced arrays the container format wants:
//!
//! - [`remap`] - generic interning and source→canonical remapping
//! - [`buffers`] - binary blob, buffer views and accessors
//! - [`textures`] - samplers, images and texture pairs
//! - [`analysis`] - per-image compression planning and encoding
//!
//! [`BakeState`] ties them together for one export: materials are filtered
//! first (mesh fingerprints depend on canonical material indices), then
//! meshes, then the node walk emits everything else on demand.

pub mod analysis;
pub mod buffers;
pub mod gl;
pub mod remap;
pub mod textures;

pub use analysis::*;
pub use buffers::*;
pub use remap::*;
pub use textures::*;

use std::collections::HashSet;

use crate::scene::{
    DrawPipeline, MaterialInfo, MaterialRole, MaterialTexture, Mesh, MeshAttribute, SamplerPreset,
    SceneInformation, TextureMode, VertexFormat,
};
use crate::texture::CompressionFamily;
use crate::util::{Hasher, Result, Vec3, Vec4};

/// A baked mesh primitive: accessor indices per attribute slot plus the
/// source material reference (remapped at document time).
#[derive(Clone, Copy, Debug, Default)]
pub struct EmittedMesh {
    pub index_accessor: Option<u32>,
    /// Source material index.
    pub material: Option<u32>,
    pub attribute_accessors: [Option<u32>; MeshAttribute::COUNT],
}

/// A baked material: texture-cache indices plus the uniform state.
#[derive(Clone, Copy, Debug)]
pub struct EmittedMaterial {
    pub base_color: Option<u32>,
    pub normal: Option<u32>,
    pub metallic_roughness: Option<u32>,
    pub occlusion: Option<u32>,
    pub emissive: Option<u32>,

    pub uniform_base_color: Vec4,
    pub uniform_emissive_color: Vec3,
    pub uniform_metallic: f32,
    pub uniform_roughness: f32,
    pub normal_scale: f32,
    pub pipeline: DrawPipeline,
    pub two_sided: bool,
}

impl Default for EmittedMaterial {
    fn default() -> Self {
        Self {
            base_color: None,
            normal: None,
            metallic_roughness: None,
            occlusion: None,
            emissive: None,
            uniform_base_color: Vec4::ONE,
            uniform_emissive_color: Vec3::ZERO,
            uniform_metallic: 1.0,
            uniform_roughness: 1.0,
            normal_scale: 1.0,
            pipeline: DrawPipeline::Opaque,
            two_sided: false,
        }
    }
}

/// A baked image-based environment.
#[derive(Clone, Copy, Debug)]
pub struct EmittedEnvironment {
    pub cube: Option<u32>,
    pub reflection: Option<u32>,
    pub irradiance: Option<u32>,
    pub intensity: f32,
    pub fog_color: Vec3,
    pub fog_falloff: f32,
}

/// All bake caches for one export call. Created empty, mutated only by the
/// assembler thread, dropped when the container is written.
#[derive(Default)]
pub struct BakeState<'scene> {
    family: CompressionFamily,
    quality: u32,

    pub material: Remap<'scene, MaterialInfo>,
    pub mesh: Remap<'scene, Mesh>,

    pub buffers: BufferCache,
    pub textures: TextureCache,

    /// Baked materials, indexed by canonical material index. Grows on demand;
    /// gaps hold default records.
    pub materials: Vec<EmittedMaterial>,
    materials_emitted: HashSet<u32>,

    /// Baked primitives, indexed by canonical mesh index.
    pub meshes: Vec<EmittedMesh>,
    meshes_emitted: HashSet<u32>,

    /// Ordered canonical submesh sequences, deduplicated.
    pub mesh_groups: InternTable<Vec<u32>>,

    pub environments: Vec<EmittedEnvironment>,
}

impl<'scene> BakeState<'scene> {
    pub fn new(family: CompressionFamily, quality: u32) -> Self {
        Self {
            family,
            quality,
            ..Default::default()
        }
    }

    /// Fingerprint all materials, then all meshes. Materials must go first:
    /// mesh fingerprints embed canonical material indices.
    pub fn filter_scene(&mut self, scene: &'scene SceneInformation) {
        self.material = Remap::filter(&scene.materials, material_fingerprint);
        self.mesh = Remap::filter(&scene.meshes, |m| mesh_fingerprint(m, &self.material));
    }

    /// Bake one canonical material: emit its textures and copy the uniforms.
    fn emit_material(&mut self, canonical: u32) {
        let material = self.material.get(canonical);
        if self.materials.len() <= canonical as usize {
            self.materials
                .resize_with(canonical as usize + 1, EmittedMaterial::default);
        }

        let mut output = EmittedMaterial::default();

        if let Some(normal) = &material.normal {
            output.normal = Some(self.textures.emit_texture(
                normal,
                material.sampler,
                MaterialRole::Normal,
                self.family,
                self.quality,
                TextureMode::Rgb,
            ));
        }

        if let Some(occlusion) = &material.occlusion {
            output.occlusion = Some(self.textures.emit_texture(
                occlusion,
                material.sampler,
                MaterialRole::Occlusion,
                self.family,
                self.quality,
                TextureMode::Rgb,
            ));
        }

        if let Some(base_color) = &material.base_color {
            // Alpha-carrying pipelines need the alpha channel kept through
            // compression.
            let mode = if material.pipeline != DrawPipeline::Opaque {
                TextureMode::Srgba
            } else {
                TextureMode::Srgb
            };
            output.base_color = Some(self.textures.emit_texture(
                base_color,
                material.sampler,
                MaterialRole::BaseColor,
                self.family,
                self.quality,
                mode,
            ));
        }

        if let Some(metallic_roughness) = &material.metallic_roughness {
            output.metallic_roughness = Some(self.textures.emit_texture(
                metallic_roughness,
                material.sampler,
                MaterialRole::MetallicRoughness,
                self.family,
                self.quality,
                TextureMode::Rgb,
            ));
        }

        if let Some(emissive) = &material.emissive {
            output.emissive = Some(self.textures.emit_texture(
                emissive,
                material.sampler,
                MaterialRole::Emissive,
                self.family,
                self.quality,
                TextureMode::Srgb,
            ));
        }

        output.uniform_base_color = material.uniform_base_color;
        output.uniform_emissive_color = material.uniform_emissive_color;
        output.uniform_metallic = material.uniform_metallic;
        output.uniform_roughness = material.uniform_roughness;
        output.normal_scale = material.normal_scale;
        output.pipeline = material.pipeline;
        output.two_sided = material.two_sided;

        self.materials[canonical as usize] = output;
    }

    /// Bake one canonical mesh: pack its byte blocks and lay accessors over
    /// them. Also bakes the referenced material on first sight.
    fn emit_mesh(&mut self, canonical: u32) -> Result<()> {
        let mesh = self.mesh.get(canonical);
        if self.meshes.len() <= canonical as usize {
            self.meshes
                .resize_with(canonical as usize + 1, EmittedMesh::default);
        }

        let mut emit = EmittedMesh {
            material: mesh.material_index,
            ..Default::default()
        };

        if !mesh.indices.is_empty() {
            let stride = mesh.index_type.stride();
            let view = self.buffers.emit_buffer(&mesh.indices, stride);
            let format = match mesh.index_type {
                crate::scene::IndexType::U16 => VertexFormat::R16_UINT,
                crate::scene::IndexType::U32 => VertexFormat::R32_UINT,
            };
            emit.index_accessor = Some(self.buffers.emit_accessor(view, format, 0, stride, mesh.count)?);
        }

        if let Some(source_material) = mesh.material_index {
            let remapped = self.material.remap(source_material);
            if self.materials_emitted.insert(remapped) {
                self.emit_material(remapped);
            }
        }

        let mut position_buffer = 0;
        let mut attribute_buffer = 0;
        if !mesh.positions.is_empty() {
            position_buffer = self.buffers.emit_buffer(&mesh.positions, mesh.position_stride);
        }
        if !mesh.attributes.is_empty() {
            attribute_buffer = self
                .buffers
                .emit_buffer(&mesh.attributes, mesh.attribute_stride);
        }

        for attr in MeshAttribute::ALL {
            let layout = mesh.attribute_layout[attr as usize];
            let Some(format) = layout.format else {
                continue;
            };

            let accessor = if attr == MeshAttribute::Position {
                let count = mesh.vertex_count();
                let accessor = self.buffers.emit_accessor(
                    position_buffer,
                    format,
                    layout.offset,
                    mesh.position_stride,
                    count,
                )?;
                self.buffers.set_accessor_aabb(accessor, mesh.static_aabb);
                accessor
            } else {
                let count = if mesh.attribute_stride == 0 {
                    0
                } else {
                    (mesh.attributes.len() / mesh.attribute_stride as usize) as u32
                };
                self.buffers.emit_accessor(
                    attribute_buffer,
                    format,
                    layout.offset,
                    mesh.attribute_stride,
                    count,
                )?
            };
            emit.attribute_accessors[attr as usize] = Some(accessor);
        }

        self.meshes[canonical as usize] = emit;
        Ok(())
    }

    /// Bake the mesh list of one node into a deduplicated mesh group and
    /// return its index. Two nodes with the same remapped sequence share one
    /// group.
    pub fn emit_meshes(&mut self, source_meshes: &[u32]) -> Result<u32> {
        let mut h = Hasher::new();
        let mut group = Vec::with_capacity(source_meshes.len());

        for &source in source_meshes {
            let remapped = self.mesh.remap(source);
            h.u32(remapped);
            group.push(remapped);

            if self.meshes_emitted.insert(remapped) {
                self.emit_mesh(remapped)?;
            }
        }

        Ok(self.mesh_groups.intern(h.get(), || group))
    }

    /// Bake the image-based environment: up to three HDR cube textures plus
    /// fog parameters. Not deduplicated.
    #[allow(clippy::too_many_arguments)]
    pub fn emit_environment(
        &mut self,
        cube: Option<&str>,
        reflection: Option<&str>,
        irradiance: Option<&str>,
        intensity: f32,
        fog_color: Vec3,
        fog_falloff: f32,
        family: CompressionFamily,
        quality: u32,
    ) {
        let mut emit_cube = |textures: &mut TextureCache, path: &str| {
            textures.emit_texture(
                &MaterialTexture::from_path(path),
                SamplerPreset::LinearClamp,
                MaterialRole::Emissive,
                family,
                quality,
                TextureMode::Hdr,
            )
        };

        let env = EmittedEnvironment {
            cube: cube.map(|p| emit_cube(&mut self.textures, p)),
            reflection: reflection.map(|p| emit_cube(&mut self.textures, p)),
            irradiance: irradiance.map(|p| emit_cube(&mut self.textures, p)),
            intensity,
            fog_color,
            fog_falloff,
        };
        self.environments.push(env);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{AttributeLayout, IndexType, MaterialTexture};
    use crate::util::Aabb;

    fn scene_with_shared_mesh() -> SceneInformation {
        let positions: Vec<u8> = [0.0f32, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]
            .iter()
            .flat_map(|f| f.to_le_bytes())
            .collect();
        let indices: Vec<u8> = [0u16, 1, 2].iter().flat_map(|i| i.to_le_bytes()).collect();

        let mut mesh = Mesh {
            positions,
            indices,
            index_type: IndexType::U16,
            position_stride: 12,
            count: 3,
            material_index: Some(0),
            static_aabb: Aabb::new(Vec3::ZERO, Vec3::new(1.0, 1.0, 0.0)),
            ..Default::default()
        };
        mesh.attribute_layout[MeshAttribute::Position as usize] = AttributeLayout {
            format: Some(VertexFormat::RGB32_FLOAT),
            offset: 0,
        };

        SceneInformation {
            materials: vec![MaterialInfo {
                base_color: Some(MaterialTexture::from_path("albedo.png")),
                ..Default::default()
            }],
            meshes: vec![mesh.clone(), mesh],
            ..Default::default()
        }
    }

    #[test]
    fn test_mesh_groups_dedup() -> Result<()> {
        let scene = scene_with_shared_mesh();
        let mut state = BakeState::new(CompressionFamily::Bc, 3);
        state.filter_scene(&scene);

        // Two nodes pointing at byte-identical meshes share one group.
        let a = state.emit_meshes(&[0])?;
        let b = state.emit_meshes(&[1])?;

        assert_eq!(a, b);
        assert_eq!(state.mesh_groups.len(), 1);
        assert_eq!(state.meshes.len(), 1);
        Ok(())
    }

    #[test]
    fn test_emit_mesh_accessors() -> Result<()> {
        let scene = scene_with_shared_mesh();
        let mut state = BakeState::new(CompressionFamily::Bc, 3);
        state.filter_scene(&scene);
        state.emit_meshes(&[0])?;

        let emitted = &state.meshes[0];
        let position = emitted.attribute_accessors[MeshAttribute::Position as usize]
            .expect("position accessor");
        let index = emitted.index_accessor.expect("index accessor");

        let accessors = state.buffers.accessors();
        assert_eq!(accessors[position as usize].type_name, "VEC3");
        assert_eq!(accessors[position as usize].count, 3);
        assert!(accessors[position as usize].aabb.is_some());

        assert_eq!(accessors[index as usize].type_name, "SCALAR");
        assert_eq!(accessors[index as usize].component, gl::UNSIGNED_SHORT);
        assert!(accessors[index as usize].aabb.is_none());
        Ok(())
    }

    #[test]
    fn test_material_texture_slots_resolve() -> Result<()> {
        let scene = scene_with_shared_mesh();
        let mut state = BakeState::new(CompressionFamily::Bc, 3);
        state.filter_scene(&scene);
        state.emit_meshes(&[0])?;

        // The material referenced a base-color texture, so the baked slot
        // must resolve to a valid texture index.
        let material = &state.materials[0];
        let texture = material.base_color.expect("base color texture");
        let texture = state.textures.textures()[texture as usize];
        assert!((texture.image as usize) < state.textures.images().len());
        assert!((texture.sampler as usize) < state.textures.samplers().len());
        Ok(())
    }

    #[test]
    fn test_environment_emits_hdr_cubes() {
        let mut state = BakeState::new(CompressionFamily::Bc, 3);
        state.emit_environment(
            Some("cube.hdr"),
            Some("refl.hdr"),
            None,
            1.5,
            Vec3::new(0.2, 0.3, 0.4),
            0.05,
            CompressionFamily::Bc,
            4,
        );

        let env = &state.environments[0];
        assert!(env.cube.is_some());
        assert!(env.reflection.is_some());
        assert!(env.irradiance.is_none());

        for image in state.textures.images() {
            assert_eq!(image.mode, TextureMode::Hdr);
            assert_eq!(image.role, MaterialRole::Emissive);
        }
        assert_eq!(state.textures.samplers().len(), 1);
    }
}
