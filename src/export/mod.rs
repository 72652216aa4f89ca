//! Scene export entry point.
//!
//! Execution order is fixed: filter materials, filter meshes, emit the
//! environment, walk nodes (which populates every bake cache on demand), run
//! the image analysis pool to completion, serialize the document, run the
//! encode pool to completion, write the container.

mod document;
mod glb;

use std::collections::HashMap;
use std::path::Path;

use rayon::prelude::*;

use crate::bake::{analyze_image, encode_image, BakeState};
use crate::scene::{SceneInformation, Transform};
use crate::texture::{CompressionFamily, TextureCodec};
use crate::util::{Error, Result, Vec3};

/// Image-based environment to bundle with the scene. Only honored when
/// `cube` is set.
#[derive(Clone, Debug)]
pub struct EnvironmentOptions {
    pub cube: Option<String>,
    pub reflection: Option<String>,
    pub irradiance: Option<String>,
    pub intensity: f32,
    pub fog_color: Vec3,
    pub fog_falloff: f32,
    pub compression: CompressionFamily,
    pub texcomp_quality: u32,
}

impl Default for EnvironmentOptions {
    fn default() -> Self {
        Self {
            cube: None,
            reflection: None,
            irradiance: None,
            intensity: 1.0,
            fog_color: Vec3::ZERO,
            fog_falloff: 1.0,
            compression: CompressionFamily::Bc,
            texcomp_quality: 3,
        }
    }
}

/// Options for one export call.
#[derive(Clone, Debug)]
pub struct ExportOptions {
    /// Worker threads for analysis and encoding. 0 = hardware concurrency.
    pub threads: usize,
    pub compression: CompressionFamily,
    pub texcomp_quality: u32,
    pub environment: EnvironmentOptions,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            threads: 0,
            compression: CompressionFamily::Bc,
            texcomp_quality: 3,
            environment: EnvironmentOptions::default(),
        }
    }
}

/// Per-node emission record collected during the walk, consumed by the
/// document builder.
pub(crate) struct EmittedNode {
    pub(crate) children: Vec<u32>,
    pub(crate) mesh_group: Option<u32>,
    pub(crate) camera: Option<u32>,
    pub(crate) light: Option<u32>,
    pub(crate) transform: Transform,
}

/// Export a scene into a self-contained `.glb` at `path`. Compressed texture
/// files are written next to it by the codec.
pub fn export_scene_to_glb(
    scene: &SceneInformation,
    path: &Path,
    options: &ExportOptions,
    codec: &dyn TextureCodec,
) -> Result<()> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(options.threads)
        .build()
        .map_err(|e| Error::other(format!("failed to start worker pool: {}", e)))?;

    let mut state = BakeState::new(options.compression, options.texcomp_quality);
    state.filter_scene(scene);

    if options.environment.cube.is_some() {
        let env = &options.environment;
        state.emit_environment(
            env.cube.as_deref(),
            env.reflection.as_deref(),
            env.irradiance.as_deref(),
            env.intensity,
            env.fog_color,
            env.fog_falloff,
            env.compression,
            env.texcomp_quality,
        );
    }

    // Cameras and lights reference nodes; invert that before the walk.
    let mut node_camera = HashMap::new();
    for (index, camera) in scene.cameras.iter().enumerate() {
        if let Some(node) = camera.attached_node {
            node_camera.entry(node).or_insert(index as u32);
        }
    }
    let mut node_light = HashMap::new();
    for (index, light) in scene.lights.iter().enumerate() {
        if let Some(node) = light.attached_node {
            node_light.entry(node).or_insert(index as u32);
        }
    }

    let mut nodes = Vec::with_capacity(scene.nodes.len());
    for (index, node) in scene.nodes.iter().enumerate() {
        let mesh_group = if node.meshes.is_empty() {
            None
        } else {
            Some(state.emit_meshes(&node.meshes)?)
        };
        nodes.push(EmittedNode {
            children: node.children.clone(),
            mesh_group,
            camera: node_camera.get(&(index as u32)).copied(),
            light: node_light.get(&(index as u32)).copied(),
            transform: node.transform,
        });
    }

    // Analysis phase: load, swizzle and plan every pending image. The join
    // here is what lets the document read final swizzles. Load failures are
    // logged and leave the job unanalyzed; validation failures abort.
    {
        let images = state.textures.images_mut();
        pool.install(|| {
            images.par_iter_mut().try_for_each(|job| {
                match analyze_image(codec, job) {
                    Ok(result) => {
                        job.analysis = Some(result);
                        Ok(())
                    }
                    Err(e @ Error::InvalidSwizzle(_)) => Err(e),
                    Err(e) => {
                        log::error!("Failed to load image {}: {}", job.source_path, e);
                        Ok(())
                    }
                }
            })
        })?;
    }

    let document = document::build_document(scene, &state, &nodes);
    let json = serde_json::to_vec_pretty(&document)?;

    // Encode phase: mipmap + compress every analyzed image, in parallel
    // across images. Must drain before the export returns.
    {
        let target_dir = path.parent().unwrap_or_else(|| Path::new("")).to_path_buf();
        let images = state.textures.images_mut();
        pool.install(|| {
            images.par_iter_mut().for_each(|job| {
                let target = target_dir.join(&job.target_relpath);
                encode_image(codec, &target, job);
            })
        });
    }

    glb::write_glb(path, &json, state.buffers.blob())
}
