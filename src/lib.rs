//! # glb-export
//!
//! Serializes an in-memory 3D scene graph (meshes, materials, textures,
//! cameras, lights, image-based environment) into a self-contained binary
//! glTF 2.0 container (`.glb`), with compressed texture files written next
//! to it.
//!
//! The interesting part is the bake pipeline: content-addressed caches turn
//! a possibly-redundant scene into the flat index-referenced arrays glTF
//! wants, and a per-image analysis pass picks a block-compression codec and
//! channel packing per material role before dispatching encodes on a worker
//! pool.
//!
//! ## Modules
//!
//! - [`util`] - Basic types (errors, fingerprint hashing, math)
//! - [`scene`] - Input scene model
//! - [`texture`] - RGBA8 texture container and the codec seam
//! - [`bake`] - Deduplicating bake caches and the compression planner
//! - [`export`] - Document assembly and the GLB container writer
//!
//! ## Example
//!
//! ```ignore
//! use glb_export::prelude::*;
//!
//! let scene = SceneInformation::default();
//! export_scene_to_glb(&scene, "out.glb".as_ref(), &ExportOptions::default(), &codec)?;
//! ```

pub mod bake;
pub mod export;
pub mod scene;
pub mod texture;
pub mod util;

// Re-export commonly used types
pub use export::{export_scene_to_glb, EnvironmentOptions, ExportOptions};
pub use util::{Error, Result};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::export::{export_scene_to_glb, EnvironmentOptions, ExportOptions};
    pub use crate::scene::*;
    pub use crate::texture::{
        ColorSpace, CompressionFamily, CompressorArgs, TextureCodec, TextureImage,
    };
    pub use crate::util::{Aabb, Error, Result};
}
