//! Input scene model.
//!
//! The exporter consumes a [`SceneInformation`]: flat arrays of meshes,
//! materials, nodes, cameras and lights, already parsed into memory. Nodes
//! reference meshes and each other by index; cameras and lights reference
//! their node by index.

pub mod material;
pub mod mesh;

pub use material::*;
pub use mesh::*;

use crate::util::{Quat, Vec3};

/// Decomposed node transform.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

/// A scene graph node.
#[derive(Clone, Debug, Default)]
pub struct NodeInfo {
    /// Child node indices.
    pub children: Vec<u32>,
    /// Indices into `SceneInformation::meshes`. A node with several entries
    /// becomes one glTF mesh with several primitives.
    pub meshes: Vec<u32>,
    pub transform: Transform,
}

/// Camera projection parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CameraProjection {
    Perspective {
        aspect_ratio: f32,
        yfov: f32,
        znear: f32,
        zfar: f32,
    },
    Orthographic {
        xmag: f32,
        ymag: f32,
        znear: f32,
        zfar: f32,
    },
}

/// A camera, optionally attached to a node.
#[derive(Clone, Copy, Debug)]
pub struct CameraInfo {
    pub attached_node: Option<u32>,
    pub projection: CameraProjection,
}

/// Light shapes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LightKind {
    /// Cone light. Cones are stored as cosines of the half angles.
    Spot { inner_cone: f32, outer_cone: f32 },
    Point,
    Directional,
    Ambient,
}

/// A light, optionally attached to a node.
#[derive(Clone, Copy, Debug)]
pub struct LightInfo {
    pub attached_node: Option<u32>,
    pub color: Vec3,
    pub constant_falloff: f32,
    pub linear_falloff: f32,
    pub quadratic_falloff: f32,
    pub kind: LightKind,
}

/// The complete in-memory scene handed to the exporter.
#[derive(Clone, Debug, Default)]
pub struct SceneInformation {
    pub materials: Vec<MaterialInfo>,
    pub meshes: Vec<Mesh>,
    pub nodes: Vec<NodeInfo>,
    pub cameras: Vec<CameraInfo>,
    pub lights: Vec<LightInfo>,
}
