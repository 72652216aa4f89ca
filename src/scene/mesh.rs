//! Input mesh model.
//!
//! Meshes arrive as raw interleaved byte blocks (one for positions, one for
//! the remaining attributes, one for indices) plus a per-slot layout table.
//! The bake caches treat the blocks as opaque bytes; only the layout table
//! gives them meaning.

use crate::util::Aabb;

/// Primitive topology of a mesh.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(u32)]
pub enum Topology {
    PointList = 0,
    LineList = 1,
    #[default]
    TriangleList = 2,
    TriangleStrip = 3,
}

/// Width of the index elements.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(u32)]
pub enum IndexType {
    #[default]
    U16 = 0,
    U32 = 1,
}

impl IndexType {
    /// Byte stride of one index element.
    #[inline]
    pub fn stride(self) -> u32 {
        match self {
            IndexType::U16 => 2,
            IndexType::U32 => 4,
        }
    }
}

/// Scalar element type of a vertex attribute channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum VertexElement {
    Float32 = 0,
    Unorm8 = 1,
    Snorm8 = 2,
    Uint8 = 3,
    Sint8 = 4,
    Unorm16 = 5,
    Snorm16 = 6,
    Uint16 = 7,
    Sint16 = 8,
    Uint32 = 9,
    Sint32 = 10,
}

impl VertexElement {
    /// Byte size of one element.
    #[inline]
    pub fn size(self) -> u32 {
        match self {
            VertexElement::Unorm8
            | VertexElement::Snorm8
            | VertexElement::Uint8
            | VertexElement::Sint8 => 1,
            VertexElement::Unorm16
            | VertexElement::Snorm16
            | VertexElement::Uint16
            | VertexElement::Sint16 => 2,
            VertexElement::Float32 | VertexElement::Uint32 | VertexElement::Sint32 => 4,
        }
    }
}

/// Vertex attribute format: element type plus channel count (1..=4).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct VertexFormat {
    pub element: VertexElement,
    pub count: u8,
}

impl VertexFormat {
    pub const R32_FLOAT: Self = Self::new(VertexElement::Float32, 1);
    pub const RG32_FLOAT: Self = Self::new(VertexElement::Float32, 2);
    pub const RGB32_FLOAT: Self = Self::new(VertexElement::Float32, 3);
    pub const RGBA32_FLOAT: Self = Self::new(VertexElement::Float32, 4);
    pub const RGBA8_UNORM: Self = Self::new(VertexElement::Unorm8, 4);
    pub const RGBA8_UINT: Self = Self::new(VertexElement::Uint8, 4);
    pub const RGBA16_UINT: Self = Self::new(VertexElement::Uint16, 4);
    pub const R16_UINT: Self = Self::new(VertexElement::Uint16, 1);
    pub const R32_UINT: Self = Self::new(VertexElement::Uint32, 1);

    /// Create a format from element type and channel count.
    #[inline]
    pub const fn new(element: VertexElement, count: u8) -> Self {
        Self { element, count }
    }

    /// Total byte size of one attribute value.
    #[inline]
    pub fn byte_size(self) -> u32 {
        self.element.size() * self.count as u32
    }

    /// Stable code used when fingerprinting layouts.
    #[inline]
    pub fn code(self) -> u32 {
        (self.element as u32) << 8 | self.count as u32
    }
}

/// Vertex attribute slots recognized by the exporter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(usize)]
pub enum MeshAttribute {
    Position = 0,
    Normal = 1,
    Tangent = 2,
    Uv = 3,
    VertexColor = 4,
    BoneIndex = 5,
    BoneWeights = 6,
}

impl MeshAttribute {
    /// Number of attribute slots.
    pub const COUNT: usize = 7;

    /// All slots in layout order.
    pub const ALL: [MeshAttribute; Self::COUNT] = [
        MeshAttribute::Position,
        MeshAttribute::Normal,
        MeshAttribute::Tangent,
        MeshAttribute::Uv,
        MeshAttribute::VertexColor,
        MeshAttribute::BoneIndex,
        MeshAttribute::BoneWeights,
    ];
}

/// Format and byte offset of one attribute slot. `format == None` means the
/// slot is absent from the mesh.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AttributeLayout {
    pub format: Option<VertexFormat>,
    pub offset: u32,
}

/// An input mesh: raw geometry blocks plus layout metadata.
#[derive(Clone, Debug, Default)]
pub struct Mesh {
    pub topology: Topology,
    pub index_type: IndexType,
    /// Raw position bytes, `position_stride` per vertex.
    pub positions: Vec<u8>,
    /// Raw interleaved non-position attribute bytes, `attribute_stride` per vertex.
    pub attributes: Vec<u8>,
    /// Raw index bytes. Empty for non-indexed meshes.
    pub indices: Vec<u8>,
    pub position_stride: u32,
    pub attribute_stride: u32,
    pub attribute_layout: [AttributeLayout; MeshAttribute::COUNT],
    /// Element count: number of indices when indexed, vertices otherwise.
    pub count: u32,
    pub static_aabb: Aabb,
    /// Index into `SceneInformation::materials`, if any.
    pub material_index: Option<u32>,
}

impl Mesh {
    /// Number of vertices in the position block.
    #[inline]
    pub fn vertex_count(&self) -> u32 {
        if self.position_stride == 0 {
            0
        } else {
            (self.positions.len() / self.position_stride as usize) as u32
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_sizes() {
        assert_eq!(VertexFormat::RGB32_FLOAT.byte_size(), 12);
        assert_eq!(VertexFormat::RGBA8_UNORM.byte_size(), 4);
        assert_eq!(VertexFormat::R16_UINT.byte_size(), 2);
    }

    #[test]
    fn test_format_codes_unique() {
        let formats = [
            VertexFormat::R32_FLOAT,
            VertexFormat::RGB32_FLOAT,
            VertexFormat::RGBA8_UNORM,
            VertexFormat::RGBA8_UINT,
            VertexFormat::R16_UINT,
            VertexFormat::R32_UINT,
        ];
        for (i, a) in formats.iter().enumerate() {
            for b in &formats[i + 1..] {
                assert_ne!(a.code(), b.code());
            }
        }
    }
}
