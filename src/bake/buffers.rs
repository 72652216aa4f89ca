//! Geometry baking: the shared binary blob, buffer views and accessors.
//!
//! `emit_buffer` packs raw byte blocks into one blob with 16-byte aligned
//! starts; `emit_accessor` lays typed views over them. Both deduplicate
//! independently, so two meshes sharing vertex bytes share a view, and two
//! accessors over the same view with the same shape share an index.

use super::gl;
use super::remap::InternTable;
use crate::scene::{VertexElement, VertexFormat};
use crate::util::{Aabb, Error, Hasher, Result};

/// A contiguous region of the binary blob.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BufferView {
    pub offset: usize,
    pub length: usize,
    pub stride: u32,
}

/// A typed view over a buffer view, ready for JSON emission.
#[derive(Clone, Copy, Debug)]
pub struct EmittedAccessor {
    pub view: u32,
    pub count: u32,
    pub type_name: &'static str,
    pub component: u32,
    pub offset: u32,
    pub normalized: bool,
    /// Set only for Position attributes.
    pub aabb: Option<Aabb>,
}

/// glTF accessor type name from the channel count.
pub fn accessor_type_name(format: VertexFormat) -> Result<&'static str> {
    match format.count {
        1 => Ok("SCALAR"),
        2 => Ok("VEC2"),
        3 => Ok("VEC3"),
        4 => Ok("VEC4"),
        n => Err(Error::UnsupportedFormat(n)),
    }
}

/// GL component-type code from the element type.
pub fn accessor_component(format: VertexFormat) -> u32 {
    match format.element {
        VertexElement::Float32 => gl::FLOAT,
        VertexElement::Unorm8 | VertexElement::Uint8 => gl::UNSIGNED_BYTE,
        VertexElement::Snorm8 | VertexElement::Sint8 => gl::BYTE,
        VertexElement::Unorm16 | VertexElement::Uint16 => gl::UNSIGNED_SHORT,
        VertexElement::Snorm16 | VertexElement::Sint16 => gl::SHORT,
        VertexElement::Uint32 => gl::UNSIGNED_INT,
        VertexElement::Sint32 => gl::INT,
    }
}

/// Whether the accessor is normalized fixed-point.
pub fn accessor_normalized(format: VertexFormat) -> bool {
    matches!(
        format.element,
        VertexElement::Unorm8
            | VertexElement::Snorm8
            | VertexElement::Unorm16
            | VertexElement::Snorm16
    )
}

/// Blob, buffer-view and accessor caches for one export.
#[derive(Default)]
pub struct BufferCache {
    blob: Vec<u8>,
    views: InternTable<BufferView>,
    accessors: InternTable<EmittedAccessor>,
}

impl BufferCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a byte block to the blob (aligned up to 16) and return its
    /// buffer-view index. Identical `(bytes, stride)` pairs share a view.
    pub fn emit_buffer(&mut self, bytes: &[u8], stride: u32) -> u32 {
        let mut h = Hasher::new();
        h.data(bytes);
        h.u32(stride);

        let blob = &mut self.blob;
        self.views.intern(h.get(), || {
            let offset = (blob.len() + 15) & !15;
            blob.resize(offset, 0);
            blob.extend_from_slice(bytes);
            BufferView {
                offset,
                length: bytes.len(),
                stride,
            }
        })
    }

    /// Record a typed accessor over `view` and return its index. Deduplicates
    /// on `(view, format, offset, stride, count)` independently of the view
    /// dedup.
    pub fn emit_accessor(
        &mut self,
        view: u32,
        format: VertexFormat,
        offset: u32,
        stride: u32,
        count: u32,
    ) -> Result<u32> {
        let type_name = accessor_type_name(format)?;
        let component = accessor_component(format);
        let normalized = accessor_normalized(format);

        let mut h = Hasher::new();
        h.u32(view);
        h.u32(format.code());
        h.u32(offset);
        h.u32(stride);
        h.u32(count);

        Ok(self.accessors.intern(h.get(), || EmittedAccessor {
            view,
            count,
            type_name,
            component,
            offset,
            normalized,
            aabb: None,
        }))
    }

    /// Attach an AABB to an accessor (Position attributes only).
    pub fn set_accessor_aabb(&mut self, accessor: u32, aabb: Aabb) {
        self.accessors.get_mut(accessor).aabb = Some(aabb);
    }

    #[inline]
    pub fn blob(&self) -> &[u8] {
        &self.blob
    }

    #[inline]
    pub fn views(&self) -> &[BufferView] {
        self.views.values()
    }

    #[inline]
    pub fn accessors(&self) -> &[EmittedAccessor] {
        self.accessors.values()
    }
}
