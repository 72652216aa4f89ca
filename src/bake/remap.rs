//! Content-addressed interning and source→canonical remapping.
//!
//! [`InternTable`] is the generic deduplicating store behind every bake
//! cache: fingerprint in, dense index out, payload built lazily on first
//! insertion. [`Remap`] applies it to whole input arrays, producing the
//! `source → canonical` tables the assembler walks with.

use std::collections::HashMap;

use crate::scene::{MaterialInfo, MaterialTexture, Mesh};
use crate::util::{Fingerprint, Hasher};

/// Deduplicating store keyed by fingerprint, with dense first-insertion
/// indices. Fingerprints must cover every field that participates in
/// equality; payloads are never rehashed or compared.
pub struct InternTable<V> {
    map: HashMap<Fingerprint, u32>,
    values: Vec<V>,
}

impl<V> Default for InternTable<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> InternTable<V> {
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
            values: Vec::new(),
        }
    }

    /// Return the index for `fingerprint`, building and appending the payload
    /// on first insertion.
    pub fn intern(&mut self, fingerprint: Fingerprint, make: impl FnOnce() -> V) -> u32 {
        if let Some(&index) = self.map.get(&fingerprint) {
            return index;
        }
        let index = self.values.len() as u32;
        self.values.push(make());
        self.map.insert(fingerprint, index);
        index
    }

    #[inline]
    pub fn values(&self) -> &[V] {
        &self.values
    }

    #[inline]
    pub fn values_mut(&mut self) -> &mut [V] {
        &mut self.values
    }

    #[inline]
    pub fn get(&self, index: u32) -> &V {
        &self.values[index as usize]
    }

    #[inline]
    pub fn get_mut(&mut self, index: u32) -> &mut V {
        &mut self.values[index as usize]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Source→canonical remap over one input array.
///
/// `to_index` has one entry per input element; `canonical` holds a borrow of
/// the first representative of each distinct fingerprint, in first-seen
/// order.
pub struct Remap<'a, T> {
    pub to_index: Vec<u32>,
    canonical: Vec<&'a T>,
}

impl<'a, T> Remap<'a, T> {
    /// Fingerprint every input element and build the remap tables.
    pub fn filter(input: &'a [T], mut fingerprint: impl FnMut(&T) -> Fingerprint) -> Self {
        let mut map: HashMap<Fingerprint, u32> = HashMap::new();
        let mut to_index = Vec::with_capacity(input.len());
        let mut canonical = Vec::new();

        for item in input {
            let fp = fingerprint(item);
            if let Some(&index) = map.get(&fp) {
                to_index.push(index);
            } else {
                let index = canonical.len() as u32;
                to_index.push(index);
                canonical.push(item);
                map.insert(fp, index);
            }
        }

        Self { to_index, canonical }
    }

    /// Canonical index for a source index.
    #[inline]
    pub fn remap(&self, source: u32) -> u32 {
        self.to_index[source as usize]
    }

    /// Canonical representative by canonical index.
    #[inline]
    pub fn get(&self, canonical: u32) -> &'a T {
        self.canonical[canonical as usize]
    }

    /// Number of canonical entries.
    #[inline]
    pub fn canonical_len(&self) -> usize {
        self.canonical.len()
    }
}

impl<T> Default for Remap<'_, T> {
    fn default() -> Self {
        Self {
            to_index: Vec::new(),
            canonical: Vec::new(),
        }
    }
}

fn texture_path(texture: &Option<MaterialTexture>) -> &str {
    texture.as_ref().map(|t| t.path.as_str()).unwrap_or("")
}

/// Material fingerprint: the five texture paths in fixed order, then the
/// uniform scalars and colors, then the flags.
pub fn material_fingerprint(mat: &MaterialInfo) -> Fingerprint {
    let mut h = Hasher::new();
    h.string(texture_path(&mat.base_color));
    h.string(texture_path(&mat.normal));
    h.string(texture_path(&mat.occlusion));
    h.string(texture_path(&mat.metallic_roughness));
    h.string(texture_path(&mat.emissive));

    h.f32(mat.normal_scale);
    h.f32(mat.uniform_metallic);
    h.f32(mat.uniform_roughness);
    for i in 0..4 {
        h.f32(mat.uniform_base_color[i]);
    }
    h.f32(mat.lod_bias);
    for i in 0..3 {
        h.f32(mat.uniform_emissive_color[i]);
    }
    h.u32(mat.two_sided as u32);
    h.u32(mat.pipeline as u32);

    h.get()
}

/// Mesh fingerprint. Depends on the canonical material index, so materials
/// must be filtered first. Separator words between the raw byte blocks keep
/// `positions || indices` from aliasing a different split of the same bytes.
pub fn mesh_fingerprint(mesh: &Mesh, materials: &Remap<'_, MaterialInfo>) -> Fingerprint {
    let mut h = Hasher::new();

    h.u32(mesh.topology as u32);
    h.u32(mesh.index_type as u32);
    h.u32(mesh.attribute_stride);
    h.u32(mesh.position_stride);
    h.u32(mesh.material_index.is_some() as u32);
    if let Some(material) = mesh.material_index {
        h.u32(materials.remap(material));
    }
    for layout in &mesh.attribute_layout {
        h.u32(layout.format.map_or(0, |f| f.code()));
        h.u32(layout.offset);
    }

    let lo = mesh.static_aabb.min;
    let hi = mesh.static_aabb.max;
    h.f32(lo.x);
    h.f32(lo.y);
    h.f32(lo.z);
    h.f32(hi.x);
    h.f32(hi.y);
    h.f32(hi.z);

    h.u32(0xff);
    h.data(&mesh.positions);
    h.u32(0xff);
    h.data(&mesh.indices);
    h.u32(0xff);
    h.data(&mesh.attributes);

    h.u32(mesh.count);
    h.get()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{MaterialTexture, Mesh, MeshAttribute, VertexFormat};
    use crate::util::{Aabb, Vec3};

    fn triangle(material_index: Option<u32>) -> Mesh {
        let positions: Vec<u8> = [0.0f32, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]
            .iter()
            .flat_map(|f| f.to_le_bytes())
            .collect();
        let mut mesh = Mesh {
            positions,
            position_stride: 12,
            count: 3,
            material_index,
            static_aabb: Aabb::new(Vec3::ZERO, Vec3::new(1.0, 1.0, 0.0)),
            ..Default::default()
        };
        mesh.attribute_layout[MeshAttribute::Position as usize].format =
            Some(VertexFormat::RGB32_FLOAT);
        mesh
    }

    #[test]
    fn test_intern_dense_and_stable() {
        let mut table = InternTable::new();
        let a = table.intern(1, || "a");
        let b = table.intern(2, || "b");
        let a2 = table.intern(1, || unreachable!());

        assert_eq!((a, b, a2), (0, 1, 0));
        assert_eq!(table.values(), &["a", "b"]);
    }

    #[test]
    fn test_remap_dedups_and_stays_dense() {
        let materials = vec![
            MaterialInfo::default(),
            MaterialInfo {
                uniform_metallic: 0.5,
                ..Default::default()
            },
            MaterialInfo::default(),
        ];
        let remap = Remap::filter(&materials, material_fingerprint);

        assert_eq!(remap.to_index, vec![0, 1, 0]);
        assert_eq!(remap.canonical_len(), 2);
        for &i in &remap.to_index {
            assert!((i as usize) < remap.canonical_len());
        }
    }

    #[test]
    fn test_material_fingerprint_sees_paths() {
        let a = MaterialInfo::default();
        let b = MaterialInfo {
            normal: Some(MaterialTexture::from_path("n.png")),
            ..Default::default()
        };
        assert_ne!(material_fingerprint(&a), material_fingerprint(&b));
    }

    #[test]
    fn test_mesh_fingerprint_uses_canonical_material() {
        // Source materials 0 and 2 are identical, so meshes pointing at
        // either collapse to one canonical mesh.
        let materials = vec![
            MaterialInfo::default(),
            MaterialInfo {
                two_sided: true,
                ..Default::default()
            },
            MaterialInfo::default(),
        ];
        let mat_remap = Remap::filter(&materials, material_fingerprint);

        let meshes = vec![triangle(Some(0)), triangle(Some(2)), triangle(Some(1))];
        let remap = Remap::filter(&meshes, |m| mesh_fingerprint(m, &mat_remap));

        assert_eq!(remap.to_index, vec![0, 0, 1]);
    }

    #[test]
    fn test_mesh_fingerprint_separates_blocks() {
        let mut a = triangle(None);
        let b = triangle(None);
        // Move the trailing 4 bytes of positions into indices; without the
        // separator words these would hash identically.
        let tail: Vec<u8> = a.positions.split_off(a.positions.len() - 4);
        a.indices = tail;

        let empty = Remap::<MaterialInfo>::default();
        assert_ne!(mesh_fingerprint(&a, &empty), mesh_fingerprint(&b, &empty));
    }
}
