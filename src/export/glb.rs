//! GLB container framing.
//!
//! 12-byte header, then a JSON chunk padded with ASCII spaces and a BIN
//! chunk padded with zeroes, both to 4-byte boundaries. Everything is
//! little-endian.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use byteorder::{LittleEndian, WriteBytesExt};

use crate::util::Result;

const GLB_MAGIC: &[u8; 4] = b"glTF";
const GLB_VERSION: u32 = 2;
const CHUNK_JSON: &[u8; 4] = b"JSON";
const CHUNK_BIN: &[u8; 4] = b"BIN\0";

#[inline]
fn align4(size: usize) -> usize {
    (size + 3) & !3
}

/// Frame the JSON document and binary blob into a `.glb` file.
pub fn write_glb(path: &Path, json: &[u8], blob: &[u8]) -> Result<()> {
    let total = 12 + 8 + align4(json.len()) + 8 + align4(blob.len());

    let file = File::create(path).map_err(|e| {
        log::error!("Failed to open file: {}", path.display());
        e
    })?;
    let mut writer = BufWriter::new(file);

    writer.write_all(GLB_MAGIC)?;
    writer.write_u32::<LittleEndian>(GLB_VERSION)?;
    writer.write_u32::<LittleEndian>(total as u32)?;

    writer.write_u32::<LittleEndian>(align4(json.len()) as u32)?;
    writer.write_all(CHUNK_JSON)?;
    writer.write_all(json)?;
    for _ in json.len()..align4(json.len()) {
        writer.write_u8(b' ')?;
    }

    writer.write_u32::<LittleEndian>(align4(blob.len()) as u32)?;
    writer.write_all(CHUNK_BIN)?;
    writer.write_all(blob)?;
    for _ in blob.len()..align4(blob.len()) {
        writer.write_u8(0)?;
    }

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile::NamedTempFile;

    #[test]
    fn test_glb_framing() -> Result<()> {
        let temp = NamedTempFile::new()?;
        let json = br#"{"asset":{}}"#; // 12 bytes, already aligned
        let blob = [1u8, 2, 3];

        write_glb(temp.path(), json, &blob)?;

        let mut bytes = Vec::new();
        File::open(temp.path())?.read_to_end(&mut bytes)?;

        assert_eq!(&bytes[0..4], GLB_MAGIC);
        assert_eq!(u32::from_le_bytes(bytes[4..8].try_into().unwrap()), 2);
        let total = u32::from_le_bytes(bytes[8..12].try_into().unwrap()) as usize;
        assert_eq!(total, bytes.len());
        assert_eq!(total, 12 + 8 + 12 + 8 + 4);

        assert_eq!(u32::from_le_bytes(bytes[12..16].try_into().unwrap()), 12);
        assert_eq!(&bytes[16..20], CHUNK_JSON);
        assert_eq!(&bytes[20..32], json);

        assert_eq!(u32::from_le_bytes(bytes[32..36].try_into().unwrap()), 4);
        assert_eq!(&bytes[36..40], CHUNK_BIN);
        assert_eq!(&bytes[40..43], &blob);
        assert_eq!(bytes[43], 0); // zero padding

        Ok(())
    }

    #[test]
    fn test_json_padding_is_spaces() -> Result<()> {
        let temp = NamedTempFile::new()?;
        let json = b"{}"; // pads to 4 with two spaces
        write_glb(temp.path(), json, &[])?;

        let mut bytes = Vec::new();
        File::open(temp.path())?.read_to_end(&mut bytes)?;

        assert_eq!(u32::from_le_bytes(bytes[12..16].try_into().unwrap()), 4);
        assert_eq!(&bytes[20..24], b"{}  ");
        Ok(())
    }
}
