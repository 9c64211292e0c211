//! Length-prefixed chunk framing shared by the asset files.
//!
//! ```text
//! magic[4]  len:u32 (LE)  payload[len]
//! ```
//! `len` must be a whole number of elements.

use std::io::{self, Read, Write};

use byteorder::{LittleEndian as LE, ReadBytesExt, WriteBytesExt};
use glam::{UVec3, Vec3};

use super::bundle::BundleError;

pub type Magic = [u8; 4];

/// Read one chunk header + payload, checking magic and element size.
pub fn read_chunk<R: Read>(r: &mut R, magic: &Magic, elem_size: usize) -> Result<Vec<u8>, BundleError> {
    let mut found = [0u8; 4];
    r.read_exact(&mut found)?;
    if &found != magic {
        return Err(BundleError::BadMagic {
            expected: *magic,
            found,
        });
    }

    let len = r.read_u32::<LE>()? as usize;
    if len % elem_size != 0 {
        return Err(BundleError::BadChunkSize {
            magic: *magic,
            len,
            elem_size,
        });
    }

    // grow with the bytes actually present, never with the header's claim
    let mut payload = Vec::new();
    r.take(len as u64).read_to_end(&mut payload)?;
    if payload.len() != len {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!(
                "chunk '{}' claims {len} bytes, only {} present",
                String::from_utf8_lossy(magic),
                payload.len()
            ),
        )
        .into());
    }
    Ok(payload)
}

pub fn read_vec3s<R: Read>(r: &mut R, magic: &Magic) -> Result<Vec<Vec3>, BundleError> {
    let payload = read_chunk(r, magic, 12)?;
    let mut cur = payload.as_slice();
    let mut out = Vec::with_capacity(payload.len() / 12);
    while !cur.is_empty() {
        out.push(Vec3::new(
            cur.read_f32::<LE>()?,
            cur.read_f32::<LE>()?,
            cur.read_f32::<LE>()?,
        ));
    }
    Ok(out)
}

pub fn read_u32s<R: Read>(r: &mut R, magic: &Magic, per_elem: usize) -> Result<Vec<u32>, BundleError> {
    let payload = read_chunk(r, magic, 4 * per_elem)?;
    let mut cur = payload.as_slice();
    let mut out = Vec::with_capacity(payload.len() / 4);
    while !cur.is_empty() {
        out.push(cur.read_u32::<LE>()?);
    }
    Ok(out)
}

pub fn read_uvec3s<R: Read>(r: &mut R, magic: &Magic) -> Result<Vec<UVec3>, BundleError> {
    Ok(read_u32s(r, magic, 3)?
        .chunks_exact(3)
        .map(UVec3::from_slice)
        .collect())
}

/*──────────────────────────── writing ────────────────────────────────*/

pub fn write_chunk<W: Write>(w: &mut W, magic: &Magic, payload: &[u8]) -> Result<(), BundleError> {
    let len = u32::try_from(payload.len()).map_err(|_| BundleError::BadChunkSize {
        magic: *magic,
        len: payload.len(),
        elem_size: 1,
    })?;
    w.write_all(magic)?;
    w.write_u32::<LE>(len)?;
    w.write_all(payload)?;
    Ok(())
}

pub fn write_vec3s<W: Write>(w: &mut W, magic: &Magic, items: &[Vec3]) -> Result<(), BundleError> {
    let mut payload = Vec::with_capacity(items.len() * 12);
    for v in items {
        for c in v.to_array() {
            payload.write_f32::<LE>(c)?;
        }
    }
    write_chunk(w, magic, &payload)
}

pub fn write_u32s<W: Write>(w: &mut W, magic: &Magic, items: &[u32]) -> Result<(), BundleError> {
    let mut payload = Vec::with_capacity(items.len() * 4);
    for &i in items {
        payload.write_u32::<LE>(i)?;
    }
    write_chunk(w, magic, &payload)
}
