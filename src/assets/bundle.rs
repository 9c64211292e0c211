//! Named walk meshes packed into one `.w` file.
//!
//! ### Layout
//! Five chunks, always in this order:
//! * `p...` positions, `n...` normals (3×f32 each, same count)
//! * `tri0` triangles (3×u32, indices into the *global* position list)
//! * `str0` concatenated mesh names
//! * `idxA` one 6×u32 entry per mesh:
//!   name begin/end, vertex begin/end, triangle begin/end
//!
//! Each mesh gets its own slice of the vertex list; its triangles are
//! rebased so they index that slice.

use std::{
    collections::HashMap,
    fs::File,
    io::{self, BufReader, BufWriter, Read, Write},
    ops::Range,
    path::Path,
};

use glam::UVec3;
use thiserror::Error;

use super::chunks::{self, Magic};
use crate::world::{WalkMesh, WalkMeshError};

const POSITIONS: &Magic = b"p...";
const NORMALS: &Magic = b"n...";
const TRIANGLES: &Magic = b"tri0";
const NAMES: &Magic = b"str0";
const INDEX: &Magic = b"idxA";

/// u32 fields per `idxA` entry.
const INDEX_ENTRY: usize = 6;

#[derive(Error, Debug)]
pub enum BundleError {
    /// Underlying I/O failure, propagated unchanged.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error(
        "expected chunk '{}', found '{}'",
        String::from_utf8_lossy(expected),
        String::from_utf8_lossy(found)
    )]
    BadMagic { expected: Magic, found: Magic },

    #[error(
        "chunk '{}' is {len} bytes, not a multiple of {elem_size}",
        String::from_utf8_lossy(magic)
    )]
    BadChunkSize {
        magic: Magic,
        len: usize,
        elem_size: usize,
    },

    #[error("{positions} positions but {normals} normals")]
    NormalCount { positions: usize, normals: usize },

    #[error("index entry {entry}: {what} range {range:?} exceeds {len}")]
    BadRange {
        entry: usize,
        what: &'static str,
        range: Range<u32>,
        len: usize,
    },

    #[error("mesh name in index entry {0} is not UTF-8")]
    BadName(usize),

    #[error("mesh '{mesh}': vertex {index} lies outside its vertex range {range:?}")]
    BadTriangleIndex {
        mesh: String,
        index: u32,
        range: Range<u32>,
    },

    #[error("mesh '{0}' appears twice")]
    DuplicateName(String),

    #[error("no walk mesh named '{0}'")]
    MissingMesh(String),

    #[error("mesh '{name}': {source}")]
    Mesh {
        name: String,
        #[source]
        source: WalkMeshError,
    },
}

/// All walk meshes from one bundle, by name.
#[derive(Debug, Default)]
pub struct WalkMeshes {
    meshes: HashMap<String, WalkMesh>,
}

impl WalkMeshes {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, BundleError> {
        let path = path.as_ref();
        let bundle = Self::from_reader(&mut BufReader::new(File::open(path)?))?;
        log::info!("loaded {} walk mesh(es) from {}", bundle.len(), path.display());
        Ok(bundle)
    }

    pub fn from_reader<R: Read>(r: &mut R) -> Result<Self, BundleError> {
        /*----------- 1. raw chunks -------------------------------------*/
        let positions = chunks::read_vec3s(r, POSITIONS)?;
        let normals = chunks::read_vec3s(r, NORMALS)?;
        if normals.len() != positions.len() {
            return Err(BundleError::NormalCount {
                positions: positions.len(),
                normals: normals.len(),
            });
        }
        let triangles = chunks::read_uvec3s(r, TRIANGLES)?;
        let names = chunks::read_chunk(r, NAMES, 1)?;
        let index = chunks::read_u32s(r, INDEX, INDEX_ENTRY)?;

        /*----------- 2. one mesh per index entry -----------------------*/
        let mut meshes = HashMap::with_capacity(index.len() / INDEX_ENTRY);
        for (entry, fields) in index.chunks_exact(INDEX_ENTRY).enumerate() {
            let range = |what, at: usize, len| {
                let r = fields[at]..fields[at + 1];
                if r.start > r.end || r.end as usize > len {
                    Err(BundleError::BadRange {
                        entry,
                        what,
                        range: r,
                        len,
                    })
                } else {
                    Ok(r)
                }
            };
            let name_range = range("name", 0, names.len())?;
            let vertex_range = range("vertex", 2, positions.len())?;
            let triangle_range = range("triangle", 4, triangles.len())?;

            let name = std::str::from_utf8(&names[usize_range(&name_range)])
                .map_err(|_| BundleError::BadName(entry))?
                .to_owned();
            if meshes.contains_key(&name) {
                return Err(BundleError::DuplicateName(name));
            }

            let local = rebase(&triangles[usize_range(&triangle_range)], &vertex_range)
                .map_err(|index| BundleError::BadTriangleIndex {
                    mesh: name.clone(),
                    index,
                    range: vertex_range.clone(),
                })?;
            let mesh = WalkMesh::new(
                positions[usize_range(&vertex_range)].to_vec(),
                normals[usize_range(&vertex_range)].to_vec(),
                local,
            )
            .map_err(|source| BundleError::Mesh {
                name: name.clone(),
                source,
            })?;

            log::debug!(
                "walk mesh '{name}': {} vertices, {} triangles",
                mesh.vertices().len(),
                mesh.triangles().len()
            );
            meshes.insert(name, mesh);
        }

        Ok(Self { meshes })
    }

    pub fn lookup(&self, name: &str) -> Result<&WalkMesh, BundleError> {
        self.meshes
            .get(name)
            .ok_or_else(|| BundleError::MissingMesh(name.to_owned()))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    /*──────────────────────────── writing ────────────────────────────*/

    /// Serialise `meshes` in the order given.
    pub fn write<W: Write>(w: &mut W, meshes: &[(&str, &WalkMesh)]) -> Result<(), BundleError> {
        let mut positions = Vec::new();
        let mut normals = Vec::new();
        let mut triangles = Vec::new();
        let mut names = Vec::new();
        let mut index = Vec::with_capacity(meshes.len() * INDEX_ENTRY);

        for (name, mesh) in meshes {
            let base = positions.len() as u32;
            index.push(names.len() as u32);
            names.extend_from_slice(name.as_bytes());
            index.push(names.len() as u32);

            index.push(base);
            positions.extend_from_slice(mesh.vertices());
            normals.extend_from_slice(mesh.normals());
            index.push(positions.len() as u32);

            index.push((triangles.len() / 3) as u32);
            triangles.extend(
                mesh.triangles()
                    .iter()
                    .flat_map(|t| (*t + UVec3::splat(base)).to_array()),
            );
            index.push((triangles.len() / 3) as u32);
        }

        chunks::write_vec3s(w, POSITIONS, &positions)?;
        chunks::write_vec3s(w, NORMALS, &normals)?;
        chunks::write_u32s(w, TRIANGLES, &triangles)?;
        chunks::write_chunk(w, NAMES, &names)?;
        chunks::write_u32s(w, INDEX, &index)?;
        Ok(())
    }

    pub fn write_file<P: AsRef<Path>>(
        path: P,
        meshes: &[(&str, &WalkMesh)],
    ) -> Result<(), BundleError> {
        let mut out = BufWriter::new(File::create(path)?);
        Self::write(&mut out, meshes)?;
        out.flush()?;
        Ok(())
    }
}

#[inline]
fn usize_range(r: &Range<u32>) -> Range<usize> {
    r.start as usize..r.end as usize
}

/// Shift global triangle indices into `range`-local ones; `Err` carries the
/// first index that falls outside.
fn rebase(triangles: &[UVec3], range: &Range<u32>) -> Result<Vec<UVec3>, u32> {
    triangles
        .iter()
        .map(|t| {
            match t.to_array().into_iter().find(|i| !range.contains(i)) {
                Some(bad) => Err(bad),
                None => Ok(*t - UVec3::splat(range.start)),
            }
        })
        .collect()
}
