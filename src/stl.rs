//! # Stl
//!
//! Binary and ASCII STL decoding, binary encoding

use crate::geo::*;
use byteorder::{ByteOrder, LittleEndian, ReadBytesExt};
use log::debug;
use rayon::prelude::*;
use std::io::{Cursor, Read, Write};
use thiserror::Error;

const HEADER_LEN: usize = 80;
const TRIANGLE_LEN: usize = 50;

#[derive(Error, Debug)]
/// Error types for reading meshes
pub enum MeshError {
    #[error("Couldn't read STL data")]
    IO(#[from] std::io::Error),
    #[error("STL data is truncated, expected {expected} bytes but found {found}")]
    Truncated { expected: usize, found: usize },
    #[error("Invalid ASCII STL on line {line}: {reason}")]
    Ascii { line: usize, reason: String },
    #[error("STL contains no triangles")]
    Empty,
    #[error("STL contains non finite coordinates")]
    NotFinite,
}

pub struct Triangle {
    pub normal: [f32; 3],
    pub v1: [f32; 3],
    pub v2: [f32; 3],
    pub v3: [f32; 3],
    pub attr_byte_count: u16,
}

impl Triangle {
    /// Triangle with a zero normal and no attribute bytes
    pub fn new(v1: [f32; 3], v2: [f32; 3], v3: [f32; 3]) -> Triangle {
        Triangle {
            normal: [0., 0., 0.],
            v1,
            v2,
            v3,
            attr_byte_count: 0,
        }
    }
}

fn point_eq(lhs: [f32; 3], rhs: [f32; 3]) -> bool {
    lhs[0] == rhs[0] && lhs[1] == rhs[1] && lhs[2] == rhs[2]
}

impl PartialEq for Triangle {
    fn eq(&self, rhs: &Triangle) -> bool {
        point_eq(self.normal, rhs.normal)
            && point_eq(self.v1, rhs.v1)
            && point_eq(self.v2, rhs.v2)
            && point_eq(self.v3, rhs.v3)
            && self.attr_byte_count == rhs.attr_byte_count
    }
}

impl Eq for Triangle {}

pub struct BinaryStlHeader {
    pub header: [u8; HEADER_LEN],
    pub num_triangles: u32,
}

impl BinaryStlHeader {
    pub fn new(num_triangles: u32) -> BinaryStlHeader {
        let mut header = [0_u8; HEADER_LEN];
        let label = b"printer_plate";
        header[..label.len()].copy_from_slice(label);
        BinaryStlHeader {
            header,
            num_triangles,
        }
    }
}

pub struct BinaryStlFile {
    pub header: BinaryStlHeader,
    pub triangles: Vec<Triangle>,
}

impl BinaryStlFile {
    pub fn new(triangles: Vec<Triangle>) -> BinaryStlFile {
        let header = BinaryStlHeader::new(triangles.len() as u32);
        BinaryStlFile { header, triangles }
    }

    /// Binary STL bytes, the triangle count is taken from `triangles`
    pub fn to_vec(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(binary_len(self.triangles.len()));
        // write the header.
        out.extend_from_slice(&self.header.header);
        let mut count = [0_u8; 4];
        LittleEndian::write_u32(&mut count, self.triangles.len() as u32);
        out.extend_from_slice(&count);

        // write all the triangles
        for t in &self.triangles {
            write_point(&mut out, t.normal);
            write_point(&mut out, t.v1);
            write_point(&mut out, t.v2);
            write_point(&mut out, t.v3);
            let mut attr = [0_u8; 2];
            LittleEndian::write_u16(&mut attr, t.attr_byte_count);
            out.extend_from_slice(&attr);
        }

        out
    }

    pub fn to_bytes<T: Write>(&self, out: &mut T) -> std::io::Result<()> { out.write_all(&self.to_vec()) }
}

fn read_point<T: ReadBytesExt>(input: &mut T) -> std::io::Result<[f32; 3]> {
    let x1 = input.read_f32::<LittleEndian>()?;
    let x2 = input.read_f32::<LittleEndian>()?;
    let x3 = input.read_f32::<LittleEndian>()?;

    Ok([x1, x2, x3])
}

fn read_triangle<T: ReadBytesExt>(input: &mut T) -> std::io::Result<Triangle> {
    let normal = read_point(input)?;
    let v1 = read_point(input)?;
    let v2 = read_point(input)?;
    let v3 = read_point(input)?;
    let attr_count = input.read_u16::<LittleEndian>()?;

    Ok(Triangle {
        normal,
        v1,
        v2,
        v3,
        attr_byte_count: attr_count,
    })
}

fn read_header<T: Read>(input: &mut T) -> std::io::Result<BinaryStlHeader> {
    let mut header = [0u8; HEADER_LEN];
    input.read_exact(&mut header)?;
    let num_triangles = input.read_u32::<LittleEndian>()?;

    Ok(BinaryStlHeader {
        header,
        num_triangles,
    })
}

/// Read a binary STL, the buffer must hold every triangle the header announces
pub fn read_binary_stl(bytes: &[u8]) -> Result<BinaryStlFile, MeshError> {
    if bytes.len() < HEADER_LEN + 4 {
        return Err(MeshError::Truncated {
            expected: HEADER_LEN + 4,
            found: bytes.len(),
        });
    }
    let mut input = Cursor::new(bytes);
    let header = read_header(&mut input)?;
    let expected = binary_len(header.num_triangles as usize);
    if bytes.len() < expected {
        return Err(MeshError::Truncated {
            expected,
            found: bytes.len(),
        });
    }

    let mut triangles = Vec::with_capacity(header.num_triangles as usize);
    for _ in 0..header.num_triangles {
        triangles.push(read_triangle(&mut input)?);
    }

    Ok(BinaryStlFile { header, triangles })
}

/// Read an ASCII STL, only `facet normal` and `vertex` lines carry data
pub fn read_ascii_stl(text: &str) -> Result<BinaryStlFile, MeshError> {
    let mut normal = [0_f32; 3];
    let mut vertices: Vec<[f32; 3]> = Vec::new();
    let mut triangles = Vec::new();

    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix("facet normal") {
            normal = parse_triple(rest, index + 1)?;
        } else if let Some(rest) = line.strip_prefix("vertex") {
            vertices.push(parse_triple(rest, index + 1)?);
            if vertices.len() == 3 {
                triangles.push(Triangle {
                    normal,
                    v1: vertices[0],
                    v2: vertices[1],
                    v3: vertices[2],
                    attr_byte_count: 0,
                });
                vertices.clear();
            }
        }
    }
    if !vertices.is_empty() {
        return Err(MeshError::Ascii {
            line: text.lines().count(),
            reason: format!("{} dangling vertices", vertices.len()),
        });
    }

    Ok(BinaryStlFile::new(triangles))
}

fn parse_triple(src: &str, line: usize) -> Result<[f32; 3], MeshError> {
    let values = src
        .split_whitespace()
        .map(|v| v.parse::<f32>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| MeshError::Ascii {
            line,
            reason: e.to_string(),
        })?;
    if values.len() != 3 {
        return Err(MeshError::Ascii {
            line,
            reason: format!("expected 3 coordinates, found {}", values.len()),
        });
    }
    Ok([values[0], values[1], values[2]])
}

fn binary_len(num_triangles: usize) -> usize { HEADER_LEN + 4 + num_triangles * TRIANGLE_LEN }

/// Triangle count from the binary header, if the buffer is long enough to
/// have one
fn announced_triangles(bytes: &[u8]) -> Option<usize> {
    if bytes.len() < HEADER_LEN + 4 {
        return None;
    }
    Some(LittleEndian::read_u32(&bytes[HEADER_LEN..HEADER_LEN + 4]) as usize)
}

/// ASCII files start with "solid", but so do some binary headers,
/// a buffer whose length matches its triangle count is binary
pub fn is_ascii(bytes: &[u8]) -> bool {
    let solid = bytes.len() >= 5 && bytes[..5].eq_ignore_ascii_case(b"solid");
    if !solid {
        return false;
    }
    match announced_triangles(bytes) {
        Some(num_triangles) => bytes.len() != binary_len(num_triangles),
        None => true,
    }
}

// a "solid" header with trailing bytes after the triangles still looks ASCII
fn decode_ascii(bytes: &[u8]) -> Result<BinaryStlFile, MeshError> {
    let ascii = read_ascii_stl(&String::from_utf8_lossy(bytes));
    let parsed = matches!(&ascii, Ok(stl) if !stl.triangles.is_empty());
    let fits_binary = announced_triangles(bytes).map_or(false, |n| n > 0 && bytes.len() >= binary_len(n));
    if !parsed && fits_binary {
        debug!("no ASCII facets, reading {} bytes as binary STL", bytes.len());
        return read_binary_stl(bytes);
    }
    ascii
}

/// Decode either STL flavour into triangles
pub fn decode(bytes: &[u8]) -> Result<Vec<Triangle3d>, MeshError> {
    let stl = if is_ascii(bytes) {
        debug!("decoding {} bytes as ASCII STL", bytes.len());
        decode_ascii(bytes)?
    } else {
        debug!("decoding {} bytes as binary STL", bytes.len());
        read_binary_stl(bytes)?
    };
    if stl.triangles.is_empty() {
        return Err(MeshError::Empty);
    }
    let tris = to_triangles3d(&stl);
    if tris.par_iter().any(|tri| !(tri.p1.is_finite() && tri.p2.is_finite() && tri.p3.is_finite())) {
        return Err(MeshError::NotFinite);
    }
    Ok(tris)
}

/// Encode triangles as binary STL, normals and attributes are left zeroed
pub fn encode(tris: &[Triangle3d]) -> Vec<u8> {
    from_triangles3d(tris).to_vec()
}

fn write_point(out: &mut Vec<u8>, p: [f32; 3]) {
    let mut buf = [0_u8; 12];
    LittleEndian::write_f32_into(&p, &mut buf);
    out.extend_from_slice(&buf);
}

pub fn to_triangles3d(file: &BinaryStlFile) -> Vec<Triangle3d> {
    file.triangles
        .par_iter()
        .map(|x| {
            Triangle3d::new(
                (x.v1[0], x.v1[1], x.v1[2]),
                (x.v2[0], x.v2[1], x.v2[2]),
                (x.v3[0], x.v3[1], x.v3[2]),
            )
        })
        .collect()
}

pub fn from_triangles3d(tris: &[Triangle3d]) -> BinaryStlFile {
    let triangles: Vec<_> = tris
        .iter()
        .map(|tri| Triangle::new(tri.p1.into(), tri.p2.into(), tri.p3.into()))
        .collect();
    BinaryStlFile::new(triangles)
}
