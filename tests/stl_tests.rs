//! Tests for reading and writing STL data.

mod common;

use common::{ascii_triangle, box_triangles, cube_stl};
use printer_plate::{
    geo::get_bounds,
    stl::{decode, encode, from_triangles3d, is_ascii, read_binary_stl, MeshError},
};

#[test]
fn binary_cube_decodes_to_twelve_triangles() {
    let tris = decode(&cube_stl(10.)).unwrap();
    assert_eq!(tris.len(), 12);
    let bounds = get_bounds(&tris).unwrap();
    assert_eq!(bounds.size().x, 10.);
    assert_eq!(bounds.size().z, 10.);
}

#[test]
fn encoded_size_follows_triangle_count() {
    let tris = box_triangles((0., 0., 0.), (1., 2., 3.));
    let bytes = encode(&tris);
    assert_eq!(bytes.len(), 80 + 4 + tris.len() * 50);
    let count = u32::from_le_bytes([bytes[80], bytes[81], bytes[82], bytes[83]]);
    assert_eq!(count as usize, tris.len());
}

#[test]
fn encoded_triangles_have_no_normals_or_attributes() {
    let stl = read_binary_stl(&cube_stl(5.)).unwrap();
    for tri in &stl.triangles {
        assert_eq!(tri.normal, [0., 0., 0.]);
        assert_eq!(tri.attr_byte_count, 0);
    }
}

#[test]
fn ascii_stl_is_detected_and_parsed() {
    let text = ascii_triangle();
    assert!(is_ascii(text.as_bytes()));
    let tris = decode(text.as_bytes()).unwrap();
    assert_eq!(tris.len(), 1);
    assert_eq!(tris[0].max_x(), 10.);
    assert_eq!(tris[0].max_y(), 10.);
}

#[test]
fn binary_header_starting_with_solid_is_still_binary() {
    let mut bytes = cube_stl(10.);
    bytes[..5].copy_from_slice(b"solid");
    assert!(!is_ascii(&bytes));
    assert_eq!(decode(&bytes).unwrap().len(), 12);
}

#[test]
fn truncated_binary_is_rejected() {
    let bytes = cube_stl(10.);
    match decode(&bytes[..bytes.len() - 10]) {
        Err(MeshError::Truncated { expected, found }) => {
            assert_eq!(expected, bytes.len());
            assert_eq!(found, bytes.len() - 10);
        },
        other => panic!("expected truncation error, got {:?}", other.map(|t| t.len())),
    }
    assert!(matches!(decode(b"tiny"), Err(MeshError::Truncated { .. })));
}

#[test]
fn ascii_with_dangling_vertex_is_rejected() {
    let text = "solid bad\nfacet normal 0 0 1\nouter loop\nvertex 0 0 0\nvertex 1 0 0\nendloop\nendfacet\nendsolid bad\n";
    assert!(matches!(decode(text.as_bytes()), Err(MeshError::Ascii { .. })));
}

#[test]
fn ascii_with_bad_number_reports_line() {
    let text = "solid bad\nfacet normal 0 0 1\nouter loop\nvertex 0 zero 0\n";
    match decode(text.as_bytes()) {
        Err(MeshError::Ascii { line, .. }) => assert_eq!(line, 4),
        other => panic!("expected ascii error, got {:?}", other.map(|t| t.len())),
    }
}

#[test]
fn empty_mesh_is_rejected() {
    assert!(matches!(decode(&encode(&[])), Err(MeshError::Empty)));
    assert!(matches!(decode(b"solid empty\nendsolid empty\n"), Err(MeshError::Empty)));
}

#[test]
fn padded_binary_with_solid_header() {
    let mut bytes = cube_stl(10.);
    bytes[..5].copy_from_slice(b"solid");
    bytes.push(0);
    assert!(is_ascii(&bytes));
    assert_eq!(decode(&bytes).unwrap().len(), 12);
}

#[test]
fn writer_output_matches_encode() {
    let tris = box_triangles((0., 0., 0.), (1., 2., 3.));
    let mut written = Vec::new();
    from_triangles3d(&tris).to_bytes(&mut written).unwrap();
    assert_eq!(written, encode(&tris));
}
