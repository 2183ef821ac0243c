#![allow(dead_code)]

use printer_plate::{
    config::SlicingParameters,
    geo::Triangle3d,
    service::{ServiceError, SlicingService},
    stl::encode,
    store::MeshFile,
};
use std::cell::{Cell, RefCell};

/// Closed box from `min` with the given size, 12 triangles
pub fn box_triangles(min: (f32, f32, f32), size: (f32, f32, f32)) -> Vec<Triangle3d> {
    let (x0, y0, z0) = min;
    let (x1, y1, z1) = (x0 + size.0, y0 + size.1, z0 + size.2);
    let v = [
        (x0, y0, z0),
        (x1, y0, z0),
        (x1, y1, z0),
        (x0, y1, z0),
        (x0, y0, z1),
        (x1, y0, z1),
        (x1, y1, z1),
        (x0, y1, z1),
    ];
    let faces = [
        (0, 2, 1),
        (0, 3, 2),
        (4, 5, 6),
        (4, 6, 7),
        (0, 1, 5),
        (0, 5, 4),
        (2, 3, 7),
        (2, 7, 6),
        (0, 4, 7),
        (0, 7, 3),
        (1, 2, 6),
        (1, 6, 5),
    ];
    faces.iter().map(|&(a, b, c)| Triangle3d::new(v[a], v[b], v[c])).collect()
}

pub fn cube_stl(size: f32) -> Vec<u8> { encode(&box_triangles((0., 0., 0.), (size, size, size))) }

pub fn cube_file(name: &str, size: f32) -> MeshFile { MeshFile::new(name, cube_stl(size)) }

pub fn ascii_triangle() -> String {
    "solid test\n\
     facet normal 0 0 1\n\
     outer loop\n\
     vertex 0 0 0\n\
     vertex 10 0 0\n\
     vertex 0 10 0\n\
     endloop\n\
     endfacet\n\
     endsolid test\n"
        .to_string()
}

/// Fake slicing service returning canned replies
pub struct StubService {
    pub gcode_path: String,
    pub gcode: Vec<u8>,
    /// when set, `submit` fails with this status and message
    pub failure: RefCell<Option<(u16, String)>>,
    pub submissions: Cell<usize>,
    pub last_params: Cell<Option<SlicingParameters>>,
}

impl StubService {
    pub fn new(gcode_path: &str, gcode: &str) -> StubService {
        StubService {
            gcode_path: gcode_path.to_string(),
            gcode: gcode.as_bytes().to_vec(),
            failure: RefCell::new(None),
            submissions: Cell::new(0),
            last_params: Cell::new(None),
        }
    }

    pub fn fail_with(&self, status: u16, message: &str) { *self.failure.borrow_mut() = Some((status, message.to_string())); }

    pub fn recover(&self) { *self.failure.borrow_mut() = None; }
}

impl SlicingService for StubService {
    fn submit(&self, _model: &MeshFile, params: &SlicingParameters) -> Result<String, ServiceError> {
        self.submissions.set(self.submissions.get() + 1);
        self.last_params.set(Some(*params));
        if let Some((status, message)) = self.failure.borrow().clone() {
            return Err(ServiceError::Status { status, message });
        }
        Ok(self.gcode_path.clone())
    }

    fn fetch(&self, path: &str) -> Result<Vec<u8>, ServiceError> {
        if path == self.gcode_path {
            Ok(self.gcode.clone())
        } else {
            Err(ServiceError::Status {
                status: 404,
                message: format!("{} not found", path),
            })
        }
    }
}

pub const SAMPLE_GCODE: &str = "; generated by a slicer\n\
G21\n\
G90\n\
M82\n\
G28\n\
G92 E0\n\
G1 Z0.2 F3000\n\
G1 X10 Y10\n\
G1 X20 Y10 E1.0\n\
G1 X20 Y20 E2.0\n\
G1 Z0.4\n\
G1 X10 Y20 E3.0\n\
G1 X10 Y10 E4.0\n\
G1 Z0.6\n\
G1 X30 Y30 E5.0\n\
G1 Z10\n\
; filament used [mm] = 1234.5\n\
; filament used [cm3] = 3.0\n";
