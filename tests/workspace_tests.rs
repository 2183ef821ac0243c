mod common;

use common::{cube_file, cube_stl, StubService, SAMPLE_GCODE};
use printer_plate::{
    intake::IntakeError,
    stl::MeshError,
    store::MeshFile,
    Error, Workspace,
};

#[test]
fn only_mesh_files_are_taken() {
    let mut workspace = Workspace::default();
    let report = workspace
        .add_files(vec![
            cube_file("a.stl", 10.),
            MeshFile::new("notes.txt", b"hello".to_vec()),
            cube_file("B.STL", 10.),
        ])
        .unwrap();
    assert_eq!(report.added.len(), 2);
    assert_eq!(workspace.files().names(), vec!["a.stl", "B.STL"]);
    assert_eq!(workspace.scene().len(), 2);
    assert_eq!(workspace.previews().live(), 2);
}

#[test]
fn selection_without_meshes_changes_nothing() {
    let mut workspace = Workspace::default();
    workspace.add_files(vec![cube_file("a.stl", 10.)]).unwrap();
    let combined = workspace.combined().cloned();

    match workspace.add_files(vec![MeshFile::new("part.obj", Vec::new())]) {
        Err(Error::Intake(IntakeError::NoMeshFiles)) => {},
        other => panic!("expected NoMeshFiles, got {:?}", other.map(|r| r.added)),
    }
    assert!(matches!(
        workspace.add_files(Vec::new()),
        Err(Error::Intake(IntakeError::NoMeshFiles))
    ));
    assert_eq!(workspace.files().names(), vec!["a.stl"]);
    assert_eq!(workspace.combined().cloned(), combined);
    assert_eq!(workspace.previews().live(), 1);
}

#[test]
fn merged_plate_tracks_the_files() {
    let mut workspace = Workspace::default();
    assert!(workspace.combined().is_none());
    workspace.add_files(vec![cube_file("a.stl", 10.)]).unwrap();
    let one = workspace.combined().cloned().unwrap();
    workspace.add_files(vec![cube_file("b.stl", 10.)]).unwrap();
    let two = workspace.combined().cloned().unwrap();
    assert_eq!(two.name, "combined.stl");
    assert!(two.len() > one.len());
    assert!(workspace.remove_file("a.stl"));
    assert!(workspace.remove_file("b.stl"));
    assert!(workspace.combined().is_none());
}

#[test]
fn reloading_a_file_replaces_it() {
    let mut workspace = Workspace::default();
    workspace.add_files(vec![cube_file("a.stl", 10.)]).unwrap();
    let old_url = workspace.preview("a.stl").unwrap().url().to_string();
    workspace.add_files(vec![cube_file("a.stl", 20.)]).unwrap();

    assert_eq!(workspace.files().len(), 1);
    assert_eq!(workspace.scene().len(), 1);
    assert_eq!(workspace.files().get("a.stl").unwrap().bytes, cube_stl(20.));
    assert_eq!(workspace.previews().live(), 1);
    assert_ne!(workspace.preview("a.stl").unwrap().url(), old_url);
}

#[test]
fn removing_a_file_forgets_everything_about_it() {
    let mut workspace = Workspace::default();
    workspace
        .add_files(vec![cube_file("a.stl", 10.), cube_file("b.stl", 10.)])
        .unwrap();
    assert!(workspace.remove_file("a.stl"));
    assert!(!workspace.remove_file("a.stl"));

    assert!(!workspace.files().contains("a.stl"));
    assert!(workspace.scene().by_name("a.stl").is_none());
    assert!(workspace.preview("a.stl").is_none());
    assert_eq!(workspace.previews().live(), 1);
    let combined = workspace.combined().unwrap();
    let tris = printer_plate::stl::decode(&combined.bytes).unwrap();
    assert_eq!(tris.len(), 12);
}

#[test]
fn removal_while_slicing_uses_the_remaining_plate() {
    let service = StubService::new("/files/combined.gcode", SAMPLE_GCODE);
    let mut workspace = Workspace::default();
    workspace
        .add_files(vec![cube_file("a.stl", 10.), cube_file("b.stl", 10.)])
        .unwrap();
    workspace.slice(&service).unwrap();
    workspace.remove_file("b.stl");
    workspace.slice(&service).unwrap();
    // the smaller plate is a different mesh, so it can't come from the cache
    assert_eq!(service.submissions.get(), 2);
}

#[test]
fn unreadable_file_is_rejected_alone() {
    let mut workspace = Workspace::default();
    let mut truncated = cube_stl(10.);
    truncated.truncate(100);
    let report = workspace
        .add_files(vec![cube_file("good.stl", 10.), MeshFile::new("bad.stl", truncated)])
        .unwrap();

    assert_eq!(report.added.len(), 1);
    assert_eq!(report.rejected.len(), 1);
    assert_eq!(report.rejected[0].0, "bad.stl");
    assert!(matches!(report.rejected[0].1, MeshError::Truncated { .. }));
    assert_eq!(workspace.files().names(), vec!["good.stl"]);
    assert_eq!(workspace.previews().live(), 1);
}

#[test]
fn instances_can_be_moved() {
    let mut workspace = Workspace::default();
    let report = workspace.add_files(vec![cube_file("a.stl", 10.)]).unwrap();
    let id = report.added[0].clone();
    let before = workspace.combined().cloned().unwrap();
    let moved = workspace
        .scene()
        .get(&id)
        .unwrap()
        .transform
        .with_position(ultraviolet::Vec3::new(50., 0., 0.));
    workspace.set_transform(&id, moved).unwrap();
    assert_ne!(workspace.combined().cloned().unwrap(), before);

    workspace.remove_file("a.stl");
    assert!(matches!(workspace.set_transform(&id, moved), Err(Error::Scene(_))));
}

#[test]
fn cancelled_slice_leaves_the_session_idle() {
    let service = StubService::new("/files/combined.gcode", SAMPLE_GCODE);
    let mut workspace = Workspace::default();
    workspace.add_files(vec![cube_file("a.stl", 10.)]).unwrap();
    workspace.slice(&service).unwrap();
    workspace.cancel_slice();
    assert_eq!(workspace.session(), &printer_plate::session::SessionState::Idle);

    let viewer = workspace.viewer(400, 400).unwrap();
    assert_eq!(viewer.toolpath().layer_count(), 3);
}

#[test]
fn reslicing_keeps_one_toolpath_per_file() {
    let service = StubService::new("/files/combined.gcode", SAMPLE_GCODE);
    let mut workspace = Workspace::default();
    let report = workspace.add_files(vec![cube_file("a.stl", 10.)]).unwrap();
    let id = report.added[0].clone();
    for i in 0..20 {
        let moved = workspace
            .scene()
            .get(&id)
            .unwrap()
            .transform
            .with_position(ultraviolet::Vec3::new(i as f32, 0., 0.));
        workspace.set_transform(&id, moved).unwrap();
        workspace.slice(&service).unwrap();
    }
    assert_eq!(service.submissions.get(), 20);
    assert_eq!(workspace.toolpaths().len(), 1);

    workspace.remove_file("a.stl");
    assert!(workspace.toolpaths().is_empty());
}

#[test]
fn removing_a_file_drops_its_own_toolpath() {
    let service = StubService::new("/files/a.gcode", SAMPLE_GCODE);
    let mut workspace = Workspace::default();
    workspace
        .add_files(vec![cube_file("a.stl", 10.), cube_file("b.stl", 10.)])
        .unwrap();
    workspace.slice_single(&service, "a.stl").unwrap();
    assert_eq!(workspace.toolpaths().len(), 1);
    workspace.remove_file("b.stl");
    assert_eq!(workspace.toolpaths().len(), 1);
    workspace.remove_file("a.stl");
    assert!(workspace.toolpaths().is_empty());
}
