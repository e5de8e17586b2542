//! CTL tree discovery on disk.

use std::fs;
use std::path::{Path, PathBuf};

use aces_gen::{CtlDirectory, DescriptorSource, GenError, TransformKind};

fn ctl(id: &str, user_name: &str) -> String {
    format!(
        "// <ACEStransformID>{id}</ACEStransformID>\n\
         // <ACESuserName>{user_name}</ACESuserName>\n\
         void main() {{}}\n"
    )
}

fn write(root: &Path, rel: &str, text: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, text).unwrap();
}

fn tree() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(
        root,
        "odt/rec709/ODT.Academy.Rec709_100nits_dim.a1.0.0.ctl",
        &ctl("ODT.Academy.Rec709_100nits_dim.a1.0.0", "ACES 1.0 Output - Rec.709"),
    );
    write(
        root,
        "odt/rec709/InvODT.Academy.Rec709_100nits_dim.a1.0.0.ctl",
        &ctl("InvODT.Academy.Rec709_100nits_dim.a1.0.0", "ACES 1.0 Inverse Output - Rec.709"),
    );
    write(
        root,
        "odt/sRGB/ODT.Academy.sRGB_100nits_dim.a1.0.0.ctl",
        &ctl("ODT.Academy.sRGB_100nits_dim.a1.0.0", "ACES 1.0 Output - sRGB"),
    );
    write(root, "odt/README.md", "# Output transforms\n");
    write(root, "odt/.hidden.ctl", "");
    write(
        root,
        "lmt/LMT.Academy.ACES_0_1_1.a1.0.0.ctl",
        &ctl("LMT.Academy.ACES_0_1_1.a1.0.0", "ACES 1.0 Look - ACES 0.1.1"),
    );
    dir
}

#[test]
fn output_transforms() {
    let dir = tree();
    let source = CtlDirectory::new(dir.path());
    let found = source.discover(TransformKind::Odt).unwrap();
    assert!(found.rejected.is_empty());
    let odts = found.catalog;

    let names: Vec<&str> = odts.keys().map(String::as_str).collect();
    assert_eq!(
        names,
        [
            "Academy.Rec709_100nits_dim.a1.0.0",
            "Academy.sRGB_100nits_dim.a1.0.0"
        ]
    );

    let rec709 = &odts["Academy.Rec709_100nits_dim.a1.0.0"];
    assert_eq!(rec709.transform_id, "ODT.Academy.Rec709_100nits_dim.a1.0.0");
    assert_eq!(rec709.display_name, "Rec.709");
    assert_eq!(rec709.display_name_prefix, "ACES 1.0 Output");
    assert_eq!(
        rec709.forward_path,
        PathBuf::from("odt/rec709/ODT.Academy.Rec709_100nits_dim.a1.0.0.ctl")
    );
    assert_eq!(
        rec709.inverse_path.as_deref(),
        Some(Path::new("odt/rec709/InvODT.Academy.Rec709_100nits_dim.a1.0.0.ctl"))
    );

    assert!(odts["Academy.sRGB_100nits_dim.a1.0.0"].inverse_path.is_none());
}

#[test]
fn look_transforms() {
    let dir = tree();
    let lmts = CtlDirectory::new(dir.path()).discover(TransformKind::Lmt).unwrap().catalog;
    assert_eq!(lmts.len(), 1);
    let look = &lmts["Academy.ACES_0_1_1.a1.0.0"];
    assert_eq!(look.display_name, "ACES 0.1.1");
    assert_eq!(look.display_name_prefix, "ACES 1.0 Look");
}

#[test]
fn missing_kind_directory_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let found = CtlDirectory::new(dir.path()).discover(TransformKind::Lmt).unwrap();
    assert!(found.catalog.is_empty());
    assert!(found.rejected.is_empty());
}

#[test]
fn untagged_file_is_rejected_alone() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "odt/ODT.Academy.sRGB_100nits_dim.a1.0.0.ctl",
        &ctl("ODT.Academy.sRGB_100nits_dim.a1.0.0", "ACES 1.0 Output - sRGB"),
    );
    write(dir.path(), "odt/ODT.Academy.Broken.a1.0.0.ctl", "void main() {}\n");

    let found = CtlDirectory::new(dir.path()).discover(TransformKind::Odt).unwrap();
    assert_eq!(found.catalog.len(), 1);
    assert!(found.catalog.contains_key("Academy.sRGB_100nits_dim.a1.0.0"));

    assert_eq!(found.rejected.len(), 1);
    let (path, err) = &found.rejected[0];
    assert_eq!(path, Path::new("odt/ODT.Academy.Broken.a1.0.0.ctl"));
    match err {
        GenError::Discovery { reason, .. } => assert!(reason.contains("missing ACES header tags")),
        other => panic!("unexpected error: {other}"),
    }
}
