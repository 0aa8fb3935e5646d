//! Tests for the directory-backed repository

use assert_fs::TempDir;
use assert_fs::prelude::*;
use predicates::prelude::*;
use pretty_assertions::assert_eq;
use repo_store::{DiskRepository, Error, NodeKind, NormalizedPath, Repository};

fn setup() -> (TempDir, DiskRepository) {
    let temp = TempDir::new().unwrap();
    temp.child("libs/foo/install/bundle.jar").write_binary(b"jar-bytes").unwrap();
    temp.child("libs/foo/install/app.cfg").write_str("a=1\n").unwrap();
    temp.child("libs/foo/install/15").create_dir_all().unwrap();
    let repo = DiskRepository::open(temp.path()).unwrap();
    (temp, repo)
}

#[test]
fn test_node_kinds_map_to_filesystem_entries() {
    let (_temp, repo) = setup();

    let folder = repo.node(&NormalizedPath::new("/libs/foo")).unwrap().unwrap();
    assert_eq!(folder.kind, NodeKind::Folder);

    let file = repo
        .node(&NormalizedPath::new("/libs/foo/install/bundle.jar"))
        .unwrap()
        .unwrap();
    assert_eq!(file.kind, NodeKind::File);

    assert!(repo.node(&NormalizedPath::new("/apps")).unwrap().is_none());
}

#[test]
fn test_list_is_sorted_by_path() {
    let (_temp, repo) = setup();

    let children: Vec<String> = repo
        .list(&NormalizedPath::new("/libs/foo/install"))
        .unwrap()
        .into_iter()
        .map(|info| info.path.to_string())
        .collect();

    assert_eq!(
        children,
        vec![
            "/libs/foo/install/15",
            "/libs/foo/install/app.cfg",
            "/libs/foo/install/bundle.jar",
        ]
    );
}

#[test]
fn test_list_missing_folder_is_not_found() {
    let (_temp, repo) = setup();
    let err = repo.list(&NormalizedPath::new("/apps")).unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn test_read_content_returns_bytes() {
    let (temp, repo) = setup();
    let path = NormalizedPath::new("/libs/foo/install/bundle.jar");

    assert_eq!(repo.read_content(&path).unwrap(), b"jar-bytes");

    temp.child("libs/foo/install/bundle.jar").assert(predicate::path::exists());
}

#[test]
fn test_read_content_of_folder_is_wrong_kind() {
    let (_temp, repo) = setup();
    let err = repo
        .read_content(&NormalizedPath::new("/libs/foo/install/15"))
        .unwrap_err();
    assert!(matches!(err, Error::WrongKind { .. }));
}

#[test]
fn test_disk_has_no_config_nodes() {
    let (_temp, repo) = setup();
    let err = repo
        .read_properties(&NormalizedPath::new("/libs/foo/install/app.cfg"))
        .unwrap_err();
    assert!(matches!(
        err,
        Error::WrongKind {
            expected: NodeKind::Config,
            actual: NodeKind::File,
            ..
        }
    ));
}

#[test]
fn test_open_rejects_missing_root() {
    let temp = TempDir::new().unwrap();
    assert!(DiskRepository::open(temp.path().join("missing")).is_err());
}

#[cfg(unix)]
#[test]
fn test_symlinked_directories_are_not_listed() {
    let (temp, repo) = setup();
    temp.child("libs/foo/loop").symlink_to_dir(temp.child("libs")).unwrap();
    temp.child("libs/foo/install/linked.jar")
        .symlink_to_file(temp.child("libs/foo/install/bundle.jar"))
        .unwrap();

    let names: Vec<String> = repo
        .list(&NormalizedPath::new("/libs/foo"))
        .unwrap()
        .into_iter()
        .map(|n| n.path.to_string())
        .collect();
    assert_eq!(names, vec!["/libs/foo/install"]);

    let linked = repo
        .list(&NormalizedPath::new("/libs/foo/install"))
        .unwrap()
        .into_iter()
        .find(|n| n.path.as_str() == "/libs/foo/install/linked.jar")
        .unwrap();
    assert_eq!(linked.kind, NodeKind::File);
}

#[cfg(unix)]
#[test]
fn test_names_with_backslashes_are_skipped() {
    let (temp, repo) = setup();
    temp.child("libs/foo/install/odd\\name.jar").write_binary(b"x").unwrap();

    let children = repo.list(&NormalizedPath::new("/libs/foo/install")).unwrap();
    assert_eq!(children.len(), 3);
    assert!(children.iter().all(|n| !n.path.as_str().contains("odd")));
}
