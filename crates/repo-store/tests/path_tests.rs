use repo_store::NormalizedPath;
use rstest::rstest;

#[rstest]
#[case("/libs/foo/bar", "/libs/foo/bar")]
#[case("libs/foo", "/libs/foo")]
#[case("\\libs\\foo", "/libs/foo")]
#[case("/libs//foo/", "/libs/foo")]
#[case("", "/")]
#[case("///", "/")]
fn test_normalization(#[case] input: &str, #[case] expected: &str) {
    assert_eq!(NormalizedPath::new(input).as_str(), expected);
}

#[test]
fn test_join_paths() {
    let base = NormalizedPath::new("/libs/foo");
    assert_eq!(base.join("install").as_str(), "/libs/foo/install");
    assert_eq!(base.join("install/15/a.jar").as_str(), "/libs/foo/install/15/a.jar");
    assert_eq!(NormalizedPath::root().join("apps").as_str(), "/apps");
}

#[test]
fn test_parent() {
    let path = NormalizedPath::new("/libs/foo/bar.jar");
    assert_eq!(path.parent().unwrap().as_str(), "/libs/foo");
    assert_eq!(NormalizedPath::new("/libs").parent().unwrap().as_str(), "/");
}

#[test]
fn test_file_name_and_extension() {
    let path = NormalizedPath::new("/libs/install/bundle.jar");
    assert_eq!(path.file_name(), Some("bundle.jar"));
    assert_eq!(path.extension(), Some("jar"));

    let dotted = NormalizedPath::new("/libs/install/.hidden");
    assert_eq!(dotted.extension(), None);

    let plain = NormalizedPath::new("/libs/install/README");
    assert_eq!(plain.extension(), None);
}

#[rstest]
#[case("/a/b/c", "/a/b", true)]
#[case("/a/b", "/a/b", true)]
#[case("/a/bc", "/a/b", false)]
#[case("/a", "/a/b", false)]
#[case("/anything", "/", true)]
fn test_starts_with_is_segment_wise(#[case] path: &str, #[case] prefix: &str, #[case] expected: bool) {
    assert_eq!(
        NormalizedPath::new(path).starts_with(&NormalizedPath::new(prefix)),
        expected
    );
}

#[test]
fn test_depth_and_segments() {
    let path = NormalizedPath::new("/libs/foo/install");
    assert_eq!(path.depth(), 3);
    assert_eq!(path.segments().collect::<Vec<_>>(), vec!["libs", "foo", "install"]);
}

#[test]
fn test_descendants_sort_after_prefix() {
    let folder = NormalizedPath::new("/libs/install");
    let child = NormalizedPath::new("/libs/install/a.jar");
    let sibling = NormalizedPath::new("/libs/install-old");
    assert!(child.as_str().starts_with(&folder.descendant_prefix()));
    assert!(!sibling.as_str().starts_with(&folder.descendant_prefix()));
}
