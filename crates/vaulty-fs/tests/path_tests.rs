use proptest::prelude::*;
use vaulty_fs::NormalizedPath;

#[test]
fn test_join_resolves_dots() {
    let base = NormalizedPath::new("/a/b");

    assert_eq!(base.join("c").as_str(), "/a/b/c");
    assert_eq!(base.join("./c").as_str(), "/a/b/c");
    assert_eq!(base.join("../c").as_str(), "/a/c");
    assert_eq!(base.join("../../c").as_str(), "/c");
}

#[test]
fn test_relative_leading_parent_segments_are_dropped() {
    assert_eq!(NormalizedPath::new("../outside.txt").as_str(), "outside.txt");
    assert_eq!(NormalizedPath::new("a/../../b").as_str(), "b");
}

#[test]
fn test_backslashes_are_normalized() {
    assert_eq!(NormalizedPath::new("src\\config\\.env.vaulty").as_str(), "src/config/.env.vaulty");
}

#[test]
fn test_parent_of_root_child() {
    assert_eq!(NormalizedPath::new("/file").parent().unwrap().as_str(), "/");
    assert!(NormalizedPath::new("/").parent().is_none());
}

proptest! {
    #[test]
    fn test_normalization_is_idempotent(s in "\\PC*") {
        let once = NormalizedPath::new(&s);
        let twice = NormalizedPath::new(once.as_str());
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn test_no_backslashes_or_dot_segments(s in "[a-z./\\\\]{0,24}") {
        let path = NormalizedPath::new(&s);
        prop_assert!(!path.as_str().contains('\\'));
        prop_assert!(!path.as_str().split('/').any(|seg| seg == "." || seg == ".."));
    }
}
