//! Property-based tests for workspace path containment.
//!
//! Uses proptest to verify that the `SandboxPolicy` never resolves a path
//! outside the session root and that accepted writes read back unchanged.

use proptest::prelude::*;
use tempfile::tempdir;
use workbench_kernel::vfs::ops::{read_text, write_text};
use workbench_kernel::vfs::policy::SandboxPolicy;
use workbench_kernel::vfs::ErrorKind;

/// Strategy for generating a single safe path segment
fn segment_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z0-9_][A-Za-z0-9_.-]{0,11}".prop_filter("Not a dot segment", |s| {
        s != "." && s != ".."
    })
}

/// Strategy for generating relative paths of one to four segments
fn relative_path_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(segment_strategy(), 1..=4)
}

/// Strategy for generating separators, including Windows style
fn separator_strategy() -> impl Strategy<Value = &'static str> {
    prop_oneof![Just("/"), Just("\\")]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Property: Any path containing a `..` segment is rejected.
    #[test]
    fn parent_segment_always_rejected(
        before in prop::collection::vec(segment_strategy(), 0..3),
        after in prop::collection::vec(segment_strategy(), 0..3),
        sep in separator_strategy()
    ) {
        let dir = tempdir().unwrap();
        let policy = SandboxPolicy::new(dir.path()).unwrap();

        let mut parts = before;
        parts.push("..".to_string());
        parts.extend(after);
        let raw = parts.join(sep);

        let result = policy.resolve(&raw, true);
        prop_assert!(
            matches!(result, Err(ref e) if e.kind() == ErrorKind::Validation),
            "{raw:?} was not rejected"
        );
    }

    /// Property: Absolute paths are rejected regardless of content.
    #[test]
    fn absolute_path_always_rejected(parts in relative_path_strategy()) {
        let dir = tempdir().unwrap();
        let policy = SandboxPolicy::new(dir.path()).unwrap();

        let raw = format!("/{}", parts.join("/"));
        prop_assert!(policy.resolve(&raw, false).is_err());
    }

    /// Property: Well-formed relative paths resolve under the root.
    #[test]
    fn relative_path_stays_under_root(
        parts in relative_path_strategy(),
        sep in separator_strategy()
    ) {
        let dir = tempdir().unwrap();
        let policy = SandboxPolicy::new(dir.path()).unwrap();

        let resolved = policy.resolve(&parts.join(sep), false).unwrap();
        prop_assert!(resolved.starts_with(policy.root()));
        prop_assert_eq!(policy.relative(&resolved).unwrap(), parts.join("/"));
    }

    /// Property: Text written to an accepted path reads back unchanged.
    #[test]
    fn write_then_read_returns_content(
        parts in relative_path_strategy(),
        content in "\\PC{0,200}"
    ) {
        let dir = tempdir().unwrap();
        let path = parts.join("/");

        let written = write_text(dir.path(), &path, &content, 400_000).unwrap();
        prop_assert_eq!(&written, &path);
        prop_assert_eq!(read_text(dir.path(), &path).unwrap(), content);
    }
}
