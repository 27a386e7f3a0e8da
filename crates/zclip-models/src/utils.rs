//! Naming and path-safety helpers shared across crates.

use std::path::{Component, Path};

use rand::distr::Alphanumeric;
use rand::Rng;

use crate::encoding::{OUTPUT_EXTENSION, OUTPUT_NAME_LENGTH};

/// Check that a string is non-empty and ASCII alphanumeric only.
///
/// Used for record IDs and API keys, both of which end up in paths or logs.
pub fn is_alphanumeric(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Check that a path is relative and made only of normal segments.
///
/// Rejects empty paths, absolute paths, `..`, `.` and platform prefixes.
pub fn is_safe_relative_path(path: &Path) -> bool {
    let mut components = path.components().peekable();
    if components.peek().is_none() {
        return false;
    }
    components.all(|c| matches!(c, Component::Normal(_)))
}

/// Generate a random artifact filename such as `aZ3k9QpL0mXc7VbT.mp4`.
pub fn generate_output_filename() -> String {
    let stem: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(OUTPUT_NAME_LENGTH)
        .map(char::from)
        .collect();
    format!("{}.{}", stem, OUTPUT_EXTENSION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_alphanumeric() {
        assert!(is_alphanumeric("abc123XYZ"));
        assert!(!is_alphanumeric(""));
        assert!(!is_alphanumeric("abc-123"));
        assert!(!is_alphanumeric("../key"));
        assert!(!is_alphanumeric("ключ"));
    }

    #[test]
    fn test_safe_relative_path() {
        assert!(is_safe_relative_path(Path::new("key/clip.mp4")));
        assert!(is_safe_relative_path(Path::new("clip.mp4")));
        assert!(!is_safe_relative_path(Path::new("")));
        assert!(!is_safe_relative_path(Path::new("/etc/passwd")));
        assert!(!is_safe_relative_path(Path::new("key/../../etc")));
        assert!(!is_safe_relative_path(Path::new("./clip.mp4")));
    }

    #[test]
    fn test_generated_filenames() {
        let name = generate_output_filename();
        let (stem, ext) = name.split_once('.').unwrap();
        assert_eq!(ext, "mp4");
        assert_eq!(stem.len(), OUTPUT_NAME_LENGTH);
        assert!(is_alphanumeric(stem));
        assert_ne!(name, generate_output_filename());
    }
}
