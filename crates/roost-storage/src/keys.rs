//! Shared name and location generation for storage backends.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

const MAX_STEM_LEN: usize = 64;

static LAST_SUFFIX: AtomicU64 = AtomicU64::new(0);

/// Nanoseconds since the epoch, bumped so no two calls in this process ever
/// return the same value.
pub fn unique_suffix() -> u64 {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0);

    let mut last = LAST_SUFFIX.load(Ordering::Relaxed);
    loop {
        let next = now.max(last + 1);
        match LAST_SUFFIX.compare_exchange_weak(last, next, Ordering::AcqRel, Ordering::Relaxed) {
            Ok(_) => return next,
            Err(actual) => last = actual,
        }
    }
}

/// Reduce a client filename stem to `[A-Za-z0-9_-]`, bounded in length.
pub fn sanitize_stem(stem: &str) -> String {
    let cleaned: String = stem
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .take(MAX_STEM_LEN)
        .collect();

    let trimmed = cleaned.trim_matches('_');
    if trimmed.is_empty() {
        "file".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Lower-cased extension of a client filename, if it has one.
pub fn extension_of(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty())
        .map(|ext| ext.to_lowercase())
}

/// `{stem}_{suffix}.{ext}` built from the client's original filename.
pub fn unique_filename(original: &str) -> String {
    let stem = Path::new(original)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("file");
    let stem = sanitize_stem(stem);
    let suffix = unique_suffix();

    match extension_of(original).map(|ext| sanitize_stem(&ext)) {
        Some(ext) => format!("{}_{}.{}", stem, suffix, ext),
        None => format!("{}_{}", stem, suffix),
    }
}

/// Relative storage location for a file in a namespace folder.
pub fn storage_key(folder: &str, filename: &str) -> String {
    let folder = folder.trim_matches('/');
    if folder.is_empty() {
        filename.to_string()
    } else {
        format!("{}/{}", folder, filename)
    }
}

/// Locations must stay inside the storage root.
pub fn is_safe_key(key: &str) -> bool {
    !key.is_empty() && !key.contains("..") && !key.starts_with('/') && !key.contains('\\')
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_unique_suffix_strictly_increases() {
        let mut previous = unique_suffix();
        for _ in 0..1000 {
            let next = unique_suffix();
            assert!(next > previous);
            previous = next;
        }
    }

    #[test]
    fn test_unique_suffix_distinct_across_threads() {
        let handles: Vec<_> = (0..8)
            .map(|_| std::thread::spawn(|| (0..500).map(|_| unique_suffix()).collect::<Vec<_>>()))
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for suffix in handle.join().unwrap() {
                assert!(seen.insert(suffix), "duplicate suffix {}", suffix);
            }
        }
    }

    #[test]
    fn test_unique_filename_keeps_stem_and_extension() {
        let name = unique_filename("My Photo.PNG");
        assert!(name.starts_with("My_Photo_"));
        assert!(name.ends_with(".png"));
        assert_ne!(unique_filename("a.png"), unique_filename("a.png"));
    }

    #[test]
    fn test_unique_filename_without_extension() {
        let name = unique_filename("README");
        assert!(name.starts_with("README_"));
        assert!(!name.contains('.'));
    }

    #[test]
    fn test_sanitize_stem_strips_path_characters() {
        assert_eq!(sanitize_stem("../../etc/passwd"), "etc_passwd");
        assert_eq!(sanitize_stem("***"), "file");
    }

    #[test]
    fn test_storage_key_and_safety() {
        assert_eq!(storage_key("avatars", "a_1.png"), "avatars/a_1.png");
        assert_eq!(storage_key("/posts/", "b_2.mp4"), "posts/b_2.mp4");
        assert!(is_safe_key("avatars/a_1.png"));
        assert!(!is_safe_key("../secret"));
        assert!(!is_safe_key("/etc/passwd"));
        assert!(!is_safe_key(""));
    }
}
