//! Anchored path resolution and `file://` URL decoding.
//!
//! Everything here is lexical: `.`/`..` collapse algebraically and no
//! operation requires the target to exist on disk.

use std::path::{Component, Path, PathBuf};

use percent_encoding::percent_decode_str;
use url::Url;

use crate::classifier::is_windows_drive_absolute;
use crate::error::Error;

/// Resolve `href` against the document it appeared in.
///
/// Absolute hrefs (including drive-letter forms) are normalized and
/// returned as-is. Relative hrefs anchor at the current file's parent
/// directory, then at the fallback directory, then at the process working
/// directory. Anchoring always restarts from the current file, never from
/// a previously resolved path, so repeated resolution of the same inputs
/// cannot accumulate `..` segments.
pub fn resolve_relative(
    current_file: Option<&Path>,
    current_dir: Option<&Path>,
    href: &str,
) -> PathBuf {
    let href_path = Path::new(href);
    if href_path.is_absolute() || is_windows_drive_absolute(href) {
        return normalize_path(href_path);
    }

    let anchor = anchor_directory(current_file, current_dir);
    normalize_path(&anchor.join(href_path))
}

/// Parse a `file://` URL into a normalized filesystem path.
///
/// Percent-escapes in the path component are decoded, and the leading
/// separator before a Windows drive letter is stripped (`/C:/x` → `C:/x`).
///
/// # Errors
///
/// Returns `Error::UrlParse` if the string is not a URL at all, or
/// `Error::NotFileScheme` if its scheme is anything but `file`.
pub fn resolve_file_protocol(raw: &str) -> Result<PathBuf, Error> {
    let url = Url::parse(raw).map_err(|e| Error::UrlParse {
        reason: e.to_string(),
        url: raw.to_string(),
    })?;

    if url.scheme() != "file" {
        return Err(Error::NotFileScheme {
            scheme: url.scheme().to_string(),
            url: raw.to_string(),
        });
    }

    let decoded = percent_decode_str(url.path()).decode_utf8_lossy();
    let stripped = strip_separator_before_drive(&decoded);
    Ok(normalize_path(Path::new(stripped)))
}

/// Collapse `.` and `..` components without touching the filesystem.
/// `..` pops a preceding normal component; at the root it is dropped, and
/// with nothing left to pop on a relative path it is preserved.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut parts: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {},
            Component::ParentDir => pop_or_keep_parent(&mut parts, component),
            other => parts.push(other),
        }
    }
    parts.iter().collect()
}

/// Handle a `..` component during normalization.
fn pop_or_keep_parent<'a>(parts: &mut Vec<Component<'a>>, parent: Component<'a>) {
    match parts.last() {
        Some(Component::Normal(_)) => {
            parts.pop();
        },
        // `..` directly above a root or drive anchor is a no-op.
        Some(Component::RootDir | Component::Prefix(_)) => {},
        _ => parts.push(parent),
    }
}

/// The directory relative hrefs anchor at.
fn anchor_directory(current_file: Option<&Path>, current_dir: Option<&Path>) -> PathBuf {
    if let Some(file) = current_file {
        if let Some(parent) = file.parent() {
            if !parent.as_os_str().is_empty() {
                return parent.to_path_buf();
            }
        }
    }
    if let Some(dir) = current_dir {
        return dir.to_path_buf();
    }
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

/// `/C:/path` → `C:/path`. URL path components keep the leading separator
/// on Windows-style file URLs; the drive letter is the real root.
fn strip_separator_before_drive(path: &str) -> &str {
    let Some(rest) = path.strip_prefix('/') else {
        return path;
    };
    let mut chars = rest.chars();
    let starts_with_drive = chars
        .next()
        .is_some_and(|letter| letter.is_ascii_alphabetic())
        && chars.next() == Some(':');
    if starts_with_drive { rest } else { path }
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc)]
mod tests {
    use super::*;

    /// Separator-normalized comparison so assertions hold on any platform.
    fn display(path: &Path) -> String {
        path.to_string_lossy().replace('\\', "/")
    }

    #[test]
    fn relative_href_anchors_at_current_file_parent() {
        let resolved = resolve_relative(
            Some(Path::new("base/docs/guide.md")),
            None,
            "../images/pic.png",
        );
        assert_eq!(display(&resolved), "base/images/pic.png");
    }

    #[test]
    fn resolution_is_idempotent_across_repeated_calls() {
        let current = Path::new("proj/docs/guide.md");
        let first = resolve_relative(Some(current), None, "../images/pic.md");
        let second = resolve_relative(Some(current), None, "../images/pic.md");
        assert_eq!(first, second);
        assert_eq!(display(&first), "proj/images/pic.md");
    }

    #[test]
    fn drive_rooted_href_is_returned_normalized() {
        let resolved = resolve_relative(
            Some(Path::new("elsewhere/doc.md")),
            None,
            "D:/proj/docs/../images/pic.md",
        );
        assert_eq!(display(&resolved), "D:/proj/images/pic.md");
    }

    #[test]
    fn drive_anchored_current_file_resolves_parent_relative_href() {
        let resolved = resolve_relative(
            Some(Path::new("D:/proj/docs/guide.md")),
            None,
            "../images/pic.md",
        );
        assert!(
            display(&resolved).eq_ignore_ascii_case("D:/proj/images/pic.md"),
            "unexpected path: {}",
            resolved.display()
        );
    }

    #[test]
    fn directory_fallback_used_without_current_file() {
        let resolved = resolve_relative(None, Some(Path::new("work/docs")), "notes.md");
        assert_eq!(display(&resolved), "work/docs/notes.md");
    }

    #[test]
    fn current_dir_segments_are_dropped() {
        let resolved = resolve_relative(Some(Path::new("a/b.md")), None, "./c/./d.md");
        assert_eq!(display(&resolved), "a/c/d.md");
    }

    #[test]
    fn leading_parent_segments_survive_on_relative_paths() {
        assert_eq!(display(&normalize_path(Path::new("../../x"))), "../../x");
    }

    #[test]
    fn parent_above_root_is_dropped() {
        assert_eq!(display(&normalize_path(Path::new("/../etc"))), "/etc");
    }

    #[test]
    fn file_url_decodes_and_strips_drive_separator() {
        let resolved = resolve_file_protocol("file:///C:/My%20Docs/guide.md").unwrap();
        assert_eq!(display(&resolved), "C:/My Docs/guide.md");
    }

    #[test]
    fn unix_file_url_keeps_root() {
        let resolved = resolve_file_protocol("file:///home/user/doc.md").unwrap();
        assert_eq!(display(&resolved), "/home/user/doc.md");
    }

    #[test]
    fn non_file_scheme_is_rejected() {
        let err = resolve_file_protocol("https://example.com/doc.md").unwrap_err();
        assert!(matches!(err, Error::NotFileScheme { .. }));
    }

    #[test]
    fn garbage_is_a_parse_error() {
        let err = resolve_file_protocol("not a url").unwrap_err();
        assert!(matches!(err, Error::UrlParse { .. }));
    }
}
