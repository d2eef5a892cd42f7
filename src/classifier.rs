//! Pure, total classification of raw hrefs into link kinds.

use crate::types::{LinkContext, LinkType};

/// Extensions classified as images.
const IMAGE_EXTENSIONS: &[&str] = &[".png", ".jpg", ".jpeg", ".gif", ".svg", ".webp"];

/// Extensions classified as diagram sources.
const DIAGRAM_EXTENSIONS: &[&str] = &[".mmd", ".mermaid"];

/// Map a raw href plus its context to exactly one `LinkType`.
///
/// Total: never fails, defaults to `Unknown`. Rules are evaluated in
/// precedence order and the first match wins — scheme markers dominate
/// over extension heuristics, and extension heuristics dominate over
/// generic fragment detection. Scheme and extension matching is
/// case-insensitive.
pub fn classify(ctx: &LinkContext) -> LinkType {
    let href = ctx.href.trim();
    if href.is_empty() {
        return LinkType::Unknown;
    }
    let lower = href.to_lowercase();

    if href.starts_with('#') {
        return LinkType::Anchor;
    }
    // mailto is an external action; whether the scheme is permitted is the
    // validator's call, not the classifier's.
    if lower.starts_with("mailto:") {
        return LinkType::ExternalHttp;
    }
    if lower.starts_with("http://") || lower.starts_with("https://") {
        return LinkType::ExternalHttp;
    }
    if lower.starts_with("file:///") || is_windows_drive_absolute(href) {
        return LinkType::FileProtocol;
    }
    if ends_with_any(&lower, IMAGE_EXTENSIONS) {
        return LinkType::Image;
    }
    if lower.ends_with(".md") {
        return LinkType::RelativeMarkdown;
    }
    if href.ends_with('/') || href.ends_with('\\') {
        return LinkType::Directory;
    }
    if ctx.aux_flag("diagram_container") || ends_with_any(&lower, DIAGRAM_EXTENSIONS) {
        return LinkType::Mermaid;
    }
    if href.find('#').is_some_and(|pos| pos > 0) {
        return LinkType::TableOfContents;
    }

    LinkType::Unknown
}

/// Whether the lowercased href ends with any of the given extensions.
fn ends_with_any(lower: &str, extensions: &[&str]) -> bool {
    extensions.iter().any(|ext| lower.ends_with(ext))
}

/// Windows drive-letter absolute form: an ASCII letter, a colon, then a
/// path separator (`C:/docs` or `C:\docs`).
pub(crate) fn is_windows_drive_absolute(href: &str) -> bool {
    let mut chars = href.chars();
    let Some(letter) = chars.next() else {
        return false;
    };
    letter.is_ascii_alphabetic()
        && chars.next() == Some(':')
        && matches!(chars.next(), Some('/' | '\\'))
}
