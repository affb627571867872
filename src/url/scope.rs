use crate::url::CrawlTarget;
use url::Url;

/// Path extensions of resources that are never HTML pages
const NON_HTML_EXTENSIONS: &[&str] = &[
    // Documents
    "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "odt", "ods", "odp", "rtf", "csv",
    // Archives
    "zip", "tar", "gz", "tgz", "bz2", "xz", "rar", "7z",
    // Images
    "jpg", "jpeg", "png", "gif", "svg", "webp", "ico", "bmp", "tif", "tiff", "avif",
    // Audio and video
    "mp3", "wav", "ogg", "flac", "m4a", "mp4", "m4v", "avi", "mov", "wmv", "webm", "mkv",
    // Web assets and data
    "css", "js", "mjs", "map", "json", "xml", "rss", "atom", "txt",
    // Fonts
    "woff", "woff2", "ttf", "otf", "eot",
    // Binaries
    "exe", "dmg", "msi", "pkg", "deb", "rpm", "apk", "iso", "bin",
];

/// Decides whether a normalized URL may enter the frontier
///
/// True iff all of:
/// - the scheme is http or https
/// - the host (and explicit port) equals the crawl target exactly
/// - the path does not end in a known non-HTML extension
///
/// # Examples
///
/// ```
/// use url::Url;
/// use meta_crawl::url::{in_scope, CrawlTarget};
///
/// let target = CrawlTarget::from_seed(&Url::parse("https://example.com/").unwrap()).unwrap();
/// assert!(in_scope(&Url::parse("https://example.com/about").unwrap(), &target));
/// assert!(!in_scope(&Url::parse("https://other.com/").unwrap(), &target));
/// assert!(!in_scope(&Url::parse("https://example.com/logo.png").unwrap(), &target));
/// ```
pub fn in_scope(url: &Url, target: &CrawlTarget) -> bool {
    if url.scheme() != "http" && url.scheme() != "https" {
        return false;
    }

    if !target.matches_host(url) {
        return false;
    }

    !has_non_html_extension(url.path())
}

/// Checks the last path segment for an excluded extension (case-insensitive)
fn has_non_html_extension(path: &str) -> bool {
    let last_segment = path.rsplit('/').next().unwrap_or("");
    match last_segment.rsplit_once('.') {
        Some((_, ext)) => {
            let ext = ext.to_ascii_lowercase();
            NON_HTML_EXTENSIONS.contains(&ext.as_str())
        }
        None => false,
    }
}
