//! # Media References
//!
//! Helpers for image references held by categories and products. The media
//! host itself is an app concern; the core only derives and collects the
//! `public_id` handles the host needs.

/// Derive a media-host `public_id` from a hosted image URL.
///
/// Takes the path after `/upload/`, drops a leading version segment
/// (`v` followed by digits) and the file extension. URLs without an
/// `/upload/` segment fall back to the last path segment. Query strings and
/// fragments are ignored.
///
/// ```
/// use storefront_core::media::extract_public_id;
///
/// let url = "https://res.example.com/demo/image/upload/v1712345678/categories/shoes.jpg";
/// assert_eq!(extract_public_id(url), "categories/shoes");
/// ```
#[must_use]
pub fn extract_public_id(url: &str) -> String {
    let url = url.trim();
    let path = url
        .split(['?', '#'])
        .next()
        .unwrap_or_default();

    let tail = match path.find("/upload/") {
        Some(pos) => &path[pos + "/upload/".len()..],
        None => path.rsplit('/').next().unwrap_or_default(),
    };

    let tail = match tail.split_once('/') {
        Some((first, rest)) if is_version_segment(first) => rest,
        _ => tail,
    };

    strip_extension(tail.trim_matches('/')).to_string()
}

fn is_version_segment(segment: &str) -> bool {
    segment.len() > 1
        && segment.starts_with('v')
        && segment[1..].chars().all(|c| c.is_ascii_digit())
}

fn strip_extension(path: &str) -> &str {
    let file_start = path.rfind('/').map_or(0, |pos| pos + 1);
    match path[file_start..].rfind('.') {
        Some(dot) if dot > 0 => &path[..file_start + dot],
        _ => path,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_version_and_extension() {
        assert_eq!(
            extract_public_id("https://res.example.com/x/image/upload/v17/products/red/1.webp"),
            "products/red/1"
        );
    }

    #[test]
    fn keeps_path_without_version() {
        assert_eq!(
            extract_public_id("https://res.example.com/x/image/upload/banners/summer.png"),
            "banners/summer"
        );
    }

    #[test]
    fn version_like_folder_is_kept_when_not_numeric() {
        assert_eq!(
            extract_public_id("https://res.example.com/x/image/upload/vintage/lamp.jpg"),
            "vintage/lamp"
        );
    }

    #[test]
    fn ignores_query_and_fragment() {
        assert_eq!(
            extract_public_id("https://res.example.com/x/image/upload/v1/a/b.jpg?w=200#top"),
            "a/b"
        );
    }

    #[test]
    fn falls_back_to_last_segment() {
        assert_eq!(extract_public_id("https://cdn.example.com/img/icon.svg"), "icon");
        assert_eq!(extract_public_id("https://cdn.example.com/img/noext"), "noext");
    }

    #[test]
    fn dotfile_keeps_name() {
        assert_eq!(extract_public_id("https://cdn.example.com/.hidden"), ".hidden");
    }

    #[test]
    fn empty_url_gives_empty_id() {
        assert_eq!(extract_public_id(""), "");
        assert_eq!(extract_public_id("   "), "");
    }
}
