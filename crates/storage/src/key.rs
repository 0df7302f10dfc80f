//! Object key generation and public URL resolution.

use rand::Rng;
use sitereport_protocol::constants::DEFAULT_EXTENSION;

const SUFFIX_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const SUFFIX_LEN: usize = 11;

/// Builds a collision-resistant key: `<namespace>/<unix-millis>-<suffix>.<ext>`.
pub fn object_key(namespace: &str, file_name: &str) -> String {
    let timestamp = chrono::Utc::now().timestamp_millis();
    let namespace = namespace.trim_matches('/');
    format!(
        "{namespace}/{timestamp}-{}.{}",
        random_suffix(),
        sanitize_extension(file_name)
    )
}

/// Extension of `file_name` reduced to ASCII alphanumerics; `jpg` if nothing
/// usable remains.
pub fn sanitize_extension(file_name: &str) -> String {
    let ext: String = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .unwrap_or_default()
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect();
    if ext.is_empty() {
        DEFAULT_EXTENSION.to_string()
    } else {
        ext
    }
}

/// Resolves a public URL to its object path within `bucket`.
///
/// Returns `None` when the URL does not contain `/<bucket>/<path>`.
pub fn extract_object_path<'a>(url: &'a str, bucket: &str) -> Option<&'a str> {
    let marker = format!("/{bucket}/");
    let start = url.find(&marker)? + marker.len();
    let path = &url[start..];
    if path.is_empty() { None } else { Some(path) }
}

fn random_suffix() -> String {
    let mut rng = rand::thread_rng();
    (0..SUFFIX_LEN)
        .map(|_| SUFFIX_ALPHABET[rng.gen_range(0..SUFFIX_ALPHABET.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn key_layout() {
        let key = object_key("user-42", "IMG_1.JPG");
        let (ns, rest) = key.split_once('/').unwrap();
        assert_eq!(ns, "user-42");

        let (stem, ext) = rest.rsplit_once('.').unwrap();
        assert_eq!(ext, "JPG");
        let (ts, suffix) = stem.split_once('-').unwrap();
        assert!(ts.parse::<i64>().unwrap() > 1_600_000_000_000);
        assert_eq!(suffix.len(), SUFFIX_LEN);
        assert!(suffix.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn keys_do_not_collide() {
        let keys: HashSet<_> = (0..500).map(|_| object_key("u", "a.jpg")).collect();
        assert_eq!(keys.len(), 500);
    }

    #[test]
    fn namespace_slashes_trimmed() {
        assert!(object_key("/u1/", "a.png").starts_with("u1/"));
    }

    #[test]
    fn extension_sanitized() {
        assert_eq!(sanitize_extension("a.jpg"), "jpg");
        assert_eq!(sanitize_extension("a.j%p?g"), "jpg");
        assert_eq!(sanitize_extension("a.tar.gz"), "gz");
        assert_eq!(sanitize_extension("noext"), "jpg");
        assert_eq!(sanitize_extension("trailing."), "jpg");
        assert_eq!(sanitize_extension("a.$$$"), "jpg");
    }

    #[test]
    fn extract_path_from_public_url() {
        let url = "https://p.example/storage/v1/object/public/photos/u1/1-abc.jpg";
        assert_eq!(extract_object_path(url, "photos"), Some("u1/1-abc.jpg"));
    }

    #[test]
    fn extract_path_skips_foreign_urls() {
        assert_eq!(extract_object_path("https://cdn.example/x.jpg", "photos"), None);
        assert_eq!(
            extract_object_path("https://p.example/object/public/photos/", "photos"),
            None
        );
    }
}
