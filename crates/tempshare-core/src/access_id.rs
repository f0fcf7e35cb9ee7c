use rand::Rng;

/// Length of every generated access id.
pub const ACCESS_ID_LEN: usize = 16;

const URL_SAFE: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789_-";

/// Generate a random, URL-safe access id of `ACCESS_ID_LEN` characters.
///
/// 16 symbols from a 64-character alphabet give 96 bits of entropy. The
/// generator does not check uniqueness; the `files.access_id` unique
/// constraint does.
pub fn generate_access_id() -> String {
    let mut rng = rand::thread_rng();
    (0..ACCESS_ID_LEN)
        .map(|_| URL_SAFE[rng.gen_range(0..URL_SAFE.len())] as char)
        .collect()
}

/// Cheap shape check applied before touching the database.
pub fn looks_like_access_id(s: &str) -> bool {
    !s.is_empty()
        && s.len() <= 64
        && s.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_id_has_fixed_length() {
        assert_eq!(generate_access_id().len(), ACCESS_ID_LEN);
    }

    #[test]
    fn access_id_is_url_safe() {
        for _ in 0..100 {
            let id = generate_access_id();
            assert!(
                id.chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-'),
                "not url safe: {id}"
            );
        }
    }

    #[test]
    fn access_ids_differ() {
        assert_ne!(generate_access_id(), generate_access_id());
    }

    #[test]
    fn looks_like_access_id_rejects_garbage() {
        assert!(looks_like_access_id("abcDEF123_-xyz00"));
        assert!(!looks_like_access_id(""));
        assert!(!looks_like_access_id("../etc/passwd"));
        assert!(!looks_like_access_id("has space"));
        assert!(!looks_like_access_id(&"a".repeat(65)));
    }
}
