/// Strong ETag for a pre-serialized payload, derived from its crc32.
pub fn payload_etag(bytes: &[u8]) -> String {
    format!("\"{:08x}\"", crc32fast::hash(bytes))
}

#[cfg(test)]
mod tests {
    use super::payload_etag;

    #[test]
    fn etag_is_stable_and_quoted() {
        let a = payload_etag(b"[]");
        assert_eq!(a, payload_etag(b"[]"));
        assert!(a.starts_with('"') && a.ends_with('"'));
    }

    #[test]
    fn etag_changes_with_payload() {
        assert_ne!(payload_etag(b"[]"), payload_etag(b"[1]"));
    }
}
