/// Decode published text: UTF-8 when valid (BOM stripped), otherwise
/// Windows-1252, which older Met Éireann exports use.
pub fn decode_text(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.trim_start_matches('\u{feff}').to_string(),
        Err(_) => {
            let (text, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
            text.into_owned()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utf8_passthrough() {
        assert_eq!(decode_text("Béal an Átha".as_bytes()), "Béal an Átha");
    }

    #[test]
    fn test_bom_is_stripped() {
        assert_eq!(decode_text(b"\xef\xbb\xbfstno,name"), "stno,name");
    }

    #[test]
    fn test_windows_1252_fallback() {
        assert_eq!(decode_text(b"B\xe9al"), "Béal");
    }
}
