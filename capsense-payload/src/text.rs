//! Helpers for the fixed width character arrays carried in the
//! records. The node does not promise a terminating NUL.

/// View a fixed width field as text, stopping at the first NUL or
/// at the first byte that is not valid UTF-8
pub fn fixed_str(bytes: &[u8]) -> &str {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    let bytes = &bytes[..end];
    match core::str::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => core::str::from_utf8(&bytes[..e.valid_up_to()]).unwrap_or_default(),
    }
}

/// Copy at most `N` bytes of `s` into a zero padded array
pub fn fixed_text<const N: usize>(s: &str) -> [u8; N] {
    let mut buf = [0u8; N];
    let n = s.len().min(N);
    buf[..n].copy_from_slice(&s.as_bytes()[..n]);
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_width_without_nul() {
        assert_eq!(fixed_str(b"nFD!"), "nFD!");
    }

    #[test]
    fn stops_at_nul() {
        assert_eq!(fixed_str(b"pF\0x"), "pF");
    }

    #[test]
    fn stops_at_invalid_utf8() {
        assert_eq!(fixed_str(&[b'o', b'k', 0xff, b'z']), "ok");
    }

    #[test]
    fn long_text_is_cut() {
        let text: [u8; 4] = fixed_text("capacitance");
        assert_eq!(&text, b"capa");
        let short: [u8; 4] = fixed_text("FD");
        assert_eq!(&short, b"FD\0\0");
    }
}
