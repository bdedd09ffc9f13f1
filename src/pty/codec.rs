//! ISO-8859-1 text codec for the channel.
//!
//! Every byte maps to the char with the same code point, so any byte
//! sequence survives a decode/encode round trip unchanged.

use std::io;

/// Decode raw channel bytes into text.
pub fn decode(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// Encode text for the channel.
///
/// Fails with `InvalidInput` if `text` contains a char above U+00FF.
pub fn encode(text: &str) -> io::Result<Vec<u8>> {
    text.chars()
        .map(|c| {
            u8::try_from(u32::from(c)).map_err(|_| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("character {:?} is not representable in ISO-8859-1", c),
                )
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{decode, encode};

    #[test]
    fn every_byte_round_trips() {
        let all: Vec<u8> = (0..=255u8).collect();
        let text = decode(&all);
        assert_eq!(text.chars().count(), 256);
        assert_eq!(encode(&text).unwrap(), all);
    }

    #[test]
    fn high_bytes_decode_to_latin1_chars() {
        assert_eq!(decode(&[0xe4, 0x7f, 0x08]), "\u{e4}\u{7f}\u{8}");
    }

    #[test]
    fn wide_chars_are_rejected() {
        let err = encode("snow \u{2603}").unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidInput);
    }
}
