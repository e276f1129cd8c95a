use crate::error::Error;

/// String encoding negotiated in the challenge flags: either the single-byte
/// OEM character set or UTF-16LE.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Oem,
    Unicode,
}

impl Encoding {
    pub fn encode(self, s: &str) -> Vec<u8> {
        match self {
            Self::Oem => s.chars().map(|c| c as u8).collect(),
            Self::Unicode => utf16le_bytes(s),
        }
    }

    pub fn decode(self, bytes: &[u8]) -> Result<String, Error> {
        match self {
            Self::Oem => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
            Self::Unicode => utf16le_string(bytes),
        }
    }
}

pub(crate) fn utf16le_bytes(s: &str) -> Vec<u8> {
    s.encode_utf16().flat_map(u16::to_le_bytes).collect()
}

pub(crate) fn utf16le_string(bytes: &[u8]) -> Result<String, Error> {
    if bytes.len() % 2 != 0 {
        return Err(Error::MalformedMessage(
            "UTF-16 string with an odd byte count".into(),
        ));
    }
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    String::from_utf16(&units).map_err(|_| Error::MalformedMessage("invalid UTF-16 string".into()))
}
