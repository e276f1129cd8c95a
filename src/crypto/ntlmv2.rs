use std::time::{SystemTime, UNIX_EPOCH};

use super::nt::NtHash;

/// Milliseconds between 1601-01-01 (the NTLM epoch) and 1970-01-01.
const EPOCH_OFFSET_MILLIS: u64 = 11_644_473_600_000;

/// Windows FILETIME: 100-nanosecond ticks since 1601-01-01, split into two
/// little-endian 32-bit halves on the wire, low half first.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FileTime {
    pub low: u32,
    pub high: u32,
}

impl FileTime {
    /// Exact integer conversion from the Unix epoch; no floating point, so
    /// the high half never loses precision.
    pub fn from_unix_millis(millis: u64) -> Self {
        let ticks = (millis + EPOCH_OFFSET_MILLIS) * 10_000;
        Self {
            low: ticks as u32,
            high: (ticks >> 32) as u32,
        }
    }

    pub fn now() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        Self::from_unix_millis(millis)
    }

    pub fn as_u64(&self) -> u64 {
        ((self.high as u64) << 32) | (self.low as u64)
    }
}

/// LMv2 response: HMAC-MD5 over server challenge + client nonce, followed by
/// the nonce itself. Always 24 bytes.
pub fn lmv2_response(
    hmac_key: &NtHash,
    server_challenge: &[u8; 8],
    client_nonce: &[u8; 8],
) -> [u8; 24] {
    let mut response = [0u8; 24];
    response[8..16].copy_from_slice(server_challenge);
    response[16..24].copy_from_slice(client_nonce);

    let mut digest = [0u8; 16];
    super::hmac_md5(hmac_key, &response[8..], &mut digest);
    response[..16].copy_from_slice(&digest);

    response
}

/// NTLMv2 response: 16-byte proof digest, then the blob it was computed
/// over. `48 + target_info.len()` bytes in total.
///
/// The target-info bytes must be the raw range lifted from the challenge
/// message; re-encoding the parsed entries would change the HMAC input on
/// servers that send attributes we do not parse.
pub fn ntlmv2_response(
    hmac_key: &NtHash,
    server_challenge: &[u8; 8],
    client_nonce: &[u8; 8],
    time: FileTime,
    target_info: &[u8],
) -> Vec<u8> {
    let mut response = vec![0u8; 48 + target_info.len()];
    response[8..16].copy_from_slice(server_challenge);
    // Blob signature, the only big-endian field in the message.
    response[16..20].copy_from_slice(&0x0101_0000u32.to_be_bytes());
    // [20..24] reserved.
    response[24..28].copy_from_slice(&time.low.to_le_bytes());
    response[28..32].copy_from_slice(&time.high.to_le_bytes());
    response[32..40].copy_from_slice(client_nonce);
    // [40..44] reserved.
    response[44..44 + target_info.len()].copy_from_slice(target_info);
    // The last four bytes stay zero as the blob terminator.

    let mut digest = [0u8; 16];
    super::hmac_md5(hmac_key, &response[8..], &mut digest);
    response[..16].copy_from_slice(&digest);

    response
}
