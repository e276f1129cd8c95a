use super::des::encrypt7;

pub type LmHash = [u8; 16];

const MAGIC: &[u8; 8] = b"KGS!@#$%";
const MAX_PASSWORD_LEN: usize = 14;

/// LM one-way function: uppercase the password, zero-pad it to 14 bytes and
/// DES-encrypt a fixed constant under each 7-byte half.
///
/// Passwords longer than 14 bytes have no LM hash; the all-zero value is
/// returned instead of an error, as the protocol expects.
pub fn lm_hash(password: &str) -> LmHash {
    let mut hash = LmHash::default();
    if password.len() > MAX_PASSWORD_LEN {
        return hash;
    }

    // Uppercasing can grow the byte count (ß becomes SS); anything past 14
    // bytes is dropped.
    let upper = password.to_uppercase();
    let n = upper.len().min(MAX_PASSWORD_LEN);
    let mut padded = [0u8; MAX_PASSWORD_LEN];
    padded[..n].copy_from_slice(&upper.as_bytes()[..n]);

    let key1: [u8; 7] = padded[..7].try_into().expect("7-byte half");
    let key2: [u8; 7] = padded[7..].try_into().expect("7-byte half");
    hash[..8].copy_from_slice(&encrypt7(&key1, MAGIC));
    hash[8..].copy_from_slice(&encrypt7(&key2, MAGIC));

    hash
}
