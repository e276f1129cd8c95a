use des::cipher::{generic_array::GenericArray, BlockEncrypt, KeyInit};

/// Expands a 56-bit key into the 64-bit form DES expects: each output byte
/// carries seven key bits in its upper bits and an odd-parity bit in its LSB.
pub fn expand_key(key7: &[u8; 7]) -> [u8; 8] {
    let mut key8 = [
        key7[0],
        (key7[0] << 7) | (key7[1] >> 1),
        (key7[1] << 6) | (key7[2] >> 2),
        (key7[2] << 5) | (key7[3] >> 3),
        (key7[3] << 4) | (key7[4] >> 4),
        (key7[4] << 3) | (key7[5] >> 5),
        (key7[5] << 2) | (key7[6] >> 6),
        key7[6] << 1,
    ];
    for byte in key8.iter_mut() {
        *byte &= 0xfe;
        if byte.count_ones() % 2 == 0 {
            *byte |= 1;
        }
    }
    key8
}

/// Single-block DES-ECB encryption under a 7-byte key.
pub fn encrypt7(key7: &[u8; 7], plain: &[u8; 8]) -> [u8; 8] {
    let key8 = expand_key(key7);
    let cipher = des::Des::new(GenericArray::from_slice(&key8));
    let mut block = GenericArray::clone_from_slice(&plain[..]);
    cipher.encrypt_block(&mut block);
    let mut out = [0u8; 8];
    out.copy_from_slice(&block);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expanded_key_has_odd_parity() {
        for key7 in [[0u8; 7], [0xffu8; 7], *b"PASSWOR"] {
            for byte in expand_key(&key7) {
                assert_eq!(byte.count_ones() % 2, 1, "byte {byte:#04x}");
            }
        }
    }

    #[test]
    fn known_block() {
        // First half of the LM hash of "PASSWORD".
        let cipher = encrypt7(b"PASSWOR", b"KGS!@#$%");
        pretty_assertions::assert_eq!(cipher, [0xe5, 0x2c, 0xac, 0x67, 0x41, 0x9a, 0x9a, 0x22]);
    }

    #[test]
    fn distinct_keys_distinct_blocks() {
        let a = encrypt7(b"AAAAAAA", b"KGS!@#$%");
        let b = encrypt7(b"AAAAAAB", b"KGS!@#$%");
        assert_ne!(a, b);
        assert_eq!(a, encrypt7(b"AAAAAAA", b"KGS!@#$%"));
    }
}
