use crate::encoding::utf16le_bytes;

pub type NtHash = [u8; 16];

/// NTLM one-way function: MD4 of the UTF-16LE password. No truncation, no
/// case folding.
pub fn nt_hash(password: &str) -> NtHash {
    let mut hash = NtHash::default();
    super::md4(&utf16le_bytes(password), &mut hash);
    hash
}

/// NTLMv2 one-way function: HMAC-MD5 keyed by the NTLM hash over
/// UTF-16LE(uppercase(username) + target).
pub fn ntlmv2_hash(hash: &NtHash, username: &str, target: &str) -> NtHash {
    let identity = format!("{}{}", username.to_uppercase(), target);
    let mut out = NtHash::default();
    super::hmac_md5(hash, &utf16le_bytes(&identity), &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_hash() {
        let hash = [
            0x88, 0x46, 0xf7, 0xea, 0xee, 0x8f, 0xb1, 0x17, 0xad, 0x06, 0xbd, 0xd8, 0x30, 0xb7,
            0x58, 0x6c,
        ];
        pretty_assertions::assert_eq!(nt_hash("password"), hash);
    }

    #[test]
    fn v2_hash_vector() {
        // MS-NLMP 4.2.4.1.1: NTOWFv2(Password, User, Domain).
        let v2 = [
            0x0c, 0x86, 0x8a, 0x40, 0x3b, 0xfd, 0x7a, 0x93, 0xa3, 0x00, 0x1e, 0xf2, 0x2e, 0xf0,
            0x2e, 0x3f,
        ];
        pretty_assertions::assert_eq!(ntlmv2_hash(&nt_hash("Password"), "User", "Domain"), v2);
    }

    #[test]
    fn v2_hash_folds_username_case_only() {
        let hash = nt_hash("secret");
        assert_eq!(
            ntlmv2_hash(&hash, "user", "Domain"),
            ntlmv2_hash(&hash, "USER", "Domain")
        );
        assert_ne!(
            ntlmv2_hash(&hash, "user", "domain"),
            ntlmv2_hash(&hash, "user", "DOMAIN")
        );
    }
}
