use hmac::{Hmac, Mac};
use md4::{Digest, Md4};
use md5::Md5;
use rand::{rngs::OsRng, RngCore};

pub mod des;
pub mod lm;
pub mod nt;
pub mod ntlmv2;

pub(crate) fn md4(input: &[u8], out: &mut [u8; 16]) {
    let mut hasher = Md4::new();
    hasher.update(input);
    out.copy_from_slice(&hasher.finalize());
}

pub(crate) fn hmac_md5(key: &[u8], input: &[u8], out: &mut [u8; 16]) {
    let mut mac = <Hmac<Md5>>::new_from_slice(key).expect("HMAC accepts any key length");
    mac.update(input);
    out.copy_from_slice(&mac.finalize().into_bytes());
}

/// The 24-byte v1 response: the 16-byte hash is zero-extended to 21 bytes,
/// split into three 7-byte DES keys and each one encrypts the server
/// challenge. Serves both the LM and the NTLM response, which only differ in
/// the hash fed in.
pub fn challenge_response(hash: &[u8; 16], challenge: &[u8; 8]) -> [u8; 24] {
    let mut key = [0u8; 21];
    key[..16].copy_from_slice(hash);

    let mut response = [0u8; 24];
    for i in 0..3 {
        let key7: [u8; 7] = key[i * 7..][..7].try_into().expect("7-byte key");
        response[i * 8..][..8].copy_from_slice(&des::encrypt7(&key7, challenge));
    }
    response
}

/// Client nonce: `len` lowercase hex characters from the OS random source.
/// Every consumer of a nonce also accepts a caller-supplied one, so tests
/// never need to touch this.
pub fn client_nonce(len: usize) -> String {
    let mut bytes = vec![0u8; (len + 1) / 2];
    OsRng.fill_bytes(&mut bytes);
    let mut nonce = hex::encode(bytes);
    nonce.truncate(len);
    nonce
}
