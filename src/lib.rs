//! Client side of the NTLM (NTLMSSP) challenge-response handshake.
//!
//! The crate builds the negotiate (type 1) and authenticate (type 3)
//! messages and decodes the server challenge (type 2), covering both the
//! v1 (LM/NTLM) and v2 (LMv2/NTLMv2) derivation chains. Messages cross the
//! wire as `NTLM <base64>` header values; transport, retries and handshake
//! sequencing are the caller's business.
//!
//! ```no_run
//! use ntlm_auth::{create_negotiate, decode_challenge, create_authenticate};
//! use ntlm_auth::{AuthOptions, Credentials};
//!
//! # fn main() -> Result<(), ntlm_auth::Error> {
//! let negotiate = create_negotiate(Some("WORKSTATION"), None)?;
//! // ... send it, receive the WWW-Authenticate value back ...
//! # let header = String::new();
//! let challenge = decode_challenge(header.as_str())?;
//! let credentials = Credentials {
//!     username: "user".into(),
//!     password: "password".into(),
//! };
//! let authenticate = create_authenticate(&challenge, &credentials, &AuthOptions::default())?;
//! # Ok(())
//! # }
//! ```

use nom::error::VerboseError;

pub mod crypto;
pub mod messages;

mod encoding;
mod error;

pub use encoding::Encoding;
pub use error::Error;
pub use messages::authenticate::Authenticate;
pub use messages::challenge::{Challenge, NtlmVersion};
pub use messages::flags::Flags;
pub use messages::negotiate::Negotiate;
pub use messages::target_info::{TargetInfo, TargetInfoKind};

use crypto::ntlmv2::FileTime;
use messages::Wire;

const SCHEME: &str = "NTLM ";

/// Account identity used to derive the responses.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Per-handshake knobs for [`create_authenticate`]; `Default` picks the
/// challenge's target name, an empty workstation, a fresh random nonce and
/// the current time.
#[derive(Debug, Default, Clone)]
pub struct AuthOptions {
    /// Domain or host to authenticate against; the challenge's target name
    /// when unset.
    pub target: Option<String>,
    pub workstation: Option<String>,
    /// Exactly 16 hex characters. Fixing it makes the v2 responses
    /// deterministic.
    pub client_nonce: Option<String>,
    /// Unix milliseconds for the v2 blob timestamp.
    pub timestamp: Option<u64>,
}

/// Carrier of response headers, so a whole HTTP response can be handed to
/// [`decode_challenge`] directly.
pub trait ResponseHeaders {
    fn www_authenticate(&self) -> Option<&str>;
}

/// Accepted inputs for [`decode_challenge`]: a bare base64 token, a full
/// `WWW-Authenticate` value, or a header carrier.
pub enum ChallengeSource<'a> {
    Header(&'a str),
    Headers(&'a dyn ResponseHeaders),
}

impl<'a> From<&'a str> for ChallengeSource<'a> {
    fn from(value: &'a str) -> Self {
        Self::Header(value)
    }
}

impl<'a> From<&'a dyn ResponseHeaders> for ChallengeSource<'a> {
    fn from(value: &'a dyn ResponseHeaders) -> Self {
        Self::Headers(value)
    }
}

/// Builds the type 1 message as an `NTLM <base64>` header value. `target` is
/// the domain or host being authenticated against; both strings may be
/// absent. An absent `workstation` encodes as an empty string: this crate
/// never looks up the local host name, so callers wanting the conventional
/// client behavior must obtain it themselves and pass it in.
pub fn create_negotiate(workstation: Option<&str>, target: Option<&str>) -> Result<String, Error> {
    let workstation = workstation.unwrap_or("");
    let target = target.unwrap_or("");
    ensure_fits(Encoding::Oem, target, "target does not fit in a security buffer")?;
    ensure_fits(
        Encoding::Oem,
        workstation,
        "workstation does not fit in a security buffer",
    )?;

    let message = Negotiate::new(workstation, target);
    log::debug!("negotiate flags: {:?}", message.flags);
    Ok(frame(&message.serialize()))
}

/// Decodes the type 2 message out of `input`, which may be the bare base64
/// token, the complete `WWW-Authenticate` value, or anything implementing
/// [`ResponseHeaders`].
pub fn decode_challenge<'a>(input: impl Into<ChallengeSource<'a>>) -> Result<Challenge, Error> {
    let value = match input.into() {
        ChallengeSource::Header(value) => value,
        ChallengeSource::Headers(headers) => headers
            .www_authenticate()
            .ok_or(Error::InvalidArgument("missing www-authenticate header"))?,
    };
    let token = extract_token(value);
    let raw =
        base64::decode(token).map_err(|e| Error::MalformedMessage(format!("bad base64: {e}")))?;

    let (_, challenge) = Challenge::deserialize::<VerboseError<&[u8]>>(&raw)?;
    log::debug!(
        "challenge from {:?}: version {:?}, flags {:?}",
        challenge.target_name,
        challenge.version(),
        challenge.flags
    );
    Ok(challenge)
}

/// Builds the type 3 message answering `challenge`, as an `NTLM <base64>`
/// header value. The challenge's flags select the derivation chain (v1 or
/// v2) and the string encoding.
pub fn create_authenticate(
    challenge: &Challenge,
    credentials: &Credentials,
    options: &AuthOptions,
) -> Result<String, Error> {
    let target = options.target.as_deref().unwrap_or(&challenge.target_name);
    let workstation = options.workstation.as_deref().unwrap_or("");
    let encoding = challenge.encoding();
    ensure_fits(encoding, target, "target does not fit in a security buffer")?;
    ensure_fits(
        encoding,
        &credentials.username,
        "username does not fit in a security buffer",
    )?;
    ensure_fits(
        encoding,
        workstation,
        "workstation does not fit in a security buffer",
    )?;

    let (lm_response, nt_response, echoed_flags) = match challenge.version() {
        NtlmVersion::V1 => {
            let lm = crypto::challenge_response(
                &crypto::lm::lm_hash(&credentials.password),
                &challenge.challenge,
            );
            let nt = crypto::challenge_response(
                &crypto::nt::nt_hash(&credentials.password),
                &challenge.challenge,
            );
            (lm.to_vec(), nt.to_vec(), None)
        }
        NtlmVersion::V2 => {
            let generated;
            let nonce_hex = match &options.client_nonce {
                Some(nonce) => nonce.as_str(),
                None => {
                    generated = crypto::client_nonce(16);
                    &generated
                }
            };
            let client_nonce = parse_nonce(nonce_hex)?;
            let time = options
                .timestamp
                .map(FileTime::from_unix_millis)
                .unwrap_or_else(FileTime::now);
            let target_info = challenge
                .target_info
                .as_ref()
                .map(TargetInfo::raw)
                .unwrap_or(&[]);

            let hmac_key = crypto::nt::ntlmv2_hash(
                &crypto::nt::nt_hash(&credentials.password),
                &credentials.username,
                target,
            );
            let lm = crypto::ntlmv2::lmv2_response(&hmac_key, &challenge.challenge, &client_nonce);
            let nt = crypto::ntlmv2::ntlmv2_response(
                &hmac_key,
                &challenge.challenge,
                &client_nonce,
                time,
                target_info,
            );
            (lm.to_vec(), nt, Some(challenge.flags))
        }
    };

    let message = Authenticate {
        lm_response,
        nt_response,
        target: target.to_owned(),
        username: credentials.username.clone(),
        workstation: workstation.to_owned(),
        encoding,
        flags: echoed_flags,
    };
    Ok(frame(&message.serialize()))
}

fn frame(raw: &[u8]) -> String {
    format!("{SCHEME}{}", base64::encode(raw))
}

/// Strips the `NTLM ` scheme and anything past the token (servers may list
/// several schemes in one header value); bare tokens pass through.
fn extract_token(value: &str) -> &str {
    match value.strip_prefix(SCHEME) {
        Some(rest) => rest
            .split(|c: char| c == ',' || c.is_whitespace())
            .next()
            .unwrap_or(rest),
        None => value,
    }
}

fn parse_nonce(nonce: &str) -> Result<[u8; 8], Error> {
    let mut out = [0u8; 8];
    if nonce.len() != 16 || hex::decode_to_slice(nonce, &mut out).is_err() {
        return Err(Error::InvalidArgument(
            "client nonce must be exactly 16 hex characters",
        ));
    }
    Ok(out)
}

fn ensure_fits(encoding: Encoding, s: &str, what: &'static str) -> Result<(), Error> {
    if encoding.encode(s).len() > usize::from(u16::MAX) {
        return Err(Error::InvalidArgument(what));
    }
    Ok(())
}
