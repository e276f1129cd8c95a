use nom::bytes::complete::{tag, take};
use nom::combinator::verify;
use nom::error::context;
use nom::number::complete::le_u32;
use nom::sequence::{preceded, tuple};

use crate::encoding::Encoding;

use super::{
    flags::{self, Flags},
    target_info::TargetInfo,
    utils::write_u32,
    Field, NomError, Wire, SIGNATURE,
};

const MESSAGE_TYPE: u32 = 0x0000_0002;
const HEADER_SIZE: usize = 48;

/// Protocol generation the server selected, derived from the NTLM2-key flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NtlmVersion {
    V1,
    V2,
}

/// Type 2 message carrying the server challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Challenge {
    pub flags: Flags,
    pub challenge: [u8; 8],
    pub target_name: String,
    /// Present only when the server set the target-info flag.
    pub target_info: Option<TargetInfo>,
}

impl Challenge {
    /// String encoding for this exchange: OEM when the server insists on it,
    /// UTF-16LE otherwise.
    pub fn encoding(&self) -> Encoding {
        if self.flags.has_flag(flags::NEGOTIATE_OEM) {
            Encoding::Oem
        } else {
            Encoding::Unicode
        }
    }

    pub fn version(&self) -> NtlmVersion {
        if self.flags.has_flag(flags::NEGOTIATE_NTLM2_KEY) {
            NtlmVersion::V2
        } else {
            NtlmVersion::V1
        }
    }
}

impl<'a> Wire<'a> for Challenge {
    fn serialize_into<W>(&self, writer: &mut W) -> std::io::Result<usize>
    where
        W: std::io::Write,
    {
        let mut payload = vec![0u8; HEADER_SIZE];

        let mut written = 0;
        writer.write_all(&SIGNATURE[..])?;
        written += SIGNATURE.len();
        written += write_u32(writer, MESSAGE_TYPE)?;
        written += Field::append(
            &self.encoding().encode(&self.target_name),
            &mut payload,
            writer,
        )?;
        written += self.flags.serialize_into(writer)?;
        writer.write_all(&self.challenge)?;
        written += self.challenge.len();
        // Reserved context block.
        writer.write_all(&[0u8; 8])?;
        written += 8;
        written += match &self.target_info {
            Some(info) => Field::append(info.raw(), &mut payload, writer)?,
            None => Field::zeroed().serialize_into(writer)?,
        };
        debug_assert_eq!(written, HEADER_SIZE);

        writer.write_all(&payload[HEADER_SIZE..])?;
        written += payload.len() - HEADER_SIZE;

        Ok(written)
    }

    fn deserialize<E>(input: &'a [u8]) -> nom::IResult<&'a [u8], Self, E>
    where
        E: NomError<'a>,
    {
        let (rest, (target_field, negotiate_flags, challenge_bytes)) = context(
            "Challenge",
            preceded(
                tuple((tag(&SIGNATURE[..]), verify(le_u32, |mt| *mt == MESSAGE_TYPE))),
                tuple((Field::deserialize, Flags::deserialize, take(8usize))),
            ),
        )(input)?;

        let mut challenge = [0u8; 8];
        challenge.copy_from_slice(challenge_bytes);

        let encoding = if negotiate_flags.has_flag(flags::NEGOTIATE_OEM) {
            Encoding::Oem
        } else {
            Encoding::Unicode
        };
        let target_name = target_field.read_string(input, encoding)?;

        // The 8 reserved bytes after the challenge carry no meaning; servers
        // put arbitrary context values there.
        let target_info = if negotiate_flags.has_flag(flags::NEGOTIATE_TARGET_INFO) {
            let (_, info_field) = context(
                "Challenge/target info",
                preceded(take(8usize), Field::deserialize),
            )(rest)?;
            if info_field.len == 0 {
                log::warn!("target info flag set but the security buffer is empty");
                None
            } else {
                let data = info_field.checked_slice(input)?;
                let (_, info) = TargetInfo::deserialize(data)?;
                Some(info)
            }
        } else {
            None
        };

        Ok((
            &b""[..],
            Self {
                flags: negotiate_flags,
                challenge,
                target_name,
                target_info,
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::target_info::TargetInfoKind;
    use nom::error::VerboseError;

    fn init_logs() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    // Type 2 message captured from a lab IIS server.
    const CISCOLAB_TOKEN: &str =
        "TlRMTVNTUAACAAAAEAAQADAAAAAFgominWXBG0VA2i4AAAAAAAAAAHYAdgBAAAAAQwBJAFMAQwBPAEwAQQBCAA\
         IAEABDAEkAUwBDAE8ATABBAEIAAQAQAFAATwBTAEUASQBEAE8ATgAEABgAYwBpAHMAYwBvAGwAYQBiAC4AYwBv\
         AG0AAwAqAHAAbwBzAGUAaQBkAG8AbgAuAGMAaQBzAGMAbwBsAGEAYgAuAGMAbwBtAAAAAAA=";

    #[test]
    fn decode_ciscolab() {
        let raw = base64::decode(CISCOLAB_TOKEN).unwrap();
        let (_, challenge) = Challenge::deserialize::<VerboseError<_>>(&raw).unwrap();

        assert_eq!(challenge.flags.0, 0xa289_8205);
        assert_eq!(challenge.encoding(), Encoding::Unicode);
        assert_eq!(challenge.version(), NtlmVersion::V2);
        assert_eq!(
            challenge.challenge,
            [0x9d, 0x65, 0xc1, 0x1b, 0x45, 0x40, 0xda, 0x2e]
        );
        pretty_assertions::assert_eq!(challenge.target_name, "CISCOLAB");

        let info = challenge.target_info.as_ref().unwrap();
        assert_eq!(info.raw().len(), 118);
        assert_eq!(info.get(TargetInfoKind::Domain), Some("CISCOLAB"));
        assert_eq!(info.get(TargetInfoKind::Server), Some("POSEIDON"));
        assert_eq!(info.get(TargetInfoKind::Dns), Some("ciscolab.com"));
        assert_eq!(
            info.get(TargetInfoKind::Fqdn),
            Some("poseidon.ciscolab.com")
        );
    }

    #[test]
    fn round_trip() {
        let mut challenge_flags = Flags::default();
        for bit in [
            flags::NEGOTIATE_UNICODE,
            flags::REQUEST_TARGET,
            flags::NEGOTIATE_NTLM2_KEY,
            flags::NEGOTIATE_TARGET_INFO,
        ] {
            challenge_flags.set_flag(bit);
        }
        let msg = Challenge {
            flags: challenge_flags,
            challenge: *b"\x01\x23\x45\x67\x89\xab\xcd\xef",
            target_name: "CONTOSO".into(),
            target_info: Some(TargetInfo::from_entries(&[
                (TargetInfoKind::Domain, "CONTOSO"),
                (TargetInfoKind::Server, "DC1"),
            ])),
        };
        let ser = msg.serialize();
        let (_, back) = Challenge::deserialize::<VerboseError<_>>(&ser).unwrap();
        pretty_assertions::assert_eq!(back, msg);
    }

    #[test]
    fn empty_target_info_buffer_is_tolerated() {
        init_logs();
        let mut challenge_flags = Flags::default();
        challenge_flags.set_flag(flags::NEGOTIATE_UNICODE);
        challenge_flags.set_flag(flags::NEGOTIATE_TARGET_INFO);
        // Flag set but nothing behind it: warn and carry on.
        let msg = Challenge {
            flags: challenge_flags,
            challenge: [0u8; 8],
            target_name: "SRV".into(),
            target_info: None,
        };
        let ser = msg.serialize();
        let (_, back) = Challenge::deserialize::<VerboseError<_>>(&ser).unwrap();
        assert!(back.target_info.is_none());
    }

    #[test]
    fn missing_target_info_flag_means_none() {
        let mut challenge_flags = Flags::default();
        challenge_flags.set_flag(flags::NEGOTIATE_OEM);
        let msg = Challenge {
            flags: challenge_flags,
            challenge: [0u8; 8],
            target_name: "SRV".into(),
            target_info: None,
        };
        let ser = msg.serialize();
        let (_, back) = Challenge::deserialize::<VerboseError<_>>(&ser).unwrap();
        assert!(back.target_info.is_none());
        assert_eq!(back.encoding(), Encoding::Oem);
        assert_eq!(back.version(), NtlmVersion::V1);
    }

    #[test]
    fn rejects_wrong_message_type() {
        let mut raw = base64::decode(CISCOLAB_TOKEN).unwrap();
        raw[8] = 3;
        assert!(Challenge::deserialize::<VerboseError<_>>(&raw).is_err());
    }

    #[test]
    fn rejects_out_of_bounds_target_name() {
        let mut raw = base64::decode(CISCOLAB_TOKEN).unwrap();
        // Push the target name offset inside the fixed header.
        raw[16] = 12;
        assert!(Challenge::deserialize::<VerboseError<_>>(&raw).is_err());
    }
}
