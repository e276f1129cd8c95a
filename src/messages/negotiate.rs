use nom::bytes::complete::tag;
use nom::combinator::verify;
use nom::error::context;
use nom::number::complete::le_u32;
use nom::sequence::{preceded, tuple};

use crate::encoding::Encoding;

use super::{
    flags::{self, Flags},
    utils::write_u32,
    Field, Wire, SIGNATURE,
};

const MESSAGE_TYPE: u32 = 0x0000_0001;
const HEADER_SIZE: usize = 32;

/// Type 1 message opening the handshake. The flag set is fixed: OEM
/// encoding, request-target, NTLM, NTLM2 key and always-sign.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Negotiate {
    pub flags: Flags,
    /// Domain or host being authenticated against; the first security buffer.
    pub domain: String,
    pub workstation: String,
}

impl Negotiate {
    pub fn new(workstation: &str, domain: &str) -> Self {
        let mut negotiate_flags = Flags::default();
        for bit in [
            flags::NEGOTIATE_OEM,
            flags::REQUEST_TARGET,
            flags::NEGOTIATE_NTLM_KEY,
            flags::NEGOTIATE_NTLM2_KEY,
            flags::NEGOTIATE_ALWAYS_SIGN,
        ] {
            negotiate_flags.set_flag(bit);
        }
        Self {
            flags: negotiate_flags,
            domain: domain.to_owned(),
            workstation: workstation.to_owned(),
        }
    }
}

impl<'a> Wire<'a> for Negotiate {
    fn serialize_into<W>(&self, writer: &mut W) -> std::io::Result<usize>
    where
        W: std::io::Write,
    {
        let mut payload = vec![0u8; HEADER_SIZE];

        let mut written = 0;
        writer.write_all(&SIGNATURE[..])?;
        written += SIGNATURE.len();
        written += write_u32(writer, MESSAGE_TYPE)?;
        written += self.flags.serialize_into(writer)?;
        // Type 1 strings are always OEM-encoded, whatever the flags ask for.
        written += Field::append_optional(&Encoding::Oem.encode(&self.domain), &mut payload, writer)?;
        written +=
            Field::append_optional(&Encoding::Oem.encode(&self.workstation), &mut payload, writer)?;
        debug_assert_eq!(written, HEADER_SIZE);

        writer.write_all(&payload[HEADER_SIZE..])?;
        written += payload.len() - HEADER_SIZE;

        Ok(written)
    }

    fn deserialize<E>(input: &'a [u8]) -> nom::IResult<&'a [u8], Self, E>
    where
        E: super::NomError<'a>,
    {
        let (_, (negotiate_flags, domain_field, workstation_field)) = context(
            "Negotiate",
            preceded(
                tuple((tag(&SIGNATURE[..]), verify(le_u32, |mt| *mt == MESSAGE_TYPE))),
                tuple((Flags::deserialize, Field::deserialize, Field::deserialize)),
            ),
        )(input)?;

        let domain = domain_field.read_string(input, Encoding::Oem)?;
        let workstation = workstation_field.read_string(input, Encoding::Oem)?;

        Ok((
            &b""[..],
            Self {
                flags: negotiate_flags,
                domain,
                workstation,
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nom::error::VerboseError;

    #[test]
    fn fixed_flag_set() {
        let msg = Negotiate::new("", "");
        assert_eq!(msg.flags.0, 0x0008_8206);
    }

    #[test]
    fn layout() {
        let msg = Negotiate::new("WS1", "EXAMPLE");
        let ser = msg.serialize();

        assert_eq!(&ser[..8], b"NTLMSSP\0");
        assert_eq!(u32::from_le_bytes(ser[8..12].try_into().unwrap()), 1);
        // Domain first at offset 32, workstation right after.
        assert_eq!(u16::from_le_bytes(ser[16..18].try_into().unwrap()), 7);
        assert_eq!(u32::from_le_bytes(ser[20..24].try_into().unwrap()), 32);
        assert_eq!(u16::from_le_bytes(ser[24..26].try_into().unwrap()), 3);
        assert_eq!(u32::from_le_bytes(ser[28..32].try_into().unwrap()), 39);
        assert_eq!(&ser[32..39], b"EXAMPLE");
        assert_eq!(&ser[39..], b"WS1");
    }

    #[test]
    fn empty_strings_keep_zero_offsets() {
        let ser = Negotiate::new("", "").serialize();
        assert_eq!(ser.len(), 32);
        assert_eq!(&ser[16..24], &[0u8; 8]);
        assert_eq!(&ser[24..32], &[0u8; 8]);
    }

    #[test]
    fn round_trip() {
        let msg = Negotiate::new("PC1", "CONTOSO");
        let ser = msg.serialize();
        let (_, back) = Negotiate::deserialize::<VerboseError<_>>(&ser).unwrap();
        pretty_assertions::assert_eq!(back, msg);
    }
}
