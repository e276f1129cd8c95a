use std::fmt;

use nom::combinator::map;
use nom::error::context;
use nom::number::complete::le_u32;

use super::{utils::write_u32, NomError, Wire};

/// Negotiation flag bit positions (MS-NLMP 2.2.2.5).
pub const NEGOTIATE_UNICODE: u32 = 0;
pub const NEGOTIATE_OEM: u32 = 1;
pub const REQUEST_TARGET: u32 = 2;
pub const NEGOTIATE_SIGN: u32 = 4;
pub const NEGOTIATE_SEAL: u32 = 5;
pub const NEGOTIATE_LM_KEY: u32 = 7;
pub const NEGOTIATE_NTLM_KEY: u32 = 9;
pub const NEGOTIATE_DOMAIN_SUPPLIED: u32 = 12;
pub const NEGOTIATE_WORKSTATION_SUPPLIED: u32 = 13;
pub const NEGOTIATE_ALWAYS_SIGN: u32 = 15;
pub const TARGET_TYPE_DOMAIN: u32 = 16;
pub const TARGET_TYPE_SERVER: u32 = 17;
pub const NEGOTIATE_NTLM2_KEY: u32 = 19;
pub const NEGOTIATE_TARGET_INFO: u32 = 23;
pub const NEGOTIATE_128: u32 = 29;
pub const NEGOTIATE_KEY_EXCHANGE: u32 = 30;
pub const NEGOTIATE_56: u32 = 31;

const NAMES: &[(u32, &str)] = &[
    (NEGOTIATE_UNICODE, "NEGOTIATE_UNICODE"),
    (NEGOTIATE_OEM, "NEGOTIATE_OEM"),
    (REQUEST_TARGET, "REQUEST_TARGET"),
    (NEGOTIATE_SIGN, "NEGOTIATE_SIGN"),
    (NEGOTIATE_SEAL, "NEGOTIATE_SEAL"),
    (NEGOTIATE_LM_KEY, "NEGOTIATE_LM_KEY"),
    (NEGOTIATE_NTLM_KEY, "NEGOTIATE_NTLM_KEY"),
    (NEGOTIATE_DOMAIN_SUPPLIED, "NEGOTIATE_DOMAIN_SUPPLIED"),
    (
        NEGOTIATE_WORKSTATION_SUPPLIED,
        "NEGOTIATE_WORKSTATION_SUPPLIED",
    ),
    (NEGOTIATE_ALWAYS_SIGN, "NEGOTIATE_ALWAYS_SIGN"),
    (TARGET_TYPE_DOMAIN, "TARGET_TYPE_DOMAIN"),
    (TARGET_TYPE_SERVER, "TARGET_TYPE_SERVER"),
    (NEGOTIATE_NTLM2_KEY, "NEGOTIATE_NTLM2_KEY"),
    (NEGOTIATE_TARGET_INFO, "NEGOTIATE_TARGET_INFO"),
    (NEGOTIATE_128, "NEGOTIATE_128"),
    (NEGOTIATE_KEY_EXCHANGE, "NEGOTIATE_KEY_EXCHANGE"),
    (NEGOTIATE_56, "NEGOTIATE_56"),
];

/// Raw negotiation flag word. Servers send whatever they like here, so no
/// bit is validated on decode; the codec only derives encoding and protocol
/// version from it.
#[derive(Default, Clone, Copy, PartialEq, Eq)]
pub struct Flags(pub u32);

impl Flags {
    pub fn has_flag(&self, bit: u32) -> bool {
        debug_assert!(bit <= 31);
        self.0 & (1 << bit) != 0
    }

    pub fn set_flag(&mut self, bit: u32) {
        debug_assert!(bit <= 31);
        self.0 |= 1 << bit;
    }

    pub fn clear_flag(&mut self, bit: u32) {
        debug_assert!(bit <= 31);
        self.0 &= !(1 << bit);
    }
}

impl<'a> Wire<'a> for Flags {
    fn serialize_into<W>(&self, writer: &mut W) -> std::io::Result<usize>
    where
        W: std::io::Write,
    {
        write_u32(writer, self.0)
    }

    fn deserialize<E>(input: &'a [u8]) -> nom::IResult<&'a [u8], Self, E>
    where
        E: NomError<'a>,
    {
        context("Flags", map(le_u32, Self))(input)
    }
}

impl fmt::Debug for Flags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut remaining = self.0;
        let mut first = true;
        for &(bit, name) in NAMES {
            if self.has_flag(bit) {
                if !first {
                    f.write_str("|")?;
                }
                f.write_str(name)?;
                first = false;
                remaining &= !(1 << bit);
            }
        }
        if remaining != 0 {
            if !first {
                f.write_str("|")?;
            }
            write!(f, "{remaining:#x}")?;
            first = false;
        }
        if first {
            f.write_str("0")?;
        }
        Ok(())
    }
}
