use std::io::{self, Write};

pub(crate) trait NomError<'a>:
    nom::error::ContextError<&'a [u8]> + nom::error::ParseError<&'a [u8]>
{
}

impl<'a, E> NomError<'a> for E where
    E: nom::error::ParseError<&'a [u8]> + nom::error::ContextError<&'a [u8]>
{
}

pub(crate) trait Wire<'a>: Sized {
    fn serialize_into<W>(&self, writer: &mut W) -> io::Result<usize>
    where
        W: Write;

    fn serialize(&self) -> Vec<u8> {
        let mut data = Vec::new();
        self.serialize_into(&mut data)
            .expect("writing to a Vec never fails");
        data
    }

    fn deserialize<E>(input: &'a [u8]) -> nom::IResult<&'a [u8], Self, E>
    where
        E: NomError<'a>;
}

pub(crate) const SIGNATURE: &[u8; 8] = b"NTLMSSP\0";

/// The smallest valid fixed header; security-buffer offsets below this point
/// into the header itself and are rejected.
pub(crate) const MIN_HEADER_SIZE: usize = 32;

pub mod authenticate;
pub mod challenge;
pub mod flags;
pub mod negotiate;
pub mod target_info;

mod field;
mod utils;

pub(crate) use field::Field;
