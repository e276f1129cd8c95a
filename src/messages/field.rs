use std::io::{self, Write};

use nom::error::context;
use nom::number::complete::{le_u16, le_u32};
use nom::sequence::tuple;

use crate::encoding::Encoding;

use super::{utils::{write_u16, write_u32}, NomError, Wire, MIN_HEADER_SIZE};

/// Security-buffer triple: length, allocated length and offset of a
/// variable-length field, counted from the start of the message.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Field {
    pub len: u16,
    pub max_len: u16,
    pub offset: u32,
}

impl<'a> Wire<'a> for Field {
    fn serialize_into<W>(&self, writer: &mut W) -> io::Result<usize>
    where
        W: Write,
    {
        let mut written = 0;
        written += write_u16(writer, self.len)?;
        written += write_u16(writer, self.max_len)?;
        written += write_u32(writer, self.offset)?;
        Ok(written)
    }

    fn deserialize<E>(input: &'a [u8]) -> nom::IResult<&'a [u8], Self, E>
    where
        E: NomError<'a>,
    {
        let (rest, (len, max_len, offset)) =
            context("Field", tuple((le_u16, le_u16, le_u32)))(input)?;
        Ok((
            rest,
            Self {
                len,
                max_len,
                offset,
            },
        ))
    }
}

impl Field {
    pub(crate) const fn zeroed() -> Self {
        Self {
            len: 0,
            max_len: 0,
            offset: 0,
        }
    }

    /// The field's byte range within `input`, validated against the message
    /// bounds: offsets inside the 32-byte minimum header or ranges past the
    /// end of the buffer are malformed.
    pub(crate) fn checked_slice<'a, E>(&self, input: &'a [u8]) -> Result<&'a [u8], nom::Err<E>>
    where
        E: NomError<'a>,
    {
        let start = self.offset as usize;
        let end = start + self.len as usize;
        if start < MIN_HEADER_SIZE || end > input.len() {
            return Err(nom::Err::Failure(E::add_context(
                input,
                "security buffer out of bounds",
                E::from_error_kind(input, nom::error::ErrorKind::Verify),
            )));
        }
        Ok(&input[start..end])
    }

    /// Decodes the string the field points at; an empty field is an empty
    /// string without any bounds check, as the original protocol expects.
    pub(crate) fn read_string<'a, E>(
        &self,
        input: &'a [u8],
        encoding: Encoding,
    ) -> Result<String, nom::Err<E>>
    where
        E: NomError<'a>,
    {
        if self.len == 0 {
            return Ok(String::new());
        }
        let data = self.checked_slice(input)?;
        encoding.decode(data).map_err(|_| {
            nom::Err::Failure(E::add_context(
                input,
                "undecodable string field",
                E::from_error_kind(input, nom::error::ErrorKind::Verify),
            ))
        })
    }

    /// Appends `bytes` to the data region and writes the matching triple,
    /// using the running cursor as offset even for empty fields.
    pub(crate) fn append<W>(bytes: &[u8], payload: &mut Vec<u8>, writer: &mut W) -> io::Result<usize>
    where
        W: Write,
    {
        let field = Self::push(bytes, payload)?;
        field.serialize_into(writer)
    }

    /// Like [`Field::append`] but an empty field keeps offset zero, the way
    /// the negotiate message encodes absent strings.
    pub(crate) fn append_optional<W>(
        bytes: &[u8],
        payload: &mut Vec<u8>,
        writer: &mut W,
    ) -> io::Result<usize>
    where
        W: Write,
    {
        let field = if bytes.is_empty() {
            Self::zeroed()
        } else {
            Self::push(bytes, payload)?
        };
        field.serialize_into(writer)
    }

    fn push(bytes: &[u8], payload: &mut Vec<u8>) -> io::Result<Self> {
        let offset: u32 = payload
            .len()
            .try_into()
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "message too large"))?;
        let len: u16 = bytes
            .len()
            .try_into()
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "field too large"))?;
        payload.extend_from_slice(bytes);
        Ok(Self {
            len,
            max_len: len,
            offset,
        })
    }
}
