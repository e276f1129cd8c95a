use std::io::{self, Write};

use crate::encoding::Encoding;

use super::{flags::Flags, utils::write_u32, Field, Wire, SIGNATURE};

const MESSAGE_TYPE: u32 = 0x0000_0003;
const V1_HEADER_SIZE: usize = 52;
const V2_HEADER_SIZE: usize = 64;

/// Type 3 message closing the handshake.
///
/// The v2 layout grows the header by an always-zero session-key security
/// buffer and an echo of the challenge flags; `flags` being set is what
/// selects it. Only serialization is provided, the client never reads
/// this message back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authenticate {
    pub lm_response: Vec<u8>,
    pub nt_response: Vec<u8>,
    pub target: String,
    pub username: String,
    pub workstation: String,
    pub encoding: Encoding,
    /// Challenge flags to echo back; `Some` switches to the v2 layout.
    pub flags: Option<Flags>,
}

impl Authenticate {
    pub fn serialize_into<W>(&self, writer: &mut W) -> io::Result<usize>
    where
        W: Write,
    {
        let header_size = if self.flags.is_some() {
            V2_HEADER_SIZE
        } else {
            V1_HEADER_SIZE
        };
        let mut payload = vec![0u8; header_size];

        let mut written = 0;
        writer.write_all(&SIGNATURE[..])?;
        written += SIGNATURE.len();
        written += write_u32(writer, MESSAGE_TYPE)?;
        // Data region order is fixed; offsets are running-cursor values even
        // for empty strings.
        written += Field::append(&self.lm_response, &mut payload, writer)?;
        written += Field::append(&self.nt_response, &mut payload, writer)?;
        written += Field::append(&self.encoding.encode(&self.target), &mut payload, writer)?;
        written += Field::append(&self.encoding.encode(&self.username), &mut payload, writer)?;
        written += Field::append(
            &self.encoding.encode(&self.workstation),
            &mut payload,
            writer,
        )?;
        if let Some(challenge_flags) = self.flags {
            // Session key is never negotiated here, the buffer stays empty.
            written += Field::zeroed().serialize_into(writer)?;
            written += challenge_flags.serialize_into(writer)?;
        }
        debug_assert_eq!(written, header_size);

        writer.write_all(&payload[header_size..])?;
        written += payload.len() - header_size;

        Ok(written)
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut data = Vec::new();
        self.serialize_into(&mut data)
            .expect("writing to a Vec never fails");
        data
    }
}
