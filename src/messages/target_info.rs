use std::io::{self, Write};

use nom::error::context;
use nom::multi::length_data;
use nom::number::complete::le_u16;
use nom::sequence::tuple;

use crate::encoding::utf16le_string;

use super::{utils::write_u16, NomError, Wire};

/// Attribute tags the challenge's target-info block is known to carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetInfoKind {
    Server,
    Domain,
    Fqdn,
    Dns,
    ParentDns,
}

impl TargetInfoKind {
    fn from_tag(tag: u16) -> Option<Self> {
        match tag {
            1 => Some(Self::Server),
            2 => Some(Self::Domain),
            3 => Some(Self::Fqdn),
            4 => Some(Self::Dns),
            5 => Some(Self::ParentDns),
            _ => None,
        }
    }

    fn tag(self) -> u16 {
        match self {
            Self::Server => 1,
            Self::Domain => 2,
            Self::Fqdn => 3,
            Self::Dns => 4,
            Self::ParentDns => 5,
        }
    }
}

/// The challenge's target-information block: (tag, UTF-16LE value) entries
/// terminated by a zero tag.
///
/// Both views are kept: the parsed entries for lookups, and the raw bytes
/// because the NTLMv2 blob must embed them verbatim — servers may send
/// attributes we skip, and re-encoding the parsed entries would break the
/// response HMAC.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TargetInfo {
    entries: Vec<(TargetInfoKind, String)>,
    raw: Vec<u8>,
}

impl TargetInfo {
    /// Builds a block from scratch; entry order is preserved and the
    /// terminator appended. Mostly useful for synthesizing challenges.
    pub fn from_entries(entries: &[(TargetInfoKind, &str)]) -> Self {
        let mut raw = Vec::new();
        let mut parsed = Vec::with_capacity(entries.len());
        for &(kind, value) in entries {
            let data = crate::encoding::utf16le_bytes(value);
            write_u16(&mut raw, kind.tag()).expect("writing to a Vec never fails");
            write_u16(&mut raw, data.len() as u16).expect("writing to a Vec never fails");
            raw.extend_from_slice(&data);
            parsed.push((kind, value.to_owned()));
        }
        write_u16(&mut raw, 0).expect("writing to a Vec never fails");
        write_u16(&mut raw, 0).expect("writing to a Vec never fails");
        Self {
            entries: parsed,
            raw,
        }
    }

    /// The block exactly as it appeared in the challenge message.
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    pub fn entries(&self) -> &[(TargetInfoKind, String)] {
        &self.entries
    }

    pub fn get(&self, kind: TargetInfoKind) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, v)| v.as_str())
    }
}

impl<'a> Wire<'a> for TargetInfo {
    fn serialize_into<W>(&self, writer: &mut W) -> io::Result<usize>
    where
        W: Write,
    {
        writer.write_all(&self.raw)?;
        Ok(self.raw.len())
    }

    fn deserialize<E>(input: &'a [u8]) -> nom::IResult<&'a [u8], Self, E>
    where
        E: NomError<'a>,
    {
        let mut entries = Vec::new();
        let mut rest = input;
        while !rest.is_empty() {
            let (r, (tag, data)) =
                context("TargetInfo/entry", tuple((le_u16, length_data(le_u16))))(rest)?;
            rest = r;
            if tag == 0 {
                break;
            }
            match TargetInfoKind::from_tag(tag) {
                Some(kind) => {
                    let value = utf16le_string(data).map_err(|_| {
                        nom::Err::Failure(E::add_context(
                            input,
                            "TargetInfo/value",
                            E::from_error_kind(input, nom::error::ErrorKind::Verify),
                        ))
                    })?;
                    entries.push((kind, value));
                }
                // Unknown tags still consume their declared length.
                None => log::debug!("skipping unknown target info tag {tag}"),
            }
        }
        Ok((
            &b""[..],
            Self {
                entries,
                raw: input.to_vec(),
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nom::error::VerboseError;

    #[test]
    fn build_and_parse() {
        let info = TargetInfo::from_entries(&[
            (TargetInfoKind::Domain, "CISCOLAB"),
            (TargetInfoKind::Server, "POSEIDON"),
            (TargetInfoKind::Dns, "ciscolab.com"),
        ]);
        let (_, parsed) = TargetInfo::deserialize::<VerboseError<_>>(info.raw()).unwrap();
        pretty_assertions::assert_eq!(parsed, info);
        assert_eq!(parsed.get(TargetInfoKind::Server), Some("POSEIDON"));
        assert_eq!(parsed.get(TargetInfoKind::Fqdn), None);
    }

    #[test]
    fn unknown_tags_are_skipped_but_consumed() {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut raw = Vec::new();
        // Tag 7 (timestamp) is not parsed but its 8 bytes must be walked over.
        raw.extend_from_slice(&[0x07, 0x00, 0x08, 0x00]);
        raw.extend_from_slice(&[0u8; 8]);
        raw.extend_from_slice(&[0x02, 0x00, 0x04, 0x00, b'A', 0, b'B', 0]);
        raw.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]);

        let (_, parsed) = TargetInfo::deserialize::<VerboseError<_>>(&raw).unwrap();
        assert_eq!(parsed.entries().len(), 1);
        assert_eq!(parsed.get(TargetInfoKind::Domain), Some("AB"));
        assert_eq!(parsed.raw(), &raw[..]);
    }

    #[test]
    fn terminator_stops_the_walk() {
        let mut raw = Vec::new();
        raw.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]);
        // Garbage after the terminator stays untouched but is kept raw.
        raw.extend_from_slice(&[0xff, 0xff]);

        let (_, parsed) = TargetInfo::deserialize::<VerboseError<_>>(&raw).unwrap();
        assert!(parsed.entries().is_empty());
        assert_eq!(parsed.raw(), &raw[..]);
    }
}
