//! Art-Net ingest as the lighting node does it: ArtDmx for universe 0 only,
//! protocol version 14, everything else ignored.

use anyhow::Result;

use crate::universe::DmxUniverse;

pub const ARTNET_PORT: u16 = 6454;

const MAGIC: &[u8; 8] = b"Art-Net\0";
const PROTOCOL_VERSION: u16 = 14;
const OP_DMX: u16 = 0x5000;
const MIN_PACKET_LEN: usize = 13;
const DMX_HEADER_LEN: usize = 18;

/// A validated Art-Net packet
#[derive(Debug, PartialEq, Eq)]
pub enum Packet<'a> {
    Dmx { universe: u16, data: &'a [u8] },
    Other { opcode: u16 },
}

/// Validate header fields and borrow the DMX payload out of `buf`
pub fn parse(buf: &[u8]) -> Result<Packet<'_>> {
    // Shortest packet is ArtPoll
    if buf.len() < MIN_PACKET_LEN {
        anyhow::bail!("packet too short ({} bytes)", buf.len());
    }
    if &buf[..MAGIC.len()] != MAGIC {
        anyhow::bail!("incorrect magic value");
    }

    let opcode = u16::from_le_bytes([buf[8], buf[9]]);
    let version = u16::from_be_bytes([buf[10], buf[11]]);
    if version != PROTOCOL_VERSION {
        anyhow::bail!("protocol version is {}, not {}", version, PROTOCOL_VERSION);
    }

    if opcode != OP_DMX {
        return Ok(Packet::Other { opcode });
    }

    if buf.len() < DMX_HEADER_LEN {
        anyhow::bail!("ArtDmx header truncated ({} bytes)", buf.len());
    }
    let universe = 0x7fff & u16::from_le_bytes([buf[14], buf[15]]);
    let length = u16::from_be_bytes([buf[16], buf[17]]) as usize;
    if length != buf.len() - DMX_HEADER_LEN {
        anyhow::bail!(
            "content length {} does not match header length {}",
            buf.len() - DMX_HEADER_LEN,
            length
        );
    }

    Ok(Packet::Dmx {
        universe,
        data: &buf[DMX_HEADER_LEN..],
    })
}

/// Apply one datagram to `universe`. Returns the number of slots written.
pub fn handle_packet(buf: &[u8], universe: &mut DmxUniverse) -> Result<usize> {
    match parse(buf)? {
        Packet::Dmx { universe: 0, data } => Ok(universe.write_multiple(1, data)),
        Packet::Dmx { universe: other, .. } => {
            log::trace!("ignoring ArtDmx for universe {}", other);
            Ok(0)
        }
        Packet::Other { opcode } => {
            log::debug!("Unknown packet opcode {:04x}", opcode);
            Ok(0)
        }
    }
}

#[cfg(test)]
pub(crate) fn dmx_packet(universe: u16, data: &[u8]) -> Vec<u8> {
    let mut packet = MAGIC.to_vec();
    packet.extend_from_slice(&OP_DMX.to_le_bytes());
    packet.extend_from_slice(&PROTOCOL_VERSION.to_be_bytes());
    packet.push(0); // sequence
    packet.push(0); // physical
    packet.extend_from_slice(&universe.to_le_bytes());
    packet.extend_from_slice(&(data.len() as u16).to_be_bytes());
    packet.extend_from_slice(data);
    packet
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dmx() {
        let packet = dmx_packet(0, &[1, 2, 3]);
        assert_eq!(
            parse(&packet).unwrap(),
            Packet::Dmx {
                universe: 0,
                data: &[1, 2, 3]
            }
        );
    }

    #[test]
    fn test_rejects_short_and_bad_magic() {
        assert!(parse(b"Art-Net\0\x00\x50").is_err());

        let mut packet = dmx_packet(0, &[1]);
        packet[0] = b'a';
        assert!(parse(&packet).is_err());
    }

    #[test]
    fn test_rejects_wrong_version() {
        let mut packet = dmx_packet(0, &[1]);
        packet[11] = 13;
        assert!(parse(&packet).is_err());
    }

    #[test]
    fn test_rejects_length_mismatch() {
        let mut packet = dmx_packet(0, &[1, 2]);
        packet.push(3);
        assert!(parse(&packet).is_err());

        // 13 bytes passes the minimum but cannot hold an ArtDmx header
        let packet = dmx_packet(0, &[])[..13].to_vec();
        assert!(parse(&packet).is_err());
    }

    #[test]
    fn test_universe_high_bit_masked() {
        let packet = dmx_packet(0x8000, &[9]);
        assert!(matches!(parse(&packet).unwrap(), Packet::Dmx { universe: 0, .. }));
    }

    #[test]
    fn test_handle_writes_universe_zero_only() {
        let mut universe = DmxUniverse::new();
        assert_eq!(handle_packet(&dmx_packet(1, &[7, 7]), &mut universe).unwrap(), 0);
        assert_eq!(universe.get(1), Some(0));

        assert_eq!(handle_packet(&dmx_packet(0, &[7, 8]), &mut universe).unwrap(), 2);
        assert_eq!(universe.get(1), Some(7));
        assert_eq!(universe.get(2), Some(8));
    }

    #[test]
    fn test_unknown_opcode_is_ignored() {
        let mut packet = dmx_packet(0, &[]);
        packet[8] = 0x00;
        packet[9] = 0x20; // ArtPoll
        let mut universe = DmxUniverse::new();
        assert_eq!(handle_packet(&packet, &mut universe).unwrap(), 0);
        assert!(matches!(parse(&packet).unwrap(), Packet::Other { opcode: 0x2000 }));
    }
}
