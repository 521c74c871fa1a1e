//! Constructs WakeOnLAN frames (so called "Magic Packet Technology") and hands them to a raw
//! link-layer channel, one per destination.
use crate::channel::Channel;
use crate::error::Error;
use crate::mac::{MacAddr, MAC_LEN};

/// EtherType reserved for Wake-on-LAN.
pub const ETHERTYPE_WOL: u16 = 0x0842;

const SYNC_LEN: usize = MAC_LEN;
const TARGET_REPEAT: usize = 16;
const ETHER_HEADER_LEN: usize = 2 * MAC_LEN + 2;

pub const MAGIC_PACKET_LEN: usize = SYNC_LEN + TARGET_REPEAT * MAC_LEN;
pub const MAGIC_FRAME_LEN: usize = ETHER_HEADER_LEN + MAGIC_PACKET_LEN;

/// Password-less magic packet payload.
pub struct MagicPacket([u8; MAGIC_PACKET_LEN]);

/// Ethernet header immediately followed by a magic packet, exactly as written to the wire.
pub struct MagicFrame([u8; MAGIC_FRAME_LEN]);

impl MagicPacket {
    pub fn new(target: MacAddr) -> Self {
        let mut packet = [0xFFu8; MAGIC_PACKET_LEN];

        // fill the packet with 16 occurrences of the MAC
        // starting at the 7th byte so that the first 6
        // bytes stay as 0xFF
        for chunk in packet[SYNC_LEN..].chunks_exact_mut(MAC_LEN) {
            chunk.copy_from_slice(target.as_bytes());
        }

        MagicPacket(packet)
    }

    pub fn as_bytes(&self) -> &[u8; MAGIC_PACKET_LEN] {
        &self.0
    }
}

impl MagicFrame {
    pub fn new(destination: MacAddr, source: MacAddr, packet: &MagicPacket) -> Self {
        let mut frame = [0u8; MAGIC_FRAME_LEN];
        frame[..MAC_LEN].copy_from_slice(destination.as_bytes());
        frame[MAC_LEN..2 * MAC_LEN].copy_from_slice(source.as_bytes());
        frame[2 * MAC_LEN..ETHER_HEADER_LEN].copy_from_slice(&ETHERTYPE_WOL.to_be_bytes());
        frame[ETHER_HEADER_LEN..].copy_from_slice(packet.as_bytes());
        MagicFrame(frame)
    }

    pub fn as_bytes(&self) -> &[u8; MAGIC_FRAME_LEN] {
        &self.0
    }

    pub fn destination(&self) -> MacAddr {
        MacAddr::new(octets(&self.0[..MAC_LEN]))
    }

    pub fn source(&self) -> MacAddr {
        MacAddr::new(octets(&self.0[MAC_LEN..2 * MAC_LEN]))
    }

    pub fn ethertype(&self) -> u16 {
        u16::from_be_bytes([self.0[2 * MAC_LEN], self.0[2 * MAC_LEN + 1]])
    }
}

fn octets(bytes: &[u8]) -> [u8; MAC_LEN] {
    let mut out = [0u8; MAC_LEN];
    out.copy_from_slice(bytes);
    out
}

/// Builds the frame that wakes `target`. In broadcast mode the Ethernet destination stays
/// all-ones while the payload still names `target`.
pub fn build_frame(source: MacAddr, target: MacAddr, broadcast: bool) -> MagicFrame {
    let destination = if broadcast { MacAddr::BROADCAST } else { target };
    MagicFrame::new(destination, source, &MagicPacket::new(target))
}

/// Outcome of one pass over the destinations.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Summary {
    pub sent: usize,
    /// Destinations that did not parse, in argument order.
    pub skipped: Vec<String>,
}

/// Sends one magic frame per destination, in order. Destinations that do not parse are
/// reported and skipped; any channel error ends the loop.
pub fn wake<C, S>(
    channel: &mut C,
    source: MacAddr,
    destinations: &[S],
    broadcast: bool,
) -> Result<Summary, Error>
where
    C: Channel,
    S: AsRef<str>,
{
    let mut summary = Summary::default();
    for destination in destinations {
        let destination = destination.as_ref();
        let target = match destination.parse::<MacAddr>() {
            Ok(target) => target,
            Err(err) => {
                log::warn!("{destination}: invalid MAC address ({err}), skipping");
                summary.skipped.push(destination.to_owned());
                continue;
            }
        };

        let frame = build_frame(source, target, broadcast);
        channel.send(&frame)?;
        log::info!(
            "sent magic packet for {target} ({} -> {}, ethertype {:#06x})",
            frame.source(),
            frame.destination(),
            frame.ethertype()
        );
        summary.sent += 1;
    }
    Ok(summary)
}
