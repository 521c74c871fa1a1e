//! Picks the interface to send from and reads its hardware address.
use std::{ffi::CStr, fmt, io, ops::Deref, ptr};

use crate::error::Error;
use crate::mac::{MacAddr, MAC_LEN};

/// An interface name short enough to fit the kernel's `IFNAMSIZ` buffer, terminator included.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InterfaceName(String);

impl InterfaceName {
    pub fn new(name: &str) -> Result<Self, Error> {
        if name.len() >= libc::IFNAMSIZ {
            return Err(Error::InterfaceNameTooLong(name.to_owned()));
        }
        Ok(InterfaceName(name.to_owned()))
    }
}

impl Deref for InterfaceName {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InterfaceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The interface frames are sent from, and the address they are sent as.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InterfaceSelection {
    pub name: InterfaceName,
    pub address: MacAddr,
}

/// An Ethernet-like interface seen during enumeration.
#[derive(Clone, Debug)]
struct Candidate {
    name: String,
    address: MacAddr,
}

/// Returns the first candidate named `requested`. Without a request, or with an empty one, the
/// first candidate whose name fits `IFNAMSIZ` becomes the target.
fn select<I>(candidates: I, requested: Option<&InterfaceName>) -> Result<InterfaceSelection, Error>
where
    I: IntoIterator<Item = Candidate>,
{
    let mut target = requested.filter(|name| !name.is_empty()).cloned();

    for candidate in candidates {
        if target.is_none() {
            target = InterfaceName::new(&candidate.name).ok();
        }
        if let Some(name) = target.as_ref().filter(|name| name.0 == candidate.name) {
            return Ok(InterfaceSelection {
                name: name.clone(),
                address: candidate.address,
            });
        }
    }

    Err(Error::InterfaceNotFound(
        target.map(|name| name.0).unwrap_or_default(),
    ))
}

/// Enumerates the host's interfaces and selects the sending one. With no `requested` name the
/// first Ethernet-like interface is used.
pub fn resolve(requested: Option<&InterfaceName>) -> Result<InterfaceSelection, Error> {
    let addrs = IfAddrs::new().map_err(Error::Enumerate)?;

    let candidates = addrs.iter().filter_map(|ifa| {
        let address = link_address(ifa)?;
        if ifa.ifa_name.is_null() {
            return None;
        }
        let name = unsafe { CStr::from_ptr(ifa.ifa_name) }.to_str().ok()?;
        Some(Candidate {
            name: name.to_owned(),
            address,
        })
    });

    let selection = select(candidates, requested)?;
    log::debug!("using {} ({})", selection.name, selection.address);
    Ok(selection)
}

/// Owns the list returned by `getifaddrs` and frees it on drop.
struct IfAddrs {
    head: *mut libc::ifaddrs,
}

impl IfAddrs {
    fn new() -> io::Result<Self> {
        let mut head = ptr::null_mut();
        if unsafe { libc::getifaddrs(&mut head) } < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(IfAddrs { head })
    }

    fn iter(&self) -> impl Iterator<Item = &libc::ifaddrs> + '_ {
        // Every node stays valid until `freeifaddrs` runs in `drop`.
        let mut next = self.head as *const libc::ifaddrs;
        std::iter::from_fn(move || {
            let ifa = unsafe { next.as_ref()? };
            next = ifa.ifa_next;
            Some(ifa)
        })
    }
}

impl Drop for IfAddrs {
    fn drop(&mut self) {
        if !self.head.is_null() {
            unsafe { libc::freeifaddrs(self.head) };
        }
    }
}

/// Reads a 6-byte hardware address from an Ethernet-like link-layer entry.
#[cfg(any(target_os = "linux", target_os = "android"))]
fn link_address(ifa: &libc::ifaddrs) -> Option<MacAddr> {
    // SAFETY: ifa_addr is null or points at a sockaddr whose family tells its real type.
    let sa = unsafe { ifa.ifa_addr.as_ref()? };
    if libc::c_int::from(sa.sa_family) != libc::AF_PACKET {
        return None;
    }
    let ll = unsafe { &*(ifa.ifa_addr as *const libc::sockaddr_ll) };

    // physical, VLAN and bridge devices all report ARPHRD_ETHER
    if ll.sll_hatype != libc::ARPHRD_ETHER || usize::from(ll.sll_halen) != MAC_LEN {
        return None;
    }

    let mut octets = [0u8; MAC_LEN];
    octets.copy_from_slice(&ll.sll_addr[..MAC_LEN]);
    Some(MacAddr::new(octets))
}

#[cfg(not(any(target_os = "linux", target_os = "android")))]
const IFT_ETHER: u8 = 0x06;
#[cfg(not(any(target_os = "linux", target_os = "android")))]
const IFT_L2VLAN: u8 = 0x87;
#[cfg(not(any(target_os = "linux", target_os = "android")))]
const IFT_BRIDGE: u8 = 0xd1;

#[cfg(not(any(target_os = "linux", target_os = "android")))]
fn link_address(ifa: &libc::ifaddrs) -> Option<MacAddr> {
    // SAFETY: ifa_addr is null or points at a sockaddr whose family tells its real type.
    let sa = unsafe { ifa.ifa_addr.as_ref()? };
    if libc::c_int::from(sa.sa_family) != libc::AF_LINK {
        return None;
    }
    let sdl = unsafe { &*(ifa.ifa_addr as *const libc::sockaddr_dl) };

    if sdl.sdl_len == 0
        || !matches!(sdl.sdl_type, IFT_ETHER | IFT_L2VLAN | IFT_BRIDGE)
        || usize::from(sdl.sdl_alen) != MAC_LEN
    {
        return None;
    }

    // the address follows the name inside sdl_data and may run past the declared array
    let mut octets = [0u8; MAC_LEN];
    unsafe {
        let lladdr = (sdl.sdl_data.as_ptr() as *const u8).add(usize::from(sdl.sdl_nlen));
        ptr::copy_nonoverlapping(lladdr, octets.as_mut_ptr(), MAC_LEN);
    }
    Some(MacAddr::new(octets))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(name: &str, last: u8) -> Candidate {
        Candidate {
            name: name.to_owned(),
            address: MacAddr::new([0x02, 0, 0, 0, 0, last]),
        }
    }

    #[test]
    fn test_name_length_is_bounded() {
        assert!(InterfaceName::new("eth0").is_ok());
        let long = "x".repeat(libc::IFNAMSIZ);
        assert!(matches!(
            InterfaceName::new(&long),
            Err(Error::InterfaceNameTooLong(name)) if name == long
        ));
        let longest = "x".repeat(libc::IFNAMSIZ - 1);
        assert!(InterfaceName::new(&longest).is_ok());
    }

    #[test]
    fn test_picks_first_candidate_without_request() {
        let found = select(vec![candidate("eth0", 1), candidate("eth1", 2)], None).unwrap();
        assert_eq!(&*found.name, "eth0");
        assert_eq!(found.address, MacAddr::new([0x02, 0, 0, 0, 0, 1]));
    }

    #[test]
    fn test_empty_request_picks_first_candidate() {
        let empty = InterfaceName::new("").unwrap();
        let found = select(vec![candidate("eth0", 1), candidate("eth1", 2)], Some(&empty)).unwrap();
        assert_eq!(&*found.name, "eth0");
        assert_eq!(found.address, MacAddr::new([0x02, 0, 0, 0, 0, 1]));
    }

    #[test]
    fn test_empty_request_without_candidates() {
        let empty = InterfaceName::new("").unwrap();
        let err = select(Vec::new(), Some(&empty)).unwrap_err();
        assert!(matches!(err, Error::InterfaceNotFound(name) if name.is_empty()));
    }

    #[test]
    fn test_picks_requested_candidate() {
        let wanted = InterfaceName::new("br0").unwrap();
        let found = select(
            vec![candidate("eth0", 1), candidate("br0", 2), candidate("br0", 3)],
            Some(&wanted),
        )
        .unwrap();
        assert_eq!(&*found.name, "br0");
        assert_eq!(found.address, MacAddr::new([0x02, 0, 0, 0, 0, 2]));
    }

    #[test]
    fn test_skips_names_that_do_not_fit() {
        let long = "x".repeat(libc::IFNAMSIZ + 4);
        let found = select(vec![candidate(&long, 1), candidate("eth0", 2)], None).unwrap();
        assert_eq!(&*found.name, "eth0");
    }

    #[test]
    fn test_missing_requested_interface() {
        let wanted = InterfaceName::new("wlan9").unwrap();
        let err = select(vec![candidate("eth0", 1)], Some(&wanted)).unwrap_err();
        assert!(matches!(err, Error::InterfaceNotFound(name) if name == "wlan9"));
    }

    #[test]
    fn test_no_candidates_at_all() {
        let err = select(Vec::new(), None).unwrap_err();
        assert!(matches!(err, Error::InterfaceNotFound(ref name) if name.is_empty()));
        assert_eq!(
            err.to_string(),
            ": interface does not exist or invalid interface"
        );
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_resolve_unknown_interface() {
        let wanted = InterfaceName::new("l2wol-none0").unwrap();
        let err = resolve(Some(&wanted)).unwrap_err();
        assert!(matches!(err, Error::InterfaceNotFound(name) if name == "l2wol-none0"));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_resolve_rejects_loopback() {
        // lo has a link-layer address but it is not Ethernet-like
        let wanted = InterfaceName::new("lo").unwrap();
        let err = resolve(Some(&wanted)).unwrap_err();
        assert!(matches!(err, Error::InterfaceNotFound(name) if name == "lo"));
    }
}
