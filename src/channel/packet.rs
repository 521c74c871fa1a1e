use std::{
    ffi::CString,
    io,
    mem::{self, MaybeUninit},
    os::fd::{AsRawFd, FromRawFd, OwnedFd},
    ptr,
};

use super::{check_written, Channel};
use crate::error::Error;
use crate::wol::{MagicFrame, ETHERTYPE_WOL};

const SIOCGIFINDEX: libc::c_ulong = 0x8933;

#[allow(non_camel_case_types)]
#[repr(C)]
union ifru {
    ifru_ifindex: libc::c_int,
    // the kernel's union is as large as a sockaddr plus padding
    _pad: [u8; 24],
}

#[allow(non_camel_case_types)]
#[repr(C)]
struct ifreq {
    ifr_name: [libc::c_char; libc::IFNAMSIZ],
    ifr_ifru: ifru,
}

/// An `AF_PACKET` socket bound to one interface and to the Wake-on-LAN ethertype.
pub struct PacketSocket {
    fd: OwnedFd,
}

impl PacketSocket {
    fn socket() -> io::Result<OwnedFd> {
        // Resources:
        // man 7 packet
        let fd = unsafe {
            libc::socket(
                libc::AF_PACKET,
                libc::SOCK_RAW | libc::SOCK_CLOEXEC,
                libc::c_int::from(ETHERTYPE_WOL.to_be()),
            )
        };
        if fd < 0 {
            return Err(io::Error::last_os_error());
        }
        // The descriptor is freshly created and owned by nobody else.
        Ok(unsafe { OwnedFd::from_raw_fd(fd) })
    }

    fn ifindex(fd: &OwnedFd, name: &CString) -> io::Result<libc::c_int> {
        let bytes = name.as_bytes_with_nul();
        if bytes.len() > libc::IFNAMSIZ {
            return Err(io::Error::from(io::ErrorKind::InvalidInput));
        }

        // ioctl(SIOCGIFINDEX) fills in the index field of the ifreq object
        // Resources:
        // man 7 netdevice
        unsafe {
            let mut ifr: ifreq = MaybeUninit::zeroed().assume_init();
            ptr::copy_nonoverlapping(
                name.as_ptr(),
                ifr.ifr_name.as_mut_ptr(),
                bytes.len(),
            );
            if libc::ioctl(fd.as_raw_fd(), SIOCGIFINDEX as _, &mut ifr) < 0 {
                return Err(io::Error::last_os_error());
            }
            Ok(ifr.ifr_ifru.ifru_ifindex)
        }
    }

    fn bind(fd: &OwnedFd, ifindex: libc::c_int) -> io::Result<()> {
        let mut ll: libc::sockaddr_ll = unsafe { MaybeUninit::zeroed().assume_init() };
        ll.sll_family = libc::AF_PACKET as libc::c_ushort;
        ll.sll_protocol = ETHERTYPE_WOL.to_be();
        ll.sll_ifindex = ifindex;

        let err = unsafe {
            libc::bind(
                fd.as_raw_fd(),
                &ll as *const libc::sockaddr_ll as *const libc::sockaddr,
                mem::size_of::<libc::sockaddr_ll>() as libc::socklen_t,
            )
        };
        if err < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }
}

impl Channel for PacketSocket {
    fn open(name: &str) -> Result<Self, Error> {
        let cname = CString::new(name)
            .map_err(|err| Error::open(name, io::Error::new(io::ErrorKind::InvalidInput, err)))?;

        let fd = Self::socket().map_err(|err| Error::open("socket", err))?;
        let ifindex = Self::ifindex(&fd, &cname).map_err(|err| Error::open("SIOCGIFINDEX", err))?;
        Self::bind(&fd, ifindex).map_err(|err| Error::open("bind", err))?;

        log::debug!("bound packet socket to {name} (index {ifindex})");
        Ok(PacketSocket { fd })
    }

    fn send(&mut self, frame: &MagicFrame) -> Result<(), Error> {
        let bytes = frame.as_bytes();
        let written = unsafe {
            libc::write(
                self.fd.as_raw_fd(),
                bytes.as_ptr() as *const libc::c_void,
                bytes.len(),
            )
        };
        let result = if written < 0 {
            Err(io::Error::last_os_error())
        } else {
            Ok(written as usize)
        };
        check_written(result, bytes.len())
    }
}
