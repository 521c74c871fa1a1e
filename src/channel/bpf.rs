use std::{
    fs::{File, OpenOptions},
    io::{self, Write},
    mem::MaybeUninit,
    os::fd::AsRawFd,
    ptr,
};

use super::{check_written, Channel};
use crate::error::Error;
use crate::wol::MagicFrame;

const BPF_CLONE: &str = "/dev/bpf";
const BPF_UNITS: u32 = 256;

// _IOW('B', 108, struct ifreq)
const BIOCSETIF: libc::c_ulong = 0x8020_426c;

#[allow(non_camel_case_types)]
#[repr(C)]
struct ifreq {
    ifr_name: [libc::c_char; libc::IFNAMSIZ],
    _ifr_ifru: [u8; 16],
}

/// A write-only bpf device attached to one interface. Frames written to it go out unmodified.
pub struct BpfDevice {
    file: File,
    path: String,
}

impl BpfDevice {
    /// Opens the cloning device, or the first free numbered unit where there is none.
    fn open_device() -> Result<(File, String), Error> {
        let mut options = OpenOptions::new();
        options.write(true);
        first_free_unit(|path| options.open(path))
    }

    fn set_interface(file: &File, name: &str) -> io::Result<()> {
        let bytes = name.as_bytes();
        if bytes.len() >= libc::IFNAMSIZ || bytes.contains(&0) {
            return Err(io::Error::from(io::ErrorKind::InvalidInput));
        }

        // Resources:
        // man 4 bpf
        unsafe {
            let mut ifr: ifreq = MaybeUninit::zeroed().assume_init();
            ptr::copy_nonoverlapping(
                bytes.as_ptr() as *const libc::c_char,
                ifr.ifr_name.as_mut_ptr(),
                bytes.len(),
            );
            if libc::ioctl(file.as_raw_fd(), BIOCSETIF, &mut ifr) < 0 {
                return Err(io::Error::last_os_error());
            }
        }
        Ok(())
    }
}

/// Walks `/dev/bpf`, then `/dev/bpf0` onwards while units are busy.
fn first_free_unit<T>(mut open: impl FnMut(&str) -> io::Result<T>) -> Result<(T, String), Error> {
    match open(BPF_CLONE) {
        Ok(device) => return Ok((device, BPF_CLONE.to_owned())),
        Err(err) if err.kind() != io::ErrorKind::NotFound => return Err(Error::open(BPF_CLONE, err)),
        Err(_) => {}
    }

    let mut last = None;
    for unit in 0..BPF_UNITS {
        let path = format!("{BPF_CLONE}{unit}");
        match open(&path) {
            Ok(device) => return Ok((device, path)),
            Err(err) if err.raw_os_error() == Some(libc::EBUSY) => last = Some((path, err)),
            // past the last unit; a busy unit seen before explains the failure better
            Err(err) if err.kind() == io::ErrorKind::NotFound && last.is_some() => break,
            Err(err) => return Err(Error::open(path, err)),
        }
    }

    let (path, err) =
        last.unwrap_or_else(|| (BPF_CLONE.to_owned(), io::Error::from(io::ErrorKind::NotFound)));
    Err(Error::open(path, err))
}

impl Channel for BpfDevice {
    fn open(name: &str) -> Result<Self, Error> {
        let (file, path) = Self::open_device()?;
        Self::set_interface(&file, name).map_err(|err| Error::open("BIOCSETIF", err))?;

        log::debug!("attached {path} to {name}");
        Ok(BpfDevice { file, path })
    }

    fn send(&mut self, frame: &MagicFrame) -> Result<(), Error> {
        let bytes = frame.as_bytes();
        check_written(self.file.write(bytes), bytes.len()).map_err(|err| {
            log::debug!("write to {} failed", self.path);
            err
        })
    }
}
