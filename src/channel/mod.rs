//! Raw link-layer send paths. Exactly one backend is compiled in, picked by target OS.
use std::io;

use crate::error::Error;
use crate::wol::MagicFrame;

#[cfg(any(target_os = "linux", target_os = "android"))]
mod packet;
#[cfg(any(target_os = "linux", target_os = "android"))]
pub use packet::PacketSocket as Platform;

#[cfg(any(
    target_os = "macos",
    target_os = "freebsd",
    target_os = "openbsd",
    target_os = "dragonfly"
))]
mod bpf;
#[cfg(any(
    target_os = "macos",
    target_os = "freebsd",
    target_os = "openbsd",
    target_os = "dragonfly"
))]
pub use bpf::BpfDevice as Platform;

#[cfg(not(any(
    target_os = "linux",
    target_os = "android",
    target_os = "macos",
    target_os = "freebsd",
    target_os = "openbsd",
    target_os = "dragonfly"
)))]
compile_error!("no raw link-layer channel is available for this target");

/// A channel that puts complete Ethernet frames on the wire of one interface.
pub trait Channel: Sized {
    /// Opens the channel and binds it to the interface called `name`.
    fn open(name: &str) -> Result<Self, Error>;

    /// Writes one frame with a single write call.
    fn send(&mut self, frame: &MagicFrame) -> Result<(), Error>;

    /// Releases the underlying handle.
    fn close(self) {}
}

/// Maps the outcome of a single write to the frame-level result. Anything short of the full
/// frame is a failure.
pub(crate) fn check_written(result: io::Result<usize>, expected: usize) -> Result<(), Error> {
    match result {
        Ok(written) if written == expected => Ok(()),
        Ok(written) => Err(Error::Write {
            source: io::Error::new(
                io::ErrorKind::WriteZero,
                format!("short write ({written} of {expected} bytes)"),
            ),
        }),
        Err(source) => Err(Error::Write { source }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_write_is_ok() {
        assert!(check_written(Ok(116), 116).is_ok());
    }

    #[test]
    fn test_short_write_is_an_error() {
        let err = check_written(Ok(60), 116).unwrap_err();
        assert_eq!(
            err.to_string(),
            "write: short write (60 of 116 bytes)"
        );
    }

    #[test]
    fn test_failed_write_keeps_os_error() {
        let err = check_written(Err(io::Error::from_raw_os_error(libc::ENETDOWN)), 116)
            .unwrap_err();
        match err {
            Error::Write { source } => assert_eq!(source.raw_os_error(), Some(libc::ENETDOWN)),
            other => panic!("unexpected error: {other}"),
        }
    }
}
