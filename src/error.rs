use std::io;

use thiserror::Error;

/// Errors that end the run.
#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}: interface name too long")]
    InterfaceNameTooLong(String),

    /// No Ethernet-like interface matched. Empty when auto-selection found nothing.
    #[error("{0}: interface does not exist or invalid interface")]
    InterfaceNotFound(String),

    #[error("getifaddrs: {0}")]
    Enumerate(#[source] io::Error),

    /// Creating, opening or binding the raw channel failed.
    #[error("{op}: {source}")]
    ChannelOpen {
        op: String,
        #[source]
        source: io::Error,
    },

    /// A frame could not be written in full.
    #[error("write: {source}")]
    Write {
        #[source]
        source: io::Error,
    },
}

impl Error {
    pub(crate) fn open(op: impl Into<String>, source: io::Error) -> Self {
        Error::ChannelOpen {
            op: op.into(),
            source,
        }
    }
}
