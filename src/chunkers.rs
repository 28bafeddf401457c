use std::io;

pub use fbc::{FbcChunker, FrequencyTable};
pub use tttd::TttdChunker;

mod fbc;
mod tttd;

pub(crate) fn config_error(message: &'static str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, message)
}
