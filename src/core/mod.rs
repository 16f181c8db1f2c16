pub mod bitstream;
pub mod crc;
pub mod error;
pub mod rice;
pub mod types;

pub use bitstream::{sign_extend, BitReader, BitWriter};
pub use crc::crc16;
pub use error::{AlcError, AlcResult};

pub use rice::{
    decode as rice_decode, encode as rice_encode, estimate_bits, estimate_rice_parameter,
    RiceState,
};

pub use types::*;
