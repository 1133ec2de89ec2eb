//! A streaming CBOR (RFC 8949) codec over the [`xtok`] token stream,
//! including indefinite-length containers and strings.
//!
//! ```
//! use xtok::Token;
//! use xtok::step::TokenSink;
//! use xtok_cbor::{Encoder, EncodeOptions};
//!
//! let mut buf = Vec::new();
//! let mut enc = Encoder::new(&mut buf, EncodeOptions::default());
//! assert!(enc.step(&Token::Uint(0)).unwrap());
//! assert_eq!(buf, [0x00]);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod encode;
mod decode;

pub use encode::{Encoder, EncodeOptions};
pub use decode::{Decoder, DecodeOptions};
