//! A streaming JSON codec over the [`xtok`] token stream.
//!
//! ```
//! use xtok::Token;
//! use xtok_json::{Encoder, EncodeOptions};
//! use xtok::step::TokenSink;
//!
//! let mut buf = Vec::new();
//! let mut enc = Encoder::new(&mut buf, EncodeOptions::default());
//! assert!(enc.step(&Token::String("value".into())).unwrap());
//! assert_eq!(buf, b"\"value\"");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod encode;
mod decode;

pub use encode::{Encoder, EncodeOptions};
pub use decode::{Decoder, DecodeOptions};
