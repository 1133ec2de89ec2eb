//! `xtok` defines the token stream shared by every wire codec and by the
//! atlas-driven object mapper: a small tagged union (see [`Token`]) plus the
//! pull-style `Step` contract (see [`step`]) that producers and consumers of
//! that stream implement.
//!
//! This crate has no opinion about any particular wire format or host
//! language mapping; `xtok-json`, `xtok-cbor` and `xtok-atlas` build on top
//! of it.
//!
//! ```
//! use xtok::{Token, Length};
//!
//! let tokens = vec![
//!     Token::ArrOpen(Length::definite(1)),
//!     Token::String("value".into()),
//!     Token::ArrClose,
//! ];
//! assert_eq!(tokens.len(), 3);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod token;
mod error;

pub mod io;
pub mod step;

pub use token::{Token, Length};
pub use error::{DecodeError, EncodeError};
