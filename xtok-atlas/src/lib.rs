//! An atlas-driven object mapper: translates between host values and the
//! [`xtok`] token stream using user-supplied structural descriptors.
//!
//! ```
//! use std::sync::Arc;
//! use xtok::step::TokenSource;
//! use xtok::Token;
//! use xtok_atlas::{AtlasBuilder, Marshaler};
//!
//! let atlas = Arc::new(AtlasBuilder::new().build());
//! let mut m = Marshaler::new(atlas);
//! m.bind(&7u64).unwrap();
//! let mut tok = Token::Null;
//! assert!(m.step(&mut tok).unwrap());
//! assert_eq!(tok, Token::Uint(7));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod atlas;
mod convert;
mod error;
mod marshal;
mod unmarshal;
mod value;

pub use atlas::{Atlas, AtlasBuilder, FieldSpec, UnknownKeyPolicy};
pub use convert::{Bytes, FromValue, ToValue};
pub use error::{MarshalError, UnmarshalError};
pub use marshal::Marshaler;
pub use unmarshal::{UnmarshalTarget, Unmarshaler, ValueKind};
pub use value::Value;
