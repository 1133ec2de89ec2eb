//! The pull-style `Step` contract.
//!
//! Every producer and consumer in this crate family — JSON/CBOR encoders and
//! decoders, the marshaller and unmarshaller — advances by a single `Step`
//! call that either produces or consumes exactly one [`crate::Token`] and
//! reports whether the document is complete. No component buffers a whole
//! document; callers drive the pipeline by calling `step` until `Ok(true)`
//! or an error.

use crate::Token;

/// Something that produces tokens one at a time: a decoder reading bytes, or
/// a marshaller walking a bound host value.
pub trait TokenSource {
    /// The error type returned on failure. Once returned, the same error
    /// must be returned by every subsequent call (errors are terminal).
    type Error;

    /// Produce the next token into `out`.
    ///
    /// Returns `Ok(true)` exactly when the outermost document value has
    /// been fully produced; `out` still holds the final token in that case.
    fn step(&mut self, out: &mut Token) -> Result<bool, Self::Error>;
}

/// Something that consumes tokens one at a time: an encoder writing bytes,
/// or an unmarshaller filling a bound slot.
pub trait TokenSink {
    /// The error type returned on failure. Once returned, the same error
    /// must be returned by every subsequent call (errors are terminal).
    type Error;

    /// Consume one token.
    ///
    /// Returns `Ok(true)` exactly when the outermost document value has
    /// been fully consumed.
    fn step(&mut self, tok: &Token) -> Result<bool, Self::Error>;
}
