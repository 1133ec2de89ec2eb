use core::fmt;

/// Errors raised by a codec decoder, or by an unmarshaller's use of one.
///
/// Generic over `R`, the inner byte-source error type, the same way the
/// encode side is generic over its sink's error type.
#[derive(Debug)]
#[non_exhaustive]
pub enum DecodeError<R> {
    /// The underlying byte source returned an error.
    Read(R),
    /// The byte stream ended in the middle of an item.
    UnexpectedEof,
    /// A syntactic violation of the wire format: an invalid header, a
    /// reserved argument value, invalid UTF-8 in a string, and so on.
    MalformedSerial {
        /// Byte offset at which the violation was detected, when the
        /// underlying source can report one.
        offset: Option<u64>,
        /// Human-readable description.
        message: &'static str,
    },
    /// Generic error message, for conditions not covered above.
    Message(&'static str),
}

impl<R: fmt::Display> fmt::Display for DecodeError<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::Read(e) => write!(f, "read error: {}", e),
            DecodeError::UnexpectedEof => f.write_str("unexpected end of input"),
            DecodeError::MalformedSerial { offset: Some(o), message } =>
                write!(f, "malformed input at byte {}: {}", o, message),
            DecodeError::MalformedSerial { offset: None, message } =>
                write!(f, "malformed input: {}", message),
            DecodeError::Message(m) => write!(f, "{}", m),
        }
    }
}

impl<R: std::error::Error + 'static> std::error::Error for DecodeError<R> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DecodeError::Read(e) => Some(e),
            _ => None,
        }
    }
}

/// Errors raised by a codec encoder, or by a marshaller's use of one.
#[derive(Debug)]
#[non_exhaustive]
pub enum EncodeError<W> {
    /// The underlying byte sink returned an error.
    Write(W),
    /// The value has no byte representation in this wire format (e.g. NaN
    /// or infinity in JSON).
    Unserializable(&'static str),
    /// The token grammar was violated, e.g. a close without a matching
    /// open, or a non-string token in a map's key slot.
    MalformedTokenStream(&'static str),
    /// Generic error message.
    Message(&'static str),
}

impl<W: fmt::Display> fmt::Display for EncodeError<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodeError::Write(e) => write!(f, "write error: {}", e),
            EncodeError::Unserializable(m) => write!(f, "unserializable value: {}", m),
            EncodeError::MalformedTokenStream(m) => write!(f, "malformed token stream: {}", m),
            EncodeError::Message(m) => write!(f, "{}", m),
        }
    }
}

impl<W: std::error::Error + 'static> std::error::Error for EncodeError<W> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EncodeError::Write(e) => Some(e),
            _ => None,
        }
    }
}
