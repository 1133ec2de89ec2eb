use core::fmt;

/// Errors raised while marshalling a host value into a token stream
/// (spec.md §7).
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum MarshalError {
    /// No atlas entry and no structural fallback exists for this type.
    UnmappedType(&'static str),
    /// Any other marshal-time failure (misuse of the `Step` contract, a
    /// transform closure's own error surfaced as a message, etc).
    Message(&'static str),
}

impl fmt::Display for MarshalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarshalError::UnmappedType(t) => write!(f, "no atlas entry for type `{t}`"),
            MarshalError::Message(m) => f.write_str(m),
        }
    }
}

impl std::error::Error for MarshalError {}

/// Errors raised while unmarshalling a token stream into a host slot
/// (spec.md §7).
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum UnmarshalError {
    /// The bind target is not a writable/addressable slot.
    InvalidTarget(&'static str),
    /// A token's shape cannot fit the bound target's expected kind.
    Incongruent { token_kind: &'static str, target: &'static str },
    /// Any other unmarshal-time failure.
    Message(&'static str),
}

impl UnmarshalError {
    /// Builds an [`UnmarshalError::Incongruent`].
    pub fn incongruent(token_kind: &'static str, target: &'static str) -> Self {
        UnmarshalError::Incongruent { token_kind, target }
    }

    /// Builds an [`UnmarshalError::InvalidTarget`].
    pub fn invalid_target(message: &'static str) -> Self {
        UnmarshalError::InvalidTarget(message)
    }
}

impl fmt::Display for UnmarshalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnmarshalError::InvalidTarget(m) => write!(f, "invalid unmarshal target: {m}"),
            UnmarshalError::Incongruent { token_kind, target } =>
                write!(f, "token of kind `{token_kind}` is incongruent with target `{target}`"),
            UnmarshalError::Message(m) => f.write_str(m),
        }
    }
}

impl std::error::Error for UnmarshalError {}
