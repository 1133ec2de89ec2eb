use base64::Engine;
use xtok::io::ByteSink;
use xtok::step::TokenSink;
use xtok::{EncodeError, Token};

/// Options controlling how [`Encoder`] formats its output.
#[derive(Debug, Clone)]
pub struct EncodeOptions {
    /// Per-level indent string. `None` (the default) produces compact
    /// output with no insignificant whitespace.
    pub indent: Option<String>,
    /// Line ending used between pretty-printed entries. Ignored when
    /// `indent` is `None`.
    pub line_ending: String,
    /// Recursion guard: reject documents nested deeper than this many
    /// containers. `None` means unbounded.
    pub max_depth: Option<usize>,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        EncodeOptions { indent: None, line_ending: "\n".to_string(), max_depth: None }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind { Map, Array }

#[derive(Debug, Clone)]
struct Frame {
    kind: Kind,
    first_entry: bool,
    /// Only meaningful for `Kind::Map`: true when the next token expected
    /// in this frame is a key, false when it is the value for the key just
    /// written.
    next_is_key: bool,
}

/// Encodes a [`Token`] stream as JSON bytes.
///
/// `Step(tok) -> (done, err)`: returns `done = true` exactly when the
/// outermost document value has been fully written.
pub struct Encoder<S> {
    sink: S,
    options: EncodeOptions,
    stack: Vec<Frame>,
    poisoned: bool,
}

impl<S: ByteSink> Encoder<S> {
    /// Create an encoder writing to `sink`.
    pub fn new(sink: S, options: EncodeOptions) -> Self {
        Encoder { sink, options, stack: Vec::new(), poisoned: false }
    }

    /// Consume the encoder, returning the underlying sink.
    pub fn into_inner(self) -> S {
        self.sink
    }

    fn write_indent(&mut self, depth: usize) -> Result<(), EncodeError<S::Error>> {
        if let Some(unit) = &self.options.indent {
            self.sink.push(self.options.line_ending.as_bytes()).map_err(EncodeError::Write)?;
            for _ in 0..depth {
                self.sink.push(unit.as_bytes()).map_err(EncodeError::Write)?;
            }
        }
        Ok(())
    }

    fn write_json_string(&mut self, s: &str) -> Result<(), EncodeError<S::Error>> {
        self.sink.push(b"\"").map_err(EncodeError::Write)?;
        for c in s.chars() {
            match c {
                '"' => self.sink.push(b"\\\"").map_err(EncodeError::Write)?,
                '\\' => self.sink.push(b"\\\\").map_err(EncodeError::Write)?,
                '\n' => self.sink.push(b"\\n").map_err(EncodeError::Write)?,
                '\t' => self.sink.push(b"\\t").map_err(EncodeError::Write)?,
                '\r' => self.sink.push(b"\\r").map_err(EncodeError::Write)?,
                '\u{8}' => self.sink.push(b"\\b").map_err(EncodeError::Write)?,
                '\u{c}' => self.sink.push(b"\\f").map_err(EncodeError::Write)?,
                c if (c as u32) < 0x20 => {
                    let esc = format!("\\u{:04x}", c as u32);
                    self.sink.push(esc.as_bytes()).map_err(EncodeError::Write)?
                }
                c => {
                    let mut buf = [0u8; 4];
                    self.sink.push(c.encode_utf8(&mut buf).as_bytes()).map_err(EncodeError::Write)?
                }
            }
        }
        self.sink.push(b"\"").map_err(EncodeError::Write)
    }

    fn write_scalar(&mut self, tok: &Token) -> Result<(), EncodeError<S::Error>> {
        match tok {
            Token::String(s) => self.write_json_string(s)?,
            Token::Bytes(b) => {
                let encoded = base64::engine::general_purpose::STANDARD.encode(b);
                self.write_json_string(&encoded)?
            }
            Token::Bool(b) => self.sink.push(if *b { b"true" } else { b"false" }).map_err(EncodeError::Write)?,
            Token::Int(n) => self.sink.push(n.to_string().as_bytes()).map_err(EncodeError::Write)?,
            Token::Uint(n) => self.sink.push(n.to_string().as_bytes()).map_err(EncodeError::Write)?,
            Token::Float(n) => {
                if n.is_nan() || n.is_infinite() {
                    return Err(EncodeError::Unserializable("NaN and Infinity have no JSON representation"))
                }
                self.sink.push(n.to_string().as_bytes()).map_err(EncodeError::Write)?
            }
            Token::Null => self.sink.push(b"null").map_err(EncodeError::Write)?,
            Token::MapOpen(_) | Token::ArrOpen(_) | Token::MapClose | Token::ArrClose =>
                unreachable!("write_scalar called with a container mark"),
        }
        Ok(())
    }

    /// Write the separator (comma, plus indent) preceding a new entry in
    /// the current top frame, and mark the frame as no longer empty.
    fn separate_entry(&mut self) -> Result<(), EncodeError<S::Error>> {
        let depth = self.stack.len();
        let idx = depth - 1;
        if self.stack[idx].first_entry {
            self.stack[idx].first_entry = false;
        } else {
            self.sink.push(b",").map_err(EncodeError::Write)?;
        }
        self.write_indent(depth)
    }

    fn close_container(&mut self, tok: &Token) -> Result<bool, EncodeError<S::Error>> {
        let frame = self.stack.pop()
            .ok_or(EncodeError::MalformedTokenStream("close token without a matching open"))?;
        let closing_map = matches!(tok, Token::MapClose);
        let opened_map = matches!(frame.kind, Kind::Map);
        if closing_map != opened_map {
            return Err(EncodeError::MalformedTokenStream("mismatched container close"))
        }
        if !frame.first_entry {
            self.write_indent(self.stack.len())?;
        }
        match frame.kind {
            Kind::Map => self.sink.push(b"}").map_err(EncodeError::Write)?,
            Kind::Array => self.sink.push(b"]").map_err(EncodeError::Write)?,
        }
        if let Some(parent) = self.stack.last_mut() {
            if parent.kind == Kind::Map {
                parent.next_is_key = true;
            }
        }
        Ok(self.stack.is_empty())
    }
}

impl<S: ByteSink> TokenSink for Encoder<S> {
    type Error = EncodeError<S::Error>;

    fn step(&mut self, tok: &Token) -> Result<bool, Self::Error> {
        if self.poisoned {
            return Err(EncodeError::Message("encoder used after a previous error"))
        }
        let result = self.step_inner(tok);
        if result.is_err() {
            self.poisoned = true;
        }
        result
    }
}

impl<S: ByteSink> Encoder<S> {
    fn step_inner(&mut self, tok: &Token) -> Result<bool, EncodeError<S::Error>> {
        if matches!(tok, Token::MapClose | Token::ArrClose) {
            return self.close_container(tok)
        }

        let in_key_position = matches!(
            self.stack.last(),
            Some(f) if f.kind == Kind::Map && f.next_is_key
        );

        if in_key_position {
            let key = match tok {
                Token::String(s) => s,
                _ => return Err(EncodeError::MalformedTokenStream("map key slot requires a string token")),
            };
            self.separate_entry()?;
            self.write_json_string(key)?;
            self.sink.push(b":").map_err(EncodeError::Write)?;
            if self.options.indent.is_some() {
                self.sink.push(b" ").map_err(EncodeError::Write)?;
            }
            self.stack.last_mut().unwrap().next_is_key = false;
            return Ok(false)
        }

        if let Some(top) = self.stack.last() {
            if top.kind == Kind::Array {
                self.separate_entry()?;
            }
        }

        match tok {
            Token::MapOpen(_) => {
                if let Some(max) = self.options.max_depth {
                    if self.stack.len() >= max {
                        return Err(EncodeError::MalformedTokenStream("max_depth exceeded"))
                    }
                }
                self.sink.push(b"{").map_err(EncodeError::Write)?;
                self.stack.push(Frame { kind: Kind::Map, first_entry: true, next_is_key: true });
            }
            Token::ArrOpen(_) => {
                if let Some(max) = self.options.max_depth {
                    if self.stack.len() >= max {
                        return Err(EncodeError::MalformedTokenStream("max_depth exceeded"))
                    }
                }
                self.sink.push(b"[").map_err(EncodeError::Write)?;
                self.stack.push(Frame { kind: Kind::Array, first_entry: true, next_is_key: false });
            }
            scalar => {
                self.write_scalar(scalar)?;
                if let Some(top) = self.stack.last_mut() {
                    if top.kind == Kind::Map {
                        top.next_is_key = true;
                    }
                }
            }
        }

        Ok(self.stack.is_empty())
    }
}
