use xtok::io::ByteSink;
use xtok::step::TokenSink;
use xtok::{EncodeError, Token};

const UNSIGNED: u8 = 0x00;
const SIGNED: u8   = 0x20;
const BYTES: u8    = 0x40;
const TEXT: u8     = 0x60;
const ARRAY: u8    = 0x80;
const MAP: u8      = 0xa0;

const FALSE: u8     = 0xf4;
const TRUE: u8      = 0xf5;
const NULL: u8      = 0xf6;
const FLOAT64: u8   = 0xfb;
const BREAK: u8     = 0xff;
const ARRAY_INDEF: u8 = 0x9f;
const MAP_INDEF: u8   = 0xbf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind { Map, Array }

struct Frame {
    kind: Kind,
    indefinite: bool,
}

/// Options controlling how [`Encoder`] writes its output.
#[derive(Debug, Clone, Default)]
pub struct EncodeOptions {
    /// Recursion guard: reject documents nested deeper than this many
    /// containers. `None` means unbounded.
    pub max_depth: Option<usize>,
}

/// Encodes a [`Token`] stream as CBOR bytes.
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

    fn write_header(&mut self, major: u8, n: u64) -> Result<(), EncodeError<S::Error>> {
        if n < 24 {
            self.sink.push(&[major | n as u8]).map_err(EncodeError::Write)
        } else if n <= u8::MAX as u64 {
            self.sink.push(&[major | 24, n as u8]).map_err(EncodeError::Write)
        } else if n <= u16::MAX as u64 {
            self.sink.push(&[major | 25]).map_err(EncodeError::Write)?;
            self.sink.push(&(n as u16).to_be_bytes()).map_err(EncodeError::Write)
        } else if n <= u32::MAX as u64 {
            self.sink.push(&[major | 26]).map_err(EncodeError::Write)?;
            self.sink.push(&(n as u32).to_be_bytes()).map_err(EncodeError::Write)
        } else {
            self.sink.push(&[major | 27]).map_err(EncodeError::Write)?;
            self.sink.push(&n.to_be_bytes()).map_err(EncodeError::Write)
        }
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
    fn check_depth(&self) -> Result<(), EncodeError<S::Error>> {
        if let Some(max) = self.options.max_depth {
            if self.stack.len() >= max {
                return Err(EncodeError::MalformedTokenStream("max_depth exceeded"))
            }
        }
        Ok(())
    }

    fn step_inner(&mut self, tok: &Token) -> Result<bool, EncodeError<S::Error>> {
        match tok {
            Token::MapClose | Token::ArrClose => {
                let frame = self.stack.pop()
                    .ok_or(EncodeError::MalformedTokenStream("close token without a matching open"))?;
                let closing_map = matches!(tok, Token::MapClose);
                if closing_map != matches!(frame.kind, Kind::Map) {
                    return Err(EncodeError::MalformedTokenStream("mismatched container close"))
                }
                if frame.indefinite {
                    self.sink.push(&[BREAK]).map_err(EncodeError::Write)?;
                }
            }
            Token::MapOpen(len) => {
                self.check_depth()?;
                match len.value() {
                    Some(n) => self.write_header(MAP, n)?,
                    None => self.sink.push(&[MAP_INDEF]).map_err(EncodeError::Write)?,
                }
                self.stack.push(Frame { kind: Kind::Map, indefinite: len.is_indefinite() });
            }
            Token::ArrOpen(len) => {
                self.check_depth()?;
                match len.value() {
                    Some(n) => self.write_header(ARRAY, n)?,
                    None => self.sink.push(&[ARRAY_INDEF]).map_err(EncodeError::Write)?,
                }
                self.stack.push(Frame { kind: Kind::Array, indefinite: len.is_indefinite() });
            }
            Token::Uint(n) => self.write_header(UNSIGNED, *n)?,
            Token::Int(n) => {
                if *n >= 0 {
                    self.write_header(UNSIGNED, *n as u64)?
                } else {
                    let arg = (-1i128 - *n as i128) as u64;
                    self.write_header(SIGNED, arg)?
                }
            }
            Token::Bytes(b) => {
                self.write_header(BYTES, b.len() as u64)?;
                self.sink.push(b).map_err(EncodeError::Write)?;
            }
            Token::String(s) => {
                self.write_header(TEXT, s.len() as u64)?;
                self.sink.push(s.as_bytes()).map_err(EncodeError::Write)?;
            }
            Token::Bool(b) => self.sink.push(&[if *b { TRUE } else { FALSE }]).map_err(EncodeError::Write)?,
            Token::Null => self.sink.push(&[NULL]).map_err(EncodeError::Write)?,
            Token::Float(f) => {
                self.sink.push(&[FLOAT64]).map_err(EncodeError::Write)?;
                self.sink.push(&f.to_bits().to_be_bytes()).map_err(EncodeError::Write)?;
            }
        }
        Ok(self.stack.is_empty())
    }
}
