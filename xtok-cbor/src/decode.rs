use half::f16;
use xtok::io::ByteSource;
use xtok::step::TokenSource;
use xtok::{DecodeError, Length, Token};

const BREAK: u8 = 0xff;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind { Map, Array }

#[derive(Debug, Clone, Copy)]
struct Frame {
    kind: Kind,
    /// `None` for an indefinite-length container.
    remaining: Option<u64>,
    /// Only meaningful for `Kind::Map`.
    awaiting_value: bool,
}

/// The resolved argument of a CBOR header byte.
#[derive(Debug, Clone, Copy)]
enum Arg {
    Value(u64),
    /// The 5-bit info field was 31 (indefinite length, or the standalone
    /// `0xFF` break byte under major type 7).
    Indefinite,
}

/// Options controlling how [`Decoder`] parses its input.
#[derive(Debug, Clone, Default)]
pub struct DecodeOptions {
    /// Recursion guard: reject documents nested deeper than this many
    /// containers. `None` means unbounded.
    pub max_depth: Option<usize>,
}

/// Decodes a byte stream of CBOR into a [`Token`] stream.
///
/// `Step(&mut out) -> (done, err)`: pulls the next token from the input.
/// Indefinite-length byte/text strings are resolved into a single token
/// (chunks concatenated); indefinite-length maps/arrays are surfaced with
/// `Length::INDEFINITE` and an explicit matching close, same as definite
/// ones.
pub struct Decoder<S> {
    source: S,
    options: DecodeOptions,
    stack: Vec<Frame>,
    pos: u64,
    done: bool,
    poisoned: bool,
}

impl<S: ByteSource> Decoder<S> {
    /// Create a decoder reading from `source`.
    pub fn new(source: S, options: DecodeOptions) -> Self {
        Decoder { source, options, stack: Vec::new(), pos: 0, done: false, poisoned: false }
    }

    /// Consume the decoder, returning the underlying source.
    pub fn into_inner(self) -> S {
        self.source
    }

    fn malformed(&self, message: &'static str) -> DecodeError<S::Error> {
        DecodeError::MalformedSerial { offset: Some(self.pos), message }
    }

    fn peek_byte(&mut self) -> Result<u8, DecodeError<S::Error>> {
        self.source.peek().map_err(DecodeError::Read)?.ok_or(DecodeError::UnexpectedEof)
    }

    fn pull_byte(&mut self) -> Result<u8, DecodeError<S::Error>> {
        let b = self.source.pull().map_err(DecodeError::Read)?.ok_or(DecodeError::UnexpectedEof)?;
        self.pos += 1;
        Ok(b)
    }

    fn pull_exact(&mut self, n: usize) -> Result<Vec<u8>, DecodeError<S::Error>> {
        let bytes = self.source.pull_exact(n).map_err(DecodeError::Read)?.ok_or(DecodeError::UnexpectedEof)?;
        self.pos += n as u64;
        Ok(bytes)
    }

    /// Reads one header byte plus any following argument bytes. Returns the
    /// major type, the raw 5-bit info field (needed by major 7 to tell a
    /// direct simple value apart from a float width), and the resolved
    /// argument.
    fn read_header(&mut self) -> Result<(u8, u8, Arg), DecodeError<S::Error>> {
        let b = self.pull_byte()?;
        let major = b >> 5;
        let info = b & 0x1f;
        let arg = match info {
            0..=23 => Arg::Value(info as u64),
            24 => Arg::Value(self.pull_byte()? as u64),
            25 => { let b = self.pull_exact(2)?; Arg::Value(u16::from_be_bytes([b[0], b[1]]) as u64) }
            26 => { let b = self.pull_exact(4)?; Arg::Value(u32::from_be_bytes([b[0], b[1], b[2], b[3]]) as u64) }
            27 => {
                let b = self.pull_exact(8)?;
                let mut a = [0u8; 8];
                a.copy_from_slice(&b);
                Arg::Value(u64::from_be_bytes(a))
            }
            28 | 29 | 30 => return Err(self.malformed("reserved argument value")),
            31 => Arg::Indefinite,
            _ => unreachable!("5-bit info field"),
        };
        Ok((major, info, arg))
    }

    fn decode_string_or_bytes(&mut self, major: u8, arg: Arg) -> Result<Token, DecodeError<S::Error>> {
        match arg {
            Arg::Value(n) => {
                let bytes = self.pull_exact(n as usize)?;
                if major == 2 {
                    Ok(Token::Bytes(bytes))
                } else {
                    String::from_utf8(bytes).map(Token::String)
                        .map_err(|_| self.malformed("invalid utf-8 in text string"))
                }
            }
            Arg::Indefinite => {
                let mut acc = Vec::new();
                loop {
                    if self.peek_byte()? == BREAK {
                        self.pull_byte()?;
                        break
                    }
                    let (chunk_major, _, chunk_arg) = self.read_header()?;
                    if chunk_major != major {
                        return Err(self.malformed("chunk major type mismatch in indefinite string"))
                    }
                    match chunk_arg {
                        Arg::Value(n) => acc.extend(self.pull_exact(n as usize)?),
                        Arg::Indefinite => return Err(self.malformed("nested indefinite chunk is forbidden")),
                    }
                }
                if major == 2 {
                    Ok(Token::Bytes(acc))
                } else {
                    String::from_utf8(acc).map(Token::String)
                        .map_err(|_| self.malformed("invalid utf-8 in text string"))
                }
            }
        }
    }

    fn open_container(&mut self, kind: Kind, arg: Arg) -> Result<Token, DecodeError<S::Error>> {
        if let Some(max) = self.options.max_depth {
            if self.stack.len() >= max {
                return Err(self.malformed("max_depth exceeded"))
            }
        }
        match arg {
            Arg::Value(n) => {
                self.stack.push(Frame { kind, remaining: Some(n), awaiting_value: false });
                Ok(match kind {
                    Kind::Array => Token::ArrOpen(Length::definite(n)),
                    Kind::Map => Token::MapOpen(Length::definite(n)),
                })
            }
            Arg::Indefinite => {
                self.stack.push(Frame { kind, remaining: None, awaiting_value: false });
                Ok(match kind {
                    Kind::Array => Token::ArrOpen(Length::INDEFINITE),
                    Kind::Map => Token::MapOpen(Length::INDEFINITE),
                })
            }
        }
    }

    fn decode_simple_or_float(&mut self, info: u8, arg: Arg) -> Result<Token, DecodeError<S::Error>> {
        match (info, arg) {
            (20, _) => Ok(Token::Bool(false)),
            (21, _) => Ok(Token::Bool(true)),
            (22, _) => Ok(Token::Null),
            (23, _) => Ok(Token::Null), // undefined has no dedicated token; collapses to null
            (25, Arg::Value(bits)) => Ok(Token::Float(f16::from_bits(bits as u16).to_f64())),
            (26, Arg::Value(bits)) => Ok(Token::Float(f32::from_bits(bits as u32) as f64)),
            (27, Arg::Value(bits)) => Ok(Token::Float(f64::from_bits(bits))),
            (31, Arg::Indefinite) => Err(self.malformed("unexpected break outside an indefinite container")),
            _ => Err(self.malformed("unsupported simple value")),
        }
    }

    fn decode_item(&mut self) -> Result<Token, DecodeError<S::Error>> {
        let (major, info, arg) = self.read_header()?;
        match major {
            0 => match arg {
                Arg::Value(n) => Ok(Token::Uint(n)),
                Arg::Indefinite => Err(self.malformed("indefinite length invalid for an integer")),
            },
            1 => match arg {
                Arg::Value(n) => {
                    let v = -1i128 - n as i128;
                    if v < i64::MIN as i128 {
                        return Err(self.malformed("negative integer does not fit in i64"))
                    }
                    Ok(Token::Int(v as i64))
                }
                Arg::Indefinite => Err(self.malformed("indefinite length invalid for an integer")),
            },
            2 | 3 => self.decode_string_or_bytes(major, arg),
            4 => self.open_container(Kind::Array, arg),
            5 => self.open_container(Kind::Map, arg),
            6 => {
                match arg {
                    Arg::Value(_tag) => self.decode_item(), // tag-transparent passthrough
                    Arg::Indefinite => Err(self.malformed("indefinite length invalid for a tag")),
                }
            }
            7 => self.decode_simple_or_float(info, arg),
            _ => unreachable!("3-bit major type"),
        }
    }
}

impl<S: ByteSource> TokenSource for Decoder<S> {
    type Error = DecodeError<S::Error>;

    fn step(&mut self, out: &mut Token) -> Result<bool, Self::Error> {
        if self.poisoned {
            return Err(DecodeError::Message("decoder used after a previous error"))
        }
        let result = self.step_inner(out);
        if result.is_err() {
            self.poisoned = true;
        }
        result
    }
}

impl<S: ByteSource> Decoder<S> {
    fn step_inner(&mut self, out: &mut Token) -> Result<bool, DecodeError<S::Error>> {
        if self.done {
            return Err(DecodeError::Message("step called after document complete"))
        }

        let Some(idx) = self.stack.len().checked_sub(1) else {
            let v = self.decode_item()?;
            let done = self.stack.is_empty();
            self.done = done;
            *out = v;
            return Ok(done)
        };
        let top = self.stack[idx];

        if top.kind == Kind::Map && top.awaiting_value {
            let v = self.decode_item()?;
            self.stack[idx].awaiting_value = false;
            if let Some(r) = self.stack[idx].remaining {
                self.stack[idx].remaining = Some(r - 1);
            }
            *out = v;
            let done = self.stack.is_empty();
            self.done = done;
            return Ok(done)
        }

        let should_close = match top.remaining {
            Some(0) => true,
            Some(_) => false,
            None => self.peek_byte()? == BREAK,
        };
        if should_close {
            if top.remaining.is_none() {
                self.pull_byte()?;
            }
            self.stack.pop();
            *out = match top.kind { Kind::Map => Token::MapClose, Kind::Array => Token::ArrClose };
            let done = self.stack.is_empty();
            self.done = done;
            return Ok(done)
        }

        let v = self.decode_item()?;
        match top.kind {
            Kind::Map => self.stack[idx].awaiting_value = true,
            Kind::Array => if let Some(r) = self.stack[idx].remaining {
                self.stack[idx].remaining = Some(r - 1);
            }
        }
        *out = v;
        let done = self.stack.is_empty();
        self.done = done;
        Ok(done)
    }
}
