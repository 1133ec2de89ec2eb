use xtok::io::ByteSource;
use xtok::step::TokenSource;
use xtok::{DecodeError, Length, Token};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind { Map, Array }

#[derive(Debug, Clone, Copy)]
struct Frame {
    kind: Kind,
    first_entry: bool,
    /// Only meaningful for `Kind::Map`.
    awaiting_value: bool,
}

/// Options controlling how [`Decoder`] parses its input.
#[derive(Debug, Clone, Default)]
pub struct DecodeOptions {
    /// Recursion guard: reject documents nested deeper than this many
    /// containers. `None` means unbounded.
    pub max_depth: Option<usize>,
}

/// Decodes a byte stream of JSON into a [`Token`] stream.
///
/// `Step(&mut out) -> (done, err)`: pulls the next token from the input.
/// Container opens are always emitted with [`Length::INDEFINITE`] (JSON
/// carries no element count) and are always matched by an explicit close.
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

    fn peek_byte_opt(&mut self) -> Result<Option<u8>, DecodeError<S::Error>> {
        self.source.peek().map_err(DecodeError::Read)
    }

    fn peek_byte(&mut self) -> Result<u8, DecodeError<S::Error>> {
        self.peek_byte_opt()?.ok_or(DecodeError::UnexpectedEof)
    }

    fn pull_byte(&mut self) -> Result<u8, DecodeError<S::Error>> {
        let b = self.source.pull().map_err(DecodeError::Read)?.ok_or(DecodeError::UnexpectedEof)?;
        self.pos += 1;
        Ok(b)
    }

    fn expect_byte(&mut self, want: u8) -> Result<(), DecodeError<S::Error>> {
        let got = self.pull_byte()?;
        if got != want {
            return Err(self.malformed("unexpected character"))
        }
        Ok(())
    }

    fn skip_ws(&mut self) -> Result<(), DecodeError<S::Error>> {
        loop {
            match self.peek_byte_opt()? {
                Some(b' ') | Some(b'\t') | Some(b'\n') | Some(b'\r') => { self.pull_byte()?; }
                _ => return Ok(()),
            }
        }
    }

    fn check_depth(&self) -> Result<(), DecodeError<S::Error>> {
        if let Some(max) = self.options.max_depth {
            if self.stack.len() >= max {
                return Err(self.malformed("max_depth exceeded"))
            }
        }
        Ok(())
    }

    fn parse_value(&mut self) -> Result<Token, DecodeError<S::Error>> {
        self.skip_ws()?;
        match self.peek_byte()? {
            b'{' => {
                self.check_depth()?;
                self.pull_byte()?;
                self.stack.push(Frame { kind: Kind::Map, first_entry: true, awaiting_value: false });
                Ok(Token::MapOpen(Length::INDEFINITE))
            }
            b'[' => {
                self.check_depth()?;
                self.pull_byte()?;
                self.stack.push(Frame { kind: Kind::Array, first_entry: true, awaiting_value: false });
                Ok(Token::ArrOpen(Length::INDEFINITE))
            }
            b'"' => self.parse_json_string().map(Token::String),
            b't' => { self.expect_literal(b"true")?; Ok(Token::Bool(true)) }
            b'f' => { self.expect_literal(b"false")?; Ok(Token::Bool(false)) }
            b'n' => { self.expect_literal(b"null")?; Ok(Token::Null) }
            b'-' | b'0'..=b'9' => self.parse_number(),
            _ => Err(self.malformed("unexpected character, expected a JSON value")),
        }
    }

    fn expect_literal(&mut self, lit: &'static [u8]) -> Result<(), DecodeError<S::Error>> {
        for &want in lit {
            if self.pull_byte()? != want {
                return Err(self.malformed("invalid literal"))
            }
        }
        Ok(())
    }

    fn parse_hex4(&mut self) -> Result<u16, DecodeError<S::Error>> {
        let mut v: u16 = 0;
        for _ in 0..4 {
            let c = self.pull_byte()?;
            let digit = match c {
                b'0'..=b'9' => c - b'0',
                b'a'..=b'f' => c - b'a' + 10,
                b'A'..=b'F' => c - b'A' + 10,
                _ => return Err(self.malformed("invalid \\u escape")),
            };
            v = v * 16 + digit as u16;
        }
        Ok(v)
    }

    fn parse_json_string(&mut self) -> Result<String, DecodeError<S::Error>> {
        self.expect_byte(b'"')?;
        let mut out = String::new();
        let mut raw: Vec<u8> = Vec::new();
        loop {
            let b = self.pull_byte()?;
            match b {
                b'"' => {
                    self.flush_raw(&mut raw, &mut out)?;
                    return Ok(out)
                }
                b'\\' => {
                    self.flush_raw(&mut raw, &mut out)?;
                    let esc = self.pull_byte()?;
                    match esc {
                        b'"' => out.push('"'),
                        b'\\' => out.push('\\'),
                        b'/' => out.push('/'),
                        b'b' => out.push('\u{8}'),
                        b'f' => out.push('\u{c}'),
                        b'n' => out.push('\n'),
                        b'r' => out.push('\r'),
                        b't' => out.push('\t'),
                        b'u' => {
                            let hi = self.parse_hex4()?;
                            let cp = if (0xD800..=0xDBFF).contains(&hi) {
                                self.expect_byte(b'\\')?;
                                self.expect_byte(b'u')?;
                                let lo = self.parse_hex4()?;
                                if !(0xDC00..=0xDFFF).contains(&lo) {
                                    return Err(self.malformed("invalid surrogate pair"))
                                }
                                0x10000u32 + ((hi as u32 - 0xD800) << 10) + (lo as u32 - 0xDC00)
                            } else {
                                hi as u32
                            };
                            out.push(char::from_u32(cp).ok_or_else(|| self.malformed("invalid codepoint"))?);
                        }
                        _ => return Err(self.malformed("invalid escape sequence")),
                    }
                }
                _ => raw.push(b),
            }
        }
    }

    fn flush_raw(&self, raw: &mut Vec<u8>, out: &mut String) -> Result<(), DecodeError<S::Error>> {
        if raw.is_empty() {
            return Ok(())
        }
        let s = std::str::from_utf8(raw).map_err(|_| self.malformed("invalid utf-8 in string"))?;
        out.push_str(s);
        raw.clear();
        Ok(())
    }

    fn parse_number(&mut self) -> Result<Token, DecodeError<S::Error>> {
        let mut buf = String::new();
        let mut is_float = false;

        if self.peek_byte_opt()? == Some(b'-') {
            buf.push('-');
            self.pull_byte()?;
        }
        self.take_digits(&mut buf)?;
        if self.peek_byte_opt()? == Some(b'.') {
            is_float = true;
            buf.push('.');
            self.pull_byte()?;
            self.take_digits(&mut buf)?;
        }
        if matches!(self.peek_byte_opt()?, Some(b'e') | Some(b'E')) {
            is_float = true;
            buf.push('e');
            self.pull_byte()?;
            if matches!(self.peek_byte_opt()?, Some(b'+') | Some(b'-')) {
                buf.push(self.pull_byte()? as char);
            }
            self.take_digits(&mut buf)?;
        }

        if is_float {
            let f: f64 = buf.parse().map_err(|_| self.malformed("invalid number literal"))?;
            return Ok(Token::Float(f))
        }
        if buf.starts_with('-') {
            if let Ok(n) = buf.parse::<i64>() {
                return Ok(Token::Int(n))
            }
            let f: f64 = buf.parse().map_err(|_| self.malformed("invalid number literal"))?;
            return Ok(Token::Float(f))
        }
        if let Ok(n) = buf.parse::<u64>() {
            return Ok(Token::Uint(n))
        }
        let f: f64 = buf.parse().map_err(|_| self.malformed("invalid number literal"))?;
        Ok(Token::Float(f))
    }

    fn take_digits(&mut self, buf: &mut String) -> Result<(), DecodeError<S::Error>> {
        let mut any = false;
        loop {
            match self.peek_byte_opt()? {
                Some(c @ b'0'..=b'9') => { buf.push(c as char); self.pull_byte()?; any = true; }
                _ => break,
            }
        }
        if !any {
            return Err(self.malformed("expected a digit"))
        }
        Ok(())
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
        self.skip_ws()?;

        let Some(&top) = self.stack.last() else {
            let v = self.parse_value()?;
            let done = self.stack.is_empty();
            self.done = done;
            *out = v;
            return Ok(done)
        };

        match top.kind {
            Kind::Map if top.awaiting_value => {
                let parent = self.stack.len() - 1;
                let v = self.parse_value()?;
                self.stack[parent].awaiting_value = false;
                let done = self.stack.is_empty();
                self.done = done;
                *out = v;
                Ok(done)
            }
            Kind::Map => {
                if self.peek_byte()? == b'}' {
                    self.pull_byte()?;
                    self.stack.pop();
                    *out = Token::MapClose;
                    let done = self.stack.is_empty();
                    self.done = done;
                    return Ok(done)
                }
                if !top.first_entry {
                    self.expect_byte(b',')?;
                    self.skip_ws()?;
                }
                let key = self.parse_json_string()?;
                self.skip_ws()?;
                self.expect_byte(b':')?;
                let idx = self.stack.len() - 1;
                self.stack[idx].first_entry = false;
                self.stack[idx].awaiting_value = true;
                *out = Token::String(key);
                Ok(false)
            }
            Kind::Array => {
                if self.peek_byte()? == b']' {
                    self.pull_byte()?;
                    self.stack.pop();
                    *out = Token::ArrClose;
                    let done = self.stack.is_empty();
                    self.done = done;
                    return Ok(done)
                }
                if !top.first_entry {
                    self.expect_byte(b',')?;
                } else {
                    let idx = self.stack.len() - 1;
                    self.stack[idx].first_entry = false;
                }
                let v = self.parse_value()?;
                let done = self.stack.is_empty();
                self.done = done;
                *out = v;
                Ok(done)
            }
        }
    }
}
