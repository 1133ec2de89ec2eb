use quickcheck::quickcheck;
use xtok::step::{TokenSink, TokenSource};
use xtok::{Length, Token};
use xtok_json::{DecodeOptions, Decoder, EncodeOptions, Encoder};

fn encode_all(tokens: &[Token]) -> Vec<u8> {
    let mut buf = Vec::new();
    let mut enc = Encoder::new(&mut buf, EncodeOptions::default());
    for (i, tok) in tokens.iter().enumerate() {
        let done = enc.step(tok).unwrap();
        assert_eq!(done, i == tokens.len() - 1);
    }
    buf
}

fn decode_all(bytes: &[u8]) -> Vec<Token> {
    let mut dec = Decoder::new(bytes, DecodeOptions::default());
    let mut out = Vec::new();
    let mut tok = Token::Null;
    loop {
        let done = dec.step(&mut tok).unwrap();
        out.push(tok.clone());
        if done { break }
    }
    out
}

/// Builds a flat map document `{k0: v0, k1: v1, ...}` from arbitrary
/// (non-control) strings and small unsigned integers.
fn map_tokens(entries: &[(String, u64)]) -> Vec<Token> {
    let mut out = vec![Token::MapOpen(Length::definite(entries.len() as u64))];
    for (k, v) in entries {
        out.push(Token::String(k.clone()));
        out.push(Token::Uint(*v));
    }
    out.push(Token::MapClose);
    out
}

quickcheck! {
    fn decode_of_encode_is_identity_for_flat_maps(entries: Vec<(String, u64)>) -> bool {
        let entries: Vec<(String, u64)> = entries.into_iter()
            .map(|(k, v)| (k.chars().filter(|c| !c.is_control()).collect(), v % 1_000_000))
            .collect();
        let tokens = map_tokens(&entries);
        let bytes = encode_all(&tokens);
        decode_all(&bytes) == tokens
    }

    fn decode_of_encode_is_identity_for_strings(s: String) -> bool {
        let s: String = s.chars().filter(|c| !c.is_control()).collect();
        let tokens = vec![Token::String(s)];
        let bytes = encode_all(&tokens);
        decode_all(&bytes) == tokens
    }
}

#[test]
fn nested_array_round_trips_through_json_bytes() {
    let tokens = vec![
        Token::ArrOpen(Length::definite(2)),
        Token::Uint(1),
        Token::ArrOpen(Length::definite(1)),
        Token::String("nested".into()),
        Token::ArrClose,
        Token::ArrClose,
    ];
    let bytes = encode_all(&tokens);
    assert_eq!(bytes, br#"[1,["nested"]]"#);
    assert_eq!(decode_all(&bytes), tokens);
}

#[test]
fn pretty_printed_object_round_trips() {
    let tokens = vec![
        Token::MapOpen(Length::definite(1)),
        Token::String("a".into()),
        Token::Uint(1),
        Token::MapClose,
    ];
    let opts = EncodeOptions { indent: Some("  ".into()), ..EncodeOptions::default() };
    let mut buf = Vec::new();
    let mut enc = Encoder::new(&mut buf, opts);
    for t in &tokens {
        enc.step(t).unwrap();
    }
    assert_eq!(buf, b"{\n  \"a\": 1\n}");
    assert_eq!(decode_all(&buf), tokens);
}
