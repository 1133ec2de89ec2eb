use xtok::step::{TokenSink, TokenSource};
use xtok::{DecodeError, Length, Token};
use xtok_cbor::{DecodeOptions, Decoder, EncodeOptions, Encoder};

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

#[test]
fn s2_two_entry_map_encodes_to_exact_bytes() {
    let tokens = vec![
        Token::MapOpen(Length::definite(2)),
        Token::String("key".into()),
        Token::String("value".into()),
        Token::String("k2".into()),
        Token::String("v2".into()),
        Token::MapClose,
    ];
    let bytes = encode_all(&tokens);
    let expect = hex::decode("a2636b65796576616c7565626b32627632").unwrap();
    assert_eq!(bytes, expect);
}

#[test]
fn s3_nested_indefinite_arrays_decode_to_matching_opens_and_closes() {
    let bytes = hex::decode("9f9f9fffffff").unwrap();
    let tokens = decode_all(&bytes);
    assert_eq!(tokens, vec![
        Token::ArrOpen(Length::INDEFINITE),
        Token::ArrOpen(Length::INDEFINITE),
        Token::ArrOpen(Length::INDEFINITE),
        Token::ArrClose,
        Token::ArrClose,
        Token::ArrClose,
    ]);
}

#[test]
fn s4_indefinite_text_string_concatenates_chunks_into_one_token() {
    let bytes = hex::decode("7f627661636c7565ff").unwrap();
    let tokens = decode_all(&bytes);
    assert_eq!(tokens, vec![Token::String("value".into())]);
}

#[test]
fn definite_container_round_trips_byte_exact() {
    let bytes = hex::decode("a2636b65796576616c7565626b32627632").unwrap();
    let tokens = decode_all(&bytes);
    let back = encode_all(&tokens);
    assert_eq!(back, bytes);
}

#[test]
fn integer_zero_always_decodes_unsigned() {
    let bytes = [0x00u8];
    assert_eq!(decode_all(&bytes), vec![Token::Uint(0)]);
}

#[test]
fn integer_one_decodes_unsigned() {
    let bytes = [0x01u8];
    assert_eq!(decode_all(&bytes), vec![Token::Uint(1)]);
}

#[test]
fn negative_one_decodes_signed() {
    let bytes = [0x20u8];
    assert_eq!(decode_all(&bytes), vec![Token::Int(-1)]);
}

#[test]
fn negative_one_hundred_decodes_signed() {
    // major 1, info 24 (1 extra byte): arg = 99, value = -1 - 99 = -100
    let bytes = [0x38u8, 0x63];
    assert_eq!(decode_all(&bytes), vec![Token::Int(-100)]);
}

#[test]
fn encoding_negative_values_uses_major_type_one() {
    let bytes = encode_all(&[Token::Int(-100)]);
    assert_eq!(bytes, [0x38, 0x63]);
}

#[test]
fn reserved_argument_value_is_rejected() {
    let bytes = [0x1cu8]; // major 0, info 28 (reserved)
    let mut dec = Decoder::new(&bytes[..], DecodeOptions::default());
    let mut tok = Token::Null;
    assert!(dec.step(&mut tok).is_err());
}

#[test]
fn truncated_input_reports_unexpected_eof() {
    let bytes = [0x19u8, 0x01]; // major 0, info 25 (2 more bytes expected, only 1 present)
    let mut dec = Decoder::new(&bytes[..], DecodeOptions::default());
    let mut tok = Token::Null;
    match dec.step(&mut tok) {
        Err(DecodeError::UnexpectedEof) => {}
        other => panic!("expected UnexpectedEof, got {:?}", other),
    }
}

#[test]
fn tags_are_forwarded_transparently() {
    // tag 0 (major 6, arg 0) wrapping the text string "value"
    let mut bytes = vec![0xc0u8];
    bytes.extend(encode_all(&[Token::String("value".into())]));
    assert_eq!(decode_all(&bytes), vec![Token::String("value".into())]);
}

#[test]
fn indefinite_map_round_trips_with_break_byte() {
    // {_ "a": 1 }
    let bytes = hex::decode("bf616101ff").unwrap();
    assert_eq!(decode_all(&bytes), vec![
        Token::MapOpen(Length::INDEFINITE),
        Token::String("a".into()),
        Token::Uint(1),
        Token::MapClose,
    ]);
}

#[test]
fn empty_indefinite_array_closes_immediately() {
    let bytes = [0x9fu8, 0xff];
    assert_eq!(decode_all(&bytes), vec![Token::ArrOpen(Length::INDEFINITE), Token::ArrClose]);
}

#[test]
fn array_of_one_element_round_trips() {
    let tokens = vec![Token::ArrOpen(Length::definite(1)), Token::Uint(7), Token::ArrClose];
    let bytes = encode_all(&tokens);
    assert_eq!(bytes, [0x81, 0x07]);
    assert_eq!(decode_all(&bytes), tokens);
}
