use std::sync::Arc;

use xtok::step::{TokenSink, TokenSource};
use xtok::{Length, Token};
use xtok_atlas::{Atlas, AtlasBuilder, Marshaler, UnmarshalError, Unmarshaler, Value};

fn empty_atlas() -> Arc<Atlas> {
    Arc::new(AtlasBuilder::new().build())
}

#[test]
fn s7_binding_a_by_value_handle_is_rejected() {
    let atlas = empty_atlas();
    let mut u: Unmarshaler = Unmarshaler::new(atlas);
    let err = u.bind_value("value".to_string()).unwrap_err();
    assert!(matches!(err, UnmarshalError::InvalidTarget(_)));
}

#[test]
fn s8_map_open_into_a_string_slot_is_incongruent() {
    let atlas = empty_atlas();
    let mut u = Unmarshaler::new(atlas);
    let mut slot = String::new();
    u.bind(&mut slot).unwrap();
    let err = u.step(&Token::MapOpen(Length::definite(1))).unwrap_err();
    assert!(matches!(err, UnmarshalError::Incongruent { .. }));
}

#[test]
fn string_slot_accepts_a_matching_scalar() {
    let atlas = empty_atlas();
    let mut u = Unmarshaler::new(atlas);
    let mut slot = String::new();
    u.bind(&mut slot).unwrap();
    assert!(u.step(&Token::String("value".into())).unwrap());
    assert_eq!(slot, "value");
}

#[test]
fn array_slot_rejects_a_scalar_token() {
    let atlas = empty_atlas();
    let mut u: Unmarshaler = Unmarshaler::new(atlas);
    let mut slot: Vec<u64> = Vec::new();
    u.bind(&mut slot).unwrap();
    let err = u.step(&Token::Uint(1)).unwrap_err();
    assert!(matches!(err, UnmarshalError::Incongruent { .. }));
}

#[test]
fn step_after_document_complete_is_an_error() {
    let atlas = empty_atlas();
    let mut u = Unmarshaler::new(atlas);
    let mut slot = 0u64;
    u.bind(&mut slot).unwrap();
    assert!(u.step(&Token::Uint(5)).unwrap());
    assert!(u.step(&Token::Uint(6)).is_err());
}

#[test]
fn step_after_an_error_stays_terminal() {
    let atlas = empty_atlas();
    let mut u = Unmarshaler::new(atlas);
    let mut slot = String::new();
    u.bind(&mut slot).unwrap();
    assert!(u.step(&Token::MapOpen(Length::definite(0))).is_err());
    assert!(u.step(&Token::String("value".into())).is_err());
}

#[test]
fn marshal_a_flat_map_from_a_btreemap() {
    use std::collections::BTreeMap;

    let atlas = empty_atlas();
    let mut map = BTreeMap::new();
    map.insert("key".to_string(), 1u64);
    map.insert("k2".to_string(), 2u64);

    let mut m = Marshaler::new(atlas);
    m.bind(&map).unwrap();
    let mut tokens = Vec::new();
    let mut tok = Token::Null;
    loop {
        let done = m.step(&mut tok).unwrap();
        tokens.push(tok.clone());
        if done { break }
    }
    assert_eq!(tokens, vec![
        Token::MapOpen(Length::definite(2)),
        Token::String("k2".into()),
        Token::Uint(2),
        Token::String("key".into()),
        Token::Uint(1),
        Token::MapClose,
    ]);
}

#[test]
fn marshal_step_before_bind_is_an_error() {
    let atlas = empty_atlas();
    let mut m = Marshaler::new(atlas);
    let mut tok = Token::Null;
    assert!(m.step(&mut tok).is_err());
}

#[test]
fn wildcard_value_round_trips_through_marshal_and_unmarshal() {
    let atlas = empty_atlas();
    let original = Value::Map(vec![("key".to_string(), Value::String("value".into()))]);

    let mut m = Marshaler::new(atlas.clone());
    m.bind(&original).unwrap();
    let mut tokens = Vec::new();
    let mut tok = Token::Null;
    loop {
        let done = m.step(&mut tok).unwrap();
        tokens.push(tok.clone());
        if done { break }
    }

    let mut u = Unmarshaler::new(atlas);
    let mut slot = Value::Null;
    u.bind(&mut slot).unwrap();
    for t in &tokens {
        u.step(t).unwrap();
    }
    assert_eq!(slot, original);
}
