use std::sync::Arc;

use xtok::step::TokenSink;
use xtok::{Length, Token};
use xtok_atlas::{Atlas, AtlasBuilder, Unmarshaler, Value};

fn empty_atlas() -> Arc<Atlas> {
    Arc::new(AtlasBuilder::new().build())
}

#[test]
fn s6_wildcard_slot_materializes_a_map() {
    let atlas = empty_atlas();
    let mut u = Unmarshaler::new(atlas);
    let mut slot = Value::Null;
    u.bind(&mut slot).unwrap();

    let tokens = vec![
        Token::MapOpen(Length::definite(1)),
        Token::String("key".into()),
        Token::String("value".into()),
        Token::MapClose,
    ];
    for (i, tok) in tokens.iter().enumerate() {
        let done = u.step(tok).unwrap();
        assert_eq!(done, i == tokens.len() - 1);
    }

    assert_eq!(slot, Value::Map(vec![("key".to_string(), Value::String("value".into()))]));
}

#[test]
fn wildcard_slot_materializes_nested_arrays_and_maps() {
    let atlas = empty_atlas();
    let mut u = Unmarshaler::new(atlas);
    let mut slot = Value::Null;
    u.bind(&mut slot).unwrap();

    let tokens = vec![
        Token::MapOpen(Length::definite(1)),
        Token::String("items".into()),
        Token::ArrOpen(Length::definite(2)),
        Token::Uint(1),
        Token::Uint(2),
        Token::ArrClose,
        Token::MapClose,
    ];
    for tok in &tokens {
        u.step(tok).unwrap();
    }

    assert_eq!(slot, Value::Map(vec![(
        "items".to_string(),
        Value::Array(vec![Value::Uint(1), Value::Uint(2)]),
    )]));
}

#[test]
fn wildcard_slot_accepts_a_bare_scalar() {
    let atlas = empty_atlas();
    let mut u = Unmarshaler::new(atlas);
    let mut slot = Value::Null;
    u.bind(&mut slot).unwrap();
    assert!(u.step(&Token::Uint(7)).unwrap());
    assert_eq!(slot, Value::Uint(7));
}
