use std::any::TypeId;
use std::sync::Arc;

use xtok::step::{TokenSink, TokenSource};
use xtok::Token;
use xtok_atlas::{
    Atlas, AtlasBuilder, FieldSpec, FromValue, Marshaler, ToValue, UnknownKeyPolicy, UnmarshalError,
    UnmarshalTarget, Unmarshaler, Value, ValueKind,
};

/// A struct fixture mirroring spec.md's scenario S5/S6 literal example:
/// fields `x`/`y` renamed to wire keys `"key"`/`"k2"`.
#[derive(Debug, Clone, PartialEq, Default)]
struct Pair {
    x: String,
    y: String,
}

fn pair_atlas() -> Arc<Atlas> {
    Arc::new(
        AtlasBuilder::new()
            .struct_map::<Pair>(vec![FieldSpec::new("x", "key"), FieldSpec::new("y", "k2")])
            .build(),
    )
}

impl ToValue for Pair {
    fn to_value(&self, atlas: &Atlas) -> Value {
        let fields = atlas.struct_fields(TypeId::of::<Self>()).expect("Pair registered in atlas");
        let mut out = Vec::with_capacity(fields.len());
        for f in fields {
            let v = match f.field_name {
                "x" => self.x.to_value(atlas),
                "y" => self.y.to_value(atlas),
                other => unreachable!("unknown field `{other}` in Pair atlas entry"),
            };
            out.push((f.serial_name.to_string(), v));
        }
        Value::Map(out)
    }
}

impl FromValue for Pair {
    fn from_value(value: Value, atlas: &Atlas) -> Result<Self, UnmarshalError> {
        let fields = atlas.struct_fields(TypeId::of::<Self>())
            .ok_or(UnmarshalError::Message("Pair not registered in atlas"))?;
        let Value::Map(entries) = value else {
            return Err(UnmarshalError::incongruent("non-map", "Pair"))
        };

        let mut x = None;
        let mut y = None;
        for (serial, v) in entries {
            match fields.iter().find(|f| f.serial_name == serial) {
                Some(f) if f.field_name == "x" => x = Some(String::from_value(v, atlas)?),
                Some(f) if f.field_name == "y" => y = Some(String::from_value(v, atlas)?),
                Some(_) => {} // a declared field this fixture doesn't assign; ignore
                None => {
                    if atlas.unknown_key_policy(TypeId::of::<Self>()) == UnknownKeyPolicy::Reject {
                        return Err(UnmarshalError::Message("unknown key rejected by atlas policy"))
                    }
                }
            }
        }

        Ok(Pair { x: x.unwrap_or_default(), y: y.unwrap_or_default() })
    }
}

impl UnmarshalTarget for Pair {
    fn expected_kind(&self) -> Option<ValueKind> {
        Some(ValueKind::Map)
    }

    fn assign(&mut self, value: Value, atlas: &Atlas) -> Result<(), UnmarshalError> {
        *self = Pair::from_value(value, atlas)?;
        Ok(())
    }
}

fn marshal_all(atlas: Arc<Atlas>, value: &Pair) -> Vec<Token> {
    let mut m = Marshaler::new(atlas);
    m.bind(value).unwrap();
    let mut out = Vec::new();
    let mut tok = Token::Null;
    loop {
        let done = m.step(&mut tok).unwrap();
        out.push(tok.clone());
        if done { break }
    }
    out
}

fn unmarshal_into(atlas: Arc<Atlas>, tokens: &[Token], target: &mut Pair) {
    let mut u = Unmarshaler::new(atlas);
    u.bind(target).unwrap();
    for (i, tok) in tokens.iter().enumerate() {
        let done = u.step(tok).unwrap();
        assert_eq!(done, i == tokens.len() - 1);
    }
}

#[test]
fn s5_marshal_struct_produces_renamed_map_tokens() {
    let atlas = pair_atlas();
    let pair = Pair { x: "value".into(), y: "v2".into() };
    let tokens = marshal_all(atlas, &pair);
    assert_eq!(tokens, vec![
        Token::MapOpen(xtok::Length::definite(2)),
        Token::String("key".into()),
        Token::String("value".into()),
        Token::String("k2".into()),
        Token::String("v2".into()),
        Token::MapClose,
    ]);
}

#[test]
fn marshal_then_unmarshal_recovers_the_original_struct() {
    let atlas = pair_atlas();
    let pair = Pair { x: "value".into(), y: "v2".into() };
    let tokens = marshal_all(atlas.clone(), &pair);

    let mut back = Pair::default();
    unmarshal_into(atlas, &tokens, &mut back);
    assert_eq!(back, pair);
}

#[test]
fn unmarshal_ignores_unknown_wire_keys() {
    let atlas = pair_atlas();
    let tokens = vec![
        Token::MapOpen(xtok::Length::definite(3)),
        Token::String("key".into()),
        Token::String("value".into()),
        Token::String("extra".into()),
        Token::Uint(42),
        Token::String("k2".into()),
        Token::String("v2".into()),
        Token::MapClose,
    ];
    let mut back = Pair::default();
    unmarshal_into(atlas, &tokens, &mut back);
    assert_eq!(back, Pair { x: "value".into(), y: "v2".into() });
}

#[test]
fn unmarshal_rejects_unknown_wire_keys_under_reject_policy() {
    let atlas = Arc::new(
        AtlasBuilder::new()
            .struct_map_with_policy::<Pair>(
                vec![FieldSpec::new("x", "key"), FieldSpec::new("y", "k2")],
                UnknownKeyPolicy::Reject,
            )
            .build(),
    );
    let tokens = vec![
        Token::MapOpen(xtok::Length::definite(2)),
        Token::String("key".into()),
        Token::String("value".into()),
        Token::String("extra".into()),
        Token::Uint(42),
        Token::MapClose,
    ];
    let mut back = Pair::default();
    let mut u = Unmarshaler::new(atlas);
    u.bind(&mut back).unwrap();
    let mut saw_err = false;
    for tok in &tokens {
        if u.step(tok).is_err() {
            saw_err = true;
            break
        }
    }
    assert!(saw_err, "unmarshal should fail when an unknown key is rejected by policy");
}
