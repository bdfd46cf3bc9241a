use std::sync::Arc;

use eyre::Result;

use rowbin::{
    Config, EnumType, FallbackCodec, Field, FieldType, PrimitiveArray, PrimitiveKind, RowCodec,
    RowSchema, Value,
};

fn codec_for(fields: Vec<Field>) -> RowCodec {
    RowCodec::new(Arc::new(RowSchema::new(fields)), Config::default())
}

fn slot(bytes: &[u8], pos: usize) -> u64 {
    u64::from_le_bytes(bytes[pos..pos + 8].try_into().unwrap())
}

#[test]
fn person_record_layout_is_stable() -> Result<()> {
    let mut codec = codec_for(vec![
        Field::new("name", FieldType::String),
        Field::new("age", FieldType::Primitive(PrimitiveKind::Int32)),
        Field::new(
            "tags",
            FieldType::Array(Box::new(Field::new("item", FieldType::String))),
        ),
    ]);
    let record = Value::Struct(vec![
        Value::String("ada".into()),
        Value::Int32(36),
        Value::Array(vec![Value::String("go".into()), Value::String("rust".into())]),
    ]);
    let bytes = codec.to_row(&record)?.to_vec();

    // Row: 8 bitset + 24 slots + 8 name + 48 tags array.
    assert_eq!(bytes.len(), 88);
    assert_eq!(slot(&bytes, 0), 0); // no nulls
    assert_eq!(slot(&bytes, 8), (32 << 32) | 3); // name at 32, 3 bytes
    assert_eq!(slot(&bytes, 16), 36); // age inline
    assert_eq!(slot(&bytes, 24), (40 << 32) | 48); // tags at 40, 48 bytes
    assert_eq!(&bytes[32..35], b"ada");
    assert_eq!(&bytes[35..40], &[0, 0, 0, 0, 0]); // alignment padding

    // Tags array, offsets relative to its own start at 40:
    // 8 count + 8 bitset + 16 slots, then the two payloads.
    assert_eq!(slot(&bytes, 40), 2);
    assert_eq!(slot(&bytes, 56), (32 << 32) | 2);
    assert_eq!(slot(&bytes, 64), (40 << 32) | 4);
    assert_eq!(&bytes[72..74], b"go");
    assert_eq!(&bytes[80..84], b"rust");

    assert_eq!(codec.from_row(&bytes)?, record);
    Ok(())
}

#[test]
fn map_region_layout_is_prefix_keys_values() -> Result<()> {
    let mut codec = codec_for(vec![Field::new(
        "scores",
        FieldType::Map {
            key: Box::new(Field::new("key", FieldType::String)),
            value: Box::new(Field::new(
                "value",
                FieldType::Primitive(PrimitiveKind::Int64),
            )),
        },
    )]);
    let record = Value::Struct(vec![Value::Map(vec![
        (Value::String("a".into()), Value::Int64(1)),
        (Value::String("bb".into()), Value::Int64(2)),
    ])]);
    let bytes = codec.to_row(&record)?.to_vec();

    // Row header 16, then the map region: 8 prefix + 48 key array
    // (8 count + 8 bitset + 16 slots + 16 payloads) + 32 value array.
    assert_eq!(bytes.len(), 104);
    assert_eq!(slot(&bytes, 8), (16 << 32) | 88);
    assert_eq!(slot(&bytes, 16), 48); // key array byte length
    let keys = 24; // key array start
    assert_eq!(slot(&bytes, keys), 2);
    assert_eq!(slot(&bytes, keys + 16), (32 << 32) | 1);
    assert_eq!(slot(&bytes, keys + 24), (40 << 32) | 2);
    let values = 72; // value array start
    assert_eq!(slot(&bytes, values), 2);
    assert_eq!(slot(&bytes, values + 16), 1);
    assert_eq!(slot(&bytes, values + 24), 2);

    assert_eq!(codec.from_row(&bytes)?, record);
    Ok(())
}

#[test]
fn null_fields_skip_their_variable_payloads() -> Result<()> {
    let point = Arc::new(RowSchema::new(vec![
        Field::new("x", FieldType::Primitive(PrimitiveKind::Float64)),
        Field::new("y", FieldType::Primitive(PrimitiveKind::Float64)),
    ]));
    let mut codec = codec_for(vec![
        Field::new("label", FieldType::String),
        Field::new("at", FieldType::Struct(point)),
        Field::new("note", FieldType::Nullable(PrimitiveKind::Int32)),
    ]);
    let record = Value::Struct(vec![Value::Null, Value::Null, Value::Null]);
    let bytes = codec.to_row(&record)?.to_vec();

    // Nothing but the header: 8 bitset + 24 slots, all slots zero.
    assert_eq!(bytes.len(), 32);
    assert_eq!(slot(&bytes, 0), 0b111);
    for pos in [8, 16, 24] {
        assert_eq!(slot(&bytes, pos), 0);
    }
    assert_eq!(codec.from_row(&bytes)?, record);
    Ok(())
}

#[test]
fn deeply_nested_records_resolve_relative_offsets() -> Result<()> {
    let inner = Arc::new(RowSchema::new(vec![
        Field::new("id", FieldType::Primitive(PrimitiveKind::Int64)),
        Field::new("name", FieldType::String),
    ]));
    let middle = Arc::new(RowSchema::new(vec![
        Field::new("leaf", FieldType::Struct(inner)),
        Field::new("count", FieldType::Primitive(PrimitiveKind::Int32)),
    ]));
    let mut codec = codec_for(vec![
        Field::new("root_name", FieldType::String),
        Field::new("child", FieldType::Struct(middle)),
    ]);
    let record = Value::Struct(vec![
        Value::String("root".into()),
        Value::Struct(vec![
            Value::Struct(vec![Value::Int64(7), Value::String("leaf-name".into())]),
            Value::Int32(3),
        ]),
    ]);
    let bytes = codec.to_row(&record)?.to_vec();
    assert_eq!(codec.from_row(&bytes)?, record);
    Ok(())
}

#[test]
fn kitchen_sink_record_round_trips() -> Result<()> {
    struct Passthrough;
    impl FallbackCodec for Passthrough {
        fn encode(&self, value: &Value) -> Result<Vec<u8>> {
            match value {
                Value::BigInt(b) => Ok(b.clone()),
                _ => eyre::bail!("unsupported opaque value"),
            }
        }
        fn decode(&self, bytes: &[u8]) -> Result<Value> {
            Ok(Value::BigInt(bytes.to_vec()))
        }
    }

    let status = Arc::new(EnumType::new(
        "Status",
        vec!["active".into(), "suspended".into()],
    ));
    let address = Arc::new(RowSchema::new(vec![
        Field::new("street", FieldType::String),
        Field::new("zip", FieldType::Primitive(PrimitiveKind::Int32)),
    ]));
    let mut codec = codec_for(vec![
        Field::new("id", FieldType::Primitive(PrimitiveKind::Int64)),
        Field::new("name", FieldType::String),
        Field::new("status", FieldType::Enum(status)),
        Field::new(
            "balance",
            FieldType::Decimal {
                precision: 38,
                scale: 4,
            },
        ),
        Field::new("serial", FieldType::BigInt),
        Field::new("born", FieldType::Date),
        Field::new("last_seen", FieldType::Timestamp),
        Field::new("home", FieldType::Struct(address)),
        Field::new(
            "scores",
            FieldType::Array(Box::new(Field::new(
                "item",
                FieldType::Primitive(PrimitiveKind::Float64),
            ))),
        ),
        Field::new(
            "nicknames",
            FieldType::List(Box::new(Field::new("item", FieldType::String))),
        ),
        Field::new(
            "roles",
            FieldType::Set(Box::new(Field::new("item", FieldType::String))),
        ),
        Field::new(
            "meta",
            FieldType::Map {
                key: Box::new(Field::new("key", FieldType::String)),
                value: Box::new(Field::new("value", FieldType::Nullable(PrimitiveKind::Int32))),
            },
        ),
        Field::new("extra", FieldType::Opaque),
    ])
    .with_fallback(Arc::new(Passthrough));

    let record = Value::Struct(vec![
        Value::Int64(42),
        Value::String("grace".into()),
        Value::Enum(1),
        Value::Decimal {
            unscaled: -1_234_567,
            scale: 4,
        },
        Value::BigInt(vec![0x01, 0x02, 0x03]),
        Value::Date(2_190),
        Value::Timestamp(1_700_000_000_000_000),
        Value::Struct(vec![Value::String("pier 1".into()), Value::Int32(94107)]),
        Value::PrimitiveArray(PrimitiveArray::Float64(vec![0.5, -1.5, 2.25])),
        Value::List(vec![Value::String("gracie".into())]),
        Value::Set(vec![Value::String("admin".into()), Value::String("ops".into())]),
        Value::Map(vec![
            (Value::String("retries".into()), Value::Int32(3)),
            (Value::String("limit".into()), Value::Null),
        ]),
        Value::BigInt(vec![9, 9, 9]),
    ]);
    let bytes = codec.to_row(&record)?.to_vec();
    assert_eq!(codec.from_row(&bytes)?, record);
    Ok(())
}

#[test]
fn three_level_array_keeps_inner_nulls() -> Result<()> {
    let mut codec = codec_for(vec![Field::new(
        "cube",
        FieldType::Array(Box::new(Field::new(
            "plane",
            FieldType::Array(Box::new(Field::new(
                "row",
                FieldType::Array(Box::new(Field::new(
                    "cell",
                    FieldType::Primitive(PrimitiveKind::Int32),
                ))),
            ))),
        ))),
    )]);
    let record = Value::Struct(vec![Value::Array(vec![
        Value::Array(vec![
            Value::PrimitiveArray(PrimitiveArray::Int32(vec![1, 2])),
            Value::Null,
        ]),
        Value::Null,
    ])]);
    let bytes = codec.to_row(&record)?.to_vec();
    assert_eq!(codec.from_row(&bytes)?, record);
    Ok(())
}

#[test]
fn zero_copy_view_reads_without_decoding() -> Result<()> {
    let mut codec = codec_for(vec![
        Field::new("name", FieldType::String),
        Field::new("age", FieldType::Primitive(PrimitiveKind::Int32)),
        Field::new(
            "tags",
            FieldType::List(Box::new(Field::new("item", FieldType::String))),
        ),
    ]);
    let bytes = codec
        .to_row(&Value::Struct(vec![
            Value::String("ada".into()),
            Value::Int32(36),
            Value::List(vec![Value::String("math".into())]),
        ]))?
        .to_vec();

    let view = codec.row_view(&bytes)?;
    assert_eq!(view.get_str(0)?, "ada");
    assert_eq!(view.get_i32(1)?, 36);
    let tags = view.get_array(2)?;
    assert_eq!(tags.num_elements(), 1);
    assert_eq!(tags.get_str(0)?, "math");
    Ok(())
}

#[test]
fn disabled_bounds_checking_still_round_trips_well_formed_rows() -> Result<()> {
    let mut codec = RowCodec::new(
        Arc::new(RowSchema::new(vec![
            Field::new("name", FieldType::String),
            Field::new("n", FieldType::Primitive(PrimitiveKind::Int64)),
        ])),
        Config {
            bounds_checking: false,
        },
    );
    let record = Value::Struct(vec![Value::String("fast".into()), Value::Int64(-1)]);
    let bytes = codec.to_row(&record)?.to_vec();
    assert_eq!(codec.from_row(&bytes)?, record);
    Ok(())
}

#[test]
fn interleaved_encodes_stay_deterministic() -> Result<()> {
    let mut codec = codec_for(vec![
        Field::new("name", FieldType::String),
        Field::new(
            "meta",
            FieldType::Map {
                key: Box::new(Field::new("key", FieldType::String)),
                value: Box::new(Field::new("value", FieldType::String)),
            },
        ),
    ]);
    let small = Value::Struct(vec![
        Value::String("s".into()),
        Value::Map(vec![(Value::String("k".into()), Value::String("v".into()))]),
    ]);
    let large = Value::Struct(vec![
        Value::String("a considerably longer record name".into()),
        Value::Map(vec![
            (
                Value::String("first key".into()),
                Value::String("first value".into()),
            ),
            (
                Value::String("second key".into()),
                Value::String("second value".into()),
            ),
        ]),
    ]);

    let first = codec.to_row(&small)?.to_vec();
    codec.to_row(&large)?;
    let second = codec.to_row(&small)?.to_vec();
    assert_eq!(first, second);
    Ok(())
}
