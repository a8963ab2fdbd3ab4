use std::collections::BTreeMap;

use proptest::prelude::*;
use serde_json::json;
use tfplan_gob::{
    from_slice, record, to_bytes, write_wire_type, DecodeLimits, Dynamic, GobDecoder,
    GobEncoder, GobError, GobStreamDecoder, GobStreamEncoder, WireField, WireKind, WireType,
};

record! {
    struct Point as "Point" {
        x: i64 => "X",
        y: i64 => "Y",
    }
}

record! {
    struct Inner as "Inner" {
        tags: Vec<String> => "Tags",
    }
}

record! {
    struct Wide as "Thing" {
        name: String => "Name",
        extra: Vec<String> => "Extra",
        nested: Option<Inner> => "Nested",
        count: i64 => "Count",
        meta: BTreeMap<String, Dynamic> => "Meta",
    }
}

record! {
    struct Narrow as "Thing" {
        count: i64 => "Count",
        name: String => "Name",
    }
}

record! {
    struct Small as "Thing" {
        count: i8 => "Count",
    }
}

record! {
    struct Mislabeled as "Thing" {
        name: String => "Name",
        count: String => "Count",
    }
}

record! {
    struct Other as "Other" {
        z: i64 => "Z",
    }
}

record! {
    struct Bag as "Bag" {
        vars: BTreeMap<String, Dynamic> => "Vars",
    }
}

record! {
    struct Labels as "Labels" {
        labels: BTreeMap<String, String> => "Labels",
    }
}

record! {
    struct Holder as "Holder" {
        items: Vec<String> => "A",
    }
}

const GO_POINT: [u8; 40] = [
    0x1f, 0xff, 0x81, 0x03, 0x01, 0x01, 0x05, b'P', b'o', b'i', b'n', b't', 0x01, 0xff, 0x82,
    0x00, 0x01, 0x02, 0x01, 0x01, b'X', 0x01, 0x04, 0x00, 0x01, 0x01, b'Y', 0x01, 0x04, 0x00,
    0x00, 0x00, 0x07, 0xff, 0x82, 0x01, 0x2c, 0x01, 0x42, 0x00,
];

fn frame(body: &[u8]) -> Vec<u8> {
    let mut enc = GobEncoder::new();
    enc.write_uint(body.len() as u64);
    enc.writer.buf(body);
    enc.writer.flush()
}

fn definition(wire: &WireType) -> Vec<u8> {
    let mut enc = GobEncoder::new();
    enc.write_int(-i64::from(wire.id));
    write_wire_type(&mut enc, wire);
    frame(&enc.writer.flush())
}

fn wide() -> Wide {
    Wide {
        name: "web".to_string(),
        extra: vec!["a".to_string(), "b".to_string()],
        nested: Some(Inner {
            tags: vec!["t1".to_string()],
        }),
        count: 7,
        meta: BTreeMap::from([("schema_version".to_string(), Dynamic::from("1"))]),
    }
}

fn decode_err<T: tfplan_gob::Decode + std::fmt::Debug>(bytes: &[u8]) -> GobError {
    match from_slice::<T>(bytes) {
        Ok(value) => panic!("decode unexpectedly succeeded: {value:?}"),
        Err(e) => e,
    }
}

#[test]
fn primitive_wire_matrix() {
    let mut enc = GobEncoder::new();
    enc.write_uint(7);
    enc.write_uint(0x1234);
    enc.write_int(-129);
    enc.write_bool(true);
    enc.write_float(-2.5);
    enc.write_string("héllo");
    enc.write_bytes(&[0, 255]);
    let bytes = enc.writer.flush();
    assert_eq!(&bytes[..6], &[0x07, 0xfe, 0x12, 0x34, 0xfe, 0x01]);

    let mut dec = GobDecoder::new(bytes);
    assert_eq!(dec.read_uint().unwrap(), 7);
    assert_eq!(dec.read_uint().unwrap(), 0x1234);
    assert_eq!(dec.read_int().unwrap(), -129);
    assert!(dec.read_bool().unwrap());
    assert_eq!(dec.read_float().unwrap(), -2.5);
    assert_eq!(dec.read_string().unwrap(), "héllo");
    assert_eq!(dec.read_bytes().unwrap(), &[0, 255]);
    assert!(dec.is_empty());
}

#[test]
fn go_point_fixture_matrix() {
    let point: Point = from_slice(&GO_POINT).unwrap_or_else(|e| panic!("decode failed: {e}"));
    assert_eq!(point, Point { x: 22, y: 33 });

    let bytes = to_bytes(&Point { x: 22, y: 33 }).unwrap_or_else(|e| panic!("encode failed: {e}"));
    assert_eq!(bytes, GO_POINT);

    let mut stream = GobStreamEncoder::new(Vec::new());
    stream.encode(&Point { x: 22, y: 33 }).unwrap();
    stream.encode(&Point { x: 0, y: -1 }).unwrap();
    let bytes = stream.into_inner();
    // The second value reuses the definition already sent.
    assert_eq!(bytes.len(), GO_POINT.len() + 6);

    let mut stream = GobStreamDecoder::new(bytes.as_slice());
    assert_eq!(stream.decode::<Point>().unwrap(), Point { x: 22, y: 33 });
    assert_eq!(stream.decode::<Point>().unwrap(), Point { x: 0, y: -1 });
    assert_eq!(stream.catalog().len(), 1);
}

#[test]
fn field_compatibility_matrix() {
    let bytes = to_bytes(&wide()).unwrap();

    let narrow: Narrow = from_slice(&bytes).unwrap_or_else(|e| panic!("decode failed: {e}"));
    assert_eq!(
        narrow,
        Narrow {
            count: 7,
            name: "web".to_string(),
        }
    );

    let full: Wide = from_slice(&bytes).unwrap();
    assert_eq!(full, wide());

    let sparse = to_bytes(&Wide {
        name: "only".to_string(),
        ..Wide::default()
    })
    .unwrap();
    let narrow: Narrow = from_slice(&sparse).unwrap();
    assert_eq!(narrow.count, 0);
    assert_eq!(narrow.name, "only");
    let full: Wide = from_slice(&sparse).unwrap();
    assert_eq!(full.nested, None);
    assert!(full.meta.is_empty());
}

#[test]
fn schema_mismatch_matrix() {
    // Checked against the definition even when the value omits the field.
    let bytes = to_bytes(&Wide::default()).unwrap();
    match decode_err::<Mislabeled>(&bytes) {
        GobError::SchemaMismatch {
            path,
            expected,
            found,
        } => {
            assert_eq!(path, "Thing.Count");
            assert_eq!(expected, "string");
            assert_eq!(found, "int");
        }
        other => panic!("unexpected error: {other}"),
    }

    assert!(matches!(
        decode_err::<Other>(&GO_POINT),
        GobError::SchemaMismatch { .. }
    ));

    let strings = to_bytes(&vec!["a".to_string()]).unwrap();
    assert_eq!(from_slice::<Vec<String>>(&strings).unwrap(), vec!["a"]);
    assert!(matches!(
        decode_err::<String>(&strings),
        GobError::SchemaMismatch { .. }
    ));

    let big = to_bytes(&Wide {
        count: 300,
        ..Wide::default()
    })
    .unwrap();
    assert!(matches!(decode_err::<Small>(&big), GobError::Malformed(_)));
}

#[test]
fn malformed_stream_matrix() {
    // Same definition twice.
    let mut twice = GO_POINT[..32].to_vec();
    twice.extend_from_slice(&GO_POINT);
    assert!(matches!(decode_err::<Point>(&twice), GobError::Malformed(_)));

    // Definition for a reserved id.
    let mut reserved = GO_POINT.to_vec();
    reserved[2] = 0x17;
    assert!(matches!(decode_err::<Point>(&reserved), GobError::Malformed(_)));

    // Field number beyond the two declared fields.
    let mut out_of_range = GO_POINT[..32].to_vec();
    out_of_range.extend_from_slice(&frame(&[0xff, 0x82, 0x03, 0x2c, 0x00]));
    assert!(matches!(decode_err::<Point>(&out_of_range), GobError::Malformed(_)));

    // Struct without its terminating zero delta.
    let mut unterminated = GO_POINT[..32].to_vec();
    unterminated.extend_from_slice(&frame(&[0xff, 0x82, 0x01, 0x2c]));
    assert!(matches!(decode_err::<Point>(&unterminated), GobError::Malformed(_)));

    // Field type that is never defined.
    let holder = WireType {
        id: 65,
        name: "Holder".to_string(),
        kind: WireKind::Struct {
            fields: vec![WireField {
                name: "A".to_string(),
                id: 66,
            }],
        },
    };
    let mut dangling = definition(&holder);
    dangling.extend_from_slice(&frame(&[0xff, 0x82, 0x00]));
    assert!(matches!(decode_err::<Holder>(&dangling), GobError::Malformed(_)));

    // Length prefix longer than its message.
    let mut long_string = definition(&holder);
    long_string.extend_from_slice(&definition(&WireType {
        id: 66,
        name: "[]string".to_string(),
        kind: WireKind::Slice { elem: 6 },
    }));
    long_string.extend_from_slice(&frame(&[0xff, 0x82, 0x01, 0x01, 0x09, b'a', 0x00]));
    assert!(matches!(decode_err::<Holder>(&long_string), GobError::Malformed(_)));

    // Duplicate map key.
    let labels = Labels {
        labels: BTreeMap::from([
            ("a".to_string(), "x".to_string()),
            ("b".to_string(), "y".to_string()),
        ]),
    };
    let mut duplicate = to_bytes(&labels).unwrap();
    let at = duplicate
        .iter()
        .rposition(|b| *b == b'b')
        .unwrap_or_else(|| panic!("key not found"));
    duplicate[at] = b'a';
    assert!(matches!(decode_err::<Labels>(&duplicate), GobError::Malformed(_)));

    // Duplicate key inside a map held by an interface value.
    let bag = Bag {
        vars: BTreeMap::from([(
            "inner".to_string(),
            Dynamic::from(json!({"a": "x", "b": "y"})),
        )]),
    };
    let mut duplicate = to_bytes(&bag).unwrap();
    let at = duplicate
        .iter()
        .rposition(|b| *b == b'b')
        .unwrap_or_else(|| panic!("key not found"));
    duplicate[at] = b'a';
    match decode_err::<Bag>(&duplicate) {
        GobError::Malformed(msg) => assert!(msg.contains("duplicate map key"), "{msg}"),
        other => panic!("expected Malformed, got {other}"),
    }
}

#[test]
fn truncated_stream_matrix() {
    assert!(matches!(decode_err::<Point>(&[]), GobError::Io(_)));
    assert!(matches!(decode_err::<Point>(&GO_POINT[..10]), GobError::Io(_)));
    assert!(matches!(decode_err::<Point>(&GO_POINT[..32]), GobError::Io(_)));
    assert!(matches!(
        decode_err::<Point>(&GO_POINT[..GO_POINT.len() - 1]),
        GobError::Io(_)
    ));
}

#[test]
fn dynamic_value_matrix() {
    let vars = json!({
        "region": "us-east-1",
        "zones": ["a", "b"],
        "sizes": {"small": 1, "large": 4},
        "enabled": true,
        "ratio": 0.25,
        "unset": null,
    });
    let Dynamic::Map(vars) = Dynamic::from(vars) else {
        panic!("object did not become a map");
    };
    let bag = Bag { vars };
    let bytes = to_bytes(&bag).unwrap_or_else(|e| panic!("encode failed: {e}"));
    let decoded: Bag = from_slice(&bytes).unwrap_or_else(|e| panic!("decode failed: {e}"));
    assert_eq!(decoded, bag);
    assert_eq!(
        decoded.vars["sizes"].get("large").and_then(Dynamic::as_i64),
        Some(4)
    );

    let timeouts = |fields: BTreeMap<String, Dynamic>| Bag {
        vars: BTreeMap::from([(
            "timeouts".to_string(),
            Dynamic::Struct {
                name: "Timeouts".to_string(),
                fields,
            },
        )]),
    };
    let sent = timeouts(BTreeMap::from([
        ("create".to_string(), Dynamic::from("10m")),
        ("delete".to_string(), Dynamic::Nil),
    ]));
    let decoded: Bag = from_slice(&to_bytes(&sent).unwrap()).unwrap();
    // Omitted struct fields do not come back.
    assert_eq!(
        decoded,
        timeouts(BTreeMap::from([("create".to_string(), Dynamic::from("10m"))]))
    );
}

#[test]
fn interface_definition_inside_value_matrix() {
    let interface_slice = WireType {
        id: 67,
        name: "[]interface {}".to_string(),
        kind: WireKind::Slice { elem: 8 },
    };
    let mut bytes = definition(&WireType {
        id: 65,
        name: "Bag".to_string(),
        kind: WireKind::Struct {
            fields: vec![WireField {
                name: "Vars".to_string(),
                id: 66,
            }],
        },
    });
    bytes.extend_from_slice(&definition(&WireType {
        id: 66,
        name: "map[string]interface {}".to_string(),
        kind: WireKind::Map { key: 6, elem: 8 },
    }));

    // The producer flushes the partial value together with the definition
    // the interface needs, then continues in the next message.
    let mut head = GobEncoder::new();
    head.write_int(65);
    head.write_uint(1);
    head.write_uint(1);
    head.write_string("zones");
    head.write_string("[]interface {}");
    head.write_int(-67);
    write_wire_type(&mut head, &interface_slice);
    bytes.extend_from_slice(&frame(&head.writer.flush()));

    let mut element = GobEncoder::new();
    element.write_uint(0);
    element.write_string("a");
    let element = element.writer.flush();
    let mut list = GobEncoder::new();
    list.write_uint(0);
    list.write_uint(1);
    list.write_string("string");
    list.write_int(6);
    list.write_bytes(&element);
    let list = list.writer.flush();
    let mut tail = GobEncoder::new();
    tail.write_int(67);
    tail.write_bytes(&list);
    tail.write_uint(0);
    bytes.extend_from_slice(&frame(&tail.writer.flush()));

    let bag: Bag = from_slice(&bytes).unwrap_or_else(|e| panic!("decode failed: {e}"));
    assert_eq!(
        bag.vars["zones"],
        Dynamic::List(vec![Dynamic::String("a".to_string())])
    );
}

#[test]
fn depth_limit_matrix() {
    let mut value = Dynamic::from("leaf");
    for _ in 0..10 {
        value = Dynamic::List(vec![value]);
    }
    let bag = Bag {
        vars: BTreeMap::from([("deep".to_string(), value)]),
    };
    let bytes = to_bytes(&bag).unwrap();

    let decoded: Bag = from_slice(&bytes).unwrap();
    assert_eq!(decoded, bag);

    let limits = DecodeLimits::default().with_max_depth(4);
    let mut stream = GobStreamDecoder::with_limits(bytes.as_slice(), limits);
    assert!(matches!(stream.decode::<Bag>(), Err(GobError::Malformed(_))));

    let limits = DecodeLimits::default().with_max_message_len(8);
    let mut stream = GobStreamDecoder::with_limits(bytes.as_slice(), limits);
    assert!(matches!(stream.decode::<Bag>(), Err(GobError::Malformed(_))));
}

#[test]
fn skip_value_matrix() {
    let mut stream = GobStreamEncoder::new(Vec::new());
    stream.encode(&wide()).unwrap();
    stream.encode(&Point { x: 1, y: 2 }).unwrap();
    stream.encode(&"tail".to_string()).unwrap();
    let bytes = stream.into_inner();

    let mut stream = GobStreamDecoder::new(bytes.as_slice());
    stream.skip_value().unwrap_or_else(|e| panic!("skip failed: {e}"));
    stream.skip_value().unwrap_or_else(|e| panic!("skip failed: {e}"));
    assert_eq!(stream.decode::<String>().unwrap(), "tail");
    assert!(matches!(stream.decode::<String>(), Err(GobError::Io(_))));
}

proptest! {
    #[test]
    fn arbitrary_bytes_never_panic(bytes in proptest::collection::vec(any::<u8>(), 0..256)) {
        let _ = from_slice::<Wide>(&bytes);
        let _ = GobStreamDecoder::new(bytes.as_slice()).skip_value();
    }

    #[test]
    fn corrupted_point_never_panics(at in 0usize..40, byte in any::<u8>()) {
        let mut bytes = GO_POINT.to_vec();
        bytes[at] = byte;
        let _ = from_slice::<Point>(&bytes);
    }
}
