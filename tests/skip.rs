//! Skip equivalence: for every schema kind, skipping a value advances the
//! reader by exactly as many bytes as decoding it

use {
	avro_plan::{
		schema::{
			Array, Decimal, Enum, Fixed, LogicalType, Map, Name, Record, RecordField,
			RegularType, Schema, SchemaKey, SchemaNode, Union,
		},
		types::{Member, RecordType, RecordValue, TypeDescriptor, Value},
	},
	pretty_assertions::assert_eq,
	std::collections::HashMap,
};

/// Wrap `skipped` in `record { a: <skipped>, sentinel: long }`, serialize
/// `{ a: value, sentinel: 7 }`, then deserialize with a host type that only
/// keeps the sentinel. If the skip plan advances by exactly the bytes the
/// value occupies, the sentinel decodes as 7 and the whole datum is
/// consumed.
fn assert_skip_equivalence(skipped: Vec<SchemaNode>, value: Value) {
	let mut nodes = vec![
		Record::new(
			Name::from_fully_qualified_name("Outer"),
			vec![
				RecordField::new("a", SchemaKey::from_idx(2)),
				RecordField::new("sentinel", SchemaKey::from_idx(1)),
			],
		)
		.into(),
		RegularType::Long.into(),
	];
	nodes.extend(skipped);
	let schema = Schema::from_nodes(nodes).unwrap();

	let full = Value::Record(RecordValue::new(
		"Outer",
		[("a", value), ("sentinel", Value::Long(7))],
	));
	let datum = avro_plan::serialize_to_vec(&schema, &full).unwrap();

	let descriptor = TypeDescriptor::record(RecordType::new(
		"Outer",
		vec![Member::new("sentinel", TypeDescriptor::long())],
	));
	let deserializer = avro_plan::DeserializerBuilder::new()
		.build(&schema, &descriptor)
		.unwrap();
	let (decoded, consumed) = deserializer.deserialize_with_trailing(&datum).unwrap();
	assert_eq!(consumed, datum.len(), "skip must consume the exact byte count");
	assert_eq!(
		decoded,
		Value::Record(RecordValue::new("Outer", [("sentinel", Value::Long(7))]))
	);
}

// Offsets in `skipped` node lists are relative to the outer record's two
// nodes, so the skipped subtree starts at index 2.

#[test]
fn skip_primitives() {
	assert_skip_equivalence(vec![RegularType::Null.into()], Value::Null);
	assert_skip_equivalence(vec![RegularType::Boolean.into()], Value::Boolean(true));
	assert_skip_equivalence(vec![RegularType::Int.into()], Value::Int(-123_456));
	assert_skip_equivalence(vec![RegularType::Long.into()], Value::Long(i64::MIN));
	assert_skip_equivalence(vec![RegularType::Float.into()], Value::Float(1.5));
	assert_skip_equivalence(vec![RegularType::Double.into()], Value::Double(-2.5));
	assert_skip_equivalence(
		vec![RegularType::Bytes.into()],
		Value::Bytes(vec![1, 2, 3, 4, 5]),
	);
	assert_skip_equivalence(
		vec![RegularType::String.into()],
		Value::String("skip me".to_owned()),
	);
	assert_skip_equivalence(
		vec![Fixed::new(Name::from_fully_qualified_name("F"), 3).into()],
		Value::Bytes(vec![9, 9, 9]),
	);
}

#[test]
fn skip_containers() {
	assert_skip_equivalence(
		vec![
			Array::new(SchemaKey::from_idx(3)).into(),
			RegularType::String.into(),
		],
		Value::Array(vec![
			Value::String("a".to_owned()),
			Value::String("bcd".to_owned()),
		]),
	);
	let mut map = HashMap::new();
	map.insert("k1".to_owned(), Value::Long(1));
	map.insert("k2".to_owned(), Value::Long(-1));
	assert_skip_equivalence(
		vec![
			Map::new(SchemaKey::from_idx(3)).into(),
			RegularType::Long.into(),
		],
		Value::Map(map),
	);
}

#[test]
fn skip_union_and_enum() {
	assert_skip_equivalence(
		vec![
			Union::new(vec![SchemaKey::from_idx(3), SchemaKey::from_idx(4)]).into(),
			RegularType::Null.into(),
			RegularType::String.into(),
		],
		Value::String("x".to_owned()),
	);
	assert_skip_equivalence(
		vec![SchemaNode::from(Enum::new(
			Name::from_fully_qualified_name("E"),
			vec!["A".to_owned(), "B".to_owned()],
		))],
		Value::Enum("B".to_owned()),
	);
}

#[test]
fn skip_nested_record() {
	assert_skip_equivalence(
		vec![
			Record::new(
				Name::from_fully_qualified_name("Inner"),
				vec![
					RecordField::new("x", SchemaKey::from_idx(3)),
					RecordField::new("y", SchemaKey::from_idx(4)),
				],
			)
			.into(),
			RegularType::String.into(),
			RegularType::Double.into(),
		],
		Value::Record(RecordValue::new(
			"Inner",
			[
				("x", Value::String("deep".to_owned())),
				("y", Value::Double(0.5)),
			],
		)),
	);
}

#[test]
fn skip_logical_types() {
	assert_skip_equivalence(
		vec![SchemaNode::with_logical_type(
			RegularType::Bytes,
			LogicalType::Decimal(Decimal::new(2, 9)),
		)],
		Value::Decimal("12345.67".parse().unwrap()),
	);
	assert_skip_equivalence(
		vec![SchemaNode::with_logical_type(
			Fixed::new(Name::from_fully_qualified_name("D"), 12).into(),
			LogicalType::Duration,
		)],
		Value::Duration(avro_plan::types::DurationParts::new(1, 2, 3)),
	);
	assert_skip_equivalence(
		vec![SchemaNode::with_logical_type(
			RegularType::Long,
			LogicalType::TimestampMillis,
		)],
		Value::Long(1_600_000_000_000),
	);
}

#[test]
fn skip_recursive_record() {
	// Outer { a: LongList, sentinel: long } where LongList is
	// self-referential through union<null, LongList>
	let nodes = vec![
		Record::new(
			Name::from_fully_qualified_name("LongList"),
			vec![
				RecordField::new("value", SchemaKey::from_idx(1)),
				RecordField::new("next", SchemaKey::from_idx(3)),
			],
		)
		.into(),
		Union::new(vec![SchemaKey::from_idx(4), SchemaKey::from_idx(2)]).into(),
		RegularType::Null.into(),
	];
	let list = Value::Record(RecordValue::new(
		"LongList",
		[
			("value", Value::Long(1)),
			(
				"next",
				Value::Record(RecordValue::new(
					"LongList",
					[("value", Value::Long(2)), ("next", Value::Null)],
				)),
			),
		],
	));
	assert_skip_equivalence(nodes, list);
}

#[test]
fn skipping_a_sized_block_uses_its_byte_length() {
	// record { a: array<string>, sentinel: long } with the array encoded
	// as one negative-count block advertising its byte length
	let schema = Schema::from_nodes(vec![
		Record::new(
			Name::from_fully_qualified_name("Outer"),
			vec![
				RecordField::new("a", SchemaKey::from_idx(2)),
				RecordField::new("sentinel", SchemaKey::from_idx(1)),
			],
		)
		.into(),
		RegularType::Long.into(),
		Array::new(SchemaKey::from_idx(3)).into(),
		RegularType::String.into(),
	])
	.unwrap();
	// count -2 (zigzag 3), byte length 4 (zigzag 8), "a", "b", terminator,
	// sentinel 7
	let datum = [0x03, 0x08, 0x02, 0x61, 0x02, 0x62, 0x00, 0x0e];

	let descriptor = TypeDescriptor::record(RecordType::new(
		"Outer",
		vec![Member::new("sentinel", TypeDescriptor::long())],
	));
	let deserializer = avro_plan::DeserializerBuilder::new()
		.build(&schema, &descriptor)
		.unwrap();
	let (decoded, consumed) = deserializer.deserialize_with_trailing(&datum).unwrap();
	assert_eq!(consumed, datum.len());
	assert_eq!(
		decoded,
		Value::Record(RecordValue::new("Outer", [("sentinel", Value::Long(7))]))
	);

	// The full decoder agrees on the framing
	assert_eq!(
		avro_plan::deserialize(&schema, &datum).unwrap(),
		Value::Record(RecordValue::new(
			"Outer",
			[
				(
					"a",
					Value::Array(vec![
						Value::String("a".to_owned()),
						Value::String("b".to_owned()),
					]),
				),
				("sentinel", Value::Long(7)),
			],
		))
	);
}
