//! Byte-exact wire vectors for the Avro binary encoding, checked in both
//! directions

use {
	avro_plan::{
		de::DeErrorKind,
		schema::{
			Array, Decimal, LogicalType, Name, Record, RecordField, RegularType, Schema,
			SchemaKey, SchemaNode, Union,
		},
		types::{RecordValue, Value},
	},
	pretty_assertions::assert_eq,
};

fn single(node: impl Into<SchemaNode>) -> Schema {
	Schema::from_nodes(vec![node.into()]).unwrap()
}

fn round_trip(schema: &Schema, value: Value, expected: &[u8]) {
	let serialized = avro_plan::serialize_to_vec(schema, &value).unwrap();
	assert_eq!(serialized, expected);
	let deserialized = avro_plan::deserialize(schema, expected).unwrap();
	assert_eq!(deserialized, value);
}

#[test]
fn long_zero() {
	round_trip(&single(RegularType::Long), Value::Long(0), &[0x00]);
}

#[test]
fn long_minus_one() {
	round_trip(&single(RegularType::Long), Value::Long(-1), &[0x01]);
}

#[test]
fn long_sixty_four() {
	round_trip(&single(RegularType::Long), Value::Long(64), &[0x80, 0x01]);
}

#[test]
fn string_foo() {
	round_trip(
		&single(RegularType::String),
		Value::String("foo".to_owned()),
		&[0x06, 0x66, 0x6f, 0x6f],
	);
}

#[test]
fn array_of_ints() {
	let schema = Schema::from_nodes(vec![
		Array::new(SchemaKey::from_idx(1)).into(),
		RegularType::Int.into(),
	])
	.unwrap();
	round_trip(
		&schema,
		Value::Array(vec![Value::Int(1), Value::Int(2), Value::Int(3)]),
		&[0x06, 0x02, 0x04, 0x06, 0x00],
	);
}

#[test]
fn union_null_string() {
	let schema = Schema::from_nodes(vec![
		Union::new(vec![SchemaKey::from_idx(1), SchemaKey::from_idx(2)]).into(),
		RegularType::Null.into(),
		RegularType::String.into(),
	])
	.unwrap();
	round_trip(
		&schema,
		Value::String("x".to_owned()),
		&[0x02, 0x02, 0x78],
	);
	round_trip(&schema, Value::Null, &[0x00]);
}

#[test]
fn record_fields_in_schema_order() {
	let schema = Schema::from_nodes(vec![
		Record::new(
			Name::from_fully_qualified_name("Test"),
			vec![
				RecordField::new("a", SchemaKey::from_idx(1)),
				RecordField::new("b", SchemaKey::from_idx(2)),
			],
		)
		.into(),
		RegularType::Int.into(),
		RegularType::String.into(),
	])
	.unwrap();
	round_trip(
		&schema,
		Value::Record(RecordValue::new(
			"Test",
			[
				("a", Value::Int(1)),
				("b", Value::String("h".to_owned())),
			],
		)),
		&[0x02, 0x02, 0x68],
	);
}

#[test]
fn decimal_over_bytes() {
	let schema = single(SchemaNode::with_logical_type(
		RegularType::Bytes,
		LogicalType::Decimal(Decimal::new(2, 5)),
	));
	round_trip(
		&schema,
		Value::Decimal("123.45".parse().unwrap()),
		&[0x04, 0x30, 0x39],
	);
}

#[test]
fn varint_bijection_over_interesting_longs() {
	let schema = single(RegularType::Long);
	for &(n, encoded_len) in &[
		(0i64, 1usize),
		(-1, 1),
		(1, 1),
		(63, 1),
		(-64, 1),
		(64, 2),
		(-65, 2),
		(8191, 2),
		(8192, 3),
		(i64::from(i32::MAX), 5),
		(i64::from(i32::MIN), 5),
		(i64::MAX, 10),
		(i64::MIN, 10),
	] {
		let serialized = avro_plan::serialize_to_vec(&schema, &Value::Long(n)).unwrap();
		assert_eq!(serialized.len(), encoded_len, "encoded length of {n}");
		assert_eq!(
			avro_plan::deserialize(&schema, &serialized).unwrap(),
			Value::Long(n)
		);
	}
}

#[test]
fn varint_rejects_unterminated_encodings() {
	let schema = single(RegularType::Long);
	// Ten continuation bytes exhaust a long's encodable length
	let err = avro_plan::deserialize(&schema, &[0x80; 11]).unwrap_err();
	let avro_plan::Error::De(err) = err else {
		panic!("expected a deserialization error, got {err:?}")
	};
	assert_eq!(err.kind(), DeErrorKind::InvalidEncoding);
	assert_eq!(err.position(), Some(0));
}

#[test]
fn varint_rejects_truncated_input() {
	let schema = single(RegularType::Long);
	let err = avro_plan::deserialize(&schema, &[0x80]).unwrap_err();
	let avro_plan::Error::De(err) = err else {
		panic!("expected a deserialization error, got {err:?}")
	};
	assert_eq!(err.kind(), DeErrorKind::InvalidEncoding);
}

#[test]
fn boolean_encoding() {
	let schema = single(RegularType::Boolean);
	round_trip(&schema, Value::Boolean(false), &[0x00]);
	round_trip(&schema, Value::Boolean(true), &[0x01]);
	// Any non-zero byte decodes as true
	assert_eq!(
		avro_plan::deserialize(&schema, &[0x42]).unwrap(),
		Value::Boolean(true)
	);
}

#[test]
fn floats_are_little_endian() {
	round_trip(
		&single(RegularType::Float),
		Value::Float(1.0),
		&1.0f32.to_le_bytes(),
	);
	round_trip(
		&single(RegularType::Double),
		Value::Double(-2.5),
		&(-2.5f64).to_le_bytes(),
	);
}

#[test]
fn fixed_is_raw_bytes_without_length_prefix() {
	let schema = single(fixed_schema("Four", 4));
	round_trip(
		&schema,
		Value::Bytes(vec![0xde, 0xad, 0xbe, 0xef]),
		&[0xde, 0xad, 0xbe, 0xef],
	);
}

fn fixed_schema(name: &str, size: usize) -> avro_plan::schema::Fixed {
	avro_plan::schema::Fixed::new(Name::from_fully_qualified_name(name), size)
}

#[test]
fn empty_array_still_emits_terminator() {
	let schema = Schema::from_nodes(vec![
		Array::new(SchemaKey::from_idx(1)).into(),
		RegularType::Int.into(),
	])
	.unwrap();
	round_trip(&schema, Value::Array(vec![]), &[0x00]);
}

#[test]
fn multi_block_and_sized_block_framings_decode_identically() {
	let schema = Schema::from_nodes(vec![
		Array::new(SchemaKey::from_idx(1)).into(),
		RegularType::Int.into(),
	])
	.unwrap();
	let expected = Value::Array(vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
	// Single block of three
	assert_eq!(
		avro_plan::deserialize(&schema, &[0x06, 0x02, 0x04, 0x06, 0x00]).unwrap(),
		expected
	);
	// Two blocks: two items, then one
	assert_eq!(
		avro_plan::deserialize(&schema, &[0x04, 0x02, 0x04, 0x02, 0x06, 0x00]).unwrap(),
		expected
	);
	// Negative count advertising the block's byte length: count -3
	// (zigzag 5), byte length 3 (zigzag 6)
	assert_eq!(
		avro_plan::deserialize(&schema, &[0x05, 0x06, 0x02, 0x04, 0x06, 0x00]).unwrap(),
		expected
	);
}

#[test]
fn union_index_out_of_range_cites_position() {
	let schema = Schema::from_nodes(vec![
		Union::new(vec![SchemaKey::from_idx(1), SchemaKey::from_idx(2)]).into(),
		RegularType::Null.into(),
		RegularType::String.into(),
	])
	.unwrap();
	let err = avro_plan::deserialize(&schema, &[0x04, 0x02, 0x78]).unwrap_err();
	let avro_plan::Error::De(err) = err else {
		panic!("expected a deserialization error, got {err:?}")
	};
	assert_eq!(err.kind(), DeErrorKind::InvalidEncoding);
	assert_eq!(err.position(), Some(0));
}

#[test]
fn enum_is_a_varint_index() {
	let schema = single(avro_plan::schema::Enum::new(
		Name::from_fully_qualified_name("Suit"),
		vec!["SPADES".to_owned(), "HEARTS".to_owned(), "CLUBS".to_owned()],
	));
	round_trip(&schema, Value::Enum("HEARTS".to_owned()), &[0x02]);
	let err = avro_plan::deserialize(&schema, &[0x06]).unwrap_err();
	let avro_plan::Error::De(err) = err else {
		panic!("expected a deserialization error, got {err:?}")
	};
	assert_eq!(err.kind(), DeErrorKind::InvalidEncoding);
}
