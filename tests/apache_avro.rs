//! Cross-implementation vectors: bytes produced by `apache-avro` decode
//! here, and bytes produced here decode under `apache-avro`

use {
	apache_avro::{types::Value as ApacheValue, Schema as ApacheSchema},
	avro_plan::{
		schema::{
			Array, Fixed, Map, Name, Record, RecordField, RegularType, Schema, SchemaKey,
		},
		types::{RecordValue, Value},
	},
	lazy_static::lazy_static,
	pretty_assertions::assert_eq,
};

struct CrossCase {
	apache_schema: ApacheSchema,
	schema: Schema,
	apache_value: ApacheValue,
	value: Value,
}

lazy_static! {
	static ref CASES: Vec<CrossCase> = vec![
		CrossCase {
			apache_schema: ApacheSchema::parse_str(r#""long""#).unwrap(),
			schema: Schema::from_nodes(vec![RegularType::Long.into()]).unwrap(),
			apache_value: ApacheValue::Long(-987_654_321),
			value: Value::Long(-987_654_321),
		},
		CrossCase {
			apache_schema: ApacheSchema::parse_str(r#""string""#).unwrap(),
			schema: Schema::from_nodes(vec![RegularType::String.into()]).unwrap(),
			apache_value: ApacheValue::String("interop ✓".to_owned()),
			value: Value::String("interop ✓".to_owned()),
		},
		CrossCase {
			apache_schema: ApacheSchema::parse_str(r#""double""#).unwrap(),
			schema: Schema::from_nodes(vec![RegularType::Double.into()]).unwrap(),
			apache_value: ApacheValue::Double(3.14159),
			value: Value::Double(3.14159),
		},
		CrossCase {
			apache_schema: ApacheSchema::parse_str(r#"{"type": "array", "items": "int"}"#)
				.unwrap(),
			schema: Schema::from_nodes(vec![
				Array::new(SchemaKey::from_idx(1)).into(),
				RegularType::Int.into(),
			])
			.unwrap(),
			apache_value: ApacheValue::Array(vec![
				ApacheValue::Int(3),
				ApacheValue::Int(-7),
				ApacheValue::Int(0),
			]),
			value: Value::Array(vec![Value::Int(3), Value::Int(-7), Value::Int(0)]),
		},
		CrossCase {
			apache_schema: ApacheSchema::parse_str(r#"{"type": "map", "values": "long"}"#)
				.unwrap(),
			schema: Schema::from_nodes(vec![
				Map::new(SchemaKey::from_idx(1)).into(),
				RegularType::Long.into(),
			])
			.unwrap(),
			apache_value: ApacheValue::Map(
				[("answer".to_owned(), ApacheValue::Long(42))]
					.into_iter()
					.collect(),
			),
			value: Value::Map(
				[("answer".to_owned(), Value::Long(42))].into_iter().collect(),
			),
		},
		CrossCase {
			apache_schema: ApacheSchema::parse_str(
				r#"{
					"type": "record",
					"name": "Test",
					"fields": [
						{"name": "f", "type": "long"},
						{"name": "g", "type": "string"}
					]
				}"#,
			)
			.unwrap(),
			schema: Schema::from_nodes(vec![
				Record::new(
					Name::from_fully_qualified_name("Test"),
					vec![
						RecordField::new("f", SchemaKey::from_idx(1)),
						RecordField::new("g", SchemaKey::from_idx(2)),
					],
				)
				.into(),
				RegularType::Long.into(),
				RegularType::String.into(),
			])
			.unwrap(),
			apache_value: ApacheValue::Record(vec![
				("f".to_owned(), ApacheValue::Long(1)),
				("g".to_owned(), ApacheValue::String("Abc".to_owned())),
			]),
			value: Value::Record(RecordValue::new(
				"Test",
				[
					("f", Value::Long(1)),
					("g", Value::String("Abc".to_owned())),
				],
			)),
		},
		CrossCase {
			apache_schema: ApacheSchema::parse_str(
				r#"{"type": "fixed", "name": "Two", "size": 2}"#,
			)
			.unwrap(),
			schema: Schema::from_nodes(vec![Fixed::new(
				Name::from_fully_qualified_name("Two"),
				2,
			)
			.into()])
			.unwrap(),
			apache_value: ApacheValue::Fixed(2, vec![0xab, 0xcd]),
			value: Value::Bytes(vec![0xab, 0xcd]),
		},
	];
}

#[test]
fn apache_encodes_we_decode() {
	for case in CASES.iter() {
		let datum =
			apache_avro::to_avro_datum(&case.apache_schema, case.apache_value.clone()).unwrap();
		let decoded = avro_plan::deserialize(&case.schema, &datum).unwrap();
		assert_eq!(decoded, case.value, "schema: {:?}", case.apache_schema);
	}
}

#[test]
fn we_encode_apache_decodes() {
	for case in CASES.iter() {
		let datum = avro_plan::serialize_to_vec(&case.schema, &case.value).unwrap();
		let decoded =
			apache_avro::from_avro_datum(&case.apache_schema, &mut &datum[..], None).unwrap();
		assert_eq!(decoded, case.apache_value, "schema: {:?}", case.apache_schema);
	}
}

#[test]
fn both_encodings_are_byte_identical() {
	for case in CASES.iter() {
		let ours = avro_plan::serialize_to_vec(&case.schema, &case.value).unwrap();
		let theirs =
			apache_avro::to_avro_datum(&case.apache_schema, case.apache_value.clone()).unwrap();
		assert_eq!(ours, theirs, "schema: {:?}", case.apache_schema);
	}
}
