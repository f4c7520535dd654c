//! Record plans: member matching, renames, constructor selection,
//! defaults, and fields without host counterparts

use {
	avro_plan::{
		de::DeError,
		schema::{
			Array, Name, Record, RecordField, RegularType, Schema, SchemaKey, SchemaNode,
		},
		types::{
			Constructor, HostValue, Member, Parameter, RecordType, RecordValue, TypeDescriptor,
			Value,
		},
	},
	pretty_assertions::assert_eq,
};

fn person_schema() -> Schema {
	Schema::from_nodes(vec![
		Record::new(
			Name::from_fully_qualified_name("test.Person"),
			vec![
				RecordField::new("full_name", SchemaKey::from_idx(1)),
				RecordField::new("age", SchemaKey::from_idx(2)),
			],
		)
		.into(),
		RegularType::String.into(),
		RegularType::Int.into(),
	])
	.unwrap()
}

#[derive(Debug, PartialEq)]
struct Person {
	full_name: String,
	age: i32,
}

impl HostValue for Person {
	fn type_descriptor() -> TypeDescriptor {
		TypeDescriptor::record(RecordType::new(
			"Person",
			vec![
				Member::new("FullName", TypeDescriptor::string()),
				Member::new("Age", TypeDescriptor::int()),
			],
		))
	}
	fn to_value(&self) -> Value {
		Value::Record(RecordValue::new(
			"Person",
			[
				("FullName", Value::String(self.full_name.clone())),
				("Age", Value::Int(self.age)),
			],
		))
	}
	fn from_value(value: Value) -> Result<Self, DeError> {
		match value {
			Value::Record(record) => {
				let mut fields = record.fields.into_iter();
				let full_name = match fields.next() {
					Some((_, Value::String(full_name))) => full_name,
					other => return Err(DeError::invalid_value(format_args!("{other:?}"))),
				};
				let age = match fields.next() {
					Some((_, Value::Int(age))) => age,
					other => return Err(DeError::invalid_value(format_args!("{other:?}"))),
				};
				Ok(Person { full_name, age })
			}
			other => Err(DeError::invalid_value(format_args!(
				"expected record, got {}",
				other.kind_name()
			))),
		}
	}
}

#[test]
fn canonical_matching_bridges_snake_and_pascal_case() {
	let schema = person_schema();
	let serializer = avro_plan::build_serializer::<Person>(&schema).unwrap();
	let deserializer = avro_plan::build_deserializer::<Person>(&schema).unwrap();

	let person = Person {
		full_name: "Ada Lovelace".to_owned(),
		age: 36,
	};
	let datum = serializer.serialize_to_vec(&person).unwrap();
	assert_eq!(deserializer.deserialize(&datum).unwrap(), person);
}

#[test]
fn rename_overrides_canonical_matching() {
	// Member "ignored" would never canonically match "full_name", the
	// rename carries it
	let descriptor = TypeDescriptor::record(RecordType::new(
		"Person",
		vec![
			Member::new("ignored", TypeDescriptor::string()).renamed("full_name"),
			Member::new("age", TypeDescriptor::int()),
		],
	));
	let schema = person_schema();
	let serializer = avro_plan::SerializerBuilder::new()
		.build(&schema, &descriptor)
		.unwrap();
	let value = Value::Record(RecordValue::new(
		"Person",
		[
			("ignored", Value::String("x".to_owned())),
			("age", Value::Int(1)),
		],
	));
	let datum = serializer.serialize_to_vec(&value).unwrap();
	assert_eq!(datum, [0x02, 0x78, 0x02]);
}

#[test]
fn missing_member_is_a_build_error_with_attempts() {
	let descriptor = TypeDescriptor::record(RecordType::new(
		"Person",
		vec![Member::new("age", TypeDescriptor::int())],
	));
	let schema = person_schema();
	let err = avro_plan::SerializerBuilder::new()
		.build(&schema, &descriptor)
		.unwrap_err();
	assert_eq!(err.kind(), avro_plan::build::BuildErrorKind::UnsupportedType);
	assert!(err.to_string().contains("full_name"), "{err}");
}

#[test]
fn constructor_parameters_cover_read_only_members() {
	// No writable member: materialization goes through the constructor
	let descriptor = TypeDescriptor::record(RecordType::with_constructors(
		"Person",
		vec![
			Member::read_only("fullName", TypeDescriptor::string()),
			Member::read_only("age", TypeDescriptor::int()),
		],
		vec![Constructor::new(vec![
			Parameter::new("fullName"),
			Parameter::new("age"),
		])],
	));
	let schema = person_schema();
	let deserializer = avro_plan::DeserializerBuilder::new()
		.build(&schema, &descriptor)
		.unwrap();
	// full_name "Bo", age 3
	let value = deserializer
		.deserialize(&[0x04, 0x42, 0x6f, 0x06])
		.unwrap();
	assert_eq!(
		value,
		Value::Record(RecordValue::new(
			"Person",
			[
				("fullName", Value::String("Bo".to_owned())),
				("age", Value::Int(3)),
			],
		))
	);
}

#[test]
fn unmatched_parameter_with_default_fills_the_member() {
	// Schema only carries full_name; the constructor's `age` parameter
	// has a default that fills the member
	let schema = Schema::from_nodes(vec![
		Record::new(
			Name::from_fully_qualified_name("test.Person"),
			vec![RecordField::new("full_name", SchemaKey::from_idx(1))],
		)
		.into(),
		RegularType::String.into(),
	])
	.unwrap();
	let descriptor = TypeDescriptor::record(RecordType::with_constructors(
		"Person",
		vec![
			Member::read_only("fullName", TypeDescriptor::string()),
			Member::read_only("age", TypeDescriptor::int()),
		],
		vec![Constructor::new(vec![
			Parameter::new("fullName"),
			Parameter::with_default("age", Value::Int(-1)),
		])],
	));
	let deserializer = avro_plan::DeserializerBuilder::new()
		.build(&schema, &descriptor)
		.unwrap();
	let value = deserializer.deserialize(&[0x04, 0x42, 0x6f]).unwrap();
	assert_eq!(
		value,
		Value::Record(RecordValue::new(
			"Person",
			[
				("fullName", Value::String("Bo".to_owned())),
				("age", Value::Int(-1)),
			],
		))
	);
}

#[test]
fn read_only_members_without_constructor_reject_the_type() {
	let descriptor = TypeDescriptor::record(RecordType::with_constructors(
		"Person",
		vec![
			Member::read_only("fullName", TypeDescriptor::string()),
			Member::read_only("age", TypeDescriptor::int()),
		],
		// Only constructor requires a parameter the schema cannot supply
		// and that has no default
		vec![Constructor::new(vec![
			Parameter::new("fullName"),
			Parameter::new("age"),
			Parameter::new("placeOfBirth"),
		])],
	));
	let schema = person_schema();
	let err = avro_plan::DeserializerBuilder::new()
		.build(&schema, &descriptor)
		.unwrap_err();
	assert_eq!(err.kind(), avro_plan::build::BuildErrorKind::UnsupportedType);
}

#[test]
fn fields_without_host_counterpart_are_skipped_on_the_wire() {
	// Schema: { kept: long, dropped_list: array<string>, also_kept: int }
	let schema = Schema::from_nodes(vec![
		Record::new(
			Name::from_fully_qualified_name("R"),
			vec![
				RecordField::new("kept", SchemaKey::from_idx(1)),
				RecordField::new("dropped_list", SchemaKey::from_idx(2)),
				RecordField::new("also_kept", SchemaKey::from_idx(3)),
			],
		)
		.into(),
		RegularType::Long.into(),
		Array::new(SchemaKey::from_idx(4)).into(),
		RegularType::Int.into(),
		RegularType::String.into(),
	])
	.unwrap();
	let descriptor = TypeDescriptor::record(RecordType::new(
		"R",
		vec![
			Member::new("kept", TypeDescriptor::long()),
			Member::new("also_kept", TypeDescriptor::int()),
		],
	));

	// Produce wire data with the full schema, dynamically
	let full_value = Value::Record(RecordValue::new(
		"R",
		[
			("kept", Value::Long(7)),
			(
				"dropped_list",
				Value::Array(vec![
					Value::String("a".to_owned()),
					Value::String("bc".to_owned()),
				]),
			),
			("also_kept", Value::Int(-7)),
		],
	));
	let datum = avro_plan::serialize_to_vec(&schema, &full_value).unwrap();

	let deserializer = avro_plan::DeserializerBuilder::new()
		.build(&schema, &descriptor)
		.unwrap();
	let (value, consumed) = deserializer.deserialize_with_trailing(&datum).unwrap();
	assert_eq!(consumed, datum.len(), "skipping must advance exactly");
	assert_eq!(
		value,
		Value::Record(RecordValue::new(
			"R",
			[("kept", Value::Long(7)), ("also_kept", Value::Int(-7))],
		))
	);
}

#[test]
fn dynamic_record_values_look_up_fields_by_name() {
	let schema = person_schema();
	// Field order in the value does not matter for dynamic serialization
	let shuffled = Value::Record(RecordValue::new(
		"test.Person",
		[
			("age", Value::Int(9)),
			("full_name", Value::String("Z".to_owned())),
		],
	));
	let datum = avro_plan::serialize_to_vec(&schema, &shuffled).unwrap();
	// But the wire order is the schema order
	assert_eq!(datum, [0x02, 0x5a, 0x12]);
	// And deserialization yields schema order with the schema's name
	assert_eq!(
		avro_plan::deserialize(&schema, &datum).unwrap(),
		Value::Record(RecordValue::new(
			"test.Person",
			[
				("full_name", Value::String("Z".to_owned())),
				("age", Value::Int(9)),
			],
		))
	);
}

#[test]
fn enum_members_map_to_symbols() {
	let schema = Schema::from_nodes(vec![SchemaNode::from(avro_plan::schema::Enum::new(
		Name::from_fully_qualified_name("Suit"),
		vec!["SPADES".to_owned(), "HEARTS".to_owned()],
	))])
	.unwrap();

	#[derive(Debug, PartialEq)]
	enum Suit {
		Spades,
		Hearts,
	}
	impl HostValue for Suit {
		fn type_descriptor() -> TypeDescriptor {
			TypeDescriptor::enumeration(avro_plan::types::EnumType::new(
				"Suit",
				["Spades", "Hearts"],
			))
		}
		fn to_value(&self) -> Value {
			Value::Enum(
				match self {
					Suit::Spades => "Spades",
					Suit::Hearts => "Hearts",
				}
				.to_owned(),
			)
		}
		fn from_value(value: Value) -> Result<Self, DeError> {
			match value {
				Value::Enum(member) => match &*member {
					"Spades" => Ok(Suit::Spades),
					"Hearts" => Ok(Suit::Hearts),
					other => Err(DeError::invalid_value(format_args!(
						"unknown member {other:?}"
					))),
				},
				other => Err(DeError::invalid_value(format_args!(
					"expected enum, got {}",
					other.kind_name()
				))),
			}
		}
	}

	let serializer = avro_plan::build_serializer::<Suit>(&schema).unwrap();
	let deserializer = avro_plan::build_deserializer::<Suit>(&schema).unwrap();
	let datum = serializer.serialize_to_vec(&Suit::Hearts).unwrap();
	assert_eq!(datum, [0x02]);
	assert_eq!(deserializer.deserialize(&datum).unwrap(), Suit::Hearts);
}

#[test]
fn enum_default_symbol_covers_unmapped_symbols() {
	let schema = Schema::from_nodes(vec![SchemaNode::from(
		avro_plan::schema::Enum::with_default(
			Name::from_fully_qualified_name("Status"),
			vec![
				"UNKNOWN".to_owned(),
				"ACTIVE".to_owned(),
				"RETIRED_STATE".to_owned(),
			],
			"UNKNOWN",
		),
	)])
	.unwrap();
	// The host type has no member for RETIRED_STATE
	let descriptor = TypeDescriptor::enumeration(avro_plan::types::EnumType::new(
		"Status",
		["Unknown", "Active"],
	));
	let deserializer = avro_plan::DeserializerBuilder::new()
		.build(&schema, &descriptor)
		.unwrap();
	assert_eq!(
		deserializer.deserialize(&[0x04]).unwrap(),
		Value::Enum("Unknown".to_owned())
	);
	assert_eq!(
		deserializer.deserialize(&[0x02]).unwrap(),
		Value::Enum("Active".to_owned())
	);
}

#[test]
fn ambiguous_enum_member_is_a_build_error() {
	let schema = Schema::from_nodes(vec![SchemaNode::from(avro_plan::schema::Enum::new(
		Name::from_fully_qualified_name("Suit"),
		vec!["SPADES".to_owned(), "spades".to_owned()],
	))])
	.unwrap();
	let descriptor = TypeDescriptor::enumeration(avro_plan::types::EnumType::new(
		"Suit",
		["Spades"],
	));
	let err = avro_plan::SerializerBuilder::new()
		.build(&schema, &descriptor)
		.unwrap_err();
	assert_eq!(err.kind(), avro_plan::build::BuildErrorKind::UnsupportedType);
}
