//! Union plans: determinism of branch selection, optional targets,
//! first-match duplicate policy, record-name dispatch

use {
	avro_plan::{
		schema::{
			Name, Record, RecordField, RegularType, Schema, SchemaKey, SchemaNode, Union,
		},
		types::{RecordValue, TypeDescriptor, Value},
	},
	pretty_assertions::assert_eq,
};

fn union_schema(branches: Vec<SchemaNode>) -> Schema {
	let mut nodes = vec![SchemaNode::new(RegularType::Null)]; // placeholder, replaced below
	let variants = (1..=branches.len()).map(SchemaKey::from_idx).collect();
	nodes[0] = Union::new(variants).into();
	nodes.extend(branches);
	Schema::from_nodes(nodes).unwrap()
}

#[test]
fn branch_selection_is_deterministic() {
	let schema = union_schema(vec![
		RegularType::Null.into(),
		RegularType::Long.into(),
		RegularType::String.into(),
	]);
	let serializer = avro_plan::SerializerBuilder::new()
		.build(&schema, &TypeDescriptor::dynamic())
		.unwrap();
	let deserializer = avro_plan::DeserializerBuilder::new()
		.build(&schema, &TypeDescriptor::dynamic())
		.unwrap();

	for value in [
		Value::Null,
		Value::Long(170),
		Value::String("seventeen".to_owned()),
	] {
		let first = serializer.serialize_to_vec(&value).unwrap();
		let second = serializer.serialize_to_vec(&value).unwrap();
		assert_eq!(first, second, "same value must always take the same branch");
		let decoded = deserializer.deserialize(&first).unwrap();
		assert_eq!(decoded, value);
		// Re-serializing the decoded value re-selects the same branch
		assert_eq!(serializer.serialize_to_vec(&decoded).unwrap(), first);
	}
}

#[test]
fn optional_targets_unions_with_null() {
	let schema = union_schema(vec![RegularType::Null.into(), RegularType::Long.into()]);
	let serializer = avro_plan::build_serializer::<Option<i64>>(&schema).unwrap();
	let deserializer = avro_plan::build_deserializer::<Option<i64>>(&schema).unwrap();

	let datum = serializer.serialize_to_vec(&None).unwrap();
	assert_eq!(datum, [0x00]);
	assert_eq!(deserializer.deserialize(&datum).unwrap(), None);

	let datum = serializer.serialize_to_vec(&Some(3)).unwrap();
	assert_eq!(datum, [0x02, 0x06]);
	assert_eq!(deserializer.deserialize(&datum).unwrap(), Some(3));
}

#[test]
fn serializing_null_without_a_null_branch_fails() {
	let schema = union_schema(vec![RegularType::Long.into(), RegularType::String.into()]);
	let serializer = avro_plan::SerializerBuilder::new()
		.build(&schema, &TypeDescriptor::dynamic())
		.unwrap();
	let err = serializer.serialize_to_vec(&Value::Null).unwrap_err();
	assert_eq!(err.kind(), avro_plan::ser::SerErrorKind::InvalidValue);
}

#[test]
fn value_matching_no_branch_fails() {
	let schema = union_schema(vec![RegularType::Null.into(), RegularType::Long.into()]);
	let serializer = avro_plan::SerializerBuilder::new()
		.build(&schema, &TypeDescriptor::dynamic())
		.unwrap();
	let err = serializer
		.serialize_to_vec(&Value::String("nope".to_owned()))
		.unwrap_err();
	assert_eq!(err.kind(), avro_plan::ser::SerErrorKind::InvalidValue);
}

#[test]
fn duplicate_branches_first_match_wins() {
	// Two long branches: the first is always selected
	let schema = union_schema(vec![RegularType::Long.into(), RegularType::Long.into()]);
	let serializer = avro_plan::SerializerBuilder::new()
		.build(&schema, &TypeDescriptor::dynamic())
		.unwrap();
	assert_eq!(
		serializer.serialize_to_vec(&Value::Long(1)).unwrap(),
		[0x00, 0x02]
	);
	// The second branch still deserializes fine
	let deserializer = avro_plan::DeserializerBuilder::new()
		.build(&schema, &TypeDescriptor::dynamic())
		.unwrap();
	assert_eq!(
		deserializer.deserialize(&[0x02, 0x02]).unwrap(),
		Value::Long(1)
	);
}

#[test]
fn record_branches_dispatch_on_name() {
	// union<A, B>, both records with one long field
	let schema = Schema::from_nodes(vec![
		Union::new(vec![SchemaKey::from_idx(1), SchemaKey::from_idx(2)]).into(),
		Record::new(
			Name::from_fully_qualified_name("ns.A"),
			vec![RecordField::new("a", SchemaKey::from_idx(3))],
		)
		.into(),
		Record::new(
			Name::from_fully_qualified_name("ns.B"),
			vec![RecordField::new("b", SchemaKey::from_idx(3))],
		)
		.into(),
		RegularType::Long.into(),
	])
	.unwrap();
	let serializer = avro_plan::SerializerBuilder::new()
		.build(&schema, &TypeDescriptor::dynamic())
		.unwrap();

	let b = Value::Record(RecordValue::new("ns.B", [("b", Value::Long(1))]));
	assert_eq!(serializer.serialize_to_vec(&b).unwrap(), [0x02, 0x02]);

	// The bare name also dispatches
	let a = Value::Record(RecordValue::new("A", [("a", Value::Long(2))]));
	assert_eq!(serializer.serialize_to_vec(&a).unwrap(), [0x00, 0x04]);
}

#[test]
fn int_values_dispatch_to_a_long_branch() {
	// No int branch: the long branch accepts int values
	let schema = union_schema(vec![RegularType::Null.into(), RegularType::Long.into()]);
	let serializer = avro_plan::SerializerBuilder::new()
		.build(&schema, &TypeDescriptor::dynamic())
		.unwrap();
	assert_eq!(
		serializer.serialize_to_vec(&Value::Int(5)).unwrap(),
		[0x02, 0x0a]
	);
}

#[test]
fn empty_union_is_unsupported_schema() {
	let schema = Schema::from_nodes(vec![Union::new(vec![]).into()]).unwrap();
	let err = avro_plan::SerializerBuilder::new()
		.build(&schema, &TypeDescriptor::dynamic())
		.unwrap_err();
	assert_eq!(
		err.kind(),
		avro_plan::build::BuildErrorKind::UnsupportedSchema
	);
}

#[test]
fn nested_optional_record_round_trips() {
	// record Wrapper { inner: union<null, record Inner { v: long }> }
	let schema = Schema::from_nodes(vec![
		Record::new(
			Name::from_fully_qualified_name("Wrapper"),
			vec![RecordField::new("inner", SchemaKey::from_idx(1))],
		)
		.into(),
		Union::new(vec![SchemaKey::from_idx(2), SchemaKey::from_idx(3)]).into(),
		RegularType::Null.into(),
		Record::new(
			Name::from_fully_qualified_name("Inner"),
			vec![RecordField::new("v", SchemaKey::from_idx(4))],
		)
		.into(),
		RegularType::Long.into(),
	])
	.unwrap();
	let value = Value::Record(RecordValue::new(
		"Wrapper",
		[(
			"inner",
			Value::Record(RecordValue::new("Inner", [("v", Value::Long(-2))])),
		)],
	));
	let datum = avro_plan::serialize_to_vec(&schema, &value).unwrap();
	assert_eq!(datum, [0x02, 0x03]);
	assert_eq!(avro_plan::deserialize(&schema, &datum).unwrap(), value);

	let none = Value::Record(RecordValue::new("Wrapper", [("inner", Value::Null)]));
	let datum = avro_plan::serialize_to_vec(&schema, &none).unwrap();
	assert_eq!(datum, [0x00]);
	assert_eq!(avro_plan::deserialize(&schema, &datum).unwrap(), none);
}
