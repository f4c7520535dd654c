use super::*;

use crate::{
	schema::{LogicalType, SchemaNode},
	types::names_match,
};

/// Handles `union` schema nodes
///
/// At build time the branches are partitioned into the null branch (at most
/// one) and the non-null branches, each of which gets a runtime value test
/// derived from its shape. Branches whose test duplicates an earlier one
/// are skipped: the first branch wins, as callers needing finer
/// discrimination install their own case.
///
/// At runtime the value is tested null-first, then against each branch in
/// order; the first match decides the emitted index.
pub(super) struct UnionCase;

impl SerializerCase for UnionCase {
	fn name(&self) -> &'static str {
		"union"
	}

	fn build(
		&self,
		builder: &SerializerBuilder,
		key: SchemaKey,
		ty: &TypeDescriptor,
		ctx: &mut BuildContext<'_>,
	) -> CaseResult<SerPlan> {
		let RegularType::Union(union) = &ctx.schema()[key].type_ else {
			return Ok(CaseOutcome::no_match("schema is not a union"));
		};
		if union.variants.is_empty() {
			return Err(BuildError::unsupported_schema("union has no branches"));
		}
		let variants = union.variants.clone();
		let mut null_index: Option<i64> = None;
		let mut branches: Vec<(i64, BranchTest, SerPlan)> = Vec::with_capacity(variants.len());
		for (index, &variant_key) in variants.iter().enumerate() {
			let index = index as i64;
			let variant_node = &ctx.schema()[variant_key];
			if matches!(variant_node.type_, RegularType::Null) {
				if null_index.is_none() {
					null_index = Some(index);
				}
				continue;
			}
			if matches!(variant_node.type_, RegularType::Union(_)) {
				// Also forbidden by the Avro specification
				return Err(BuildError::unsupported_schema(
					"a union may not immediately contain another union",
				));
			}
			let test = BranchTest::for_schema(variant_node);
			if branches.iter().any(|(_, existing, _)| *existing == test) {
				// Duplicate host mapping: first branch wins
				continue;
			}
			let branch_ty = ty.union_branch_type();
			let plan = builder.build_node(variant_key, &branch_ty, ctx)?;
			branches.push((index, test, plan));
		}
		let union_description = format!("{:?}", ctx.schema()[key].type_);
		Ok(CaseOutcome::Built(Arc::new(move |value, state| {
			if matches!(value, Value::Null) {
				return match null_index {
					Some(index) => state.write_long(index),
					None => Err(SerError::invalid_value(format_args!(
						"union {union_description} has no null branch, cannot serialize null"
					))),
				};
			}
			for (index, test, plan) in &branches {
				if test.matches(value) {
					state.write_long(*index)?;
					return (**plan)(value, state);
				}
			}
			Err(SerError::invalid_value(format_args!(
				"{} value matches no branch of union {union_description}",
				value.kind_name()
			)))
		})))
	}
}

/// Runtime test deciding whether a value belongs to a union branch
///
/// Derived from the branch's schema shape. Named branches (records) also
/// carry the name so that several record branches can coexist in one
/// union.
#[derive(Clone, Debug, PartialEq)]
enum BranchTest {
	Boolean,
	Int,
	Long,
	Float,
	Double,
	Bytes,
	String,
	Fixed,
	Array,
	Map,
	Record {
		fully_qualified_name: String,
		name: String,
	},
	Enum,
	Decimal,
	Date,
	Time,
	Timestamp,
	Duration,
}

impl BranchTest {
	fn for_schema(node: &SchemaNode) -> Self {
		match &node.logical_type {
			Some(LogicalType::Decimal(_)) => return BranchTest::Decimal,
			Some(LogicalType::Date) => return BranchTest::Date,
			Some(LogicalType::TimeMillis | LogicalType::TimeMicros) => return BranchTest::Time,
			Some(
				LogicalType::TimestampMillis
				| LogicalType::TimestampMicros
				| LogicalType::TimestampNanos,
			) => return BranchTest::Timestamp,
			Some(LogicalType::Duration) => return BranchTest::Duration,
			None => {}
		}
		match &node.type_ {
			RegularType::Null => unreachable!("null branches are partitioned out"),
			RegularType::Boolean => BranchTest::Boolean,
			RegularType::Int => BranchTest::Int,
			RegularType::Long => BranchTest::Long,
			RegularType::Float => BranchTest::Float,
			RegularType::Double => BranchTest::Double,
			RegularType::Bytes => BranchTest::Bytes,
			RegularType::String => BranchTest::String,
			RegularType::Fixed(_) => BranchTest::Fixed,
			RegularType::Array(_) => BranchTest::Array,
			RegularType::Map(_) => BranchTest::Map,
			RegularType::Record(record) => BranchTest::Record {
				fully_qualified_name: record.name.fully_qualified_name().to_owned(),
				name: record.name.name().to_owned(),
			},
			RegularType::Enum(_) => BranchTest::Enum,
			RegularType::Union(_) => unreachable!("nested unions are rejected by the build"),
		}
	}

	fn matches(&self, value: &Value) -> bool {
		match self {
			BranchTest::Boolean => matches!(value, Value::Boolean(_)),
			BranchTest::Int => matches!(value, Value::Int(_)),
			BranchTest::Long => matches!(value, Value::Long(_) | Value::Int(_)),
			BranchTest::Float => matches!(value, Value::Float(_)),
			BranchTest::Double => matches!(value, Value::Double(_) | Value::Float(_)),
			BranchTest::Bytes | BranchTest::Fixed => {
				matches!(value, Value::Bytes(_) | Value::Uuid(_))
			}
			BranchTest::String => matches!(value, Value::String(_) | Value::Uuid(_)),
			BranchTest::Array => matches!(value, Value::Array(_)),
			BranchTest::Map => matches!(value, Value::Map(_)),
			BranchTest::Record {
				fully_qualified_name,
				name,
			} => match value {
				Value::Record(record) => {
					record.name == *fully_qualified_name
						|| record.name == *name
						|| names_match(name, &record.name)
				}
				_ => false,
			},
			BranchTest::Enum => matches!(value, Value::Enum(_)),
			BranchTest::Decimal => matches!(value, Value::Decimal(_)),
			BranchTest::Date => matches!(value, Value::Date(_)),
			BranchTest::Time => matches!(value, Value::TimeSpan(_)),
			BranchTest::Timestamp => matches!(value, Value::DateTime(_)),
			BranchTest::Duration => {
				matches!(value, Value::Duration(_) | Value::TimeSpan(_))
			}
		}
	}
}
