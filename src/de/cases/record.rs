use super::*;

use crate::{
	de::{deferred_plan, skip},
	types::{names_match, Constructor, RecordType, RecordValue},
};

/// Handles `record` schema nodes
///
/// At build time the host type's materialization path is selected: either a
/// constructor whose parameters are all covered by schema fields or
/// defaults, or default construction plus member assignment. Schema fields
/// without a host counterpart still have to advance the reader, so they
/// compile to skip plans. Recursive records are indirected through a named
/// top-level binding, like on the serialization side.
pub(super) struct RecordCase;

impl DeserializerCase for RecordCase {
	fn name(&self) -> &'static str {
		"record"
	}

	fn build(
		&self,
		builder: &DeserializerBuilder,
		key: SchemaKey,
		ty: &TypeDescriptor,
		ctx: &mut BuildContext<'_>,
	) -> CaseResult<DePlan> {
		let RegularType::Record(record) = &ctx.schema()[key].type_ else {
			return Ok(CaseOutcome::no_match("schema is not a record"));
		};
		let ty = ty.strip_optional();
		if !matches!(ty.kind(), TypeKind::Record(_) | TypeKind::Dynamic) {
			return Ok(CaseOutcome::NoMatch(
				format!("cannot deserialize a record into host type {ty:?}").into(),
			));
		}

		let recursive = ctx.is_recursive(key);
		if recursive {
			if let Some(cell) = ctx.existing_de_binding(key, ty) {
				return Ok(CaseOutcome::Built(deferred_plan(cell)));
			}
		}
		let cell = recursive.then(|| {
			let name = format!(
				"deserialize_{}_{}",
				record.name.fully_qualified_name(),
				ctx.de_binding_count()
			);
			ctx.new_de_binding(name, key, ty)
		});

		let fields: Vec<_> = record
			.fields
			.iter()
			.map(|field| (field.name.clone(), field.type_))
			.collect();
		let record_fully_qualified_name = record.name.fully_qualified_name().to_owned();

		let plan = match ty.kind() {
			TypeKind::Record(record_type) => {
				// Make the in-progress descriptor resolvable by
				// RecursiveRef members while the fields are built
				ctx.push_type_scope(record_type.name.clone(), ty.clone());
				let plan = build_for_record_type(builder, record_type, &fields, ctx);
				ctx.pop_type_scope();
				plan?
			}
			TypeKind::Dynamic => {
				let dynamic = ty.clone();
				let mut field_plans = Vec::with_capacity(fields.len());
				for (field_name, field_key) in fields {
					field_plans.push((field_name, builder.build_node(field_key, &dynamic, ctx)?));
				}
				let plan: DePlan = Arc::new(move |reader| {
					let mut decoded = Vec::with_capacity(field_plans.len());
					for (field_name, field_plan) in &field_plans {
						decoded.push((field_name.clone(), (**field_plan)(reader)?));
					}
					Ok(Value::Record(RecordValue {
						name: record_fully_qualified_name.clone(),
						fields: decoded,
					}))
				});
				plan
			}
			_ => unreachable!("checked above"),
		};

		if let Some(cell) = cell {
			let _ = cell.set(plan.clone());
		}
		Ok(CaseOutcome::Built(plan))
	}
}

/// Per-schema-field action of a typed record plan
enum FieldAction {
	/// Decode the field and store it in the member slot
	Member(usize, DePlan),
	/// No host counterpart: decode to advance the reader, discard the value
	Skip(skip::SkipPlan),
}

fn build_for_record_type(
	builder: &DeserializerBuilder,
	record_type: &RecordType,
	fields: &[(String, crate::schema::SchemaKey)],
	ctx: &mut BuildContext<'_>,
) -> Result<DePlan, BuildError> {
	// Materialization path: (a) a constructor whose parameters all match
	// distinct schema fields or carry defaults, or (b) default construction
	// plus assignment of writable members.
	let constructor = record_type
		.constructors
		.iter()
		.find(|constructor| constructor_viable(constructor, fields));
	if constructor.is_none()
		&& !record_type.constructors.is_empty()
		&& !record_type
			.constructors
			.iter()
			.any(|constructor| constructor.parameters.is_empty())
	{
		return Err(BuildError::unsupported_type(format_args!(
			"no constructor of host type {:?} can be satisfied by the record's fields, \
				and it is not default-constructible",
			record_type.name
		)));
	}

	// A member is assignable if it backs a parameter of the selected
	// constructor, or if it is writable
	let member_assignable: Vec<bool> = record_type
		.members
		.iter()
		.map(|member| {
			member.writable
				|| constructor.is_some_and(|constructor| {
					constructor
						.parameters
						.iter()
						.any(|parameter| names_match(&parameter.name, &member.name))
				})
		})
		.collect();

	// Member defaults come from the selected constructor's parameters
	let mut member_defaults: Vec<Option<Value>> = vec![None; record_type.members.len()];
	if let Some(constructor) = constructor {
		for parameter in &constructor.parameters {
			if let Some(default) = &parameter.default {
				if let Some(member_index) = record_type
					.members
					.iter()
					.position(|member| names_match(&parameter.name, &member.name))
				{
					member_defaults[member_index] = Some(default.clone());
				}
			}
		}
	}

	let mut actions = Vec::with_capacity(fields.len());
	for (field_name, field_key) in fields {
		let member = record_type
			.members
			.iter()
			.enumerate()
			.find(|(index, member)| member.matches(field_name) && member_assignable[*index]);
		actions.push(match member {
			Some((member_index, member)) => {
				let member_ty = member.type_.clone();
				FieldAction::Member(member_index, builder.build_node(*field_key, &member_ty, ctx)?)
			}
			None => FieldAction::Skip(skip::build_skip(*field_key, ctx)?),
		});
	}

	let member_names: Vec<String> = record_type
		.members
		.iter()
		.map(|member| member.name.clone())
		.collect();
	let type_name = record_type.name.clone();
	Ok(Arc::new(move |reader| {
		let mut slots: Vec<Option<Value>> = vec![None; member_names.len()];
		for action in &actions {
			match action {
				FieldAction::Member(member_index, field_plan) => {
					slots[*member_index] = Some((**field_plan)(reader)?);
				}
				FieldAction::Skip(skip_plan) => (**skip_plan)(reader)?,
			}
		}
		let fields = member_names
			.iter()
			.zip(slots.iter_mut().zip(&member_defaults))
			.map(|(member_name, (slot, default))| {
				let value = slot
					.take()
					.or_else(|| default.clone())
					// The host-language default-initialization analogue
					.unwrap_or(Value::Null);
				(member_name.clone(), value)
			})
			.collect();
		Ok(Value::Record(RecordValue {
			name: type_name.clone(),
			fields,
		}))
	}))
}

/// Whether every parameter of the constructor matches a distinct schema
/// field or carries a default value
fn constructor_viable(
	constructor: &Constructor,
	fields: &[(String, crate::schema::SchemaKey)],
) -> bool {
	let mut taken = vec![false; fields.len()];
	constructor.parameters.iter().all(|parameter| {
		let matched = fields.iter().enumerate().find(|(index, (field_name, _))| {
			!taken[*index] && names_match(field_name, &parameter.name)
		});
		match matched {
			Some((index, _)) => {
				taken[index] = true;
				true
			}
			None => parameter.default.is_some(),
		}
	})
}
