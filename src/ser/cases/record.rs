use super::*;

use crate::{
	ser::deferred_plan,
	types::{names_match, RecordType},
};

/// Handles `record` schema nodes
///
/// Fields are written in schema declaration order; each schema field must
/// resolve to a host member at build time. Records marked recursive by the
/// recursion analysis are indirected through a named top-level binding so
/// that building terminates at the cycle.
pub(super) struct RecordCase;

impl SerializerCase for RecordCase {
	fn name(&self) -> &'static str {
		"record"
	}

	fn build(
		&self,
		builder: &SerializerBuilder,
		key: SchemaKey,
		ty: &TypeDescriptor,
		ctx: &mut BuildContext<'_>,
	) -> CaseResult<SerPlan> {
		let RegularType::Record(record) = &ctx.schema()[key].type_ else {
			return Ok(CaseOutcome::no_match("schema is not a record"));
		};
		let ty = ty.strip_optional();
		if !matches!(ty.kind(), TypeKind::Record(_) | TypeKind::Dynamic) {
			return Ok(CaseOutcome::NoMatch(
				format!("cannot serialize host type {ty:?} as a record").into(),
			));
		}

		let recursive = ctx.is_recursive(key);
		if recursive {
			if let Some(cell) = ctx.existing_ser_binding(key, ty) {
				return Ok(CaseOutcome::Built(deferred_plan(cell)));
			}
		}
		let cell = recursive.then(|| {
			let name = format!(
				"serialize_{}_{}",
				record.name.fully_qualified_name(),
				ctx.ser_binding_count()
			);
			ctx.new_ser_binding(name, key, ty)
		});

		let fields: Vec<_> = record
			.fields
			.iter()
			.map(|field| (field.name.clone(), field.type_))
			.collect();

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
				let plan: SerPlan = Arc::new(move |value, state| {
					let record = match value {
						Value::Record(record) => record,
						other => return Err(SerError::coercion("record", other)),
					};
					for (field_name, field_plan) in &field_plans {
						// Exact name first, canonical match as fallback
						let field_value = record
							.fields
							.iter()
							.find(|(name, _)| name == field_name)
							.or_else(|| {
								record
									.fields
									.iter()
									.find(|(name, _)| names_match(field_name, name))
							});
						let (_, field_value) = field_value.ok_or_else(|| {
							SerError::invalid_value(format_args!(
								"record value {:?} is missing field {field_name:?}",
								record.name
							))
						})?;
						(**field_plan)(field_value, state)?;
					}
					Ok(())
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

fn build_for_record_type(
	builder: &SerializerBuilder,
	record_type: &RecordType,
	fields: &[(String, crate::schema::SchemaKey)],
	ctx: &mut BuildContext<'_>,
) -> Result<SerPlan, BuildError> {
	let mut field_plans = Vec::with_capacity(fields.len());
	for (field_name, field_key) in fields {
		let Some((member_index, member)) = record_type
			.members
			.iter()
			.enumerate()
			.find(|(_, member)| member.matches(field_name))
		else {
			return Err(BuildError::unsupported_type(format_args!(
				"record field {field_name:?} has no matching member on host type {:?}",
				record_type.name
			)));
		};
		let member_ty = member.type_.clone();
		field_plans.push((member_index, builder.build_node(*field_key, &member_ty, ctx)?));
	}
	let member_count = record_type.members.len();
	Ok(Arc::new(move |value, state| {
		let record = match value {
			Value::Record(record) => record,
			other => return Err(SerError::coercion("record", other)),
		};
		if record.fields.len() != member_count {
			return Err(SerError::invalid_value(format_args!(
				"record value {:?} has {} field(s), its type descriptor declares {member_count}",
				record.name,
				record.fields.len()
			)));
		}
		for (member_index, field_plan) in &field_plans {
			(**field_plan)(&record.fields[*member_index].1, state)?;
		}
		Ok(())
	}))
}
