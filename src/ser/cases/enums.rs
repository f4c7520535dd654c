use super::*;

use crate::types::names_match;

use std::collections::HashMap;

/// Handles `enum` schema nodes: a varint index into the declared symbol
/// list
///
/// For enumeration host types the member↔symbol mapping is resolved at
/// build time, and every member must match exactly one symbol. For
/// string-valued hosts the plan is a switch on the string against the
/// declared symbols.
pub(super) struct EnumCase;

impl SerializerCase for EnumCase {
	fn name(&self) -> &'static str {
		"enum"
	}

	fn build(
		&self,
		_builder: &SerializerBuilder,
		key: SchemaKey,
		ty: &TypeDescriptor,
		ctx: &mut BuildContext<'_>,
	) -> CaseResult<SerPlan> {
		let RegularType::Enum(enum_) = &ctx.schema()[key].type_ else {
			return Ok(CaseOutcome::no_match("schema is not an enum"));
		};
		match ty.strip_optional().kind() {
			TypeKind::Enum(enum_type) => {
				let mut per_member = HashMap::with_capacity(enum_type.members.len());
				for member in &enum_type.members {
					let mut matching = enum_
						.symbols
						.iter()
						.enumerate()
						.filter(|(_, symbol)| names_match(symbol, member));
					let (index, _) = matching.next().ok_or_else(|| {
						BuildError::unsupported_type(format_args!(
							"enum member {member:?} of {:?} matches no symbol of {:?}",
							enum_type.name, enum_.name
						))
					})?;
					if matching.next().is_some() {
						return Err(BuildError::unsupported_type(format_args!(
							"enum member {member:?} of {:?} ambiguously matches \
								several symbols of {:?}",
							enum_type.name, enum_.name
						)));
					}
					per_member.insert(member.clone(), index as i64);
				}
				Ok(CaseOutcome::Built(Arc::new(move |value, state| {
					let member = match value {
						Value::Enum(member) => member,
						other => return Err(SerError::coercion("enum", other)),
					};
					let index = per_member.get(member).ok_or_else(|| {
						SerError::invalid_value(format_args!(
							"enum value {member:?} is outside the declared member set"
						))
					})?;
					state.write_long(*index)
				})))
			}
			TypeKind::String | TypeKind::Dynamic => {
				let per_symbol: HashMap<String, i64> = enum_
					.symbols
					.iter()
					.enumerate()
					.map(|(index, symbol)| (symbol.clone(), index as i64))
					.collect();
				Ok(CaseOutcome::Built(Arc::new(move |value, state| {
					let symbol = match value {
						Value::Enum(symbol) => symbol,
						Value::String(symbol) => symbol,
						other => return Err(SerError::coercion("enum", other)),
					};
					let index = per_symbol.get(symbol).ok_or_else(|| {
						SerError::invalid_value(format_args!(
							"enum value {symbol:?} is outside the declared symbol set"
						))
					})?;
					state.write_long(*index)
				})))
			}
			_ => Ok(CaseOutcome::NoMatch(
				format!("cannot serialize host type {ty:?} as an enum").into(),
			)),
		}
	}
}
