use super::*;

use crate::types::names_match;

/// Handles `enum` schema nodes: a varint index into the declared symbol
/// list, mapped to the target at build time
///
/// For enumeration host types every symbol must resolve to a member; a
/// symbol without one falls back to the schema's declared default symbol's
/// member, and if that fails too the build is rejected.
pub(super) struct EnumCase;

impl DeserializerCase for EnumCase {
	fn name(&self) -> &'static str {
		"enum"
	}

	fn build(
		&self,
		_builder: &DeserializerBuilder,
		key: SchemaKey,
		ty: &TypeDescriptor,
		ctx: &mut BuildContext<'_>,
	) -> CaseResult<DePlan> {
		let RegularType::Enum(enum_) = &ctx.schema()[key].type_ else {
			return Ok(CaseOutcome::no_match("schema is not an enum"));
		};
		let per_symbol: Vec<String> = match ty.strip_optional().kind() {
			TypeKind::Enum(enum_type) => {
				let member_for = |symbol: &str| {
					enum_type
						.members
						.iter()
						.find(|member| names_match(symbol, member))
				};
				let default_member = enum_.default.as_deref().and_then(|symbol| member_for(symbol));
				enum_
					.symbols
					.iter()
					.map(|symbol| {
						member_for(symbol)
							.or(default_member)
							.cloned()
							.ok_or_else(|| {
								BuildError::unsupported_type(format_args!(
									"enum symbol {symbol:?} of {:?} matches no member of host \
										type {:?}, and the schema declares no usable default",
									enum_.name, enum_type.name
								))
							})
					})
					.collect::<Result<_, _>>()?
			}
			TypeKind::String | TypeKind::Dynamic => enum_.symbols.clone(),
			_ => {
				return Ok(CaseOutcome::NoMatch(
					format!("cannot deserialize an enum into host type {ty:?}").into(),
				))
			}
		};
		let as_string = matches!(ty.strip_optional().kind(), TypeKind::String);
		Ok(CaseOutcome::Built(Arc::new(move |reader| {
			let position = reader.position();
			let index: i64 = reader.read_varint()?;
			let resolved = usize::try_from(index)
				.ok()
				.and_then(|index| per_symbol.get(index))
				.ok_or_else(|| {
					DeError::invalid_encoding(
						position,
						format_args!(
							"enum index {index} is out of range (0..{})",
							per_symbol.len()
						),
					)
				})?;
			Ok(if as_string {
				Value::String(resolved.clone())
			} else {
				Value::Enum(resolved.clone())
			})
		})))
	}
}
