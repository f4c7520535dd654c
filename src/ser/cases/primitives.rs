use super::*;

/// Handles all the primitive schema nodes: `null`, `boolean`, `int`,
/// `long`, `float`, `double`, `bytes`, `string` and `fixed`
///
/// The coercion from the host type to the wire-natural type is selected at
/// build time; the plan is a single coercion + byte-codec write.
pub(super) struct PrimitiveCase;

impl SerializerCase for PrimitiveCase {
	fn name(&self) -> &'static str {
		"primitive"
	}

	fn build(
		&self,
		_builder: &SerializerBuilder,
		key: SchemaKey,
		ty: &TypeDescriptor,
		ctx: &mut BuildContext<'_>,
	) -> CaseResult<SerPlan> {
		Ok(match &ctx.schema()[key].type_ {
			RegularType::Null => CaseOutcome::Built(Arc::new(|value, _state| match value {
				Value::Null => Ok(()),
				other => Err(SerError::coercion("null", other)),
			})),
			RegularType::Boolean => match convert::to_boolean(ty) {
				Err(reason) => CaseOutcome::NoMatch(reason),
				Ok(extract) => CaseOutcome::Built(Arc::new(move |value, state| {
					state.write_boolean((*extract)(value)?)
				})),
			},
			RegularType::Int => match convert::to_int(ty) {
				Err(reason) => CaseOutcome::NoMatch(reason),
				Ok(extract) => CaseOutcome::Built(Arc::new(move |value, state| {
					state.write_int((*extract)(value)?)
				})),
			},
			RegularType::Long => match convert::to_long(ty) {
				Err(reason) => CaseOutcome::NoMatch(reason),
				Ok(extract) => CaseOutcome::Built(Arc::new(move |value, state| {
					state.write_long((*extract)(value)?)
				})),
			},
			RegularType::Float => match convert::to_float(ty) {
				Err(reason) => CaseOutcome::NoMatch(reason),
				Ok(extract) => CaseOutcome::Built(Arc::new(move |value, state| {
					state.write_float((*extract)(value)?)
				})),
			},
			RegularType::Double => match convert::to_double(ty) {
				Err(reason) => CaseOutcome::NoMatch(reason),
				Ok(extract) => CaseOutcome::Built(Arc::new(move |value, state| {
					state.write_double((*extract)(value)?)
				})),
			},
			RegularType::Bytes => match convert::to_bytes(ty) {
				Err(reason) => CaseOutcome::NoMatch(reason),
				Ok(extract) => CaseOutcome::Built(Arc::new(move |value, state| {
					state.write_length_delimited(&(*extract)(value)?)
				})),
			},
			RegularType::String => match convert::to_str(ty) {
				Err(reason) => CaseOutcome::NoMatch(reason),
				Ok(extract) => CaseOutcome::Built(Arc::new(move |value, state| {
					state.write_length_delimited((*extract)(value)?.as_bytes())
				})),
			},
			RegularType::Fixed(fixed) => {
				let size = fixed.size;
				match convert::to_fixed(ty, size) {
					Err(reason) => CaseOutcome::NoMatch(reason),
					Ok(extract) => CaseOutcome::Built(Arc::new(move |value, state| {
						let bytes = (*extract)(value)?;
						if bytes.len() != size {
							return Err(SerError::overflow(format_args!(
								"fixed schema requires exactly {size} byte(s), value has {}",
								bytes.len()
							)));
						}
						state.write_raw(&bytes)
					})),
				}
			}
			RegularType::Array(_)
			| RegularType::Map(_)
			| RegularType::Union(_)
			| RegularType::Record(_)
			| RegularType::Enum(_) => CaseOutcome::no_match("schema is not a primitive"),
		})
	}
}
