use super::*;

/// Handles `array` schema nodes
///
/// The collection's size is known up front, so the items go out as a single
/// block with a positive count, followed by the terminating zero-count
/// block. Empty arrays still emit the terminator.
pub(super) struct ArrayCase;

impl SerializerCase for ArrayCase {
	fn name(&self) -> &'static str {
		"array"
	}

	fn build(
		&self,
		builder: &SerializerBuilder,
		key: SchemaKey,
		ty: &TypeDescriptor,
		ctx: &mut BuildContext<'_>,
	) -> CaseResult<SerPlan> {
		let RegularType::Array(array) = &ctx.schema()[key].type_ else {
			return Ok(CaseOutcome::no_match("schema is not an array"));
		};
		let items_key = array.items;
		let items_ty = match ty.strip_optional().kind() {
			TypeKind::Array(items) => items.clone(),
			TypeKind::Dynamic => ty.strip_optional().clone(),
			_ => {
				return Ok(CaseOutcome::NoMatch(
					format!("cannot serialize host type {ty:?} as an array").into(),
				))
			}
		};
		let item_plan = builder.build_node(items_key, &items_ty, ctx)?;
		Ok(CaseOutcome::Built(Arc::new(move |value, state| {
			let items = match value {
				Value::Array(items) => items,
				other => return Err(SerError::coercion("array", other)),
			};
			write_block(
				state,
				items.len(),
				items.iter(),
				&(|item: &Value, state: &mut SerializerState<'_>| (*item_plan)(item, state)),
			)
		})))
	}
}

/// Handles `map` schema nodes: same framing as arrays, with each item being
/// a length-delimited string key followed by the value
pub(super) struct MapCase;

impl SerializerCase for MapCase {
	fn name(&self) -> &'static str {
		"map"
	}

	fn build(
		&self,
		builder: &SerializerBuilder,
		key: SchemaKey,
		ty: &TypeDescriptor,
		ctx: &mut BuildContext<'_>,
	) -> CaseResult<SerPlan> {
		let RegularType::Map(map) = &ctx.schema()[key].type_ else {
			return Ok(CaseOutcome::no_match("schema is not a map"));
		};
		let values_key = map.values;
		let values_ty = match ty.strip_optional().kind() {
			TypeKind::Map(values) => values.clone(),
			TypeKind::Dynamic => ty.strip_optional().clone(),
			_ => {
				return Ok(CaseOutcome::NoMatch(
					format!("cannot serialize host type {ty:?} as a map").into(),
				))
			}
		};
		let value_plan = builder.build_node(values_key, &values_ty, ctx)?;
		Ok(CaseOutcome::Built(Arc::new(move |value, state| {
			let entries = match value {
				Value::Map(entries) => entries,
				other => return Err(SerError::coercion("map", other)),
			};
			write_block(
				state,
				entries.len(),
				entries.iter(),
				&(|(key, value): (&String, &Value), state: &mut SerializerState<'_>| {
					state.write_length_delimited(key.as_bytes())?;
					(*value_plan)(value, state)
				}),
			)
		})))
	}
}

/// Emit one block of `len` items followed by the terminating zero
///
/// `len` is queried exactly once by the callers; the iterator is fully
/// consumed unless an item write fails, in which case it is simply dropped.
fn write_block<I>(
	state: &mut SerializerState<'_>,
	len: usize,
	items: impl Iterator<Item = I>,
	item: &impl Fn(I, &mut SerializerState<'_>) -> Result<(), SerError>,
) -> Result<(), SerError> {
	if len > 0 {
		state.write_long(
			len.try_into()
				.map_err(|_| SerError::overflow("array or map len overflows i64"))?,
		)?;
		for i in items {
			item(i, state)?;
		}
	}
	state.write_long(0)
}
