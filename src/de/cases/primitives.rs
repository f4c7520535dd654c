use super::*;

/// Handles all the primitive schema nodes: the byte-codec read followed by
/// the coercion to the target type selected at build time
pub(super) struct PrimitiveCase;

impl DeserializerCase for PrimitiveCase {
	fn name(&self) -> &'static str {
		"primitive"
	}

	fn build(
		&self,
		_builder: &DeserializerBuilder,
		key: SchemaKey,
		ty: &TypeDescriptor,
		ctx: &mut BuildContext<'_>,
	) -> CaseResult<DePlan> {
		Ok(match &ctx.schema()[key].type_ {
			RegularType::Null => CaseOutcome::Built(Arc::new(|_reader| Ok(Value::Null))),
			RegularType::Boolean => match convert::boolean_value(ty) {
				Err(reason) => CaseOutcome::NoMatch(reason),
				Ok(assemble) => CaseOutcome::Built(Arc::new(move |reader| {
					(*assemble)(reader.read_bool()?)
				})),
			},
			RegularType::Int => match convert::int_value(ty) {
				Err(reason) => CaseOutcome::NoMatch(reason),
				Ok(assemble) => CaseOutcome::Built(Arc::new(move |reader| {
					(*assemble)(reader.read_varint::<i32>()?)
				})),
			},
			RegularType::Long => match convert::long_value(ty) {
				Err(reason) => CaseOutcome::NoMatch(reason),
				Ok(assemble) => CaseOutcome::Built(Arc::new(move |reader| {
					(*assemble)(reader.read_varint::<i64>()?)
				})),
			},
			RegularType::Float => match convert::float_value(ty) {
				Err(reason) => CaseOutcome::NoMatch(reason),
				Ok(assemble) => CaseOutcome::Built(Arc::new(move |reader| {
					(*assemble)(f32::from_le_bytes(reader.read_const_size_buf()?))
				})),
			},
			RegularType::Double => match convert::double_value(ty) {
				Err(reason) => CaseOutcome::NoMatch(reason),
				Ok(assemble) => CaseOutcome::Built(Arc::new(move |reader| {
					(*assemble)(f64::from_le_bytes(reader.read_const_size_buf()?))
				})),
			},
			RegularType::Bytes => match convert::bytes_value(ty) {
				Err(reason) => CaseOutcome::NoMatch(reason),
				Ok(assemble) => CaseOutcome::Built(Arc::new(move |reader| {
					let len = reader.read_len()?;
					(*assemble)(reader.read_slice(len)?)
				})),
			},
			RegularType::String => match convert::str_value(ty) {
				Err(reason) => CaseOutcome::NoMatch(reason),
				Ok(assemble) => CaseOutcome::Built(Arc::new(move |reader| {
					let len = reader.read_len()?;
					(*assemble)(reader.read_str(len)?)
				})),
			},
			RegularType::Fixed(fixed) => {
				let size = fixed.size;
				match convert::fixed_value(ty, size) {
					Err(reason) => CaseOutcome::NoMatch(reason),
					Ok(assemble) => CaseOutcome::Built(Arc::new(move |reader| {
						(*assemble)(reader.read_slice(size)?)
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
