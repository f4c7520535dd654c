use super::*;

use std::{collections::HashMap, num::NonZeroUsize};

/// Read one block header
///
/// A positive count is the number of items in the block; a negative count
/// is its absolute value, followed by the block's byte length, which this
/// decoder reads and discards. A count of zero ends the sequence (`None`).
fn read_block_len(reader: &mut Reader<'_>) -> Result<Option<NonZeroUsize>, DeError> {
	let position = reader.position();
	let len: i64 = reader.read_varint()?;
	let res;
	if len < 0 {
		// res = -len, properly handling i64::MIN
		res = u64::from_ne_bytes(len.to_ne_bytes()).wrapping_neg();
		// The byte length of the block follows; it is not needed when
		// decoding items anyway, so it only has to advance the reader.
		// Decoding as u64 skips the zigzag step.
		let _: u64 = reader.read_varint()?;
	} else {
		res = len as u64;
	}
	res.try_into()
		.map(NonZeroUsize::new)
		.map_err(|_| {
			DeError::invalid_encoding(
				position,
				format_args!("invalid array or map block count in stream: {len}"),
			)
		})
}

/// Iterates the items of a block-framed sequence, reading block headers as
/// needed
pub(super) struct BlockReader<'r, 'de> {
	reader: &'r mut Reader<'de>,
	current_block_len: usize,
	n_read: usize,
	max_seq_size: usize,
}

impl<'r, 'de> BlockReader<'r, 'de> {
	pub(super) fn new(reader: &'r mut Reader<'de>, max_seq_size: usize) -> Self {
		Self {
			reader,
			current_block_len: 0,
			n_read: 0,
			max_seq_size,
		}
	}

	pub(super) fn has_more(&mut self) -> Result<bool, DeError> {
		self.current_block_len = match self.current_block_len.checked_sub(1) {
			None => match read_block_len(self.reader)? {
				None => return Ok(false),
				Some(new_len) => {
					let new_len = new_len.get();
					let n_read = self.n_read.saturating_add(new_len);
					if n_read > self.max_seq_size {
						return Err(DeError::invalid_value(
							"exceeding max sequence size while deserializing",
						));
					}
					self.n_read = n_read;
					new_len - 1
				}
			},
			Some(new_len) => new_len,
		};
		Ok(true)
	}

	pub(super) fn reader(&mut self) -> &mut Reader<'de> {
		self.reader
	}
}

/// Handles `array` schema nodes: loop the blocks, decode each item, and
/// collect into the intermediate array the target conversion consumes
pub(super) struct ArrayCase;

impl DeserializerCase for ArrayCase {
	fn name(&self) -> &'static str {
		"array"
	}

	fn build(
		&self,
		builder: &DeserializerBuilder,
		key: SchemaKey,
		ty: &TypeDescriptor,
		ctx: &mut BuildContext<'_>,
	) -> CaseResult<DePlan> {
		let RegularType::Array(array) = &ctx.schema()[key].type_ else {
			return Ok(CaseOutcome::no_match("schema is not an array"));
		};
		let items_key = array.items;
		let items_ty = match ty.strip_optional().kind() {
			TypeKind::Array(items) => items.clone(),
			TypeKind::Dynamic => ty.strip_optional().clone(),
			_ => {
				return Ok(CaseOutcome::NoMatch(
					format!("cannot deserialize an array into host type {ty:?}").into(),
				))
			}
		};
		let item_plan = builder.build_node(items_key, &items_ty, ctx)?;
		let max_seq_size = builder.max_seq_size;
		Ok(CaseOutcome::Built(Arc::new(move |reader| {
			let mut items = Vec::new();
			let mut blocks = BlockReader::new(reader, max_seq_size);
			while blocks.has_more()? {
				items.push((*item_plan)(blocks.reader())?);
			}
			Ok(Value::Array(items))
		})))
	}
}

/// Handles `map` schema nodes: same looping as arrays, with a
/// length-delimited string key before each value
pub(super) struct MapCase;

impl DeserializerCase for MapCase {
	fn name(&self) -> &'static str {
		"map"
	}

	fn build(
		&self,
		builder: &DeserializerBuilder,
		key: SchemaKey,
		ty: &TypeDescriptor,
		ctx: &mut BuildContext<'_>,
	) -> CaseResult<DePlan> {
		let RegularType::Map(map) = &ctx.schema()[key].type_ else {
			return Ok(CaseOutcome::no_match("schema is not a map"));
		};
		let values_key = map.values;
		let values_ty = match ty.strip_optional().kind() {
			TypeKind::Map(values) => values.clone(),
			TypeKind::Dynamic => ty.strip_optional().clone(),
			_ => {
				return Ok(CaseOutcome::NoMatch(
					format!("cannot deserialize a map into host type {ty:?}").into(),
				))
			}
		};
		let value_plan = builder.build_node(values_key, &values_ty, ctx)?;
		let max_seq_size = builder.max_seq_size;
		Ok(CaseOutcome::Built(Arc::new(move |reader| {
			let mut entries = HashMap::new();
			let mut blocks = BlockReader::new(reader, max_seq_size);
			while blocks.has_more()? {
				let reader = blocks.reader();
				let key_len = reader.read_len()?;
				let entry_key = reader.read_str(key_len)?.to_owned();
				let entry_value = (*value_plan)(reader)?;
				entries.insert(entry_key, entry_value);
			}
			Ok(Value::Map(entries))
		})))
	}
}
