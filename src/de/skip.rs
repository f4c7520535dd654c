//! Skip plans: decode only to advance the reader
//!
//! A skip plan consumes exactly the bytes one value of its schema occupies
//! and produces nothing. The deserializer uses them for record fields that
//! have no counterpart on the host type. Skipping is closed-form per schema
//! kind and independent of the target type, so skip plans are memoized per
//! schema node; blocks that advertise their byte length are skipped in one
//! bounds check instead of per-item decoding.

use super::{DeError, Reader};

use crate::{
	build::{BuildContext, BuildError},
	schema::{RegularType, SchemaKey},
};

use std::sync::{Arc, OnceLock};

/// A compiled skip plan for one schema node
pub(crate) type SkipPlan = Arc<dyn Fn(&mut Reader<'_>) -> Result<(), DeError> + Send + Sync>;

/// Build the skip plan for one schema node
pub(crate) fn build_skip(key: SchemaKey, ctx: &mut BuildContext<'_>) -> Result<SkipPlan, BuildError> {
	Ok(match &ctx.schema()[key].type_ {
		RegularType::Null => Arc::new(|_reader| Ok(())),
		RegularType::Boolean => Arc::new(|reader| reader.advance(1)),
		// Zigzag is irrelevant when the value is discarded; decoding as u64
		// consumes the same bytes
		RegularType::Int | RegularType::Long => Arc::new(|reader| {
			let _: u64 = reader.read_varint()?;
			Ok(())
		}),
		RegularType::Float => Arc::new(|reader| reader.advance(4)),
		RegularType::Double => Arc::new(|reader| reader.advance(8)),
		RegularType::Bytes | RegularType::String => Arc::new(|reader| {
			let len = reader.read_len()?;
			reader.advance(len)
		}),
		RegularType::Fixed(fixed) => {
			let size = fixed.size;
			Arc::new(move |reader| reader.advance(size))
		}
		RegularType::Enum(_) => Arc::new(|reader| {
			let _: u64 = reader.read_varint()?;
			Ok(())
		}),
		RegularType::Array(array) => {
			let item_skip = build_skip(array.items, ctx)?;
			skip_blocks(move |reader| (*item_skip)(reader))
		}
		RegularType::Map(map) => {
			let value_skip = build_skip(map.values, ctx)?;
			skip_blocks(move |reader| {
				let key_len = reader.read_len()?;
				reader.advance(key_len)?;
				(*value_skip)(reader)
			})
		}
		RegularType::Union(union) => {
			if union.variants.is_empty() {
				return Err(BuildError::unsupported_schema("union has no branches"));
			}
			let variants = union.variants.clone();
			let mut branch_skips = Vec::with_capacity(variants.len());
			for &variant_key in &variants {
				branch_skips.push(build_skip(variant_key, ctx)?);
			}
			Arc::new(move |reader| {
				let position = reader.position();
				let index: i64 = reader.read_varint()?;
				let branch_skip = usize::try_from(index)
					.ok()
					.and_then(|index| branch_skips.get(index))
					.ok_or_else(|| {
						DeError::invalid_encoding(
							position,
							format_args!(
								"union index {index} is out of range (0..{})",
								branch_skips.len()
							),
						)
					})?;
				(**branch_skip)(reader)
			})
		}
		RegularType::Record(record) => {
			let recursive = ctx.is_recursive(key);
			if recursive {
				if let Some(cell) = ctx.existing_skip_binding(key) {
					return Ok(deferred_skip_plan(cell));
				}
			}
			let cell = recursive.then(|| {
				let name = format!("skip_{}", record.name.fully_qualified_name());
				ctx.new_skip_binding(name, key)
			});
			let field_keys: Vec<_> = record.fields.iter().map(|field| field.type_).collect();
			let mut field_skips = Vec::with_capacity(field_keys.len());
			for field_key in field_keys {
				field_skips.push(build_skip(field_key, ctx)?);
			}
			let plan: SkipPlan = Arc::new(move |reader| {
				for field_skip in &field_skips {
					(**field_skip)(reader)?;
				}
				Ok(())
			});
			if let Some(cell) = cell {
				let _ = cell.set(plan.clone());
			}
			plan
		}
	})
}

/// Loop block headers, skipping items
///
/// A negative count advertises the block's byte length, so the whole block
/// is skipped without touching its items. The byte-length varint is read
/// exactly once per such block, before any item would be decoded.
fn skip_blocks(
	skip_item: impl Fn(&mut Reader<'_>) -> Result<(), DeError> + Send + Sync + 'static,
) -> SkipPlan {
	Arc::new(move |reader| {
		loop {
			let count: i64 = reader.read_varint()?;
			if count == 0 {
				return Ok(());
			}
			if count < 0 {
				// The absolute value is the item count, but the byte length
				// that follows makes it unnecessary to look at the items
				let byte_len = reader.read_len()?;
				reader.advance(byte_len)?;
				continue;
			}
			for _ in 0..count {
				skip_item(reader)?;
			}
		}
	})
}

/// The skip twin of [`deferred_plan`](super::deferred_plan)
fn deferred_skip_plan(cell: &Arc<OnceLock<SkipPlan>>) -> SkipPlan {
	let cell = Arc::downgrade(cell);
	Arc::new(move |reader| {
		let cell = cell
			.upgrade()
			.expect("binding cells are owned by the deserializer invoking the plan");
		// Only reachable if a context that saw a failed build was reused
		let plan = cell.get().ok_or_else(|| {
			DeError::invalid_value(
				"recursive binding was never initialized; \
					its build failed and the build context was reused",
			)
		})?;
		(**plan)(reader)
	})
}
