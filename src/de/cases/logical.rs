use super::*;

use crate::{convert::TimestampUnit, types::DurationParts};

use num_bigint::BigInt;

/// Handles nodes annotated with the `decimal` logical type: the wire bytes
/// are a two's-complement big-endian unscaled integer
pub(super) struct DecimalCase;

impl DeserializerCase for DecimalCase {
	fn name(&self) -> &'static str {
		"decimal"
	}

	fn build(
		&self,
		_builder: &DeserializerBuilder,
		key: SchemaKey,
		ty: &TypeDescriptor,
		ctx: &mut BuildContext<'_>,
	) -> CaseResult<DePlan> {
		let node = &ctx.schema()[key];
		let Some(LogicalType::Decimal(decimal)) = &node.logical_type else {
			return Ok(CaseOutcome::no_match("schema has no decimal logical type"));
		};
		let fixed_size = match &node.type_ {
			RegularType::Bytes => None,
			RegularType::Fixed(fixed) => Some(fixed.size),
			other => {
				return Err(BuildError::unsupported_schema(format_args!(
					"decimal logical type annotates {other:?}, only bytes or fixed are valid"
				)))
			}
		};
		let assemble = match convert::decimal_value(ty, decimal.scale) {
			Err(reason) => return Ok(CaseOutcome::NoMatch(reason)),
			Ok(assemble) => assemble,
		};
		Ok(CaseOutcome::Built(Arc::new(move |reader| {
			let len = match fixed_size {
				Some(size) => size,
				None => reader.read_len()?,
			};
			let unscaled = BigInt::from_signed_bytes_be(reader.read_slice(len)?);
			(*assemble)(unscaled)
		})))
	}
}

/// Handles nodes annotated with the `duration` logical type: 12 bytes
/// holding three little-endian unsigned 32-bit counts
pub(super) struct DurationCase;

impl DeserializerCase for DurationCase {
	fn name(&self) -> &'static str {
		"duration"
	}

	fn build(
		&self,
		_builder: &DeserializerBuilder,
		key: SchemaKey,
		ty: &TypeDescriptor,
		ctx: &mut BuildContext<'_>,
	) -> CaseResult<DePlan> {
		let node = &ctx.schema()[key];
		if !matches!(node.logical_type, Some(LogicalType::Duration)) {
			return Ok(CaseOutcome::no_match("schema has no duration logical type"));
		}
		match &node.type_ {
			RegularType::Fixed(fixed) if fixed.size == 12 => {}
			other => {
				return Err(BuildError::unsupported_schema(format_args!(
					"duration logical type annotates {other:?}, \
						only a fixed of size 12 is valid"
				)))
			}
		}
		let assemble = match convert::duration_value(ty) {
			Err(reason) => return Ok(CaseOutcome::NoMatch(reason)),
			Ok(assemble) => assemble,
		};
		Ok(CaseOutcome::Built(Arc::new(move |reader| {
			let buf = reader.read_const_size_buf::<12>()?;
			(*assemble)(DurationParts {
				months: u32::from_le_bytes(buf[0..4].try_into().expect("slice of length 4")),
				days: u32::from_le_bytes(buf[4..8].try_into().expect("slice of length 4")),
				millis: u32::from_le_bytes(buf[8..12].try_into().expect("slice of length 4")),
			})
		})))
	}
}

/// Handles nodes annotated with the `date` logical type
pub(super) struct DateCase;

impl DeserializerCase for DateCase {
	fn name(&self) -> &'static str {
		"date"
	}

	fn build(
		&self,
		_builder: &DeserializerBuilder,
		key: SchemaKey,
		ty: &TypeDescriptor,
		ctx: &mut BuildContext<'_>,
	) -> CaseResult<DePlan> {
		let node = &ctx.schema()[key];
		if !matches!(node.logical_type, Some(LogicalType::Date)) {
			return Ok(CaseOutcome::no_match("schema has no date logical type"));
		}
		if !matches!(node.type_, RegularType::Int) {
			return Err(BuildError::unsupported_schema(format_args!(
				"date logical type annotates {:?}, only int is valid",
				node.type_
			)));
		}
		Ok(match convert::date_value(ty) {
			Err(reason) => CaseOutcome::NoMatch(reason),
			Ok(assemble) => CaseOutcome::Built(Arc::new(move |reader| {
				(*assemble)(reader.read_varint::<i32>()?)
			})),
		})
	}
}

/// Handles nodes annotated with the `time-millis` and `time-micros`
/// logical types
pub(super) struct TimeCase;

impl DeserializerCase for TimeCase {
	fn name(&self) -> &'static str {
		"time"
	}

	fn build(
		&self,
		_builder: &DeserializerBuilder,
		key: SchemaKey,
		ty: &TypeDescriptor,
		ctx: &mut BuildContext<'_>,
	) -> CaseResult<DePlan> {
		let node = &ctx.schema()[key];
		match (&node.logical_type, &node.type_) {
			(Some(LogicalType::TimeMillis), RegularType::Int) => {
				Ok(match convert::time_millis_value(ty) {
					Err(reason) => CaseOutcome::NoMatch(reason),
					Ok(assemble) => CaseOutcome::Built(Arc::new(move |reader| {
						(*assemble)(reader.read_varint::<i32>()?)
					})),
				})
			}
			(Some(LogicalType::TimeMicros), RegularType::Long) => {
				Ok(match convert::time_micros_value(ty) {
					Err(reason) => CaseOutcome::NoMatch(reason),
					Ok(assemble) => CaseOutcome::Built(Arc::new(move |reader| {
						(*assemble)(reader.read_varint::<i64>()?)
					})),
				})
			}
			(Some(logical_type @ (LogicalType::TimeMillis | LogicalType::TimeMicros)), other) => {
				Err(BuildError::unsupported_schema(format_args!(
					"{} logical type annotates {other:?}, which is not its valid base type",
					logical_type.as_str()
				)))
			}
			_ => Ok(CaseOutcome::no_match("schema has no time logical type")),
		}
	}
}

/// Handles nodes annotated with the `timestamp-millis`, `timestamp-micros`
/// and `timestamp-nanos` logical types
pub(super) struct TimestampCase;

impl DeserializerCase for TimestampCase {
	fn name(&self) -> &'static str {
		"timestamp"
	}

	fn build(
		&self,
		_builder: &DeserializerBuilder,
		key: SchemaKey,
		ty: &TypeDescriptor,
		ctx: &mut BuildContext<'_>,
	) -> CaseResult<DePlan> {
		let node = &ctx.schema()[key];
		let unit = match node.logical_type {
			Some(LogicalType::TimestampMillis) => TimestampUnit::Millis,
			Some(LogicalType::TimestampMicros) => TimestampUnit::Micros,
			Some(LogicalType::TimestampNanos) => TimestampUnit::Nanos,
			_ => return Ok(CaseOutcome::no_match("schema has no timestamp logical type")),
		};
		if !matches!(node.type_, RegularType::Long) {
			return Err(BuildError::unsupported_schema(format_args!(
				"{} logical type annotates {:?}, only long is valid",
				unit.as_str(),
				node.type_
			)));
		}
		Ok(match convert::timestamp_value(ty, unit) {
			Err(reason) => CaseOutcome::NoMatch(reason),
			Ok(assemble) => CaseOutcome::Built(Arc::new(move |reader| {
				(*assemble)(reader.read_varint::<i64>()?)
			})),
		})
	}
}
