use super::*;

use crate::convert::TimestampUnit;

use num_bigint::BigInt;

/// How a decimal's unscaled integer lands on the wire
#[derive(Clone, Copy)]
enum DecimalRepr {
	Bytes,
	Fixed(usize),
}

/// Handles nodes annotated with the `decimal` logical type
///
/// The unscaled value (`value * 10^scale`) is written as a two's-complement
/// big-endian integer, length-delimited over `bytes` and sign-extended to
/// the declared size over `fixed`.
pub(super) struct DecimalCase;

impl SerializerCase for DecimalCase {
	fn name(&self) -> &'static str {
		"decimal"
	}

	fn build(
		&self,
		_builder: &SerializerBuilder,
		key: SchemaKey,
		ty: &TypeDescriptor,
		ctx: &mut BuildContext<'_>,
	) -> CaseResult<SerPlan> {
		let node = &ctx.schema()[key];
		let Some(LogicalType::Decimal(decimal)) = &node.logical_type else {
			return Ok(CaseOutcome::no_match("schema has no decimal logical type"));
		};
		let repr = match &node.type_ {
			RegularType::Bytes => DecimalRepr::Bytes,
			RegularType::Fixed(fixed) => DecimalRepr::Fixed(fixed.size),
			other => {
				return Err(BuildError::unsupported_schema(format_args!(
					"decimal logical type annotates {other:?}, only bytes or fixed are valid"
				)))
			}
		};
		let extract = match convert::to_decimal(ty) {
			Err(reason) => return Ok(CaseOutcome::NoMatch(reason)),
			Ok(extract) => extract,
		};
		let scale = decimal.scale;
		Ok(CaseOutcome::Built(Arc::new(move |value, state| {
			let mut decimal = (*extract)(value)?;
			decimal.rescale(scale);
			if decimal.scale() != scale {
				return Err(SerError::overflow(format_args!(
					"decimal cannot be rescaled to the schema scale of {scale} \
						without losing information"
				)));
			}
			let unscaled = BigInt::from(decimal.mantissa());
			let bytes = unscaled.to_signed_bytes_be();
			match repr {
				DecimalRepr::Bytes => state.write_length_delimited(&bytes),
				DecimalRepr::Fixed(size) => {
					if bytes.len() > size {
						return Err(SerError::overflow(format_args!(
							"decimal's unscaled value requires {} byte(s), \
								fixed schema only holds {size}",
							bytes.len()
						)));
					}
					// Sign-extend up to the declared size
					let fill = if bytes.first().is_some_and(|&b| b & 0x80 != 0) {
						0xFF
					} else {
						0x00
					};
					for _ in bytes.len()..size {
						state.write_raw(&[fill])?;
					}
					state.write_raw(&bytes)
				}
			}
		})))
	}
}

/// Handles nodes annotated with the `duration` logical type: a `fixed` of
/// size 12 holding three little-endian unsigned 32-bit counts
pub(super) struct DurationCase;

impl SerializerCase for DurationCase {
	fn name(&self) -> &'static str {
		"duration"
	}

	fn build(
		&self,
		_builder: &SerializerBuilder,
		key: SchemaKey,
		ty: &TypeDescriptor,
		ctx: &mut BuildContext<'_>,
	) -> CaseResult<SerPlan> {
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
		let extract = match convert::to_duration_parts(ty) {
			Err(reason) => return Ok(CaseOutcome::NoMatch(reason)),
			Ok(extract) => extract,
		};
		Ok(CaseOutcome::Built(Arc::new(move |value, state| {
			let parts = (*extract)(value)?;
			let mut buf = [0u8; 12];
			buf[0..4].copy_from_slice(&parts.months.to_le_bytes());
			buf[4..8].copy_from_slice(&parts.days.to_le_bytes());
			buf[8..12].copy_from_slice(&parts.millis.to_le_bytes());
			state.write_raw(&buf)
		})))
	}
}

/// Handles nodes annotated with the `date` logical type: an `int` holding
/// the day offset from 1970-01-01
pub(super) struct DateCase;

impl SerializerCase for DateCase {
	fn name(&self) -> &'static str {
		"date"
	}

	fn build(
		&self,
		_builder: &SerializerBuilder,
		key: SchemaKey,
		ty: &TypeDescriptor,
		ctx: &mut BuildContext<'_>,
	) -> CaseResult<SerPlan> {
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
		Ok(match convert::to_date_days(ty) {
			Err(reason) => CaseOutcome::NoMatch(reason),
			Ok(extract) => CaseOutcome::Built(Arc::new(move |value, state| {
				state.write_int((*extract)(value)?)
			})),
		})
	}
}

/// Handles nodes annotated with the `time-millis` (over `int`) and
/// `time-micros` (over `long`) logical types: the offset from midnight
pub(super) struct TimeCase;

impl SerializerCase for TimeCase {
	fn name(&self) -> &'static str {
		"time"
	}

	fn build(
		&self,
		_builder: &SerializerBuilder,
		key: SchemaKey,
		ty: &TypeDescriptor,
		ctx: &mut BuildContext<'_>,
	) -> CaseResult<SerPlan> {
		let node = &ctx.schema()[key];
		match (&node.logical_type, &node.type_) {
			(Some(LogicalType::TimeMillis), RegularType::Int) => {
				Ok(match convert::to_time_millis(ty) {
					Err(reason) => CaseOutcome::NoMatch(reason),
					Ok(extract) => CaseOutcome::Built(Arc::new(move |value, state| {
						state.write_int((*extract)(value)?)
					})),
				})
			}
			(Some(LogicalType::TimeMicros), RegularType::Long) => {
				Ok(match convert::to_time_micros(ty) {
					Err(reason) => CaseOutcome::NoMatch(reason),
					Ok(extract) => CaseOutcome::Built(Arc::new(move |value, state| {
						state.write_long((*extract)(value)?)
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
/// and `timestamp-nanos` logical types: a `long` offset from the epoch
pub(super) struct TimestampCase;

impl SerializerCase for TimestampCase {
	fn name(&self) -> &'static str {
		"timestamp"
	}

	fn build(
		&self,
		_builder: &SerializerBuilder,
		key: SchemaKey,
		ty: &TypeDescriptor,
		ctx: &mut BuildContext<'_>,
	) -> CaseResult<SerPlan> {
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
		Ok(match convert::to_timestamp(ty, unit) {
			Err(reason) => CaseOutcome::NoMatch(reason),
			Ok(extract) => CaseOutcome::Built(Arc::new(move |value, state| {
				state.write_long((*extract)(value)?)
			})),
		})
	}
}
