//! The conversion builder: coercions between host values and wire-natural
//! types
//!
//! For every schema there is a "wire-natural" intermediate type (a `long`
//! schema moves `i64`s, a `string` schema moves UTF-8, ...). The functions
//! in this module are called at plan-build time with the target
//! [`TypeDescriptor`] and either hand back a coercion closure for the plan
//! to embed, or a rejection reason that feeds the case list's
//! `NoMatch` chain.
//!
//! Runtime failures of a selected coercion are `Overflow` (information
//! would be lost) or `InvalidValue` (the value cannot be represented at
//! all).

use crate::{
	de::DeError,
	ser::SerError,
	types::{DurationParts, TypeDescriptor, TypeKind, Value},
};

use {
	chrono::{DateTime, Datelike, NaiveDate, Utc},
	num_bigint::BigInt,
	num_traits::cast::ToPrimitive,
	std::{borrow::Cow, sync::Arc},
};

/// Days between 0001-01-01 (the `chrono` "common era" origin) and the unix
/// epoch
const EPOCH_DAYS_FROM_CE: i32 = 719_163;

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1_000;

/// Why a coercion cannot be built for a given target type
pub(crate) type Rejection = Cow<'static, str>;

pub(crate) type Extract<T> = Arc<dyn Fn(&Value) -> Result<T, SerError> + Send + Sync>;
pub(crate) type StrExtract =
	Arc<dyn for<'v> Fn(&'v Value) -> Result<Cow<'v, str>, SerError> + Send + Sync>;
pub(crate) type BytesExtract =
	Arc<dyn for<'v> Fn(&'v Value) -> Result<Cow<'v, [u8]>, SerError> + Send + Sync>;
pub(crate) type Assemble<T> = Arc<dyn Fn(T) -> Result<Value, DeError> + Send + Sync>;
pub(crate) type StrAssemble = Arc<dyn Fn(&str) -> Result<Value, DeError> + Send + Sync>;
pub(crate) type BytesAssemble = Arc<dyn Fn(&[u8]) -> Result<Value, DeError> + Send + Sync>;

fn cannot(ty: &TypeDescriptor, wire: &str) -> Rejection {
	Cow::Owned(format!("cannot coerce host type {ty:?} to {wire}"))
}

pub(crate) fn to_boolean(ty: &TypeDescriptor) -> Result<Extract<bool>, Rejection> {
	match ty.strip_optional().kind() {
		TypeKind::Boolean | TypeKind::Dynamic => Ok(Arc::new(|value| match value {
			Value::Boolean(v) => Ok(*v),
			other => Err(SerError::coercion("boolean", other)),
		})),
		_ => Err(cannot(ty, "boolean")),
	}
}

pub(crate) fn to_int(ty: &TypeDescriptor) -> Result<Extract<i32>, Rejection> {
	match ty.strip_optional().kind() {
		TypeKind::Int | TypeKind::Long | TypeKind::Dynamic => Ok(Arc::new(|value| match value {
			Value::Int(v) => Ok(*v),
			Value::Long(v) => (*v).try_into().map_err(|_| {
				SerError::overflow(format_args!("value {v} does not fit in an int"))
			}),
			other => Err(SerError::coercion("int", other)),
		})),
		_ => Err(cannot(ty, "int")),
	}
}

pub(crate) fn to_long(ty: &TypeDescriptor) -> Result<Extract<i64>, Rejection> {
	match ty.strip_optional().kind() {
		TypeKind::Int | TypeKind::Long | TypeKind::Dynamic => Ok(Arc::new(|value| match value {
			Value::Int(v) => Ok((*v).into()),
			Value::Long(v) => Ok(*v),
			other => Err(SerError::coercion("long", other)),
		})),
		_ => Err(cannot(ty, "long")),
	}
}

pub(crate) fn to_float(ty: &TypeDescriptor) -> Result<Extract<f32>, Rejection> {
	match ty.strip_optional().kind() {
		TypeKind::Float | TypeKind::Double | TypeKind::Dynamic => {
			Ok(Arc::new(|value| match value {
				Value::Float(v) => Ok(*v),
				// Precision loss is accepted here: the schema is the
				// authority on the wire width
				Value::Double(v) => Ok(*v as f32),
				other => Err(SerError::coercion("float", other)),
			}))
		}
		_ => Err(cannot(ty, "float")),
	}
}

pub(crate) fn to_double(ty: &TypeDescriptor) -> Result<Extract<f64>, Rejection> {
	match ty.strip_optional().kind() {
		TypeKind::Float | TypeKind::Double | TypeKind::Dynamic => {
			Ok(Arc::new(|value| match value {
				Value::Float(v) => Ok((*v).into()),
				Value::Double(v) => Ok(*v),
				other => Err(SerError::coercion("double", other)),
			}))
		}
		_ => Err(cannot(ty, "double")),
	}
}

pub(crate) fn to_str(ty: &TypeDescriptor) -> Result<StrExtract, Rejection> {
	match ty.strip_optional().kind() {
		TypeKind::String
		| TypeKind::Uuid
		| TypeKind::Date
		| TypeKind::DateTime
		| TypeKind::TimeSpan
		| TypeKind::Enum(_)
		| TypeKind::Dynamic => Ok(Arc::new(|value| match value {
			Value::String(s) => Ok(Cow::Borrowed(&**s)),
			// An enum member under a string schema is written by its name
			Value::Enum(member) => Ok(Cow::Borrowed(&**member)),
			Value::Uuid(uuid) => Ok(Cow::Owned(uuid.hyphenated().to_string())),
			Value::Date(date) => Ok(Cow::Owned(date.format("%Y-%m-%d").to_string())),
			Value::DateTime(date_time) => Ok(Cow::Owned(date_time.to_rfc3339())),
			Value::TimeSpan(span) => Ok(Cow::Owned(format_xsd_duration(*span))),
			other => Err(SerError::coercion("string", other)),
		})),
		_ => Err(cannot(ty, "string")),
	}
}

pub(crate) fn to_bytes(ty: &TypeDescriptor) -> Result<BytesExtract, Rejection> {
	match ty.strip_optional().kind() {
		TypeKind::Bytes | TypeKind::String | TypeKind::Uuid | TypeKind::Dynamic => {
			Ok(Arc::new(|value| match value {
				Value::Bytes(bytes) => Ok(Cow::Borrowed(&**bytes)),
				Value::String(s) => Ok(Cow::Borrowed(s.as_bytes())),
				Value::Uuid(uuid) => Ok(Cow::Owned(uuid.as_bytes().to_vec())),
				other => Err(SerError::coercion("bytes", other)),
			}))
		}
		_ => Err(cannot(ty, "bytes")),
	}
}

/// Same as [`to_bytes`], but for `fixed` schemas: a UUID target requires the
/// declared size to be 16 (big-endian byte layout). The length check for
/// byte/string inputs stays with the caller, which knows the declared size.
pub(crate) fn to_fixed(ty: &TypeDescriptor, size: usize) -> Result<BytesExtract, Rejection> {
	if matches!(ty.strip_optional().kind(), TypeKind::Uuid) && size != 16 {
		return Err(Cow::Owned(format!(
			"uuid can only be serialized to a fixed of size 16, schema declares {size}"
		)));
	}
	to_bytes(ty)
}

pub(crate) fn to_decimal(ty: &TypeDescriptor) -> Result<Extract<rust_decimal::Decimal>, Rejection> {
	match ty.strip_optional().kind() {
		TypeKind::Decimal
		| TypeKind::Int
		| TypeKind::Long
		| TypeKind::Double
		| TypeKind::String
		| TypeKind::Dynamic => Ok(Arc::new(|value| match value {
			Value::Decimal(decimal) => Ok(*decimal),
			Value::Int(v) => Ok((*v).into()),
			Value::Long(v) => Ok((*v).into()),
			Value::Double(v) => num_traits::FromPrimitive::from_f64(*v).ok_or_else(|| {
				SerError::invalid_value(format_args!("double {v} cannot be converted to decimal"))
			}),
			Value::String(s) => s.parse().map_err(|parse_error| {
				SerError::invalid_value(format_args!(
					"string cannot be parsed as decimal: {parse_error}"
				))
			}),
			other => Err(SerError::coercion("decimal", other)),
		})),
		_ => Err(cannot(ty, "decimal")),
	}
}

pub(crate) fn to_date_days(ty: &TypeDescriptor) -> Result<Extract<i32>, Rejection> {
	match ty.strip_optional().kind() {
		TypeKind::Date | TypeKind::DateTime | TypeKind::Int | TypeKind::String
		| TypeKind::Dynamic => Ok(Arc::new(|value| {
			let date = match value {
				Value::Int(v) => return Ok(*v),
				Value::Date(date) => *date,
				Value::DateTime(date_time) => date_time.date_naive(),
				Value::String(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| {
					SerError::invalid_value(format_args!("string cannot be parsed as date: {e}"))
				})?,
				other => return Err(SerError::coercion("date", other)),
			};
			date.num_days_from_ce()
				.checked_sub(EPOCH_DAYS_FROM_CE)
				.ok_or_else(|| SerError::overflow("date is out of the encodable day range"))
		})),
		_ => Err(cannot(ty, "date")),
	}
}

pub(crate) fn to_time_millis(ty: &TypeDescriptor) -> Result<Extract<i32>, Rejection> {
	match ty.strip_optional().kind() {
		TypeKind::TimeSpan | TypeKind::Int | TypeKind::Dynamic => {
			Ok(Arc::new(|value| match value {
				Value::Int(v) => Ok(*v),
				Value::TimeSpan(span) => span.num_milliseconds().try_into().map_err(|_| {
					SerError::overflow("time-span's milliseconds do not fit in an int")
				}),
				other => Err(SerError::coercion("time-millis", other)),
			}))
		}
		_ => Err(cannot(ty, "time-millis")),
	}
}

pub(crate) fn to_time_micros(ty: &TypeDescriptor) -> Result<Extract<i64>, Rejection> {
	match ty.strip_optional().kind() {
		TypeKind::TimeSpan | TypeKind::Int | TypeKind::Long | TypeKind::Dynamic => {
			Ok(Arc::new(|value| match value {
				Value::Int(v) => Ok((*v).into()),
				Value::Long(v) => Ok(*v),
				Value::TimeSpan(span) => span.num_microseconds().ok_or_else(|| {
					SerError::overflow("time-span's microseconds do not fit in a long")
				}),
				other => Err(SerError::coercion("time-micros", other)),
			}))
		}
		_ => Err(cannot(ty, "time-micros")),
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum TimestampUnit {
	Millis,
	Micros,
	Nanos,
}

impl TimestampUnit {
	pub(crate) fn as_str(self) -> &'static str {
		match self {
			TimestampUnit::Millis => "timestamp-millis",
			TimestampUnit::Micros => "timestamp-micros",
			TimestampUnit::Nanos => "timestamp-nanos",
		}
	}

	fn from_date_time(self, date_time: &DateTime<Utc>) -> Result<i64, SerError> {
		match self {
			TimestampUnit::Millis => Ok(date_time.timestamp_millis()),
			TimestampUnit::Micros => Ok(date_time.timestamp_micros()),
			TimestampUnit::Nanos => date_time.timestamp_nanos_opt().ok_or_else(|| {
				SerError::overflow("date-time is out of the nanosecond-encodable range")
			}),
		}
	}

	fn to_date_time(self, offset: i64) -> Result<DateTime<Utc>, DeError> {
		match self {
			TimestampUnit::Millis => DateTime::from_timestamp_millis(offset),
			TimestampUnit::Micros => DateTime::from_timestamp_micros(offset),
			TimestampUnit::Nanos => Some(DateTime::from_timestamp_nanos(offset)),
		}
		.ok_or_else(|| {
			DeError::overflow(format_args!(
				"{} offset {offset} is out of the representable date-time range",
				self.as_str()
			))
		})
	}
}

pub(crate) fn to_timestamp(
	ty: &TypeDescriptor,
	unit: TimestampUnit,
) -> Result<Extract<i64>, Rejection> {
	match ty.strip_optional().kind() {
		TypeKind::DateTime | TypeKind::Int | TypeKind::Long | TypeKind::String
		| TypeKind::Dynamic => Ok(Arc::new(move |value| match value {
			Value::Int(v) => Ok((*v).into()),
			Value::Long(v) => Ok(*v),
			Value::DateTime(date_time) => unit.from_date_time(date_time),
			Value::String(s) => {
				let date_time = DateTime::parse_from_rfc3339(s).map_err(|e| {
					SerError::invalid_value(format_args!(
						"string cannot be parsed as date-time: {e}"
					))
				})?;
				unit.from_date_time(&date_time.with_timezone(&Utc))
			}
			other => Err(SerError::coercion(unit.as_str(), other)),
		})),
		_ => Err(cannot(ty, unit.as_str())),
	}
}

pub(crate) fn to_duration_parts(ty: &TypeDescriptor) -> Result<Extract<DurationParts>, Rejection> {
	match ty.strip_optional().kind() {
		TypeKind::Duration | TypeKind::TimeSpan | TypeKind::Dynamic => {
			Ok(Arc::new(|value| match value {
				Value::Duration(parts) => Ok(*parts),
				Value::TimeSpan(span) => {
					let total_millis = span.num_milliseconds();
					if total_millis < 0 {
						return Err(SerError::overflow(
							"negative time-span cannot be serialized as duration \
								(wire fields are unsigned)",
						));
					}
					let days = (total_millis / MILLIS_PER_DAY)
						.try_into()
						.map_err(|_| SerError::overflow("time-span's days do not fit in a u32"))?;
					let millis = (total_millis % MILLIS_PER_DAY) as u32;
					Ok(DurationParts {
						months: 0,
						days,
						millis,
					})
				}
				other => Err(SerError::coercion("duration", other)),
			}))
		}
		_ => Err(cannot(ty, "duration")),
	}
}

pub(crate) fn boolean_value(ty: &TypeDescriptor) -> Result<Assemble<bool>, Rejection> {
	match ty.strip_optional().kind() {
		TypeKind::Boolean | TypeKind::Dynamic => Ok(Arc::new(|v| Ok(Value::Boolean(v)))),
		_ => Err(cannot(ty, "boolean")),
	}
}

pub(crate) fn int_value(ty: &TypeDescriptor) -> Result<Assemble<i32>, Rejection> {
	match ty.strip_optional().kind() {
		TypeKind::Int | TypeKind::Dynamic => Ok(Arc::new(|v| Ok(Value::Int(v)))),
		TypeKind::Long => Ok(Arc::new(|v| Ok(Value::Long(v.into())))),
		_ => Err(cannot(ty, "int")),
	}
}

pub(crate) fn long_value(ty: &TypeDescriptor) -> Result<Assemble<i64>, Rejection> {
	match ty.strip_optional().kind() {
		TypeKind::Long | TypeKind::Dynamic => Ok(Arc::new(|v| Ok(Value::Long(v)))),
		TypeKind::Int => Ok(Arc::new(|v| {
			v.try_into().map(Value::Int).map_err(|_| {
				DeError::overflow(format_args!("decoded long {v} does not fit in an int"))
			})
		})),
		_ => Err(cannot(ty, "long")),
	}
}

pub(crate) fn float_value(ty: &TypeDescriptor) -> Result<Assemble<f32>, Rejection> {
	match ty.strip_optional().kind() {
		TypeKind::Float | TypeKind::Dynamic => Ok(Arc::new(|v| Ok(Value::Float(v)))),
		TypeKind::Double => Ok(Arc::new(|v| Ok(Value::Double(v.into())))),
		_ => Err(cannot(ty, "float")),
	}
}

pub(crate) fn double_value(ty: &TypeDescriptor) -> Result<Assemble<f64>, Rejection> {
	match ty.strip_optional().kind() {
		TypeKind::Double | TypeKind::Dynamic => Ok(Arc::new(|v| Ok(Value::Double(v)))),
		_ => Err(cannot(ty, "double")),
	}
}

pub(crate) fn str_value(ty: &TypeDescriptor) -> Result<StrAssemble, Rejection> {
	match ty.strip_optional().kind() {
		TypeKind::String | TypeKind::Dynamic => {
			Ok(Arc::new(|s| Ok(Value::String(s.to_owned()))))
		}
		TypeKind::Uuid => Ok(Arc::new(|s| {
			s.parse().map(Value::Uuid).map_err(|e| {
				DeError::invalid_value(format_args!("string cannot be parsed as uuid: {e}"))
			})
		})),
		TypeKind::Date => Ok(Arc::new(|s| {
			NaiveDate::parse_from_str(s, "%Y-%m-%d")
				.map(Value::Date)
				.map_err(|e| {
					DeError::invalid_value(format_args!("string cannot be parsed as date: {e}"))
				})
		})),
		TypeKind::DateTime => Ok(Arc::new(|s| {
			DateTime::parse_from_rfc3339(s)
				.map(|date_time| Value::DateTime(date_time.with_timezone(&Utc)))
				.map_err(|e| {
					DeError::invalid_value(format_args!(
						"string cannot be parsed as date-time: {e}"
					))
				})
		})),
		TypeKind::TimeSpan => Ok(Arc::new(|s| {
			parse_xsd_duration(s).map(Value::TimeSpan).ok_or_else(|| {
				DeError::invalid_value(format_args!(
					"string {s:?} cannot be parsed as a fixed-length duration"
				))
			})
		})),
		TypeKind::Enum(enum_type) => {
			let members = enum_type.members.clone();
			Ok(Arc::new(move |s| {
				members
					.iter()
					.find(|member| crate::types::names_match(s, member))
					.map(|member| Value::Enum(member.clone()))
					.ok_or_else(|| {
						DeError::invalid_value(format_args!(
							"string {s:?} matches no member of the target enum"
						))
					})
			}))
		}
		_ => Err(cannot(ty, "string")),
	}
}

pub(crate) fn bytes_value(ty: &TypeDescriptor) -> Result<BytesAssemble, Rejection> {
	match ty.strip_optional().kind() {
		TypeKind::Bytes | TypeKind::Dynamic => Ok(Arc::new(|bytes| Ok(Value::Bytes(bytes.to_vec())))),
		TypeKind::String => Ok(Arc::new(|bytes| {
			std::str::from_utf8(bytes)
				.map(|s| Value::String(s.to_owned()))
				.map_err(|e| {
					DeError::invalid_value(format_args!("bytes are not valid UTF-8: {e}"))
				})
		})),
		TypeKind::Uuid => Ok(Arc::new(|bytes| {
			uuid::Uuid::from_slice(bytes).map(Value::Uuid).map_err(|_| {
				DeError::invalid_value(format_args!(
					"byte sequence of length {} cannot be a uuid (16 bytes required)",
					bytes.len()
				))
			})
		})),
		_ => Err(cannot(ty, "bytes")),
	}
}

/// Same as [`bytes_value`], but for `fixed` schemas: a UUID target requires
/// the declared size to be 16.
pub(crate) fn fixed_value(ty: &TypeDescriptor, size: usize) -> Result<BytesAssemble, Rejection> {
	if matches!(ty.strip_optional().kind(), TypeKind::Uuid) && size != 16 {
		return Err(Cow::Owned(format!(
			"uuid can only be deserialized from a fixed of size 16, schema declares {size}"
		)));
	}
	bytes_value(ty)
}

pub(crate) fn decimal_value(
	ty: &TypeDescriptor,
	scale: u32,
) -> Result<Assemble<BigInt>, Rejection> {
	fn to_decimal(unscaled: BigInt, scale: u32) -> Result<rust_decimal::Decimal, DeError> {
		let mantissa = unscaled.to_i128().ok_or_else(|| {
			DeError::overflow("decimal's unscaled value does not fit in 128 bits")
		})?;
		rust_decimal::Decimal::try_from_i128_with_scale(mantissa, scale)
			.map_err(|e| DeError::overflow(format_args!("decimal cannot be represented: {e}")))
	}
	match ty.strip_optional().kind() {
		TypeKind::Decimal | TypeKind::Dynamic => Ok(Arc::new(move |unscaled| {
			to_decimal(unscaled, scale).map(Value::Decimal)
		})),
		TypeKind::Double => Ok(Arc::new(move |unscaled| {
			let decimal = to_decimal(unscaled, scale)?;
			decimal.to_f64().map(Value::Double).ok_or_else(|| {
				DeError::overflow("decimal cannot be converted to a double")
			})
		})),
		TypeKind::String => Ok(Arc::new(move |unscaled| {
			to_decimal(unscaled, scale).map(|decimal| Value::String(decimal.to_string()))
		})),
		TypeKind::Int | TypeKind::Long if scale == 0 => {
			let long = long_value(ty)?;
			Ok(Arc::new(move |unscaled| {
				let v = unscaled.to_i64().ok_or_else(|| {
					DeError::overflow("decimal's unscaled value does not fit in a long")
				})?;
				(*long)(v)
			}))
		}
		_ => Err(cannot(ty, "decimal")),
	}
}

pub(crate) fn date_value(ty: &TypeDescriptor) -> Result<Assemble<i32>, Rejection> {
	match ty.strip_optional().kind() {
		TypeKind::Date | TypeKind::Dynamic => Ok(Arc::new(|days| {
			days.checked_add(EPOCH_DAYS_FROM_CE)
				.and_then(NaiveDate::from_num_days_from_ce_opt)
				.map(Value::Date)
				.ok_or_else(|| {
					DeError::overflow(format_args!(
						"day offset {days} is out of the representable date range"
					))
				})
		})),
		TypeKind::Int => Ok(Arc::new(|days| Ok(Value::Int(days)))),
		TypeKind::String => {
			let date = date_value(&TypeDescriptor::date())?;
			Ok(Arc::new(move |days| match (*date)(days)? {
				Value::Date(d) => Ok(Value::String(d.format("%Y-%m-%d").to_string())),
				_ => unreachable!("date assembler produces dates"),
			}))
		}
		_ => Err(cannot(ty, "date")),
	}
}

pub(crate) fn time_millis_value(ty: &TypeDescriptor) -> Result<Assemble<i32>, Rejection> {
	match ty.strip_optional().kind() {
		TypeKind::TimeSpan | TypeKind::Dynamic => Ok(Arc::new(|millis| {
			Ok(Value::TimeSpan(chrono::Duration::milliseconds(
				millis.into(),
			)))
		})),
		TypeKind::Int => Ok(Arc::new(|millis| Ok(Value::Int(millis)))),
		_ => Err(cannot(ty, "time-millis")),
	}
}

pub(crate) fn time_micros_value(ty: &TypeDescriptor) -> Result<Assemble<i64>, Rejection> {
	match ty.strip_optional().kind() {
		TypeKind::TimeSpan | TypeKind::Dynamic => Ok(Arc::new(|micros| {
			Ok(Value::TimeSpan(chrono::Duration::microseconds(micros)))
		})),
		TypeKind::Long => Ok(Arc::new(|micros| Ok(Value::Long(micros)))),
		_ => Err(cannot(ty, "time-micros")),
	}
}

pub(crate) fn timestamp_value(
	ty: &TypeDescriptor,
	unit: TimestampUnit,
) -> Result<Assemble<i64>, Rejection> {
	match ty.strip_optional().kind() {
		TypeKind::DateTime | TypeKind::Dynamic => Ok(Arc::new(move |offset| {
			unit.to_date_time(offset).map(Value::DateTime)
		})),
		TypeKind::Long => Ok(Arc::new(|offset| Ok(Value::Long(offset)))),
		_ => Err(cannot(ty, unit.as_str())),
	}
}

pub(crate) fn duration_value(ty: &TypeDescriptor) -> Result<Assemble<DurationParts>, Rejection> {
	match ty.strip_optional().kind() {
		TypeKind::Duration | TypeKind::Dynamic => {
			Ok(Arc::new(|parts| Ok(Value::Duration(parts))))
		}
		TypeKind::TimeSpan => Ok(Arc::new(|parts| {
			if parts.months != 0 {
				// A month has no defined length without a reference date, so
				// this cannot be expressed as a fixed-length span
				return Err(DeError::overflow(format_args!(
					"duration with {} month(s) cannot be converted to a fixed-length time-span",
					parts.months
				)));
			}
			let total_millis =
				i64::from(parts.days) * MILLIS_PER_DAY + i64::from(parts.millis);
			Ok(Value::TimeSpan(chrono::Duration::milliseconds(total_millis)))
		})),
		_ => Err(cannot(ty, "duration")),
	}
}

/// Format a fixed-length span in the XSD `duration` lexical form, e.g.
/// `P1DT2H3M4.005S`
pub(crate) fn format_xsd_duration(span: chrono::Duration) -> String {
	let mut total_millis = span.num_milliseconds();
	let mut out = String::new();
	if total_millis < 0 {
		out.push('-');
		total_millis = -total_millis;
	}
	out.push('P');
	let days = total_millis / MILLIS_PER_DAY;
	let mut rest = total_millis % MILLIS_PER_DAY;
	if days != 0 {
		out.push_str(&days.to_string());
		out.push('D');
	}
	if rest != 0 || days == 0 {
		out.push('T');
		let hours = rest / 3_600_000;
		rest %= 3_600_000;
		let minutes = rest / 60_000;
		rest %= 60_000;
		let seconds = rest / 1_000;
		let millis = rest % 1_000;
		if hours != 0 {
			out.push_str(&hours.to_string());
			out.push('H');
		}
		if minutes != 0 {
			out.push_str(&minutes.to_string());
			out.push('M');
		}
		if millis != 0 {
			out.push_str(&format!("{seconds}.{millis:03}"));
			out.push('S');
		} else if seconds != 0 || (hours == 0 && minutes == 0) {
			out.push_str(&seconds.to_string());
			out.push('S');
		}
	}
	out
}

/// Parse the XSD `duration` lexical form into a fixed-length span
///
/// Returns `None` for malformed input and for durations carrying year or
/// month components, which have no fixed length.
pub(crate) fn parse_xsd_duration(s: &str) -> Option<chrono::Duration> {
	let (negative, s) = match s.strip_prefix('-') {
		Some(rest) => (true, rest),
		None => (false, s),
	};
	let s = s.strip_prefix('P')?;
	let (date_part, time_part) = match s.split_once('T') {
		Some((date_part, time_part)) => (date_part, Some(time_part)),
		None => (s, None),
	};
	let mut total_millis: i64 = 0;
	let mut rest = date_part;
	while !rest.is_empty() {
		let designator_idx = rest.find(|c: char| !c.is_ascii_digit())?;
		let count: i64 = rest[..designator_idx].parse().ok()?;
		match rest.as_bytes()[designator_idx] {
			b'D' => total_millis = total_millis.checked_add(count.checked_mul(MILLIS_PER_DAY)?)?,
			// Years and months have no fixed length
			_ => return None,
		}
		rest = &rest[designator_idx + 1..];
	}
	if let Some(time_part) = time_part {
		if time_part.is_empty() {
			return None;
		}
		let mut rest = time_part;
		while !rest.is_empty() {
			let designator_idx = rest.find(|c: char| !c.is_ascii_digit() && c != '.')?;
			let number = &rest[..designator_idx];
			let millis = match rest.as_bytes()[designator_idx] {
				b'H' => number.parse::<i64>().ok()?.checked_mul(3_600_000)?,
				b'M' => number.parse::<i64>().ok()?.checked_mul(60_000)?,
				b'S' => {
					let (seconds, fraction) = match number.split_once('.') {
						Some((seconds, fraction)) => (seconds, fraction),
						None => (number, ""),
					};
					let mut millis = seconds.parse::<i64>().ok()?.checked_mul(1_000)?;
					if !fraction.is_empty() {
						// Keep millisecond precision, which is what a span
						// can round-trip through this representation
						let mut fraction_millis = 0i64;
						for (i, digit) in fraction.bytes().enumerate() {
							if !digit.is_ascii_digit() {
								return None;
							}
							if i < 3 {
								fraction_millis = fraction_millis * 10
									+ i64::from(digit - b'0');
							}
						}
						for _ in fraction.len()..3 {
							fraction_millis *= 10;
						}
						millis = millis.checked_add(fraction_millis)?;
					}
					millis
				}
				_ => return None,
			};
			total_millis = total_millis.checked_add(millis)?;
			rest = &rest[designator_idx + 1..];
		}
	}
	if negative {
		total_millis = -total_millis;
	}
	Some(chrono::Duration::milliseconds(total_millis))
}
