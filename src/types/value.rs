use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};

/// Dynamic in-memory value
///
/// This is what plans read from and produce. Typed targets go through
/// [`HostValue`](super::HostValue), which converts to and from this
/// representation; "dynamic" targets ([`TypeDescriptor::dynamic`](super::TypeDescriptor::dynamic))
/// use it directly.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
	/// The `null` value
	Null,
	/// A `boolean`
	Boolean(bool),
	/// A 32-bit signed integer (`int`)
	Int(i32),
	/// A 64-bit signed integer (`long`)
	Long(i64),
	/// A 32-bit IEEE-754 float (`float`)
	Float(f32),
	/// A 64-bit IEEE-754 float (`double`)
	Double(f64),
	/// A byte sequence (`bytes` or `fixed`)
	Bytes(Vec<u8>),
	/// A unicode string (`string`)
	String(String),
	/// An array of values
	Array(Vec<Value>),
	/// A map of string keys to values
	Map(HashMap<String, Value>),
	/// A record value
	Record(RecordValue),
	/// An enum value, identified by symbol or host-side member name
	Enum(String),
	/// A universally unique identifier
	///
	/// Serializes to a `string` as canonical hyphenated text, or to a
	/// `fixed` of size 16 as big-endian bytes.
	Uuid(uuid::Uuid),
	/// A decimal number, for `decimal` logical types
	Decimal(rust_decimal::Decimal),
	/// A calendar date without time zone, for the `date` logical type
	Date(NaiveDate),
	/// An instant, for the `timestamp-*` logical types
	DateTime(DateTime<Utc>),
	/// A fixed-length span of time, for the `time-*` logical types and for
	/// `duration`s whose months component is zero
	TimeSpan(chrono::Duration),
	/// A `duration` as its raw months/days/milliseconds triple
	Duration(DurationParts),
}

impl Value {
	/// Name of the variant, for use in error messages
	pub fn kind_name(&self) -> &'static str {
		match self {
			Value::Null => "null",
			Value::Boolean(_) => "boolean",
			Value::Int(_) => "int",
			Value::Long(_) => "long",
			Value::Float(_) => "float",
			Value::Double(_) => "double",
			Value::Bytes(_) => "bytes",
			Value::String(_) => "string",
			Value::Array(_) => "array",
			Value::Map(_) => "map",
			Value::Record(_) => "record",
			Value::Enum(_) => "enum",
			Value::Uuid(_) => "uuid",
			Value::Decimal(_) => "decimal",
			Value::Date(_) => "date",
			Value::DateTime(_) => "date-time",
			Value::TimeSpan(_) => "time-span",
			Value::Duration(_) => "duration",
		}
	}
}

/// Component of a [`Value`]: a record with its name and ordered fields
#[derive(Clone, Debug, PartialEq)]
pub struct RecordValue {
	/// Name of the record type this value is an instance of
	///
	/// For values produced by a deserializer this is the schema record's
	/// fully qualified name (dynamic targets) or the host record type's name
	/// (typed targets). Union serialization dispatches record branches on it.
	pub name: String,
	/// The fields, in the order of the record type's members (typed targets)
	/// or of the schema's fields (dynamic targets)
	pub fields: Vec<(String, Value)>,
}

impl RecordValue {
	/// Build a [`RecordValue`] from a type name and `(field name, value)`
	/// pairs
	pub fn new<N: Into<String>>(
		name: impl Into<String>,
		fields: impl IntoIterator<Item = (N, Value)>,
	) -> Self {
		Self {
			name: name.into(),
			fields: fields
				.into_iter()
				.map(|(name, value)| (name.into(), value))
				.collect(),
		}
	}
}

/// The raw representation of an Avro `duration`: three unsigned 32-bit
/// counts. There is no defined conversion between months and any fixed
/// length of time, so this is the only host type that can represent every
/// wire duration.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DurationParts {
	/// Number of months
	pub months: u32,
	/// Number of days
	pub days: u32,
	/// Number of milliseconds
	pub millis: u32,
}

impl DurationParts {
	/// Build a [`DurationParts`] from the three raw counts
	pub fn new(months: u32, days: u32, millis: u32) -> Self {
		Self {
			months,
			days,
			millis,
		}
	}
}
