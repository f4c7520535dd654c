use super::{DurationParts, TypeDescriptor, Value};

use crate::de::DeError;

use std::collections::HashMap;

/// A Rust type with a known [`TypeDescriptor`] and [`Value`] representation
///
/// This is the seam behind the typed entry points
/// ([`build_serializer`](crate::build_serializer) /
/// [`build_deserializer`](crate::build_deserializer)): the descriptor drives
/// plan building and the two conversion functions move values across the
/// boundary.
///
/// Implementations are provided for the types with an obvious wire-natural
/// mapping. Record and enumeration host types implement it by hand,
/// describing their members in the descriptor and converting through
/// [`Value::Record`] / [`Value::Enum`].
pub trait HostValue: Sized {
	/// The descriptor plan building uses for this type
	///
	/// Called once per build; the resulting descriptor's identity keys the
	/// build memo, so implementations should not need to be pure, merely
	/// cheap.
	fn type_descriptor() -> TypeDescriptor;
	/// Convert to the dynamic representation
	fn to_value(&self) -> Value;
	/// Convert back from the dynamic representation
	fn from_value(value: Value) -> Result<Self, DeError>;
}

fn mismatch(expected: &'static str, got: &Value) -> DeError {
	DeError::invalid_value(format_args!(
		"expected {expected} value, got {}",
		got.kind_name()
	))
}

macro_rules! impl_host_value_for_copy_primitives {
	($($ty:ty => $descriptor:ident, $variant:ident, $expected:literal;)*) => {
		$(
			impl HostValue for $ty {
				fn type_descriptor() -> TypeDescriptor {
					TypeDescriptor::$descriptor()
				}
				fn to_value(&self) -> Value {
					Value::$variant(*self)
				}
				fn from_value(value: Value) -> Result<Self, DeError> {
					match value {
						Value::$variant(v) => Ok(v),
						ref other => Err(mismatch($expected, other)),
					}
				}
			}
		)*
	};
}
impl_host_value_for_copy_primitives! {
	bool => boolean, Boolean, "boolean";
	f32 => float, Float, "float";
	f64 => double, Double, "double";
	uuid::Uuid => uuid, Uuid, "uuid";
	rust_decimal::Decimal => decimal, Decimal, "decimal";
	chrono::NaiveDate => date, Date, "date";
	chrono::DateTime<chrono::Utc> => date_time, DateTime, "date-time";
	chrono::Duration => time_span, TimeSpan, "time-span";
	DurationParts => duration, Duration, "duration";
}

impl HostValue for i32 {
	fn type_descriptor() -> TypeDescriptor {
		TypeDescriptor::int()
	}
	fn to_value(&self) -> Value {
		Value::Int(*self)
	}
	fn from_value(value: Value) -> Result<Self, DeError> {
		match value {
			Value::Int(v) => Ok(v),
			Value::Long(v) => v
				.try_into()
				.map_err(|_| DeError::overflow(format_args!("value {v} does not fit in an i32"))),
			ref other => Err(mismatch("int", other)),
		}
	}
}

impl HostValue for i64 {
	fn type_descriptor() -> TypeDescriptor {
		TypeDescriptor::long()
	}
	fn to_value(&self) -> Value {
		Value::Long(*self)
	}
	fn from_value(value: Value) -> Result<Self, DeError> {
		match value {
			Value::Long(v) => Ok(v),
			Value::Int(v) => Ok(v.into()),
			ref other => Err(mismatch("long", other)),
		}
	}
}

impl HostValue for String {
	fn type_descriptor() -> TypeDescriptor {
		TypeDescriptor::string()
	}
	fn to_value(&self) -> Value {
		Value::String(self.clone())
	}
	fn from_value(value: Value) -> Result<Self, DeError> {
		match value {
			Value::String(s) => Ok(s),
			ref other => Err(mismatch("string", other)),
		}
	}
}

/// Byte-sequence newtype for the typed entry points
///
/// `Vec<u8>` can't implement [`HostValue`] as a byte sequence without
/// overlapping the generic `Vec<T>` array impl, so bytes targets wrap their
/// buffer in this.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ByteBuf(pub Vec<u8>);

impl HostValue for ByteBuf {
	fn type_descriptor() -> TypeDescriptor {
		TypeDescriptor::bytes()
	}
	fn to_value(&self) -> Value {
		Value::Bytes(self.0.clone())
	}
	fn from_value(value: Value) -> Result<Self, DeError> {
		match value {
			Value::Bytes(bytes) => Ok(ByteBuf(bytes)),
			ref other => Err(mismatch("bytes", other)),
		}
	}
}

impl<T: HostValue> HostValue for Option<T> {
	fn type_descriptor() -> TypeDescriptor {
		TypeDescriptor::optional(T::type_descriptor())
	}
	fn to_value(&self) -> Value {
		match self {
			None => Value::Null,
			Some(inner) => inner.to_value(),
		}
	}
	fn from_value(value: Value) -> Result<Self, DeError> {
		match value {
			Value::Null => Ok(None),
			other => T::from_value(other).map(Some),
		}
	}
}

impl<T: HostValue> HostValue for Vec<T> {
	fn type_descriptor() -> TypeDescriptor {
		TypeDescriptor::array(T::type_descriptor())
	}
	fn to_value(&self) -> Value {
		Value::Array(self.iter().map(T::to_value).collect())
	}
	fn from_value(value: Value) -> Result<Self, DeError> {
		match value {
			Value::Array(items) => items.into_iter().map(T::from_value).collect(),
			ref other => Err(mismatch("array", other)),
		}
	}
}

impl<T: HostValue> HostValue for HashMap<String, T> {
	fn type_descriptor() -> TypeDescriptor {
		TypeDescriptor::map(T::type_descriptor())
	}
	fn to_value(&self) -> Value {
		Value::Map(
			self.iter()
				.map(|(key, value)| (key.clone(), value.to_value()))
				.collect(),
		)
	}
	fn from_value(value: Value) -> Result<Self, DeError> {
		match value {
			Value::Map(entries) => entries
				.into_iter()
				.map(|(key, value)| Ok((key, T::from_value(value)?)))
				.collect(),
			ref other => Err(mismatch("map", other)),
		}
	}
}

impl HostValue for Value {
	fn type_descriptor() -> TypeDescriptor {
		TypeDescriptor::dynamic()
	}
	fn to_value(&self) -> Value {
		self.clone()
	}
	fn from_value(value: Value) -> Result<Self, DeError> {
		Ok(value)
	}
}
