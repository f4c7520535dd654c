//! # Getting started
//!
//! `avro_plan` turns a `(schema, type description)` pair into a
//! pre-compiled plan: a reusable callable that converts between in-memory
//! values and the [Avro binary encoding](https://avro.apache.org/docs/current/specification/).
//! Schemas are consumed as already-built trees (JSON schema parsing is a
//! concern of the layer above), and the in-memory side is described by a
//! [`TypeDescriptor`] — from the fully dynamic [`Value`] model to typed
//! targets through the [`HostValue`] trait.
//!
//! ```
//! use avro_plan::{
//! 	schema::{Name, Record, RecordField, RegularType, Schema, SchemaKey},
//! 	types::{RecordValue, Value},
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // { "type": "record", "name": "test.Test",
//! //   "fields": [{ "name": "field", "type": "string" }] }
//! let schema = Schema::from_nodes(vec![
//! 	Record::new(
//! 		Name::from_fully_qualified_name("test.Test"),
//! 		vec![RecordField::new("field", SchemaKey::from_idx(1))],
//! 	)
//! 	.into(),
//! 	RegularType::String.into(),
//! ])?;
//!
//! let value = Value::Record(RecordValue::new(
//! 	"test.Test",
//! 	[("field", Value::String("foo".to_owned()))],
//! ));
//! let avro_datum = &[6, 102, 111, 111];
//!
//! // Avro datum serialization
//! assert_eq!(avro_plan::serialize_to_vec(&schema, &value)?, avro_datum);
//!
//! // Avro datum deserialization
//! assert_eq!(avro_plan::deserialize(&schema, avro_datum)?, value);
//! # Ok(())
//! # }
//! ```
//!
//! # Plans
//!
//! The one-shot functions above rebuild their plan on every call. The point
//! of this crate is to *not* do that: build once with
//! [`build_serializer`] / [`build_deserializer`] (or the
//! [`SerializerBuilder`] / [`DeserializerBuilder`] for descriptor-level
//! control), then invoke the plan for every datum. A built plan is
//! immutable and can be invoked concurrently from multiple threads, each
//! invocation binding its own reader or writer.
//!
//! ```
//! use avro_plan::{
//! 	schema::{RegularType, Schema},
//! 	Value,
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let schema = Schema::from_nodes(vec![RegularType::Long.into()])?;
//!
//! let serializer = avro_plan::build_serializer::<i64>(&schema)?;
//! let deserializer = avro_plan::build_deserializer::<i64>(&schema)?;
//!
//! let datum = serializer.serialize_to_vec(&-1234)?;
//! assert_eq!(datum, [163, 19]);
//! assert_eq!(deserializer.deserialize(&datum)?, -1234);
//! # Ok(())
//! # }
//! ```
//!
//! # Extending the case lists
//!
//! Plan building proceeds through an ordered list of cases; the first case
//! that matches a `(schema node, type)` pair decides its plan. Callers may
//! prepend their own cases
//! ([`SerializerBuilder::prepend_case`](ser::SerializerBuilder::prepend_case),
//! [`DeserializerBuilder::prepend_case`](de::DeserializerBuilder::prepend_case))
//! to intercept specific pairs — for example to discriminate polymorphic
//! unions on record names differently than the built-in first-match
//! policy.

pub mod build;
pub(crate) mod convert;
pub mod de;
pub mod schema;
pub mod ser;
pub mod types;

pub use {
	build::{BuildContext, BuildError},
	de::{DeError, Deserializer, DeserializerBuilder},
	schema::Schema,
	ser::{SerError, Serializer, SerializerBuilder},
	types::{HostValue, TypeDescriptor, Value},
};

use std::marker::PhantomData;

/// Any error this crate's one-shot entry points may return
///
/// The plan-level entry points return the more precise error types
/// ([`BuildError`], [`SerError`], [`DeError`]); this simply unifies them
/// for the functions that both build and run a plan.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
	/// The schema could not be assembled
	#[error(transparent)]
	Schema(#[from] schema::SchemaError),
	/// No plan could be built for the `(schema, type)` pair
	#[error(transparent)]
	Build(#[from] BuildError),
	/// A serialization plan failed at runtime
	#[error(transparent)]
	Ser(#[from] SerError),
	/// A deserialization plan failed at runtime
	#[error(transparent)]
	De(#[from] DeError),
}

/// Build a serializer plan for the host type `T` against the given schema
///
/// The plan is built once and should be reused across serializations.
pub fn build_serializer<T: HostValue>(schema: &Schema) -> Result<TypedSerializer<T>, BuildError> {
	let inner = SerializerBuilder::new().build(schema, &T::type_descriptor())?;
	Ok(TypedSerializer {
		inner,
		_type: PhantomData,
	})
}

/// Build a deserializer plan for the host type `T` against the given schema
///
/// The plan is built once and should be reused across deserializations.
/// Deserialization assumes the provided schema matches the wire data; there
/// is no writer/reader schema resolution.
pub fn build_deserializer<T: HostValue>(
	schema: &Schema,
) -> Result<TypedDeserializer<T>, BuildError> {
	let inner = DeserializerBuilder::new().build(schema, &T::type_descriptor())?;
	Ok(TypedDeserializer {
		inner,
		_type: PhantomData,
	})
}

/// A [`Serializer`] together with the host type it was built for
pub struct TypedSerializer<T> {
	inner: Serializer,
	_type: PhantomData<fn(&T)>,
}

impl<T: HostValue> TypedSerializer<T> {
	/// Serialize one value to the given writer
	pub fn serialize<W: std::io::Write>(&self, value: &T, writer: W) -> Result<(), SerError> {
		self.inner.serialize(&value.to_value(), writer)
	}

	/// Serialize one value to a newly allocated `Vec`
	pub fn serialize_to_vec(&self, value: &T) -> Result<Vec<u8>, SerError> {
		self.inner.serialize_to_vec(&value.to_value())
	}

	/// The underlying dynamic-value serializer
	pub fn inner(&self) -> &Serializer {
		&self.inner
	}
}

/// A [`Deserializer`] together with the host type it was built for
pub struct TypedDeserializer<T> {
	inner: Deserializer,
	_type: PhantomData<fn() -> T>,
}

impl<T: HostValue> TypedDeserializer<T> {
	/// Deserialize one datum from the start of the given slice
	pub fn deserialize(&self, slice: &[u8]) -> Result<T, DeError> {
		T::from_value(self.inner.deserialize(slice)?)
	}

	/// Deserialize one datum, also returning the number of bytes consumed
	pub fn deserialize_with_trailing(&self, slice: &[u8]) -> Result<(T, usize), DeError> {
		let (value, consumed) = self.inner.deserialize_with_trailing(slice)?;
		Ok((T::from_value(value)?, consumed))
	}

	/// The underlying dynamic-value deserializer
	pub fn inner(&self) -> &Deserializer {
		&self.inner
	}
}

/// Serialize one dynamic value to the given writer
///
/// This builds a fresh plan on every call; reuse a
/// [`build_serializer`]-built plan when serializing more than once.
pub fn serialize<W: std::io::Write>(
	schema: &Schema,
	value: &Value,
	writer: W,
) -> Result<(), Error> {
	let serializer = SerializerBuilder::new().build(schema, &TypeDescriptor::dynamic())?;
	serializer.serialize(value, writer)?;
	Ok(())
}

/// Serialize one dynamic value to a newly allocated `Vec`
///
/// See [`serialize`] for the performance caveat.
pub fn serialize_to_vec(schema: &Schema, value: &Value) -> Result<Vec<u8>, Error> {
	let serializer = SerializerBuilder::new().build(schema, &TypeDescriptor::dynamic())?;
	Ok(serializer.serialize_to_vec(value)?)
}

/// Deserialize one datum from the start of the given slice into the dynamic
/// [`Value`] model
///
/// This builds a fresh plan on every call; reuse a
/// [`build_deserializer`]-built plan when deserializing more than once.
pub fn deserialize(schema: &Schema, slice: &[u8]) -> Result<Value, Error> {
	let deserializer = DeserializerBuilder::new().build(schema, &TypeDescriptor::dynamic())?;
	Ok(deserializer.deserialize(slice)?)
}
