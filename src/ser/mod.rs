//! Serializer plan building and execution
//!
//! A [`SerializerBuilder`] walks a `(schema, type descriptor)` pair through
//! its ordered case list and produces a [`Serializer`]: a reusable plan
//! that writes [`Value`]s in the Avro binary encoding. Building happens
//! once (typically at startup); the resulting plan is immutable and may be
//! invoked concurrently, each invocation carrying its own
//! [`SerializerState`] bound to the caller's writer.
//!
//! ```
//! use avro_plan::{
//! 	schema::{RegularType, Schema},
//! 	types::TypeDescriptor,
//! 	ser::SerializerBuilder,
//! 	Value,
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let schema = Schema::from_nodes(vec![RegularType::Long.into()])?;
//! let serializer = SerializerBuilder::new().build(&schema, &TypeDescriptor::long())?;
//!
//! assert_eq!(serializer.serialize_to_vec(&Value::Long(3))?, [6]);
//! // The plan is reusable
//! assert_eq!(serializer.serialize_to_vec(&Value::Long(-64))?, [127]);
//! # Ok(())
//! # }
//! ```

mod cases;
mod error;

pub use error::{SerError, SerErrorKind};

use crate::{
	build::{Binding, BuildContext, BuildError, CaseOutcome, CaseResult},
	schema::{Schema, SchemaKey},
	types::{TypeDescriptor, Value},
};

use {
	integer_encoding::{VarInt, VarIntWriter},
	std::sync::{Arc, OnceLock},
};

/// A compiled serialization plan for one `(schema node, type)` pair
///
/// Plans compose bottom-up: a record plan holds the plans of its fields, an
/// array plan holds the plan of its items, and so on, bottoming out in
/// byte-codec writes on the [`SerializerState`].
pub type SerPlan = Arc<dyn Fn(&Value, &mut SerializerState<'_>) -> Result<(), SerError> + Send + Sync>;

/// Per-invocation serialization state: the handle to the bound writer
///
/// Each [`Serializer::serialize`] call creates a fresh one; plans never
/// share writer state.
pub struct SerializerState<'w> {
	writer: &'w mut dyn std::io::Write,
}

impl<'w> SerializerState<'w> {
	/// Build a `SerializerState` writing to the given writer
	pub fn from_writer(writer: &'w mut dyn std::io::Write) -> Self {
		Self { writer }
	}

	/// Write an integer using varint (zigzag for signed types) encoding
	pub fn write_varint<I>(&mut self, n: I) -> Result<(), SerError>
	where
		I: VarInt,
	{
		self.writer.write_varint(n).map_err(SerError::io)?;
		Ok(())
	}

	pub(crate) fn write_boolean(&mut self, v: bool) -> Result<(), SerError> {
		self.write_raw(&[v as u8])
	}

	pub(crate) fn write_int(&mut self, v: i32) -> Result<(), SerError> {
		self.write_varint(v)
	}

	pub(crate) fn write_long(&mut self, v: i64) -> Result<(), SerError> {
		self.write_varint(v)
	}

	pub(crate) fn write_float(&mut self, v: f32) -> Result<(), SerError> {
		self.write_raw(&v.to_le_bytes())
	}

	pub(crate) fn write_double(&mut self, v: f64) -> Result<(), SerError> {
		self.write_raw(&v.to_le_bytes())
	}

	/// Write a varint length followed by that many raw bytes (the `bytes`
	/// and `string` encodings)
	pub(crate) fn write_length_delimited(&mut self, data: &[u8]) -> Result<(), SerError> {
		self.write_varint::<i64>(data.len().try_into().map_err(|_| {
			SerError::overflow("buffer len does not fit i64 for encoding as length-delimited size")
		})?)?;
		self.write_raw(data)
	}

	pub(crate) fn write_raw(&mut self, data: &[u8]) -> Result<(), SerError> {
		self.writer.write_all(data).map_err(SerError::io)
	}
}

/// One case of the serializer case list
///
/// The builder offers each `(schema node, type)` pair to its cases in
/// order; the first one to return [`CaseOutcome::Built`] decides the plan.
/// Implement this and [`SerializerBuilder::prepend_case`] it to intercept
/// specific pairs before the default cases see them.
pub trait SerializerCase {
	/// Short name identifying this case in rejection-reason chains
	fn name(&self) -> &'static str;

	/// Attempt to build a plan for the given pair
	///
	/// Nested plans are obtained through
	/// [`builder.build_node(...)`](SerializerBuilder::build_node).
	fn build(
		&self,
		builder: &SerializerBuilder,
		key: SchemaKey,
		ty: &TypeDescriptor,
		ctx: &mut BuildContext<'_>,
	) -> CaseResult<SerPlan>;
}

/// Builds [`Serializer`]s from `(schema, type descriptor)` pairs
///
/// Holds the ordered case list. The default list handles the logical types
/// first (decimal, duration, date, time, timestamp), then primitives,
/// arrays and maps, enums, records, and unions.
pub struct SerializerBuilder {
	cases: Vec<Box<dyn SerializerCase>>,
}

impl Default for SerializerBuilder {
	fn default() -> Self {
		Self::new()
	}
}

impl SerializerBuilder {
	/// A builder with the default case list
	pub fn new() -> Self {
		Self {
			cases: cases::default_cases(),
		}
	}

	/// Insert a case in front of the existing ones
	///
	/// It will be offered every `(schema node, type)` pair before any other
	/// case.
	pub fn prepend_case(&mut self, case: Box<dyn SerializerCase>) -> &mut Self {
		self.cases.insert(0, case);
		self
	}

	/// Build a serializer for the root of the schema
	pub fn build(&self, schema: &Schema, ty: &TypeDescriptor) -> Result<Serializer, BuildError> {
		self.build_with_context(&mut BuildContext::new(schema), ty)
	}

	/// Same as [`build`](Self::build), with an externally-constructed
	/// [`BuildContext`]
	///
	/// This allows pre-seeding plans and inspecting the emitted top-level
	/// bindings afterwards.
	pub fn build_with_context(
		&self,
		ctx: &mut BuildContext<'_>,
		ty: &TypeDescriptor,
	) -> Result<Serializer, BuildError> {
		let plan = self.build_node(SchemaKey::root(), ty, ctx)?;
		Ok(Serializer {
			plan,
			bindings: ctx.ser_bindings(),
		})
	}

	/// Build the plan for one schema node
	///
	/// This is the entry point cases use to build the plans of their
	/// children.
	pub fn build_node(
		&self,
		key: SchemaKey,
		ty: &TypeDescriptor,
		ctx: &mut BuildContext<'_>,
	) -> Result<SerPlan, BuildError> {
		if let Some(resolved) = crate::build::resolve_recursive_ref(ty, ctx)? {
			return self.build_node(key, &resolved, ctx);
		}
		let mut attempts = Vec::new();
		for case in &self.cases {
			match case.build(self, key, ty, ctx)? {
				CaseOutcome::Built(plan) => return Ok(plan),
				CaseOutcome::NoMatch(reason) => {
					attempts.push(format!("{}: {reason}", case.name()));
				}
			}
		}
		Err(BuildError::no_case_matched(
			format_args!(
				"no serializer case matched schema {:?} with target type {ty:?}",
				ctx.schema()[key]
			),
			attempts,
		))
	}
}

/// A compiled, reusable serializer for one `(schema, type)` pair
///
/// Invocations are independent: a `Serializer` may be shared across threads
/// and used concurrently.
pub struct Serializer {
	plan: SerPlan,
	// Owns the recursive binding cells; plans reference them weakly
	bindings: Vec<Binding<SerPlan>>,
}

impl std::fmt::Debug for Serializer {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Serializer").finish_non_exhaustive()
	}
}

impl Serializer {
	/// Serialize one value to the given writer
	pub fn serialize<W: std::io::Write>(&self, value: &Value, mut writer: W) -> Result<(), SerError> {
		let mut state = SerializerState::from_writer(&mut writer);
		(*self.plan)(value, &mut state)
	}

	/// Serialize one value to a newly allocated `Vec`
	pub fn serialize_to_vec(&self, value: &Value) -> Result<Vec<u8>, SerError> {
		let mut out = Vec::new();
		self.serialize(value, &mut out)?;
		Ok(out)
	}

	/// Names of the top-level bindings this serializer was built with, in
	/// emission order
	pub fn binding_names(&self) -> impl Iterator<Item = &str> {
		self.bindings.iter().map(|binding| &*binding.name)
	}
}

/// A plan that defers to a named binding's cell
///
/// This is what breaks recursive record cycles: the first occurrence of a
/// `(schema node, type)` pair registers the binding and eventually
/// initializes the cell; every further occurrence compiles to this.
///
/// The reference is weak so that the cell/plan pair does not form a
/// reference-counting cycle; the [`Serializer`] owns the strong side.
pub(crate) fn deferred_plan(cell: &Arc<OnceLock<SerPlan>>) -> SerPlan {
	let cell = Arc::downgrade(cell);
	Arc::new(move |value, state| {
		let cell = cell
			.upgrade()
			.expect("binding cells are owned by the serializer invoking the plan");
		// Only reachable if a context that saw a failed build was reused
		let plan = cell.get().ok_or_else(|| {
			SerError::invalid_value(
				"recursive binding was never initialized; \
					its build failed and the build context was reused",
			)
		})?;
		(**plan)(value, state)
	})
}
