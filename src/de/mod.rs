//! Deserializer plan building and execution
//!
//! A [`DeserializerBuilder`] walks a `(schema, type descriptor)` pair
//! through its ordered case list and produces a [`Deserializer`]: a
//! reusable plan that decodes Avro binary data into [`Value`]s. Building
//! happens once (typically at startup); the resulting plan is immutable and
//! may be invoked concurrently, each invocation carrying its own
//! [`Reader`] over the caller's slice.
//!
//! ```
//! use avro_plan::{
//! 	de::DeserializerBuilder,
//! 	schema::{RegularType, Schema},
//! 	types::TypeDescriptor,
//! 	Value,
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let schema = Schema::from_nodes(vec![RegularType::String.into()])?;
//! let deserializer = DeserializerBuilder::new().build(&schema, &TypeDescriptor::string())?;
//!
//! assert_eq!(
//! 	deserializer.deserialize(&[6, 102, 111, 111])?,
//! 	Value::String("foo".to_owned())
//! );
//! # Ok(())
//! # }
//! ```

mod cases;
mod error;
pub mod read;
pub(crate) mod skip;

pub use {
	error::{DeError, DeErrorKind},
	read::Reader,
};

use crate::{
	build::{Binding, BuildContext, BuildError, CaseOutcome, CaseResult},
	schema::{Schema, SchemaKey},
	types::{TypeDescriptor, Value},
};

use std::sync::{Arc, OnceLock};

/// A compiled deserialization plan for one `(schema node, type)` pair
///
/// Mirrors [`SerPlan`](crate::ser::SerPlan): plans compose bottom-up and
/// bottom out in byte-codec reads on the [`Reader`].
pub type DePlan = Arc<dyn Fn(&mut Reader<'_>) -> Result<Value, DeError> + Send + Sync>;

/// One case of the deserializer case list
///
/// The builder offers each `(schema node, type)` pair to its cases in
/// order; the first one to return [`CaseOutcome::Built`] decides the plan.
/// Implement this and [`DeserializerBuilder::prepend_case`] it to intercept
/// specific pairs before the default cases see them.
pub trait DeserializerCase {
	/// Short name identifying this case in rejection-reason chains
	fn name(&self) -> &'static str;

	/// Attempt to build a plan for the given pair
	///
	/// Nested plans are obtained through
	/// [`builder.build_node(...)`](DeserializerBuilder::build_node).
	fn build(
		&self,
		builder: &DeserializerBuilder,
		key: SchemaKey,
		ty: &TypeDescriptor,
		ctx: &mut BuildContext<'_>,
	) -> CaseResult<DePlan>;
}

/// Builds [`Deserializer`]s from `(schema, type descriptor)` pairs
///
/// Holds the ordered case list and the runtime guards the built plans
/// embed.
pub struct DeserializerBuilder {
	cases: Vec<Box<dyn DeserializerCase>>,
	/// If an array or map advertises more items than this across its
	/// blocks, deserialization fails instead of attempting the allocation.
	///
	/// This is a safeguard against malformed (or malicious) data; the
	/// default is `1_000_000_000`.
	pub max_seq_size: usize,
}

impl Default for DeserializerBuilder {
	fn default() -> Self {
		Self::new()
	}
}

impl DeserializerBuilder {
	/// A builder with the default case list and guards
	pub fn new() -> Self {
		Self {
			cases: cases::default_cases(),
			max_seq_size: 1_000_000_000,
		}
	}

	/// Insert a case in front of the existing ones
	///
	/// It will be offered every `(schema node, type)` pair before any other
	/// case.
	pub fn prepend_case(&mut self, case: Box<dyn DeserializerCase>) -> &mut Self {
		self.cases.insert(0, case);
		self
	}

	/// Build a deserializer for the root of the schema
	pub fn build(&self, schema: &Schema, ty: &TypeDescriptor) -> Result<Deserializer, BuildError> {
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
	) -> Result<Deserializer, BuildError> {
		let plan = self.build_node(SchemaKey::root(), ty, ctx)?;
		Ok(Deserializer {
			plan,
			bindings: ctx.de_bindings(),
			skip_bindings: ctx.skip_bindings(),
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
	) -> Result<DePlan, BuildError> {
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
				"no deserializer case matched schema {:?} with target type {ty:?}",
				ctx.schema()[key]
			),
			attempts,
		))
	}
}

/// A compiled, reusable deserializer for one `(schema, type)` pair
///
/// Invocations are independent: a `Deserializer` may be shared across
/// threads and used concurrently.
pub struct Deserializer {
	plan: DePlan,
	// Own the recursive binding cells; plans reference them weakly
	bindings: Vec<Binding<DePlan>>,
	skip_bindings: Vec<Binding<skip::SkipPlan>>,
}

impl std::fmt::Debug for Deserializer {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Deserializer").finish_non_exhaustive()
	}
}

impl Deserializer {
	/// Deserialize one datum from the start of the given slice
	///
	/// Trailing bytes are ignored, per Avro datum semantics; use
	/// [`deserialize_with_trailing`](Self::deserialize_with_trailing) to
	/// know how much was consumed.
	pub fn deserialize(&self, slice: &[u8]) -> Result<Value, DeError> {
		let mut reader = Reader::new(slice);
		(*self.plan)(&mut reader)
	}

	/// Deserialize one datum, also returning the number of bytes consumed
	pub fn deserialize_with_trailing(&self, slice: &[u8]) -> Result<(Value, usize), DeError> {
		let mut reader = Reader::new(slice);
		let value = (*self.plan)(&mut reader)?;
		Ok((value, reader.position()))
	}

	/// Names of the top-level bindings this deserializer was built with, in
	/// emission order
	pub fn binding_names(&self) -> impl Iterator<Item = &str> {
		self.bindings
			.iter()
			.map(|binding| &*binding.name)
			.chain(self.skip_bindings.iter().map(|binding| &*binding.name))
	}
}

/// A plan that defers to a named binding's cell
///
/// See [`ser::deferred_plan`](crate::ser) for the role this plays in
/// breaking recursive record cycles; this is its deserialization twin.
pub(crate) fn deferred_plan(cell: &Arc<OnceLock<DePlan>>) -> DePlan {
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
