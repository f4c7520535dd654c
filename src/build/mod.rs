//! Per-build state shared by the plan builders
//!
//! A [`BuildContext`] lives for one top-level build (or several, when a
//! caller wants memoization across builds against the same schema). It
//! carries the recursion marks computed for the schema, the ordered list of
//! named top-level bindings emitted so far, and the memo that makes
//! recursive plans referable before they are fully built.

mod error;

pub use error::{BuildError, BuildErrorKind};

use crate::{
	de::{skip::SkipPlan, DePlan},
	schema::{recursion::recursive_nodes, Schema, SchemaKey},
	ser::SerPlan,
	types::TypeDescriptor,
};

use std::{borrow::Cow, collections::HashMap, sync::Arc, sync::OnceLock};

/// What a single case made of a `(schema, type)` pair
///
/// Returned by [`SerializerCase::build`](crate::ser::SerializerCase::build)
/// and [`DeserializerCase::build`](crate::de::DeserializerCase::build).
/// `NoMatch` reasons are accumulated; if no case matches, they become the
/// [`attempts`](BuildError::attempts) chain of the resulting
/// [`BuildError`].
pub enum CaseOutcome<P> {
	/// The case handled the pair and produced a plan
	Built(P),
	/// The case does not apply to this pair; the reason is reported if no
	/// other case applies either
	NoMatch(Cow<'static, str>),
}

impl<P> CaseOutcome<P> {
	/// Convenience constructor for [`CaseOutcome::NoMatch`]
	pub fn no_match(reason: impl Into<Cow<'static, str>>) -> Self {
		Self::NoMatch(reason.into())
	}
}

/// Result type of a case: a hard error aborts the whole build
pub type CaseResult<P> = Result<CaseOutcome<P>, BuildError>;

/// A named top-level binding emitted during a build
///
/// The cell starts empty and is initialized once the plan it names is fully
/// built; every recursive reference to it goes through the cell. All cells
/// are initialized before the top-level build returns.
pub(crate) struct Binding<P> {
	pub(crate) name: String,
	pub(crate) cell: Arc<OnceLock<P>>,
}

impl<P> Clone for Binding<P> {
	fn clone(&self) -> Self {
		Self {
			name: self.name.clone(),
			cell: Arc::clone(&self.cell),
		}
	}
}

/// Per-build state: bindings, memo and recursion marks for one schema
///
/// Most uses go through
/// [`SerializerBuilder::build`](crate::ser::SerializerBuilder::build) /
/// [`DeserializerBuilder::build`](crate::de::DeserializerBuilder::build),
/// which create a fresh context internally. Constructing one explicitly and
/// passing it to the `build_with_context` variants allows:
/// - sharing memoized plans across several builds against the same schema,
/// - pre-seeding plans for specific `(schema node, type)` pairs
///   ([`seed_serializer`](Self::seed_serializer) /
///   [`seed_deserializer`](Self::seed_deserializer)),
/// - inspecting the emitted top-level bindings afterwards
///   ([`binding_names`](Self::binding_names)).
///
/// A context that saw a failed build should be discarded: it may hold
/// bindings whose plans were never completed, and plans built through it
/// afterwards would error out at runtime when reaching them.
pub struct BuildContext<'s> {
	schema: &'s Schema,
	recursive: Vec<bool>,
	ser_bindings: Vec<Binding<SerPlan>>,
	ser_memo: HashMap<(SchemaKey, usize), usize>,
	de_bindings: Vec<Binding<DePlan>>,
	de_memo: HashMap<(SchemaKey, usize), usize>,
	skip_bindings: Vec<Binding<SkipPlan>>,
	skip_memo: HashMap<SchemaKey, usize>,
	// Record descriptors currently being built, innermost last; resolves
	// TypeKind::RecursiveRef to the enclosing descriptor (same identity, so
	// the memo terminates the cycle)
	type_scopes: Vec<(String, TypeDescriptor)>,
}

impl<'s> BuildContext<'s> {
	/// Build a fresh context for the given schema
	///
	/// This runs the recursion analysis for the schema.
	pub fn new(schema: &'s Schema) -> Self {
		Self {
			recursive: recursive_nodes(schema),
			schema,
			ser_bindings: Vec::new(),
			ser_memo: HashMap::new(),
			de_bindings: Vec::new(),
			de_memo: HashMap::new(),
			skip_bindings: Vec::new(),
			skip_memo: HashMap::new(),
			type_scopes: Vec::new(),
		}
	}

	/// The schema this context was built for
	pub fn schema(&self) -> &'s Schema {
		self.schema
	}

	/// Whether the given node lies on a cyclic path of the schema
	pub fn is_recursive(&self, key: SchemaKey) -> bool {
		self.recursive.get(key.idx()).copied().unwrap_or(false)
	}

	/// Names of the top-level bindings emitted so far, in emission order
	/// (serializer bindings first, then deserializer, then skip)
	pub fn binding_names(&self) -> impl Iterator<Item = &str> {
		self.ser_bindings
			.iter()
			.map(|binding| &*binding.name)
			.chain(self.de_bindings.iter().map(|binding| &*binding.name))
			.chain(self.skip_bindings.iter().map(|binding| &*binding.name))
	}

	/// Pre-seed a serializer plan for a `(schema node, type)` pair
	///
	/// Any build through this context that reaches that pair on a recursive
	/// path will use the provided plan instead of building one.
	pub fn seed_serializer(
		&mut self,
		key: SchemaKey,
		ty: &TypeDescriptor,
		name: impl Into<String>,
		plan: SerPlan,
	) {
		let cell = self.new_ser_binding(name.into(), key, ty);
		let _ = cell.set(plan);
	}

	/// Pre-seed a deserializer plan for a `(schema node, type)` pair
	///
	/// Same as [`seed_serializer`](Self::seed_serializer), for the
	/// deserialization direction.
	pub fn seed_deserializer(
		&mut self,
		key: SchemaKey,
		ty: &TypeDescriptor,
		name: impl Into<String>,
		plan: DePlan,
	) {
		let cell = self.new_de_binding(name.into(), key, ty);
		let _ = cell.set(plan);
	}

	pub(crate) fn existing_ser_binding(
		&self,
		key: SchemaKey,
		ty: &TypeDescriptor,
	) -> Option<&Arc<OnceLock<SerPlan>>> {
		self.ser_memo
			.get(&(key, ty.identity()))
			.map(|&idx| &self.ser_bindings[idx].cell)
	}

	pub(crate) fn new_ser_binding(
		&mut self,
		name: String,
		key: SchemaKey,
		ty: &TypeDescriptor,
	) -> Arc<OnceLock<SerPlan>> {
		let cell = Arc::new(OnceLock::new());
		self.ser_memo
			.insert((key, ty.identity()), self.ser_bindings.len());
		self.ser_bindings.push(Binding {
			name,
			cell: Arc::clone(&cell),
		});
		cell
	}

	pub(crate) fn existing_de_binding(
		&self,
		key: SchemaKey,
		ty: &TypeDescriptor,
	) -> Option<&Arc<OnceLock<DePlan>>> {
		self.de_memo
			.get(&(key, ty.identity()))
			.map(|&idx| &self.de_bindings[idx].cell)
	}

	pub(crate) fn new_de_binding(
		&mut self,
		name: String,
		key: SchemaKey,
		ty: &TypeDescriptor,
	) -> Arc<OnceLock<DePlan>> {
		let cell = Arc::new(OnceLock::new());
		self.de_memo
			.insert((key, ty.identity()), self.de_bindings.len());
		self.de_bindings.push(Binding {
			name,
			cell: Arc::clone(&cell),
		});
		cell
	}

	pub(crate) fn existing_skip_binding(&self, key: SchemaKey) -> Option<&Arc<OnceLock<SkipPlan>>> {
		self.skip_memo
			.get(&key)
			.map(|&idx| &self.skip_bindings[idx].cell)
	}

	pub(crate) fn new_skip_binding(
		&mut self,
		name: String,
		key: SchemaKey,
	) -> Arc<OnceLock<SkipPlan>> {
		let cell = Arc::new(OnceLock::new());
		self.skip_memo.insert(key, self.skip_bindings.len());
		self.skip_bindings.push(Binding {
			name,
			cell: Arc::clone(&cell),
		});
		cell
	}

	pub(crate) fn ser_bindings(&self) -> Vec<Binding<SerPlan>> {
		self.ser_bindings.clone()
	}

	pub(crate) fn de_bindings(&self) -> Vec<Binding<DePlan>> {
		self.de_bindings.clone()
	}

	pub(crate) fn skip_bindings(&self) -> Vec<Binding<SkipPlan>> {
		self.skip_bindings.clone()
	}

	pub(crate) fn ser_binding_count(&self) -> usize {
		self.ser_bindings.len()
	}

	pub(crate) fn de_binding_count(&self) -> usize {
		self.de_bindings.len()
	}

	pub(crate) fn push_type_scope(&mut self, name: String, ty: TypeDescriptor) {
		self.type_scopes.push((name, ty));
	}

	pub(crate) fn pop_type_scope(&mut self) {
		self.type_scopes.pop();
	}

	/// Resolve a [`TypeKind::RecursiveRef`](crate::types::TypeKind) against
	/// the innermost enclosing record descriptor with a matching name
	pub(crate) fn resolve_type_ref(&self, name: &str) -> Option<TypeDescriptor> {
		self.type_scopes
			.iter()
			.rev()
			.find(|(scope_name, _)| scope_name == name)
			.map(|(_, ty)| ty.clone())
	}
}

/// Resolve a [`RecursiveRef`](crate::types::TypeKind::RecursiveRef) target
/// against the enclosing record descriptors, preserving an `Optional`
/// wrapper
///
/// Returns `Ok(None)` when the type is not a recursive reference. The
/// resolved descriptor is a clone of the enclosing one, so the build memo
/// sees the same identity on every occurrence of the cycle.
pub(crate) fn resolve_recursive_ref(
	ty: &TypeDescriptor,
	ctx: &BuildContext<'_>,
) -> Result<Option<TypeDescriptor>, BuildError> {
	use crate::types::TypeKind;
	let TypeKind::RecursiveRef(name) = ty.strip_optional().kind() else {
		return Ok(None);
	};
	let resolved = ctx.resolve_type_ref(name).ok_or_else(|| {
		BuildError::unsupported_type(format_args!(
			"recursive reference {name:?} does not name any enclosing record descriptor"
		))
	})?;
	Ok(Some(if matches!(ty.kind(), TypeKind::Optional(_)) {
		TypeDescriptor::optional(resolved)
	} else {
		resolved
	}))
}
