//! Host-side type descriptions consumed by the plan builders
//!
//! A [`TypeDescriptor`] tells a plan builder what the in-memory shape of the
//! (de)serialization target is: which primitive it is, what its members and
//! constructors look like for records, how enum members are named, and so
//! on. The builders walk `(schema, descriptor)` pairs together and emit a
//! plan specialized to both.
//!
//! Descriptors are cheap to clone (`Arc`-backed) and their *identity* (the
//! allocation, not the contents) is what the build memo uses together with
//! the schema node identity. Deriving a descriptor from another (array
//! items, optional inner, ...) hands out clones of the stored descriptor so
//! that identity is stable across a build.

mod host;
mod value;

pub use {
	host::{ByteBuf, HostValue},
	value::{DurationParts, RecordValue, Value},
};

use std::sync::Arc;

/// Description of a host type targeted by (de)serialization
///
/// See the [module documentation](self) for an overview.
#[derive(Clone)]
pub struct TypeDescriptor {
	kind: Arc<TypeKind>,
}

/// The kind of host type a [`TypeDescriptor`] describes
#[non_exhaustive]
pub enum TypeKind {
	/// Accept whatever shape the schema dictates, producing/consuming
	/// [`Value`]s directly
	Dynamic,
	/// [`Value::Boolean`]
	Boolean,
	/// [`Value::Int`]
	Int,
	/// [`Value::Long`]
	Long,
	/// [`Value::Float`]
	Float,
	/// [`Value::Double`]
	Double,
	/// [`Value::Bytes`]
	Bytes,
	/// [`Value::String`]
	String,
	/// [`Value::Uuid`]
	Uuid,
	/// [`Value::Decimal`]
	Decimal,
	/// [`Value::Date`]
	Date,
	/// [`Value::DateTime`]
	DateTime,
	/// [`Value::TimeSpan`]
	TimeSpan,
	/// [`Value::Duration`]
	Duration,
	/// A host enumeration type
	Enum(EnumType),
	/// An array with the given element type
	Array(TypeDescriptor),
	/// A string-keyed map with the given value type
	Map(TypeDescriptor),
	/// A record (struct-like) host type
	Record(RecordType),
	/// A nullable wrapper around the given type
	///
	/// Matches `union` schemas: the `null` branch maps to [`Value::Null`],
	/// every other branch maps to the inner type.
	Optional(TypeDescriptor),
	/// A by-name reference to an enclosing [`Record`](TypeKind::Record)
	/// descriptor
	///
	/// Descriptors are plain immutable values, so a self-referential record
	/// type (a linked list's `next` member, say) cannot hold its own
	/// descriptor directly. It holds one of these instead; the plan
	/// builders resolve it against the innermost enclosing record
	/// descriptor with a matching name, which also makes the build's
	/// memoization see the same descriptor identity on every occurrence of
	/// the cycle.
	RecursiveRef(String),
}

impl TypeDescriptor {
	fn from_kind(kind: TypeKind) -> Self {
		Self {
			kind: Arc::new(kind),
		}
	}

	/// The descriptor that accepts whatever shape the schema dictates
	pub fn dynamic() -> Self {
		Self::from_kind(TypeKind::Dynamic)
	}
	/// Descriptor for [`Value::Boolean`]
	pub fn boolean() -> Self {
		Self::from_kind(TypeKind::Boolean)
	}
	/// Descriptor for [`Value::Int`]
	pub fn int() -> Self {
		Self::from_kind(TypeKind::Int)
	}
	/// Descriptor for [`Value::Long`]
	pub fn long() -> Self {
		Self::from_kind(TypeKind::Long)
	}
	/// Descriptor for [`Value::Float`]
	pub fn float() -> Self {
		Self::from_kind(TypeKind::Float)
	}
	/// Descriptor for [`Value::Double`]
	pub fn double() -> Self {
		Self::from_kind(TypeKind::Double)
	}
	/// Descriptor for [`Value::Bytes`]
	pub fn bytes() -> Self {
		Self::from_kind(TypeKind::Bytes)
	}
	/// Descriptor for [`Value::String`]
	pub fn string() -> Self {
		Self::from_kind(TypeKind::String)
	}
	/// Descriptor for [`Value::Uuid`]
	pub fn uuid() -> Self {
		Self::from_kind(TypeKind::Uuid)
	}
	/// Descriptor for [`Value::Decimal`]
	pub fn decimal() -> Self {
		Self::from_kind(TypeKind::Decimal)
	}
	/// Descriptor for [`Value::Date`]
	pub fn date() -> Self {
		Self::from_kind(TypeKind::Date)
	}
	/// Descriptor for [`Value::DateTime`]
	pub fn date_time() -> Self {
		Self::from_kind(TypeKind::DateTime)
	}
	/// Descriptor for [`Value::TimeSpan`]
	pub fn time_span() -> Self {
		Self::from_kind(TypeKind::TimeSpan)
	}
	/// Descriptor for [`Value::Duration`]
	pub fn duration() -> Self {
		Self::from_kind(TypeKind::Duration)
	}
	/// Descriptor for a host enumeration type
	pub fn enumeration(enum_type: EnumType) -> Self {
		Self::from_kind(TypeKind::Enum(enum_type))
	}
	/// Descriptor for an array with the given element type
	pub fn array(items: TypeDescriptor) -> Self {
		Self::from_kind(TypeKind::Array(items))
	}
	/// Descriptor for a string-keyed map with the given value type
	pub fn map(values: TypeDescriptor) -> Self {
		Self::from_kind(TypeKind::Map(values))
	}
	/// Descriptor for a record host type
	pub fn record(record_type: RecordType) -> Self {
		Self::from_kind(TypeKind::Record(record_type))
	}
	/// Descriptor for a nullable wrapper around the given type
	pub fn optional(inner: TypeDescriptor) -> Self {
		Self::from_kind(TypeKind::Optional(inner))
	}
	/// Descriptor referring by name to an enclosing record descriptor
	///
	/// See [`TypeKind::RecursiveRef`].
	pub fn recursive_ref(name: impl Into<String>) -> Self {
		Self::from_kind(TypeKind::RecursiveRef(name.into()))
	}

	/// The kind of host type this descriptor describes
	pub fn kind(&self) -> &TypeKind {
		&self.kind
	}

	/// Identity of this descriptor, for memoization
	///
	/// Two descriptors have the same identity if they are clones of the same
	/// original.
	pub(crate) fn identity(&self) -> usize {
		Arc::as_ptr(&self.kind) as usize
	}

	/// The host type that a non-null union branch maps to
	///
	/// [`Optional`](TypeKind::Optional) selects its inner type; every other
	/// descriptor selects itself.
	pub(crate) fn union_branch_type(&self) -> TypeDescriptor {
		match self.kind() {
			TypeKind::Optional(inner) => inner.clone(),
			_ => self.clone(),
		}
	}

	/// Descriptor with [`Optional`](TypeKind::Optional) wrappers removed
	///
	/// Used by the non-union cases: a nullable host type targeting a
	/// non-union schema (de)serializes through its inner type, and the
	/// absence of a null branch surfaces at runtime if the value is null.
	pub(crate) fn strip_optional(&self) -> &TypeDescriptor {
		let mut ty = self;
		while let TypeKind::Optional(inner) = ty.kind() {
			ty = inner;
		}
		ty
	}
}

impl std::fmt::Debug for TypeDescriptor {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self.kind() {
			TypeKind::Dynamic => f.write_str("dynamic"),
			TypeKind::Boolean => f.write_str("boolean"),
			TypeKind::Int => f.write_str("int"),
			TypeKind::Long => f.write_str("long"),
			TypeKind::Float => f.write_str("float"),
			TypeKind::Double => f.write_str("double"),
			TypeKind::Bytes => f.write_str("bytes"),
			TypeKind::String => f.write_str("string"),
			TypeKind::Uuid => f.write_str("uuid"),
			TypeKind::Decimal => f.write_str("decimal"),
			TypeKind::Date => f.write_str("date"),
			TypeKind::DateTime => f.write_str("date-time"),
			TypeKind::TimeSpan => f.write_str("time-span"),
			TypeKind::Duration => f.write_str("duration"),
			TypeKind::Enum(enum_type) => write!(f, "enum {:?}", enum_type.name),
			TypeKind::Array(items) => write!(f, "array of {:?}", items),
			TypeKind::Map(values) => write!(f, "map of {:?}", values),
			TypeKind::Record(record_type) => write!(f, "record {:?}", record_type.name),
			TypeKind::Optional(inner) => write!(f, "optional {:?}", inner),
			TypeKind::RecursiveRef(name) => write!(f, "recursive reference to {name:?}"),
		}
	}
}

/// Host-side description of an enumeration type
#[derive(Clone, Debug)]
#[non_exhaustive]
pub struct EnumType {
	/// Name of the host enumeration type
	pub name: String,
	/// Names of the enumeration's members, each expected to match exactly
	/// one schema symbol
	pub members: Vec<String>,
}
impl EnumType {
	/// `name` is the name of the host enumeration type, `members` are its
	/// member names.
	pub fn new<M: Into<String>>(
		name: impl Into<String>,
		members: impl IntoIterator<Item = M>,
	) -> Self {
		Self {
			name: name.into(),
			members: members.into_iter().map(Into::into).collect(),
		}
	}
}

/// Host-side description of a record (struct-like) type
#[derive(Clone, Debug)]
#[non_exhaustive]
pub struct RecordType {
	/// Name of the host record type
	pub name: String,
	/// The record's public members, in the order fields appear on values of
	/// this type
	pub members: Vec<Member>,
	/// The record's constructors, tried in order by the deserializer
	///
	/// An empty list means the type is default-constructible with all-member
	/// assignment.
	pub constructors: Vec<Constructor>,
}
impl RecordType {
	/// `name` is the name of the host record type, `members` are its public
	/// members.
	pub fn new(name: impl Into<String>, members: Vec<Member>) -> Self {
		Self {
			name: name.into(),
			members,
			constructors: Vec::new(),
		}
	}

	/// Same as [`new`](Self::new), additionally declaring constructors.
	pub fn with_constructors(
		name: impl Into<String>,
		members: Vec<Member>,
		constructors: Vec<Constructor>,
	) -> Self {
		Self {
			name: name.into(),
			members,
			constructors,
		}
	}
}

/// A public member (field or property) of a record host type
#[derive(Clone, Debug)]
#[non_exhaustive]
pub struct Member {
	/// The member's name, matched against schema field names with
	/// [`names_match`]
	pub name: String,
	/// Explicit schema-side name for this member
	///
	/// When set, it is compared exactly and takes precedence over the
	/// canonical match. This is the surface through which attribute-driven
	/// renames reach the engine; the engine itself never inspects
	/// attributes.
	pub rename: Option<String>,
	/// The member's declared type
	pub type_: TypeDescriptor,
	/// Whether the member can be assigned outside of a constructor
	pub writable: bool,
}
impl Member {
	/// A writable member with the given name and type
	pub fn new(name: impl Into<String>, type_: TypeDescriptor) -> Self {
		Self {
			name: name.into(),
			rename: None,
			type_,
			writable: true,
		}
	}

	/// Same as [`new`](Self::new), but the member can only be set through a
	/// constructor.
	pub fn read_only(name: impl Into<String>, type_: TypeDescriptor) -> Self {
		Self {
			writable: false,
			..Self::new(name, type_)
		}
	}

	/// Declare an explicit schema-side name for this member
	pub fn renamed(mut self, schema_name: impl Into<String>) -> Self {
		self.rename = Some(schema_name.into());
		self
	}

	pub(crate) fn matches(&self, schema_name: &str) -> bool {
		match &self.rename {
			Some(rename) => rename == schema_name,
			None => names_match(schema_name, &self.name),
		}
	}
}

/// A constructor of a record host type
#[derive(Clone, Debug)]
#[non_exhaustive]
pub struct Constructor {
	/// The constructor's parameters, each matched against schema field names
	pub parameters: Vec<Parameter>,
}
impl Constructor {
	/// A constructor with the given parameters
	pub fn new(parameters: Vec<Parameter>) -> Self {
		Self { parameters }
	}
}

/// A parameter of a record host type constructor
#[derive(Clone, Debug)]
#[non_exhaustive]
pub struct Parameter {
	/// The parameter's name, matched against schema field names with
	/// [`names_match`]
	pub name: String,
	/// Default value used when no schema field matches this parameter
	pub default: Option<Value>,
}
impl Parameter {
	/// A parameter with the given name and no default value
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			default: None,
		}
	}

	/// A parameter with the given name and default value
	pub fn with_default(name: impl Into<String>, default: Value) -> Self {
		Self {
			name: name.into(),
			default: Some(default),
		}
	}
}

/// Whether a schema name/symbol and a host member name refer to the same
/// thing
///
/// This is the canonical match: all non-alphanumeric characters are ignored
/// and the comparison is case-insensitive, so that e.g. the schema field
/// `file_name` matches the host member `FileName`.
pub fn names_match(schema_name: &str, member_name: &str) -> bool {
	fn canonical(s: &str) -> impl Iterator<Item = char> + '_ {
		s.chars()
			.filter(|c| c.is_alphanumeric())
			.flat_map(char::to_lowercase)
	}
	canonical(schema_name).eq(canonical(member_name))
}
