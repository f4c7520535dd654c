//! The schema graph that plans are built against
//!
//! The plan builders consume an already-built schema tree: there is no JSON
//! parsing, name resolution or canonicalization in this crate. Schemas are
//! assembled programmatically from [`SchemaNode`]s via [`Schema::from_nodes`].
//!
//! References to other nodes are represented as [`SchemaKey`], which allow to
//! index into [`Schema`]. This makes it possible to represent the
//! possibly-cyclic directed graphs that self-referential records produce
//! without any `unsafe`: a node's identity is simply its index in the arena.

mod error;
pub(crate) mod recursion;

pub use error::SchemaError;

/// An Avro schema, stored as an arena of [`SchemaNode`]s
///
/// The first node (index `0`) is the root of the schema.
///
/// Schemas are immutable once built, and node identity (the [`SchemaKey`])
/// is what the plan builders use for recursion detection and memoization.
#[derive(Clone, Debug)]
pub struct Schema {
	// First node in the array is considered to be the root
	nodes: Vec<SchemaNode>,
}

impl Schema {
	/// Build a [`Schema`] from a set of nodes.
	///
	/// The first node (index `0`) is the root of the schema.
	///
	/// This fails if the arena is empty or if any node references a
	/// [`SchemaKey`] that is out of bounds.
	pub fn from_nodes(nodes: Vec<SchemaNode>) -> Result<Self, SchemaError> {
		if nodes.is_empty() {
			return Err(SchemaError::new(
				"Schema must have at least one node (the root)",
			));
		}
		let len = nodes.len();
		let check = |key: SchemaKey| -> Result<(), SchemaError> {
			if key.idx < len {
				Ok(())
			} else {
				Err(SchemaError::msg(format_args!(
					"SchemaKey index {} is out of bounds (len: {})",
					key.idx, len
				)))
			}
		};
		for node in &nodes {
			match &node.type_ {
				RegularType::Array(array) => check(array.items)?,
				RegularType::Map(map) => check(map.values)?,
				RegularType::Union(union) => {
					for &variant in &union.variants {
						check(variant)?;
					}
				}
				RegularType::Record(record) => {
					for field in &record.fields {
						check(field.type_)?;
					}
				}
				RegularType::Null
				| RegularType::Boolean
				| RegularType::Int
				| RegularType::Long
				| RegularType::Float
				| RegularType::Double
				| RegularType::Bytes
				| RegularType::String
				| RegularType::Enum(_)
				| RegularType::Fixed(_) => {}
			}
		}
		Ok(Self { nodes })
	}

	/// Obtain the underlying graph storage
	///
	/// The first node (index `0`) is the root of the schema.
	pub fn nodes(&self) -> &[SchemaNode] {
		&self.nodes
	}

	/// Obtain the root of the schema
	///
	/// It is the first node of the `nodes` `Vec`.
	pub fn root(&self) -> &SchemaNode {
		// from_nodes guarantees the arena is not empty
		&self.nodes[0]
	}

	/// Try to get the node at the given [`SchemaKey`]
	///
	/// (or return `None` if the key is invalid)
	///
	/// If you want to panic on invalid keys, use `schema[key]` instead.
	pub fn get(&self, key: SchemaKey) -> Option<&SchemaNode> {
		self.nodes.get(key.idx)
	}
}

impl std::ops::Index<SchemaKey> for Schema {
	type Output = SchemaNode;
	fn index(&self, key: SchemaKey) -> &Self::Output {
		&self.nodes[key.idx]
	}
}

/// The location of a node in a [`Schema`]
///
/// This can be used to [`Index`](std::ops::Index) into the [`Schema`].
///
/// For the plan builders, a `SchemaKey` *is* the identity of a schema node:
/// two nodes are the same node if and only if their keys are equal.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SchemaKey {
	idx: usize,
}

impl SchemaKey {
	/// Construct a new SchemaKey
	///
	/// This is expected to be an index in the [`nodes`](Schema::nodes) `Vec`
	/// of a [`Schema`].
	pub const fn from_idx(idx: usize) -> Self {
		Self { idx }
	}
	/// Obtain the index in the [`nodes`](Schema::nodes) `Vec` of a
	/// [`Schema`] that this [`SchemaKey`] points to.
	pub const fn idx(self) -> usize {
		self.idx
	}
	/// Construct a new SchemaKey representing the root of the schema
	///
	/// This is equivalent to `SchemaKey::from_idx(0)`, since the root of the
	/// schema is always simply the first element of the `nodes` array.
	pub const fn root() -> Self {
		Self { idx: 0 }
	}
}
impl std::fmt::Debug for SchemaKey {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		std::fmt::Debug::fmt(&self.idx, f)
	}
}

/// A node of an avro schema, stored in a [`Schema`].
///
/// More information about Avro schemas can be found in the
/// [Avro Specification](https://avro.apache.org/docs/current/specification/).
#[derive(Clone, Debug)]
#[non_exhaustive]
pub struct SchemaNode {
	/// The underlying regular type of this node
	pub type_: RegularType,
	/// Logical type that the avro type is annotated with, if any
	pub logical_type: Option<LogicalType>,
}

impl SchemaNode {
	/// Build a new [`SchemaNode`] from the given regular type, with no logical
	/// type.
	///
	/// This is equivalent to `type_.into()`.
	pub fn new(type_: RegularType) -> Self {
		type_.into()
	}

	/// Build a new [`SchemaNode`] from the given regular type and logical type.
	pub fn with_logical_type(type_: RegularType, logical_type: LogicalType) -> Self {
		Self {
			type_,
			logical_type: Some(logical_type),
		}
	}
}

/// A primitive or complex type of an avro schema, stored in a [`SchemaNode`].
///
/// In there, references to other nodes are represented as [`SchemaKey`],
/// which allow to index into [`Schema`].
#[derive(Clone, Debug)]
pub enum RegularType {
	/// A `null` Avro schema.
	Null,
	/// A `boolean` Avro schema.
	Boolean,
	/// An `int` Avro schema.
	Int,
	/// A `long` Avro schema.
	Long,
	/// A `float` Avro schema.
	Float,
	/// A `double` Avro schema.
	Double,
	/// A `bytes` Avro schema.
	/// `Bytes` represents a sequence of 8-bit unsigned bytes.
	Bytes,
	/// A `string` Avro schema.
	/// `String` represents a unicode character sequence.
	String,
	/// An `array` Avro schema. Avro arrays are required to have the same type
	/// for each element. This variant holds the `Schema` for the array
	/// element type.
	Array(Array),
	/// A `map` Avro schema.
	/// `Map` holds a pointer to the `Schema` of its values, which must all be
	/// the same schema. `Map` keys are assumed to be `string`.
	Map(Map),
	/// A `union` Avro schema.
	///
	/// On the wire, a union value is its variant index as a varint, followed
	/// by the value of that variant.
	Union(Union),
	/// A `record` Avro schema.
	Record(Record),
	/// An `enum` Avro schema.
	Enum(Enum),
	/// A `fixed` Avro schema.
	Fixed(Fixed),
}

impl RegularType {
	/// If the type is a named type, returns the name of the type.
	pub fn name(&self) -> Option<&Name> {
		match self {
			RegularType::Record(record) => Some(&record.name),
			RegularType::Enum(enum_) => Some(&enum_.name),
			RegularType::Fixed(fixed) => Some(&fixed.name),
			RegularType::Null
			| RegularType::Boolean
			| RegularType::Int
			| RegularType::Long
			| RegularType::Float
			| RegularType::Double
			| RegularType::Bytes
			| RegularType::String
			| RegularType::Array(_)
			| RegularType::Map(_)
			| RegularType::Union(_) => None,
		}
	}
}

/// Component of a [`Schema`]
#[derive(Clone, Debug)]
#[non_exhaustive]
pub struct Array {
	/// The key (in the [`Schema`]) of the schema of each item that will be
	/// in the array
	pub items: SchemaKey,
}
impl Array {
	/// `items` is the key (in the [`Schema`]) of the schema of each item
	/// that will be in the array
	pub fn new(items: SchemaKey) -> Self {
		Self { items }
	}
}

/// Component of a [`Schema`]
///
/// An Avro map is a collection of key-value pairs, where the keys are assumed
/// to be strings.
#[derive(Clone, Debug)]
#[non_exhaustive]
pub struct Map {
	/// The key (in the [`Schema`]) of the schema of each value that will be
	/// in the map
	pub values: SchemaKey,
}
impl Map {
	/// `values` is the key (in the [`Schema`]) of the schema of each value
	/// that will be in the map
	pub fn new(values: SchemaKey) -> Self {
		Self { values }
	}
}

/// Component of a [`Schema`]
#[derive(Clone, Debug)]
#[non_exhaustive]
pub struct Union {
	/// The keys (in the [`Schema`]) of the schemas of each variant that
	/// this Avro *union* supports.
	pub variants: Vec<SchemaKey>,
}
impl Union {
	/// `variants` is the keys (in the [`Schema`]) of the schemas of each
	/// variant that this Avro *union* supports.
	pub fn new(variants: Vec<SchemaKey>) -> Self {
		Self { variants }
	}
}

/// Component of a [`Schema`]
///
/// An avro `record` is ~equivalent to a Rust struct.
#[derive(Clone, Debug)]
#[non_exhaustive]
pub struct Record {
	/// The list of fields in this *record* (~= `struct`)
	pub fields: Vec<RecordField>,
	/// The name of the record (including namespace)
	pub name: Name,
}
impl Record {
	/// `name` is the name of the record (including namespace), and `fields`
	/// is the list of fields in this record.
	pub fn new(name: Name, fields: Vec<RecordField>) -> Self {
		Self { fields, name }
	}
}

/// Component of a [`Schema`]
#[derive(Clone, Debug)]
#[non_exhaustive]
pub struct RecordField {
	/// Name of the field
	pub name: String,
	/// The key (in the [`Schema`]) of the schema of the type of this field
	pub type_: SchemaKey,
}
impl RecordField {
	/// `schema` is the key (in the [`Schema`]) of the schema of the type of
	/// this field.
	pub fn new(name: impl Into<String>, schema: SchemaKey) -> Self {
		Self {
			name: name.into(),
			type_: schema,
		}
	}
}

/// Component of a [`Schema`]
///
/// This is the ~equivalent of a Rust `enum` where none of the variants would
/// hold any inner value. (e.g. `enum Foo { Bar, Baz }`)
#[derive(Clone, Debug)]
#[non_exhaustive]
pub struct Enum {
	/// All the variants of the enum (e.g. `["Bar", "Baz"]`)
	pub symbols: Vec<String>,
	/// The name of the enum (including namespace)
	pub name: Name,
	/// The default symbol, used by deserialization when a symbol has no
	/// counterpart on the host type
	pub default: Option<String>,
}
impl Enum {
	/// `name` is the name of the enum (including namespace), and `symbols`
	/// is the list of variants of the enum.
	pub fn new(name: Name, symbols: Vec<String>) -> Self {
		Self {
			symbols,
			name,
			default: None,
		}
	}

	/// Same as [`new`](Self::new), additionally declaring a default symbol.
	pub fn with_default(name: Name, symbols: Vec<String>, default: impl Into<String>) -> Self {
		Self {
			symbols,
			name,
			default: Some(default.into()),
		}
	}
}

/// Component of a [`Schema`]
#[derive(Clone, Debug)]
#[non_exhaustive]
pub struct Fixed {
	/// The size in bytes of the *fixed* type
	pub size: usize,
	/// The name of the *fixed* type, including the namespace
	pub name: Name,
}
impl Fixed {
	/// `name` is name of the *fixed* type, including the namespace, `size` is
	/// the size in bytes of the fixed type
	pub fn new(name: Name, size: usize) -> Self {
		Self { size, name }
	}
}

/// Schema component for named nodes of a [`Schema`]
///
/// This holds both the "name" and the "namespace".
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Name {
	fully_qualified_name: String,
	namespace_delimiter_idx: Option<usize>,
}

impl std::fmt::Debug for Name {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		std::fmt::Debug::fmt(&self.fully_qualified_name, f)
	}
}

impl Name {
	/// The rightmost component of the fully qualified name
	///
	/// e.g. in `a.b.c` it's `c`
	pub fn name(&self) -> &str {
		match self.namespace_delimiter_idx {
			None => &self.fully_qualified_name,
			Some(delimiter_idx) => &self.fully_qualified_name[delimiter_idx + 1..],
		}
	}

	/// The namespace component of the fully qualified name
	///
	/// e.g. in `a.b.c` it's `a.b`
	pub fn namespace(&self) -> Option<&str> {
		self.namespace_delimiter_idx
			.map(|idx| &self.fully_qualified_name[..idx])
	}

	/// The fully qualified name
	///
	/// e.g. in `a.b.c` it's `a.b.c`
	pub fn fully_qualified_name(&self) -> &str {
		&self.fully_qualified_name
	}

	/// Build a [`Name`] from a fully qualified name
	pub fn from_fully_qualified_name(fully_qualified_name: impl Into<String>) -> Self {
		fn non_generic_inner(mut fully_qualified_name: String) -> Name {
			Name {
				namespace_delimiter_idx: match fully_qualified_name.rfind('.') {
					Some(0) => {
						// Let's parse ".x" as {namespace: None, name: "x"}
						fully_qualified_name.remove(0);
						None
					}
					other => other,
				},
				fully_qualified_name,
			}
		}
		non_generic_inner(fully_qualified_name.into())
	}
}

/// Logical type
///
/// <https://avro.apache.org/docs/current/specification/#logical-types>
#[derive(Clone, Debug)]
#[non_exhaustive]
pub enum LogicalType {
	/// Logical type which represents `Decimal` values. The underlying type is
	/// serialized and deserialized as `Bytes` or `Fixed`, holding the
	/// two's-complement big-endian representation of the unscaled integer.
	Decimal(Decimal),
	/// Logical type which represents the number of days since the unix epoch.
	///
	/// Annotates an [`Int`](RegularType::Int).
	Date,
	/// The time of day in number of milliseconds after midnight with no
	/// reference to any calendar, time zone or date in particular.
	///
	/// Annotates an [`Int`](RegularType::Int).
	TimeMillis,
	/// The time of day in number of microseconds after midnight with no
	/// reference to any calendar, time zone or date in particular.
	///
	/// Annotates a [`Long`](RegularType::Long).
	TimeMicros,
	/// An instant in time represented as the number of milliseconds after
	/// the UNIX epoch.
	///
	/// Annotates a [`Long`](RegularType::Long).
	TimestampMillis,
	/// An instant in time represented as the number of microseconds after
	/// the UNIX epoch.
	///
	/// Annotates a [`Long`](RegularType::Long).
	TimestampMicros,
	/// An instant in time represented as the number of nanoseconds after
	/// the UNIX epoch.
	///
	/// Annotates a [`Long`](RegularType::Long).
	TimestampNanos,
	/// An amount of time defined by a number of months, days and
	/// milliseconds, stored as three little-endian unsigned 32-bit integers
	/// in a [`Fixed`](RegularType::Fixed) of size 12.
	Duration,
}

/// Component of a [`Schema`]
#[derive(Clone, Debug)]
#[non_exhaustive]
pub struct Decimal {
	/// The scale of the decimal number, which is the number of digits to the
	/// right of the decimal point.
	pub scale: u32,
	/// The precision of the decimal number, which is the number of
	/// significant digits in the number.
	pub precision: usize,
}
impl Decimal {
	/// `scale` is the number of digits to the right of the decimal point, and
	/// `precision` is the number of significant digits in the number.
	pub fn new(scale: u32, precision: usize) -> Self {
		Self { precision, scale }
	}
}

impl LogicalType {
	/// The name of the logical type, as it appears in schema declarations
	pub fn as_str(&self) -> &str {
		match self {
			LogicalType::Decimal(_) => "decimal",
			LogicalType::Date => "date",
			LogicalType::TimeMillis => "time-millis",
			LogicalType::TimeMicros => "time-micros",
			LogicalType::TimestampMillis => "timestamp-millis",
			LogicalType::TimestampMicros => "timestamp-micros",
			LogicalType::TimestampNanos => "timestamp-nanos",
			LogicalType::Duration => "duration",
		}
	}
}

impl From<RegularType> for SchemaNode {
	fn from(regular_type: RegularType) -> Self {
		Self {
			type_: regular_type,
			logical_type: None,
		}
	}
}

macro_rules! impl_froms_for_regular_type {
	($($variant: ident)*) => {
		$(
			impl From<$variant> for RegularType {
				fn from(variant: $variant) -> Self {
					Self::$variant(variant)
				}
			}
			impl From<$variant> for SchemaNode {
				fn from(variant: $variant) -> Self {
					Self {
						type_: RegularType::$variant(variant),
						logical_type: None,
					}
				}
			}
		)*
	};
}
impl_froms_for_regular_type! { Array Map Union Record Enum Fixed }
