//! The default serializer case list
//!
//! Order matters: logical types are offered the pair before the plain
//! primitive cases, so that e.g. a `bytes` node annotated as a decimal is
//! handled as a decimal.

mod blocks;
mod enums;
mod logical;
mod primitives;
mod record;
mod union;

use super::{SerError, SerPlan, SerializerBuilder, SerializerCase, SerializerState};

use crate::{
	build::{BuildContext, BuildError, CaseOutcome, CaseResult},
	convert,
	schema::{LogicalType, RegularType, SchemaKey},
	types::{TypeDescriptor, TypeKind, Value},
};

use std::sync::Arc;

pub(super) fn default_cases() -> Vec<Box<dyn SerializerCase>> {
	vec![
		Box::new(logical::DecimalCase),
		Box::new(logical::DurationCase),
		Box::new(logical::DateCase),
		Box::new(logical::TimeCase),
		Box::new(logical::TimestampCase),
		Box::new(primitives::PrimitiveCase),
		Box::new(blocks::ArrayCase),
		Box::new(blocks::MapCase),
		Box::new(enums::EnumCase),
		Box::new(record::RecordCase),
		Box::new(union::UnionCase),
	]
}
