//! The default deserializer case list
//!
//! Mirrors the serializer's list: logical types first, then primitives,
//! arrays and maps, enums, records, and unions.

mod blocks;
mod enums;
mod logical;
mod primitives;
mod record;
mod union;

use super::{DeError, DePlan, DeserializerBuilder, DeserializerCase, Reader};

use crate::{
	build::{BuildContext, BuildError, CaseOutcome, CaseResult},
	convert,
	schema::{LogicalType, RegularType, SchemaKey},
	types::{TypeDescriptor, TypeKind, Value},
};

use std::sync::Arc;

pub(super) fn default_cases() -> Vec<Box<dyn DeserializerCase>> {
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
