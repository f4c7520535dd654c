use super::*;

/// Handles `union` schema nodes: read the varint index, range-check it, and
/// dispatch to the branch's plan
///
/// Each branch's plan is built against the host type the descriptor selects
/// for it ([`Optional`](TypeKind::Optional) selects its inner type for
/// non-null branches; everything else selects the requested target type).
pub(super) struct UnionCase;

impl DeserializerCase for UnionCase {
	fn name(&self) -> &'static str {
		"union"
	}

	fn build(
		&self,
		builder: &DeserializerBuilder,
		key: SchemaKey,
		ty: &TypeDescriptor,
		ctx: &mut BuildContext<'_>,
	) -> CaseResult<DePlan> {
		let RegularType::Union(union) = &ctx.schema()[key].type_ else {
			return Ok(CaseOutcome::no_match("schema is not a union"));
		};
		if union.variants.is_empty() {
			return Err(BuildError::unsupported_schema("union has no branches"));
		}
		let variants = union.variants.clone();
		let mut branch_plans: Vec<DePlan> = Vec::with_capacity(variants.len());
		// The null branch's plan decodes to null whatever type it is built
		// against, so every branch can use the descriptor-selected type
		let branch_ty = ty.union_branch_type();
		for &variant_key in &variants {
			branch_plans.push(builder.build_node(variant_key, &branch_ty, ctx)?);
		}
		Ok(CaseOutcome::Built(Arc::new(move |reader| {
			let position = reader.position();
			let index: i64 = reader.read_varint()?;
			let branch_plan = usize::try_from(index)
				.ok()
				.and_then(|index| branch_plans.get(index))
				.ok_or_else(|| {
					DeError::invalid_encoding(
						position,
						format_args!(
							"union index {index} is out of range (0..{})",
							branch_plans.len()
						),
					)
				})?;
			(**branch_plan)(reader)
		})))
	}
}
