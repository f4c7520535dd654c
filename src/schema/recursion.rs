use super::{RegularType, Schema, SchemaKey};

/// Mark which nodes of the schema lie on a cyclic path.
///
/// The returned `Vec` is indexed by [`SchemaKey`] index. The plan builders
/// consult it to decide whether a record plan needs to be indirected through
/// a named binding, so that building terminates at the cycle.
///
/// This is a depth-first walk maintaining the current path: when a node that
/// is already on the path is encountered again, every node from that
/// occurrence up to the current depth is part of the cycle.
pub(crate) fn recursive_nodes(schema: &Schema) -> Vec<bool> {
	let mut recursive = vec![false; schema.nodes().len()];
	let mut finished = vec![false; schema.nodes().len()];
	let mut path = Vec::new();
	walk(
		schema,
		SchemaKey::root(),
		&mut path,
		&mut recursive,
		&mut finished,
	);
	recursive
}

fn walk(
	schema: &Schema,
	key: SchemaKey,
	path: &mut Vec<usize>,
	recursive: &mut [bool],
	finished: &mut [bool],
) {
	let idx = key.idx();
	if let Some(position) = path.iter().position(|&on_path| on_path == idx) {
		// Back-edge: everything from the first occurrence of this node up to
		// the current depth is on the cycle
		for &on_cycle in &path[position..] {
			recursive[on_cycle] = true;
		}
		return;
	}
	if finished[idx] {
		// Already fully explored from a previous path: any cycle through this
		// node was found then
		return;
	}
	path.push(idx);
	match &schema[key].type_ {
		RegularType::Array(array) => walk(schema, array.items, path, recursive, finished),
		RegularType::Map(map) => walk(schema, map.values, path, recursive, finished),
		RegularType::Union(union) => {
			for &variant in &union.variants {
				walk(schema, variant, path, recursive, finished);
			}
		}
		RegularType::Record(record) => {
			for field in &record.fields {
				walk(schema, field.type_, path, recursive, finished);
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
	path.pop();
	finished[idx] = true;
}
