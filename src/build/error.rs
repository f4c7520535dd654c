use std::borrow::Cow;

/// Any error that may happen while building a plan
///
/// These are raised eagerly, so that no later wire operation can encounter a
/// mis-shapen plan.
#[derive(thiserror::Error)]
#[error("{}", inner)]
pub struct BuildError {
	inner: Box<ErrorInner>,
}

/// Which class of build failure a [`BuildError`] is
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BuildErrorKind {
	/// A case cannot handle the shape of the schema (e.g. a decimal logical
	/// type on a node that is neither `bytes` nor `fixed`, or an empty
	/// union)
	UnsupportedSchema,
	/// No case can map the host type to the schema (missing record member,
	/// ambiguous enum member, no viable constructor, ...)
	///
	/// When this comes from exhausting the case list, the per-case rejection
	/// reasons are available through [`attempts`](BuildError::attempts).
	UnsupportedType,
}

struct ErrorInner {
	kind: BuildErrorKind,
	message: Cow<'static, str>,
	attempts: Vec<String>,
}

impl BuildError {
	/// A case cannot handle the shape of the schema
	///
	/// Public so that custom cases can report malformed schema shapes.
	pub fn unsupported_schema(message: impl std::fmt::Display) -> Self {
		Self {
			inner: Box::new(ErrorInner {
				kind: BuildErrorKind::UnsupportedSchema,
				message: Cow::Owned(message.to_string()),
				attempts: Vec::new(),
			}),
		}
	}

	/// A case cannot map the host type to the schema
	///
	/// Public so that custom cases can report unmappable host types.
	pub fn unsupported_type(message: impl std::fmt::Display) -> Self {
		Self {
			inner: Box::new(ErrorInner {
				kind: BuildErrorKind::UnsupportedType,
				message: Cow::Owned(message.to_string()),
				attempts: Vec::new(),
			}),
		}
	}

	/// Built when every case in the list rejected the `(schema, type)` pair
	pub(crate) fn no_case_matched(message: impl std::fmt::Display, attempts: Vec<String>) -> Self {
		Self {
			inner: Box::new(ErrorInner {
				kind: BuildErrorKind::UnsupportedType,
				message: Cow::Owned(message.to_string()),
				attempts,
			}),
		}
	}

	/// Which class of build failure this is
	pub fn kind(&self) -> BuildErrorKind {
		self.inner.kind
	}

	/// The chain of per-case rejection reasons, when no case matched
	pub fn attempts(&self) -> &[String] {
		&self.inner.attempts
	}
}

impl std::fmt::Display for ErrorInner {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(&self.message)?;
		if !self.attempts.is_empty() {
			f.write_str(" (attempted cases: ")?;
			for (i, attempt) in self.attempts.iter().enumerate() {
				if i > 0 {
					f.write_str("; ")?;
				}
				f.write_str(attempt)?;
			}
			f.write_str(")")?;
		}
		Ok(())
	}
}

impl std::fmt::Debug for BuildError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		std::fmt::Display::fmt(&self.inner, f)
	}
}
