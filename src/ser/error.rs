use std::borrow::Cow;

use crate::types::Value;

/// Any error that may happen while running a serialization plan
#[derive(thiserror::Error)]
#[error("{}", inner.message)]
pub struct SerError {
	inner: Box<ErrorInner>,
}

/// Which class of runtime serialization failure a [`SerError`] is
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SerErrorKind {
	/// A numeric coercion or fixed-size boundary would lose information
	Overflow,
	/// A runtime dispatch found no branch or symbol matching the value, or
	/// the value does not have the shape the plan was built for
	InvalidValue,
	/// The underlying writer failed
	Io,
}

struct ErrorInner {
	kind: SerErrorKind,
	message: Cow<'static, str>,
}

impl std::fmt::Debug for SerError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		std::fmt::Debug::fmt(&*self.inner.message, f)
	}
}

impl SerError {
	fn new(kind: SerErrorKind, message: Cow<'static, str>) -> Self {
		Self {
			inner: Box::new(ErrorInner { kind, message }),
		}
	}

	/// A coercion would lose information
	///
	/// Public so that custom cases and conversions can raise it.
	pub fn overflow(message: impl std::fmt::Display) -> Self {
		Self::new(SerErrorKind::Overflow, Cow::Owned(message.to_string()))
	}

	/// The value cannot be represented under the schema
	///
	/// Public so that custom cases and conversions can raise it.
	pub fn invalid_value(message: impl std::fmt::Display) -> Self {
		Self::new(SerErrorKind::InvalidValue, Cow::Owned(message.to_string()))
	}

	/// For when a plan got handed a value whose shape does not match what it
	/// was built for
	pub(crate) fn coercion(expected: impl std::fmt::Display, got: &Value) -> Self {
		Self::invalid_value(format_args!(
			"cannot serialize {} value where {expected} is expected",
			got.kind_name()
		))
	}

	pub(crate) fn io(io_error: std::io::Error) -> Self {
		Self::new(
			SerErrorKind::Io,
			Cow::Owned(format!(
				"Encountered IO error when attempting to write for serialization: {io_error}"
			)),
		)
	}

	/// Which class of runtime serialization failure this is
	pub fn kind(&self) -> SerErrorKind {
		self.inner.kind
	}
}
