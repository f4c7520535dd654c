use std::borrow::Cow;

/// Any error that may happen while running a deserialization plan
#[derive(thiserror::Error)]
#[error("{}", inner)]
pub struct DeError {
	inner: Box<ErrorInner>,
}

/// Which class of runtime deserialization failure a [`DeError`] is
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeErrorKind {
	/// Malformed wire data: varint overflow, union or enum index out of
	/// range, truncated input, ...
	///
	/// When it is known, the byte offset at which decoding failed is
	/// available through [`position`](DeError::position).
	InvalidEncoding,
	/// A numeric coercion or fixed-size boundary would lose information
	Overflow,
	/// The decoded value cannot be represented by the target type
	InvalidValue,
}

struct ErrorInner {
	kind: DeErrorKind,
	message: Cow<'static, str>,
	position: Option<usize>,
}

impl std::fmt::Display for ErrorInner {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(&self.message)?;
		if let Some(position) = self.position {
			write!(f, " (at byte offset {position})")?;
		}
		Ok(())
	}
}

impl std::fmt::Debug for DeError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		std::fmt::Display::fmt(&self.inner, f)
	}
}

impl DeError {
	fn new(kind: DeErrorKind, message: Cow<'static, str>, position: Option<usize>) -> Self {
		Self {
			inner: Box::new(ErrorInner {
				kind,
				message,
				position,
			}),
		}
	}

	/// Malformed wire data detected at the given reader position
	///
	/// Public so that custom cases can raise it.
	pub fn invalid_encoding(position: usize, message: impl std::fmt::Display) -> Self {
		Self::new(
			DeErrorKind::InvalidEncoding,
			Cow::Owned(message.to_string()),
			Some(position),
		)
	}

	/// A coercion would lose information
	///
	/// Public so that custom cases, conversions and [`HostValue`]
	/// implementations can raise it.
	///
	/// [`HostValue`]: crate::types::HostValue
	pub fn overflow(message: impl std::fmt::Display) -> Self {
		Self::new(DeErrorKind::Overflow, Cow::Owned(message.to_string()), None)
	}

	/// The decoded value cannot be represented by the target type
	///
	/// Public so that custom cases, conversions and [`HostValue`]
	/// implementations can raise it.
	///
	/// [`HostValue`]: crate::types::HostValue
	pub fn invalid_value(message: impl std::fmt::Display) -> Self {
		Self::new(
			DeErrorKind::InvalidValue,
			Cow::Owned(message.to_string()),
			None,
		)
	}

	/// Which class of runtime deserialization failure this is
	pub fn kind(&self) -> DeErrorKind {
		self.inner.kind
	}

	/// The byte offset at which decoding failed, when known
	///
	/// Only [`InvalidEncoding`](DeErrorKind::InvalidEncoding) errors carry
	/// one.
	pub fn position(&self) -> Option<usize> {
		self.inner.position
	}
}
