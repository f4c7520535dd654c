//! Byte-level reading for the deserializer
//!
//! A [`Reader`] is a cursor over an immutable byte slice. Its index only
//! ever advances, and it is what [`InvalidEncoding`](super::DeErrorKind::InvalidEncoding)
//! errors cite as the failure position.

use super::DeError;

use integer_encoding::VarInt;

/// Cursor over the byte slice a plan deserializes from
///
/// Each plan invocation gets a fresh `Reader` bound to the caller-supplied
/// slice; plans never share reader state.
pub struct Reader<'de> {
	buf: &'de [u8],
	pos: usize,
}

impl<'de> Reader<'de> {
	/// Construct a `Reader` over the given slice, positioned at its start
	pub fn new(buf: &'de [u8]) -> Self {
		Self { buf, pos: 0 }
	}

	/// The current byte offset from the start of the slice
	pub fn position(&self) -> usize {
		self.pos
	}

	/// Read an integer using varint (zigzag for signed types) encoding
	///
	/// Encodings that never terminate (more than 10 bytes for an `i64`) and
	/// truncated input both surface as `InvalidEncoding`.
	pub fn read_varint<I>(&mut self) -> Result<I, DeError>
	where
		I: VarInt,
	{
		match I::decode_var(&self.buf[self.pos..]) {
			None => Err(DeError::invalid_encoding(
				self.pos,
				"invalid varint: all bytes have their continuation bit set within the \
					encodable length, or the input is truncated",
			)),
			Some((val, read)) => {
				self.pos += read;
				Ok(val)
			}
		}
	}

	/// Read a length prefix: a varint `long` that must be non-negative
	pub(crate) fn read_len(&mut self) -> Result<usize, DeError> {
		let position = self.pos;
		let len: i64 = self.read_varint()?;
		usize::try_from(len).map_err(|_| {
			DeError::invalid_encoding(position, format_args!("negative length prefix: {len}"))
		})
	}

	/// Read a single-byte boolean: `0x00` is false, anything else is true
	pub(crate) fn read_bool(&mut self) -> Result<bool, DeError> {
		let [byte] = self.read_const_size_buf::<1>()?;
		Ok(byte != 0x00)
	}

	/// Read a buffer of size `N`, returning it as an array
	///
	/// The deserializer often needs fixed-size buffers to immediately turn
	/// them into values (floats, duration fields...).
	pub(crate) fn read_const_size_buf<const N: usize>(&mut self) -> Result<[u8; N], DeError> {
		let slice = self.read_slice(N)?;
		let mut buf = [0u8; N];
		buf.copy_from_slice(slice);
		Ok(buf)
	}

	/// Read a slice of `n` bytes
	pub(crate) fn read_slice(&mut self, n: usize) -> Result<&'de [u8], DeError> {
		match self
			.pos
			.checked_add(n)
			.and_then(|end| self.buf.get(self.pos..end))
		{
			None => Err(self.unexpected_eof(n)),
			Some(slice) => {
				self.pos += n;
				Ok(slice)
			}
		}
	}

	/// Read a slice of `n` bytes that must be valid UTF-8
	pub(crate) fn read_str(&mut self, n: usize) -> Result<&'de str, DeError> {
		let position = self.pos;
		let slice = self.read_slice(n)?;
		std::str::from_utf8(slice).map_err(|utf8_error| {
			DeError::invalid_encoding(
				position,
				format_args!("string payload is not valid UTF-8: {utf8_error}"),
			)
		})
	}

	/// Advance over `n` bytes without looking at them
	pub(crate) fn advance(&mut self, n: usize) -> Result<(), DeError> {
		if self.buf.len() - self.pos < n {
			return Err(self.unexpected_eof(n));
		}
		self.pos += n;
		Ok(())
	}

	fn unexpected_eof(&self, wanted: usize) -> DeError {
		DeError::invalid_encoding(
			self.pos,
			format_args!(
				"unexpected end of input: {wanted} more byte(s) required, {} available",
				self.buf.len() - self.pos
			),
		)
	}
}
