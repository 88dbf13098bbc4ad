use crate::error::Result;

/// Capability surface of a serial-like endpoint.
///
/// The underlying transport only exposes "bytes currently buffered", not a
/// blocking wait primitive; callers poll [`bytes_available`] and read what is
/// there. Methods take `&self` so the cycle thread can keep polling a port
/// while an external stop request closes it — a racing call on a closed port
/// surfaces as [`TransportError::Closed`], never undefined behavior.
///
/// [`bytes_available`]: SerialLink::bytes_available
/// [`TransportError::Closed`]: crate::error::TransportError::Closed
pub trait SerialLink {
    /// Identifying name (the device path for real ports).
    fn name(&self) -> &str;

    /// Open the endpoint. Reads and writes are invalid until this succeeds.
    fn open(&self) -> Result<()>;

    /// Whether the endpoint is currently open.
    fn is_open(&self) -> bool;

    /// Number of bytes buffered and ready to read without blocking.
    fn bytes_available(&self) -> Result<usize>;

    /// Read up to `buf.len()` bytes, returning the count actually read.
    fn read(&self, buf: &mut [u8]) -> Result<usize>;

    /// Write the whole buffer.
    fn write_all(&self, buf: &[u8]) -> Result<()>;

    /// Discard any bytes buffered on the input side.
    fn reset_input(&self) -> Result<()>;

    /// Close the endpoint. Closing an already-closed endpoint is a no-op.
    fn close(&self);
}
