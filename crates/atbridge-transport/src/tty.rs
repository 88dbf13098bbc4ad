use std::fs::OpenOptions;
use std::io::ErrorKind;
use std::os::fd::{AsRawFd, OwnedFd, RawFd};
use std::os::unix::fs::OpenOptionsExt;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::link::SerialLink;

/// Per-port read timeout applied when the port is opened.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(1);

/// A POSIX serial port.
///
/// Constructed unopened from a device path and baud rate; [`SerialLink::open`]
/// opens the device, switches the line to raw mode, and applies the baud rate
/// and read timeout. The descriptor lives in a mutex-guarded cell: `close`
/// takes it out, every I/O call briefly borrows it, so a close racing an
/// in-flight poll surfaces as [`TransportError::Closed`] on the loser.
pub struct TtyPort {
    name: String,
    baud: u32,
    read_timeout: Duration,
    fd: Mutex<Option<OwnedFd>>,
}

impl TtyPort {
    /// Describe a port without opening it.
    pub fn new(name: impl Into<String>, baud: u32) -> Self {
        Self {
            name: name.into(),
            baud,
            read_timeout: DEFAULT_READ_TIMEOUT,
            fd: Mutex::new(None),
        }
    }

    /// Override the read timeout applied at open.
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Configured baud rate.
    pub fn baud(&self) -> u32 {
        self.baud
    }

    fn guard(&self) -> MutexGuard<'_, Option<OwnedFd>> {
        self.fd.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn closed(&self) -> TransportError {
        TransportError::Closed {
            port: self.name.clone(),
        }
    }

    fn io_error(&self, source: std::io::Error) -> TransportError {
        TransportError::Io {
            port: self.name.clone(),
            source,
        }
    }

    /// Switch the line to raw mode and apply baud rate and read timeout.
    fn configure(&self, fd: RawFd, speed: libc::speed_t) -> std::io::Result<()> {
        let mut tio = std::mem::MaybeUninit::<libc::termios>::uninit();
        // SAFETY: `fd` is an open descriptor owned by this port and `tio` is
        // a valid writable pointer for the duration of the call.
        if unsafe { libc::tcgetattr(fd, tio.as_mut_ptr()) } != 0 {
            return Err(std::io::Error::last_os_error());
        }
        // SAFETY: `tcgetattr` succeeded, so `tio` is initialized.
        let mut tio = unsafe { tio.assume_init() };

        // SAFETY: `tio` is a valid termios struct owned by this frame.
        unsafe {
            libc::cfmakeraw(&mut tio);
            libc::cfsetispeed(&mut tio, speed);
            libc::cfsetospeed(&mut tio, speed);
        }
        tio.c_cflag |= libc::CREAD | libc::CLOCAL;
        tio.c_cc[libc::VMIN] = 0;
        tio.c_cc[libc::VTIME] = read_timeout_deciseconds(self.read_timeout);

        // SAFETY: as above; `tio` is fully initialized.
        if unsafe { libc::tcsetattr(fd, libc::TCSANOW, &tio) } != 0 {
            return Err(std::io::Error::last_os_error());
        }

        // The device was opened with O_NONBLOCK so open() cannot hang on
        // carrier detect; clear it now that VMIN/VTIME bound blocking reads.
        // SAFETY: `fd` is an open descriptor owned by this port.
        let flags = unsafe { libc::fcntl(fd, libc::F_GETFL) };
        if flags < 0 {
            return Err(std::io::Error::last_os_error());
        }
        // SAFETY: as above.
        if unsafe { libc::fcntl(fd, libc::F_SETFL, flags & !libc::O_NONBLOCK) } < 0 {
            return Err(std::io::Error::last_os_error());
        }
        Ok(())
    }
}

impl SerialLink for TtyPort {
    fn name(&self) -> &str {
        &self.name
    }

    fn open(&self) -> Result<()> {
        let mut guard = self.guard();
        if guard.is_some() {
            return Ok(());
        }

        let speed = baud_flag(self.baud)?;
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_NOCTTY | libc::O_NONBLOCK)
            .open(&self.name)
            .map_err(|source| TransportError::Open {
                port: self.name.clone(),
                source,
            })?;
        let fd = OwnedFd::from(file);

        self.configure(fd.as_raw_fd(), speed)
            .map_err(|source| TransportError::Open {
                port: self.name.clone(),
                source,
            })?;

        info!(port = %self.name, baud = self.baud, "opened serial port");
        *guard = Some(fd);
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.guard().is_some()
    }

    fn bytes_available(&self) -> Result<usize> {
        let guard = self.guard();
        let fd = guard.as_ref().ok_or_else(|| self.closed())?;

        let mut pending: libc::c_int = 0;
        // SAFETY: the guard proves `fd` is open; `pending` is a valid
        // out-pointer for the request.
        if unsafe { libc::ioctl(fd.as_raw_fd(), libc::FIONREAD, &mut pending) } != 0 {
            return Err(self.io_error(std::io::Error::last_os_error()));
        }
        Ok(pending.max(0) as usize)
    }

    fn read(&self, buf: &mut [u8]) -> Result<usize> {
        let guard = self.guard();
        let fd = guard.as_ref().ok_or_else(|| self.closed())?;

        loop {
            // SAFETY: the guard proves `fd` is open; `buf` is valid for
            // writes of `buf.len()` bytes.
            let n = unsafe { libc::read(fd.as_raw_fd(), buf.as_mut_ptr().cast(), buf.len()) };
            if n >= 0 {
                return Ok(n as usize);
            }
            let err = std::io::Error::last_os_error();
            if err.kind() == ErrorKind::Interrupted {
                continue;
            }
            return Err(self.io_error(err));
        }
    }

    fn write_all(&self, buf: &[u8]) -> Result<()> {
        let guard = self.guard();
        let fd = guard.as_ref().ok_or_else(|| self.closed())?;

        let mut offset = 0usize;
        while offset < buf.len() {
            // SAFETY: the guard proves `fd` is open; the pointer/length pair
            // stays within `buf`.
            let n = unsafe {
                libc::write(
                    fd.as_raw_fd(),
                    buf[offset..].as_ptr().cast(),
                    buf.len() - offset,
                )
            };
            if n > 0 {
                offset += n as usize;
                continue;
            }
            if n == 0 {
                return Err(self.closed());
            }
            let err = std::io::Error::last_os_error();
            if err.kind() == ErrorKind::Interrupted {
                continue;
            }
            return Err(self.io_error(err));
        }
        Ok(())
    }

    fn reset_input(&self) -> Result<()> {
        let guard = self.guard();
        let fd = guard.as_ref().ok_or_else(|| self.closed())?;

        // SAFETY: the guard proves `fd` is open.
        if unsafe { libc::tcflush(fd.as_raw_fd(), libc::TCIFLUSH) } != 0 {
            return Err(self.io_error(std::io::Error::last_os_error()));
        }
        debug!(port = %self.name, "flushed input buffer");
        Ok(())
    }

    fn close(&self) {
        let mut guard = self.guard();
        if guard.take().is_some() {
            debug!(port = %self.name, "closed serial port");
        }
    }
}

impl Drop for TtyPort {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for TtyPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtyPort")
            .field("name", &self.name)
            .field("baud", &self.baud)
            .field("open", &self.is_open())
            .finish()
    }
}

fn read_timeout_deciseconds(timeout: Duration) -> libc::cc_t {
    (timeout.as_millis().div_ceil(100)).clamp(1, 255) as libc::cc_t
}

fn baud_flag(baud: u32) -> Result<libc::speed_t> {
    let speed = match baud {
        1200 => libc::B1200,
        2400 => libc::B2400,
        4800 => libc::B4800,
        9600 => libc::B9600,
        19200 => libc::B19200,
        38400 => libc::B38400,
        57600 => libc::B57600,
        115200 => libc::B115200,
        230400 => libc::B230400,
        #[cfg(target_os = "linux")]
        460800 => libc::B460800,
        #[cfg(target_os = "linux")]
        921600 => libc::B921600,
        other => return Err(TransportError::UnsupportedBaud { baud: other }),
    };
    Ok(speed)
}
