use serialport::SerialPort;
use std::io::{self, Read};
use std::time::Duration;

use super::serial::open_port;

/// Abstraction over the receiving end of a board link
pub trait PortChannel: Read + Send {
    /// Set timeout for blocking reads
    fn set_timeout(&mut self, timeout: Duration) -> io::Result<()>;

    /// Get number of bytes available to read
    fn bytes_to_read(&mut self) -> io::Result<u32>;

    /// Discard everything received but not yet read
    fn clear_input_buffer(&mut self) -> io::Result<()>;

    /// Try to clone the channel, sharing the underlying port
    fn try_clone(&self) -> io::Result<Box<dyn PortChannel>>;
}

/// Opens channels by port name
pub trait PortOpener: Send {
    /// Open `name` with the given baud rate and initial read timeout
    fn open(&self, name: &str, baud_rate: u32, timeout: Duration) -> io::Result<Box<dyn PortChannel>>;
}

/// Serial port wrapper implementing PortChannel
pub struct SerialChannel {
    port: Box<dyn SerialPort>,
}

impl SerialChannel {
    /// Wrap an opened port
    pub fn new(port: Box<dyn SerialPort>) -> Self {
        Self { port }
    }
}

impl Read for SerialChannel {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.port.read(buf)
    }
}

impl PortChannel for SerialChannel {
    fn set_timeout(&mut self, timeout: Duration) -> io::Result<()> {
        self.port.set_timeout(timeout).map_err(io::Error::from)
    }

    fn bytes_to_read(&mut self) -> io::Result<u32> {
        self.port.bytes_to_read().map_err(io::Error::from)
    }

    fn clear_input_buffer(&mut self) -> io::Result<()> {
        self.port
            .clear(serialport::ClearBuffer::Input)
            .map_err(io::Error::from)
    }

    fn try_clone(&self) -> io::Result<Box<dyn PortChannel>> {
        let port_clone = self.port.try_clone().map_err(io::Error::from)?;
        Ok(Box::new(SerialChannel::new(port_clone)))
    }
}

/// Opens real serial ports through the `serialport` crate
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialOpener;

impl PortOpener for SerialOpener {
    fn open(&self, name: &str, baud_rate: u32, timeout: Duration) -> io::Result<Box<dyn PortChannel>> {
        let port = open_port(name, baud_rate, timeout)?;
        Ok(Box::new(SerialChannel::new(port)))
    }
}
