//! 串口后端
//!
//! 基于 `serialport` crate 的真实总线实现。舵机总线为半双工
//! 请求-应答模式：写出一帧指令后在同一条线上读回状态包。

use crate::{BusAdapter, BusError};
use serialport::SerialPort;
use std::io::{Read, Write};
use std::time::Duration;
use tracing::debug;

/// 默认读超时
///
/// 250 Hz 周期为 4ms，单次事务的应答必须远小于一个周期。
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(2);

/// 串口总线适配器
pub struct SerialBus {
    port: Box<dyn SerialPort>,
}

impl SerialBus {
    /// 打开串口
    ///
    /// # 参数
    ///
    /// - `path`: 设备路径（如 `/dev/ttyUSB0`）
    /// - `baud_rate`: 波特率（X 系列默认出厂 57600，本控制器使用 3M）
    pub fn open(path: &str, baud_rate: u32) -> Result<Self, BusError> {
        let port = serialport::new(path, baud_rate)
            .timeout(DEFAULT_TIMEOUT)
            .open()
            .map_err(|e| BusError::Device(format!("{path}: {e}")))?;
        debug!(path, baud_rate, "serial bus opened");
        Ok(Self { port })
    }
}

impl BusAdapter for SerialBus {
    fn send(&mut self, bytes: &[u8]) -> Result<(), BusError> {
        self.port.write_all(bytes)?;
        self.port.flush()?;
        Ok(())
    }

    fn recv_exact(&mut self, buf: &mut [u8]) -> Result<(), BusError> {
        match self.port.read_exact(buf) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => Err(BusError::Timeout),
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Err(BusError::Timeout),
            Err(e) => Err(BusError::Io(e)),
        }
    }

    fn set_timeout(&mut self, timeout: Duration) -> Result<(), BusError> {
        self.port
            .set_timeout(timeout)
            .map_err(|e| BusError::Device(e.to_string()))
    }

    fn discard_input(&mut self) -> Result<(), BusError> {
        self.port
            .clear(serialport::ClearBuffer::Input)
            .map_err(|e| BusError::Device(e.to_string()))
    }
}
