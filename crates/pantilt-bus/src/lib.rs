//! # Pantilt Bus Adapter Layer
//!
//! 舵机串行总线硬件抽象层，提供统一的字节流收发接口。
//!
//! 协议层（pantilt-protocol）负责组包和解析，本层只负责把字节
//! 送上总线、在限定时间内收回应答。所有读取都带有界超时：挂死的
//! 设备表现为 [`BusError::Timeout`]，由上层作为单周期瞬时故障处理，
//! 不会无限阻塞控制循环。

use std::time::Duration;
use thiserror::Error;

#[cfg(feature = "serial")]
pub mod serial;

#[cfg(feature = "serial")]
pub use serial::SerialBus;

/// 总线适配层统一错误类型
#[derive(Error, Debug)]
pub enum BusError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Read timeout")]
    Timeout,
    #[error("Device disconnected")]
    Disconnected,
    #[error("Device Error: {0}")]
    Device(String),
}

/// 字节流总线适配器
///
/// 实现者需保证：
/// - `send` 把整个缓冲区写上总线（可内部阻塞，但有界）
/// - `recv_exact` 在超时内读满缓冲区，否则返回 [`BusError::Timeout`]
pub trait BusAdapter: Send {
    /// 发送一帧完整的指令字节
    fn send(&mut self, bytes: &[u8]) -> Result<(), BusError>;

    /// 精确读取 `buf.len()` 字节的应答
    fn recv_exact(&mut self, buf: &mut [u8]) -> Result<(), BusError>;

    /// 设置读超时（默认实现忽略）
    fn set_timeout(&mut self, _timeout: Duration) -> Result<(), BusError> {
        Ok(())
    }

    /// 丢弃残留在接收缓冲里的字节
    ///
    /// 事务开始前调用，避免上一次失败事务的半截应答污染本次解析。
    fn discard_input(&mut self) -> Result<(), BusError> {
        Ok(())
    }
}
