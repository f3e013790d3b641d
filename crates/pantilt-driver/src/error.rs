//! 驱动层错误类型定义

use pantilt_bus::BusError;
use pantilt_protocol::ProtocolError;
use thiserror::Error;

/// 驱动层错误类型
#[derive(Error, Debug)]
pub enum PortError {
    /// 设备不存在（ping 无应答，或单位换算时型号未登记）
    #[error("Servo {0} not found on the bus")]
    NotFound(u8),

    /// 总线传输错误（含超时）
    #[error("Bus error: {0}")]
    Bus(#[from] BusError),

    /// 协议解析错误
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// 舵机状态包携带硬件错误位
    #[error("Servo {id} reported hardware error bits {bits:#04X}")]
    Status { id: u8, bits: u8 },

    /// 应答来自预期之外的 ID
    #[error("Unexpected response from servo {actual} (expected {expected})")]
    WrongId { expected: u8, actual: u8 },
}

impl PortError {
    /// 是否为瞬时故障（可在下一周期自然恢复）
    ///
    /// 瞬时故障由控制循环就地消化；非瞬时故障在启动阶段视为致命。
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            PortError::Bus(BusError::Timeout) | PortError::Bus(BusError::Io(_))
        )
    }
}
