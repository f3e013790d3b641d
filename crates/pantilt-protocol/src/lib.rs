//! # Pantilt Protocol
//!
//! 舵机串行总线协议定义（无硬件依赖）
//!
//! ## 模块
//!
//! - `registers`: 控制表寄存器定义与数值编解码
//! - `packet`: 指令包/状态包构建与解析（含 CRC-16 校验）
//! - `model`: 舵机型号表与工程单位换算
//!
//! ## 字节序
//!
//! 协议使用 Intel (LSB) 低位在前（小端字节序），包括长度字段、
//! 寄存器数值和 CRC 校验码。

pub mod model;
pub mod packet;
pub mod registers;

// 重新导出常用类型
pub use model::ModelInfo;
pub use packet::{InstructionPacket, StatusPacket, crc16};
pub use registers::{Instruction, OperatingMode, Register};

use thiserror::Error;

/// 协议层统一错误类型
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// 包头不匹配（期望 FF FF FD 00）
    #[error("Invalid packet header: {0:02X?}")]
    InvalidHeader([u8; 4]),

    /// 包长度不足
    #[error("Packet too short: {actual} bytes (need at least {expected})")]
    TooShort { expected: usize, actual: usize },

    /// 声明长度与实际载荷不一致
    #[error("Declared length {declared} does not match payload of {actual} bytes")]
    LengthMismatch { declared: usize, actual: usize },

    /// CRC 校验失败
    #[error("CRC mismatch: calculated {calculated:#06X}, received {received:#06X}")]
    CrcMismatch { calculated: u16, received: u16 },

    /// 收到的不是状态包
    #[error("Unexpected instruction byte: {0:#04X} (expected status 0x55)")]
    UnexpectedInstruction(u8),

    /// 未知型号编号（无法建立单位换算）
    #[error("Unknown model number: {0}")]
    UnknownModel(u16),

    /// 寄存器数值长度错误
    #[error("Invalid value length for register {register}: got {actual} bytes")]
    InvalidValueLength {
        register: &'static str,
        actual: usize,
    },
}
