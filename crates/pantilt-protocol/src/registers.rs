//! 控制表寄存器定义
//!
//! X 系列舵机控制表的子集，仅包含力矩控制所需的条目。
//! 每个寄存器携带地址和字节宽度，数值统一以 `i32` 在 API 中传递，
//! 编码为小端字节序，解码时按寄存器宽度做符号扩展。

use crate::ProtocolError;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use std::fmt;

/// 指令字节
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum Instruction {
    /// 探测设备并读取型号
    Ping = 0x01,
    /// 读寄存器
    Read = 0x02,
    /// 写寄存器
    Write = 0x03,
    /// 状态回包
    Status = 0x55,
    /// 批量读（一次事务读多个 ID 的同一寄存器）
    SyncRead = 0x82,
    /// 批量写（一次事务写多个 ID 的同一寄存器）
    SyncWrite = 0x83,
}

/// 运行模式（Operating_Mode 寄存器取值）
///
/// 模式切换在力矩使能状态下会被舵机拒绝，必须先写
/// `Torque_Enable = 0`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum OperatingMode {
    /// 电流控制模式（指令值解释为目标电流，力矩代理）
    CurrentControl = 0,
    /// 速度控制模式
    Velocity = 1,
    /// 位置控制模式（出厂默认）
    #[default]
    Position = 3,
    /// 多圈位置控制模式
    ExtendedPosition = 4,
    /// 电流限制位置控制模式
    CurrentBasedPosition = 5,
    /// PWM 直驱模式
    Pwm = 16,
}

/// 控制表寄存器
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Register {
    /// 型号编号（只读，2 字节）
    ModelNumber,
    /// 运行模式（1 字节，EEPROM 区）
    OperatingMode,
    /// 力矩使能（1 字节）
    TorqueEnable,
    /// 目标电流（2 字节，有符号）
    GoalCurrent,
    /// 目标速度（4 字节，有符号）
    GoalVelocity,
    /// 目标位置（4 字节，有符号）
    GoalPosition,
    /// 运动中标志（只读，1 字节）
    Moving,
    /// 当前电流（只读，2 字节，有符号）
    PresentCurrent,
    /// 当前速度（只读，4 字节，有符号）
    PresentVelocity,
    /// 当前位置（只读，4 字节，有符号）
    PresentPosition,
}

impl Register {
    /// 控制表地址
    pub const fn address(self) -> u16 {
        match self {
            Register::ModelNumber => 0,
            Register::OperatingMode => 11,
            Register::TorqueEnable => 64,
            Register::GoalCurrent => 102,
            Register::GoalVelocity => 104,
            Register::GoalPosition => 116,
            Register::Moving => 122,
            Register::PresentCurrent => 126,
            Register::PresentVelocity => 128,
            Register::PresentPosition => 132,
        }
    }

    /// 寄存器宽度（字节）
    pub const fn size(self) -> u16 {
        match self {
            Register::OperatingMode
            | Register::TorqueEnable
            | Register::Moving => 1,
            Register::ModelNumber
            | Register::GoalCurrent
            | Register::PresentCurrent => 2,
            Register::GoalVelocity
            | Register::GoalPosition
            | Register::PresentVelocity
            | Register::PresentPosition => 4,
        }
    }

    /// 控制表条目名称
    pub const fn name(self) -> &'static str {
        match self {
            Register::ModelNumber => "Model_Number",
            Register::OperatingMode => "Operating_Mode",
            Register::TorqueEnable => "Torque_Enable",
            Register::GoalCurrent => "Goal_Current",
            Register::GoalVelocity => "Goal_Velocity",
            Register::GoalPosition => "Goal_Position",
            Register::Moving => "Moving",
            Register::PresentCurrent => "Present_Current",
            Register::PresentVelocity => "Present_Velocity",
            Register::PresentPosition => "Present_Position",
        }
    }

    /// 将数值编码为小端字节序（按寄存器宽度截断）
    pub fn encode_value(self, value: i32) -> Vec<u8> {
        let bytes = value.to_le_bytes();
        bytes[..self.size() as usize].to_vec()
    }

    /// 从小端字节序解码数值
    ///
    /// 2/4 字节寄存器按有符号数做符号扩展，1 字节寄存器按无符号数解释
    /// （Torque_Enable / Moving 等标志位）。
    pub fn decode_value(self, bytes: &[u8]) -> Result<i32, ProtocolError> {
        if bytes.len() != self.size() as usize {
            return Err(ProtocolError::InvalidValueLength {
                register: self.name(),
                actual: bytes.len(),
            });
        }
        let value = match self.size() {
            1 => bytes[0] as i32,
            2 => i16::from_le_bytes([bytes[0], bytes[1]]) as i32,
            4 => i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            _ => unreachable!(),
        };
        Ok(value)
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
