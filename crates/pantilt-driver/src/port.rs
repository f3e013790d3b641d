//! ServoPort trait - 舵机 I/O 端口能力接口
//!
//! 控制核心对硬件的全部需求都收敛在这个 trait 上：发现、寄存器
//! 读写、批量传输，以及按型号的单位换算。换算方法是纯函数，
//! 不产生 I/O，仅要求目标 ID 已经 ping 成功（型号已登记）。

use crate::PortError;
use pantilt_protocol::{ModelInfo, Register};
use std::collections::HashMap;

/// 舵机 I/O 端口
pub trait ServoPort: Send {
    /// 探测设备，登记型号并返回型号信息
    fn ping(&mut self, id: u8) -> Result<ModelInfo, PortError>;

    /// 读单个寄存器
    fn read_register(&mut self, id: u8, register: Register) -> Result<i32, PortError>;

    /// 写单个寄存器
    fn write_register(&mut self, id: u8, register: Register, value: i32)
    -> Result<(), PortError>;

    /// 批量读：一次事务读取多个 ID 的同一寄存器
    ///
    /// 未应答的 ID 在返回的 map 中缺席，不视为事务失败；
    /// 事务级传输错误（发送失败等）返回 `Err`。
    fn sync_read(
        &mut self,
        register: Register,
        ids: &[u8],
    ) -> Result<HashMap<u8, i32>, PortError>;

    /// 批量写：一次事务写入多个 ID 的同一寄存器（广播，无应答）
    fn sync_write(&mut self, register: Register, values: &[(u8, i32)]) -> Result<(), PortError>;

    /// 已登记的型号信息（`ModelInfo` 为 Copy，按值返回）
    fn model_info(&self, id: u8) -> Option<ModelInfo>;

    /// 位置值 → 弧度（纯换算，无 I/O）
    fn value_to_radian(&self, id: u8, value: i32) -> Result<f64, PortError> {
        Ok(self
            .model_info(id)
            .ok_or(PortError::NotFound(id))?
            .value_to_radian(value))
    }

    /// 弧度 → 位置值（纯换算，无 I/O）
    fn radian_to_value(&self, id: u8, radian: f64) -> Result<i32, PortError> {
        Ok(self
            .model_info(id)
            .ok_or(PortError::NotFound(id))?
            .radian_to_value(radian))
    }

    /// 力矩（N·m）→ 电流寄存器值（纯换算，无 I/O）
    fn torque_to_value(&self, id: u8, torque_nm: f64) -> Result<i32, PortError> {
        Ok(self
            .model_info(id)
            .ok_or(PortError::NotFound(id))?
            .torque_to_value(torque_nm))
    }
}
