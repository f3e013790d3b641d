//! DYNAMIXEL 端口实现
//!
//! 基于指令包/状态包的真实 [`ServoPort`] 实现。每次事务：
//! 清空接收缓冲 → 发送指令包 → 按前缀声明的长度读回状态包。
//!
//! Sync Read 的应答按指令中列出的 ID 顺序逐个返回；某个 ID 超时
//! 未应答时停止收集，已收到的数据仍然有效（缺席条目由上层按
//! 单关节缺数处理）。

use crate::{PortError, ServoPort};
use pantilt_bus::{BusAdapter, BusError};
use pantilt_protocol::packet::PREFIX_LEN;
use pantilt_protocol::{InstructionPacket, ModelInfo, Register, StatusPacket};
use std::collections::HashMap;
use tracing::{debug, warn};

/// DYNAMIXEL 舵机端口
pub struct DynamixelPort<A: BusAdapter> {
    bus: A,
    /// ping 成功后登记的型号表
    models: HashMap<u8, ModelInfo>,
}

impl<A: BusAdapter> DynamixelPort<A> {
    pub fn new(bus: A) -> Self {
        Self {
            bus,
            models: HashMap::new(),
        }
    }

    /// 读取一个完整状态包
    fn read_status(&mut self) -> Result<StatusPacket, PortError> {
        let mut prefix = [0u8; PREFIX_LEN];
        self.bus.recv_exact(&mut prefix)?;
        let remaining = StatusPacket::remaining_len(&prefix)?;
        let mut packet = vec![0u8; PREFIX_LEN + remaining];
        packet[..PREFIX_LEN].copy_from_slice(&prefix);
        self.bus.recv_exact(&mut packet[PREFIX_LEN..])?;
        Ok(StatusPacket::parse(&packet)?)
    }

    /// 发送指令包并读取一个状态包应答
    fn transact(&mut self, packet: &InstructionPacket) -> Result<StatusPacket, PortError> {
        self.bus.discard_input()?;
        self.bus.send(&packet.serialize())?;
        let status = self.read_status()?;
        if status.id != packet.id {
            return Err(PortError::WrongId {
                expected: packet.id,
                actual: status.id,
            });
        }
        if status.is_error() {
            return Err(PortError::Status {
                id: status.id,
                bits: status.error,
            });
        }
        Ok(status)
    }
}

impl<A: BusAdapter> ServoPort for DynamixelPort<A> {
    fn ping(&mut self, id: u8) -> Result<ModelInfo, PortError> {
        let status = match self.transact(&InstructionPacket::ping(id)) {
            Ok(status) => status,
            // ping 超时 = 总线上没有这个设备
            Err(PortError::Bus(BusError::Timeout)) => return Err(PortError::NotFound(id)),
            Err(e) => return Err(e),
        };
        // Ping 状态包参数：型号编号（2 字节）+ 固件版本（1 字节）
        if status.params.len() < 2 {
            return Err(PortError::NotFound(id));
        }
        let model_number = u16::from_le_bytes([status.params[0], status.params[1]]);
        let model = ModelInfo::from_model_number(model_number)?;
        debug!(id, model = model.name, "servo discovered");
        self.models.insert(id, model);
        Ok(model)
    }

    fn read_register(&mut self, id: u8, register: Register) -> Result<i32, PortError> {
        let packet = InstructionPacket::read(id, register.address(), register.size());
        let status = self.transact(&packet)?;
        Ok(register.decode_value(&status.params)?)
    }

    fn write_register(
        &mut self,
        id: u8,
        register: Register,
        value: i32,
    ) -> Result<(), PortError> {
        let data = register.encode_value(value);
        let packet = InstructionPacket::write(id, register.address(), &data);
        self.transact(&packet)?;
        Ok(())
    }

    fn sync_read(
        &mut self,
        register: Register,
        ids: &[u8],
    ) -> Result<HashMap<u8, i32>, PortError> {
        self.bus.discard_input()?;
        let packet = InstructionPacket::sync_read(register.address(), register.size(), ids);
        self.bus.send(&packet.serialize())?;

        let mut values = HashMap::with_capacity(ids.len());
        for &expected in ids {
            let status = match self.read_status() {
                Ok(status) => status,
                Err(PortError::Bus(BusError::Timeout)) => {
                    warn!(id = expected, register = %register, "no sync read response");
                    break;
                }
                Err(e) => return Err(e),
            };
            if status.id != expected {
                warn!(
                    expected,
                    actual = status.id,
                    "sync read response out of order, dropping"
                );
                continue;
            }
            if status.is_error() {
                warn!(id = status.id, bits = status.error, "sync read status error");
                continue;
            }
            values.insert(status.id, register.decode_value(&status.params)?);
        }
        Ok(values)
    }

    fn sync_write(&mut self, register: Register, values: &[(u8, i32)]) -> Result<(), PortError> {
        let entries: Vec<(u8, Vec<u8>)> = values
            .iter()
            .map(|&(id, value)| (id, register.encode_value(value)))
            .collect();
        let packet = InstructionPacket::sync_write(register.address(), register.size(), &entries);
        // 广播指令，无状态包应答
        self.bus.send(&packet.serialize())?;
        Ok(())
    }

    fn model_info(&self, id: u8) -> Option<ModelInfo> {
        self.models.get(&id).copied()
    }
}
