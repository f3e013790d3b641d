//! Mock 端口
//!
//! 无硬件测试用的 [`ServoPort`] 实现：寄存器表放在内存里，支持
//! 故障注入（若干次批量读/写失败、指定 ID 静默）和写入台账。
//!
//! 句柄可克隆，内部共享同一份状态：控制循环持有一份做 I/O，
//! 测试持有另一份注入故障、检查写入记录。

use crate::{PortError, ServoPort};
use pantilt_bus::BusError;
use pantilt_protocol::{ModelInfo, Register};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

#[derive(Default)]
struct MockState {
    registers: HashMap<(u8, Register), i32>,
    models: HashMap<u8, ModelInfo>,
    /// 接下来 n 次 sync_read 以超时失败
    fail_sync_reads: u32,
    /// 接下来 n 次 sync_write 以超时失败
    fail_sync_writes: u32,
    /// sync_read 中不应答的 ID
    silent_ids: HashSet<u8>,
    /// 所有成功写入的记录（含 sync_write 展开后的条目）
    write_log: Vec<(u8, Register, i32)>,
}

/// Mock 舵机端口
#[derive(Clone, Default)]
pub struct MockPort {
    state: Arc<Mutex<MockState>>,
}

impl MockPort {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记一个虚拟舵机，寄存器全部清零
    pub fn add_servo(&self, id: u8, model: ModelInfo) {
        let mut state = self.state.lock();
        state.models.insert(id, model);
        state.registers.insert((id, Register::ModelNumber), model.model_number as i32);
    }

    /// 直接设置寄存器值（模拟物理状态变化）
    pub fn set_register(&self, id: u8, register: Register, value: i32) {
        self.state.lock().registers.insert((id, register), value);
    }

    /// 读取当前寄存器值（不经过 ServoPort 接口）
    pub fn register(&self, id: u8, register: Register) -> Option<i32> {
        self.state.lock().registers.get(&(id, register)).copied()
    }

    /// 注入故障：接下来 `n` 次 sync_read 超时
    pub fn fail_next_sync_reads(&self, n: u32) {
        self.state.lock().fail_sync_reads = n;
    }

    /// 注入故障：接下来 `n` 次 sync_write 超时
    pub fn fail_next_sync_writes(&self, n: u32) {
        self.state.lock().fail_sync_writes = n;
    }

    /// 让某个 ID 在 sync_read 中不应答
    pub fn set_silent(&self, id: u8, silent: bool) {
        let mut state = self.state.lock();
        if silent {
            state.silent_ids.insert(id);
        } else {
            state.silent_ids.remove(&id);
        }
    }

    /// 清空写入台账（保留寄存器内容）
    pub fn clear_write_log(&self) {
        self.state.lock().write_log.clear();
    }

    /// 某个寄存器的全部写入记录（按时间顺序）
    pub fn writes_of(&self, register: Register) -> Vec<(u8, i32)> {
        self.state
            .lock()
            .write_log
            .iter()
            .filter(|(_, r, _)| *r == register)
            .map(|&(id, _, v)| (id, v))
            .collect()
    }
}

impl ServoPort for MockPort {
    fn ping(&mut self, id: u8) -> Result<ModelInfo, PortError> {
        self.state
            .lock()
            .models
            .get(&id)
            .copied()
            .ok_or(PortError::NotFound(id))
    }

    fn read_register(&mut self, id: u8, register: Register) -> Result<i32, PortError> {
        let state = self.state.lock();
        if !state.models.contains_key(&id) {
            return Err(PortError::NotFound(id));
        }
        Ok(state.registers.get(&(id, register)).copied().unwrap_or(0))
    }

    fn write_register(
        &mut self,
        id: u8,
        register: Register,
        value: i32,
    ) -> Result<(), PortError> {
        let mut state = self.state.lock();
        if !state.models.contains_key(&id) {
            return Err(PortError::NotFound(id));
        }
        state.registers.insert((id, register), value);
        state.write_log.push((id, register, value));
        Ok(())
    }

    fn sync_read(
        &mut self,
        register: Register,
        ids: &[u8],
    ) -> Result<HashMap<u8, i32>, PortError> {
        let mut state = self.state.lock();
        if state.fail_sync_reads > 0 {
            state.fail_sync_reads -= 1;
            return Err(PortError::Bus(BusError::Timeout));
        }
        let mut values = HashMap::new();
        for &id in ids {
            if state.silent_ids.contains(&id) || !state.models.contains_key(&id) {
                continue;
            }
            values.insert(
                id,
                state.registers.get(&(id, register)).copied().unwrap_or(0),
            );
        }
        Ok(values)
    }

    fn sync_write(&mut self, register: Register, values: &[(u8, i32)]) -> Result<(), PortError> {
        let mut state = self.state.lock();
        if state.fail_sync_writes > 0 {
            state.fail_sync_writes -= 1;
            return Err(PortError::Bus(BusError::Timeout));
        }
        for &(id, value) in values {
            state.registers.insert((id, register), value);
            state.write_log.push((id, register, value));
        }
        Ok(())
    }

    fn model_info(&self, id: u8) -> Option<ModelInfo> {
        self.state.lock().models.get(&id).copied()
    }
}
