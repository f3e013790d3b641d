//! 控制循环状态定义
//!
//! 循环只有两个状态：RUNNING 和 SHUTTING_DOWN。RUNNING 在设备发现
//! 与模式配置全部成功后进入；收到外部终止信号后进入 SHUTTING_DOWN，
//! 并在退出前完成力矩关断。

use std::sync::atomic::{AtomicU8, Ordering};

/// 控制循环状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum LoopState {
    /// 稳态运行：固定周期执行读取-计算-写入-遥测
    #[default]
    Running = 0,

    /// 关停中：停止发新周期，关断所有关节力矩后退出
    ShuttingDown = 1,
}

impl LoopState {
    /// 从 u8 转换；无效值按 ShuttingDown 处理（保守侧）
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Running,
            _ => Self::ShuttingDown,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// 循环状态（原子版本，用于线程间共享）
#[derive(Debug, Default)]
pub struct AtomicLoopState {
    inner: AtomicU8,
}

impl AtomicLoopState {
    pub fn new(state: LoopState) -> Self {
        Self {
            inner: AtomicU8::new(state.as_u8()),
        }
    }

    pub fn get(&self, ordering: Ordering) -> LoopState {
        LoopState::from_u8(self.inner.load(ordering))
    }

    pub fn set(&self, state: LoopState, ordering: Ordering) {
        self.inner.store(state.as_u8(), ordering);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loop_state_conversions() {
        assert_eq!(LoopState::from_u8(0), LoopState::Running);
        assert_eq!(LoopState::from_u8(1), LoopState::ShuttingDown);
        // 无效值落到保守侧
        assert_eq!(LoopState::from_u8(255), LoopState::ShuttingDown);
        assert_eq!(LoopState::Running.as_u8(), 0);
    }

    #[test]
    fn test_atomic_loop_state() {
        let state = AtomicLoopState::new(LoopState::Running);
        assert_eq!(state.get(Ordering::Relaxed), LoopState::Running);

        state.set(LoopState::ShuttingDown, Ordering::Relaxed);
        assert_eq!(state.get(Ordering::Relaxed), LoopState::ShuttingDown);
    }
}
