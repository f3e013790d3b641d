//! 目标位置存储与指令接入
//!
//! [`GoalStore`] 是整个系统唯一跨执行上下文的可变状态：指令接入
//! 线程写，控制线程每周期读一次快照。关节集合固定为两个，因此用
//! 两个原子单元而不是通用并发容器——每个关节的读写天然原子，
//! 不会出现撕裂的目标值。
//!
//! 初始值为 0（设备单位）：在第一条指令到达之前，控制器会把关节
//! 往位置 0 上驱动，这是操作者必须知晓的物理行为。

use crate::joint::{Joint, JointArray};
use pantilt_protocol::ModelInfo;
use serde::Deserialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicI32, Ordering};
use tracing::{debug, warn};

/// 目标位置存储（设备单位）
///
/// 单写者（指令接入）/ 单读者（控制器）。两个独立的 i32 单元
/// 之间没有顺序依赖，Relaxed 内存序足够。
#[derive(Debug, Default)]
pub struct GoalStore {
    cells: [AtomicI32; 2],
}

impl GoalStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 写入某个关节的目标位置
    pub fn set(&self, joint: Joint, value: i32) {
        self.cells[joint.index()].store(value, Ordering::Relaxed);
    }

    /// 读取某个关节的目标位置
    pub fn get(&self, joint: Joint) -> i32 {
        self.cells[joint.index()].load(Ordering::Relaxed)
    }

    /// 读取全部关节的目标位置快照
    ///
    /// 控制器每周期调用一次，周期内不再重读。
    pub fn snapshot(&self) -> JointArray<i32> {
        JointArray::new([self.get(Joint::Pan), self.get(Joint::Tilt)])
    }
}

/// 外部目标位置指令
///
/// `unit` 为 `"rad"` 时 `goal_position` 按弧度解释并换算为设备
/// 单位；为 `"raw"` 时按设备单位原样存储。
#[derive(Debug, Clone, Deserialize)]
pub struct GoalCommand {
    pub joint: Joint,
    pub goal_position: f64,
    #[serde(default = "default_unit")]
    pub unit: String,
}

fn default_unit() -> String {
    "raw".to_string()
}

/// 指令接入
///
/// 把外部指令的单位归一化后写入 [`GoalStore`]。持有每个关节的
/// 型号信息（单位换算是纯函数），因此不需要访问总线，永远不会
/// 阻塞控制线程。
pub struct CommandIntake {
    store: Arc<GoalStore>,
    models: JointArray<ModelInfo>,
}

impl CommandIntake {
    pub fn new(store: Arc<GoalStore>, models: JointArray<ModelInfo>) -> Self {
        Self { store, models }
    }

    /// 处理一条指令，返回确认标志
    ///
    /// 确认只代表接受，不代表收敛。未知单位字符串按 raw 处理，
    /// 但会打出 warn 日志。
    pub fn handle(&self, command: &GoalCommand) -> bool {
        let value = match command.unit.as_str() {
            "rad" => self.models[command.joint].radian_to_value(command.goal_position),
            "raw" => command.goal_position as i32,
            other => {
                warn!(
                    unit = other,
                    joint = %command.joint,
                    "unknown position unit, treating value as raw device units"
                );
                command.goal_position as i32
            }
        };
        debug!(joint = %command.joint, value, "goal position updated");
        self.store.set(command.joint, value);
        true
    }
}
