//! 遥测采集与发布
//!
//! 每个控制周期结束时采集一次全量舵机状态，通过 [`ArcSwap`] 无锁发布。
//! 读取端拿到的是某一周期的完整快照，不会读到半更新的数据。

use std::sync::Arc;

use arc_swap::ArcSwap;
use serde::Serialize;
use tracing::debug;

use pantilt_driver::{PortError, ServoPort};
use pantilt_protocol::Register;

use crate::joint::{Joint, JointArray};

/// 单个舵机的遥测状态（设备单位）
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ServoState {
    /// 型号名，如 "XM430-W350"
    pub model_name: &'static str,
    /// 总线 ID
    pub id: u8,
    /// 力矩是否使能
    pub torque_enabled: bool,
    /// 当前位置（计数）
    pub present_position: i32,
    /// 当前速度
    pub present_velocity: i32,
    /// 当前电流
    pub present_current: i32,
    /// 目标位置
    pub goal_position: i32,
    /// 目标速度
    pub goal_velocity: i32,
    /// 目标电流
    pub goal_current: i32,
    /// 是否在运动中
    pub moving: bool,
}

/// 一个控制周期的遥测快照
///
/// 某个关节在该周期内记录不完整时对应槽位为 `None`。
#[derive(Debug, Clone, Default, Serialize)]
pub struct TelemetrySnapshot {
    /// 采集时的周期计数
    pub cycle: u64,
    /// 各关节状态
    pub joints: JointArray<Option<ServoState>>,
}

/// 遥测发布端（控制循环持有）
pub struct TelemetryPublisher {
    inner: Arc<ArcSwap<TelemetrySnapshot>>,
}

/// 遥测读取端（可克隆，供外部线程轮询）
#[derive(Clone)]
pub struct TelemetryReader {
    inner: Arc<ArcSwap<TelemetrySnapshot>>,
}

/// 创建一对发布/读取端，初始快照为空
pub fn telemetry_channel() -> (TelemetryPublisher, TelemetryReader) {
    let inner = Arc::new(ArcSwap::from_pointee(TelemetrySnapshot::default()));
    (
        TelemetryPublisher {
            inner: inner.clone(),
        },
        TelemetryReader { inner },
    )
}

impl TelemetryPublisher {
    pub fn publish(&self, snapshot: TelemetrySnapshot) {
        self.inner.store(Arc::new(snapshot));
    }
}

impl TelemetryReader {
    /// 取最近发布的快照
    pub fn latest(&self) -> Arc<TelemetrySnapshot> {
        self.inner.load_full()
    }
}

/// 遥测采集的寄存器集合，按地址升序逐个 SyncRead
const TELEMETRY_REGISTERS: [Register; 8] = [
    Register::TorqueEnable,
    Register::GoalCurrent,
    Register::GoalVelocity,
    Register::GoalPosition,
    Register::Moving,
    Register::PresentCurrent,
    Register::PresentVelocity,
    Register::PresentPosition,
];

/// 从总线采集两个关节的全量状态
///
/// 整笔事务失败时返回错误（由调用方计数并跳过本周期的发布）；
/// 单个关节缺某项读数时该关节记为 `None`，不影响另一关节。
pub fn collect<P: ServoPort>(
    port: &mut P,
    ids: &JointArray<u8>,
) -> Result<JointArray<Option<ServoState>>, PortError> {
    let mut values: JointArray<[Option<i32>; TELEMETRY_REGISTERS.len()]> =
        JointArray::splat([None; TELEMETRY_REGISTERS.len()]);

    let id_list = *ids.as_array();
    for (slot, register) in TELEMETRY_REGISTERS.iter().enumerate() {
        let batch = port.sync_read(*register, &id_list)?;
        for joint in Joint::ALL {
            values[joint][slot] = batch.get(&ids[joint]).copied();
        }
    }

    let mut states: JointArray<Option<ServoState>> = JointArray::default();
    for joint in Joint::ALL {
        let id = ids[joint];
        let Some(model) = port.model_info(id) else {
            debug!(joint = %joint, id, "no model info, dropping telemetry record");
            continue;
        };
        let v = &values[joint];
        let complete: Option<[i32; TELEMETRY_REGISTERS.len()]> =
            v.iter().copied().collect::<Option<Vec<i32>>>().map(|vs| {
                let mut arr = [0i32; TELEMETRY_REGISTERS.len()];
                arr.copy_from_slice(&vs);
                arr
            });
        match complete {
            Some([
                torque_enable,
                goal_current,
                goal_velocity,
                goal_position,
                moving,
                present_current,
                present_velocity,
                present_position,
            ]) => {
                states[joint] = Some(ServoState {
                    model_name: model.name,
                    id,
                    torque_enabled: torque_enable != 0,
                    present_position,
                    present_velocity,
                    present_current,
                    goal_position,
                    goal_velocity,
                    goal_current,
                    moving: moving != 0,
                });
            }
            None => {
                debug!(joint = %joint, id, "incomplete telemetry record, dropping");
            }
        }
    }

    Ok(states)
}
