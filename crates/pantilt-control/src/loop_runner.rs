//! 控制循环驱动器
//!
//! 固定频率的读取-计算-写入-遥测循环。调度以绝对截止时间为准：
//! 每周期的起点是上一周期起点加固定周期，而不是工作结束后再睡
//! 一整个周期，避免周期漂移累积。
//!
//! 瞬态 I/O 故障（超时等）被限制在单个周期内：读失败跳过整个
//! 周期，写失败丢弃本周期输出，循环继续。只有控制器本身出错才
//! 终止循环。退出路径上无条件对每个关节关断力矩。

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

use spin_sleep::SpinSleeper;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use pantilt_driver::{PortError, ServoPort};
use pantilt_protocol::{ModelInfo, OperatingMode, Register};

use crate::controller::Controller;
use crate::goal::GoalStore;
use crate::joint::{Joint, JointArray};
use crate::state::{AtomicLoopState, LoopState};
use crate::telemetry::{self, TelemetryPublisher, TelemetrySnapshot};

/// 默认控制频率（Hz）
pub const DEFAULT_RATE_HZ: f64 = 250.0;

/// 循环配置
#[derive(Debug, Clone, Copy)]
pub struct LoopConfig {
    /// 控制频率（Hz），必须为正
    pub rate_hz: f64,
    /// 运行指定周期数后自动关停（测试用），`None` 表示一直运行
    pub max_cycles: Option<u64>,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            rate_hz: DEFAULT_RATE_HZ,
            max_cycles: None,
        }
    }
}

/// 周期计数器
///
/// 运行期间只增不减，关停时随 [`ControlLoop::run`] 返回。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleCounters {
    /// 已执行的周期总数
    pub cycles: u64,
    /// 因读失败而跳过的周期数
    pub read_failures: u64,
    /// 输出写入失败次数
    pub write_failures: u64,
    /// 遥测采集失败次数
    pub telemetry_failures: u64,
    /// 周期超限次数
    pub overruns: u64,
}

/// 循环级错误
///
/// 只有启动阶段失败和控制器错误是致命的；周期内的瞬态 I/O 故障
/// 不会出现在这里。
#[derive(Debug, Error)]
pub enum LoopError {
    /// 设备发现失败（ping 无应答或型号未知）
    #[error("servo discovery failed: {0}")]
    Discovery(#[source] PortError),

    /// 模式配置失败（力矩开关或工作模式写入）
    #[error("servo configuration failed: {0}")]
    Configuration(#[source] PortError),

    /// 配置参数无效
    #[error("invalid loop config: {0}")]
    Config(String),

    /// 控制器计算错误
    #[error("controller error: {0}")]
    Controller(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// 发现并配置两个关节的舵机，返回各自的型号信息
///
/// 顺序固定：先 ping 全部关节，然后逐个关节按
/// 关力矩 → 切电流控制模式 → 开力矩 执行。工作模式寄存器只有在
/// 力矩关断时可写，顺序不能颠倒。任何一步失败都是致命错误。
pub fn configure_servos<P: ServoPort>(
    port: &mut P,
    ids: &JointArray<u8>,
) -> Result<JointArray<ModelInfo>, LoopError> {
    let mut probe = |joint: Joint| -> Result<ModelInfo, LoopError> {
        let id = ids[joint];
        let model = port.ping(id).map_err(LoopError::Discovery)?;
        info!(joint = %joint, id, model = model.name, "servo discovered");
        Ok(model)
    };
    let models = JointArray::new([probe(Joint::Pan)?, probe(Joint::Tilt)?]);

    for joint in Joint::ALL {
        let id = ids[joint];
        port.write_register(id, Register::TorqueEnable, 0)
            .map_err(LoopError::Configuration)?;
        port.write_register(
            id,
            Register::OperatingMode,
            u8::from(OperatingMode::CurrentControl) as i32,
        )
        .map_err(LoopError::Configuration)?;
        port.write_register(id, Register::TorqueEnable, 1)
            .map_err(LoopError::Configuration)?;
        info!(joint = %joint, id, "current control mode enabled");
    }

    Ok(models)
}

/// 控制循环
pub struct ControlLoop<P, C> {
    port: P,
    controller: C,
    ids: JointArray<u8>,
    goals: Arc<GoalStore>,
    state: Arc<AtomicLoopState>,
    telemetry: TelemetryPublisher,
    config: LoopConfig,
    counters: CycleCounters,
}

impl<P, C> ControlLoop<P, C>
where
    P: ServoPort,
    C: Controller,
{
    pub fn new(
        port: P,
        controller: C,
        ids: JointArray<u8>,
        goals: Arc<GoalStore>,
        state: Arc<AtomicLoopState>,
        telemetry: TelemetryPublisher,
        config: LoopConfig,
    ) -> Result<Self, LoopError> {
        if !config.rate_hz.is_finite() || config.rate_hz <= 0.0 {
            return Err(LoopError::Config(format!(
                "rate_hz must be positive, got {}",
                config.rate_hz
            )));
        }
        Ok(Self {
            port,
            controller,
            ids,
            goals,
            state,
            telemetry,
            config,
            counters: CycleCounters::default(),
        })
    }

    /// 运行循环直到关停
    ///
    /// 外部通过共享的 [`AtomicLoopState`] 请求关停；正在执行的
    /// 周期会先跑完。返回前无条件关断所有关节力矩。
    pub fn run(mut self) -> Result<CycleCounters, LoopError> {
        let period = Duration::from_secs_f64(1.0 / self.config.rate_hz);
        let sleeper = SpinSleeper::default();
        info!(rate_hz = self.config.rate_hz, "control loop started");

        let mut deadline = Instant::now() + period;
        loop {
            if self.state.get(Ordering::Relaxed) == LoopState::ShuttingDown {
                break;
            }
            if let Some(max) = self.config.max_cycles
                && self.counters.cycles >= max
            {
                self.state.set(LoopState::ShuttingDown, Ordering::Relaxed);
                break;
            }

            self.counters.cycles += 1;
            if let Err(err) = self.cycle() {
                self.shutdown();
                return Err(err);
            }

            let now = Instant::now();
            if now > deadline {
                self.counters.overruns += 1;
                warn!(
                    over_us = (now - deadline).as_micros() as u64,
                    "cycle overran its period"
                );
                // 丢弃被越过的边界，下一周期在未来的边界上对齐
                while deadline < now {
                    deadline += period;
                }
            } else {
                sleeper.sleep(deadline - now);
                deadline += period;
            }
        }

        self.shutdown();
        info!(cycles = self.counters.cycles, "control loop stopped");
        Ok(self.counters)
    }

    /// 单个控制周期：读取 → 计算 → 写入 → 遥测
    fn cycle(&mut self) -> Result<(), LoopError> {
        let id_list = *self.ids.as_array();
        let batch = match self.port.sync_read(Register::PresentPosition, &id_list) {
            Ok(batch) => batch,
            Err(err) => {
                // 没有新采样就没有可用的误差微分，整个周期跳过，
                // 控制器记忆保持原样
                warn!(%err, "present position read failed, skipping cycle");
                self.counters.read_failures += 1;
                return Ok(());
            }
        };
        let present = self.ids.map(|id| batch.get(&id).copied());

        let goal = self.goals.snapshot();
        let outputs = self
            .controller
            .tick(&goal, &present)
            .map_err(|err| LoopError::Controller(Box::new(err)))?;

        let writes: Vec<(u8, i32)> = Joint::ALL
            .iter()
            .filter_map(|&joint| outputs[joint].map(|value| (self.ids[joint], value)))
            .collect();
        if !writes.is_empty()
            && let Err(err) = self.port.sync_write(Register::GoalCurrent, &writes)
        {
            warn!(%err, "goal current write failed, output dropped");
            self.counters.write_failures += 1;
        }

        match telemetry::collect(&mut self.port, &self.ids) {
            Ok(joints) => self.telemetry.publish(TelemetrySnapshot {
                cycle: self.counters.cycles,
                joints,
            }),
            Err(err) => {
                debug!(%err, "telemetry collection failed");
                self.counters.telemetry_failures += 1;
            }
        }

        Ok(())
    }

    /// 关停路径：每个关节单独关断力矩
    ///
    /// 逐个关节写入而不是批量广播：某个关节失败不能挡住其余
    /// 关节的关断。
    fn shutdown(&mut self) {
        for joint in Joint::ALL {
            let id = self.ids[joint];
            match self.port.write_register(id, Register::TorqueEnable, 0) {
                Ok(()) => info!(joint = %joint, id, "torque disabled"),
                Err(err) => error!(joint = %joint, id, %err, "failed to disable torque"),
            }
        }
    }
}
