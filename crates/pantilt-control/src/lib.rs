//! 云台控制核心
//!
//! 250 Hz 闭环力矩控制：重力前馈 PD 控制器、目标位置存储与指令
//! 接入、遥测发布，以及驱动这一切的固定频率循环。硬件访问通过
//! `pantilt-driver` 的 [`ServoPort`](pantilt_driver::ServoPort)
//! 接口注入，测试用 mock 端口即可覆盖完整回路。

pub mod controller;
pub mod goal;
pub mod gravity_pd;
pub mod joint;
pub mod loop_runner;
pub mod state;
pub mod telemetry;

pub use controller::Controller;
pub use goal::{CommandIntake, GoalCommand, GoalStore};
pub use gravity_pd::{GravityFeedforward, GravityPdController};
pub use joint::{Joint, JointArray};
pub use loop_runner::{
    ControlLoop, CycleCounters, DEFAULT_RATE_HZ, LoopConfig, LoopError, configure_servos,
};
pub use state::{AtomicLoopState, LoopState};
pub use telemetry::{
    ServoState, TelemetryPublisher, TelemetryReader, TelemetrySnapshot, telemetry_channel,
};
