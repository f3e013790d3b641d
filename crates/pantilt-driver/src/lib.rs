//! 驱动层模块
//!
//! 本模块提供舵机总线的设备驱动功能，包括：
//! - 设备发现（ping 并登记型号）
//! - 单寄存器读写
//! - 批量同步读写（一次事务覆盖全部关节）
//! - 工程单位换算入口（按已登记型号）
//!
//! 控制核心只通过 [`ServoPort`] trait 消费本层，真实硬件使用
//! [`DynamixelPort`]，测试使用 `mock` feature 提供的 [`MockPort`]。

mod dynamixel;
mod error;
mod port;

#[cfg(feature = "mock")]
pub mod mock;

pub use dynamixel::DynamixelPort;
pub use error::PortError;
pub use port::ServoPort;

#[cfg(feature = "mock")]
pub use mock::MockPort;
