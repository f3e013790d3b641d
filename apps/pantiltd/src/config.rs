//! 守护进程配置
//!
//! TOML 格式，所有字段都有默认值，缺省即可直接启动。默认值对应
//! 实验室标准云台：XM430 舵机对（pan=ID1, tilt=ID2），俯仰轴挂
//! 82 g 相机模组，力臂 18 mm。

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// 守护进程配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DaemonConfig {
    /// 串口设备路径
    pub device: String,

    /// 串口波特率（bps）
    pub baud_rate: u32,

    /// 控制频率（Hz）
    pub rate_hz: f64,

    /// pan 关节舵机 ID
    pub pan_id: u8,

    /// tilt 关节舵机 ID
    pub tilt_id: u8,

    /// 比例增益（寄存器计数 → N·m）
    pub p_gain: f64,

    /// 微分增益（计数/秒 → N·m）
    pub d_gain: f64,

    /// 俯仰轴负载（重力前馈），`None` 表示不补偿
    pub tilt_load: Option<LoadConfig>,
}

/// 重力前馈的负载参数
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoadConfig {
    /// 负载质量（kg）
    pub mass_kg: f64,

    /// 重力加速度（m/s²）
    #[serde(default = "default_gravity")]
    pub gravity_mps2: f64,

    /// 连杆长度（m）
    pub link_length_m: f64,
}

fn default_gravity() -> f64 {
    9.8
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            device: "/dev/ttyUSB0".to_string(),
            baud_rate: 3_000_000,
            rate_hz: 250.0,
            pan_id: 1,
            tilt_id: 2,
            p_gain: 0.003,
            d_gain: 0.00002,
            tilt_load: Some(LoadConfig {
                mass_kg: 0.082,
                gravity_mps2: 9.8,
                link_length_m: 0.018,
            }),
        }
    }
}

impl DaemonConfig {
    /// 从 TOML 文件加载配置
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Self = toml::from_str(&text)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        Ok(config)
    }
}
