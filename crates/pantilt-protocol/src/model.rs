//! 舵机型号表与单位换算
//!
//! 控制器内部始终以设备原生整数（device unit）运算，只在边界处
//! 换算为工程单位（弧度、N·m）。换算系数由型号决定，ping 成功后
//! 通过型号编号查表得到。
//!
//! # 换算关系
//!
//! - 位置：`radian = (value - center) * 2π / resolution`
//! - 电流：1 device unit = `current_unit_ma` mA
//! - 力矩 → 电流：`I = torque / torque_constant`，再换算为 device unit
//!
//! 所有浮点 → 整数的换算向零截断。

use crate::ProtocolError;
use std::f64::consts::TAU;

/// 型号信息与单位换算系数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelInfo {
    /// 型号编号（Model_Number 寄存器值）
    pub model_number: u16,
    /// 型号名称
    pub name: &'static str,
    /// 每圈位置分辨率（device unit）
    pub resolution: i32,
    /// 0 弧度对应的位置值
    pub center_value: i32,
    /// 电流寄存器单位（mA / device unit）
    pub current_unit_ma: f64,
    /// 力矩常数（N·m / A）
    pub torque_constant: f64,
}

/// XM430-W350
pub const XM430_W350: ModelInfo = ModelInfo {
    model_number: 1020,
    name: "XM430-W350",
    resolution: 4096,
    center_value: 2048,
    current_unit_ma: 2.69,
    torque_constant: 1.78,
};

/// XM430-W210
pub const XM430_W210: ModelInfo = ModelInfo {
    model_number: 1030,
    name: "XM430-W210",
    resolution: 4096,
    center_value: 2048,
    current_unit_ma: 2.69,
    torque_constant: 1.30,
};

/// 支持的型号表
const MODELS: &[ModelInfo] = &[XM430_W350, XM430_W210];

impl ModelInfo {
    /// 按型号编号查表
    pub fn from_model_number(model_number: u16) -> Result<ModelInfo, ProtocolError> {
        MODELS
            .iter()
            .find(|m| m.model_number == model_number)
            .copied()
            .ok_or(ProtocolError::UnknownModel(model_number))
    }

    /// 位置值 → 弧度
    pub fn value_to_radian(&self, value: i32) -> f64 {
        (value - self.center_value) as f64 * TAU / self.resolution as f64
    }

    /// 弧度 → 位置值（向零截断）
    pub fn radian_to_value(&self, radian: f64) -> i32 {
        self.center_value + (radian * self.resolution as f64 / TAU) as i32
    }

    /// 力矩（N·m）→ 电流寄存器值（向零截断）
    pub fn torque_to_value(&self, torque_nm: f64) -> i32 {
        let current_ma = torque_nm / self.torque_constant * 1000.0;
        (current_ma / self.current_unit_ma) as i32
    }

    /// 电流寄存器值 → 力矩（N·m）
    pub fn value_to_torque(&self, value: i32) -> f64 {
        value as f64 * self.current_unit_ma / 1000.0 * self.torque_constant
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_lookup() {
        let model = ModelInfo::from_model_number(1020).unwrap();
        assert_eq!(model.name, "XM430-W350");
        assert!(matches!(
            ModelInfo::from_model_number(9999),
            Err(ProtocolError::UnknownModel(9999))
        ));
    }

    #[test]
    fn test_center_is_zero_radian() {
        assert_eq!(XM430_W350.value_to_radian(2048), 0.0);
        assert_eq!(XM430_W350.radian_to_value(0.0), 2048);
    }

    #[test]
    fn test_value_to_radian_quarter_turn() {
        // 1024 个单位 = 1/4 圈 = π/2
        let theta = XM430_W350.value_to_radian(2048 + 1024);
        assert!((theta - PI / 2.0).abs() < 1e-12);
    }

    /// 往返换算误差不超过一个量化步长
    #[test]
    fn test_radian_roundtrip_within_one_unit() {
        for v in [-2048, -1, 0, 1, 777, 2047, 4095] {
            let back = XM430_W350.radian_to_value(XM430_W350.value_to_radian(v));
            assert!((back - v).abs() <= 1, "value {v} came back as {back}");
        }
    }

    #[test]
    fn test_torque_truncates_toward_zero() {
        // 微小力矩换算后不足一个单位，正负都应截断到 0
        assert_eq!(XM430_W350.torque_to_value(0.001), 0);
        assert_eq!(XM430_W350.torque_to_value(-0.001), 0);
    }

    #[test]
    fn test_torque_sign() {
        let positive = XM430_W350.torque_to_value(1.0);
        let negative = XM430_W350.torque_to_value(-1.0);
        assert!(positive > 0);
        assert_eq!(negative, -positive);
    }

    #[test]
    fn test_torque_to_value_scale() {
        // 1.78 N·m = 1 A = 1000 mA = 1000 / 2.69 ≈ 371 units
        let value = XM430_W350.torque_to_value(1.78);
        assert_eq!(value, (1000.0 / 2.69) as i32);
    }

    #[test]
    fn test_value_to_torque_inverse() {
        let v = XM430_W350.torque_to_value(2.0);
        let torque = XM430_W350.value_to_torque(v);
        // 误差在一个电流单位对应的力矩之内
        let unit_torque = XM430_W350.current_unit_ma / 1000.0 * XM430_W350.torque_constant;
        assert!((torque - 2.0).abs() <= unit_torque);
    }
}
