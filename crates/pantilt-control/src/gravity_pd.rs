//! 重力补偿 PD 控制器
//!
//! # 算法（每关节每周期）
//!
//! ```text
//! error      = goal_position - present_position        (设备单位)
//! derivative = (error - previous_error) / period       (单位/秒)
//! torque     = p_gain * error + d_gain * derivative
//!            + mass * g * L * cos(theta)               (仅配置了前馈的关节)
//! output     = torque_to_value(torque)                 (向零截断)
//! ```
//!
//! 重力项是开环前馈，theta 由**当前**位置（不是目标位置）换算而来：
//! 跟踪误差很大时前馈依然对应真实姿态。
//!
//! 微分项的分母是配置的名义周期，不是实测耗时；调度超期由循环
//! 驱动器记录并告警。`previous_error` 每关节每周期恰好提交一次，
//! 目标位置变化时不重置——目标阶跃会带来一次微分冲击，与历史
//! 行为一致。

use crate::controller::Controller;
use crate::joint::{Joint, JointArray};
use pantilt_protocol::ModelInfo;
use std::convert::Infallible;

/// 重力前馈参数
///
/// 补偿把质量 `mass_kg` 保持在当前俯仰角所需的静力矩。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GravityFeedforward {
    /// 负载质量（kg）
    pub mass_kg: f64,
    /// 重力加速度（m/s²）
    pub gravity_mps2: f64,
    /// 连杆长度（m）
    pub link_length_m: f64,
}

impl GravityFeedforward {
    /// 给定关节角下的静力矩（N·m）
    pub fn torque_at(&self, theta_rad: f64) -> f64 {
        self.mass_kg * self.gravity_mps2 * self.link_length_m * theta_rad.cos()
    }
}

/// 重力补偿 PD 控制器
#[derive(Debug, Clone)]
pub struct GravityPdController {
    /// 比例增益
    p_gain: f64,
    /// 微分增益
    d_gain: f64,
    /// 名义控制周期（秒），微分项的固定除数
    period_s: f64,
    /// 每关节的型号信息（单位换算）
    models: JointArray<ModelInfo>,
    /// 每关节的重力前馈配置（无负载的关节为 None）
    feedforward: JointArray<Option<GravityFeedforward>>,
    /// 上一周期误差（微分项记忆）
    previous_error: JointArray<i32>,
}

impl GravityPdController {
    /// 创建控制器
    ///
    /// 增益默认为 0，通过 [`with_gains`](Self::with_gains) 设置。
    pub fn new(models: JointArray<ModelInfo>, period_s: f64) -> Self {
        Self {
            p_gain: 0.0,
            d_gain: 0.0,
            period_s,
            models,
            feedforward: JointArray::splat(None),
            previous_error: JointArray::splat(0),
        }
    }

    /// 设置 PD 增益
    pub fn with_gains(mut self, p_gain: f64, d_gain: f64) -> Self {
        self.p_gain = p_gain;
        self.d_gain = d_gain;
        self
    }

    /// 为某个关节配置重力前馈
    pub fn with_feedforward(mut self, joint: Joint, feedforward: GravityFeedforward) -> Self {
        self.feedforward[joint] = Some(feedforward);
        self
    }

    /// 上一周期误差（调试与测试用）
    pub fn previous_error(&self) -> JointArray<i32> {
        self.previous_error
    }
}

impl Controller for GravityPdController {
    type Error = Infallible;

    fn tick(
        &mut self,
        goal: &JointArray<i32>,
        present: &JointArray<Option<i32>>,
    ) -> Result<JointArray<Option<i32>>, Self::Error> {
        let mut output = JointArray::splat(None);

        for joint in Joint::ALL {
            // 本周期没有有效读数：跳过该关节，记忆保持不变
            let Some(position) = present[joint] else {
                continue;
            };

            let error = goal[joint] - position;
            let derivative = (error - self.previous_error[joint]) as f64 / self.period_s;
            let mut torque = self.p_gain * error as f64 + self.d_gain * derivative;

            if let Some(feedforward) = &self.feedforward[joint] {
                let theta = self.models[joint].value_to_radian(position);
                torque += feedforward.torque_at(theta);
            }

            output[joint] = Some(self.models[joint].torque_to_value(torque));
            self.previous_error[joint] = error;
        }

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pantilt_protocol::model::XM430_W350;
    use std::f64::consts::PI;

    const PERIOD: f64 = 0.004;

    fn controller() -> GravityPdController {
        GravityPdController::new(JointArray::splat(XM430_W350), PERIOD)
            .with_gains(0.003, 0.00002)
    }

    fn tilt_feedforward() -> GravityFeedforward {
        GravityFeedforward {
            mass_kg: 0.082,
            gravity_mps2: 9.8,
            link_length_m: 0.018,
        }
    }

    /// 参考场景：goal=0, present=1000, prev=0
    /// error=-1000, derivative=-250000,
    /// torque = 0.003*(-1000) + 0.00002*(-250000) = -3 + -5 = -8
    #[test]
    fn test_reference_scenario_pan() {
        let mut pd = controller();
        let goal = JointArray::splat(0);
        let present = JointArray::new([Some(1000), None]);

        let output = pd.tick(&goal, &present).unwrap();
        assert_eq!(
            output[Joint::Pan],
            Some(XM430_W350.torque_to_value(-8.0))
        );
        assert_eq!(pd.previous_error()[Joint::Pan], -1000);
    }

    /// 微分项对注入的误差序列精确复现 (e_t - e_{t-1}) / period
    #[test]
    fn test_derivative_reproduction() {
        // 只保留微分项
        let mut pd = GravityPdController::new(JointArray::splat(XM430_W350), PERIOD)
            .with_gains(0.0, 1.0);

        let goal = JointArray::splat(0);
        let positions = [100, 250, 250, 50];
        let mut previous_error = 0i32;

        for position in positions {
            let present = JointArray::new([Some(position), None]);
            let output = pd.tick(&goal, &present).unwrap();

            let error = -position;
            let expected_torque = (error - previous_error) as f64 / PERIOD;
            assert_eq!(
                output[Joint::Pan],
                Some(XM430_W350.torque_to_value(expected_torque))
            );
            previous_error = error;
        }
    }

    /// 重力项只依赖当前位置：固定 present、变化 goal，增益为零时
    /// 输出完全由 cos(theta) 决定
    #[test]
    fn test_gravity_term_ignores_goal() {
        let feedforward = tilt_feedforward();
        let present_value = 2048 + 512;

        let mut outputs = Vec::new();
        for goal_value in [0, 1000, 4095] {
            // 每次用新控制器，排除微分记忆影响；增益为零隔离重力项
            let mut pd = GravityPdController::new(JointArray::splat(XM430_W350), PERIOD)
                .with_feedforward(Joint::Tilt, feedforward);
            let goal = JointArray::new([0, goal_value]);
            let present = JointArray::new([None, Some(present_value)]);
            outputs.push(pd.tick(&goal, &present).unwrap()[Joint::Tilt]);
        }
        assert!(outputs.windows(2).all(|w| w[0] == w[1]));

        let theta = XM430_W350.value_to_radian(present_value);
        let expected = XM430_W350.torque_to_value(feedforward.torque_at(theta));
        assert_eq!(outputs[0], Some(expected));
    }

    /// 前馈数值：theta = 0 时力矩为 mass*g*L
    #[test]
    fn test_gravity_magnitude_at_horizontal() {
        let feedforward = tilt_feedforward();
        let expected = 0.082 * 9.8 * 0.018;
        assert!((feedforward.torque_at(0.0) - expected).abs() < 1e-12);
        // 竖直位置时力臂为零
        assert!(feedforward.torque_at(PI / 2.0).abs() < 1e-12);
    }

    /// pan 关节没有前馈配置时不含重力项
    #[test]
    fn test_pan_has_no_gravity_term() {
        let mut with_ff = controller().with_feedforward(Joint::Tilt, tilt_feedforward());
        let mut without_ff = controller();

        let goal = JointArray::splat(0);
        let present = JointArray::new([Some(1000), None]);
        assert_eq!(
            with_ff.tick(&goal, &present).unwrap()[Joint::Pan],
            without_ff.tick(&goal, &present).unwrap()[Joint::Pan]
        );
    }

    /// 缺采样的关节：无输出，previous_error 不动
    #[test]
    fn test_missing_sample_holds_memory() {
        let mut pd = controller();
        let goal = JointArray::splat(0);

        // 先积累一个非零记忆
        pd.tick(&goal, &JointArray::new([Some(1000), Some(500)])).unwrap();
        assert_eq!(pd.previous_error()[Joint::Tilt], -500);

        // tilt 缺数的周期
        let output = pd.tick(&goal, &JointArray::new([Some(900), None])).unwrap();
        assert_eq!(output[Joint::Tilt], None);
        assert_eq!(pd.previous_error()[Joint::Tilt], -500);
        // pan 正常推进
        assert_eq!(pd.previous_error()[Joint::Pan], -900);
    }

    /// 目标变化不重置微分记忆（保持历史行为）
    #[test]
    fn test_goal_step_does_not_reset_memory() {
        let mut pd = controller();
        pd.tick(&JointArray::splat(0), &JointArray::new([Some(1000), None]))
            .unwrap();
        assert_eq!(pd.previous_error()[Joint::Pan], -1000);

        // 目标阶跃到 2000：error = 2000 - 1000 = 1000，
        // derivative = (1000 - (-1000)) / period —— 一次冲击，不被抑制
        let output = pd
            .tick(&JointArray::new([2000, 0]), &JointArray::new([Some(1000), None]))
            .unwrap();
        let expected_torque = 0.003 * 1000.0 + 0.00002 * (2000.0 / PERIOD);
        assert_eq!(
            output[Joint::Pan],
            Some(XM430_W350.torque_to_value(expected_torque))
        );
    }

    /// 输出向零截断（正负对称）
    #[test]
    fn test_output_truncates_toward_zero() {
        let mut pd = GravityPdController::new(JointArray::splat(XM430_W350), PERIOD)
            .with_gains(0.003, 0.0);

        // error = ±1 → torque = ±0.003 → 不足一个电流单位 → 0
        let output = pd
            .tick(&JointArray::splat(1), &JointArray::new([Some(0), Some(2)]))
            .unwrap();
        assert_eq!(output[Joint::Pan], Some(0));
        assert_eq!(output[Joint::Tilt], Some(0));
    }
}
