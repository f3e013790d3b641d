//! Controller trait - 控制器通用接口
//!
//! # 设计理念
//!
//! - **Tick 模式**: 循环驱动器控制节拍，控制器只负责计算
//! - **设备单位**: 输入输出都是设备原生整数，工程单位换算留在边界
//! - **缺数可见**: 某个关节本周期没有新采样时传入 `None`，控制器
//!   必须跳过该关节（输出 `None`，保持上一条指令），绝不能用陈旧
//!   数据算出错误的微分
//!
//! 周期内的顺序由驱动器保证：读取 → tick → 写入，严格串行。

use crate::joint::JointArray;

/// 控制器通用接口
///
/// 每个控制周期调用一次 [`tick`](Controller::tick)。控制器跨周期
/// 持有自己的记忆（如上一周期误差），周期内不做 I/O。
pub trait Controller {
    /// 控制器错误类型
    type Error: std::error::Error + Send + Sync + 'static;

    /// 计算一个周期的输出
    ///
    /// # 参数
    ///
    /// - `goal`: 本周期的目标位置快照（设备单位）
    /// - `present`: 每个关节的当前位置采样；`None` 表示本周期
    ///   该关节没有有效读数
    ///
    /// # 返回
    ///
    /// 每个关节的目标电流（设备单位）；`None` 表示该关节本周期
    /// 不下发指令（保持上一条）。
    fn tick(
        &mut self,
        goal: &JointArray<i32>,
        present: &JointArray<Option<i32>>,
    ) -> Result<JointArray<Option<i32>>, Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::joint::Joint;

    /// 简单的比例控制器
    struct TestController {
        kp: f64,
    }

    impl Controller for TestController {
        type Error = std::convert::Infallible;

        fn tick(
            &mut self,
            goal: &JointArray<i32>,
            present: &JointArray<Option<i32>>,
        ) -> Result<JointArray<Option<i32>>, Self::Error> {
            Ok(goal.map_with_joint(|joint, g| {
                present[joint].map(|p| (self.kp * (g - p) as f64) as i32)
            }))
        }
    }

    #[test]
    fn test_controller_trait_basic() {
        let mut controller = TestController { kp: 0.5 };
        let goal = JointArray::new([100, 200]);
        let present = JointArray::new([Some(0), Some(100)]);

        let output = controller.tick(&goal, &present).unwrap();
        assert_eq!(output[Joint::Pan], Some(50));
        assert_eq!(output[Joint::Tilt], Some(50));
    }

    #[test]
    fn test_missing_sample_skips_joint() {
        let mut controller = TestController { kp: 0.5 };
        let goal = JointArray::new([100, 200]);
        let present = JointArray::new([None, Some(100)]);

        let output = controller.tick(&goal, &present).unwrap();
        assert_eq!(output[Joint::Pan], None);
        assert_eq!(output[Joint::Tilt], Some(50));
    }
}
