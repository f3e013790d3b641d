//! 关节索引和数组
//!
//! 云台只有两个关节（pan/tilt），进程生命周期内固定不变。
//! 使用枚举索引的定长数组，编译期排除越界和身份混淆。
//!
//! # 示例
//!
//! ```rust
//! use pantilt_control::joint::{Joint, JointArray};
//!
//! let ids = JointArray::new([1u8, 2u8]);
//! assert_eq!(ids[Joint::Pan], 1);
//! assert_eq!(ids[Joint::Tilt], 2);
//!
//! let doubled = ids.map(|id| id * 2);
//! assert_eq!(doubled[Joint::Tilt], 4);
//! ```

use std::fmt;
use std::ops::{Index, IndexMut};

/// 关节枚举
///
/// 云台关节只有水平（pan）和俯仰（tilt）两个，俯仰轴承载重力负载。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Joint {
    /// 水平旋转轴
    Pan = 0,
    /// 俯仰轴（承载重力负载）
    Tilt = 1,
}

impl Joint {
    /// 所有关节
    pub const ALL: [Joint; 2] = [Joint::Pan, Joint::Tilt];

    /// 关节数量
    pub const COUNT: usize = 2;

    /// 获取关节索引（0-1）
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// 从索引创建关节（范围检查）
    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Joint::Pan),
            1 => Some(Joint::Tilt),
            _ => None,
        }
    }

    /// 获取关节名称
    pub const fn name(self) -> &'static str {
        match self {
            Joint::Pan => "pan",
            Joint::Tilt => "tilt",
        }
    }
}

impl fmt::Display for Joint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// 关节数组
///
/// 类型安全的双关节容器，支持索引、迭代和映射操作。
#[derive(Debug, Clone, PartialEq)]
pub struct JointArray<T> {
    data: [T; 2],
}

impl<T: Copy> Copy for JointArray<T> {}

impl<T> JointArray<T> {
    /// 创建新的关节数组（顺序为 [pan, tilt]）
    #[inline]
    pub const fn new(data: [T; 2]) -> Self {
        JointArray { data }
    }

    /// 获取内部数组的引用
    #[inline]
    pub fn as_array(&self) -> &[T; 2] {
        &self.data
    }

    /// 迭代器
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.data.iter()
    }

    /// 映射转换
    pub fn map<U, F>(self, mut f: F) -> JointArray<U>
    where
        F: FnMut(T) -> U,
    {
        let [pan, tilt] = self.data;
        JointArray::new([f(pan), f(tilt)])
    }

    /// 带关节标识的映射转换
    pub fn map_with_joint<U, F>(self, mut f: F) -> JointArray<U>
    where
        F: FnMut(Joint, T) -> U,
    {
        let [pan, tilt] = self.data;
        JointArray::new([f(Joint::Pan, pan), f(Joint::Tilt, tilt)])
    }
}

impl<T: Copy> JointArray<T> {
    /// 创建所有元素相同的数组
    #[inline]
    pub const fn splat(value: T) -> Self {
        JointArray::new([value, value])
    }
}

impl<T: Default> Default for JointArray<T> {
    fn default() -> Self {
        JointArray::new([T::default(), T::default()])
    }
}

impl<T> Index<Joint> for JointArray<T> {
    type Output = T;

    #[inline]
    fn index(&self, joint: Joint) -> &T {
        &self.data[joint.index()]
    }
}

impl<T> IndexMut<Joint> for JointArray<T> {
    #[inline]
    fn index_mut(&mut self, joint: Joint) -> &mut T {
        &mut self.data[joint.index()]
    }
}

impl<T> From<[T; 2]> for JointArray<T> {
    #[inline]
    fn from(data: [T; 2]) -> Self {
        JointArray::new(data)
    }
}

impl<T: serde::Serialize> serde::Serialize for JointArray<T> {
    /// 按关节名序列化为 `{"pan": …, "tilt": …}`
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;
        let mut s = serializer.serialize_struct("JointArray", 2)?;
        s.serialize_field("pan", &self.data[Joint::Pan.index()])?;
        s.serialize_field("tilt", &self.data[Joint::Tilt.index()])?;
        s.end()
    }
}

impl<T> IntoIterator for JointArray<T> {
    type Item = T;
    type IntoIter = std::array::IntoIter<T, 2>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_joint_index() {
        assert_eq!(Joint::Pan.index(), 0);
        assert_eq!(Joint::Tilt.index(), 1);
    }

    #[test]
    fn test_joint_from_index() {
        assert_eq!(Joint::from_index(0), Some(Joint::Pan));
        assert_eq!(Joint::from_index(1), Some(Joint::Tilt));
        assert_eq!(Joint::from_index(2), None);
    }

    #[test]
    fn test_joint_name() {
        assert_eq!(Joint::Pan.name(), "pan");
        assert_eq!(format!("{}", Joint::Tilt), "tilt");
    }

    #[test]
    fn test_joint_serde_lowercase() {
        let joint: Joint = serde_json::from_str("\"pan\"").unwrap();
        assert_eq!(joint, Joint::Pan);
        assert_eq!(serde_json::to_string(&Joint::Tilt).unwrap(), "\"tilt\"");
    }

    #[test]
    fn test_joint_array_serialize_by_name() {
        let arr = JointArray::new([1, 2]);
        assert_eq!(
            serde_json::to_string(&arr).unwrap(),
            r#"{"pan":1,"tilt":2}"#
        );
    }

    #[test]
    fn test_joint_array_indexing() {
        let mut arr = JointArray::new([10, 20]);
        assert_eq!(arr[Joint::Pan], 10);
        arr[Joint::Tilt] = 30;
        assert_eq!(arr[Joint::Tilt], 30);
    }

    #[test]
    fn test_joint_array_map() {
        let arr = JointArray::new([1, 2]).map(|v| v * 10);
        assert_eq!(arr[Joint::Pan], 10);
        assert_eq!(arr[Joint::Tilt], 20);
    }

    #[test]
    fn test_joint_array_map_with_joint() {
        let names = JointArray::splat(0).map_with_joint(|joint, _| joint.name());
        assert_eq!(names[Joint::Pan], "pan");
        assert_eq!(names[Joint::Tilt], "tilt");
    }

    #[test]
    fn test_joint_array_splat_default() {
        let arr = JointArray::splat(7);
        assert_eq!(arr[Joint::Pan], 7);
        assert_eq!(arr[Joint::Tilt], 7);

        let arr: JointArray<i32> = JointArray::default();
        assert_eq!(arr[Joint::Pan], 0);
    }
}
