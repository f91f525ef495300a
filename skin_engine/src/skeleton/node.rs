//! 骨架节点

use glam::Mat4;

use crate::math::Transform;

/// 骨架节点（骨骼）
#[derive(Clone, Debug)]
pub struct Node {
    pub name: String,
    /// 父节点，根节点为 None
    pub parent_index: Option<usize>,
    /// 绑定姿势下相对父节点的变换
    pub local_transform: Transform,

    // 在 build_hierarchy 中计算
    /// 绑定姿势全局矩阵
    pub bind_pose: Mat4,
    pub inverse_bind_matrix: Mat4,
}

impl Node {
    pub fn new(
        name: impl Into<String>,
        parent_index: Option<usize>,
        local_transform: Transform,
    ) -> Self {
        Self {
            name: name.into(),
            parent_index,
            local_transform,
            bind_pose: Mat4::IDENTITY,
            inverse_bind_matrix: Mat4::IDENTITY,
        }
    }

    /// 获取名称
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent_index(&self) -> Option<usize> {
        self.parent_index
    }

    pub fn is_root(&self) -> bool {
        self.parent_index.is_none()
    }

    /// 蒙皮矩阵 = 当前全局变换 * 逆绑定矩阵
    pub fn skinning_matrix(&self, global_transform: &Mat4) -> Mat4 {
        *global_transform * self.inverse_bind_matrix
    }
}
