//! 姿势：每个节点的局部变换与解析后的全局矩阵

use glam::Mat4;

use super::Skeleton;
use crate::math::Transform;

#[derive(Clone, Debug, Default)]
pub struct Pose {
    local_transforms: Vec<Transform>,
    global_transforms: Vec<Mat4>,
}

impl Pose {
    /// 以绑定姿势初始化
    pub fn from_skeleton(skeleton: &Skeleton) -> Self {
        Self {
            local_transforms: skeleton
                .nodes()
                .iter()
                .map(|node| node.local_transform)
                .collect(),
            global_transforms: skeleton.bind_pose_globals(),
        }
    }

    pub fn num_transforms(&self) -> usize {
        self.local_transforms.len()
    }

    pub fn local_transform(&self, node_index: usize) -> &Transform {
        &self.local_transforms[node_index]
    }

    pub fn set_local_transform(&mut self, node_index: usize, transform: Transform) {
        self.local_transforms[node_index] = transform;
    }

    /// 最近一次 calc_global_transforms 的结果
    pub fn global_transforms(&self) -> &[Mat4] {
        &self.global_transforms
    }

    pub fn global_transform(&self, node_index: usize) -> Mat4 {
        self.global_transforms[node_index]
    }

    /// 自顶向下解析全局矩阵，变形器读取前必须调用
    pub fn calc_global_transforms(&mut self, skeleton: &Skeleton) {
        self.global_transforms
            .resize(self.local_transforms.len(), Mat4::IDENTITY);
        for &i in skeleton.evaluation_order() {
            let local = self.local_transforms[i].to_matrix();
            self.global_transforms[i] = match skeleton.parent_index(i) {
                Some(parent) => self.global_transforms[parent] * local,
                None => local,
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skeleton::Node;
    use glam::{Quat, Vec3};

    #[test]
    fn test_parent_rotation_moves_child() {
        let mut skeleton = Skeleton::new();
        skeleton.add_node(Node::new("root", None, Transform::IDENTITY));
        skeleton.add_node(Node::new(
            "child",
            Some(0),
            Transform::from_translation(Vec3::X),
        ));
        skeleton.build_hierarchy().unwrap();

        let mut pose = Pose::from_skeleton(&skeleton);
        pose.set_local_transform(
            0,
            Transform::from_rotation_translation(
                Quat::from_rotation_z(std::f32::consts::FRAC_PI_2),
                Vec3::ZERO,
            ),
        );
        pose.calc_global_transforms(&skeleton);

        let child = pose.global_transform(1).transform_point3(Vec3::ZERO);
        assert!((child - Vec3::Y).length() < 1e-5);
    }
}
