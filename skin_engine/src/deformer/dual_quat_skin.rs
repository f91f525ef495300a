//! 对偶四元数蒙皮变形器

use super::{apply_vertex_transforms, compute_vertex_transforms, DeformContext, SkinBoneTable};
use crate::math::DualQuat;
use crate::mesh::Mesh;

/// 对偶四元数蒙皮（DQS），骨骼缩放被忽略
#[derive(Clone, Debug)]
pub struct DualQuatSkinDeformer {
    enabled: bool,
    bones: SkinBoneTable,
    bone_transforms: Vec<DualQuat>,
    vertex_transforms: Vec<DualQuat>,
}

impl Default for DualQuatSkinDeformer {
    fn default() -> Self {
        Self::new()
    }
}

impl DualQuatSkinDeformer {
    pub fn new() -> Self {
        Self {
            enabled: true,
            bones: SkinBoneTable::default(),
            bone_transforms: Vec::new(),
            vertex_transforms: Vec::new(),
        }
    }

    pub fn for_mesh(mesh: &Mesh) -> Self {
        let mut deformer = Self::new();
        deformer.reinitialize(mesh);
        deformer
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn num_local_bones(&self) -> usize {
        self.bones.node_numbers.len()
    }

    pub fn reinitialize(&mut self, mesh: &Mesh) {
        self.bones.rebuild(mesh);
        self.bone_transforms = vec![DualQuat::IDENTITY; self.bones.node_numbers.len()];
    }

    pub fn update(&mut self, mesh: &mut Mesh, ctx: &DeformContext) {
        for (dq, &node) in self.bone_transforms.iter_mut().zip(&self.bones.node_numbers) {
            *dq = DualQuat::from_matrix(&ctx.skinning_matrix(node));
        }

        let bones = &self.bones;
        let bone_transforms = &self.bone_transforms;
        let bone_dq = |node_nr: usize| {
            bones
                .bone_for_node(node_nr)
                .map_or(DualQuat::IDENTITY, |bone| bone_transforms[bone])
        };

        compute_vertex_transforms(
            mesh,
            &mut self.vertex_transforms,
            DualQuat::IDENTITY,
            |influences| {
                // 与第一个影响不在同一半球的骨骼取反，避免走远路插值
                let pivot = bone_dq(influences[0].node_nr);
                influences
                    .iter()
                    .fold(DualQuat::ZERO, |sum, influence| {
                        let dq = bone_dq(influence.node_nr);
                        let weight = if dq.real_dot(&pivot) < 0.0 {
                            -influence.weight
                        } else {
                            influence.weight
                        };
                        sum.add(&dq.scaled(weight))
                    })
                    .normalized()
            },
        );

        apply_vertex_transforms(mesh, &self.vertex_transforms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Transform;
    use crate::mesh::{AttributeKind, SkinningInfoVertexAttributeLayer, VertexAttributeLayer};
    use crate::skeleton::{Node, Pose, Skeleton};
    use glam::{Quat, Vec3};

    #[test]
    fn test_twist_preserves_radius() {
        let mut skeleton = Skeleton::new();
        skeleton.add_node(Node::new("upper", None, Transform::IDENTITY));
        skeleton.add_node(Node::new(
            "lower",
            Some(0),
            Transform::from_translation(Vec3::X),
        ));
        skeleton.build_hierarchy().unwrap();

        let mut pose = Pose::from_skeleton(&skeleton);
        pose.set_local_transform(
            1,
            Transform::from_rotation_translation(
                Quat::from_rotation_x(std::f32::consts::PI * 0.9),
                Vec3::X,
            ),
        );
        pose.calc_global_transforms(&skeleton);

        // 位于关节处、离轴 0.5 的顶点，两骨骼各占一半
        let mut mesh = Mesh::with_counts(1, 0, 0, 1, false);
        mesh.add_vertex_attribute_layer(VertexAttributeLayer::from_values(
            AttributeKind::Positions,
            vec![Vec3::new(1.0, 0.5, 0.0)],
            true,
        ));
        let mut skinning = SkinningInfoVertexAttributeLayer::new(1);
        skinning.add_influence(0, 0, 0.5, 0);
        skinning.add_influence(0, 1, 0.5, 0);
        mesh.add_shared_vertex_attribute_layer(skinning);

        let mut deformer = DualQuatSkinDeformer::for_mesh(&mesh);
        deformer.update(&mut mesh, &DeformContext::new(&skeleton, &pose, 0, 0.0));

        let p = mesh.find_vertex_data::<Vec3>(AttributeKind::Positions, 0).unwrap()[0];
        let radius = (p - Vec3::new(p.x, 0.0, 0.0)).length();
        assert!((radius - 0.5).abs() < 1e-4, "radius = {}", radius);
        assert!((p.x - 1.0).abs() < 1e-4);
    }
}
