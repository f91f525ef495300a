//! 线性混合蒙皮变形器

use glam::Mat4;

use super::{apply_vertex_transforms, compute_vertex_transforms, DeformContext, SkinBoneTable};
use crate::mesh::Mesh;

/// 线性混合蒙皮（LBS）
///
/// 每个局部骨骼预先计算蒙皮矩阵 = 全局变换 * 逆绑定矩阵，
/// 顶点结果为各影响 `weight * (matrix * v)` 之和。
#[derive(Clone, Debug)]
pub struct SoftSkinDeformer {
    enabled: bool,
    bones: SkinBoneTable,
    bone_matrices: Vec<Mat4>,
    vertex_matrices: Vec<Mat4>,
}

impl Default for SoftSkinDeformer {
    fn default() -> Self {
        Self::new()
    }
}

impl SoftSkinDeformer {
    pub fn new() -> Self {
        Self {
            enabled: true,
            bones: SkinBoneTable::default(),
            bone_matrices: Vec::new(),
            vertex_matrices: Vec::new(),
        }
    }

    /// 创建并按网格初始化
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

    /// 局部骨骼数量
    pub fn num_local_bones(&self) -> usize {
        self.bones.node_numbers.len()
    }

    /// 局部骨骼对应的节点
    pub fn local_bone_node(&self, index: usize) -> usize {
        self.bones.node_numbers[index]
    }

    /// 重建局部骨骼列表
    pub fn reinitialize(&mut self, mesh: &Mesh) {
        self.bones.rebuild(mesh);
        self.bone_matrices = vec![Mat4::IDENTITY; self.bones.node_numbers.len()];
    }

    pub fn update(&mut self, mesh: &mut Mesh, ctx: &DeformContext) {
        for (matrix, &node) in self.bone_matrices.iter_mut().zip(&self.bones.node_numbers) {
            *matrix = ctx.skinning_matrix(node);
        }

        let bones = &self.bones;
        let bone_matrices = &self.bone_matrices;
        compute_vertex_transforms(mesh, &mut self.vertex_matrices, Mat4::IDENTITY, |influences| {
            influences.iter().fold(Mat4::ZERO, |sum, influence| {
                let matrix = bones
                    .bone_for_node(influence.node_nr)
                    .map_or(Mat4::IDENTITY, |bone| bone_matrices[bone]);
                sum + matrix * influence.weight
            })
        });

        apply_vertex_transforms(mesh, &self.vertex_matrices);
    }
}
