//! 网格变形器
//!
//! 变形器种类是封闭集合，用枚举分发。所有变形器只改写网格的当前数据，
//! 运行时不返回错误。

mod dual_quat_skin;
mod morph;
mod soft_skin;
mod stack;

pub use dual_quat_skin::DualQuatSkinDeformer;
pub use morph::{MorphDelta, MorphMeshDeformer, MorphTarget};
pub use soft_skin::SoftSkinDeformer;
pub use stack::MeshDeformerStack;

use glam::{Mat4, Vec3, Vec4};
use rayon::prelude::*;

use crate::math::DualQuat;
use crate::mesh::{AttributeKind, Mesh};
use crate::skeleton::{Pose, Skeleton};

/// 顶点数超过该值时蒙皮循环走 rayon 并行
pub const PARALLEL_VERTEX_THRESHOLD: usize = 2048;

/// 变形器类型
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DeformerType {
    SoftSkin,
    DualQuatSkin,
    Morph,
}

/// 变形器更新所需的外部状态（由 ActorInstance 提供）
#[derive(Clone, Copy)]
pub struct DeformContext<'a> {
    pub skeleton: &'a Skeleton,
    /// 全局矩阵必须已经解析
    pub pose: &'a Pose,
    /// 网格所属节点
    pub node_index: usize,
    pub time_delta: f32,
}

impl<'a> DeformContext<'a> {
    pub fn new(skeleton: &'a Skeleton, pose: &'a Pose, node_index: usize, time_delta: f32) -> Self {
        Self {
            skeleton,
            pose,
            node_index,
            time_delta,
        }
    }

    /// 节点的蒙皮矩阵，节点不存在时为单位矩阵
    pub fn skinning_matrix(&self, node_nr: usize) -> Mat4 {
        match (
            self.skeleton.node(node_nr),
            self.pose.global_transforms().get(node_nr),
        ) {
            (Some(node), Some(global)) => node.skinning_matrix(global),
            _ => Mat4::IDENTITY,
        }
    }
}

/// 网格变形器
#[derive(Clone, Debug)]
pub enum MeshDeformer {
    SoftSkin(SoftSkinDeformer),
    DualQuatSkin(DualQuatSkinDeformer),
    Morph(MorphMeshDeformer),
}

impl MeshDeformer {
    pub fn kind(&self) -> DeformerType {
        match self {
            Self::SoftSkin(_) => DeformerType::SoftSkin,
            Self::DualQuatSkin(_) => DeformerType::DualQuatSkin,
            Self::Morph(_) => DeformerType::Morph,
        }
    }

    pub fn is_enabled(&self) -> bool {
        match self {
            Self::SoftSkin(d) => d.is_enabled(),
            Self::DualQuatSkin(d) => d.is_enabled(),
            Self::Morph(d) => d.is_enabled(),
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        match self {
            Self::SoftSkin(d) => d.set_enabled(enabled),
            Self::DualQuatSkin(d) => d.set_enabled(enabled),
            Self::Morph(d) => d.set_enabled(enabled),
        }
    }

    /// 骨架或网格 LOD 变化时调用，不需要每帧调用
    pub fn reinitialize(&mut self, mesh: &Mesh) {
        match self {
            Self::SoftSkin(d) => d.reinitialize(mesh),
            Self::DualQuatSkin(d) => d.reinitialize(mesh),
            Self::Morph(d) => d.reinitialize(mesh),
        }
    }

    /// 读取网格当前数据并原地改写
    pub fn update(&mut self, mesh: &mut Mesh, ctx: &DeformContext) {
        match self {
            Self::SoftSkin(d) => d.update(mesh, ctx),
            Self::DualQuatSkin(d) => d.update(mesh, ctx),
            Self::Morph(d) => d.update(mesh, ctx),
        }
    }
}

impl From<SoftSkinDeformer> for MeshDeformer {
    fn from(deformer: SoftSkinDeformer) -> Self {
        Self::SoftSkin(deformer)
    }
}

impl From<DualQuatSkinDeformer> for MeshDeformer {
    fn from(deformer: DualQuatSkinDeformer) -> Self {
        Self::DualQuatSkin(deformer)
    }
}

impl From<MorphMeshDeformer> for MeshDeformer {
    fn from(deformer: MorphMeshDeformer) -> Self {
        Self::Morph(deformer)
    }
}

// ========== 蒙皮变形器共用部分 ==========

/// 局部骨骼表：骨骼列表与节点到局部索引的映射
#[derive(Clone, Debug, Default)]
pub(crate) struct SkinBoneTable {
    pub node_numbers: Vec<usize>,
    node_to_bone: Vec<Option<usize>>,
}

impl SkinBoneTable {
    /// 扫描蒙皮层收集所有被引用的骨骼
    pub fn rebuild(&mut self, mesh: &Mesh) {
        self.node_numbers.clear();
        match mesh.skinning_info() {
            Some(skinning) => skinning.collect_influenced_nodes(&mut self.node_numbers),
            None => log::warn!("网格没有蒙皮层，蒙皮变形器将保持顶点不变"),
        }

        let size = self.node_numbers.iter().max().map_or(0, |&max| max + 1);
        self.node_to_bone = vec![None; size];
        for (bone, &node) in self.node_numbers.iter().enumerate() {
            self.node_to_bone[node] = Some(bone);
        }
    }

    pub fn bone_for_node(&self, node_nr: usize) -> Option<usize> {
        self.node_to_bone.get(node_nr).copied().flatten()
    }
}

/// 逐顶点变换
pub(crate) trait VertexTransform: Copy + Send + Sync {
    fn transform_point(&self, point: Vec3) -> Vec3;
    fn transform_vector(&self, vector: Vec3) -> Vec3;
}

impl VertexTransform for Mat4 {
    fn transform_point(&self, point: Vec3) -> Vec3 {
        self.transform_point3(point)
    }

    fn transform_vector(&self, vector: Vec3) -> Vec3 {
        self.transform_vector3(vector)
    }
}

impl VertexTransform for DualQuat {
    fn transform_point(&self, point: Vec3) -> Vec3 {
        DualQuat::transform_point(self, point)
    }

    fn transform_vector(&self, vector: Vec3) -> Vec3 {
        DualQuat::transform_vector(self, vector)
    }
}

/// 为每个复制顶点计算混合变换
///
/// `blend` 接收该顶点的影响列表；没有蒙皮层时所有顶点使用 `identity`。
pub(crate) fn compute_vertex_transforms<X, F>(
    mesh: &Mesh,
    out: &mut Vec<X>,
    identity: X,
    blend: F,
) where
    X: VertexTransform,
    F: Fn(&[crate::mesh::SkinInfluence]) -> X + Sync,
{
    let num_vertices = mesh.num_vertices();
    out.clear();
    out.resize(num_vertices, identity);

    let Some(skinning) = mesh.skinning_info() else {
        return;
    };
    let org_vertices = mesh.org_vertex_numbers();
    let compute = |(v, transform): (usize, &mut X)| {
        let org = org_vertices.map_or(v, |org| org[v] as usize);
        let influences = skinning.influences(org);
        if !influences.is_empty() {
            *transform = blend(influences);
        }
    };

    if num_vertices > PARALLEL_VERTEX_THRESHOLD {
        out.par_iter_mut().enumerate().for_each(compute);
    } else {
        out.iter_mut().enumerate().for_each(compute);
    }
}

/// 把逐顶点变换应用到所有可变形层（位置、法线、切线、副切线）
pub(crate) fn apply_vertex_transforms<X: VertexTransform>(mesh: &mut Mesh, transforms: &[X]) {
    let parallel = transforms.len() > PARALLEL_VERTEX_THRESHOLD;
    for index in 0..mesh.num_vertex_attribute_layers() {
        let layer = mesh.vertex_attribute_layer_mut(index);
        match layer.kind() {
            AttributeKind::Positions => {
                if let Some(data) = layer.data_mut::<Vec3>() {
                    for_each_vertex(data, transforms, parallel, |p, x| {
                        *p = x.transform_point(*p)
                    });
                }
            }
            AttributeKind::Normals | AttributeKind::Bitangents => {
                if let Some(data) = layer.data_mut::<Vec3>() {
                    for_each_vertex(data, transforms, parallel, |n, x| {
                        *n = x.transform_vector(*n).normalize_or_zero()
                    });
                }
            }
            AttributeKind::Tangents => {
                if let Some(data) = layer.data_mut::<Vec4>() {
                    for_each_vertex(data, transforms, parallel, |t, x| {
                        let skinned = x.transform_vector(t.truncate()).normalize_or_zero();
                        *t = skinned.extend(t.w);
                    });
                }
            }
            _ => {}
        }
    }
}

fn for_each_vertex<T: Send, X: VertexTransform>(
    data: &mut [T],
    transforms: &[X],
    parallel: bool,
    f: impl Fn(&mut T, &X) + Sync + Send,
) {
    if parallel {
        data.par_iter_mut()
            .zip(transforms.par_iter())
            .for_each(|(value, transform)| f(value, transform));
    } else {
        data.iter_mut()
            .zip(transforms)
            .for_each(|(value, transform)| f(value, transform));
    }
}
