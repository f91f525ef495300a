//! Morph 变形器

use std::collections::HashMap;

use glam::{Vec3, Vec4};

use super::DeformContext;
use crate::mesh::{AttributeKind, Mesh};

/// 单个复制顶点的 Morph 偏移
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MorphDelta {
    pub vertex_index: u32,
    pub position: Vec3,
    pub normal: Vec3,
    pub tangent: Vec3,
}

impl MorphDelta {
    /// 只有位置偏移
    pub fn position(vertex_index: u32, position: Vec3) -> Self {
        Self {
            vertex_index,
            position,
            normal: Vec3::ZERO,
            tangent: Vec3::ZERO,
        }
    }
}

/// Morph 目标
#[derive(Clone, Debug, Default)]
pub struct MorphTarget {
    pub name: String,
    weight: f32,
    pub deltas: Vec<MorphDelta>,
}

impl MorphTarget {
    pub fn new(name: impl Into<String>, deltas: Vec<MorphDelta>) -> Self {
        Self {
            name: name.into(),
            weight: 0.0,
            deltas,
        }
    }

    /// 获取名称
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 获取权重
    pub fn weight(&self) -> f32 {
        self.weight
    }

    /// 设置权重（限制在 [0, 1]）
    pub fn set_weight(&mut self, weight: f32) {
        self.weight = weight.clamp(0.0, 1.0);
    }

    /// 重置权重
    pub fn reset(&mut self) {
        self.weight = 0.0;
    }
}

/// Morph 变形器：把加权偏移叠加到当前数据上
#[derive(Clone, Debug)]
pub struct MorphMeshDeformer {
    enabled: bool,
    targets: Vec<MorphTarget>,
    name_to_index: HashMap<String, usize>,
}

impl Default for MorphMeshDeformer {
    fn default() -> Self {
        Self::new()
    }
}

impl MorphMeshDeformer {
    pub fn new() -> Self {
        Self {
            enabled: true,
            targets: Vec::new(),
            name_to_index: HashMap::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// 添加目标，返回索引
    pub fn add_target(&mut self, target: MorphTarget) -> usize {
        let index = self.targets.len();
        self.name_to_index.insert(target.name.clone(), index);
        self.targets.push(target);
        index
    }

    /// 通过名称查找目标
    pub fn find_target_by_name(&self, name: &str) -> Option<usize> {
        self.name_to_index.get(name).copied()
    }

    /// 获取目标数量
    pub fn num_targets(&self) -> usize {
        self.targets.len()
    }

    pub fn target(&self, index: usize) -> Option<&MorphTarget> {
        self.targets.get(index)
    }

    pub fn target_mut(&mut self, index: usize) -> Option<&mut MorphTarget> {
        self.targets.get_mut(index)
    }

    /// 设置目标权重
    pub fn set_target_weight(&mut self, index: usize, weight: f32) {
        if let Some(target) = self.targets.get_mut(index) {
            target.set_weight(weight);
        }
    }

    /// 重置所有目标权重
    pub fn reset_all_weights(&mut self) {
        for target in &mut self.targets {
            target.reset();
        }
    }

    /// 检查偏移引用的顶点是否都在网格范围内
    pub fn reinitialize(&mut self, mesh: &Mesh) {
        let num_vertices = mesh.num_vertices();
        for target in &self.targets {
            let invalid = target
                .deltas
                .iter()
                .filter(|delta| delta.vertex_index as usize >= num_vertices)
                .count();
            if invalid > 0 {
                log::warn!(
                    "Morph 目标 '{}' 有 {} 个偏移超出顶点范围 ({})，更新时跳过",
                    target.name,
                    invalid,
                    num_vertices
                );
            }
        }
    }

    pub fn update(&mut self, mesh: &mut Mesh, _ctx: &DeformContext) {
        for target in &self.targets {
            let weight = target.weight;
            if weight <= 0.0 {
                continue;
            }

            if let Some(positions) =
                mesh.find_vertex_data_mut::<Vec3>(AttributeKind::Positions, 0)
            {
                for delta in &target.deltas {
                    if let Some(p) = positions.get_mut(delta.vertex_index as usize) {
                        *p += delta.position * weight;
                    }
                }
            }
            if let Some(normals) = mesh.find_vertex_data_mut::<Vec3>(AttributeKind::Normals, 0) {
                for delta in &target.deltas {
                    if let Some(n) = normals.get_mut(delta.vertex_index as usize) {
                        *n += delta.normal * weight;
                    }
                }
            }
            if let Some(tangents) = mesh.find_vertex_data_mut::<Vec4>(AttributeKind::Tangents, 0) {
                for delta in &target.deltas {
                    if let Some(t) = tangents.get_mut(delta.vertex_index as usize) {
                        *t += (delta.tangent * weight).extend(0.0);
                    }
                }
            }
        }
    }
}
