//! 骨架

use std::collections::HashMap;

use glam::Mat4;

use super::Node;
use crate::{Result, SkinError};

/// 骨架：节点列表 + 层级求值顺序
#[derive(Clone, Debug, Default)]
pub struct Skeleton {
    nodes: Vec<Node>,
    name_to_index: HashMap<String, usize>,
    /// 父节点总在子节点之前
    sorted_indices: Vec<usize>,
    root_nodes: Vec<usize>,
}

impl Skeleton {
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加节点，返回索引
    pub fn add_node(&mut self, node: Node) -> usize {
        let index = self.nodes.len();
        self.name_to_index.insert(node.name.clone(), index);
        self.nodes.push(node);
        index
    }

    /// 构建层级：求值顺序、根节点列表与绑定姿势矩阵
    ///
    /// 父索引越界或成环时返回 `SkinError::InvalidNode`。
    pub fn build_hierarchy(&mut self) -> Result<()> {
        let count = self.nodes.len();

        // 按深度排序，得到父先子后的顺序
        let mut depths = vec![0usize; count];
        for (i, depth) in depths.iter_mut().enumerate() {
            let mut current = self.nodes[i].parent_index;
            let mut steps = 0;
            while let Some(parent) = current {
                if parent >= count || steps >= count {
                    return Err(SkinError::InvalidNode(i));
                }
                steps += 1;
                current = self.nodes[parent].parent_index;
            }
            *depth = steps;
        }

        self.sorted_indices = (0..count).collect();
        self.sorted_indices.sort_by_key(|&i| depths[i]);
        self.root_nodes = (0..count).filter(|&i| self.nodes[i].is_root()).collect();

        for position in 0..count {
            let i = self.sorted_indices[position];
            let local = self.nodes[i].local_transform.to_matrix();
            let bind_pose = match self.nodes[i].parent_index {
                Some(parent) => self.nodes[parent].bind_pose * local,
                None => local,
            };
            let node = &mut self.nodes[i];
            node.bind_pose = bind_pose;
            node.inverse_bind_matrix = bind_pose.inverse();
        }

        log::debug!("骨架层级构建完成: {} 个节点, {} 个根节点", count, self.root_nodes.len());
        Ok(())
    }

    /// 获取节点数量
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// 获取节点
    pub fn node(&self, index: usize) -> Option<&Node> {
        self.nodes.get(index)
    }

    pub fn node_mut(&mut self, index: usize) -> Option<&mut Node> {
        self.nodes.get_mut(index)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// 通过名称查找节点
    pub fn find_node_by_name(&self, name: &str) -> Option<usize> {
        self.name_to_index.get(name).copied()
    }

    pub fn parent_index(&self, index: usize) -> Option<usize> {
        self.nodes.get(index).and_then(Node::parent_index)
    }

    pub fn root_nodes(&self) -> &[usize] {
        &self.root_nodes
    }

    /// 父先子后的求值顺序
    pub fn evaluation_order(&self) -> &[usize] {
        &self.sorted_indices
    }

    /// 绑定姿势下所有节点的全局矩阵
    pub fn bind_pose_globals(&self) -> Vec<Mat4> {
        self.nodes.iter().map(|node| node.bind_pose).collect()
    }
}
