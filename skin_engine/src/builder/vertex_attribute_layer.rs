//! 构建期属性层：按原始顶点保存每个复制顶点的属性值

use glam::{Vec2, Vec3, Vec4};

use crate::mesh::{AttributeData, AttributeKind};
use crate::{Result, SkinError};

/// 单个属性值
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AttributeValue {
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    U32(u32),
}

impl AttributeValue {
    /// 属性类型的零值
    pub fn zero_for(kind: AttributeKind) -> Self {
        match AttributeData::zeroed(kind, 0) {
            AttributeData::Vec2(_) => Self::Vec2(Vec2::ZERO),
            AttributeData::Vec3(_) => Self::Vec3(Vec3::ZERO),
            AttributeData::Vec4(_) => Self::Vec4(Vec4::ZERO),
            AttributeData::U32(_) => Self::U32(0),
        }
    }

    /// 与属性类型的存储格式是否一致
    pub fn matches_kind(&self, kind: AttributeKind) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(&Self::zero_for(kind))
    }

    /// 浮点分量在容差内相等，整数必须完全相等
    pub fn approx_eq(&self, other: &Self, tolerance: f32) -> bool {
        match (self, other) {
            (Self::Vec2(a), Self::Vec2(b)) => a.abs_diff_eq(*b, tolerance),
            (Self::Vec3(a), Self::Vec3(b)) => a.abs_diff_eq(*b, tolerance),
            (Self::Vec4(a), Self::Vec4(b)) => a.abs_diff_eq(*b, tolerance),
            (Self::U32(a), Self::U32(b)) => a == b,
            _ => false,
        }
    }

    /// 写入烘焙后的属性数据
    pub(crate) fn write_into(&self, data: &mut AttributeData, index: usize) {
        match (self, data) {
            (Self::Vec2(v), AttributeData::Vec2(out)) => out[index] = *v,
            (Self::Vec3(v), AttributeData::Vec3(out)) => out[index] = *v,
            (Self::Vec4(v), AttributeData::Vec4(out)) => out[index] = *v,
            (Self::U32(v), AttributeData::U32(out)) => out[index] = *v,
            _ => debug_assert!(false, "属性值类型与层类型不一致"),
        }
    }
}

impl From<Vec2> for AttributeValue {
    fn from(value: Vec2) -> Self {
        Self::Vec2(value)
    }
}

impl From<Vec3> for AttributeValue {
    fn from(value: Vec3) -> Self {
        Self::Vec3(value)
    }
}

impl From<Vec4> for AttributeValue {
    fn from(value: Vec4) -> Self {
        Self::Vec4(value)
    }
}

impl From<u32> for AttributeValue {
    fn from(value: u32) -> Self {
        Self::U32(value)
    }
}

/// 构建期逐顶点属性层
#[derive(Clone, Debug)]
pub struct MeshBuilderVertexAttributeLayer {
    kind: AttributeKind,
    name: String,
    keep_originals: bool,
    current: AttributeValue,
    /// values[原始顶点][复制序号]
    values: Vec<Vec<AttributeValue>>,
}

impl MeshBuilderVertexAttributeLayer {
    pub fn new(num_org_vertices: usize, kind: AttributeKind, keep_originals: bool) -> Self {
        Self {
            kind,
            name: String::new(),
            keep_originals,
            current: AttributeValue::zero_for(kind),
            values: vec![Vec::new(); num_org_vertices],
        }
    }

    pub fn kind(&self) -> AttributeKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn keep_originals(&self) -> bool {
        self.keep_originals
    }

    pub fn num_org_vertices(&self) -> usize {
        self.values.len()
    }

    /// 设置下一个多边形顶点的属性值
    pub fn set_current_vertex_value(&mut self, value: impl Into<AttributeValue>) -> Result<()> {
        let value = value.into();
        if !value.matches_kind(self.kind) {
            return Err(SkinError::Builder(format!(
                "属性层 {:?} 不接受 {:?}",
                self.kind, value
            )));
        }
        self.current = value;
        Ok(())
    }

    pub fn current_vertex_value(&self) -> &AttributeValue {
        &self.current
    }

    /// 某原始顶点已有的复制数
    pub fn num_duplicates(&self, org_vertex: usize) -> usize {
        self.values[org_vertex].len()
    }

    pub fn value(&self, org_vertex: usize, duplicate_nr: usize) -> &AttributeValue {
        &self.values[org_vertex][duplicate_nr]
    }

    /// 当前值与某个已有复制是否相同
    pub fn current_matches(&self, org_vertex: usize, duplicate_nr: usize, tolerance: f32) -> bool {
        self.values[org_vertex][duplicate_nr].approx_eq(&self.current, tolerance)
    }

    /// 以当前值新建一个复制
    pub(crate) fn push_current(&mut self, org_vertex: usize) {
        self.values[org_vertex].push(self.current);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_checked_values() {
        let mut layer = MeshBuilderVertexAttributeLayer::new(2, AttributeKind::Normals, true);
        assert!(layer.set_current_vertex_value(Vec3::Y).is_ok());
        assert!(matches!(
            layer.set_current_vertex_value(Vec2::ONE),
            Err(SkinError::Builder(_))
        ));
        assert_eq!(*layer.current_vertex_value(), AttributeValue::Vec3(Vec3::Y));
    }

    #[test]
    fn test_duplicates_compare_within_tolerance() {
        let mut layer = MeshBuilderVertexAttributeLayer::new(1, AttributeKind::UvCoords, false);
        layer.set_current_vertex_value(Vec2::new(0.5, 0.5)).unwrap();
        layer.push_current(0);

        layer.set_current_vertex_value(Vec2::new(0.5, 0.500001)).unwrap();
        assert!(layer.current_matches(0, 0, 1e-5));
        layer.set_current_vertex_value(Vec2::new(0.5, 0.6)).unwrap();
        assert!(!layer.current_matches(0, 0, 1e-5));
        assert_eq!(layer.num_duplicates(0), 1);
    }
}
