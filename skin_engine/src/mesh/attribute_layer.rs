//! 逐顶点属性层
//!
//! 每层保存一种属性（位置、法线、切线、UV……）。可变形的层同时保存一份原始数据，
//! 变形器只改写当前数据，每次更新前用原始数据覆盖当前数据。

use glam::{Vec2, Vec3, Vec4};

use super::AttributeKind;

/// 属性层的数据存储
#[derive(Clone, Debug, PartialEq)]
pub enum AttributeData {
    Vec2(Vec<Vec2>),
    Vec3(Vec<Vec3>),
    Vec4(Vec<Vec4>),
    U32(Vec<u32>),
}

impl AttributeData {
    /// 按属性类型分配零值数据
    pub fn zeroed(kind: AttributeKind, count: usize) -> Self {
        match kind {
            AttributeKind::UvCoords => Self::Vec2(vec![Vec2::ZERO; count]),
            AttributeKind::Positions | AttributeKind::Normals | AttributeKind::Bitangents => {
                Self::Vec3(vec![Vec3::ZERO; count])
            }
            AttributeKind::Tangents | AttributeKind::Colors128 => {
                Self::Vec4(vec![Vec4::ZERO; count])
            }
            AttributeKind::Colors32 | AttributeKind::OrgVtxNumbers => Self::U32(vec![0; count]),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Vec2(v) => v.len(),
            Self::Vec3(v) => v.len(),
            Self::Vec4(v) => v.len(),
            Self::U32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 单个元素的字节数
    pub fn attribute_size(&self) -> usize {
        match self {
            Self::Vec2(_) => std::mem::size_of::<Vec2>(),
            Self::Vec3(_) => std::mem::size_of::<Vec3>(),
            Self::Vec4(_) => std::mem::size_of::<Vec4>(),
            Self::U32(_) => std::mem::size_of::<u32>(),
        }
    }

    fn swap(&mut self, a: usize, b: usize) {
        match self {
            Self::Vec2(v) => v.swap(a, b),
            Self::Vec3(v) => v.swap(a, b),
            Self::Vec4(v) => v.swap(a, b),
            Self::U32(v) => v.swap(a, b),
        }
    }

    /// 删除闭区间 [start, end]，保持剩余元素顺序
    fn remove_range(&mut self, start: usize, end: usize) {
        match self {
            Self::Vec2(v) => drop(v.drain(start..=end)),
            Self::Vec3(v) => drop(v.drain(start..=end)),
            Self::Vec4(v) => drop(v.drain(start..=end)),
            Self::U32(v) => drop(v.drain(start..=end)),
        }
    }

    /// 原始字节视图（上传顶点缓冲区用）
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Vec2(v) => bytemuck::cast_slice(v),
            Self::Vec3(v) => bytemuck::cast_slice(v),
            Self::Vec4(v) => bytemuck::cast_slice(v),
            Self::U32(v) => bytemuck::cast_slice(v),
        }
    }
}

/// 可存入属性层的元素类型
pub trait AttributeElement: bytemuck::Pod + Default + PartialEq + Send + Sync {
    fn slice(data: &AttributeData) -> Option<&[Self]>;
    fn slice_mut(data: &mut AttributeData) -> Option<&mut [Self]>;
    fn wrap(values: Vec<Self>) -> AttributeData;
}

macro_rules! impl_attribute_element {
    ($ty:ty, $variant:ident) => {
        impl AttributeElement for $ty {
            fn slice(data: &AttributeData) -> Option<&[Self]> {
                match data {
                    AttributeData::$variant(v) => Some(v),
                    _ => None,
                }
            }

            fn slice_mut(data: &mut AttributeData) -> Option<&mut [Self]> {
                match data {
                    AttributeData::$variant(v) => Some(v),
                    _ => None,
                }
            }

            fn wrap(values: Vec<Self>) -> AttributeData {
                AttributeData::$variant(values)
            }
        }
    };
}

impl_attribute_element!(Vec2, Vec2);
impl_attribute_element!(Vec3, Vec3);
impl_attribute_element!(Vec4, Vec4);
impl_attribute_element!(u32, U32);

/// 逐顶点（非共享）属性层
#[derive(Clone, Debug, PartialEq)]
pub struct VertexAttributeLayer {
    kind: AttributeKind,
    name: String,
    data: AttributeData,
    original: Option<AttributeData>,
}

impl VertexAttributeLayer {
    /// 分配 `num_attributes` 个零值属性，`keep_originals` 时同时分配原始数据
    pub fn new(num_attributes: usize, kind: AttributeKind, keep_originals: bool) -> Self {
        let data = AttributeData::zeroed(kind, num_attributes);
        let original = keep_originals.then(|| data.clone());
        Self {
            kind,
            name: String::new(),
            data,
            original,
        }
    }

    /// 用给定值创建，原始数据与当前数据相同
    pub fn from_values<T: AttributeElement>(
        kind: AttributeKind,
        values: Vec<T>,
        keep_originals: bool,
    ) -> Self {
        Self::from_data(kind, T::wrap(values), keep_originals)
    }

    pub(crate) fn from_data(
        kind: AttributeKind,
        data: AttributeData,
        keep_originals: bool,
    ) -> Self {
        let original = keep_originals.then(|| data.clone());
        Self {
            kind,
            name: String::new(),
            data,
            original,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
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

    pub fn keeps_originals(&self) -> bool {
        self.original.is_some()
    }

    pub fn num_attributes(&self) -> usize {
        self.data.len()
    }

    pub fn raw(&self) -> &AttributeData {
        &self.data
    }

    pub fn raw_original(&self) -> &AttributeData {
        self.original.as_ref().unwrap_or(&self.data)
    }

    /// 当前数据，类型不匹配时返回 None
    pub fn data<T: AttributeElement>(&self) -> Option<&[T]> {
        T::slice(&self.data)
    }

    pub fn data_mut<T: AttributeElement>(&mut self) -> Option<&mut [T]> {
        T::slice_mut(&mut self.data)
    }

    /// 原始数据；未保留原始数据时返回当前数据
    pub fn original_data<T: AttributeElement>(&self) -> Option<&[T]> {
        T::slice(self.raw_original())
    }

    pub fn original_data_mut<T: AttributeElement>(&mut self) -> Option<&mut [T]> {
        match self.original.as_mut() {
            Some(original) => T::slice_mut(original),
            None => T::slice_mut(&mut self.data),
        }
    }

    /// 同时写入当前数据与原始数据
    pub fn set_all<T: AttributeElement>(&mut self, index: usize, value: T) {
        if let Some(data) = self.data_mut::<T>() {
            data[index] = value;
        }
        if let Some(original) = self.original.as_mut().and_then(T::slice_mut) {
            original[index] = value;
        }
    }

    /// 整体写入当前数据与原始数据，长度必须一致
    pub fn copy_from_slice_all<T: AttributeElement>(&mut self, values: &[T]) {
        if let Some(data) = self.data_mut::<T>() {
            data.copy_from_slice(values);
        }
        if let Some(original) = self.original.as_mut().and_then(T::slice_mut) {
            original.copy_from_slice(values);
        }
    }

    /// 用原始数据覆盖当前数据；未保留原始数据时无操作
    pub fn reset_to_original_data(&mut self) {
        if let Some(original) = &self.original {
            self.data.clone_from(original);
        }
    }

    /// 交换两个属性（当前与原始数据）
    pub fn swap_attributes(&mut self, a: usize, b: usize) {
        debug_assert!(a < self.num_attributes() && b < self.num_attributes());
        self.data.swap(a, b);
        if let Some(original) = self.original.as_mut() {
            original.swap(a, b);
        }
    }

    /// 删除闭区间 [start, end] 的属性
    pub fn remove_attributes(&mut self, start: usize, end: usize) {
        debug_assert!(start <= end && end < self.num_attributes());
        self.data.remove_range(start, end);
        if let Some(original) = self.original.as_mut() {
            original.remove_range(start, end);
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.data.as_bytes()
    }

    pub fn original_as_bytes(&self) -> &[u8] {
        self.raw_original().as_bytes()
    }
}
