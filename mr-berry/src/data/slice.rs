//! 二维平面视图与持久化存储.

use std::ops::Index;
use std::path::Path;

use image::ImageResult;
use ndarray::iter::Iter;
use ndarray::{Array2, ArrayView2, Axis, Ix2};

use crate::Idx2d;

/// 平面提取的固定轴. 与容器 (x, y, z) 轴序一一对应.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PlaneAxis {
    /// 固定 x (容器第一轴), 平面为 (z, y) 视图.
    X,
    /// 固定 y (容器第二轴), 平面为 (z, x) 视图.
    Y,
    /// 固定 z (容器第三轴), 平面为 (y, x) 视图.
    Z,
}

/// 不可变、借用的二维 MRI 扫描平面.
pub struct ScanSlice<'a> {
    /// 底层数据的轻量级视图, 借用于 [`crate::MriScan`].
    ///
    /// 这里有意把代码写死为 `ArrayView` 降低灵活性, 但使结构的意图更加明确.
    data: ArrayView2<'a, f32>,
}

impl Index<Idx2d> for ScanSlice<'_> {
    type Output = f32;

    #[inline]
    fn index(&self, index: Idx2d) -> &Self::Output {
        &self.data[index]
    }
}

impl<'a> ScanSlice<'a> {
    /// 直接初始化.
    #[inline]
    pub(crate) fn new(data: ArrayView2<'a, f32>) -> Self {
        Self { data }
    }

    /// 获得 **底层** 数据的一份不可变 shallow copy.
    #[inline]
    pub fn array_view(&self) -> ArrayView2<f32> {
        self.data.view()
    }

    /// 获取可以迭代平面像素的迭代器.
    #[inline]
    pub fn iter(&self) -> Iter<'_, f32, Ix2> {
        self.data.iter()
    }

    /// 获取给定位置的像素值. 越界时返回 `None`.
    #[inline]
    pub fn get(&self, pos: Idx2d) -> Option<&f32> {
        self.data.get(pos)
    }

    /// 平面形状.
    #[inline]
    pub fn shape(&self) -> Idx2d {
        self.data.dim()
    }

    /// 平面像素个数.
    #[inline]
    pub fn size(&self) -> usize {
        let (h, w) = self.shape();
        h * w
    }

    /// 生成用于前端展示的旋转平面.
    ///
    /// 结果等价于先按容器轴序提取平面、再逆时针旋转 90° (`rot90` 语义);
    /// 在内部 (z, y, x) 存储轴序下, 该复合操作恰为翻转视图第一轴.
    pub fn to_display(&self) -> Array2<f32> {
        let mut out = self.data.to_owned();
        out.invert_axis(Axis(0));
        out
    }

    /// 将展示方向的平面导出为嵌套数组, 便于 JSON 序列化.
    pub fn display_rows(&self) -> Vec<Vec<f32>> {
        let rotated = self.to_display();
        rotated.outer_iter().map(|row| row.to_vec()).collect()
    }
}

/// 表明一个可以通过 **可视化友好** 模式持久化存储的图像对象.
///
/// `ImgWriteVis` trait 的意图是, 图像将以 "可视化友好" 的方式保存.
/// 对于规范化后的扫描平面 (值域 \[0, 255\]), 像素直接钳位取整为 8-bit 灰度;
/// 未规范化的平面应先经 [`crate::window::RescaleWindow`] 处理, 否则大部分
/// 体素会被钳位到黑色或白色.
pub trait ImgWriteVis {
    /// 按照一定的可视化规则将图片保存到 `path` 路径.
    fn save<P: AsRef<Path>>(&self, path: P) -> ImageResult<()>;
}

impl ImgWriteVis for ScanSlice<'_> {
    fn save<P: AsRef<Path>>(&self, path: P) -> ImageResult<()> {
        let (height, width) = self.shape();
        let mut buf = image::GrayImage::new(width as u32, height as u32);
        for ((h, w), &v) in self.data.indexed_iter() {
            let gray = if v.is_finite() {
                v.clamp(0.0, 255.0) as u8
            } else {
                u8::MIN
            };
            buf.put_pixel(w as u32, h as u32, image::Luma([gray]));
        }
        buf.save(path)
    }
}
