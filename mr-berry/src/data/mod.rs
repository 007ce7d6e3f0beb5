use std::ops::{Index, IndexMut};
use std::path::Path;

use itertools::{Itertools, MinMaxResult};
use ndarray::{Array3, ArrayView, ArrayViewMut, Axis, Ix3};
use nifti::writer::WriterOptions;
use nifti::{IntoNdArray, NiftiHeader, NiftiObject, ReaderOptions};

use crate::window::RescaleWindow;
use crate::Idx3d;

mod slice;

pub use slice::{ImgWriteVis, PlaneAxis, ScanSlice};

/// `NiftiHeader` 是栈上大对象, 移动该对象的开销很可观.
/// 因此我们将其分配到堆上.
type BoxedHeader = Box<NiftiHeader>;

/// 将 (x, y, z) 转换成 (z, y, x). 以后均按照该模式访问.
#[inline]
fn get_shape_from_header(h: &NiftiHeader) -> Idx3d {
    // [x, y, z]. 体素个数数组.
    let [_, x, y, z, ..] = h.dim;
    (z as usize, y as usize, x as usize)
}

/// 3D MRI nii 文件 header 的共用属性和部分通用操作.
pub trait NiftiHeaderAttr {
    /// 获取 header 部分.
    fn header(&self) -> &NiftiHeader;

    /// 获取数据形状大小, 按内部 (z, y, x) 存储轴序.
    #[inline]
    fn shape(&self) -> Idx3d {
        get_shape_from_header(self.header())
    }

    /// 获取数据形状大小, 按容器 (x, y, z) 轴序.
    #[inline]
    fn shape_xyz(&self) -> Idx3d {
        let (z, y, x) = self.shape();
        (x, y, z)
    }

    /// 获取水平切片个数.
    #[inline]
    fn len_z(&self) -> usize {
        self.shape().0
    }

    /// 获取数据体素个数.
    #[inline]
    fn size(&self) -> usize {
        let (z, y, x) = self.shape();
        z * y * x
    }

    /// 检查 (z, y, x) 索引是否合法.
    #[inline]
    fn check(&self, (z0, y0, x0): &Idx3d) -> bool {
        let (z, y, x) = self.shape();
        *z0 < z && *y0 < y && *x0 < x
    }

    /// 获取单个体素分辨率. 该分辨率以毫米为单位, 按 (z, y, x) 轴序给出.
    #[inline]
    fn pix_dim(&self) -> [f64; 3] {
        let [_, x, y, z, ..] = self.header().pixdim;
        [z as f64, y as f64, x as f64]
    }

    /// 体素分辨率在三个维度上是否是各向同的?
    #[inline]
    fn is_isotropic(&self) -> bool {
        let [z, y, x] = self.pix_dim();
        z == y && z == x
    }

    /// 获取体素的实际体积值, 以立方毫米为单位.
    #[inline]
    fn voxel(&self) -> f64 {
        self.pix_dim().iter().product()
    }
}

/// nii 格式 3D MRI 扫描, 包括 header 和体素数据. 体素值以 `f32` 保存.
#[derive(Debug, Clone)]
pub struct MriScan {
    header: BoxedHeader,
    data: Array3<f32>,
}

impl NiftiHeaderAttr for MriScan {
    #[inline]
    fn header(&self) -> &NiftiHeader {
        &self.header
    }
}

impl Index<Idx3d> for MriScan {
    type Output = f32;

    #[inline]
    fn index(&self, index: Idx3d) -> &Self::Output {
        &self.data[index]
    }
}

impl IndexMut<Idx3d> for MriScan {
    #[inline]
    fn index_mut(&mut self, index: Idx3d) -> &mut Self::Output {
        &mut self.data[index]
    }
}

impl MriScan {
    /// 打开 nii 文件格式的 3D MRI 扫描. `path` 为 nii 文件的本地路径.
    /// 如果打开成功, 则返回 `Ok(Self)`, 否则返回 `Err`.
    pub fn open<P: AsRef<Path>>(path: P) -> nifti::Result<Self> {
        let obj = ReaderOptions::new().read_file(path.as_ref())?;
        let header = Box::new(obj.header().clone());

        // [x, y, z] -> [z, y, x].
        let data = obj
            .into_volume()
            .into_ndarray::<f32>()?
            .permuted_axes([2, 1, 0].as_slice());

        // The nature of nifti data field layout.
        debug_assert!(data.is_standard_layout());

        // 该操作不会生成 `Err`, 可直接 unwrap.
        let data =
            Array3::<f32>::from_shape_vec(get_shape_from_header(&header), data.into_raw_vec())
                .unwrap();

        Ok(Self { header, data })
    }

    /// 根据裸体素数据和体素分辨率直接创建 `MriScan` 实体.
    ///
    /// # 参数
    ///
    /// 1. `data` 按照 nifti 惯用标准以 \[x, y, z\] 轴序存储, 且非空.
    /// 2. `pix_dim` 按照 \[x, y, z\] 轴序存储.
    ///
    /// # 注意
    ///
    /// 生成的 header 仅携带形状与分辨率信息, 不含方向与仿射参数,
    /// 因此你应仅将其用于派生数据或实验目的.
    pub fn from_array(data: Array3<f32>, pix_dim: [f32; 3]) -> Self {
        assert_ne!(data.len(), 0, "体素数据为空");
        let (nx, ny, nz) = data.dim();

        let data = data.permuted_axes([2, 1, 0]);
        let data = if data.is_standard_layout() {
            data
        } else {
            data.as_standard_layout().to_owned()
        };
        debug_assert!(data.is_standard_layout());

        let mut header = Box::<NiftiHeader>::default();
        header.dim = [3, nx as u16, ny as u16, nz as u16, 1, 1, 1, 1];
        let [_, pw, ph, pz, ..] = &mut header.pixdim;
        let [x, y, z] = &pix_dim;
        (*pw, *ph, *pz) = (*x, *y, *z);

        Self { header, data }
    }

    /// 将扫描以 nii 格式保存到 `path`. 扩展名为 `.gz` 结尾时写出 gzip 压缩容器.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> nifti::Result<()> {
        // (z, y, x) -> (x, y, z). 写出时恢复 nifti 惯用轴序.
        let vol = self.data.view().permuted_axes([2, 1, 0]);
        WriterOptions::new(path.as_ref())
            .reference_header(&self.header)
            .write_nifti(&vol)
    }

    /// 计算扫描中所有有限体素值的最小值和最大值.
    ///
    /// 不存在有限体素时返回 `None`.
    pub fn finite_min_max(&self) -> Option<(f32, f32)> {
        match self
            .data
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .minmax()
        {
            MinMaxResult::NoElements => None,
            MinMaxResult::OneElement(v) => Some((v, v)),
            MinMaxResult::MinMax(lo, hi) => Some((lo, hi)),
        }
    }

    /// 计算扫描中所有有限体素值的平均值. 不存在有限体素时返回 `None`.
    pub fn mean_intensity(&self) -> Option<f64> {
        let mut count = 0u64;
        let mut sum = 0.0f64;
        for v in self.data.iter().filter(|v| v.is_finite()) {
            count += 1;
            sum += *v as f64;
        }
        (count != 0).then(|| sum / (count as f64))
    }

    /// 以 `window` 对每个体素做灰度规范化, 生成新的扫描.
    /// header 与原扫描一致.
    pub fn rescaled(&self, window: &RescaleWindow) -> MriScan {
        let mut data = self.data.clone();
        data.mapv_inplace(|v| window.eval(v));
        Self {
            header: self.header.clone(),
            data,
        }
    }

    /// 获取 (z, y, x) 存储轴序下 `axis` 方向的第 `index` 层平面视图.
    ///
    /// `index` 越界时返回 `None`.
    pub fn plane(&self, axis: PlaneAxis, index: usize) -> Option<ScanSlice<'_>> {
        let (z, y, x) = self.shape();
        let view = match axis {
            PlaneAxis::X if index < x => self.data.index_axis(Axis(2), index),
            PlaneAxis::Y if index < y => self.data.index_axis(Axis(1), index),
            PlaneAxis::Z if index < z => self.data.index_axis(Axis(0), index),
            _ => return None,
        };
        Some(ScanSlice::new(view))
    }

    /// 获取 3D 扫描 z 空间的第 `z_index` 层切片视图.
    ///
    /// 当 `z_index` 越界时 panic.
    #[inline]
    pub fn slice_at(&self, z_index: usize) -> ScanSlice<'_> {
        ScanSlice::new(self.data.index_axis(Axis(0), z_index))
    }

    /// 获取能按升序迭代 3D 扫描水平切片的迭代器.
    #[inline]
    pub fn slice_iter(&self) -> impl ExactSizeIterator<Item = ScanSlice> {
        self.data.axis_iter(Axis(0)).map(ScanSlice::new)
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView<'_, f32, Ix3> {
        self.data.view()
    }

    /// 获得数据的一份可变 shallow copy.
    #[inline]
    pub fn data_mut(&mut self) -> ArrayViewMut<'_, f32, Ix3> {
        self.data.view_mut()
    }
}

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use rayon::iter::{IntoParallelIterator, ParallelIterator};
    }
}

/// 并发操作部分.
#[cfg(feature = "rayon")]
impl MriScan {
    /// 借助 `rayon`, 并行地以 `window` 对每个体素做灰度规范化, 生成新的扫描.
    /// header 与原扫描一致.
    pub fn par_rescaled(&self, window: &RescaleWindow) -> MriScan {
        let window = *window;
        let mut data = self.data.clone();
        data.par_mapv_inplace(move |v| window.eval(v));
        Self {
            header: self.header.clone(),
            data,
        }
    }

    /// 借助 `rayon`, 并行地对 3D 扫描每个水平不可变切片实施 `op` 操作.
    pub fn par_for_each_slice<F>(&self, op: F)
    where
        F: Fn(ScanSlice) + Sync + Send,
    {
        self.data()
            .axis_iter(Axis(0))
            .into_par_iter()
            .for_each(|v| {
                op(ScanSlice::new(v));
            });
    }
}
