//! 灰度规范化窗口.

use crate::consts::{RESCALE_MAX, RESCALE_MIN};
use crate::data::MriScan;

/// 灰度规范化窗口, 将观测区间 \[lo, hi\] 线性映射到
/// \[[`RESCALE_MIN`], [`RESCALE_MAX`]\].
///
/// 该窗口是只读的. 若要修改窗口参数, 你应该创建新的实例.
#[derive(Copy, Clone, Debug)]
pub struct RescaleWindow {
    lo: f32,
    hi: f32,
}

impl RescaleWindow {
    /// 构建规范化窗口.
    ///
    /// `lo` 和 `hi` 必须有限且满足 `lo <= hi`, 否则返回 `None`.
    pub fn new(lo: f32, hi: f32) -> Option<RescaleWindow> {
        if lo.is_finite() && hi.is_finite() && lo <= hi {
            Some(Self { lo, hi })
        } else {
            None
        }
    }

    /// 以扫描的观测有限 min/max 构建规范化窗口.
    ///
    /// 扫描中不存在有限体素时返回 `None`.
    #[inline]
    pub fn from_scan(scan: &MriScan) -> Option<RescaleWindow> {
        let (lo, hi) = scan.finite_min_max()?;
        Self::new(lo, hi)
    }

    /// 窗下限.
    #[inline]
    pub fn lower_bound(&self) -> f32 {
        self.lo
    }

    /// 窗上限.
    #[inline]
    pub fn upper_bound(&self) -> f32 {
        self.hi
    }

    /// 求在当前窗口设置下, 体素值 `v` 对应的规范化灰度值
    /// (`RESCALE_MIN <= value <= RESCALE_MAX`).
    ///
    /// 如果 `v` 无意义 (如 inf, NaN), 则映射到 `RESCALE_MIN`.
    /// 窗口退化 (lo == hi, 即常数体积) 时全部映射到 `RESCALE_MIN`.
    pub fn eval(&self, v: f32) -> f32 {
        if !v.is_finite() {
            return RESCALE_MIN;
        }
        if self.hi <= self.lo {
            return RESCALE_MIN;
        }
        if v <= self.lo {
            RESCALE_MIN
        } else if v >= self.hi {
            RESCALE_MAX
        } else {
            RESCALE_MIN + (v - self.lo) / (self.hi - self.lo) * (RESCALE_MAX - RESCALE_MIN)
        }
    }
}
