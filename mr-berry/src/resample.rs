//! 三线性重采样.
//!
//! 将任意形状的 3D 标量场重采样到目标形状, 轴序不变.
//! 端点对齐: 目标首末采样点分别落在源首末索引上.

use ndarray::{Array3, ArrayView3};

use crate::Idx3d;

/// 将 3D 标量场重采样到 `target` 形状 (与输入同轴序).
///
/// 每个目标体素映射回源索引空间后做 8 角点三线性插值.
///
/// 源或目标形状存在零维时 panic.
pub fn trilinear(src: ArrayView3<'_, f32>, target: Idx3d) -> Array3<f32> {
    let (sz, sy, sx) = src.dim();
    let (tz, ty, tx) = target;
    assert_ne!(sz * sy * sx, 0, "源标量场为空");
    assert_ne!(tz * ty * tx, 0, "目标形状为空");

    // 目标索引 -> 源索引的线性因子. 单点轴直接钉在 0 处.
    let factor = |s: usize, t: usize| {
        if t <= 1 {
            0.0f32
        } else {
            (s - 1) as f32 / (t - 1) as f32
        }
    };
    let (fz, fy, fx) = (factor(sz, tz), factor(sy, ty), factor(sx, tx));

    Array3::from_shape_fn((tz, ty, tx), |(k, j, i)| {
        sample(&src, k as f32 * fz, j as f32 * fy, i as f32 * fx)
    })
}

/// 在连续源索引坐标 (z, y, x) 处做三线性插值采样.
///
/// 输入坐标必须已落在源索引范围内 (重采样因子保证这一点).
fn sample(src: &ArrayView3<'_, f32>, z: f32, y: f32, x: f32) -> f32 {
    let (sz, sy, sx) = src.dim();

    let z0 = (z.floor() as usize).min(sz - 1);
    let y0 = (y.floor() as usize).min(sy - 1);
    let x0 = (x.floor() as usize).min(sx - 1);
    let z1 = (z0 + 1).min(sz - 1);
    let y1 = (y0 + 1).min(sy - 1);
    let x1 = (x0 + 1).min(sx - 1);

    let dz = z - z0 as f32;
    let dy = y - y0 as f32;
    let dx = x - x0 as f32;

    // 8 角点.
    let v000 = src[(z0, y0, x0)];
    let v001 = src[(z0, y0, x1)];
    let v010 = src[(z0, y1, x0)];
    let v011 = src[(z0, y1, x1)];
    let v100 = src[(z1, y0, x0)];
    let v101 = src[(z1, y0, x1)];
    let v110 = src[(z1, y1, x0)];
    let v111 = src[(z1, y1, x1)];

    // 先沿 x, 再沿 y, 最后沿 z.
    let v00 = v000 * (1.0 - dx) + v001 * dx;
    let v01 = v010 * (1.0 - dx) + v011 * dx;
    let v10 = v100 * (1.0 - dx) + v101 * dx;
    let v11 = v110 * (1.0 - dx) + v111 * dx;

    let v0 = v00 * (1.0 - dy) + v01 * dy;
    let v1 = v10 * (1.0 - dy) + v11 * dy;

    v0 * (1.0 - dz) + v1 * dz
}

#[cfg(test)]
mod tests {
    use super::trilinear;
    use ndarray::Array3;

    fn float_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn test_identity_shape_preserves_values() {
        let src = Array3::from_shape_fn((3, 4, 5), |(z, y, x)| (x + 10 * y + 100 * z) as f32);
        let out = trilinear(src.view(), (3, 4, 5));
        assert_eq!(out.dim(), (3, 4, 5));
        for (pos, v) in out.indexed_iter() {
            assert!(float_eq(*v, src[pos]));
        }
    }

    #[test]
    fn test_constant_field_stays_constant() {
        let src = Array3::from_elem((2, 2, 2), 7.5f32);
        let out = trilinear(src.view(), (5, 9, 3));
        assert_eq!(out.dim(), (5, 9, 3));
        assert!(out.iter().all(|v| float_eq(*v, 7.5)));
    }

    #[test]
    fn test_linear_ramp_upsample() {
        // 线性场在三线性插值下保持线性: 端点对齐时中点取中值.
        let src = Array3::from_shape_fn((2, 2, 2), |(z, _, _)| z as f32 * 10.0);
        let out = trilinear(src.view(), (3, 2, 2));
        assert!(float_eq(out[(0, 0, 0)], 0.0));
        assert!(float_eq(out[(1, 0, 0)], 5.0));
        assert!(float_eq(out[(2, 0, 0)], 10.0));
    }

    #[test]
    fn test_downsample_endpoints_align() {
        let src = Array3::from_shape_fn((5, 5, 5), |(z, y, x)| (x + y + z) as f32);
        let out = trilinear(src.view(), (2, 2, 2));
        assert!(float_eq(out[(0, 0, 0)], 0.0));
        assert!(float_eq(out[(1, 1, 1)], 12.0));
    }

    #[test]
    fn test_single_voxel_axis() {
        let src = Array3::from_shape_fn((1, 2, 2), |(_, y, x)| (x + y) as f32);
        let out = trilinear(src.view(), (4, 2, 2));
        assert_eq!(out.dim(), (4, 2, 2));
        // z 轴只有单点, 所有层相同.
        for z in 0..4 {
            assert!(float_eq(out[(z, 1, 1)], 2.0));
        }
    }
}
