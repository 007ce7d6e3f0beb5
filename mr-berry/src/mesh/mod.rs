//! 等值面网格提取.
//!
//! 从 3D 标量场提取给定等值面的三角网格.
//!
//! 实现说明: 采用标量 Surface Nets 变体而不是 tri-table 式 marching cubes.
//! tri-table 方案在歧义构型下容易产生裂缝/不连续; Surface Nets 为每个活跃
//! 单元格计算唯一顶点 (所有跨越边等值交点的均值), 再沿符号变化的晶格边在相邻
//! 四个单元格之间缝合四边形, 结果确定且采样一致.

pub mod obj;

use ndarray::ArrayView3;

/// 三角网格. 顶点按 (x, y, z) 体素索引坐标存储, 面为顶点下标三元组 (0-indexed).
#[derive(Debug, Clone, Default)]
pub struct SurfaceMesh {
    /// 顶点坐标.
    pub vertices: Vec<[f32; 3]>,

    /// 三角面, 每项为三个顶点下标.
    pub faces: Vec<[u32; 3]>,
}

impl SurfaceMesh {
    /// 网格是否为空 (无面)?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// 顶点个数.
    #[inline]
    pub fn vertex_len(&self) -> usize {
        self.vertices.len()
    }

    /// 三角面个数.
    #[inline]
    pub fn face_len(&self) -> usize {
        self.faces.len()
    }
}

/// 立方体 8 角点相对单元格原点的 (dx, dy, dz) 偏移.
const C_OFF: [(usize, usize, usize); 8] = [
    (0, 0, 0),
    (1, 0, 0),
    (1, 1, 0),
    (0, 1, 0),
    (0, 0, 1),
    (1, 0, 1),
    (1, 1, 1),
    (0, 1, 1),
];

/// 立方体 12 条边, 以角点下标对表示.
const E: [(usize, usize); 12] = [
    (0, 1),
    (1, 2),
    (2, 3),
    (3, 0),
    (4, 5),
    (5, 6),
    (6, 7),
    (7, 4),
    (0, 4),
    (1, 5),
    (2, 6),
    (3, 7),
];

/// 未分配顶点的单元格标记.
const NO_VERT: u32 = u32::MAX;

/// 从 3D 标量场提取 `level` 等值面.
///
/// 场以内部 (z, y, x) 存储轴序访问, 输出顶点按容器 (x, y, z) 坐标给出,
/// 单位为体素索引. 体素值严格大于 `level` 视为表面内部. 触及场边界的表面
/// 保持开放 (不做边界外采样).
pub fn extract_iso(field: ArrayView3<'_, f32>, level: f32) -> SurfaceMesh {
    let (nz, ny, nx) = field.dim();
    if nx < 2 || ny < 2 || nz < 2 {
        return SurfaceMesh::default();
    }

    let value = |x: usize, y: usize, z: usize| field[(z, y, x)];
    let inside = |x: usize, y: usize, z: usize| value(x, y, z) > level;

    // 单元格晶格为 (nx-1) x (ny-1) x (nz-1); 每个活跃单元格生成一个顶点.
    let (cx, cy, cz) = (nx - 1, ny - 1, nz - 1);
    let cell_idx = |x: usize, y: usize, z: usize| (z * cy + y) * cx + x;

    let mut cell_vert = vec![NO_VERT; cx * cy * cz];
    let mut vertices: Vec<[f32; 3]> = Vec::new();

    for z in 0..cz {
        for y in 0..cy {
            for x in 0..cx {
                let mut corner = [0.0f32; 8];
                let mut mask = 0u8;
                for (i, (dx, dy, dz)) in C_OFF.iter().enumerate() {
                    let v = value(x + dx, y + dy, z + dz);
                    corner[i] = v;
                    if v > level {
                        mask |= 1 << i;
                    }
                }
                if mask == 0 || mask == 0xff {
                    continue;
                }

                // 顶点 = 所有跨越边的等值交点均值.
                let mut acc = [0.0f32; 3];
                let mut n = 0u32;
                for (a, b) in E {
                    let ia = mask >> a & 1;
                    let ib = mask >> b & 1;
                    if ia == ib {
                        continue;
                    }
                    let (va, vb) = (corner[a], corner[b]);
                    let t = if (vb - va).abs() < 1e-6 {
                        0.5
                    } else {
                        ((level - va) / (vb - va)).clamp(0.0, 1.0)
                    };
                    let pa = C_OFF[a];
                    let pb = C_OFF[b];
                    acc[0] += (x + pa.0) as f32 + t * (pb.0 as f32 - pa.0 as f32);
                    acc[1] += (y + pa.1) as f32 + t * (pb.1 as f32 - pa.1 as f32);
                    acc[2] += (z + pa.2) as f32 + t * (pb.2 as f32 - pa.2 as f32);
                    n += 1;
                }
                // 混合角点必然至少存在一条跨越边.
                debug_assert_ne!(n, 0);

                let inv = 1.0 / n as f32;
                let idx = vertices.len() as u32;
                vertices.push([acc[0] * inv, acc[1] * inv, acc[2] * inv]);
                cell_vert[cell_idx(x, y, z)] = idx;
            }
        }
    }

    let mut faces: Vec<[u32; 3]> = Vec::new();
    let mut emit_quad = |i0: u32, i1: u32, i2: u32, i3: u32| {
        faces.push([i0, i1, i2]);
        faces.push([i0, i2, i3]);
    };

    // 沿符号变化的晶格边缝合四边形. 仅处理内部边 (四个相邻单元格均存在);
    // 相邻单元格包含该边两端角点, 因此必然混合、必然已分配顶点.

    // X 方向边 (x,y,z)->(x+1,y,z): 相邻单元格 (x,y-1,z-1),(x,y,z-1),(x,y,z),(x,y-1,z).
    for z in 1..cz {
        for y in 1..cy {
            for x in 0..cx {
                let a = inside(x, y, z);
                if a == inside(x + 1, y, z) {
                    continue;
                }
                let i00 = cell_vert[cell_idx(x, y - 1, z - 1)];
                let i10 = cell_vert[cell_idx(x, y, z - 1)];
                let i11 = cell_vert[cell_idx(x, y, z)];
                let i01 = cell_vert[cell_idx(x, y - 1, z)];
                debug_assert!([i00, i10, i11, i01].iter().all(|i| *i != NO_VERT));

                if a {
                    emit_quad(i00, i01, i11, i10);
                } else {
                    emit_quad(i00, i10, i11, i01);
                }
            }
        }
    }

    // Y 方向边 (x,y,z)->(x,y+1,z): 相邻单元格 (x-1,y,z-1),(x,y,z-1),(x,y,z),(x-1,y,z).
    for z in 1..cz {
        for y in 0..cy {
            for x in 1..cx {
                let a = inside(x, y, z);
                if a == inside(x, y + 1, z) {
                    continue;
                }
                let i00 = cell_vert[cell_idx(x - 1, y, z - 1)];
                let i10 = cell_vert[cell_idx(x, y, z - 1)];
                let i11 = cell_vert[cell_idx(x, y, z)];
                let i01 = cell_vert[cell_idx(x - 1, y, z)];
                debug_assert!([i00, i10, i11, i01].iter().all(|i| *i != NO_VERT));

                if a {
                    emit_quad(i00, i10, i11, i01);
                } else {
                    emit_quad(i00, i01, i11, i10);
                }
            }
        }
    }

    // Z 方向边 (x,y,z)->(x,y,z+1): 相邻单元格 (x-1,y-1,z),(x,y-1,z),(x,y,z),(x-1,y,z).
    for z in 0..cz {
        for y in 1..cy {
            for x in 1..cx {
                let a = inside(x, y, z);
                if a == inside(x, y, z + 1) {
                    continue;
                }
                let i00 = cell_vert[cell_idx(x - 1, y - 1, z)];
                let i10 = cell_vert[cell_idx(x, y - 1, z)];
                let i11 = cell_vert[cell_idx(x, y, z)];
                let i01 = cell_vert[cell_idx(x - 1, y, z)];
                debug_assert!([i00, i10, i11, i01].iter().all(|i| *i != NO_VERT));

                if a {
                    emit_quad(i00, i01, i11, i10);
                } else {
                    emit_quad(i00, i10, i11, i01);
                }
            }
        }
    }

    SurfaceMesh { vertices, faces }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    /// 以 (cx, cy, cz) 为球心、`r` 为半径的球形场: 内部为正.
    fn sphere_field(n: usize, r: f32) -> Array3<f32> {
        let c = (n - 1) as f32 / 2.0;
        Array3::from_shape_fn((n, n, n), |(z, y, x)| {
            let (dx, dy, dz) = (x as f32 - c, y as f32 - c, z as f32 - c);
            r - (dx * dx + dy * dy + dz * dz).sqrt()
        })
    }

    #[test]
    fn test_sphere_field_produces_closed_surface_near_bounds() {
        let field = sphere_field(16, 5.0);
        let mesh = extract_iso(field.view(), 0.0);

        assert!(!mesh.is_empty(), "球形场应产生非空网格");
        assert!(mesh.vertex_len() > 0);

        // 顶点不应飞离采样域.
        for v in &mesh.vertices {
            for c in v {
                assert!(*c >= 0.0 && *c <= 15.0, "顶点越界: {v:?}");
            }
        }

        // 面下标合法.
        let n = mesh.vertex_len() as u32;
        for f in &mesh.faces {
            assert!(f.iter().all(|i| *i < n));
        }
    }

    #[test]
    fn test_uniform_field_produces_no_surface() {
        let field = Array3::from_elem((8, 8, 8), -1.0f32);
        assert!(extract_iso(field.view(), 0.0).is_empty());

        let field = Array3::from_elem((8, 8, 8), 1.0f32);
        assert!(extract_iso(field.view(), 0.0).is_empty());
    }

    #[test]
    fn test_degenerate_field_is_empty() {
        let field = Array3::from_elem((1, 8, 8), 1.0f32);
        assert!(extract_iso(field.view(), 0.0).is_empty());
    }

    #[test]
    fn test_vertices_interpolate_at_level() {
        // 沿 x 的线性场 v = x - 1.5, 等值面应落在 x = 1.5 平面附近.
        let field = Array3::from_shape_fn((4, 4, 4), |(_, _, x)| x as f32 - 1.5);
        let mesh = extract_iso(field.view(), 0.0);
        assert!(!mesh.is_empty());
        for v in &mesh.vertices {
            assert!((v[0] - 1.5).abs() < 1e-5, "交点应在 x = 1.5: {v:?}");
        }
    }

    #[test]
    fn test_nonzero_level() {
        let field = sphere_field(12, 4.0);
        let lo = extract_iso(field.view(), 0.0);
        let hi = extract_iso(field.view(), 2.0);
        assert!(!lo.is_empty() && !hi.is_empty());
        // 等值面越高, 球面越小, 顶点越少.
        assert!(hi.vertex_len() < lo.vertex_len());
    }
}
