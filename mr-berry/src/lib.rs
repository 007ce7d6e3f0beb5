#![warn(missing_docs)] // <= 合适时移除它.

//! 核心库. 提供脑部 MRI nifti 体数据的结构化信息和基础处理算法.
//!
//! 该 crate 目前仅提供 `safe` 接口. 将来可能为部分高性能场景关键路径提供 `unsafe` 接口.
//!
//! # 注意
//!
//! 1. 体数据按单通道 3D nifti 容器 (`.nii` / `.nii.gz`) 组织,
//!   体素值装载后一律以 `f32` 表示.
//! 2. 在非期望情况下, 程序会直接 panic, 而不会导致内存错误. As what Rust promises.
//!
//! # 功能概览
//!
//! ### 体数据装载与切片 ✅
//!
//! nii 文件读写, header 属性, 三轴平面提取与展示方向旋转.
//!
//! 实现位于 `mr-berry/src/data`.
//!
//! ### 灰度规范化 ✅
//!
//! 观测 min/max 线性映射到 \[0, 255\] 的只读窗口对象.
//!
//! 实现位于 `mr-berry/src/window.rs`.
//!
//! ### 三线性重采样 ✅
//!
//! 任意形状 3D 标量场到目标形状的插值重采样.
//!
//! 实现位于 `mr-berry/src/resample.rs`.
//!
//! ### 分割预测入口 ✅
//!
//! checkpoint 一次性装载, 预测场生成, 推理后端接缝 ([`oracle::Segmenter`]).
//!
//! 实现位于 `mr-berry/src/oracle.rs`.
//!
//! ### 等值面网格提取与 OBJ 序列化 ✅
//!
//! 标量场等值面 → 三角网格 → 1-indexed OBJ 文本.
//!
//! 实现位于 `mr-berry/src/mesh`.

/// 二维索引, 同时也可一定程度上用作非负整数向量.
pub type Idx2d = (usize, usize);

/// 三维索引, 同时也可一定程度上用作非负整数向量.
pub type Idx3d = (usize, usize, usize);

/// 3D MRI nii 文件基础数据结构.
mod data;

pub use data::{ImgWriteVis, MriScan, NiftiHeaderAttr, PlaneAxis, ScanSlice};

pub mod consts;

pub mod assets;
pub mod mesh;
pub mod oracle;
pub mod resample;
pub mod window;

pub mod prelude;
