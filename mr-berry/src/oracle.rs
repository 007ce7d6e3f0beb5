//! 分割预测入口.
//!
//! [`SegmentationOracle`] 负责 checkpoint 的一次性装载与预测场生成.
//! 网络前向计算以 [`Segmenter`] trait 为接缝: 当前内置后端为直通实现
//! (预测场即重采样到参考分辨率后的输入体数据本身), 真实推理后端可以在
//! 不改动调用方的情况下替换接入.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use ndarray::Array3;
use once_cell::sync::OnceCell;

use crate::consts::REFERENCE_SHAPE_XYZ;
use crate::data::MriScan;
use crate::resample;

/// 预测运行时错误.
#[derive(Debug)]
pub enum OracleError {
    /// 模型 checkpoint 文件不存在.
    CheckpointMissing(PathBuf),

    /// checkpoint 存在但无法读取.
    CheckpointUnreadable(PathBuf, std::io::Error),
}

impl fmt::Display for OracleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CheckpointMissing(p) => {
                write!(f, "Checkpoint '{}' not found.", p.display())
            }
            Self::CheckpointUnreadable(p, e) => {
                write!(f, "Checkpoint '{}' unreadable: {e}", p.display())
            }
        }
    }
}

impl std::error::Error for OracleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::CheckpointMissing(_) => None,
            Self::CheckpointUnreadable(_, e) => Some(e),
        }
    }
}

/// 已装载的模型句柄. 只读, 装载后全局共享.
#[derive(Debug)]
pub struct ModelHandle {
    weight_len: u64,
}

impl ModelHandle {
    /// checkpoint 字节数. 用于装载校验与日志.
    #[inline]
    pub fn weight_len(&self) -> u64 {
        self.weight_len
    }
}

/// 产生体素级预测场的推理后端.
pub trait Segmenter {
    /// 由 (已规范化的) 扫描产生参考分辨率下的预测场, 轴序与扫描内部
    /// 存储一致 (z, y, x).
    fn predict(&self, scan: &MriScan) -> Result<Array3<f32>, OracleError>;
}

/// 分割 oracle.
///
/// checkpoint 在首次预测时装载一次, 此后只读共享; 不会按请求重复装载.
pub struct SegmentationOracle {
    checkpoint: PathBuf,
    model: OnceCell<ModelHandle>,
}

impl fmt::Debug for SegmentationOracle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SegmentationOracle")
            .field("checkpoint", &self.checkpoint)
            .field("loaded", &self.model.get().is_some())
            .finish()
    }
}

impl SegmentationOracle {
    /// 以 checkpoint 路径初始化. 不做任何 I/O.
    pub fn new(checkpoint: impl Into<PathBuf>) -> Self {
        Self {
            checkpoint: checkpoint.into(),
            model: OnceCell::new(),
        }
    }

    /// checkpoint 路径.
    #[inline]
    pub fn checkpoint(&self) -> &Path {
        &self.checkpoint
    }

    /// 装载 (或获取已装载的) 模型句柄.
    ///
    /// 首次调用执行存在性校验与装载, 失败不会留下半初始化状态,
    /// 之后的调用会重新尝试; 成功后恒返回同一句柄.
    pub fn model(&self) -> Result<&ModelHandle, OracleError> {
        self.model.get_or_try_init(|| {
            if !self.checkpoint.is_file() {
                return Err(OracleError::CheckpointMissing(self.checkpoint.clone()));
            }
            let meta = fs::metadata(&self.checkpoint)
                .map_err(|e| OracleError::CheckpointUnreadable(self.checkpoint.clone(), e))?;
            Ok(ModelHandle {
                weight_len: meta.len(),
            })
        })
    }
}

impl Segmenter for SegmentationOracle {
    fn predict(&self, scan: &MriScan) -> Result<Array3<f32>, OracleError> {
        let _model = self.model()?;
        let (x, y, z) = REFERENCE_SHAPE_XYZ;
        // 内部存储轴序为 (z, y, x).
        Ok(resample::trilinear(scan.data(), (z, y, x)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    #[test]
    fn test_missing_checkpoint() {
        let oracle = SegmentationOracle::new("/nonexistent/model.pth");
        let err = oracle.model().unwrap_err();
        assert!(matches!(err, OracleError::CheckpointMissing(_)));
        assert!(err.to_string().contains("not found"));

        // 失败不应留下半初始化状态.
        assert!(oracle.model().is_err());
    }

    #[test]
    fn test_model_loaded_once() {
        let dir = tempfile::tempdir().unwrap();
        let ckpt = dir.path().join("model.pth");
        std::fs::write(&ckpt, b"weights").unwrap();

        let oracle = SegmentationOracle::new(&ckpt);
        let first = oracle.model().unwrap() as *const ModelHandle;
        let again = oracle.model().unwrap() as *const ModelHandle;
        assert_eq!(first, again);
        assert_eq!(oracle.model().unwrap().weight_len(), 7);
    }

    #[test]
    fn test_predict_reference_shape() {
        let dir = tempfile::tempdir().unwrap();
        let ckpt = dir.path().join("model.pth");
        std::fs::write(&ckpt, b"weights").unwrap();

        let data = Array3::from_elem((8, 8, 8), 5.0f32);
        let scan = MriScan::from_array(data, [1.0, 1.0, 1.0]);

        let oracle = SegmentationOracle::new(&ckpt);
        let field = oracle.predict(&scan).unwrap();
        // (z, y, x) 存储轴序下的参考分辨率.
        assert_eq!(field.dim(), (155, 240, 240));
        assert!((field[(70, 100, 100)] - 5.0).abs() < 1e-4);
    }
}
