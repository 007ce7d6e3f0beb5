//! 上传处理管线.
//!
//! 线性流程: 规范化 -> 预测 -> 脑部网格 -> 病灶网格 -> 写出.
//! 任一阶段失败即终止, 并清理本次请求已产生的全部文件; 其它请求
//! 的文件不受影响.

use std::path::Path;

use thiserror::Error;
use tracing::{debug, info};

use mr_berry::mesh::{self, obj};
use mr_berry::oracle::{OracleError, SegmentationOracle, Segmenter};
use mr_berry::window::RescaleWindow;
use mr_berry::MriScan;

use crate::store::VolumeStore;

/// 管线运行时错误.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// 体数据读写失败.
    #[error("Volume I/O error: {0}")]
    Nifti(#[from] nifti::NiftiError),

    /// 上传体数据不含任何有限体素.
    #[error("Uploaded volume has no finite voxels.")]
    EmptyVolume,

    /// 预测失败 (含 checkpoint 缺失).
    #[error(transparent)]
    Oracle(#[from] OracleError),

    /// 病灶分割图集缺失或不可读.
    #[error("Lesion atlas unavailable: {0}")]
    LesionAtlas(nifti::NiftiError),

    /// 文件系统操作失败.
    #[error("Artifact I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// 对已持久化的上传文件运行完整管线.
///
/// 失败时清理本次请求的所有产物后返回错误.
pub fn run(
    store: &VolumeStore,
    oracle: &SegmentationOracle,
    lesion_atlas: &Path,
    filename: &str,
    base: &str,
) -> Result<(), PipelineError> {
    match process(store, oracle, lesion_atlas, filename, base) {
        Ok(()) => Ok(()),
        Err(e) => {
            let removed = store.cleanup_request(filename, base);
            info!("pipeline failed, removed {removed} artifact(s) for '{base}'");
            Err(e)
        }
    }
}

fn process(
    store: &VolumeStore,
    oracle: &SegmentationOracle,
    lesion_atlas: &Path,
    filename: &str,
    base: &str,
) -> Result<(), PipelineError> {
    let scan = MriScan::open(store.volume_path(filename))?;
    let window = RescaleWindow::from_scan(&scan).ok_or(PipelineError::EmptyVolume)?;
    let normalized = scan.par_rescaled(&window);

    let normalized_path = store.normalized_path(base);
    normalized.save(&normalized_path)?;
    info!("normalized volume saved to {}", normalized_path.display());

    let model = oracle.model()?;
    debug!(weights = model.weight_len(), "model handle ready");
    let field = oracle.predict(&normalized)?;
    let brain = mesh::extract_iso(field.view(), 0.0);

    let atlas = MriScan::open(lesion_atlas).map_err(PipelineError::LesionAtlas)?;
    let lesion = mesh::extract_iso(atlas.data(), 0.0);

    obj::write_obj(&brain, store.brain_mesh_path(base))?;
    obj::write_obj(&lesion, store.lesion_mesh_path(base))?;
    info!(
        brain_vertices = brain.vertex_len(),
        brain_faces = brain.face_len(),
        lesion_faces = lesion.face_len(),
        "meshes written for '{base}'"
    );

    Ok(())
}
