//! HTTP 请求处理器.
//!
//! 重操作 (文件 I/O、重采样、等值面提取) 一律通过 `spawn_blocking`
//! 下放到阻塞线程池, 不占用 async worker.

use std::io::Write;

use axum::body::Body;
use axum::extract::{Multipart, Path as UrlPath, State};
use axum::http::{header, HeaderMap, HeaderValue};
use axum::Json;
use axum::response::Response;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::task;
use tracing::{debug, error, info};

use mr_berry::consts::name;
use mr_berry::{MriScan, NiftiHeaderAttr, PlaneAxis};

use crate::error::ApiError;
use crate::pipeline;
use crate::AppState;

/// `POST /upload/`: 接收体数据文件并运行完整处理管线.
///
/// 成功返回 `{"status": "Success", "filename": <base>}`.
pub async fn upload_volume(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if let Some(filename) = field.file_name().map(ToOwned::to_owned) {
            let bytes = field.bytes().await?;
            upload = Some((filename, bytes));
            break;
        }
    }
    let (filename, bytes) = upload.ok_or(ApiError::MissingFile)?;

    if !name::is_volume(&filename) {
        error!("Invalid file extension: {filename}");
        return Err(ApiError::InvalidExtension);
    }
    let base = name::base(&filename)
        .ok_or(ApiError::InvalidExtension)?
        .to_owned();

    let task_state = state.clone();
    let task_filename = filename.clone();
    let task_base = base.clone();
    task::spawn_blocking(move || {
        let location = task_state
            .store
            .persist(&task_filename, &bytes)
            .map_err(pipeline::PipelineError::Io)?;
        info!("File {task_filename} saved at {}", location.display());

        pipeline::run(
            &task_state.store,
            &task_state.oracle,
            &task_state.config.lesion_atlas,
            &task_filename,
            &task_base,
        )
    })
    .await
    .map_err(|_| ApiError::TaskJoin)?
    .map_err(|e| {
        error!("Processing error: {e}");
        ApiError::Pipeline(e)
    })?;

    Ok(Json(json!({"status": "Success", "filename": base})))
}

/// `GET /obj/{filename}`: 以附件形式返回网格文件字节.
///
/// 客户端声明 `Accept-Encoding: gzip` 且文件足够大时压缩传输.
pub async fn get_mesh(
    State(state): State<AppState>,
    UrlPath(filename): UrlPath<String>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let path = state
        .store
        .mesh_download_path(&filename)
        .ok_or(ApiError::MeshNotFound)?;

    let bytes = task::spawn_blocking(move || std::fs::read(path))
        .await
        .map_err(|_| ApiError::TaskJoin)?
        .map_err(|_| {
            info!("File name: {filename}");
            ApiError::MeshNotFound
        })?;

    let accepts_gzip = headers
        .get(header::ACCEPT_ENCODING)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("gzip"));

    let mut resp = if accepts_gzip && bytes.len() >= state.config.compression_min_bytes {
        let mut enc = GzEncoder::new(Vec::new(), Compression::fast());
        enc.write_all(&bytes)?;
        let mut r = Response::new(Body::from(enc.finish()?));
        r.headers_mut()
            .insert(header::CONTENT_ENCODING, HeaderValue::from_static("gzip"));
        r
    } else {
        Response::new(Body::from(bytes))
    };

    resp.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/octet-stream"),
    );
    Ok(resp)
}

/// `POST /get_dimensions/` 请求体.
#[derive(Debug, Deserialize)]
pub struct FileQuery {
    /// 上传时返回的 base 文件名.
    pub file_path: String,
}

/// `POST /get_dimensions/`: 返回规范化体数据的 (x, y, z) 形状.
pub async fn get_dimensions(
    State(state): State<AppState>,
    Json(body): Json<FileQuery>,
) -> Result<Json<Value>, ApiError> {
    let scan = load_normalized(&state, &body.file_path).await?;
    let (x, y, z) = scan.shape_xyz();
    Ok(Json(json!({"dimensions": [x, y, z]})))
}

/// `POST /get_slices/` 请求体: 坐标三元组与 base 文件名.
#[derive(Debug, Deserialize)]
pub struct SliceQuery {
    /// 固定 x 轴的切片索引.
    pub x: i64,
    /// 固定 y 轴的切片索引.
    pub y: i64,
    /// 固定 z 轴的切片索引.
    pub z: i64,
    /// 上传时返回的 base 文件名.
    pub file_path: String,
}

/// `POST /get_slices/`: 依次固定 x/y/z 轴提取三个平面,
/// 每个平面逆时针旋转 90° 后以嵌套数组返回.
pub async fn get_slices(
    State(state): State<AppState>,
    Json(body): Json<SliceQuery>,
) -> Result<Json<Value>, ApiError> {
    debug!("slice query at ({}, {}, {})", body.x, body.y, body.z);
    let scan = load_normalized(&state, &body.file_path).await?;
    let shape = scan.shape_xyz();

    let slices = (|| {
        let xs = display_plane(&scan, PlaneAxis::X, body.x)?;
        let ys = display_plane(&scan, PlaneAxis::Y, body.y)?;
        let zs = display_plane(&scan, PlaneAxis::Z, body.z)?;
        Some(json!({"x_slice": xs, "y_slice": ys, "z_slice": zs}))
    })()
    .ok_or(ApiError::SliceOutOfRange {
        x: body.x,
        y: body.y,
        z: body.z,
        shape,
    })?;

    Ok(Json(slices))
}

/// 提取展示方向的平面. 索引越界时返回 `None`.
fn display_plane(scan: &MriScan, axis: PlaneAxis, index: i64) -> Option<Vec<Vec<f32>>> {
    let index = usize::try_from(index).ok()?;
    Some(scan.plane(axis, index)?.display_rows())
}

/// 在阻塞线程池上装载 base name 对应的规范化体数据.
async fn load_normalized(state: &AppState, base: &str) -> Result<MriScan, ApiError> {
    let path = state
        .store
        .normalized_query_path(base)
        .ok_or(ApiError::InvalidBaseName)?;

    task::spawn_blocking(move || MriScan::open(path))
        .await
        .map_err(|_| ApiError::TaskJoin)?
        .map_err(|e| {
            error!("Error while loading normalized volume: {e}");
            ApiError::Volume(e)
        })
}
