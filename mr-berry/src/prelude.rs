//! 涵盖了本 crate 一系列常用的功能.

pub use crate::{Idx2d, Idx3d};

pub use crate::data::{ImgWriteVis, MriScan, NiftiHeaderAttr, PlaneAxis, ScanSlice};

pub use crate::window::RescaleWindow;

pub use crate::consts::{self, REFERENCE_SHAPE_XYZ, RESCALE_MAX, RESCALE_MIN};

pub use crate::mesh::{extract_iso, SurfaceMesh};

pub use crate::oracle::{OracleError, SegmentationOracle, Segmenter};

pub use crate::assets;
