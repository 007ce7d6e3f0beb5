//! Wavefront OBJ 文本序列化.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use super::SurfaceMesh;

/// 将网格写为最小 OBJ 文本文件: 先逐行 `v x y z`, 再逐行 `f a b c`.
pub fn write_obj<P: AsRef<Path>>(mesh: &SurfaceMesh, path: P) -> io::Result<()> {
    let file = File::create(path.as_ref())?;
    let mut w = BufWriter::new(file);
    write_obj_to(mesh, &mut w)?;
    w.flush()
}

/// 将网格以 OBJ 文本写入任意 writer.
pub fn write_obj_to<W: Write>(mesh: &SurfaceMesh, w: &mut W) -> io::Result<()> {
    for v in &mesh.vertices {
        writeln!(w, "v {} {} {}", v[0], v[1], v[2])?;
    }
    for f in &mesh.faces {
        // OBJ 面下标从 1 开始.
        writeln!(w, "f {} {} {}", f[0] + 1, f[1] + 1, f[2] + 1)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_triangles() -> SurfaceMesh {
        SurfaceMesh {
            vertices: vec![
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [0.0, 1.0, 0.0],
                [0.5, 0.5, 1.5],
            ],
            faces: vec![[0, 1, 2], [1, 3, 2]],
        }
    }

    #[test]
    fn test_obj_text_one_indexed() {
        let mut buf = Vec::new();
        write_obj_to(&two_triangles(), &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0], "v 0 0 0");
        assert_eq!(lines[3], "v 0.5 0.5 1.5");
        assert_eq!(lines[4], "f 1 2 3");
        assert_eq!(lines[5], "f 2 4 3");
    }

    #[test]
    fn test_obj_file_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mesh.obj");
        write_obj(&two_triangles(), &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("v "));
        assert!(text.contains("\nf 1 2 3\n"));
    }
}
