//! 图像文件发现

use crate::error::{AppError, AppResult, FileError};
use std::path::Path;
use tracing::debug;

/// 支持的图像扩展名
pub const IMAGE_EXTENSIONS: [&str; 7] = ["jpg", "jpeg", "png", "bmp", "gif", "tif", "tiff"];

/// 是否为支持的图像文件（按扩展名，不区分大小写）
pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| IMAGE_EXTENSIONS.iter().any(|e| e.eq_ignore_ascii_case(ext)))
}

/// 列出目录（不含子目录）中的图像文件，按路径排序
pub async fn collect_image_files(folder: &str) -> AppResult<Vec<String>> {
    let mut entries = tokio::fs::read_dir(folder).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            AppError::File(FileError::DirectoryNotFound {
                path: folder.to_string(),
            })
        } else {
            AppError::file_read_failed(folder, e)
        }
    })?;

    let mut images = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| AppError::file_read_failed(folder, e))?
    {
        let path = entry.path();
        if path.is_file() && is_image_file(&path) {
            images.push(path.to_string_lossy().into_owned());
        }
    }
    images.sort();

    debug!("{} 中找到 {} 张图像", folder, images.len());
    Ok(images)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_filter() {
        assert!(is_image_file(Path::new("a.PNG")));
        assert!(is_image_file(Path::new("/x/b.Tiff")));
        assert!(!is_image_file(Path::new("c.txt")));
        assert!(!is_image_file(Path::new("noext")));
    }

    #[tokio::test]
    async fn test_collects_sorted_top_level_images() {
        let dir = std::env::temp_dir().join(format!("aoi_images_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(dir.join("nested")).unwrap();
        for name in ["b.JPG", "a.png", "notes.txt", "nested/c.png"] {
            std::fs::write(dir.join(name), b"x").unwrap();
        }

        let images = collect_image_files(&dir.to_string_lossy()).await.unwrap();
        let _ = std::fs::remove_dir_all(&dir);

        let names: Vec<_> = images
            .iter()
            .map(|p| Path::new(p).file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.png", "b.JPG"]);
    }

    #[tokio::test]
    async fn test_missing_folder() {
        let err = collect_image_files("/nonexistent/aoi").await.unwrap_err();
        assert!(matches!(err, AppError::File(FileError::DirectoryNotFound { .. })));
    }
}
