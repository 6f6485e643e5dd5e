use std::path::{Path, PathBuf};
use chrono::Utc;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};

/// Maximum file size (10 MB)
pub const MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

/// Builds `<epoch-ms>-<basename><ext>` from the client-supplied name,
/// dropping any directory components.
pub fn stored_filename(original: &str, epoch_ms: i64) -> String {
    let base = original
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();

    let path = Path::new(base);
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("upload");
    let extension = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|ext| format!(".{}", ext))
        .unwrap_or_default();

    format!("{}-{}{}", epoch_ms, stem, extension)
}

/// Save an uploaded file to the uploads directory.
/// Returns the relative path to the file (e.g., "uploads/1700000000000-plan.pdf")
pub async fn save_uploaded_file(
    uploads_dir: &str,
    filename: &str,
    data: &[u8],
    max_bytes: usize,
) -> Result<String> {
    // Validate file size
    if data.len() > max_bytes {
        return Err(AppError::Validation(format!(
            "File too large (max {} MB)",
            max_bytes / (1024 * 1024)
        )));
    }

    // Ensure uploads directory exists
    let uploads_path = PathBuf::from(uploads_dir);
    fs::create_dir_all(&uploads_path).await.map_err(|e| {
        AppError::Internal(format!("Failed to create uploads directory: {}", e))
    })?;

    let new_filename = stored_filename(filename, Utc::now().timestamp_millis());
    let file_path = uploads_path.join(&new_filename);

    // Write file
    let mut file = fs::File::create(&file_path).await.map_err(|e| {
        AppError::Internal(format!("Failed to create file: {}", e))
    })?;

    file.write_all(data).await.map_err(|e| {
        AppError::Internal(format!("Failed to write file: {}", e))
    })?;

    Ok(format!("uploads/{}", new_filename))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stored_filename_keeps_basename_and_extension() {
        assert_eq!(stored_filename("proposal.pdf", 1700000000000), "1700000000000-proposal.pdf");
        assert_eq!(stored_filename("archive.tar.gz", 5), "5-archive.tar.gz");
        assert_eq!(stored_filename("README", 5), "5-README");
    }

    #[test]
    fn test_stored_filename_strips_directories() {
        assert_eq!(stored_filename("../../etc/passwd", 1), "1-passwd");
        assert_eq!(stored_filename(r"C:\Users\me\draft.docx", 1), "1-draft.docx");
        assert_eq!(stored_filename("", 1), "1-upload");
    }

    #[tokio::test]
    async fn test_oversized_upload_is_rejected() {
        let result = save_uploaded_file("target/test-uploads", "big.bin", &[0u8; 16], 8).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
