//! Loading tables from JSON files

use std::path::Path;

use tracing::info;

use crate::domain::{DataFrame, DomainError, DomainResult};
use crate::serializers::SerializerKind;

/// Read `path` and parse it with the serializer for `kind`
pub async fn load_frame(path: &Path, kind: SerializerKind) -> DomainResult<DataFrame> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| DomainError::Storage(format!("{}: {}", path.display(), e)))?;

    let data: serde_json::Value = serde_json::from_str(&raw)
        .map_err(|e| DomainError::Storage(format!("{}: {}", path.display(), e)))?;

    let frame = kind
        .build()
        .to_internal_value(data)
        .map_err(|e| DomainError::Storage(format!("{}: {}", path.display(), e)))?;

    info!(
        "Loaded {} rows x {} columns from {}",
        frame.len(),
        frame.columns().len(),
        path.display()
    );
    Ok(frame)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_file(name: &str, body: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("frame-rest-{}-{}", std::process::id(), name));
        std::fs::write(&path, body).unwrap();
        path
    }

    #[tokio::test]
    async fn loads_columns_file() {
        let path = temp_file("cols.json", r#"{"a": [1, 2, 3], "b": ["x", "y", "z"]}"#);
        let frame = load_frame(&path, SerializerKind::Columns).await.unwrap();
        assert_eq!(frame.len(), 3);
        assert_eq!(frame.columns(), &["a", "b"]);
        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn read_only_format_cannot_load() {
        let path = temp_file("records.json", r#"{"records": []}"#);
        let err = load_frame(&path, SerializerKind::Records).await.unwrap_err();
        assert!(matches!(err, DomainError::Storage(_)));
        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn missing_file_is_storage_error() {
        let err = load_frame(Path::new("/nonexistent/frame.json"), SerializerKind::Split)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Storage(_)));
    }
}
