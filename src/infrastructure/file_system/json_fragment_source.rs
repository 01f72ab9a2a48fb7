use async_trait::async_trait;
use std::path::PathBuf;
use tokio::fs;

use crate::application::ports::fragment_source::{FragmentSource, FragmentSourceError};
use crate::domain::graph::{Fragment, parse_stream};
use crate::domain::value_objects::Identifier;

/// Fragment streams kept as `<base>/<document_id>.json`, one JSON array per document.
pub struct JsonFragmentSource {
    base_path: PathBuf,
}

impl JsonFragmentSource {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    pub async fn ensure_directory_exists(&self) -> Result<(), FragmentSourceError> {
        fs::create_dir_all(&self.base_path)
            .await
            .map_err(|e| FragmentSourceError::IoError(e.to_string()))
    }

    fn stream_path(&self, document_id: &Identifier) -> PathBuf {
        self.base_path.join(format!("{}.json", document_id))
    }
}

#[async_trait]
impl FragmentSource for JsonFragmentSource {
    async fn load(&self, document_id: &Identifier) -> Result<Vec<Fragment>, FragmentSourceError> {
        let path = self.stream_path(document_id);

        let json = match fs::read_to_string(&path).await {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(FragmentSourceError::NotFound(document_id.clone()));
            }
            Err(e) => return Err(FragmentSourceError::IoError(e.to_string())),
        };

        parse_stream(&json).map_err(|e| FragmentSourceError::ParseError {
            document_id: document_id.clone(),
            message: e.to_string(),
        })
    }

    async fn store(
        &self,
        document_id: &Identifier,
        fragments: &[Fragment],
    ) -> Result<(), FragmentSourceError> {
        self.ensure_directory_exists().await?;

        let json = serde_json::to_vec_pretty(fragments).map_err(|e| {
            FragmentSourceError::ParseError {
                document_id: document_id.clone(),
                message: e.to_string(),
            }
        })?;

        // Write beside the target and rename so readers never see a partial stream.
        let path = self.stream_path(document_id);
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, json)
            .await
            .map_err(|e| FragmentSourceError::IoError(e.to_string()))?;
        fs::rename(&staging, &path)
            .await
            .map_err(|e| FragmentSourceError::IoError(e.to_string()))
    }

    async fn exists(&self, document_id: &Identifier) -> Result<bool, FragmentSourceError> {
        fs::try_exists(self.stream_path(document_id))
            .await
            .map_err(|e| FragmentSourceError::IoError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn doc() -> Identifier {
        Identifier::parse("doc_003").unwrap()
    }

    #[tokio::test]
    async fn test_store_then_load() {
        let dir = tempdir().unwrap();
        let source = JsonFragmentSource::new(dir.path().join("fragments"));
        let stream = vec![
            Fragment::heading("Introduction", 1),
            Fragment::paragraph("Body text."),
        ];

        assert!(!source.exists(&doc()).await.unwrap());
        source.store(&doc(), &stream).await.unwrap();
        assert!(source.exists(&doc()).await.unwrap());
        assert!(dir.path().join("fragments").join("doc_003.json").exists());

        assert_eq!(source.load(&doc()).await.unwrap(), stream);
    }

    #[tokio::test]
    async fn test_missing_stream() {
        let dir = tempdir().unwrap();
        let source = JsonFragmentSource::new(dir.path().to_path_buf());

        assert!(matches!(
            source.load(&doc()).await,
            Err(FragmentSourceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_malformed_stream() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("doc_003.json"), r#"[{"kind": "hologram"}]"#).unwrap();
        let source = JsonFragmentSource::new(dir.path().to_path_buf());

        assert!(matches!(
            source.load(&doc()).await,
            Err(FragmentSourceError::ParseError { .. })
        ));
    }
}
