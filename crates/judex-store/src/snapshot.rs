use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use judex_core::Document;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::{DocumentRepository, Store, StoreError};

const SCRIPT_PREFIX: &str = "window.JUDGMENT_DB";

/// On-disk shape of a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotFormat {
    /// A bare JSON array.
    Json,
    /// `window.JUDGMENT_DB = [...];`, loadable by a browser viewer.
    Script,
}

impl SnapshotFormat {
    /// Guess from the file extension: `.js` is a script, anything else JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("js") => Self::Script,
            _ => Self::Json,
        }
    }

    /// Split `text` into its format and JSON body.
    fn detect(text: &str) -> (Self, &str) {
        let trimmed = text.trim();
        let script_body = trimmed
            .strip_prefix(SCRIPT_PREFIX)
            .map(str::trim_start)
            .and_then(|rest| rest.strip_prefix('='));
        match script_body {
            Some(body) => {
                let body = body.trim();
                (Self::Script, body.strip_suffix(';').unwrap_or(body))
            }
            None => (Self::Json, trimmed),
        }
    }

    fn encode(&self, documents: &[Document]) -> Result<String, StoreError> {
        let json = serde_json::to_string_pretty(documents)?;
        Ok(match self {
            Self::Json => json,
            Self::Script => format!("{SCRIPT_PREFIX} = {json};"),
        })
    }
}

/// A judgment collection stored as one JSON file.
///
/// Loading accepts either format and remembers it; saving writes the same
/// format back. Saves go to a temporary file in the same directory which then
/// replaces the snapshot, so a crash mid-write leaves the old snapshot intact.
#[derive(Debug, Clone)]
pub struct JsonSnapshot {
    path: PathBuf,
    format: SnapshotFormat,
}

impl JsonSnapshot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let format = SnapshotFormat::from_path(&path);
        Self { path, format }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> SnapshotFormat {
        self.format
    }
}

impl DocumentRepository for JsonSnapshot {
    fn load(&mut self) -> Result<Store, StoreError> {
        let text = fs::read_to_string(&self.path).map_err(|e| StoreError::io(&self.path, e))?;
        let (format, body) = SnapshotFormat::detect(&text);
        let documents: Vec<Document> = serde_json::from_str(body)?;
        self.format = format;
        info!(path = %self.path.display(), count = documents.len(), ?format, "loaded snapshot");
        Ok(Store::new(documents))
    }

    fn save(&mut self, store: &Store) -> Result<(), StoreError> {
        let content = self.format.encode(store.documents())?;
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| StoreError::io(dir, e))?;
        tmp.write_all(content.as_bytes())
            .map_err(|e| StoreError::io(tmp.path(), e))?;
        tmp.as_file()
            .sync_all()
            .map_err(|e| StoreError::io(tmp.path(), e))?;
        tmp.persist(&self.path)?;
        debug!(path = %self.path.display(), count = store.len(), "saved snapshot");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    const DOCS: &str = r#"[
        {"meta": {"id": "A1", "title": "甲案"}, "main_text_clean": "原處分撤銷。", "sections": {"主文": "原處分撤銷。"}},
        {"meta": {"id": "B2"}, "sections": {}, "ai_summary": [{"point": "要旨", "refs": [0]}]}
    ]"#;

    #[test]
    fn loads_script_wrapper_and_writes_it_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.js");
        fs::write(&path, format!("window.JUDGMENT_DB = {DOCS};\n")).unwrap();

        let mut repo = JsonSnapshot::new(&path);
        let store = repo.load().unwrap();
        assert_eq!(repo.format(), SnapshotFormat::Script);
        assert_eq!(store.len(), 2);
        assert!(store.find_by_id("B2").unwrap().has_summary());

        repo.save(&store).unwrap();
        let written = fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("window.JUDGMENT_DB = [\n  {"));
        assert!(written.ends_with("];"));

        let reloaded = JsonSnapshot::new(&path).load().unwrap();
        assert_eq!(reloaded, store);
    }

    #[test]
    fn loads_bare_json_regardless_of_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.js");
        fs::write(&path, DOCS).unwrap();

        let mut repo = JsonSnapshot::new(&path);
        repo.load().unwrap();
        assert_eq!(repo.format(), SnapshotFormat::Json);
    }

    #[test]
    fn bare_json_round_trip_keeps_unknown_fields() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("judgments.json");
        let raw = r#"[{"meta": {"id": "X", "scraped_at": "2024-01-01"}, "sections": {}, "notes": [1, 2]}]"#;
        fs::write(&path, raw).unwrap();

        let mut repo = JsonSnapshot::new(&path);
        let store = repo.load().unwrap();
        repo.save(&store).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value[0]["meta"]["scraped_at"], "2024-01-01");
        assert_eq!(value[0]["notes"], serde_json::json!([1, 2]));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = TempDir::new().unwrap();
        let mut repo = JsonSnapshot::new(dir.path().join("absent.json"));
        let err = repo.load().unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }), "got {err:?}");
    }

    #[test]
    fn malformed_file_is_a_json_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "window.JUDGMENT_DB = [{\"meta\": };").unwrap();
        let err = JsonSnapshot::new(&path).load().unwrap_err();
        assert!(matches!(err, StoreError::Json(_)), "got {err:?}");
    }

    #[test]
    fn upsert_persists_immediately() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("judgments.json");
        fs::write(&path, DOCS).unwrap();

        let mut repo = JsonSnapshot::new(&path);
        let mut doc = repo.find_by_id("A1").unwrap().unwrap();
        doc.decision_result = Some("原判決廢棄".into());
        assert!(repo.upsert(doc).unwrap());

        let fresh = JsonSnapshot::new(&path).find_by_id("A1").unwrap().unwrap();
        assert_eq!(fresh.decision_result.as_deref(), Some("原判決廢棄"));
    }
}
