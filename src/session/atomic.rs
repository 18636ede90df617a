//! Atomic file writes: write to `path.tmp`, fsync, rename to `path`. On
//! failure the temp file is removed. Grounded loosely in the teacher's
//! `orchestrator/session.rs::SessionManager::save` (a `PathBuf`-held manager
//! writing JSON via `tokio::fs`), generalized from the teacher's
//! non-atomic plain `fs::write` to the tmp+fsync+rename pattern §4.8/§8
//! requires ("after any crash during a checkpoint write, the destination
//! file contains either the previous valid JSON or the new valid JSON").

use std::path::Path;
use tokio::fs;
use tokio::io::AsyncWriteExt;

pub async fn write_atomic(path: &Path, contents: &str) -> std::io::Result<()> {
    let tmp_path = path.with_extension(format!(
        "{}.tmp",
        path.extension().and_then(|e| e.to_str()).unwrap_or("")
    ));

    let result: std::io::Result<()> = async {
        let mut file = fs::File::create(&tmp_path).await?;
        file.write_all(contents.as_bytes()).await?;
        file.sync_all().await?;
        drop(file);
        fs::rename(&tmp_path, path).await?;
        Ok(())
    }
    .await;

    if result.is_err() {
        let _ = fs::remove_file(&tmp_path).await;
    }
    result
}

/// Deterministic hash of a value's sorted-key flattening, used only for
/// quick state comparison, never security, per §4.8. Uses `sha2` (already
/// part of the teacher's dependency stack) rather than MD5.
pub fn state_hash(value: &serde_json::Value) -> String {
    use sha2::{Digest, Sha256};
    let flattened = flatten_sorted(value);
    let mut hasher = Sha256::new();
    hasher.update(flattened.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn flatten_sorted(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            keys.iter()
                .map(|k| format!("{k}={}", flatten_sorted(&map[*k])))
                .collect::<Vec<_>>()
                .join(",")
        }
        serde_json::Value::Array(arr) => arr.iter().map(flatten_sorted).collect::<Vec<_>>().join(","),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn write_atomic_roundtrips_and_leaves_no_tmp_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        write_atomic(&path, "{\"a\":1}").await.unwrap();
        let contents = fs::read_to_string(&path).await.unwrap();
        assert_eq!(contents, "{\"a\":1}");
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn write_atomic_never_leaves_destination_truncated() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        write_atomic(&path, "{\"v\":1}").await.unwrap();
        write_atomic(&path, "{\"v\":2}").await.unwrap();
        let contents = fs::read_to_string(&path).await.unwrap();
        assert!(contents == "{\"v\":1}" || contents == "{\"v\":2}");
    }

    #[test]
    fn state_hash_is_order_independent() {
        let a = serde_json::json!({"x": 1, "y": 2});
        let b = serde_json::json!({"y": 2, "x": 1});
        assert_eq!(state_hash(&a), state_hash(&b));
    }
}
