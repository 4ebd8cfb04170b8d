//! Persisted query map management.
//!
//! A persisted query map is a flat JSON object mapping a stable query id to
//! its full GraphQL text. One map file exists per released app version under
//! the persisted-queries directory. At release time the reconciler snapshots
//! the current build's map under the release version, deletes maps for
//! versions outside the support window, and publishes a single merged map
//! that the GraphQL endpoint reads at startup.
//!
//! The reconciler is a single-shot release step with no locking; running two
//! instances against the same directory concurrently is out of contract.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::errors::AppError;
use crate::version::AppVersion;

/// Query id to query text. A BTreeMap keeps serialization deterministic, so
/// reconciling identical inputs yields byte-identical output.
pub type QueryMap = BTreeMap<String, String>;

/// Release channel descriptor (`release.json`). The current release version
/// is `{version}-{kind}.{number}`; every release carries a kind/number pair,
/// production trains included.
#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseChannel {
    pub version: String,
    pub kind: String,
    pub number: u32,
}

impl ReleaseChannel {
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// The full version string the current build's map is snapshotted under.
    pub fn current_version(&self) -> Result<AppVersion, AppError> {
        let version = format!("{}-{}.{}", self.version, self.kind, self.number);
        Ok(version.parse()?)
    }
}

/// Summary of one reconciliation run.
#[derive(Debug, Default)]
pub struct ReconcileReport {
    /// Merged map over all versions still in the support window.
    pub merged: QueryMap,
    /// Versions whose map files were kept and merged, ascending.
    pub kept: Vec<AppVersion>,
    /// Versions whose map files were deleted.
    pub deleted: Vec<AppVersion>,
    /// Files whose stem did not parse as a version. Never deleted.
    pub skipped: Vec<PathBuf>,
}

/// Load a persisted query map from disk.
pub fn load_query_map(path: &Path) -> Result<QueryMap, AppError> {
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

/// Snapshot the current build's map into the versioned directory as
/// `{version}.json`, overwriting any previous snapshot of the same version.
/// The map is parsed before writing so a corrupted build artifact fails the
/// release instead of poisoning the directory.
pub fn snapshot_current_map(
    dir: &Path,
    current: &AppVersion,
    current_map_file: &Path,
) -> Result<PathBuf, AppError> {
    let map = load_query_map(current_map_file)?;
    fs::create_dir_all(dir)?;
    let snapshot_path = dir.join(format!("{}.json", current));
    fs::write(&snapshot_path, serde_json::to_string_pretty(&map)?)?;
    Ok(snapshot_path)
}

/// Reconcile the versioned directory against the last supported version:
/// delete map files for versions outside the support window, and merge the
/// remaining maps ascending by version so newer releases win on id collision.
///
/// Files whose stem is not a valid version are skipped with a warning, never
/// deleted; a malformed name is more likely operator error than a stale map.
pub fn reconcile(dir: &Path, last_supported: &AppVersion) -> Result<ReconcileReport, AppError> {
    let mut report = ReconcileReport::default();
    let mut candidates: Vec<(AppVersion, PathBuf)> = Vec::new();

    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default();
        match stem.parse::<AppVersion>() {
            Ok(version) => candidates.push((version, path)),
            Err(err) => {
                tracing::warn!(
                    file = %path.display(),
                    error = %err,
                    "skipping persisted query file with unparsable version"
                );
                report.skipped.push(path);
            }
        }
    }

    candidates.sort_by_key(|(version, _)| *version);

    for (version, path) in candidates {
        if version.is_supported(last_supported) {
            let map = load_query_map(&path)?;
            report.merged.extend(map);
            report.kept.push(version);
        } else {
            fs::remove_file(&path)?;
            report.deleted.push(version);
        }
    }

    Ok(report)
}

/// Publish the merged map to the well-known path the server reads at startup.
pub fn publish(map: &QueryMap, out: &Path) -> Result<(), AppError> {
    if let Some(parent) = out.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(out, serde_json::to_string_pretty(map)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn v(s: &str) -> AppVersion {
        s.parse().unwrap()
    }

    fn write_map(dir: &Path, name: &str, entries: &[(&str, &str)]) {
        let map: QueryMap = entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        fs::write(
            dir.join(name),
            serde_json::to_string_pretty(&map).unwrap(),
        )
        .unwrap();
    }

    #[test]
    fn test_pruning_against_support_window() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path();
        write_map(dir, "1.0.0.json", &[("a", "query A1")]);
        write_map(dir, "1.1.0-beta.1.json", &[("b", "query B")]);
        write_map(dir, "1.2.0.json", &[("a", "query A2"), ("c", "query C")]);

        let report = reconcile(dir, &v("1.1.0")).unwrap();

        assert!(!dir.join("1.0.0.json").exists());
        // beta ranks below the floor's (absent) prerelease, so it is pruned
        assert!(!dir.join("1.1.0-beta.1.json").exists());
        assert!(dir.join("1.2.0.json").exists());
        assert_eq!(report.deleted, vec![v("1.0.0"), v("1.1.0-beta.1")]);
        assert_eq!(report.kept, vec![v("1.2.0")]);
        assert_eq!(report.merged.get("a").unwrap(), "query A2");
        assert!(!report.merged.contains_key("b"));
    }

    #[test]
    fn test_merge_is_idempotent_and_deterministic() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path();
        write_map(dir, "1.1.0.json", &[("a", "old"), ("b", "query B")]);
        write_map(dir, "1.2.0.json", &[("a", "new")]);

        let out1 = temp.path().join("out1.json");
        let out2 = temp.path().join("out2.json");
        let report = reconcile(dir, &v("1.1.0")).unwrap();
        publish(&report.merged, &out1).unwrap();
        let report = reconcile(dir, &v("1.1.0")).unwrap();
        publish(&report.merged, &out2).unwrap();

        let bytes1 = fs::read(&out1).unwrap();
        let bytes2 = fs::read(&out2).unwrap();
        assert_eq!(bytes1, bytes2);
    }

    #[test]
    fn test_newer_version_wins_on_id_collision() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path();
        write_map(dir, "1.3.0.json", &[("shared", "newest")]);
        write_map(dir, "1.1.0.json", &[("shared", "oldest")]);
        write_map(dir, "1.2.0.json", &[("shared", "middle")]);

        let report = reconcile(dir, &v("1.0.0")).unwrap();
        assert_eq!(report.kept, vec![v("1.1.0"), v("1.2.0"), v("1.3.0")]);
        assert_eq!(report.merged.get("shared").unwrap(), "newest");
    }

    #[test]
    fn test_unparsable_filenames_are_skipped_not_deleted() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path();
        write_map(dir, "not-a-version.json", &[("x", "query X")]);
        write_map(dir, "1.2.0.json", &[("a", "query A")]);

        let report = reconcile(dir, &v("1.1.0")).unwrap();

        assert!(dir.join("not-a-version.json").exists());
        assert_eq!(report.skipped.len(), 1);
        assert!(!report.merged.contains_key("x"));
        assert_eq!(report.merged.get("a").unwrap(), "query A");
    }

    #[test]
    fn test_snapshot_writes_and_overwrites() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("versions");
        let current = temp.path().join("current.json");
        fs::write(&current, r#"{"q1": "query One"}"#).unwrap();

        let current_version = v("1.2.0-rc.3");
        let path = snapshot_current_map(&dir, &current_version, &current).unwrap();
        assert_eq!(path, dir.join("1.2.0-rc.3.json"));
        assert_eq!(load_query_map(&path).unwrap().get("q1").unwrap(), "query One");

        fs::write(&current, r#"{"q1": "query One v2"}"#).unwrap();
        snapshot_current_map(&dir, &current_version, &current).unwrap();
        assert_eq!(
            load_query_map(&path).unwrap().get("q1").unwrap(),
            "query One v2"
        );
    }

    #[test]
    fn test_snapshot_rejects_corrupted_current_map() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("versions");
        let current = temp.path().join("current.json");
        fs::write(&current, "not json").unwrap();

        let result = snapshot_current_map(&dir, &v("1.0.0-canary.1"), &current);
        assert!(matches!(result, Err(AppError::BadRequest(_))));
        assert!(!dir.exists());
    }

    #[test]
    fn test_release_channel_current_version() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("release.json");
        fs::write(&path, r#"{"version": "1.4.0", "kind": "beta", "number": 7}"#).unwrap();

        let channel = ReleaseChannel::load(&path).unwrap();
        assert_eq!(channel.current_version().unwrap(), v("1.4.0-beta.7"));
    }
}
