use std::io::Cursor;
use std::path::{Path, PathBuf};

use covdelta_core::{ArtifactConfig, CovdeltaError, Result};

use crate::models::{Artifact, WorkflowRun};

/// GitHub Actions operations needed to locate and download an artifact.
#[allow(async_fn_in_trait)]
pub trait ActionsApi {
    /// Resolve a workflow file name (e.g. `test.yaml`) to its id.
    async fn workflow_id(&self, workflow_file: &str) -> Result<u64>;

    /// Most recent completed runs of `workflow_id` on `branch`, newest first.
    async fn completed_runs(
        &self,
        workflow_id: u64,
        branch: &str,
        per_page: u32,
    ) -> Result<Vec<WorkflowRun>>;

    /// Artifacts uploaded by `run_id`.
    async fn run_artifacts(&self, run_id: u64) -> Result<Vec<Artifact>>;

    /// Raw zip archive of `artifact`.
    async fn download_artifact(&self, artifact: &Artifact) -> Result<Vec<u8>>;
}

/// Download the newest base-branch coverage artifact into `config.output_dir`.
///
/// Runs are visited newest first. Within a run, every artifact whose name
/// contains `config.name_contains` is downloaded and unpacked until
/// `config.file_name` shows up in the output directory.
///
/// # Errors
///
/// Returns [`CovdeltaError::ArtifactNotFound`] when no run produced the file,
/// or the first API, I/O, or archive error encountered.
pub async fn fetch_base_coverage<A: ActionsApi>(
    api: &A,
    config: &ArtifactConfig,
) -> Result<PathBuf> {
    let workflow_id = api.workflow_id(&config.workflow).await?;
    let runs = api
        .completed_runs(workflow_id, &config.branch, config.runs_per_page)
        .await?;
    tracing::debug!(
        workflow = %config.workflow,
        workflow_id,
        runs = runs.len(),
        "listed completed runs"
    );

    std::fs::create_dir_all(&config.output_dir)?;
    let target = config.output_dir.join(&config.file_name);

    for run in &runs {
        let artifacts = api.run_artifacts(run.id).await?;
        for artifact in artifacts
            .iter()
            .filter(|a| a.name.contains(&config.name_contains))
        {
            tracing::info!(
                run = run.id,
                artifact = %artifact.name,
                url = %artifact.archive_download_url,
                "downloading artifact"
            );
            let archive = api.download_artifact(artifact).await?;
            extract_archive(&archive, &config.output_dir)?;
            if target.is_file() {
                return Ok(target);
            }
            tracing::warn!(
                artifact = %artifact.name,
                expected = %config.file_name,
                "artifact did not contain the coverage file"
            );
        }
    }

    Err(CovdeltaError::ArtifactNotFound(format!(
        "none of the last {} completed '{}' runs on '{}' produced {}",
        runs.len(),
        config.workflow,
        config.branch,
        config.file_name
    )))
}

/// Unpack a zip archive held in memory into `dir`.
///
/// # Errors
///
/// Returns [`CovdeltaError::Archive`] if the bytes are not a valid zip or an
/// entry cannot be written.
pub fn extract_archive(bytes: &[u8], dir: &Path) -> Result<()> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| CovdeltaError::Archive(format!("invalid zip archive: {e}")))?;
    archive
        .extract(dir)
        .map_err(|e| CovdeltaError::Archive(format!("failed to extract into {}: {e}", dir.display())))
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Mutex;

    use super::*;

    fn zip_with(name: &str, content: &str) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file(name, zip::write::SimpleFileOptions::default())
            .unwrap();
        writer.write_all(content.as_bytes()).unwrap();
        writer.finish().unwrap().into_inner()
    }

    fn artifact(id: u64, name: &str) -> Artifact {
        Artifact {
            id,
            name: name.into(),
            archive_download_url: format!("https://api.github.com/artifacts/{id}/zip"),
        }
    }

    struct FakeActions {
        runs: Vec<(u64, Vec<Artifact>)>,
        archives: Vec<(u64, Vec<u8>)>,
        downloaded: Mutex<Vec<u64>>,
    }

    impl ActionsApi for FakeActions {
        async fn workflow_id(&self, workflow_file: &str) -> Result<u64> {
            assert_eq!(workflow_file, "retina-test.yaml");
            Ok(77)
        }

        async fn completed_runs(
            &self,
            workflow_id: u64,
            branch: &str,
            _per_page: u32,
        ) -> Result<Vec<WorkflowRun>> {
            assert_eq!(workflow_id, 77);
            assert_eq!(branch, "main");
            Ok(self
                .runs
                .iter()
                .map(|(id, _)| WorkflowRun { id: *id })
                .collect())
        }

        async fn run_artifacts(&self, run_id: u64) -> Result<Vec<Artifact>> {
            Ok(self
                .runs
                .iter()
                .find(|(id, _)| *id == run_id)
                .map(|(_, a)| a.clone())
                .unwrap_or_default())
        }

        async fn download_artifact(&self, artifact: &Artifact) -> Result<Vec<u8>> {
            self.downloaded.lock().unwrap().push(artifact.id);
            Ok(self
                .archives
                .iter()
                .find(|(id, _)| *id == artifact.id)
                .map(|(_, bytes)| bytes.clone())
                .unwrap_or_default())
        }
    }

    fn config(dir: &Path) -> ArtifactConfig {
        ArtifactConfig {
            output_dir: dir.join("mainbranchcoverage"),
            ..ArtifactConfig::default()
        }
    }

    #[tokio::test]
    async fn downloads_first_matching_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let api = FakeActions {
            runs: vec![
                (1, vec![artifact(10, "binaries"), artifact(11, "coverage-linux")]),
                (2, vec![artifact(20, "coverage")]),
            ],
            archives: vec![(11, zip_with("coverage.out", "mode: set\n"))],
            downloaded: Mutex::new(Vec::new()),
        };

        let path = fetch_base_coverage(&api, &config(dir.path())).await.unwrap();
        assert_eq!(path, dir.path().join("mainbranchcoverage/coverage.out"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "mode: set\n");
        assert_eq!(*api.downloaded.lock().unwrap(), vec![11]);
    }

    #[tokio::test]
    async fn falls_back_to_older_run_when_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let api = FakeActions {
            runs: vec![
                (1, vec![artifact(11, "coverage")]),
                (2, vec![artifact(21, "coverage")]),
            ],
            archives: vec![
                (11, zip_with("other.txt", "x")),
                (21, zip_with("coverage.out", "mode: atomic\n")),
            ],
            downloaded: Mutex::new(Vec::new()),
        };

        let path = fetch_base_coverage(&api, &config(dir.path())).await.unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "mode: atomic\n");
        assert_eq!(*api.downloaded.lock().unwrap(), vec![11, 21]);
    }

    #[tokio::test]
    async fn reports_missing_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let api = FakeActions {
            runs: vec![(1, vec![artifact(10, "binaries")])],
            archives: Vec::new(),
            downloaded: Mutex::new(Vec::new()),
        };

        let err = fetch_base_coverage(&api, &config(dir.path()))
            .await
            .unwrap_err();
        assert!(matches!(err, CovdeltaError::ArtifactNotFound(_)));
        assert!(api.downloaded.lock().unwrap().is_empty());
    }

    #[test]
    fn garbage_is_not_a_zip() {
        let dir = tempfile::tempdir().unwrap();
        let err = extract_archive(b"not a zip", dir.path()).unwrap_err();
        assert!(matches!(err, CovdeltaError::Archive(_)));
    }
}
