use std::{
    io,
    path::{Path, PathBuf},
    sync::Arc,
};

use shared::protocol::ExportKind;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::{ScoringService, ServiceError};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("invalid export filename '{0}'")]
    InvalidFilename(String),
    #[error(transparent)]
    Service(#[from] ServiceError),
    #[error("failed to write export file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("export task aborted: {0}")]
    Aborted(String),
}

/// Downloads server-generated CSVs into a local directory on a background task.
pub struct ExportTrigger {
    service: Arc<dyn ScoringService>,
    dir: PathBuf,
}

impl ExportTrigger {
    pub fn new(service: Arc<dyn ScoringService>, dir: impl Into<PathBuf>) -> Self {
        Self {
            service,
            dir: dir.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Starts the download and returns immediately. `filename` defaults to the
    /// export's server-side attachment name.
    pub fn spawn(
        &self,
        kind: ExportKind,
        filename: Option<String>,
    ) -> JoinHandle<Result<PathBuf, ExportError>> {
        let service = Arc::clone(&self.service);
        let dir = self.dir.clone();
        tokio::spawn(async move { download(service.as_ref(), kind, &dir, filename).await })
    }

    pub async fn export(
        &self,
        kind: ExportKind,
        filename: Option<String>,
    ) -> Result<PathBuf, ExportError> {
        match self.spawn(kind, filename).await {
            Ok(result) => result,
            Err(err) => Err(ExportError::Aborted(err.to_string())),
        }
    }
}

async fn download(
    service: &dyn ScoringService,
    kind: ExportKind,
    dir: &Path,
    filename: Option<String>,
) -> Result<PathBuf, ExportError> {
    let filename = filename.unwrap_or_else(|| kind.default_filename().to_string());
    validate_filename(&filename)?;

    let body = match service.fetch_export(kind).await {
        Ok(body) => body,
        Err(err) => {
            warn!(?kind, error = %err, "export download failed");
            return Err(err.into());
        }
    };

    let target = dir.join(&filename);
    let staged = StagedFile::new(dir.join(format!(".{filename}.part")));
    tokio::fs::write(staged.path(), &body)
        .await
        .map_err(|source| ExportError::Io {
            path: staged.path().to_path_buf(),
            source,
        })?;
    tokio::fs::rename(staged.path(), &target)
        .await
        .map_err(|source| ExportError::Io {
            path: target.clone(),
            source,
        })?;
    staged.commit();

    info!(?kind, path = %target.display(), bytes = body.len(), "export saved");
    Ok(target)
}

fn validate_filename(filename: &str) -> Result<(), ExportError> {
    let trimmed = filename.trim();
    if trimmed.is_empty()
        || trimmed == "."
        || trimmed == ".."
        || filename.contains(['/', '\\'])
    {
        return Err(ExportError::InvalidFilename(filename.to_string()));
    }
    Ok(())
}

/// Partially written download; removed on drop unless committed.
struct StagedFile {
    path: PathBuf,
    committed: bool,
}

impl StagedFile {
    fn new(path: PathBuf) -> Self {
        Self {
            path,
            committed: false,
        }
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn commit(mut self) {
        self.committed = true;
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if !self.committed {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

#[cfg(test)]
#[path = "tests/export_tests.rs"]
mod tests;
