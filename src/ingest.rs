//! Host-side content ingestion.
//!
//! A selection on the host is either a file that can be read in place or an
//! opaque stream that has to be copied out first. Both become an
//! [`IngestedFile`] with a sanitized name that does not collide with
//! anything already shared, and both are stored through
//! [`FileRepository::write`], the same path the upload handler uses.

use std::future::Future;
use std::io;
use std::path::PathBuf;

use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncRead;
use tracing::{debug, info};

use crate::error::ShareError;
use crate::repository::{FileRepository, UploadSource};
use crate::validate;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Cannot read {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Not a regular file: {0}")]
    NotAFile(PathBuf),

    #[error("Selection has no usable file name")]
    NameUnavailable,

    #[error("Copying selection failed: {0}")]
    Copy(#[from] io::Error),

    #[error("Storing selection failed: {0}")]
    Store(#[from] ShareError),
}

/// A selection resolved into something storable.
#[derive(Debug)]
pub struct IngestedFile {
    pub name: String,
    pub source: UploadSource,
}

/// Something the host picked to share.
pub trait ContentSource {
    fn ingest(
        self,
        repository: &FileRepository,
    ) -> impl Future<Output = Result<IngestedFile, IngestError>> + Send;
}

/// A file already on disk. It is copied when stored and never removed.
#[derive(Debug, Clone)]
pub struct DirectPath(pub PathBuf);

impl ContentSource for DirectPath {
    async fn ingest(self, repository: &FileRepository) -> Result<IngestedFile, IngestError> {
        let DirectPath(path) = self;

        let metadata = fs::metadata(&path)
            .await
            .map_err(|source| IngestError::Unreadable {
                path: path.clone(),
                source,
            })?;
        if !metadata.is_file() {
            return Err(IngestError::NotAFile(path));
        }

        let raw = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or(IngestError::NameUnavailable)?;
        let name = unique_name(repository, &sanitize_filename(&raw)?).await;

        debug!("Ingested {} as {}", path.display(), name);
        Ok(IngestedFile {
            name,
            source: UploadSource::Borrowed(path),
        })
    }
}

/// An opaque stream plus whatever display name came with it.
pub struct CopiedHandle<R> {
    display_name: Option<String>,
    reader: R,
}

impl<R> CopiedHandle<R> {
    pub fn new(display_name: Option<String>, reader: R) -> Self {
        Self {
            display_name,
            reader,
        }
    }
}

impl<R> ContentSource for CopiedHandle<R>
where
    R: AsyncRead + Unpin + Send,
{
    async fn ingest(self, repository: &FileRepository) -> Result<IngestedFile, IngestError> {
        let CopiedHandle {
            display_name,
            mut reader,
        } = self;

        let raw = display_name.ok_or(IngestError::NameUnavailable)?;
        let name = unique_name(repository, &sanitize_filename(&raw)?).await;

        let (staged, size) = repository.stage(&mut reader).await?;
        debug!("Copied {} bytes for {}", size, name);

        Ok(IngestedFile {
            name,
            source: UploadSource::Staged(staged),
        })
    }
}

/// Ingest `source` and store it in the shared directory. Returns the stored name.
pub async fn publish<S: ContentSource>(
    repository: &FileRepository,
    source: S,
) -> Result<String, IngestError> {
    let ingested = source.ingest(repository).await?;

    if !validate::is_acceptable(&ingested.name) {
        return Err(ShareError::InvalidName.into());
    }

    repository.write(&ingested.name, ingested.source).await?;
    info!("Published {}", ingested.name);
    Ok(ingested.name)
}

/// Map every character outside `[A-Za-z0-9._-]` to `_` and break up `..` runs.
fn sanitize_filename(raw: &str) -> Result<String, IngestError> {
    let mut name: String = raw
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    while name.contains("..") {
        name = name.replace("..", "._");
    }

    if name.is_empty() || name == "." {
        return Err(IngestError::NameUnavailable);
    }
    Ok(name)
}

/// First of `name`, `stem_1.ext`, `stem_2.ext`, ... not present in the repository.
async fn unique_name(repository: &FileRepository, name: &str) -> String {
    if !repository.contains(name).await {
        return name.to_string();
    }

    let (stem, ext) = match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
        _ => (name, None),
    };

    let mut count = 1u32;
    loop {
        let candidate = match ext {
            Some(ext) => format!("{}_{}.{}", stem, count, ext),
            None => format!("{}_{}", stem, count),
        };
        if !repository.contains(&candidate).await {
            return candidate;
        }
        count += 1;
    }
}
