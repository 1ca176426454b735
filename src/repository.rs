//! The served directory and every filesystem operation performed on it.
//!
//! Names handed to this module must already have passed
//! [`crate::validate::is_acceptable`]; nothing here re-checks them.

use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempPath;
use tokio::fs;
use tokio::io::{AsyncRead, AsyncWriteExt};
use tracing::{debug, info, warn};

use crate::error::ShareError;
use crate::mime;

const STAGING_PREFIX: &str = ".lanshare-";
const STAGING_SUFFIX: &str = ".part";

/// A file in the served directory, computed on demand.
#[derive(Debug, Clone)]
pub struct FileEntry {
    pub name: String,
    pub size: u64,
    pub content_type: &'static str,
}

/// Bytes waiting to be written into the served directory.
#[derive(Debug)]
pub enum UploadSource {
    /// A staging file owned by us; removed once written.
    Staged(TempPath),
    /// A file owned by someone else; copied and left untouched.
    Borrowed(PathBuf),
}

#[derive(Debug, Clone)]
pub struct FileRepository {
    root: PathBuf,
    staging: PathBuf,
}

impl FileRepository {
    pub fn new(root: PathBuf, staging: PathBuf) -> Self {
        Self { root, staging }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the served and staging directories if they are missing.
    pub async fn ensure_exists(&self) -> io::Result<()> {
        fs::create_dir_all(&self.root).await?;
        fs::create_dir_all(&self.staging).await?;
        Ok(())
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Names currently in the directory, in enumeration order.
    ///
    /// Never fails: an unreadable directory lists as empty.
    pub async fn list(&self) -> Vec<String> {
        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(err) => {
                warn!("Cannot read {}: {}", self.root.display(), err);
                return Vec::new();
            }
        };

        let mut names = Vec::new();
        loop {
            match entries.next_entry().await {
                Ok(Some(entry)) => names.push(entry.file_name().to_string_lossy().into_owned()),
                Ok(None) => break,
                Err(err) => {
                    warn!("Directory listing interrupted: {}", err);
                    break;
                }
            }
        }

        debug!("Listed {} entries", names.len());
        names
    }

    pub async fn contains(&self, name: &str) -> bool {
        fs::symlink_metadata(self.path_for(name)).await.is_ok()
    }

    /// Open a regular file for streaming.
    ///
    /// Size and content type describe the opened handle, so a concurrent
    /// overwrite cannot make them disagree with the bytes that are streamed.
    pub async fn read(&self, name: &str) -> Result<(fs::File, FileEntry), ShareError> {
        let file = fs::File::open(self.path_for(name))
            .await
            .map_err(not_found_or_io)?;
        let metadata = file.metadata().await?;

        if !metadata.is_file() {
            return Err(ShareError::NotFound);
        }

        let entry = FileEntry {
            name: name.to_string(),
            size: metadata.len(),
            content_type: mime::resolve(name),
        };
        Ok((file, entry))
    }

    /// Buffer a stream into a fresh staging file and report the byte count.
    ///
    /// The staging file is removed when the returned path is dropped.
    pub async fn stage<R>(&self, reader: &mut R) -> io::Result<(TempPath, u64)>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        let temp = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .suffix(STAGING_SUFFIX)
            .tempfile_in(&self.staging)?;
        let (file, path) = temp.into_parts();

        let mut file = fs::File::from_std(file);
        let written = tokio::io::copy(reader, &mut file).await?;
        file.flush().await?;

        Ok((path, written))
    }

    /// Create or overwrite `name` from `source`, returning the final size.
    pub async fn write(&self, name: &str, source: UploadSource) -> Result<u64, ShareError> {
        let dest = self.path_for(name);

        match source {
            UploadSource::Staged(temp) => {
                if let Err(err) = temp.persist(&dest) {
                    debug!("Rename into place failed ({}), copying instead", err.error);
                    let temp = err.path;
                    fs::copy(&temp, &dest).await?;
                    if let Err(err) = temp.close() {
                        warn!("Failed to remove staging file: {}", err);
                    }
                }
            }
            UploadSource::Borrowed(path) => {
                fs::copy(&path, &dest).await?;
            }
        }

        let size = fs::metadata(&dest).await?.len();
        info!("Stored {} ({} bytes)", name, size);
        Ok(size)
    }

    pub async fn delete(&self, name: &str) -> Result<(), ShareError> {
        let path = self.path_for(name);

        fs::symlink_metadata(&path)
            .await
            .map_err(not_found_or_io)?;
        fs::remove_file(&path).await.map_err(not_found_or_io)?;

        info!("Deleted {}", name);
        Ok(())
    }
}

fn not_found_or_io(err: io::Error) -> ShareError {
    if err.kind() == io::ErrorKind::NotFound {
        ShareError::NotFound
    } else {
        ShareError::Io(err)
    }
}
