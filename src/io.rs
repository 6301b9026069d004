use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use anyhow::Context;
use tokio::fs::{create_dir_all, remove_file, rename, File};
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader, BufWriter};

use crate::models::Snapshot;

pub async fn prepare_io(data_dir: &Path) -> anyhow::Result<()> {
    create_dir_all(data_dir)
        .await
        .with_context(|| format!("cannot create data directory {}", data_dir.display()))
}

/// Reads the whole file, or `None` when it does not exist.
pub async fn read_io_file(path: &Path) -> anyhow::Result<Option<Vec<u8>>> {
    let file = match File::open(path).await {
        Ok(file) => file,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err).with_context(|| format!("cannot open {}", path.display())),
    };
    let mut bytes = Vec::new();
    BufReader::new(file).read_to_end(&mut bytes).await?;
    Ok(Some(bytes))
}

/// Loads the snapshot at `path`, or `None` when nothing was saved yet.
pub async fn read_snapshot(path: &Path) -> anyhow::Result<Option<Snapshot>> {
    let bytes = match read_io_file(path).await? {
        Some(bytes) => bytes,
        None => return Ok(None),
    };
    let snapshot = postcard::from_bytes::<Snapshot>(&bytes)
        .with_context(|| format!("corrupt snapshot {}", path.display()))?;
    Ok(Some(snapshot))
}

/// Writes next to `path` first and renames over it, so readers never see a
/// half-written snapshot.
pub async fn write_snapshot(path: &Path, snapshot: &Snapshot) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent).await?;
    }
    let bytes = postcard::to_allocvec(snapshot)?;

    let staging = staging_path(path);
    if let Err(err) = write_staged(&staging, path, &bytes).await {
        let _ = remove_file(&staging).await;
        return Err(err);
    }
    Ok(())
}

async fn write_staged(staging: &Path, path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    let mut writer = BufWriter::new(File::create(staging).await?);
    writer.write_all(bytes).await?;
    writer.flush().await?;
    writer.into_inner().sync_all().await?;

    rename(staging, path).await?;
    Ok(())
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}
