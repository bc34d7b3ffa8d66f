use std::io::Read;
use std::path::{Path, PathBuf};

use futures::future::try_join_all;
use tracing::debug;

use crate::error::IngestError;

/// Recognized compression suffixes and their codecs. Selection is by
/// suffix only; file content is never sniffed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Codec {
  Gzip,
  Brotli,
}

fn codec_for(name: &str) -> Option<(Codec, &str)> {
  if let Some(stem) = name.strip_suffix(".gz") {
    Some((Codec::Gzip, stem))
  } else if let Some(stem) = name.strip_suffix(".br") {
    Some((Codec::Brotli, stem))
  } else {
    None
  }
}

/// Decompress every `.gz` and `.br` file directly under `dir`, replacing
/// each with its decompressed content and deleting the compressed
/// original.
///
/// All entries are launched as independent futures and joined at the end;
/// the aggregate fails on the first individual failure. In-flight siblings
/// are not cancelled, they just run to completion unobserved. Entries with
/// no recognized suffix are trivial no-ops so the join sees uniform
/// results.
pub async fn decompress_dir(dir: &Path) -> Result<(), IngestError> {
  let mut jobs = Vec::new();
  let mut entries = tokio::fs::read_dir(dir).await?;

  while let Some(entry) = entries.next_entry().await? {
    jobs.push(decompress_entry(entry.path()));
  }

  try_join_all(jobs).await?;
  Ok(())
}

async fn decompress_entry(path: PathBuf) -> Result<(), IngestError> {
  let Some(name) = path.file_name().and_then(|n| n.to_str()).map(str::to_string) else {
    return Ok(());
  };
  let Some((codec, stem)) = codec_for(&name) else {
    return Ok(());
  };
  let target = path.with_file_name(stem);

  let compressed = tokio::fs::read(&path).await?;
  let decompressed = tokio::task::spawn_blocking(move || decode(codec, &compressed))
    .await
    .map_err(|e| IngestError::Decompress {
      name: name.clone(),
      source: std::io::Error::other(e),
    })?
    .map_err(|source| IngestError::Decompress {
      name: name.clone(),
      source,
    })?;

  tokio::fs::write(&target, decompressed).await?;
  tokio::fs::remove_file(&path).await?;
  debug!("decompressed {name} -> {}", target.display());
  Ok(())
}

fn decode(codec: Codec, data: &[u8]) -> std::io::Result<Vec<u8>> {
  let mut out = Vec::new();
  match codec {
    Codec::Gzip => {
      flate2::read::GzDecoder::new(data).read_to_end(&mut out)?;
    }
    Codec::Brotli => {
      brotli::Decompressor::new(data, 4096).read_to_end(&mut out)?;
    }
  }
  Ok(out)
}

#[cfg(test)]
mod tests {
  use std::io::Write;

  use tempfile::TempDir;

  use super::*;

  fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
  }

  fn brotli_compress(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    {
      let mut writer = brotli::CompressorWriter::new(&mut out, 4096, 5, 22);
      writer.write_all(data).unwrap();
    }
    out
  }

  #[tokio::test]
  async fn gzip_round_trip_removes_original() {
    let tmp = TempDir::new().unwrap();
    let original = b"wasm module bytes".to_vec();
    std::fs::write(tmp.path().join("game.wasm.gz"), gzip(&original)).unwrap();

    decompress_dir(tmp.path()).await.unwrap();

    assert_eq!(std::fs::read(tmp.path().join("game.wasm")).unwrap(), original);
    assert!(!tmp.path().join("game.wasm.gz").exists());
  }

  #[tokio::test]
  async fn brotli_round_trip_removes_original() {
    let tmp = TempDir::new().unwrap();
    let original = b"framework script".to_vec();
    std::fs::write(tmp.path().join("game.framework.js.br"), brotli_compress(&original)).unwrap();

    decompress_dir(tmp.path()).await.unwrap();

    assert_eq!(
      std::fs::read(tmp.path().join("game.framework.js")).unwrap(),
      original
    );
    assert!(!tmp.path().join("game.framework.js.br").exists());
  }

  #[tokio::test]
  async fn unrecognized_files_pass_through() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join("game.loader.js"), b"loader").unwrap();
    std::fs::write(tmp.path().join("game.data"), b"data").unwrap();

    decompress_dir(tmp.path()).await.unwrap();

    assert_eq!(std::fs::read(tmp.path().join("game.loader.js")).unwrap(), b"loader");
    assert_eq!(std::fs::read(tmp.path().join("game.data")).unwrap(), b"data");
  }

  #[tokio::test]
  async fn corrupt_entry_fails_the_aggregate() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join("good.data.gz"), gzip(b"fine")).unwrap();
    std::fs::write(tmp.path().join("bad.wasm.gz"), b"not gzip at all").unwrap();

    let err = decompress_dir(tmp.path()).await.unwrap_err();
    assert!(matches!(err, IngestError::Decompress { .. }));
  }
}
