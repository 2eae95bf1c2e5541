//! File and directory comparison with a bounded result cache.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::debug;
use walkdir::WalkDir;

use crate::path::normalize_path;
use crate::spec::{
    CompareMode, EnumFileKind, FileSignature, FsError, Mode, Result, SpecCompareOptions,
};
use crate::util::map_walkdir_error;

type TypeCacheKey = (PathBuf, PathBuf, FileSignature, FileSignature, Mode);

/// Signature of `path`, following symlinks.
pub fn signature(path: &Path) -> Result<FileSignature> {
    let meta = fs::metadata(path).map_err(|e| FsError::io(path, e))?;
    Ok(FileSignature::from_metadata(&meta))
}

/// [`CompareEngine::compare_files`] on a fresh engine (no shared cache).
pub fn compare_files(path_file1: &Path, path_file2: &Path, mode: Mode) -> Result<bool> {
    CompareEngine::new().compare_files(path_file1, path_file2, mode)
}

/// [`CompareEngine::compare_directories`] on a fresh engine.
pub fn compare_directories(path_dir1: &Path, path_dir2: &Path, mode: Mode) -> Result<bool> {
    CompareEngine::new().compare_directories(path_dir1, path_dir2, mode)
}

/// Comparison engine owning a memo of earlier results.
///
/// Results are keyed by both paths, both signatures and the compare mode, so
/// a file changed on disk misses the cache on its own. The cache is cleared entirely once it
/// holds [`SpecCompareOptions::n_cache_entries_max`] entries.
#[derive(Debug, Default)]
pub struct CompareEngine {
    spec_cmp_options: SpecCompareOptions,
    cache: Mutex<HashMap<TypeCacheKey, bool>>,
}

impl CompareEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(spec_cmp_options: SpecCompareOptions) -> Self {
        Self {
            spec_cmp_options,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn options(&self) -> &SpecCompareOptions {
        &self.spec_cmp_options
    }

    /// Drop every cached result.
    pub fn clear(&self) {
        let mut cache = self.cache.lock();
        if !cache.is_empty() {
            debug!("compare cache cleared ({} entries)", cache.len());
        }
        cache.clear();
    }

    pub fn len(&self) -> usize {
        self.cache.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.lock().is_empty()
    }

    /// Compare two regular files.
    ///
    /// - `SHALLOW`: equal signatures are enough; with `BINARY` it instead
    ///   means "file1 is a byte prefix of file2".
    /// - `BINARY`: byte-wise, chunked.
    /// - `TEXT`: line-wise, optionally skipping blank pairs and ignoring case.
    ///
    /// Identical paths compare equal without touching the filesystem. Without
    /// a strategy flag the result is `false`.
    ///
    /// # Errors
    /// - [`FsError::UnsupportedMode`] for flags outside the compare family,
    ///   `SHALLOW|TEXT` or `BINARY|TEXT`.
    /// - [`FsError::InvalidArgument`] when either path is not a regular file.
    pub fn compare_files(
        &self,
        path_file1: &Path,
        path_file2: &Path,
        mode: Mode,
    ) -> Result<bool> {
        let mode_cmp = CompareMode::try_from(mode)?;
        let path_file1 = normalize_path(path_file1)?;
        let path_file2 = normalize_path(path_file2)?;
        if path_file1 == path_file2 {
            return Ok(true);
        }

        let sig1 = regular_file_signature(&path_file1)?;
        let sig2 = regular_file_signature(&path_file2)?;
        if mode_cmp.if_shallow() && !mode_cmp.if_binary() && sig1 == sig2 {
            return Ok(true);
        }

        let key = (path_file1, path_file2, sig1, sig2, mode_cmp.mode());
        if let Some(&b_equal) = self.cache.lock().get(&key) {
            return Ok(b_equal);
        }

        let (path_file1, path_file2) = (&key.0, &key.1);
        let b_equal = if mode_cmp.if_binary() {
            self.compare_binary(
                path_file1,
                path_file2,
                sig1.size,
                sig2.size,
                mode_cmp.if_shallow(),
            )?
        } else if mode_cmp.if_text() {
            compare_text(path_file1, path_file2, mode_cmp)?
        } else {
            return Ok(false);
        };

        let mut cache = self.cache.lock();
        if cache.len() >= self.spec_cmp_options.n_cache_entries_max {
            debug!("compare cache full ({} entries), clearing", cache.len());
            cache.clear();
        }
        cache.insert(key, b_equal);
        Ok(b_equal)
    }

    /// Every file under `path_dir1` must have an equal counterpart at the same
    /// relative path under `path_dir2`. Extra files in `path_dir2` are not
    /// considered.
    pub fn compare_directories(
        &self,
        path_dir1: &Path,
        path_dir2: &Path,
        mode: Mode,
    ) -> Result<bool> {
        CompareMode::try_from(mode)?;
        let path_dir1 = normalize_path(path_dir1)?;
        let path_dir2 = normalize_path(path_dir2)?;
        if path_dir1 == path_dir2 {
            return Ok(true);
        }
        if !path_dir1.is_dir() || !path_dir2.is_dir() {
            return Ok(false);
        }

        for entry in WalkDir::new(&path_dir1).follow_links(true).sort_by_file_name() {
            let entry = entry.map_err(|e| map_walkdir_error(&path_dir1, e))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(path_rel) = entry.path().strip_prefix(&path_dir1) else {
                continue;
            };
            let path_counterpart = path_dir2.join(path_rel);
            if !path_counterpart.is_file() {
                debug!("no counterpart for {}", entry.path().display());
                return Ok(false);
            }
            if !self.compare_files(entry.path(), &path_counterpart, mode)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn compare_binary(
        &self,
        path_file1: &Path,
        path_file2: &Path,
        n_size1: u64,
        n_size2: u64,
        if_prefix: bool,
    ) -> Result<bool> {
        if (if_prefix && n_size1 > n_size2) || (!if_prefix && n_size1 != n_size2) {
            return Ok(false);
        }
        let mut fp1 = File::open(path_file1).map_err(|e| FsError::io(path_file1, e))?;
        let mut fp2 = File::open(path_file2).map_err(|e| FsError::io(path_file2, e))?;
        let n_buffer = self.spec_cmp_options.n_buffer_size.max(1);
        let mut buf1 = vec![0u8; n_buffer];
        let mut buf2 = vec![0u8; n_buffer];
        loop {
            let n_read1 = read_full(&mut fp1, &mut buf1).map_err(|e| FsError::io(path_file1, e))?;
            if n_read1 == 0 {
                return Ok(true);
            }
            let n_read2 = read_full(&mut fp2, &mut buf2[..n_read1])
                .map_err(|e| FsError::io(path_file2, e))?;
            if n_read2 != n_read1 || buf1[..n_read1] != buf2[..n_read1] {
                return Ok(false);
            }
        }
    }
}

fn regular_file_signature(path: &Path) -> Result<FileSignature> {
    let sig = match signature(path) {
        Ok(v) => v,
        Err(FsError::Io { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
            return Err(FsError::InvalidArgument(format!(
                "'{}' not found.",
                path.display()
            )));
        }
        Err(e) => return Err(e),
    };
    if sig.kind != EnumFileKind::File {
        return Err(FsError::InvalidArgument(format!(
            "'{}' is not a regular file.",
            path.display()
        )));
    }
    Ok(sig)
}

/// Fill `buf` unless EOF comes first; returns the number of bytes read.
fn read_full(reader: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut n_filled = 0;
    while n_filled < buf.len() {
        match reader.read(&mut buf[n_filled..]) {
            Ok(0) => break,
            Ok(n) => n_filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(n_filled)
}

fn read_lines(path: &Path) -> Result<Vec<String>> {
    let fp = File::open(path).map_err(|e| FsError::io(path, e))?;
    let mut reader = BufReader::new(fp);
    let mut l_lines = Vec::new();
    let mut raw_line = Vec::new();
    loop {
        raw_line.clear();
        let n_read = reader
            .read_until(b'\n', &mut raw_line)
            .map_err(|e| FsError::io(path, e))?;
        if n_read == 0 {
            break;
        }
        if raw_line.last() == Some(&b'\n') {
            raw_line.pop();
            if raw_line.last() == Some(&b'\r') {
                raw_line.pop();
            }
        }
        l_lines.push(String::from_utf8_lossy(&raw_line).into_owned());
    }
    Ok(l_lines)
}

fn compare_text(path_file1: &Path, path_file2: &Path, mode_cmp: CompareMode) -> Result<bool> {
    let l_lines1 = read_lines(path_file1)?;
    let l_lines2 = read_lines(path_file2)?;
    if l_lines1.len() != l_lines2.len() {
        return Ok(false);
    }
    for (c_line1, c_line2) in l_lines1.iter().zip(&l_lines2) {
        if mode_cmp.if_ignore_blank_lines()
            && c_line1.trim().is_empty()
            && c_line2.trim().is_empty()
        {
            continue;
        }
        let b_equal = if mode_cmp.if_ignore_case() {
            c_line1.to_lowercase() == c_line2.to_lowercase()
        } else {
            c_line1 == c_line2
        };
        if !b_equal {
            return Ok(false);
        }
    }
    Ok(true)
}
