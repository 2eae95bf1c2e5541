//! Move engine: same-directory rename or copy-then-remove.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::compare::{CompareEngine, signature};
use crate::copy::{copy_entry, file_name_of, generate_dirs};
use crate::dispatch::dispatch;
use crate::path::normalize_path;
use crate::remove::remove_entry;
use crate::report::{ReportFs, ReportFsBuilder};
use crate::spec::{
    FsError, Mode, PathSpec, RemoveMode, Result, SpecCopyOptions, TransferMode,
};

/// Move every source denoted by `spec_src` to `path_dst`.
///
/// [`Mode::FORCE`] is the usual choice; without it an existing destination
/// is an error.
pub fn move_to(
    spec_src: impl Into<PathSpec>,
    path_dst: impl AsRef<Path>,
    mode: Mode,
) -> Result<ReportFs> {
    let spec_src = spec_src.into();
    dispatch(
        &spec_src,
        path_dst.as_ref(),
        mode,
        Mode::outside(Mode::FAMILY_TRANSFER),
        |path_src, path_dst, mode, builder_fs_report| {
            move_entry(path_src, path_dst, TransferMode::try_from(mode)?, builder_fs_report)
        },
    )
}

/// [`move_to`], then drop every result cached by `engine`: moved paths may
/// now carry different content.
pub fn move_with_cache(
    engine: &CompareEngine,
    spec_src: impl Into<PathSpec>,
    path_dst: impl AsRef<Path>,
    mode: Mode,
) -> Result<ReportFs> {
    let result = move_to(spec_src, path_dst, mode);
    engine.clear();
    result
}

/// Move one source.
///
/// Within one parent directory this is a rename, after removing an existing
/// destination of the same node type (any type under `RECURSIVE`).
/// Elsewhere the source is copied with the same mode and then removed; a
/// failure in between leaves both copies.
///
/// Under `TARGET_DIRECTORY` the destination is a directory (created when
/// missing) and the source keeps its name inside it.
pub fn move_entry(
    path_src: &Path,
    path_dst: &Path,
    mode: TransferMode,
    builder_fs_report: &mut ReportFsBuilder,
) -> Result<()> {
    let path_src = normalize_path(path_src)?;
    let path_dst = normalize_path(path_dst)?;
    let path_dst = if mode.if_target_directory() {
        generate_dirs(&path_dst, true)?;
        path_dst.join(file_name_of(&path_src)?)
    } else {
        path_dst
    };
    if path_src == path_dst {
        return Err(FsError::InvalidArgument(format!(
            "Source and destination are the same file: '{}'",
            path_src.display()
        )));
    }

    let b_dst_exists = fs::symlink_metadata(&path_dst).is_ok();
    if b_dst_exists && !mode.if_force() {
        return Err(FsError::FileMoveError(format!(
            "Can't move '{}' to '{}': File exists.",
            path_src.display(),
            path_dst.display()
        )));
    }

    if let Some(path_parent) = path_dst.parent() {
        if !path_parent.as_os_str().is_empty() && !path_parent.exists() {
            fs::create_dir_all(path_parent).map_err(|e| FsError::io(path_parent, e))?;
            debug!("generated {}", path_parent.display());
        }
    }

    if path_src.parent() == path_dst.parent() {
        if b_dst_exists {
            let kind_src = signature(&path_src)?.kind;
            let kind_dst = signature(&path_dst)?.kind;
            if kind_src != kind_dst && !mode.if_recursive() {
                return Err(FsError::FileMoveError(format!(
                    "Can't move '{}' to '{}': Different file type.",
                    path_src.display(),
                    path_dst.display()
                )));
            }
            remove_entry(&path_dst, RemoveMode::default(), &mut ReportFsBuilder::default())?;
        }
        fs::rename(&path_src, &path_dst).map_err(|e| FsError::io(&path_src, e))?;
        debug!("renamed {} -> {}", path_src.display(), path_dst.display());
        builder_fs_report.add_moved();
        return Ok(());
    }

    // The destination is already resolved inside the target directory.
    let mode_cp = TransferMode::try_from(mode.mode().difference(Mode::TARGET_DIRECTORY))?;
    let mut builder_step = ReportFsBuilder::default();
    copy_entry(
        &path_src,
        &path_dst,
        mode_cp,
        &SpecCopyOptions::default(),
        &mut builder_step,
    )?;
    remove_entry(&path_src, RemoveMode::default(), &mut builder_step)?;
    debug!("moved {} -> {}", path_src.display(), path_dst.display());
    for c_warning in builder_step.warnings {
        builder_fs_report.add_warning(c_warning);
    }
    builder_fs_report.add_moved();
    Ok(())
}
