use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;

use pyo3::create_exception;
use pyo3::exceptions::{PyException, PyOSError, PyPermissionError};
use pyo3::prelude::*;
use ust_io_fs::conf::{C_MODE_NAME_NOSET, C_MODE_NAME_REPLACE, TUP_MODE_FLAG_NAMES};
use ust_io_fs::{CompareEngine, FsError, Mode, PathSpec, ReportFs};

create_exception!(_ust_io_fs_rs, FileHandlingError, PyException);
create_exception!(_ust_io_fs_rs, FileRemoveError, FileHandlingError);
create_exception!(_ust_io_fs_rs, FileMoveError, FileHandlingError);
create_exception!(_ust_io_fs_rs, ParameterError, PyException);
create_exception!(_ust_io_fs_rs, UnsupportedModeError, ParameterError);
create_exception!(_ust_io_fs_rs, InvalidArgType, ParameterError);

/// `str` (literal path or glob), `list[str]` or `set[str]`.
#[derive(Debug, FromPyObject)]
enum PySource {
    Single(String),
    Many(Vec<String>),
    Set(HashSet<String>),
}

impl From<PySource> for PathSpec {
    fn from(source: PySource) -> Self {
        match source {
            PySource::Single(value) => PathSpec::parse(&value),
            PySource::Many(l_values) => {
                PathSpec::Many(l_values.into_iter().map(PathBuf::from).collect())
            }
            PySource::Set(set_values) => {
                PathSpec::Set(set_values.into_iter().map(PathBuf::from).collect())
            }
        }
    }
}

#[pyclass(name = "ReportFs", frozen)]
#[derive(Debug, Clone)]
struct PyReportFs {
    #[pyo3(get)]
    cnt_resolved: u64,
    #[pyo3(get)]
    cnt_copied: u64,
    #[pyo3(get)]
    cnt_skipped: u64,
    #[pyo3(get)]
    cnt_removed: u64,
    #[pyo3(get)]
    cnt_moved: u64,
    #[pyo3(get)]
    warnings: Vec<String>,
}

impl From<ReportFs> for PyReportFs {
    fn from(report_fs: ReportFs) -> Self {
        Self {
            cnt_resolved: report_fs.cnt_resolved,
            cnt_copied: report_fs.cnt_copied,
            cnt_skipped: report_fs.cnt_skipped,
            cnt_removed: report_fs.cnt_removed,
            cnt_moved: report_fs.cnt_moved,
            warnings: report_fs.warnings,
        }
    }
}

impl PyReportFs {
    fn to_report(&self) -> ReportFs {
        ReportFs {
            cnt_resolved: self.cnt_resolved,
            cnt_copied: self.cnt_copied,
            cnt_skipped: self.cnt_skipped,
            cnt_removed: self.cnt_removed,
            cnt_moved: self.cnt_moved,
            warnings: self.warnings.clone(),
        }
    }
}

#[pymethods]
impl PyReportFs {
    #[getter]
    fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    fn to_dict(&self) -> BTreeMap<String, u64> {
        self.to_report().to_dict()
    }

    #[pyo3(signature = (prefix = "[FS]"))]
    fn format(&self, prefix: &str) -> String {
        self.to_report().format(prefix)
    }

    fn __str__(&self) -> String {
        self.format("[FS]")
    }
}

fn map_fs_error(exception: FsError) -> PyErr {
    let message = exception.to_string();
    match exception {
        FsError::PermissionDenied(_) => PyPermissionError::new_err(message),
        FsError::OsError { .. } | FsError::Io { .. } => PyOSError::new_err(message),
        FsError::FileRemoveError(_) => FileRemoveError::new_err(message),
        FsError::FileMoveError(_) => FileMoveError::new_err(message),
        FsError::UnsupportedMode { .. } => UnsupportedModeError::new_err(message),
        FsError::InvalidArgument(_) => InvalidArgType::new_err(message),
        FsError::ParameterError(_) => ParameterError::new_err(message),
    }
}

/// Unknown bits are kept so that dispatch reports them as unsupported.
fn parse_mode(mode: u32) -> Mode {
    Mode::from_bits(mode)
}

#[pyfunction(name = "copy")]
#[pyo3(signature = (src, dest, mode = Mode::REPLACE.bits()))]
fn copy_py(py: Python<'_>, src: PySource, dest: PathBuf, mode: u32) -> PyResult<PyReportFs> {
    let spec_src = PathSpec::from(src);
    let report_fs = py.allow_threads(|| ust_io_fs::copy(spec_src, dest, parse_mode(mode)));
    Ok(PyReportFs::from(report_fs.map_err(map_fs_error)?))
}

#[pyfunction(name = "move")]
#[pyo3(signature = (src, dest, mode = Mode::FORCE.bits()))]
fn move_py(py: Python<'_>, src: PySource, dest: PathBuf, mode: u32) -> PyResult<PyReportFs> {
    let spec_src = PathSpec::from(src);
    let report_fs = py.allow_threads(|| ust_io_fs::move_to(spec_src, dest, parse_mode(mode)));
    Ok(PyReportFs::from(report_fs.map_err(map_fs_error)?))
}

#[pyfunction(name = "remove")]
#[pyo3(signature = (src, mode = Mode::NOSET.bits()))]
fn remove_py(py: Python<'_>, src: PySource, mode: u32) -> PyResult<PyReportFs> {
    let spec_src = PathSpec::from(src);
    let report_fs = py.allow_threads(|| ust_io_fs::remove(spec_src, parse_mode(mode)));
    Ok(PyReportFs::from(report_fs.map_err(map_fs_error)?))
}

#[pyfunction(name = "grep")]
#[pyo3(signature = (anchor, regex, index = 0))]
fn grep_py(py: Python<'_>, anchor: String, regex: String, index: isize) -> PyResult<Vec<String>> {
    py.allow_threads(|| ust_io_fs::grep(&anchor, regex.as_str(), index))
        .map_err(map_fs_error)
}

#[pyfunction(name = "cmpfile")]
fn cmpfile_py(py: Python<'_>, file1: PathBuf, file2: PathBuf, mode: u32) -> PyResult<bool> {
    py.allow_threads(|| ust_io_fs::compare_files(&file1, &file2, parse_mode(mode)))
        .map_err(map_fs_error)
}

#[pyfunction(name = "cmpdir")]
fn cmpdir_py(py: Python<'_>, dir1: PathBuf, dir2: PathBuf, mode: u32) -> PyResult<bool> {
    py.allow_threads(|| ust_io_fs::compare_directories(&dir1, &dir2, parse_mode(mode)))
        .map_err(map_fs_error)
}

#[pyfunction(name = "init_logging")]
#[pyo3(signature = (verbosity = 0, if_quiet = false))]
fn init_logging_py(verbosity: u8, if_quiet: bool) -> bool {
    ust_log::init(verbosity, if_quiet)
}

/// Comparison engine owning its own result cache.
#[pyclass(name = "CompareEngine", frozen)]
#[derive(Debug, Default)]
struct PyCompareEngine {
    engine: CompareEngine,
}

#[pymethods]
impl PyCompareEngine {
    #[new]
    fn new() -> Self {
        Self::default()
    }

    fn cmpfile(&self, py: Python<'_>, file1: PathBuf, file2: PathBuf, mode: u32) -> PyResult<bool> {
        let engine = &self.engine;
        py.allow_threads(|| engine.compare_files(&file1, &file2, parse_mode(mode)))
            .map_err(map_fs_error)
    }

    fn cmpdir(&self, py: Python<'_>, dir1: PathBuf, dir2: PathBuf, mode: u32) -> PyResult<bool> {
        let engine = &self.engine;
        py.allow_threads(|| engine.compare_directories(&dir1, &dir2, parse_mode(mode)))
            .map_err(map_fs_error)
    }

    /// Move through this engine so that its cache is dropped afterwards.
    #[pyo3(signature = (src, dest, mode = Mode::FORCE.bits()))]
    fn r#move(
        &self,
        py: Python<'_>,
        src: PySource,
        dest: PathBuf,
        mode: u32,
    ) -> PyResult<PyReportFs> {
        let engine = &self.engine;
        let spec_src = PathSpec::from(src);
        let report_fs = py.allow_threads(|| {
            ust_io_fs::move_with_cache(engine, spec_src, dest, parse_mode(mode))
        });
        Ok(PyReportFs::from(report_fs.map_err(map_fs_error)?))
    }

    fn clear(&self) {
        self.engine.clear();
    }

    fn __len__(&self) -> usize {
        self.engine.len()
    }
}

#[pymodule]
fn _ust_io_fs_rs(module: &Bound<'_, PyModule>) -> PyResult<()> {
    let py = module.py();
    module.add_class::<PyReportFs>()?;
    module.add_class::<PyCompareEngine>()?;
    module.add_function(wrap_pyfunction!(copy_py, module)?)?;
    module.add_function(wrap_pyfunction!(move_py, module)?)?;
    module.add_function(wrap_pyfunction!(remove_py, module)?)?;
    module.add_function(wrap_pyfunction!(grep_py, module)?)?;
    module.add_function(wrap_pyfunction!(cmpfile_py, module)?)?;
    module.add_function(wrap_pyfunction!(cmpdir_py, module)?)?;
    module.add_function(wrap_pyfunction!(init_logging_py, module)?)?;

    module.add("FileHandlingError", py.get_type::<FileHandlingError>())?;
    module.add("FileRemoveError", py.get_type::<FileRemoveError>())?;
    module.add("FileMoveError", py.get_type::<FileMoveError>())?;
    module.add("ParameterError", py.get_type::<ParameterError>())?;
    module.add("UnsupportedModeError", py.get_type::<UnsupportedModeError>())?;
    module.add("InvalidArgType", py.get_type::<InvalidArgType>())?;

    module.add(C_MODE_NAME_NOSET, Mode::NOSET.bits())?;
    module.add(C_MODE_NAME_REPLACE, Mode::REPLACE.bits())?;
    for (n_bits, c_name) in TUP_MODE_FLAG_NAMES {
        module.add(c_name, n_bits)?;
    }
    Ok(())
}

