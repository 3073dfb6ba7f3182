use crate::error::{BenchError, Result};
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> BenchError + '_ {
    move |source| BenchError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Reads a whole input file into memory.
///
/// Empty files are rejected, the buffer is reserved up front and the file
/// handle is closed before returning.
pub fn load_input<P: AsRef<Path>>(path: P) -> Result<Vec<u8>> {
    let path = path.as_ref();
    let mut file = File::open(path).map_err(io_error(path))?;
    let len = file.metadata().map_err(io_error(path))?.len();
    if len == 0 {
        return Err(BenchError::InvalidConfiguration(format!(
            "invalid file size: {} is empty",
            path.display()
        )));
    }
    let len = usize::try_from(len)
        .ok()
        .filter(|&len| u32::try_from(len).is_ok())
        .ok_or_else(|| {
            BenchError::InvalidConfiguration(format!(
                "invalid file size: {} holds {len} bytes, more than 4 GiB",
                path.display()
            ))
        })?;

    let mut data = Vec::new();
    data.try_reserve_exact(len)
        .map_err(|_| BenchError::AllocationFailure { bytes: len })?;
    file.read_to_end(&mut data).map_err(io_error(path))?;
    Ok(data)
}

/// Lists the regular files in `dir`, sorted by path.
pub fn input_files<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_error(dir))? {
        let path = entry.map_err(io_error(dir))?.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// File name used to label results.
pub fn input_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
