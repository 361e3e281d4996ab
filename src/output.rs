use std::fs::File;
use std::io::{self, BufWriter, Stdout, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Appends `expected_ext` unless the path already carries it.
pub fn create_path_with_extension(base_path: &Path, expected_ext: &str) -> PathBuf {
    match base_path.extension() {
        Some(existing_ext) if existing_ext == expected_ext => base_path.to_path_buf(),
        Some(_) => {
            let mut name = base_path.as_os_str().to_os_string();
            name.push(".");
            name.push(expected_ext);
            PathBuf::from(name)
        }
        None => base_path.with_extension(expected_ext),
    }
}

/// Buffered destination for converted traces.
pub enum TraceOutput {
    Stdout(BufWriter<Stdout>),
    File(BufWriter<File>),
}

impl TraceOutput {
    pub fn create(path: Option<&Path>, extension: &str) -> Result<Self> {
        let Some(path) = path else {
            return Ok(TraceOutput::Stdout(BufWriter::new(io::stdout())));
        };

        let path = create_path_with_extension(path, extension);
        log::info!("Writing {}", path.display());
        let file = File::create(&path)
            .with_context(|| format!("Cannot create output {}", path.display()))?;
        Ok(TraceOutput::File(BufWriter::new(file)))
    }
}

impl Write for TraceOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            TraceOutput::Stdout(w) => w.write(buf),
            TraceOutput::File(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            TraceOutput::Stdout(w) => w.flush(),
            TraceOutput::File(w) => w.flush(),
        }
    }
}
