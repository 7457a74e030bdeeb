use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::debug;

/// Writer-factory capability attached to every method descriptor.
pub trait MakeWriter: Send + Sync {
    /// Open a fresh destination named `file_name` under `output_dir`.
    ///
    /// An existing file is truncated.
    fn make_writer(&self, output_dir: &Path, file_name: &str) -> std::io::Result<Box<dyn Write>>;
}

/// Writes generated files to the local filesystem, creating the output
/// directory on demand.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileWriter;

impl MakeWriter for FileWriter {
    fn make_writer(&self, output_dir: &Path, file_name: &str) -> std::io::Result<Box<dyn Write>> {
        fs::create_dir_all(output_dir)?;
        let path = output_dir.join(file_name);
        debug!(path = %path.display(), "opening test writer");
        let file = File::create(path)?;
        Ok(Box::new(BufWriter::new(file)))
    }
}
