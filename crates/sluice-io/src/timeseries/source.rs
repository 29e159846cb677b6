use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

/// Opens time-series files for the readers.
pub trait FileSource {
    fn open(&self, path: &Path) -> io::Result<Box<dyn BufRead + '_>>;
}

/// Reads from the local file system.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsSource;

impl FileSource for FsSource {
    fn open(&self, path: &Path) -> io::Result<Box<dyn BufRead + '_>> {
        Ok(Box::new(BufReader::new(File::open(path)?)))
    }
}
