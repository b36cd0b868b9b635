use std::fs::File;
use std::io;
use std::path::Path;

/// Open the file only if necessary. Closed automatically when this object
/// goes out of scope. Used by `ByteCompare`, where a representative's file
/// handle stays open across comparisons with several candidates but
/// should never be opened before the first comparison actually needs it.
pub struct LazyFile<'a> {
    path: &'a Path,
    file: Option<File>,
}

impl<'a> LazyFile<'a> {
    pub fn new(path: &'a Path) -> Self {
        LazyFile { path, file: None }
    }

    pub fn fd(&mut self) -> io::Result<&mut File> {
        if self.file.is_none() {
            self.file = Some(File::open(self.path)?);
        }
        Ok(self.file.as_mut().unwrap())
    }
}
