use std::{
    fmt,
    fs::OpenOptions,
    io::{self, Write},
    path::PathBuf,
    time::{SystemTime, UNIX_EPOCH},
};

/// Appends `[<unix seconds>] <message>` lines to a file.
///
/// The file is only created once something is recorded.
pub struct ErrorLog {
    path: PathBuf,
}

impl ErrorLog {
    pub fn new(path: impl Into<PathBuf>) -> ErrorLog {
        ErrorLog { path: path.into() }
    }

    /// Failing to write the log is reported, but never fatal.
    pub fn record(&self, message: impl fmt::Display) {
        if let Err(error) = self.append(&message) {
            eprintln!("warning: failed to write {}: {error}", self.path.display());
        }
    }

    fn append(&self, message: &dyn fmt::Display) -> io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| elapsed.as_secs());
        writeln!(file, "[{secs}] {message}")
    }
}
