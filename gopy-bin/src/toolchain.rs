use std::{
    io::Write,
    path::Path,
    process::{Command, ExitStatus},
    thread,
    time::{Duration, Instant},
};

use anyhow::{bail, Context, Result};

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Builds and runs generated Go code. Child processes inherit stdio.
pub struct Toolchain<'a> {
    go: &'a Path,
    timeout: Duration,
}

impl<'a> Toolchain<'a> {
    pub fn new(go: &'a Path, timeout: Duration) -> Toolchain<'a> {
        Toolchain { go, timeout }
    }

    /// Writes `code` to a temporary file and runs `go build` on it.
    pub fn build(&self, code: &str, output: &Path) -> Result<()> {
        let mut file = tempfile::Builder::new()
            .prefix("gopy-")
            .suffix(".go")
            .tempfile()
            .context("failed to create a temporary Go file")?;
        file.write_all(code.as_bytes())
            .and_then(|()| file.flush())
            .context("failed to write the temporary Go file")?;

        let mut cmd = Command::new(self.go);
        cmd.arg("build").arg("-o").arg(output).arg(file.path());
        let status = self.wait(cmd, "go build")?;
        if !status.success() {
            bail!("go build failed ({status})");
        }
        Ok(())
    }

    pub fn run(&self, exe: &Path) -> Result<()> {
        let what = exe.display().to_string();
        let status = self.wait(Command::new(exe), &what)?;
        if !status.success() {
            bail!("{what} failed ({status})");
        }
        Ok(())
    }

    /// Spawns `cmd` and waits for it, killing it once the timeout elapses.
    fn wait(&self, mut cmd: Command, what: &str) -> Result<ExitStatus> {
        let mut child = cmd
            .spawn()
            .with_context(|| format!("failed to start {what}"))?;
        let deadline = Instant::now() + self.timeout;
        loop {
            if let Some(status) = child
                .try_wait()
                .with_context(|| format!("failed to wait for {what}"))?
            {
                return Ok(status);
            }
            if Instant::now() >= deadline {
                let _ = child.kill();
                let _ = child.wait();
                bail!("{what} timed out after {:?}", self.timeout);
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}
