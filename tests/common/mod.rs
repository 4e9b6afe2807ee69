#![allow(dead_code)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use tempfile::TempDir;

/// Stand-in tools for ffmpeg, written once per test binary.
///
/// All scripts are created before the first spawn so no test execs a file
/// another thread still holds open for writing.
pub struct FakeTools {
    dir: TempDir,
}

impl FakeTools {
    /// Echoes each argument on its own stderr line, copies stdin to stdout
    pub fn echo(&self) -> String {
        self.path("echo.sh")
    }

    /// Drains stdin and exits with status 3
    pub fn fail(&self) -> String {
        self.path("fail.sh")
    }

    /// Ignores stdin, writes "one", "two", "three" to stdout in separate writes
    pub fn chunks(&self) -> String {
        self.path("chunks.sh")
    }

    /// Ignores stdin, writes "done" and exits at once
    pub fn done(&self) -> String {
        self.path("done.sh")
    }

    /// Writes one progress line to stderr, copies stdin to stdout
    pub fn noisy(&self) -> String {
        self.path("noisy.sh")
    }

    fn path(&self, name: &str) -> String {
        self.dir.path().join(name).to_string_lossy().to_string()
    }
}

const ECHO: &str = "#!/bin/sh\nfor arg in \"$@\"; do printf '%s\\n' \"$arg\" >&2; done\nexec cat\n";
const FAIL: &str = "#!/bin/sh\ncat >/dev/null\nexit 3\n";
const CHUNKS: &str = "#!/bin/sh\nprintf one\nsleep 0.05\nprintf two\nsleep 0.05\nprintf three\n";

const DONE: &str = "#!/bin/sh\nprintf done\n";
const NOISY: &str = "#!/bin/sh\nprintf 'frame=42 speed=1.0x\\n' >&2\nexec cat\n";

fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, body).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

pub fn tools() -> &'static FakeTools {
    static TOOLS: OnceLock<FakeTools> = OnceLock::new();
    TOOLS.get_or_init(|| {
        let dir = tempfile::tempdir().unwrap();
        write_script(dir.path(), "echo.sh", ECHO);
        write_script(dir.path(), "fail.sh", FAIL);
        write_script(dir.path(), "chunks.sh", CHUNKS);
        write_script(dir.path(), "done.sh", DONE);
        write_script(dir.path(), "noisy.sh", NOISY);
        FakeTools { dir }
    })
}
