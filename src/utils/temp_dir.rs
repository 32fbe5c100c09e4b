use std::{
    env, fs,
    ops::Deref,
    path::{Path, PathBuf},
    process,
    sync::atomic::{AtomicUsize, Ordering},
};

static NEXT_ID: AtomicUsize = AtomicUsize::new(0);

/// Scratch directory under the system temp dir that is removed on drop.  The
/// process id and a counter are appended to the requested name so tests
/// running in parallel never share a directory.
pub struct TempDir(PathBuf);

impl TempDir {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let mut name = path.as_ref().as_os_str().to_owned();
        name.push(format!(
            "-{}-{}",
            process::id(),
            NEXT_ID.fetch_add(1, Ordering::SeqCst)
        ));
        let path = env::temp_dir().join(name);
        if path.exists() {
            let _ = fs::remove_dir_all(&path);
        }
        fs::create_dir_all(&path).unwrap();
        Self(path)
    }
}

impl Deref for TempDir {
    type Target = PathBuf;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.0);
    }
}
