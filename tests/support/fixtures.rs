use std::fs;
use std::path::{Path, PathBuf};

/// Create `root/<label>` holding empty files named `files`.
pub fn label_dir(root: &Path, label: &str, files: &[&str]) -> PathBuf {
    let dir = root.join(label);
    fs::create_dir_all(&dir).expect("create label dir");
    for file in files {
        fs::write(dir.join(file), b"").expect("write example file");
    }
    dir
}
