//! Working directory layout.
//!
//! Every file the bridge produces lives under one per-run directory:
//!
//! ```text
//! <root>/
//!   conf/nginx.conf
//!   logs/error.log
//!   nginx.pid
//!   cert.pem      key.pem        (identity bundle)
//!   c2c-cert.pem  c2c-key.pem    (c2c bundle)
//!   ca.pem                       (only when a CA is published)
//! ```
//!
//! The rendered config sits at nginx's default `<prefix>/conf/nginx.conf`.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::BridgeError;
use crate::sds::BundleKind;

/// Mode for every file written into the layout.
pub const FILE_MODE: u32 = 0o644;

/// Fixed paths for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkingLayout {
    root: PathBuf,
}

impl WorkingLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create the directory tree. Existing directories are reused.
    pub fn create(&self) -> Result<(), BridgeError> {
        for dir in [self.root.clone(), self.conf_dir(), self.logs_dir()] {
            fs::create_dir_all(&dir).map_err(|source| BridgeError::Write {
                what: "directory",
                path: dir.clone(),
                source,
            })?;
        }
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn conf_dir(&self) -> PathBuf {
        self.root.join("conf")
    }

    pub fn conf_file(&self) -> PathBuf {
        self.conf_dir().join("nginx.conf")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }

    pub fn error_log(&self) -> PathBuf {
        self.logs_dir().join("error.log")
    }

    pub fn pid_file(&self) -> PathBuf {
        self.root.join("nginx.pid")
    }

    pub fn ca_file(&self) -> PathBuf {
        self.root.join("ca.pem")
    }

    pub fn cert_file(&self, kind: BundleKind) -> PathBuf {
        match kind {
            BundleKind::Identity => self.root.join("cert.pem"),
            BundleKind::C2c => self.root.join("c2c-cert.pem"),
        }
    }

    pub fn key_file(&self, kind: BundleKind) -> PathBuf {
        match kind {
            BundleKind::Identity => self.root.join("key.pem"),
            BundleKind::C2c => self.root.join("c2c-key.pem"),
        }
    }
}

/// Render a path the way nginx's config grammar accepts it: forward
/// slashes and no drive-letter prefix.
pub fn normalize_path(path: &Path) -> String {
    let raw = path.to_string_lossy().replace('\\', "/");
    let bytes = raw.as_bytes();
    if bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' {
        raw[2..].to_string()
    } else {
        raw
    }
}

/// Write `contents` to `path` with [`FILE_MODE`], replacing any previous file.
pub fn write_file(path: &Path, contents: &[u8], what: &'static str) -> Result<(), BridgeError> {
    let to_err = |source: std::io::Error| BridgeError::Write {
        what,
        path: path.to_path_buf(),
        source,
    };

    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(FILE_MODE);
    }

    let mut file = options.open(path).map_err(to_err)?;
    file.write_all(contents).map_err(to_err)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(FILE_MODE)).map_err(to_err)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_windows_paths() {
        assert_eq!(
            normalize_path(Path::new(r"C:\Users\vcap\AppData\Local\Temp\nginx-conf\cert.pem")),
            "/Users/vcap/AppData/Local/Temp/nginx-conf/cert.pem"
        );
        assert_eq!(normalize_path(Path::new("/tmp/nginx-conf/key.pem")), "/tmp/nginx-conf/key.pem");
        assert_eq!(normalize_path(Path::new(r"relative\ca.pem")), "relative/ca.pem");
    }

    #[test]
    fn test_bundle_paths_are_disjoint() {
        let layout = WorkingLayout::new("/run/bridge");
        assert_eq!(layout.cert_file(BundleKind::Identity), PathBuf::from("/run/bridge/cert.pem"));
        assert_eq!(layout.key_file(BundleKind::C2c), PathBuf::from("/run/bridge/c2c-key.pem"));
        assert_ne!(layout.cert_file(BundleKind::Identity), layout.cert_file(BundleKind::C2c));
        assert_eq!(layout.conf_file(), PathBuf::from("/run/bridge/conf/nginx.conf"));
    }

    #[test]
    fn test_create_and_write() {
        let dir = tempfile::tempdir().unwrap();
        let layout = WorkingLayout::new(dir.path().join("nginx-conf"));
        layout.create().unwrap();
        layout.create().unwrap();
        assert!(layout.conf_dir().is_dir());
        assert!(layout.logs_dir().is_dir());

        let path = layout.ca_file();
        write_file(&path, b"first", "ca cert").unwrap();
        write_file(&path, b"2nd", "ca cert").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "2nd");

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, FILE_MODE);
        }
    }

    #[test]
    fn test_write_into_missing_dir_fails() {
        let err = write_file(Path::new("not-a-real-dir/nginx.conf"), b"", "nginx config").unwrap_err();
        assert!(matches!(err, BridgeError::Write { what: "nginx config", .. }));
    }
}
