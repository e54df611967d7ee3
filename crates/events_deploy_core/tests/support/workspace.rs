#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use events_deploy_core::DeployConfig;
use sha2::{Digest, Sha256};
use tempfile::TempDir;

/// A throwaway source tree plus a config pointing every local path into it.
pub struct TestWorkspace {
    dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        let workspace = Self {
            dir: tempfile::tempdir().expect("tempdir"),
        };
        fs::create_dir_all(workspace.source_dir()).expect("source dir");
        workspace.with_source(
            "lambda_handler.py",
            "def handler(event, context):\n    return {\"statusCode\": 200}\n",
        )
    }

    pub fn with_source(self, relative: &str, body: &str) -> Self {
        self.write(relative, body.as_bytes());
        self
    }

    /// Adds a source file of `len` pseudo-random bytes that deflate cannot shrink.
    pub fn with_incompressible_source(self, relative: &str, len: usize) -> Self {
        let mut bytes = Vec::with_capacity(len + 32);
        let mut block = Sha256::digest(relative.as_bytes());
        while bytes.len() < len {
            bytes.extend_from_slice(&block);
            block = Sha256::digest(block);
        }
        bytes.truncate(len);
        self.write(relative, &bytes);
        self
    }

    pub fn with_manifest(self) -> Self {
        self.write("requirements.txt", b"fastapi==0.104.1\nmangum==0.17.0\n");
        self
    }

    pub fn source_dir(&self) -> PathBuf {
        self.dir.path().join("backend")
    }

    pub fn artifact_path(&self) -> PathBuf {
        self.dir.path().join("lambda_function.zip")
    }

    pub fn config(&self) -> DeployConfig {
        let mut config = DeployConfig::default().with_source_dir(self.source_dir());
        config.artifact_path = self.artifact_path();
        config
    }

    fn write(&self, relative: &str, body: &[u8]) {
        let path = self.source_dir().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("parent dir");
        }
        fs::write(&path, body).expect("write source");
    }
}

pub fn exists(path: &Path) -> bool {
    path.try_exists().expect("stat")
}
