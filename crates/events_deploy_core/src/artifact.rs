//! Packages the function source tree plus its resolved dependencies into one zip.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::ArtifactError;

/// Largest zip the compute platform accepts in a direct upload (50 MiB).
pub const PLATFORM_CODE_CEILING_BYTES: u64 = 50 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildPlan {
    pub source_dir: PathBuf,
    pub manifest_path: PathBuf,
    /// Extension (without the dot) of runtime files copied from `source_dir`.
    pub source_extension: String,
    pub output_path: PathBuf,
}

/// A packaged bundle on local disk. The bytes never change after measuring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub path: PathBuf,
    pub bytes: Vec<u8>,
    pub size_bytes: u64,
    /// Hex SHA-256 of `bytes`.
    pub fingerprint: String,
}

impl Artifact {
    pub fn from_bytes(path: PathBuf, bytes: Vec<u8>) -> Self {
        let fingerprint = format!("{:x}", Sha256::digest(&bytes));
        Self {
            path,
            size_bytes: bytes.len() as u64,
            bytes,
            fingerprint,
        }
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "artifact.zip".to_string())
    }

    /// Deletes the local file. A file that is already gone is not an error.
    pub fn remove(&self) -> Result<(), ArtifactError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(ArtifactError::io(&self.path, error)),
        }
    }
}

/// Installs third-party dependencies listed in `manifest` into `staging`.
pub trait DependencyResolver {
    fn resolve(&self, manifest: &Path, staging: &Path) -> Result<(), ArtifactError>;
}

/// Runs `pip install -r <manifest> -t <staging>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipResolver {
    program: String,
}

impl Default for PipResolver {
    fn default() -> Self {
        Self::new("pip")
    }
}

impl PipResolver {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl DependencyResolver for PipResolver {
    fn resolve(&self, manifest: &Path, staging: &Path) -> Result<(), ArtifactError> {
        info!(program = %self.program, manifest = %manifest.display(), "resolving dependencies");
        let output = Command::new(&self.program)
            .arg("install")
            .arg("-r")
            .arg(manifest)
            .arg("-t")
            .arg(staging)
            .arg("--quiet")
            .output()
            .map_err(|error| {
                ArtifactError::DependencyResolution(format!(
                    "failed to run `{}`: {error}",
                    self.program
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ArtifactError::DependencyResolution(format!(
                "`{} install` exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }
        Ok(())
    }
}

pub fn build_artifact(
    plan: &BuildPlan,
    resolver: &dyn DependencyResolver,
) -> Result<Artifact, ArtifactError> {
    if !plan.source_dir.is_dir() {
        return Err(ArtifactError::MissingSourceDir(plan.source_dir.clone()));
    }

    let staging = tempfile::Builder::new()
        .prefix("events-artifact-")
        .tempdir()
        .map_err(|error| ArtifactError::io(std::env::temp_dir(), error))?;

    if plan.manifest_path.is_file() {
        resolver.resolve(&plan.manifest_path, staging.path())?;
    } else {
        info!(
            manifest = %plan.manifest_path.display(),
            "no dependency manifest, packaging sources only"
        );
    }

    let extension = plan.source_extension.as_str();
    let sources = walk_files(&plan.source_dir, |path| {
        path.extension().and_then(|ext| ext.to_str()) == Some(extension)
    })?;
    for source in &sources {
        let Some(name) = source.file_name() else {
            continue;
        };
        let target = staging.path().join(name);
        if target.exists() {
            debug!(source = %source.display(), "flattened source overwrites an earlier file");
        }
        fs::copy(source, &target).map_err(|error| ArtifactError::io(source, error))?;
    }

    write_archive(staging.path(), &plan.output_path)?;

    let bytes =
        fs::read(&plan.output_path).map_err(|error| ArtifactError::io(&plan.output_path, error))?;
    let artifact = Artifact::from_bytes(plan.output_path.clone(), bytes);
    info!(
        path = %artifact.path.display(),
        size_bytes = artifact.size_bytes,
        source_files = sources.len(),
        "artifact built"
    );
    if artifact.size_bytes > PLATFORM_CODE_CEILING_BYTES {
        warn!(
            size_bytes = artifact.size_bytes,
            ceiling_bytes = PLATFORM_CODE_CEILING_BYTES,
            "artifact exceeds the direct upload ceiling"
        );
    }
    Ok(artifact)
}

fn write_archive(staging: &Path, output: &Path) -> Result<(), ArtifactError> {
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|error| ArtifactError::io(parent, error))?;
    }

    let file = fs::File::create(output).map_err(|error| ArtifactError::io(output, error))?;
    let mut zip = ZipWriter::new(file);
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o644);

    for path in walk_files(staging, |_| true)? {
        let relative = path.strip_prefix(staging).unwrap_or(&path);
        let entry_name = relative
            .components()
            .map(|part| part.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        let body = fs::read(&path).map_err(|error| ArtifactError::io(&path, error))?;
        zip.start_file(entry_name, options)?;
        zip.write_all(&body).map_err(|error| ArtifactError::io(output, error))?;
    }

    zip.finish()?;
    Ok(())
}

/// Files under `root` accepted by `keep`, sorted for reproducible archives.
fn walk_files(root: &Path, keep: impl Fn(&Path) -> bool) -> Result<Vec<PathBuf>, ArtifactError> {
    let mut found = Vec::new();
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        let entries = fs::read_dir(&dir).map_err(|error| ArtifactError::io(&dir, error))?;
        for entry in entries {
            let entry = entry.map_err(|error| ArtifactError::io(&dir, error))?;
            let file_type = entry
                .file_type()
                .map_err(|error| ArtifactError::io(&dir, error))?;
            let path = entry.path();
            // Symlinked directories are skipped, never descended.
            if file_type.is_dir() {
                pending.push(path);
            } else if !path.is_dir() && keep(&path) {
                found.push(path);
            }
        }
    }
    found.sort();
    Ok(found)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::test_helpers::{FailingResolver, StaticResolver};

    fn plan_in(root: &Path) -> BuildPlan {
        BuildPlan {
            source_dir: root.join("backend"),
            manifest_path: root.join("backend/requirements.txt"),
            source_extension: "py".to_string(),
            output_path: root.join("out/lambda_function.zip"),
        }
    }

    fn write(path: &Path, body: &str) {
        fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        fs::write(path, body).expect("write");
    }

    fn entry_names(path: &Path) -> BTreeSet<String> {
        let file = fs::File::open(path).expect("open zip");
        let archive = zip::ZipArchive::new(file).expect("read zip");
        archive.file_names().map(str::to_string).collect()
    }

    #[test]
    fn flattens_sources_next_to_dependencies() {
        let root = tempfile::tempdir().expect("tempdir");
        let plan = plan_in(root.path());
        write(&plan.source_dir.join("lambda_handler.py"), "def handler(e, c): pass");
        write(&plan.source_dir.join("app/main.py"), "app = None");
        write(&plan.source_dir.join("README.md"), "not packaged");
        write(&plan.manifest_path, "fastapi\n");

        let resolver = StaticResolver::new(vec![("fastapi/__init__.py", "")]);
        let artifact = build_artifact(&plan, &resolver).expect("build should succeed");

        assert_eq!(
            entry_names(&artifact.path),
            BTreeSet::from([
                "fastapi/__init__.py".to_string(),
                "lambda_handler.py".to_string(),
                "main.py".to_string(),
            ])
        );
        assert_eq!(resolver.calls(), 1);
        assert_eq!(artifact.size_bytes, fs::metadata(&artifact.path).expect("meta").len());
        assert_eq!(artifact.fingerprint.len(), 64);
    }

    #[test]
    fn missing_manifest_skips_resolution() {
        let root = tempfile::tempdir().expect("tempdir");
        let plan = plan_in(root.path());
        write(&plan.source_dir.join("lambda_handler.py"), "");

        let resolver = StaticResolver::new(Vec::new());
        build_artifact(&plan, &resolver).expect("build should succeed");
        assert_eq!(resolver.calls(), 0);
    }

    #[test]
    fn resolution_failure_aborts_before_writing_output() {
        let root = tempfile::tempdir().expect("tempdir");
        let plan = plan_in(root.path());
        write(&plan.source_dir.join("lambda_handler.py"), "");
        write(&plan.manifest_path, "nonexistent-package==0.0.0\n");

        let error = build_artifact(&plan, &FailingResolver::new("no matching distribution"))
            .expect_err("resolution failure is fatal");

        assert!(matches!(error, ArtifactError::DependencyResolution(_)));
        assert!(!plan.output_path.exists());
    }

    #[test]
    fn missing_source_dir_is_reported() {
        let root = tempfile::tempdir().expect("tempdir");
        let plan = plan_in(root.path());

        let error = build_artifact(&plan, &StaticResolver::new(Vec::new()))
            .expect_err("no source tree");
        assert!(matches!(error, ArtifactError::MissingSourceDir(_)));
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_directory_loop_is_not_followed() {
        let root = tempfile::tempdir().expect("tempdir");
        let plan = plan_in(root.path());
        write(&plan.source_dir.join("lambda_handler.py"), "");
        std::os::unix::fs::symlink(&plan.source_dir, plan.source_dir.join("loop"))
            .expect("symlink");

        let artifact = build_artifact(&plan, &StaticResolver::new(Vec::new()))
            .expect("build should finish");

        assert_eq!(
            entry_names(&artifact.path),
            BTreeSet::from(["lambda_handler.py".to_string()])
        );
    }

    #[test]
    fn remove_tolerates_missing_file() {
        let root = tempfile::tempdir().expect("tempdir");
        let artifact = Artifact::from_bytes(root.path().join("gone.zip"), vec![1, 2, 3]);
        artifact.remove().expect("missing file is fine");
        assert_eq!(artifact.file_name(), "gone.zip");
    }
}
