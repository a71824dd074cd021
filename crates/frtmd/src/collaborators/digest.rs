//! Placeholder analyzer that fingerprints the stored package.

use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

use frtm_runs::Platform;
use serde_json::json;
use sha2::{Digest, Sha256};

use super::{Analysis, Analyzer, AnalyzerError};

const READ_CHUNK_BYTES: usize = 64 * 1024;

/// Records the platform, byte size, and SHA-256 of the package.
#[derive(Debug, Clone, Copy, Default)]
pub struct DigestAnalyzer;

impl Analyzer for DigestAnalyzer {
    fn analyze(
        &self,
        platform: Platform,
        package: &Path,
    ) -> Result<Option<Analysis>, AnalyzerError> {
        let mut file = File::open(package).map_err(|error| {
            AnalyzerError::with_source(
                format!("cannot open package '{}'", package.display()),
                error,
            )
        })?;

        let mut hasher = Sha256::new();
        let mut size_bytes = 0_u64;
        let mut chunk = vec![0_u8; READ_CHUNK_BYTES];
        loop {
            let bytes_read = match file.read(&mut chunk) {
                Ok(0) => break,
                Ok(count) => count,
                Err(error) if error.kind() == ErrorKind::Interrupted => continue,
                Err(error) => {
                    return Err(AnalyzerError::with_source(
                        format!("cannot read package '{}'", package.display()),
                        error,
                    ));
                }
            };
            hasher.update(&chunk[..bytes_read]);
            size_bytes += bytes_read as u64;
        }

        Ok(Some(Analysis::new(json!({
            "platform": platform.as_str(),
            "sizeBytes": size_bytes,
            "sha256": format!("{:x}", hasher.finalize()),
        }))))
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn fingerprints_package_contents() {
        let dir = TempDir::new().expect("temp dir");
        let package = dir.path().join("app.apk");
        fs::write(&package, b"abc").expect("write package");

        let analysis = DigestAnalyzer
            .analyze(Platform::Apk, &package)
            .expect("analyze")
            .expect("analysis present");

        let document = analysis.as_value();
        assert_eq!(document["platform"], "apk");
        assert_eq!(document["sizeBytes"], 3);
        assert_eq!(
            document["sha256"],
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn missing_package_is_an_error() {
        let dir = TempDir::new().expect("temp dir");
        let error = DigestAnalyzer
            .analyze(Platform::Ipa, &dir.path().join("absent.ipa"))
            .expect_err("missing package");
        assert!(error.message().starts_with("cannot open package"));
    }
}
