//! Validation of package uploads.

use frtm_runs::{Platform, package_extension};

use super::JobError;

/// Media type every upload must be sent with.
pub const UPLOAD_CONTENT_TYPE: &str = "application/octet-stream";

/// An upload whose name and content type were accepted. The body has not
/// been read yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingUpload {
    file_name: String,
    platform: Platform,
    extension: String,
}

impl PendingUpload {
    /// Validates the decoded `filename` query value and the request's media
    /// type.
    ///
    /// Only the final path component of `file_name` is kept.
    ///
    /// # Errors
    ///
    /// Returns [`JobError::MissingFileName`] for an absent or blank name,
    /// [`JobError::UnsupportedExtension`] for an unknown package type, and
    /// [`JobError::UnsupportedContentType`] for anything other than raw
    /// bytes.
    pub fn validate(
        file_name: Option<&str>,
        content_type: Option<&str>,
    ) -> Result<Self, JobError> {
        let file_name = file_name
            .map(base_name)
            .filter(|name| !name.is_empty())
            .ok_or(JobError::MissingFileName)?;

        let (platform, extension) = package_extension(file_name)
            .and_then(|extension| {
                Platform::from_extension(&extension).map(|platform| (platform, extension))
            })
            .ok_or_else(|| JobError::UnsupportedExtension {
                file_name: file_name.to_owned(),
            })?;

        match content_type {
            Some(media_type) if media_type.eq_ignore_ascii_case(UPLOAD_CONTENT_TYPE) => {}
            other => {
                return Err(JobError::UnsupportedContentType {
                    content_type: other.unwrap_or("none").to_owned(),
                });
            }
        }

        Ok(Self {
            file_name: file_name.to_owned(),
            platform,
            extension,
        })
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Lowercase extension used for the stored blob.
    pub fn extension(&self) -> &str {
        &self.extension
    }
}

fn base_name(file_name: &str) -> &str {
    file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(file_name)
        .trim()
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    const OCTET: Option<&str> = Some(UPLOAD_CONTENT_TYPE);

    #[rstest]
    #[case("App.ipa", Platform::Ipa, "ipa")]
    #[case("Bundle.APP", Platform::Ipa, "app")]
    #[case("release.apk", Platform::Apk, "apk")]
    #[case("release.AAB", Platform::Apk, "aab")]
    #[case("release.abb", Platform::Apk, "abb")]
    #[case("builds/nightly/App.ipa", Platform::Ipa, "ipa")]
    fn accepts_known_packages(
        #[case] file_name: &str,
        #[case] platform: Platform,
        #[case] extension: &str,
    ) {
        let upload = PendingUpload::validate(Some(file_name), OCTET).expect("valid upload");
        assert_eq!(upload.platform(), platform);
        assert_eq!(upload.extension(), extension);
    }

    #[test]
    fn keeps_only_the_base_name() {
        let upload =
            PendingUpload::validate(Some("C:\\builds\\My App.ipa"), OCTET).expect("valid");
        assert_eq!(upload.file_name(), "My App.ipa");
    }

    #[rstest]
    #[case(None)]
    #[case(Some(""))]
    #[case(Some("   "))]
    #[case(Some("builds/"))]
    fn missing_names_are_rejected(#[case] file_name: Option<&str>) {
        assert!(matches!(
            PendingUpload::validate(file_name, OCTET),
            Err(JobError::MissingFileName)
        ));
    }

    #[rstest]
    #[case("setup.exe")]
    #[case("archive")]
    #[case("App.ipa.zip")]
    fn unknown_extensions_are_rejected(#[case] file_name: &str) {
        assert!(matches!(
            PendingUpload::validate(Some(file_name), OCTET),
            Err(JobError::UnsupportedExtension { .. })
        ));
    }

    #[rstest]
    #[case(None)]
    #[case(Some("multipart/form-data"))]
    #[case(Some("application/json"))]
    fn other_content_types_are_rejected(#[case] content_type: Option<&str>) {
        assert!(matches!(
            PendingUpload::validate(Some("App.ipa"), content_type),
            Err(JobError::UnsupportedContentType { .. })
        ));
    }

    #[test]
    fn content_type_comparison_ignores_case() {
        assert!(PendingUpload::validate(Some("App.apk"), Some("Application/Octet-Stream")).is_ok());
    }
}
