//! Options for a single download run.

use crate::types::codes::{Frequency, Language, Location};
use crate::types::error::ConfigError;
use crate::types::selector::Selector;
use bon::Builder;
use std::path::{Component, Path, PathBuf};

/// When [`crate::ArchivePipeline::run`] reports completion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CompletionPolicy {
    /// Wait for every entry write, and the JSON conversion it triggers, before returning.
    #[default]
    JoinWrites,
    /// Return as soon as the archive decoder reaches the end of its input.
    /// Writes still in flight are detached and only reported to the observer.
    DecoderEnd,
}

/// Which files to keep from the archive and where to put them.
///
/// Every field has a default, so `DownloadOptions::builder().build()` keeps
/// every forecast file and writes it to the current directory.
///
/// # Examples
///
/// ```
/// use taiwan_weather::{DownloadOptions, Frequency, Language, Location};
///
/// let options = DownloadOptions::builder()
///     .locations(Location::HsinchuCity)
///     .frequencies(Frequency::Weekday)
///     .languages(Language::English)
///     .output_dir("data")
///     .prefix("latest_")
///     .emit_json(true)
///     .build();
/// assert!(options.validate().is_ok());
/// ```
#[derive(Debug, Clone, Builder)]
pub struct DownloadOptions {
    #[builder(into, default = Selector::all::<Location>())]
    pub locations: Selector,

    #[builder(into, default = Selector::all::<Frequency>())]
    pub frequencies: Selector,

    #[builder(into, default = Selector::all::<Language>())]
    pub languages: Selector,

    #[builder(into, default = PathBuf::from("."))]
    pub output_dir: PathBuf,

    /// Prepended to every written file name.
    #[builder(into, default)]
    pub prefix: String,

    /// Also write a `.json` twin next to every `.xml` file.
    #[builder(default)]
    pub emit_json: bool,

    #[builder(default)]
    pub completion: CompletionPolicy,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl DownloadOptions {
    /// Checks the options before any network activity takes place.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.locations.validate()?;
        self.frequencies.validate()?;
        self.languages.validate()?;

        if !is_plain_file_name(&self.prefix) {
            return Err(ConfigError::InvalidPrefix(self.prefix.clone()));
        }

        if let Ok(metadata) = std::fs::metadata(&self.output_dir) {
            if !metadata.is_dir() {
                return Err(ConfigError::OutputNotDirectory(self.output_dir.clone()));
            }
        }
        Ok(())
    }
}

/// An empty prefix is fine, anything else must stay inside the output directory.
fn is_plain_file_name(prefix: &str) -> bool {
    if prefix.is_empty() {
        return true;
    }
    if prefix.contains('/') || prefix.contains('\\') {
        return false;
    }
    matches!(
        Path::new(prefix).components().next(),
        Some(Component::Normal(_))
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::codes::Category;

    #[test]
    fn defaults_select_everything() {
        let options = DownloadOptions::default();
        assert_eq!(options.locations.codes().len(), 22);
        assert_eq!(options.frequencies.codes().len(), 2);
        assert_eq!(options.languages.codes().len(), 2);
        assert_eq!(options.output_dir, PathBuf::from("."));
        assert_eq!(options.prefix, "");
        assert!(!options.emit_json);
        assert_eq!(options.completion, CompletionPolicy::JoinWrites);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn rejects_prefix_escaping_output_dir() {
        for prefix in ["../", "sub/dir_", "..", "a\\b"] {
            let options = DownloadOptions::builder().prefix(prefix).build();
            assert!(
                matches!(options.validate(), Err(ConfigError::InvalidPrefix(_))),
                "{prefix:?} should be rejected"
            );
        }
        let options = DownloadOptions::builder().prefix("1700000000000_").build();
        assert!(options.validate().is_ok());
    }

    #[test]
    fn rejects_output_path_that_is_a_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let options = DownloadOptions::builder().output_dir(file.path()).build();
        assert!(matches!(
            options.validate(),
            Err(ConfigError::OutputNotDirectory(_))
        ));
    }

    #[test]
    fn missing_output_dir_is_valid() {
        let dir = tempfile::tempdir().unwrap();
        let options = DownloadOptions::builder()
            .output_dir(dir.path().join("not-yet"))
            .build();
        assert!(options.validate().is_ok());
    }

    #[test]
    fn empty_selector_fails_validation() {
        let options = DownloadOptions::builder()
            .languages(Vec::<Language>::new())
            .build();
        assert!(matches!(
            options.validate(),
            Err(ConfigError::EmptySelector(Category::Language))
        ));
    }
}
