use crate::types::error::ConfigError;
use crate::types::selector::Selector;
use regex::{Regex, RegexBuilder};

/// Decides which archive files to keep.
///
/// Accepts exactly the file names `<location>_<frequency>_<language>.xml`
/// (case-insensitive) whose three parts are in the respective selectors.
///
/// # Examples
///
/// ```
/// use taiwan_weather::{FileMatcher, Frequency, Language, Location};
///
/// let matcher = FileMatcher::new(
///     &Location::TaipeiCity.into(),
///     &Frequency::Weekday.into(),
///     &Language::English.into(),
/// )?;
/// assert!(matcher.is_match("63_Weekday_EN.xml"));
/// assert!(!matcher.is_match("63_Weekday_EN.json"));
/// assert!(!matcher.is_match("64_72hr_ZH.xml"));
/// # Ok::<(), taiwan_weather::ConfigError>(())
/// ```
#[derive(Debug, Clone)]
pub struct FileMatcher {
    pattern: Regex,
}

impl FileMatcher {
    pub fn new(
        locations: &Selector,
        frequencies: &Selector,
        languages: &Selector,
    ) -> Result<Self, ConfigError> {
        locations.validate()?;
        frequencies.validate()?;
        languages.validate()?;

        let pattern = format!(
            r"^(?:{})_(?:{})_(?:{})\.xml$",
            locations.alternation(),
            frequencies.alternation(),
            languages.alternation()
        );
        let pattern = RegexBuilder::new(&pattern)
            .case_insensitive(true)
            .build()
            .map_err(ConfigError::Pattern)?;
        Ok(Self { pattern })
    }

    pub fn is_match(&self, file_name: &str) -> bool {
        self.pattern.is_match(file_name)
    }

    pub fn as_str(&self) -> &str {
        self.pattern.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::codes::{Category, Code, Frequency, Language, Location};

    fn matcher(loc: &[&str], freq: &[&str], lang: &[&str]) -> FileMatcher {
        FileMatcher::new(
            &Selector::raw(Category::Location, loc.iter().copied()),
            &Selector::raw(Category::Frequency, freq.iter().copied()),
            &Selector::raw(Category::Language, lang.iter().copied()),
        )
        .unwrap()
    }

    #[test]
    fn accepts_exactly_the_selected_combinations() {
        let selected_loc = [Location::TaipeiCity, Location::KinmenCounty];
        let selected_freq = [Frequency::ThreeDay];
        let selected_lang = [Language::English, Language::Chinese];
        let matcher = FileMatcher::new(
            &selected_loc.into(),
            &selected_freq.into(),
            &selected_lang.into(),
        )
        .unwrap();

        for loc in Location::ALL {
            for freq in Frequency::ALL {
                for lang in Language::ALL {
                    let name = format!("{}_{}_{}.xml", loc.code(), freq.code(), lang.code());
                    let expected = selected_loc.contains(loc)
                        && selected_freq.contains(freq)
                        && selected_lang.contains(lang);
                    assert_eq!(matcher.is_match(&name), expected, "{name}");
                }
            }
        }
    }

    #[test]
    fn matching_is_case_insensitive() {
        let m = matcher(&["63"], &["Weekday"], &["EN"]);
        assert!(m.is_match("63_weekday_en.xml"));
        assert!(m.is_match("63_WEEKDAY_EN.XML"));
    }

    #[test]
    fn rejects_other_suffixes_and_decorations() {
        let m = matcher(&["63"], &["Weekday"], &["EN"]);
        for name in [
            "63_Weekday_EN.json",
            "63_Weekday_EN.xml.bak",
            "163_Weekday_EN.xml",
            "63_Weekday_EN_xml",
            "63-Weekday-EN.xml",
            "data/63_Weekday_EN.xml",
            "",
        ] {
            assert!(!m.is_match(name), "{name:?} should not match");
        }
    }

    #[test]
    fn codes_are_matched_literally() {
        let m = matcher(&["6-3"], &["Weekday"], &["EN"]);
        assert!(m.is_match("6-3_Weekday_EN.xml"));
        assert!(!m.is_match("6x3_Weekday_EN.xml"));
    }

    #[test]
    fn all_selectors_accept_every_known_file() {
        let m = FileMatcher::new(
            &Selector::all::<Location>(),
            &Selector::all::<Frequency>(),
            &Selector::all::<Language>(),
        )
        .unwrap();
        assert!(m.is_match("10018_72hr_ZH.xml"));
        assert!(m.is_match("09007_Weekday_EN.xml"));
        assert!(!m.is_match("99_Weekday_EN.xml"));
    }

    #[test]
    fn invalid_selectors_are_rejected() {
        let err = FileMatcher::new(
            &Selector::raw(Category::Location, Vec::<String>::new()),
            &Selector::all::<Frequency>(),
            &Selector::all::<Language>(),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::EmptySelector(Category::Location)));
    }
}
