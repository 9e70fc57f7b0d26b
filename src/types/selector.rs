//! Selection of which location, frequency and language variants to keep.

use crate::types::codes::{Category, Code, Frequency, Language, Location};
use crate::types::error::ConfigError;

/// An ordered set of filename codes for one [`Category`].
///
/// Build one from the typed enums (`Location::TaipeiCity.into()`,
/// `vec![Language::English].into()`), take every known code with
/// [`Selector::all`], or pass raw codes with [`Selector::raw`] when the
/// archive contains areas this crate does not enumerate yet.
///
/// # Examples
///
/// ```
/// use taiwan_weather::{Location, Selector};
///
/// let all = Selector::all::<Location>();
/// assert_eq!(all.codes().len(), 22);
///
/// let taipei: Selector = Location::TaipeiCity.into();
/// assert_eq!(taipei.codes(), ["63"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    category: Category,
    codes: Vec<String>,
}

impl Selector {
    /// Every known code of `T`.
    pub fn all<T: Code>() -> Self {
        Self::only(T::ALL.iter().copied())
    }

    pub fn only<T: Code>(values: impl IntoIterator<Item = T>) -> Self {
        Self::raw(T::CATEGORY, values.into_iter().map(|v| v.code()))
    }

    /// Codes taken verbatim. Duplicates are dropped, first occurrence wins.
    pub fn raw<S: Into<String>>(category: Category, codes: impl IntoIterator<Item = S>) -> Self {
        let mut unique: Vec<String> = Vec::new();
        for code in codes {
            let code = code.into();
            if !unique.contains(&code) {
                unique.push(code);
            }
        }
        Self {
            category,
            codes: unique,
        }
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn codes(&self) -> &[String] {
        &self.codes
    }

    /// Rejects empty selections and codes that cannot appear in an archive file name.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.codes.is_empty() {
            return Err(ConfigError::EmptySelector(self.category));
        }
        if let Some(bad) = self.codes.iter().find(|c| !is_valid_code(c)) {
            return Err(ConfigError::InvalidCode {
                category: self.category,
                code: bad.clone(),
            });
        }
        Ok(())
    }

    /// Alternation of the (escaped) codes, e.g. `63|64`.
    pub(crate) fn alternation(&self) -> String {
        self.codes
            .iter()
            .map(|c| regex::escape(c))
            .collect::<Vec<_>>()
            .join("|")
    }
}

fn is_valid_code(code: &str) -> bool {
    !code.is_empty() && code.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

macro_rules! impl_selector_from {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Selector {
                fn from(value: $ty) -> Self {
                    Selector::only([value])
                }
            }

            impl From<Vec<$ty>> for Selector {
                fn from(values: Vec<$ty>) -> Self {
                    Selector::only(values)
                }
            }

            impl From<&[$ty]> for Selector {
                fn from(values: &[$ty]) -> Self {
                    Selector::only(values.iter().copied())
                }
            }

            impl<const N: usize> From<[$ty; N]> for Selector {
                fn from(values: [$ty; N]) -> Self {
                    Selector::only(values)
                }
            }
        )*
    };
}

impl_selector_from!(Location, Frequency, Language);
