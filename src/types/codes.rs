//! Code enumerations used by the Central Weather Administration forecast archive.
//!
//! Every file inside the `F-D0047-093` archive is named
//! `<location>_<frequency>_<language>.xml`, where each part is one of the
//! codes defined here (e.g. `63_Weekday_EN.xml` is the English weekly
//! forecast for Taipei City).

use crate::types::error::ParseCodeError;
use std::fmt;
use std::str::FromStr;

/// Identifier of the forecast dataset containing every township forecast, packaged as a ZIP.
pub const DEFAULT_DATA_ID: &str = "F-D0047-093";

/// The three filename parts a [`crate::Selector`] can restrict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Location,
    Frequency,
    Language,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Category::Location => "location",
            Category::Frequency => "frequency",
            Category::Language => "language",
        };
        write!(f, "{}", name)
    }
}

/// A closed set of filename codes belonging to one [`Category`].
pub trait Code: Copy + Sized + 'static {
    const CATEGORY: Category;

    /// Every known value, in the order the upstream enumeration lists them.
    const ALL: &'static [Self];

    /// The code as it appears in archive file names.
    fn code(&self) -> &'static str;

    /// Human readable kebab-case name, accepted by [`FromStr`] as an alias.
    fn name(&self) -> &'static str;
}

fn parse_code<T: Code>(value: &str) -> Result<T, ParseCodeError> {
    let trimmed = value.trim();
    T::ALL
        .iter()
        .copied()
        .find(|c| c.code().eq_ignore_ascii_case(trimmed) || c.name().eq_ignore_ascii_case(trimmed))
        .ok_or_else(|| ParseCodeError {
            category: T::CATEGORY,
            value: value.to_string(),
        })
}

/// Administrative regions of Taiwan, keyed by their official area code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Location {
    TaipeiCity,
    KaohsiungCity,
    NewTaipeiCity,
    TaichungCity,
    TainanCity,
    TaoyuanCity,
    YilanCounty,
    HsinchuCounty,
    MiaoliCounty,
    ChanghuaCounty,
    NantouCounty,
    YunlinCounty,
    ChiayiCounty,
    PingtungCounty,
    TaitungCounty,
    HualienCounty,
    PenghuCounty,
    KeelungCity,
    HsinchuCity,
    ChiayiCity,
    KinmenCounty,
    LienchiangCounty,
}

impl Code for Location {
    const CATEGORY: Category = Category::Location;

    const ALL: &'static [Self] = &[
        Location::TaipeiCity,
        Location::KaohsiungCity,
        Location::NewTaipeiCity,
        Location::TaichungCity,
        Location::TainanCity,
        Location::TaoyuanCity,
        Location::YilanCounty,
        Location::HsinchuCounty,
        Location::MiaoliCounty,
        Location::ChanghuaCounty,
        Location::NantouCounty,
        Location::YunlinCounty,
        Location::ChiayiCounty,
        Location::PingtungCounty,
        Location::TaitungCounty,
        Location::HualienCounty,
        Location::PenghuCounty,
        Location::KeelungCity,
        Location::HsinchuCity,
        Location::ChiayiCity,
        Location::KinmenCounty,
        Location::LienchiangCounty,
    ];

    fn code(&self) -> &'static str {
        match self {
            Location::TaipeiCity => "63",
            Location::KaohsiungCity => "64",
            Location::NewTaipeiCity => "65",
            Location::TaichungCity => "66",
            Location::TainanCity => "67",
            Location::TaoyuanCity => "68",
            Location::YilanCounty => "10002",
            Location::HsinchuCounty => "10004",
            Location::MiaoliCounty => "10005",
            Location::ChanghuaCounty => "10007",
            Location::NantouCounty => "10008",
            Location::YunlinCounty => "10009",
            Location::ChiayiCounty => "10010",
            Location::PingtungCounty => "10013",
            Location::TaitungCounty => "10014",
            Location::HualienCounty => "10015",
            Location::PenghuCounty => "10016",
            Location::KeelungCity => "10017",
            Location::HsinchuCity => "10018",
            Location::ChiayiCity => "10020",
            Location::KinmenCounty => "09020",
            Location::LienchiangCounty => "09007",
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Location::TaipeiCity => "taipei-city",
            Location::KaohsiungCity => "kaohsiung-city",
            Location::NewTaipeiCity => "new-taipei-city",
            Location::TaichungCity => "taichung-city",
            Location::TainanCity => "tainan-city",
            Location::TaoyuanCity => "taoyuan-city",
            Location::YilanCounty => "yilan-county",
            Location::HsinchuCounty => "hsinchu-county",
            Location::MiaoliCounty => "miaoli-county",
            Location::ChanghuaCounty => "changhua-county",
            Location::NantouCounty => "nantou-county",
            Location::YunlinCounty => "yunlin-county",
            Location::ChiayiCounty => "chiayi-county",
            Location::PingtungCounty => "pingtung-county",
            Location::TaitungCounty => "taitung-county",
            Location::HualienCounty => "hualien-county",
            Location::PenghuCounty => "penghu-county",
            Location::KeelungCity => "keelung-city",
            Location::HsinchuCity => "hsinchu-city",
            Location::ChiayiCity => "chiayi-city",
            Location::KinmenCounty => "kinmen-county",
            Location::LienchiangCounty => "lienchiang-county",
        }
    }
}

/// Update frequency of a forecast file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Frequency {
    /// One-week forecast, split in day and night periods.
    Weekday,
    /// Three-day forecast in 3-hour steps.
    ThreeDay,
}

impl Code for Frequency {
    const CATEGORY: Category = Category::Frequency;
    const ALL: &'static [Self] = &[Frequency::Weekday, Frequency::ThreeDay];

    fn code(&self) -> &'static str {
        match self {
            Frequency::Weekday => "Weekday",
            Frequency::ThreeDay => "72hr",
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Frequency::Weekday => "weekday",
            Frequency::ThreeDay => "three-day",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    English,
    Chinese,
}

impl Code for Language {
    const CATEGORY: Category = Category::Language;
    const ALL: &'static [Self] = &[Language::English, Language::Chinese];

    fn code(&self) -> &'static str {
        match self {
            Language::English => "EN",
            Language::Chinese => "ZH",
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Language::English => "english",
            Language::Chinese => "chinese",
        }
    }
}

macro_rules! impl_code_traits {
    ($($ty:ty),*) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, "{}", self.code())
                }
            }

            impl FromStr for $ty {
                type Err = ParseCodeError;

                fn from_str(s: &str) -> Result<Self, Self::Err> {
                    parse_code(s)
                }
            }
        )*
    };
}

impl_code_traits!(Location, Frequency, Language);
