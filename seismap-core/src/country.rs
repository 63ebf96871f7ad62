//! Country name normalization and profile image paths
//!
//! Profile images are named `country_profile_{Name}.png` where `Name` is the
//! display name with whitespace replaced by underscores, after aliasing.

use std::collections::BTreeSet;

/// Public directory holding country profile images
pub const PROFILE_DIR: &str = "/country-profiles";

/// Non-canonical names (already underscored) and their asset names
///
/// `Czechia` appears on the right only; the upstream table also listed a
/// no-op `Czechia -> Czechia` entry. The mis-encoded `CÃ´te` row mirrors a
/// UTF-8 string that was decoded as Latin-1 somewhere upstream.
const ALIASES: &[(&str, &str)] = &[
    ("United_States_of_America", "United_States"),
    ("USA", "United_States"),
    ("UK", "United_Kingdom"),
    ("UAE", "United_Arab_Emirates"),
    (
        "Democratic_Republic_of_Congo",
        "Democratic_Republic_of_the_Congo",
    ),
    ("Republic_of_the_Congo", "Congo"),
    ("Côte_d'Ivoire", "Ivory_Coast"),
    ("CÃ´te_d'Ivoire", "Ivory_Coast"),
    ("Czech_Republic", "Czechia"),
];

/// Africa profile names, matching the asset folder layout
const AFRICA: &[&str] = &[
    "Algeria",
    "Angola",
    "Benin",
    "Botswana",
    "Burundi",
    "Cameroon",
    "Central_African_Republic",
    "Chad",
    "Comoros",
    "Congo",
    "Democratic_Republic_of_the_Congo",
    "Djibouti",
    "Egypt",
    "Equatorial_Guinea",
    "Eritrea",
    "Eswatini",
    "Ethiopia",
    "Gabon",
    "Gambia",
    "Ghana",
    "Guinea",
    "Guinea_Bissau",
    "Ivory_Coast",
    "Kenya",
    "Lesotho",
    "Liberia",
    "Libya",
    "Madagascar",
    "Malawi",
    "Mali",
    "Mauritania",
    "Mauritius",
    "Morocco",
    "Mozambique",
    "Namibia",
    "Niger",
    "Nigeria",
    "Rwanda",
    "Senegal",
    "Sierra_Leone",
    "Somalia",
    "South_Africa",
    "South_Sudan",
    "Sudan",
    "Tanzania",
    "Togo",
    "Tunisia",
    "Uganda",
    "Zambia",
    "Zimbabwe",
];

/// Regional grouping of profile images
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Africa,
}

impl Region {
    pub fn as_str(&self) -> &'static str {
        match self {
            Region::Africa => "Africa",
        }
    }

    pub fn countries(&self) -> &'static [&'static str] {
        match self {
            Region::Africa => AFRICA,
        }
    }
}

/// Normalize a display name to its profile asset name
///
/// Leading and trailing whitespace is dropped, each inner whitespace run
/// collapses to a single `_`, then the alias table applies.
pub fn normalize_country_name(name: &str) -> String {
    let underscored = name.split_whitespace().collect::<Vec<_>>().join("_");
    resolve_alias(&underscored)
        .map(str::to_string)
        .unwrap_or(underscored)
}

fn resolve_alias(underscored: &str) -> Option<&'static str> {
    ALIASES
        .iter()
        .find(|(alias, _)| *alias == underscored)
        .map(|(_, canonical)| *canonical)
}

/// Public path of a country's profile image
pub fn country_profile_path(name: &str) -> String {
    format!(
        "{}/country_profile_{}.png",
        PROFILE_DIR,
        normalize_country_name(name)
    )
}

/// Whether a profile is expected to exist
///
/// Without an asset listing every non-empty normalized name is assumed to
/// have a profile.
pub fn has_country_profile(name: &str) -> bool {
    !normalize_country_name(name).is_empty()
}

/// Region containing a normalized country name, if known
pub fn region_of(normalized: &str) -> Option<Region> {
    [Region::Africa]
        .into_iter()
        .find(|region| region.countries().contains(&normalized))
}

/// Set of profile names that actually exist on disk
#[derive(Debug, Clone, Default)]
pub struct ProfileCatalog {
    names: BTreeSet<String>,
}

impl ProfileCatalog {
    /// Scan a directory for `country_profile_*.png` files
    pub fn scan(dir: &std::path::Path) -> anyhow::Result<Self> {
        use anyhow::Context;

        let mut names = BTreeSet::new();
        for entry in std::fs::read_dir(dir)
            .with_context(|| format!("Failed to read directory: {}", dir.display()))?
        {
            let entry = entry?;
            let file_name = entry.file_name();
            let Some(file_name) = file_name.to_str() else {
                continue;
            };
            if let Some(name) = file_name
                .strip_prefix("country_profile_")
                .and_then(|rest| rest.strip_suffix(".png"))
            {
                names.insert(name.to_string());
            }
        }
        tracing::debug!(count = names.len(), dir = %dir.display(), "scanned profile images");
        Ok(ProfileCatalog { names })
    }

    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ProfileCatalog {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, display_name: &str) -> bool {
        self.names.contains(&normalize_country_name(display_name))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Alias targets that have no matching image
    pub fn missing_alias_targets(&self) -> BTreeSet<&'static str> {
        ALIASES
            .iter()
            .map(|(_, canonical)| *canonical)
            .filter(|canonical| !self.names.contains(*canonical))
            .collect()
    }
}
