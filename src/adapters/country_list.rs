use crate::adapters::storage::FileManager;
use crate::domain::ports::{CountryAllowList, Storage};
use crate::utils::error::{ReportError, Result};
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

static COUNTRY_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z ]+$").expect("country pattern compiles"));

/// Allowed destinations read from a one-country-per-line file.
#[derive(Debug, Clone, Default)]
pub struct FileCountryList {
    countries: Vec<String>,
}

impl FileCountryList {
    pub fn from_lines<S: AsRef<str>>(lines: &[S]) -> Result<Self> {
        let mut countries = Vec::new();
        for (index, line) in lines.iter().enumerate() {
            let line = line.as_ref();
            if line.trim().is_empty() {
                continue;
            }
            if !COUNTRY_LINE.is_match(line) {
                return Err(ReportError::InvalidRecord {
                    line: index + 1,
                    reason: format!("data is not correct: {}", line),
                });
            }
            countries.push(line.to_string());
        }
        Ok(Self { countries })
    }

    pub async fn load<S: Storage>(files: &FileManager<S>, path: &str) -> Result<Self> {
        let list = Self::from_lines(&files.read_lines(path).await?)?;
        tracing::info!("Loaded {} countries from {}", list.countries.len(), path);
        Ok(list)
    }

    pub fn countries(&self) -> &[String] {
        &self.countries
    }
}

impl CountryAllowList for FileCountryList {
    fn allowed_destinations(&self) -> HashSet<String> {
        self.countries.iter().cloned().collect()
    }
}
