use crate::adapters::storage::FileManager;
use crate::domain::model::Agency;
use crate::domain::ports::{AgencyDirectory, Storage};
use crate::utils::error::{ReportError, Result};
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

static AGENCY_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d+,[A-Za-z ]+,[A-Za-zęóąśłżźćńĘÓĄŚŁŻŹĆŃ ]+$").expect("agency pattern compiles")
});

/// Parses an `id,name,location` line.
pub fn parse_agency(line: &str, line_number: usize) -> Result<Agency> {
    if !AGENCY_LINE.is_match(line) {
        return Err(ReportError::InvalidRecord {
            line: line_number,
            reason: format!("invalid agency data: {}", line),
        });
    }

    let mut parts = line.splitn(3, ',');
    let (Some(id), Some(name), Some(location)) = (parts.next(), parts.next(), parts.next()) else {
        return Err(ReportError::InvalidRecord {
            line: line_number,
            reason: format!("expected id,name,location: {}", line),
        });
    };
    let id = id.parse::<i64>().map_err(|e| ReportError::InvalidRecord {
        line: line_number,
        reason: format!("agency id out of range: {}", e),
    })?;

    Ok(Agency::new(id, name, location))
}

/// Agencies loaded from a text file, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct FileAgencyDirectory {
    agencies: BTreeMap<i64, Agency>,
}

impl FileAgencyDirectory {
    pub fn from_agencies(agencies: impl IntoIterator<Item = Agency>) -> Self {
        Self {
            agencies: agencies.into_iter().map(|a| (a.id(), a)).collect(),
        }
    }

    /// Blank lines are ignored; any other malformed line fails the whole load.
    pub fn from_lines<S: AsRef<str>>(lines: &[S]) -> Result<Self> {
        let mut agencies = BTreeMap::new();
        for (index, line) in lines.iter().enumerate() {
            let line = line.as_ref().trim();
            if line.is_empty() {
                continue;
            }
            let agency = parse_agency(line, index + 1)?;
            // a repeated id replaces the earlier entry
            agencies.insert(agency.id(), agency);
        }
        Ok(Self { agencies })
    }

    pub async fn load<S: Storage>(files: &FileManager<S>, path: &str) -> Result<Self> {
        let directory = Self::from_lines(&files.read_lines(path).await?)?;
        tracing::info!("Loaded {} agencies from {}", directory.agencies.len(), path);
        Ok(directory)
    }

    pub fn agencies(&self) -> Vec<Agency> {
        self.agencies.values().cloned().collect()
    }
}

impl AgencyDirectory for FileAgencyDirectory {
    fn lookup_by_id(&self, id: i64) -> Option<Agency> {
        self.agencies.get(&id).cloned()
    }
}
