use crate::core::format::OutputFormat;
use crate::domain::model::IncomeRates;
use crate::utils::error::{ReportError, Result};
use crate::utils::validation::{self, Validate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub data: DataConfig,
    pub income: Option<IncomeConfig>,
    pub output: Option<OutputConfig>,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    pub agencies_path: String,
    pub countries_path: String,
    pub trips_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomeConfig {
    pub vat_rate: Option<Decimal>,
    pub margin: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub format: Option<OutputFormat>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: Option<String>,
    pub json: Option<bool>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ReportError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| ReportError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${DATA_DIR})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ReportError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn income_rates(&self) -> IncomeRates {
        let defaults = IncomeRates::default();
        match &self.income {
            Some(income) => IncomeRates {
                vat_rate: income.vat_rate.unwrap_or(defaults.vat_rate),
                margin: income.margin.unwrap_or(defaults.margin),
            },
            None => defaults,
        }
    }

    pub fn output_format(&self) -> OutputFormat {
        self.output
            .as_ref()
            .and_then(|o| o.format)
            .unwrap_or_default()
    }

    pub fn log_level(&self) -> Option<&str> {
        self.logging.as_ref().and_then(|l| l.level.as_deref())
    }

    pub fn json_logs(&self) -> bool {
        self.logging.as_ref().and_then(|l| l.json).unwrap_or(false)
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_path("data.agencies_path", &self.data.agencies_path)?;
        validation::validate_path("data.countries_path", &self.data.countries_path)?;
        validation::validate_path("data.trips_path", &self.data.trips_path)?;

        let rates = self.income_rates();
        validation::validate_rate("income.vat_rate", rates.vat_rate)?;
        validation::validate_rate("income.margin", rates.margin)?;

        if let Some(level) = self.log_level() {
            validation::validate_non_empty_string("logging.level", level)?;
        }
        Ok(())
    }
}
