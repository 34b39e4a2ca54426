use crate::config::toml_config::{DataConfig, TomlConfig};
use crate::core::format::OutputFormat;
use crate::core::report::ReportKind;
use crate::domain::model::IncomeRates;
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use clap::Parser;
use rust_decimal::Decimal;

#[derive(Debug, Clone, Parser)]
#[command(name = "trip-report")]
#[command(about = "Validate travel agency trips and print business reports")]
pub struct CliConfig {
    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    #[arg(long)]
    pub agencies: Option<String>,

    #[arg(long)]
    pub countries: Option<String>,

    #[arg(long)]
    pub trips: Option<String>,

    #[arg(long)]
    pub vat_rate: Option<Decimal>,

    #[arg(long)]
    pub margin: Option<Decimal>,

    /// Reports to run, all of them when omitted
    #[arg(short, long, value_enum, value_delimiter = ',')]
    pub report: Vec<ReportKind>,

    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,
}

/// Effective settings after applying CLI overrides on top of the TOML file.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub data: DataConfig,
    pub rates: IncomeRates,
    pub format: OutputFormat,
    pub reports: Vec<ReportKind>,
}

impl CliConfig {
    pub fn load_file(&self) -> Result<Option<TomlConfig>> {
        self.config.as_deref().map(TomlConfig::from_file).transpose()
    }

    pub fn resolve(&self, file: Option<&TomlConfig>) -> Result<RunSettings> {
        let file_data = file.map(|f| &f.data);

        let agencies = self
            .agencies
            .clone()
            .or_else(|| file_data.map(|d| d.agencies_path.clone()));
        let countries = self
            .countries
            .clone()
            .or_else(|| file_data.map(|d| d.countries_path.clone()));
        let trips = self
            .trips
            .clone()
            .or_else(|| file_data.map(|d| d.trips_path.clone()));

        let data = DataConfig {
            agencies_path: validation::validate_required_field("agencies", &agencies)?.clone(),
            countries_path: validation::validate_required_field("countries", &countries)?.clone(),
            trips_path: validation::validate_required_field("trips", &trips)?.clone(),
        };

        let base_rates = file.map(TomlConfig::income_rates).unwrap_or_default();
        let rates = IncomeRates {
            vat_rate: self.vat_rate.unwrap_or(base_rates.vat_rate),
            margin: self.margin.unwrap_or(base_rates.margin),
        };

        let format = self
            .format
            .or_else(|| file.map(TomlConfig::output_format))
            .unwrap_or_default();

        let reports = if self.report.is_empty() {
            ReportKind::ALL.to_vec()
        } else {
            self.report.clone()
        };

        let settings = RunSettings {
            data,
            rates,
            format,
            reports,
        };
        settings.validate()?;
        Ok(settings)
    }
}

impl Validate for RunSettings {
    fn validate(&self) -> Result<()> {
        validation::validate_path("agencies", &self.data.agencies_path)?;
        validation::validate_path("countries", &self.data.countries_path)?;
        validation::validate_path("trips", &self.data.trips_path)?;
        validation::validate_rate("vat_rate", self.rates.vat_rate)?;
        validation::validate_rate("margin", self.rates.margin)?;
        Ok(())
    }
}
