pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use crate::adapters::{FileAgencyDirectory, FileCountryList, FileManager, InMemoryTripStore, LocalStorage};
pub use crate::core::{report::Report, report::ReportKind, service::OfferService};
pub use crate::domain::model::{Agency, AgencyKey, IncomeRates, Offer, Trip};
pub use crate::utils::error::{ReportError, Result};
