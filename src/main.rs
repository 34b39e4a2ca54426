use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use trip_report::core::format;
use trip_report::utils::error::{ErrorSeverity, ReportError};
use trip_report::utils::logger;
use trip_report::{
    CliConfig, FileAgencyDirectory, FileCountryList, FileManager, InMemoryTripStore, LocalStorage,
    OfferService,
};

fn exit_code(severity: ErrorSeverity) -> i32 {
    match severity {
        ErrorSeverity::Low => 0,      // 警告，但成功
        ErrorSeverity::Medium => 2,   // 計算錯誤
        ErrorSeverity::High => 1,     // 資料或配置錯誤
        ErrorSeverity::Critical => 3, // 系統錯誤
    }
}

fn report_failure(e: &ReportError) {
    tracing::error!(
        "❌ {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e.user_friendly_message());
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    let file_config = match cli.load_file() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file: {}", e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    // 初始化日誌
    let json_logs = cli.json_logs || file_config.as_ref().is_some_and(|c| c.json_logs());
    logger::init_cli_logger(
        cli.verbose,
        json_logs,
        file_config.as_ref().and_then(|c| c.log_level()),
    );

    tracing::info!("🚀 Starting trip-report");

    let settings = match cli.resolve(file_config.as_ref()) {
        Ok(settings) => settings,
        Err(e) => {
            report_failure(&e);
            std::process::exit(1);
        }
    };
    tracing::debug!("Run settings: {:?}", settings);

    let files = FileManager::read_only(LocalStorage::new("."));
    let agencies = FileAgencyDirectory::load(&files, &settings.data.agencies_path)
        .await
        .with_context(|| format!("loading agencies from {}", settings.data.agencies_path))?;
    let countries = FileCountryList::load(&files, &settings.data.countries_path)
        .await
        .with_context(|| format!("loading countries from {}", settings.data.countries_path))?;
    let trips = InMemoryTripStore::load_csv(&files, &settings.data.trips_path)
        .await
        .with_context(|| format!("loading trips from {}", settings.data.trips_path))?;

    let service = OfferService::new(
        Arc::new(agencies),
        Arc::new(trips),
        Arc::new(countries),
        settings.rates,
    )
    .await?;

    let offer = service.snapshot().await;
    tracing::info!(
        "📊 Offer ready: {} agencies, {} valid trips",
        offer.len(),
        offer.trip_count()
    );

    let mut reports = Vec::with_capacity(settings.reports.len());
    let mut worst: Option<ErrorSeverity> = None;
    for kind in &settings.reports {
        match service.run(*kind).await {
            Ok(report) => reports.push(report),
            Err(e) => {
                tracing::warn!("Report '{}' failed", kind);
                report_failure(&e);
                worst = worst.max(Some(e.severity()));
            }
        }
    }

    println!("{}", format::render(&reports, settings.format)?);

    if let Some(severity) = worst {
        let code = exit_code(severity);
        if code > 0 {
            std::process::exit(code);
        }
    }

    tracing::info!("✅ Reports completed");
    Ok(())
}
