use crate::core::report::Report;
use crate::domain::model::Trip;
use crate::utils::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Serialize)]
struct ReportEnvelope<'a> {
    generated_at: DateTime<Utc>,
    reports: &'a [Report],
}

pub fn render(reports: &[Report], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(reports.iter().map(render_text).collect::<Vec<_>>().join("\n")),
        OutputFormat::Json => {
            let envelope = ReportEnvelope {
                generated_at: Utc::now(),
                reports,
            };
            Ok(serde_json::to_string_pretty(&envelope)?)
        }
    }
}

fn body_lines(report: &Report) -> Vec<String> {
    match report {
        Report::MaxTrips(entries) => entries
            .iter()
            .map(|entry| format!("{}: {} trips", entry.agency.display_name(), entry.trips))
            .collect(),
        Report::MaxIncome(entries) => entries
            .iter()
            .map(|entry| format!("{}: {}", entry.agency.display_name(), entry.income))
            .collect(),
        Report::CountryMaxTrips(entries) => entries
            .iter()
            .map(|entry| format!("{}: {} trips", entry.destination, entry.trips))
            .collect(),
        Report::MeanPrice(entries) => entries
            .iter()
            .map(|entry| {
                format!(
                    "{}: mean {} (closest: {})",
                    entry.agency.display_name(),
                    entry.mean_price.round_dp(2),
                    entry.closest_trip
                )
            })
            .collect(),
        Report::MaxTripsPerCountry(by_country) => by_country
            .iter()
            .map(|(destination, agencies)| format!("{}: {}", destination, agencies.join(", ")))
            .collect(),
        Report::AllowedDestinations(trips) => trips.iter().map(ToString::to_string).collect(),
        Report::PeopleCount(groups) => groups
            .iter()
            .map(|(people, trips)| format!("{} people: {}", people, join_trips(trips)))
            .collect(),
        Report::MaxPricePerPeopleCount(groups) => groups
            .iter()
            .map(|group| {
                format!(
                    "{} people: max {} ({} per person) {}",
                    group.people,
                    group.max_price,
                    group.price_per_person.round_dp(2),
                    join_trips(&group.trips)
                )
            })
            .collect(),
    }
}

fn join_trips(trips: &[Trip]) -> String {
    trips.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}

pub fn render_text(report: &Report) -> String {
    let mut out = format!("*** {} ***\n", report.kind().title());
    let lines = body_lines(report);
    if lines.is_empty() {
        out.push_str("(no data)\n");
    }
    for line in lines {
        out.push_str(&line);
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::aggregator::AgencyTripCount;
    use crate::domain::model::{AgencyKey, UNKNOWN_AGENCY};

    #[test]
    fn test_unknown_agency_resolved_at_render_time() {
        let report = Report::MaxTrips(vec![AgencyTripCount {
            agency: AgencyKey::Unknown,
            trips: 3,
        }]);
        let text = render_text(&report);
        assert!(text.starts_with("*** Agencies with max trips ***"));
        assert!(text.contains(&format!("{}: 3 trips", UNKNOWN_AGENCY)));
    }

    #[test]
    fn test_empty_report_text() {
        let text = render_text(&Report::MaxTrips(vec![]));
        assert!(text.contains("(no data)"));
    }

    #[test]
    fn test_json_output_is_tagged() {
        let json = render(&[Report::MaxTrips(vec![])], OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["reports"][0]["report"], "max-trips");
        assert!(value["generated_at"].is_string());
    }
}
