use crate::infra::{
    default_scoring_config, InMemoryAlertPublisher, InMemoryScorecardRepository, NATIONAL_ID,
    NATIONAL_NAME,
};
use chrono::{DateTime, Utc};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use vetwatch::config::ScoringOverrides;
use vetwatch::error::AppError;
use vetwatch::oversight::roster::{RosterImport, RosterImporter};
use vetwatch::oversight::scorecard::{
    EntityId, EventId, IntegrityEventDraft, Representative, RepresentativeId, ScorecardService,
};

type DemoService = ScorecardService<InMemoryScorecardRepository, InMemoryAlertPublisher>;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Roster CSV export to score. Defaults to the bundled sample directory.
    #[arg(long)]
    pub(crate) roster: Option<PathBuf>,
    /// Evaluation timestamp (YYYY-MM-DD). Defaults to now.
    #[arg(long, value_parser = crate::infra::parse_utc_date)]
    pub(crate) as_of: Option<DateTime<Utc>>,
    /// Include a per-facility scorecard listing in the output.
    #[arg(long)]
    pub(crate) list_facilities: bool,
    /// Skip the representative oversight portion of the demo.
    #[arg(long)]
    pub(crate) skip_representative: bool,
}

#[derive(Args, Debug)]
pub(crate) struct RosterReportArgs {
    /// Roster CSV export to score. Defaults to the bundled sample directory.
    #[arg(long)]
    pub(crate) roster: Option<PathBuf>,
    /// Evaluation timestamp (YYYY-MM-DD). Defaults to now.
    #[arg(long, value_parser = crate::infra::parse_utc_date)]
    pub(crate) as_of: Option<DateTime<Utc>>,
    /// Include a per-facility scorecard listing in the output.
    #[arg(long)]
    pub(crate) list_facilities: bool,
}

pub(crate) fn run_roster_report(args: RosterReportArgs) -> Result<(), AppError> {
    let RosterReportArgs {
        roster,
        as_of,
        list_facilities,
    } = args;

    let as_of = as_of.unwrap_or_else(Utc::now);
    let (import, from_file) = load_roster_import(roster)?;
    announce_roster(&import, from_file);

    let (service, _alerts) = build_demo_service();
    score_roster(&service, &import, as_of)?;
    render_oversight_report(&service, &import, list_facilities)?;

    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        roster,
        as_of,
        list_facilities,
        skip_representative,
    } = args;

    let as_of = as_of.unwrap_or_else(Utc::now);

    println!("VA accountability scorecard demo");
    let (import, from_file) = load_roster_import(roster)?;
    announce_roster(&import, from_file);

    let (service, alerts) = build_demo_service();
    let refreshed = score_roster(&service, &import, as_of)?;
    println!("- Recompute walks refreshed {refreshed} scorecards");

    let worst_id = match service.overview()?.worst_facilities.first() {
        Some(standing) => standing.entity_id.clone(),
        None => {
            println!("No scored facilities to deep dive; nothing else to show");
            return Ok(());
        }
    };

    println!("\nFacility deep dive");
    match service.get_scorecard(&worst_id) {
        Ok(view) => {
            println!(
                "- {} ({}): performance {} | integrity {} | {} | v{}",
                view.entity_name,
                view.kind_label,
                view.performance_display,
                view.integrity_display,
                view.freshness_label,
                view.version
            );
            println!("  Methodology: {}", view.formula_explanation);
        }
        Err(err) => println!("- Scorecard unavailable: {err}"),
    }

    println!("\nIntegrity event intake");
    let event = service.record_integrity_event(IntegrityEventDraft {
        id: EventId("oig-2026-0417".to_string()),
        entity_id: worst_id.clone(),
        category: "Records Falsification".to_string(),
        severity: None,
        source_citation: Some("OIG report 2026-0417".to_string()),
        recorded_at: as_of,
        supersedes: None,
    })?;
    println!(
        "- Recorded {} against {} (severity {:.1} from category defaults)",
        event.id.0, event.entity_id, event.severity
    );

    let stale = service.overview()?.stale_entities;
    println!("- {stale} scorecards went stale; recomputing the chain");
    service.recompute_from(&worst_id, as_of)?;
    match service.get_scorecard(&worst_id) {
        Ok(view) => println!(
            "- {} now reads performance {} | integrity {} | v{}",
            view.entity_name, view.performance_display, view.integrity_display, view.version
        ),
        Err(err) => println!("- Scorecard unavailable: {err}"),
    }

    if !skip_representative {
        println!("\nRepresentative oversight");
        let parent = import
            .entities
            .iter()
            .find(|entity| entity.id == worst_id)
            .and_then(|entity| entity.parent_id.clone());
        let jurisdiction: std::collections::BTreeSet<EntityId> = import
            .facilities()
            .filter(|facility| facility.parent_id == parent)
            .map(|facility| facility.id.clone())
            .collect();

        let representative = Representative {
            id: RepresentativeId("rep-ga-05".to_string()),
            name: "Rep. Jordan Ellis".to_string(),
            office: "GA-05".to_string(),
            party: Some("Independent".to_string()),
            contact_url: Some("https://ellis.house.gov".to_string()),
            jurisdiction,
        };
        service.upsert_representative(representative)?;

        match service.representative_score(&RepresentativeId("rep-ga-05".to_string()), as_of) {
            Ok(view) => match serde_json::to_string_pretty(&view) {
                Ok(json) => println!("Oversight score payload:\n{json}"),
                Err(err) => println!("- Oversight payload unavailable: {err}"),
            },
            Err(err) => println!("- Oversight score unavailable: {err}"),
        }
    }

    let events = alerts.events();
    if events.is_empty() {
        println!("\nCritical alerts: none dispatched");
    } else {
        println!("\nCritical alerts");
        for alert in events {
            println!(
                "- {} ({}) fell to {:.1}, below the {:.1} threshold",
                alert.entity_name, alert.entity_id, alert.performance_score, alert.threshold
            );
        }
    }

    println!();
    render_oversight_report(&service, &import, list_facilities)?;

    Ok(())
}

fn build_demo_service() -> (Arc<DemoService>, Arc<InMemoryAlertPublisher>) {
    let repository = Arc::new(InMemoryScorecardRepository::default());
    let alerts = Arc::new(InMemoryAlertPublisher::default());
    let service = Arc::new(ScorecardService::new(
        repository,
        alerts.clone(),
        default_scoring_config(&ScoringOverrides::default()),
    ));
    (service, alerts)
}

fn load_roster_import(roster: Option<PathBuf>) -> Result<(RosterImport, bool), AppError> {
    match roster {
        Some(path) => RosterImporter::from_path(path, NATIONAL_ID, NATIONAL_NAME)
            .map(|import| (import, true))
            .map_err(AppError::from),
        None => {
            let sample = &include_bytes!("../../../crates/vetwatch/station_roster.csv")[..];
            RosterImporter::from_reader(sample, NATIONAL_ID, NATIONAL_NAME)
                .map(|import| (import, false))
                .map_err(AppError::from)
        }
    }
}

fn announce_roster(import: &RosterImport, from_file: bool) {
    if from_file {
        println!("Data source: roster CSV export");
    } else {
        println!("Data source: bundled sample directory (no roster provided)");
    }
    println!(
        "- {} facilities across {} VISNs under {}",
        import.facility_count(),
        import.visn_count(),
        NATIONAL_NAME
    );
    if !import.skipped.is_empty() {
        println!("- {} roster rows skipped:", import.skipped.len());
        for reason in &import.skipped {
            println!("  - {reason}");
        }
    }
}

/// Upsert the imported hierarchy and walk every facility bottom-up. Returns
/// the number of refreshed scorecards across all walks.
fn score_roster(
    service: &DemoService,
    import: &RosterImport,
    as_of: DateTime<Utc>,
) -> Result<usize, AppError> {
    for entity in &import.entities {
        service.upsert_entity(entity.clone())?;
    }

    let mut refreshed = 0;
    for facility in import.facilities() {
        let outcome = service.recompute_from(&facility.id, as_of)?;
        refreshed += outcome.refreshed.len();
        for skipped in outcome.skipped {
            println!(
                "- Left {} stale during recompute: {}",
                skipped.entity_id, skipped.reason
            );
        }
    }
    Ok(refreshed)
}

fn render_oversight_report(
    service: &DemoService,
    import: &RosterImport,
    list_facilities: bool,
) -> Result<(), AppError> {
    let summary = service.overview()?;
    let insights = summary.insights();

    println!("Oversight report");

    println!("\nTier rollup");
    for tier in &summary.tiers {
        let average = match tier.average_performance {
            Some(average) => format!(", avg {average:.1}"),
            None => String::new(),
        };
        println!(
            "- {}: {}/{} scored, {} stale, {} below critical{}",
            tier.kind_label, tier.scored, tier.entities, tier.stale, tier.below_critical, average
        );
    }

    if summary.worst_facilities.is_empty() {
        println!("\nWorst performing facilities: none scored yet");
    } else {
        println!("\nWorst performing facilities");
        for standing in &summary.worst_facilities {
            let integrity = match standing.integrity_score {
                Some(score) => format!(", integrity {score:.1}"),
                None => ", integrity: no data".to_string(),
            };
            println!(
                "- {} ({}): performance {:.1}{}",
                standing.name, standing.entity_id, standing.performance_score, integrity
            );
            if !standing.issues.is_empty() {
                println!("  Issues: {}", standing.issues.join(", "));
            }
        }
    }

    println!("\nVISN standings (worst first)");
    for standing in &summary.visn_standings {
        match standing.performance_score {
            Some(score) => println!("- {}: {:.1}", standing.name, score),
            None => println!("- {}: no score yet", standing.name),
        }
    }

    println!(
        "\nOversight level: {} ({} below critical, {} stale)",
        insights.level_label, summary.below_critical, summary.stale_entities
    );
    for note in &insights.observations {
        println!("- {note}");
    }
    if !insights.recommended_actions.is_empty() {
        println!("\nRecommended actions");
        for action in &insights.recommended_actions {
            println!("- {action}");
        }
    }
    if let Some(visn) = &insights.focus_visn {
        println!("Focus VISN: {visn}");
    }

    if list_facilities {
        println!("\nFacility scorecards");
        for facility in import.facilities() {
            match service.get_scorecard(&facility.id) {
                Ok(view) => println!(
                    "- {} | {} | performance {} | integrity {} | {} | v{}",
                    view.entity_id,
                    view.entity_name,
                    view.performance_display,
                    view.integrity_display,
                    view.freshness_label,
                    view.version
                ),
                Err(err) => println!("- {} | scorecard unavailable: {err}", facility.id),
            }
        }
    }

    Ok(())
}
