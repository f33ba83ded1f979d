//! Roster ingestion: turn a VA facility-directory CSV export into hierarchy
//! entities ready to upsert, parents before children.

mod mapping;
mod normalizer;
mod parser;

use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::warn;

use crate::oversight::scorecard::domain::{Entity, EntityId, EntityKind, IssueTag};

#[derive(Debug)]
pub enum RosterImportError {
    Io(std::io::Error),
    Csv(csv::Error),
}

impl fmt::Display for RosterImportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(error) => write!(f, "failed to read roster file: {error}"),
            Self::Csv(error) => write!(f, "failed to parse roster csv: {error}"),
        }
    }
}

impl std::error::Error for RosterImportError {}

impl From<std::io::Error> for RosterImportError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error)
    }
}

impl From<csv::Error> for RosterImportError {
    fn from(error: csv::Error) -> Self {
        Self::Csv(error)
    }
}

/// Parsed roster ready to upsert. `entities` is ordered national root first,
/// then each VISN before its facilities, so a plain iteration satisfies the
/// parents-before-children rule.
#[derive(Debug)]
pub struct RosterImport {
    pub entities: Vec<Entity>,
    /// Row-level rejections, one human-readable reason each.
    pub skipped: Vec<String>,
}

impl RosterImport {
    pub fn facility_count(&self) -> usize {
        self.entities
            .iter()
            .filter(|entity| entity.kind == EntityKind::Facility)
            .count()
    }

    pub fn visn_count(&self) -> usize {
        self.entities
            .iter()
            .filter(|entity| entity.kind == EntityKind::Visn)
            .count()
    }

    pub fn facilities(&self) -> impl Iterator<Item = &Entity> {
        self.entities
            .iter()
            .filter(|entity| entity.kind == EntityKind::Facility)
    }
}

pub struct RosterImporter;

impl RosterImporter {
    pub fn from_path<P: AsRef<Path>>(
        path: P,
        national_id: &str,
        national_name: &str,
    ) -> Result<RosterImport, RosterImportError> {
        let file = File::open(path)?;
        Self::from_reader(file, national_id, national_name)
    }

    /// Build the hierarchy from a roster export. Rows with a blank station
    /// id, an unusable VISN, an unrecognized facility type, or a duplicate
    /// station are skipped with a recorded reason; they never abort the
    /// import.
    pub fn from_reader<R: Read>(
        reader: R,
        national_id: &str,
        national_name: &str,
    ) -> Result<RosterImport, RosterImportError> {
        let records = parser::parse_records(reader)?;

        let national = EntityId(national_id.to_string());
        let mut entities = vec![Entity {
            id: national.clone(),
            kind: EntityKind::National,
            parent_id: None,
            name: national_name.to_string(),
            issue_tags: BTreeSet::new(),
        }];
        let mut seen_visns: HashSet<EntityId> = HashSet::new();
        let mut seen_stations: HashSet<EntityId> = HashSet::new();
        let mut skipped = Vec::new();

        for (index, record) in records.into_iter().enumerate() {
            // header occupies line 1
            let row = index + 2;

            let station_id = match record.station_id {
                Some(id) => EntityId(id),
                None => {
                    skipped.push(format!("row {row}: blank station id"));
                    continue;
                }
            };
            if record.facility_name.is_empty() {
                skipped.push(format!("row {row}: blank facility name"));
                continue;
            }
            match mapping::is_scored_type(&record.facility_type) {
                Some(true) => {}
                Some(false) => {
                    skipped.push(format!(
                        "row {row}: {:?} sites are not scored",
                        record.facility_type
                    ));
                    continue;
                }
                None => {
                    skipped.push(format!(
                        "row {row}: unrecognized facility type {:?}",
                        record.facility_type
                    ));
                    continue;
                }
            }
            let visn = match record.visn {
                Some(visn) => EntityId(visn),
                None => {
                    skipped.push(format!("row {row}: missing or invalid VISN"));
                    continue;
                }
            };
            if !seen_stations.insert(station_id.clone()) {
                skipped.push(format!("row {row}: duplicate station {station_id}"));
                continue;
            }

            if seen_visns.insert(visn.clone()) {
                entities.push(Entity {
                    id: visn.clone(),
                    kind: EntityKind::Visn,
                    parent_id: Some(national.clone()),
                    name: visn_display_name(&visn),
                    issue_tags: BTreeSet::new(),
                });
            }

            entities.push(Entity {
                id: station_id,
                kind: EntityKind::Facility,
                parent_id: Some(visn),
                name: record.facility_name,
                issue_tags: record.issue_tags.into_iter().map(IssueTag).collect(),
            });
        }

        for reason in &skipped {
            warn!(%reason, "roster row skipped");
        }

        Ok(RosterImport { entities, skipped })
    }
}

fn visn_display_name(id: &EntityId) -> String {
    let number = id
        .0
        .rsplit('-')
        .next()
        .and_then(|digits| digits.parse::<u32>().ok());
    match number {
        Some(number) => format!("VISN {number}"),
        None => id.0.to_ascii_uppercase(),
    }
}
