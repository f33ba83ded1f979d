//! CSV row parsing for the facility-directory export.

use std::io::Read;

use serde::{Deserialize, Deserializer};

use super::normalizer::{
    collapse_whitespace, normalize_label, normalize_station_id, normalize_visn, split_issue_tags,
};

/// One roster row after normalization, before hierarchy assembly.
#[derive(Debug)]
pub(crate) struct RosterRecord {
    pub(crate) station_id: Option<String>,
    pub(crate) facility_name: String,
    pub(crate) visn: Option<String>,
    pub(crate) facility_type: String,
    pub(crate) issue_tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RosterRow {
    #[serde(rename = "Station ID")]
    station_id: String,
    #[serde(rename = "Facility Name")]
    facility_name: String,
    #[serde(rename = "VISN", default, deserialize_with = "empty_string_as_none")]
    visn: Option<String>,
    #[serde(rename = "Type")]
    facility_type: String,
    #[serde(rename = "Issue Tags", default, deserialize_with = "empty_string_as_none")]
    issue_tags: Option<String>,
}

pub(crate) fn parse_records<R: Read>(reader: R) -> Result<Vec<RosterRecord>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut records = Vec::new();
    for row in csv_reader.deserialize::<RosterRow>() {
        let row = row?;
        records.push(RosterRecord {
            station_id: normalize_station_id(&row.station_id),
            facility_name: collapse_whitespace(&row.facility_name),
            visn: row.visn.as_deref().and_then(normalize_visn),
            facility_type: normalize_label(&row.facility_type),
            issue_tags: split_issue_tags(row.issue_tags.as_deref().unwrap_or_default()),
        });
    }
    Ok(records)
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|value| !value.trim().is_empty()))
}
