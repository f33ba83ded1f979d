//! Facility-type classification for the directory export.

use std::collections::HashMap;
use std::sync::OnceLock;

use super::normalizer::normalize_label;

static FACILITY_TYPE_MAP: OnceLock<HashMap<String, bool>> = OnceLock::new();

/// Whether a directory facility type participates in accountability scoring.
/// Health-care sites do; benefits offices, Vet Centers, and cemeteries share
/// the export but carry no clinical scorecard. Unknown types return `None`
/// so the importer can surface them instead of guessing.
pub(crate) fn is_scored_type(facility_type: &str) -> Option<bool> {
    facility_type_map()
        .get(&normalize_label(facility_type))
        .copied()
}

fn facility_type_map() -> &'static HashMap<String, bool> {
    FACILITY_TYPE_MAP.get_or_init(|| {
        const TYPE_TO_SCORED: &[(&str, bool)] = &[
            ("VA Medical Center (VAMC)", true),
            ("VA Medical Center", true),
            ("VAMC", true),
            ("Health Care Center (HCC)", true),
            ("Health Care Center", true),
            ("Community-Based Outpatient Clinic (CBOC)", true),
            ("Community Based Outpatient Clinic (CBOC)", true),
            ("Community-Based Outpatient Clinic", true),
            ("CBOC", true),
            ("Multi-Specialty CBOC (MSCBOC)", true),
            ("Primary Care CBOC (PCCBOC)", true),
            ("Other Outpatient Services (OOS)", true),
            ("Domiciliary", true),
            ("Extended Care Site (Community Living Center) (CLC)", true),
            ("Residential Care Site (MH RRTP/DRRTP) (Stand-Alone)", true),
            ("Vet Center", false),
            ("Mobile Vet Center", false),
            ("VA Regional Benefit Office", false),
            ("VBA Regional Office", false),
            ("National Cemetery", false),
            ("Cemetery", false),
        ];

        let mut map = HashMap::with_capacity(TYPE_TO_SCORED.len());
        for (name, scored) in TYPE_TO_SCORED {
            map.insert(normalize_label(name), *scored);
        }
        map
    })
}
