//! Status dashboard: filtering, grouping and ordering of status records.
//!
//! Rows are grouped by district in locale-aware order. Within a district,
//! location codes are ordered numerically when both parse as numbers and
//! locale-aware otherwise. Organization names come from reference data,
//! joined on the normalized BKZ.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::models::{normalize_bkz, Betrieb, StatusRecord, TrafficLight};

/// Shown for a missing district or an unknown organization.
pub const PLACEHOLDER: &str = "–";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DashboardFilter {
    pub district: Option<String>,
    pub traffic_light: Option<TrafficLight>,
}

impl DashboardFilter {
    fn matches(&self, record: &StatusRecord) -> bool {
        let district_ok = match self.district.as_deref().map(str::trim) {
            Some(d) if !d.is_empty() => record.district.trim() == d,
            _ => true,
        };
        let light_ok = self
            .traffic_light
            .map_or(true, |light| record.traffic_light == light);
        district_ok && light_ok
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardRow {
    pub location_code: String,
    pub organization_name: String,
    pub traffic_light: TrafficLight,
    pub file_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistrictGroup {
    /// District with surrounding whitespace removed; empty when unknown.
    pub district: String,
    pub rows: Vec<DashboardRow>,
}

impl DistrictGroup {
    pub fn label(&self) -> &str {
        if self.district.is_empty() {
            PLACEHOLDER
        } else {
            &self.district
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LightSummary {
    pub green: usize,
    pub yellow: usize,
    pub red: usize,
}

/// Collation key folding case and German umlauts.
fn collation_key(s: &str) -> String {
    let mut key = String::with_capacity(s.len());
    for c in s.chars().flat_map(char::to_lowercase) {
        match c {
            'ä' | 'à' | 'á' | 'â' => key.push('a'),
            'ö' | 'ò' | 'ó' | 'ô' => key.push('o'),
            'ü' | 'ù' | 'ú' | 'û' => key.push('u'),
            'é' | 'è' | 'ê' => key.push('e'),
            'ß' => key.push_str("ss"),
            other => key.push(other),
        }
    }
    key
}

/// Locale-aware string ordering (German rules, case-insensitive first).
pub fn locale_cmp(a: &str, b: &str) -> Ordering {
    collation_key(a)
        .cmp(&collation_key(b))
        .then_with(|| a.cmp(b))
}

/// Numeric when both codes parse, locale order otherwise.
pub fn compare_location_codes(a: &str, b: &str) -> Ordering {
    let (na, nb) = (normalize_bkz(a), normalize_bkz(b));
    match (na.parse::<u64>(), nb.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y).then_with(|| locale_cmp(a, b)),
        _ => locale_cmp(&na, &nb),
    }
}

/// Distinct non-empty districts for the filter dropdown.
pub fn district_options(status: &[StatusRecord]) -> Vec<String> {
    let mut districts: Vec<String> = status
        .iter()
        .map(|r| r.district.trim())
        .filter(|d| !d.is_empty())
        .map(str::to_string)
        .collect();
    districts.sort_by(|a, b| locale_cmp(a, b));
    districts.dedup();
    districts
}

/// The dashboard is only useful once at least one file was submitted.
pub fn has_any_files(status: &[StatusRecord]) -> bool {
    status.iter().any(|r| r.file_count > 0)
}

pub fn traffic_light_summary(status: &[StatusRecord]) -> LightSummary {
    status.iter().fold(LightSummary::default(), |mut acc, r| {
        match r.traffic_light {
            TrafficLight::Green => acc.green += 1,
            TrafficLight::Yellow => acc.yellow += 1,
            TrafficLight::Red => acc.red += 1,
        }
        acc
    })
}

/// Filter, join and group status records for display.
pub fn build_dashboard(
    status: &[StatusRecord],
    betriebe: &[Betrieb],
    filter: &DashboardFilter,
) -> Vec<DistrictGroup> {
    let names: HashMap<String, &str> = betriebe
        .iter()
        .map(|b| (b.normalized_code(), b.organization_name.as_str()))
        .collect();

    let mut records: Vec<&StatusRecord> = status.iter().filter(|r| filter.matches(r)).collect();
    records.sort_by(|a, b| {
        locale_cmp(a.district.trim(), b.district.trim())
            .then_with(|| compare_location_codes(&a.location_code, &b.location_code))
    });

    let mut groups: Vec<DistrictGroup> = Vec::new();
    for record in records {
        let district = record.district.trim();
        let row = DashboardRow {
            location_code: record.location_code.clone(),
            organization_name: names
                .get(&normalize_bkz(&record.location_code))
                .filter(|name| !name.is_empty())
                .map_or_else(|| PLACEHOLDER.to_string(), |name| name.to_string()),
            traffic_light: record.traffic_light,
            file_count: record.file_count,
        };
        match groups.last_mut() {
            Some(group) if group.district == district => group.rows.push(row),
            _ => groups.push(DistrictGroup {
                district: district.to_string(),
                rows: vec![row],
            }),
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::testing::{betrieb, status};

    #[test]
    fn test_grouping_order() {
        let records = vec![
            status("B", "10", TrafficLight::Green, 1),
            status("A", "5", TrafficLight::Red, 0),
            status("A", "20", TrafficLight::Yellow, 2),
        ];
        let groups = build_dashboard(&records, &[], &DashboardFilter::default());

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].district, "A");
        let codes: Vec<_> = groups[0].rows.iter().map(|r| r.location_code.as_str()).collect();
        assert_eq!(codes, vec!["5", "20"]);
        assert_eq!(groups[1].district, "B");
    }

    #[test]
    fn test_non_numeric_codes_use_locale_order() {
        assert_eq!(compare_location_codes("b7", "A9"), Ordering::Greater);
        assert_eq!(compare_location_codes("9", "10"), Ordering::Less);
        assert_eq!(compare_location_codes("010", "9"), Ordering::Greater);
    }

    #[test]
    fn test_locale_cmp_umlauts() {
        assert_eq!(locale_cmp("Ährenfeld", "Bahnhof"), Ordering::Less);
        assert_eq!(locale_cmp("ost", "Nord"), Ordering::Greater);
        assert_eq!(locale_cmp("Straße", "Strasse"), Ordering::Greater);
    }

    #[test]
    fn test_organization_join_uses_normalized_bkz() {
        let records = vec![status("A", "007", TrafficLight::Green, 1), status("A", "8", TrafficLight::Red, 0)];
        let betriebe = vec![betrieb("7", "Acme GmbH")];
        let groups = build_dashboard(&records, &betriebe, &DashboardFilter::default());

        assert_eq!(groups[0].rows[0].organization_name, "Acme GmbH");
        assert_eq!(groups[0].rows[1].organization_name, PLACEHOLDER);
    }

    #[test]
    fn test_filters() {
        let records = vec![
            status("A", "1", TrafficLight::Green, 1),
            status("A", "2", TrafficLight::Red, 0),
            status("B", "3", TrafficLight::Green, 4),
        ];
        let filter = DashboardFilter {
            district: None,
            traffic_light: Some(TrafficLight::Green),
        };
        let groups = build_dashboard(&records, &[], &filter);
        assert_eq!(groups.iter().map(|g| g.rows.len()).sum::<usize>(), 2);

        let filter = DashboardFilter {
            district: Some("B".to_string()),
            traffic_light: None,
        };
        let groups = build_dashboard(&records, &[], &filter);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].rows[0].location_code, "3");
    }

    #[test]
    fn test_padded_districts_filter_and_group_with_trimmed() {
        let records = vec![
            status("Nord ", "1", TrafficLight::Green, 1),
            status("Nord", "2", TrafficLight::Red, 0),
            status(" Süd", "3", TrafficLight::Red, 0),
        ];
        assert_eq!(district_options(&records), vec!["Nord", "Süd"]);

        let groups = build_dashboard(&records, &[], &DashboardFilter::default());
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].district, "Nord");
        assert_eq!(groups[0].rows.len(), 2);

        let filter = DashboardFilter {
            district: Some("Nord".to_string()),
            traffic_light: None,
        };
        let groups = build_dashboard(&records, &[], &filter);
        let codes: Vec<_> = groups[0].rows.iter().map(|r| r.location_code.as_str()).collect();
        assert_eq!(codes, vec!["1", "2"]);
    }

    #[test]
    fn test_empty_district_label() {
        let groups = build_dashboard(&[status("", "1", TrafficLight::Red, 0)], &[], &DashboardFilter::default());
        assert_eq!(groups[0].label(), PLACEHOLDER);
    }

    #[test]
    fn test_district_options() {
        let records = vec![
            status("Süd", "1", TrafficLight::Red, 0),
            status("", "2", TrafficLight::Red, 0),
            status("Nord", "3", TrafficLight::Red, 0),
            status("Süd", "4", TrafficLight::Red, 0),
        ];
        assert_eq!(district_options(&records), vec!["Nord", "Süd"]);
    }

    #[test]
    fn test_has_any_files_and_summary() {
        let records = vec![
            status("A", "1", TrafficLight::Red, 0),
            status("A", "2", TrafficLight::Yellow, 0),
        ];
        assert!(!has_any_files(&records));
        assert!(has_any_files(&[status("A", "1", TrafficLight::Green, 1)]));
        assert_eq!(
            traffic_light_summary(&records),
            LightSummary { green: 0, yellow: 1, red: 1 }
        );
    }
}
