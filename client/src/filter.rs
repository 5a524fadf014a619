use std::cmp::Ordering;

use common::req::{Device, DeviceType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    Name,
    Type,
    Location,
    /// Descending; devices without a reported level sort as 0.
    Battery,
    /// Descending; most recently seen first.
    LastSeen,
}

/// Predicates for the derived device-list view.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DeviceQuery {
    /// Case-insensitive substring match against name OR location.
    pub search: String,
    pub device_type: Option<DeviceType>,
    pub active: Option<bool>,
    pub sort: SortKey,
}

/// Recompute the ordered view of the directory. Pure and deterministic;
/// called again on every collection or predicate change.
///
/// The sort is stable, so ties keep their prior relative order.
pub fn filter_and_sort(devices: &[Device], query: &DeviceQuery) -> Vec<Device> {
    let needle = query.search.to_lowercase();
    let mut filtered: Vec<Device> = devices
        .iter()
        .filter(|d| {
            (needle.is_empty()
                || d.name.to_lowercase().contains(&needle)
                || d.location.to_lowercase().contains(&needle))
                && query.device_type.map_or(true, |t| d.device_type == t)
                && query.active.map_or(true, |a| d.active == a)
        })
        .cloned()
        .collect();

    match query.sort {
        SortKey::Name => filtered.sort_by(|a, b| cmp_folded(&a.name, &b.name)),
        SortKey::Type => {
            filtered.sort_by(|a, b| cmp_folded(a.device_type.label(), b.device_type.label()))
        }
        SortKey::Location => filtered.sort_by(|a, b| cmp_folded(&a.location, &b.location)),
        SortKey::Battery => filtered.sort_by(|a, b| {
            b.battery_level.unwrap_or(0).cmp(&a.battery_level.unwrap_or(0))
        }),
        SortKey::LastSeen => filtered.sort_by(|a, b| b.last_seen.cmp(&a.last_seen)),
    }
    filtered
}

// case-insensitive stand-in for locale collation
fn cmp_folded(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}
