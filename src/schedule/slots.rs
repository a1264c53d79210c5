//! Fixed lesson times for the class slots of a day

/// Start and end time of each slot, first slot first
const SLOT_TIMES: [(&str, &str); super::SLOTS_PER_DAY] = [
    ("08:30", "10:00"),
    ("10:20", "11:50"),
    ("12:10", "13:40"),
    ("14:00", "15:30"),
    ("15:50", "17:20"),
    ("17:40", "19:10"),
];

/// Start and end time of a slot, `None` for an unknown index
pub fn slot_time_range(slot: usize) -> Option<(&'static str, &'static str)> {
    SLOT_TIMES.get(slot).copied()
}

/// Display label for a zero-based slot index
///
/// Unknown indices yield an empty label rather than an error.
pub fn slot_label(slot: usize) -> String {
    match slot_time_range(slot) {
        Some((start, end)) => format!("*-* {} пара {} - {}", slot + 1, start, end),
        None => String::new(),
    }
}
