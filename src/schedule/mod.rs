//! Weekly class schedule model
//!
//! A university timetable repeats over two weeks. Each parity (numerator and
//! denominator) has its own six-day week of class slots. This module holds the
//! typed model, the decoder for the upstream day records, slot labels and the
//! parity calculation.

pub mod codec;
pub mod slots;

pub use codec::{decode, DecodeError, RawDay};
pub use slots::{slot_label, slot_time_range};

use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};

/// Number of study days in a week (Monday to Saturday)
pub const DAYS_PER_WEEK: usize = 6;

/// Number of class slots in a day
pub const SLOTS_PER_DAY: usize = 6;

/// The two week variants of the schedule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub numerator: Week,
    pub denominator: Week,
}

impl Schedule {
    /// Returns the week for the given parity
    pub fn week(&self, parity: WeekParity) -> &Week {
        match parity {
            WeekParity::Numerator => &self.numerator,
            WeekParity::Denominator => &self.denominator,
        }
    }
}

/// Ordered study days, Monday first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Week {
    pub days: Vec<Day>,
}

impl Week {
    /// Returns the day at `index` (0 = Monday), if present
    pub fn day(&self, index: usize) -> Option<&Day> {
        self.days.get(index)
    }
}

/// A single day with its classes in slot order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Day {
    /// Display name as provided by the upstream
    pub name: String,
    /// Only occupied slots are present
    pub classes: Vec<Class>,
}

impl Day {
    /// Renders the day as display text
    ///
    /// Each class becomes its slot label, the description on the next line and
    /// a blank line. A day without classes renders as a single newline.
    pub fn render(&self) -> String {
        let mut text = String::from("\n");
        for class in &self.classes {
            text.push_str(&slot_label(class.slot));
            text.push('\n');
            text.push_str(&class.description);
            text.push_str("\n\n");
        }
        text
    }
}

/// A class occupying one slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Class {
    /// Zero-based slot index, see [`slot_label`]
    pub slot: usize,
    pub description: String,
}

/// Which of the two alternating weeks is active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeekParity {
    /// Even ISO weeks
    Numerator,
    /// Odd ISO weeks
    Denominator,
}

impl WeekParity {
    /// Parity of the week containing `date`
    pub fn for_date(date: NaiveDate) -> Self {
        if date.iso_week().week() % 2 == 0 {
            WeekParity::Numerator
        } else {
            WeekParity::Denominator
        }
    }

    /// Parity of the current local week
    pub fn current() -> Self {
        Self::for_date(Local::now().date_naive())
    }

    /// The other parity
    pub fn other(self) -> Self {
        match self {
            WeekParity::Numerator => WeekParity::Denominator,
            WeekParity::Denominator => WeekParity::Numerator,
        }
    }

    /// Human-readable name shown to users
    pub fn label(self) -> &'static str {
        match self {
            WeekParity::Numerator => "Числитель",
            WeekParity::Denominator => "Знаменатель",
        }
    }

    /// Prefix of the per-slot field names in upstream day records
    pub fn field_prefix(self) -> &'static str {
        match self {
            WeekParity::Numerator => "n",
            WeekParity::Denominator => "z",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class(slot: usize, description: &str) -> Class {
        Class {
            slot,
            description: description.to_string(),
        }
    }

    #[test]
    fn test_parity_other_is_an_involution() {
        for parity in [WeekParity::Numerator, WeekParity::Denominator] {
            assert_ne!(parity.other(), parity);
            assert_eq!(parity.other().other(), parity);
        }
    }

    #[test]
    fn test_parity_follows_iso_week_number() {
        // 2024-01-01 is a Monday in ISO week 1
        let week_one = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!(WeekParity::for_date(week_one), WeekParity::Denominator);

        // 2024-01-08 starts ISO week 2
        let week_two = NaiveDate::from_ymd_opt(2024, 1, 8).unwrap();
        assert_eq!(WeekParity::for_date(week_two), WeekParity::Numerator);

        // Sunday still belongs to the week that started on Monday
        let sunday = NaiveDate::from_ymd_opt(2024, 1, 14).unwrap();
        assert_eq!(WeekParity::for_date(sunday), WeekParity::Numerator);
    }

    #[test]
    fn test_parity_uses_iso_year_boundaries() {
        // 2021-01-03 belongs to ISO week 53 of 2020
        let date = NaiveDate::from_ymd_opt(2021, 1, 3).unwrap();
        assert_eq!(date.iso_week().week(), 53);
        assert_eq!(WeekParity::for_date(date), WeekParity::Denominator);
    }

    #[test]
    fn test_parity_labels_and_prefixes() {
        assert_eq!(WeekParity::Numerator.label(), "Числитель");
        assert_eq!(WeekParity::Denominator.label(), "Знаменатель");
        assert_eq!(WeekParity::Numerator.field_prefix(), "n");
        assert_eq!(WeekParity::Denominator.field_prefix(), "z");
    }

    #[test]
    fn test_day_render_lists_classes_in_slot_order() {
        let day = Day {
            name: "Понедельник".to_string(),
            classes: vec![class(0, "Math"), class(2, "Physics")],
        };

        let text = day.render();

        assert_eq!(
            text,
            "\n*-* 1 пара 08:30 - 10:00\nMath\n\n*-* 3 пара 12:10 - 13:40\nPhysics\n\n"
        );
        assert!(!text.contains("2 пара"));
    }

    #[test]
    fn test_empty_day_renders_single_newline() {
        let day = Day {
            name: "Суббота".to_string(),
            classes: Vec::new(),
        };
        assert_eq!(day.render(), "\n");
    }

    #[test]
    fn test_schedule_selects_week_by_parity() {
        let numerator = Week {
            days: vec![Day {
                name: "Понедельник".to_string(),
                classes: vec![class(0, "Math")],
            }],
        };
        let denominator = Week {
            days: vec![Day {
                name: "Понедельник".to_string(),
                classes: vec![class(1, "History")],
            }],
        };
        let schedule = Schedule {
            numerator: numerator.clone(),
            denominator: denominator.clone(),
        };

        assert_eq!(schedule.week(WeekParity::Numerator), &numerator);
        assert_eq!(schedule.week(WeekParity::Denominator), &denominator);
        assert!(schedule.week(WeekParity::Numerator).day(1).is_none());
    }
}
