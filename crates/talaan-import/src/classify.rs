//! Rule-based classification of to-add records.
//!
//! A pure function of `(explicit_classification, marital_surname,
//! birth_date, today)` plus the configured age thresholds. Strict
//! precedence: explicit label, marital surname, age band, adult fallback.

use chrono::{Datelike, NaiveDate};

use crate::models::{ClassificationThresholds, IncomingRecord, MemberClass};

/// A derived or operator-supplied classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub label: MemberClass,
    /// True when the label was derived rather than supplied.
    pub auto: bool,
}

/// Whole elapsed years between a birth date and today, calendar-aware:
/// the year difference, minus one when this year's birthday has not yet
/// occurred.
#[must_use]
pub fn age_in_years(birth_date: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - birth_date.year();
    if (today.month(), today.day()) < (birth_date.month(), birth_date.day()) {
        age -= 1;
    }
    age
}

/// Classify one record as of `today`.
#[must_use]
pub fn classify(
    record: &IncomingRecord,
    today: NaiveDate,
    thresholds: &ClassificationThresholds,
) -> Classification {
    if let Some(label) = record.explicit_classification {
        return Classification { label, auto: false };
    }

    if record.marital_surname.is_some() {
        return Classification {
            label: MemberClass::Married,
            auto: true,
        };
    }

    if let Some(birth_date) = record.birth_date {
        let age = age_in_years(birth_date, today);
        let label = if age < thresholds.child_below as i32 {
            MemberClass::Child
        } else if age <= thresholds.youth_through as i32 {
            MemberClass::Youth
        } else {
            // Default-adult fallback.
            MemberClass::Married
        };
        return Classification { label, auto: true };
    }

    // No birth date, no marital indicator.
    Classification {
        label: MemberClass::Married,
        auto: true,
    }
}
