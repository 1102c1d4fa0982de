//! Field validation shared by all three forms.
//!
//! Checks run in a fixed order and the first failure wins:
//! presence, staff rule, selection allow-list, date syntax, date semantics,
//! date range, media presence.

use crate::error::Rejection;
use crate::forms::submission::{RawSubmission, ValidSubmission};
use crate::forms::variant::Variant;
use chrono::{Days, NaiveDate};
use regex::Regex;
use std::sync::LazyLock;

static DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]{2})/([0-9]{2})/([0-9]{4})$").expect("date pattern"));

/// Inclusive length of the accepted date window, ending today.
const DATE_WINDOW_DAYS: u64 = 7;

pub fn validate(
    variant: &'static Variant,
    mut raw: RawSubmission,
    today: NaiveDate,
) -> Result<ValidSubmission, Rejection> {
    if variant.split_full_name {
        split_full_name(&mut raw);
    }

    let all_present = variant.required.iter().all(|name| {
        if variant.media_slot(name).is_some() {
            raw.has_media(name)
        } else {
            raw.present(name).is_some()
        }
    });
    if !all_present {
        return Err(Rejection::missing("Required fields missing", variant.required));
    }

    if let Some(rule) = &variant.staff_rule {
        if raw.is_staff(rule) && raw.present(rule.id_field).is_none() {
            return Err(Rejection::missing(rule.reason, &[rule.id_field]));
        }
    }

    if let Some(selection) = &variant.selection {
        let value = raw.field(selection.field).unwrap_or_default();
        if !selection.allowed.iter().any(|allowed| *allowed == value) {
            return Err(Rejection::not_in("Invalid selection type", selection.allowed));
        }
    }

    if let Some(field) = variant.date_field {
        if let Some(value) = raw.field(field) {
            check_date(field, value, today)?;
        }
    }

    for slot in variant.media.iter().filter(|slot| slot.required) {
        if !raw.has_media(slot.name) {
            return Err(Rejection::new(slot.missing_reason));
        }
    }

    Ok(ValidSubmission { variant, raw })
}

/// Checks a `dd/mm/yyyy` string: shape, then calendar validity, then that it
/// falls within the last seven days including `today`.
pub fn check_date(field: &str, value: &str, today: NaiveDate) -> Result<NaiveDate, Rejection> {
    let captures = DATE_RE
        .captures(value)
        .ok_or_else(|| Rejection::new(format!("{} must be in dd/mm/yyyy format", field)))?;

    let number = |i: usize| captures[i].parse::<u32>().ok();
    let date = match (number(1), number(2), number(3)) {
        (Some(day), Some(month), Some(year)) => {
            i32::try_from(year).ok().and_then(|y| NaiveDate::from_ymd_opt(y, month, day))
        }
        _ => None,
    }
    .ok_or_else(|| Rejection::new("Invalid date provided"))?;

    let earliest = today - Days::new(DATE_WINDOW_DAYS - 1);
    if date < earliest || date > today {
        return Err(Rejection::new(format!(
            "{} must be within the past 7 days including today",
            field
        )));
    }
    Ok(date)
}

/// Fills a blank `firstName`/`lastName` from the combined `name` field: the first
/// whitespace-separated token becomes the first name, the rest the last name.
fn split_full_name(raw: &mut RawSubmission) {
    let first = raw.present("firstName").map(|s| s.trim().to_string());
    let last = raw.present("lastName").map(|s| s.trim().to_string());
    let full = raw.present("name").map(str::to_string);

    let (first, last) = match (first, last, full) {
        (first, last, Some(full)) if first.is_none() || last.is_none() => {
            let mut parts = full.split_whitespace();
            let first = first.or_else(|| parts.next().map(str::to_string));
            let last = last.or_else(|| {
                let rest = parts.collect::<Vec<_>>().join(" ");
                (!rest.is_empty()).then_some(rest)
            });
            (first, last)
        }
        (first, last, _) => (first, last),
    };

    raw.insert_field("firstName", first.unwrap_or_default());
    raw.insert_field("lastName", last.unwrap_or_default());
}
