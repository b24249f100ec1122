use crate::dto::SeniorRequest;
use crate::error::ValidationError;
use chrono::{Datelike, NaiveDate};

pub const SCCN_LENGTH: usize = 12;
pub const MINIMUM_AGE: i32 = 60;
const NAME_MAX_LENGTH: usize = 100;
const ZONE_MAX_LENGTH: usize = 50;
const PENSION_TYPE_MAX_LENGTH: usize = 50;
const CONTACT_MIN_LENGTH: usize = 7;
const CONTACT_MAX_LENGTH: usize = 20;

/// Registration numbers are exactly twelve ASCII digits.
pub fn is_valid_sccn(sccn: &str) -> bool {
    sccn.len() == SCCN_LENGTH && sccn.bytes().all(|b| b.is_ascii_digit())
}

pub fn age_on(birth_date: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - birth_date.year();
    if (today.month(), today.day()) < (birth_date.month(), birth_date.day()) {
        age -= 1;
    }
    age
}

fn check_name(
    errors: &mut ValidationError,
    field: &'static str,
    label: &str,
    value: &str,
    required: bool,
) {
    let value = value.trim();
    if value.is_empty() {
        if required {
            errors.push(field, format!("{} is required", label));
        }
        return;
    }
    if value.chars().count() > NAME_MAX_LENGTH {
        errors.push(
            field,
            format!("{} must be at most {} characters", label, NAME_MAX_LENGTH),
        );
    }
}

pub fn validate_senior(request: &SeniorRequest, today: NaiveDate) -> Result<(), ValidationError> {
    let mut errors = ValidationError::default();

    if !is_valid_sccn(request.sccn.trim()) {
        errors.push("sccn", "SCCN must be exactly 12 digits");
    }
    check_name(&mut errors, "first_name", "First name", &request.first_name, true);
    check_name(&mut errors, "last_name", "Last name", &request.last_name, true);
    if let Some(middle_name) = &request.middle_name {
        check_name(&mut errors, "middle_name", "Middle name", middle_name, false);
    }

    if request.birth_date > today {
        errors.push("birth_date", "Birth date cannot be in the future");
    } else if age_on(request.birth_date, today) < MINIMUM_AGE {
        errors.push(
            "birth_date",
            format!("Resident must be at least {} years old", MINIMUM_AGE),
        );
    }

    match request.sex.trim() {
        "M" | "F" => {}
        _ => errors.push("sex", "Sex must be M or F"),
    }

    let zone = request.zone.trim();
    if zone.is_empty() {
        errors.push("zone", "Zone is required");
    } else if zone.chars().count() > ZONE_MAX_LENGTH {
        errors.push(
            "zone",
            format!("Zone must be at most {} characters", ZONE_MAX_LENGTH),
        );
    }

    if let Some(contact) = request.contact_number.as_deref().map(str::trim) {
        let digits = contact.trim_start_matches('+');
        if !contact.is_empty()
            && (digits.len() < CONTACT_MIN_LENGTH
                || contact.len() > CONTACT_MAX_LENGTH
                || !digits.bytes().all(|b| b.is_ascii_digit()))
        {
            errors.push(
                "contact_number",
                format!(
                    "Contact number must be {} to {} digits",
                    CONTACT_MIN_LENGTH, CONTACT_MAX_LENGTH
                ),
            );
        }
    }

    if let Some(pension_type) = &request.pension_type {
        if pension_type.trim().chars().count() > PENSION_TYPE_MAX_LENGTH {
            errors.push(
                "pension_type",
                format!(
                    "Pension type must be at most {} characters",
                    PENSION_TYPE_MAX_LENGTH
                ),
            );
        }
    }

    errors.into_result()
}
