//! Whitelist validation for incoming job requests.
//!
//! Every rule is checked independently and all failures are returned
//! together, so a client can show the user every problem at once.

use std::collections::HashMap;

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::jobs::job::{is_valid_job_id, JobRequest, JobType, ScheduleType, Size};
use crate::jobs::sanitize::sanitize;

pub const MAX_CUSTOM_INSTRUCTIONS: usize = 500;

pub const INVALID_JOB_TYPE: &str = "Invalid job type.";
pub const INVALID_JOB_DETAILS: &str =
    "Invalid job details. The job details must contain valid values.";
pub const INVALID_CUSTOM_INSTRUCTIONS: &str = "Custom instructions are too long or invalid.";
pub const INVALID_SCHEDULED_TYPE: &str =
    "Invalid scheduled type. It must be either 'ASAP' or 'Scheduled'.";
pub const INVALID_SCHEDULED_TIME: &str =
    "Invalid scheduled time format. It should contain two valid dates separated by a pipe.";
pub const INVALID_SIZE: &str = "Invalid size. It must be 'Small', 'Medium', or 'Large'.";
pub const INVALID_FEEDBACK: &str =
    "Invalid feedback. It must be in the format 'rating|feedback message'.";
pub const INVALID_COORDS: &str = "Invalid delivery coordinates. Latitude must be between -90 and 90, and longitude must be between -180 and 180.";
pub const INVALID_JOB_ID: &str = "Invalid job ID. It must be 'INP-' followed by 13 digits.";
pub const MISSING_CUSTOMER: &str = "Missing customer ID.";
pub const MISSING_ADDRESS: &str = "Missing delivery address.";

const ALLOWED_DETAILS: [&str; 8] = [
    "Front Only",
    "Back Only",
    "Front & Back",
    "None",
    "Driveway",
    "Sidewalks",
    "Front Porch",
    "Back Porch",
];

pub const EDGING_PREFIX: &str = "Edging: ";
pub const CUSTOM_INSTRUCTIONS_PREFIX: &str = "Custom Instructions: ";

// M/d/yy h tt, e.g. "1/5/25 8 PM"
static SCHEDULE_SLOT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{1,2})/(\d{1,2})/(\d{2}) (\d{1,2}) (AM|PM)$")
        .expect("schedule slot pattern compiles")
});

/// Validate a job request. Returns every violated rule's message, empty when valid.
pub fn validate(request: &JobRequest) -> Vec<String> {
    let checks: [(bool, &str); 11] = [
        (
            request.job_id.as_deref().map_or(true, is_valid_job_id),
            INVALID_JOB_ID,
        ),
        (is_present(request.customer_id.as_deref()), MISSING_CUSTOMER),
        (valid_job_type(request.job_type.as_deref()), INVALID_JOB_TYPE),
        (valid_job_details(&request.job_details), INVALID_JOB_DETAILS),
        (
            valid_custom_instructions(request.custom_instructions.as_deref()),
            INVALID_CUSTOM_INSTRUCTIONS,
        ),
        (
            valid_scheduled_type(request.scheduled_type.as_deref()),
            INVALID_SCHEDULED_TYPE,
        ),
        (
            valid_scheduled_time(request.scheduled_time.as_deref()),
            INVALID_SCHEDULED_TIME,
        ),
        (valid_size(request.size.as_deref()), INVALID_SIZE),
        (valid_feedback(request.feedback.as_deref()), INVALID_FEEDBACK),
        (valid_coords(request.delivery_coords.as_ref()), INVALID_COORDS),
        (is_present(request.delivery_address.as_deref()), MISSING_ADDRESS),
    ];

    checks
        .into_iter()
        .filter(|(ok, _)| !ok)
        .map(|(_, message)| message.to_string())
        .collect()
}

fn is_present(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.trim().is_empty())
}

fn valid_job_type(job_type: Option<&str>) -> bool {
    job_type.is_some_and(|t| t.parse::<JobType>().is_ok())
}

/// Details are checked in the sanitized form they are stored in.
fn valid_job_details(details: &[String]) -> bool {
    !details.is_empty()
        && details.iter().all(|detail| {
            let detail = sanitize(detail);
            !detail.is_empty()
                && (ALLOWED_DETAILS.contains(&detail.as_str())
                    || detail.starts_with(CUSTOM_INSTRUCTIONS_PREFIX)
                    || detail.starts_with(EDGING_PREFIX))
        })
}

fn valid_custom_instructions(text: Option<&str>) -> bool {
    text.map_or(true, |t| t.chars().count() <= MAX_CUSTOM_INSTRUCTIONS)
}

fn valid_scheduled_type(scheduled_type: Option<&str>) -> bool {
    scheduled_type.is_some_and(|t| t.parse::<ScheduleType>().is_ok())
}

fn valid_scheduled_time(scheduled_time: Option<&str>) -> bool {
    match scheduled_time {
        None | Some("") => true,
        Some(window) => {
            let slots: Vec<&str> = window.split('|').collect();
            slots.len() == 2 && slots.iter().all(|slot| valid_schedule_slot(slot))
        }
    }
}

/// One `M/d/yy h tt` slot naming a real calendar date and a 12-hour clock hour.
pub fn valid_schedule_slot(slot: &str) -> bool {
    let Some(caps) = SCHEDULE_SLOT.captures(slot) else {
        return false;
    };
    let number = |i: usize| caps[i].parse::<u32>().ok();
    match (number(1), number(2), number(3), number(4)) {
        (Some(month), Some(day), Some(year), Some(hour)) => {
            (1..=12).contains(&hour)
                && NaiveDate::from_ymd_opt(2000 + year as i32, month, day).is_some()
        }
        _ => false,
    }
}

fn valid_size(size: Option<&str>) -> bool {
    size.is_some_and(|s| s.parse::<Size>().is_ok())
}

fn valid_feedback(feedback: Option<&str>) -> bool {
    let Some(feedback) = feedback.filter(|f| !f.is_empty()) else {
        return true;
    };
    let parts: Vec<&str> = feedback.split('|').collect();
    if parts.len() != 2 {
        return false;
    }
    let rating_ok = parts[0]
        .parse::<u8>()
        .is_ok_and(|rating| (1..=5).contains(&rating));
    rating_ok && !parts[1].trim().is_empty()
}

fn valid_coords(coords: Option<&HashMap<String, f64>>) -> bool {
    let Some(coords) = coords.filter(|c| c.len() == 2) else {
        return false;
    };
    match (coords.get("lat"), coords.get("lon")) {
        (Some(lat), Some(lon)) => (-90.0..=90.0).contains(lat) && (-180.0..=180.0).contains(lon),
        _ => false,
    }
}
