use std::collections::HashMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Result, YardworkError};
use crate::jobs::sanitize::sanitize;
use crate::jobs::status::{Stage, StatusLog};

const JOB_ID_PREFIX: &str = "INP-";
const JOB_ID_DIGITS: usize = 13;

static JOB_ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^INP-\d{13}$").expect("job id pattern compiles"));

/// Generate a fresh job id: `INP-` followed by 13 random digits.
pub fn generate_job_id() -> String {
    let mut rng = rand::thread_rng();
    let digits: String = (0..JOB_ID_DIGITS)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect();
    format!("{}{}", JOB_ID_PREFIX, digits)
}

pub fn is_valid_job_id(id: &str) -> bool {
    JOB_ID_PATTERN.is_match(id)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobType {
    #[serde(rename = "Lawn Care")]
    LawnCare,
    #[serde(rename = "Snow Removal")]
    SnowRemoval,
}

impl std::fmt::Display for JobType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobType::LawnCare => write!(f, "Lawn Care"),
            JobType::SnowRemoval => write!(f, "Snow Removal"),
        }
    }
}

impl FromStr for JobType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "Lawn Care" => Ok(JobType::LawnCare),
            "Snow Removal" => Ok(JobType::SnowRemoval),
            other => Err(format!("unknown job type '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScheduleType {
    #[serde(rename = "ASAP")]
    Asap,
    Scheduled,
}

impl FromStr for ScheduleType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "ASAP" => Ok(ScheduleType::Asap),
            "Scheduled" => Ok(ScheduleType::Scheduled),
            other => Err(format!("unknown scheduled type '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Size {
    Small,
    Medium,
    Large,
}

impl FromStr for Size {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "Small" => Ok(Size::Small),
            "Medium" => Ok(Size::Medium),
            "Large" => Ok(Size::Large),
            other => Err(format!("unknown size '{}'", other)),
        }
    }
}

/// A point on the map in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coords {
    pub lat: f64,
    pub lon: f64,
}

impl Coords {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Job submission as it arrives from a client, before validation.
///
/// Every field is optional and loosely typed so the validator can report
/// all problems at once instead of failing on the first bad field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobRequest {
    pub job_id: Option<String>,
    pub customer_id: Option<String>,
    pub job_type: Option<String>,
    #[serde(default)]
    pub job_details: Vec<String>,
    pub custom_instructions: Option<String>,
    pub delivery_address: Option<String>,
    pub delivery_coords: Option<HashMap<String, f64>>,
    pub scheduled_type: Option<String>,
    pub scheduled_time: Option<String>,
    pub size: Option<String>,
    #[serde(default)]
    pub before_photos: Vec<String>,
    pub feedback: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub job_id: String,
    pub customer_id: String,
    pub provider_id: Option<String>,
    pub job_status: StatusLog,
    pub job_type: JobType,
    pub job_details: Vec<String>,
    pub custom_instructions: String,
    pub delivery_address: String,
    pub delivery_coords: Coords,
    pub scheduled_type: ScheduleType,
    pub scheduled_time: Option<String>,
    pub size: Size,
    pub before_photos: Vec<String>,
    pub after_photos: Option<Vec<String>>,
    pub feedback: Option<String>,
    /// Bumped by the store on every successful write.
    #[serde(skip)]
    pub(crate) revision: u64,
}

impl Job {
    /// Build a pending job from a request that already passed validation.
    ///
    /// Free-text fields are sanitized here. Any field that still fails to
    /// parse is reported as a validation error.
    pub fn from_request(request: JobRequest, job_id: String, placed_at: DateTime<Utc>) -> Result<Self> {
        let coords = request
            .delivery_coords
            .as_ref()
            .and_then(|c| Some(Coords::new(*c.get("lat")?, *c.get("lon")?)))
            .ok_or_else(|| YardworkError::invalid("Missing delivery coordinates."))?;

        let job_type = parse_field(request.job_type.as_deref())?;
        let scheduled_type = parse_field(request.scheduled_type.as_deref())?;
        let size = parse_field(request.size.as_deref())?;

        Ok(Self {
            job_id,
            customer_id: request.customer_id.unwrap_or_default(),
            provider_id: None,
            job_status: StatusLog::pending(placed_at),
            job_type,
            job_details: request.job_details.iter().map(|d| sanitize(d)).collect(),
            custom_instructions: sanitize(request.custom_instructions.as_deref().unwrap_or("")),
            delivery_address: request.delivery_address.unwrap_or_default(),
            delivery_coords: coords,
            scheduled_type,
            scheduled_time: request.scheduled_time.filter(|t| !t.is_empty()),
            size,
            before_photos: request.before_photos,
            after_photos: None,
            feedback: None,
            revision: 0,
        })
    }

    pub fn stage(&self) -> Stage {
        self.job_status.stage()
    }

    pub fn is_assigned(&self) -> bool {
        self.provider_id.is_some()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }
}

fn parse_field<T: FromStr<Err = String>>(value: Option<&str>) -> Result<T> {
    value
        .ok_or_else(|| "missing field".to_string())
        .and_then(str::parse)
        .map_err(YardworkError::invalid)
}
