//! Work item mutation bodies and their validation rule-sets.

use chrono::{DateTime, NaiveDate, Utc};
use entities::WorkStatus;
use serde::{Deserialize, Serialize};

use crate::ValidationErrors;

/// Minimum title length enforced by client create forms.
pub const CLIENT_MIN_TITLE_LEN: usize = 3;

const STATUS_CHOICES: &str = "backlog, todo, in-progress, done, cancelled";

/// Body accepted by the create and update routes.
///
/// Every field is an optional string on the wire. `null` is read as absent.
/// Which fields are required depends on the route, see
/// [`WorkMutation::validate_create`] and [`WorkMutation::validate_patch`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct WorkMutation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
}

/// Validated input of the create route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateWork {
    pub title: String,
    pub description: String,
    pub status: WorkStatus,
    pub end_date: Option<DateTime<Utc>>,
}

/// Validated input of the update route. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<WorkStatus>,
    pub end_date: Option<DateTime<Utc>>,
}

impl WorkPatch {
    /// Patch that only moves the item to `status`.
    pub fn status(status: WorkStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// Returns true if the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.end_date.is_none()
    }
}

impl WorkMutation {
    /// Body that only sets the status.
    pub fn status_change(status: WorkStatus) -> Self {
        Self {
            status: Some(status.as_str().to_string()),
            ..Self::default()
        }
    }

    /// Applies the create rule-set: title, description and status required.
    pub fn validate_create(&self) -> Result<CreateWork, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let title = required_text(&mut errors, "title", self.title.as_deref());
        let description = required_text(&mut errors, "description", self.description.as_deref());
        let status = match self.status.as_deref() {
            Some(raw) => parse_status(&mut errors, raw),
            None => {
                errors.push("status", "status is required");
                None
            }
        };
        let end_date = self
            .end_date
            .as_deref()
            .and_then(|raw| parse_end_date(&mut errors, raw));

        match (title, description, status) {
            (Some(title), Some(description), Some(status)) if errors.is_empty() => Ok(CreateWork {
                title,
                description,
                status,
                end_date,
            }),
            _ => Err(errors),
        }
    }

    /// Applies the update rule-set: every field optional, present fields must be valid.
    pub fn validate_patch(&self) -> Result<WorkPatch, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let title = self
            .title
            .as_deref()
            .and_then(|raw| required_text(&mut errors, "title", Some(raw)));
        let description = self
            .description
            .as_deref()
            .and_then(|raw| required_text(&mut errors, "description", Some(raw)));
        let status = self
            .status
            .as_deref()
            .and_then(|raw| parse_status(&mut errors, raw));
        let end_date = self
            .end_date
            .as_deref()
            .and_then(|raw| parse_end_date(&mut errors, raw));

        errors.into_result(|| WorkPatch {
            title,
            description,
            status,
            end_date,
        })
    }

    /// Create rule-set plus the stricter title length used by client forms.
    pub fn validate_create_form(&self) -> Result<CreateWork, ValidationErrors> {
        let short_title = self
            .title
            .as_deref()
            .is_some_and(|t| !t.is_empty() && t.chars().count() < CLIENT_MIN_TITLE_LEN);

        match self.validate_create() {
            Ok(work) if !short_title => Ok(work),
            Ok(_) => {
                let mut errors = ValidationErrors::new();
                push_short_title(&mut errors);
                Err(errors)
            }
            Err(mut errors) => {
                if short_title {
                    push_short_title(&mut errors);
                }
                Err(errors)
            }
        }
    }
}

impl From<&CreateWork> for WorkMutation {
    fn from(work: &CreateWork) -> Self {
        Self {
            title: Some(work.title.clone()),
            description: Some(work.description.clone()),
            status: Some(work.status.as_str().to_string()),
            end_date: work.end_date.map(|d| d.to_rfc3339()),
        }
    }
}

impl From<&WorkPatch> for WorkMutation {
    fn from(patch: &WorkPatch) -> Self {
        Self {
            title: patch.title.clone(),
            description: patch.description.clone(),
            status: patch.status.map(|s| s.as_str().to_string()),
            end_date: patch.end_date.map(|d| d.to_rfc3339()),
        }
    }
}

fn push_short_title(errors: &mut ValidationErrors) {
    errors.push(
        "title",
        format!("title must be at least {CLIENT_MIN_TITLE_LEN} characters"),
    );
}

fn required_text(errors: &mut ValidationErrors, field: &str, value: Option<&str>) -> Option<String> {
    match value {
        Some(v) if !v.is_empty() => Some(v.to_string()),
        _ => {
            errors.push(field, format!("{field} is required"));
            None
        }
    }
}

fn parse_status(errors: &mut ValidationErrors, raw: &str) -> Option<WorkStatus> {
    match raw.parse::<WorkStatus>() {
        Ok(status) => Some(status),
        Err(_) => {
            errors.push("status", format!("status must be one of {STATUS_CHOICES}"));
            None
        }
    }
}

/// Parses an ISO-8601 deadline. A bare date is read as midnight UTC.
fn parse_end_date(errors: &mut ValidationErrors, raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Some(midnight) = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    {
        return Some(midnight.and_utc());
    }
    errors.push("endDate", "endDate must be an ISO-8601 timestamp");
    None
}
