use chrono::{
  DateTime,
  Utc
};
use chrono_tz::Tz;
use serde::Serialize;

use crate::error::Result;
use crate::instant::{
  parse_timezone,
  to_civil_date
};

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize
)]
#[serde(rename_all = "kebab-case")]
pub enum DueStatus {
  Overdue,
  DueToday,
  Upcoming
}

impl DueStatus {
  #[must_use]
  pub fn as_key(self) -> &'static str {
    match self {
      | Self::Overdue => "overdue",
      | Self::DueToday => "due-today",
      | Self::Upcoming => "upcoming"
    }
  }
}

/// Whether `due` falls on a calendar day
/// strictly before the day of
/// `reference_now`, both read in
/// `timezone`.
///
/// # Errors
///
/// `InvalidTimezone` for an unknown id,
/// `DateOutOfRange` when either instant
/// has no local date in `timezone`.
pub fn is_before_today(
  due: DateTime<Utc>,
  reference_now: DateTime<Utc>,
  timezone: &str
) -> Result<bool> {
  let tz = parse_timezone(timezone)?;
  is_before_today_in(
    due,
    reference_now,
    tz
  )
}

pub fn is_before_today_in(
  due: DateTime<Utc>,
  reference_now: DateTime<Utc>,
  timezone: Tz
) -> Result<bool> {
  Ok(
    classify_due(
      due,
      reference_now,
      timezone
    )? == DueStatus::Overdue
  )
}

#[tracing::instrument(level = "debug")]
pub fn classify_due(
  due: DateTime<Utc>,
  reference_now: DateTime<Utc>,
  timezone: Tz
) -> Result<DueStatus> {
  let due_date =
    to_civil_date(due, timezone)?;
  let today = to_civil_date(
    reference_now,
    timezone
  )?;

  let status = match due_date.cmp(&today)
  {
    | std::cmp::Ordering::Less => {
      DueStatus::Overdue
    }
    | std::cmp::Ordering::Equal => {
      DueStatus::DueToday
    }
    | std::cmp::Ordering::Greater => {
      DueStatus::Upcoming
    }
  };
  tracing::debug!(
    %due_date,
    %today,
    status = status.as_key(),
    "classified due date"
  );
  Ok(status)
}
