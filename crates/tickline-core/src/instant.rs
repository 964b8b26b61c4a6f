use std::fmt;
use std::str::FromStr;

use chrono::{
  DateTime,
  Duration,
  LocalResult,
  NaiveDate,
  NaiveDateTime,
  Offset,
  TimeZone,
  Utc
};
use chrono_tz::Tz;
use regex::Regex;

use crate::civil::CivilDate;
use crate::error::{
  Result,
  TicklineError
};

/// How timestamps without an explicit
/// UTC offset are treated.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default
)]
pub enum OffsetPolicy {
  /// Reject them with `MissingOffset`.
  #[default]
  Require,
  /// Read them as wall-clock time in
  /// the canonical timezone.
  AssumeCanonical
}

impl OffsetPolicy {
  #[must_use]
  pub fn as_key(self) -> &'static str {
    match self {
      | Self::Require => "require",
      | Self::AssumeCanonical => {
        "assume-canonical"
      }
    }
  }
}

impl fmt::Display for OffsetPolicy {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    f.write_str(self.as_key())
  }
}

impl FromStr for OffsetPolicy {
  type Err = anyhow::Error;

  fn from_str(
    s: &str
  ) -> anyhow::Result<Self> {
    match s
      .trim()
      .to_ascii_lowercase()
      .as_str()
    {
      | "require" => Ok(Self::Require),
      | "assume-canonical"
      | "assume_canonical" => {
        Ok(Self::AssumeCanonical)
      }
      | other => {
        Err(anyhow::anyhow!(
          "invalid offset policy: \
           {other} (expected require \
           or assume-canonical)"
        ))
      }
    }
  }
}

pub fn parse_timezone(
  raw: &str
) -> Result<Tz> {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    return Err(
      TicklineError::InvalidTimezone {
        id:     raw.to_string(),
        reason: "timezone id is empty"
          .to_string()
      }
    );
  }

  trimmed.parse::<Tz>().map_err(|err| {
    tracing::error!(
      timezone = %trimmed,
      error = %err,
      "failed to parse timezone id"
    );
    TicklineError::InvalidTimezone {
      id:     trimmed.to_string(),
      reason: err.to_string()
    }
  })
}

/// The calendar date an observer in
/// `timezone` would write for `instant`.
///
/// # Errors
///
/// `DateOutOfRange` when the local
/// wall-clock time falls past the last
/// representable date, as happens near
/// `DateTime::<Utc>::MAX_UTC` in zones
/// ahead of UTC.
pub fn to_civil_date(
  instant: DateTime<Utc>,
  timezone: Tz
) -> Result<CivilDate> {
  let utc = instant.naive_utc();
  let offset = timezone
    .offset_from_utc_datetime(&utc)
    .fix();
  utc
    .checked_add_offset(offset)
    .map(|local| {
      CivilDate::from(local.date())
    })
    .ok_or_else(|| {
      TicklineError::DateOutOfRange {
        instant,
        timezone: timezone.to_string()
      }
    })
}

/// First instant of `date` in
/// `timezone`.
pub fn start_of_day(
  date: CivilDate,
  timezone: Tz
) -> Result<DateTime<Utc>> {
  let midnight = date
    .to_naive()
    .and_hms_opt(0, 0, 0)
    .ok_or(TicklineError::InvalidDate {
      year:  date.year(),
      month: date.month(),
      day:   date.day()
    })?;
  match timezone
    .from_local_datetime(&midnight)
  {
    | LocalResult::None => {
      // Zones that skip midnight on a
      // transition day start at the
      // first valid hour.
      (1..=23)
        .filter_map(|hour| {
          date
            .to_naive()
            .and_hms_opt(hour, 0, 0)
        })
        .find_map(|ndt| {
          timezone
            .from_local_datetime(&ndt)
            .earliest()
        })
        .map(|dt| {
          dt.with_timezone(&Utc)
        })
        .ok_or_else(|| {
          TicklineError::NonexistentLocalTime {
            input:    date.to_string(),
            timezone: timezone
              .to_string()
          }
        })
    }
    | other => {
      to_utc_from_local(
        other,
        &midnight.to_string(),
        timezone
      )
    }
  }
}

fn to_utc_from_local(
  result: LocalResult<DateTime<Tz>>,
  input: &str,
  timezone: Tz
) -> Result<DateTime<Utc>> {
  match result {
    | LocalResult::Single(local_dt) => {
      Ok(local_dt.with_timezone(&Utc))
    }
    | LocalResult::Ambiguous(
      first,
      second
    ) => {
      tracing::warn!(
        input,
        first = %first,
        second = %second,
        "ambiguous local datetime; using earliest"
      );
      let chosen = if first <= second {
        first
      } else {
        second
      };
      Ok(chosen.with_timezone(&Utc))
    }
    | LocalResult::None => {
      Err(
        TicklineError::NonexistentLocalTime {
          input:    input.to_string(),
          timezone: timezone.to_string()
        }
      )
    }
  }
}

/// Parses an instant at the input
/// boundary.
///
/// `now` is only used for the `now`,
/// `today`/`tomorrow`/`yesterday` and
/// `+Nd`/`-Nh`/`+Nm` forms; the clock is
/// never read here. Timestamps lacking an
/// explicit offset go through `policy`
/// and, when accepted, are resolved in
/// `canonical`, never the machine zone.
#[tracing::instrument(skip(now, canonical), fields(input = input))]
pub fn parse_instant(
  input: &str,
  now: DateTime<Utc>,
  policy: OffsetPolicy,
  canonical: Tz
) -> Result<DateTime<Utc>> {
  let token = input.trim();
  let lower =
    token.to_ascii_lowercase();

  match lower.as_str() {
    | "now" => return Ok(now),
    | "today" => {
      return start_of_day(
        to_civil_date(now, canonical)?,
        canonical
      );
    }
    | "tomorrow" | "yesterday" => {
      let today =
        to_civil_date(now, canonical)?
          .to_naive();
      let shifted = if lower
        == "tomorrow"
      {
        today.succ_opt()
      } else {
        today.pred_opt()
      }
      .ok_or_else(|| {
        TicklineError::InvalidInstant(
          input.to_string()
        )
      })?;
      return start_of_day(
        CivilDate::from(shifted),
        canonical
      );
    }
    | _ => {}
  }

  if let Some(shifted) =
    parse_relative(token, now)?
  {
    return Ok(shifted);
  }

  if let Ok(ndt) =
    NaiveDateTime::parse_from_str(
      token,
      "%Y%m%dT%H%M%SZ"
    )
  {
    return Ok(DateTime::<Utc>::from_naive_utc_and_offset(ndt, Utc));
  }

  if let Ok(dt) =
    DateTime::parse_from_rfc3339(token)
  {
    return Ok(dt.with_timezone(&Utc));
  }

  if let Some(naive) =
    parse_offsetless(token)
  {
    return match policy {
      | OffsetPolicy::Require => {
        tracing::warn!(
          input = token,
          "rejecting timestamp without utc offset"
        );
        Err(
          TicklineError::MissingOffset(
            token.to_string()
          )
        )
      }
      | OffsetPolicy::AssumeCanonical => {
        tracing::debug!(
          input = token,
          timezone = %canonical,
          "resolving offset-less timestamp in canonical timezone"
        );
        to_utc_from_local(
          canonical
            .from_local_datetime(&naive),
          token,
          canonical
        )
      }
    };
  }

  Err(TicklineError::InvalidInstant(
    input.to_string()
  ))
}

fn parse_relative(
  token: &str,
  now: DateTime<Utc>
) -> Result<Option<DateTime<Utc>>> {
  let rel_re = Regex::new(
    r"^(?P<sign>[+-])(?P<num>\d+)(?P<unit>[dhm])$"
  )
  .map_err(|_| {
    TicklineError::InvalidInstant(
      token.to_string()
    )
  })?;

  let Some(caps) =
    rel_re.captures(token)
  else {
    return Ok(None);
  };

  let invalid = || {
    TicklineError::InvalidInstant(
      token.to_string()
    )
  };
  let num: i64 = caps["num"]
    .parse()
    .map_err(|_| invalid())?;
  let duration = match &caps["unit"] {
    | "d" => Duration::try_days(num),
    | "h" => Duration::try_hours(num),
    | "m" => Duration::try_minutes(num),
    | _ => None
  }
  .ok_or_else(invalid)?;

  let shifted = if &caps["sign"] == "-"
  {
    now.checked_sub_signed(duration)
  } else {
    now.checked_add_signed(duration)
  };
  shifted.map(Some).ok_or_else(invalid)
}

fn parse_offsetless(
  token: &str
) -> Option<NaiveDateTime> {
  if let Ok(date) =
    NaiveDate::parse_from_str(
      token, "%Y-%m-%d"
    )
  {
    return date.and_hms_opt(0, 0, 0);
  }

  [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M"
  ]
  .into_iter()
  .find_map(|fmt| {
    NaiveDateTime::parse_from_str(
      token, fmt
    )
    .ok()
  })
}
