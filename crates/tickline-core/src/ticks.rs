use std::fmt;
use std::str::FromStr;

use chrono::{
  DateTime,
  Utc
};
use chrono_tz::Tz;
use serde::{
  Deserialize,
  Serialize
};

use crate::civil::CivilDate;
use crate::error::{
  Result,
  TicklineError
};
use crate::instant::{
  parse_timezone,
  to_civil_date
};
use crate::locale::Locale;

/// Upper bound on a single sequence.
pub const MAX_TICKS: usize = 100_000;

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Default,
  Serialize,
  Deserialize
)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
  #[default]
  Day,
  Week,
  Month
}

impl ViewMode {
  #[must_use]
  pub fn as_key(self) -> &'static str {
    match self {
      | Self::Day => "day",
      | Self::Week => "week",
      | Self::Month => "month"
    }
  }

  fn step(
    self,
    anchor: CivilDate,
    index: usize
  ) -> Option<CivilDate> {
    match self {
      | Self::Day => {
        anchor.checked_add_days(
          u64::try_from(index).ok()?
        )
      }
      | Self::Week => {
        anchor.checked_add_days(
          u64::try_from(index)
            .ok()?
            .checked_mul(7)?
        )
      }
      | Self::Month => {
        anchor.checked_add_months(
          u32::try_from(index).ok()?
        )
      }
    }
  }

  fn label(
    self,
    date: CivilDate,
    locale: &dyn Locale
  ) -> String {
    match self {
      | Self::Day | Self::Week => {
        locale.format_day_label(date)
      }
      | Self::Month => {
        locale.format_month_label(date)
      }
    }
  }
}

impl fmt::Display for ViewMode {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    f.write_str(self.as_key())
  }
}

impl FromStr for ViewMode {
  type Err = TicklineError;

  fn from_str(
    s: &str
  ) -> Result<Self> {
    match s
      .trim()
      .to_ascii_lowercase()
      .as_str()
    {
      | "day" => Ok(Self::Day),
      | "week" => Ok(Self::Week),
      | "month" => Ok(Self::Month),
      | _ => {
        Err(
          TicklineError::UnsupportedMode(
            s.to_string()
          )
        )
      }
    }
  }
}

/// One labeled point on the axis.
#[derive(
  Debug,
  Clone,
  PartialEq,
  Eq,
  Serialize,
  Deserialize
)]
pub struct Tick {
  pub date:       CivilDate,
  pub label:      String,
  pub is_weekend: bool
}

/// Generates the ticks covering
/// `[start, end]`, both ends inclusive
/// by civil date in `timezone`.
///
/// Tick `i` is derived from the start
/// date directly, so month ticks keep
/// the start's day-of-month wherever the
/// target month has it and clamp to the
/// month's last day otherwise.
///
/// # Errors
///
/// `InvalidRange` when `start > end`,
/// `DateOutOfRange` when either end has
/// no local date in `timezone`,
/// `RangeTooLarge` past `MAX_TICKS`.
#[tracing::instrument(skip(locale), fields(locale = locale.key()))]
pub fn generate_ticks(
  start: DateTime<Utc>,
  end: DateTime<Utc>,
  mode: ViewMode,
  locale: &dyn Locale,
  timezone: Tz
) -> Result<Vec<Tick>> {
  if start > end {
    return Err(
      TicklineError::InvalidRange {
        start,
        end
      }
    );
  }

  let first =
    to_civil_date(start, timezone)?;
  let last =
    to_civil_date(end, timezone)?;

  let mut ticks = Vec::new();
  for index in 0.. {
    // Overflow only happens past the
    // last representable date, which is
    // beyond `last` already.
    let Some(date) =
      mode.step(first, index)
    else {
      break;
    };
    if date > last {
      break;
    }
    if ticks.len() >= MAX_TICKS {
      tracing::warn!(
        %first,
        %last,
        %mode,
        "tick range exceeds limit"
      );
      return Err(
        TicklineError::RangeTooLarge {
          limit: MAX_TICKS
        }
      );
    }

    ticks.push(Tick {
      date,
      label: mode.label(date, locale),
      is_weekend: date.is_weekend()
    });
  }

  tracing::debug!(
    %first,
    %last,
    %mode,
    count = ticks.len(),
    "generated ticks"
  );
  Ok(ticks)
}

/// Same as [`generate_ticks`] with the
/// timezone given as an IANA id.
pub fn generate_ticks_in(
  start: DateTime<Utc>,
  end: DateTime<Utc>,
  mode: ViewMode,
  locale: &dyn Locale,
  timezone_id: &str
) -> Result<Vec<Tick>> {
  let timezone =
    parse_timezone(timezone_id)?;
  generate_ticks(
    start, end, mode, locale, timezone
  )
}

#[cfg(test)]
mod tests {
  use chrono::{
    DateTime,
    TimeZone,
    Utc
  };

  use super::*;
  use crate::locale::{
    English,
    Japanese
  };

  const TOKYO: Tz =
    chrono_tz::Asia::Tokyo;

  fn jst(
    y: i32,
    m: u32,
    d: u32,
    h: u32
  ) -> DateTime<Utc> {
    TOKYO
      .with_ymd_and_hms(y, m, d, h, 0, 0)
      .single()
      .expect("valid jst time")
      .with_timezone(&Utc)
  }

  fn date(
    y: i32,
    m: u32,
    d: u32
  ) -> CivilDate {
    CivilDate::from_ymd(y, m, d)
      .expect("valid date")
  }

  #[test]
  fn day_mode_counts_inclusive_days() {
    let ticks = generate_ticks(
      jst(2025, 11, 20, 18),
      jst(2025, 12, 3, 6),
      ViewMode::Day,
      &Japanese,
      TOKYO
    )
    .expect("ticks");
    let expected = date(2025, 11, 20)
      .days_until(date(2025, 12, 3))
      + 1;
    assert_eq!(
      ticks.len() as i64,
      expected
    );
    assert_eq!(
      ticks.first().map(|t| t.date),
      Some(date(2025, 11, 20))
    );
    assert_eq!(
      ticks.last().map(|t| t.date),
      Some(date(2025, 12, 3))
    );
    assert_eq!(ticks[0].label, "11/20");
  }

  #[test]
  fn single_instant_yields_one_tick() {
    let start = jst(2025, 11, 24, 9);
    let ticks = generate_ticks(
      start,
      start,
      ViewMode::Day,
      &Japanese,
      TOKYO
    )
    .expect("ticks");
    assert_eq!(ticks.len(), 1);
    assert_eq!(
      ticks[0].date,
      date(2025, 11, 24)
    );
  }

  #[test]
  fn inverted_range_is_an_error() {
    for mode in [
      ViewMode::Day,
      ViewMode::Week,
      ViewMode::Month
    ] {
      let result = generate_ticks(
        jst(2025, 11, 25, 0),
        jst(2025, 11, 24, 23),
        mode,
        &Japanese,
        TOKYO
      );
      assert!(matches!(
        result,
        Err(TicklineError::InvalidRange {
          ..
        })
      ));
    }
  }

  #[test]
  fn week_mode_keeps_seven_day_spacing()
  {
    // 2025-01-01 is a Wednesday.
    let ticks = generate_ticks(
      jst(2025, 1, 1, 0),
      jst(2025, 4, 30, 0),
      ViewMode::Week,
      &Japanese,
      TOKYO
    )
    .expect("ticks");
    assert!(ticks.len() > 2);
    for pair in ticks.windows(2) {
      assert_eq!(
        pair[0].date.days_until(pair[1].date),
        7
      );
    }
    assert!(ticks.iter().all(|tick| {
      tick.date.day_of_week() == 3
    }));
  }

  #[test]
  fn week_mode_includes_boundary_tick() {
    let ticks = generate_ticks(
      jst(2025, 1, 1, 12),
      jst(2025, 1, 15, 0),
      ViewMode::Week,
      &Japanese,
      TOKYO
    )
    .expect("ticks");
    let dates: Vec<_> =
      ticks.iter().map(|t| t.date).collect();
    assert_eq!(
      dates,
      vec![
        date(2025, 1, 1),
        date(2025, 1, 8),
        date(2025, 1, 15)
      ]
    );
  }

  #[test]
  fn month_mode_clamps_short_months() {
    let ticks = generate_ticks(
      jst(2025, 1, 31, 0),
      jst(2025, 5, 31, 0),
      ViewMode::Month,
      &Japanese,
      TOKYO
    )
    .expect("ticks");
    let dates: Vec<_> =
      ticks.iter().map(|t| t.date).collect();
    assert_eq!(
      dates,
      vec![
        date(2025, 1, 31),
        date(2025, 2, 28),
        date(2025, 3, 31),
        date(2025, 4, 30),
        date(2025, 5, 31)
      ]
    );
    let labels: Vec<_> = ticks
      .iter()
      .map(|t| t.label.as_str())
      .collect();
    assert_eq!(
      labels,
      vec!["1月", "2月", "3月", "4月", "5月"]
    );
  }

  #[test]
  fn month_mode_leap_year_february() {
    let ticks = generate_ticks(
      jst(2024, 1, 31, 0),
      jst(2024, 2, 29, 0),
      ViewMode::Month,
      &English,
      TOKYO
    )
    .expect("ticks");
    assert_eq!(ticks.len(), 2);
    assert_eq!(
      ticks[1].date,
      date(2024, 2, 29)
    );
    assert_eq!(ticks[1].label, "2");
  }

  #[test]
  fn weekend_flags_follow_civil_date() {
    // Sunday 2025-11-23 through Saturday
    // 2025-11-29.
    let ticks = generate_ticks(
      jst(2025, 11, 23, 0),
      jst(2025, 11, 29, 0),
      ViewMode::Day,
      &Japanese,
      TOKYO
    )
    .expect("ticks");
    let flags: Vec<_> = ticks
      .iter()
      .map(|t| t.is_weekend)
      .collect();
    assert_eq!(
      flags,
      vec![
        true, false, false, false,
        false, false, true
      ]
    );
  }

  #[test]
  fn timezone_decides_the_civil_dates() {
    // Saturday 15:00Z is Sunday in Tokyo.
    let instant = Utc
      .with_ymd_and_hms(
        2025, 11, 22, 15, 0, 0
      )
      .single()
      .expect("valid");
    let tokyo = generate_ticks(
      instant,
      instant,
      ViewMode::Day,
      &Japanese,
      TOKYO
    )
    .expect("tokyo");
    let utc = generate_ticks(
      instant,
      instant,
      ViewMode::Day,
      &Japanese,
      chrono_tz::UTC
    )
    .expect("utc");
    assert_eq!(
      tokyo[0].date,
      date(2025, 11, 23)
    );
    assert_eq!(
      utc[0].date,
      date(2025, 11, 22)
    );
    assert!(tokyo[0].is_weekend);
    assert!(utc[0].is_weekend);
  }

  #[test]
  fn repeated_calls_are_identical() {
    let run = || {
      generate_ticks(
        jst(2025, 2, 1, 0),
        jst(2025, 3, 31, 0),
        ViewMode::Week,
        &Japanese,
        TOKYO
      )
      .expect("ticks")
    };
    assert_eq!(run(), run());
  }

  #[test]
  fn string_timezone_is_validated() {
    let start = jst(2025, 1, 1, 0);
    assert!(matches!(
      generate_ticks_in(
        start,
        start,
        ViewMode::Day,
        &Japanese,
        "Not/AZone"
      ),
      Err(
        TicklineError::InvalidTimezone {
          ..
        }
      )
    ));
    assert_eq!(
      generate_ticks_in(
        start,
        start,
        ViewMode::Day,
        &Japanese,
        "Asia/Tokyo"
      )
      .expect("ticks")
      .len(),
      1
    );
  }

  #[test]
  fn huge_ranges_are_refused() {
    let result = generate_ticks(
      jst(1800, 1, 1, 0),
      jst(2200, 1, 1, 0),
      ViewMode::Day,
      &Japanese,
      TOKYO
    );
    assert_eq!(
      result,
      Err(TicklineError::RangeTooLarge {
        limit: MAX_TICKS
      })
    );
  }

  #[test]
  fn unrepresentable_local_dates_are_errors()
  {
    let max = DateTime::<Utc>::MAX_UTC;
    for mode in [
      ViewMode::Day,
      ViewMode::Week,
      ViewMode::Month
    ] {
      assert!(matches!(
        generate_ticks(
          max,
          max,
          mode,
          &Japanese,
          chrono_tz::Pacific::Kiritimati
        ),
        Err(
          TicklineError::DateOutOfRange {
            ..
          }
        )
      ));
    }
    assert_eq!(
      generate_ticks(
        max,
        max,
        ViewMode::Month,
        &Japanese,
        chrono_tz::UTC
      )
      .expect("utc ticks")
      .len(),
      1
    );
  }

  #[test]
  fn parses_mode_keys() {
    assert_eq!(
      "Week".parse::<ViewMode>(),
      Ok(ViewMode::Week)
    );
    assert_eq!(
      "quarter".parse::<ViewMode>(),
      Err(
        TicklineError::UnsupportedMode(
          "quarter".to_string()
        )
      )
    );
  }
}
