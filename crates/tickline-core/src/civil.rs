use std::fmt;
use std::str::FromStr;

use chrono::{
  Datelike,
  Days,
  Months,
  NaiveDate
};
use serde::{
  Deserialize,
  Deserializer,
  Serialize,
  Serializer
};

use crate::error::{
  Result,
  TicklineError
};

/// A calendar date with no time of day
/// and no timezone.
///
/// Field order gives the derived `Ord`
/// lexicographic (year, month, day)
/// ordering, so comparing two values
/// is a plain tuple comparison.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash
)]
pub struct CivilDate {
  year:  i32,
  month: u32,
  day:   u32
}

impl CivilDate {
  pub fn from_ymd(
    year: i32,
    month: u32,
    day: u32
  ) -> Result<Self> {
    NaiveDate::from_ymd_opt(
      year, month, day
    )
    .map(Self::from)
    .ok_or(TicklineError::InvalidDate {
      year,
      month,
      day
    })
  }

  #[must_use]
  pub fn year(self) -> i32 {
    self.year
  }

  #[must_use]
  pub fn month(self) -> u32 {
    self.month
  }

  #[must_use]
  pub fn day(self) -> u32 {
    self.day
  }

  #[must_use]
  pub fn to_naive(self) -> NaiveDate {
    // Fields are only ever set from a
    // valid NaiveDate.
    NaiveDate::from_ymd_opt(
      self.year, self.month, self.day
    )
    .unwrap_or(NaiveDate::MIN)
  }

  /// Day of week in `0..=6`, Sunday = 0.
  #[must_use]
  pub fn day_of_week(self) -> u32 {
    self
      .to_naive()
      .weekday()
      .num_days_from_sunday()
  }

  #[must_use]
  pub fn is_weekend(self) -> bool {
    matches!(self.day_of_week(), 0 | 6)
  }

  #[must_use]
  pub fn checked_add_days(
    self,
    days: u64
  ) -> Option<Self> {
    self
      .to_naive()
      .checked_add_days(Days::new(days))
      .map(Self::from)
  }

  /// Adds calendar months, clamping the
  /// day to the last valid day of the
  /// target month (Jan 31 + 1 = Feb 28
  /// or Feb 29).
  #[must_use]
  pub fn checked_add_months(
    self,
    months: u32
  ) -> Option<Self> {
    self
      .to_naive()
      .checked_add_months(Months::new(
        months
      ))
      .map(Self::from)
  }

  /// Number of days from `self` to
  /// `other`; negative when `other` is
  /// earlier.
  #[must_use]
  pub fn days_until(
    self,
    other: Self
  ) -> i64 {
    other
      .to_naive()
      .signed_duration_since(
        self.to_naive()
      )
      .num_days()
  }
}

impl From<NaiveDate> for CivilDate {
  fn from(date: NaiveDate) -> Self {
    Self {
      year:  date.year(),
      month: date.month(),
      day:   date.day()
    }
  }
}

impl fmt::Display for CivilDate {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    write!(
      f,
      "{:04}-{:02}-{:02}",
      self.year, self.month, self.day
    )
  }
}

impl FromStr for CivilDate {
  type Err = TicklineError;

  fn from_str(
    s: &str
  ) -> Result<Self> {
    NaiveDate::parse_from_str(
      s.trim(),
      "%Y-%m-%d"
    )
    .map(Self::from)
    .map_err(|_| {
      TicklineError::InvalidInstant(
        s.to_string()
      )
    })
  }
}

impl Serialize for CivilDate {
  fn serialize<S>(
    &self,
    serializer: S
  ) -> std::result::Result<S::Ok, S::Error>
  where
    S: Serializer
  {
    serializer
      .serialize_str(&self.to_string())
  }
}

impl<'de> Deserialize<'de> for CivilDate {
  fn deserialize<D>(
    deserializer: D
  ) -> std::result::Result<Self, D::Error>
  where
    D: Deserializer<'de>
  {
    let raw = String::deserialize(
      deserializer
    )?;
    raw
      .parse()
      .map_err(serde::de::Error::custom)
  }
}

#[cfg(test)]
mod tests {
  use super::CivilDate;

  fn date(
    y: i32,
    m: u32,
    d: u32
  ) -> CivilDate {
    CivilDate::from_ymd(y, m, d)
      .expect("valid date")
  }

  #[test]
  fn rejects_impossible_dates() {
    assert!(
      CivilDate::from_ymd(2025, 2, 29)
        .is_err()
    );
    assert!(
      CivilDate::from_ymd(2025, 13, 1)
        .is_err()
    );
    assert!(
      CivilDate::from_ymd(2024, 2, 29)
        .is_ok()
    );
  }

  #[test]
  fn orders_lexicographically() {
    assert!(
      date(2024, 12, 31)
        < date(2025, 1, 1)
    );
    assert!(
      date(2025, 2, 28)
        < date(2025, 3, 1)
    );
    assert!(
      date(2025, 11, 23)
        < date(2025, 11, 24)
    );
  }

  #[test]
  fn day_of_week_matches_reference_week() {
    // 2025-11-23 is a Sunday.
    let expected =
      [0, 1, 2, 3, 4, 5, 6];
    for (offset, dow) in
      expected.iter().enumerate()
    {
      let day = date(2025, 11, 23)
        .checked_add_days(offset as u64)
        .expect("in range");
      assert_eq!(day.day_of_week(), *dow);
      assert_eq!(
        day.is_weekend(),
        *dow == 0 || *dow == 6
      );
    }
  }

  #[test]
  fn month_addition_clamps_to_last_day() {
    let jan31 = date(2025, 1, 31);
    assert_eq!(
      jan31.checked_add_months(1),
      Some(date(2025, 2, 28))
    );
    assert_eq!(
      jan31.checked_add_months(2),
      Some(date(2025, 3, 31))
    );
    assert_eq!(
      date(2024, 1, 31)
        .checked_add_months(1),
      Some(date(2024, 2, 29))
    );
  }

  #[test]
  fn display_and_parse_agree() {
    let d = date(2025, 3, 7);
    assert_eq!(d.to_string(), "2025-03-07");
    assert_eq!(
      "2025-03-07"
        .parse::<CivilDate>()
        .expect("parse"),
      d
    );
  }

  #[test]
  fn days_until_is_signed() {
    assert_eq!(
      date(2025, 2, 27)
        .days_until(date(2025, 3, 1)),
      2
    );
    assert_eq!(
      date(2025, 3, 1)
        .days_until(date(2025, 2, 27)),
      -2
    );
  }
}
