use std::io::Write;

use anyhow::Context;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tracing::{debug, info};

use crate::cli::{Command, OverdueArgs, TicksArgs};
use crate::compare::classify_due;
use crate::config::Config;
use crate::instant::{parse_instant, parse_timezone, to_civil_date};
use crate::locale::locale_from_key;
use crate::render::{DueReport, Renderer};
use crate::ticks::{ViewMode, generate_ticks};

/// Runs one command. `clock` is the wall-clock reading taken once by the
/// caller; nothing below reads the clock again.
#[tracing::instrument(skip_all)]
pub fn dispatch<W: Write>(
    cfg: &Config,
    renderer: &Renderer,
    command: Command,
    clock: DateTime<Utc>,
    out: &mut W,
) -> anyhow::Result<()> {
    match command {
        Command::Ticks(args) => cmd_ticks(cfg, renderer, args, clock, out),
        Command::Overdue(args) => cmd_overdue(cfg, renderer, args, clock, out),
    }
}

fn resolve_timezone(cfg: &Config, flag: Option<&str>) -> anyhow::Result<Tz> {
    match flag {
        Some(raw) => parse_timezone(raw).context("invalid --tz"),
        None => Ok(cfg.timezone),
    }
}

fn resolve_now(
    cfg: &Config,
    flag: Option<&str>,
    clock: DateTime<Utc>,
    timezone: Tz,
) -> anyhow::Result<DateTime<Utc>> {
    match flag {
        Some(raw) => parse_instant(raw, clock, cfg.offset_policy, timezone)
            .with_context(|| format!("invalid --now: {raw}")),
        None => Ok(clock),
    }
}

#[tracing::instrument(skip(cfg, renderer, clock, out))]
fn cmd_ticks<W: Write>(
    cfg: &Config,
    renderer: &Renderer,
    args: TicksArgs,
    clock: DateTime<Utc>,
    out: &mut W,
) -> anyhow::Result<()> {
    let timezone = resolve_timezone(cfg, args.timezone.as_deref())?;
    let now = resolve_now(cfg, args.now.as_deref(), clock, timezone)?;

    let mode = match args.mode.as_deref() {
        Some(raw) => raw.parse::<ViewMode>().context("invalid --mode")?,
        None => cfg.mode,
    };
    let locale = match args.locale.as_deref() {
        Some(raw) => locale_from_key(raw).context("invalid --locale")?,
        None => cfg.locale()?,
    };

    let start = parse_instant(&args.start, now, cfg.offset_policy, timezone)
        .with_context(|| format!("invalid --start: {}", args.start))?;
    let end = parse_instant(&args.end, now, cfg.offset_policy, timezone)
        .with_context(|| format!("invalid --end: {}", args.end))?;
    debug!(%start, %end, %mode, locale = locale.key(), %timezone, "resolved tick request");

    let ticks = generate_ticks(start, end, mode, locale.as_ref(), timezone)?;
    info!(count = ticks.len(), "generated ticks");

    if args.json {
        renderer.print_json(out, &ticks)
    } else {
        renderer.print_ticks(out, &ticks)
    }
}

#[tracing::instrument(skip(cfg, renderer, clock, out))]
fn cmd_overdue<W: Write>(
    cfg: &Config,
    renderer: &Renderer,
    args: OverdueArgs,
    clock: DateTime<Utc>,
    out: &mut W,
) -> anyhow::Result<()> {
    let timezone = resolve_timezone(cfg, args.timezone.as_deref())?;
    let now = resolve_now(cfg, args.now.as_deref(), clock, timezone)?;
    let due = parse_instant(&args.due, now, cfg.offset_policy, timezone)
        .with_context(|| format!("invalid --due: {}", args.due))?;

    let status = classify_due(due, now, timezone)?;
    let report = DueReport::new(
        to_civil_date(due, timezone)?,
        to_civil_date(now, timezone)?,
        timezone,
        status,
    );
    info!(status = status.as_key(), "classified due date");

    if args.json {
        renderer.print_json(out, &report)
    } else {
        renderer.print_due(out, &report)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn clock() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 11, 24, 3, 0, 0)
            .single()
            .expect("valid clock")
    }

    fn run(command: Command) -> anyhow::Result<String> {
        let mut out = Vec::new();
        dispatch(&Config::default(), &Renderer::plain(), command, clock(), &mut out)?;
        Ok(String::from_utf8(out)?)
    }

    fn ticks_args(start: &str, end: &str) -> TicksArgs {
        TicksArgs {
            start: start.to_string(),
            end: end.to_string(),
            mode: None,
            locale: None,
            timezone: None,
            now: None,
            json: true,
        }
    }

    #[test]
    fn ticks_command_emits_json() {
        let text = run(Command::Ticks(ticks_args("today", "+2d"))).expect("ticks");
        let value: serde_json::Value = serde_json::from_str(&text).expect("json");
        let dates: Vec<_> = value
            .as_array()
            .expect("array")
            .iter()
            .map(|tick| tick["date"].as_str().unwrap_or_default().to_string())
            .collect();
        assert_eq!(dates, vec!["2025-11-24", "2025-11-25", "2025-11-26"]);
        assert_eq!(value[0]["label"], "11/24");
    }

    #[test]
    fn ticks_command_rejects_inverted_range() {
        let err = run(Command::Ticks(ticks_args("+1d", "now"))).expect_err("inverted");
        assert!(format!("{err:#}").contains("invalid range"));
    }

    #[test]
    fn ticks_command_rejects_offsetless_input() {
        let err = run(Command::Ticks(ticks_args("2025-11-24", "+1d"))).expect_err("strict");
        assert!(format!("{err:#}").contains("no UTC offset"));
    }

    #[test]
    fn overdue_command_reports_status() {
        let text = run(Command::Overdue(OverdueArgs {
            due: "2025-11-23T00:00:00+09:00".to_string(),
            now: None,
            timezone: None,
            json: true,
        }))
        .expect("overdue");
        let value: serde_json::Value = serde_json::from_str(&text).expect("json");
        assert_eq!(value["status"], "overdue");
        assert_eq!(value["overdue"], true);
        assert_eq!(value["today"], "2025-11-24");
        assert_eq!(value["timezone"], "Asia/Tokyo");
    }

    #[test]
    fn overdue_command_reports_unrepresentable_due_date() {
        let err = run(Command::Overdue(OverdueArgs {
            due: "+136808381999m".to_string(),
            now: None,
            timezone: Some("Pacific/Kiritimati".to_string()),
            json: true,
        }))
        .expect_err("out of range");
        assert!(format!("{err:#}").contains("no representable date"));
    }

    #[test]
    fn overdue_command_honours_tz_flag() {
        // 03:00Z on 11-24 is still 11-23 in New York.
        let text = run(Command::Overdue(OverdueArgs {
            due: "2025-11-23T12:00:00-05:00".to_string(),
            now: None,
            timezone: Some("America/New_York".to_string()),
            json: true,
        }))
        .expect("overdue");
        let value: serde_json::Value = serde_json::from_str(&text).expect("json");
        assert_eq!(value["status"], "due-today");
        assert_eq!(value["overdue"], false);
    }
}
