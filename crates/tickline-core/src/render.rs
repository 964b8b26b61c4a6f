use std::io::{self, IsTerminal, Write};

use chrono_tz::Tz;
use serde::Serialize;
use unicode_width::UnicodeWidthStr;

use crate::civil::CivilDate;
use crate::compare::DueStatus;
use crate::config::Config;
use crate::ticks::Tick;

const WEEKDAY_NAMES: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

#[derive(Debug, Clone, Serialize)]
pub struct DueReport {
    pub due_date: CivilDate,
    pub today: CivilDate,
    pub timezone: String,
    pub status: DueStatus,
    pub overdue: bool,
}

impl DueReport {
    #[must_use]
    pub fn new(due_date: CivilDate, today: CivilDate, timezone: Tz, status: DueStatus) -> Self {
        Self {
            due_date,
            today,
            timezone: timezone.to_string(),
            status,
            overdue: status == DueStatus::Overdue,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    #[must_use]
    pub fn new(cfg: &Config) -> Self {
        Self {
            color: cfg.color && io::stdout().is_terminal(),
        }
    }

    #[must_use]
    pub fn plain() -> Self {
        Self { color: false }
    }

    #[tracing::instrument(skip(self, out, ticks), fields(count = ticks.len()))]
    pub fn print_ticks<W: Write>(&self, out: &mut W, ticks: &[Tick]) -> anyhow::Result<()> {
        let headers = vec![
            "Date".to_string(),
            "Day".to_string(),
            "Label".to_string(),
            "Weekend".to_string(),
        ];

        let rows = ticks
            .iter()
            .map(|tick| {
                let weekday = WEEKDAY_NAMES[tick.date.day_of_week() as usize].to_string();
                let weekend = if tick.is_weekend { "yes" } else { "" }.to_string();
                let row = vec![tick.date.to_string(), weekday, tick.label.clone(), weekend];
                if tick.is_weekend {
                    row.into_iter().map(|cell| self.paint(&cell, "31")).collect()
                } else {
                    row
                }
            })
            .collect();

        write_table(out, headers, rows)
    }

    pub fn print_due<W: Write>(&self, out: &mut W, report: &DueReport) -> anyhow::Result<()> {
        let badge = match report.status {
            DueStatus::Overdue => self.paint("OVERDUE", "31"),
            DueStatus::DueToday => self.paint("DUE TODAY", "33"),
            DueStatus::Upcoming => self.paint("upcoming", "32"),
        };
        writeln!(out, "status    {badge}")?;
        writeln!(out, "due       {}", report.due_date)?;
        writeln!(out, "today     {}", report.today)?;
        writeln!(out, "timezone  {}", report.timezone)?;
        Ok(())
    }

    pub fn print_json<W: Write, T: Serialize + ?Sized>(
        &self,
        out: &mut W,
        value: &T,
    ) -> anyhow::Result<()> {
        serde_json::to_writer_pretty(&mut *out, value)?;
        writeln!(out)?;
        Ok(())
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn write_table<W: Write>(
    writer: &mut W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(header.as_str()));
    }

    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    let cells = |writer: &mut W, row: &[String]| -> io::Result<()> {
        let line = row
            .iter()
            .zip(&widths)
            .map(|(cell, width)| {
                let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
                format!("{cell}{}", " ".repeat(width.saturating_sub(visible_width)))
            })
            .collect::<Vec<_>>()
            .join(" ");
        writeln!(writer, "{}", line.trim_end())
    };

    cells(writer, &headers)?;
    let rule: Vec<String> = widths.iter().map(|width| "-".repeat(*width)).collect();
    cells(writer, &rule)?;
    for row in &rows {
        cells(writer, row)?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}
