pub mod civil;
pub mod cli;
pub mod commands;
pub mod compare;
pub mod config;
pub mod error;
pub mod instant;
pub mod locale;
pub mod render;
pub mod ticks;

use std::ffi::OsString;

use clap::Parser;
use tracing::{
  debug,
  info
};

pub use civil::CivilDate;
pub use compare::{
  DueStatus,
  classify_due,
  is_before_today,
  is_before_today_in
};
pub use error::{
  Result,
  TicklineError
};
pub use instant::{
  OffsetPolicy,
  parse_instant,
  parse_timezone,
  to_civil_date
};
pub use locale::{
  English,
  Iso,
  Japanese,
  Locale,
  locale_from_key
};
pub use ticks::{
  MAX_TICKS,
  Tick,
  ViewMode,
  generate_ticks,
  generate_ticks_in
};

#[tracing::instrument(skip_all)]
pub fn run(
  raw_args: Vec<OsString>
) -> anyhow::Result<()> {
  let cli =
    cli::GlobalCli::parse_from(raw_args);

  cli::init_tracing(
    cli.verbose,
    cli.quiet
  )?;

  info!(
    verbose = cli.verbose,
    quiet = cli.quiet,
    "starting tickline CLI"
  );

  let mut cfg = config::Config::load(
    cli.config.as_deref()
  )?;
  cfg.apply_overrides(
    cli
      .rc_overrides
      .into_iter()
      .map(|kv| (kv.key, kv.value))
  )?;
  debug!(?cfg, "resolved config");

  let renderer =
    render::Renderer::new(&cfg);
  let clock = chrono::Utc::now();
  let mut out =
    std::io::stdout().lock();

  commands::dispatch(
    &cfg,
    &renderer,
    cli.command,
    clock,
    &mut out
  )?;

  info!("done");
  Ok(())
}
