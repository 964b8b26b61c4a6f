use std::fs;
use std::path::{
  Path,
  PathBuf
};

use anyhow::{
  Context,
  anyhow
};
use chrono_tz::Tz;
use serde::Deserialize;
use tracing::{
  debug,
  info,
  warn
};

use crate::instant::{
  OffsetPolicy,
  parse_timezone
};
use crate::locale::{
  Locale,
  locale_from_key
};
use crate::ticks::ViewMode;

const CONFIG_FILE: &str =
  "tickline.toml";
const CONFIG_ENV_VAR: &str =
  "TICKLINE_CONFIG";
const TIMEZONE_ENV_VAR: &str =
  "TICKLINE_TIMEZONE";
const LOCALE_ENV_VAR: &str =
  "TICKLINE_LOCALE";
const DEFAULT_TIMEZONE: &str =
  "Asia/Tokyo";
const DEFAULT_LOCALE: &str = "ja";

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
  timezone:      Option<String>,
  locale:        Option<String>,
  mode:          Option<String>,
  offset_policy: Option<String>,
  color:         Option<bool>
}

#[derive(Debug, Clone)]
pub struct Config {
  pub timezone:      Tz,
  pub locale:        String,
  pub mode:          ViewMode,
  pub offset_policy: OffsetPolicy,
  pub color:         bool,
  pub loaded_file:   Option<PathBuf>
}

impl Default for Config {
  fn default() -> Self {
    Self {
      timezone:      chrono_tz::Asia::Tokyo,
      locale:        DEFAULT_LOCALE
        .to_string(),
      mode:          ViewMode::Day,
      offset_policy:
        OffsetPolicy::Require,
      color:         true,
      loaded_file:   None
    }
  }
}

impl Config {
  /// Loads from the first config file
  /// found, then applies the
  /// `TICKLINE_*` environment variables.
  pub fn load(
    override_path: Option<&Path>
  ) -> anyhow::Result<Self> {
    Self::load_with_env(
      override_path,
      |key| std::env::var(key).ok()
    )
  }

  #[tracing::instrument(skip(env))]
  pub fn load_with_env<F>(
    override_path: Option<&Path>,
    env: F
  ) -> anyhow::Result<Self>
  where
    F: Fn(&str) -> Option<String>
  {
    let mut cfg = Config::default();

    match resolve_config_path(
      override_path,
      &env
    ) {
      | Some(path) => {
        info!(config = %path.display(), "loading config file");
        cfg.load_file(&path)?;
      }
      | None => {
        warn!(
          timezone = DEFAULT_TIMEZONE,
          locale = DEFAULT_LOCALE,
          "no config file found; using \
           defaults"
        );
      }
    }

    for (var, key) in [
      (TIMEZONE_ENV_VAR, "timezone"),
      (LOCALE_ENV_VAR, "locale")
    ] {
      if let Some(raw) = env(var)
        && !raw.trim().is_empty()
      {
        debug!(var, value = %raw, "applying environment override");
        cfg
          .set(key, &raw)
          .with_context(|| {
            format!("invalid {var}")
          })?;
      }
    }

    Ok(cfg)
  }

  #[tracing::instrument(skip(
    self, overrides
  ))]
  pub fn apply_overrides<I>(
    &mut self,
    overrides: I
  ) -> anyhow::Result<()>
  where
    I: IntoIterator<
      Item = (String, String)
    >
  {
    for (k, v) in overrides {
      let key = k
        .strip_prefix("rc.")
        .unwrap_or(&k)
        .to_string();
      debug!(key = %key, value = %v, "applying override");
      self.set(&key, &v).with_context(
        || {
          format!(
            "invalid override {key}={v}"
          )
        }
      )?;
    }
    Ok(())
  }

  pub fn set(
    &mut self,
    key: &str,
    value: &str
  ) -> anyhow::Result<()> {
    match key.trim() {
      | "timezone" => {
        self.timezone =
          parse_timezone(value)?;
      }
      | "locale" => {
        let locale =
          locale_from_key(value)?;
        self.locale =
          locale.key().to_string();
      }
      | "mode" => {
        self.mode = value.parse()?;
      }
      | "offset_policy" => {
        self.offset_policy =
          value.parse()?;
      }
      | "color" => {
        self.color = parse_bool(value)
          .ok_or_else(|| {
            anyhow!(
              "invalid color setting: \
               {value}"
            )
          })?;
      }
      | other => {
        return Err(anyhow!(
          "unknown config key: {other}"
        ));
      }
    }
    Ok(())
  }

  pub fn locale(
    &self
  ) -> anyhow::Result<Box<dyn Locale>> {
    Ok(locale_from_key(&self.locale)?)
  }

  fn load_file(
    &mut self,
    path: &Path
  ) -> anyhow::Result<()> {
    let raw = fs::read_to_string(path)
      .with_context(|| {
        format!(
          "failed to read {}",
          path.display()
        )
      })?;
    let parsed: FileConfig =
      toml::from_str(&raw)
        .with_context(|| {
          format!(
            "failed to parse {}",
            path.display()
          )
        })?;

    let context = || {
      format!(
        "invalid value in {}",
        path.display()
      )
    };
    if let Some(timezone) =
      parsed.timezone
    {
      self
        .set("timezone", &timezone)
        .with_context(context)?;
    }
    if let Some(locale) = parsed.locale {
      self
        .set("locale", &locale)
        .with_context(context)?;
    }
    if let Some(mode) = parsed.mode {
      self
        .set("mode", &mode)
        .with_context(context)?;
    }
    if let Some(policy) =
      parsed.offset_policy
    {
      self
        .set("offset_policy", &policy)
        .with_context(context)?;
    }
    if let Some(color) = parsed.color {
      self.color = color;
    }

    self.loaded_file =
      Some(path.to_path_buf());
    info!(
      timezone = %self.timezone,
      locale = %self.locale,
      mode = %self.mode,
      offset_policy = %self.offset_policy,
      "loaded config"
    );
    Ok(())
  }
}

fn resolve_config_path<F>(
  override_path: Option<&Path>,
  env: &F
) -> Option<PathBuf>
where
  F: Fn(&str) -> Option<String>
{
  if let Some(path) = override_path {
    return Some(path.to_path_buf());
  }

  if let Some(raw) = env(CONFIG_ENV_VAR)
  {
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
      return Some(PathBuf::from(
        trimmed
      ));
    }
  }

  let local = std::env::current_dir()
    .ok()
    .map(|dir| dir.join(CONFIG_FILE));
  let user = dirs::config_dir().map(
    |dir| {
      dir.join("tickline").join(CONFIG_FILE)
    }
  );

  [local, user]
    .into_iter()
    .flatten()
    .find(|path| path.exists())
}

fn parse_bool(s: &str) -> Option<bool> {
  match s
    .trim()
    .to_ascii_lowercase()
    .as_str()
  {
    | "1" | "y" | "yes" | "on"
    | "true" => Some(true),
    | "0" | "n" | "no" | "off"
    | "false" => Some(false),
    | _ => None
  }
}
