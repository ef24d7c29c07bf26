use crate::config::AppConfigOverrides;
use anyhow::{anyhow, bail, Context, Result};
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CliOptions {
    width: Option<u32>,
    height: Option<u32>,
    vsync: Option<bool>,
    archive: Option<PathBuf>,
}

impl CliOptions {
    pub fn parse_from_env() -> Result<Self> {
        Self::parse(env::args())
    }

    pub fn parse<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut options = CliOptions::default();
        let mut iter = args.into_iter();
        let _ = iter.next(); // skip program name if present
        while let Some(raw_flag) = iter.next() {
            let flag = raw_flag.as_ref();
            if !flag.starts_with("--") {
                bail!(
                    "Unexpected argument '{flag}'. Use --width/--height/--vsync/--archive with values."
                );
            }
            let key = &flag[2..];
            let value = iter
                .next()
                .ok_or_else(|| anyhow!("Expected a value after '{flag}'"))?
                .as_ref()
                .to_string();
            match key {
                "width" => {
                    options.width = Some(
                        value.parse::<u32>().with_context(|| format!("Invalid width '{value}'"))?,
                    );
                }
                "height" => {
                    options.height = Some(
                        value.parse::<u32>().with_context(|| format!("Invalid height '{value}'"))?,
                    );
                }
                "vsync" => {
                    options.vsync = Some(parse_bool_flag("vsync", &value)?);
                }
                "archive" => {
                    options.archive = Some(PathBuf::from(value));
                }
                _ => bail!(
                    "Unknown flag '{flag}'. Supported flags: --width, --height, --vsync, --archive."
                ),
            }
        }
        Ok(options)
    }

    pub fn config_overrides(&self) -> AppConfigOverrides {
        AppConfigOverrides { width: self.width, height: self.height, vsync: self.vsync }
    }

    pub fn archive(&self) -> Option<&PathBuf> {
        self.archive.as_ref()
    }
}

fn parse_bool_flag(flag: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Ok(true),
        "0" | "false" | "off" | "no" => Ok(false),
        other => bail!("Invalid {flag} value '{other}'. Use on/off or true/false."),
    }
}
