//! INI parsing: `Ini` → `ConfigFile`.
//!
//! The single place where INI key names map to struct fields. Parsing starts
//! from the defaults and overlays whatever the file sets.

use ini::{Ini, Properties};
use std::path::PathBuf;
use std::str::FromStr;

use super::defaults::{clamp_max_attempts, MAX_ATTEMPTS_LIMIT};
use super::file::ConfigFileError;
use super::settings::ConfigFile;
use crate::tile::MAX_ZOOM;

pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [cache]
    if let Some(section) = ini.section(Some("cache")) {
        if let Some(v) = section.get("capacity") {
            config.cache.capacity = parse_number("cache", "capacity", v, "must be a positive integer (tiles)")?;
        }
        if let Some(v) = section.get("pool_buffers") {
            config.cache.pool_buffers =
                parse_number("cache", "pool_buffers", v, "must be a non-negative integer")?;
        }
        if let Some(v) = non_empty(section, "namespace") {
            config.cache.namespace = v.to_string();
        }
    }

    // [network]
    if let Some(section) = ini.section(Some("network")) {
        if let Some(v) = section.get("use_data_connection") {
            config.network.use_data_connection =
                parse_bool("network", "use_data_connection", v)?;
        }
    }

    // [archive]
    if let Some(section) = ini.section(Some("archive")) {
        if let Some(v) = non_empty(section, "directory") {
            config.archive.directory = Some(expand_tilde(v));
        }
        if let Some(v) = non_empty(section, "extension") {
            config.archive.extension = v.trim_start_matches('.').to_string();
        }
        if let Some(v) = non_empty(section, "max_age") {
            config.archive.max_age_secs =
                Some(parse_number("archive", "max_age", v, "must be a positive integer (seconds)")?);
        }
        if let Some(v) = section.get("threads") {
            config.archive.threads = parse_positive("archive", "threads", v)?;
        }
        if let Some(v) = section.get("queue_size") {
            config.archive.queue_size = parse_positive("archive", "queue_size", v)?;
        }
        if let Some(v) = section.get("min_zoom") {
            config.archive.min_zoom = parse_zoom("archive", "min_zoom", v)?;
        }
        if let Some(v) = section.get("max_zoom") {
            config.archive.max_zoom = parse_zoom("archive", "max_zoom", v)?;
        }
        check_zoom_range("archive", config.archive.min_zoom, config.archive.max_zoom)?;
    }

    // [download]
    if let Some(section) = ini.section(Some("download")) {
        if let Some(v) = non_empty(section, "url") {
            config.download.url = Some(v.to_string());
        }
        if let Some(v) = section.get("mirrors") {
            config.download.mirrors = v
                .split(',')
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(v) = section.get("threads") {
            config.download.threads = parse_positive("download", "threads", v)?;
        }
        if let Some(v) = section.get("queue_size") {
            config.download.queue_size = parse_positive("download", "queue_size", v)?;
        }
        if let Some(v) = section.get("max_attempts") {
            let reason = format!("must be an integer (clamped to 1-{})", MAX_ATTEMPTS_LIMIT);
            let attempts: u32 = parse_number("download", "max_attempts", v, &reason)?;
            config.download.max_attempts = clamp_max_attempts(attempts);
        }
        if let Some(v) = section.get("timeout") {
            config.download.timeout_secs =
                parse_number("download", "timeout", v, "must be a positive integer (seconds)")?;
        }
        if let Some(v) = section.get("min_zoom") {
            config.download.min_zoom = parse_zoom("download", "min_zoom", v)?;
        }
        if let Some(v) = section.get("max_zoom") {
            config.download.max_zoom = parse_zoom("download", "max_zoom", v)?;
        }
        check_zoom_range("download", config.download.min_zoom, config.download.max_zoom)?;
        if let Some(v) = non_empty(section, "user_agent") {
            config.download.user_agent = v.to_string();
        }
    }

    // [logging]
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = non_empty(section, "directory") {
            config.logging.directory = expand_tilde(v);
        }
        if let Some(v) = non_empty(section, "file") {
            config.logging.file = v.to_string();
        }
    }

    Ok(config)
}

fn non_empty<'a>(section: &'a Properties, key: &str) -> Option<&'a str> {
    section.get(key).map(str::trim).filter(|v| !v.is_empty())
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_number<T: FromStr>(
    section: &str,
    key: &str,
    value: &str,
    reason: &str,
) -> Result<T, ConfigFileError> {
    value
        .trim()
        .parse()
        .map_err(|_| invalid(section, key, value, reason))
}

fn parse_positive(section: &str, key: &str, value: &str) -> Result<usize, ConfigFileError> {
    match parse_number::<usize>(section, key, value, "must be a positive integer")? {
        0 => Err(invalid(section, key, value, "must be a positive integer")),
        n => Ok(n),
    }
}

fn parse_zoom(section: &str, key: &str, value: &str) -> Result<u8, ConfigFileError> {
    let reason = format!("must be a zoom level between 0 and {}", MAX_ZOOM);
    let zoom: u8 = parse_number(section, key, value, &reason)?;
    if zoom > MAX_ZOOM {
        return Err(invalid(section, key, value, &reason));
    }
    Ok(zoom)
}

fn check_zoom_range(section: &str, min: u8, max: u8) -> Result<(), ConfigFileError> {
    if min > max {
        return Err(invalid(
            section,
            "min_zoom",
            &min.to_string(),
            &format!("must not exceed max_zoom ({})", max),
        ));
    }
    Ok(())
}

/// Parse a boolean value (true/false, 1/0, yes/no, on/off).
pub(super) fn parse_bool(section: &str, key: &str, value: &str) -> Result<bool, ConfigFileError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(invalid(section, key, value, "must be true or false")),
    }
}

/// Expand ~ to the home directory.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}
