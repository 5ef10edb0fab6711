//! Display formatting for currency amounts and times.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use walletview_types::Timestamp;

use crate::SyncError;

/// Smallest units per displayed unit.
pub const UNITS_PER_COIN: u128 = 100;

/// Render an amount in smallest units as a fixed two-decimal string with
/// thousands separators: `125000` → `"1,250.00"`, `-5` → `"-0.05"`.
pub fn format_currency(amount: i128) -> String {
    let magnitude = amount.unsigned_abs();
    let whole = (magnitude / UNITS_PER_COIN).to_string();
    let cents = magnitude % UNITS_PER_COIN;

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3 + 4);
    if amount < 0 {
        grouped.push('-');
    }
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    format!("{grouped}.{cents:02}")
}

fn to_zoned(ts: Timestamp, tz: &Tz) -> Option<DateTime<Tz>> {
    let secs = i64::try_from(ts.as_secs()).ok()?;
    DateTime::<Utc>::from_timestamp(secs, 0).map(|utc| utc.with_timezone(tz))
}

/// Render an epoch timestamp in `tz` as `YYYY/MM/DD HH:MM:SS±HHMM (ABBR)`.
///
/// Timestamps chrono cannot represent fall back to the raw seconds.
pub fn format_timestamp(ts: Timestamp, tz: &Tz) -> String {
    match to_zoned(ts, tz) {
        Some(local) => local.format("%Y/%m/%d %H:%M:%S%z (%Z)").to_string(),
        None => ts.to_string(),
    }
}

/// Render the wall-clock part (`HH:MM:SS`) of `ts` in `tz`.
pub fn format_clock_time(ts: Timestamp, tz: &Tz) -> String {
    match to_zoned(ts, tz) {
        Some(local) => local.format("%H:%M:%S").to_string(),
        None => ts.to_string(),
    }
}

/// Pick the display zone: the configured name, else `TZ`, else the system
/// zone, else UTC.
///
/// An explicitly configured but unknown zone is an error; an unusable `TZ`
/// value (e.g. a file path) or system zone is skipped.
pub fn resolve_timezone(configured: Option<&str>) -> Result<Tz, SyncError> {
    let system = match iana_time_zone::get_timezone() {
        Ok(name) => Some(name),
        Err(e) => {
            tracing::debug!(error = %e, "cannot determine system time zone");
            None
        }
    };
    resolve_timezone_from(configured, std::env::var("TZ").ok(), system)
}

fn resolve_timezone_from(
    configured: Option<&str>,
    env_tz: Option<String>,
    system: Option<String>,
) -> Result<Tz, SyncError> {
    if let Some(name) = configured {
        return name
            .parse::<Tz>()
            .map_err(|e| SyncError::Config(format!("unknown time zone '{name}': {e}")));
    }

    let fallbacks = [("TZ", env_tz), ("system", system)];
    for (source, name) in fallbacks {
        let Some(name) = name else { continue };
        match name.trim_start_matches(':').parse::<Tz>() {
            Ok(tz) => return Ok(tz),
            Err(_) => tracing::debug!(source, tz = %name, "not an IANA zone name, skipping"),
        }
    }
    Ok(Tz::UTC)
}
