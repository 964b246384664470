use super::ClipDescriptor;
use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

/// `GameName_MM-DD-YYYY_H-M-S-ms.ext`, game name may itself contain underscores
const CLIP_FILENAME_PATTERN: &str =
    r"^(.+?)_([0-9]{2}-[0-9]{2}-[0-9]{4})_([0-9]{1,2}-[0-9]{1,2}-[0-9]{1,2}-[0-9]{1,3})\.(.+)$";

fn clip_filename_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(CLIP_FILENAME_PATTERN).expect("clip filename pattern is valid"))
}

/// Parse an Outplayed clip filename such as `Valorant_07-12-2025_23-41-33-933.mp4`.
///
/// Never fails: a non-matching name produces a descriptor with only the
/// original filename set, and out-of-range date or time components leave
/// the timestamp unset while keeping the raw strings.
pub fn parse_clip_filename(filename: &str) -> ClipDescriptor {
    let Some(captures) = clip_filename_regex().captures(filename) else {
        debug!("Filename does not follow clip naming convention: {}", filename);
        return ClipDescriptor::unparsed(filename);
    };

    let date = captures[2].to_string();
    let time = captures[3].to_string();
    let timestamp = parse_capture_time(&date, &time);

    if timestamp.is_none() {
        debug!("Invalid capture date/time in {}: {} {}", filename, date, time);
    }

    ClipDescriptor {
        game_name: Some(captures[1].replace('_', " ")),
        date: Some(date),
        time: Some(time),
        timestamp,
        extension: Some(captures[4].to_string()),
        ..ClipDescriptor::unparsed(filename)
    }
}

/// Month-day-year date plus hour-minute-second-fraction time.
/// Fractional seconds are validated but dropped.
fn parse_capture_time(date: &str, time: &str) -> Option<NaiveDateTime> {
    let date_parts = split_numbers(date)?;
    let time_parts = split_numbers(time)?;

    let [month, day, year] = date_parts[..] else {
        return None;
    };
    let [hour, minute, second, _fraction] = time_parts[..] else {
        return None;
    };

    NaiveDate::from_ymd_opt(i32::try_from(year).ok()?, month, day)?.and_hms_opt(hour, minute, second)
}

fn split_numbers(value: &str) -> Option<Vec<u32>> {
    value.split('-').map(|part| part.parse().ok()).collect()
}
