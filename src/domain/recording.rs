//! Recording file naming

use crate::domain::shared::value_objects::SipAddress;
use chrono::{DateTime, TimeZone};
use std::fmt::Display;
use std::path::{Path, PathBuf};

const RECORDING_DATE_PATTERN: &str = "%d-%m-%Y-%H-%M-%S";
const RECORDING_EXTENSION: &str = "mkv";

/// `<dir>/<name>_<dd-MM-yyyy-HH-mm-ss>.mkv` for a call with `address`
pub fn file_path_for_address<Tz>(dir: &Path, address: &SipAddress, at: &DateTime<Tz>) -> PathBuf
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    dir.join(file_name(&address.friendly_name(), at))
}

/// Same naming for a call whose remote could only be given as a raw string
pub fn file_path_for_name<Tz>(dir: &Path, name: &str, at: &DateTime<Tz>) -> PathBuf
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    dir.join(file_name(name, at))
}

/// Same naming for conferences, falling back to `conference` without a subject
pub fn file_path_for_conference<Tz>(dir: &Path, subject: Option<&str>, at: &DateTime<Tz>) -> PathBuf
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let name = subject.filter(|s| !s.is_empty()).unwrap_or("conference");
    dir.join(file_name(name, at))
}

fn file_name<Tz>(name: &str, at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    // Path separators in a display name would escape the recordings dir
    let name: String = name
        .chars()
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .collect();
    format!(
        "{}_{}.{}",
        name,
        at.format(RECORDING_DATE_PATTERN),
        RECORDING_EXTENSION
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_file_path_for_address() {
        let at = Utc.with_ymd_and_hms(2024, 3, 7, 9, 5, 2).unwrap();
        let address = SipAddress::parse("\"Alice\" <sip:alice@example.com>").unwrap();

        let path = file_path_for_address(Path::new("/data/recordings"), &address, &at);
        assert_eq!(path, PathBuf::from("/data/recordings/Alice_07-03-2024-09-05-02.mkv"));
    }

    #[test]
    fn test_file_path_for_conference() {
        let at = Utc.with_ymd_and_hms(2024, 3, 7, 9, 5, 2).unwrap();
        let dir = Path::new("/rec");

        assert_eq!(
            file_path_for_conference(dir, None, &at),
            PathBuf::from("/rec/conference_07-03-2024-09-05-02.mkv")
        );
        assert_eq!(
            file_path_for_conference(dir, Some("Standup"), &at),
            PathBuf::from("/rec/Standup_07-03-2024-09-05-02.mkv")
        );
    }

    #[test]
    fn test_file_name_strips_separators() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let address = SipAddress::parse("\"a/b\" <sip:ab@example.com>").unwrap();
        let path = file_path_for_address(Path::new("/rec"), &address, &at);
        assert_eq!(path, PathBuf::from("/rec/a_b_01-01-2024-00-00-00.mkv"));
    }
}
