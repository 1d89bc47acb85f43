//! Region (lobby) catalog.
//!
//! Regions partition match listings. The catalog is fixed and ordered;
//! lobby listings walk it from Europe to Mars.

use serde::Serialize;

use crate::parameter::parse_byte;

/// A geographic grouping of matches.
///
/// The discriminants are the numeric ids used on the wire
/// (`LOBBY-ID` / `REGION-ID`).
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[repr(i8)]
pub enum Region {
    Europe = 1,
    NorthAmerica = 2,
    SouthAmerica = 3,
    Africa = 4,
    Asia = 5,
    Oceania = 6,
    Moon = 7,
    Mars = 8,
    /// Sentinel for ids outside the catalog.
    #[default]
    Unknown = -1,
}

/// Every listable region, in catalog order. `Unknown` is not listed.
pub const CATALOG: [Region; 8] = [
    Region::Europe,
    Region::NorthAmerica,
    Region::SouthAmerica,
    Region::Africa,
    Region::Asia,
    Region::Oceania,
    Region::Moon,
    Region::Mars,
];

impl Region {
    /// Signed wire id (`Unknown` is `-1`).
    pub fn id(self) -> i8 {
        self as i8
    }

    /// Display name shown in lobby listings.
    pub fn name(self) -> &'static str {
        match self {
            Region::Europe => "Europe",
            Region::NorthAmerica => "North America",
            Region::SouthAmerica => "South America",
            Region::Africa => "Africa",
            Region::Asia => "Asia",
            Region::Oceania => "Oceania",
            Region::Moon => "Moon",
            Region::Mars => "Mars",
            Region::Unknown => "Unknown",
        }
    }

    /// Look up a catalog region by numeric id.
    pub fn from_id(id: i64) -> Option<Self> {
        CATALOG.iter().copied().find(|r| i64::from(r.id()) == id)
    }

    /// Parse a wire value such as `"3"`.
    ///
    /// The value is read as a byte the way counts are (see
    /// [`parse_byte`]), so `"257"` is Europe and `"2nd"` is North
    /// America. Anything outside the catalog maps to [`Region::Unknown`];
    /// callers still accept the value.
    pub fn parse(value: &str) -> Self {
        parse_byte(value)
            .and_then(|id| Region::from_id(i64::from(id)))
            .unwrap_or(Region::Unknown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_catalog_range_only() {
        assert_eq!(Region::parse("1"), Region::Europe);
        assert_eq!(Region::parse("8"), Region::Mars);
        assert_eq!(Region::parse("0"), Region::Unknown);
        assert_eq!(Region::parse("9"), Region::Unknown);
        assert_eq!(Region::parse("\"2\""), Region::Unknown);
        assert_eq!(Region::parse("abc"), Region::Unknown);
        assert_eq!(Region::parse("-1"), Region::Unknown);
    }

    #[test]
    fn parse_reads_leading_digits_as_a_byte() {
        assert_eq!(Region::parse(" 3"), Region::SouthAmerica);
        assert_eq!(Region::parse("2nd"), Region::NorthAmerica);
        assert_eq!(Region::parse("257"), Region::Europe);
    }

    #[test]
    fn catalog_is_ordered_by_id() {
        let ids: Vec<i8> = CATALOG.iter().map(|r| r.id()).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(Region::NorthAmerica.name(), "North America");
    }

    #[test]
    fn unknown_reinterpreted_as_byte_is_255() {
        assert_eq!(Region::Unknown.id() as u8, 255);
    }
}
