//! Parsers for user-entered coordinates.
//!
//! Both parsers are total: malformed or out-of-range input yields `None`.

use serde::Serialize;

const NORTH_LETTERS: &str = "NPQRSTUVWX";
const SOUTH_LETTERS: &str = "CDEFGHJKLM";

const NORTH_SRID_BASE: i32 = 32600;
const SOUTH_SRID_BASE: i32 = 32700;

const EASTING_MIN: f64 = 166_640.0;
const EASTING_MAX: f64 = 833_360.0;
const NORTH_NORTHING: (f64, f64) = (0.0, 9_334_080.0);
const SOUTH_NORTHING: (f64, f64) = (1_110_400.0, 10_000_000.0);

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Utm {
    pub zone_number: u8,
    pub zone_letter: Option<char>,
    pub easting: f64,
    pub northing: f64,
    pub zone_srid: i32,
}

impl Utm {
    pub fn is_southern(&self) -> bool {
        self.zone_letter.map_or(false, |l| SOUTH_LETTERS.contains(l))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LatLong {
    pub latitude: f64,
    pub longitude: f64,
}

/// Parse `"<zone><letter?> <easting> <northing>"`, e.g. `"9N 573674 6114170"`.
pub fn parse_utm(input: &str) -> Option<Utm> {
    let mut parts = input.split_whitespace();
    let (zone, easting, northing) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }

    let digits_end = zone.find(|c: char| !c.is_ascii_digit()).unwrap_or(zone.len());
    let (number, letter) = zone.split_at(digits_end);
    if number.is_empty() || number.len() > 2 {
        return None;
    }
    let zone_number: u8 = number.parse().ok()?;
    if !(1..=60).contains(&zone_number) {
        return None;
    }

    let zone_letter = match letter.len() {
        0 => None,
        1 => {
            let c = letter.chars().next()?.to_ascii_uppercase();
            if !NORTH_LETTERS.contains(c) && !SOUTH_LETTERS.contains(c) {
                return None;
            }
            Some(c)
        }
        _ => return None,
    };

    let easting = parse_decimal(easting, false)?;
    let northing = parse_decimal(northing, false)?;
    if !(EASTING_MIN..=EASTING_MAX).contains(&easting) {
        return None;
    }

    let southern = zone_letter.map_or(false, |l| SOUTH_LETTERS.contains(l));
    let (min, max) = if southern { SOUTH_NORTHING } else { NORTH_NORTHING };
    if !(min..=max).contains(&northing) {
        return None;
    }

    let base = if southern { SOUTH_SRID_BASE } else { NORTH_SRID_BASE };

    Some(Utm {
        zone_number,
        zone_letter,
        easting,
        northing,
        zone_srid: base + i32::from(zone_number),
    })
}

/// Parse `"<lat> <long>"`, e.g. `"49.116906 -122.62887"`.
pub fn parse_lat_long(input: &str) -> Option<LatLong> {
    let mut parts = input.split_whitespace();
    let (lat, long) = (parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }

    let latitude = parse_decimal(lat, true)?;
    let longitude = parse_decimal(long, true)?;
    if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
        return None;
    }

    Some(LatLong { latitude, longitude })
}

/// Plain decimal notation only: no exponents, `inf`, or `NaN`.
fn parse_decimal(token: &str, signed: bool) -> Option<f64> {
    let unsigned = match token.strip_prefix('-') {
        Some(rest) if signed => rest,
        Some(_) => return None,
        None => token,
    };

    let (whole, fraction) = match unsigned.split_once('.') {
        Some((w, f)) => (w, Some(f)),
        None => (unsigned, None),
    };
    if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if let Some(f) = fraction {
        if f.is_empty() || !f.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
    }

    token.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_northern_utm() {
        let utm = parse_utm("9N 573674 6114170").unwrap();
        assert_eq!(utm.zone_number, 9);
        assert_eq!(utm.zone_letter, Some('N'));
        assert_eq!(utm.easting, 573674.0);
        assert_eq!(utm.northing, 6114170.0);
        assert_eq!(utm.zone_srid, 32609);
        assert!(!utm.is_southern());
    }

    #[test]
    fn letter_is_optional_and_case_insensitive() {
        assert_eq!(parse_utm("10 500000 5000000").unwrap().zone_srid, 32610);
        let south = parse_utm("33c 500000 2000000").unwrap();
        assert_eq!(south.zone_letter, Some('C'));
        assert_eq!(south.zone_srid, 32733);
    }

    #[test]
    fn recovers_every_valid_tuple() {
        let eastings = [166_640.0, 400_000.5, 833_360.0];
        for zone in 1..=60u8 {
            for easting in eastings {
                for (letter, northing, base) in [
                    ("", 0.0, 32600),
                    ("X", 9_334_080.0, 32600),
                    ("N", 5_000_000.25, 32600),
                    ("M", 1_110_400.0, 32700),
                    ("C", 10_000_000.0, 32700),
                ] {
                    let input = format!("{}{} {} {}", zone, letter, easting, northing);
                    let utm = parse_utm(&input).unwrap_or_else(|| panic!("failed to parse {}", input));
                    assert_eq!(utm.zone_number, zone);
                    assert_eq!(utm.easting, easting);
                    assert_eq!(utm.northing, northing);
                    assert_eq!(utm.zone_srid, base + i32::from(zone));
                }
            }
        }
    }

    #[test]
    fn rejects_invalid_utm() {
        for input in [
            "0N 500000 5000000",
            "61N 500000 5000000",
            "9N 100000 5000000",
            "9N 500000",
            "9N 500000 9334081",
            "9C 500000 1000000",
            "9I 500000 5000000",
            "9NN 500000 5000000",
            "9N 500000 5000000 1",
            "9N -500000 5000000",
            "9N 5e5 5000000",
            "",
        ] {
            assert_eq!(parse_utm(input), None, "{}", input);
        }
    }

    #[test]
    fn parses_lat_long() {
        let point = parse_lat_long("49.116906 -122.62887").unwrap();
        assert_eq!(point.latitude, 49.116906);
        assert_eq!(point.longitude, -122.62887);
        assert!(parse_lat_long("-90 180").is_some());
    }

    #[test]
    fn rejects_invalid_lat_long() {
        for input in ["90.1 0", "0 -180.5", "49", "49 -122 1", "abc def", "49. -122", "NaN 0", "--1 0"] {
            assert_eq!(parse_lat_long(input), None, "{}", input);
        }
    }
}
