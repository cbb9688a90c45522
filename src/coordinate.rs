use tracing::warn;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("could not parse coordinate token {token:?}")]
pub struct CoordinateParseError {
    pub token: String,
}

/// Parses a coordinate token as emitted by the Ayna API.
///
/// The API writes coordinates with comma-grouped digits instead of a fixed
/// decimal point, e.g. `"50,206,297"` means `50.206297`. All Baku coordinates
/// have a 2 digit integer part (latitude ~40, longitude ~49-50), so stripping
/// every separator and reinserting the decimal point after the 2nd digit
/// recovers the true value no matter how many separators were used.
///
/// Only valid for coordinates known to fall in that range.
pub fn parse_coordinate(raw: Option<&str>) -> Result<Option<f64>, CoordinateParseError> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    if raw.is_empty() {
        return Ok(None);
    }

    let token = raw.trim();

    let digits: String = token.chars().filter(|c| *c != ',' && *c != '.').collect();

    let candidate = if digits.chars().count() > 2 {
        let mut with_point = String::with_capacity(digits.len() + 1);
        for (i, c) in digits.chars().enumerate() {
            if i == 2 {
                with_point.push('.');
            }
            with_point.push(c);
        }
        with_point
    } else {
        digits
    };

    match candidate.parse::<f64>() {
        Ok(value) => Ok(Some(value)),
        Err(_) => Err(CoordinateParseError {
            token: token.to_string(),
        }),
    }
}

/// Warn-and-null wrapper used on the sync path. A stop with an unparseable
/// coordinate keeps a null longitude/latitude instead of being dropped.
pub fn normalize_coordinate(raw: Option<&str>) -> Option<f64> {
    match parse_coordinate(raw) {
        Ok(value) => value,
        Err(e) => {
            warn!("{e}");
            None
        }
    }
}
