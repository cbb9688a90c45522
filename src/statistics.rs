use tracing::info;

use crate::model::ayna_api_model::AynaStop;

#[derive(Debug, PartialEq, Eq)]
pub struct StopsStats {
    pub total: usize,
    pub transport_hubs: usize,
    pub regular: usize,
    pub with_coordinates: usize,
}

impl StopsStats {
    pub fn with_coordinates_pct(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }

        self.with_coordinates as f64 / self.total as f64 * 100.0
    }

    pub fn log(&self) {
        info!("total stops: {}", self.total);
        info!("transport hubs: {}", self.transport_hubs);
        info!("regular stops: {}", self.regular);
        info!(
            "stops with coordinates: {} ({:.1}%)",
            self.with_coordinates,
            self.with_coordinates_pct()
        );
    }
}

/// Counts over the raw records before normalization. A stop counts as having
/// coordinates when both raw tokens are present and non-empty, whether or not
/// they later parse.
pub fn summarize(stops: &[AynaStop]) -> StopsStats {
    let total = stops.len();
    let transport_hubs = stops.iter().filter(|s| s.is_transport_hub).count();
    let with_coordinates = stops
        .iter()
        .filter(|s| {
            s.longitude.as_deref().is_some_and(|l| !l.is_empty())
                && s.latitude.as_deref().is_some_and(|l| !l.is_empty())
        })
        .count();

    StopsStats {
        total,
        transport_hubs,
        regular: total - transport_hubs,
        with_coordinates,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stop(hub: bool, longitude: Option<&str>, latitude: Option<&str>) -> AynaStop {
        AynaStop {
            id: Some(1),
            longitude: longitude.map(str::to_string),
            latitude: latitude.map(str::to_string),
            is_transport_hub: hub,
        }
    }

    #[test]
    fn counts_hubs_and_regular_stops() {
        let stops = vec![
            stop(true, Some("50,1"), Some("40,1")),
            stop(false, Some("50,2"), Some("40,2")),
            stop(false, None, None),
        ];

        let stats = summarize(&stops);

        assert_eq!(
            stats,
            StopsStats {
                total: 3,
                transport_hubs: 1,
                regular: 2,
                with_coordinates: 2,
            }
        );
    }

    #[test]
    fn a_stop_with_only_one_coordinate_does_not_count() {
        let stops = vec![stop(false, Some("50,1"), None), stop(false, Some(""), Some("40,1"))];

        assert_eq!(summarize(&stops).with_coordinates, 0);
    }

    #[test]
    fn empty_input_yields_zeroes() {
        let stats = summarize(&[]);

        assert_eq!(stats.total, 0);
        assert_eq!(stats.with_coordinates_pct(), 0.0);
    }

    #[test]
    fn pct_is_computed_over_total() {
        let stops = vec![
            stop(false, Some("50,1"), Some("40,1")),
            stop(false, None, None),
        ];

        assert_eq!(summarize(&stops).with_coordinates_pct(), 50.0);
    }
}
