/// Stations of referents whose names are numeric station values.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StationIndex {
    stations: Vec<f64>,
}

impl StationIndex {
    /// Builds an index from referent names, skipping names that are not numbers.
    pub fn from_names<'a, I>(names: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let stations = names
            .into_iter()
            .filter_map(|n| n.trim().parse::<f64>().ok())
            .filter(|s| s.is_finite())
            .collect();
        Self::from_stations(stations)
    }

    /// Builds an index from station values.
    pub fn from_stations(mut stations: Vec<f64>) -> Self {
        stations.sort_by(f64::total_cmp);
        stations.dedup();
        Self { stations }
    }

    pub fn stations(&self) -> &[f64] {
        &self.stations
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    /// Closest indexed station, if within `tolerance`.
    pub fn nearest(&self, station: f64, tolerance: f64) -> Option<f64> {
        let idx = self.stations.partition_point(|s| *s < station);
        let before = idx.checked_sub(1).and_then(|i| self.stations.get(i));
        let after = self.stations.get(idx);
        let best = match (before, after) {
            (Some(b), Some(a)) => {
                if (station - b).abs() <= (a - station).abs() {
                    *b
                } else {
                    *a
                }
            }
            (Some(b), None) => *b,
            (None, Some(a)) => *a,
            (None, None) => return None,
        };
        ((best - station).abs() <= tolerance).then_some(best)
    }

    /// Every second station starting with the first.
    pub fn every_other(&self) -> impl Iterator<Item = f64> + '_ {
        self.stations.iter().copied().step_by(2)
    }
}
