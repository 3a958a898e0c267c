use serde::{Deserialize, Serialize};

pub type LocationId = usize;

/// A place jobs and vehicles refer to, either by an explicit travel-matrix
/// index or by coordinates. The problem builder deduplicates locations and
/// resolves each to a dense index into the travel matrices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    matrix_index: Option<usize>,
    coordinates: Option<(f64, f64)>,
    index: usize,
}

/// Key used for deduplication on insertion; coordinates compare by bit
/// pattern so the mapping stays exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocationKey {
    MatrixIndex(usize),
    Coordinates(u64, u64),
}

impl Location {
    pub fn from_matrix_index(matrix_index: usize) -> Self {
        Location {
            matrix_index: Some(matrix_index),
            coordinates: None,
            index: matrix_index,
        }
    }

    pub fn from_lon_lat(lon: f64, lat: f64) -> Self {
        Location {
            matrix_index: None,
            coordinates: Some((lon, lat)),
            index: 0,
        }
    }

    pub fn from_cartesian(x: f64, y: f64) -> Self {
        Self::from_lon_lat(x, y)
    }

    pub fn has_matrix_index(&self) -> bool {
        self.matrix_index.is_some()
    }

    pub fn coordinates(&self) -> Option<(f64, f64)> {
        self.coordinates
    }

    /// Dense index into the travel matrices, assigned at problem build.
    pub fn index(&self) -> usize {
        self.index
    }

    pub(crate) fn set_index(&mut self, index: usize) {
        self.index = index;
    }

    pub(crate) fn dedup_key(&self) -> LocationKey {
        match (self.matrix_index, self.coordinates) {
            (Some(index), _) => LocationKey::MatrixIndex(index),
            (None, Some((lon, lat))) => LocationKey::Coordinates(lon.to_bits(), lat.to_bits()),
            (None, None) => LocationKey::MatrixIndex(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matrix_index_location_keeps_its_index() {
        let location = Location::from_matrix_index(7);
        assert_eq!(location.index(), 7);
        assert_eq!(location.dedup_key(), LocationKey::MatrixIndex(7));
    }

    #[test]
    fn test_coordinate_locations_dedup_by_bits() {
        let a = Location::from_lon_lat(1.5, 2.5);
        let b = Location::from_lon_lat(1.5, 2.5);
        let c = Location::from_lon_lat(1.5, 2.6);

        assert_eq!(a.dedup_key(), b.dedup_key());
        assert_ne!(a.dedup_key(), c.dedup_key());
    }
}
