use crate::error::ConfigError;
use crate::problem::location::Location;

pub type Distance = i64;
pub type Duration = i64;
pub type Cost = i64;

/// Square matrix with flat storage and dense indices.
#[derive(Debug, Clone)]
pub struct Matrix<T> {
    size: usize,
    data: Vec<T>,
}

impl<T: Copy + Default> Matrix<T> {
    pub fn new(size: usize, value: T) -> Self {
        Matrix {
            size,
            data: vec![value; size * size],
        }
    }

    pub fn from_rows(rows: Vec<Vec<T>>) -> Result<Self, ConfigError> {
        let size = rows.len();
        let mut data = Vec::with_capacity(size * size);
        for row in rows {
            if row.len() != size {
                return Err(ConfigError::NonSquareMatrix);
            }
            data.extend(row);
        }
        Ok(Matrix { size, data })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    #[inline(always)]
    pub fn get(&self, from: usize, to: usize) -> T {
        self.data[from * self.size + to]
    }

    pub fn set(&mut self, from: usize, to: usize, value: T) {
        self.data[from * self.size + to] = value;
    }
}

/// Travel tables for one routing profile. Durations and distances are
/// required; an explicit cost table overrides the per-hour/per-km cost
/// derivation of the vehicles using this profile.
#[derive(Debug, Clone)]
pub struct ProfileMatrices {
    pub durations: Matrix<Duration>,
    pub distances: Matrix<Distance>,
    pub costs: Option<Matrix<Cost>>,
}

impl ProfileMatrices {
    pub fn new(durations: Matrix<Duration>, distances: Matrix<Distance>) -> Self {
        ProfileMatrices {
            durations,
            distances,
            costs: None,
        }
    }

    pub fn with_costs(mut self, costs: Matrix<Cost>) -> Self {
        self.costs = Some(costs);
        self
    }

    pub fn size(&self) -> usize {
        self.durations.size()
    }

    #[inline(always)]
    pub fn get_duration(&self, from: usize, to: usize) -> Duration {
        self.durations.get(from, to)
    }

    #[inline(always)]
    pub fn get_distance(&self, from: usize, to: usize) -> Distance {
        self.distances.get(from, to)
    }

    /// Explicit cost entry, when this profile carries a cost table.
    #[inline(always)]
    pub fn get_cost(&self, from: usize, to: usize) -> Option<Cost> {
        self.costs.as_ref().map(|c| c.get(from, to))
    }

    /// Constant-valued tables, mostly useful in tests.
    pub fn from_constant(size: usize, duration: Duration, distance: Distance) -> Self {
        let mut durations = Matrix::new(size, duration);
        let mut distances = Matrix::new(size, distance);
        for i in 0..size {
            durations.set(i, i, 0);
            distances.set(i, i, 0);
        }
        ProfileMatrices::new(durations, distances)
    }

    /// Euclidean tables from located coordinates, scaled by 100 so that a
    /// unit grid step maps to 100 distance units and 100 seconds.
    pub fn from_euclidean(locations: &[Location]) -> Self {
        let size = locations.len();
        let mut durations = Matrix::new(size, 0);
        let mut distances = Matrix::new(size, 0);

        for (i, from) in locations.iter().enumerate() {
            let (fx, fy) = from.coordinates().unwrap_or((0.0, 0.0));
            for (j, to) in locations.iter().enumerate() {
                if i == j {
                    continue;
                }
                let (tx, ty) = to.coordinates().unwrap_or((0.0, 0.0));
                let d = (((tx - fx).powi(2) + (ty - fy).powi(2)).sqrt() * 100.0).round() as i64;
                durations.set(i, j, d);
                distances.set(i, j, d);
            }
        }

        ProfileMatrices::new(durations, distances)
    }
}
