use thiserror::Error;

/// Fatal configuration errors, surfaced to the caller before any solving
/// starts. Recoverable infeasibilities (a move that does not fit, a job
/// that cannot be placed) are never reported through this type.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("inconsistent amount dimension for {entity}: expected {expected}, got {actual}")]
    AmountDimension {
        entity: String,
        expected: usize,
        actual: usize,
    },
    #[error("vehicle {id} has neither a start nor an end location")]
    MissingVehicleLocation { id: String },
    #[error("invalid time window [{start}, {end}] for {entity}")]
    InvalidTimeWindow {
        entity: String,
        start: i64,
        end: i64,
    },
    #[error("vehicle {id} has inconsistent break time windows")]
    InconsistentBreaks { id: String },
    #[error("pickup {pickup} and delivery {delivery} have mismatched amounts")]
    ShipmentAmountMismatch { pickup: String, delivery: String },
    #[error("pickup {id} is not immediately followed by its matching delivery")]
    DanglingShipment { id: String },
    #[error("no travel matrix registered for profile {profile}")]
    MissingMatrix { profile: String },
    #[error("matrix for profile {profile} has size {size} but location index {index} is used")]
    MatrixTooSmall {
        profile: String,
        size: usize,
        index: usize,
    },
    #[error("travel matrix is not square")]
    NonSquareMatrix,
    #[error("locations must either all carry matrix indices or all carry coordinates")]
    MixedLocationKinds,
}
