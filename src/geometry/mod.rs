use num_traits::Float;


/// Euclidean distance
pub fn euclidean<T>(x1: T, y1: T, x2: T, y2: T) -> T
where
    T: Float,
    {
    ((x1 - x2).powi(2) + (y1 - y2).powi(2)).sqrt()
}

/// Squared Euclidean distance
/// Cheaper than `euclidean` when only comparing against a squared radius
pub fn squared_euclidean<T>(x1: T, y1: T, x2: T, y2: T) -> T
where
    T: Float,
    {
    (x1 - x2).powi(2) + (y1 - y2).powi(2)
}

/// Slope angle in degrees for a vertical rise over a horizontal run
/// atan2 keeps the angle well defined even for a zero run
pub fn slope_angle_deg<T>(rise: T, run: T) -> T
where
    T: Float,
    {
    rise.abs().atan2(run).to_degrees()
}
