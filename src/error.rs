use thiserror::Error;

/// Input validation failures, detected before the sweep starts.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// The viewport must satisfy `xl < xr` and `yt < yb`, with all four
    /// bounds finite.
    #[error("invalid bounding box: require xl < xr and yt < yb, got xl={xl}, xr={xr}, yt={yt}, yb={yb}")]
    InvalidBoundingBox { xl: f64, xr: f64, yt: f64, yb: f64 },

    /// A site coordinate is NaN or infinite.
    #[error("site {index} has a non-finite coordinate")]
    NonFiniteSite { index: usize },
}
