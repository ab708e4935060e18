#![warn(clippy::all)]
#![forbid(unsafe_code)]
//!# Docs
//!
//! This is a rust implementation of
//! [fortune's algorithm](https://en.wikipedia.org/wiki/Fortune%27s_algorithm) to generate a
//! [voronoi diagram](https://en.wikipedia.org/wiki/Voronoi_diagram) bounded by an
//! axis-aligned viewport.
//!
//!## Implementation Details
//! The implementation is entirely in safe rust code.
//!
//! Coordinates follow the screen convention: the y axis grows downward, so the
//! viewport's top border has the smaller y. The result holds one cell per input
//! site (at the same index), each a closed counter-clockwise ring of halfedges,
//! together with the set of edges bounding them. Edges lying on the viewport
//! border carry no right site.
//!
//! Sites that repeat the previously processed position exactly are skipped and
//! keep an empty cell; sites on the viewport border are accepted like any
//! other site.
//!
//!## Example Usage
//!
//! The following computes the diagram of two sites split by a vertical border.
//! ```rust
//! use sweepline_voronoi::{compute, BoundingBox, Point};
//!
//! let points = vec![Point::new(200.0, 300.0), Point::new(600.0, 300.0)];
//! let bbox = BoundingBox::new(0.0, 800.0, 0.0, 600.0);
//!
//! let diagram = compute(&points, &bbox).unwrap();
//! assert_eq!(diagram.num_cells(), 2);
//! ```
mod beachline;
pub mod boundingbox;
pub mod diagram;
mod error;
mod event;
pub mod typedvector;
pub mod vector2;
pub mod voronoi_builder;

pub use boundingbox::BoundingBox;
pub use diagram::Diagram;
pub use error::Error;
pub use vector2::Point;
pub use voronoi_builder::VoronoiBuilder;

/// Computes the Voronoi diagram of the supplied points, clipped and closed
/// against the viewport.
///
/// # Arguments
/// * `points` - The sites to construct the diagram from.
/// * `bbox` - The viewport; must satisfy `xl < xr` and `yt < yb`.
///
/// # Errors
/// [`Error::InvalidBoundingBox`] for a malformed viewport and
/// [`Error::NonFiniteSite`] for NaN or infinite site coordinates; both are
/// raised before any sweeping happens.
pub fn compute(points: &[Point], bbox: &BoundingBox) -> Result<Diagram, Error> {
    voronoi_builder::build_voronoi(points, bbox)
}

/// Performs [Lloyd's algorithm](https://en.wikipedia.org/wiki/Lloyd%27s_algorithm)
/// on the supplied points.
///
/// Each iteration computes the diagram and replaces every point by the
/// centroid of its cell, spreading the points more evenly across the
/// viewport. Points whose cell came out empty (duplicates) stay where they
/// are.
///
/// # Arguments
/// * `points` - The initial sites.
/// * `bbox` - The viewport to relax within.
/// * `iterations` - How many relaxation rounds to run.
pub fn relax_points(
    points: &[Point],
    bbox: &BoundingBox,
    iterations: usize,
) -> Result<Vec<Point>, Error> {
    let mut points = points.to_vec();
    let mut builder = VoronoiBuilder::new();
    for _ in 0..iterations {
        let diagram = builder.compute(&points, bbox)?;
        points = diagram
            .cell_indices()
            .into_iter()
            .enumerate()
            .map(|(index, cell)| diagram.cell_centroid(cell).unwrap_or(points[index]))
            .collect();
    }
    Ok(points)
}
