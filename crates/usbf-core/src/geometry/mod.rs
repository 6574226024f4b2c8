//! Geometry — directions, orientations, planes and lines
//!
//! Everything here works on single points. Rotation order is elevation (yz),
//! then azimuth (xz), then roll (xy); inverses apply the opposite rotations in
//! reverse order.
//!
//! ## Example
//!
//! ```rust
//! use usbf_core::geometry::{Orientation, Plane};
//! use usbf_core::types::Vec3;
//!
//! let plane = Plane::new(Vec3::ZERO, Orientation::new(0.2, 0.0, 0.0));
//! let p = plane.project(Vec3::new(0.01, 0.0, 0.03), None);
//! assert!(plane.signed_distance(p, None).abs() < 1e-12);
//! ```

pub mod bounds;
pub mod coordinate_systems;
pub mod line;
pub mod orientation;
pub mod plane;
pub mod vector;

pub use bounds::RectangularBounds;
pub use coordinate_systems::{as_cartesian, as_polar, rotate_xy, rotate_xz, rotate_yz};
pub use line::{Line, Point2};
pub use orientation::{average_directions, Direction, Orientation};
pub use plane::Plane;
pub use vector::Vector;
