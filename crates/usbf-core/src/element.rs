//! Elements, waves and probes
//!
//! [`ElementGeometry`] and [`WaveData`] are the per-element and per-transmit
//! kernel arguments. Both are [`Traceable`], so a whole array of elements or a
//! whole sequence of transmits can be stored as one tree with a leading batch
//! axis and sliced by the transformation pipeline.
//!
//! [`TransmittedWave`] is the typed view of one transmit that the wavefront
//! and apodization models reason about: focused and diverging waves have a
//! finite virtual source, plane waves have one at infinity, and unfocused
//! waves have none.
//!
//! ## Example
//!
//! ```rust
//! use usbf_core::element::{ElementGeometry, TransmittedWave, WaveData};
//! use usbf_core::types::{Vec3, WaveKind};
//!
//! let sender = ElementGeometry::new(Vec3::ZERO);
//! let focused = WaveData::focused(Vec3::new(0.0, 0.0, 0.03));
//! assert_eq!(TransmittedWave::new(&sender, &focused).kind(), WaveKind::Focused);
//!
//! let plane = WaveData::plane(0.1, 0.0);
//! assert_eq!(TransmittedWave::new(&sender, &plane).kind(), WaveKind::Plane);
//! ```

use crate::geometry::{Direction, Orientation, Plane, Vector};
use crate::tensor::Tensor;
use crate::traceable::{self, Traceable};
use crate::tree::Tree;
use crate::types::{BeamResult, PreconditionError, Vec3, WaveKind};

/// Position and orientation of a transducer element, or of a virtual element
/// standing for a group of them.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ElementGeometry {
    pub position: Vec3,
    /// Azimuth of the element normal
    pub theta: Option<f64>,
    /// Elevation of the element normal
    pub phi: Option<f64>,
    /// Elements that fire together with this one, e.g. the active aperture of
    /// a focused transmit
    pub sub_elements: Vec<ElementGeometry>,
    pub parent_element: Option<Box<ElementGeometry>>,
}

impl ElementGeometry {
    pub fn new(position: Vec3) -> Self {
        Self { position, ..Default::default() }
    }

    pub fn with_orientation(mut self, theta: f64, phi: f64) -> Self {
        self.theta = Some(theta);
        self.phi = Some(phi);
        self
    }

    pub fn with_sub_elements(mut self, sub_elements: Vec<ElementGeometry>) -> Self {
        self.sub_elements = sub_elements;
        self
    }

    pub fn with_parent(mut self, parent: ElementGeometry) -> Self {
        self.parent_element = Some(Box::new(parent));
        self
    }

    /// Orientation with missing angles taken as zero.
    pub fn orientation(&self) -> Orientation {
        Orientation::new(self.theta.unwrap_or(0.0), self.phi.unwrap_or(0.0), 0.0)
    }

    pub fn normal(&self) -> Direction {
        self.orientation().direction()
    }

    /// The plane through the element facing along its normal.
    pub fn plane(&self) -> Plane {
        Plane::new(self.position, self.orientation())
    }

    /// Stack several elements into one batched tree.
    pub fn batch(elements: &[ElementGeometry]) -> BeamResult<Tree<Tensor>> {
        traceable::decompose_batch(elements)
    }
}

fn insert_optional(tree: &mut Tree<Tensor>, name: &str, value: Option<f64>) {
    if let Some(v) = value {
        tree.insert(name, Tensor::scalar(v));
    }
}

/// Sub-elements are stored one level deep: position, theta and phi stacked
/// along a leading axis.
fn decompose_sub_elements(elements: &[ElementGeometry]) -> Tree<Tensor> {
    let positions: Vec<Vec3> = elements.iter().map(|e| e.position).collect();
    let mut tree = Tree::node().with("position", Tensor::from_points(&positions));
    let thetas: Option<Vec<f64>> = elements.iter().map(|e| e.theta).collect();
    let phis: Option<Vec<f64>> = elements.iter().map(|e| e.phi).collect();
    if let Some(t) = thetas {
        tree.insert("theta", Tensor::from_vec(t));
    }
    if let Some(p) = phis {
        tree.insert("phi", Tensor::from_vec(p));
    }
    tree
}

impl Traceable for ElementGeometry {
    fn decompose(&self) -> Tree<Tensor> {
        let mut tree = Tree::node().with("position", Tensor::from_vec3(self.position));
        insert_optional(&mut tree, "theta", self.theta);
        insert_optional(&mut tree, "phi", self.phi);
        if !self.sub_elements.is_empty() {
            tree.insert("sub_elements", decompose_sub_elements(&self.sub_elements));
        }
        if let Some(parent) = &self.parent_element {
            tree.insert("parent_element", parent.decompose());
        }
        tree
    }

    fn reconstruct(tree: &Tree<Tensor>) -> BeamResult<Self> {
        let position = traceable::leaf(traceable::field(tree, "position")?, "position")?.to_vec3()?;
        let sub_elements = match tree.get("sub_elements") {
            Some(t) => traceable::reconstruct_batch(t)?,
            None => Vec::new(),
        };
        let parent_element = match tree.get("parent_element") {
            Some(t) => Some(Box::new(ElementGeometry::reconstruct(t)?)),
            None => None,
        };
        Ok(Self {
            position,
            theta: traceable::optional_scalar(tree, "theta")?,
            phi: traceable::optional_scalar(tree, "phi")?,
            sub_elements,
            parent_element,
        })
    }
}

/// Per-transmit metadata.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WaveData {
    /// Virtual source. `None` or non-finite for plane waves.
    pub source: Option<Vec3>,
    /// Steering azimuth, used by plane waves
    pub azimuth: Option<f64>,
    /// Steering elevation, used by plane waves
    pub elevation: Option<f64>,
    /// Start delay in seconds: the signal is sampled at `path / c - t0`
    pub t0: f64,
}

impl WaveData {
    /// A wave converging to (or diverging from) `source`.
    pub fn focused(source: Vec3) -> Self {
        Self { source: Some(source), ..Default::default() }
    }

    /// A plane wave steered by `azimuth` and `elevation`.
    pub fn plane(azimuth: f64, elevation: f64) -> Self {
        Self { azimuth: Some(azimuth), elevation: Some(elevation), ..Default::default() }
    }

    pub fn with_t0(mut self, t0: f64) -> Self {
        self.t0 = t0;
        self
    }

    /// The source if it is a finite point.
    pub fn finite_source(&self) -> Option<Vec3> {
        self.source.filter(|s| s.is_finite())
    }

    /// The finite source, or an error naming the kind of wave sent from `sender`.
    pub fn require_finite_source(&self, sender: &ElementGeometry) -> BeamResult<Vec3> {
        self.finite_source().ok_or_else(|| {
            PreconditionError::WrongWaveKind {
                expected: "focused or diverging",
                actual: TransmittedWave::new(sender, self).kind(),
            }
            .into()
        })
    }

    pub fn batch(waves: &[WaveData]) -> BeamResult<Tree<Tensor>> {
        traceable::decompose_batch(waves)
    }
}

impl Traceable for WaveData {
    fn decompose(&self) -> Tree<Tensor> {
        let mut tree = Tree::node().with("t0", Tensor::scalar(self.t0));
        if let Some(s) = self.source {
            tree.insert("source", Tensor::from_vec3(s));
        }
        insert_optional(&mut tree, "azimuth", self.azimuth);
        insert_optional(&mut tree, "elevation", self.elevation);
        tree
    }

    fn reconstruct(tree: &Tree<Tensor>) -> BeamResult<Self> {
        Ok(Self {
            source: traceable::optional_point(tree, "source")?,
            azimuth: traceable::optional_scalar(tree, "azimuth")?,
            elevation: traceable::optional_scalar(tree, "elevation")?,
            t0: traceable::optional_scalar(tree, "t0")?.unwrap_or(0.0),
        })
    }
}

/// One transmit as seen by the models.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransmittedWave {
    /// A wave with a virtual source; plane waves have theirs at infinity
    GeometricallyFocused { origin: Vec3, virtual_source: Vector, kind: WaveKind },
    Unfocused { origin: Vec3 },
}

impl TransmittedWave {
    /// Classify the transmit of `wave` from `sender`. A finite source in front
    /// of the sender (along its normal) is focused, one behind it is
    /// diverging; steering angles without a source make a plane wave.
    pub fn new(sender: &ElementGeometry, wave: &WaveData) -> Self {
        let origin = sender.position;
        if let Some(source) = wave.finite_source() {
            let kind = if sender.plane().signed_distance(source, None) > 0.0 {
                WaveKind::Focused
            } else {
                WaveKind::Diverging
            };
            return TransmittedWave::GeometricallyFocused { origin, virtual_source: Vector::from_point(source), kind };
        }
        if wave.azimuth.is_some() || wave.elevation.is_some() {
            let direction = Direction::new(wave.azimuth.unwrap_or(0.0), wave.elevation.unwrap_or(0.0));
            return TransmittedWave::GeometricallyFocused {
                origin,
                virtual_source: Vector::at_infinity(direction),
                kind: WaveKind::Plane,
            };
        }
        TransmittedWave::Unfocused { origin }
    }

    pub fn kind(&self) -> WaveKind {
        match self {
            TransmittedWave::GeometricallyFocused { kind, .. } => *kind,
            TransmittedWave::Unfocused { .. } => WaveKind::Unfocused,
        }
    }

    pub fn origin(&self) -> Vec3 {
        match self {
            TransmittedWave::GeometricallyFocused { origin, .. } | TransmittedWave::Unfocused { origin } => *origin,
        }
    }

    pub fn virtual_source(&self) -> Option<Vector> {
        match self {
            TransmittedWave::GeometricallyFocused { virtual_source, .. } => Some(*virtual_source),
            TransmittedWave::Unfocused { .. } => None,
        }
    }

    /// The virtual source, or an error naming the actual wave kind.
    pub fn require_geometrically_focused(&self) -> BeamResult<Vector> {
        self.virtual_source().ok_or_else(|| {
            PreconditionError::WrongWaveKind { expected: "geometrically focused", actual: self.kind() }.into()
        })
    }

    /// The virtual source as a point. Plane and unfocused waves are rejected.
    pub fn require_finite_source(&self) -> BeamResult<Vec3> {
        match self {
            TransmittedWave::GeometricallyFocused { virtual_source, kind, .. }
                if matches!(kind, WaveKind::Focused | WaveKind::Diverging) =>
            {
                virtual_source.to_point()
            }
            _ => Err(PreconditionError::WrongWaveKind { expected: "focused or diverging", actual: self.kind() }.into()),
        }
    }
}

/// Curvature and aperture extents of a (possibly curved) probe.
///
/// Surface coordinates are arc lengths along the azimuth and elevation
/// curvature. An infinite radius describes a flat probe.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbeGeometry {
    /// Radius of curvature (azimuth, elevation)
    pub roc: [f64; 2],
    /// Receive aperture arc lengths (width, height)
    pub rx_aperture_length_s: Option<[f64; 2]>,
    /// Transmit aperture arc lengths (width, height)
    pub tx_aperture_length_s: Option<[f64; 2]>,
}

impl ProbeGeometry {
    pub fn new(roc: [f64; 2]) -> Self {
        Self { roc, rx_aperture_length_s: None, tx_aperture_length_s: None }
    }

    pub fn flat() -> Self {
        Self::new([f64::INFINITY, f64::INFINITY])
    }

    /// Centers of curvature for azimuth and elevation.
    pub fn curvature_center(&self) -> (Vec3, Vec3) {
        (Vec3::new(0.0, 0.0, -self.roc[0]), Vec3::new(0.0, 0.0, -self.roc[1]))
    }

    pub fn get_theta(&self, position: Vec3) -> f64 {
        position.x.atan2(self.roc[0] + position.z)
    }

    pub fn get_phi(&self, position: Vec3) -> f64 {
        position.y.atan2(self.roc[1] + position.z)
    }

    /// Arc-length surface coordinates of a point on the probe.
    pub fn cart2surface(&self, position: Vec3) -> [f64; 2] {
        let along = |roc: f64, angle: f64, flat: f64| if roc.is_infinite() { flat } else { roc * angle };
        [
            along(self.roc[0], self.get_theta(position), position.x),
            along(self.roc[1], self.get_phi(position), position.y),
        ]
    }

    /// The point on the probe surface at arc lengths `s`. The surface bends
    /// back toward the curvature centers; depth follows the more curved of the
    /// two directions.
    pub fn surface2cart(&self, s: [f64; 2]) -> Vec3 {
        let lateral = |roc: f64, s: f64| if roc.is_infinite() { s } else { roc * (s / roc).sin() };
        let sag = |roc: f64, s: f64| if roc.is_infinite() { 0.0 } else { roc * (s / roc).cos() - roc };
        let (sag_az, sag_el) = (sag(self.roc[0], s[0]), sag(self.roc[1], s[1]));
        Vec3::new(lateral(self.roc[0], s[0]), lateral(self.roc[1], s[1]), sag_az.min(sag_el))
    }

    fn borders(&self, center: [f64; 2], lengths: [f64; 2]) -> [Vec3; 4] {
        [
            self.surface2cart([center[0] - lengths[0] / 2.0, 0.0]),
            self.surface2cart([center[0] + lengths[0] / 2.0, 0.0]),
            self.surface2cart([0.0, center[1] + lengths[1] / 2.0]),
            self.surface2cart([0.0, center[1] - lengths[1] / 2.0]),
        ]
    }

    /// Left, right, up and down edges of the receive aperture.
    pub fn rx_aperture_borders(&self) -> BeamResult<[Vec3; 4]> {
        let lengths = self.rx_aperture_length_s.ok_or(PreconditionError::MissingField("rx_aperture_length_s"))?;
        Ok(self.borders([0.0, 0.0], lengths))
    }

    /// Left, right, up and down edges of the transmit aperture centered on `sender`.
    pub fn tx_aperture_borders(&self, sender: Vec3) -> BeamResult<[Vec3; 4]> {
        let lengths = self.tx_aperture_length_s.ok_or(PreconditionError::MissingField("tx_aperture_length_s"))?;
        Ok(self.borders(self.cart2surface(sender), lengths))
    }

    fn arc_lengths(&self, min_x: f64, max_x: f64, min_y: f64, max_y: f64) -> [f64; 2] {
        let arc = |roc: f64, lo: f64, hi: f64| {
            if roc.is_infinite() {
                hi - lo
            } else {
                (hi / roc).asin() * roc - (lo / roc).asin() * roc
            }
        };
        [arc(self.roc[0], min_x, max_x), arc(self.roc[1], min_y, max_y)]
    }

    /// Set the receive aperture from its Cartesian extent.
    pub fn set_rx_aperture_length(&mut self, min_x: f64, max_x: f64, min_y: f64, max_y: f64) {
        self.rx_aperture_length_s = Some(self.arc_lengths(min_x, max_x, min_y, max_y));
    }

    /// Set the transmit aperture from its Cartesian extent.
    pub fn set_tx_aperture_length(&mut self, min_x: f64, max_x: f64, min_y: f64, max_y: f64) {
        self.tx_aperture_length_s = Some(self.arc_lengths(min_x, max_x, min_y, max_y));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BeamError;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_element_round_trip() {
        let subs = vec![
            ElementGeometry::new(Vec3::new(-0.001, 0.0, 0.0)).with_orientation(0.0, 0.0),
            ElementGeometry::new(Vec3::new(0.001, 0.0, 0.0)).with_orientation(0.1, 0.0),
        ];
        let e = ElementGeometry::new(Vec3::new(0.0, 0.0, 0.0))
            .with_orientation(0.05, 0.0)
            .with_sub_elements(subs)
            .with_parent(ElementGeometry::new(Vec3::new(0.0, 0.0, -0.01)));
        let back = ElementGeometry::reconstruct(&e.decompose()).unwrap();
        assert_eq!(back, e);
    }

    #[test]
    fn test_batched_elements_slice_back() {
        let elements: Vec<ElementGeometry> =
            (0..4).map(|i| ElementGeometry::new(Vec3::new(i as f64 * 1e-3, 0.0, 0.0))).collect();
        let tree = ElementGeometry::batch(&elements).unwrap();
        assert_eq!(tree.get("position").and_then(Tree::as_leaf).unwrap().shape(), &[4, 3]);
        let back: Vec<ElementGeometry> = traceable::reconstruct_batch(&tree).unwrap();
        assert_eq!(back, elements);
    }

    #[test]
    fn test_wave_data_round_trip() {
        let w = WaveData::focused(Vec3::new(0.0, 0.0, 0.05)).with_t0(1e-6);
        assert_eq!(WaveData::reconstruct(&w.decompose()).unwrap(), w);
        let p = WaveData::plane(0.2, 0.0);
        assert_eq!(WaveData::reconstruct(&p.decompose()).unwrap(), p);
    }

    #[test]
    fn test_wave_kinds() {
        let sender = ElementGeometry::new(Vec3::ZERO);
        let diverging = WaveData::focused(Vec3::new(0.0, 0.0, -0.01));
        let tw = TransmittedWave::new(&sender, &diverging);
        assert_eq!(tw.kind(), WaveKind::Diverging);
        assert!(tw.require_finite_source().is_ok());

        let inf = WaveData { source: Some(Vec3::new(0.0, 0.0, f64::INFINITY)), azimuth: Some(0.0), ..Default::default() };
        assert_eq!(TransmittedWave::new(&sender, &inf).kind(), WaveKind::Plane);

        let unfocused = TransmittedWave::new(&sender, &WaveData::default());
        assert_eq!(unfocused.kind(), WaveKind::Unfocused);
        assert!(unfocused.require_geometrically_focused().is_err());
    }

    #[test]
    fn test_plane_wave_is_not_a_finite_source() {
        let sender = ElementGeometry::new(Vec3::ZERO);
        let tw = TransmittedWave::new(&sender, &WaveData::plane(0.0, 0.0));
        let err = tw.require_finite_source().unwrap_err();
        assert!(matches!(
            err,
            BeamError::Precondition(PreconditionError::WrongWaveKind { actual: WaveKind::Plane, .. })
        ));
        assert_eq!(err.to_string(), "Expected a focused or diverging transmitted wave, but got a plane wave");
    }

    #[test]
    fn test_curved_probe_surface_round_trip() {
        let probe = ProbeGeometry::new([0.06, 0.06]);
        let p = probe.surface2cart([0.01, 0.0]);
        assert_abs_diff_eq!(p.x, 0.06 * (0.01f64 / 0.06).sin(), epsilon = 1e-15);
        assert!(p.z < 0.0);
        let s = probe.cart2surface(p);
        assert_abs_diff_eq!(s[0], 0.01, epsilon = 1e-12);
    }

    #[test]
    fn test_flat_probe_borders() {
        let mut probe = ProbeGeometry::flat();
        assert!(probe.tx_aperture_borders(Vec3::ZERO).is_err());
        probe.set_tx_aperture_length(-0.01, 0.01, 0.0, 0.0);
        let [left, right, _, _] = probe.tx_aperture_borders(Vec3::new(0.002, 0.0, 0.0)).unwrap();
        assert_abs_diff_eq!(left.x, -0.008, epsilon = 1e-15);
        assert_abs_diff_eq!(right.x, 0.012, epsilon = 1e-15);
        assert_eq!(left.z, 0.0);
    }
}
