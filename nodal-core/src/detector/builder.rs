//! Builder utilities for configuring center detection.
//!
//! Exposes the tunable thresholds and the degree policy, validated before a
//! [`CenterDetector`] is constructed.

use crate::{
    assignment::Assignment,
    detector::CenterDetector,
    error::{DetectorError, Result},
    features::{DEFAULT_INDIRECT_FLOW_THRESHOLD, DistanceType},
    matrix::FlowMatrix,
};

/// Default threshold applied to the similarity matrix before computing
/// potentials.
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 1e-3;

/// How the indirect-flow degree is derived when computing level `to` from
/// level `from`.
///
/// # Examples
/// ```
/// use nodal_core::DegreePolicy;
///
/// assert_eq!(DegreePolicy::LevelSpan.degree(2, 3), 0);
/// assert_eq!(DegreePolicy::TargetLevel.degree(2, 3), 2);
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum DegreePolicy {
    /// `to - from - 1`: consecutive levels use the direct center flows.
    #[default]
    LevelSpan,
    /// `to - 1`: propagation deepens as the hierarchy coarsens.
    TargetLevel,
}

impl DegreePolicy {
    /// Degree used to compute level `to` from level `from`.
    ///
    /// The result may be negative, in which case the indirect-flow step
    /// rejects it.
    #[must_use]
    pub fn degree(self, from: usize, to: usize) -> i64 {
        let from = i64::try_from(from).unwrap_or(i64::MAX);
        let to = i64::try_from(to).unwrap_or(i64::MAX);
        match self {
            Self::LevelSpan => to.saturating_sub(from).saturating_sub(1),
            Self::TargetLevel => to.saturating_sub(1),
        }
    }
}

/// Validated detector settings.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DetectorSettings {
    /// Propagated flows below this value are discarded.
    pub indirect_flow_threshold: f64,
    /// Similarities below this value are discarded.
    pub similarity_threshold: f64,
    /// Normaliser used for distance-decayed center flows.
    pub distance_type: DistanceType,
    /// Source of the indirect-flow degree.
    pub degree_policy: DegreePolicy,
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self {
            indirect_flow_threshold: DEFAULT_INDIRECT_FLOW_THRESHOLD,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            distance_type: DistanceType::GeometricMean,
            degree_policy: DegreePolicy::LevelSpan,
        }
    }
}

/// Configures and constructs [`CenterDetector`] instances.
///
/// # Examples
/// ```
/// use nodal_core::{CenterDetectorBuilder, DegreePolicy, DenseFlows};
///
/// let flows = DenseFlows::from_rows(&[[1.0, 2.0], [2.0, 1.0]])?;
/// let detector = CenterDetectorBuilder::new()
///     .with_degree_policy(DegreePolicy::TargetLevel)
///     .with_similarity_threshold(0.01)
///     .build(&flows)?;
/// assert_eq!(detector.settings().degree_policy, DegreePolicy::TargetLevel);
/// assert_eq!(detector.node_count(), 2);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone, Debug, Default)]
pub struct CenterDetectorBuilder {
    settings: DetectorSettings,
}

impl CenterDetectorBuilder {
    /// Creates a builder populated with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the threshold applied to propagated flows.
    #[must_use]
    pub const fn with_indirect_flow_threshold(mut self, threshold: f64) -> Self {
        self.settings.indirect_flow_threshold = threshold;
        self
    }

    /// Overrides the threshold applied to the similarity matrix.
    #[must_use]
    pub const fn with_similarity_threshold(mut self, threshold: f64) -> Self {
        self.settings.similarity_threshold = threshold;
        self
    }

    /// Overrides the distance normaliser.
    #[must_use]
    pub const fn with_distance_type(mut self, distance_type: DistanceType) -> Self {
        self.settings.distance_type = distance_type;
        self
    }

    /// Overrides the degree policy.
    #[must_use]
    pub const fn with_degree_policy(mut self, policy: DegreePolicy) -> Self {
        self.settings.degree_policy = policy;
        self
    }

    /// Returns the settings configured so far.
    #[must_use]
    pub const fn settings(&self) -> &DetectorSettings {
        &self.settings
    }

    /// Validates the configuration and constructs a detector over `flows`.
    ///
    /// # Errors
    /// Returns [`DetectorError::InvalidThreshold`] for a negative or
    /// non-finite threshold, [`DetectorError::EmptyFlows`] for a matrix
    /// without nodes and [`DetectorError::Flows`] for a rectangular matrix.
    pub fn build<M: FlowMatrix>(self, flows: &M) -> Result<CenterDetector> {
        self.validate()?;
        CenterDetector::from_settings(flows, self.settings, None)
    }

    /// Like [`CenterDetectorBuilder::build`] but seeds the level cache with
    /// previously computed levels.
    ///
    /// # Errors
    /// Returns the errors of [`CenterDetectorBuilder::build`] plus
    /// [`DetectorError::InvalidSeedLevels`] when the first level is not the
    /// identity or a level's length differs from the node count.
    pub fn build_with_levels<M: FlowMatrix>(
        self,
        flows: &M,
        levels: Vec<Assignment>,
    ) -> Result<CenterDetector> {
        self.validate()?;
        CenterDetector::from_settings(flows, self.settings, Some(levels))
    }

    fn validate(&self) -> Result<()> {
        check_threshold("indirect_flow_threshold", self.settings.indirect_flow_threshold)?;
        check_threshold("similarity_threshold", self.settings.similarity_threshold)
    }
}

fn check_threshold(parameter: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(DetectorError::InvalidThreshold { parameter, value })
    }
}
