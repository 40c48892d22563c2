//! Session Controller Implementation

use crate::events::{EventBus, SessionEvent};
use crate::response::{ServiceFault, ServiceResponse, SessionStatus};
use anomaly_detector::{AnomalyConfig, AnomalyDetector};
use sample_validator::{
    BoundsConfig, RawMeta, RawSample, Sample, SessionMeta, TimePolicy, ValidationError, Validator,
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use storage::{PersistenceSink, RejectedSampleRecord};
use threshold_tracker::{AdaptiveThresholdTracker, BandPolicy};
use tracing::{debug, error, info, warn};

/// How static-bound violations of a sample are reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strictness {
    /// Return a `ServiceFault::Validation`
    Fault,
    /// Return a nack carrying the validation message
    Nack,
}

/// Session behaviour configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Static bounds for samples
    pub bounds: BoundsConfig,
    /// Static bounds for session metadata; a partial section keeps the
    /// remaining metadata defaults
    #[serde(
        default = "BoundsConfig::meta",
        deserialize_with = "BoundsConfig::deserialize_meta"
    )]
    pub meta_bounds: BoundsConfig,
    /// Time checks
    pub time: TimePolicy,
    /// Adaptive acceptance band
    pub band: BandPolicy,
    /// Advisory anomaly thresholds
    pub anomaly: AnomalyConfig,
    /// Reporting of static-bound violations
    pub strictness: Strictness,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            bounds: BoundsConfig::default(),
            meta_bounds: BoundsConfig::meta(),
            time: TimePolicy::default(),
            band: BandPolicy::default(),
            anomaly: AnomalyConfig::default(),
            strictness: Strictness::Fault,
        }
    }
}

/// State of the active session
struct ActiveSession {
    meta: SessionMeta,
    samples: Vec<Sample>,
    tracker: AdaptiveThresholdTracker,
    detector: AnomalyDetector,
}

/// Owns the single active session and serializes every operation on it
pub struct SessionController {
    config: SessionConfig,
    validator: Validator,
    sink: Arc<dyn PersistenceSink>,
    bus: EventBus,
    /// `None` while idle
    state: Mutex<Option<ActiveSession>>,
}

impl SessionController {
    /// Create a new controller
    pub fn new(config: SessionConfig, sink: Arc<dyn PersistenceSink>, bus: EventBus) -> Self {
        info!(
            "Creating session controller: band={:?}, anomaly={:?}, strictness={:?}",
            config.band, config.anomaly, config.strictness
        );
        let validator = Validator::new(config.bounds.clone(), config.meta_bounds.clone(), config.time);
        Self {
            config,
            validator,
            sink,
            bus,
            state: Mutex::new(None),
        }
    }

    /// Start a session seeded from `meta`
    pub fn start_session(&self, meta: Option<&RawMeta>) -> Result<ServiceResponse, ServiceFault> {
        let meta = self.validator.parse_meta(meta).map_err(|e| {
            warn!("Rejected session metadata: {}", e);
            ServiceFault::from(e)
        })?;
        if let Err(e) = self.validator.validate_meta(&meta) {
            warn!("Rejected session metadata: {}", e);
            return Err(ServiceFault::from(e));
        }

        let mut state = self.lock();
        if state.is_some() {
            warn!("StartSession called while a session is in progress");
            return Ok(ServiceResponse::nack(
                SessionStatus::InProgress,
                "Session already in progress",
            ));
        }

        if let Err(e) = self.sink.begin_session() {
            error!("Failed to prepare persistence for new session: {}", e);
        }

        *state = Some(ActiveSession {
            meta,
            samples: Vec::new(),
            tracker: AdaptiveThresholdTracker::new(self.config.band.clone(), &meta),
            detector: AnomalyDetector::new(self.config.anomaly.clone()),
        });
        self.bus.publish(&SessionEvent::TransferStarted {
            message: "Transfer in progress".to_string(),
        });

        info!("Session started (seed: {:?})", meta);
        Ok(ServiceResponse::ack(SessionStatus::InProgress, "Session started"))
    }

    /// Convenience wrapper for an already complete `SessionMeta`
    pub fn start(&self, meta: SessionMeta) -> Result<ServiceResponse, ServiceFault> {
        self.start_session(Some(&RawMeta::from(meta)))
    }

    /// Offer one sample to the active session
    pub fn push_sample(&self, raw: Option<&RawSample>) -> Result<ServiceResponse, ServiceFault> {
        let mut state = self.lock();
        let Some(session) = state.as_mut() else {
            debug!("PushSample without an active session");
            return Ok(ServiceResponse::nack(
                SessionStatus::Completed,
                "No active session",
            ));
        };

        let sample = match self.validator.parse_sample(raw) {
            Ok(sample) => sample,
            Err(e) => {
                self.record_reject(RejectedSampleRecord::new(raw.copied(), e.to_string()));
                return Err(ServiceFault::from(e));
            }
        };

        let previous_time = session.samples.last().map(|s| s.time);
        let checked = self
            .validator
            .validate(&sample)
            .and_then(|()| self.validator.validate_time_order(previous_time, &sample));
        if let Err(e) = checked {
            return self.reject_invalid(&sample, e);
        }

        if let Err(violation) = session.tracker.check(&sample) {
            let message = violation.to_string();
            self.record_reject(RejectedSampleRecord::from_sample(&sample, message.clone()));
            return Ok(ServiceResponse::nack(SessionStatus::InProgress, message));
        }

        session.samples.push(sample);
        session.tracker.record(&sample);
        for warning in session.detector.inspect(&sample) {
            self.bus.publish(&SessionEvent::Warning { warning });
        }
        self.bus.publish(&SessionEvent::SampleReceived { sample });

        debug!("Accepted sample #{} at t={}", session.samples.len(), sample.time);
        Ok(ServiceResponse::ack(SessionStatus::InProgress, "Sample accepted"))
    }

    /// Log a sample whose body could not be decoded and report it as a
    /// data format fault
    pub fn push_undecodable(&self, reason: &str) -> Result<ServiceResponse, ServiceFault> {
        let state = self.lock();
        if state.is_none() {
            debug!("Undecodable sample without an active session");
            return Ok(ServiceResponse::nack(
                SessionStatus::Completed,
                "No active session",
            ));
        }

        let message = format!("Malformed sample: {}", reason);
        self.record_reject(RejectedSampleRecord::new(None, message.clone()));
        Err(ServiceFault::DataFormat {
            field: None,
            message,
        })
    }

    /// Convenience wrapper for an already complete `Sample`
    pub fn push(&self, sample: Sample) -> Result<ServiceResponse, ServiceFault> {
        self.push_sample(Some(&RawSample::from(sample)))
    }

    /// End the active session and flush its accepted samples
    pub fn end_session(&self) -> ServiceResponse {
        let mut state = self.lock();
        let Some(session) = state.take() else {
            debug!("EndSession without an active session");
            return ServiceResponse::nack(SessionStatus::Completed, "No active session");
        };

        let count = session.samples.len();
        let message = match self.sink.flush_session(&session.samples) {
            Ok(()) => format!("Session ended, {} samples stored", count),
            Err(e) => {
                error!("Failed to persist {} accepted samples: {}", count, e);
                format!("Session ended, storing {} samples failed: {}", count, e)
            }
        };
        self.bus.publish(&SessionEvent::TransferCompleted {
            message: "Transfer completed".to_string(),
        });

        info!(
            "Session ended: {} accepted samples (seed wind speed {})",
            count, session.meta.wind_speed
        );
        ServiceResponse::ack(SessionStatus::Completed, message)
    }

    pub fn is_active(&self) -> bool {
        self.lock().is_some()
    }

    /// Status a caller would see right now
    pub fn status(&self) -> SessionStatus {
        if self.is_active() {
            SessionStatus::InProgress
        } else {
            SessionStatus::NotStarted
        }
    }

    /// Number of samples accepted in the active session
    pub fn accepted_count(&self) -> usize {
        self.lock().as_ref().map_or(0, |s| s.samples.len())
    }

    /// Accepted samples of the active session, in arrival order
    pub fn accepted_samples(&self) -> Vec<Sample> {
        self.lock()
            .as_ref()
            .map(|s| s.samples.clone())
            .unwrap_or_default()
    }

    fn reject_invalid(
        &self,
        sample: &Sample,
        err: ValidationError,
    ) -> Result<ServiceResponse, ServiceFault> {
        self.record_reject(RejectedSampleRecord::from_sample(sample, err.to_string()));
        match self.config.strictness {
            Strictness::Fault => Err(ServiceFault::from(err)),
            Strictness::Nack => Ok(ServiceResponse::nack(SessionStatus::InProgress, err.to_string())),
        }
    }

    fn record_reject(&self, record: RejectedSampleRecord) {
        warn!("Sample rejected: {}", record.reason);
        if let Err(e) = self.sink.record_reject(&record) {
            warn!("Failed to log rejected sample: {}", e);
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<ActiveSession>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
