//! Preview refresh controller.
//!
//! Decides when the selected raster has to be fetched again for the current
//! zoom level and owns the preview produced by those fetches. Reads run as
//! spawned tasks and report back over a channel; the controller applies their
//! results one at a time.

use crate::catalog::RasterReference;
use crate::error::PreviewResult;
use crate::preview::PreviewImage;
use crate::raster::Bands;
use crate::resolution::{bucket_for_zoom, ResolutionBucket, INITIAL_OVERVIEW_LEVEL};
use crate::source::{RasterHandle, RasterSource, ReadOptions};
use crate::viewport::ViewState;
use clap::ValueEnum;
use std::fmt::Display;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::*;

pub type RequestId = u64;

/// How the controller treats failed and out of date reads.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum RefreshPolicy {
    /// Failures are logged and otherwise ignored, every completed read
    /// overwrites the preview and the used marker only tracks the overview level.
    #[default]
    Faithful,
    /// Only the latest request may update the preview, failures are surfaced
    /// as [`RefreshStatus::Failed`] and the used marker includes the raster.
    Corrected,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RefreshStatus {
    Idle,
    Fetching,
    Failed(String),
}

impl Display for RefreshStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RefreshStatus::Idle => write!(f, "idle"),
            RefreshStatus::Fetching => write!(f, "fetching"),
            RefreshStatus::Failed(message) => write!(f, "failed: {message}"),
        }
    }
}

/// Everything the controller owns, readable through [`PreviewController::state`].
#[derive(Clone, Debug)]
pub struct PreviewState {
    selected: Option<RasterReference>,
    zoom: f64,
    used_overview: u8,
    used_reference: Option<RasterReference>,
    preview: PreviewImage,
}

impl PreviewState {
    pub fn selected(&self) -> Option<&RasterReference> {
        self.selected.as_ref()
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Overview level of the last applied read
    pub fn used_overview(&self) -> u8 {
        self.used_overview
    }

    pub fn used_reference(&self) -> Option<&RasterReference> {
        self.used_reference.as_ref()
    }

    pub fn preview(&self) -> &PreviewImage {
        &self.preview
    }
}

impl Default for PreviewState {
    fn default() -> Self {
        Self {
            selected: None,
            zoom: ViewState::default().zoom,
            used_overview: INITIAL_OVERVIEW_LEVEL,
            used_reference: None,
            preview: PreviewImage::default(),
        }
    }
}

/// Result of one spawned read.
#[derive(Debug)]
pub struct Completion {
    pub request: RequestId,
    pub reference: RasterReference,
    pub bucket: ResolutionBucket,
    pub result: PreviewResult<Bands>,
}

/// Inputs of the last evaluation, zoom compared bitwise
#[derive(Clone, Debug, PartialEq, Eq)]
struct Inputs {
    selected: Option<RasterReference>,
    zoom: u64,
    used_overview: u8,
    used_reference: Option<RasterReference>,
}

/// Latest issued request while it has not completed
#[derive(Clone, Debug)]
struct Pending {
    request: RequestId,
    reference: RasterReference,
    overview_level: u8,
}

/// Failed latest request, kept so the same read is not issued again
#[derive(Clone, Debug)]
struct Failure {
    reference: RasterReference,
    overview_level: u8,
    message: String,
}

pub struct PreviewController {
    source: Arc<dyn RasterSource>,
    policy: RefreshPolicy,
    state: PreviewState,
    last_inputs: Option<Inputs>,
    next_request: RequestId,
    latest: Option<Pending>,
    in_flight: usize,
    unresolved: usize,
    failure: Option<Failure>,
    completion_tx: mpsc::UnboundedSender<Completion>,
    completion_rx: mpsc::UnboundedReceiver<Completion>,
}

impl PreviewController {
    pub fn new(source: Arc<dyn RasterSource>, policy: RefreshPolicy) -> Self {
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();
        Self {
            source,
            policy,
            state: PreviewState::default(),
            last_inputs: None,
            next_request: 1,
            latest: None,
            in_flight: 0,
            unresolved: 0,
            failure: None,
            completion_tx,
            completion_rx,
        }
    }

    /// Replace the selection. Nothing is fetched until the next evaluation.
    pub fn select_raster(&mut self, reference: Option<RasterReference>) {
        if self.state.selected != reference {
            debug!(
                "Selected {}",
                reference.as_ref().map_or("none", |r| r.label())
            );
        }
        self.state.selected = reference;
    }

    pub fn set_zoom_level(&mut self, zoom: f64) {
        self.state.zoom = zoom;
    }

    /// Issue a read when the selection and zoom call for a different preview.
    ///
    /// Does nothing when none of the inputs changed since the last call.
    pub fn evaluate_refresh(&mut self) -> Option<RequestId> {
        let inputs = self.inputs();
        if self.last_inputs.as_ref() == Some(&inputs) {
            return None;
        }
        self.last_inputs = Some(inputs);

        let reference = self.state.selected.clone()?;
        let bucket = bucket_for_zoom(self.state.zoom);
        if self.is_current(&reference, bucket) {
            trace!("Preview already at {bucket}");
            return None;
        }
        if self.policy == RefreshPolicy::Corrected {
            let same_key = |r: &RasterReference, level: u8| {
                *r == reference && level == bucket.overview_level
            };
            if let Some(pending) = &self.latest {
                if same_key(&pending.reference, pending.overview_level) {
                    trace!("Request {} already covers {bucket}", pending.request);
                    return None;
                }
            }
            if let Some(failure) = &self.failure {
                if same_key(&failure.reference, failure.overview_level) {
                    trace!("Not retrying failed read at {bucket}");
                    return None;
                }
            }
        }

        Some(self.spawn_read(reference, bucket))
    }

    fn inputs(&self) -> Inputs {
        Inputs {
            selected: self.state.selected.clone(),
            zoom: self.state.zoom.to_bits(),
            used_overview: self.state.used_overview,
            used_reference: self.state.used_reference.clone(),
        }
    }

    fn is_current(&self, reference: &RasterReference, bucket: ResolutionBucket) -> bool {
        let same_level = bucket.overview_level == self.state.used_overview;
        match self.policy {
            RefreshPolicy::Faithful => same_level,
            RefreshPolicy::Corrected => {
                same_level && self.state.used_reference.as_ref() == Some(reference)
            }
        }
    }

    fn spawn_read(&mut self, reference: RasterReference, bucket: ResolutionBucket) -> RequestId {
        let request = self.next_request;
        self.next_request += 1;
        self.in_flight += 1;
        self.unresolved += 1;
        self.failure = None;
        self.latest = Some(Pending {
            request,
            reference: reference.clone(),
            overview_level: bucket.overview_level,
        });
        info!("Request {request}: {} at {bucket}", reference.label());

        let source = self.source.clone();
        let completion_tx = self.completion_tx.clone();
        tokio::spawn(async move {
            let result: PreviewResult<Bands> = async {
                let handle = source.open(&reference).await?;
                handle
                    .read_bands(ReadOptions::uniform(bucket.target_resolution))
                    .await
            }
            .await;
            let completion = Completion {
                request,
                reference,
                bucket,
                result,
            };
            if completion_tx.send(completion).is_err() {
                debug!("Request {request} finished after the controller was dropped");
            }
        });

        request
    }

    /// Apply a finished read, returns true when the preview was replaced.
    ///
    /// Re-evaluates afterwards since the used marker may have moved.
    pub fn apply_completion(&mut self, completion: Completion) -> bool {
        let Completion {
            request,
            reference,
            bucket,
            result,
        } = completion;
        self.in_flight = self.in_flight.saturating_sub(1);

        let is_latest = self.latest.as_ref().map(|p| p.request) == Some(request);
        if is_latest {
            self.latest = None;
        }
        let is_stale = !is_latest || self.state.selected.as_ref() != Some(&reference);

        let applied = match self.policy {
            RefreshPolicy::Faithful => self.apply_faithful(request, reference, bucket, result),
            RefreshPolicy::Corrected if is_stale => {
                debug!("Discarding stale request {request}");
                false
            }
            RefreshPolicy::Corrected => self.apply_corrected(request, reference, bucket, result),
        };

        self.evaluate_refresh();
        applied
    }

    fn apply_faithful(
        &mut self,
        request: RequestId,
        reference: RasterReference,
        bucket: ResolutionBucket,
        result: PreviewResult<Bands>,
    ) -> bool {
        // Failed requests never resolve, the status stays Fetching
        let preview = match result.and_then(PreviewImage::from_bands) {
            Ok(preview) => preview,
            Err(e) => {
                warn!("Request {request} for {} failed: {e}", reference.label());
                return false;
            }
        };
        self.unresolved = self.unresolved.saturating_sub(1);
        self.replace_preview(request, reference, bucket, preview);
        true
    }

    fn apply_corrected(
        &mut self,
        request: RequestId,
        reference: RasterReference,
        bucket: ResolutionBucket,
        result: PreviewResult<Bands>,
    ) -> bool {
        self.unresolved = self.unresolved.saturating_sub(1);
        match result.and_then(PreviewImage::from_bands) {
            Ok(preview) => {
                self.replace_preview(request, reference, bucket, preview);
                true
            }
            Err(e) => {
                warn!("Request {request} for {} failed: {e}", reference.label());
                self.failure = Some(Failure {
                    reference,
                    overview_level: bucket.overview_level,
                    message: e.to_string(),
                });
                false
            }
        }
    }

    fn replace_preview(
        &mut self,
        request: RequestId,
        reference: RasterReference,
        bucket: ResolutionBucket,
        preview: PreviewImage,
    ) {
        info!(
            "Request {request}: {} preview of {} ready",
            preview,
            reference.label()
        );
        self.state.preview = preview;
        self.state.used_overview = bucket.overview_level;
        self.state.used_reference = Some(reference);
    }

    /// Wait for the next finished read.
    pub async fn next_completion(&mut self) -> Option<Completion> {
        self.completion_rx.recv().await
    }

    /// Wait for one read to finish and apply it.
    pub async fn process_next(&mut self) -> Option<bool> {
        let completion = self.next_completion().await?;
        Some(self.apply_completion(completion))
    }

    /// Apply every read that already finished, returns how many replaced the preview.
    pub fn process_pending(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(completion) = self.completion_rx.try_recv() {
            if self.apply_completion(completion) {
                applied += 1;
            }
        }
        applied
    }

    pub fn status(&self) -> RefreshStatus {
        match (&self.failure, self.policy) {
            (Some(failure), _) => RefreshStatus::Failed(failure.message.clone()),
            (None, RefreshPolicy::Faithful) if self.unresolved > 0 => RefreshStatus::Fetching,
            (None, RefreshPolicy::Corrected) if self.latest.is_some() => RefreshStatus::Fetching,
            _ => RefreshStatus::Idle,
        }
    }

    pub fn state(&self) -> &PreviewState {
        &self.state
    }

    pub fn policy(&self) -> RefreshPolicy {
        self.policy
    }

    /// Spawned reads that have not reported back
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Most recently issued request id
    pub fn latest_request(&self) -> Option<RequestId> {
        self.next_request.checked_sub(1).filter(|id| *id > 0)
    }
}
