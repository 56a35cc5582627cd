use std::sync::{Mutex, MutexGuard, PoisonError};

use serde_json::{Map, Value};

use crate::overlay::config::OverlayConfig;
use crate::overlay::domain::fps_label::fps_label;
use crate::overlay::domain::running_average::RunningAverage;
use crate::overlay::domain::text_renderer::TextRenderer;
use crate::overlay::overlay_error::OverlayError;
use crate::shared::clock::{Clock, SystemClock};
use crate::shared::frame::ReleasableFrame;
use crate::shared::read_context::ReadContext;
use crate::source::domain::dependencies::Dependencies;
use crate::source::domain::frame_source::{FrameSource, SourceProperties};
use crate::source::domain::source_error::SourceError;

/// Snapshot of the averaging state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FpsStats {
    pub sample_count: u64,
    pub average_secs: f64,
    pub fps: Option<f64>,
}

struct Upstream {
    name: String,
    source: Box<dyn FrameSource>,
    properties: SourceProperties,
}

struct ReaderState {
    upstream: Option<Upstream>,
    average: RunningAverage,
    renderer: Box<dyn TextRenderer>,
}

/// Decorator that forwards frames from one upstream source and stamps each
/// with the running-average frame rate of that source.
///
/// Every read times the upstream fetch, folds the latency into the mean and
/// draws `avg. FPS: N.NN` onto a copy of the frame. Replacing the upstream
/// starts a new measurement epoch.
///
/// All operations take `&self`; one mutex covers the upstream and the
/// averaging state, so a swap never interleaves with a read in flight.
pub struct FpsOverlayReader {
    state: Mutex<ReaderState>,
    clock: Box<dyn Clock>,
}

impl FpsOverlayReader {
    /// A reader with no upstream; reads fail with `NotReady` until the first
    /// successful [`reconfigure`](Self::reconfigure).
    pub fn new(renderer: Box<dyn TextRenderer>) -> Self {
        Self {
            state: Mutex::new(ReaderState {
                upstream: None,
                average: RunningAverage::new(),
                renderer,
            }),
            clock: Box::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Validates `config` and attaches the source it names.
    pub fn from_config(
        ctx: &ReadContext,
        config: &OverlayConfig,
        deps: &mut Dependencies,
        renderer: Box<dyn TextRenderer>,
    ) -> Result<Self, OverlayError> {
        config.validate()?;
        let reader = Self::new(renderer);
        reader.reconfigure(ctx, config, deps)?;
        Ok(reader)
    }

    /// Reads one frame from upstream and returns it with the FPS overlay.
    ///
    /// The upstream release callback travels with the returned frame. A
    /// failed or cancelled fetch leaves the averaging state untouched.
    pub fn read_frame(&self, ctx: &ReadContext) -> Result<ReleasableFrame, OverlayError> {
        let mut guard = self.lock();
        let state = &mut *guard;
        let upstream = state.upstream.as_mut().ok_or(OverlayError::NotReady)?;

        let start = self.clock.now();
        let fetched = upstream
            .source
            .next_frame(ctx)
            .map_err(|source| OverlayError::UpstreamRead {
                name: upstream.name.clone(),
                source,
            })?;
        let elapsed = self.clock.now().saturating_duration_since(start);

        if let Err(cancelled) = ctx.check() {
            fetched.release();
            return Err(OverlayError::UpstreamRead {
                name: upstream.name.clone(),
                source: cancelled.into(),
            });
        }

        state.average.fold(elapsed.as_secs_f64());
        let label = fps_label(state.average.fps());
        log::debug!(
            "{}: frame {} fetched in {:.1}ms, {label}",
            upstream.name,
            fetched.frame().index(),
            elapsed.as_secs_f64() * 1000.0
        );

        let overlaid = state
            .renderer
            .render(fetched.frame(), &label)
            .map_err(|e| OverlayError::Render(e.to_string()))?;
        Ok(fetched.map_frame(overlaid))
    }

    /// Swaps the upstream for the source named in `config`.
    ///
    /// The current upstream is closed first and the averaging state reset.
    /// On failure the reader is left detached and any newly resolved source
    /// is closed again.
    pub fn reconfigure(
        &self,
        ctx: &ReadContext,
        config: &OverlayConfig,
        deps: &mut Dependencies,
    ) -> Result<(), OverlayError> {
        let mut state = self.lock();
        if let Some(old) = state.upstream.take() {
            close_detached(old, ctx);
        }
        state.average.reset();

        config.validate()?;
        let name = config.camera_name.as_str();
        let mut source = deps.resolve_frame_source(name)?;
        let properties = match source.properties(ctx) {
            Ok(properties) => properties,
            Err(err) => {
                if let Err(close_err) = source.close(ctx) {
                    log::warn!("Closing {name:?} after failed attach: {close_err}");
                }
                return Err(OverlayError::Properties {
                    name: name.to_string(),
                    source: err,
                });
            }
        };

        log::info!(
            "Attached {name:?} ({:?}, {}x{})",
            properties.image_type,
            properties.width.unwrap_or(0),
            properties.height.unwrap_or(0)
        );
        state.upstream = Some(Upstream {
            name: name.to_string(),
            source,
            properties,
        });
        Ok(())
    }

    /// Closes and detaches the upstream. Closing a detached reader is a no-op.
    pub fn close(&self, ctx: &ReadContext) -> Result<(), OverlayError> {
        let Some(mut upstream) = self.lock().upstream.take() else {
            return Ok(());
        };
        log::info!("Closing {:?}", upstream.name);
        upstream
            .source
            .close(ctx)
            .map_err(|source| OverlayError::Close {
                name: upstream.name,
                source,
            })
    }

    /// Echoes `command` back unchanged.
    pub fn do_command(&self, command: Map<String, Value>) -> Map<String, Value> {
        command
    }

    /// Properties of the attached upstream, as queried when it was attached.
    pub fn properties(&self) -> Result<SourceProperties, OverlayError> {
        self.lock()
            .upstream
            .as_ref()
            .map(|u| u.properties)
            .ok_or(OverlayError::NotReady)
    }

    pub fn stats(&self) -> FpsStats {
        let state = self.lock();
        FpsStats {
            sample_count: state.average.count(),
            average_secs: state.average.average_secs(),
            fps: state.average.fps(),
        }
    }

    pub fn upstream_name(&self) -> Option<String> {
        self.lock().upstream.as_ref().map(|u| u.name.clone())
    }

    pub fn is_ready(&self) -> bool {
        self.lock().upstream.is_some()
    }

    // State is only written after the fallible calls succeed, so it stays
    // consistent even if a holder panicked.
    fn lock(&self) -> MutexGuard<'_, ReaderState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn close_detached(mut upstream: Upstream, ctx: &ReadContext) {
    log::info!("Detaching {:?}", upstream.name);
    if let Err(err) = upstream.source.close(ctx) {
        log::warn!("Closing {:?} on detach failed: {err}", upstream.name);
    }
}

impl FrameSource for FpsOverlayReader {
    fn properties(&mut self, _ctx: &ReadContext) -> Result<SourceProperties, SourceError> {
        FpsOverlayReader::properties(self).map_err(SourceError::from)
    }

    fn next_frame(&mut self, ctx: &ReadContext) -> Result<ReleasableFrame, SourceError> {
        self.read_frame(ctx).map_err(SourceError::from)
    }

    fn close(&mut self, ctx: &ReadContext) -> Result<(), SourceError> {
        FpsOverlayReader::close(self, ctx).map_err(SourceError::from)
    }
}

impl Drop for FpsOverlayReader {
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(upstream) = state.upstream.take() {
            close_detached(upstream, &ReadContext::background());
        }
    }
}
