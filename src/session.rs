//! Edit session state and parameter-change dispatch.
//!
//! An [`EditSession`] is the complete set of user choices for one image:
//! color, geometry, output size and quality. Together with the source image it
//! determines the encoded output exactly, so nothing derived from it is cached.
//!
//! Input arrives as discrete [`ParameterChange`] events, each touching one
//! field. [`apply_parameter_change`] is a pure function from session to
//! session; the [`Editor`] wraps it with the source image and a backend,
//! re-measures the encoded size after every change and reports what happened
//! as [`EditorEvent`]s on an optional channel.
//!
//! ## Textual events
//!
//! `ParameterChange` parses from `field=value`, which is how the command line
//! feeds raw events:
//!
//! ```text
//! brightness=120   saturation=80   invert=30   grayscale=100
//! rotate=left      rotate=right    rotate=-180
//! flip=horizontal  flip=vertical
//! width=800        height=        (empty falls back to the original)
//! ratio=on         ratio=off
//! quality=85       quality=0.85
//! reset
//! ```

use crate::config::EditorConfig;
use crate::imaging::{
    BackendError, ColorAdjustment, EncodedResult, ExportArtifact, GeometryState, ImageBackend,
    OutputDimensions, Probe, Quality, RasterImage, Sampling, SearchConfig, SearchOutcome,
    add_degrees, operations,
};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use std::sync::mpsc::{self, Sender};
use std::thread;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EditError {
    #[error("Image processing failed: {0}")]
    Imaging(#[from] BackendError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid parameter change '{input}': {reason}")]
pub struct ParameterParseError {
    pub input: String,
    pub reason: String,
}

/// All user choices for the current image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EditSession {
    pub color: ColorAdjustment,
    pub geometry: GeometryState,
    pub dimensions: OutputDimensions,
    pub quality: Quality,
}

impl EditSession {
    /// Fresh session for `source`: identity edits, source-sized output.
    pub fn for_image(source: &RasterImage, quality: Quality) -> Self {
        Self {
            color: ColorAdjustment::default(),
            geometry: GeometryState::default(),
            dimensions: OutputDimensions::from_source(source.width(), source.height()),
            quality,
        }
    }

    /// Clear color and geometry and restore the source size. The aspect lock
    /// and quality are left as they are.
    pub fn reset(&self) -> Self {
        let (width, height) = self.dimensions.original;
        Self {
            color: ColorAdjustment::default(),
            geometry: GeometryState::default(),
            dimensions: OutputDimensions {
                width,
                height,
                ..self.dimensions
            },
            quality: self.quality,
        }
    }
}

/// Rotation step for the rotate buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotateDirection {
    Left,
    Right,
}

/// One discrete input event, carrying a new value for exactly one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterChange {
    Brightness(u32),
    Saturation(u32),
    Inversion(u32),
    Grayscale(u32),
    Rotate(RotateDirection),
    /// Turn by an arbitrary multiple of 90 degrees.
    RotateBy(i32),
    FlipHorizontal,
    FlipVertical,
    /// `None` is an emptied field.
    Width(Option<u32>),
    Height(Option<u32>),
    AspectLock(bool),
    Quality(Quality),
    Reset,
}

/// Apply one change, returning the new session.
pub fn apply_parameter_change(session: &EditSession, change: ParameterChange) -> EditSession {
    let mut next = *session;
    match change {
        ParameterChange::Brightness(v) => next.color.brightness = v,
        ParameterChange::Saturation(v) => next.color.saturation = v,
        ParameterChange::Inversion(v) => next.color.inversion = v,
        ParameterChange::Grayscale(v) => next.color.grayscale = v,
        ParameterChange::Rotate(direction) => {
            let quarter = match direction {
                RotateDirection::Left => -90,
                RotateDirection::Right => 90,
            };
            next.geometry.rotation_degrees = add_degrees(next.geometry.rotation_degrees, quarter)
        }
        ParameterChange::RotateBy(degrees) => {
            next.geometry.rotation_degrees = add_degrees(next.geometry.rotation_degrees, degrees)
        }
        ParameterChange::FlipHorizontal => {
            next.geometry.flip_horizontal = next.geometry.flip_horizontal.toggled()
        }
        ParameterChange::FlipVertical => {
            next.geometry.flip_vertical = next.geometry.flip_vertical.toggled()
        }
        ParameterChange::Width(w) => next.dimensions = next.dimensions.with_width(w),
        ParameterChange::Height(h) => next.dimensions = next.dimensions.with_height(h),
        ParameterChange::AspectLock(on) => next.dimensions = next.dimensions.with_lock(on),
        ParameterChange::Quality(q) => next.quality = q,
        ParameterChange::Reset => next = session.reset(),
    }
    next
}

impl fmt::Display for ParameterChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterChange::Brightness(v) => write!(f, "brightness={}", v),
            ParameterChange::Saturation(v) => write!(f, "saturation={}", v),
            ParameterChange::Inversion(v) => write!(f, "invert={}", v),
            ParameterChange::Grayscale(v) => write!(f, "grayscale={}", v),
            ParameterChange::Rotate(RotateDirection::Left) => write!(f, "rotate=left"),
            ParameterChange::Rotate(RotateDirection::Right) => write!(f, "rotate=right"),
            ParameterChange::RotateBy(d) => write!(f, "rotate={}", d),
            ParameterChange::FlipHorizontal => write!(f, "flip=horizontal"),
            ParameterChange::FlipVertical => write!(f, "flip=vertical"),
            ParameterChange::Width(w) => write!(f, "width={}", optional(*w)),
            ParameterChange::Height(h) => write!(f, "height={}", optional(*h)),
            ParameterChange::AspectLock(true) => write!(f, "ratio=on"),
            ParameterChange::AspectLock(false) => write!(f, "ratio=off"),
            ParameterChange::Quality(q) => write!(f, "quality={}", q.value()),
            ParameterChange::Reset => write!(f, "reset"),
        }
    }
}

fn optional(value: Option<u32>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

impl FromStr for ParameterChange {
    type Err = ParameterParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let fail = |reason: &str| ParameterParseError {
            input: input.to_string(),
            reason: reason.to_string(),
        };
        let (field, value) = match input.split_once('=') {
            Some((field, value)) => (field.trim(), value.trim()),
            None => (input.trim(), ""),
        };
        let percent = |max: u32| -> Result<u32, ParameterParseError> {
            let v: u32 = value.parse().map_err(|_| fail("expected a whole percentage"))?;
            if v > max {
                return Err(fail(&format!("must be between 0 and {}", max)));
            }
            Ok(v)
        };
        let size = || -> Result<Option<u32>, ParameterParseError> {
            if value.is_empty() {
                return Ok(None);
            }
            value
                .parse()
                .map(Some)
                .map_err(|_| fail("expected a pixel count or nothing"))
        };

        match field {
            "brightness" => Ok(ParameterChange::Brightness(percent(200)?)),
            "saturation" => Ok(ParameterChange::Saturation(percent(200)?)),
            "invert" | "inversion" => Ok(ParameterChange::Inversion(percent(100)?)),
            "grayscale" => Ok(ParameterChange::Grayscale(percent(100)?)),
            "rotate" => match value {
                "left" => Ok(ParameterChange::Rotate(RotateDirection::Left)),
                "right" => Ok(ParameterChange::Rotate(RotateDirection::Right)),
                degrees => {
                    let d: i32 = degrees
                        .parse()
                        .map_err(|_| fail("expected left, right or degrees"))?;
                    if d % 90 != 0 {
                        return Err(fail("rotation must be a multiple of 90"));
                    }
                    Ok(ParameterChange::RotateBy(d))
                }
            },
            "flip" => match value {
                "horizontal" | "h" => Ok(ParameterChange::FlipHorizontal),
                "vertical" | "v" => Ok(ParameterChange::FlipVertical),
                _ => Err(fail("expected horizontal or vertical")),
            },
            "width" => Ok(ParameterChange::Width(size()?)),
            "height" => Ok(ParameterChange::Height(size()?)),
            "ratio" => match value {
                "on" | "true" | "locked" => Ok(ParameterChange::AspectLock(true)),
                "off" | "false" | "free" => Ok(ParameterChange::AspectLock(false)),
                _ => Err(fail("expected on or off")),
            },
            "quality" => parse_quality(value).map(ParameterChange::Quality).ok_or_else(|| {
                fail("expected a percentage (1-100) or a fraction (0.01-1.0)")
            }),
            "reset" if value.is_empty() => Ok(ParameterChange::Reset),
            _ => Err(fail("unknown field")),
        }
    }
}

/// `85` and `0.85` both mean 85%.
fn parse_quality(value: &str) -> Option<Quality> {
    if let Ok(percent) = value.parse::<u32>() {
        return (1..=100).contains(&percent).then(|| Quality::new(percent));
    }
    let fraction: f32 = value.parse().ok()?;
    (0.01..=1.0)
        .contains(&fraction)
        .then(|| Quality::from_fraction(fraction))
}

/// Progress and results reported by an [`Editor`].
#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    ImageLoaded {
        width: u32,
        height: u32,
    },
    ChangeApplied {
        change: ParameterChange,
        result: EncodedResult,
    },
    SearchStarted {
        target_bytes: u64,
    },
    SearchProbe(Probe),
    SearchFinished(SearchOutcome),
    Exported {
        filename: String,
        byte_size: u64,
    },
}

/// Session owner: source image, current edits, backend and listeners.
///
/// All work runs synchronously inside the call that asked for it. Each
/// [`dispatch`](Self::dispatch) re-renders and re-encodes once, a
/// [`fit_to_target`](Self::fit_to_target) call renders once and encodes per
/// probe. Nothing is cached between calls.
pub struct Editor<B: ImageBackend> {
    backend: B,
    source: RasterImage,
    session: EditSession,
    sampling: Sampling,
    search: SearchConfig,
    filename_prefix: String,
    events: Option<Sender<EditorEvent>>,
}

impl<B: ImageBackend> Editor<B> {
    pub fn new(backend: B, source: RasterImage, config: &EditorConfig) -> Self {
        let session = EditSession::for_image(&source, Quality::new(config.export.quality));
        Self {
            backend,
            source,
            session,
            sampling: config.render.sampling,
            search: config.search_config(),
            filename_prefix: config.export.filename_prefix.clone(),
            events: None,
        }
    }

    /// Report progress on `events`.
    pub fn with_events(mut self, events: Sender<EditorEvent>) -> Self {
        self.events = Some(events);
        self.emit(EditorEvent::ImageLoaded {
            width: self.source.width(),
            height: self.source.height(),
        });
        self
    }

    pub fn session(&self) -> &EditSession {
        &self.session
    }

    pub fn source(&self) -> &RasterImage {
        &self.source
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn emit(&self, event: EditorEvent) {
        if let Some(tx) = &self.events {
            // A dropped receiver only means nobody is listening.
            tx.send(event).ok();
        }
    }

    /// Replace the source image and start over with identity edits.
    ///
    /// Quality carries over from the previous image.
    pub fn load(&mut self, source: RasterImage) {
        self.session = EditSession::for_image(&source, self.session.quality);
        self.source = source;
        self.emit(EditorEvent::ImageLoaded {
            width: self.source.width(),
            height: self.source.height(),
        });
    }

    /// Apply one change and re-measure.
    ///
    /// If measuring fails the session is left unchanged.
    pub fn dispatch(&mut self, change: ParameterChange) -> Result<EncodedResult, EditError> {
        let next = apply_parameter_change(&self.session, change);
        let result = operations::measure(&self.backend, &self.source, &next, self.sampling)?;
        self.session = next;
        self.emit(EditorEvent::ChangeApplied { change, result });
        Ok(result)
    }

    /// Encoded size of the current edits.
    pub fn measure(&self) -> Result<EncodedResult, EditError> {
        Ok(operations::measure(
            &self.backend,
            &self.source,
            &self.session,
            self.sampling,
        )?)
    }

    /// Search the quality that fits `target_bytes` and adopt it.
    ///
    /// The session's quality is overwritten with the search result whatever
    /// its status; the status says how far to trust it.
    pub fn fit_to_target(&mut self, target_bytes: u64) -> Result<SearchOutcome, EditError> {
        self.emit(EditorEvent::SearchStarted { target_bytes });
        let outcome = thread::scope(|scope| {
            let (tx, rx) = mpsc::channel();
            if let Some(events) = self.events.clone() {
                scope.spawn(move || {
                    for probe in rx {
                        events.send(EditorEvent::SearchProbe(probe)).ok();
                    }
                });
            }
            operations::fit_to_target(
                &self.backend,
                &self.source,
                &self.session,
                self.sampling,
                target_bytes,
                &self.search,
                Some(&tx),
            )
        });
        let outcome = outcome?;
        self.session.quality = outcome.quality;
        self.emit(EditorEvent::SearchFinished(outcome.clone()));
        Ok(outcome)
    }

    /// Render and encode the current edits for saving.
    pub fn export(&self, timestamp_ms: u128) -> Result<ExportArtifact, EditError> {
        let artifact = operations::export(
            &self.backend,
            &self.source,
            &self.session,
            self.sampling,
            &self.filename_prefix,
            timestamp_ms,
        )?;
        self.emit(EditorEvent::Exported {
            filename: artifact.filename.clone(),
            byte_size: artifact.byte_size(),
        });
        Ok(artifact)
    }
}
