//! Orchestration of remote geometry operations.
//!
//! Each call checks its inputs locally, raises the processing flag, calls the
//! geometry service, records the result for display, and reports the outcome
//! through the success/error callbacks and the feedback sink. Only one
//! operation may be in flight per instance; a second submission fails with
//! [`Error::Busy`].

use geoedit_core::{
    DataCallback, EditorEvent, Error, EventDispatcher, FeedbackSink, Geometry, GeometryKind,
    GeometryMetrics, MessageLevel, RemoteOperationError, Result, ValidationError,
};
use geoedit_service::{
    BufferRequest, CalculateRequest, GeometryResponse, GeometryService, MergeRequest, Operation,
    SimplifyRequest, SplitRequest, ValidateOptions, ValidateRequest, ValidationReport,
};
use parking_lot::Mutex;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::guard::InFlight;

/// Minimum number of polygons for a merge.
pub const MIN_MERGE_INPUTS: usize = 2;

/// Minimum number of parts for a successful split.
pub const MIN_SPLIT_PARTS: usize = 2;

/// Payload of a successful operation.
#[derive(Debug, Clone, PartialEq)]
pub enum OperationOutput {
    /// simplify, merge and buffer
    Geometry(Geometry),
    /// split
    Geometries(Vec<Geometry>),
    /// calculate
    Metrics(GeometryMetrics),
    /// validate
    Validation(ValidationReport),
}

/// A successful operation and its payload.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationResult {
    pub operation: Operation,
    pub output: OperationOutput,
}

/// Async bridge between local geometry state and the geometry service.
pub struct GeometryOperations {
    service: Arc<dyn GeometryService>,
    feedback: Arc<dyn FeedbackSink>,
    events: Option<EventDispatcher>,
    processing: AtomicBool,
    last_result: Mutex<Option<OperationResult>>,
    last_metrics: Mutex<Option<GeometryMetrics>>,
    last_validation: Mutex<Option<ValidationReport>>,
    on_success: Mutex<Option<DataCallback<OperationResult>>>,
    on_error: Mutex<Option<DataCallback<Error>>>,
}

impl GeometryOperations {
    pub fn new(service: Arc<dyn GeometryService>, feedback: Arc<dyn FeedbackSink>) -> Self {
        Self {
            service,
            feedback,
            events: None,
            processing: AtomicBool::new(false),
            last_result: Mutex::new(None),
            last_metrics: Mutex::new(None),
            last_validation: Mutex::new(None),
            on_success: Mutex::new(None),
            on_error: Mutex::new(None),
        }
    }

    /// Publishes operation started/finished/failed events on `events`.
    pub fn with_events(mut self, events: EventDispatcher) -> Self {
        self.events = Some(events);
        self
    }

    pub fn set_on_success<F>(&self, callback: F)
    where
        F: Fn(OperationResult) + Send + Sync + 'static,
    {
        *self.on_success.lock() = Some(Box::new(callback));
    }

    pub fn set_on_error<F>(&self, callback: F)
    where
        F: Fn(Error) + Send + Sync + 'static,
    {
        *self.on_error.lock() = Some(Box::new(callback));
    }

    /// Whether an operation is in flight. UI triggers should be disabled while true.
    pub fn is_processing(&self) -> bool {
        self.processing.load(Ordering::Acquire)
    }

    pub fn last_result(&self) -> Option<OperationResult> {
        self.last_result.lock().clone()
    }

    pub fn last_metrics(&self) -> Option<GeometryMetrics> {
        self.last_metrics.lock().clone()
    }

    pub fn last_validation(&self) -> Option<ValidationReport> {
        self.last_validation.lock().clone()
    }

    /// Forgets the cached result, metrics and validation report.
    pub fn clear_results(&self) {
        *self.last_result.lock() = None;
        *self.last_metrics.lock() = None;
        *self.last_validation.lock() = None;
    }

    pub async fn simplify(
        &self,
        geometry: &Geometry,
        tolerance: f64,
        preserve_topology: bool,
    ) -> Result<Geometry> {
        let operation = Operation::Simplify;
        let precheck = if tolerance > 0.0 && tolerance.is_finite() {
            Ok(())
        } else {
            Err(ValidationError::NonPositiveTolerance(tolerance).into())
        };

        let output = self
            .run(operation, precheck, || async {
                let response = self
                    .service
                    .simplify(SimplifyRequest {
                        geometry: geometry.clone(),
                        tolerance,
                        preserve_topology,
                    })
                    .await
                    .map_err(|e| e.into_remote(operation))?;
                single_geometry(operation, response).map(OperationOutput::Geometry)
            })
            .await?;
        expect_geometry(output)
    }

    pub async fn merge(&self, polygons: &[Geometry]) -> Result<Geometry> {
        let operation = Operation::Merge;
        let precheck = check_min_inputs(operation, polygons.len(), MIN_MERGE_INPUTS).and_then(|_| {
            polygons
                .iter()
                .try_for_each(|g| check_kind(operation, g, GeometryKind::Polygon))
        });

        let output = self
            .run(operation, precheck, || async {
                let response = self
                    .service
                    .merge(MergeRequest {
                        polygons: polygons.to_vec(),
                    })
                    .await
                    .map_err(|e| e.into_remote(operation))?;
                single_geometry(operation, response).map(OperationOutput::Geometry)
            })
            .await?;
        expect_geometry(output)
    }

    pub async fn split(&self, polygon: &Geometry, line: &Geometry) -> Result<Vec<Geometry>> {
        let operation = Operation::Split;
        let precheck = check_kind(operation, polygon, GeometryKind::Polygon)
            .and_then(|_| check_kind(operation, line, GeometryKind::LineString));

        let output = self
            .run(operation, precheck, || async {
                let response = self
                    .service
                    .split(SplitRequest {
                        polygon: polygon.clone(),
                        line: line.clone(),
                    })
                    .await
                    .map_err(|e| e.into_remote(operation))?;

                if !response.success {
                    return Err(rejected(operation, response.error));
                }
                let parts = response.geometries.unwrap_or_default();
                if parts.len() < MIN_SPLIT_PARTS {
                    return Err(RemoteOperationError::InsufficientParts {
                        actual: parts.len(),
                    }
                    .into());
                }
                Ok(OperationOutput::Geometries(parts))
            })
            .await?;

        match output {
            OperationOutput::Geometries(parts) => Ok(parts),
            other => Err(unexpected_output(operation, &other)),
        }
    }

    pub async fn validate(
        &self,
        geometry: &Geometry,
        options: ValidateOptions,
    ) -> Result<ValidationReport> {
        let operation = Operation::Validate;
        let output = self
            .run(operation, Ok(()), || async {
                let report = self
                    .service
                    .validate(ValidateRequest {
                        geometry: geometry.clone(),
                        options,
                    })
                    .await
                    .map_err(|e| e.into_remote(operation))?;
                Ok::<_, Error>(OperationOutput::Validation(report))
            })
            .await?;

        match output {
            OperationOutput::Validation(report) => Ok(report),
            other => Err(unexpected_output(operation, &other)),
        }
    }

    pub async fn buffer(&self, geometry: &Geometry, distance_meters: f64) -> Result<Geometry> {
        let operation = Operation::Buffer;
        let precheck = if distance_meters > 0.0 && distance_meters.is_finite() {
            Ok(())
        } else {
            Err(ValidationError::NonPositiveDistance(distance_meters).into())
        };

        let output = self
            .run(operation, precheck, || async {
                let response = self
                    .service
                    .buffer(BufferRequest {
                        geometry: geometry.clone(),
                        distance_meters,
                    })
                    .await
                    .map_err(|e| e.into_remote(operation))?;
                single_geometry(operation, response).map(OperationOutput::Geometry)
            })
            .await?;
        expect_geometry(output)
    }

    /// Measures a geometry remotely. Nothing is modified.
    pub async fn calculate(&self, geometry: &Geometry) -> Result<GeometryMetrics> {
        let operation = Operation::Calculate;
        let output = self
            .run(operation, Ok(()), || async {
                let response = self
                    .service
                    .calculate(CalculateRequest {
                        geometry: geometry.clone(),
                    })
                    .await
                    .map_err(|e| e.into_remote(operation))?;

                if !response.success {
                    return Err(rejected(operation, response.error));
                }
                response
                    .metrics
                    .map(OperationOutput::Metrics)
                    .ok_or_else(|| empty_result(operation))
            })
            .await?;

        match output {
            OperationOutput::Metrics(metrics) => Ok(metrics),
            other => Err(unexpected_output(operation, &other)),
        }
    }

    async fn run<F, Fut>(
        &self,
        operation: Operation,
        precheck: Result<()>,
        call: F,
    ) -> Result<OperationOutput>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<OperationOutput>>,
    {
        let outcome = match precheck {
            Ok(()) => self.execute(operation, call).await,
            Err(err) => Err(err),
        };

        match &outcome {
            Ok(output) => self.record_success(operation, output),
            Err(err) => self.report_failure(operation, err),
        }
        outcome
    }

    async fn execute<F, Fut>(&self, operation: Operation, call: F) -> Result<OperationOutput>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<OperationOutput>>,
    {
        let _processing = InFlight::acquire(&self.processing).ok_or_else(|| Error::Busy {
            operation: operation.to_string(),
        })?;

        tracing::debug!("Geometry operation {} started", operation);
        self.publish(EditorEvent::OperationStarted(operation.to_string()));
        call().await
    }

    fn record_success(&self, operation: Operation, output: &OperationOutput) {
        match output {
            OperationOutput::Geometry(geometry) => {
                *self.last_metrics.lock() = Some(GeometryMetrics::compute(geometry));
                self.feedback
                    .show_toast(&success_message(operation), MessageLevel::Success);
            }
            OperationOutput::Geometries(parts) => {
                self.feedback.show_toast(
                    &format!("Polygon split into {} parts", parts.len()),
                    MessageLevel::Success,
                );
            }
            OperationOutput::Metrics(metrics) => {
                *self.last_metrics.lock() = Some(metrics.clone());
            }
            OperationOutput::Validation(report) => {
                *self.last_validation.lock() = Some(report.clone());
                if report.is_valid {
                    self.feedback
                        .show_toast("Geometry is valid", MessageLevel::Success);
                } else {
                    let detail = if report.errors.is_empty() {
                        "Geometry is not valid".to_string()
                    } else {
                        report.errors.join("; ")
                    };
                    self.feedback.show_toast(&detail, MessageLevel::Warning);
                }
            }
        }

        tracing::info!("Geometry operation {} succeeded", operation);
        let result = OperationResult {
            operation,
            output: output.clone(),
        };
        *self.last_result.lock() = Some(result.clone());
        self.publish(EditorEvent::OperationFinished(operation.to_string()));
        if let Some(callback) = self.on_success.lock().as_ref() {
            callback(result);
        }
    }

    fn report_failure(&self, operation: Operation, err: &Error) {
        let message = err.user_message();
        if err.is_client_side() {
            tracing::debug!("Geometry operation {} rejected locally: {}", operation, err);
        } else {
            tracing::warn!("Geometry operation {} failed: {}", operation, err);
        }

        self.feedback.show_toast(&message, MessageLevel::Error);
        self.publish(EditorEvent::OperationFailed {
            operation: operation.to_string(),
            message,
        });
        if let Some(callback) = self.on_error.lock().as_ref() {
            callback(err.clone());
        }
    }

    fn publish(&self, event: EditorEvent) {
        if let Some(events) = &self.events {
            events.publish(event);
        }
    }
}

fn check_min_inputs(operation: Operation, actual: usize, required: usize) -> Result<()> {
    if actual < required {
        return Err(ValidationError::TooFewInputs {
            operation: operation.to_string(),
            required,
            actual,
        }
        .into());
    }
    Ok(())
}

fn check_kind(operation: Operation, geometry: &Geometry, expected: GeometryKind) -> Result<()> {
    if geometry.kind() != expected {
        return Err(ValidationError::WrongGeometryType {
            operation: operation.to_string(),
            expected: expected.to_string(),
            actual: geometry.kind().to_string(),
        }
        .into());
    }
    Ok(())
}

fn single_geometry(operation: Operation, response: GeometryResponse) -> Result<Geometry> {
    if !response.success {
        return Err(rejected(operation, response.error));
    }
    response.geometry.ok_or_else(|| empty_result(operation))
}

fn expect_geometry(output: OperationOutput) -> Result<Geometry> {
    match output {
        OperationOutput::Geometry(geometry) => Ok(geometry),
        other => Err(Error::other(format!("unexpected operation output: {:?}", other))),
    }
}

fn unexpected_output(operation: Operation, output: &OperationOutput) -> Error {
    Error::other(format!("{} produced unexpected output: {:?}", operation, output))
}

fn rejected(operation: Operation, message: Option<String>) -> Error {
    RemoteOperationError::Rejected {
        operation: operation.to_string(),
        message,
    }
    .into()
}

fn empty_result(operation: Operation) -> Error {
    RemoteOperationError::EmptyResult {
        operation: operation.to_string(),
    }
    .into()
}

fn success_message(operation: Operation) -> String {
    match operation {
        Operation::Simplify => "Geometry simplified".to_string(),
        Operation::Merge => "Polygons merged".to_string(),
        Operation::Buffer => "Buffer created".to_string(),
        other => format!("{} completed", other),
    }
}
