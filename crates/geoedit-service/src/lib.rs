//! GeoEdit Service Crate
//!
//! Request/response contract of the remote geometry service and an HTTP
//! client implementing it.

pub mod client;
pub mod error;
pub mod protocol;

pub use client::{GeometryService, HttpGeometryService};
pub use error::{ServiceError, ServiceResult};
pub use protocol::{
    BufferRequest, CalculateRequest, DuplicateCandidate, GeometryResponse, MergeRequest,
    MetricsResponse, Operation, SimplifyRequest, SplitRequest, SplitResponse, ValidateOptions,
    ValidateRequest, ValidationReport,
};
