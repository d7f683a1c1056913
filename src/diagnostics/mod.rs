pub mod boundary;
pub mod manager;

pub use boundary::{ErrorBoundary, RenderPanic};
pub use manager::{
    categorize, context, ConnectivityReport, DiagnosticReport, Diagnostics, EndpointProbe, ErrorCategory,
    ErrorContext, ErrorRecord, ProbeStatus, ProbeTarget,
};
