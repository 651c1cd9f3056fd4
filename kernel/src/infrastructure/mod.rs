/// Audit logging for security events.
pub mod audit;
/// Configuration management for the kernel.
pub mod config;
/// Telemetry setup for logging and tracing.
pub mod telemetry;
