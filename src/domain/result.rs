//! Result type alias for the reporter

use super::errors::ReporterError;

/// Result type alias for reporter operations
///
/// # Examples
///
/// ```
/// use reporter::domain::result::Result;
/// use reporter::domain::errors::ReporterError;
///
/// fn example_function() -> Result<String> {
///     Ok("success".to_string())
/// }
///
/// fn failing_function() -> Result<()> {
///     Err(ReporterError::Configuration("Invalid input".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, ReporterError>;
