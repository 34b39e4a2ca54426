use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for '{field}': {value} ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing configuration field: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid record at line {line}: {reason}")]
    InvalidRecord { line: usize, reason: String },

    #[error("Price must be set to calculate income (trip {trip_id:?})")]
    MissingPrice { trip_id: Option<i64> },

    #[error("Cannot compute a maximum over empty input in {operation}")]
    EmptyInput { operation: String },

    #[error("Division by zero: {context}")]
    DivisionByZero { context: String },

    #[error("Arithmetic overflow: {context}")]
    ArithmeticOverflow { context: String },

    #[error("Unsupported operation: {operation}")]
    UnsupportedOperation { operation: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Io,
    Configuration,
    Data,
    Computation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ReportError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ReportError::IoError(_) | ReportError::UnsupportedOperation { .. } => ErrorCategory::Io,
            ReportError::ConfigError { .. }
            | ReportError::InvalidConfigValueError { .. }
            | ReportError::MissingConfigError { .. } => ErrorCategory::Configuration,
            ReportError::CsvError(_)
            | ReportError::SerializationError(_)
            | ReportError::InvalidRecord { .. } => ErrorCategory::Data,
            ReportError::MissingPrice { .. }
            | ReportError::EmptyInput { .. }
            | ReportError::DivisionByZero { .. }
            | ReportError::ArithmeticOverflow { .. } => ErrorCategory::Computation,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 空輸入只代表沒有可報告的資料
            ReportError::EmptyInput { .. } => ErrorSeverity::Low,
            ReportError::MissingPrice { .. }
            | ReportError::DivisionByZero { .. }
            | ReportError::ArithmeticOverflow { .. } => ErrorSeverity::Medium,
            ReportError::CsvError(_)
            | ReportError::SerializationError(_)
            | ReportError::InvalidRecord { .. }
            | ReportError::ConfigError { .. }
            | ReportError::InvalidConfigValueError { .. }
            | ReportError::MissingConfigError { .. } => ErrorSeverity::High,
            ReportError::IoError(_) | ReportError::UnsupportedOperation { .. } => {
                ErrorSeverity::Critical
            }
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Io => "Check that the data files exist and are readable",
            ErrorCategory::Configuration => "Review the configuration file and CLI overrides",
            ErrorCategory::Data => "Fix the offending line in the input file and rerun",
            ErrorCategory::Computation => {
                "Make sure the trip data contains priced trips for the requested report"
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            ReportError::IoError(e) => format!("Could not access a data file: {}", e),
            ReportError::InvalidRecord { line, reason } => {
                format!("Input line {} is not valid: {}", line, reason)
            }
            ReportError::EmptyInput { operation } => {
                format!("No data available for report '{}'", operation)
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ReportError>;
