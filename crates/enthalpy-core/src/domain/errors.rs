use std::fmt::{Display, Formatter};

/// Failure categories for the calculation pipeline. Each category maps to a
/// stable process exit code so scripted callers can branch on the kind of
/// failure without parsing diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CalcErrorCategory {
    InputValidation,
    DatabaseParse,
    SolverFailure,
    DataShape,
    IoSystem,
}

impl CalcErrorCategory {
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::InputValidation => 2,
            Self::DatabaseParse => 3,
            Self::SolverFailure => 4,
            Self::DataShape => 5,
            Self::IoSystem => 6,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::InputValidation => "INPUT VALIDATION",
            Self::DatabaseParse => "DATABASE PARSE",
            Self::SolverFailure => "SOLVER FAILURE",
            Self::DataShape => "DATA SHAPE",
            Self::IoSystem => "IO SYSTEM",
        }
    }
}

impl Display for CalcErrorCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Shared error type for the core crate. The placeholder is a short stable
/// code (`INPUT.RANGE`, `TDB.STATEMENT`, `RUN.SOLVER_PARAMETER`, ...) that
/// tests and the CLI assert on; the message is the human-facing detail.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("[{placeholder}] {message}")]
pub struct CalcError {
    category: CalcErrorCategory,
    placeholder: String,
    message: String,
}

impl CalcError {
    fn new(
        category: CalcErrorCategory,
        placeholder: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            category,
            placeholder: placeholder.into(),
            message: message.into(),
        }
    }

    pub fn input_validation(placeholder: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(CalcErrorCategory::InputValidation, placeholder, message)
    }

    pub fn database_parse(placeholder: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(CalcErrorCategory::DatabaseParse, placeholder, message)
    }

    pub fn solver_failure(placeholder: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(CalcErrorCategory::SolverFailure, placeholder, message)
    }

    pub fn data_shape(placeholder: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(CalcErrorCategory::DataShape, placeholder, message)
    }

    pub fn io_system(placeholder: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(CalcErrorCategory::IoSystem, placeholder, message)
    }

    pub fn category(&self) -> CalcErrorCategory {
        self.category
    }

    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn exit_code(&self) -> i32 {
        self.category.exit_code()
    }

    /// One-line rendering for CLI stderr output.
    pub fn diagnostic_line(&self) -> String {
        format!(
            "ERROR {} [{}]: {}",
            self.category.label(),
            self.placeholder,
            self.message
        )
    }
}

pub type CalcResult<T> = Result<T, CalcError>;

#[cfg(test)]
mod tests {
    use super::{CalcError, CalcErrorCategory};

    #[test]
    fn categories_map_to_stable_exit_codes() {
        assert_eq!(CalcErrorCategory::InputValidation.exit_code(), 2);
        assert_eq!(CalcErrorCategory::DatabaseParse.exit_code(), 3);
        assert_eq!(CalcErrorCategory::SolverFailure.exit_code(), 4);
        assert_eq!(CalcErrorCategory::DataShape.exit_code(), 5);
        assert_eq!(CalcErrorCategory::IoSystem.exit_code(), 6);
    }

    #[test]
    fn diagnostic_line_contains_placeholder_and_message() {
        let error = CalcError::input_validation("INPUT.RANGE", "start must be below end");
        assert_eq!(error.exit_code(), 2);
        assert_eq!(error.placeholder(), "INPUT.RANGE");
        assert_eq!(
            error.diagnostic_line(),
            "ERROR INPUT VALIDATION [INPUT.RANGE]: start must be below end"
        );
    }

    #[test]
    fn display_uses_placeholder_prefix() {
        let error = CalcError::solver_failure("RUN.SOLVER", "no feasible phase");
        assert_eq!(error.to_string(), "[RUN.SOLVER] no feasible phase");
    }
}
