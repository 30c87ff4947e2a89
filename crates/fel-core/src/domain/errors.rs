use std::error::Error;
use std::fmt::{Display, Formatter};

pub type FelResult<T> = Result<T, FelError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FelErrorCategory {
    InputValidationError,
    IoSystemError,
    ComputationError,
}

impl FelErrorCategory {
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::InputValidationError => 2,
            Self::IoSystemError => 3,
            Self::ComputationError => 4,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InputValidationError => "InputValidationError",
            Self::IoSystemError => "IoSystemError",
            Self::ComputationError => "ComputationError",
        }
    }
}

/// Crate-wide error carrying a category, a stable dotted placeholder and a
/// human readable message. Kernel errors convert into this type at the
/// pipeline boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FelError {
    category: FelErrorCategory,
    placeholder: &'static str,
    message: String,
}

impl FelError {
    pub fn new(
        category: FelErrorCategory,
        placeholder: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            category,
            placeholder,
            message: message.into(),
        }
    }

    pub fn input_validation(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(FelErrorCategory::InputValidationError, placeholder, message)
    }

    pub fn io_system(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(FelErrorCategory::IoSystemError, placeholder, message)
    }

    pub fn computation(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(FelErrorCategory::ComputationError, placeholder, message)
    }

    pub const fn category(&self) -> FelErrorCategory {
        self.category
    }

    pub const fn placeholder(&self) -> &'static str {
        self.placeholder
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn exit_code(&self) -> i32 {
        self.category.exit_code()
    }

    pub fn diagnostic_line(&self) -> String {
        format!("ERROR: [{}] {}", self.placeholder, self.message)
    }
}

impl Display for FelError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{}] {}",
            self.category.as_str(),
            self.placeholder,
            self.message
        )
    }
}

impl Error for FelError {}
