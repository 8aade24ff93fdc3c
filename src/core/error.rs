use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProjectionError {
    #[error("invalid {field}: {reason}")]
    InvalidInput { field: &'static str, reason: String },

    #[error("historical index: {0}")]
    History(String),
}

impl ProjectionError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ProjectionError::InvalidInput {
            field,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ProjectionError>;

pub(crate) fn require_amount(field: &'static str, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(ProjectionError::invalid(field, "must be a finite number"));
    }
    if value < 0.0 {
        return Err(ProjectionError::invalid(field, "must be >= 0"));
    }
    Ok(())
}

pub(crate) fn require_rate(field: &'static str, value: f64) -> Result<()> {
    if !value.is_finite() || value <= -1.0 {
        return Err(ProjectionError::invalid(field, "must be a finite rate above -100%"));
    }
    Ok(())
}

pub(crate) fn require_years(years: u32, max_years: u32) -> Result<()> {
    if years == 0 || years > max_years {
        return Err(ProjectionError::invalid(
            "years",
            format!("must be between 1 and {max_years}"),
        ));
    }
    Ok(())
}
