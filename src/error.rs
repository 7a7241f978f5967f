use thiserror::Error;

/// Failure produced by a generated builder's `build` method.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuilderError {
    /// A required property was never set and has no default.
    #[error("Missing a non-optional value for {container}.{property}")]
    MissingValueFor {
        property: &'static str,
        container: &'static str,
    },
}

impl BuilderError {
    pub fn missing_value_for(property: &'static str, container: &'static str) -> Self {
        BuilderError::MissingValueFor {
            property,
            container,
        }
    }

    /// Name of the property that was left unset.
    pub fn property(&self) -> &'static str {
        match self {
            BuilderError::MissingValueFor { property, .. } => property,
        }
    }

    /// Name of the aggregate whose builder reported the error.
    pub fn container(&self) -> &'static str {
        match self {
            BuilderError::MissingValueFor { container, .. } => container,
        }
    }
}

pub type BuildResult<T> = Result<T, BuilderError>;
