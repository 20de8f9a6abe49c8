use thiserror::Error;

use crate::layout::LayoutError;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum CloudError {
    #[error("{}", .0.join("\n"))]
    Data(Vec<String>),
    #[error("layout failed: {0}")]
    Layout(#[from] LayoutError),
    #[error("text measurement failed: {0}")]
    Measure(String),
}

impl CloudError {
    pub fn is_data(&self) -> bool {
        matches!(self, CloudError::Data(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_errors_are_joined_by_line() {
        let err = CloudError::Data(vec!["first".to_string(), "second".to_string()]);
        assert_eq!(err.to_string(), "first\nsecond");
        assert!(err.is_data());
    }

    #[test]
    fn layout_errors_convert() {
        let err: CloudError = LayoutError::Finished.into();
        assert!(err.to_string().starts_with("layout failed"));
    }
}
