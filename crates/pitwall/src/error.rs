use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
    #[error("update endpoint is misconfigured: {0}")]
    Endpoint(#[from] pitwall_core::QueryError),
    #[error("failed to read prompt response: {0}")]
    Prompt(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::AppError;

    #[test]
    fn io_error_converts_to_prompt_variant() {
        let error = AppError::from(std::io::Error::other("stdin closed"));
        assert!(matches!(error, AppError::Prompt(_)));
        assert_eq!(
            error.to_string(),
            "failed to read prompt response: stdin closed"
        );
    }
}
