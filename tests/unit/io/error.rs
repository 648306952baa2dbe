//! Tests for error types including source chaining, path context and message formatting

#[cfg(test)]
mod tests {
    use fcpipe::PipelineError;
    use fcpipe::io::error::{WithPath, computation_error, invalid_parameter, missing_column};
    use std::error::Error;
    use std::path::Path;

    // Tests error source chaining works correctly
    // Verified by breaking source chain
    #[test]
    fn test_error_source_chain() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error = PipelineError::FileSystem {
            path: "/tmp/confounds.tsv".into(),
            operation: "read",
            source: io_error,
        };

        assert!(error.source().is_some());
        assert!(error.to_string().contains("/tmp/confounds.tsv"));
    }

    // Tests InvalidParameter error contains all fields
    // Verified by omitting value from message
    #[test]
    fn test_invalid_parameter_error() {
        let error = invalid_parameter("highpass", &0.01, &"must be below lowpass");

        let message = error.to_string();
        assert!(message.contains("highpass"));
        assert!(message.contains("0.01"));
        assert!(message.contains("must be below lowpass"));
        assert!(error.source().is_none());
    }

    // Tests asymmetry message names the offending entry
    // Verified by dropping coordinates from message
    #[test]
    fn test_not_symmetric_message() {
        let error = PipelineError::NotSymmetric {
            row: 1,
            col: 3,
            difference: 0.5,
        };

        let message = error.to_string();
        assert!(message.starts_with("Matrix not symmetrical"));
        assert!(message.contains("(1, 3)"));
        assert!(message.contains("(3, 1)"));
    }

    // Tests unknown strategy and missing column messages
    // Verified by swapping field names in formatting
    #[test]
    fn test_configuration_error_messages() {
        let unknown = PipelineError::UnknownStrategy {
            name: "48P".to_string(),
        };
        assert!(unknown.to_string().contains("48P"));

        let missing = missing_column("rot_z", &"strategy 6P");
        let message = missing.to_string();
        assert!(message.contains("rot_z"));
        assert!(message.contains("strategy 6P"));

        let computation = computation_error("precision", &"singular");
        assert!(computation.to_string().contains("precision"));
    }

    // Tests path replacement on converted third-party errors
    // Verified by leaving placeholder path in place
    #[test]
    fn test_with_path_replaces_placeholder() {
        let result: std::result::Result<(), std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "denied",
        ));

        let error = result.with_path(Path::new("out/cm.csv")).unwrap_err();
        match error {
            PipelineError::FileSystem { path, .. } => assert_eq!(path, Path::new("out/cm.csv")),
            other => panic!("unexpected error: {other}"),
        }
    }

    // Tests errors without a path keep their variant through with_path
    // Verified by mapping every error to FileSystem
    #[test]
    fn test_with_path_keeps_pathless_errors() {
        let result: fcpipe::Result<()> = Err(PipelineError::InvalidData {
            reason: "bad".to_string(),
        });

        let error = result.with_path(Path::new("x.tsv")).unwrap_err();
        assert!(matches!(error, PipelineError::InvalidData { .. }));
    }

    // Tests JSON parse errors convert with source attached
    // Verified by dropping the From conversion
    #[test]
    fn test_json_error_conversion() {
        let parse: std::result::Result<serde_json::Value, _> = serde_json::from_str("{");
        let error: PipelineError = parse.unwrap_err().into();

        assert!(matches!(error, PipelineError::Json { .. }));
        assert!(error.source().is_some());
    }
}
