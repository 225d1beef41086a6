//! Ingest input validation.
//!
//! Validation runs before any side effect: a rejected upload must leave no
//! ciphertext in storage and no record in the database.

use crate::AppError;

/// Validate the raw upload before the pipeline touches it.
pub fn validate_ingest(
    plaintext: &[u8],
    owner_id: &str,
    max_size_bytes: usize,
) -> Result<(), AppError> {
    if owner_id.trim().is_empty() {
        return Err(AppError::Validation("Owner id is required".to_string()));
    }
    if plaintext.is_empty() {
        return Err(AppError::Validation(
            "Uploaded document is empty".to_string(),
        ));
    }
    if plaintext.len() > max_size_bytes {
        return Err(AppError::PayloadTooLarge(format!(
            "{} bytes exceeds max {} bytes",
            plaintext.len(),
            max_size_bytes
        )));
    }
    Ok(())
}

/// Strip path separators and control characters from a client-supplied
/// filename so it is safe to persist and echo back.
pub fn sanitize_filename(original: &str) -> Result<String, AppError> {
    let name = original
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(original)
        .chars()
        .filter(|c| !c.is_control())
        .collect::<String>();
    let trimmed = name.trim();
    if trimmed.is_empty() || trimmed == "." || trimmed == ".." {
        return Err(AppError::Validation(format!(
            "Invalid filename: {:?}",
            original
        )));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_rejected() {
        let err = validate_ingest(b"", "u1", 1024).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_missing_owner_rejected() {
        let err = validate_ingest(b"data", "  ", 1024).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_oversize_rejected() {
        let err = validate_ingest(&[0u8; 11], "u1", 10).unwrap_err();
        assert!(matches!(err, AppError::PayloadTooLarge(_)));
    }

    #[test]
    fn test_valid_input_accepted() {
        assert!(validate_ingest(b"hello government", "u1", 1024).is_ok());
    }

    #[test]
    fn test_sanitize_filename_strips_paths() {
        assert_eq!(
            sanitize_filename("../../etc/passwd").unwrap(),
            "passwd"
        );
        assert_eq!(
            sanitize_filename("C:\\Users\\a\\license.pdf").unwrap(),
            "license.pdf"
        );
        assert!(sanitize_filename("..").is_err());
        assert!(sanitize_filename("").is_err());
    }
}
