//! GitHub Actions workflow commands.
//!
//! Written to stdout; the runner turns them into annotations on the job.

/// Escape a message for use as workflow command data.
pub fn escape_data(message: &str) -> String {
    message
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

/// Mark the step as failed with an error annotation.
pub fn set_failed(message: &str) {
    println!("::error::{}", escape_data(message));
}

/// Attach a notice annotation to the job.
pub fn notice(message: &str) {
    println!("::notice::{}", escape_data(message));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_multiline_message() {
        assert_eq!(
            escape_data("Check run 'build' concluded failure\nX\r\n100%"),
            "Check run 'build' concluded failure%0AX%0D%0A100%25"
        );
    }

    #[test]
    fn test_plain_message_untouched() {
        assert_eq!(escape_data("All checks passed"), "All checks passed");
    }
}
