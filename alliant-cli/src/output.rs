//! Output formatting for API responses

use alliant_client::{ApiMessage, ApiResponse};
use std::io::{self, Write};

/// Output formatter for API responses
pub struct OutputFormatter {
    quiet: bool,
}

impl OutputFormatter {
    /// Create a new output formatter
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }

    /// Print the result JSON to stdout, and status, errors and warnings to stderr
    pub fn print_response(&self, response: &ApiResponse) -> io::Result<()> {
        if !self.quiet {
            eprintln!("{}", self.format_status(response));
            for warning in response.warnings() {
                eprintln!("{}", format_message("warning", warning));
            }
        }
        for error in response.errors() {
            eprintln!("{}", format_message("error", error));
        }

        if !response.result().is_null() {
            let mut stdout = io::stdout().lock();
            serde_json::to_writer_pretty(&mut stdout, response.result())?;
            writeln!(stdout)?;
        }
        Ok(())
    }

    /// One-line status summary, e.g. `200 OK in 12ms`
    fn format_status(&self, response: &ApiResponse) -> String {
        let status = response.status();
        format!(
            "{} {} in {}",
            status.as_u16(),
            response.reason().unwrap_or("Unknown"),
            format_elapsed(response.elapsed())
        )
    }
}

/// Format an elapsed time at millisecond precision
fn format_elapsed(elapsed: std::time::Duration) -> String {
    let millis = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
    let millis = std::time::Duration::from_millis(millis);
    if millis.is_zero() {
        return "<1ms".to_string();
    }
    humantime::format_duration(millis).to_string()
}

fn format_message(kind: &str, message: &ApiMessage) -> String {
    format!("{}: {}", kind, message)
}
