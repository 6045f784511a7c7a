//! Human-readable error descriptions and structured JSON error formatting.

use weigh_core::error::WeighError;

/// Map an eyre::Report to a human-readable explanation with likely causes
/// and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    if let Some(we) = err.downcast_ref::<WeighError>() {
        return match we {
            WeighError::Timeout => {
                "What happened: The scale did not answer within the read timeout.\nLikely causes: Wrong serial port, cable unplugged, or timeout configured too low.\nHow to fix: Check scale.port and scale.baud_rate in the config, then raise scale.read_timeout_ms if the indicator is slow.".to_string()
            }
            WeighError::Hardware(msg) => format!(
                "What happened: Scale hardware error ({msg}).\nLikely causes: Port in use by another process, flaky cable, or indicator powered off.\nHow to fix: Free the port, reseat the cable, and retry; the connection is reopened automatically on the next read."
            ),
            WeighError::Config(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun."
            ),
            WeighError::State(msg) => format!(
                "What happened: Invalid state ({msg}).\nHow to fix: Re-run with --log-level=debug for details."
            ),
            WeighError::Io(msg) => format!(
                "What happened: I/O error ({msg}).\nHow to fix: Check device permissions and paths, then retry."
            ),
        };
    }

    // String-based heuristics for errors coming from init or config
    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();

    if lower.contains("products csv must have headers") {
        return "Invalid headers in products CSV. Expected 'product_id,customer,variety,density,low_kg,target_kg,high_kg'.".to_string();
    }

    if lower.contains("hardware' feature") {
        return "What happened: The config selects a serial scale but this binary was built without serial support.\nHow to fix: Rebuild with `--features hardware`, or set scale.mode = \"simulation\".".to_string();
    }

    if lower.contains("scale.") || lower.contains("stability.") || lower.contains("recording.") {
        return format!(
            "What happened: Configuration rejected ({msg}).\nHow to fix: Edit the config file and rerun."
        );
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes: config problems 2, hardware problems 3, everything
/// else 1.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if let Some(we) = err.downcast_ref::<WeighError>() {
        return match we {
            WeighError::Config(_) => 2,
            WeighError::Hardware(_) | WeighError::Timeout => 3,
            _ => 1,
        };
    }
    let lower = err.to_string().to_ascii_lowercase();
    if lower.contains("config") || lower.contains("csv") {
        2
    } else {
        1
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;

    let reason = err
        .downcast_ref::<WeighError>()
        .map_or("Error", |we| match we {
            WeighError::Timeout => "Timeout",
            WeighError::Hardware(_) => "Hardware",
            WeighError::Config(_) => "Config",
            WeighError::State(_) => "State",
            WeighError::Io(_) => "Io",
        });
    json!({ "reason": reason, "message": humanize(err) }).to_string()
}
