use anyhow::anyhow;
use reqwest::StatusCode;
use std::error::Error as StdError;
use std::io::ErrorKind;

const MAX_ERROR_BODY_CHARS: usize = 500;

fn error_chain_has_io_kind(
    err: &(dyn StdError + 'static),
    kind: ErrorKind,
    needle: &str,
) -> bool {
    let mut current: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(source) = current {
        if let Some(io_err) = source.downcast_ref::<std::io::Error>()
            && io_err.kind() == kind
        {
            return true;
        }

        if source.to_string().to_ascii_lowercase().contains(needle) {
            return true;
        }

        current = source.source();
    }

    false
}

fn error_chain_has_connection_refused(err: &(dyn StdError + 'static)) -> bool {
    error_chain_has_io_kind(err, ErrorKind::ConnectionRefused, "connection refused")
}

fn error_chain_has_timeout(err: &(dyn StdError + 'static)) -> bool {
    error_chain_has_io_kind(err, ErrorKind::TimedOut, "timed out")
}

pub(crate) fn model_api_request_error(
    err: reqwest::Error,
    api_url: &str,
    timeout_secs: u64,
) -> anyhow::Error {
    if err.is_timeout() || error_chain_has_timeout(&err) {
        return anyhow!(
            "Model request timed out after {}s while calling '{}'. \
             Increase MODEL_TIMEOUT_SECS or try again later.",
            timeout_secs,
            api_url
        );
    }

    if err.is_connect() {
        if error_chain_has_connection_refused(&err) {
            return anyhow!(
                "Connection refused by model API at '{}'. \
                 Check OPENAI_BASE_URL.",
                api_url
            );
        }

        return anyhow!(
            "Failed to connect to model API at '{}'. \
             Check OPENAI_BASE_URL and network connectivity.",
            api_url
        );
    }

    anyhow!("Failed to call model API at '{}': {}", api_url, err)
}

pub(crate) fn model_api_status_error(status: StatusCode, body: &str) -> anyhow::Error {
    let body: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
    if status == StatusCode::UNAUTHORIZED {
        return anyhow!(
            "Model API rejected the credential (status {}). Check OPENAI_API_KEY: {}",
            status,
            body
        );
    }

    anyhow!("Model request failed with status {}: {}", status, body)
}
