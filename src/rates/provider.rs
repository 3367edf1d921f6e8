use std::collections::HashMap;
use std::time::Duration;

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);
const FETCH_RETRIES: usize = 3;
const RETRY_BACKOFF_MS: u64 = 250;

/// Fetch the settings document from the gateway.
///
/// Accepts either the bare document or the gateway's `{"success": .., "data": {..}}`
/// envelope.
pub(super) fn fetch_settings_document(url: &str) -> Option<HashMap<String, serde_json::Value>> {
    let agent: ureq::Agent = ureq::Agent::config_builder()
        .timeout_global(Some(FETCH_TIMEOUT))
        .build()
        .into();

    for attempt in 0..FETCH_RETRIES {
        if let Ok(response) = agent.get(url).call() {
            let mut body = response.into_body();
            if let Ok(parsed) = serde_json::from_reader(body.as_reader()) {
                return Some(unwrap_envelope(parsed));
            }
        }

        if attempt + 1 < FETCH_RETRIES {
            std::thread::sleep(Duration::from_millis(
                RETRY_BACKOFF_MS * (attempt as u64 + 1),
            ));
        }
    }

    None
}

fn unwrap_envelope(
    mut document: HashMap<String, serde_json::Value>,
) -> HashMap<String, serde_json::Value> {
    if document.contains_key("success")
        && let Some(serde_json::Value::Object(data)) = document.remove("data")
    {
        return data.into_iter().collect();
    }
    document
}
