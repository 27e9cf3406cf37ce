//! Pre-flight reachability check for the content backend.

use tracing::debug;

use super::client::ContentClient;

const PROBE_PATH: &str = "/api/articles";

/// `true` only when the backend answers a one-item article list with a success status.
///
/// Unconfigured backends are reported unavailable without a request. Nothing is
/// remembered between calls, so a recovered backend is picked up on the next probe.
pub async fn is_available(client: &ContentClient) -> bool {
    if !client.is_configured() {
        debug!(
            target = "newsdesk::content::probe",
            reason = "unconfigured",
            "content backend unavailable"
        );
        return false;
    }

    let query = [("pagination[pageSize]".to_string(), "1".to_string())];
    match client.send(PROBE_PATH, &query, client.probe_timeout()).await {
        Ok(resp) if resp.status().is_success() => true,
        Ok(resp) => {
            debug!(
                target = "newsdesk::content::probe",
                status = resp.status().as_u16(),
                "content backend unavailable"
            );
            false
        }
        Err(err) => {
            debug!(
                target = "newsdesk::content::probe",
                error = %err,
                "content backend unavailable"
            );
            false
        }
    }
}
