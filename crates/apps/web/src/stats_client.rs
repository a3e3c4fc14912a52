use gloo_net::http::Request;
use streaming::{StatsError, StatsRequest, StatsResponse};

/// `GET` the stats collaborator. No timeout beyond the browser default.
pub async fn fetch_stats(endpoint: &str, request: &StatsRequest) -> Result<StatsResponse, StatsError> {
    let url = request.url(endpoint);
    let resp = Request::get(&url)
        .send()
        .await
        .map_err(|e| StatsError::Transport(e.to_string()))?;
    if !resp.ok() {
        return Err(StatsError::Status(resp.status()));
    }
    let text = resp
        .text()
        .await
        .map_err(|e| StatsError::Transport(e.to_string()))?;
    serde_json::from_str(&text).map_err(|e| StatsError::Decode(e.to_string()))
}
