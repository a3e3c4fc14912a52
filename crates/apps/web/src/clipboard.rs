use wasm_bindgen_futures::JsFuture;

/// Write `text` to the system clipboard. Failures (no permission, insecure
/// context) are logged and reported as `false`.
pub async fn write_text(text: &str) -> bool {
    let Some(window) = web_sys::window() else {
        return false;
    };
    let promise = window.navigator().clipboard().write_text(text);
    match JsFuture::from(promise).await {
        Ok(_) => true,
        Err(err) => {
            tracing::warn!(error = ?err, "clipboard write rejected");
            false
        }
    }
}
