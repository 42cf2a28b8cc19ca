/// Unauthenticated liveness probe. The client's locator dials the TCP
/// port; humans and scripts can hit this instead.
pub async fn handler() -> &'static str {
    "Pong!"
}
