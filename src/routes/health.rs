/// `GET /` liveness probe.
pub async fn liveness() -> &'static str {
    "docqa is running"
}
