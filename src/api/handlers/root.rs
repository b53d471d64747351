use axum::response::IntoResponse;

// Undocumented liveness banner, kept out of the OpenAPI spec.
pub async fn root() -> impl IntoResponse {
    "🎸"
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::to_bytes, response::IntoResponse};

    #[tokio::test]
    async fn root_returns_banner() {
        let response = root().await.into_response();
        let body = to_bytes(response.into_body(), 16).await.unwrap();
        assert_eq!(&body[..], "🎸".as_bytes());
    }
}
