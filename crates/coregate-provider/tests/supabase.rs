//! Integration tests for the Supabase provider.
//!
//! Each test starts a throwaway HTTP listener that answers exactly one
//! request with a canned GoTrue response, then checks both what the
//! provider sent and how it interpreted the answer.

#[cfg(feature = "supabase")]
mod supabase {
    use chrono::{Duration, Utc};
    use coregate_model::{ProviderEvent, Session, User};
    use coregate_provider::{
        IdentityProvider, ProviderError, SupabaseConfig, SupabaseProvider,
    };
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;
    use url::Url;

    /// What the fake server received.
    struct Captured {
        request_line: String,
        /// Header block, lowercased.
        headers: String,
        body: String,
    }

    fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
        haystack.windows(needle.len()).position(|w| w == needle)
    }

    /// Answers one request with `status` and `body`.
    async fn serve_once(
        status: u16,
        body: &'static str,
    ) -> (Url, JoinHandle<Captured>) {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("should bind");
        let addr = listener.local_addr().expect("should have addr");

        let handle = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.expect("should accept");
            let mut buf = Vec::new();
            let mut chunk = [0u8; 4096];

            let head_end = loop {
                let n = stream.read(&mut chunk).await.expect("should read");
                assert!(n > 0, "client closed before sending headers");
                buf.extend_from_slice(&chunk[..n]);
                if let Some(pos) = find(&buf, b"\r\n\r\n") {
                    break pos + 4;
                }
            };

            let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
            let content_length = head
                .lines()
                .filter_map(|line| line.split_once(':'))
                .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
                .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                .unwrap_or(0);

            while buf.len() < head_end + content_length {
                let n = stream.read(&mut chunk).await.expect("should read body");
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
            }

            let response = format!(
                "HTTP/1.1 {status} Canned\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            stream
                .write_all(response.as_bytes())
                .await
                .expect("should write response");
            let _ = stream.shutdown().await;

            let (request_line, headers) =
                head.split_once("\r\n").unwrap_or((head.as_str(), ""));
            Captured {
                request_line: request_line.to_string(),
                headers: headers.to_lowercase(),
                body: String::from_utf8_lossy(&buf[head_end..]).to_string(),
            }
        });

        let url = Url::parse(&format!("http://{addr}")).expect("valid url");
        (url, handle)
    }

    fn provider(url: Url) -> SupabaseProvider {
        SupabaseProvider::new(SupabaseConfig::new(url, "anon-key"))
            .expect("client should build")
    }

    const TOKEN_BODY: &str = r#"{"access_token":"access-1","token_type":"bearer",
        "expires_in":3600,"refresh_token":"refresh-1",
        "user":{"id":"user-1","email":"ada@example.com","role":"authenticated"}}"#;

    fn expired_session() -> Session {
        Session {
            refresh_token: Some("old-refresh".into()),
            expires_at: Some(Utc::now() - Duration::minutes(5)),
            ..Session::new(
                "old-access",
                User {
                    id: "user-1".into(),
                    email: "ada@example.com".into(),
                },
            )
        }
    }

    #[tokio::test]
    async fn test_sign_in_posts_password_grant_and_emits_signed_in() {
        let (url, server) = serve_once(200, TOKEN_BODY).await;
        let provider = provider(url);
        let mut events = provider.subscribe();

        let session = provider
            .sign_in_with_password("ada@example.com", "hunter22")
            .await
            .expect("sign-in should succeed");

        let captured = server.await.expect("server task");
        assert_eq!(
            captured.request_line,
            "POST /auth/v1/token?grant_type=password HTTP/1.1"
        );
        assert!(captured.headers.contains("apikey: anon-key"));
        assert!(captured.body.contains(r#""email":"ada@example.com""#));
        assert!(captured.body.contains(r#""password":"hunter22""#));

        assert_eq!(session.access_token, "access-1");
        assert_eq!(session.user.id, "user-1");
        assert!(session.expires_at.is_some());
        assert_eq!(events.try_recv(), Some(ProviderEvent::SignedIn(session.clone())));
        assert_eq!(provider.cached_session(), Some(session));
    }

    #[tokio::test]
    async fn test_sign_in_rejected_surfaces_provider_message() {
        let (url, server) = serve_once(
            400,
            r#"{"code":400,"error_code":"invalid_credentials","msg":"Invalid login credentials"}"#,
        )
        .await;
        let provider = provider(url);
        let mut events = provider.subscribe();

        let err = provider
            .sign_in_with_password("ada@example.com", "wrong")
            .await
            .expect_err("sign-in should fail");
        server.await.expect("server task");

        assert_eq!(
            err,
            ProviderError::InvalidCredentials("Invalid login credentials".into())
        );
        assert_eq!(events.try_recv(), None);
        assert_eq!(provider.cached_session(), None);
    }

    #[tokio::test]
    async fn test_sign_up_posts_to_signup_without_session() {
        let (url, server) =
            serve_once(200, r#"{"id":"user-2","email":"new@example.com"}"#).await;
        let provider = provider(url);

        provider
            .sign_up("new@example.com", "hunter22")
            .await
            .expect("sign-up should succeed");

        let captured = server.await.expect("server task");
        assert_eq!(captured.request_line, "POST /auth/v1/signup HTTP/1.1");
        assert_eq!(provider.cached_session(), None);
    }

    #[tokio::test]
    async fn test_reset_sends_redirect_target() {
        let (url, server) = serve_once(200, "{}").await;
        let provider = provider(url);
        let redirect = Url::parse("http://localhost:3000/reset-password").unwrap();

        provider
            .request_password_reset("ada@example.com", &redirect)
            .await
            .expect("reset should succeed");

        let captured = server.await.expect("server task");
        assert_eq!(
            captured.request_line,
            "POST /auth/v1/recover?redirect_to=http%3A%2F%2Flocalhost%3A3000%2Freset-password HTTP/1.1"
        );
        assert!(captured.body.contains("ada@example.com"));
    }

    #[tokio::test]
    async fn test_reset_rate_limited() {
        let (url, server) = serve_once(
            429,
            r#"{"msg":"For security purposes, you can only request this after 60 seconds."}"#,
        )
        .await;
        let provider = provider(url);
        let redirect = Url::parse("http://localhost:3000/reset-password").unwrap();

        let err = provider
            .request_password_reset("ada@example.com", &redirect)
            .await
            .expect_err("reset should fail");
        server.await.expect("server task");

        assert!(matches!(err, ProviderError::RateLimited(_)));
    }

    #[tokio::test]
    async fn test_lookup_refreshes_expired_session() {
        let (url, server) = serve_once(200, TOKEN_BODY).await;
        let provider = provider(url).with_session(expired_session());
        let mut events = provider.subscribe();

        let session = provider
            .current_session()
            .await
            .expect("lookup should succeed")
            .expect("session should be present");

        let captured = server.await.expect("server task");
        assert_eq!(
            captured.request_line,
            "POST /auth/v1/token?grant_type=refresh_token HTTP/1.1"
        );
        assert!(captured.body.contains("old-refresh"));
        assert_eq!(session.access_token, "access-1");
        assert_eq!(events.try_recv(), Some(ProviderEvent::TokenRefreshed(session)));
    }

    #[tokio::test]
    async fn test_lookup_failed_refresh_drops_session() {
        let (url, server) = serve_once(
            400,
            r#"{"error_code":"refresh_token_not_found","msg":"Invalid Refresh Token: Refresh Token Not Found"}"#,
        )
        .await;
        let provider = provider(url).with_session(expired_session());

        let result = provider.current_session().await;
        server.await.expect("server task");

        assert!(result.is_err());
        assert_eq!(provider.cached_session(), None);
    }

    #[tokio::test]
    async fn test_sign_out_clears_locally_even_if_remote_fails() {
        let (url, server) = serve_once(500, r#"{"msg":"boom"}"#).await;
        let provider = provider(url).with_session(expired_session());
        let mut events = provider.subscribe();

        provider.sign_out().await.expect("sign-out should succeed");

        let captured = server.await.expect("server task");
        assert_eq!(captured.request_line, "POST /auth/v1/logout HTTP/1.1");
        assert!(captured.headers.contains("authorization: bearer old-access"));
        assert_eq!(provider.cached_session(), None);
        assert_eq!(events.try_recv(), Some(ProviderEvent::SignedOut));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let provider = provider(Url::parse(&format!("http://{addr}")).unwrap());
        let err = provider
            .sign_in_with_password("ada@example.com", "hunter22")
            .await
            .expect_err("should fail to connect");

        assert!(matches!(err, ProviderError::Network(_)));
    }
}
