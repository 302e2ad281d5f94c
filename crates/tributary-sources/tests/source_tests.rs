#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serial_test::serial;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::sync::mpsc;
    use tokio_util::sync::CancellationToken;

    use tributary_core::{Resource, TributaryError, Value};
    use tributary_formats::default_registry;
    use tributary_sources::{EnvResource, FileResource, HttpResource};

    const CHANGE_TIMEOUT: Duration = Duration::from_secs(10);

    // ── File resource ──────────────────────────────────────────

    #[tokio::test]
    async fn test_file_load_decodes_by_extension() {
        let registry = default_registry();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.json");
        std::fs::write(&path, br#"{"port": 8080}"#).unwrap();

        let resource = FileResource::new(&path, &registry).unwrap();
        let doc = resource.load(&CancellationToken::new()).await.unwrap();
        assert_eq!(doc.get("port"), Some(&Value::Number(8080.0)));
    }

    #[tokio::test]
    async fn test_file_requires_known_extension() {
        let registry = default_registry();
        let err = FileResource::new("/etc/app.conf", &registry).unwrap_err();
        assert!(matches!(err, TributaryError::UnknownFormat(_)));
        let err = FileResource::new("/etc/noext", &registry).unwrap_err();
        assert!(matches!(err, TributaryError::UnknownFormat(_)));
    }

    #[tokio::test]
    async fn test_file_load_missing_file_is_source_unavailable() {
        let registry = default_registry();
        let dir = tempfile::tempdir().unwrap();
        let resource = FileResource::new(dir.path().join("gone.json"), &registry).unwrap();
        let err = resource.load(&CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, TributaryError::SourceUnavailable(_)));
    }

    #[tokio::test]
    async fn test_file_watch_suppresses_identical_content() {
        let registry = default_registry();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.json");
        std::fs::write(&path, br#"{"port": 1}"#).unwrap();

        let resource = FileResource::new(&path, &registry).unwrap();
        let cancel = CancellationToken::new();
        // Prime the last-seen snapshot.
        resource.load(&cancel).await.unwrap();

        let (change_tx, mut change_rx) = mpsc::channel(8);
        let (err_tx, _err_rx) = mpsc::channel(8);
        let handle = resource
            .watch(cancel.clone(), change_tx, err_tx)
            .await
            .unwrap();

        // A write with identical content must not notify.
        std::fs::write(&path, br#"{"port": 1}"#).unwrap();
        let suppressed =
            tokio::time::timeout(Duration::from_millis(1500), change_rx.recv()).await;
        assert!(suppressed.is_err(), "identical content produced a notification");

        // A real change must.
        std::fs::write(&path, br#"{"port": 2}"#).unwrap();
        let changed = tokio::time::timeout(CHANGE_TIMEOUT, change_rx.recv())
            .await
            .expect("timed out waiting for change")
            .unwrap();
        assert_eq!(changed.get("port"), Some(&Value::Number(2.0)));

        handle.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_file_watch_reports_decode_errors_and_keeps_watching() {
        let registry = default_registry();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.json");
        std::fs::write(&path, br#"{"port": 1}"#).unwrap();

        let resource = FileResource::new(&path, &registry).unwrap();
        let cancel = CancellationToken::new();
        resource.load(&cancel).await.unwrap();

        let (change_tx, mut change_rx) = mpsc::channel(8);
        let (err_tx, mut err_rx) = mpsc::channel(8);
        let handle = resource
            .watch(cancel.clone(), change_tx, err_tx)
            .await
            .unwrap();

        std::fs::write(&path, b"{ not json").unwrap();
        let err = tokio::time::timeout(CHANGE_TIMEOUT, err_rx.recv())
            .await
            .expect("timed out waiting for decode error")
            .unwrap();
        assert!(matches!(err, TributaryError::Decode { .. }));

        // The loop survives the bad write and picks up the next good one.
        std::fs::write(&path, br#"{"port": 3}"#).unwrap();
        let changed = tokio::time::timeout(CHANGE_TIMEOUT, change_rx.recv())
            .await
            .expect("timed out waiting for change")
            .unwrap();
        assert_eq!(changed.get("port"), Some(&Value::Number(3.0)));

        handle.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_file_watch_with_cancelled_token_fails_fast() {
        let registry = default_registry();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.json");
        std::fs::write(&path, b"{}").unwrap();

        let resource = FileResource::new(&path, &registry).unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let (change_tx, _change_rx) = mpsc::channel(8);
        let (err_tx, _err_rx) = mpsc::channel(8);
        let err = resource.watch(cancel, change_tx, err_tx).await.unwrap_err();
        assert!(matches!(err, TributaryError::Cancelled));
    }

    // ── Environment resource ───────────────────────────────────

    #[tokio::test]
    #[serial]
    async fn test_env_load_collects_prefixed_variables() {
        unsafe {
            std::env::set_var("TRIBW_HOST", "localhost");
            std::env::set_var("TRIBW_PORT", "9000");
        }
        let registry = default_registry();
        let resource =
            EnvResource::new("TRIBW_", Duration::from_secs(1), &registry).unwrap();

        let doc = resource.load(&CancellationToken::new()).await.unwrap();
        assert_eq!(doc.get("TRIBW_HOST"), Some(&Value::String("localhost".into())));
        assert_eq!(doc.get("TRIBW_PORT"), Some(&Value::String("9000".into())));

        unsafe {
            std::env::remove_var("TRIBW_HOST");
            std::env::remove_var("TRIBW_PORT");
        }
    }

    #[tokio::test]
    #[serial]
    async fn test_env_load_without_matches_is_source_unavailable() {
        let registry = default_registry();
        let resource =
            EnvResource::new("TRIBW_NO_SUCH_PREFIX_", Duration::ZERO, &registry).unwrap();
        let err = resource.load(&CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, TributaryError::SourceUnavailable(_)));
    }

    #[tokio::test]
    #[serial]
    async fn test_env_watch_polls_for_changes() {
        unsafe {
            std::env::set_var("TRIBP_MODE", "initial");
        }
        let registry = default_registry();
        let resource =
            EnvResource::new("TRIBP_", Duration::from_secs(1), &registry).unwrap();
        let cancel = CancellationToken::new();
        resource.load(&cancel).await.unwrap();

        let (change_tx, mut change_rx) = mpsc::channel(8);
        let (err_tx, _err_rx) = mpsc::channel(8);
        let handle = resource
            .watch(cancel.clone(), change_tx, err_tx)
            .await
            .unwrap();

        unsafe {
            std::env::set_var("TRIBP_MODE", "updated");
        }
        let changed = tokio::time::timeout(CHANGE_TIMEOUT, change_rx.recv())
            .await
            .expect("timed out waiting for env change")
            .unwrap();
        assert_eq!(changed.get("TRIBP_MODE"), Some(&Value::String("updated".into())));

        handle.stop().await.unwrap();
        unsafe {
            std::env::remove_var("TRIBP_MODE");
        }
    }

    // ── HTTP resource ──────────────────────────────────────────

    /// Minimal single-purpose HTTP server: answers every request with the
    /// same status and body.
    async fn serve(status: &'static str, body: &'static str) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    break;
                };
                let mut buf = [0u8; 1024];
                let _ = socket.read(&mut buf).await;
                let response = format!(
                    "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
            }
        });
        format!("http://{addr}/config")
    }

    #[tokio::test]
    async fn test_http_load_decodes_payload() {
        let url = serve("200 OK", r#"{"feature": true}"#).await;
        let registry = default_registry();
        let resource =
            HttpResource::new(url, "json", Duration::from_secs(1), &registry).unwrap();

        let doc = resource.load(&CancellationToken::new()).await.unwrap();
        assert_eq!(doc.get("feature"), Some(&Value::Bool(true)));
    }

    #[tokio::test]
    async fn test_http_load_non_success_is_source_unavailable() {
        let url = serve("404 Not Found", "missing").await;
        let registry = default_registry();
        let resource =
            HttpResource::new(url, "json", Duration::from_secs(1), &registry).unwrap();

        let err = resource.load(&CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, TributaryError::SourceUnavailable(_)));
    }

    #[tokio::test]
    async fn test_http_requires_registered_format() {
        let registry = default_registry();
        let err = HttpResource::new(
            "http://127.0.0.1:1/config",
            "protobuf",
            Duration::ZERO,
            &registry,
        )
        .unwrap_err();
        assert!(matches!(err, TributaryError::UnknownFormat(_)));
    }
}
