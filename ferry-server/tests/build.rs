use axum::body::Body;
use axum::http::{Request, StatusCode};
use ferry_core::FerryConfig;
use ferry_server::config::with_defaults;
use http_body_util::BodyExt;
use tower::ServiceExt;

#[tokio::test]
async fn serves_files_from_the_configured_directory() {
    let dir = tempfile::TempDir::new().unwrap();
    std::fs::write(dir.path().join("hello.txt"), "hello from ferry").unwrap();

    let mut config = FerryConfig::new();
    config.set("datasource.local.directory", dir.path().to_string_lossy());
    let ax = ferry_server::build(&with_defaults(config).snapshot()).await.unwrap();
    let router = ax.into_router();

    let res = router
        .clone()
        .oneshot(Request::builder().uri("/u/hello.txt").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["content-type"], "text/plain");
    let body = res.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(body.as_ref(), b"hello from ferry");

    let res = router
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn bad_datasource_type_fails_to_build() {
    let mut config = FerryConfig::new();
    config.set("datasource.type", "floppy");
    assert!(ferry_server::build(&with_defaults(config).snapshot()).await.is_err());
}
