mod common;

use anyhow::Result;
use axum::http::{Method, StatusCode};
use serde_json::json;

#[tokio::test]
async fn read_scoped_key_is_denied_write_methods() -> Result<()> {
    let app = common::test_app();
    let path = format!("/api/v1/tasks/{}/status", app.open_task.id);

    for method in [Method::POST, Method::PUT, Method::PATCH, Method::DELETE] {
        let (status, body, _) = common::send(
            &app.router,
            method.clone(),
            &path,
            &[("x-api-key", "key-read")],
            Some(json!({ "status": "in-progress" })),
        )
        .await?;

        assert_eq!(status, StatusCode::FORBIDDEN, "method {method}");
        assert_eq!(
            body,
            json!({
                "success": false,
                "message": "API key does not have permission for this HTTP method"
            })
        );
    }
    Ok(())
}

#[tokio::test]
async fn read_scoped_key_can_get() -> Result<()> {
    let app = common::test_app();

    let (status, body, _) = common::send(
        &app.router,
        Method::GET,
        &format!("/api/v1/tasks/{}", app.open_task.id),
        &[("x-api-key", "key-read")],
        None,
    )
    .await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "Open task");
    Ok(())
}

#[tokio::test]
async fn wildcard_key_passes_all_mapped_methods() -> Result<()> {
    let app = common::test_app();

    let (status, _, _) = common::send(
        &app.router,
        Method::GET,
        &format!("/api/v1/tasks/{}", app.open_task.id),
        &[("x-api-key", "key-wild")],
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);

    let (status, body, _) = common::send(
        &app.router,
        Method::PUT,
        &format!("/api/v1/tasks/{}/status", app.open_task.id),
        &[("x-api-key", "key-wild")],
        Some(json!({ "status": "in-progress" })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "in-progress");
    Ok(())
}

#[tokio::test]
async fn empty_scope_list_is_unrestricted() -> Result<()> {
    let app = common::test_app();

    let (status, _, _) = common::send(
        &app.router,
        Method::PUT,
        &format!("/api/v1/tasks/{}/status", app.open_task.id),
        &[("x-api-key", "key-empty")],
        Some(json!({ "status": "review" })),
    )
    .await?;

    assert_eq!(status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn session_authentication_bypasses_scope_checks() -> Result<()> {
    let app = common::test_app();
    let token = common::login(&app.router, &app.member.email, common::MEMBER_PASSWORD).await?;

    // A session caller has no scope list; write methods go straight through.
    let (status, _, _) = common::send(
        &app.router,
        Method::PUT,
        &format!("/api/v1/tasks/{}/status", app.open_task.id),
        &[("authorization", &common::bearer(&token))],
        Some(json!({ "status": "in-progress" })),
    )
    .await?;

    assert_eq!(status, StatusCode::OK);
    Ok(())
}
