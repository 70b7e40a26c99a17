use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::features::images::handlers::{get_image, list_images, upload_image, ImagesState};
use crate::features::images::services::{ImageService, ViewService};
use crate::features::plans::PlanService;

/// Create routes for the images feature (all require the auth middleware to
/// be applied by the caller)
pub fn routes(
    image_service: Arc<ImageService>,
    plan_service: Arc<PlanService>,
    view_service: Arc<ViewService>,
    max_upload_size: usize,
) -> Router {
    let state = ImagesState {
        image_service,
        plan_service,
        view_service,
    };

    Router::new()
        .route(
            "/images/upload",
            // Allow body size up to the upload cap plus multipart overhead
            post(upload_image).layer(DefaultBodyLimit::max(max_upload_size + 1024 * 1024)),
        )
        .route("/images/", get(list_images))
        .route("/{id}/", get(get_image))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use axum_test::multipart::{MultipartForm, Part};
    use axum_test::{TestResponse, TestServer};
    use serde_json::Value;

    use crate::features::plans::models::{PlanTier, ThumbnailSize};
    use crate::shared::constants::{PLAN_BASIC, PLAN_ENTERPRISE};
    use crate::shared::test_helpers::{encode_test_png, test_user, TestApp};
    use crate::shared::validation::EXTENSION_MESSAGE;

    async fn upload(server: &TestServer, file_name: &str, name: Option<&str>) -> TestResponse {
        let mut form = MultipartForm::new().add_part(
            "image_file",
            Part::bytes(encode_test_png(8, 8))
                .file_name(file_name)
                .mime_type("image/png"),
        );
        if let Some(name) = name {
            form = form.add_text("name", name);
        }
        server.post("/images/upload").multipart(form).await
    }

    fn field_names(view: &Value) -> Vec<String> {
        view.as_object()
            .expect("view is an object")
            .keys()
            .cloned()
            .collect()
    }

    #[tokio::test]
    async fn upload_renders_view_through_assigned_plan() {
        let app = TestApp::new();
        app.plans
            .add_plan(PlanTier {
                name: "Tiny".to_string(),
                thumbnail_sizes: vec![ThumbnailSize::new(0, 50)],
                show_original_link: false,
                create_expiring_link: false,
            })
            .await;
        app.plans.assign("alice", "Tiny").await;

        let server = TestServer::new(app.router_as(test_user("alice", &[]))).unwrap();
        let response = upload(&server, "macara.jpg", Some("macara")).await;
        response.assert_status(axum::http::StatusCode::CREATED);

        let view = response.json::<Value>();
        assert_eq!(
            field_names(&view),
            vec!["name".to_string(), "thumbnail_0x50_url".to_string()]
        );
        assert_eq!(view["name"], "macara");
        // Path suffix is width-major even though the field key is height-major
        let url = view["thumbnail_0x50_url"].as_str().unwrap();
        assert!(url.contains("50x0"), "unexpected thumbnail url: {url}");
        assert!(url.starts_with("http://testserver/media/"));
    }

    #[tokio::test]
    async fn original_only_plan_yields_name_and_image_url() {
        let app = TestApp::new();
        app.plans
            .add_plan(PlanTier {
                name: "OriginalsOnly".to_string(),
                thumbnail_sizes: vec![],
                show_original_link: true,
                create_expiring_link: false,
            })
            .await;
        app.plans.assign("alice", "OriginalsOnly").await;

        let server = TestServer::new(app.router_as(test_user("alice", &[]))).unwrap();
        let view = upload(&server, "macara.png", Some("macara"))
            .await
            .json::<Value>();

        assert_eq!(
            field_names(&view),
            vec!["name".to_string(), "image_url".to_string()]
        );
    }

    #[tokio::test]
    async fn basic_plan_shows_single_thumbnail_only() {
        let app = TestApp::new();
        app.plans.assign("alice", PLAN_BASIC).await;

        let server = TestServer::new(app.router_as(test_user("alice", &[]))).unwrap();
        let view = upload(&server, "photo.jpg", None).await.json::<Value>();

        assert_eq!(
            field_names(&view),
            vec!["name".to_string(), "thumbnail_200x0_url".to_string()]
        );
        // Display name falls back to the uploaded filename
        assert_eq!(view["name"], "photo.jpg");
    }

    #[tokio::test]
    async fn enterprise_plan_shows_everything() {
        let app = TestApp::new();
        app.plans.assign("alice", PLAN_ENTERPRISE).await;

        let server = TestServer::new(app.router_as(test_user("alice", &[]))).unwrap();
        let view = upload(&server, "photo.jpg", None).await.json::<Value>();

        assert_eq!(
            field_names(&view),
            vec![
                "name".to_string(),
                "thumbnail_200x0_url".to_string(),
                "thumbnail_400x0_url".to_string(),
                "image_url".to_string(),
                "create_expiring_link".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn disallowed_extension_is_rejected() {
        let app = TestApp::new();
        app.plans.assign("alice", PLAN_BASIC).await;

        let server = TestServer::new(app.router_as(test_user("alice", &[]))).unwrap();
        let response = upload(&server, "animation.gif", None).await;

        response.assert_status(axum::http::StatusCode::BAD_REQUEST);
        let body = response.json::<Value>();
        assert_eq!(body["message"], EXTENSION_MESSAGE);
        assert!(app.images.is_empty().await);
    }

    #[tokio::test]
    async fn upload_without_plan_assignment_is_conflict() {
        let app = TestApp::new();

        let server = TestServer::new(app.router_as(test_user("nobody", &[]))).unwrap();
        let response = upload(&server, "photo.jpg", None).await;

        response.assert_status(axum::http::StatusCode::CONFLICT);
        // Nothing gets written for an unassigned caller
        assert!(app.images.is_empty().await);
    }

    #[tokio::test]
    async fn staff_without_assignment_uses_top_tier() {
        let app = TestApp::new();

        let server = TestServer::new(app.router_as(test_user("moderator", &["staff"]))).unwrap();
        let response = upload(&server, "photo.jpg", None).await;

        response.assert_status(axum::http::StatusCode::CREATED);
        let view = response.json::<Value>();
        assert!(view.get("create_expiring_link").is_some());
    }

    #[tokio::test]
    async fn list_returns_only_callers_images() {
        let app = TestApp::new();
        app.plans.assign("alice", PLAN_BASIC).await;
        app.plans.assign("bob", PLAN_BASIC).await;

        let alice = TestServer::new(app.router_as(test_user("alice", &[]))).unwrap();
        let bob = TestServer::new(app.router_as(test_user("bob", &[]))).unwrap();

        upload(&alice, "one.jpg", None).await.assert_status_success();
        upload(&alice, "two.jpg", None).await.assert_status_success();
        upload(&bob, "three.jpg", None).await.assert_status_success();

        let listing = alice.get("/images/").await.json::<Value>();
        let entries = listing.as_array().unwrap();
        assert_eq!(entries.len(), 2);
        for entry in entries {
            assert!(entry["thumbnail_200x0_url"].is_string());
        }
    }

    #[tokio::test]
    async fn foreign_image_reads_as_not_found() {
        let app = TestApp::new();
        app.plans.assign("alice", PLAN_BASIC).await;
        app.plans.assign("bob", PLAN_BASIC).await;

        let bob = TestServer::new(app.router_as(test_user("bob", &[]))).unwrap();
        upload(&bob, "secret.jpg", None).await.assert_status_success();
        let id = app.images.all().await[0].id;

        let alice = TestServer::new(app.router_as(test_user("alice", &[]))).unwrap();
        alice
            .get(&format!("/{id}/"))
            .await
            .assert_status(axum::http::StatusCode::NOT_FOUND);

        // The owner still sees it
        bob.get(&format!("/{id}/"))
            .await
            .assert_status(axum::http::StatusCode::OK);
    }

    #[tokio::test]
    async fn admin_can_read_foreign_images() {
        let app = TestApp::new();
        app.plans.assign("bob", PLAN_BASIC).await;

        let bob = TestServer::new(app.router_as(test_user("bob", &[]))).unwrap();
        upload(&bob, "secret.jpg", None).await.assert_status_success();
        let id = app.images.all().await[0].id;

        let admin = TestServer::new(app.router_as(test_user("root", &["admin"]))).unwrap();
        admin
            .get(&format!("/{id}/"))
            .await
            .assert_status(axum::http::StatusCode::OK);
    }

    #[tokio::test]
    async fn thumbnail_url_serves_resized_bytes() {
        let app = TestApp::new();
        app.plans.assign("alice", PLAN_BASIC).await;

        let server = TestServer::new(app.router_as(test_user("alice", &[]))).unwrap();
        let view = upload(&server, "photo.png", None).await.json::<Value>();

        let url = view["thumbnail_200x0_url"].as_str().unwrap();
        let path = url.strip_prefix("http://testserver").unwrap();
        let response = server.get(path).await;
        response.assert_status(axum::http::StatusCode::OK);

        let resized = image::load_from_memory(response.as_bytes()).unwrap();
        assert_eq!(resized.height(), 200);
    }
}
