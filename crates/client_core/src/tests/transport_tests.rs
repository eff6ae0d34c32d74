use super::*;
use axum::{
    extract::Multipart,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::{json, Value};
use shared::error::ErrorCode;
use tokio::net::TcpListener;

use crate::error::RemoteFailureKind;

const SESSION_COOKIE: &str = "jwt=test-token";

async fn spawn_server(app: Router) -> String {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}")
}

fn api_for(server_url: String) -> HttpChatApi {
    HttpChatApi::new(&ClientSettings {
        server_url,
        request_timeout_secs: 5,
        ..ClientSettings::default()
    })
    .expect("client")
}

fn has_session_cookie(headers: &HeaderMap) -> bool {
    headers
        .get(header::COOKIE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|cookies| cookies.contains(SESSION_COOKIE))
}

async fn handle_login(Json(body): Json<Value>) -> impl IntoResponse {
    if body["password"] != "secret1" {
        return (StatusCode::NOT_FOUND, "User with the given email not found.").into_response();
    }
    (
        [(header::SET_COOKIE, format!("{SESSION_COOKIE}; Path=/; HttpOnly"))],
        Json(json!({
            "user": {
                "id": 1,
                "email": body["email"],
                "profileSetup": false,
            }
        })),
    )
        .into_response()
}

async fn handle_user_info(headers: HeaderMap) -> impl IntoResponse {
    if !has_session_cookie(&headers) {
        return (StatusCode::UNAUTHORIZED, "You are not authenticated!").into_response();
    }
    Json(json!({
        "user": {
            "_id": "1",
            "email": "jane@example.com",
            "firstName": "Jane",
            "lastName": "Doe",
            "color": 2,
            "profileSetup": true,
        }
    }))
    .into_response()
}

async fn handle_upload(mut multipart: Multipart) -> impl IntoResponse {
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() != Some(PROFILE_IMAGE_FIELD) {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await.unwrap_or_default();
        if bytes.is_empty() {
            break;
        }
        return Json(json!({ "image": format!("uploads/profiles/{filename}") })).into_response();
    }
    (StatusCode::BAD_REQUEST, "File is required.").into_response()
}

fn auth_router() -> Router {
    Router::new()
        .route("/api/auth/login", post(handle_login))
        .route("/api/auth/user-info", get(handle_user_info))
        .route("/api/auth/logout", post(|| async { "Logout successful." }))
        .route("/api/auth/add-profile-image", post(handle_upload))
        .route(
            "/api/auth/remove-profile-image",
            delete(|| async { "Profile image removed successfully." }),
        )
}

fn credentials(password: &str) -> AuthRequest {
    AuthRequest {
        email: "jane@example.com".into(),
        password: password.into(),
    }
}

#[tokio::test]
async fn login_decodes_user_and_keeps_session_cookie() {
    let api = api_for(spawn_server(auth_router()).await);

    let user = api.login(&credentials("secret1")).await.expect("login");
    assert_eq!(user.id.as_str(), "1");
    assert_eq!(user.email, "jane@example.com");
    assert!(!user.profile_setup_complete);

    let restored = api.user_info().await.expect("cookie carried the session");
    assert_eq!(restored.first_name.as_deref(), Some("Jane"));
    assert_eq!(restored.color_index, Some(2));
    assert!(restored.profile_setup_complete);

    api.logout().await.expect("logout");
}

#[tokio::test]
async fn client_error_status_maps_to_rejected() {
    let api = api_for(spawn_server(auth_router()).await);

    let failure = api
        .login(&credentials("wrong"))
        .await
        .expect_err("rejected");
    assert_eq!(failure.endpoint, routes::LOGIN);
    assert_eq!(failure.kind, RemoteFailureKind::Rejected(ErrorCode::NotFound));
    assert_eq!(failure.status, Some(404));

    let failure = api.user_info().await.expect_err("no cookie yet");
    assert_eq!(
        failure.kind,
        RemoteFailureKind::Rejected(ErrorCode::Unauthorized)
    );
}

#[tokio::test]
async fn server_error_status_maps_to_server_failure() {
    let app = Router::new().route(
        "/api/channel/get-user-channels",
        get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error") }),
    );
    let api = api_for(spawn_server(app).await);

    let failure = api.user_channels().await.expect_err("server error");
    assert_eq!(failure.kind, RemoteFailureKind::Server);
    assert_eq!(failure.status, Some(500));
}

#[tokio::test]
async fn collections_decode_server_shapes() {
    let app = Router::new()
        .route(
            "/api/contacts/get-contacts-for-dm",
            get(|| async {
                Json(json!({
                    "contacts": [{
                        "_id": "u2",
                        "email": "bob@example.com",
                        "firstName": "Bob",
                        "lastName": "Stone",
                        "lastMessageTime": "2024-03-01T10:00:00Z",
                    }]
                }))
            }),
        )
        .route(
            "/api/channel/get-user-channels",
            get(|| async {
                Json(json!({
                    "channels": [{
                        "_id": "ch1",
                        "name": "general",
                        "members": ["u2", { "_id": "u3" }],
                        "admin": { "_id": "u1" },
                    }]
                }))
            }),
        );
    let api = api_for(spawn_server(app).await);

    let contacts = api.contacts_with_messages().await.expect("contacts");
    assert_eq!(contacts.len(), 1);
    assert_eq!(contacts[0].display_name(), "Bob Stone");
    assert!(contacts[0].last_message_time.is_some());

    let channels = api.user_channels().await.expect("channels");
    assert_eq!(channels[0].name, "general");
    assert_eq!(channels[0].member_ids.len(), 2);
    assert_eq!(
        channels[0].admin_id.as_ref().map(|id| id.as_str()),
        Some("u1")
    );
}

#[tokio::test]
async fn missing_collection_field_is_malformed() {
    let app = Router::new().route(
        "/api/contacts/get-contacts-for-dm",
        get(|| async { Json(json!({ "message": "ok" })) }),
    );
    let api = api_for(spawn_server(app).await);

    let failure = api
        .contacts_with_messages()
        .await
        .expect_err("malformed");
    assert_eq!(failure.kind, RemoteFailureKind::Malformed);
    assert_eq!(failure.endpoint, routes::CONTACTS_WITH_MESSAGES);
}

#[tokio::test]
async fn avatar_upload_uses_profile_image_field() {
    let api = api_for(spawn_server(auth_router()).await);

    let image = api
        .add_profile_image(AvatarUpload {
            filename: "jane.png".into(),
            mime_type: Some("image/png".into()),
            bytes: vec![0x89, 0x50, 0x4e, 0x47],
        })
        .await
        .expect("upload");
    assert_eq!(image, "uploads/profiles/jane.png");

    api.remove_profile_image().await.expect("remove");
}

#[tokio::test]
async fn update_profile_accepts_bare_user_record() {
    let app = Router::new().route(
        "/api/auth/update-profile",
        post(|Json(body): Json<Value>| async move {
            Json(json!({
                "id": "u1",
                "email": "jane@example.com",
                "firstName": body["firstName"],
                "lastName": body["lastName"],
                "color": body["color"],
                "profileSetup": true,
            }))
        }),
    );
    let api = api_for(spawn_server(app).await);

    let user = api
        .update_profile(&UpdateProfileRequest {
            first_name: "Jane".into(),
            last_name: "Doe".into(),
            color: 3,
        })
        .await
        .expect("update");
    assert_eq!(user.last_name.as_deref(), Some("Doe"));
    assert_eq!(user.color_index, Some(3));
    assert!(user.profile_setup_complete);
}

#[tokio::test]
async fn unreachable_server_is_a_network_failure() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let api = api_for(format!("http://{addr}"));

    let failure = api.user_channels().await.expect_err("refused");
    assert_eq!(failure.kind, RemoteFailureKind::Network);
    assert_eq!(failure.status, None);

    let missing = MissingChatApi.logout().await.expect_err("unavailable");
    assert_eq!(missing.kind, RemoteFailureKind::Network);
}
