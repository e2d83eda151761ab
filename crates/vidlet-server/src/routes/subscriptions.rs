//! Channel subscriptions: the subscribe toggle plus the two membership
//! listings (who subscribes to a channel, which channels a user follows).

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Router;
use uuid::Uuid;
use vidlet_store::{RelationKind, Toggle, ToggleState};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::response::ApiResponse;
use crate::routes::{parse_id, AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/toggle/{channelId}", post(toggle_subscription))
        .route("/channel/{channelId}", get(channel_subscribers))
        .route("/user/{subscriberId}", get(subscribed_channels))
}

/// Subscribing answers 201 with the new record; unsubscribing answers 200.
async fn toggle_subscription(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(raw_id): Path<String>,
) -> Result<ApiResponse<Toggle>, ApiError> {
    let channel_id = parse_id(&raw_id, "channel")?;
    if channel_id == auth.user.id {
        return Err(ApiError::InvalidArgument(
            "You cannot subscribe to your own channel".to_string(),
        ));
    }

    let toggle = state
        .db()
        .toggle_relation(auth.user.id, channel_id, RelationKind::Subscribe)?;

    Ok(match toggle.state {
        ToggleState::On => ApiResponse::with_status(
            StatusCode::CREATED,
            Some(toggle),
            "Subscribed successfully",
        ),
        ToggleState::Off => ApiResponse::ok(toggle, "Unsubscribed successfully"),
    })
}

async fn channel_subscribers(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<ApiResponse<Vec<Uuid>>, ApiError> {
    let channel_id = parse_id(&raw_id, "channel")?;
    let ids = state.db().channel_subscriber_ids(channel_id)?;
    Ok(ApiResponse::ok(ids, "Subscribers fetched successfully"))
}

async fn subscribed_channels(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<ApiResponse<Vec<Uuid>>, ApiError> {
    let subscriber_id = parse_id(&raw_id, "subscriber")?;
    let ids = state.db().subscribed_channel_ids(subscriber_id)?;
    Ok(ApiResponse::ok(
        ids,
        "Subscribed channels fetched successfully",
    ))
}

#[cfg(test)]
mod tests {
    use crate::routes::test_support::*;
    use axum::http::StatusCode;
    use uuid::Uuid;

    #[tokio::test]
    async fn subscribe_is_201_unsubscribe_is_200() {
        let t = test_app().await;
        let (channel_id, _) = register_and_login(&t.app, "creator").await;
        let (_, fan_token) = register_and_login(&t.app, "fan").await;

        let uri = format!("/subscriptions/toggle/{channel_id}");

        let (status, body) = send_json(&t.app, "POST", &uri, Some(&fan_token), None).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["state"], "ON");

        let (status, body) = send_json(&t.app, "POST", &uri, Some(&fan_token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["state"], "OFF");
    }

    #[tokio::test]
    async fn self_subscription_is_rejected() {
        let t = test_app().await;
        let (user_id, token) = register_and_login(&t.app, "loner").await;

        let uri = format!("/subscriptions/toggle/{user_id}");
        let (status, _) = send_json(&t.app, "POST", &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn subscribing_to_missing_channel_is_not_found() {
        let t = test_app().await;
        let (_, token) = register_and_login(&t.app, "fan").await;

        let uri = format!("/subscriptions/toggle/{}", Uuid::new_v4());
        let (status, _) = send_json(&t.app, "POST", &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn membership_listings_cover_both_directions() {
        let t = test_app().await;
        let (channel_id, _) = register_and_login(&t.app, "creator").await;
        let (fan_a, token_a) = register_and_login(&t.app, "fan-a").await;
        let (fan_b, token_b) = register_and_login(&t.app, "fan-b").await;

        let uri = format!("/subscriptions/toggle/{channel_id}");
        send_json(&t.app, "POST", &uri, Some(&token_a), None).await;
        send_json(&t.app, "POST", &uri, Some(&token_b), None).await;

        let (status, body) = send_json(
            &t.app,
            "GET",
            &format!("/subscriptions/channel/{channel_id}"),
            None,
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        // Insertion order.
        assert_eq!(body["data"], serde_json::json!([fan_a, fan_b]));

        let (status, body) = send_json(
            &t.app,
            "GET",
            &format!("/subscriptions/user/{fan_a}"),
            None,
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], serde_json::json!([channel_id]));
    }
}
