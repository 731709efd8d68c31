mod common;

use axum::http::StatusCode;

use common::{app, json, location, session_cookie, set_cookies, CHECKOUT_URL};

#[tokio::test]
async fn test_sign_up_creates_personal_team() {
    let app = app();
    let response = app
        .post_form(
            "/sign-up",
            "email=a%40x.com&password=password123&firstName=Ada&lastName=Lovelace",
            None,
        )
        .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/dashboard");
    let cookie = session_cookie(&response).unwrap();

    let dashboard = app.dashboard(&cookie).await;
    assert_eq!(dashboard["user"]["email"], "a@x.com");
    assert!(dashboard["user"].get("password_hash").is_none());
    assert_eq!(dashboard["team"]["name"], "Ada Lovelace's Team");
    let members = dashboard["team"]["members"].as_array().unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0]["role"], "owner");
}

#[tokio::test]
async fn test_sign_up_with_taken_email_fails_generically() {
    let app = app();
    app.sign_up("a@x.com").await;

    let response = app
        .post_form(
            "/sign-up",
            "email=a%40x.com&password=password456&firstName=Ada&lastName=Again",
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let state = json(response).await;
    assert_eq!(state["error"], "Failed to create user. Please try again.");
    assert_eq!(state["email"], "a@x.com");
    assert!(state.get("password").is_none());
}

#[tokio::test]
async fn test_sign_up_validation_error_is_first_field_message() {
    let app = app();
    let response = app.post_form("/sign-up", "email=bad&password=short", None).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json(response).await["error"], "Invalid email");
}

#[tokio::test]
async fn test_sign_up_with_overlong_name_leaves_email_free() {
    let app = app();
    let body = format!(
        "email=long%40x.com&password=password123&firstName={}&lastName={}",
        "a".repeat(50),
        "b".repeat(43)
    );

    let response = app.post_form("/sign-up", &body, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let state = json(response).await;
    assert_eq!(state["error"], "Name must be at most 46 characters");
    assert_eq!(state["email"], "long@x.com");

    app.sign_up("long@x.com").await;
}

#[tokio::test]
async fn test_sign_in_with_wrong_password() {
    let app = app();
    app.sign_up("a@x.com").await;

    let response = app
        .post_form("/sign-in", "email=a%40x.com&password=wrong-password", None)
        .await;
    let state = json(response).await;
    assert_eq!(state["error"], "Invalid email or password. Please try again.");

    let response = app
        .post_form("/sign-in", "email=nobody%40x.com&password=password123", None)
        .await;
    let state = json(response).await;
    assert_eq!(state["error"], "Invalid email or password. Please try again.");
}

#[tokio::test]
async fn test_sign_in_redirects_to_dashboard() {
    let app = app();
    app.sign_up("a@x.com").await;

    let response = app
        .post_form("/sign-in", "email=a%40x.com&password=password123", None)
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/dashboard");
    let cookie = session_cookie(&response).unwrap();

    let activity = json(app.get("/dashboard/activity", Some(&cookie)).await).await;
    let actions: Vec<&str> = activity
        .as_array()
        .unwrap()
        .iter()
        .map(|entry| entry["action"].as_str().unwrap())
        .collect();
    assert!(actions.contains(&"SIGN_IN"));
    assert!(actions.contains(&"SIGN_UP"));
}

#[tokio::test]
async fn test_sign_in_from_pricing_starts_checkout() {
    let app = app();
    app.sign_up("a@x.com").await;

    let response = app
        .post_form(
            "/sign-in",
            "email=a%40x.com&password=password123&redirect=checkout&priceId=price_1",
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), CHECKOUT_URL);
    assert!(session_cookie(&response).is_some());

    let requests = app.provider.checkout_requests.lock();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].price_id, "price_1");
    assert_eq!(requests[0].trial_period_days, 14);
    assert_eq!(requests[0].customer_id, None);
    assert!(requests[0]
        .success_url
        .ends_with("/api/stripe/checkout?session_id={CHECKOUT_SESSION_ID}"));
    assert!(requests[0].cancel_url.ends_with("/pricing"));
}

#[tokio::test]
async fn test_identity_actions_require_a_session() {
    let app = app();
    let response = app
        .post_form(
            "/account/password",
            "currentPassword=password123&newPassword=password456&confirmPassword=password456",
            None,
        )
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json(response).await["message"], "User is not authenticated");
}

#[tokio::test]
async fn test_update_password_flow() {
    let app = app();
    let cookie = app.sign_up("a@x.com").await;

    let response = app
        .post_form(
            "/account/password",
            "currentPassword=password999&newPassword=password456&confirmPassword=password456",
            Some(&cookie),
        )
        .await;
    assert_eq!(json(response).await["error"], "Current password is incorrect.");

    let response = app
        .post_form(
            "/account/password",
            "currentPassword=password123&newPassword=password456&confirmPassword=password789",
            Some(&cookie),
        )
        .await;
    assert_eq!(json(response).await["error"], "Passwords don't match");

    let response = app
        .post_form(
            "/account/password",
            "currentPassword=password123&newPassword=password123&confirmPassword=password123",
            Some(&cookie),
        )
        .await;
    assert_eq!(
        json(response).await["error"],
        "New password must be different from the current password."
    );

    let response = app
        .post_form(
            "/account/password",
            "currentPassword=password123&newPassword=password456&confirmPassword=password456",
            Some(&cookie),
        )
        .await;
    assert_eq!(json(response).await["success"], "Password updated successfully.");

    let response = app
        .post_form("/sign-in", "email=a%40x.com&password=password456", None)
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_update_account() {
    let app = app();
    let cookie = app.sign_up("a@x.com").await;

    let response = app
        .post_form("/account", "name=&email=a%40x.com", Some(&cookie))
        .await;
    assert_eq!(json(response).await["error"], "Name is required");

    let response = app
        .post_form("/account", "name=Ada+King&email=ada%40x.com", Some(&cookie))
        .await;
    assert_eq!(json(response).await["success"], "Account updated successfully.");

    let dashboard = app.dashboard(&cookie).await;
    assert_eq!(dashboard["user"]["name"], "Ada King");
    assert_eq!(dashboard["user"]["email"], "ada@x.com");
}

#[tokio::test]
async fn test_delete_account_signs_out() {
    let app = app();
    let cookie = app.sign_up("a@x.com").await;

    let response = app
        .post_form("/account/delete", "password=password999", Some(&cookie))
        .await;
    assert_eq!(
        json(response).await["error"],
        "Incorrect password. Account deletion failed."
    );

    let response = app
        .post_form("/account/delete", "password=password123", Some(&cookie))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/sign-in");
    let cookies = set_cookies(&response);
    assert_eq!(cookies.len(), 1);
    assert!(cookies[0].starts_with("session=;"));

    let response = app
        .post_form("/sign-in", "email=a%40x.com&password=password123", None)
        .await;
    assert_eq!(
        json(response).await["error"],
        "Invalid email or password. Please try again."
    );

    // The address is free again.
    app.sign_up("a@x.com").await;
}

#[tokio::test]
async fn test_invitation_is_consumed_once() {
    let app = app();
    let owner = app.sign_up("owner@x.com").await;

    let response = app
        .post_form("/team/invitations", "email=b%40x.com&role=member", Some(&owner))
        .await;
    assert_eq!(json(response).await["success"], "Invitation sent successfully.");

    let team_id = app.dashboard(&owner).await["team"]["id"].as_i64().unwrap() as i32;
    let invitation_id = (1..100)
        .find(|id| {
            app.store
                .invitation(*id)
                .is_some_and(|i| i.team_id == team_id && i.email == "b@x.com")
        })
        .unwrap();

    let body = format!(
        "email=b%40x.com&password=password123&firstName=Bo&lastName=Member&inviteId={}",
        invitation_id
    );
    let response = app.post_form("/sign-up", &body, None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let member = session_cookie(&response).unwrap();
    let member_dashboard = app.dashboard(&member).await;
    assert_eq!(member_dashboard["team"]["id"].as_i64().unwrap() as i32, team_id);

    let members = app.dashboard(&owner).await["team"]["members"].as_array().unwrap().clone();
    assert_eq!(members.len(), 2);
    assert!(members.iter().any(|m| m["email"] == "b@x.com" && m["role"] == "member"));

    let response = app.post_form("/sign-up", &body, None).await;
    assert_eq!(json(response).await["error"], "Invalid or expired invitation.");
}

#[tokio::test]
async fn test_invite_rejects_unknown_role() {
    let app = app();
    let owner = app.sign_up("owner@x.com").await;

    let response = app
        .post_form("/team/invitations", "email=b%40x.com&role=admin", Some(&owner))
        .await;
    assert_eq!(
        json(response).await["error"],
        "Invalid enum value. Expected 'member' | 'owner', received 'admin'"
    );
}

#[tokio::test]
async fn test_remove_member() {
    let app = app();
    let owner = app.sign_up("owner@x.com").await;
    app.post_form("/team/invitations", "email=b%40x.com&role=member", Some(&owner))
        .await;
    let team_id = app.dashboard(&owner).await["team"]["id"].as_i64().unwrap() as i32;
    let invitation_id = (1..100)
        .find(|id| app.store.invitation(*id).is_some_and(|i| i.team_id == team_id))
        .unwrap();
    let body = format!(
        "email=b%40x.com&password=password123&firstName=Bo&lastName=Member&inviteId={}",
        invitation_id
    );
    app.post_form("/sign-up", &body, None).await;

    let members = app.dashboard(&owner).await["team"]["members"].as_array().unwrap().clone();
    let member_id = members
        .iter()
        .find(|m| m["email"] == "b@x.com")
        .and_then(|m| m["id"].as_i64())
        .unwrap();

    let response = app
        .post_form("/team/members/remove", &format!("memberId={}", member_id), Some(&owner))
        .await;
    assert_eq!(json(response).await["success"], "Team member removed successfully");

    let members = app.dashboard(&owner).await["team"]["members"].as_array().unwrap().clone();
    assert_eq!(members.len(), 1);
}

#[tokio::test]
async fn test_sign_out_clears_session() {
    let app = app();
    let cookie = app.sign_up("a@x.com").await;

    let response = app.post_form("/sign-out", "", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/sign-in");
    let cookies = set_cookies(&response);
    assert_eq!(cookies.len(), 1);
    assert!(cookies[0].contains("Max-Age=0"));

    let response = app
        .post_form("/sign-in", "email=a%40x.com&password=password123", None)
        .await;
    let cookie = session_cookie(&response).unwrap();
    let activity = json(app.get("/dashboard/activity", Some(&cookie)).await).await;
    assert!(activity
        .as_array()
        .unwrap()
        .iter()
        .any(|entry| entry["action"] == "SIGN_OUT"));
}
