//! Typed form schemas for every form action

use serde::Deserialize;
use std::borrow::Cow;
use std::num::ParseIntError;
use validator::{Validate, ValidationError};

use saas_core::domain::TeamRole;

use super::validator::ActionSchema;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignInForm {
    #[serde(default)]
    #[validate(
        email(message = "Invalid email"),
        length(min = 3, max = 255, message = "Email must be between 3 and 255 characters")
    )]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 8, max = 100, message = "Password must be between 8 and 100 characters"))]
    pub password: String,
    pub redirect: Option<String>,
    pub price_id: Option<String>,
}

impl ActionSchema for SignInForm {
    const FIELDS: &'static [&'static str] = &["email", "password"];
    const ECHO: &'static [&'static str] = &["email"];
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignUpForm {
    #[serde(default)]
    #[validate(email(message = "Invalid email"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    #[serde(default)]
    #[validate(
        length(min = 1, message = "First name is required"),
        custom(function = "within_person_name_limit")
    )]
    pub first_name: String,
    #[serde(default)]
    #[validate(
        length(min = 1, message = "Last name is required"),
        custom(function = "within_person_name_limit")
    )]
    pub last_name: String,
    pub invite_id: Option<String>,
    pub redirect: Option<String>,
    pub price_id: Option<String>,
}

impl ActionSchema for SignUpForm {
    const FIELDS: &'static [&'static str] = &["email", "password", "first_name", "last_name"];
    const ECHO: &'static [&'static str] = &["email"];
}

impl SignUpForm {
    /// The invitation id, `Ok(None)` when absent.
    pub fn invitation(&self) -> Result<Option<i32>, ParseIntError> {
        match self.invite_id.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => raw.parse().map(Some),
        }
    }
}

/// Longest first or last name; two of them still fit the 100-character
/// personal team name `"{first} {last}'s Team"`.
const MAX_PERSON_NAME: usize = 46;

fn within_person_name_limit(name: &str) -> Result<(), ValidationError> {
    if name.trim().chars().count() > MAX_PERSON_NAME {
        return Err(ValidationError::new("length").with_message(Cow::Owned(format!(
            "Name must be at most {} characters",
            MAX_PERSON_NAME
        ))));
    }
    Ok(())
}

/// `redirect=checkout` with a price: the visitor came from the pricing page.
pub fn checkout_price(redirect: Option<&str>, price_id: Option<&str>) -> Option<String> {
    match (redirect, price_id) {
        (Some("checkout"), Some(price)) if !price.is_empty() => Some(price.to_string()),
        _ => None,
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePasswordForm {
    #[serde(default)]
    #[validate(length(min = 8, max = 100, message = "Password must be between 8 and 100 characters"))]
    pub current_password: String,
    #[serde(default)]
    #[validate(length(min = 8, max = 100, message = "Password must be between 8 and 100 characters"))]
    pub new_password: String,
    #[serde(default)]
    #[validate(
        length(min = 8, max = 100, message = "Password must be between 8 and 100 characters"),
        must_match(other = "new_password", message = "Passwords don't match")
    )]
    pub confirm_password: String,
}

impl ActionSchema for UpdatePasswordForm {
    const FIELDS: &'static [&'static str] = &["current_password", "new_password", "confirm_password"];
}

#[derive(Debug, Deserialize, Validate)]
pub struct DeleteAccountForm {
    #[serde(default)]
    #[validate(length(min = 8, max = 100, message = "Password must be between 8 and 100 characters"))]
    pub password: String,
}

impl ActionSchema for DeleteAccountForm {
    const FIELDS: &'static [&'static str] = &["password"];
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateAccountForm {
    #[serde(default)]
    #[validate(
        length(min = 1, message = "Name is required"),
        custom(function = "within_name_limit")
    )]
    pub name: String,
    #[serde(default)]
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
}

impl ActionSchema for UpdateAccountForm {
    const FIELDS: &'static [&'static str] = &["name", "email"];
    const ECHO: &'static [&'static str] = &["name", "email"];
}

fn within_name_limit(name: &str) -> Result<(), ValidationError> {
    if name.chars().count() > 100 {
        return Err(ValidationError::new("length")
            .with_message(Cow::Borrowed("Name must be at most 100 characters")));
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RemoveMemberForm {
    pub member_id: i32,
}

impl ActionSchema for RemoveMemberForm {
    const FIELDS: &'static [&'static str] = &["member_id"];
}

#[derive(Debug, Deserialize, Validate)]
pub struct InviteMemberForm {
    #[serde(default)]
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[serde(default)]
    #[validate(custom(function = "known_role"))]
    pub role: String,
}

impl ActionSchema for InviteMemberForm {
    const FIELDS: &'static [&'static str] = &["email", "role"];
}

impl InviteMemberForm {
    pub fn team_role(&self) -> TeamRole {
        TeamRole::parse(&self.role).unwrap_or_default()
    }
}

fn known_role(role: &str) -> Result<(), ValidationError> {
    if TeamRole::parse(role).is_some() {
        return Ok(());
    }
    Err(ValidationError::new("enum").with_message(Cow::Owned(format!(
        "Invalid enum value. Expected 'member' | 'owner', received '{}'",
        role
    ))))
}

/// Body of the organization-scoped checkout action.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutForm {
    #[serde(default)]
    pub price_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::validator::parse_form;

    #[test]
    fn test_sign_in_messages() {
        let state = parse_form::<SignInForm>(b"email=not-an-email&password=password123").unwrap_err();
        assert_eq!(state.error.as_deref(), Some("Invalid email"));

        let state = parse_form::<SignInForm>(b"email=a%40x.com&password=short").unwrap_err();
        assert_eq!(state.error.as_deref(), Some("Password must be between 8 and 100 characters"));
    }

    #[test]
    fn test_sign_in_checkout_fields() {
        let form = parse_form::<SignInForm>(
            b"email=a%40x.com&password=password123&redirect=checkout&priceId=price_1",
        )
        .unwrap();
        assert_eq!(
            checkout_price(form.redirect.as_deref(), form.price_id.as_deref()),
            Some("price_1".to_string())
        );
        assert_eq!(checkout_price(None, Some("price_1")), None);
        assert_eq!(checkout_price(Some("checkout"), Some("")), None);
    }

    #[test]
    fn test_sign_up_invitation_id() {
        let form = parse_form::<SignUpForm>(
            b"email=a%40x.com&password=password123&firstName=A&lastName=B&inviteId=7",
        )
        .unwrap();
        assert_eq!(form.invitation(), Ok(Some(7)));

        let form = parse_form::<SignUpForm>(
            b"email=a%40x.com&password=password123&firstName=A&lastName=B&inviteId=x",
        )
        .unwrap();
        assert!(form.invitation().is_err());
    }

    #[test]
    fn test_sign_up_requires_names() {
        let state = parse_form::<SignUpForm>(b"email=a%40x.com&password=password123&firstName=A").unwrap_err();
        assert_eq!(state.error.as_deref(), Some("Last name is required"));
    }

    #[test]
    fn test_sign_up_names_fit_the_team_name() {
        let body = format!(
            "email=a%40x.com&password=password123&firstName={}&lastName={}",
            "a".repeat(47),
            "b".repeat(10)
        );
        let state = parse_form::<SignUpForm>(body.as_bytes()).unwrap_err();
        assert_eq!(state.error.as_deref(), Some("Name must be at most 46 characters"));

        let body = format!(
            "email=a%40x.com&password=password123&firstName={}&lastName={}",
            "a".repeat(46),
            "b".repeat(46)
        );
        let form = parse_form::<SignUpForm>(body.as_bytes()).unwrap();
        let team = saas_core::domain::NewTeam::personal(&format!("{} {}", form.first_name, form.last_name), 1);
        assert!(team.is_ok());
    }

    #[test]
    fn test_password_confirmation_mismatch() {
        let state = parse_form::<UpdatePasswordForm>(
            b"currentPassword=password123&newPassword=password456&confirmPassword=password789",
        )
        .unwrap_err();
        assert_eq!(state.error.as_deref(), Some("Passwords don't match"));
    }

    #[test]
    fn test_update_account_messages() {
        let state = parse_form::<UpdateAccountForm>(b"name=&email=a%40x.com").unwrap_err();
        assert_eq!(state.error.as_deref(), Some("Name is required"));

        let state = parse_form::<UpdateAccountForm>(b"name=A&email=nope").unwrap_err();
        assert_eq!(state.error.as_deref(), Some("Invalid email address"));
    }

    #[test]
    fn test_invite_role_must_be_known() {
        let state = parse_form::<InviteMemberForm>(b"email=b%40x.com&role=admin").unwrap_err();
        assert_eq!(
            state.error.as_deref(),
            Some("Invalid enum value. Expected 'member' | 'owner', received 'admin'")
        );

        let form = parse_form::<InviteMemberForm>(b"email=b%40x.com&role=owner").unwrap();
        assert_eq!(form.team_role(), TeamRole::Owner);
    }

    #[test]
    fn test_member_id_must_be_numeric() {
        assert_eq!(parse_form::<RemoveMemberForm>(b"memberId=12").unwrap().member_id, 12);
        assert!(parse_form::<RemoveMemberForm>(b"memberId=abc").is_err());
    }
}
