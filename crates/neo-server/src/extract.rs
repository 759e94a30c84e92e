//! Request extractors: bearer-token authentication, and body, query and path
//! wrappers whose rejections are reported as [`ApiError`].

use axum::{
    extract::{FromRequest, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use neo_auth::User;

use crate::api::{ApiError, AppState};

/// The authenticated, active user making the request.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: User,
    /// The access token the request was authenticated with.
    pub token: String,
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or(ApiError::NotAuthenticated)?;
        let user = state.auth.authenticate(token)?;

        Ok(CurrentUser {
            user,
            token: token.to_string(),
        })
    }
}

/// A JSON request body.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Query string parameters.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// Path parameters.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

/// The token of an `Authorization: Bearer <token>` header.
///
/// The scheme is matched case-insensitively.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?.trim();
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();

    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token(&headers("Bearer abc")), Some("abc"));
        assert_eq!(bearer_token(&headers("bearer  abc ")), Some("abc"));
        assert_eq!(bearer_token(&headers("Basic abc")), None);
        assert_eq!(bearer_token(&headers("Bearer")), None);
        assert_eq!(bearer_token(&headers("Bearer ")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn bearer_scheme_is_case_insensitive(
                scheme in "[bB][eE][aA][rR][eE][rR]",
                token in "[A-Za-z0-9_]{1,64}",
            ) {
                let value = format!("{} {}", scheme, token);
                let map = headers(&value);
                prop_assert_eq!(bearer_token(&map), Some(token.as_str()));
            }

            #[test]
            fn other_schemes_are_rejected(
                scheme in "[A-Za-z]{1,10}",
                token in "[A-Za-z0-9_]{1,64}",
            ) {
                prop_assume!(!scheme.eq_ignore_ascii_case("bearer"));
                let value = format!("{} {}", scheme, token);
                let map = headers(&value);
                prop_assert_eq!(bearer_token(&map), None);
            }
        }
    }
}
