//! Login, signup and profile calls. Successful logins update the shared session.

use log::info;

use crate::client::{ApiClient, ClientError};
use crate::models::energy::{LoginRequest, LoginResponse, SignupRequest, User};

impl ApiClient {
    pub fn login(&self, email: &str, password: &str) -> Result<User, ClientError> {
        let resp: LoginResponse = self.post_json("/auth/login", &LoginRequest { email, password })?;
        let user = resp.user.clone();
        self.session().borrow_mut().establish(resp.access_token, resp.user);
        Ok(user)
    }

    /// Registers the account. Does not log in.
    pub fn signup(&self, name: &str, email: &str, password: &str) -> Result<(), ClientError> {
        self.post_unit("/auth/signup", &SignupRequest { name, email, password })?;
        info!("Auth: signed up {}", email);
        Ok(())
    }

    pub fn fetch_profile(&self) -> Result<User, ClientError> {
        let user: User = self.get_json("/auth/me", &[])?;
        self.session().borrow_mut().set_user(user.clone());
        Ok(user)
    }

    pub fn logout(&self) {
        self.session().borrow_mut().logout();
    }
}

#[cfg(test)]
mod tests {
    use crate::client::testing::client;
    use crate::models::energy::UserId;
    use http::{Method, StatusCode};
    use serde_json::json;

    #[test]
    fn login_stores_token_and_user_then_authorizes_next_call() {
        let (client, mock) = client();
        mock.respond(
            200,
            json!({"accessToken": "jwt-1", "user": {"id": 7, "name": "Ana", "email": "ana@example.com"}}),
        )
        .respond(200, json!([]));

        let user = client.login("ana@example.com", "secret").unwrap();
        client.list_devices().unwrap();

        assert_eq!(user.id, UserId(7));
        {
            let session = client.session().borrow();
            assert!(session.is_authenticated());
            assert_eq!(session.token(), "jwt-1");
            assert_eq!(session.user().map(|u| u.name.as_str()), Some("Ana"));
        }
        let requests = mock.requests();
        assert_eq!(requests[0].method, Method::POST);
        assert_eq!(requests[0].path, "/auth/login");
        assert_eq!(
            requests[0].body,
            Some(json!({"email": "ana@example.com", "password": "secret"}))
        );
        assert_eq!(requests[0].authorization, None);
        assert_eq!(requests[1].authorization.as_deref(), Some("Bearer jwt-1"));
    }

    #[test]
    fn failed_login_leaves_session_untouched() {
        let (client, mock) = client();
        mock.respond(401, json!({"error": "invalid credentials"}));

        let err = client.login("ana@example.com", "wrong").unwrap_err();

        assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));
        assert_eq!(err.api_error(), Some("invalid credentials"));
        assert!(!client.session().borrow().is_authenticated());
    }

    #[test]
    fn signup_does_not_log_in() {
        let (client, mock) = client();
        mock.respond(201, json!({"id": 8, "name": "Rui", "email": "rui@example.com"}));

        client.signup("Rui", "rui@example.com", "pw").unwrap();

        assert!(!client.session().borrow().is_authenticated());
        let req = mock.last();
        assert_eq!(req.path, "/auth/signup");
        assert_eq!(
            req.body,
            Some(json!({"name": "Rui", "email": "rui@example.com", "password": "pw"}))
        );
    }

    #[test]
    fn fetch_profile_replaces_user() {
        let (client, mock) = client();
        client.session().borrow_mut().set_token_for_test("tok");
        mock.respond(200, json!({"id": 3, "name": "Bea", "email": "bea@example.com"}));

        let user = client.fetch_profile().unwrap();

        assert_eq!(user.email, "bea@example.com");
        assert_eq!(client.session().borrow().user(), Some(&user));
        assert_eq!(mock.last().path, "/auth/me");
    }

    #[test]
    fn fetch_profile_without_token_surfaces_unauthorized() {
        let (client, mock) = client();
        mock.respond(401, json!({"error": "unauthorized"}));

        let err = client.fetch_profile().unwrap_err();

        assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));
        assert!(client.session().borrow().user().is_none());
    }

    #[test]
    fn logout_makes_no_request() {
        let (client, mock) = client();
        client.session().borrow_mut().set_token_for_test("tok");

        client.logout();

        assert!(!client.session().borrow().is_authenticated());
        assert!(mock.requests().is_empty());
    }
}
