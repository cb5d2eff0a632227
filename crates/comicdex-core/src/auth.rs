use std::sync::Arc;

use crate::domain::User;
use crate::error::{Error, Result};
use crate::interfaces::{TokenManager, UserRepository};

/// Issues bearer tokens on login and resolves them back to users on
/// subsequent requests.
pub struct Auth {
    token_manager: Arc<dyn TokenManager>,
    user_repo: Arc<dyn UserRepository>,
}

impl Auth {
    pub fn new(token_manager: Arc<dyn TokenManager>, user_repo: Arc<dyn UserRepository>) -> Self {
        Self {
            token_manager,
            user_repo,
        }
    }

    /// Verifies `username`/`password` against the stored bcrypt hash and,
    /// on success, mints a bearer token for the session.
    pub async fn login(&self, username: &str, password: &str) -> Result<String> {
        let user = match self.user_repo.by_username(username).await {
            Ok(user) => user,
            Err(Error::NotFound) => {
                log::debug!("[ auth.login ] user '{username}' not found");
                return Err(Error::WrongCredentials);
            }
            Err(err) => {
                log::error!("[ auth.login ] failed to load user '{username}': {err:?}");
                return Err(Error::internal(err));
            }
        };

        if !verify_password(password, &user.pass_hash) {
            return Err(Error::WrongCredentials);
        }

        self.token_manager.token(&user.username).map_err(|err| {
            log::error!("[ auth.login ] failed to mint token for '{username}': {err:?}");
            Error::internal(err)
        })
    }

    /// Verifies a bearer token and resolves it back to the `User` it names.
    pub async fn authenticate(&self, token: &str) -> Result<User> {
        let username = self.token_manager.verify(token).map_err(|_| Error::BadToken)?;

        self.user_repo.by_username(&username).await.map_err(|err| match err {
            Error::NotFound => Error::BadToken,
            other => {
                log::error!("[ auth.authenticate ] failed to load user '{username}': {other:?}");
                Error::internal(other)
            }
        })
    }
}

fn verify_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct FakeUsers(Mutex<Option<User>>);

    #[async_trait]
    impl UserRepository for FakeUsers {
        async fn by_username(&self, username: &str) -> Result<User> {
            match &*self.0.lock().unwrap() {
                Some(user) if user.username == username => Ok(user.clone()),
                _ => Err(Error::NotFound),
            }
        }
    }

    struct FakeTokens;

    impl TokenManager for FakeTokens {
        fn token(&self, username: &str) -> Result<String> {
            Ok(format!("token-for-{username}"))
        }

        fn verify(&self, token: &str) -> Result<String> {
            token
                .strip_prefix("token-for-")
                .map(|s| s.to_string())
                .ok_or(Error::BadToken)
        }
    }

    fn hash(password: &str) -> String {
        bcrypt::hash(password, bcrypt::DEFAULT_COST).unwrap()
    }

    #[tokio::test]
    async fn login_succeeds_with_correct_password() {
        let user = User {
            username: "alice".into(),
            role: 1,
            pass_hash: hash("hunter2"),
        };
        let auth = Auth::new(Arc::new(FakeTokens), Arc::new(FakeUsers(Mutex::new(Some(user)))));

        let token = auth.login("alice", "hunter2").await.unwrap();
        assert_eq!(token, "token-for-alice");
    }

    #[tokio::test]
    async fn login_fails_with_wrong_password() {
        let user = User {
            username: "alice".into(),
            role: 1,
            pass_hash: hash("hunter2"),
        };
        let auth = Auth::new(Arc::new(FakeTokens), Arc::new(FakeUsers(Mutex::new(Some(user)))));

        let err = auth.login("alice", "wrong").await.unwrap_err();
        assert!(matches!(err, Error::WrongCredentials));
    }

    #[tokio::test]
    async fn login_fails_when_user_unknown() {
        let auth = Auth::new(Arc::new(FakeTokens), Arc::new(FakeUsers(Mutex::new(None))));

        let err = auth.login("ghost", "anything").await.unwrap_err();
        assert!(matches!(err, Error::WrongCredentials));
    }

    #[tokio::test]
    async fn authenticate_resolves_token_to_user() {
        let user = User {
            username: "alice".into(),
            role: 1,
            pass_hash: hash("hunter2"),
        };
        let auth = Auth::new(Arc::new(FakeTokens), Arc::new(FakeUsers(Mutex::new(Some(user.clone())))));

        let resolved = auth.authenticate("token-for-alice").await.unwrap();
        assert_eq!(resolved, user);
    }

    #[tokio::test]
    async fn authenticate_rejects_bad_token() {
        let auth = Auth::new(Arc::new(FakeTokens), Arc::new(FakeUsers(Mutex::new(None))));
        let err = auth.authenticate("garbage").await.unwrap_err();
        assert!(matches!(err, Error::BadToken));
    }
}
