//! Signup and login orchestration.
//!
//! Signup walks validate -> duplicate check -> insert -> optional welcome
//! email enqueue. A failed enqueue rolls the freshly inserted account back
//! (soft-delete) so a notification-less registration never silently
//! succeeds. Login returns one generic error for both unknown-login and
//! wrong-password to resist account enumeration.

use serde_json::json;

use crate::domain::User;
use crate::error::DomainError;
use crate::ports::{
    JOB_SEND_WELCOME_EMAIL, Job, JobQueue, PasswordService, TokenPurpose, TokenService,
    UserRepository,
};

/// Input for the signup flow.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub name: String,
    pub login: String,
    pub password: String,
    pub email: Option<String>,
}

/// Access + refresh token pair issued on login.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Register a new account.
///
/// The created user is active and non-admin. When an email address is
/// supplied, a welcome-email job is enqueued; its delivery is never awaited.
pub async fn signup(
    users: &dyn UserRepository,
    passwords: &dyn PasswordService,
    jobs: &dyn JobQueue,
    account: NewAccount,
) -> Result<User, DomainError> {
    if account.name.is_empty() || account.login.is_empty() || account.password.is_empty() {
        return Err(DomainError::Validation(
            "Please provide name, login and password".to_string(),
        ));
    }

    if users.find_by_login(&account.login).await?.is_some() {
        return Err(DomainError::Duplicate(
            "User already exists. Please Log in".to_string(),
        ));
    }

    let password_hash = passwords
        .hash(&account.password)
        .map_err(|e| DomainError::Internal(e.to_string()))?;

    let user = User::new(
        account.name.clone(),
        account.login,
        password_hash,
        account.email.clone(),
    );
    let saved = users.save(user).await?;

    if let Some(email) = account.email {
        let job = Job::new(
            JOB_SEND_WELCOME_EMAIL,
            json!({ "email": email, "name": account.name }),
        );
        if let Err(e) = jobs.enqueue(job).await {
            // Compensate: the account must not outlive its welcome email.
            users.soft_delete(saved.id).await?;
            return Err(DomainError::Internal(format!(
                "Failed to send welcome email. User registration rolled back: {e}"
            )));
        }
    }

    Ok(saved)
}

/// Authenticate a login/password pair and issue a token pair.
pub async fn login(
    users: &dyn UserRepository,
    passwords: &dyn PasswordService,
    tokens: &dyn TokenService,
    login: &str,
    password: &str,
) -> Result<TokenPair, DomainError> {
    if login.is_empty() || password.is_empty() {
        return Err(DomainError::Validation(
            "You have to provide both login and password".to_string(),
        ));
    }

    // Unknown login and wrong password surface identically.
    let user = users
        .find_by_login(login)
        .await?
        .ok_or(DomainError::Unauthorized)?;

    let valid = passwords
        .verify(password, &user.password_hash)
        .map_err(|e| DomainError::Internal(e.to_string()))?;
    if !valid {
        return Err(DomainError::Unauthorized);
    }

    let groups = user.groups();
    let access_token = tokens
        .issue(&user.login, groups.clone(), TokenPurpose::Access)
        .map_err(|e| DomainError::Internal(e.to_string()))?;
    let refresh_token = tokens
        .issue(&user.login, groups, TokenPurpose::Refresh)
        .map_err(|e| DomainError::Internal(e.to_string()))?;

    Ok(TokenPair {
        access_token,
        refresh_token,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RepoError;
    use crate::ports::{AuthError, JobHandler, JobQueueError, QueueStats, TokenClaims};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct FakeUsers {
        rows: Mutex<Vec<User>>,
    }

    impl FakeUsers {
        fn new() -> Self {
            Self {
                rows: Mutex::new(Vec::new()),
            }
        }

        fn active_with_login(&self, login: &str) -> Option<User> {
            self.rows
                .lock()
                .unwrap()
                .iter()
                .find(|u| u.login == login && u.is_active)
                .cloned()
        }
    }

    #[async_trait]
    impl UserRepository for FakeUsers {
        async fn list(&self) -> Result<Vec<User>, RepoError> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .iter()
                .filter(|u| u.is_active)
                .cloned()
                .collect())
        }

        async fn find_by_id(&self, id: i64) -> Result<Option<User>, RepoError> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .iter()
                .find(|u| u.id == id && u.is_active)
                .cloned())
        }

        async fn find_by_login(&self, login: &str) -> Result<Option<User>, RepoError> {
            Ok(self.active_with_login(login))
        }

        async fn save(&self, mut user: User) -> Result<User, RepoError> {
            let mut rows = self.rows.lock().unwrap();
            if user.id == 0 {
                user.id = rows.len() as i64 + 1;
                rows.push(user.clone());
            } else if let Some(existing) = rows.iter_mut().find(|u| u.id == user.id) {
                *existing = user.clone();
            }
            Ok(user)
        }

        async fn soft_delete(&self, id: i64) -> Result<(), RepoError> {
            let mut rows = self.rows.lock().unwrap();
            match rows.iter_mut().find(|u| u.id == id && u.is_active) {
                Some(u) => {
                    u.is_active = false;
                    Ok(())
                }
                None => Err(RepoError::NotFound),
            }
        }
    }

    struct FakePasswords;

    impl PasswordService for FakePasswords {
        fn hash(&self, password: &str) -> Result<String, AuthError> {
            Ok(format!("hashed:{password}"))
        }

        fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
            Ok(hash == format!("hashed:{password}"))
        }
    }

    struct FakeTokens;

    impl TokenService for FakeTokens {
        fn issue(
            &self,
            subject: &str,
            _groups: Vec<String>,
            purpose: TokenPurpose,
        ) -> Result<String, AuthError> {
            let kind = match purpose {
                TokenPurpose::Access => "access",
                TokenPurpose::Refresh => "refresh",
            };
            Ok(format!("{kind}:{subject}"))
        }

        fn validate(&self, token: &str) -> Result<TokenClaims, AuthError> {
            match token.strip_prefix("access:") {
                Some(sub) => Ok(TokenClaims {
                    sub: sub.to_string(),
                    groups: vec!["user".to_string()],
                    exp: 0,
                }),
                None => Err(AuthError::InvalidToken),
            }
        }
    }

    struct RecordingQueue {
        enqueued: Mutex<Vec<Job>>,
        fail: bool,
    }

    impl RecordingQueue {
        fn new(fail: bool) -> Self {
            Self {
                enqueued: Mutex::new(Vec::new()),
                fail,
            }
        }
    }

    #[async_trait]
    impl JobQueue for RecordingQueue {
        async fn enqueue(&self, job: Job) -> Result<(), JobQueueError> {
            if self.fail {
                return Err(JobQueueError::Backend("dispatcher unreachable".into()));
            }
            self.enqueued.lock().unwrap().push(job);
            Ok(())
        }

        async fn start_worker(&self, _handler: JobHandler) -> Result<(), JobQueueError> {
            Ok(())
        }

        async fn stats(&self) -> Result<QueueStats, JobQueueError> {
            Ok(QueueStats::default())
        }
    }

    fn account(login: &str, email: Option<&str>) -> NewAccount {
        NewAccount {
            name: "Ann".to_string(),
            login: login.to_string(),
            password: "pw".to_string(),
            email: email.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn signup_without_email_creates_active_non_admin_and_enqueues_nothing() {
        let users = FakeUsers::new();
        let jobs = RecordingQueue::new(false);

        let user = signup(&users, &FakePasswords, &jobs, account("ann", None))
            .await
            .unwrap();

        assert!(user.is_active);
        assert!(!user.is_admin);
        assert_ne!(user.password_hash, "pw");
        assert!(jobs.enqueued.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn signup_with_email_enqueues_welcome_job() {
        let users = FakeUsers::new();
        let jobs = RecordingQueue::new(false);

        signup(
            &users,
            &FakePasswords,
            &jobs,
            account("ann", Some("ann@example.com")),
        )
        .await
        .unwrap();

        let enqueued = jobs.enqueued.lock().unwrap();
        assert_eq!(enqueued.len(), 1);
        assert_eq!(enqueued[0].job_type, JOB_SEND_WELCOME_EMAIL);
        assert_eq!(enqueued[0].payload["email"], "ann@example.com");
        assert_eq!(enqueued[0].payload["name"], "Ann");
    }

    #[tokio::test]
    async fn signup_duplicate_login_is_a_conflict() {
        let users = FakeUsers::new();
        let jobs = RecordingQueue::new(false);

        signup(&users, &FakePasswords, &jobs, account("ann", None))
            .await
            .unwrap();
        let err = signup(&users, &FakePasswords, &jobs, account("ann", None))
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::Duplicate(_)));
    }

    #[tokio::test]
    async fn signup_missing_fields_rejected() {
        let users = FakeUsers::new();
        let jobs = RecordingQueue::new(false);

        let mut acc = account("ann", None);
        acc.password = String::new();

        let err = signup(&users, &FakePasswords, &jobs, acc)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn signup_enqueue_failure_rolls_the_account_back() {
        let users = FakeUsers::new();
        let jobs = RecordingQueue::new(true);

        let err = signup(
            &users,
            &FakePasswords,
            &jobs,
            account("ann", Some("ann@example.com")),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, DomainError::Internal(_)));
        // Rollback invariant: no active account with that login remains.
        assert!(users.active_with_login("ann").is_none());
    }

    #[tokio::test]
    async fn login_unknown_user_and_wrong_password_fail_identically() {
        let users = FakeUsers::new();
        let jobs = RecordingQueue::new(false);
        signup(&users, &FakePasswords, &jobs, account("ann", None))
            .await
            .unwrap();

        let unknown = login(&users, &FakePasswords, &FakeTokens, "nobody", "pw")
            .await
            .unwrap_err();
        let wrong = login(&users, &FakePasswords, &FakeTokens, "ann", "wrong")
            .await
            .unwrap_err();

        assert_eq!(unknown.to_string(), wrong.to_string());
        assert!(matches!(unknown, DomainError::Unauthorized));
        assert!(matches!(wrong, DomainError::Unauthorized));
    }

    #[tokio::test]
    async fn login_empty_fields_rejected() {
        let users = FakeUsers::new();
        let err = login(&users, &FakePasswords, &FakeTokens, "", "pw")
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn login_success_issues_both_tokens_for_the_subject() {
        let users = FakeUsers::new();
        let jobs = RecordingQueue::new(false);
        signup(&users, &FakePasswords, &jobs, account("ann", None))
            .await
            .unwrap();

        let pair = login(&users, &FakePasswords, &FakeTokens, "ann", "pw")
            .await
            .unwrap();

        assert_eq!(pair.access_token, "access:ann");
        assert_eq!(pair.refresh_token, "refresh:ann");
    }

    #[tokio::test]
    async fn soft_deleted_user_cannot_login() {
        let users = FakeUsers::new();
        let jobs = RecordingQueue::new(false);
        let user = signup(&users, &FakePasswords, &jobs, account("ann", None))
            .await
            .unwrap();
        users.soft_delete(user.id).await.unwrap();

        let err = login(&users, &FakePasswords, &FakeTokens, "ann", "pw")
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Unauthorized));
    }
}
