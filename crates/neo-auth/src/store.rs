//! In-memory authentication and authorization store.

use neo_types::{EventId, Page, UserId};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::{
    error::{AuthError, Result},
    grant::EventPermission,
    password::{hash_password, verify_password},
    role::Role,
    session::{Session, SessionPolicy, TokenKind, TokenPair, TokenValue},
    user::{Credential, NewUser, User, UserChanges},
};

/// Authentication and authorization data store.
#[derive(Debug, Clone, Default)]
pub struct AuthStore {
    /// User accounts.
    pub users: UserStore,
    /// Issued session tokens.
    pub sessions: SessionStore,
    /// Event permission grants.
    pub grants: GrantStore,
}

impl AuthStore {
    /// Create a new empty auth store with default token lifetimes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store whose tokens follow `policy`.
    pub fn with_policy(policy: SessionPolicy) -> Self {
        Self {
            users: UserStore::new(),
            sessions: SessionStore::with_policy(policy),
            grants: GrantStore::new(),
        }
    }

    /// Register an account and open its first session.
    pub fn register(&self, new_user: NewUser) -> Result<(User, TokenPair)> {
        let user = self.users.create(new_user)?;
        let tokens = self.sessions.issue(user.id);
        Ok((user, tokens))
    }

    /// Verify credentials and open a session.
    pub fn login(&self, credential: &Credential, password: &str) -> Result<(User, TokenPair)> {
        let user = self.users.authenticate(credential, password)?;
        if !user.is_active {
            return Err(AuthError::InactiveUser);
        }
        let tokens = self.sessions.issue(user.id);
        Ok((user, tokens))
    }

    /// Resolve an access token to an active user.
    pub fn authenticate(&self, access_token: &str) -> Result<User> {
        let user_id = self.sessions.authenticate(access_token)?;
        let user = self.users.get(user_id).ok_or(AuthError::InvalidToken)?;
        if !user.is_active {
            return Err(AuthError::InactiveUser);
        }
        Ok(user)
    }

    /// Exchange a refresh token for a new pair.
    pub fn refresh(&self, refresh_token: &str) -> Result<(User, TokenPair)> {
        let (user_id, tokens) = self.sessions.refresh(refresh_token)?;
        let user = self.users.get(user_id).ok_or(AuthError::InvalidToken)?;
        if !user.is_active {
            self.sessions.revoke_user(user_id);
            return Err(AuthError::InactiveUser);
        }
        Ok((user, tokens))
    }

    // ==================== Permission Resolution ====================

    /// The role `user` holds on an event owned by `owner`.
    ///
    /// The owner always resolves to [`Role::Owner`]; everyone else gets
    /// the role of their grant, if any.
    pub fn effective_role(&self, user: UserId, event_id: EventId, owner: UserId) -> Option<Role> {
        if user == owner {
            return Some(Role::Owner);
        }
        self.grants.role_of(event_id, user)
    }

    /// Check if a user has at least the required role on an event.
    pub fn check_permission(
        &self,
        user: UserId,
        event_id: EventId,
        owner: UserId,
        required: Role,
    ) -> bool {
        self.effective_role(user, event_id, owner)
            .is_some_and(|role| role.has(required))
    }

    /// Like [`check_permission`](Self::check_permission) but as a `Result`.
    pub fn require(
        &self,
        user: UserId,
        event_id: EventId,
        owner: UserId,
        required: Role,
    ) -> Result<Role> {
        match self.effective_role(user, event_id, owner) {
            Some(role) if role.has(required) => Ok(role),
            _ => Err(AuthError::PermissionDenied),
        }
    }
}

// ==================== Users ====================

/// User account storage.
#[derive(Debug, Clone)]
pub struct UserStore {
    /// Users by ID.
    users: Arc<RwLock<HashMap<UserId, User>>>,
    /// Email to ID index.
    email_index: Arc<RwLock<HashMap<String, UserId>>>,
    /// Username to ID index.
    username_index: Arc<RwLock<HashMap<String, UserId>>>,
    /// Next user ID.
    next_id: Arc<AtomicU64>,
}

impl Default for UserStore {
    fn default() -> Self {
        Self::new()
    }
}

impl UserStore {
    /// Create a new user store.
    pub fn new() -> Self {
        Self {
            users: Arc::new(RwLock::new(HashMap::new())),
            email_index: Arc::new(RwLock::new(HashMap::new())),
            username_index: Arc::new(RwLock::new(HashMap::new())),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Create a new user.
    pub fn create(&self, new_user: NewUser) -> Result<User> {
        User::validate_username(&new_user.username).map_err(AuthError::InvalidInput)?;
        User::validate_password(&new_user.password).map_err(AuthError::InvalidInput)?;

        let email = User::normalize_email(&new_user.email);
        let password_hash = hash_password(&new_user.password)?;

        let mut users = self.users.write();
        let mut email_index = self.email_index.write();
        let mut username_index = self.username_index.write();

        if email_index.contains_key(&email) {
            return Err(AuthError::EmailTaken);
        }
        if username_index.contains_key(&new_user.username) {
            return Err(AuthError::UsernameTaken);
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let user = User::new(id, email.clone(), new_user.username.clone(), password_hash);

        email_index.insert(email, id);
        username_index.insert(new_user.username, id);
        users.insert(id, user.clone());

        tracing::debug!(user_id = id, username = %user.username, "User created");

        Ok(user)
    }

    /// Get a user by ID.
    pub fn get(&self, id: UserId) -> Option<User> {
        self.users.read().get(&id).cloned()
    }

    /// Check whether an account exists.
    pub fn exists(&self, id: UserId) -> bool {
        self.users.read().contains_key(&id)
    }

    /// Get a user by email.
    pub fn get_by_email(&self, email: &str) -> Option<User> {
        let id = self
            .email_index
            .read()
            .get(&User::normalize_email(email))
            .copied()?;
        self.get(id)
    }

    /// Get a user by username.
    pub fn get_by_username(&self, username: &str) -> Option<User> {
        let id = self.username_index.read().get(username).copied()?;
        self.get(id)
    }

    /// Look up a user by credential and check the password.
    pub fn authenticate(&self, credential: &Credential, password: &str) -> Result<User> {
        let user = match credential {
            Credential::Email(email) => self.get_by_email(email),
            Credential::Username(username) => self.get_by_username(username),
        }
        .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &user.password_hash)?;
        Ok(user)
    }

    /// Apply changes to a user's account.
    pub fn update(&self, id: UserId, changes: UserChanges) -> Result<User> {
        if let Some(username) = &changes.username {
            User::validate_username(username).map_err(AuthError::InvalidInput)?;
        }
        let password_hash = match &changes.password {
            Some(password) => {
                User::validate_password(password).map_err(AuthError::InvalidInput)?;
                Some(hash_password(password)?)
            }
            None => None,
        };
        let email = changes.email.as_deref().map(User::normalize_email);

        let mut users = self.users.write();
        let mut email_index = self.email_index.write();
        let mut username_index = self.username_index.write();

        let user = users.get_mut(&id).ok_or(AuthError::UserNotFound(id))?;

        if let Some(email) = &email {
            if email_index.get(email).is_some_and(|owner| *owner != id) {
                return Err(AuthError::EmailTaken);
            }
        }
        if let Some(username) = &changes.username {
            if username_index.get(username).is_some_and(|owner| *owner != id) {
                return Err(AuthError::UsernameTaken);
            }
        }

        if let Some(email) = email {
            email_index.remove(&user.email);
            email_index.insert(email.clone(), id);
            user.email = email;
        }
        if let Some(username) = changes.username {
            username_index.remove(&user.username);
            username_index.insert(username.clone(), id);
            user.username = username;
        }
        if let Some(is_active) = changes.is_active {
            user.is_active = is_active;
        }
        if let Some(hash) = password_hash {
            user.password_hash = hash;
        }
        user.touch();

        tracing::debug!(user_id = id, "User updated");

        Ok(user.clone())
    }

    /// List users ordered by ID.
    pub fn list(&self, page: Page) -> Vec<User> {
        let mut users: Vec<User> = self.users.read().values().cloned().collect();
        users.sort_by_key(|u| u.id);
        page.apply(users).collect()
    }

    /// Count users.
    pub fn count(&self) -> usize {
        self.users.read().len()
    }
}

// ==================== Sessions ====================

/// Session token storage, keyed by token digest.
#[derive(Debug, Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
    next_pair: Arc<AtomicU64>,
    policy: SessionPolicy,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_policy(SessionPolicy::default())
    }
}

impl SessionStore {
    /// Create a session store with default lifetimes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session store with the given lifetimes.
    pub fn with_policy(policy: SessionPolicy) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            next_pair: Arc::new(AtomicU64::new(1)),
            policy,
        }
    }

    /// Issue a new access/refresh pair for a user.
    pub fn issue(&self, user_id: UserId) -> TokenPair {
        let mut sessions = self.sessions.write();
        self.issue_locked(&mut sessions, user_id)
    }

    fn issue_locked(&self, sessions: &mut HashMap<String, Session>, user_id: UserId) -> TokenPair {
        let now = neo_types::now();
        let pair_id = self.next_pair.fetch_add(1, Ordering::SeqCst);

        let access = TokenValue::generate(TokenKind::Access);
        let refresh = TokenValue::generate(TokenKind::Refresh);

        sessions.retain(|_, s| !s.is_expired_at(now));

        let tokens = [
            (&access, self.policy.access_ttl),
            (&refresh, self.policy.refresh_ttl),
        ];
        for (value, ttl) in tokens {
            let session = Session {
                pair_id,
                user_id,
                kind: value.kind,
                token_hash: value.digest(),
                created_at: now,
                expires_at: now + ttl,
            };
            sessions.insert(session.token_hash.clone(), session);
        }

        tracing::debug!(user_id, pair_id, "Session issued");

        TokenPair {
            access_token: access.to_string(),
            refresh_token: refresh.to_string(),
            token_type: "bearer".to_string(),
        }
    }

    /// Look up a live token of the given kind, dropping it if it has expired.
    fn lookup(
        sessions: &mut HashMap<String, Session>,
        token: &str,
        kind: TokenKind,
    ) -> Result<Session> {
        let value = TokenValue::parse(token)?;
        if value.kind != kind {
            return Err(AuthError::InvalidToken);
        }

        let digest = value.digest();
        let session = sessions
            .get(&digest)
            .cloned()
            .ok_or(AuthError::InvalidToken)?;

        if session.is_expired_at(neo_types::now()) {
            sessions.remove(&digest);
            return Err(AuthError::TokenExpired);
        }

        Ok(session)
    }

    /// Verify an access token and return its user.
    pub fn authenticate(&self, access_token: &str) -> Result<UserId> {
        let mut sessions = self.sessions.write();
        Self::lookup(&mut sessions, access_token, TokenKind::Access).map(|s| s.user_id)
    }

    /// Rotate a refresh token: revoke its pair and issue a new one.
    ///
    /// A refresh token is accepted at most once.
    pub fn refresh(&self, refresh_token: &str) -> Result<(UserId, TokenPair)> {
        let mut sessions = self.sessions.write();
        let session = Self::lookup(&mut sessions, refresh_token, TokenKind::Refresh)?;
        sessions.retain(|_, s| s.pair_id != session.pair_id);
        let tokens = self.issue_locked(&mut sessions, session.user_id);
        Ok((session.user_id, tokens))
    }

    /// Revoke the pair an access token belongs to.
    pub fn revoke(&self, access_token: &str) -> Result<UserId> {
        let mut sessions = self.sessions.write();
        let session = Self::lookup(&mut sessions, access_token, TokenKind::Access)?;
        sessions.retain(|_, s| s.pair_id != session.pair_id);
        tracing::debug!(
            user_id = session.user_id,
            pair_id = session.pair_id,
            "Session revoked"
        );
        Ok(session.user_id)
    }

    /// Revoke every session of a user.
    pub fn revoke_user(&self, user_id: UserId) {
        self.sessions.write().retain(|_, s| s.user_id != user_id);
    }

    /// Count stored tokens (access and refresh).
    pub fn count(&self) -> usize {
        self.sessions.read().len()
    }
}

// ==================== Grants ====================

/// Event permission storage.
#[derive(Debug, Clone)]
pub struct GrantStore {
    /// Grants by (event, user) pair.
    grants: Arc<RwLock<HashMap<(EventId, UserId), EventPermission>>>,
    /// Next grant ID.
    next_id: Arc<AtomicU64>,
}

impl Default for GrantStore {
    fn default() -> Self {
        Self::new()
    }
}

impl GrantStore {
    /// Create a new grant store.
    pub fn new() -> Self {
        Self {
            grants: Arc::new(RwLock::new(HashMap::new())),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Grant a role, replacing any existing role of the same user.
    pub fn grant(
        &self,
        event_id: EventId,
        user_id: UserId,
        role: Role,
        granted_by: UserId,
    ) -> EventPermission {
        let mut grants = self.grants.write();
        let grant = grants
            .entry((event_id, user_id))
            .and_modify(|g| g.set_role(role))
            .or_insert_with(|| {
                let id = self.next_id.fetch_add(1, Ordering::SeqCst);
                EventPermission::new(id, event_id, user_id, role, granted_by)
            });

        tracing::debug!(event_id, user_id, role = %role, "Permission granted");

        grant.clone()
    }

    /// Get a user's grant on an event.
    pub fn get(&self, event_id: EventId, user_id: UserId) -> Option<EventPermission> {
        self.grants.read().get(&(event_id, user_id)).cloned()
    }

    /// The role of a user's grant on an event.
    pub fn role_of(&self, event_id: EventId, user_id: UserId) -> Option<Role> {
        self.grants.read().get(&(event_id, user_id)).map(|g| g.role)
    }

    /// List grants on an event, oldest first.
    pub fn list(&self, event_id: EventId) -> Vec<EventPermission> {
        let mut grants: Vec<EventPermission> = self
            .grants
            .read()
            .values()
            .filter(|g| g.event_id == event_id)
            .cloned()
            .collect();
        grants.sort_by_key(|g| g.id);
        grants
    }

    /// Remove a user's grant on an event.
    pub fn revoke(&self, event_id: EventId, user_id: UserId) -> Result<EventPermission> {
        let removed = self
            .grants
            .write()
            .remove(&(event_id, user_id))
            .ok_or(AuthError::PermissionNotFound)?;

        tracing::debug!(event_id, user_id, "Permission revoked");

        Ok(removed)
    }

    /// Events a user holds any grant on.
    pub fn events_for(&self, user_id: UserId) -> Vec<EventId> {
        let mut events: Vec<EventId> = self
            .grants
            .read()
            .keys()
            .filter(|(_, user)| *user == user_id)
            .map(|(event, _)| *event)
            .collect();
        events.sort_unstable();
        events
    }

    /// Drop every grant on a deleted event.
    pub fn remove_event(&self, event_id: EventId) -> usize {
        let mut grants = self.grants.write();
        let before = grants.len();
        grants.retain(|(event, _), _| *event != event_id);
        before - grants.len()
    }

    /// Count grants.
    pub fn count(&self) -> usize {
        self.grants.read().len()
    }
}
