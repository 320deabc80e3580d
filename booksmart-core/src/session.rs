//! Session controller.
//!
//! [`Session`] owns the session cache and the request executor for one
//! running client, and at most one refresh loop. It establishes a session on
//! sign-in, keeps it alive through the refresh loop, and tears everything
//! down on sign-out.

use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use tracing::{debug, info};

use crate::browser::{Browser, DEFAULT_PAGE_LIMIT};
use crate::cache::{Secret, SessionCache, keys};
use crate::error::ClientError;
use crate::model::{Book, Reservation, Role, SignInRequest, SignUpRequest};
use crate::refresh::{
    DEFAULT_MAX_AUTH_REJECTIONS, RefreshLoop, RefreshLoopHandle, RefreshPolicy, SessionStatus,
};
use crate::request::{DEFAULT_TIMEOUT, RequestExecutor, RequestSpec, ResponseEnvelope};
use crate::requests;
use crate::token::{HttpTokenRefresher, TokenPair, TokenRefresher};

/// Runtime settings for a [`Session`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    /// Base URL of the library service.
    pub base_url: String,

    /// Access token lifetime; the refresh interval.
    pub access_token_ttl: Duration,

    /// Refresh token lifetime.
    pub refresh_token_ttl: Duration,

    /// Timeout applied to every request.
    pub request_timeout: Duration,

    /// Catalog page size.
    pub page_limit: u32,

    /// Consecutive refresh rejections before the session is expired.
    pub max_auth_rejections: u32,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            access_token_ttl: Duration::from_secs(5 * 60),
            refresh_token_ttl: Duration::from_secs(12 * 60 * 60),
            request_timeout: DEFAULT_TIMEOUT,
            page_limit: DEFAULT_PAGE_LIMIT,
            max_auth_rejections: DEFAULT_MAX_AUTH_REJECTIONS,
        }
    }
}

impl SessionSettings {
    /// Reject settings that would stall the refresh loop or paging.
    pub fn validate(&self) -> Result<(), ClientError> {
        if self.access_token_ttl.is_zero() {
            return Err(ClientError::InvalidSettings(
                "access token TTL must be greater than 0".to_string(),
            ));
        }
        if self.request_timeout.is_zero() {
            return Err(ClientError::InvalidSettings(
                "request timeout must be greater than 0".to_string(),
            ));
        }
        if self.page_limit == 0 {
            return Err(ClientError::InvalidSettings(
                "page limit must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn refresh_policy(&self) -> RefreshPolicy {
        RefreshPolicy::new(self.access_token_ttl, self.refresh_token_ttl)
            .with_max_auth_rejections(self.max_auth_rejections)
    }
}

struct SignedIn {
    role: Role,
    refresh: RefreshLoopHandle,
}

/// One client session: cache, executor, and the refresh loop while signed in.
pub struct Session {
    cache: Arc<SessionCache>,
    executor: RequestExecutor,
    settings: SessionSettings,
    refresher: Arc<dyn TokenRefresher>,
    signed_in: Option<SignedIn>,
}

impl Session {
    /// Create a signed-out session against `settings.base_url`.
    pub fn new(settings: SessionSettings) -> Result<Self, ClientError> {
        settings.validate()?;
        let executor = RequestExecutor::new(&settings.base_url)?;
        let refresher = Arc::new(HttpTokenRefresher::new(
            executor.clone(),
            settings.request_timeout,
        ));
        Ok(Self {
            cache: Arc::new(SessionCache::new()),
            executor,
            settings,
            refresher,
            signed_in: None,
        })
    }

    /// Replace the token refresher used by future sign-ins.
    pub fn with_refresher(mut self, refresher: Arc<dyn TokenRefresher>) -> Self {
        self.refresher = refresher;
        self
    }

    pub fn cache(&self) -> &Arc<SessionCache> {
        &self.cache
    }

    pub fn executor(&self) -> &RequestExecutor {
        &self.executor
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    /// Role of the signed-in user, if any.
    pub fn role(&self) -> Option<Role> {
        self.signed_in.as_ref().map(|s| s.role)
    }

    pub fn is_signed_in(&self) -> bool {
        self.signed_in.is_some()
    }

    /// Refresh loop state, if signed in.
    pub fn status(&self) -> Option<SessionStatus> {
        self.signed_in.as_ref().map(|s| s.refresh.status())
    }

    /// Register a new reader account. Does not sign in.
    pub async fn sign_up(&self, request: &SignUpRequest) -> Result<(), ClientError> {
        let spec = requests::sign_up(request)?;
        self.send(spec).await?.expect_status(StatusCode::CREATED)?;
        info!(phone = %request.phone_number, "reader registered");
        Ok(())
    }

    /// Sign in and start the refresh loop.
    ///
    /// Fails with [`ClientError::AlreadySignedIn`] while a live session
    /// exists. An expired session is torn down and replaced.
    pub async fn sign_in(&mut self, request: &SignInRequest, role: Role) -> Result<(), ClientError> {
        if let Some(current) = &self.signed_in {
            if current.refresh.status() != SessionStatus::Expired {
                return Err(ClientError::AlreadySignedIn);
            }
            debug!("replacing expired session");
            self.sign_out().await;
        }

        let spec = requests::sign_in(request, role)?;
        let response = self.send(spec).await?;
        let tokens: TokenPair = response.expect_status(StatusCode::OK)?.json()?;

        // Nothing from an anonymous or earlier session may carry over.
        self.cache.clear();
        self.cache.store(&keys::TOKENS, tokens);

        let refresh = RefreshLoop::start(
            self.cache.clone(),
            self.refresher.clone(),
            self.settings.refresh_policy(),
        );
        self.signed_in = Some(SignedIn { role, refresh });

        info!(%role, "signed in");
        Ok(())
    }

    /// Stop the refresh loop, then clear the cache.
    ///
    /// The loop is joined before the cache is cleared, so a refresh that was
    /// in flight cannot write the tokens back afterwards.
    pub async fn sign_out(&mut self) {
        if let Some(session) = self.signed_in.take() {
            session.refresh.stop().await;
            info!(role = %session.role, "signed out");
        }
        self.cache.clear();
    }

    /// Current access token, read fresh from the cache.
    pub fn access_token(&self) -> Result<Secret, ClientError> {
        let session = self.signed_in.as_ref().ok_or(ClientError::NotSignedIn)?;
        if session.refresh.is_expired() {
            return Err(ClientError::SessionExpired);
        }
        let tokens = self
            .cache
            .load(&keys::TOKENS)
            .map_err(|_| ClientError::SessionExpired)?;
        Ok(tokens.access_token)
    }

    /// Send `spec` with the configured timeout.
    pub async fn send(&self, spec: RequestSpec) -> Result<ResponseEnvelope, ClientError> {
        let spec = spec.timeout(self.settings.request_timeout);
        Ok(self.executor.execute(&spec).await?)
    }

    /// Send `spec` with the current bearer token.
    ///
    /// A 401 becomes [`ClientError::Unauthenticated`]; any other status is
    /// returned for the caller to check.
    pub async fn send_authenticated(
        &self,
        spec: RequestSpec,
    ) -> Result<ResponseEnvelope, ClientError> {
        let token = self.access_token()?;
        let response = self.send(spec.bearer(token.expose())).await?;
        if response.status_code == StatusCode::UNAUTHORIZED {
            return Err(ClientError::Unauthenticated);
        }
        Ok(response)
    }

    /// Browser over the public book catalog.
    pub fn catalog(&self) -> Browser<Book> {
        Browser::new(
            self.cache.clone(),
            self.executor.clone(),
            requests::BOOKS_PATH,
            keys::BOOKS_CURSOR,
            keys::BOOKS_INDEX,
        )
        .with_limit(self.settings.page_limit)
        .with_timeout(self.settings.request_timeout)
    }

    /// Browser over the signed-in reader's reservations.
    pub fn reservations(&self) -> Browser<Reservation> {
        Browser::unpaged(
            self.cache.clone(),
            self.executor.clone(),
            requests::RESERVATIONS_PATH,
            keys::RESERVATIONS_INDEX,
        )
        .with_timeout(self.settings.request_timeout)
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("base_url", &self.settings.base_url)
            .field("role", &self.role())
            .field("status", &self.status())
            .finish()
    }
}
