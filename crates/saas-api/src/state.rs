//! Shared application state

use chrono::Duration;
use std::sync::Arc;

use saas_core::billing_provider::BillingProvider;
use saas_core::repositories::Repositories;
use saas_core::services::{AccountService, AuthService, BillingLinks, BillingService, TeamService};
use saas_infrastructure::WebhookVerifier;
use saas_security::{SessionCookie, SessionManager};
use saas_shared::config::AppConfig;

use crate::middleware::gate::RoutePolicy;
use crate::middleware::locale::LocaleNegotiator;

/// Everything a handler needs, constructed once at startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub sessions: Arc<SessionManager>,
    pub routes: Arc<RoutePolicy>,
    pub locales: Arc<LocaleNegotiator>,
    pub auth: Arc<AuthService>,
    pub account: Arc<AccountService>,
    pub teams: Arc<TeamService>,
    pub billing: Arc<BillingService>,
    pub webhooks: Arc<WebhookVerifier>,
}

impl AppState {
    pub fn new(config: AppConfig, repos: Repositories, provider: Arc<dyn BillingProvider>) -> Self {
        let sessions = Arc::new(SessionManager::new(
            &config.auth.secret,
            Duration::hours(config.auth.session_ttl_hours),
            SessionCookie::new(config.auth.cookie_name.clone(), config.auth.cookie_secure),
        ));
        let links = BillingLinks {
            base_url: config.app.base_url.clone(),
            trial_period_days: config.billing.trial_period_days,
        };

        Self {
            routes: Arc::new(RoutePolicy::from_settings(&config.routes)),
            locales: Arc::new(LocaleNegotiator::from_settings(&config.i18n)),
            auth: Arc::new(AuthService::new(repos.clone(), sessions.clone())),
            account: Arc::new(AccountService::new(repos.clone(), sessions.clone())),
            teams: Arc::new(TeamService::new(repos.clone())),
            billing: Arc::new(BillingService::new(repos, provider, sessions.clone(), links)),
            webhooks: Arc::new(WebhookVerifier::new(
                config.billing.webhook_secret.clone(),
                config.billing.webhook_tolerance_seconds,
            )),
            sessions,
            config: Arc::new(config),
        }
    }
}
