//! Locale negotiation with an "as-needed" path prefix
//!
//! The default locale is served without a prefix; every other locale lives
//! under `/{locale}`. Unprefixed requests pick a locale from the locale
//! cookie, then `Accept-Language`, then the default.

use cookie::{time::Duration, Cookie, SameSite};

use saas_shared::config::I18nSettings;

/// Locale resolved for the current request, stored as a request extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locale(pub String);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocaleAction {
    /// Send the client to another path (including any query string).
    Redirect(String),
    /// Serve the request under this path with the locale prefix removed.
    Rewrite(String),
    /// Serve the request unchanged.
    Continue,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaleDecision {
    pub locale: String,
    /// The locale came from the path prefix and should be remembered.
    pub explicit: bool,
    pub action: LocaleAction,
}

#[derive(Debug, Clone)]
pub struct LocaleNegotiator {
    locales: Vec<String>,
    default_locale: String,
    cookie_name: String,
}

impl LocaleNegotiator {
    pub fn from_settings(settings: &I18nSettings) -> Self {
        Self {
            locales: settings.locales.clone(),
            default_locale: settings.default_locale.clone(),
            cookie_name: settings.cookie_name.clone(),
        }
    }

    pub fn default_locale(&self) -> &str {
        &self.default_locale
    }

    /// `Set-Cookie` value remembering `locale`.
    pub fn cookie(&self, locale: &str) -> String {
        Cookie::build((self.cookie_name.as_str(), locale))
            .path("/")
            .max_age(Duration::days(365))
            .same_site(SameSite::Lax)
            .build()
            .to_string()
    }

    /// Splits `/{locale}/rest` into the configured locale and `/rest`.
    pub fn split_prefix<'a>(&self, path: &'a str) -> Option<(&str, &'a str)> {
        let trimmed = path.strip_prefix('/')?;
        let (segment, rest) = match trimmed.find('/') {
            Some(idx) => (&trimmed[..idx], &trimmed[idx..]),
            None => (trimmed, "/"),
        };
        let locale = self.find(segment)?;
        Some((locale, rest))
    }

    /// The path with any locale prefix removed.
    pub fn strip_prefix<'a>(&self, path: &'a str) -> &'a str {
        self.split_prefix(path).map_or(path, |(_, rest)| rest)
    }

    pub fn decide(
        &self,
        path: &str,
        query: Option<&str>,
        cookie_header: Option<&str>,
        accept_language: Option<&str>,
    ) -> LocaleDecision {
        if let Some((locale, rest)) = self.split_prefix(path) {
            let action = if locale == self.default_locale {
                LocaleAction::Redirect(with_query(rest, query))
            } else {
                LocaleAction::Rewrite(with_query(rest, query))
            };
            return LocaleDecision {
                locale: locale.to_string(),
                explicit: true,
                action,
            };
        }

        let locale = cookie_header
            .and_then(|header| self.cookie_locale(header))
            .or_else(|| accept_language.and_then(|header| self.accept_language_locale(header)))
            .unwrap_or(self.default_locale.as_str())
            .to_string();

        let action = if locale == self.default_locale {
            LocaleAction::Continue
        } else {
            let prefixed = if path == "/" {
                format!("/{}", locale)
            } else {
                format!("/{}{}", locale, path)
            };
            LocaleAction::Redirect(with_query(&prefixed, query))
        };
        LocaleDecision {
            locale,
            explicit: false,
            action,
        }
    }

    fn find(&self, candidate: &str) -> Option<&str> {
        self.locales
            .iter()
            .find(|l| l.eq_ignore_ascii_case(candidate))
            .map(String::as_str)
    }

    fn cookie_locale(&self, header: &str) -> Option<&str> {
        Cookie::split_parse(header)
            .filter_map(Result::ok)
            .find(|cookie| cookie.name() == self.cookie_name)
            .and_then(|cookie| self.find(cookie.value_trimmed()))
    }

    /// Highest-weighted language whose primary subtag is a configured locale.
    fn accept_language_locale(&self, header: &str) -> Option<&str> {
        let mut ranges: Vec<(&str, f32)> = header
            .split(',')
            .filter_map(|part| {
                let mut pieces = part.trim().split(';');
                let tag = pieces.next()?.trim();
                let quality = pieces
                    .find_map(|p| p.trim().strip_prefix("q="))
                    .map_or(Some(1.0), |q| q.trim().parse::<f32>().ok())?;
                (!tag.is_empty() && quality > 0.0).then_some((tag, quality))
            })
            .collect();
        ranges.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        ranges
            .into_iter()
            .filter(|(tag, _)| *tag != "*")
            .find_map(|(tag, _)| {
                let primary = tag.split('-').next().unwrap_or(tag);
                self.find(primary)
            })
    }
}

fn with_query(path: &str, query: Option<&str>) -> String {
    match query {
        Some(q) if !q.is_empty() => format!("{}?{}", path, q),
        _ => path.to_string(),
    }
}
