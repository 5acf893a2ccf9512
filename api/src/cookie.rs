use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

pub const SESSION_COOKIE: &str = "session-id";

/// Adds the HTTP-only session cookie. Production cookies must cross sites,
/// so they are `SameSite=None` and therefore `Secure`.
pub fn create_cookie(jar: CookieJar, session_id: &str, production: bool) -> CookieJar {
    let cookie = Cookie::build((SESSION_COOKIE, session_id.to_owned()))
        .path("/")
        .http_only(true)
        .same_site(if production { SameSite::None } else { SameSite::Lax })
        .secure(production);

    jar.add(cookie)
}

pub fn destroy_cookie(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(SESSION_COOKIE).path("/"))
}

pub fn session_id(jar: &CookieJar) -> Option<String> {
    jar.get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_owned())
        .filter(|id| !id.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_development_cookie_is_lax() {
        let jar = create_cookie(CookieJar::new(), "abc", false);
        let cookie = jar.get(SESSION_COOKIE).unwrap();

        assert_eq!(cookie.value(), "abc");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_ne!(cookie.secure(), Some(true));
        assert_eq!(cookie.path(), Some("/"));
    }

    #[test]
    fn test_production_cookie_is_cross_site() {
        let jar = create_cookie(CookieJar::new(), "abc", true);
        let cookie = jar.get(SESSION_COOKIE).unwrap();

        assert_eq!(cookie.same_site(), Some(SameSite::None));
        assert_eq!(cookie.secure(), Some(true));
    }

    #[test]
    fn test_session_id_reads_cookie() {
        let jar = CookieJar::new().add(Cookie::new(SESSION_COOKIE, "xyz"));
        assert_eq!(session_id(&jar).as_deref(), Some("xyz"));
        assert_eq!(session_id(&CookieJar::new()), None);
    }

    #[test]
    fn test_destroy_removes_cookie() {
        let jar = create_cookie(CookieJar::new(), "abc", false);
        let jar = destroy_cookie(jar);

        assert!(jar.get(SESSION_COOKIE).is_none());
    }
}
