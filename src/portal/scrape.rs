//! Credential extractors for the partner portal pages.  One narrow function
//! per known page shape, so a markup change shows up as a unit-test failure
//! against the saved fixtures rather than a runtime surprise.

use regex::Regex;

/// The hidden `authenticity_token` field on the sign-in form.  First match
/// wins.
pub fn csrf_token(html: &str) -> Option<String> {
    let re = Regex::new(r#"name="authenticity_token"[^>]*value="([^"]+)""#).unwrap();
    re.captures(html).map(|caps| caps[1].to_string())
}

/// The text of the `alert-danger` banner the portal renders on a rejected
/// login.  `None` means the login was accepted.
pub fn login_failure(html: &str) -> Option<String> {
    let re = Regex::new(r#"<div[^>]*class="[^"]*alert-danger[^"]*"[^>]*>\s*([^<]*)"#).unwrap();
    re.captures(html).map(|caps| caps[1].trim().to_string())
}

/// The `(delegate_token, partner)` pair embedded in the `AppCtrl`
/// controller-initialization attribute on the authenticated landing page.
/// The attribute holds an entity-escaped JSON fragment; the inner patterns
/// mirror what the server emits today.
pub fn app_credentials(html: &str) -> Option<(String, String)> {
    let re_init = Regex::new(r#"data-ng-controller="AppCtrl"[^>]*\bng-init="([^"]*)""#).unwrap();
    let caps = re_init.captures(html)?;
    let fragment = caps[1].replace("&quot;", "\"").replace("&amp;", "&");

    let re_token = Regex::new(r#""delegateToken":"(.+)","authToken""#).unwrap();
    let re_partner = Regex::new(r#"\{"vendor":\[(.+)\]\}"#).unwrap();
    let delegate_token = re_token.captures(&fragment)?[1].to_string();
    let partner = re_partner.captures(&fragment)?[1].to_string();
    Some((delegate_token, partner))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIGN_IN_PAGE: &str = r#"
    <html><body>
    <form action="/session" method="post">
      <input type="hidden" name="authenticity_token" value="qfsU2b8zJ5XUgkHv==" />
      <input type="email" name="user[email]" />
      <input type="password" name="user[password]" />
    </form>
    </body></html>"#;

    const REJECTED_PAGE: &str = r#"
    <html><body>
    <div class="alert alert-danger">
      Invalid email or password.
    </div>
    <form action="/session" method="post">
      <input type="hidden" name="authenticity_token" value="z9wQ1yLm==" />
    </form>
    </body></html>"#;

    const LANDING_PAGE: &str = r#"
    <html><body>
    <div data-ng-controller="AppCtrl" ng-init="init({&quot;delegateToken&quot;:&quot;dt-5f3a9&quot;,&quot;authToken&quot;:&quot;at-771&quot;,&quot;partners&quot;:{&quot;vendor&quot;:[2800]}})">
    </div>
    </body></html>"#;

    #[test]
    fn csrf_token_from_sign_in_page() {
        assert_eq!(
            csrf_token(SIGN_IN_PAGE),
            Some("qfsU2b8zJ5XUgkHv==".to_string())
        );
    }

    #[test]
    fn csrf_token_missing() {
        assert_eq!(csrf_token("<html><body>nothing here</body></html>"), None);
    }

    #[test]
    fn csrf_token_first_match_wins() {
        let page = SIGN_IN_PAGE.to_owned()
            + r#"<input type="hidden" name="authenticity_token" value="second" />"#;
        assert_eq!(csrf_token(&page), Some("qfsU2b8zJ5XUgkHv==".to_string()));
    }

    #[test]
    fn failure_banner_detected() {
        assert_eq!(
            login_failure(REJECTED_PAGE),
            Some("Invalid email or password.".to_string())
        );
    }

    #[test]
    fn no_failure_banner_on_clean_page() {
        assert_eq!(login_failure(SIGN_IN_PAGE), None);
    }

    #[test]
    fn credentials_from_landing_page() {
        let (token, partner) = app_credentials(LANDING_PAGE).unwrap();
        assert_eq!(token, "dt-5f3a9");
        assert_eq!(partner, "2800");
    }

    #[test]
    fn credentials_missing_fragment() {
        assert_eq!(app_credentials("<html><body></body></html>"), None);
    }

    #[test]
    fn credentials_missing_token_in_fragment() {
        let page = r#"<div data-ng-controller="AppCtrl" ng-init="init({&quot;partners&quot;:{&quot;vendor&quot;:[2800]}})"></div>"#;
        assert_eq!(app_credentials(page), None);
    }
}
