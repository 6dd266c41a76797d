use tracing::info;

use super::PageFetcher;
use crate::config::HiddenFieldRule;
use crate::crawler::datascraper;
use crate::error::{PoetryError, Result};

/// Log the session in through the site's login form.
///
/// The selected hidden fields of the form are echoed back together with the
/// credentials. Any `.error` element in the response fails the login; the
/// session itself stays usable for anonymous fetches.
pub async fn login(
    fetcher: &dyn PageFetcher,
    login_url: &str,
    rule: &HiddenFieldRule,
    username: &str,
    password: &str,
) -> Result<()> {
    let login_page = fetcher.get(login_url).await?;
    let hidden = datascraper::select_hidden_inputs(&login_page, rule)?;
    let form = build_login_form(hidden, login_url, username, password);

    let response = fetcher.post_form(login_url, &form).await?;
    let errors = datascraper::extract_error_messages(&response);
    if !errors.is_empty() {
        return Err(PoetryError::Auth(errors.join("&&")));
    }

    info!(username, "logged in");
    Ok(())
}

pub fn build_login_form(
    hidden: Vec<(String, String)>,
    login_url: &str,
    username: &str,
    password: &str,
) -> Vec<(String, String)> {
    let mut form = hidden;
    form.push(("user[name]".into(), username.into()));
    form.push(("user[password]".into(), password.into()));
    form.push(("referer".into(), login_url.into()));
    form
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::testing::FakeFetcher;

    const LOGIN_URL: &str = "https://allpoetry.com/login";

    const LOGIN_PAGE: &str = r#"<html><body>
        <form action="/search"><input type="hidden" name="q_hint" value="x"></form>
        <form action="/login" method="post">
          <input type="hidden" name="utf8" value="&#x2713;">
          <input type="hidden" name="authenticity_token" value="tok123">
          <input type="hidden" name="remember" value="1">
          <input type="text" name="user[name]">
        </form>
    </body></html>"#;

    #[tokio::test]
    async fn test_login_posts_first_two_hidden_fields() {
        let fetcher = FakeFetcher::new()
            .page(LOGIN_URL, LOGIN_PAGE)
            .post_response("<html><body>Welcome back</body></html>");

        login(&fetcher, LOGIN_URL, &HiddenFieldRule::FirstN(2), "bard", "pw")
            .await
            .unwrap();

        let posted = fetcher.posted.lock().unwrap();
        assert_eq!(posted.len(), 1);
        let (url, form) = &posted[0];
        assert_eq!(url, LOGIN_URL);
        let names: Vec<&str> = form.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(
            names,
            ["q_hint", "utf8", "user[name]", "user[password]", "referer"]
        );
        assert_eq!(form[3].1, "pw");
        assert_eq!(form[4].1, LOGIN_URL);
    }

    #[tokio::test]
    async fn test_login_with_named_fields() {
        let fetcher = FakeFetcher::new()
            .page(LOGIN_URL, LOGIN_PAGE)
            .post_response("<html></html>");
        let rule = HiddenFieldRule::Named(vec!["authenticity_token".into(), "utf8".into()]);

        login(&fetcher, LOGIN_URL, &rule, "bard", "pw").await.unwrap();

        let posted = fetcher.posted.lock().unwrap();
        let form = &posted[0].1;
        assert_eq!(form[0], ("authenticity_token".to_string(), "tok123".to_string()));
        assert_eq!(form[1], ("utf8".to_string(), "\u{2713}".to_string()));
    }

    #[tokio::test]
    async fn test_login_errors_are_joined() {
        let fetcher = FakeFetcher::new().page(LOGIN_URL, LOGIN_PAGE).post_response(
            r#"<div class="error">Invalid password</div><p class="error">Account locked</p>"#,
        );

        let err = login(&fetcher, LOGIN_URL, &HiddenFieldRule::FirstN(2), "bard", "bad")
            .await
            .unwrap_err();

        match err {
            PoetryError::Auth(message) => assert_eq!(message, "Invalid password&&Account locked"),
            other => panic!("expected auth error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_login_page_without_enough_hidden_fields() {
        let fetcher = FakeFetcher::new().page(
            LOGIN_URL,
            r#"<form><input type="hidden" name="utf8" value="1"></form>"#,
        );

        let err = login(&fetcher, LOGIN_URL, &HiddenFieldRule::FirstN(2), "bard", "pw")
            .await
            .unwrap_err();
        assert!(matches!(err, PoetryError::MissingElement(_)));
        assert!(fetcher.posted.lock().unwrap().is_empty());
    }
}
