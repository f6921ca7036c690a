//! UI serving routes
//!
//! The dashboard page is a shell: `app.js` fetches `/api/dashboard` and
//! draws the charts client side.

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;

use crate::AppState;

const DASHBOARD_HTML: &str = include_str!("../ui/dashboard.html");
const LOGIN_HTML: &str = include_str!("../ui/login.html");
const APP_JS: &str = include_str!("../ui/app.js");

/// Escape text for an HTML body or attribute
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// Login page, optionally with a notice above the button
pub fn login_page(message: Option<&str>) -> Html<String> {
    let notice = match message {
        Some(message) => format!(r#"<p class="notice">{}</p>"#, escape_html(message)),
        None => String::new(),
    };
    Html(LOGIN_HTML.replace("{{MESSAGE}}", &notice))
}

/// GET /
///
/// Dashboard for a logged-in browser, login page otherwise.
pub async fn serve_index(State(state): State<AppState>, jar: CookieJar) -> Html<String> {
    match state.sessions.lookup(&jar).await {
        Some(session) => {
            let avatar = session.user.avatar_url().unwrap_or("").to_string();
            Html(
                DASHBOARD_HTML
                    .replace("{{DISPLAY_NAME}}", &escape_html(session.user.label()))
                    .replace("{{AVATAR_URL}}", &escape_html(&avatar))
                    .replace("{{VERSION}}", env!("CARGO_PKG_VERSION")),
            )
        }
        None => login_page(None),
    }
}

/// GET /static/app.js
pub async fn serve_app_js() -> Response {
    (
        StatusCode::OK,
        [("content-type", "application/javascript")],
        APP_JS,
    )
        .into_response()
}
