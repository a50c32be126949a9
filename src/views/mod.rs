//! Page routing and rendering.
//!
//! [`Page::for_session`] picks the page from the session's [`Status`]; the
//! action handlers always render the page for the post-action state.

use crate::session::{ChatMessage, Session, Status};
use serde::Serialize;
use tera::{Context, Tera};

const LAYOUT: &str = include_str!("templates/layout.html");
const LOGIN: &str = include_str!("templates/login.html");
const CHAT: &str = include_str!("templates/chat.html");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Login,
    Chat,
}

impl Page {
    pub fn for_status(status: Status) -> Self {
        match status {
            Status::LoggedOut => Page::Login,
            Status::LoggedIn => Page::Chat,
        }
    }

    pub fn for_session(session: &Session) -> Self {
        Self::for_status(session.status())
    }

    fn template(self) -> &'static str {
        match self {
            Page::Login => "login.html",
            Page::Chat => "chat.html",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Success,
    Info,
    Warning,
    Error,
}

/// A one-shot message shown above the page content.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Notice {
    pub level: Level,
    pub text: String,
    /// Rendered as a code block; used for the on-screen OTP fallback.
    pub code: Option<String>,
}

impl Notice {
    fn new(level: Level, text: impl Into<String>) -> Self {
        Self {
            level,
            text: text.into(),
            code: None,
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self::new(Level::Success, text)
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self::new(Level::Info, text)
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self::new(Level::Warning, text)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(Level::Error, text)
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

#[derive(Serialize)]
struct LoginView<'a> {
    notices: &'a [Notice],
    email: &'a str,
    code_pending: bool,
}

#[derive(Serialize)]
struct ChatView<'a> {
    notices: &'a [Notice],
    email: &'a str,
    transcript: &'a [ChatMessage],
}

/// Compiled page templates.
pub struct Views {
    tera: Tera,
}

impl Views {
    pub fn new() -> anyhow::Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_templates(vec![
            ("layout.html", LAYOUT),
            ("login.html", LOGIN),
            ("chat.html", CHAT),
        ])?;
        Ok(Self { tera })
    }

    /// Render the page the session currently routes to.
    pub fn render(&self, session: &Session, notices: &[Notice]) -> anyhow::Result<String> {
        let email = session.claimant_email().unwrap_or("");
        let page = Page::for_session(session);
        let context = match page {
            Page::Login => Context::from_serialize(LoginView {
                notices,
                email,
                code_pending: session.pending_otp().is_some(),
            })?,
            Page::Chat => Context::from_serialize(ChatView {
                notices,
                email,
                transcript: session.transcript(),
            })?,
        };
        Ok(self.tera.render(page.template(), &context)?)
    }

    /// Login page for a visitor whose submitted address was rejected, keeping
    /// what they typed in the input.
    pub fn render_login_with_email(
        &self,
        session: &Session,
        email: &str,
        notices: &[Notice],
    ) -> anyhow::Result<String> {
        let context = Context::from_serialize(LoginView {
            notices,
            email,
            code_pending: session.pending_otp().is_some(),
        })?;
        Ok(self.tera.render(Page::Login.template(), &context)?)
    }
}
