/// Authenticated caller of a request.
///
/// Attached to request extensions by the auth middleware; present on every
/// route except `/health`. Carries only what the token proves, the caller's
/// stored role is looked up per request, never cached here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerContext {
    uid: String,
    email: Option<String>,
}

impl CallerContext {
    pub fn new(uid: String, email: Option<String>) -> Self {
        Self { uid, email }
    }

    pub fn uid(&self) -> &str {
        &self.uid
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }
}
