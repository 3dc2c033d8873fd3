/// Compares a supplied password against the configured one.
///
/// Nothing is issued on success; the caller only learns accepted or
/// rejected. With no configured password every attempt is rejected.
#[derive(Debug, Clone, Default)]
pub struct LoginCheck {
    password: Option<String>,
}

impl LoginCheck {
    pub fn new(password: Option<String>) -> Self {
        Self {
            password: password.filter(|value| !value.is_empty()),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.password.is_some()
    }

    pub fn accepts(&self, candidate: &str) -> bool {
        self.password.as_deref() == Some(candidate)
    }
}
