use secrecy::SecretString;

/// Login credentials for the bank portal.
///
/// Passed through opaquely; the core performs no validation. A missing
/// field is typed into the login form as an empty string. The password
/// stays wrapped until the moment it is typed.
#[derive(Debug, Default)]
pub struct Credentials {
    pub user_code: Option<String>,
    pub password: Option<SecretString>,
}

impl Credentials {
    pub fn new(user_code: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user_code: Some(user_code.into()),
            password: Some(SecretString::from(password.into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_redacts_the_password() {
        let credentials = Credentials::new("user", "hunter2");
        let rendered = format!("{credentials:?}");
        assert!(!rendered.contains("hunter2"));
    }
}
