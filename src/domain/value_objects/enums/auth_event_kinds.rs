use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEventKind {
    SignIn,
    SignOut,
}

impl Display for AuthEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self {
            AuthEventKind::SignIn => "sign_in",
            AuthEventKind::SignOut => "sign_out",
        };
        write!(f, "{}", kind)
    }
}
