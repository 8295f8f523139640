use chrono::{DateTime, Utc};

/// Per-shard login nonce state (spec §3 AuthState). Single-use: consumed
/// on successful signature verify.
#[derive(Debug, Clone, Default)]
pub struct AuthState {
    pub nonce: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// The fixed wallet-login message template (spec §6). The nonce is the
/// only variable part.
pub fn signed_message_template(nonce: &str) -> String {
    format!(
        "Welcome to VoicePay!\n\n\
         To securely sign in, please confirm this message.\n\n\
         Security code: {nonce}\n\n\
         This signature will not trigger any blockchain transaction or gas fee."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_embeds_the_nonce() {
        let msg = signed_message_template("abc123");
        assert!(msg.contains("Security code: abc123"));
        assert!(msg.starts_with("Welcome to VoicePay!"));
    }
}
