//! Intent Resolver (C6): wraps the opaque NL parser, fills in a recipient
//! address via `resolve_by_name`, validates, and returns the canonical
//! intent (spec §4.6).
//!
//! The parser itself is external per spec §1 ("treated as an opaque
//! function"); it's modeled here as a trait so the control plane can run
//! against a real HTTP-backed parser in production and a deterministic
//! fake in tests — the same swappable-behind-a-trait shape the teacher
//! uses for its chain provider.

use chrono::Utc;
use rust_decimal::Decimal;
use std::future::Future;
use std::pin::Pin;
use std::str::FromStr;
use voicepay_shard::Shard;
use voicepay_types::{IntentKind, ParsedIntent, ResolveOutcome, ResolvedIntent, VoicePayError};

pub trait IntentParser: Send + Sync {
    /// Parse free text into a candidate intent. Errors are `internal` —
    /// the parser itself is opaque and not expected to reject input.
    fn parse<'a>(
        &'a self,
        text: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<ParsedIntent, VoicePayError>> + Send + 'a>>;
}

/// Calls an externally hosted NL-to-intent service over HTTP. The service
/// contract mirrors `ParsedIntent`'s JSON shape exactly.
pub struct ExternalIntentParser {
    client: reqwest::Client,
    url: String,
}

impl ExternalIntentParser {
    pub fn new(url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .expect("failed to build intent parser HTTP client");
        Self { client, url }
    }
}

impl IntentParser for ExternalIntentParser {
    fn parse<'a>(
        &'a self,
        text: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<ParsedIntent, VoicePayError>> + Send + 'a>> {
        Box::pin(async move {
            let response = self
                .client
                .post(&self.url)
                .json(&serde_json::json!({ "text": text }))
                .send()
                .await
                .map_err(|e| VoicePayError::Timeout(e.to_string()))?;

            if !response.status().is_success() {
                return Err(VoicePayError::Internal(format!(
                    "intent parser returned status {}",
                    response.status()
                )));
            }

            response
                .json::<ParsedIntent>()
                .await
                .map_err(|e| VoicePayError::Internal(format!("malformed parser response: {e}")))
        })
    }
}

/// Deterministic stand-in for the NL parser, used in tests and local runs
/// without a configured `INTENT_PARSER_URL`. Understands only the fixed
/// phrasing the testable scenarios use: `"send <amount> usdc to <name>"`
/// and `"send <amount> usdc to <name> every <interval> for <times> times"`.
pub struct FakeIntentParser;

impl IntentParser for FakeIntentParser {
    fn parse<'a>(
        &'a self,
        text: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<ParsedIntent, VoicePayError>> + Send + 'a>> {
        let text = text.to_string();
        Box::pin(async move { parse_fixed_phrasing(&text) })
    }
}

fn parse_fixed_phrasing(text: &str) -> Result<ParsedIntent, VoicePayError> {
    let words: Vec<&str> = text.split_whitespace().collect();
    let to_idx = words
        .iter()
        .position(|w| w.eq_ignore_ascii_case("to"))
        .ok_or_else(|| VoicePayError::Validation("could not find recipient in text".to_string()))?;

    let amount_idx = words
        .iter()
        .position(|w| Decimal::from_str(w).is_ok())
        .ok_or_else(|| VoicePayError::Validation("could not find an amount in text".to_string()))?;
    let amount = Decimal::from_str(words[amount_idx]).unwrap();

    let name = words
        .get(to_idx + 1)
        .map(|s| s.trim_end_matches(['.', ',']).to_string())
        .ok_or_else(|| VoicePayError::Validation("recipient name missing after 'to'".to_string()))?;

    let every_idx = words.iter().position(|w| w.eq_ignore_ascii_case("every"));
    let interval = every_idx
        .and_then(|i| words.get(i + 1))
        .and_then(|w| match w.to_lowercase().trim_end_matches('s') {
            "day" => Some(voicepay_types::Interval::Daily),
            "week" => Some(voicepay_types::Interval::Weekly),
            "month" => Some(voicepay_types::Interval::Monthly),
            "year" => Some(voicepay_types::Interval::Yearly),
            _ => None,
        });

    let times = words
        .iter()
        .position(|w| w.eq_ignore_ascii_case("times"))
        .and_then(|i| i.checked_sub(1))
        .and_then(|i| words.get(i))
        .and_then(|w| w.parse::<u32>().ok());

    Ok(ParsedIntent {
        intent: if interval.is_some() {
            IntentKind::RecurringPayment
        } else {
            IntentKind::SendOnce
        },
        name: Some(name),
        address: None,
        amount,
        currency: "USDC".to_string(),
        interval,
        start_date: None,
        time_of_day: None,
        times,
        note: None,
    })
}

/// Resolve a [`ParsedIntent`] into a [`ResolvedIntent`] (spec §4.6 steps 1-4).
pub fn resolve_intent(shard: &Shard, parsed: ParsedIntent) -> Result<ResolvedIntent, VoicePayError> {
    let address = match parsed.address {
        Some(addr) => addr,
        None => {
            let name = parsed
                .name
                .as_deref()
                .ok_or(VoicePayError::RecipientMissing)?;
            match shard.resolve_by_name(name).map_err(VoicePayError::from)? {
                ResolveOutcome::Match { recipient, .. } => recipient.wallet,
                ResolveOutcome::Ambiguous(_) => return Err(VoicePayError::AmbiguousRecipient),
                ResolveOutcome::NotFound => return Err(VoicePayError::RecipientMissing),
            }
        }
    };

    if parsed.amount <= Decimal::ZERO {
        return Err(VoicePayError::Validation("amount must be positive".to_string()));
    }

    let start_date = parsed.start_date.unwrap_or_else(|| Utc::now().date_naive());

    Ok(ResolvedIntent {
        intent: parsed.intent,
        address,
        amount: parsed.amount,
        currency: parsed.currency,
        interval: parsed.interval,
        start_date,
        time_of_day: parsed.time_of_day,
        times: parsed.times,
        note: parsed.note,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use voicepay_types::Recipient;

    #[tokio::test]
    async fn fake_parser_extracts_amount_and_recipient() {
        let parsed = FakeIntentParser.parse("Send 10 USDC to Sam").await.unwrap();
        assert_eq!(parsed.amount, Decimal::from(10));
        assert_eq!(parsed.name.as_deref(), Some("Sam"));
        assert_eq!(parsed.intent, IntentKind::SendOnce);
    }

    #[tokio::test]
    async fn fake_parser_recognizes_recurrence() {
        let parsed = FakeIntentParser
            .parse("Send 5 USDC to Alice every month for 12 times")
            .await
            .unwrap();
        assert_eq!(parsed.intent, IntentKind::RecurringPayment);
        assert_eq!(parsed.interval, Some(voicepay_types::Interval::Monthly));
        assert_eq!(parsed.times, Some(12));
    }

    /// Scenario 4: two recipients named "Sam" makes resolution ambiguous.
    #[test]
    fn ambiguous_recipient_is_surfaced() {
        let shard = Shard::open_in_memory("0x1111111111111111111111111111111111111111".parse().unwrap()).unwrap();
        shard
            .add_recipient(Recipient {
                name: "Sam".to_string(),
                wallet: "0x2222222222222222222222222222222222222222".parse().unwrap(),
                note: None,
            })
            .unwrap();
        shard
            .add_recipient(Recipient {
                name: "sam".to_string(),
                wallet: "0x3333333333333333333333333333333333333333".parse().unwrap(),
                note: None,
            })
            .unwrap();

        let parsed = ParsedIntent {
            intent: IntentKind::SendOnce,
            name: Some("Sam".to_string()),
            address: None,
            amount: Decimal::from(10),
            currency: "USDC".to_string(),
            interval: None,
            start_date: None,
            time_of_day: None,
            times: None,
            note: None,
        };

        let err = resolve_intent(&shard, parsed).unwrap_err();
        assert!(matches!(err, VoicePayError::AmbiguousRecipient));
    }

    #[test]
    fn recipient_not_found_is_surfaced() {
        let shard = Shard::open_in_memory("0x1111111111111111111111111111111111111111".parse().unwrap()).unwrap();
        let parsed = ParsedIntent {
            intent: IntentKind::SendOnce,
            name: Some("ghost".to_string()),
            address: None,
            amount: Decimal::from(10),
            currency: "USDC".to_string(),
            interval: None,
            start_date: None,
            time_of_day: None,
            times: None,
            note: None,
        };
        let err = resolve_intent(&shard, parsed).unwrap_err();
        assert!(matches!(err, VoicePayError::RecipientMissing));
    }
}
