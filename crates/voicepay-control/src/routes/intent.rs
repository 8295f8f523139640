//! `POST /intent/parse-intent` (spec §4.6, §6).

use actix_web::{post, web, HttpResponse};
use serde::{Deserialize, Serialize};
use voicepay_types::ResolvedIntent;

use crate::auth_token::AuthenticatedUser;
use crate::error::ApiError;
use crate::metrics;
use crate::resolver::resolve_intent;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ParseIntentRequest {
    pub text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseIntentResponse {
    pub status: &'static str,
    pub parsed_intent: ResolvedIntent,
}

#[post("/intent/parse-intent")]
pub async fn parse_intent(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    body: web::Json<ParseIntentRequest>,
) -> Result<HttpResponse, ApiError> {
    let parsed = match state.intent_parser.parse(&body.text).await {
        Ok(p) => p,
        Err(e) => {
            metrics::INTENT_REQUESTS.with_label_values(&["parse_error"]).inc();
            return Err(e.into());
        }
    };

    let shard = state.shards.get_or_open(user.0)?;
    let resolved = match resolve_intent(&shard, parsed) {
        Ok(r) => r,
        Err(e) => {
            let label = match &e {
                voicepay_types::VoicePayError::AmbiguousRecipient => "ambiguous_recipient",
                voicepay_types::VoicePayError::RecipientMissing => "recipient_missing",
                _ => "rejected",
            };
            metrics::INTENT_REQUESTS.with_label_values(&[label]).inc();
            return Err(e.into());
        }
    };

    metrics::INTENT_REQUESTS.with_label_values(&["resolved"]).inc();
    Ok(HttpResponse::Ok().json(ParseIntentResponse {
        status: "ok",
        parsed_intent: resolved,
    }))
}
