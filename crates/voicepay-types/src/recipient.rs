use crate::address::UserAddress;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub name: String,
    pub wallet: UserAddress,
    pub note: Option<String>,
}

/// Result of [`crate::recipient`] name resolution (spec §4.1 `resolve_by_name`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveOutcome {
    /// Exactly one recipient matched: either an exact name match, or the
    /// sole substring match when no exact match exists.
    Match { recipient: Recipient, kind: MatchKind },
    /// Two or more recipients tied for the winning match class.
    Ambiguous(Vec<Recipient>),
    NotFound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Exact,
    PartialUnique,
}

/// Resolve `query` against `recipients` per spec §4.1: case-insensitive,
/// exact-name matches take priority over substring matches, and ambiguity
/// is judged within the winning class only.
pub fn resolve_by_name(recipients: &[Recipient], query: &str) -> ResolveOutcome {
    let query_lower = query.to_lowercase();

    let exact: Vec<&Recipient> = recipients
        .iter()
        .filter(|r| r.name.to_lowercase() == query_lower)
        .collect();

    if exact.len() == 1 {
        return ResolveOutcome::Match {
            recipient: exact[0].clone(),
            kind: MatchKind::Exact,
        };
    }
    if exact.len() > 1 {
        return ResolveOutcome::Ambiguous(exact.into_iter().cloned().collect());
    }

    let partial: Vec<&Recipient> = recipients
        .iter()
        .filter(|r| r.name.to_lowercase().contains(&query_lower))
        .collect();

    match partial.len() {
        0 => ResolveOutcome::NotFound,
        1 => ResolveOutcome::Match {
            recipient: partial[0].clone(),
            kind: MatchKind::PartialUnique,
        },
        _ => ResolveOutcome::Ambiguous(partial.into_iter().cloned().collect()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recipient(name: &str, wallet: &str) -> Recipient {
        Recipient {
            name: name.to_string(),
            wallet: wallet.parse().unwrap(),
            note: None,
        }
    }

    #[test]
    fn exact_match_wins_over_partial_matches() {
        let recipients = vec![
            recipient("alice", "0x1111111111111111111111111111111111111111"),
            recipient("alice smith", "0x2222222222222222222222222222222222222222"),
            recipient("alice jones", "0x3333333333333333333333333333333333333333"),
        ];
        let outcome = resolve_by_name(&recipients, "alice");
        match outcome {
            ResolveOutcome::Match { recipient, kind } => {
                assert_eq!(recipient.name, "alice");
                assert_eq!(kind, MatchKind::Exact);
            }
            other => panic!("expected exact match, got {other:?}"),
        }
    }

    #[test]
    fn two_exact_matches_are_ambiguous() {
        let recipients = vec![
            recipient("Sam", "0x1111111111111111111111111111111111111111"),
            recipient("sam", "0x2222222222222222222222222222222222222222"),
        ];
        let outcome = resolve_by_name(&recipients, "sam");
        assert!(matches!(outcome, ResolveOutcome::Ambiguous(opts) if opts.len() == 2));
    }

    #[test]
    fn unique_partial_match_resolves() {
        let recipients = vec![recipient("Alicia", "0x1111111111111111111111111111111111111111")];
        let outcome = resolve_by_name(&recipients, "ali");
        assert!(matches!(
            outcome,
            ResolveOutcome::Match { kind: MatchKind::PartialUnique, .. }
        ));
    }

    #[test]
    fn no_match_is_not_found() {
        let recipients = vec![recipient("bob", "0x1111111111111111111111111111111111111111")];
        assert_eq!(resolve_by_name(&recipients, "zzz"), ResolveOutcome::NotFound);
    }

    impl std::fmt::Debug for ResolveOutcome {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                ResolveOutcome::Match { recipient, kind } => {
                    write!(f, "Match({}, {kind:?})", recipient.name)
                }
                ResolveOutcome::Ambiguous(v) => write!(f, "Ambiguous({})", v.len()),
                ResolveOutcome::NotFound => write!(f, "NotFound"),
            }
        }
    }
}
