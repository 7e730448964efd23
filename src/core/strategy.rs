//! core::strategy
//!
//! Conflict strategies for dependency resolution.
//!
//! When the transitive fold finds two candidate revisions of the same
//! package, the active [`Strategy`] decides the winner. The
//! `interactive` strategy asks through a [`PromptPolicy`] capability so
//! the resolver itself never touches a TTY and stays unit-testable.

use std::str::FromStr;

use thiserror::Error;

use crate::core::types::Revision;

/// Errors from strategy handling.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StrategyError {
    #[error("unknown strategy '{0}' (expected max, min, keep, update, or interactive)")]
    Unknown(String),
}

/// Policy used to reconcile conflicting revisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strategy {
    /// Version-sort maximum wins (the default).
    #[default]
    Max,
    /// Version-sort minimum wins.
    Min,
    /// The existing revision always wins.
    Keep,
    /// The incoming revision always wins.
    Update,
    /// Ask the user; the default answer keeps the existing revision.
    Interactive,
}

impl FromStr for Strategy {
    type Err = StrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "max" => Ok(Self::Max),
            "min" => Ok(Self::Min),
            "keep" => Ok(Self::Keep),
            "update" => Ok(Self::Update),
            "interactive" => Ok(Self::Interactive),
            other => Err(StrategyError::Unknown(other.to_string())),
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Max => "max",
            Self::Min => "min",
            Self::Keep => "keep",
            Self::Update => "update",
            Self::Interactive => "interactive",
        };
        write!(f, "{name}")
    }
}

/// Outcome of a conflict decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    /// Keep the revision already installed in HEAD.
    Existing,
    /// Take the incoming revision.
    Incoming,
}

/// Capability for interactive conflict decisions.
///
/// Injected into the resolver so tests (and non-interactive runs) never
/// block on stdin.
pub trait PromptPolicy {
    /// Decide between an existing and an incoming revision of `pkg`.
    fn choose(&self, pkg: &str, existing: &Revision, incoming: &Revision) -> Choice;
}

/// Non-interactive policy: always keep the existing revision.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeepExisting;

impl PromptPolicy for KeepExisting {
    fn choose(&self, _pkg: &str, _existing: &Revision, _incoming: &Revision) -> Choice {
        Choice::Existing
    }
}

/// Terminal policy: ask on stdin, keeping the existing revision on an
/// empty or unrecognized answer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalPrompt;

impl PromptPolicy for TerminalPrompt {
    fn choose(&self, pkg: &str, existing: &Revision, incoming: &Revision) -> Choice {
        use std::io::Write;

        eprint!("{pkg}: keep {existing} or update to {incoming}? [K/u] ");
        let _ = std::io::stderr().flush();
        let mut answer = String::new();
        if std::io::stdin().read_line(&mut answer).is_err() {
            return Choice::Existing;
        }
        match answer.trim().to_ascii_lowercase().as_str() {
            "u" | "update" => Choice::Incoming,
            _ => Choice::Existing,
        }
    }
}

/// Decide between revisions under `strategy`.
///
/// With no existing revision the incoming one always wins. A version
/// tie keeps the existing revision under every strategy.
pub fn pick(
    strategy: Strategy,
    existing: Option<&Revision>,
    incoming: &Revision,
    pkg: &str,
    prompt: &dyn PromptPolicy,
) -> Choice {
    use std::cmp::Ordering;

    let Some(existing) = existing else {
        return Choice::Incoming;
    };
    match strategy {
        Strategy::Max => match existing.version_cmp(incoming) {
            Ordering::Less => Choice::Incoming,
            _ => Choice::Existing,
        },
        Strategy::Min => match existing.version_cmp(incoming) {
            Ordering::Greater => Choice::Incoming,
            _ => Choice::Existing,
        },
        Strategy::Keep => Choice::Existing,
        Strategy::Update => Choice::Incoming,
        Strategy::Interactive => {
            if existing.version_cmp(incoming).is_eq() {
                Choice::Existing
            } else {
                prompt.choose(pkg, existing, incoming)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rev(s: &str) -> Revision {
        Revision::new(s).unwrap()
    }

    struct AlwaysUpdate;

    impl PromptPolicy for AlwaysUpdate {
        fn choose(&self, _pkg: &str, _existing: &Revision, _incoming: &Revision) -> Choice {
            Choice::Incoming
        }
    }

    #[test]
    fn parse_known_strategies() {
        assert_eq!("max".parse::<Strategy>().unwrap(), Strategy::Max);
        assert_eq!("min".parse::<Strategy>().unwrap(), Strategy::Min);
        assert_eq!("keep".parse::<Strategy>().unwrap(), Strategy::Keep);
        assert_eq!("update".parse::<Strategy>().unwrap(), Strategy::Update);
        assert_eq!(
            "interactive".parse::<Strategy>().unwrap(),
            Strategy::Interactive
        );
        assert!("newest".parse::<Strategy>().is_err());
    }

    #[test]
    fn no_existing_takes_incoming() {
        for strategy in [
            Strategy::Max,
            Strategy::Min,
            Strategy::Keep,
            Strategy::Update,
            Strategy::Interactive,
        ] {
            assert_eq!(
                pick(strategy, None, &rev("1.0"), "p", &KeepExisting),
                Choice::Incoming
            );
        }
    }

    #[test]
    fn max_takes_newer() {
        assert_eq!(
            pick(Strategy::Max, Some(&rev("1.0")), &rev("1.1"), "p", &KeepExisting),
            Choice::Incoming
        );
        assert_eq!(
            pick(Strategy::Max, Some(&rev("1.10")), &rev("1.9"), "p", &KeepExisting),
            Choice::Existing
        );
    }

    #[test]
    fn min_takes_older() {
        assert_eq!(
            pick(Strategy::Min, Some(&rev("1.1")), &rev("1.0"), "p", &KeepExisting),
            Choice::Incoming
        );
        assert_eq!(
            pick(Strategy::Min, Some(&rev("1.0")), &rev("1.1"), "p", &KeepExisting),
            Choice::Existing
        );
    }

    #[test]
    fn tie_keeps_existing() {
        for strategy in [Strategy::Max, Strategy::Min, Strategy::Interactive] {
            assert_eq!(
                pick(strategy, Some(&rev("1.0")), &rev("1.0"), "p", &AlwaysUpdate),
                Choice::Existing
            );
        }
    }

    #[test]
    fn keep_and_update_are_unconditional() {
        assert_eq!(
            pick(Strategy::Keep, Some(&rev("1.0")), &rev("9.9"), "p", &KeepExisting),
            Choice::Existing
        );
        assert_eq!(
            pick(Strategy::Update, Some(&rev("9.9")), &rev("1.0"), "p", &KeepExisting),
            Choice::Incoming
        );
    }

    #[test]
    fn interactive_delegates_to_policy() {
        assert_eq!(
            pick(
                Strategy::Interactive,
                Some(&rev("1.0")),
                &rev("2.0"),
                "p",
                &AlwaysUpdate
            ),
            Choice::Incoming
        );
        assert_eq!(
            pick(
                Strategy::Interactive,
                Some(&rev("1.0")),
                &rev("2.0"),
                "p",
                &KeepExisting
            ),
            Choice::Existing
        );
    }
}
