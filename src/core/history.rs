//! History reconciliation
//!
//! A poll result never appends to the conversation: it only replaces the
//! trailing in-progress agent turn. Every function here produces a new
//! value instead of mutating its argument, and the new history shares the
//! untouched elements with the old one. Consumers that detect changes by
//! reference (renderers, diffing views) rely on that sharing, so it is a
//! correctness requirement, not an optimization.

use std::sync::Arc;

use serde_json::Value;

use super::types::{ChatTurn, Message, Scheme, SessionStatus};

/// Ordered conversation history with structural sharing between revisions
pub type History = Vec<Arc<Message>>;

/// Merge a polled status payload into the history.
///
/// Returns a new history when the last element is the in-progress agent
/// turn for `session_id`: every earlier element is shared with the input,
/// and the last element is replaced by a copy carrying the polled status,
/// results, and answer.
///
/// Returns `None` when the last element does not match, which covers both
/// an empty history and a poll that resolved after the state machine moved
/// on (switched session, reset conversation). Callers keep the history
/// untouched in that case.
pub fn reconcile(history: &[Arc<Message>], session_id: &str, poll: &SessionStatus) -> Option<History> {
    let (last, earlier) = history.split_last()?;

    match last.as_ref() {
        Message::AgentInProgress {
            session_id: Some(sid),
            ..
        } if sid == session_id => {
            let mut next: History = Vec::with_capacity(history.len());
            next.extend(earlier.iter().cloned());
            next.push(Arc::new(Message::AgentInProgress {
                session_id: Some(session_id.to_string()),
                status: poll.status,
                results: poll.results.clone(),
                final_answer: poll.display_answer(),
            }));
            Some(next)
        }
        _ => None,
    }
}

/// Assign display names to raw scheme payloads.
///
/// Entries carrying a string `name` keep it; the rest get a positional
/// `Scheme {index+1}` label.
pub fn label_schemes(raw: &[Value]) -> Vec<Scheme> {
    raw.iter()
        .enumerate()
        .map(|(index, payload)| {
            let name = payload
                .get("name")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| format!("Scheme {}", index + 1));
            Scheme {
                name,
                payload: payload.clone(),
            }
        })
        .collect()
}

/// Convert stored wire turns into a history of human/historical messages.
///
/// Anything the server does not mark `"human"` is treated as a completed
/// agent turn; stored sessions never contain a live in-progress turn.
pub fn history_from_turns(turns: &[ChatTurn]) -> History {
    turns
        .iter()
        .map(|turn| {
            let message = if turn.kind == "human" {
                Message::human(turn.content.clone())
            } else {
                Message::HistoricalAgent {
                    content: turn.content.clone(),
                }
            };
            Arc::new(message)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::AgentStatus;
    use proptest::prelude::*;
    use serde_json::{json, Map};

    fn poll(status: AgentStatus, final_answer: Option<&str>) -> SessionStatus {
        SessionStatus {
            status,
            results: Map::new(),
            final_answer: final_answer.map(str::to_string),
            schemes: None,
            error: None,
            chat_history: None,
        }
    }

    fn history_ending_in_progress(session_id: &str) -> History {
        vec![
            Arc::new(Message::human("design a 2-story office")),
            Arc::new(Message::AgentInProgress {
                session_id: Some(session_id.to_string()),
                status: AgentStatus::Running,
                results: Map::new(),
                final_answer: None,
            }),
        ]
    }

    #[test]
    fn test_reconcile_replaces_only_the_last_element() {
        let history = history_ending_in_progress("s1");
        let mut payload = poll(AgentStatus::Running, None);
        payload
            .results
            .insert("step".to_string(), json!("drafting"));

        let next = reconcile(&history, "s1", &payload).expect("should reconcile");

        assert_eq!(next.len(), history.len());
        assert!(Arc::ptr_eq(&next[0], &history[0]));
        match next[1].as_ref() {
            Message::AgentInProgress {
                status, results, ..
            } => {
                assert_eq!(*status, AgentStatus::Running);
                assert_eq!(results.get("step"), Some(&json!("drafting")));
            }
            other => panic!("unexpected last element: {:?}", other),
        }
    }

    #[test]
    fn test_reconcile_carries_final_answer_on_completion() {
        let history = history_ending_in_progress("s1");
        let payload = poll(AgentStatus::Completed, Some("Here is scheme A"));

        let next = reconcile(&history, "s1", &payload).unwrap();
        match next[1].as_ref() {
            Message::AgentInProgress {
                status,
                final_answer,
                ..
            } => {
                assert_eq!(*status, AgentStatus::Completed);
                assert_eq!(final_answer.as_deref(), Some("Here is scheme A"));
            }
            other => panic!("unexpected last element: {:?}", other),
        }
    }

    #[test]
    fn test_reconcile_uses_error_text_for_failed_turns() {
        let history = history_ending_in_progress("s1");
        let mut payload = poll(AgentStatus::Error, None);
        payload.error = Some("tool exploded".to_string());

        let next = reconcile(&history, "s1", &payload).unwrap();
        match next[1].as_ref() {
            Message::AgentInProgress { final_answer, .. } => {
                assert_eq!(final_answer.as_deref(), Some("tool exploded"));
            }
            other => panic!("unexpected last element: {:?}", other),
        }
    }

    #[test]
    fn test_reconcile_rejects_other_sessions() {
        let history = history_ending_in_progress("s1");
        let payload = poll(AgentStatus::Completed, Some("stale"));
        assert!(reconcile(&history, "s2", &payload).is_none());
    }

    #[test]
    fn test_reconcile_is_noop_when_last_turn_is_not_in_progress() {
        let history: History = vec![
            Arc::new(Message::human("hello")),
            Arc::new(Message::HistoricalAgent {
                content: "hi".to_string(),
            }),
        ];
        let payload = poll(AgentStatus::Completed, Some("late"));
        assert!(reconcile(&history, "s1", &payload).is_none());
    }

    #[test]
    fn test_reconcile_is_noop_on_empty_history() {
        let payload = poll(AgentStatus::Running, None);
        assert!(reconcile(&[], "s1", &payload).is_none());
    }

    #[test]
    fn test_reconcile_rejects_placeholder_without_session_id() {
        // Placeholder not yet stamped with the server-assigned id: a poll
        // result cannot belong to it.
        let history: History = vec![Arc::new(Message::agent_placeholder(None))];
        let payload = poll(AgentStatus::Running, None);
        assert!(reconcile(&history, "s1", &payload).is_none());
    }

    #[test]
    fn test_label_schemes_defaults_missing_names() {
        let raw = vec![json!({}), json!({"name": "Square Bay"}), json!({"floors": 2})];
        let schemes = label_schemes(&raw);
        assert_eq!(schemes[0].name, "Scheme 1");
        assert_eq!(schemes[1].name, "Square Bay");
        assert_eq!(schemes[2].name, "Scheme 3");
        assert_eq!(schemes[2].payload, json!({"floors": 2}));
    }

    #[test]
    fn test_history_from_turns_maps_wire_kinds() {
        let turns = vec![
            ChatTurn {
                kind: "human".to_string(),
                content: "design a warehouse".to_string(),
            },
            ChatTurn {
                kind: "ai".to_string(),
                content: "Here is a layout.".to_string(),
            },
        ];
        let history = history_from_turns(&turns);
        assert_eq!(history.len(), 2);
        assert!(matches!(history[0].as_ref(), Message::Human { .. }));
        assert!(matches!(
            history[1].as_ref(),
            Message::HistoricalAgent { .. }
        ));
    }

    fn arb_status() -> impl Strategy<Value = AgentStatus> {
        prop_oneof![
            Just(AgentStatus::Running),
            Just(AgentStatus::Completed),
            Just(AgentStatus::Error),
        ]
    }

    proptest! {
        /// Reconciling a history that ends in the session's in-progress turn
        /// preserves the length and shares every earlier element.
        #[test]
        fn prop_reconcile_preserves_prefix(
            prior_turns in prop::collection::vec(".{0,20}", 0..6),
            status in arb_status(),
            answer in prop::option::of(".{0,20}"),
        ) {
            let mut history: History = prior_turns
                .iter()
                .map(|text| Arc::new(Message::human(text.clone())))
                .collect();
            history.push(Arc::new(Message::AgentInProgress {
                session_id: Some("s1".to_string()),
                status: AgentStatus::Running,
                results: Map::new(),
                final_answer: None,
            }));

            let payload = SessionStatus {
                status,
                results: Map::new(),
                final_answer: answer,
                schemes: None,
                error: None,
                chat_history: None,
            };

            let next = reconcile(&history, "s1", &payload).unwrap();
            prop_assert_eq!(next.len(), history.len());
            for (before, after) in history.iter().zip(next.iter()).take(history.len() - 1) {
                prop_assert!(Arc::ptr_eq(before, after));
            }
        }

        /// Reconciling a history whose last element is not an in-progress
        /// turn is always a no-op, whatever the payload.
        #[test]
        fn prop_reconcile_noop_without_active_turn(
            turns in prop::collection::vec(".{0,20}", 1..6),
            status in arb_status(),
        ) {
            let history: History = turns
                .iter()
                .map(|text| Arc::new(Message::human(text.clone())))
                .collect();
            let payload = SessionStatus {
                status,
                results: Map::new(),
                final_answer: None,
                schemes: None,
                error: None,
                chat_history: None,
            };
            prop_assert!(reconcile(&history, "s1", &payload).is_none());
        }
    }
}
