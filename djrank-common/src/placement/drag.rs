//! Headless drag gesture state
//!
//! A drag starts on a performer in some bucket and ends with a drop on a
//! target (or nowhere). The controller only decides whether the gesture
//! produced a move; the [`Board`](super::Board) performs it.

use crate::tier::Bucket;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DragState {
    #[default]
    Idle,
    Dragging { id: String, source: Bucket },
}

/// A completed drag that should move a performer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropIntent {
    pub id: String,
    pub from: Bucket,
    pub to: Bucket,
}

#[derive(Debug, Default)]
pub struct DragController {
    state: DragState,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    /// Start dragging `id` out of `source`, replacing any unfinished drag
    pub fn begin(&mut self, id: impl Into<String>, source: Bucket) {
        self.state = DragState::Dragging {
            id: id.into(),
            source,
        };
    }

    /// Finish the gesture
    ///
    /// Yields an intent only when dragging and `target` is a bucket other
    /// than the source. The controller is idle afterwards either way.
    pub fn drop(&mut self, target: Option<Bucket>) -> Option<DropIntent> {
        match (std::mem::take(&mut self.state), target) {
            (DragState::Dragging { id, source }, Some(to)) if to != source => Some(DropIntent {
                id,
                from: source,
                to,
            }),
            _ => None,
        }
    }

    /// Drop on a target named by label (`"queue"`, `"S"` ... `"F"`)
    ///
    /// Blank or unknown labels count as dropping outside any target.
    pub fn drop_on(&mut self, label: &str) -> Option<DropIntent> {
        let target = Some(label.trim())
            .filter(|l| !l.is_empty())
            .and_then(|l| l.parse().ok());
        self.drop(target)
    }

    /// Abandon the gesture
    pub fn cancel(&mut self) {
        self.state = DragState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tier::Tier;

    #[test]
    fn test_drop_on_other_bucket_yields_intent() {
        let mut drag = DragController::new();
        drag.begin("7", Bucket::Queue);
        assert!(drag.is_dragging());

        let intent = drag.drop(Some(Bucket::Tier(Tier::A))).unwrap();
        assert_eq!(
            intent,
            DropIntent {
                id: "7".to_string(),
                from: Bucket::Queue,
                to: Bucket::Tier(Tier::A),
            }
        );
        assert_eq!(drag.state(), &DragState::Idle);
    }

    #[test]
    fn test_drop_on_source_is_noop() {
        let mut drag = DragController::new();
        drag.begin("7", Bucket::Tier(Tier::B));
        assert_eq!(drag.drop(Some(Bucket::Tier(Tier::B))), None);
        assert!(!drag.is_dragging());
    }

    #[test]
    fn test_drop_without_target_is_noop() {
        let mut drag = DragController::new();
        drag.begin("7", Bucket::Queue);
        assert_eq!(drag.drop(None), None);
        assert!(!drag.is_dragging());

        drag.begin("7", Bucket::Queue);
        assert_eq!(drag.drop_on("Z"), None);
        assert!(!drag.is_dragging());

        drag.begin("7", Bucket::Tier(Tier::C));
        assert_eq!(drag.drop_on(""), None);
    }

    #[test]
    fn test_drop_while_idle_is_noop() {
        let mut drag = DragController::new();
        assert_eq!(drag.drop(Some(Bucket::Queue)), None);
    }

    #[test]
    fn test_cancel_clears_state() {
        let mut drag = DragController::new();
        drag.begin("7", Bucket::Queue);
        drag.cancel();
        assert_eq!(drag.drop(Some(Bucket::Tier(Tier::S))), None);
    }

    #[test]
    fn test_drop_on_label_back_to_queue() {
        let mut drag = DragController::new();
        drag.begin("7", Bucket::Tier(Tier::F));
        let intent = drag.drop_on("queue").unwrap();
        assert_eq!(intent.to, Bucket::Queue);
        assert_eq!(intent.to.tier(), None);
    }
}
