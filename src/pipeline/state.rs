use log::{debug, warn};

use crate::pipeline::error::CodecError;
use crate::pipeline::hook::PipelineHook;

/// Progress of a single `encode` or `decode` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Idle,
    Validating,
    Transforming,
    Embedding,
    Extracting,
    Reassembling,
    Done,
    Failed,
}

impl Stage {
    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::Done | Stage::Failed)
    }

    /// Whether `self -> next` is a legal transition.
    pub fn can_advance_to(self, next: Stage) -> bool {
        use Stage::*;
        if next == Failed {
            return !self.is_terminal();
        }
        matches!(
            (self, next),
            (Idle, Validating)
                | (Validating, Transforming)
                | (Transforming, Embedding)
                | (Transforming, Extracting)
                | (Embedding, Reassembling)
                | (Extracting, Reassembling)
                | (Reassembling, Done)
        )
    }
}

/// Drives the stage machine of one call and reports transitions to the hook.
pub(crate) struct Session<'h, H: PipelineHook + ?Sized> {
    operation: &'static str,
    stage: Stage,
    hook: &'h H,
}

impl<'h, H: PipelineHook + ?Sized> Session<'h, H> {
    pub fn new(operation: &'static str, hook: &'h H) -> Self {
        Self {
            operation,
            stage: Stage::Idle,
            hook,
        }
    }

    pub fn advance(&mut self, next: Stage) {
        debug_assert!(
            self.stage.can_advance_to(next),
            "{}: illegal transition {:?} -> {:?}",
            self.operation,
            self.stage,
            next
        );
        debug!("{}: {:?} -> {:?}", self.operation, self.stage, next);
        self.stage = next;
        self.hook.on_stage(next);
    }

    /// Close the session: an error moves it to `Failed`.
    pub fn conclude<T>(mut self, result: Result<T, CodecError>) -> Result<T, CodecError> {
        if let Err(ref e) = result {
            warn!("{} failed while {:?}: {}", self.operation, self.stage, e);
            self.advance(Stage::Failed);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_path_is_legal() {
        let path = [
            Stage::Idle,
            Stage::Validating,
            Stage::Transforming,
            Stage::Embedding,
            Stage::Reassembling,
            Stage::Done,
        ];
        for pair in path.windows(2) {
            assert!(pair[0].can_advance_to(pair[1]), "{:?} -> {:?}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_decode_path_is_legal() {
        assert!(Stage::Transforming.can_advance_to(Stage::Extracting));
        assert!(Stage::Extracting.can_advance_to(Stage::Reassembling));
    }

    #[test]
    fn test_illegal_transitions() {
        assert!(!Stage::Idle.can_advance_to(Stage::Embedding));
        assert!(!Stage::Embedding.can_advance_to(Stage::Extracting));
        assert!(!Stage::Done.can_advance_to(Stage::Validating));
        assert!(!Stage::Done.can_advance_to(Stage::Failed));
        assert!(!Stage::Failed.can_advance_to(Stage::Failed));
    }

    #[test]
    fn test_failed_reachable_from_every_running_stage() {
        for stage in [
            Stage::Idle,
            Stage::Validating,
            Stage::Transforming,
            Stage::Embedding,
            Stage::Extracting,
            Stage::Reassembling,
        ] {
            assert!(stage.can_advance_to(Stage::Failed), "{:?}", stage);
        }
    }
}
