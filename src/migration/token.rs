use super::patch::{FieldOp, TokenLinkPatch};

/// Links an actor's prototype token to the actor.
///
/// Unconditional: the current flag is not read, so the update is always
/// sent for every character and crew.
pub fn migrate_token_link() -> TokenLinkPatch {
    TokenLinkPatch {
        actor_link: FieldOp::Set(true),
    }
}
