/// Actor name recorded when a request carries no `x-user` header.
pub const DEFAULT_ACTOR: &str = "system";

/// Per-request context.
///
/// Inserted by the context middleware for every `/api` route; handlers use
/// it to stamp `created_by`/`updated_by` style audit fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    actor: String,
}

impl RequestContext {
    pub fn new(actor: impl Into<String>) -> Self {
        Self { actor: actor.into() }
    }

    pub fn actor(&self) -> &str {
        &self.actor
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new(DEFAULT_ACTOR)
    }
}
