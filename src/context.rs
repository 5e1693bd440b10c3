/// Identity of the caller, passed explicitly into every operation that
/// needs to know who is asking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestContext {
    pub user_id: i64,
    pub is_staff: bool,
}

impl RequestContext {
    pub fn user(user_id: i64) -> Self {
        Self { user_id, is_staff: false }
    }

    pub fn staff(user_id: i64) -> Self {
        Self { user_id, is_staff: true }
    }
}
