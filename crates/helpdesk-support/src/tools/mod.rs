//! The four mock back-office tools of the support assistant.
//!
//! | Tool | Name | Purpose |
//! |------|------|---------|
//! | [`OrderStatus`] | `get_order_status` | Order state and delivery estimate |
//! | [`UpdateEmail`] | `update_user_email` | Change the account e-mail address |
//! | [`ScheduleAppointment`] | `schedule_appointment` | Book a service appointment |
//! | [`FindNearestStore`] | `find_nearest_store` | Closest store for a city or district |
//!
//! Data is fixed in-process tables. User-facing texts are Turkish.

pub mod appointment;
pub mod email;
pub mod order_status;
pub mod store;

use std::sync::Arc;

use helpdesk_rs::clock::Clock;
use helpdesk_rs::tools::core::ToolSet;

pub use appointment::ScheduleAppointment;
pub use email::UpdateEmail;
pub use order_status::OrderStatus;
pub use store::FindNearestStore;

// ── Tool name constants ─────────────────────────────────────────────

pub const GET_ORDER_STATUS: &str = "get_order_status";
pub const UPDATE_USER_EMAIL: &str = "update_user_email";
pub const SCHEDULE_APPOINTMENT: &str = "schedule_appointment";
pub const FIND_NEAREST_STORE: &str = "find_nearest_store";

// ── Text folding ────────────────────────────────────────────────────

/// Lowercase, strip Turkish diacritics and collapse whitespace, so that
/// `"İZMİR "`, `"izmir"` and `"Izmir"` compare equal.
pub fn fold_text(text: &str) -> String {
    let folded: String = text
        .chars()
        .flat_map(char::to_lowercase)
        .filter_map(|c| match c {
            'ı' | 'î' => Some('i'),
            'ö' => Some('o'),
            'ü' | 'û' => Some('u'),
            'ş' => Some('s'),
            'ğ' => Some('g'),
            'ç' => Some('c'),
            'â' => Some('a'),
            '\u{0300}'..='\u{036f}' => None,
            other => Some(other),
        })
        .collect();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ── Extension trait ─────────────────────────────────────────────────

/// Extension trait for registering the support tools on a [`ToolSet`].
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use helpdesk_rs::clock::SystemClock;
/// use helpdesk_rs::tools::core::ToolSet;
/// use helpdesk_support::tools::SupportToolsExt;
///
/// let tools = ToolSet::new().with_support_tools(Arc::new(SystemClock));
/// ```
pub trait SupportToolsExt {
    fn with_support_tools(self, clock: Arc<dyn Clock>) -> Self;
}

impl SupportToolsExt for ToolSet {
    fn with_support_tools(self, clock: Arc<dyn Clock>) -> Self {
        self.with(OrderStatus::new())
            .with(UpdateEmail::new())
            .with(ScheduleAppointment::new(clock))
            .with(FindNearestStore::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use helpdesk_rs::clock::SystemClock;

    #[test]
    fn folding() {
        assert_eq!(fold_text("  İZMİR  Karşıyaka "), "izmir karsiyaka");
        assert_eq!(fold_text("Yarın"), "yarin");
        assert_eq!(fold_text("BUGÜN"), "bugun");
        assert_eq!(fold_text("Çankaya, ANKARA"), "cankaya, ankara");
    }

    #[test]
    fn registers_all_four() {
        let tools = ToolSet::new().with_support_tools(Arc::new(SystemClock));
        assert_eq!(
            tools.names(),
            vec![
                FIND_NEAREST_STORE,
                GET_ORDER_STATUS,
                SCHEDULE_APPOINTMENT,
                UPDATE_USER_EMAIL
            ]
        );
        for def in tools.definitions() {
            assert!(!def.function.description.is_empty());
        }
    }
}
