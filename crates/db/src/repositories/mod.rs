//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async query methods.
//! Methods used by the capacity engine accept `&mut PgConnection` so they
//! run inside the caller's transaction; pool-level lookups accept `&PgPool`.

pub mod court_repo;
pub mod open_play_audit_repo;
pub mod open_play_rule_repo;
pub mod open_play_session_repo;
pub mod reservation_court_repo;
pub mod reservation_repo;
pub mod staff_notification_repo;

pub use court_repo::CourtRepo;
pub use open_play_audit_repo::OpenPlayAuditRepo;
pub use open_play_rule_repo::OpenPlayRuleRepo;
pub use open_play_session_repo::OpenPlaySessionRepo;
pub use reservation_court_repo::ReservationCourtRepo;
pub use reservation_repo::ReservationRepo;
pub use staff_notification_repo::StaffNotificationRepo;
