//! Status helper enums mapping to SMALLSERIAL/SMALLINT lookup tables.
//!
//! Each enum variant's discriminant matches the seed data order (1-based)
//! in the corresponding `*_statuses` database table.

pub use courtside_core::types::StatusId;

macro_rules! define_status_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $val:expr ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[repr(i16)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $( $(#[$vmeta])* $variant = $val ),+
        }

        impl $name {
            /// Return the database status ID.
            pub fn id(self) -> StatusId {
                self as StatusId
            }
        }

        impl From<$name> for StatusId {
            fn from(value: $name) -> Self {
                value as StatusId
            }
        }
    };
}

define_status_enum! {
    /// Open play session lifecycle status.
    OpenPlaySessionStatus {
        Scheduled = 1,
        Completed = 2,
        Cancelled = 3,
    }
}

define_status_enum! {
    /// Court reservation status.
    ReservationStatus {
        Confirmed = 1,
        Cancelled = 2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courtside_core::open_play::session_status;

    #[test]
    fn session_status_ids_match_core_constants() {
        assert_eq!(OpenPlaySessionStatus::Scheduled.id(), session_status::SCHEDULED);
        assert_eq!(OpenPlaySessionStatus::Completed.id(), session_status::COMPLETED);
        assert_eq!(OpenPlaySessionStatus::Cancelled.id(), session_status::CANCELLED);
    }

    #[test]
    fn reservation_status_ids() {
        assert_eq!(StatusId::from(ReservationStatus::Confirmed), 1);
        assert_eq!(StatusId::from(ReservationStatus::Cancelled), 2);
    }
}
