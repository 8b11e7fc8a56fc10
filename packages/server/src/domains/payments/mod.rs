pub mod membership_type;
pub mod payment;

pub use membership_type::{membership_expiry, MembershipType, NewMembershipType};
pub use payment::{generate_transaction_id, NewPayment, Payment};
