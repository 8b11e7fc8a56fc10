pub mod id_card;

pub use id_card::{card_type_for_role, generate_card_number, IdCard, PublicCard};
