pub mod user;

pub use user::{
    Address, EmergencyContact, Identification, LanguageSkill, Preferences, ProfileUpdate,
    Qualification, User, UserProfile,
};
