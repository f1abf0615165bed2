pub mod pet_service;
pub mod profile_service;

pub use pet_service::{PetService, PhotoUpload, PETS_TABLE};
pub use profile_service::{ProfileService, PROFILES_TABLE};
