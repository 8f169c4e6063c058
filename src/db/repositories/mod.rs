pub mod image;
pub mod ingredient;
pub mod recipe;
pub mod tag;
pub mod user;
