pub mod health;
pub mod media_get;
pub mod media_list;
