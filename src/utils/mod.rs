pub mod extractors;
pub mod forms;
pub mod jwt;
pub mod slug;
pub mod validation;
