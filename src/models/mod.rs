mod category;
mod checkout;
mod contact;
mod pagination;
mod product;
mod slide;
mod status;
mod user;

pub use category::*;
pub use checkout::*;
pub use contact::*;
pub use pagination::*;
pub use product::*;
pub use slide::*;
pub use status::*;
pub use user::*;
