pub mod lead;
pub mod product;
pub mod reminder;
pub mod stage;
pub mod user;

pub use lead::*;
pub use product::*;
pub use reminder::*;
pub use stage::*;
pub use user::*;
