// Handlers da API REST do CRM
pub mod auth;
pub mod health;
pub mod instances;
pub mod leads;
pub mod messages;
pub mod products;
pub mod recurrence;
pub mod reminders;
pub mod stages;

pub use auth::*;
pub use health::*;
pub use instances::*;
pub use leads::*;
pub use messages::*;
pub use products::*;
pub use recurrence::*;
pub use reminders::*;
pub use stages::*;
