/// Domain types shared by the store, the auth layer and the HTTP handlers.

mod department;
mod user;

pub use department::{Department, DepartmentFilter};
pub use user::{NewUser, PublicUser, User};
