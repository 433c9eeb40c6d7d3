mod login;
pub use login::Login;

mod register;
pub use register::Register;

mod dashboard;
pub use dashboard::{AdminDashboard, AdminSection, CustomerDashboard, ProviderDashboard};

mod not_found;
pub use not_found::NotFound;
