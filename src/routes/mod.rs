pub mod district;
pub mod health;
pub mod trip;
