pub mod account;
pub mod district;
pub mod trip;
