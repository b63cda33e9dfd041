pub mod capture;
pub mod devices;
