pub mod doctor;
pub mod route;
pub mod serve;
