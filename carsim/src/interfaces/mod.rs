pub mod controller;
pub mod sim_interface;
