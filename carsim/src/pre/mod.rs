pub mod read_sim_pars;
pub mod sim_opts;
pub mod spawn;
