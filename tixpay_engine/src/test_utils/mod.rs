pub mod fake_chain;
pub mod prepare_env;
