pub mod admin_seed;
