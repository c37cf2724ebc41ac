pub mod instance_limit;
