mod common;
mod load_test;
mod provisioning_test;
