pub mod ops_compare;
pub mod ops_fetch;
