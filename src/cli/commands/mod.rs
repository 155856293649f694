pub mod enzyme_path;
pub mod go_path;
pub mod index;
pub mod info;
pub mod search;
pub mod tax_path;
pub mod term;
