pub mod error;
pub mod path;
pub mod timestamp;
pub mod value;
pub mod value_info;
